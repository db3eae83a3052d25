use std::{fs, path::Path};

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::ConvertError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PadReport {
    pub spec: WavSpec,
    pub silence_frames: u64,
    pub source_frames: u64,
}

pub fn silence_frames(silence_ms: u64, sample_rate: u32) -> u64 {
    silence_ms * u64::from(sample_rate) / 1000
}

fn audio_err(path: &Path, e: impl std::fmt::Display) -> ConvertError {
    ConvertError::new("E2005", format!("audio error: {e}")).with_file(path.display().to_string())
}

/// Copy the WAV at `src` to `dst` with `silence_ms` of silence in front.
/// The source sample format is kept.
pub fn pad_with_silence(src: &Path, dst: &Path, silence_ms: u64) -> Result<PadReport, ConvertError> {
    let mut reader = WavReader::open(src).map_err(|e| audio_err(src, e))?;
    let spec = reader.spec();
    let source_frames = u64::from(reader.duration());
    let frames = silence_frames(silence_ms, spec.sample_rate);
    let silent_samples = frames * u64::from(spec.channels);

    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).map_err(|e| audio_err(dst, e))?;
    }
    let mut writer = WavWriter::create(dst, spec).map_err(|e| audio_err(dst, e))?;

    match spec.sample_format {
        SampleFormat::Float => {
            for _ in 0..silent_samples {
                writer.write_sample(0.0f32).map_err(|e| audio_err(dst, e))?;
            }
            for sample in reader.samples::<f32>() {
                let sample = sample.map_err(|e| audio_err(src, e))?;
                writer.write_sample(sample).map_err(|e| audio_err(dst, e))?;
            }
        }
        SampleFormat::Int => {
            for _ in 0..silent_samples {
                writer.write_sample(0i32).map_err(|e| audio_err(dst, e))?;
            }
            for sample in reader.samples::<i32>() {
                let sample = sample.map_err(|e| audio_err(src, e))?;
                writer.write_sample(sample).map_err(|e| audio_err(dst, e))?;
            }
        }
    }
    writer.finalize().map_err(|e| audio_err(dst, e))?;

    log::info!(
        "padded {} with {silence_ms}ms of silence ({frames} frames) -> {}",
        src.display(),
        dst.display()
    );
    Ok(PadReport {
        spec,
        silence_frames: frames,
        source_frames,
    })
}
