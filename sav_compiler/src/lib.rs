use std::{
    fs,
    path::{Path, PathBuf},
};

pub mod assemble;
pub mod audio;
pub mod beat;
pub mod catalog;
pub mod config;
mod error;
pub mod index;
pub mod layout;
pub mod link;
pub mod note;
pub mod parser;
pub mod tempo;

pub use assemble::{assemble, Assembly};
pub use beat::BeatPos;
pub use config::{SongConfig, SongMeta};
pub use error::{ConvertError, ConvertErrorKind};
pub use layout::ProjectLayout;
pub use tempo::{LeadIn, TempoContext};

use crate::catalog::write_json;
use crate::parser::parse_sav;

#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Rewrite the song/singer catalogs.
    pub song_info: bool,
    /// Write the audio track padded with the lead-in silence.
    pub audio: bool,
}

/// Result of converting one chart document.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub bpm: u32,
    /// Seconds before the first beat in the source audio.
    pub delay: f64,
    pub lead_in: LeadIn,
    pub assembly: Assembly,
}

#[derive(Debug, Clone)]
pub struct ConvertReport {
    pub conversion: Conversion,
    pub written: Vec<PathBuf>,
}

pub fn convert_str(sav_src: &str, config: &SongConfig) -> Result<Conversion, ConvertError> {
    let parsed = parse_sav(sav_src)?;
    let lead_in = LeadIn::resolve(config.pre_length, parsed.bpm, parsed.delay)?;
    let tempo = TempoContext::new(parsed.bpm, lead_in.beats)?;
    log::info!(
        "bpm={}, delay={}s, lead-in={} eighth-beats{}",
        parsed.bpm,
        parsed.delay,
        lead_in.beats,
        if lead_in.derived { " (derived)" } else { "" }
    );

    let assembly = assemble(&parsed.notes, &config.skills, &config.fevers, &tempo)?;
    Ok(Conversion {
        bpm: parsed.bpm,
        delay: parsed.delay,
        lead_in,
        assembly,
    })
}

pub fn convert_file(path: impl AsRef<Path>, config: &SongConfig) -> Result<Conversion, ConvertError> {
    let path = path.as_ref();
    let src = fs::read_to_string(path).map_err(|e| {
        ConvertError::new("E2001", format!("failed to read chart: {e}"))
            .with_file(path.display().to_string())
    })?;
    convert_str(&src, config).map_err(|e| e.with_file(path.display().to_string()))
}

/// Run the whole conversion for one song of a project tree.
pub fn convert_project(
    layout: &ProjectLayout,
    options: &ConvertOptions,
) -> Result<ConvertReport, ConvertError> {
    let config = SongConfig::load(layout.config_path())?;
    let mut written = Vec::new();

    if options.song_info {
        let (songs_out, singers_out) = (layout.song_catalog_out(), layout.singer_catalog_out());
        catalog::rewrite_catalogs(
            &layout.song_catalog_src(),
            &layout.singer_catalog_src(),
            &songs_out,
            &singers_out,
            &config.meta,
        )?;
        written.push(songs_out);
        written.push(singers_out);
    }

    let conversion = convert_file(layout.chart_path(), &config)?;

    if options.audio {
        let out = layout.audio_out(config.output_audio_name());
        let silence_ms = conversion.lead_in.silence_ms(conversion.delay);
        audio::pad_with_silence(&layout.audio_path(), &out, silence_ms)?;
        written.push(out);
    }

    let stream_name = config.output_json_name();
    let simulator_out = layout.simulator_stream_out(stream_name);
    let map_out = layout.map_stream_out(stream_name);
    write_json(&simulator_out, &conversion.assembly.simulator)?;
    write_json(&map_out, &conversion.assembly.full)?;
    written.push(simulator_out);
    written.push(map_out);

    Ok(ConvertReport {
        conversion,
        written,
    })
}
