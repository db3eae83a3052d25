use chart_schema::Seconds;

use crate::beat::BeatPos;
use crate::ConvertError;

/// Eighth-beats of lead-in are always rounded up to a whole bar.
const AUTO_LEAD_IN_STEP: u32 = 8;

pub fn seconds_per_eighth(bpm: u32) -> Seconds {
    60.0 / (f64::from(bpm) * 2.0)
}

/// Tempo parameters shared by every timestamp of one chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoContext {
    pub bpm: u32,
    /// Silence before the chart origin, in eighth-beats.
    pub lead_in: u32,
}

impl TempoContext {
    pub fn new(bpm: u32, lead_in: u32) -> Result<Self, ConvertError> {
        if bpm == 0 {
            return Err(ConvertError::new("E3001", "bpm must be > 0"));
        }
        Ok(Self { bpm, lead_in })
    }

    pub fn seconds_per_eighth(&self) -> Seconds {
        seconds_per_eighth(self.bpm)
    }

    pub fn to_seconds(&self, pos: BeatPos) -> Seconds {
        self.seconds_per_eighth() * (pos.as_f64() + f64::from(self.lead_in))
    }
}

/// Chosen lead-in and the audio length it corresponds to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeadIn {
    pub beats: u32,
    pub seconds: Seconds,
    /// Whether the configured value was rejected and a new one derived.
    pub derived: bool,
}

impl LeadIn {
    /// Pick the lead-in for a track whose first beat sounds `delay` seconds in.
    ///
    /// A configured value is kept only when it leaves at least `delay` seconds
    /// of room; otherwise the smallest whole-bar lead-in covering `delay` is used.
    pub fn resolve(configured: Option<u32>, bpm: u32, delay: Seconds) -> Result<Self, ConvertError> {
        if bpm == 0 {
            return Err(ConvertError::new("E3001", "bpm must be > 0"));
        }
        if !(delay >= 0.0) || !delay.is_finite() {
            return Err(ConvertError::new(
                "E3002",
                format!("delay must be a non-negative number of seconds (delay={delay})"),
            ));
        }

        let spe = seconds_per_eighth(bpm);
        if let Some(beats) = configured {
            let seconds = lead_in_seconds(spe, beats);
            if seconds >= delay {
                return Ok(Self {
                    beats,
                    seconds,
                    derived: false,
                });
            }
            log::info!(
                "preLength {beats} gives {seconds:.3}s, shorter than delay {delay:.3}s; deriving lead-in"
            );
        }

        let bars = (delay / spe / f64::from(AUTO_LEAD_IN_STEP)).ceil();
        let beats = (bars <= f64::from(u32::MAX))
            .then(|| (bars as u32).checked_mul(AUTO_LEAD_IN_STEP))
            .flatten()
            .ok_or_else(|| {
                ConvertError::new(
                    "E3002",
                    format!("delay too large for a lead-in (delay={delay})"),
                )
            })?;
        Ok(Self {
            beats,
            seconds: lead_in_seconds(spe, beats),
            derived: true,
        })
    }

    /// Milliseconds of silence to prepend to the source audio.
    pub fn silence_ms(&self, delay: Seconds) -> u64 {
        let ms = ((self.seconds - delay) * 1000.0).trunc();
        if ms > 0.0 {
            ms as u64
        } else {
            0
        }
    }
}

// Audio lead-in is one eighth-beat shorter than the chart lead-in.
fn lead_in_seconds(spe: Seconds, beats: u32) -> Seconds {
    spe * (f64::from(beats) - 1.0)
}
