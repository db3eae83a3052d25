use serde::{Deserialize, Serialize};

/// Absolute playback time in seconds from the start of the padded audio.
pub type Seconds = f64;

/// Playable lane after the editor offset has been applied.
pub type Lane = u8;

pub const LANE_MIN: Lane = 1;
pub const LANE_MAX: Lane = 7;

/// One entry of an emitted chart stream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Event {
    Single { lane: Lane, time: Seconds },
    SingleOff { lane: Lane, time: Seconds },
    Flick { lane: Lane, time: Seconds },
    Skill { lane: Lane, time: Seconds },
    Long { lane: Lane, time: Seconds },
    Tick { lane: Lane, time: Seconds },

    /// Slide body between two consecutive slide nodes.
    Bar {
        lane: [Lane; 2],
        time: [Seconds; 2],
    },

    /// Two notes that must be hit at the same instant.
    Sim { lane: [Lane; 2], time: Seconds },

    FeverReady { time: Seconds },
    FeverStart { time: Seconds },
    FeverEnd { time: Seconds },

    #[serde(rename = "BPM")]
    Bpm { bpm: u32, time: Seconds },
}

impl Event {
    /// Time at which the event begins.
    pub fn time(&self) -> Seconds {
        match self {
            Event::Single { time, .. }
            | Event::SingleOff { time, .. }
            | Event::Flick { time, .. }
            | Event::Skill { time, .. }
            | Event::Long { time, .. }
            | Event::Tick { time, .. }
            | Event::Sim { time, .. }
            | Event::FeverReady { time }
            | Event::FeverStart { time }
            | Event::FeverEnd { time }
            | Event::Bpm { time, .. } => *time,
            Event::Bar { time, .. } => time[0],
        }
    }

    /// Lane of a single-lane note event.
    pub fn lane(&self) -> Option<Lane> {
        match self {
            Event::Single { lane, .. }
            | Event::SingleOff { lane, .. }
            | Event::Flick { lane, .. }
            | Event::Skill { lane, .. }
            | Event::Long { lane, .. }
            | Event::Tick { lane, .. } => Some(*lane),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Event::Single { .. } => "Single",
            Event::SingleOff { .. } => "SingleOff",
            Event::Flick { .. } => "Flick",
            Event::Skill { .. } => "Skill",
            Event::Long { .. } => "Long",
            Event::Tick { .. } => "Tick",
            Event::Bar { .. } => "Bar",
            Event::Sim { .. } => "Sim",
            Event::FeverReady { .. } => "FeverReady",
            Event::FeverStart { .. } => "FeverStart",
            Event::FeverEnd { .. } => "FeverEnd",
            Event::Bpm { .. } => "BPM",
        }
    }
}

/// Chart stream as written to disk: a flat, time-ordered array of events.
pub type EventStream = Vec<Event>;
