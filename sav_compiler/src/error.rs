use chart_schema::Lane;
use thiserror::Error;

use crate::beat::BeatPos;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertErrorKind {
    Parse,
    IO,
    Config,
    Tempo,
    Link,
    InvalidOperation,
    Override,
    Index,
}

impl ConvertErrorKind {
    pub(crate) fn from_code(code: &'static str) -> Self {
        match code {
            // Parse
            "E1001" | "E1002" | "E1003" | "E1004" | "E1005" | "E1006" => Self::Parse,

            // IO
            "E2001" | "E2005" => Self::IO,

            // Config / catalog documents
            "E2002" | "E2003" | "E2004" => Self::Config,

            // Tempo
            "E3001" | "E3002" => Self::Tempo,

            // Slide linking
            "E4001" | "E4002" | "E4003" | "E4004" | "E4005" => Self::Link,

            // Skill flag on an ineligible variant
            "E4102" => Self::InvalidOperation,

            "E4101" | "E4201" => Self::Override,

            "E4301" => Self::Index,

            _ => Self::Parse,
        }
    }

    /// Fatal kinds abort the conversion; the rest are reported and skipped.
    pub fn is_fatal(self) -> bool {
        matches!(self, Self::Parse | Self::IO | Self::Config | Self::Tempo)
    }
}

#[derive(Debug, Error, Clone)]
#[error("{code}: {message}")]
pub struct ConvertError {
    pub code: &'static str,
    pub kind: ConvertErrorKind,
    pub message: String,

    pub file: Option<String>,
    pub line: Option<u32>,
    pub lane: Option<Lane>,
    pub position: Option<BeatPos>,
    pub context: Option<String>,
}

impl ConvertError {
    pub(crate) fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            kind: ConvertErrorKind::from_code(code),
            message: message.into(),

            file: None,
            line: None,
            lane: None,
            position: None,
            context: None,
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_lane(mut self, lane: Lane) -> Self {
        self.lane = Some(lane);
        self
    }

    pub fn with_position(mut self, position: BeatPos) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Log a non-fatal diagnostic and keep it for the caller.
pub(crate) fn report(diagnostics: &mut Vec<ConvertError>, err: ConvertError) {
    log::warn!("{err}");
    diagnostics.push(err);
}
