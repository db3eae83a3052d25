use chart_schema::{Event, Lane, LANE_MAX, LANE_MIN};

use crate::beat::BeatPos;
use crate::tempo::TempoContext;
use crate::ConvertError;

/// Editor lanes are centred on zero; playable lanes start at 1.
pub const LANE_OFFSET: i32 = 4;

/// Index of a note in the chart's note arena.
pub type NoteId = usize;

/// Loose cross-reference key used by the editor format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NoteKey {
    pub pos: BeatPos,
    pub lane: Lane,
}

impl std::fmt::Display for NoteKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(pos={}, lane={})", self.pos, self.lane)
    }
}

/// Skill override target from the song config, lane after offset.
/// The lane is kept wide so a bad entry can be reported per target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkillTarget {
    pub pos: BeatPos,
    pub lane: i64,
}

impl SkillTarget {
    pub fn key(&self) -> Option<NoteKey> {
        let lane = Lane::try_from(self.lane).ok()?;
        Some(NoteKey { pos: self.pos, lane })
    }
}

impl From<NoteKey> for SkillTarget {
    fn from(key: NoteKey) -> Self {
        Self {
            pos: key.pos,
            lane: i64::from(key.lane),
        }
    }
}

impl std::fmt::Display for SkillTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(pos={}, lane={})", self.pos, self.lane)
    }
}

/// Type code of an editor entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteType {
    Single,
    Flick,
    SlideStart,
    SlideMiddle,
    SlideEndTap,
    SlideEndFlick,
}

impl NoteType {
    pub fn from_code(code: &str) -> Option<Self> {
        Some(match code {
            "N" => Self::Single,
            "F" => Self::Flick,
            "LS" => Self::SlideStart,
            "LM" => Self::SlideMiddle,
            "LE" => Self::SlideEndTap,
            "LF" => Self::SlideEndFlick,
            _ => return None,
        })
    }

    /// Middle and end nodes point back at the slide start they belong to.
    pub fn has_back_ref(self) -> bool {
        matches!(self, Self::SlideMiddle | Self::SlideEndTap | Self::SlideEndFlick)
    }
}

/// Entry as read from the chart document, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawNote {
    pub note_type: NoteType,
    pub lane: i32,
    pub pos: String,
    /// Owning slide start as `(lane, pos)`, for middle/end nodes only.
    pub start: Option<(i32, String)>,
    /// Source line of the entry, 0 when unknown.
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NoteKind {
    Single { skill: bool },
    Flick,
    SlideStart { skill: bool, successors: Vec<NoteId> },
    SlideMiddle { start: NoteKey },
    SlideEndTap { start: NoteKey },
    SlideEndFlick { start: NoteKey },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub key: NoteKey,
    /// Position was written with a fractional part ("gray" note).
    pub off_beat: bool,
    pub kind: NoteKind,
    pub prev: Option<NoteId>,
    pub next: Option<NoteId>,
}

pub fn lane_from_raw(raw: i32) -> Result<Lane, ConvertError> {
    match raw.checked_add(LANE_OFFSET) {
        Some(lane) if (i32::from(LANE_MIN)..=i32::from(LANE_MAX)).contains(&lane) => Ok(lane as Lane),
        _ => Err(ConvertError::new(
            "E1005",
            format!("lane out of range (raw={raw}, offset={LANE_OFFSET})"),
        )),
    }
}

fn start_key(raw: &RawNote, key: NoteKey) -> Result<NoteKey, ConvertError> {
    let Some((start_lane, start_pos)) = &raw.start else {
        return Err(ConvertError::new(
            "E1002",
            format!("slide node at {key} has no start reference"),
        )
        .with_position(key.pos)
        .with_lane(key.lane));
    };
    Ok(NoteKey {
        pos: BeatPos::parse(start_pos)?,
        lane: lane_from_raw(*start_lane)?,
    })
}

impl Note {
    pub fn from_raw(raw: &RawNote) -> Result<Self, ConvertError> {
        let lane = lane_from_raw(raw.lane)?;
        let pos = BeatPos::parse(&raw.pos)?;
        let key = NoteKey { pos, lane };

        let kind = match raw.note_type {
            NoteType::Single => NoteKind::Single { skill: false },
            NoteType::Flick => NoteKind::Flick,
            NoteType::SlideStart => NoteKind::SlideStart {
                skill: false,
                successors: Vec::new(),
            },
            NoteType::SlideMiddle => NoteKind::SlideMiddle {
                start: start_key(raw, key)?,
            },
            NoteType::SlideEndTap => NoteKind::SlideEndTap {
                start: start_key(raw, key)?,
            },
            NoteType::SlideEndFlick => NoteKind::SlideEndFlick {
                start: start_key(raw, key)?,
            },
        };

        Ok(Self {
            key,
            off_beat: raw.pos.contains('.'),
            kind,
            prev: None,
            next: None,
        })
    }

    pub fn variant_name(&self) -> &'static str {
        match self.kind {
            NoteKind::Single { .. } => "Single",
            NoteKind::Flick => "Flick",
            NoteKind::SlideStart { .. } => "SlideStart",
            NoteKind::SlideMiddle { .. } => "SlideMiddle",
            NoteKind::SlideEndTap { .. } => "SlideEndTap",
            NoteKind::SlideEndFlick { .. } => "SlideEndFlick",
        }
    }

    pub fn back_ref(&self) -> Option<NoteKey> {
        match self.kind {
            NoteKind::SlideMiddle { start }
            | NoteKind::SlideEndTap { start }
            | NoteKind::SlideEndFlick { start } => Some(start),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind,
            NoteKind::SlideEndTap { .. } | NoteKind::SlideEndFlick { .. }
        )
    }

    pub fn is_slide_middle(&self) -> bool {
        matches!(self.kind, NoteKind::SlideMiddle { .. })
    }

    pub fn is_skill(&self) -> bool {
        matches!(
            self.kind,
            NoteKind::Single { skill: true } | NoteKind::SlideStart { skill: true, .. }
        )
    }

    pub fn set_skill(&mut self) -> Result<(), ConvertError> {
        if let NoteKind::Single { skill } | NoteKind::SlideStart { skill, .. } = &mut self.kind {
            *skill = true;
            return Ok(());
        }
        Err(ConvertError::new(
            "E4102",
            format!("cannot change {} note to skill note", self.variant_name()),
        )
        .with_position(self.key.pos)
        .with_lane(self.key.lane))
    }

    /// Append this note's events to `out`.
    ///
    /// Slide start and middle nodes need their successor linked first; if it
    /// is missing nothing is appended.
    pub fn emit(
        &self,
        notes: &[Note],
        tempo: &TempoContext,
        out: &mut Vec<Event>,
    ) -> Result<(), ConvertError> {
        let lane = self.key.lane;
        let time = tempo.to_seconds(self.key.pos);

        match &self.kind {
            NoteKind::Single { skill } => {
                out.push(if *skill {
                    Event::Skill { lane, time }
                } else if self.off_beat {
                    Event::SingleOff { lane, time }
                } else {
                    Event::Single { lane, time }
                });
            }
            NoteKind::Flick | NoteKind::SlideEndFlick { .. } => out.push(Event::Flick { lane, time }),
            NoteKind::SlideEndTap { .. } => out.push(Event::Long { lane, time }),
            NoteKind::SlideStart { skill, .. } => {
                let bar = self.bar_to_next(notes, tempo)?;
                out.push(if *skill {
                    Event::Skill { lane, time }
                } else {
                    Event::Long { lane, time }
                });
                out.push(bar);
            }
            NoteKind::SlideMiddle { .. } => {
                let bar = self.bar_to_next(notes, tempo)?;
                out.push(Event::Tick { lane, time });
                out.push(bar);
            }
        }
        Ok(())
    }

    fn bar_to_next(&self, notes: &[Note], tempo: &TempoContext) -> Result<Event, ConvertError> {
        let next = self.next.and_then(|id| notes.get(id)).ok_or_else(|| {
            ConvertError::new(
                "E4005",
                format!("{} at {} has no linked successor", self.variant_name(), self.key),
            )
            .with_position(self.key.pos)
            .with_lane(self.key.lane)
        })?;
        Ok(Event::Bar {
            lane: [self.key.lane, next.key.lane],
            time: [tempo.to_seconds(self.key.pos), tempo.to_seconds(next.key.pos)],
        })
    }
}
