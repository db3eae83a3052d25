use std::collections::BTreeMap;

use chart_schema::{Event, Lane, Seconds};

use crate::beat::BeatPos;
use crate::note::{NoteId, NoteKey};

/// Boundary of the fever phase, assigned by declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeverRole {
    Ready,
    Start,
    End,
}

impl FeverRole {
    /// First marker is `Ready`, second `Start`, every later one `End`.
    pub fn from_ordinal(index: usize) -> Self {
        match index {
            0 => Self::Ready,
            1 => Self::Start,
            _ => Self::End,
        }
    }

    pub fn event(self, time: Seconds) -> Event {
        match self {
            Self::Ready => Event::FeverReady { time },
            Self::Start => Event::FeverStart { time },
            Self::End => Event::FeverEnd { time },
        }
    }
}

/// Everything that sits at one beat position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Slot {
    pub lanes: BTreeMap<Lane, NoteId>,
    pub fever: Option<FeverRole>,
}

/// Position-then-lane lookup over the note arena.
#[derive(Debug, Clone, Default)]
pub struct NoteIndex {
    slots: BTreeMap<BeatPos, Slot>,
}

impl NoteIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the note previously stored under `key`, if any.
    pub fn insert(&mut self, key: NoteKey, id: NoteId) -> Option<NoteId> {
        self.slots.entry(key.pos).or_default().lanes.insert(key.lane, id)
    }

    pub fn get(&self, key: NoteKey) -> Option<NoteId> {
        self.slots.get(&key.pos)?.lanes.get(&key.lane).copied()
    }

    /// Attach a fever marker, creating an empty slot when no note sits there.
    pub fn set_fever(&mut self, pos: BeatPos, role: FeverRole) -> Option<FeverRole> {
        self.slots.entry(pos).or_default().fever.replace(role)
    }

    pub fn len(&self) -> usize {
        self.slots.values().map(|s| s.lanes.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slots in ascending numeric position.
    pub fn iter(&self) -> impl Iterator<Item = (BeatPos, &Slot)> {
        self.slots.iter().map(|(pos, slot)| (*pos, slot))
    }
}
