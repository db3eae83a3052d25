use crate::error::report;
use crate::index::NoteIndex;
use crate::note::{Note, NoteId, NoteKind};
use crate::ConvertError;

/// Resolve slide back-references and thread each chain in beat order.
pub fn link_slides(
    notes: &mut [Note],
    index: &NoteIndex,
    starts: &[NoteId],
    tails: &[NoteId],
    diagnostics: &mut Vec<ConvertError>,
) {
    attach(notes, index, tails, diagnostics);
    for &start in starts {
        order_chain(notes, start, diagnostics);
    }
}

fn attach(
    notes: &mut [Note],
    index: &NoteIndex,
    tails: &[NoteId],
    diagnostics: &mut Vec<ConvertError>,
) {
    for &id in tails {
        let Some(start_key) = notes[id].back_ref() else {
            continue;
        };
        let key = notes[id].key;

        let Some(start_id) = index.get(start_key) else {
            report(
                diagnostics,
                ConvertError::new(
                    "E4001",
                    format!("{} at {key} refers to missing slide start {start_key}", notes[id].variant_name()),
                )
                .with_position(key.pos)
                .with_lane(key.lane),
            );
            continue;
        };

        let target_name = notes[start_id].variant_name();
        match &mut notes[start_id].kind {
            NoteKind::SlideStart { successors, .. } => successors.push(id),
            _ => report(
                diagnostics,
                ConvertError::new(
                    "E4002",
                    format!("slide node at {key} refers to {target_name} at {start_key}, not a slide start"),
                )
                .with_position(key.pos)
                .with_lane(key.lane),
            ),
        }
    }
}

fn order_chain(notes: &mut [Note], start: NoteId, diagnostics: &mut Vec<ConvertError>) {
    let start_key = notes[start].key;
    let mut successors = match &mut notes[start].kind {
        NoteKind::SlideStart { successors, .. } => std::mem::take(successors),
        _ => return,
    };

    if successors.is_empty() {
        report(
            diagnostics,
            ConvertError::new("E4003", format!("slide start at {start_key} has no successors"))
                .with_position(start_key.pos)
                .with_lane(start_key.lane),
        );
        return;
    }

    // Stable: equal positions keep declaration order.
    successors.sort_by_key(|&id| notes[id].key.pos);

    let mut prev = start;
    for &id in &successors {
        if notes[id].key.pos <= notes[prev].key.pos {
            report(
                diagnostics,
                ConvertError::new(
                    "E4004",
                    format!(
                        "slide node {} is not after {} in chain from {start_key}",
                        notes[id].key, notes[prev].key
                    ),
                )
                .with_position(notes[id].key.pos)
                .with_lane(notes[id].key.lane),
            );
        }
        notes[prev].next = Some(id);
        notes[id].prev = Some(prev);
        prev = id;
    }

    let last = successors.len() - 1;
    let misplaced_end = successors[..last].iter().any(|&id| notes[id].is_terminal());
    if misplaced_end || !notes[successors[last]].is_terminal() {
        report(
            diagnostics,
            ConvertError::new(
                "E4003",
                format!("slide chain from {start_key} must end with exactly one end node"),
            )
            .with_position(start_key.pos)
            .with_lane(start_key.lane),
        );
    }

    if let NoteKind::SlideStart { successors: slot, .. } = &mut notes[start].kind {
        *slot = successors;
    }
}

/// Nodes of the chain owned by `start`, following `next` links.
pub fn chain(notes: &[Note], start: NoteId) -> Vec<NoteId> {
    let mut out = vec![start];
    let mut cur = start;
    while let Some(next) = notes[cur].next {
        if out.len() > notes.len() || notes[cur].is_terminal() {
            break;
        }
        out.push(next);
        cur = next;
    }
    out
}
