use chart_schema::{Event, EventStream};

use crate::beat::BeatPos;
use crate::error::report;
use crate::index::{FeverRole, NoteIndex};
use crate::link::link_slides;
use crate::note::{Note, NoteKind, RawNote, SkillTarget};
use crate::tempo::TempoContext;
use crate::ConvertError;

/// Ready, start and end.
pub const MAX_FEVER_MARKERS: usize = 3;

/// Output of one assembler pass.
#[derive(Debug, Clone, Default)]
pub struct Assembly {
    /// Map stream: BPM header, fever markers and every note event.
    pub full: EventStream,
    /// Note events only, for the simulator.
    pub simulator: EventStream,
    /// Non-fatal problems, already logged.
    pub diagnostics: Vec<ConvertError>,
}

pub fn assemble(
    raw_notes: &[RawNote],
    skills: &[SkillTarget],
    fevers: &[BeatPos],
    tempo: &TempoContext,
) -> Result<Assembly, ConvertError> {
    let mut diagnostics = Vec::new();

    // 1. arena + index, slide side lists
    let mut notes: Vec<Note> = Vec::with_capacity(raw_notes.len());
    let mut index = NoteIndex::new();
    let mut starts = Vec::new();
    let mut tails = Vec::new();

    for raw in raw_notes {
        let note = Note::from_raw(raw).map_err(|e| e.with_line(raw.line))?;
        let id = notes.len();
        if let Some(replaced) = index.insert(note.key, id) {
            report(
                &mut diagnostics,
                ConvertError::new(
                    "E4301",
                    format!(
                        "{} at {} replaces earlier {} at the same position and lane",
                        note.variant_name(),
                        note.key,
                        notes[replaced].variant_name()
                    ),
                )
                .with_line(raw.line)
                .with_position(note.key.pos)
                .with_lane(note.key.lane),
            );
        }
        match note.kind {
            NoteKind::SlideStart { .. } => starts.push(id),
            NoteKind::SlideMiddle { .. } | NoteKind::SlideEndTap { .. } | NoteKind::SlideEndFlick { .. } => {
                tails.push(id)
            }
            _ => {}
        }
        notes.push(note);
    }

    // 2. slides
    link_slides(&mut notes, &index, &starts, &tails, &mut diagnostics);

    // 3. skill overrides
    for target in skills {
        match target.key().and_then(|key| index.get(key)) {
            None => report(
                &mut diagnostics,
                ConvertError::new("E4101", format!("no note at {target}")).with_position(target.pos),
            ),
            Some(id) => {
                if let Err(e) = notes[id].set_skill() {
                    report(&mut diagnostics, e);
                }
            }
        }
    }

    // 4. fever markers
    if fevers.len() > MAX_FEVER_MARKERS {
        report(
            &mut diagnostics,
            ConvertError::new(
                "E4201",
                format!(
                    "{} fever markers declared, expected at most {MAX_FEVER_MARKERS}; extra markers become FeverEnd",
                    fevers.len()
                ),
            ),
        );
    }
    for (i, &pos) in fevers.iter().enumerate() {
        index.set_fever(pos, FeverRole::from_ordinal(i));
    }

    // 5. emit in position order, 6. BPM header
    let mut full = vec![Event::Bpm {
        bpm: tempo.bpm,
        time: 0.0,
    }];
    let mut simulator = Vec::new();
    let mut emitted = Vec::new();

    for (pos, slot) in index.iter() {
        let time = tempo.to_seconds(pos);
        if let Some(role) = slot.fever {
            full.push(role.event(time));
        }

        // Lanes of emitted notes that can take part in a Sim.
        let mut sim_candidates = Vec::new();
        for (&lane, &id) in &slot.lanes {
            emitted.clear();
            match notes[id].emit(&notes, tempo, &mut emitted) {
                Ok(()) => {
                    full.extend_from_slice(&emitted);
                    simulator.extend_from_slice(&emitted);
                    if !notes[id].is_slide_middle() {
                        sim_candidates.push(lane);
                    }
                }
                Err(e) => report(&mut diagnostics, e),
            }
        }

        let mut sim_lanes = sim_candidates.into_iter();
        if let (Some(a), Some(b), None) = (sim_lanes.next(), sim_lanes.next(), sim_lanes.next()) {
            let sim = Event::Sim { lane: [a, b], time };
            full.push(sim.clone());
            simulator.push(sim);
        }
    }

    log::info!(
        "assembled {} notes into {} map events / {} simulator events ({} warnings)",
        index.len(),
        full.len(),
        simulator.len(),
        diagnostics.len()
    );

    Ok(Assembly {
        full,
        simulator,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::NoteType;

    fn tempo() -> TempoContext {
        TempoContext::new(120, 8).unwrap()
    }

    fn note(note_type: NoteType, lane: i32, pos: &str) -> RawNote {
        RawNote {
            note_type,
            lane,
            pos: pos.to_string(),
            start: None,
            line: 0,
        }
    }

    fn slide(note_type: NoteType, lane: i32, pos: &str, start: (i32, &str)) -> RawNote {
        RawNote {
            start: Some((start.0, start.1.to_string())),
            ..note(note_type, lane, pos)
        }
    }

    fn skill(pos: u64, lane: i64) -> SkillTarget {
        SkillTarget {
            pos: BeatPos::from_eighths(pos),
            lane,
        }
    }

    fn names(stream: &[Event]) -> Vec<&'static str> {
        stream.iter().map(|e| e.type_name()).collect()
    }

    fn sims(stream: &[Event]) -> Vec<&Event> {
        stream.iter().filter(|e| matches!(e, Event::Sim { .. })).collect()
    }

    #[test]
    fn bpm_header_only_in_full_stream() {
        let a = assemble(&[note(NoteType::Single, 0, "0")], &[], &[], &tempo()).unwrap();
        assert_eq!(a.full[0], Event::Bpm { bpm: 120, time: 0.0 });
        assert_eq!(names(&a.simulator), ["Single"]);
        assert_eq!(a.simulator[0], Event::Single { lane: 4, time: 2.0 });
    }

    #[test]
    fn positions_emitted_in_numeric_order() {
        let raw = [
            note(NoteType::Single, 0, "10"),
            note(NoteType::Single, 0, "9"),
            note(NoteType::Flick, 0, "100"),
        ];
        let a = assemble(&raw, &[], &[], &tempo()).unwrap();
        let times: Vec<_> = a.simulator.iter().map(|e| e.time()).collect();
        assert_eq!(times, [4.25, 4.5, 27.0]);
        assert!(a.full.windows(2).all(|w| w[0].time() <= w[1].time()));
    }

    #[test]
    fn no_shared_positions_means_no_sim() {
        let raw = [
            note(NoteType::Single, -2, "0"),
            note(NoteType::Single, 2, "4"),
            note(NoteType::Flick, 0, "8"),
        ];
        let a = assemble(&raw, &[], &[], &tempo()).unwrap();
        assert!(sims(&a.full).is_empty());
        assert!(sims(&a.simulator).is_empty());
    }

    #[test]
    fn two_notes_at_same_position_emit_one_sim_in_both_streams() {
        let raw = [note(NoteType::Flick, 2, "8"), note(NoteType::Single, -2, "8")];
        let a = assemble(&raw, &[], &[], &tempo()).unwrap();

        assert_eq!(sims(&a.full), [&Event::Sim { lane: [2, 6], time: 4.0 }]);
        assert_eq!(sims(&a.simulator).len(), 1);
        assert_eq!(names(&a.simulator), ["Single", "Flick", "Sim"]);
    }

    #[test]
    fn three_notes_at_same_position_emit_no_sim() {
        let raw = [
            note(NoteType::Single, -2, "8"),
            note(NoteType::Single, 0, "8"),
            note(NoteType::Single, 2, "8"),
        ];
        let a = assemble(&raw, &[], &[], &tempo()).unwrap();
        assert!(sims(&a.full).is_empty());
    }

    #[test]
    fn slide_middle_is_exempt_from_sim() {
        let raw = [
            note(NoteType::SlideStart, 0, "0"),
            slide(NoteType::SlideMiddle, 0, "8", (0, "0")),
            slide(NoteType::SlideEndTap, 0, "16", (0, "0")),
            note(NoteType::Single, 3, "8"),
        ];
        let a = assemble(&raw, &[], &[], &tempo()).unwrap();
        assert!(sims(&a.full).is_empty());

        let raw = [
            note(NoteType::SlideStart, 0, "0"),
            slide(NoteType::SlideMiddle, 0, "8", (0, "0")),
            slide(NoteType::SlideEndTap, 0, "16", (0, "0")),
            note(NoteType::Single, 3, "8"),
            note(NoteType::Single, -3, "8"),
        ];
        let a = assemble(&raw, &[], &[], &tempo()).unwrap();
        assert_eq!(sims(&a.full), [&Event::Sim { lane: [1, 7], time: 4.0 }]);
    }

    #[test]
    fn slide_chain_emits_long_tick_bars_and_end() {
        let raw = [
            slide(NoteType::SlideEndFlick, 1, "16", (0, "0")),
            note(NoteType::SlideStart, 0, "0"),
            slide(NoteType::SlideMiddle, -1, "8", (0, "0")),
        ];
        let a = assemble(&raw, &[], &[], &tempo()).unwrap();
        assert!(a.diagnostics.is_empty(), "{:?}", a.diagnostics);
        assert_eq!(
            a.simulator,
            [
                Event::Long { lane: 4, time: 2.0 },
                Event::Bar {
                    lane: [4, 3],
                    time: [2.0, 4.0]
                },
                Event::Tick { lane: 3, time: 4.0 },
                Event::Bar {
                    lane: [3, 5],
                    time: [4.0, 6.0]
                },
                Event::Flick { lane: 5, time: 6.0 },
            ]
        );
    }

    #[test]
    fn skill_overrides_apply_or_report() {
        let raw = [
            note(NoteType::Single, 0, "0"),
            note(NoteType::SlideStart, 1, "8"),
            slide(NoteType::SlideMiddle, 1, "12", (1, "8")),
            slide(NoteType::SlideEndTap, 1, "16", (1, "8")),
        ];
        let skills = [skill(0, 4), skill(8, 5), skill(12, 5), skill(40, 1), skill(0, -1)];
        let a = assemble(&raw, &skills, &[], &tempo()).unwrap();

        let codes: Vec<_> = a.diagnostics.iter().map(|d| d.code).collect();
        assert_eq!(codes, ["E4102", "E4101", "E4101"]);
        assert_eq!(names(&a.simulator)[..3], ["Skill", "Skill", "Bar"]);
    }

    #[test]
    fn fever_markers_only_in_full_stream_by_declaration_order() {
        let raw = [note(NoteType::Single, 0, "8")];
        let fevers = [
            BeatPos::from_eighths(8),
            BeatPos::from_eighths(4),
            BeatPos::from_eighths(32),
        ];
        let a = assemble(&raw, &[], &fevers, &tempo()).unwrap();

        assert_eq!(
            names(&a.full),
            ["BPM", "FeverStart", "FeverReady", "Single", "FeverEnd"]
        );
        assert_eq!(names(&a.simulator), ["Single"]);
        assert!(a.diagnostics.is_empty());
    }

    #[test]
    fn extra_fever_markers_warn_and_fall_back_to_end() {
        let fevers: Vec<_> = (0..5).map(|i| BeatPos::from_eighths(i * 8)).collect();
        let a = assemble(&[], &[], &fevers, &tempo()).unwrap();
        assert_eq!(a.diagnostics[0].code, "E4201");
        assert_eq!(
            names(&a.full),
            ["BPM", "FeverReady", "FeverStart", "FeverEnd", "FeverEnd", "FeverEnd"]
        );
    }

    #[test]
    fn duplicate_key_overwrites_and_warns() {
        let raw = [note(NoteType::Single, 0, "4"), note(NoteType::Flick, 0, "4.0")];
        let a = assemble(&raw, &[], &[], &tempo()).unwrap();
        assert_eq!(a.diagnostics[0].code, "E4301");
        assert_eq!(names(&a.simulator), ["Flick"]);
    }

    #[test]
    fn unlinked_slide_start_is_omitted() {
        let raw = [note(NoteType::SlideStart, 0, "0"), note(NoteType::Single, 1, "4")];
        let a = assemble(&raw, &[], &[], &tempo()).unwrap();
        let codes: Vec<_> = a.diagnostics.iter().map(|d| d.code).collect();
        assert_eq!(codes, ["E4003", "E4005"]);
        assert_eq!(names(&a.simulator), ["Single"]);
    }

    #[test]
    fn omitted_slide_start_does_not_pair_into_sim() {
        let raw = [note(NoteType::Single, 1, "0"), note(NoteType::SlideStart, 0, "0")];
        let a = assemble(&raw, &[], &[], &tempo()).unwrap();
        let codes: Vec<_> = a.diagnostics.iter().map(|d| d.code).collect();
        assert_eq!(codes, ["E4003", "E4005"]);
        assert_eq!(a.simulator, [Event::Single { lane: 5, time: 2.0 }]);
        assert!(sims(&a.full).is_empty());
    }

    #[test]
    fn invalid_entry_is_fatal_with_line() {
        let mut bad = note(NoteType::Single, 9, "0");
        bad.line = 42;
        let err = assemble(&[bad], &[], &[], &tempo()).unwrap_err();
        assert_eq!(err.code, "E1005");
        assert_eq!(err.line, Some(42));
    }

    #[test]
    fn assembly_is_deterministic() {
        let raw = [
            note(NoteType::SlideStart, 0, "0"),
            slide(NoteType::SlideEndTap, 2, "8", (0, "0")),
            note(NoteType::Single, -2, "0"),
            note(NoteType::Single, 1, "3.5"),
        ];
        let fevers = [BeatPos::from_eighths(0), BeatPos::from_eighths(8)];
        let skills = [skill(0, 2)];

        let a = assemble(&raw, &skills, &fevers, &tempo()).unwrap();
        let b = assemble(&raw, &skills, &fevers, &tempo()).unwrap();
        assert_eq!(
            serde_json::to_string(&a.full).unwrap(),
            serde_json::to_string(&b.full).unwrap()
        );
        assert_eq!(
            serde_json::to_string(&a.simulator).unwrap(),
            serde_json::to_string(&b.simulator).unwrap()
        );
    }
}
