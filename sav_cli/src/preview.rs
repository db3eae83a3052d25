use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

use chart_schema::{Event, Lane, Seconds, LANE_MAX, LANE_MIN};

const LANES: usize = (LANE_MAX - LANE_MIN + 1) as usize;

fn to_ms(t: Seconds) -> u64 {
    (t * 1000.0).round().max(0.0) as u64
}

fn slot(lane: Lane) -> Option<usize> {
    (LANE_MIN..=LANE_MAX)
        .contains(&lane)
        .then(|| usize::from(lane - LANE_MIN))
}

fn note_char(event: &Event) -> Option<char> {
    Some(match event {
        Event::Single { .. } => 'N',
        Event::SingleOff { .. } => 'n',
        Event::Flick { .. } => 'F',
        Event::Skill { .. } => 'S',
        Event::Long { .. } => 'L',
        Event::Tick { .. } => 't',
        _ => return None,
    })
}

pub fn render_preview(events: &[Event]) -> String {
    let mut out = String::new();

    let mut by_time: BTreeMap<u64, Vec<&Event>> = BTreeMap::new();
    let mut time_points = BTreeSet::new();
    for ev in events {
        let t = to_ms(ev.time());
        by_time.entry(t).or_default().push(ev);
        time_points.insert(t);
        if let Event::Bar { time, .. } = ev {
            time_points.insert(to_ms(time[1]));
        }
    }

    if time_points.is_empty() {
        out.push_str("Stream is empty.\n");
        return out;
    }

    let notes = events.iter().filter(|e| note_char(e).is_some()).count();
    let _ = writeln!(out, "Preview ({notes} notes)");
    out.push_str("Time(ms) | 1 2 3 4 5 6 7 | Info\n");
    out.push_str("---------|---------------|------------------\n");

    // Per-lane end time of the slide body currently passing through it.
    let mut holding: [Option<u64>; LANES] = [None; LANES];

    for &t in &time_points {
        let mut lane_chars = ['.'; LANES];
        let mut info_parts = Vec::new();

        for (i, hold) in holding.iter_mut().enumerate() {
            match *hold {
                Some(end) if end > t => lane_chars[i] = '|',
                Some(_) => *hold = None,
                None => {}
            }
        }

        for ev in by_time.get(&t).into_iter().flatten() {
            if let (Some(ch), Some(i)) = (note_char(ev), ev.lane().and_then(slot)) {
                lane_chars[i] = ch;
                continue;
            }
            match ev {
                Event::Bar { lane, time } => {
                    if let Some(i) = slot(lane[0]) {
                        holding[i] = Some(to_ms(time[1]));
                    }
                }
                Event::Sim { lane, .. } => info_parts.push(format!("sim {}+{}", lane[0], lane[1])),
                Event::Bpm { bpm, .. } => info_parts.push(format!("BPM: {bpm}")),
                other => info_parts.push(other.type_name().to_string()),
            }
        }

        let lane_str = lane_chars
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        let _ = writeln!(out, "{t:8} | {lane_str} | {}", info_parts.join(", "));
    }

    out
}

pub fn print_preview(events: &[Event]) {
    print!("{}", render_preview(events));
}
