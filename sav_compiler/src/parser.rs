use roxmltree::{Document, Node};

use crate::note::{NoteType, RawNote};
use crate::ConvertError;

/// Entry groups in the order the editor writes them.
const ENTRY_SUFFIXES: [&str; 3] = ["N", "L", "F"];

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSav {
    pub bpm: u32,
    /// Seconds from the start of the source audio to the first beat.
    pub delay: f64,
    pub notes: Vec<RawNote>,
}

pub fn parse_sav(src: &str) -> Result<ParsedSav, ConvertError> {
    let doc = Document::parse(src)
        .map_err(|e| ConvertError::new("E1001", format!("malformed chart document: {e}")))?;
    let root = doc.root_element();

    let info = root
        .descendants()
        .find(|n| n.has_tag_name("info"))
        .ok_or_else(|| ConvertError::new("E1002", "missing <info> block"))?;

    let bpm_text = child_text(&doc, info, "bpm")?;
    let bpm: u32 = bpm_text.parse().map_err(|_| {
        ConvertError::new("E1003", format!("invalid bpm: {bpm_text}"))
            .with_line(line_of(&doc, info))
    })?;
    if bpm == 0 {
        return Err(ConvertError::new("E3001", "bpm must be > 0").with_line(line_of(&doc, info)));
    }

    let delay_text = child_text(&doc, info, "delay")?;
    let delay: f64 = delay_text.parse().map_err(|_| {
        ConvertError::new("E1003", format!("invalid delay: {delay_text}"))
            .with_line(line_of(&doc, info))
    })?;

    let mut notes = Vec::new();
    for suffix in ENTRY_SUFFIXES {
        let tag = format!("note{suffix}");
        for entry in root.descendants().filter(|n| n.has_tag_name(tag.as_str())) {
            notes.push(parse_entry(&doc, entry, suffix)?);
        }
    }

    log::debug!("parsed chart: bpm={bpm}, delay={delay}, {} entries", notes.len());
    Ok(ParsedSav { bpm, delay, notes })
}

fn parse_entry(doc: &Document, entry: Node, suffix: &str) -> Result<RawNote, ConvertError> {
    let line = line_of(doc, entry);

    let code = child_text(doc, entry, &format!("type{suffix}"))?;
    let note_type = NoteType::from_code(code).ok_or_else(|| {
        ConvertError::new("E1004", format!("unknown note type: {code}"))
            .with_line(line)
            .with_context(code.to_string())
    })?;

    let lane = parse_lane(doc, entry, &format!("line{suffix}"))?;
    let pos = child_text(doc, entry, &format!("pos{suffix}"))?.to_string();

    let start = if note_type.has_back_ref() {
        let start_lane = parse_lane(doc, entry, "startlineL")?;
        let start_pos = child_text(doc, entry, "startposL")?.to_string();
        Some((start_lane, start_pos))
    } else {
        None
    };

    Ok(RawNote {
        note_type,
        lane,
        pos,
        start,
        line,
    })
}

fn parse_lane(doc: &Document, entry: Node, name: &str) -> Result<i32, ConvertError> {
    let text = child_text(doc, entry, name)?;
    text.parse().map_err(|_| {
        ConvertError::new("E1003", format!("invalid <{name}>: {text}"))
            .with_line(line_of(doc, entry))
            .with_context(text.to_string())
    })
}

fn child_text<'a>(doc: &Document, parent: Node<'a, '_>, name: &str) -> Result<&'a str, ConvertError> {
    parent
        .descendants()
        .find(|n| n.has_tag_name(name))
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            ConvertError::new(
                "E1002",
                format!("<{}> is missing <{name}>", parent.tag_name().name()),
            )
            .with_line(line_of(doc, parent))
        })
}

fn line_of(doc: &Document, node: Node) -> u32 {
    doc.text_pos_at(node.range().start).row
}
