use std::{fs, path::Path};

use serde::Deserialize;

use crate::beat::BeatPos;
use crate::note::SkillTarget;
use crate::ConvertError;

pub const DEFAULT_OUTPUT_JSON: &str = "1.expert.json";
pub const DEFAULT_OUTPUT_AUDIO: &str = "bgm001.wav";

/// Difficulty level written as `12` or `"12"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum LevelRepr {
    Number(u32),
    Text(String),
}

#[derive(Debug, Clone, Deserialize)]
struct RawSongConfig {
    name: Option<String>,
    singer: Option<String>,
    difficulty: Option<Vec<LevelRepr>>,
    #[serde(default)]
    skills: Vec<(BeatPos, i64)>,
    #[serde(default)]
    fevers: Vec<BeatPos>,
    #[serde(rename = "preLength")]
    pre_length: Option<u32>,
    #[serde(rename = "outputMP3")]
    output_audio: Option<String>,
    #[serde(rename = "outputJson")]
    output_json: Option<String>,
}

/// Song metadata used for the catalog documents.
#[derive(Debug, Clone, PartialEq)]
pub struct SongMeta {
    pub name: String,
    pub singer: String,
    /// Play level per difficulty, easiest first.
    pub difficulty: Vec<u32>,
}

/// Per-song conversion settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SongConfig {
    pub meta: SongMeta,
    /// Notes to turn into skill notes, as `(position, lane)` after lane offset.
    pub skills: Vec<SkillTarget>,
    pub fevers: Vec<BeatPos>,
    /// Requested lead-in in eighth-beats.
    pub pre_length: Option<u32>,
    pub output_audio: Option<String>,
    pub output_json: Option<String>,
}

impl SongConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConvertError> {
        let path = path.as_ref();
        let src = fs::read_to_string(path).map_err(|e| {
            ConvertError::new("E2001", format!("cannot load config: {e}"))
                .with_file(path.display().to_string())
        })?;
        Self::from_json_str(&src).map_err(|e| e.with_file(path.display().to_string()))
    }

    pub fn from_json_str(src: &str) -> Result<Self, ConvertError> {
        let raw: RawSongConfig = serde_json::from_str(src)
            .map_err(|e| ConvertError::new("E2002", format!("invalid config json: {e}")))?;

        let missing: Vec<&str> = [
            ("name", raw.name.is_none()),
            ("singer", raw.singer.is_none()),
            ("difficulty", raw.difficulty.is_none()),
        ]
        .into_iter()
        .filter_map(|(key, absent)| absent.then_some(key))
        .collect();
        if !missing.is_empty() {
            return Err(ConvertError::new(
                "E2003",
                format!("song meta info is not enough (missing: {})", missing.join(", ")),
            ));
        }

        let difficulty = raw
            .difficulty
            .unwrap_or_default()
            .into_iter()
            .map(|level| match level {
                LevelRepr::Number(n) => Ok(n),
                LevelRepr::Text(s) => s.trim().parse().map_err(|_| {
                    ConvertError::new("E2002", format!("invalid difficulty level: {s}"))
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            meta: SongMeta {
                name: raw.name.unwrap_or_default(),
                singer: raw.singer.unwrap_or_default(),
                difficulty,
            },
            skills: raw
                .skills
                .into_iter()
                .map(|(pos, lane)| SkillTarget { pos, lane })
                .collect(),
            fevers: raw.fevers,
            pre_length: raw.pre_length,
            output_audio: raw.output_audio,
            output_json: raw.output_json,
        })
    }

    pub fn output_json_name(&self) -> &str {
        self.output_json.as_deref().unwrap_or(DEFAULT_OUTPUT_JSON)
    }

    pub fn output_audio_name(&self) -> &str {
        self.output_audio.as_deref().unwrap_or(DEFAULT_OUTPUT_AUDIO)
    }
}
