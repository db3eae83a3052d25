use std::{fs, path::Path};

use serde_json::{json, Value};

use crate::config::SongMeta;
use crate::ConvertError;

/// Band id the custom singer is registered under.
pub const CUSTOM_BAND_ID: u32 = 999;
/// Song entry that is replaced by the converted chart.
pub const SONG_ENTRY_KEY: &str = "1";
/// Localised name slots in the game catalogs.
const LOCALE_COUNT: usize = 4;

/// Point the song entry at the custom band and rewrite its title and levels.
pub fn merge_song(songs: &mut Value, meta: &SongMeta) -> Result<(), ConvertError> {
    let entry = songs
        .get_mut(SONG_ENTRY_KEY)
        .and_then(Value::as_object_mut)
        .ok_or_else(|| {
            ConvertError::new("E2004", format!("song catalog has no entry \"{SONG_ENTRY_KEY}\""))
        })?;

    entry.insert("bandId".to_string(), json!(CUSTOM_BAND_ID));
    entry.insert(
        "musicTitle".to_string(),
        json!(vec![meta.name.as_str(); LOCALE_COUNT]),
    );

    for (index, level) in meta.difficulty.iter().enumerate() {
        let slot = entry
            .get_mut("difficulty")
            .and_then(|d| d.get_mut(index.to_string()))
            .and_then(Value::as_object_mut)
            .ok_or_else(|| {
                ConvertError::new(
                    "E2004",
                    format!("song catalog entry \"{SONG_ENTRY_KEY}\" has no difficulty {index}"),
                )
            })?;
        slot.insert("playLevel".to_string(), json!(level));
    }
    Ok(())
}

/// Register the custom singer under [`CUSTOM_BAND_ID`].
pub fn merge_singer(singers: &mut Value, meta: &SongMeta) -> Result<(), ConvertError> {
    let map = singers
        .as_object_mut()
        .ok_or_else(|| ConvertError::new("E2004", "singer catalog is not a JSON object"))?;
    map.insert(
        CUSTOM_BAND_ID.to_string(),
        json!({ "bandName": vec![meta.singer.as_str(); LOCALE_COUNT] }),
    );
    Ok(())
}

fn read_catalog(path: &Path) -> Result<Value, ConvertError> {
    let bytes = fs::read(path).map_err(|e| {
        ConvertError::new("E2001", format!("failed to read catalog: {e}"))
            .with_file(path.display().to_string())
    })?;
    serde_json::from_slice(&bytes).map_err(|e| {
        ConvertError::new("E2004", format!("invalid catalog json: {e}"))
            .with_file(path.display().to_string())
    })
}

pub(crate) fn write_json(path: &Path, value: &impl serde::Serialize) -> Result<(), ConvertError> {
    let io_err = |e: &dyn std::fmt::Display| {
        ConvertError::new("E2001", format!("failed to write: {e}")).with_file(path.display().to_string())
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_err(&e))?;
    }
    let json = serde_json::to_string(value).map_err(|e| io_err(&e))?;
    fs::write(path, json).map_err(|e| io_err(&e))
}

/// Read both source catalogs, merge `meta` into them and write the results.
pub fn rewrite_catalogs(
    songs_src: &Path,
    singers_src: &Path,
    songs_out: &Path,
    singers_out: &Path,
    meta: &SongMeta,
) -> Result<(), ConvertError> {
    let mut songs = read_catalog(songs_src)?;
    merge_song(&mut songs, meta).map_err(|e| e.with_file(songs_src.display().to_string()))?;

    let mut singers = read_catalog(singers_src)?;
    merge_singer(&mut singers, meta).map_err(|e| e.with_file(singers_src.display().to_string()))?;

    write_json(songs_out, &songs)?;
    write_json(singers_out, &singers)?;
    log::info!("wrote catalogs {} and {}", songs_out.display(), singers_out.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> SongMeta {
        SongMeta {
            name: "Custom Song".to_string(),
            singer: "Custom Band".to_string(),
            difficulty: vec![7, 13, 20],
        }
    }

    #[test]
    fn song_entry_rewritten() {
        let mut songs = json!({
            "1": {
                "bandId": 1,
                "musicTitle": ["a", "b", "c", "d"],
                "difficulty": {
                    "0": { "playLevel": 5 },
                    "1": { "playLevel": 10 },
                    "2": { "playLevel": 15 },
                    "3": { "playLevel": 25 }
                }
            },
            "2": { "bandId": 2 }
        });
        merge_song(&mut songs, &meta()).unwrap();

        assert_eq!(songs["1"]["bandId"], 999);
        assert_eq!(songs["1"]["musicTitle"], json!(vec!["Custom Song"; 4]));
        assert_eq!(songs["1"]["difficulty"]["2"]["playLevel"], 20);
        assert_eq!(songs["1"]["difficulty"]["3"]["playLevel"], 25);
        assert_eq!(songs["2"]["bandId"], 2);
    }

    #[test]
    fn missing_song_entry_is_e2004() {
        let mut songs = json!({ "2": {} });
        assert_eq!(merge_song(&mut songs, &meta()).unwrap_err().code, "E2004");

        let mut songs = json!({ "1": { "difficulty": { "0": {} } } });
        assert_eq!(merge_song(&mut songs, &meta()).unwrap_err().code, "E2004");
    }

    #[test]
    fn singer_registered_under_custom_band() {
        let mut singers = json!({ "1": { "bandName": vec!["x"; 4] } });
        merge_singer(&mut singers, &meta()).unwrap();
        assert_eq!(singers["999"]["bandName"], json!(vec!["Custom Band"; 4]));
        assert_eq!(singers["1"]["bandName"][0], "x");
    }
}
