use std::path::PathBuf;

/// File locations of one song inside a project tree.
///
/// ```text
/// <root>/custom/<song>/<song>.{json,sav,wav}   inputs
/// <root>/orig/all.{5,1}.json                   catalog sources
/// <root>/all/all.{5,1}.json                    catalog outputs
/// <root>/graphics/chart/<outputJson>           map stream
/// <root>/graphics/simulator/<outputJson>       simulator stream
/// <root>/music/<outputMP3>                     padded audio
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    pub root: PathBuf,
    pub song: String,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>, song: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            song: song.into(),
        }
    }

    fn song_dir(&self) -> PathBuf {
        self.root.join("custom").join(&self.song)
    }

    fn song_file(&self, ext: &str) -> PathBuf {
        self.song_dir().join(format!("{}.{ext}", self.song))
    }

    pub fn config_path(&self) -> PathBuf {
        self.song_file("json")
    }

    pub fn chart_path(&self) -> PathBuf {
        self.song_file("sav")
    }

    pub fn audio_path(&self) -> PathBuf {
        self.song_file("wav")
    }

    pub fn song_catalog_src(&self) -> PathBuf {
        self.root.join("orig").join("all.5.json")
    }

    pub fn singer_catalog_src(&self) -> PathBuf {
        self.root.join("orig").join("all.1.json")
    }

    pub fn song_catalog_out(&self) -> PathBuf {
        self.root.join("all").join("all.5.json")
    }

    pub fn singer_catalog_out(&self) -> PathBuf {
        self.root.join("all").join("all.1.json")
    }

    pub fn map_stream_out(&self, file_name: &str) -> PathBuf {
        self.root.join("graphics").join("chart").join(file_name)
    }

    pub fn simulator_stream_out(&self, file_name: &str) -> PathBuf {
        self.root.join("graphics").join("simulator").join(file_name)
    }

    pub fn audio_out(&self, file_name: &str) -> PathBuf {
        self.root.join("music").join(file_name)
    }
}
