// File: src/config.rs
use crate::core::lexicon::{LevelTable, LexiconStore};
use crate::core::segmenter::SegmentOptions;
use crate::core::types::SourceId;
use crate::error::{VocabError, VocabResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmenterKind {
    /// Dictionary-biased maximum matching.
    #[default]
    Dictionary,
    /// Unicode word bounds only.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataPaths {
    pub levels: PathBuf,
    pub sources: BTreeMap<SourceId, PathBuf>,
}

impl Default for DataPaths {
    fn default() -> Self {
        Self {
            levels: PathBuf::from("tbcl_data.json"),
            sources: BTreeMap::from([
                (SourceId::Lai, PathBuf::from("learn_chinese_data.json")),
                (SourceId::Mtc, PathBuf::from("mtc_data.json")),
            ]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub segmenter: SegmenterKind,
    pub bias_multi_char: bool,
    pub use_grammar_heuristics: bool,
    pub default_source: SourceId,
    pub data: DataPaths,
    /// Where the session snapshot lives; `None` disables persistence.
    pub state_path: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            segmenter: SegmenterKind::default(),
            bias_multi_char: true,
            use_grammar_heuristics: true,
            default_source: SourceId::Lai,
            data: DataPaths::default(),
            state_path: default_state_path(),
        }
    }
}

pub fn default_state_path() -> Option<PathBuf> {
    let mut path = dirs::data_local_dir().or_else(dirs::home_dir)?;
    path.push("vocab-sieve");
    path.push("session.bin");
    Some(path)
}

impl SessionConfig {
    /// Reads a JSON config. A missing file means defaults.
    pub fn load(path: &Path) -> VocabResult<Self> {
        match fs::read_to_string(path) {
            Ok(json) => {
                let config = serde_json::from_str(&json)
                    .map_err(|e| VocabError::init(format!("malformed config {}: {}", path.display(), e)))?;
                info!(path = %path.display(), "config loaded");
                Ok(config)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn segment_options(&self) -> SegmentOptions {
        SegmentOptions {
            bias_multi_char: self.bias_multi_char,
            use_grammar_heuristics: self.use_grammar_heuristics,
        }
    }

    /// Loads every configured lexicon and the level table, relative to `base`.
    pub fn load_data(&self, base: &Path) -> VocabResult<(LexiconStore, LevelTable)> {
        let levels = LevelTable::load_file(&base.join(&self.data.levels))?;
        let mut store = LexiconStore::new();
        for (id, path) in &self.data.sources {
            store.load_file(*id, &base.join(path))?;
        }
        Ok((store, levels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn test_missing_config_gives_defaults() {
        let config = SessionConfig::load(Path::new("/no/such/vocab.json")).unwrap();
        assert_eq!(config.segmenter, SegmenterKind::Dictionary);
        assert!(config.bias_multi_char);
        assert_eq!(config.default_source, SourceId::Lai);
    }

    #[test]
    fn test_partial_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"segmenter":"fallback","default_source":"mtc","state_path":null}}"#).unwrap();
        let config = SessionConfig::load(file.path()).unwrap();
        assert_eq!(config.segmenter, SegmenterKind::Fallback);
        assert_eq!(config.default_source, SourceId::Mtc);
        assert_eq!(config.state_path, None);
        assert!(config.use_grammar_heuristics);
    }

    #[test]
    fn test_malformed_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(SessionConfig::load(file.path()), Err(VocabError::Initialization(_))));
    }

    #[test]
    fn test_load_data_requires_every_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("tbcl_data.json"), r#"{"世界":"2"}"#).unwrap();
        fs::write(dir.path().join("learn_chinese_data.json"), r#"{"B1":["你好"]}"#).unwrap();
        let config = SessionConfig::default();
        assert!(matches!(config.load_data(dir.path()), Err(VocabError::Initialization(_))));

        fs::write(dir.path().join("mtc_data.json"), r#"{"1-1":["你好"]}"#).unwrap();
        let (store, levels) = config.load_data(dir.path()).unwrap();
        assert!(store.get(SourceId::Mtc).is_some());
        assert_eq!(levels.len(), 1);
    }
}
