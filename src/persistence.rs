// File: src/persistence.rs
use crate::core::dictionary::KnownWordDictionary;
use crate::core::selection::SelectionState;
use crate::core::types::SourceId;
use crate::error::VocabResult;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

/// What survives between sessions. Lexicons and levels are reloaded from
/// their own files; only what the user taught or chose is kept here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub known_words: KnownWordDictionary,
    pub selection: SelectionState,
    pub active_source: SourceId,
}

/// Writes into a temp file next to `path`, then renames over it.
fn write_atomically(path: &Path, write: impl FnOnce(&mut BufWriter<&NamedTempFile>) -> VocabResult<()>) -> VocabResult<()> {
    let parent_dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent_dir)?;

    let temp_file = NamedTempFile::new_in(parent_dir)?;
    {
        let mut writer = BufWriter::new(&temp_file);
        write(&mut writer)?;
        writer.flush()?;
    }
    temp_file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

pub fn save_to_disk(snapshot: &SessionSnapshot, path: &Path) -> VocabResult<()> {
    write_atomically(path, |writer| Ok(bincode::serialize_into(writer, snapshot)?))?;
    info!(path = %path.display(), known = snapshot.known_words.len(), "session saved");
    Ok(())
}

pub fn load_from_disk(path: &Path) -> VocabResult<SessionSnapshot> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let snapshot: SessionSnapshot = bincode::deserialize_from(reader)?;
    info!(path = %path.display(), known = snapshot.known_words.len(), "session restored");
    Ok(snapshot)
}

/// Custom vocabulary as a flat JSON list of strings.
pub fn save_custom_vocabulary<I, S>(words: I, path: &Path) -> VocabResult<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let list: Vec<String> = words.into_iter().map(|w| w.as_ref().to_string()).collect();
    write_atomically(path, |writer| Ok(serde_json::to_writer(writer, &list)?))
}

pub fn load_custom_vocabulary(path: &Path) -> VocabResult<Vec<String>> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::LessonRef;
    use tempfile::tempdir;

    #[test]
    fn test_snapshot_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("session.bin");
        let snapshot = SessionSnapshot {
            known_words: ["你好", "看", "書"].into_iter().collect(),
            selection: serde_json::from_value(serde_json::json!({
                "lessons": [LessonRef::new(SourceId::Lai, "B1")],
                "custom": ["電腦"],
            }))
            .unwrap(),
            active_source: SourceId::Mtc,
        };
        save_to_disk(&snapshot, &path).unwrap();
        assert_eq!(load_from_disk(&path).unwrap(), snapshot);
    }

    #[test]
    fn test_custom_vocabulary_is_flat_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.json");
        save_custom_vocabulary(["電腦", "手機"], &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"["電腦","手機"]"#);
        assert_eq!(load_custom_vocabulary(&path).unwrap(), vec!["電腦", "手機"]);
    }

    #[test]
    fn test_load_missing_snapshot_fails() {
        let dir = tempdir().unwrap();
        assert!(load_from_disk(&dir.path().join("absent.bin")).is_err());
    }
}
