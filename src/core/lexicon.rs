// File: src/core/lexicon.rs
use crate::core::natural::sort_natural;
use crate::core::types::{LessonRef, SourceId};
use crate::error::{VocabError, VocabResult};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tracing::info;

/// One curriculum: lesson key -> words in textbook order. Read-only once loaded.
#[derive(Debug, Clone, Default)]
pub struct LexiconSource {
    lessons: HashMap<String, Vec<String>>,
}

impl LexiconSource {
    pub fn new(lessons: HashMap<String, Vec<String>>) -> Self {
        Self { lessons }
    }

    pub fn from_json_str(json: &str) -> VocabResult<Self> {
        let lessons: HashMap<String, Vec<String>> = serde_json::from_str(json)
            .map_err(|e| VocabError::init(format!("malformed lexicon: {}", e)))?;
        Ok(Self::new(lessons))
    }

    pub fn words(&self, key: &str) -> Option<&[String]> {
        self.lessons.get(key).map(Vec::as_slice)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lessons.contains_key(key)
    }

    /// Lesson keys in natural order.
    pub fn sorted_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.lessons.keys().map(String::as_str).collect();
        sort_natural(&mut keys);
        keys
    }

    pub fn len(&self) -> usize {
        self.lessons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }
}

/// All loaded curricula.
#[derive(Debug, Clone, Default)]
pub struct LexiconStore {
    sources: BTreeMap<SourceId, LexiconSource>,
}

impl LexiconStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: SourceId, source: LexiconSource) {
        self.sources.insert(id, source);
    }

    pub fn load_file(&mut self, id: SourceId, path: &Path) -> VocabResult<()> {
        let json = fs::read_to_string(path)
            .map_err(|e| VocabError::init(format!("cannot read {} lexicon {}: {}", id, path.display(), e)))?;
        let source = LexiconSource::from_json_str(&json)?;
        info!(source = %id, lessons = source.len(), "lexicon loaded");
        self.insert(id, source);
        Ok(())
    }

    pub fn get(&self, id: SourceId) -> Option<&LexiconSource> {
        self.sources.get(&id)
    }

    pub fn sources(&self) -> impl Iterator<Item = (SourceId, &LexiconSource)> {
        self.sources.iter().map(|(id, s)| (*id, s))
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn lesson_words(&self, lesson: &LessonRef) -> Option<&[String]> {
        self.get(lesson.source)?.words(&lesson.key)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLevel {
    Text(String),
    Number(serde_json::Number),
}

/// Externally supplied word -> proficiency tag table.
#[derive(Debug, Clone, Default)]
pub struct LevelTable {
    levels: HashMap<String, String>,
}

impl LevelTable {
    pub fn new(levels: HashMap<String, String>) -> Self {
        Self { levels }
    }

    pub fn from_json_str(json: &str) -> VocabResult<Self> {
        let raw: HashMap<String, RawLevel> = serde_json::from_str(json)
            .map_err(|e| VocabError::init(format!("malformed level table: {}", e)))?;
        let levels = raw
            .into_iter()
            .map(|(word, level)| {
                let level = match level {
                    RawLevel::Text(s) => s,
                    RawLevel::Number(n) => n.to_string(),
                };
                (word, level)
            })
            .collect();
        Ok(Self { levels })
    }

    pub fn load_file(path: &Path) -> VocabResult<Self> {
        let json = fs::read_to_string(path)
            .map_err(|e| VocabError::init(format!("cannot read level table {}: {}", path.display(), e)))?;
        let table = Self::from_json_str(&json)?;
        info!(entries = table.len(), "level table loaded");
        Ok(table)
    }

    pub fn raw(&self, word: &str) -> Option<&str> {
        self.levels.get(word).map(String::as_str)
    }

    /// The displayable level: first ASCII digit run of the tag, or the raw tag.
    pub fn level_of(&self, word: &str) -> Option<String> {
        self.raw(word).map(extract_level)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.levels.iter().map(|(w, l)| (w.as_str(), l.as_str()))
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

pub fn extract_level(raw: &str) -> String {
    let digits: String = raw
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        raw.to_string()
    } else {
        digits
    }
}
