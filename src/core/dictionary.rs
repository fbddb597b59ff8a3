// File: src/core/dictionary.rs
use crate::core::lexicon::LevelTable;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Mutable set of word forms that bias segmentation.
///
/// Seeded from every lexicon word, then grown and shrunk by relearning.
/// Never consulted for filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownWordDictionary {
    words: HashSet<String>,
    /// Forms the user split apart. Segmenters must not produce them again
    /// until they are taught back.
    rejected: HashSet<String>,
}

impl KnownWordDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the word was not present before.
    pub fn insert(&mut self, word: &str) -> bool {
        self.rejected.remove(word);
        if word.is_empty() || self.words.contains(word) {
            return false;
        }
        self.words.insert(word.to_string())
    }

    /// Forgets the word and marks it as a boundary error.
    pub fn reject(&mut self, word: &str) {
        self.words.remove(word);
        if !word.is_empty() {
            self.rejected.insert(word.to_string());
        }
    }

    pub fn is_rejected(&self, word: &str) -> bool {
        self.rejected.contains(word)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for KnownWordDictionary {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            words: iter.into_iter().map(Into::into).filter(|w: &String| !w.is_empty()).collect(),
            rejected: HashSet::new(),
        }
    }
}

/// The level attached to a segmentation-dictionary entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DictLevel {
    Tagged(String),
    /// Known word with no entry in the level table.
    Unleveled,
}

/// Dictionary handed to a segmenter: level-table keys plus known words,
/// minus the forms the user rejected.
#[derive(Debug, Clone, Default)]
pub struct SegmentDict {
    entries: HashMap<String, DictLevel>,
    rejected: HashSet<String>,
    max_chars: usize,
}

impl SegmentDict {
    pub fn assemble(levels: &LevelTable, known: &KnownWordDictionary) -> Self {
        let mut dict = Self { rejected: known.rejected.clone(), ..Self::default() };
        for (word, level) in levels.iter() {
            if !known.is_rejected(word) {
                dict.put(word, DictLevel::Tagged(level.to_string()));
            }
        }
        for word in known.iter() {
            if !dict.entries.contains_key(word) {
                dict.put(word, DictLevel::Unleveled);
            }
        }
        dict
    }

    fn put(&mut self, word: &str, level: DictLevel) {
        self.max_chars = self.max_chars.max(word.chars().count());
        self.entries.insert(word.to_string(), level);
    }

    pub fn get(&self, word: &str) -> Option<&DictLevel> {
        self.entries.get(word)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.entries.contains_key(word)
    }

    pub fn is_rejected(&self, word: &str) -> bool {
        self.rejected.contains(word)
    }

    /// Length in chars of the longest entry.
    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
