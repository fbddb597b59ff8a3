// File: src/core/index.rs
use crate::core::dictionary::KnownWordDictionary;
use crate::core::lexicon::LexiconSource;
use crate::core::types::SourceId;
use std::collections::HashMap;
use tracing::debug;

/// word -> earliest lesson key, for one source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReverseIndex {
    earliest: HashMap<String, String>,
}

impl ReverseIndex {
    /// Scans lessons in natural order and records the first lesson that
    /// contains each word. Every word is also taught to `known`.
    pub fn build(source: SourceId, lexicon: &LexiconSource, known: &mut KnownWordDictionary) -> Self {
        let mut earliest = HashMap::new();
        for key in lexicon.sorted_keys() {
            for word in lexicon.words(key).unwrap_or_default() {
                known.insert(word);
                // first writer wins
                earliest.entry(word.clone()).or_insert_with(|| key.to_string());
            }
        }
        debug!(source = %source, words = earliest.len(), "reverse index built");
        Self { earliest }
    }

    pub fn lesson_of(&self, word: &str) -> Option<&str> {
        self.earliest.get(word).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.earliest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.earliest.is_empty()
    }
}
