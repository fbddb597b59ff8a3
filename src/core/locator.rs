// File: src/core/locator.rs
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// A successful search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    /// Byte offset into the text.
    pub offset: usize,
    pub char_offset: usize,
    /// The search ran past the last occurrence and restarted at the beginning.
    pub wrapped: bool,
    /// The word occurs exactly once and that occurrence is being shown again.
    pub repeated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Located {
    Found(Hit),
    NotFound,
}

impl Located {
    pub fn hit(&self) -> Option<Hit> {
        match self {
            Located::Found(hit) => Some(*hit),
            Located::NotFound => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct SearchState {
    word: String,
    last_match: Option<usize>,
    text_fingerprint: u64,
}

/// Cyclic text search: repeated calls with the same word step through
/// successive occurrences, wrapping at the end.
#[derive(Debug, Clone, Default)]
pub struct HighlightLocator {
    state: SearchState,
}

fn fingerprint(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

impl HighlightLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.state = SearchState::default();
    }

    pub fn locate(&mut self, text: &str, word: &str) -> Located {
        if word.is_empty() {
            return Located::NotFound;
        }
        let print = fingerprint(text);
        if self.state.word != word || self.state.text_fingerprint != print {
            self.state = SearchState { word: word.to_string(), last_match: None, text_fingerprint: print };
        }

        let start = match self.state.last_match {
            // strictly after the previous match start
            Some(last) => last + text[last..].chars().next().map_or(1, char::len_utf8),
            None => 0,
        };
        let forward = text.get(start..).and_then(|rest| rest.find(word)).map(|i| start + i);
        let (offset, wrapped) = match forward {
            Some(offset) => (offset, false),
            None => match text.find(word) {
                Some(offset) => (offset, self.state.last_match.is_some()),
                None => return Located::NotFound,
            },
        };
        let repeated = wrapped && self.state.last_match == Some(offset);
        self.state.last_match = Some(offset);
        Located::Found(Hit { offset, char_offset: text[..offset].chars().count(), wrapped, repeated })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offset(located: Located) -> usize {
        located.hit().expect("word should be found").offset
    }

    #[test]
    fn test_cycles_through_occurrences() {
        let mut locator = HighlightLocator::new();
        let text = "ab ab ab";
        assert_eq!(offset(locator.locate(text, "ab")), 0);
        assert_eq!(offset(locator.locate(text, "ab")), 3);
        assert_eq!(offset(locator.locate(text, "ab")), 6);
        let fourth = locator.locate(text, "ab").hit().unwrap();
        assert_eq!(fourth.offset, 0);
        assert!(fourth.wrapped);
        assert!(!fourth.repeated);
    }

    #[test]
    fn test_not_found_differs_from_single_repeat() {
        let mut locator = HighlightLocator::new();
        let text = "你好，世界";
        assert_eq!(locator.locate(text, "再見"), Located::NotFound);

        let first = locator.locate(text, "世界").hit().unwrap();
        assert_eq!((first.offset, first.char_offset, first.repeated), (9, 3, false));
        let again = locator.locate(text, "世界").hit().unwrap();
        assert_eq!(again.offset, 9);
        assert!(again.repeated);
    }

    #[test]
    fn test_new_word_restarts() {
        let mut locator = HighlightLocator::new();
        let text = "ab cd ab cd";
        assert_eq!(offset(locator.locate(text, "ab")), 0);
        assert_eq!(offset(locator.locate(text, "ab")), 6);
        assert_eq!(offset(locator.locate(text, "cd")), 3);
        assert_eq!(offset(locator.locate(text, "ab")), 0);
    }

    #[test]
    fn test_text_change_restarts() {
        let mut locator = HighlightLocator::new();
        assert_eq!(offset(locator.locate("ab ab", "ab")), 0);
        assert_eq!(offset(locator.locate("ab ab", "ab")), 3);
        assert_eq!(offset(locator.locate("xab ab", "ab")), 1);
    }

    #[test]
    fn test_overlapping_occurrences() {
        let mut locator = HighlightLocator::new();
        assert_eq!(offset(locator.locate("哈哈哈", "哈哈")), 0);
        assert_eq!(offset(locator.locate("哈哈哈", "哈哈")), 3);
    }
}
