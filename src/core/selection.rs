// File: src/core/selection.rs
use crate::core::lexicon::LexiconStore;
use crate::core::types::{GroupState, LessonRef, SourceId};
use crate::error::{VocabError, VocabResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use tracing::{debug, warn};

/// Words considered already known. Always derived, never edited directly.
pub type Blocklist = HashSet<String>;

/// Which lessons are taught, plus hand-entered known words.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    lessons: BTreeSet<LessonRef>,
    custom: BTreeSet<String>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_selected(&self, lesson: &LessonRef) -> bool {
        self.lessons.contains(lesson)
    }

    pub fn lessons(&self) -> impl Iterator<Item = &LessonRef> {
        self.lessons.iter()
    }

    pub fn selected_count(&self, source: SourceId) -> usize {
        self.lessons.iter().filter(|l| l.source == source).count()
    }

    pub fn custom_vocabulary(&self) -> impl Iterator<Item = &str> {
        self.custom.iter().map(String::as_str)
    }

    pub fn custom_count(&self) -> usize {
        self.custom.len()
    }

    pub fn group_state(&self, source: SourceId, keys: &[String]) -> GroupState {
        let selected = keys
            .iter()
            .filter(|k| self.lessons.contains(&LessonRef::new(source, k.as_str())))
            .count();
        match selected {
            0 => GroupState::None,
            n if n == keys.len() => GroupState::All,
            _ => GroupState::Some,
        }
    }
}

/// Owns the selection and the blocklist derived from it.
#[derive(Debug, Clone, Default)]
pub struct BlocklistManager {
    state: SelectionState,
    blocklist: Blocklist,
}

impl BlocklistManager {
    pub fn new(state: SelectionState, store: &LexiconStore) -> Self {
        let mut manager = Self { state, blocklist: Blocklist::new() };
        // stale references from an old snapshot are dropped
        manager.state.lessons.retain(|l| store.lesson_words(l).is_some());
        manager.recompute_blocklist(store);
        manager
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn blocklist(&self) -> &Blocklist {
        &self.blocklist
    }

    pub fn toggle_lesson(&mut self, store: &LexiconStore, lesson: &LessonRef) -> VocabResult<()> {
        Self::check(store, lesson)?;
        if !self.state.lessons.remove(lesson) {
            self.state.lessons.insert(lesson.clone());
        }
        debug!(lesson = %lesson, selected = self.state.is_selected(lesson), "lesson toggled");
        self.recompute_blocklist(store);
        Ok(())
    }

    /// Deselects the whole group when every key is selected, otherwise selects all of it.
    pub fn toggle_group(&mut self, store: &LexiconStore, source: SourceId, keys: &[String]) -> VocabResult<()> {
        let lessons: Vec<LessonRef> = keys.iter().map(|k| LessonRef::new(source, k.as_str())).collect();
        for lesson in &lessons {
            Self::check(store, lesson)?;
        }
        if lessons.is_empty() {
            return Ok(());
        }
        let all_selected = lessons.iter().all(|l| self.state.lessons.contains(l));
        for lesson in lessons {
            if all_selected {
                self.state.lessons.remove(&lesson);
            } else {
                self.state.lessons.insert(lesson);
            }
        }
        debug!(source = %source, keys = keys.len(), selected = !all_selected, "group toggled");
        self.recompute_blocklist(store);
        Ok(())
    }

    /// Adds whitespace-separated words; returns the words actually added.
    pub fn add_custom_vocabulary(&mut self, store: &LexiconStore, input: &str) -> Vec<String> {
        let added: Vec<String> = input
            .split_whitespace()
            .filter(|w| self.state.custom.insert(w.to_string()))
            .map(str::to_string)
            .collect();
        self.recompute_blocklist(store);
        added
    }

    /// Replaces the custom vocabulary; each entry may hold several
    /// whitespace-separated words.
    pub fn set_custom_vocabulary<I, S>(&mut self, store: &LexiconStore, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.state.custom = words
            .into_iter()
            .flat_map(|w| w.as_ref().split_whitespace().map(str::to_string).collect::<Vec<_>>())
            .collect();
        self.recompute_blocklist(store);
    }

    pub fn clear_custom_vocabulary(&mut self, store: &LexiconStore) {
        self.state.custom.clear();
        self.recompute_blocklist(store);
    }

    /// Union of the words of every selected lesson plus the custom vocabulary.
    pub fn recompute_blocklist(&mut self, store: &LexiconStore) -> &Blocklist {
        let mut blocklist: Blocklist = self.state.custom.iter().cloned().collect();
        for lesson in &self.state.lessons {
            if let Some(words) = store.lesson_words(lesson) {
                blocklist.extend(words.iter().cloned());
            }
        }
        self.blocklist = blocklist;
        &self.blocklist
    }

    fn check(store: &LexiconStore, lesson: &LessonRef) -> VocabResult<()> {
        if store.lesson_words(lesson).is_some() {
            Ok(())
        } else {
            warn!(lesson = %lesson, "toggle of unknown lesson ignored");
            Err(VocabError::invalid(format!("unknown lesson '{}'", lesson)))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum GroupLabel {
    /// `<book>-<lesson>` keys, grouped by book number.
    Book(String),
    /// `B<n>` keys; each is its own group.
    Level(String),
    Whole,
}

impl GroupLabel {
    pub fn for_key(key: &str) -> Self {
        if let Some((book, lesson)) = key.split_once('-') {
            let lesson_digits = lesson.chars().take_while(char::is_ascii_digit).count();
            if is_digits(book) && lesson_digits > 0 {
                return GroupLabel::Book(book.to_string());
            }
        }
        if let Some(rest) = key.strip_prefix('B') {
            if rest.starts_with(|c: char| c.is_ascii_digit()) {
                return GroupLabel::Level(key.to_string());
            }
        }
        GroupLabel::Whole
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

impl fmt::Display for GroupLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupLabel::Book(n) => write!(f, "第 {} 冊", n),
            GroupLabel::Level(key) => f.write_str(key),
            GroupLabel::Whole => f.write_str("全冊"),
        }
    }
}

/// A group of lessons as a checkbox tree would show it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LessonGroup {
    pub label: GroupLabel,
    pub keys: Vec<String>,
    pub state: GroupState,
    /// Word count when the group is a single lesson named like the group.
    pub word_count: Option<usize>,
}

impl LessonGroup {
    pub fn is_single_lesson(&self) -> bool {
        self.word_count.is_some()
    }
}

/// Groups a source's lessons in natural key order.
pub fn lesson_groups(store: &LexiconStore, state: &SelectionState, source: SourceId) -> Vec<LessonGroup> {
    let Some(lexicon) = store.get(source) else {
        return Vec::new();
    };
    let mut groups: Vec<(GroupLabel, Vec<String>)> = Vec::new();
    for key in lexicon.sorted_keys() {
        let label = GroupLabel::for_key(key);
        match groups.iter_mut().find(|(l, _)| *l == label) {
            Some((_, keys)) => keys.push(key.to_string()),
            None => groups.push((label, vec![key.to_string()])),
        }
    }
    groups
        .into_iter()
        .map(|(label, keys)| {
            let word_count = match (&label, keys.as_slice()) {
                (GroupLabel::Level(name), [only]) if name == only => lexicon.words(only).map(<[String]>::len),
                _ => None,
            };
            LessonGroup { state: state.group_state(source, &keys), label, keys, word_count }
        })
        .collect()
}
