// File: src/learning.rs
use crate::core::analysis::{dedup_items, Annotator};
use crate::core::dictionary::KnownWordDictionary;
use crate::core::selection::Blocklist;
use crate::core::types::AnalysisResult;
use crate::error::{VocabError, VocabResult};
use tracing::{debug, warn};

/// A split as typed by the user: the edited word with spaces at the new boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitRequest {
    pub index: usize,
    pub parts: Vec<String>,
    /// The word at `index` for which the user accepted parts that do not spell it.
    pub confirmed_for: Option<String>,
}

impl SplitRequest {
    pub fn from_edit(index: usize, edited: &str) -> Self {
        Self {
            index,
            parts: edited.split_whitespace().map(str::to_string).collect(),
            confirmed_for: None,
        }
    }

    /// Accepts the parts for `original` only; a different word at the same
    /// index is refused.
    pub fn confirm(mut self, original: impl Into<String>) -> Self {
        self.confirmed_for = Some(original.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Both entries replaced by the combined word.
    Merged { word: String },
    /// The combined word is already known; both entries dropped.
    Absorbed { word: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitOutcome {
    /// Parts that entered the result.
    pub inserted: Vec<String>,
    /// Parts dropped because they are already known.
    pub blocked: Vec<String>,
}

/// Applies merge/split corrections to the known-word dictionary and the
/// current result together.
pub struct LearningEngine<'a> {
    pub known: &'a mut KnownWordDictionary,
    pub result: &'a mut AnalysisResult,
    pub blocklist: &'a Blocklist,
    pub annotator: Annotator<'a>,
}

impl<'a> LearningEngine<'a> {
    pub fn merge(&mut self, index: usize) -> VocabResult<MergeOutcome> {
        if index + 1 >= self.result.len() {
            warn!(index, len = self.result.len(), "merge without a successor");
            return Err(VocabError::invalid(format!(
                "cannot merge item {} of {}: no following item",
                index,
                self.result.len()
            )));
        }
        let word = format!("{}{}", self.result[index].word, self.result[index + 1].word);
        self.known.insert(&word);

        let outcome = if self.blocklist.contains(&word) {
            self.result.drain(index..=index + 1);
            MergeOutcome::Absorbed { word }
        } else {
            let item = self.annotator.annotate(&word);
            self.result.splice(index..=index + 1, [item]);
            dedup_items(self.result);
            MergeOutcome::Merged { word }
        };
        debug!(?outcome, "merge applied");
        Ok(outcome)
    }

    pub fn split(&mut self, request: &SplitRequest) -> VocabResult<SplitOutcome> {
        let Some(original) = self.result.get(request.index).map(|item| item.word.clone()) else {
            return Err(VocabError::invalid(format!(
                "cannot split item {} of {}",
                request.index,
                self.result.len()
            )));
        };
        if request.parts.iter().all(|p| p.trim().is_empty()) {
            return Err(VocabError::invalid(format!("split of '{}' has no parts", original)));
        }
        if let Some(expected) = request.confirmed_for.as_deref().filter(|w| *w != original) {
            warn!(%expected, %original, index = request.index, "split confirmed for another word");
            return Err(VocabError::invalid(format!(
                "split was confirmed for '{}' but item {} is '{}'",
                expected, request.index, original
            )));
        }
        let rebuilt = request.parts.concat();
        if rebuilt != original && request.confirmed_for.is_none() {
            warn!(%original, %rebuilt, "split does not rebuild the word");
            return Err(VocabError::AmbiguousCorrection { original, rebuilt });
        }

        self.known.reject(&original);
        for part in &request.parts {
            self.known.insert(part);
        }

        let (blocked, inserted): (Vec<String>, Vec<String>) =
            request.parts.iter().cloned().partition(|p| self.blocklist.contains(p));
        let items: Vec<_> = inserted.iter().map(|p| self.annotator.annotate(p)).collect();
        self.result.splice(request.index..=request.index, items);
        dedup_items(self.result);
        debug!(%original, ?inserted, ?blocked, "split applied");
        Ok(SplitOutcome { inserted, blocked })
    }
}
