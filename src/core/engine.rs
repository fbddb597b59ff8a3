use crate::config::{SegmenterKind, SessionConfig};
use crate::core::analysis::{to_plain_text, AnalysisStats, Analyzer, Annotator};
use crate::core::dictionary::KnownWordDictionary;
use crate::core::index::ReverseIndex;
use crate::core::lexicon::{LevelTable, LexiconStore};
use crate::core::locator::{HighlightLocator, Located};
use crate::core::segmenter::{DictionarySegmenter, FallbackSegmenter, SegmentOptions, Segmenter};
use crate::core::selection::{lesson_groups, Blocklist, BlocklistManager, LessonGroup, SelectionState};
use crate::core::types::{AnalysisItem, AnalysisResult, LessonRef, SourceId};
use crate::error::{VocabError, VocabResult};
use crate::learning::{LearningEngine, MergeOutcome, SplitOutcome, SplitRequest};
use crate::persistence::{load_from_disk, save_to_disk, SessionSnapshot};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisOutcome {
    Refreshed,
    /// Blank text; the previous result was left in place.
    Unchanged,
}

/// A user action applied to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetSource(SourceId),
    ToggleLesson(LessonRef),
    ToggleGroup { source: SourceId, keys: Vec<String> },
    AddCustomVocabulary(String),
    SetCustomVocabulary(Vec<String>),
    ClearCustomVocabulary,
    Analyze(String),
    Merge(usize),
    Split(SplitRequest),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Selection,
    Analysis(AnalysisOutcome),
    Merge(MergeOutcome),
    Split(SplitOutcome),
}

/// Derived state after a command, for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub effect: Effect,
    /// Sorted.
    pub blocklist: Vec<String>,
    pub result: AnalysisResult,
}

/// Analysis session over the loaded curricula.
pub struct VocabSession {
    store: LexiconStore,
    levels: LevelTable,
    indexes: BTreeMap<SourceId, ReverseIndex>,
    known: KnownWordDictionary,
    selection: BlocklistManager,
    active: SourceId,
    segmenter: Box<dyn Segmenter>,
    options: SegmentOptions,
    text: String,
    result: AnalysisResult,
    locator: HighlightLocator,
    state_path: Option<PathBuf>,
}

impl VocabSession {
    /// Builds a session from fully loaded data. An empty store or a default
    /// source that was not loaded is an initialization failure.
    pub fn new(store: LexiconStore, levels: LevelTable, config: &SessionConfig) -> VocabResult<Self> {
        if store.is_empty() {
            return Err(VocabError::init("no lexicon source loaded"));
        }
        if store.get(config.default_source).is_none() {
            return Err(VocabError::init(format!("default source '{}' is not loaded", config.default_source)));
        }

        let mut known = KnownWordDictionary::new();
        let indexes = store
            .sources()
            .map(|(id, lexicon)| (id, ReverseIndex::build(id, lexicon, &mut known)))
            .collect();
        let segmenter: Box<dyn Segmenter> = match config.segmenter {
            SegmenterKind::Dictionary => Box::new(DictionarySegmenter::new()),
            SegmenterKind::Fallback => Box::new(FallbackSegmenter::new()),
        };
        let selection = BlocklistManager::new(SelectionState::new(), &store);
        info!(known = known.len(), levels = levels.len(), segmenter = segmenter.name(), "session ready");

        Ok(Self {
            store,
            levels,
            indexes,
            known,
            selection,
            active: config.default_source,
            segmenter,
            options: config.segment_options(),
            text: String::new(),
            result: AnalysisResult::new(),
            locator: HighlightLocator::new(),
            state_path: config.state_path.clone(),
        })
    }

    /// Loads data files relative to `base` and restores the snapshot when one exists.
    pub fn from_config(config: &SessionConfig, base: &Path) -> VocabResult<Self> {
        let (store, levels) = config.load_data(base)?;
        let mut session = Self::new(store, levels, config)?;
        if let Some(path) = session.state_path.clone().filter(|p| p.exists()) {
            match load_from_disk(&path) {
                Ok(snapshot) => session.restore(snapshot),
                Err(e) => warn!(path = %path.display(), error = %e, "ignoring unreadable session snapshot"),
            }
        }
        Ok(session)
    }

    /// Replaces the segmentation engine.
    pub fn with_segmenter(mut self, segmenter: Box<dyn Segmenter>) -> Self {
        self.segmenter = segmenter;
        self
    }

    pub fn apply(&mut self, command: Command) -> VocabResult<SessionView> {
        debug!(?command, "applying command");
        let effect = match command {
            Command::SetSource(source) => {
                self.set_source(source)?;
                Effect::Selection
            }
            Command::ToggleLesson(lesson) => {
                self.toggle_lesson(&lesson)?;
                Effect::Selection
            }
            Command::ToggleGroup { source, keys } => {
                self.toggle_group(source, &keys)?;
                Effect::Selection
            }
            Command::AddCustomVocabulary(input) => {
                self.add_custom_vocabulary(&input);
                Effect::Selection
            }
            Command::SetCustomVocabulary(words) => {
                self.set_custom_vocabulary(words.as_slice());
                Effect::Selection
            }
            Command::ClearCustomVocabulary => {
                self.clear_custom_vocabulary();
                Effect::Selection
            }
            Command::Analyze(text) => Effect::Analysis(self.analyze(&text)),
            Command::Merge(index) => Effect::Merge(self.merge(index)?),
            Command::Split(request) => Effect::Split(self.split(&request)?),
        };
        Ok(self.view(effect))
    }

    fn view(&self, effect: Effect) -> SessionView {
        let mut blocklist: Vec<String> = self.selection.blocklist().iter().cloned().collect();
        blocklist.sort();
        SessionView { effect, blocklist, result: self.result.clone() }
    }

    pub fn active_source(&self) -> SourceId {
        self.active
    }

    pub fn set_source(&mut self, source: SourceId) -> VocabResult<()> {
        if self.store.get(source).is_none() {
            return Err(VocabError::invalid(format!("source '{}' is not loaded", source)));
        }
        self.active = source;
        self.rerun();
        Ok(())
    }

    pub fn toggle_lesson(&mut self, lesson: &LessonRef) -> VocabResult<()> {
        self.selection.toggle_lesson(&self.store, lesson)?;
        self.rerun();
        Ok(())
    }

    pub fn toggle_group(&mut self, source: SourceId, keys: &[String]) -> VocabResult<()> {
        self.selection.toggle_group(&self.store, source, keys)?;
        self.rerun();
        Ok(())
    }

    /// Custom words are blocked and also taught to the segmenter.
    pub fn add_custom_vocabulary(&mut self, input: &str) -> Vec<String> {
        let added = self.selection.add_custom_vocabulary(&self.store, input);
        for word in input.split_whitespace() {
            self.known.insert(word);
        }
        self.rerun();
        added
    }

    pub fn set_custom_vocabulary<S: AsRef<str>>(&mut self, words: &[S]) {
        self.selection.set_custom_vocabulary(&self.store, words);
        for word in words.iter().flat_map(|w| w.as_ref().split_whitespace()) {
            self.known.insert(word);
        }
        self.rerun();
    }

    pub fn clear_custom_vocabulary(&mut self) {
        self.selection.clear_custom_vocabulary(&self.store);
        self.rerun();
    }

    fn rerun(&mut self) {
        if !self.text.trim().is_empty() {
            let text = std::mem::take(&mut self.text);
            self.analyze(&text);
        }
    }

    fn annotator(&self) -> Annotator<'_> {
        Annotator { levels: &self.levels, index: self.indexes.get(&self.active) }
    }

    pub fn analyze(&mut self, text: &str) -> AnalysisOutcome {
        if text.trim().is_empty() {
            debug!("blank text, keeping previous result");
            return AnalysisOutcome::Unchanged;
        }
        self.selection.recompute_blocklist(&self.store);
        let analyzer = Analyzer {
            annotator: Annotator { levels: &self.levels, index: self.indexes.get(&self.active) },
            known: &self.known,
            blocklist: self.selection.blocklist(),
            segmenter: self.segmenter.as_ref(),
            options: self.options,
        };
        self.result = analyzer.run(text);
        self.text = text.to_string();
        self.locator.reset();
        AnalysisOutcome::Refreshed
    }

    pub fn merge(&mut self, index: usize) -> VocabResult<MergeOutcome> {
        let annotator = Annotator { levels: &self.levels, index: self.indexes.get(&self.active) };
        LearningEngine {
            known: &mut self.known,
            result: &mut self.result,
            blocklist: self.selection.blocklist(),
            annotator,
        }
        .merge(index)
    }

    pub fn split(&mut self, request: &SplitRequest) -> VocabResult<SplitOutcome> {
        let annotator = Annotator { levels: &self.levels, index: self.indexes.get(&self.active) };
        LearningEngine {
            known: &mut self.known,
            result: &mut self.result,
            blocklist: self.selection.blocklist(),
            annotator,
        }
        .split(request)
    }

    /// Cycles through occurrences of `word` in the last analysed text.
    pub fn locate(&mut self, word: &str) -> Located {
        self.locator.locate(&self.text, word)
    }

    pub fn result(&self) -> &[AnalysisItem] {
        &self.result
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn blocklist(&self) -> &Blocklist {
        self.selection.blocklist()
    }

    pub fn selection(&self) -> &SelectionState {
        self.selection.state()
    }

    pub fn known_words(&self) -> &KnownWordDictionary {
        &self.known
    }

    pub fn store(&self) -> &LexiconStore {
        &self.store
    }

    pub fn lesson_groups(&self, source: SourceId) -> Vec<LessonGroup> {
        lesson_groups(&self.store, self.selection.state(), source)
    }

    pub fn stats(&self) -> AnalysisStats {
        AnalysisStats::of(&self.text, &self.result)
    }

    pub fn export_json(&self) -> VocabResult<String> {
        Ok(serde_json::to_string_pretty(&self.result)?)
    }

    pub fn export_text(&self) -> String {
        to_plain_text(&self.result)
    }

    /// Level and lesson lookups for a single word under the active source.
    pub fn annotate(&self, word: &str) -> AnalysisItem {
        self.annotator().annotate(word)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            known_words: self.known.clone(),
            selection: self.selection.state().clone(),
            active_source: self.active,
        }
    }

    /// Takes over a saved dictionary and selection. Lessons that no longer
    /// exist are dropped.
    pub fn restore(&mut self, snapshot: SessionSnapshot) {
        self.known = snapshot.known_words;
        self.selection = BlocklistManager::new(snapshot.selection, &self.store);
        if self.store.get(snapshot.active_source).is_some() {
            self.active = snapshot.active_source;
        }
        self.rerun();
    }

    pub fn save_state(&self) -> VocabResult<()> {
        match &self.state_path {
            Some(path) => save_to_disk(&self.snapshot(), path),
            None => Ok(()), // Don't error if no path is set
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lexicon::LexiconSource;
    use crate::core::locator::Hit;
    use std::collections::HashMap;

    fn config() -> SessionConfig {
        SessionConfig { state_path: None, ..SessionConfig::default() }
    }

    fn session() -> VocabSession {
        let mut store = LexiconStore::new();
        store.insert(
            SourceId::Lai,
            LexiconSource::from_json_str(r#"{"B1":["你好","謝謝","我"],"B2":["喜歡","看"]}"#).unwrap(),
        );
        store.insert(SourceId::Mtc, LexiconSource::from_json_str(r#"{"1-1":["你好"],"1-2":["書"]}"#).unwrap());
        let levels = LevelTable::new(HashMap::from([
            ("世界".to_string(), "2".to_string()),
            ("看書".to_string(), "第1級".to_string()),
        ]));
        VocabSession::new(store, levels, &config()).unwrap()
    }

    fn words(session: &VocabSession) -> Vec<&str> {
        session.result().iter().map(|i| i.word.as_str()).collect()
    }

    #[test]
    fn test_refuses_empty_store() {
        let result = VocabSession::new(LexiconStore::new(), LevelTable::default(), &config());
        assert!(matches!(result, Err(VocabError::Initialization(_))));
    }

    #[test]
    fn test_refuses_missing_default_source() {
        let mut store = LexiconStore::new();
        store.insert(SourceId::Mtc, LexiconSource::default());
        let result = VocabSession::new(store, LevelTable::default(), &config());
        assert!(matches!(result, Err(VocabError::Initialization(_))));
    }

    #[test]
    fn test_blank_text_keeps_previous_result() {
        let mut session = session();
        assert_eq!(session.analyze("你好，世界！"), AnalysisOutcome::Refreshed);
        let before = session.result().to_vec();
        assert_eq!(session.analyze("  \n "), AnalysisOutcome::Unchanged);
        assert_eq!(session.result(), before.as_slice());
    }

    #[test]
    fn test_source_switch_relabels() {
        let mut session = session();
        session.analyze("你好");
        assert_eq!(session.result()[0].source_lesson.as_deref(), Some("B1"));
        session.set_source(SourceId::Mtc).unwrap();
        assert_eq!(session.result()[0].source_lesson.as_deref(), Some("1-1"));
    }

    #[test]
    fn test_toggle_reruns_analysis() {
        let mut session = session();
        session.analyze("我喜歡看書");
        assert!(words(&session).contains(&"喜歡"));
        let view = session.apply(Command::ToggleLesson("lai:B2".parse().unwrap())).unwrap();
        assert_eq!(view.effect, Effect::Selection);
        assert!(!words(&session).contains(&"喜歡"));
        assert!(view.blocklist.contains(&"看".to_string()));
    }

    #[test]
    fn test_custom_vocabulary_teaches_segmenter() {
        let mut session = session();
        session.add_custom_vocabulary("電腦");
        assert!(session.known_words().contains("電腦"));
        session.analyze("我的電腦");
        assert!(!words(&session).contains(&"電腦"));
        session.clear_custom_vocabulary();
        assert!(words(&session).contains(&"電腦"));
    }

    #[test]
    fn test_set_custom_vocabulary_splits_entries() {
        let mut session = session();
        session.set_custom_vocabulary(&["電腦 手機"]);
        assert!(session.blocklist().contains("電腦") && session.blocklist().contains("手機"));
        assert!(session.known_words().contains("手機"));
        session.analyze("我的電腦和手機");
        assert!(!words(&session).contains(&"電腦"));
        assert!(!words(&session).contains(&"手機"));
    }

    #[test]
    fn test_merge_then_reanalysis_keeps_learned_word() {
        let mut session = session();
        session.analyze("熊貓很可愛");
        let before = words(&session).len();
        let i = words(&session).iter().position(|w| *w == "熊").unwrap();
        session.apply(Command::Merge(i)).unwrap();
        assert_eq!(words(&session).len(), before - 1);
        assert!(session.known_words().contains("熊貓"));
        session.analyze("熊貓很可愛");
        assert!(words(&session).contains(&"熊貓"));
    }

    #[test]
    fn test_split_mismatch_leaves_state() {
        let mut session = session();
        session.analyze("看書");
        let known_before = session.known_words().clone();
        let i = words(&session).iter().position(|w| *w == "看書").unwrap();
        let err = session.apply(Command::Split(SplitRequest::from_edit(i, "讀 書"))).unwrap_err();
        assert!(matches!(err, VocabError::AmbiguousCorrection { .. }));
        assert_eq!(session.known_words(), &known_before);
        assert_eq!(words(&session), vec!["看書"]);
    }

    #[test]
    fn test_locate_resets_after_analysis() {
        let mut session = session();
        session.analyze("世界 世界");
        assert!(matches!(session.locate("世界"), Located::Found(Hit { offset: 0, .. })));
        assert!(matches!(session.locate("世界"), Located::Found(Hit { offset: 7, .. })));
        session.analyze("世界 世界");
        assert!(matches!(session.locate("世界"), Located::Found(Hit { offset: 0, .. })));
        assert_eq!(session.locate("再見"), Located::NotFound);
    }

    #[test]
    fn test_snapshot_restore() {
        let mut session = session();
        session.toggle_lesson(&"lai:B1".parse().unwrap()).unwrap();
        session.add_custom_vocabulary("電腦");
        let snapshot = session.snapshot();

        let mut fresh = self::session();
        fresh.restore(snapshot);
        assert!(fresh.blocklist().contains("你好"));
        assert!(fresh.blocklist().contains("電腦"));
        assert!(fresh.known_words().contains("電腦"));
    }

    #[test]
    fn test_export() {
        let mut session = session();
        session.analyze("你好，世界！");
        assert_eq!(session.export_text(), "你好\n世界");
        let json: serde_json::Value = serde_json::from_str(&session.export_json().unwrap()).unwrap();
        assert_eq!(json[1]["level"], "2");
        assert_eq!(session.stats().new_words, 2);
    }
}
