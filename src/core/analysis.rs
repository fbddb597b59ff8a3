// File: src/core/analysis.rs
use crate::core::dictionary::{KnownWordDictionary, SegmentDict};
use crate::core::index::ReverseIndex;
use crate::core::lexicon::LevelTable;
use crate::core::segmenter::{is_pure_punctuation, FallbackSegmenter, SegmentOptions, Segmenter};
use crate::core::selection::Blocklist;
use crate::core::types::{AnalysisItem, AnalysisResult};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Looks up level and earliest lesson for a word.
#[derive(Clone, Copy)]
pub struct Annotator<'a> {
    pub levels: &'a LevelTable,
    /// Reverse index of the active source.
    pub index: Option<&'a ReverseIndex>,
}

impl<'a> Annotator<'a> {
    pub fn annotate(&self, word: &str) -> AnalysisItem {
        AnalysisItem {
            word: word.to_string(),
            level: self.levels.level_of(word),
            source_lesson: self.index.and_then(|i| i.lesson_of(word)).map(str::to_string),
        }
    }
}

/// Read-only view of everything one analysis run needs.
pub struct Analyzer<'a> {
    pub annotator: Annotator<'a>,
    pub known: &'a KnownWordDictionary,
    pub blocklist: &'a Blocklist,
    pub segmenter: &'a dyn Segmenter,
    pub options: SegmentOptions,
}

impl<'a> Analyzer<'a> {
    /// Segments with the configured engine, degrading to the fallback tokenizer.
    pub fn tokens(&self, text: &str) -> Vec<String> {
        let dict = SegmentDict::assemble(self.annotator.levels, self.known);
        match self.segmenter.segment(text, &dict, self.blocklist, self.options) {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(segmenter = self.segmenter.name(), error = %e, "falling back to basic tokenizer");
                FallbackSegmenter::tokenize(text)
            }
        }
    }

    pub fn run(&self, text: &str) -> AnalysisResult {
        let tokens = self.tokens(text);
        let survivors = filter_tokens(tokens, self.blocklist);
        debug!(new_words = survivors.len(), blocked = self.blocklist.len(), "analysis finished");
        survivors.iter().map(|w| self.annotator.annotate(w)).collect()
    }
}

/// Drops punctuation and blocked tokens, keeping the first occurrence of the rest.
pub fn filter_tokens<I>(tokens: I, blocklist: &Blocklist) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    tokens
        .into_iter()
        .filter(|t| !is_pure_punctuation(t))
        .filter(|t| !blocklist.contains(t))
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Keeps the first item for each word, in order.
pub fn dedup_items(items: &mut AnalysisResult) {
    let mut seen = HashSet::new();
    items.retain(|item| seen.insert(item.word.clone()));
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnalysisStats {
    /// Characters in the analysed text.
    pub total_chars: usize,
    pub new_words: usize,
}

impl AnalysisStats {
    pub fn of(text: &str, result: &[AnalysisItem]) -> Self {
        Self { total_chars: text.chars().count(), new_words: result.len() }
    }
}

/// One word per line.
pub fn to_plain_text(result: &[AnalysisItem]) -> String {
    result.iter().map(|item| item.word.as_str()).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::segmenter::DictionarySegmenter;
    use crate::error::{VocabError, VocabResult};
    use std::collections::HashMap;

    struct Scripted(Vec<&'static str>);

    impl Segmenter for Scripted {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn segment(&self, _: &str, _: &SegmentDict, _: &HashSet<String>, _: SegmentOptions) -> VocabResult<Vec<String>> {
            Ok(self.0.iter().map(|s| s.to_string()).collect())
        }
    }

    struct Broken;

    impl Segmenter for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn segment(&self, _: &str, _: &SegmentDict, _: &HashSet<String>, _: SegmentOptions) -> VocabResult<Vec<String>> {
            Err(VocabError::SegmenterUnavailable("offline".into()))
        }
    }

    fn words(result: &[AnalysisItem]) -> Vec<&str> {
        result.iter().map(|i| i.word.as_str()).collect()
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let levels = LevelTable::default();
        let known = KnownWordDictionary::new();
        let blocklist = Blocklist::new();
        let segmenter = Scripted(vec!["你好", "你好", "世界"]);
        let analyzer = Analyzer {
            annotator: Annotator { levels: &levels, index: None },
            known: &known,
            blocklist: &blocklist,
            segmenter: &segmenter,
            options: SegmentOptions::default(),
        };
        assert_eq!(words(&analyzer.run("ignored")), vec!["你好", "世界"]);
    }

    #[test]
    fn test_punctuation_never_survives() {
        let levels = LevelTable::new(HashMap::from([("，".to_string(), "1".to_string())]));
        let known: KnownWordDictionary = ["。", "，"].into_iter().collect();
        let blocklist = Blocklist::new();
        let segmenter = Scripted(vec!["，", "書", "。", " ", "！？"]);
        let analyzer = Analyzer {
            annotator: Annotator { levels: &levels, index: None },
            known: &known,
            blocklist: &blocklist,
            segmenter: &segmenter,
            options: SegmentOptions::default(),
        };
        assert_eq!(words(&analyzer.run("，書。")), vec!["書"]);
    }

    #[test]
    fn test_blocked_words_are_filtered() {
        let blocklist: Blocklist = ["我"].iter().map(|s| s.to_string()).collect();
        let tokens = vec!["我".to_string(), "喜歡".to_string(), "我".to_string()];
        assert_eq!(filter_tokens(tokens, &blocklist), vec!["喜歡"]);
    }

    #[test]
    fn test_broken_segmenter_falls_back() {
        let levels = LevelTable::default();
        let known = KnownWordDictionary::new();
        let blocklist = Blocklist::new();
        let analyzer = Analyzer {
            annotator: Annotator { levels: &levels, index: None },
            known: &known,
            blocklist: &blocklist,
            segmenter: &Broken,
            options: SegmentOptions::default(),
        };
        assert_eq!(words(&analyzer.run("你好，世界")), vec!["你好", "世界"]);
    }

    #[test]
    fn test_annotation_from_level_table() {
        let levels = LevelTable::new(HashMap::from([("世界".to_string(), "第2級".to_string())]));
        let known: KnownWordDictionary = ["世界"].into_iter().collect();
        let blocklist = Blocklist::new();
        let segmenter = DictionarySegmenter::new();
        let analyzer = Analyzer {
            annotator: Annotator { levels: &levels, index: None },
            known: &known,
            blocklist: &blocklist,
            segmenter: &segmenter,
            options: SegmentOptions::default(),
        };
        let item = analyzer.annotator.annotate("世界");
        assert_eq!(item.level.as_deref(), Some("2"));
        assert_eq!(item.source_lesson, None);
    }

    #[test]
    fn test_stats_and_plain_text() {
        let result = vec![
            AnalysisItem { word: "你好".into(), level: None, source_lesson: None },
            AnalysisItem { word: "世界".into(), level: Some("2".into()), source_lesson: None },
        ];
        assert_eq!(AnalysisStats::of("你好，世界！", &result), AnalysisStats { total_chars: 6, new_words: 2 });
        assert_eq!(to_plain_text(&result), "你好\n世界");
    }
}
