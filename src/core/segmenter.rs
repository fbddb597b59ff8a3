// File: src/core/segmenter.rs
use crate::core::dictionary::SegmentDict;
use crate::error::{VocabError, VocabResult};
use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentOptions {
    /// Prefer the longest dictionary entry at each position.
    pub bias_multi_char: bool,
    /// Keep reduplications (看看) and A-不-A questions (好不好) whole.
    pub use_grammar_heuristics: bool,
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self { bias_multi_char: true, use_grammar_heuristics: true }
    }
}

/// Splits text into tokens. Tokens concatenate back to the input.
pub trait Segmenter {
    fn name(&self) -> &'static str;

    /// `protect` lists forms that must come out whole; they are not filtered here.
    fn segment(
        &self,
        text: &str,
        dict: &SegmentDict,
        protect: &HashSet<String>,
        options: SegmentOptions,
    ) -> VocabResult<Vec<String>>;
}

pub fn is_cjk_ideograph(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FFF}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{F900}'..='\u{FAFF}'
        | '\u{20000}'..='\u{2A6DF}'
        | '\u{2A700}'..='\u{2EBEF}')
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || is_cjk_ideograph(c)
}

/// True when the token carries no letter, digit or ideograph.
pub fn is_pure_punctuation(token: &str) -> bool {
    !token.chars().any(is_word_char)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Ideograph,
    Word,
    Space,
    Other,
}

fn classify(c: char) -> CharClass {
    if is_cjk_ideograph(c) {
        CharClass::Ideograph
    } else if c.is_whitespace() {
        CharClass::Space
    } else if is_word_char(c) {
        CharClass::Word
    } else {
        CharClass::Other
    }
}

/// Maximum-matching segmenter driven by the assembled dictionary.
#[derive(Debug, Clone, Default)]
pub struct DictionarySegmenter;

impl DictionarySegmenter {
    pub fn new() -> Self {
        Self
    }

    fn longest_match(chars: &[char], at: usize, max_len: usize, accept: impl Fn(&str) -> bool) -> Option<usize> {
        let limit = max_len.min(chars.len() - at);
        (2..=limit).rev().find(|&len| {
            let candidate: String = chars[at..at + len].iter().collect();
            accept(&candidate)
        })
    }

    /// Marks leftmost-longest protected spans: `spans[i]` is the span length starting at `i`.
    fn protected_spans(chars: &[char], protect: &HashSet<String>) -> Vec<usize> {
        let max_len = protect.iter().map(|w| w.chars().count()).max().unwrap_or(0);
        let mut spans = vec![0; chars.len()];
        let mut i = 0;
        while i < chars.len() {
            match Self::longest_match(chars, i, max_len, |w| protect.contains(w)) {
                Some(len) => {
                    spans[i] = len;
                    i += len;
                }
                None => i += 1,
            }
        }
        spans
    }

    fn segment_clause(
        chars: &[char],
        dict: &SegmentDict,
        protect: &HashSet<String>,
        options: SegmentOptions,
        out: &mut Vec<String>,
    ) {
        let spans = Self::protected_spans(chars, protect);
        let mut i = 0;
        while i < chars.len() {
            if spans[i] > 0 {
                out.push(chars[i..i + spans[i]].iter().collect());
                i += spans[i];
                continue;
            }
            // a dictionary match may not run into the next protected span
            let free = spans[i..].iter().position(|&s| s > 0).unwrap_or(chars.len() - i);
            let window = &chars[i..i + free];
            let len = if options.bias_multi_char {
                Self::longest_match(window, 0, dict.max_chars(), |w| dict.contains(w)).unwrap_or(1)
            } else {
                1
            };
            out.push(window[..len].iter().collect());
            i += len;
        }
    }

    /// Joins reduplications and A-不-A forms unless the user split them apart.
    fn apply_grammar_heuristics(tokens: Vec<String>, dict: &SegmentDict) -> Vec<String> {
        let single = |t: &str| {
            let mut it = t.chars();
            matches!((it.next(), it.next()), (Some(c), None) if is_cjk_ideograph(c))
        };
        let mut out: Vec<String> = Vec::with_capacity(tokens.len());
        let mut i = 0;
        while i < tokens.len() {
            let t = &tokens[i];
            if single(t) {
                let question = format!("{}不{}", t, t);
                if i + 2 < tokens.len() && tokens[i + 1] == "不" && tokens[i + 2] == *t && !dict.is_rejected(&question) {
                    out.push(question);
                    i += 3;
                    continue;
                }
                let doubled = format!("{}{}", t, t);
                if i + 1 < tokens.len() && tokens[i + 1] == *t && !dict.is_rejected(&doubled) {
                    out.push(doubled);
                    i += 2;
                    continue;
                }
            }
            out.push(t.clone());
            i += 1;
        }
        out
    }
}

impl Segmenter for DictionarySegmenter {
    fn name(&self) -> &'static str {
        "dictionary"
    }

    fn segment(
        &self,
        text: &str,
        dict: &SegmentDict,
        protect: &HashSet<String>,
        options: SegmentOptions,
    ) -> VocabResult<Vec<String>> {
        if dict.is_empty() && protect.is_empty() {
            return Err(VocabError::SegmenterUnavailable("empty segmentation dictionary".into()));
        }
        let chars: Vec<char> = text.chars().collect();
        let mut tokens = Vec::new();
        let mut i = 0;
        while i < chars.len() {
            let class = classify(chars[i]);
            let end = (i + 1..chars.len()).find(|&j| classify(chars[j]) != class).unwrap_or(chars.len());
            match class {
                CharClass::Ideograph => {
                    let mut clause = Vec::new();
                    Self::segment_clause(&chars[i..end], dict, protect, options, &mut clause);
                    if options.use_grammar_heuristics {
                        clause = Self::apply_grammar_heuristics(clause, dict);
                    }
                    tokens.extend(clause);
                }
                CharClass::Word | CharClass::Space => tokens.push(chars[i..end].iter().collect()),
                CharClass::Other => tokens.extend(chars[i..end].iter().map(|c| c.to_string())),
            }
            i = end;
        }
        Ok(tokens)
    }
}

/// Dictionary-free tokenizer: Unicode word bounds, with ideographs
/// joined into runs.
#[derive(Debug, Clone, Default)]
pub struct FallbackSegmenter;

impl FallbackSegmenter {
    pub fn new() -> Self {
        Self
    }

    pub fn tokenize(text: &str) -> Vec<String> {
        let mut tokens: Vec<String> = Vec::new();
        let mut run_open = false;
        for piece in text.split_word_bounds() {
            let ideographic = piece.chars().all(is_cjk_ideograph);
            match tokens.last_mut() {
                Some(last) if ideographic && run_open => last.push_str(piece),
                _ => tokens.push(piece.to_string()),
            }
            run_open = ideographic;
        }
        tokens
    }
}

impl Segmenter for FallbackSegmenter {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn segment(
        &self,
        text: &str,
        _dict: &SegmentDict,
        _protect: &HashSet<String>,
        _options: SegmentOptions,
    ) -> VocabResult<Vec<String>> {
        Ok(Self::tokenize(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dictionary::KnownWordDictionary;
    use crate::core::lexicon::LevelTable;

    fn dict(words: &[&str]) -> SegmentDict {
        let known: KnownWordDictionary = words.iter().copied().collect();
        SegmentDict::assemble(&LevelTable::default(), &known)
    }

    fn protect(words: &[&str]) -> HashSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn seg(text: &str, d: &SegmentDict, p: &HashSet<String>, options: SegmentOptions) -> Vec<String> {
        DictionarySegmenter::new().segment(text, d, p, options).unwrap()
    }

    #[test]
    fn test_pure_punctuation() {
        assert!(is_pure_punctuation("，"));
        assert!(is_pure_punctuation("。"));
        assert!(is_pure_punctuation("  "));
        assert!(is_pure_punctuation("!?"));
        assert!(!is_pure_punctuation("你"));
        assert!(!is_pure_punctuation("ok"));
        assert!(!is_pure_punctuation("3"));
    }

    #[test]
    fn test_longest_match() {
        let d = dict(&["你好", "世界", "世界盃"]);
        let tokens = seg("你好，世界盃！", &d, &HashSet::new(), SegmentOptions::default());
        assert_eq!(tokens, vec!["你好", "，", "世界盃", "！"]);
    }

    #[test]
    fn test_without_bias_splits_to_chars() {
        let d = dict(&["你好"]);
        let options = SegmentOptions { bias_multi_char: false, use_grammar_heuristics: false };
        assert_eq!(seg("你好", &d, &HashSet::new(), options), vec!["你", "好"]);
    }

    #[test]
    fn test_protected_form_is_not_split() {
        // 我喜 would greedily win and split 喜歡
        let d = dict(&["我喜"]);
        let tokens = seg("我喜歡", &d, &protect(&["喜歡"]), SegmentOptions::default());
        assert_eq!(tokens, vec!["我", "喜歡"]);
    }

    #[test]
    fn test_grammar_heuristics() {
        let d = dict(&["你好"]);
        let on = SegmentOptions::default();
        assert_eq!(seg("看看", &d, &HashSet::new(), on), vec!["看看"]);
        assert_eq!(seg("好不好", &d, &HashSet::new(), on), vec!["好不好"]);
        let off = SegmentOptions { use_grammar_heuristics: false, ..on };
        assert_eq!(seg("看看", &d, &HashSet::new(), off), vec!["看", "看"]);
    }

    #[test]
    fn test_rejected_reduplication_stays_split() {
        let mut known: KnownWordDictionary = ["看", "好"].into_iter().collect();
        known.reject("看看");
        known.reject("好不好");
        let d = SegmentDict::assemble(&LevelTable::default(), &known);
        let on = SegmentOptions::default();
        assert_eq!(seg("看看", &d, &HashSet::new(), on), vec!["看", "看"]);
        assert_eq!(seg("好不好", &d, &HashSet::new(), on), vec!["好", "不", "好"]);
        assert_eq!(seg("聽聽", &d, &HashSet::new(), on), vec!["聽聽"]);
    }

    #[test]
    fn test_tokens_rebuild_text() {
        let d = dict(&["咖啡", "喝咖啡"]);
        let text = "我想喝咖啡, coffee 123 please。";
        let tokens = seg(text, &d, &HashSet::new(), SegmentOptions::default());
        assert_eq!(tokens.concat(), text);
        assert!(tokens.contains(&"喝咖啡".to_string()));
        assert!(tokens.contains(&"coffee".to_string()));
    }

    #[test]
    fn test_empty_dictionary_is_unavailable() {
        let err = DictionarySegmenter::new()
            .segment("你好", &SegmentDict::default(), &HashSet::new(), SegmentOptions::default())
            .unwrap_err();
        assert!(matches!(err, VocabError::SegmenterUnavailable(_)));
    }

    #[test]
    fn test_fallback_joins_ideograph_runs() {
        assert_eq!(FallbackSegmenter::tokenize("你好，世界！"), vec!["你好", "，", "世界", "！"]);
        let tokens = FallbackSegmenter::tokenize("hello 世界");
        assert_eq!(tokens, vec!["hello", " ", "世界"]);
    }
}
