// src/core/types.rs
use crate::error::VocabError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the supported curricula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    /// 來學華語
    Lai,
    /// 當代中文
    Mtc,
}

impl SourceId {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::Lai => "lai",
            SourceId::Mtc => "mtc",
        }
    }

    /// Short tag shown next to a lesson reference.
    pub fn short_label(&self) -> &'static str {
        match self {
            SourceId::Lai => "來",
            SourceId::Mtc => "當",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceId {
    type Err = VocabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lai" => Ok(SourceId::Lai),
            "mtc" => Ok(SourceId::Mtc),
            other => Err(VocabError::invalid(format!("unknown source '{}'", other))),
        }
    }
}

/// A (source, lesson key) pair, e.g. `lai:B1` or `mtc:1-1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LessonRef {
    pub source: SourceId,
    pub key: String,
}

impl LessonRef {
    pub fn new(source: SourceId, key: impl Into<String>) -> Self {
        Self { source, key: key.into() }
    }
}

impl fmt::Display for LessonRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.key)
    }
}

impl FromStr for LessonRef {
    type Err = VocabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (source, key) = s
            .split_once(':')
            .ok_or_else(|| VocabError::invalid(format!("lesson reference '{}' lacks a source", s)))?;
        if key.is_empty() {
            return Err(VocabError::invalid(format!("lesson reference '{}' lacks a key", s)));
        }
        Ok(Self::new(source.parse()?, key))
    }
}

/// One surviving word of an analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisItem {
    pub word: String,
    /// Numeral taken from the level table entry; `None` when the table has no entry.
    pub level: Option<String>,
    /// Earliest lesson of the active source; `None` when the source never teaches it.
    #[serde(rename = "sourceLesson")]
    pub source_lesson: Option<String>,
}

pub type AnalysisResult = Vec<AnalysisItem>;

/// Display state of a lesson group control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GroupState {
    All,
    Some,
    None,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lesson_ref_parse() {
        let r: LessonRef = "mtc:1-10".parse().unwrap();
        assert_eq!(r, LessonRef::new(SourceId::Mtc, "1-10"));
        assert_eq!(r.to_string(), "mtc:1-10");
    }

    #[test]
    fn test_lesson_ref_rejects_garbage() {
        assert!("B1".parse::<LessonRef>().is_err());
        assert!("xyz:B1".parse::<LessonRef>().is_err());
        assert!("lai:".parse::<LessonRef>().is_err());
    }

    #[test]
    fn test_item_serializes_camel_source_lesson() {
        let item = AnalysisItem { word: "你好".into(), level: None, source_lesson: Some("B1".into()) };
        let json = serde_json::to_string(&item).unwrap();
        assert_eq!(json, r#"{"word":"你好","level":null,"sourceLesson":"B1"}"#);
    }
}
