// File: src/error.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VocabError {
    /// Lexicon or level data missing/malformed. Fatal for the session.
    #[error("initialization failed: {0}")]
    Initialization(String),

    #[error("invalid reference: {0}")]
    InvalidReference(String),

    /// A split whose parts do not rebuild the original word.
    #[error("correction needs confirmation: '{original}' -> '{rebuilt}'")]
    AmbiguousCorrection { original: String, rebuilt: String },

    #[error("segmenter unavailable: {0}")]
    SegmenterUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] bincode::Error),
}

pub type VocabResult<T> = Result<T, VocabError>;

impl VocabError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidReference(message.into())
    }

    pub fn init(message: impl Into<String>) -> Self {
        Self::Initialization(message.into())
    }
}
