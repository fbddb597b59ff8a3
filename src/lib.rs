// src/lib.rs

pub mod config;
pub mod core;
pub mod error;
pub mod learning;
pub mod persistence;
pub use crate::core::engine::{Command, VocabSession};
pub use crate::error::{VocabError, VocabResult};
