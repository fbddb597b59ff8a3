// src/core/mod.rs

pub mod analysis;
pub mod dictionary;
pub mod engine;
pub mod index;
pub mod lexicon;
pub mod locator;
pub mod natural;
pub mod segmenter;
pub mod selection;
pub mod types;
