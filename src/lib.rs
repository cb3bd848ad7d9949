//! Ido to Esperanto lexicon pipeline.
//!
//! Wiktionary and Wikipedia dumps are read into per-source documents,
//! merged, given paradigms, filtered and exported as Apertium
//! dictionaries. Every stage reads and writes JSON documents in a work
//! directory, so any stage can be rerun on its own.

pub mod config;
pub mod dump;
pub mod error;
pub mod export;
pub mod filter;
pub mod merge;
pub mod model;
pub mod morphology;
pub mod normalize;
pub mod stages;
pub mod wikitext;

pub use config::PipelineConfig;
pub use error::{Error, Result};
pub use model::{LexicalEntry, SourceDocument};
pub use stages::{Stage, StageOutcome, StageRunner};
