//! Wiki markup handling: parsing, cleaning, meaning splitting and
//! translation candidate extraction.

pub mod clean;
pub mod extract;
pub mod meanings;
pub mod parser;

pub use clean::{clean, CleanStep};
pub use extract::{Candidate, ExtractionMethod, Extractor, PageExtraction};
pub use meanings::{split_meanings, Meaning};
