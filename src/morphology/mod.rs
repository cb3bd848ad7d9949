//! Paradigm table, paradigm inference and derived twins.

pub mod infer;
pub mod paradigms;
pub mod twins;

pub use infer::{classify, infer, Assignment, Rule, RULES};
pub use paradigms::{lookup, Paradigm};
pub use twins::derive_twins;
