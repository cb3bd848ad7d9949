//! Lexicon data model shared by every stage.
//!
//! A [`SourceDocument`] is the file contract between stages: the extractor
//! writes one per dump, merge reads N and writes one (`source_name = "merged"`),
//! inference and filtering read and write the same shape.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const FORMAT_VERSION: u32 = 1;

/// Closed part-of-speech tag set, serialized with the Apertium symbol name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PartOfSpeech {
    #[serde(rename = "n")]
    Noun,
    #[serde(rename = "adj")]
    Adjective,
    #[serde(rename = "adv")]
    Adverb,
    #[serde(rename = "vblex")]
    Verb,
    #[serde(rename = "prn")]
    Pronoun,
    #[serde(rename = "det")]
    Determiner,
    #[serde(rename = "pr")]
    Preposition,
    #[serde(rename = "cnjcoo")]
    Conjunction,
    #[serde(rename = "cnjsub")]
    SubordinatingConjunction,
    #[serde(rename = "np")]
    ProperNoun,
    #[serde(rename = "ij")]
    Interjection,
    #[serde(rename = "num")]
    Numeral,
}

impl PartOfSpeech {
    pub const ALL: [PartOfSpeech; 12] = [
        PartOfSpeech::Noun,
        PartOfSpeech::Adjective,
        PartOfSpeech::Adverb,
        PartOfSpeech::Verb,
        PartOfSpeech::Pronoun,
        PartOfSpeech::Determiner,
        PartOfSpeech::Preposition,
        PartOfSpeech::Conjunction,
        PartOfSpeech::SubordinatingConjunction,
        PartOfSpeech::ProperNoun,
        PartOfSpeech::Interjection,
        PartOfSpeech::Numeral,
    ];

    /// Apertium symbol name (`<s n="..."/>`).
    pub fn symbol(self) -> &'static str {
        match self {
            PartOfSpeech::Noun => "n",
            PartOfSpeech::Adjective => "adj",
            PartOfSpeech::Adverb => "adv",
            PartOfSpeech::Verb => "vblex",
            PartOfSpeech::Pronoun => "prn",
            PartOfSpeech::Determiner => "det",
            PartOfSpeech::Preposition => "pr",
            PartOfSpeech::Conjunction => "cnjcoo",
            PartOfSpeech::SubordinatingConjunction => "cnjsub",
            PartOfSpeech::ProperNoun => "np",
            PartOfSpeech::Interjection => "ij",
            PartOfSpeech::Numeral => "num",
        }
    }

    /// Nouns, adjectives, adverbs and verbs. Everything else is a function
    /// word (or a proper noun) and is exported untagged in the bilingual
    /// dictionary.
    pub fn is_open_class(self) -> bool {
        matches!(
            self,
            PartOfSpeech::Noun | PartOfSpeech::Adjective | PartOfSpeech::Adverb | PartOfSpeech::Verb
        )
    }

    /// Noun-like tags protect a conjugated-looking lemma from the verbal
    /// homonymy filter.
    pub fn is_nominal(self) -> bool {
        matches!(
            self,
            PartOfSpeech::Noun | PartOfSpeech::Adjective | PartOfSpeech::ProperNoun
        )
    }
}

impl fmt::Display for PartOfSpeech {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for PartOfSpeech {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PartOfSpeech::ALL
            .iter()
            .copied()
            .find(|pos| pos.symbol() == s)
            .ok_or_else(|| format!("unknown part of speech '{}'", s))
    }
}

/// Origin dataset category. Declaration order is the default priority,
/// highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Curated,
    Dictionary,
    Encyclopedic,
    Inferred,
    /// Output of the merge stage and of every stage after it.
    Merged,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceKind::Curated => "curated",
            SourceKind::Dictionary => "dictionary",
            SourceKind::Encyclopedic => "encyclopedic",
            SourceKind::Inferred => "inferred",
            SourceKind::Merged => "merged",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Morphology {
    pub paradigm: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
}

impl Morphology {
    pub fn new(paradigm: impl Into<String>) -> Self {
        Morphology {
            paradigm: paradigm.into(),
            features: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    pub term: String,
    pub language: String,
    pub confidence: f64,
    pub sources: BTreeSet<String>,
}

impl Translation {
    pub fn new(term: impl Into<String>, language: impl Into<String>, confidence: f64, source: &str) -> Self {
        Translation {
            term: term.into(),
            language: language.into(),
            confidence: confidence.clamp(0.0, 1.0),
            sources: BTreeSet::from([source.to_string()]),
        }
    }

    /// Fold an identical `(term, language)` proposal into this one.
    pub fn absorb(&mut self, other: &Translation) {
        debug_assert!(self.term == other.term && self.language == other.language);
        if other.confidence > self.confidence {
            self.confidence = other.confidence;
        }
        self.sources.extend(other.sources.iter().cloned());
    }
}

// Helper function for serde skip_serializing_if
fn is_false(b: &bool) -> bool {
    !*b
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexicalEntry {
    pub lemma: String,
    #[serde(rename = "pos", default, skip_serializing_if = "Option::is_none")]
    pub part_of_speech: Option<PartOfSpeech>,
    /// The part of speech was read off the surface form, not stated by a source.
    #[serde(default, skip_serializing_if = "is_false")]
    pub pos_guessed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub morphology: Option<Morphology>,
    #[serde(default)]
    pub translations: Vec<Translation>,
    #[serde(default)]
    pub provenance: BTreeSet<String>,
}

impl LexicalEntry {
    pub fn new(lemma: impl Into<String>, source: &str) -> Self {
        LexicalEntry {
            lemma: lemma.into(),
            part_of_speech: None,
            pos_guessed: false,
            morphology: None,
            translations: Vec::new(),
            provenance: BTreeSet::from([source.to_string()]),
        }
    }

    pub fn with_pos(mut self, pos: PartOfSpeech) -> Self {
        self.part_of_speech = Some(pos);
        self
    }

    pub fn with_translation(mut self, translation: Translation) -> Self {
        self.add_translation(translation);
        self
    }

    pub fn paradigm(&self) -> Option<&str> {
        self.morphology.as_ref().map(|m| m.paradigm.as_str())
    }

    /// Add a translation, collapsing it into an existing `(term, language)` record.
    /// Returns true when it was collapsed.
    pub fn add_translation(&mut self, translation: Translation) -> bool {
        match self
            .translations
            .iter_mut()
            .find(|t| t.term == translation.term && t.language == translation.language)
        {
            Some(existing) => {
                existing.absorb(&translation);
                true
            }
            None => {
                self.translations.push(translation);
                false
            }
        }
    }

    /// Entry without provenance, for entries assembled from several sources.
    pub fn unattributed(lemma: impl Into<String>) -> Self {
        LexicalEntry {
            lemma: lemma.into(),
            part_of_speech: None,
            pos_guessed: false,
            morphology: None,
            translations: Vec::new(),
            provenance: BTreeSet::new(),
        }
    }

    /// Canonical translation order: language, confidence descending, term.
    pub fn sort_translations(&mut self) {
        self.translations.sort_by(|a, b| {
            a.language
                .cmp(&b.language)
                .then_with(|| b.confidence.total_cmp(&a.confidence))
                .then_with(|| a.term.cmp(&b.term))
        });
    }
}

/// Document order: lowercase lemma, then exact lemma.
pub fn lemma_order(a: &LexicalEntry, b: &LexicalEntry) -> Ordering {
    a.lemma
        .to_lowercase()
        .cmp(&b.lemma.to_lowercase())
        .then_with(|| a.lemma.cmp(&b.lemma))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub format_version: u32,
    pub source_name: String,
    pub source_kind: SourceKind,
    /// Identity of the dump (file name) or of the upstream documents.
    pub origin: String,
    pub extracted_at: DateTime<Utc>,
    #[serde(default)]
    pub statistics: BTreeMap<String, u64>,
    /// Source name to kind for every document folded into this one.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub contributors: BTreeMap<String, SourceKind>,
}

impl Metadata {
    pub fn new(source_name: impl Into<String>, source_kind: SourceKind, origin: impl Into<String>) -> Self {
        Metadata {
            format_version: FORMAT_VERSION,
            source_name: source_name.into(),
            source_kind,
            origin: origin.into(),
            extracted_at: Utc::now(),
            statistics: BTreeMap::new(),
            contributors: BTreeMap::new(),
        }
    }

    /// Kind of a named source: a contributor of this document, or the
    /// document itself.
    pub fn kind_of(&self, source: &str) -> Option<SourceKind> {
        self.contributors
            .get(source)
            .copied()
            .or_else(|| (source == self.source_name).then_some(self.source_kind))
    }

    pub fn bump(&mut self, key: &str, by: u64) {
        *self.statistics.entry(key.to_string()).or_insert(0) += by;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub metadata: Metadata,
    pub entries: Vec<LexicalEntry>,
}

impl SourceDocument {
    /// Structural checks beyond what deserialization enforces.
    pub fn validate(&self) -> Result<(), String> {
        if self.metadata.format_version != FORMAT_VERSION {
            return Err(format!(
                "format_version {} (expected {})",
                self.metadata.format_version, FORMAT_VERSION
            ));
        }
        if self.metadata.source_name.trim().is_empty() {
            return Err("empty source_name".to_string());
        }
        for (i, entry) in self.entries.iter().enumerate() {
            if entry.lemma.trim().is_empty() {
                return Err(format!("entry {} has an empty lemma", i));
            }
            if entry.provenance.is_empty() {
                return Err(format!("entry '{}' has no provenance", entry.lemma));
            }
            for t in &entry.translations {
                if !(0.0..=1.0).contains(&t.confidence) || t.confidence.is_nan() {
                    return Err(format!(
                        "entry '{}' translation '{}' has confidence {} outside [0,1]",
                        entry.lemma, t.term, t.confidence
                    ));
                }
                if t.sources.is_empty() {
                    return Err(format!("entry '{}' translation '{}' has no sources", entry.lemma, t.term));
                }
                if t.term.trim().is_empty() || t.language.trim().is_empty() {
                    return Err(format!("entry '{}' has an empty translation", entry.lemma));
                }
            }
        }
        Ok(())
    }
}

/// Case pattern of a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseForm {
    Lower,
    Title,
    Upper,
    Mixed,
}

/// Classify the case pattern of a word
pub fn classify_case(s: &str) -> CaseForm {
    let alpha_chars: Vec<char> = s.chars().filter(|c| c.is_alphabetic()).collect();
    if alpha_chars.is_empty() {
        return CaseForm::Lower; // Treat non-alphabetic as lowercase
    }

    let all_lower = alpha_chars.iter().all(|c| c.is_lowercase());
    let all_upper = alpha_chars.iter().all(|c| c.is_uppercase());
    let first_upper = alpha_chars.first().map(|c| c.is_uppercase()).unwrap_or(false);
    let rest_lower = alpha_chars.iter().skip(1).all(|c| c.is_lowercase());

    if all_lower {
        CaseForm::Lower
    } else if all_upper {
        CaseForm::Upper
    } else if first_upper && rest_lower {
        CaseForm::Title
    } else {
        CaseForm::Mixed
    }
}

pub fn is_capitalized(s: &str) -> bool {
    s.chars().next().map(|c| c.is_uppercase()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pos_symbols_round_trip() {
        for pos in PartOfSpeech::ALL {
            assert_eq!(pos.symbol().parse::<PartOfSpeech>(), Ok(pos));
        }
        assert!("xyz".parse::<PartOfSpeech>().is_err());
    }

    #[test]
    fn pos_serializes_as_symbol() {
        let json = serde_json::to_string(&PartOfSpeech::Verb).unwrap();
        assert_eq!(json, "\"vblex\"");
    }

    #[test]
    fn add_translation_collapses_identical_terms() {
        let mut entry = LexicalEntry::new("hundo", "a");
        assert!(!entry.add_translation(Translation::new("hundo", "eo", 0.4, "a")));
        assert!(entry.add_translation(Translation::new("hundo", "eo", 0.6, "b")));
        assert_eq!(entry.translations.len(), 1);
        let t = &entry.translations[0];
        assert_eq!(t.confidence, 0.6);
        assert_eq!(t.sources, BTreeSet::from(["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn confidence_is_clamped() {
        assert_eq!(Translation::new("x", "eo", 1.7, "a").confidence, 1.0);
        assert_eq!(Translation::new("x", "eo", -0.2, "a").confidence, 0.0);
    }

    #[test]
    fn validate_rejects_bad_confidence() {
        let mut entry = LexicalEntry::new("hundo", "a");
        entry.translations.push(Translation {
            term: "hundo".into(),
            language: "eo".into(),
            confidence: 1.5,
            sources: BTreeSet::from(["a".to_string()]),
        });
        let doc = SourceDocument {
            metadata: Metadata::new("a", SourceKind::Dictionary, "test"),
            entries: vec![entry],
        };
        assert!(doc.validate().unwrap_err().contains("outside [0,1]"));
    }

    #[test]
    fn validate_rejects_empty_lemma() {
        let doc = SourceDocument {
            metadata: Metadata::new("a", SourceKind::Dictionary, "test"),
            entries: vec![LexicalEntry::new("  ", "a")],
        };
        assert!(doc.validate().is_err());
    }

    #[test]
    fn classify_case_forms() {
        assert_eq!(classify_case("hundo"), CaseForm::Lower);
        assert_eq!(classify_case("Parizo"), CaseForm::Title);
        assert_eq!(classify_case("UNO"), CaseForm::Upper);
        assert_eq!(classify_case("iPhone"), CaseForm::Mixed);
        assert_eq!(classify_case("123"), CaseForm::Lower);
    }
}
