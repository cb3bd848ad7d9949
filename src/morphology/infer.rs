//! Paradigm assignment. Rules are tried in order and the first one that
//! answers wins; entries that already carry a paradigm are left alone.

use crate::config::InferenceConfig;
use crate::model::{
    classify_case, is_capitalized, lemma_order, CaseForm, LexicalEntry, Metadata, Morphology, PartOfSpeech,
    SourceDocument, SourceKind,
};

use super::paradigms::invariant_name;
use super::twins::derive_twins;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Function words and proper nouns take their invariant paradigm.
    FixedByPos,
    /// Lowercase single words by ending.
    Suffix,
    /// Open-class part of speech without a recognised ending.
    PosDefault,
    /// Capitalized lemma known only from encyclopedic sources.
    EncyclopedicProperNoun,
}

pub const RULES: [Rule; 4] = [
    Rule::FixedByPos,
    Rule::Suffix,
    Rule::PosDefault,
    Rule::EncyclopedicProperNoun,
];

// Longest ending first
const SUFFIXES: [(&str, &str, PartOfSpeech); 4] = [
    ("ar", "ar__vblex", PartOfSpeech::Verb),
    ("o", "o__n", PartOfSpeech::Noun),
    ("a", "a__adj", PartOfSpeech::Adjective),
    ("e", "e__adv", PartOfSpeech::Adverb),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub paradigm: String,
    pub pos: PartOfSpeech,
}

impl Rule {
    pub fn name(self) -> &'static str {
        match self {
            Rule::FixedByPos => "fixed_by_pos",
            Rule::Suffix => "suffix",
            Rule::PosDefault => "pos_default",
            Rule::EncyclopedicProperNoun => "encyclopedic_proper_noun",
        }
    }

    /// `metadata` resolves provenance names to source kinds.
    pub fn apply(self, entry: &LexicalEntry, metadata: &Metadata) -> Option<Assignment> {
        match self {
            Rule::FixedByPos => {
                let pos = entry.part_of_speech.filter(|p| !p.is_open_class())?;
                Some(Assignment {
                    paradigm: invariant_name(pos),
                    pos,
                })
            }
            Rule::Suffix => {
                let lemma = entry.lemma.as_str();
                if classify_case(lemma) != CaseForm::Lower || lemma.contains(char::is_whitespace) {
                    return None;
                }
                SUFFIXES
                    .iter()
                    .find(|(suffix, _, pos)| {
                        lemma.len() > suffix.len()
                            && lemma.ends_with(suffix)
                            && entry.part_of_speech.map_or(true, |p| p == *pos)
                    })
                    .map(|(_, paradigm, pos)| Assignment {
                        paradigm: paradigm.to_string(),
                        pos: *pos,
                    })
            }
            Rule::PosDefault => {
                let pos = entry.part_of_speech.filter(|p| p.is_open_class())?;
                Some(Assignment {
                    paradigm: invariant_name(pos),
                    pos,
                })
            }
            Rule::EncyclopedicProperNoun => {
                let only_encyclopedic = !entry.provenance.is_empty()
                    && entry
                        .provenance
                        .iter()
                        .all(|source| metadata.kind_of(source) == Some(SourceKind::Encyclopedic));
                (entry.part_of_speech.is_none() && only_encyclopedic && is_capitalized(&entry.lemma)).then(|| {
                    Assignment {
                        paradigm: invariant_name(PartOfSpeech::ProperNoun),
                        pos: PartOfSpeech::ProperNoun,
                    }
                })
            }
        }
    }
}

/// First matching rule for an entry without a paradigm.
pub fn classify(entry: &LexicalEntry, metadata: &Metadata) -> Option<(Rule, Assignment)> {
    RULES
        .iter()
        .find_map(|&rule| rule.apply(entry, metadata).map(|assignment| (rule, assignment)))
}

/// Assign paradigms, then add derived twins. Unresolved entries are kept
/// as they are; the filter drops them.
pub fn infer(document: &SourceDocument, config: &InferenceConfig) -> SourceDocument {
    let mut metadata = document.metadata.clone();
    let mut entries = document.entries.clone();

    for entry in &mut entries {
        if entry.morphology.is_some() {
            metadata.bump("infer.kept", 1);
            continue;
        }
        match classify(entry, &document.metadata) {
            Some((rule, assignment)) => {
                if entry.part_of_speech.is_none() {
                    entry.part_of_speech = Some(assignment.pos);
                    entry.pos_guessed = rule == Rule::Suffix;
                }
                entry.morphology = Some(Morphology::new(assignment.paradigm));
                metadata.bump(&format!("infer.rule.{}", rule.name()), 1);
            }
            None => {
                log::debug!("no paradigm for '{}'", entry.lemma);
                metadata.bump("infer.unresolved", 1);
            }
        }
    }

    if config.derive_twins {
        let twins = derive_twins(&entries, config.twin_confidence_factor);
        metadata.bump("infer.twins", twins.len() as u64);
        entries.extend(twins);
        entries.sort_by(lemma_order);
    }

    log::info!(
        "paradigms assigned to {} of {} entries",
        entries.iter().filter(|e| e.morphology.is_some()).count(),
        entries.len()
    );

    SourceDocument { metadata, entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Translation;

    fn document(entries: Vec<LexicalEntry>) -> SourceDocument {
        let mut metadata = Metadata::new("merged", SourceKind::Merged, "test");
        metadata.contributors.insert("dict".to_string(), SourceKind::Dictionary);
        metadata.contributors.insert("wiki".to_string(), SourceKind::Encyclopedic);
        SourceDocument { metadata, entries }
    }

    fn assign(entry: LexicalEntry) -> LexicalEntry {
        let doc = infer(&document(vec![entry]), &InferenceConfig::default());
        doc.entries.into_iter().next().unwrap()
    }

    // ─────────────────────────────────────────────────────────────
    // Rules
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn hundo_noun_takes_o_paradigm() {
        let entry = assign(
            LexicalEntry::new("hundo", "dict")
                .with_pos(PartOfSpeech::Noun)
                .with_translation(Translation::new("hundo", "eo", 0.6, "dict")),
        );
        assert_eq!(entry.paradigm(), Some("o__n"));
        assert!(!entry.pos_guessed);
    }

    #[test]
    fn suffix_sets_missing_pos_as_guessed() {
        let entry = assign(LexicalEntry::new("kantar", "dict"));
        assert_eq!(entry.paradigm(), Some("ar__vblex"));
        assert_eq!(entry.part_of_speech, Some(PartOfSpeech::Verb));
        assert!(entry.pos_guessed);
    }

    #[test]
    fn function_words_are_invariant() {
        let entry = assign(LexicalEntry::new("la", "dict").with_pos(PartOfSpeech::Determiner));
        assert_eq!(entry.paradigm(), Some("__det"));
    }

    #[test]
    fn disagreeing_ending_falls_back_to_pos_default() {
        let entry = assign(LexicalEntry::new("hundo", "dict").with_pos(PartOfSpeech::Verb));
        assert_eq!(entry.paradigm(), Some("__vblex"));
    }

    #[test]
    fn capitalized_lemma_skips_suffix_rule() {
        let entry = assign(LexicalEntry::new("Hundo", "dict").with_pos(PartOfSpeech::Noun));
        assert_eq!(entry.paradigm(), Some("__n"));
    }

    #[test]
    fn encyclopedic_only_capitalized_is_proper_noun() {
        let entry = assign(LexicalEntry::new("Parizo", "wiki"));
        assert_eq!(entry.paradigm(), Some("__np"));
        assert_eq!(entry.part_of_speech, Some(PartOfSpeech::ProperNoun));
    }

    #[test]
    fn mixed_provenance_capitalized_stays_unresolved() {
        let mut entry = LexicalEntry::new("Parizo", "wiki");
        entry.provenance.insert("dict".to_string());
        let doc = infer(&document(vec![entry]), &InferenceConfig::default());
        assert_eq!(doc.entries[0].paradigm(), None);
        assert_eq!(doc.metadata.statistics["infer.unresolved"], 1);
    }

    #[test]
    fn existing_paradigm_is_kept() {
        let mut entry = LexicalEntry::new("hundo", "dict").with_pos(PartOfSpeech::Noun);
        entry.morphology = Some(Morphology::new("__n"));
        assert_eq!(assign(entry).paradigm(), Some("__n"));
    }

    // ─────────────────────────────────────────────────────────────
    // Whole document
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn statistics_and_twins() {
        let doc = infer(
            &document(vec![
                LexicalEntry::new("hundo", "dict"),
                LexicalEntry::new("parisano", "dict").with_pos(PartOfSpeech::Noun),
            ]),
            &InferenceConfig::default(),
        );
        let lemmas: Vec<&str> = doc.entries.iter().map(|e| e.lemma.as_str()).collect();
        assert_eq!(lemmas, vec!["hundo", "parisana", "parisano"]);
        assert_eq!(doc.metadata.statistics["infer.rule.suffix"], 2);
        assert_eq!(doc.metadata.statistics["infer.twins"], 1);
    }

    #[test]
    fn inference_is_idempotent() {
        let once = infer(
            &document(vec![
                LexicalEntry::new("hundo", "dict"),
                LexicalEntry::new("parisano", "dict").with_pos(PartOfSpeech::Noun),
            ]),
            &InferenceConfig::default(),
        );
        let twice = infer(&once, &InferenceConfig::default());
        assert_eq!(once.entries, twice.entries);
    }
}
