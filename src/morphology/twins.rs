//! Derived twin entries: predictable siblings of demonyms and toponyms.

use std::collections::BTreeSet;

use crate::merge::lemma_key;
use crate::model::{is_capitalized, LexicalEntry, Morphology, PartOfSpeech, Translation};

/// Provenance marker of every derived entry.
pub const DERIVED: &str = "derived";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Relation {
    /// parisano (n) → parisana (adj)
    DemonymToAdjective,
    /// parisana (adj) → parisano (n)
    AdjectiveToDemonym,
    /// Italia (np) → itala (adj)
    ToponymToAdjective,
}

impl Relation {
    fn of(entry: &LexicalEntry) -> Option<Relation> {
        let lemma = entry.lemma.as_str();
        if lemma.contains(char::is_whitespace) {
            return None;
        }
        match entry.part_of_speech? {
            PartOfSpeech::Noun if !is_capitalized(lemma) && lemma.ends_with("ano") => Some(Relation::DemonymToAdjective),
            PartOfSpeech::Adjective if !is_capitalized(lemma) && lemma.ends_with("ana") => Some(Relation::AdjectiveToDemonym),
            PartOfSpeech::ProperNoun if is_capitalized(lemma) && (lemma.ends_with("ia") || lemma.ends_with("io")) => {
                Some(Relation::ToponymToAdjective)
            }
            _ => None,
        }
    }

    fn pos(self) -> PartOfSpeech {
        match self {
            Relation::DemonymToAdjective | Relation::ToponymToAdjective => PartOfSpeech::Adjective,
            Relation::AdjectiveToDemonym => PartOfSpeech::Noun,
        }
    }

    fn paradigm(self) -> &'static str {
        match self {
            Relation::DemonymToAdjective | Relation::ToponymToAdjective => "a__adj",
            Relation::AdjectiveToDemonym => "o__n",
        }
    }

    fn sibling_lemma(self, lemma: &str) -> Option<String> {
        match self {
            Relation::DemonymToAdjective => swap_ending(lemma, &["ano"], "ana"),
            Relation::AdjectiveToDemonym => swap_ending(lemma, &["ana"], "ano"),
            Relation::ToponymToAdjective => swap_ending(&lemma.to_lowercase(), &["ia", "io"], "a"),
        }
    }

    /// Target-language counterpart of a translation term.
    fn sibling_term(self, term: &str) -> Option<String> {
        if term.contains(char::is_whitespace) {
            return None;
        }
        match self {
            Relation::DemonymToAdjective => swap_ending(term, &["ano"], "ana"),
            Relation::AdjectiveToDemonym => swap_ending(term, &["ana"], "ano"),
            Relation::ToponymToAdjective => swap_ending(&term.to_lowercase(), &["ujo", "io", "ia"], "a"),
        }
    }
}

fn swap_ending(word: &str, endings: &[&str], replacement: &str) -> Option<String> {
    endings.iter().find_map(|ending| {
        let stem = word.strip_suffix(ending)?;
        (!stem.is_empty()).then(|| format!("{}{}", stem, replacement))
    })
}

/// Siblings of `entries` that are not present yet. Each twin carries its
/// paradigm and the transformed translations of its origin, scaled by
/// `confidence_factor`.
pub fn derive_twins(entries: &[LexicalEntry], confidence_factor: f64) -> Vec<LexicalEntry> {
    let mut present: BTreeSet<String> = entries.iter().map(|e| lemma_key(&e.lemma)).collect();
    let mut twins = Vec::new();

    for entry in entries {
        let relation = match Relation::of(entry) {
            Some(r) => r,
            None => continue,
        };
        let lemma = match relation.sibling_lemma(&entry.lemma) {
            Some(l) => l,
            None => continue,
        };
        if !present.insert(lemma_key(&lemma)) {
            continue;
        }

        let mut twin = LexicalEntry::new(lemma, DERIVED);
        twin.provenance.extend(entry.provenance.iter().cloned());
        twin.part_of_speech = Some(relation.pos());
        twin.morphology = Some(Morphology::new(relation.paradigm()));
        for translation in &entry.translations {
            if let Some(term) = relation.sibling_term(&translation.term) {
                twin.add_translation(Translation {
                    term,
                    language: translation.language.clone(),
                    confidence: (translation.confidence * confidence_factor).clamp(0.0, 1.0),
                    sources: translation.sources.clone(),
                });
            }
        }
        twin.sort_translations();
        log::debug!("derived '{}' from '{}'", twin.lemma, entry.lemma);
        twins.push(twin);
    }

    twins
}
