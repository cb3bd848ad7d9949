//! Filter & validation: drop entries and translations that cannot be
//! exported. Every rejection is counted in the document statistics.

use std::collections::BTreeSet;
use std::fmt;

use unicode_normalization::UnicodeNormalization;

use crate::config::FilterConfig;
use crate::model::{LexicalEntry, SourceDocument, Translation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rejection {
    Empty,
    Markup,
    TooLong,
    TooManyWords,
    Alphabet,
    NoLetter,
    /// No paradigm could be inferred.
    Unresolved,
    /// Translation identical to its lemma while better ones exist.
    Cognate,
    TranslationLanguage,
    NoTranslation,
}

impl Rejection {
    pub fn name(self) -> &'static str {
        match self {
            Rejection::Empty => "empty",
            Rejection::Markup => "markup",
            Rejection::TooLong => "too_long",
            Rejection::TooManyWords => "too_many_words",
            Rejection::Alphabet => "alphabet",
            Rejection::NoLetter => "no_letter",
            Rejection::Unresolved => "unresolved",
            Rejection::Cognate => "cognate",
            Rejection::TranslationLanguage => "translation_language",
            Rejection::NoTranslation => "no_translation",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const MARKUP: [&str; 10] = ["[[", "]]", "{{", "}}", "<", ">", "|", "=", "''", "&"];

/// Letters and in-word punctuation of one language.
#[derive(Debug, Clone)]
pub struct Orthography {
    letters: BTreeSet<char>,
    punctuation: BTreeSet<char>,
    max_chars: usize,
    max_words: usize,
}

impl Orthography {
    pub fn new(alphabet: &str, punctuation: &str, max_chars: usize, max_words: usize) -> Self {
        Orthography {
            letters: alphabet.nfc().flat_map(char::to_lowercase).collect(),
            punctuation: punctuation.chars().collect(),
            max_chars,
            max_words,
        }
    }

    pub fn source(config: &FilterConfig) -> Self {
        Orthography::new(&config.source_alphabet, &config.allowed_punctuation, config.max_chars, config.max_words)
    }

    pub fn target(config: &FilterConfig) -> Self {
        Orthography::new(&config.target_alphabet, &config.allowed_punctuation, config.max_chars, config.max_words)
    }

    /// Check an NFC-normalized word.
    pub fn check(&self, word: &str) -> Result<(), Rejection> {
        if word.trim().is_empty() {
            return Err(Rejection::Empty);
        }
        if MARKUP.iter().any(|m| word.contains(m)) {
            return Err(Rejection::Markup);
        }
        if word.chars().count() > self.max_chars {
            return Err(Rejection::TooLong);
        }
        if word.split_whitespace().count() > self.max_words {
            return Err(Rejection::TooManyWords);
        }
        // Only the ordinary space separates words
        if word.chars().any(|ch| ch != ' ' && ch.is_whitespace()) {
            return Err(Rejection::Alphabet);
        }

        let mut saw_letter = false;
        for ch in word.chars() {
            if self.punctuation.contains(&ch) {
                continue;
            }
            if ch.to_lowercase().all(|lower| self.letters.contains(&lower)) {
                saw_letter = true;
            } else {
                return Err(Rejection::Alphabet);
            }
        }
        if !saw_letter {
            return Err(Rejection::NoLetter);
        }
        Ok(())
    }
}

/// Drop what cannot be exported. Entries need a valid lemma and a
/// paradigm; translations need the target language and a valid term.
pub fn filter(document: &SourceDocument, config: &FilterConfig, target_language: &str) -> SourceDocument {
    let source = Orthography::source(config);
    let target = Orthography::target(config);
    let mut metadata = document.metadata.clone();
    let mut entries = Vec::with_capacity(document.entries.len());

    for entry in &document.entries {
        match filter_entry(entry, config, &source, &target, target_language) {
            Ok((kept, rejected)) => {
                for (term, reason) in rejected {
                    log::debug!("'{}': dropping translation '{}' ({})", kept.lemma, term, reason);
                    metadata.bump(&format!("filter.rejected.translation.{}", reason), 1);
                }
                entries.push(kept);
            }
            Err(reason) => {
                log::debug!("dropping entry '{}' ({})", entry.lemma, reason);
                metadata.bump(&format!("filter.rejected.entry.{}", reason), 1);
            }
        }
    }

    metadata.bump("filter.kept", entries.len() as u64);
    log::info!("kept {} of {} entries", entries.len(), document.entries.len());
    SourceDocument { metadata, entries }
}

type Filtered = (LexicalEntry, Vec<(String, Rejection)>);

fn filter_entry(
    entry: &LexicalEntry,
    config: &FilterConfig,
    source: &Orthography,
    target: &Orthography,
    target_language: &str,
) -> Result<Filtered, Rejection> {
    let lemma: String = entry.lemma.nfc().collect();
    source.check(&lemma)?;
    if entry.paradigm().map_or(true, str::is_empty) {
        return Err(Rejection::Unresolved);
    }

    let mut rejected = Vec::new();
    let mut valid: Vec<Translation> = Vec::new();
    for translation in &entry.translations {
        let term: String = translation.term.nfc().collect();
        let verdict = if translation.language != target_language {
            Err(Rejection::TranslationLanguage)
        } else {
            target.check(&term)
        };
        match verdict {
            Ok(()) => {
                let mut translation = translation.clone();
                translation.term = term;
                match valid.iter_mut().find(|t| t.term == translation.term) {
                    Some(existing) => existing.absorb(&translation),
                    None => valid.push(translation),
                }
            }
            Err(reason) => rejected.push((term, reason)),
        }
    }

    let keep_cognates = !config.cognates.suppress_with_alternatives
        || entry
            .part_of_speech
            .map_or(false, |pos| config.cognates.keep_pos.contains(&pos));
    if !keep_cognates {
        let is_cognate = |t: &Translation| t.term.to_lowercase() == lemma.to_lowercase();
        if valid.iter().any(|t| !is_cognate(t)) {
            valid.retain(|t| {
                if is_cognate(t) {
                    rejected.push((t.term.clone(), Rejection::Cognate));
                    false
                } else {
                    true
                }
            });
        }
    }

    if config.require_translation && valid.is_empty() {
        return Err(Rejection::NoTranslation);
    }

    let mut kept = entry.clone();
    kept.lemma = lemma;
    kept.translations = valid;
    kept.sort_translations();
    Ok((kept, rejected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Metadata, Morphology, PartOfSpeech, SourceKind};

    fn orthography() -> Orthography {
        Orthography::target(&FilterConfig::default())
    }

    fn entry(lemma: &str, pos: PartOfSpeech, paradigm: &str, terms: &[&str]) -> LexicalEntry {
        let mut entry = LexicalEntry::new(lemma, "src").with_pos(pos);
        entry.morphology = Some(Morphology::new(paradigm));
        for term in terms {
            entry.add_translation(Translation::new(*term, "eo", 0.7, "src"));
        }
        entry
    }

    fn run(entries: Vec<LexicalEntry>, config: &FilterConfig) -> SourceDocument {
        let doc = SourceDocument {
            metadata: Metadata::new("merged", SourceKind::Merged, "test"),
            entries,
        };
        filter(&doc, config, "eo")
    }

    // ─────────────────────────────────────────────────────────────
    // Orthography
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn accepts_esperanto_words() {
        let o = orthography();
        assert_eq!(o.check("ŝipo"), Ok(()));
        assert_eq!(o.check("Ĉina"), Ok(()));
        assert_eq!(o.check("bona tago"), Ok(()));
        assert_eq!(o.check("ek-de"), Ok(()));
    }

    #[test]
    fn rejection_reasons() {
        let o = orthography();
        assert_eq!(o.check("  "), Err(Rejection::Empty));
        assert_eq!(o.check("[[hundo]]"), Err(Rejection::Markup));
        assert_eq!(o.check(&"a".repeat(41)), Err(Rejection::TooLong));
        assert_eq!(o.check("unu du tri kvar"), Err(Rejection::TooManyWords));
        assert_eq!(o.check("собака"), Err(Rejection::Alphabet));
        assert_eq!(o.check("hundo2"), Err(Rejection::Alphabet));
        assert_eq!(o.check("hun\tdo"), Err(Rejection::Alphabet));
        assert_eq!(o.check("-'"), Err(Rejection::NoLetter));
    }

    #[test]
    fn source_alphabet_is_stricter() {
        let o = Orthography::source(&FilterConfig::default());
        assert_eq!(o.check("ŝipo"), Err(Rejection::Alphabet));
        assert_eq!(o.check("shipo"), Ok(()));
    }

    // ─────────────────────────────────────────────────────────────
    // Documents
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn entries_without_paradigm_are_dropped() {
        let mut unresolved = LexicalEntry::new("Parizo", "src");
        unresolved.morphology = None;
        let doc = run(vec![unresolved, entry("hundo", PartOfSpeech::Noun, "o__n", &["hundo"])], &FilterConfig::default());
        assert_eq!(doc.entries.len(), 1);
        assert_eq!(doc.metadata.statistics["filter.rejected.entry.unresolved"], 1);
        assert_eq!(doc.metadata.statistics["filter.kept"], 1);
    }

    #[test]
    fn lone_cognate_is_kept() {
        let doc = run(vec![entry("hundo", PartOfSpeech::Noun, "o__n", &["hundo"])], &FilterConfig::default());
        assert_eq!(doc.entries[0].translations.len(), 1);
    }

    #[test]
    fn cognate_with_alternative_is_suppressed() {
        let doc = run(
            vec![entry("kato", PartOfSpeech::Noun, "o__n", &["kato", "katino"])],
            &FilterConfig::default(),
        );
        let terms: Vec<&str> = doc.entries[0].translations.iter().map(|t| t.term.as_str()).collect();
        assert_eq!(terms, vec!["katino"]);
        assert_eq!(doc.metadata.statistics["filter.rejected.translation.cognate"], 1);
    }

    #[test]
    fn function_word_cognates_are_kept() {
        let doc = run(
            vec![entry("kun", PartOfSpeech::Preposition, "__pr", &["kun", "kune kun"])],
            &FilterConfig::default(),
        );
        assert_eq!(doc.entries[0].translations.len(), 2);
    }

    #[test]
    fn invalid_translations_are_dropped_from_entry() {
        let mut e = entry("hundo", PartOfSpeech::Noun, "o__n", &["hundo", "{{m}}"]);
        e.add_translation(Translation::new("dog", "en", 0.5, "src"));
        let doc = run(vec![e], &FilterConfig::default());
        assert_eq!(doc.entries[0].translations.len(), 1);
        assert_eq!(doc.metadata.statistics["filter.rejected.translation.markup"], 1);
        assert_eq!(doc.metadata.statistics["filter.rejected.translation.translation_language"], 1);
    }

    #[test]
    fn required_translation() {
        let config = FilterConfig {
            require_translation: true,
            ..FilterConfig::default()
        };
        let doc = run(vec![entry("hundo", PartOfSpeech::Noun, "o__n", &[])], &config);
        assert!(doc.entries.is_empty());
        assert_eq!(doc.metadata.statistics["filter.rejected.entry.no_translation"], 1);
    }

    #[test]
    fn terms_are_nfc_normalized() {
        let doc = run(
            vec![entry("shipo", PartOfSpeech::Noun, "o__n", &["s\u{302}ipo", "ŝipo"])],
            &FilterConfig::default(),
        );
        assert_eq!(doc.entries[0].translations.len(), 1);
        assert_eq!(doc.entries[0].translations[0].term, "ŝipo");
    }
}
