//! Apertium dictionary export.

pub mod reader;
pub mod writer;

use std::path::{Path, PathBuf};

use crate::config::ExportConfig;
use crate::error::{Error, Result};
use crate::model::{lemma_order, LexicalEntry, SourceDocument};
use crate::morphology::paradigms;
use crate::stages::write_atomic;

pub use reader::{read_bidix, read_monodix, Monodix};
pub use writer::{write_bidix, write_monodix};

/// `(lemma, root, paradigm)` of a monolingual entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonoRecord {
    pub lemma: String,
    pub root: String,
    pub paradigm: String,
}

/// `(left form, right form, tag)` of a bilingual entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BiRecord {
    pub left: String,
    pub right: String,
    pub tag: Option<String>,
}

#[derive(Debug, Default)]
pub struct ExportPlan {
    pub monodix: Vec<MonoRecord>,
    pub bidix: Vec<BiRecord>,
    /// Entries whose paradigm is unknown or does not fit the lemma.
    pub skipped: Vec<String>,
}

#[derive(Debug)]
pub struct ExportSummary {
    pub monodix: PathBuf,
    pub bidix: PathBuf,
    pub mono_entries: usize,
    pub bi_entries: usize,
    pub skipped: usize,
}

/// Records for both dictionaries, in lemma order. Bilingual records only
/// exist for entries that made it into the monolingual dictionary.
pub fn plan(document: &SourceDocument, target_language: &str) -> ExportPlan {
    let mut plan = ExportPlan::default();
    let mut entries: Vec<&LexicalEntry> = document.entries.iter().collect();
    entries.sort_by(|a, b| lemma_order(a, b));

    for entry in entries {
        let paradigm = match entry.paradigm().and_then(paradigms::lookup) {
            Some(p) => p,
            None => {
                log::warn!("'{}': no known paradigm, not exported", entry.lemma);
                plan.skipped.push(entry.lemma.clone());
                continue;
            }
        };
        let root = match paradigm.root(&entry.lemma) {
            Some(r) => r,
            None => {
                log::warn!("'{}' does not fit paradigm {}, not exported", entry.lemma, paradigm.name);
                plan.skipped.push(entry.lemma.clone());
                continue;
            }
        };
        plan.monodix.push(MonoRecord {
            lemma: entry.lemma.clone(),
            root: root.to_string(),
            paradigm: paradigm.name.clone(),
        });

        let tag = Some(paradigm.pos)
            .filter(|pos| pos.is_open_class())
            .map(|pos| pos.symbol().to_string());
        for translation in entry.translations.iter().filter(|t| t.language == target_language) {
            plan.bidix.push(BiRecord {
                left: entry.lemma.clone(),
                right: translation.term.clone(),
                tag: tag.clone(),
            });
        }
    }

    plan
}

/// Re-read rendered dictionaries and compare with the records they were
/// rendered from.
pub fn verify(plan: &ExportPlan, monodix: &[u8], bidix: &[u8]) -> Result<()> {
    let mono_xml = std::str::from_utf8(monodix).map_err(|e| Error::RoundTrip(format!("monodix: {}", e)))?;
    let dix = read_monodix(mono_xml)?;
    if let Some((got, want)) = dix.entries.iter().zip(&plan.monodix).find(|(got, want)| got != want) {
        return Err(Error::RoundTrip(format!("monodix entry {:?} read back as {:?}", want, got)));
    }
    if dix.entries.len() != plan.monodix.len() {
        return Err(Error::RoundTrip(format!(
            "monodix has {} entries, expected {}",
            dix.entries.len(),
            plan.monodix.len()
        )));
    }
    if let Some(missing) = dix.entries.iter().find(|e| !dix.pardefs.contains(&e.paradigm)) {
        return Err(Error::RoundTrip(format!("paradigm {} is not defined", missing.paradigm)));
    }

    let bi_xml = std::str::from_utf8(bidix).map_err(|e| Error::RoundTrip(format!("bidix: {}", e)))?;
    let records = read_bidix(bi_xml)?;
    if records != plan.bidix {
        let first = records
            .iter()
            .zip(&plan.bidix)
            .find(|(got, want)| got != want)
            .map(|(got, want)| format!("{:?} read back as {:?}", want, got))
            .unwrap_or_else(|| format!("{} records, expected {}", records.len(), plan.bidix.len()));
        return Err(Error::RoundTrip(format!("bidix: {}", first)));
    }
    Ok(())
}

/// Render, verify, then write both dictionaries into `dir`.
pub fn export(document: &SourceDocument, config: &ExportConfig, target_language: &str, dir: &Path) -> Result<ExportSummary> {
    let plan = plan(document, target_language);
    let monodix = write_monodix(&plan.monodix, &config.alphabet)?;
    let bidix = write_bidix(&plan.bidix)?;
    verify(&plan, &monodix, &bidix)?;

    let summary = ExportSummary {
        monodix: dir.join(&config.monodix),
        bidix: dir.join(&config.bidix),
        mono_entries: plan.monodix.len(),
        bi_entries: plan.bidix.len(),
        skipped: plan.skipped.len(),
    };
    write_atomic(&summary.monodix, &monodix)?;
    write_atomic(&summary.bidix, &bidix)?;

    log::info!(
        "exported {} monolingual and {} bilingual entries ({} skipped)",
        summary.mono_entries,
        summary.bi_entries,
        summary.skipped
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LexicalEntry, Metadata, Morphology, PartOfSpeech, SourceKind, Translation};

    fn entry(lemma: &str, pos: PartOfSpeech, paradigm: &str, terms: &[&str]) -> LexicalEntry {
        let mut entry = LexicalEntry::new(lemma, "src").with_pos(pos);
        entry.morphology = Some(Morphology::new(paradigm));
        for term in terms {
            entry.add_translation(Translation::new(*term, "eo", 0.6, "src"));
        }
        entry
    }

    fn document() -> SourceDocument {
        SourceDocument {
            metadata: Metadata::new("merged", SourceKind::Merged, "test"),
            entries: vec![
                entry("bona tago", PartOfSpeech::Interjection, "__ij", &["bonan tagon"]),
                entry("hundo", PartOfSpeech::Noun, "o__n", &["hundo"]),
                entry("kantar", PartOfSpeech::Verb, "ar__vblex", &["kanti", "ĉanti"]),
                entry("kun", PartOfSpeech::Preposition, "__pr", &["kun"]),
                entry("Parizo", PartOfSpeech::ProperNoun, "__np", &["Parizo"]),
                entry("sen", PartOfSpeech::Preposition, "o__n", &[]),
            ],
        }
    }

    #[test]
    fn hundo_exported_with_root_and_paradigm() {
        let plan = plan(&document(), "eo");
        let hundo = plan.monodix.iter().find(|r| r.lemma == "hundo").unwrap();
        assert_eq!(hundo.root, "hund");
        assert_eq!(hundo.paradigm, "o__n");
    }

    #[test]
    fn open_class_only_are_tagged() {
        let plan = plan(&document(), "eo");
        let tags: Vec<(&str, Option<&str>)> = plan
            .bidix
            .iter()
            .map(|r| (r.left.as_str(), r.tag.as_deref()))
            .collect();
        assert!(tags.contains(&("hundo", Some("n"))));
        assert!(tags.contains(&("kantar", Some("vblex"))));
        assert!(tags.contains(&("kun", None)));
        assert!(tags.contains(&("Parizo", None)));
    }

    #[test]
    fn records_follow_lemma_order() {
        let mut doc = document();
        doc.entries.reverse();
        doc.entries.insert(0, entry("kato", PartOfSpeech::Noun, "o__n", &["kato"]));
        let plan = plan(&doc, "eo");
        let lemmas: Vec<&str> = plan.monodix.iter().map(|r| r.lemma.as_str()).collect();
        assert_eq!(lemmas, vec!["bona tago", "hundo", "kantar", "kato", "kun", "Parizo"]);
        let left: Vec<&str> = plan.bidix.iter().map(|r| r.left.as_str()).collect();
        assert_eq!(left.first(), Some(&"bona tago"));
        assert_eq!(left.last(), Some(&"Parizo"));
    }

    #[test]
    fn kato_before_hundo_is_reordered() {
        let doc = SourceDocument {
            metadata: Metadata::new("merged", SourceKind::Merged, "test"),
            entries: vec![
                entry("kato", PartOfSpeech::Noun, "o__n", &["kato"]),
                entry("hundo", PartOfSpeech::Noun, "o__n", &["hundo"]),
            ],
        };
        let plan = plan(&doc, "eo");
        let lemmas: Vec<&str> = plan.monodix.iter().map(|r| r.lemma.as_str()).collect();
        assert_eq!(lemmas, vec!["hundo", "kato"]);
    }

    #[test]
    fn misfit_paradigm_is_skipped() {
        let plan = plan(&document(), "eo");
        assert_eq!(plan.skipped, vec!["sen".to_string()]);
        assert!(plan.monodix.iter().all(|r| r.lemma != "sen"));
    }

    #[test]
    fn round_trip_preserves_every_record() {
        let plan = plan(&document(), "eo");
        let monodix = write_monodix(&plan.monodix, "abc").unwrap();
        let bidix = write_bidix(&plan.bidix).unwrap();
        verify(&plan, &monodix, &bidix).unwrap();
    }

    #[test]
    fn tampered_output_fails_verification() {
        let plan = plan(&document(), "eo");
        let monodix = write_monodix(&plan.monodix, "").unwrap();
        let bidix = String::from_utf8(write_bidix(&plan.bidix).unwrap())
            .unwrap()
            .replace("kanti", "kantas");
        assert!(matches!(
            verify(&plan, &monodix, bidix.as_bytes()),
            Err(Error::RoundTrip(_))
        ));
    }

    #[test]
    fn export_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let summary = export(&document(), &ExportConfig::default(), "eo", dir.path()).unwrap();
        assert!(summary.monodix.exists());
        assert!(summary.bidix.exists());
        assert_eq!(summary.mono_entries, 5);
        assert_eq!(summary.bi_entries, 6);
    }
}
