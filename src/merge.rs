//! Multi-source merge: N source documents → one document with unique lemmas.

use std::collections::{BTreeMap, BTreeSet};

use unicode_normalization::UnicodeNormalization;

use crate::config::MergeConfig;
use crate::model::{lemma_order, LexicalEntry, Metadata, PartOfSpeech, SourceDocument, SourceKind};

pub const MERGED_SOURCE_NAME: &str = "merged";

/// Source kinds from highest to lowest priority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePriority {
    order: Vec<SourceKind>,
}

impl Default for SourcePriority {
    fn default() -> Self {
        SourcePriority::new(vec![
            SourceKind::Curated,
            SourceKind::Dictionary,
            SourceKind::Encyclopedic,
            SourceKind::Inferred,
        ])
    }
}

impl SourcePriority {
    pub fn new(order: Vec<SourceKind>) -> Self {
        SourcePriority { order }
    }

    /// Lower is stronger. Kinds missing from the table rank after every
    /// listed kind.
    pub fn rank(&self, kind: SourceKind) -> usize {
        self.order
            .iter()
            .position(|k| *k == kind)
            .unwrap_or(self.order.len())
    }
}

/// NFC + lowercase.
pub fn lemma_key(lemma: &str) -> String {
    lemma.nfc().collect::<String>().to_lowercase()
}

/// One source's view of a lemma.
struct Contribution<'d> {
    kinds: BTreeSet<SourceKind>,
    /// Best rank among `kinds`, or the document's rank when none resolve.
    rank: usize,
    lemma: String,
    entry: &'d LexicalEntry,
}

impl Contribution<'_> {
    fn is_encyclopedic(&self) -> bool {
        self.kinds.contains(&SourceKind::Encyclopedic)
    }

    fn is_inferred(&self) -> bool {
        !self.kinds.is_empty() && self.kinds.iter().all(|k| *k == SourceKind::Inferred)
    }
}

#[derive(Debug, Default)]
struct MergeStats {
    deduplicated: u64,
    translations_collapsed: u64,
    conjugated_dropped: u64,
}

/// Fold every document into one. The result depends only on the set of
/// documents, not on their order in `documents`.
pub fn merge(documents: &[SourceDocument], priority: &SourcePriority, config: &MergeConfig) -> SourceDocument {
    let mut ordered: Vec<&SourceDocument> = documents.iter().collect();
    ordered.sort_by(|a, b| {
        priority
            .rank(a.metadata.source_kind)
            .cmp(&priority.rank(b.metadata.source_kind))
            .then_with(|| a.metadata.source_name.cmp(&b.metadata.source_name))
            .then_with(|| a.metadata.origin.cmp(&b.metadata.origin))
    });

    let mut metadata = merged_metadata(&ordered);
    let mut stats = MergeStats::default();

    let mut groups: BTreeMap<String, Vec<Contribution>> = BTreeMap::new();
    for doc in &ordered {
        metadata.bump(&format!("entries.{}", doc.metadata.source_name), doc.entries.len() as u64);
        for entry in &doc.entries {
            let kinds = entry
                .provenance
                .iter()
                .filter_map(|source| doc.metadata.kind_of(source))
                .collect::<BTreeSet<_>>();
            let rank = kinds
                .iter()
                .map(|kind| priority.rank(*kind))
                .min()
                .unwrap_or_else(|| priority.rank(doc.metadata.source_kind));
            let lemma = entry.lemma.nfc().collect::<String>();
            groups.entry(lemma.to_lowercase()).or_default().push(Contribution {
                kinds,
                rank,
                lemma,
                entry,
            });
        }
    }
    // A merged document ranks by the sources behind each entry. Stable, so
    // equal ranks keep document order.
    for contributions in groups.values_mut() {
        contributions.sort_by_key(|c| c.rank);
    }

    let dropped = conjugated_homonyms(&groups, config);
    stats.conjugated_dropped = dropped.len() as u64;
    for key in &dropped {
        log::debug!("dropping conjugated form '{}'", key);
    }

    let mut entries: Vec<LexicalEntry> = groups
        .iter()
        .filter(|(key, _)| !dropped.contains(*key))
        .map(|(key, contributions)| {
            stats.deduplicated += contributions.len().saturating_sub(1) as u64;
            merge_group(key, contributions, &mut stats)
        })
        .collect();

    entries.sort_by(lemma_order);

    metadata.bump("deduplicated", stats.deduplicated);
    metadata.bump("translations_collapsed", stats.translations_collapsed);
    metadata.bump("conjugated_dropped", stats.conjugated_dropped);
    metadata.bump("entries", entries.len() as u64);

    log::info!(
        "merged {} documents into {} entries ({} duplicates, {} conjugated forms dropped)",
        documents.len(),
        entries.len(),
        stats.deduplicated,
        stats.conjugated_dropped
    );

    SourceDocument { metadata, entries }
}

fn merged_metadata(ordered: &[&SourceDocument]) -> Metadata {
    let mut contributors = BTreeMap::new();
    for doc in ordered {
        if doc.metadata.contributors.is_empty() {
            contributors.insert(doc.metadata.source_name.clone(), doc.metadata.source_kind);
        } else {
            contributors.extend(doc.metadata.contributors.iter().map(|(k, v)| (k.clone(), *v)));
        }
    }

    let origin = contributors.keys().cloned().collect::<Vec<_>>().join(",");
    let mut metadata = Metadata::new(MERGED_SOURCE_NAME, SourceKind::Merged, origin);
    // Newest input, so identical inputs give identical output
    if let Some(latest) = ordered.iter().map(|d| d.metadata.extracted_at).max() {
        metadata.extracted_at = latest;
    }
    metadata.contributors = contributors;
    metadata
}

/// Keys of conjugated-looking lemmas (`amis`) whose infinitive (`amar`) is
/// also present and that no contributor tags as nominal.
fn conjugated_homonyms(groups: &BTreeMap<String, Vec<Contribution>>, config: &MergeConfig) -> BTreeSet<String> {
    groups
        .iter()
        .filter(|(key, contributions)| {
            let stem = match config
                .conjugation_suffixes
                .iter()
                .find_map(|suffix| key.strip_suffix(suffix.as_str()))
            {
                Some(stem) if !stem.is_empty() => stem,
                _ => return false,
            };
            let infinitive = format!("{}{}", stem, config.infinitive_suffix);
            infinitive != **key
                && groups.contains_key(&infinitive)
                && !contributions
                    .iter()
                    .any(|c| c.entry.part_of_speech.map_or(false, PartOfSpeech::is_nominal))
        })
        .map(|(key, _)| key.clone())
        .collect()
}

/// Contributions arrive strongest first.
fn merge_group(key: &str, contributions: &[Contribution], stats: &mut MergeStats) -> LexicalEntry {
    // An all-lowercase spelling beats any capitalized one
    let lemma = if contributions.iter().any(|c| c.lemma == key) {
        key.to_string()
    } else {
        contributions[0].lemma.clone()
    };

    let mut merged = LexicalEntry::unattributed(lemma);

    let chosen = contributions.iter().find(|c| c.entry.part_of_speech.is_some());
    if let Some(chosen) = chosen {
        merged.part_of_speech = chosen.entry.part_of_speech;
        merged.pos_guessed = chosen.entry.pos_guessed;
        let weak = chosen.entry.pos_guessed || chosen.is_inferred();
        let encyclopedic_np = contributions
            .iter()
            .any(|c| c.is_encyclopedic() && c.entry.part_of_speech == Some(PartOfSpeech::ProperNoun));
        if weak && encyclopedic_np {
            merged.part_of_speech = Some(PartOfSpeech::ProperNoun);
            merged.pos_guessed = false;
        }
    }

    merged.morphology = contributions
        .iter()
        .filter(|c| c.entry.part_of_speech.is_none() || c.entry.part_of_speech == merged.part_of_speech)
        .find_map(|c| c.entry.morphology.clone());

    for c in contributions {
        merged.provenance.extend(c.entry.provenance.iter().cloned());
        for translation in &c.entry.translations {
            if merged.add_translation(translation.clone()) {
                stats.translations_collapsed += 1;
            }
        }
    }
    merged.sort_translations();
    merged
}
