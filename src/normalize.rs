//! Dump → SourceDocument: scan pages, extract candidates, fold them into
//! lexical entries.

use std::collections::BTreeMap;
use std::io::Read;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

use crate::config::{ExtractorConfig, SourceConfig};
use crate::dump::{open_dump, parse_page, scan_pages};
use crate::error::Result;
use crate::model::{LexicalEntry, Metadata, PartOfSpeech, SourceDocument, Translation};
use crate::wikitext::{Candidate, ExtractionMethod, Extractor};

#[derive(Debug, Default)]
pub struct Stats {
    pub pages_scanned: u64,
    pub redirects: u64,
    pub special: u64,
    pub no_section: u64,
    pub pages_with_candidates: u64,
    pub candidates: u64,
    pub entries: u64,
    pub elapsed: Duration,
}

impl Stats {
    fn record(&self, metadata: &mut Metadata) {
        metadata.bump("pages", self.pages_scanned);
        metadata.bump("redirects", self.redirects);
        metadata.bump("special", self.special);
        metadata.bump("no_section", self.no_section);
        metadata.bump("pages_with_candidates", self.pages_with_candidates);
        metadata.bump("candidates", self.candidates);
        metadata.bump("entries", self.entries);
    }
}

pub struct Normalizer<'a> {
    source: &'a SourceConfig,
    config: &'a ExtractorConfig,
    target_language: &'a str,
    extractor: Extractor,
}

impl<'a> Normalizer<'a> {
    pub fn new(
        source: &'a SourceConfig,
        config: &'a ExtractorConfig,
        source_language: &str,
        target_language: &'a str,
    ) -> Result<Self> {
        let extractor = Extractor::new(config, source_language, target_language, source.profile)?;
        Ok(Normalizer {
            source,
            config,
            target_language,
            extractor,
        })
    }

    /// Read the source's dump file.
    pub fn normalize_dump(&self, quiet: bool) -> Result<(SourceDocument, Stats)> {
        let reader = open_dump(&self.source.dump)?;
        self.normalize_pages(reader, quiet)
    }

    pub fn normalize_pages(&self, reader: impl Read, quiet: bool) -> Result<(SourceDocument, Stats)> {
        let start_time = Instant::now();
        let mut stats = Stats::default();
        let mut entries: BTreeMap<(String, Option<PartOfSpeech>), LexicalEntry> = BTreeMap::new();

        let pb = if quiet {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb
        };

        scan_pages(reader, |page_xml| {
            stats.pages_scanned += 1;

            if !quiet && stats.pages_scanned % 1000 == 0 {
                let elapsed = start_time.elapsed().as_secs_f64();
                let rate = stats.pages_scanned as f64 / elapsed;
                pb.set_message(format!(
                    "{} | Pages: {} | Candidates: {} | Entries: {} | Rate: {:.0} pg/s",
                    self.source.name,
                    stats.pages_scanned,
                    stats.candidates,
                    entries.len(),
                    rate
                ));
                pb.tick();
            }

            let page = match parse_page(page_xml) {
                Some(page) => page,
                None => return true,
            };

            if !page.is_main_namespace() || self.extractor.is_special(&page.title) {
                stats.special += 1;
                return true;
            }

            if page.redirect {
                stats.redirects += 1;
                return true;
            }

            let extraction = self.extractor.extract(&page.title, &page.text);
            if !extraction.section_found {
                stats.no_section += 1;
                return true;
            }
            if !extraction.candidates.is_empty() {
                stats.pages_with_candidates += 1;
                stats.candidates += extraction.candidates.len() as u64;
            }
            for candidate in extraction.candidates {
                self.fold(&mut entries, candidate);
            }
            // A headed part of speech is worth an entry even without translations
            let lemma = page.title.trim();
            for pos in extraction.parts_of_speech {
                entries
                    .entry((lemma.to_string(), Some(pos)))
                    .or_insert_with(|| LexicalEntry::new(lemma, &self.source.name).with_pos(pos));
            }
            true
        })?;

        pb.finish_and_clear();

        let mut metadata = Metadata::new(&self.source.name, self.source.kind, self.origin());
        let mut entries: Vec<LexicalEntry> = entries.into_values().collect();
        for entry in &mut entries {
            entry.sort_translations();
        }
        stats.entries = entries.len() as u64;
        stats.elapsed = start_time.elapsed();
        stats.record(&mut metadata);

        log::info!(
            "{}: {} pages, {} candidates, {} entries",
            self.source.name,
            stats.pages_scanned,
            stats.candidates,
            stats.entries
        );

        Ok((SourceDocument { metadata, entries }, stats))
    }

    fn origin(&self) -> String {
        self.source
            .dump
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source.dump.display().to_string())
    }

    fn confidence(&self, candidate: &Candidate) -> f64 {
        let base = match candidate.method {
            ExtractionMethod::Template => self.config.confidence.template,
            ExtractionMethod::Bullet => self.config.confidence.bullet,
            ExtractionMethod::Interwiki => self.config.confidence.interwiki,
        };
        base * self.config.meaning_decay.powi(candidate.meaning as i32)
    }

    /// One entry per `(lemma, part of speech)`; repeated terms collapse.
    fn fold(&self, entries: &mut BTreeMap<(String, Option<PartOfSpeech>), LexicalEntry>, candidate: Candidate) {
        let confidence = self.confidence(&candidate);
        let translation = Translation::new(
            candidate.term,
            self.target_language,
            confidence,
            &self.source.name,
        );
        let entry = entries
            .entry((candidate.lemma.clone(), candidate.pos))
            .or_insert_with(|| {
                let mut entry = LexicalEntry::new(candidate.lemma, &self.source.name);
                entry.part_of_speech = candidate.pos;
                entry
            });
        entry.add_translation(translation);
    }
}

pub fn print_stats(source: &str, stats: &Stats) {
    println!();
    println!("============================================================");
    println!("Source: {}", source);
    println!("Pages scanned: {}", stats.pages_scanned);
    println!("Pages with candidates: {}", stats.pages_with_candidates);
    println!("Candidates: {}", stats.candidates);
    println!("Entries: {}", stats.entries);
    println!("------------------------------------------------------------");
    println!("Special pages: {}", stats.special);
    println!("Redirects: {}", stats.redirects);
    println!("Without language section: {}", stats.no_section);
    println!("Time: {}m {}s", stats.elapsed.as_secs() / 60, stats.elapsed.as_secs() % 60);
    println!(
        "Rate: {:.0} pages/sec",
        stats.pages_scanned as f64 / stats.elapsed.as_secs_f64().max(f64::EPSILON)
    );
    println!("============================================================");
}
