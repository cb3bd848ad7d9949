//! Translation candidates from one page of wiki markup.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::{ExtractorConfig, MarkerKind, Profile};
use crate::error::{Error, Result};
use crate::model::PartOfSpeech;

use super::clean::clean;
use super::meanings::{clean_term, split_meanings};
use super::parser::WikitextParser;

lazy_static! {
    // Level-2 headings and bare {{-xx-}} language templates end a language section
    static ref LANGUAGE_BOUNDARY: Regex =
        Regex::new(r"(?m)^[ \t]*(?:==[^=].*?[^=]==|==[^=]==|\{\{-[a-z]{2,3}-\}\})[ \t]*$").unwrap();
    // POS sub-headings (=== Substantivo ===) or bare templates on their own line ({{-subst-}})
    static ref POS_HEADER: Regex =
        Regex::new(r"(?m)^[ \t]*(?:=+[ \t]*(.+?)[ \t]*=+|\{\{([^{}]+)\}\})[ \t]*$").unwrap();
    static ref TRAILING_NUMBER: Regex = Regex::new(r"\s*\d+$").unwrap();
    static ref DISAMBIGUATION: Regex = Regex::new(r"\s*\([^()]*\)\s*$").unwrap();
    static ref TABLE_DELIMITER: Regex = Regex::new(r"\|\||\|-|\|\}|\n").unwrap();
}

/// How a candidate was found; each method has its own base confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    Template,
    Bullet,
    Interwiki,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub lemma: String,
    pub pos: Option<PartOfSpeech>,
    pub term: String,
    /// Index of the meaning the term belongs to, counted per method and section.
    pub meaning: usize,
    pub method: ExtractionMethod,
}

/// Result of scanning one page.
#[derive(Debug, Default)]
pub struct PageExtraction {
    pub section_found: bool,
    /// Parts of speech headed in the section, with or without translations.
    pub parts_of_speech: Vec<PartOfSpeech>,
    pub candidates: Vec<Candidate>,
}

pub struct Extractor {
    config: ExtractorConfig,
    target_language: String,
    profile: Profile,
    section_patterns: Vec<Regex>,
    bullet_pattern: Regex,
    interwiki_pattern: Regex,
}

impl Extractor {
    pub fn new(config: &ExtractorConfig, source_language: &str, target_language: &str, profile: Profile) -> Result<Self> {
        let section_patterns = config
            .markers_for(source_language)
            .iter()
            .map(|marker| {
                let value = regex::escape(marker.value.trim());
                let pattern = match marker.kind {
                    MarkerKind::Template => format!(
                        r"(?m)^[ \t]*(?:=+[ \t]*)?\{{\{{[ \t]*{}[ \t]*\}}\}}[ \t]*(?:=+)?[ \t]*$",
                        value
                    ),
                    MarkerKind::Heading => format!(r"(?mi)^[ \t]*==[ \t]*{}[ \t]*==[ \t]*$", value),
                };
                compile(&pattern)
            })
            .collect::<Result<Vec<_>>>()?;

        let labels = config
            .language_labels
            .iter()
            .map(|l| regex::escape(l.trim()))
            .collect::<Vec<_>>()
            .join("|");
        let bullet_pattern = compile(&format!(
            r"(?mi)^[ \t]*[*#:]+[ \t]*(?:'{{2,3}})?(?:\[\[)?(?:{})(?:\]\])?(?:'{{2,3}})?[ \t]*:(.*)$",
            labels
        ))?;
        let interwiki_pattern = compile(&format!(
            r"\[\[[ \t]*{}[ \t]*:[ \t]*([^\]|]+?)[ \t]*(?:\|[^\]]*)?\]\]",
            regex::escape(target_language)
        ))?;

        Ok(Extractor {
            config: config.clone(),
            target_language: target_language.to_string(),
            profile,
            section_patterns,
            bullet_pattern,
            interwiki_pattern,
        })
    }

    /// Non-content pages (project, category, template namespaces).
    pub fn is_special(&self, title: &str) -> bool {
        self.config.special_prefixes.iter().any(|prefix| title.starts_with(prefix.as_str()))
    }

    /// Candidates for one page. Never fails: markup that matches nothing
    /// yields nothing.
    pub fn extract(&self, title: &str, text: &str) -> PageExtraction {
        match self.profile {
            Profile::Wiktionary => self.extract_dictionary_page(title, text),
            Profile::Wikipedia => self.extract_encyclopedic_page(title, text),
        }
    }

    fn extract_dictionary_page(&self, title: &str, text: &str) -> PageExtraction {
        let lemma = title.trim();
        let section = match self.locate_section(text) {
            Some(s) => s,
            None => return PageExtraction::default(),
        };

        let mut candidates: Vec<Candidate> = Vec::new();
        let mut parts_of_speech = Vec::new();
        for (pos, segment) in self.pos_segments(section) {
            if let Some(pos) = pos {
                if !parts_of_speech.contains(&pos) {
                    parts_of_speech.push(pos);
                }
            }
            let found = self
                .template_candidates(lemma, pos, segment)
                .into_iter()
                .chain(self.bullet_candidates(lemma, pos, segment));
            for candidate in found {
                // Union: a term found by both families is kept once
                if !candidates
                    .iter()
                    .any(|c| c.pos == candidate.pos && c.term == candidate.term)
                {
                    candidates.push(candidate);
                }
            }
        }

        PageExtraction {
            section_found: true,
            parts_of_speech,
            candidates,
        }
    }

    fn extract_encyclopedic_page(&self, title: &str, text: &str) -> PageExtraction {
        let lemma = DISAMBIGUATION.replace(title.trim(), "").to_string();
        let pos = self
            .config
            .proper_noun_markers
            .iter()
            .any(|marker| text.contains(marker.as_str()))
            .then_some(PartOfSpeech::ProperNoun);

        let candidates = self
            .interwiki_pattern
            .captures(text)
            .map(|cap| {
                let term = clean_term(&DISAMBIGUATION.replace(&cap[1], ""));
                Candidate {
                    lemma: lemma.clone(),
                    pos,
                    term,
                    meaning: 0,
                    method: ExtractionMethod::Interwiki,
                }
            })
            .filter(|c| !c.term.is_empty() && !c.lemma.is_empty())
            .into_iter()
            .collect();

        PageExtraction {
            section_found: true,
            parts_of_speech: Vec::new(),
            candidates,
        }
    }

    /// The source-language section of a page. Markers are tried in
    /// configured order, so exact templates win over looser headings.
    pub fn locate_section<'t>(&self, text: &'t str) -> Option<&'t str> {
        let start = self
            .section_patterns
            .iter()
            .find_map(|pattern| pattern.find(text))?
            .end();

        let rest = &text[start..];
        let end = LANGUAGE_BOUNDARY
            .find_iter(rest)
            .find(|m| self.pos_label(m.as_str()).is_none())
            .map(|m| m.start())
            .unwrap_or(rest.len());

        Some(&rest[..end])
    }

    /// Map a heading or bare-template line to a part of speech.
    fn pos_label(&self, line: &str) -> Option<PartOfSpeech> {
        let label = line.trim().trim_matches('=').trim();
        let label = label.trim_start_matches("{{").trim_end_matches("}}");
        let label = label.split('|').next().unwrap_or("");
        let label = label.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ");
        let label = TRAILING_NUMBER.replace(&label, "");
        self.config.pos_labels.get(&*label).copied()
    }

    /// Split a section at POS headings. Text before the first POS heading
    /// has no part of speech.
    fn pos_segments<'t>(&self, section: &'t str) -> Vec<(Option<PartOfSpeech>, &'t str)> {
        let headers: Vec<(usize, usize, PartOfSpeech)> = POS_HEADER
            .find_iter(section)
            .filter_map(|m| self.pos_label(m.as_str()).map(|pos| (m.start(), m.end(), pos)))
            .collect();

        let mut segments = Vec::new();
        let first_start = headers.first().map(|h| h.0).unwrap_or(section.len());
        if !section[..first_start].trim().is_empty() {
            segments.push((None, &section[..first_start]));
        }
        for (i, &(_, body_start, pos)) in headers.iter().enumerate() {
            let end = headers.get(i + 1).map(|h| h.0).unwrap_or(section.len());
            segments.push((Some(pos), &section[body_start..end]));
        }
        segments
    }

    /// Family 2: `{{t|eo|term}}` and friends.
    fn template_candidates(&self, lemma: &str, pos: Option<PartOfSpeech>, segment: &str) -> Vec<Candidate> {
        WikitextParser::new(segment)
            .templates()
            .into_iter()
            .filter(|t| {
                let name = t.name.trim().to_lowercase();
                self.config.translation_templates.iter().any(|n| n.to_lowercase() == name)
            })
            .filter_map(|t| {
                let positional = t.positional();
                let language = positional.first()?.trim();
                if language != self.target_language {
                    return None;
                }
                let term = clean_term(&clean(positional.get(1)?));
                (!term.is_empty()).then_some(term)
            })
            .enumerate()
            .map(|(meaning, term)| Candidate {
                lemma: lemma.to_string(),
                pos,
                term,
                meaning,
                method: ExtractionMethod::Template,
            })
            .collect()
    }

    /// Family 1: `* Esperanto: free text` lines.
    fn bullet_candidates(&self, lemma: &str, pos: Option<PartOfSpeech>, segment: &str) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        let mut meaning_offset = 0;
        for cap in self.bullet_pattern.captures_iter(segment) {
            let rest = &cap[1];
            let rest = match TABLE_DELIMITER.find(rest) {
                Some(m) => &rest[..m.start()],
                None => rest,
            };
            let meanings = split_meanings(&clean(rest), self.config.synonym_max_chars);
            for (i, meaning) in meanings.iter().enumerate() {
                for term in &meaning.terms {
                    candidates.push(Candidate {
                        lemma: lemma.to_string(),
                        pos,
                        term: term.clone(),
                        meaning: meaning_offset + i,
                        method: ExtractionMethod::Bullet,
                    });
                }
            }
            meaning_offset += meanings.len();
        }
        candidates
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::Config(format!("invalid extractor pattern {}: {}", pattern, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SectionMarker;

    fn ido_config() -> ExtractorConfig {
        let mut config = ExtractorConfig::default();
        config.section_markers = config.markers_for("io");
        config.section_markers.push(SectionMarker::heading("Ido"));
        config
    }

    fn extractor() -> Extractor {
        Extractor::new(&ido_config(), "io", "eo", Profile::Wiktionary).unwrap()
    }

    fn terms(extraction: &PageExtraction) -> Vec<&str> {
        extraction.candidates.iter().map(|c| c.term.as_str()).collect()
    }

    const HUNDO_PAGE: &str = "\
== {{io}} ==
=== Substantivo ===
'''hundo''' (plurale: hundi)
# Domestika mamifero.
==== Tradukuri ====
* {{eo}}: {{t|eo|hundo}}
* Angla: [[dog]]
* Esperanto: [[hundo]], [[kaniso|kanisi]]
=== Verbo ===
* Esperanto: hundumi
== {{fr}} ==
* Esperanto: ne ĉi tie
";

    // ─────────────────────────────────────────────────────────────
    // Section location
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn section_stops_at_next_language() {
        let section = extractor().locate_section(HUNDO_PAGE).unwrap();
        assert!(section.contains("hundumi"));
        assert!(!section.contains("ne ĉi tie"));
    }

    #[test]
    fn template_marker_preferred_over_heading() {
        let text = "== Ido ==\n* Esperanto: malnova\n== {{io}} ==\n* Esperanto: nova\n";
        let section = extractor().locate_section(text).unwrap();
        assert!(section.contains("nova"));
        assert!(!section.contains("malnova"));
    }

    #[test]
    fn heading_marker_is_a_fallback() {
        let text = "== Ido ==\n* Esperanto: hundo\n";
        let extraction = extractor().extract("hundo", text);
        assert_eq!(terms(&extraction), vec!["hundo"]);
    }

    #[test]
    fn default_markers_come_from_source_language() {
        let extractor = Extractor::new(&ExtractorConfig::default(), "de", "eo", Profile::Wiktionary).unwrap();
        let text = "== {{io}} ==\n* Esperanto: kavalo\n== {{de}} ==\n* Esperanto: ĉevalo\n";
        let extraction = extractor.extract("Pferd", text);
        assert!(extraction.section_found);
        assert_eq!(terms(&extraction), vec!["ĉevalo"]);
    }

    #[test]
    fn missing_section_yields_nothing() {
        let extraction = extractor().extract("dog", "== {{en}} ==\n* Esperanto: hundo\n");
        assert!(!extraction.section_found);
        assert!(extraction.candidates.is_empty());
    }

    #[test]
    fn pos_templates_do_not_end_the_section() {
        let config = ExtractorConfig {
            section_markers: vec![SectionMarker::template("-io-")],
            ..ExtractorConfig::default()
        };
        let extractor = Extractor::new(&config, "io", "eo", Profile::Wiktionary).unwrap();
        let text = "{{-io-}}\n{{-adj-}}\n* Esperanto: granda\n{{-eo-}}\n* Esperanto: ne\n";
        let extraction = extractor.extract("granda", text);
        assert_eq!(terms(&extraction), vec!["granda"]);
        assert_eq!(extraction.candidates[0].pos, Some(PartOfSpeech::Adjective));
    }

    // ─────────────────────────────────────────────────────────────
    // Candidate families
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn both_families_are_unioned() {
        let extraction = extractor().extract("hundo", HUNDO_PAGE);
        assert_eq!(terms(&extraction), vec!["hundo", "kanisi", "hundumi"]);
        assert_eq!(extraction.parts_of_speech, vec![PartOfSpeech::Noun, PartOfSpeech::Verb]);
        let first = &extraction.candidates[0];
        assert_eq!(first.method, ExtractionMethod::Template);
        assert_eq!(first.pos, Some(PartOfSpeech::Noun));
        let last = &extraction.candidates[2];
        assert_eq!(last.pos, Some(PartOfSpeech::Verb));
        assert_eq!(last.method, ExtractionMethod::Bullet);
    }

    #[test]
    fn other_target_languages_are_ignored() {
        let text = "== {{io}} ==\n* {{t|fr|chien}} {{t|eo|hundo}}\n";
        assert_eq!(terms(&extractor().extract("hundo", text)), vec!["hundo"]);
    }

    #[test]
    fn bullet_text_stops_at_table_delimiter() {
        let text = "== {{io}} ==\n* Esperanto: hundo || kato\n";
        assert_eq!(terms(&extractor().extract("hundo", text)), vec!["hundo"]);
    }

    #[test]
    fn numbered_meanings_get_increasing_index() {
        let text = "== {{io}} ==\n* Esperanto: (1) domo; (2) konstruaĵo\n";
        let extraction = extractor().extract("domo", text);
        let meanings: Vec<usize> = extraction.candidates.iter().map(|c| c.meaning).collect();
        assert_eq!(meanings, vec![0, 1]);
    }

    #[test]
    fn no_pos_heading_leaves_pos_absent() {
        let text = "== {{io}} ==\n* Esperanto: kaj\n";
        let extraction = extractor().extract("e", text);
        assert_eq!(extraction.candidates[0].pos, None);
    }

    #[test]
    fn malformed_markup_never_panics() {
        let text = "== {{io}} ==\n* Esperanto: [[hundo {{t|eo|\n=== Substantivo\n{{{{";
        let _ = extractor().extract("hundo", text);
    }

    // ─────────────────────────────────────────────────────────────
    // Encyclopedic profile
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn interwiki_link_gives_candidate() {
        let extractor = Extractor::new(&ExtractorConfig::default(), "io", "eo", Profile::Wikipedia).unwrap();
        let text = "{{Infobox urbo}}\n'''Paris''' esas chefurbo.\n[[Kategorio:Urbi]]\n[[en:Paris]]\n[[eo:Parizo]]\n";
        let extraction = extractor.extract("Paris (urbo)", text);
        assert_eq!(extraction.candidates.len(), 1);
        let c = &extraction.candidates[0];
        assert_eq!(c.lemma, "Paris");
        assert_eq!(c.term, "Parizo");
        assert_eq!(c.pos, Some(PartOfSpeech::ProperNoun));
        assert_eq!(c.method, ExtractionMethod::Interwiki);
    }

    #[test]
    fn article_without_markers_has_no_pos() {
        let extractor = Extractor::new(&ExtractorConfig::default(), "io", "eo", Profile::Wikipedia).unwrap();
        let extraction = extractor.extract("Hundo", "Hundo esas animalo.\n[[eo:Hundo]]\n");
        assert_eq!(extraction.candidates[0].pos, None);
    }

    #[test]
    fn special_prefixes() {
        assert!(extractor().is_special("Kategorio:Substantivi"));
        assert!(!extractor().is_special("hundo"));
    }
}
