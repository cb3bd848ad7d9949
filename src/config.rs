//! Pipeline configuration loaded from YAML.
//!
//! Every field has a default, so a config file only needs to list what it
//! changes. Without `--config` the loader looks for `config/pipeline.yaml`
//! and falls back to the built-in defaults.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{PartOfSpeech, SourceKind};

const DEFAULT_CONFIG_CANDIDATES: [&str; 2] = ["config/pipeline.yaml", "../config/pipeline.yaml"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub source_language: String,
    pub target_language: String,
    /// Directory holding every stage output.
    pub work_dir: PathBuf,
    pub sources: Vec<SourceConfig>,
    /// Source kinds from highest to lowest priority.
    pub source_priority: Vec<SourceKind>,
    pub extractor: ExtractorConfig,
    pub merge: MergeConfig,
    pub inference: InferenceConfig,
    pub filter: FilterConfig,
    pub export: ExportConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            source_language: "io".to_string(),
            target_language: "eo".to_string(),
            work_dir: PathBuf::from("work"),
            sources: vec![
                SourceConfig {
                    name: "io_wiktionary".to_string(),
                    kind: SourceKind::Dictionary,
                    dump: PathBuf::from("dumps/iowiktionary-latest-pages-articles.xml.bz2"),
                    profile: Profile::Wiktionary,
                },
                SourceConfig {
                    name: "eo_wiktionary".to_string(),
                    kind: SourceKind::Dictionary,
                    dump: PathBuf::from("dumps/eowiktionary-latest-pages-articles.xml.bz2"),
                    profile: Profile::Wiktionary,
                },
                SourceConfig {
                    name: "io_wikipedia".to_string(),
                    kind: SourceKind::Encyclopedic,
                    dump: PathBuf::from("dumps/iowiki-latest-pages-articles.xml.bz2"),
                    profile: Profile::Wikipedia,
                },
            ],
            source_priority: vec![
                SourceKind::Curated,
                SourceKind::Dictionary,
                SourceKind::Encyclopedic,
                SourceKind::Inferred,
            ],
            extractor: ExtractorConfig::default(),
            merge: MergeConfig::default(),
            inference: InferenceConfig::default(),
            filter: FilterConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub kind: SourceKind,
    pub dump: PathBuf,
    pub profile: Profile,
}

/// How pages of a dump are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Dictionary pages: a language section, POS headings, translation lists.
    Wiktionary,
    /// Encyclopedic articles: title plus interlanguage link.
    Wikipedia,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerKind {
    /// `{{value}}` alone on a line, optionally wrapped in `==`.
    Template,
    /// `== value ==`
    Heading,
}

/// Marker opening the source-language section of a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionMarker {
    pub kind: MarkerKind,
    pub value: String,
}

impl SectionMarker {
    pub fn template(value: &str) -> Self {
        SectionMarker {
            kind: MarkerKind::Template,
            value: value.to_string(),
        }
    }

    pub fn heading(value: &str) -> Self {
        SectionMarker {
            kind: MarkerKind::Heading,
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodConfidence {
    pub template: f64,
    pub bullet: f64,
    pub interwiki: f64,
}

impl Default for MethodConfidence {
    fn default() -> Self {
        MethodConfidence {
            template: 0.9,
            bullet: 0.7,
            interwiki: 0.6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Tried in order; the first marker found wins. Empty means the
    /// source language's templates, see [`ExtractorConfig::markers_for`].
    pub section_markers: Vec<SectionMarker>,
    /// Labels introducing a target-language bullet line (`* Esperanto: ...`).
    pub language_labels: Vec<String>,
    /// Template names whose first parameter is a language and second a term.
    pub translation_templates: Vec<String>,
    /// Heading label (lowercase) or bare template name to part of speech.
    pub pos_labels: BTreeMap<String, PartOfSpeech>,
    /// Substrings that mark an encyclopedic article as a proper noun.
    pub proper_noun_markers: Vec<String>,
    /// Title prefixes of non-content pages.
    pub special_prefixes: Vec<String>,
    pub confidence: MethodConfidence,
    /// Confidence multiplier per meaning index (first meaning is undecayed).
    pub meaning_decay: f64,
    /// Comma-separated parts shorter than this are synonyms.
    pub synonym_max_chars: usize,
}

impl ExtractorConfig {
    /// Configured markers, or `{{xx}}`, `{{-xx-}}` and `{{Lingvo|xx}}` for
    /// source language `xx`.
    pub fn markers_for(&self, source_language: &str) -> Vec<SectionMarker> {
        if !self.section_markers.is_empty() {
            return self.section_markers.clone();
        }
        vec![
            SectionMarker::template(source_language),
            SectionMarker::template(&format!("-{}-", source_language)),
            SectionMarker::template(&format!("Lingvo|{}", source_language)),
        ]
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        let pos_labels = [
            ("substantivo", PartOfSpeech::Noun),
            ("substantivo komuna", PartOfSpeech::Noun),
            ("-subst-", PartOfSpeech::Noun),
            ("noun", PartOfSpeech::Noun),
            ("verbo", PartOfSpeech::Verb),
            ("-verb-", PartOfSpeech::Verb),
            ("verb", PartOfSpeech::Verb),
            ("adjektivo", PartOfSpeech::Adjective),
            ("-adj-", PartOfSpeech::Adjective),
            ("adjective", PartOfSpeech::Adjective),
            ("adverbo", PartOfSpeech::Adverb),
            ("-adv-", PartOfSpeech::Adverb),
            ("adverb", PartOfSpeech::Adverb),
            ("pronomo", PartOfSpeech::Pronoun),
            ("-pron-", PartOfSpeech::Pronoun),
            ("pronoun", PartOfSpeech::Pronoun),
            ("artiklo", PartOfSpeech::Determiner),
            ("determinanto", PartOfSpeech::Determiner),
            ("determiner", PartOfSpeech::Determiner),
            ("prepoziciono", PartOfSpeech::Preposition),
            ("prepozicio", PartOfSpeech::Preposition),
            ("-prep-", PartOfSpeech::Preposition),
            ("preposition", PartOfSpeech::Preposition),
            ("konjunciono", PartOfSpeech::Conjunction),
            ("konjunkcio", PartOfSpeech::Conjunction),
            ("-konj-", PartOfSpeech::Conjunction),
            ("conjunction", PartOfSpeech::Conjunction),
            ("subjunciono", PartOfSpeech::SubordinatingConjunction),
            ("subjunkcio", PartOfSpeech::SubordinatingConjunction),
            ("propra nomo", PartOfSpeech::ProperNoun),
            ("-nomo-", PartOfSpeech::ProperNoun),
            ("proper noun", PartOfSpeech::ProperNoun),
            ("interjekciono", PartOfSpeech::Interjection),
            ("interjekcio", PartOfSpeech::Interjection),
            ("interjection", PartOfSpeech::Interjection),
            ("numeralo", PartOfSpeech::Numeral),
            ("numeralo kardinala", PartOfSpeech::Numeral),
            ("numeral", PartOfSpeech::Numeral),
        ]
        .into_iter()
        .map(|(label, pos)| (label.to_string(), pos))
        .collect();

        ExtractorConfig {
            section_markers: Vec::new(),
            language_labels: vec![
                "Esperanto".to_string(),
                "esperanto".to_string(),
                "eo".to_string(),
                "{{eo}}".to_string(),
                "{{Esperanto}}".to_string(),
            ],
            translation_templates: vec![
                "t".to_string(),
                "t+".to_string(),
                "t-".to_string(),
                "trad".to_string(),
                "trad-".to_string(),
                "trad+".to_string(),
                "l".to_string(),
                "ko".to_string(),
            ],
            pos_labels,
            proper_noun_markers: vec![
                "{{Infobox".to_string(),
                "{{Urbo".to_string(),
                "{{Lando".to_string(),
                "[[Kategorio:Urbi".to_string(),
                "[[Kategorio:Landi".to_string(),
                "[[Kategorio:Homi".to_string(),
                "[[Kategorio:Naskinti".to_string(),
            ],
            special_prefixes: vec![
                "Wikivortaro:".to_string(),
                "Wikipedio:".to_string(),
                "Kategorio:".to_string(),
                "Shablono:".to_string(),
                "Ŝablono:".to_string(),
                "Arkivo:".to_string(),
                "MediaWiki:".to_string(),
                "Helpo:".to_string(),
            ],
            confidence: MethodConfidence::default(),
            meaning_decay: 0.9,
            synonym_max_chars: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Conjugated-verb endings checked by the verbal homonymy filter.
    pub conjugation_suffixes: Vec<String>,
    pub infinitive_suffix: String,
}

impl Default for MergeConfig {
    fn default() -> Self {
        MergeConfig {
            conjugation_suffixes: ["is", "os", "us", "as"].iter().map(|s| s.to_string()).collect(),
            infinitive_suffix: "ar".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub derive_twins: bool,
    /// Confidence multiplier for translations carried over to a derived twin.
    pub twin_confidence_factor: f64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        InferenceConfig {
            derive_twins: true,
            twin_confidence_factor: 0.8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CognatePolicy {
    /// Drop a translation identical to its lemma when another translation exists.
    pub suppress_with_alternatives: bool,
    /// Parts of speech whose identical translations are always kept.
    pub keep_pos: Vec<PartOfSpeech>,
}

impl Default for CognatePolicy {
    fn default() -> Self {
        CognatePolicy {
            suppress_with_alternatives: true,
            keep_pos: vec![
                PartOfSpeech::Pronoun,
                PartOfSpeech::Determiner,
                PartOfSpeech::Preposition,
                PartOfSpeech::Conjunction,
                PartOfSpeech::SubordinatingConjunction,
                PartOfSpeech::Interjection,
                PartOfSpeech::Numeral,
                PartOfSpeech::ProperNoun,
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub max_chars: usize,
    pub max_words: usize,
    /// Lowercase letters of the source orthography.
    pub source_alphabet: String,
    /// Lowercase letters of the target orthography.
    pub target_alphabet: String,
    /// Non-letter characters allowed inside a word.
    pub allowed_punctuation: String,
    pub require_translation: bool,
    pub cognates: CognatePolicy,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            max_chars: 40,
            max_words: 3,
            source_alphabet: "abcdefghijklmnopqrstuvwxyz".to_string(),
            target_alphabet: "abcdefghijklmnopqrstuvwxyzĉĝĥĵŝŭ".to_string(),
            allowed_punctuation: " -'\u{2019}".to_string(),
            require_translation: false,
            cognates: CognatePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub monodix: String,
    pub bidix: String,
    /// `<alphabet>` content of the monolingual dictionary.
    pub alphabet: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            monodix: "apertium-io.io.dix".to_string(),
            bidix: "apertium-io-eo.io-eo.dix".to_string(),
            alphabet: "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load from `path`, or from the first default location that exists,
    /// or return the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => {
                if !p.exists() {
                    return Err(Error::Config(format!("config file {} not found", p.display())));
                }
                p.to_path_buf()
            }
            None => match DEFAULT_CONFIG_CANDIDATES.iter().map(PathBuf::from).find(|p| p.exists()) {
                Some(p) => p,
                None => {
                    log::debug!("no config file found, using defaults");
                    return Ok(PipelineConfig::default());
                }
            },
        };

        let mut file = File::open(&path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        let config = Self::from_yaml(&contents)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: PipelineConfig = serde_yaml::from_str(contents)?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<()> {
        if self.source_language.is_empty() || self.target_language.is_empty() {
            return Err(Error::Config("source_language and target_language are required".to_string()));
        }
        let mut names: Vec<&str> = self.sources.iter().map(|s| s.name.as_str()).collect();
        names.sort_unstable();
        if let Some(w) = names.windows(2).find(|w| w[0] == w[1]) {
            return Err(Error::Config(format!("source '{}' is listed twice", w[0])));
        }
        if let Some(s) = self.sources.iter().find(|s| s.kind == SourceKind::Merged) {
            return Err(Error::Config(format!("source '{}' cannot be of kind merged", s.name)));
        }
        Ok(())
    }

    pub fn source(&self, name: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.name == name)
    }

    /// Configured source with a command-line dump or profile applied.
    /// Unknown names are rejected: merge only reads configured sources.
    pub fn source_with_overrides(
        &self,
        name: &str,
        dump: Option<PathBuf>,
        profile: Option<Profile>,
    ) -> Result<SourceConfig> {
        let mut source = self.source(name).cloned().ok_or_else(|| {
            Error::Config(format!(
                "unknown source '{}' (configured: {})",
                name,
                self.sources
                    .iter()
                    .map(|s| s.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })?;
        if let Some(path) = dump {
            source.dump = path;
        }
        if let Some(profile) = profile {
            source.profile = profile;
        }
        Ok(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = PipelineConfig::from_yaml("target_language: en\nfilter:\n  max_words: 2\n").unwrap();
        assert_eq!(config.target_language, "en");
        assert_eq!(config.source_language, "io");
        assert_eq!(config.filter.max_words, 2);
        assert_eq!(config.filter.max_chars, 40);
        assert_eq!(config.sources.len(), 3);
    }

    #[test]
    fn section_markers_parse_from_yaml() {
        let yaml = "extractor:\n  section_markers:\n    - {kind: template, value: \"-io-\"}\n    - {kind: heading, value: Ido}\n";
        let config = PipelineConfig::from_yaml(yaml).unwrap();
        assert_eq!(
            config.extractor.section_markers,
            vec![SectionMarker::template("-io-"), SectionMarker::heading("Ido")]
        );
    }

    #[test]
    fn default_markers_follow_source_language() {
        let config = PipelineConfig::from_yaml("source_language: de\n").unwrap();
        assert_eq!(
            config.extractor.markers_for(&config.source_language),
            vec![
                SectionMarker::template("de"),
                SectionMarker::template("-de-"),
                SectionMarker::template("Lingvo|de"),
            ]
        );
    }

    #[test]
    fn configured_markers_override_source_language() {
        let yaml = "source_language: de\nextractor:\n  section_markers:\n    - {kind: heading, value: Deutsch}\n";
        let config = PipelineConfig::from_yaml(yaml).unwrap();
        assert_eq!(
            config.extractor.markers_for(&config.source_language),
            vec![SectionMarker::heading("Deutsch")]
        );
    }

    #[test]
    fn duplicate_source_names_are_rejected() {
        let yaml = "sources:\n  - {name: a, kind: dictionary, dump: a.xml, profile: wiktionary}\n  - {name: a, kind: encyclopedic, dump: b.xml, profile: wikipedia}\n";
        assert!(matches!(PipelineConfig::from_yaml(yaml), Err(Error::Config(_))));
    }

    #[test]
    fn overrides_apply_to_configured_source() {
        let config = PipelineConfig::default();
        let name = config.sources[0].name.clone();
        let source = config
            .source_with_overrides(&name, Some(PathBuf::from("local.xml")), Some(Profile::Wikipedia))
            .unwrap();
        assert_eq!(source.dump, PathBuf::from("local.xml"));
        assert_eq!(source.profile, Profile::Wikipedia);
        assert_eq!(source.kind, config.sources[0].kind);
    }

    #[test]
    fn unconfigured_source_is_rejected_even_with_dump() {
        let config = PipelineConfig::default();
        let err = config
            .source_with_overrides("elsewhere", Some(PathBuf::from("local.xml")), None)
            .unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("elsewhere")));
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let err = PipelineConfig::load(Some(Path::new("/nonexistent/pipeline.yaml"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let shipped = PipelineConfig::from_yaml(include_str!("../config/pipeline.yaml")).unwrap();
        let defaults = PipelineConfig::default();
        assert_eq!(shipped.sources.len(), defaults.sources.len());
        assert_eq!(shipped.source_priority, defaults.source_priority);
        assert_eq!(
            shipped.extractor.markers_for("io")[..3],
            defaults.extractor.markers_for(&defaults.source_language)[..]
        );
        assert_eq!(shipped.extractor.section_markers[3], SectionMarker::heading("Ido"));
        assert_eq!(shipped.filter.cognates.keep_pos, defaults.filter.cognates.keep_pos);
        assert_eq!(shipped.export.bidix, defaults.export.bidix);
    }

    #[test]
    fn pos_labels_use_symbols_in_yaml() {
        let config = PipelineConfig::from_yaml("extractor:\n  pos_labels:\n    nomo: np\n").unwrap();
        assert_eq!(config.extractor.pos_labels.get("nomo"), Some(&PartOfSpeech::ProperNoun));
    }
}
