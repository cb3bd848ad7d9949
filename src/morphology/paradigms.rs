//! Inflection tables (Apertium pardefs) for Ido.
//!
//! A paradigm named `o__n` strips `o` from the lemma to get the root; each
//! form maps a surface ending to the lemma ending plus a tag sequence.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;

use crate::model::PartOfSpeech;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    /// Surface ending appended to the root.
    pub ending: &'static str,
    /// Tags after the part-of-speech symbol.
    pub tags: &'static [&'static str],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paradigm {
    pub name: String,
    pub pos: PartOfSpeech,
    /// Lemma ending removed to obtain the root (`o` for `hund|o`).
    pub lemma_suffix: &'static str,
    pub forms: Vec<Form>,
}

impl Form {
    const fn new(ending: &'static str, tags: &'static [&'static str]) -> Self {
        Form { ending, tags }
    }
}

impl Paradigm {
    fn inflected(name: &str, pos: PartOfSpeech, lemma_suffix: &'static str, forms: Vec<Form>) -> Self {
        Paradigm {
            name: name.to_string(),
            pos,
            lemma_suffix,
            forms,
        }
    }

    fn invariant(pos: PartOfSpeech) -> Self {
        Paradigm {
            name: invariant_name(pos),
            pos,
            lemma_suffix: "",
            forms: vec![Form { ending: "", tags: &[] }],
        }
    }

    /// The lemma minus the paradigm's lemma ending; None when the lemma
    /// does not carry that ending or nothing would be left.
    pub fn root<'l>(&self, lemma: &'l str) -> Option<&'l str> {
        let root = lemma.strip_suffix(self.lemma_suffix)?;
        (!root.is_empty() || self.lemma_suffix.is_empty()).then_some(root)
    }

    /// Every symbol the paradigm's forms emit, part of speech first.
    pub fn symbols(&self) -> Vec<&'static str> {
        let mut symbols = vec![self.pos.symbol()];
        for form in &self.forms {
            for &tag in form.tags {
                if !symbols.contains(&tag) {
                    symbols.push(tag);
                }
            }
        }
        symbols
    }
}

pub fn invariant_name(pos: PartOfSpeech) -> String {
    format!("__{}", pos.symbol())
}

static PARADIGMS: Lazy<BTreeMap<String, Paradigm>> = Lazy::new(|| {
    let mut table = vec![
        Paradigm::inflected(
            "o__n",
            PartOfSpeech::Noun,
            "o",
            vec![Form::new("o", &["sg"]), Form::new("i", &["pl"])],
        ),
        Paradigm::inflected("a__adj", PartOfSpeech::Adjective, "a", vec![Form::new("a", &[])]),
        Paradigm::inflected("e__adv", PartOfSpeech::Adverb, "e", vec![Form::new("e", &[])]),
        Paradigm::inflected(
            "ar__vblex",
            PartOfSpeech::Verb,
            "ar",
            vec![
                Form::new("ar", &["inf"]),
                Form::new("ir", &["inf", "past"]),
                Form::new("or", &["inf", "fti"]),
                Form::new("as", &["pri"]),
                Form::new("is", &["past"]),
                Form::new("os", &["fti"]),
                Form::new("us", &["cni"]),
                Form::new("ez", &["imp"]),
            ],
        ),
    ];
    table.extend(PartOfSpeech::ALL.iter().map(|&pos| Paradigm::invariant(pos)));
    table.into_iter().map(|p| (p.name.clone(), p)).collect()
});

pub fn lookup(name: &str) -> Option<&'static Paradigm> {
    PARADIGMS.get(name)
}

/// `c` attribute of a symbol definition.
pub fn symbol_description(symbol: &str) -> &'static str {
    match symbol {
        "n" => "Noun",
        "adj" => "Adjective",
        "adv" => "Adverb",
        "vblex" => "Verb",
        "prn" => "Pronoun",
        "det" => "Determiner",
        "pr" => "Preposition",
        "cnjcoo" => "Coordinating conjunction",
        "cnjsub" => "Subordinating conjunction",
        "np" => "Proper noun",
        "ij" => "Interjection",
        "num" => "Numeral",
        "sg" => "Singular",
        "pl" => "Plural",
        "inf" => "Infinitive",
        "pri" => "Present",
        "past" => "Past",
        "fti" => "Future",
        "cni" => "Conditional",
        "imp" => "Imperative",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noun_root() {
        let p = lookup("o__n").unwrap();
        assert_eq!(p.root("hundo"), Some("hund"));
        assert_eq!(p.root("kato"), Some("kat"));
        assert_eq!(p.root("o"), None);
        assert_eq!(p.root("hunda"), None);
    }

    #[test]
    fn invariant_root_is_the_lemma() {
        let p = lookup("__pr").unwrap();
        assert_eq!(p.lemma_suffix, "");
        assert_eq!(p.root("kun"), Some("kun"));
        assert_eq!(p.pos, PartOfSpeech::Preposition);
    }

    #[test]
    fn every_pos_has_an_invariant_paradigm() {
        for pos in PartOfSpeech::ALL {
            assert!(lookup(&invariant_name(pos)).is_some(), "{}", pos);
        }
    }

    #[test]
    fn verb_symbols_are_described() {
        let p = lookup("ar__vblex").unwrap();
        let symbols = p.symbols();
        assert_eq!(symbols[0], "vblex");
        assert!(symbols.contains(&"past"));
        assert!(symbols.iter().all(|s| !symbol_description(s).is_empty()));
    }
}
