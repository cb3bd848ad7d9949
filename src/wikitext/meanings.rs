//! Splitting a cleaned translation string into meanings and synonyms.
//!
//! - `(1) a (2) b` or `1. a 2. b`: one meaning per numbered group
//! - `a; b`: one meaning per semicolon part
//! - `a, b, c` with every part short: synonyms of one meaning
//! - longer comma-joined text: a single term

use lazy_static::lazy_static;
use regex::Regex;

use super::clean::is_edge_punctuation;

lazy_static! {
    static ref SENSE_NUMBER: Regex = Regex::new(r"(?:^|[\s;,])\(?\d{1,2}[.)]\s*").unwrap();
    static ref QUALIFIER: Regex = Regex::new(r"\([^()]*\)|\[[^\[\]]*\]").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meaning {
    pub terms: Vec<String>,
}

pub fn split_meanings(text: &str, synonym_max_chars: usize) -> Vec<Meaning> {
    split_numbered(text)
        .into_iter()
        .flat_map(|group| group.split(';').map(str::to_string).collect::<Vec<_>>())
        .filter_map(|part| {
            let terms = split_synonyms(&part, synonym_max_chars);
            (!terms.is_empty()).then_some(Meaning { terms })
        })
        .collect()
}

/// Cut at numbered sense markers. Text before the first marker is kept as
/// its own group.
fn split_numbered(text: &str) -> Vec<String> {
    let mut groups = Vec::new();
    let mut last = 0;
    for m in SENSE_NUMBER.find_iter(text) {
        groups.push(text[last..m.start()].to_string());
        last = m.end();
    }
    groups.push(text[last..].to_string());
    groups.retain(|g| !g.trim().is_empty());
    groups
}

fn split_synonyms(part: &str, synonym_max_chars: usize) -> Vec<String> {
    let pieces: Vec<String> = part.split(',').map(clean_term).collect();
    let all_short = pieces
        .iter()
        .all(|p| !p.is_empty() && p.chars().count() < synonym_max_chars);

    if pieces.len() > 1 && all_short {
        let mut terms: Vec<String> = Vec::new();
        for piece in pieces {
            if !terms.contains(&piece) {
                terms.push(piece);
            }
        }
        terms
    } else {
        let whole = clean_term(part);
        if whole.is_empty() {
            vec![]
        } else {
            vec![whole]
        }
    }
}

/// Drop parenthetical qualifiers, collapse whitespace, trim punctuation.
pub fn clean_term(raw: &str) -> String {
    let without_qualifiers = QUALIFIER.replace_all(raw, " ");
    let collapsed = WHITESPACE.replace_all(&without_qualifiers, " ");
    collapsed
        .trim_matches(|c: char| is_edge_punctuation(c) || c == '(' || c == ')')
        .to_string()
}
