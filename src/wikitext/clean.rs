//! Markup cleaning as an ordered chain of independent text transforms.
//!
//! Order matters: comments and references go before templates (they may
//! contain braces), categories before links (a category is a link), and
//! whitespace/punctuation last.

use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::Regex;

use super::parser::WikitextParser;

lazy_static! {
    static ref COMMENT: Regex = Regex::new(r"(?s)<!--.*?(?:-->|\z)").unwrap();
    static ref REF_SELF_CLOSING: Regex = Regex::new(r"(?i)<ref[^>]*/>").unwrap();
    static ref REF_BLOCK: Regex = Regex::new(r"(?is)<ref[^>]*>.*?(?:</ref>|\z)").unwrap();
    static ref CATEGORY_LINK: Regex =
        Regex::new(r"(?i)\[\[\s*(?:Category|Kategorio|Kategorie|Catégorie|Categoria)\s*:[^\]]*\]\]").unwrap();
    // Interlanguage links have no leading colon and no display text
    static ref INTERLANGUAGE_LINK: Regex = Regex::new(r"\[\[[a-z]{2,3}(?:-[a-z]+)?:[^\]|]*\]\]").unwrap();
    static ref HTML_TAG: Regex = Regex::new(r"</?[a-zA-Z][^>]*>").unwrap();
    static ref EMPHASIS: Regex = Regex::new(r"'{2,}").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanStep {
    StripComments,
    StripRefs,
    StripTemplates,
    StripCategories,
    ResolveLinks,
    StripHtml,
    StripEmphasis,
    DecodeEntities,
    CollapseWhitespace,
    TrimPunctuation,
}

pub const DEFAULT_CHAIN: [CleanStep; 10] = [
    CleanStep::StripComments,
    CleanStep::StripRefs,
    CleanStep::StripTemplates,
    CleanStep::StripCategories,
    CleanStep::ResolveLinks,
    CleanStep::StripHtml,
    CleanStep::StripEmphasis,
    CleanStep::DecodeEntities,
    CleanStep::CollapseWhitespace,
    CleanStep::TrimPunctuation,
];

impl CleanStep {
    pub fn apply<'t>(self, text: &'t str) -> Cow<'t, str> {
        match self {
            CleanStep::StripComments => COMMENT.replace_all(text, ""),
            CleanStep::StripRefs => {
                let text = REF_SELF_CLOSING.replace_all(text, "");
                Cow::Owned(REF_BLOCK.replace_all(&text, "").into_owned())
            }
            CleanStep::StripTemplates => {
                if text.contains("{{") {
                    Cow::Owned(WikitextParser::new(text).without_templates().replace("}}", ""))
                } else {
                    Cow::Borrowed(text)
                }
            }
            CleanStep::StripCategories => {
                let text = CATEGORY_LINK.replace_all(text, "");
                Cow::Owned(INTERLANGUAGE_LINK.replace_all(&text, "").into_owned())
            }
            CleanStep::ResolveLinks => {
                if text.contains("[[") || text.contains("]]") {
                    Cow::Owned(WikitextParser::new(text).with_links_resolved().replace("]]", ""))
                } else {
                    Cow::Borrowed(text)
                }
            }
            CleanStep::StripHtml => HTML_TAG.replace_all(text, ""),
            CleanStep::StripEmphasis => EMPHASIS.replace_all(text, ""),
            CleanStep::DecodeEntities => decode_entities(text),
            CleanStep::CollapseWhitespace => match WHITESPACE.replace_all(text, " ") {
                Cow::Borrowed(s) => Cow::Borrowed(s.trim()),
                Cow::Owned(s) => Cow::Owned(s.trim().to_string()),
            },
            CleanStep::TrimPunctuation => Cow::Borrowed(text.trim_matches(is_edge_punctuation)),
        }
    }
}

fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }
    let decoded = text
        .replace("&nbsp;", " ")
        .replace("&ndash;", "–")
        .replace("&mdash;", "—")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");
    Cow::Owned(decoded)
}

/// Punctuation stripped from both ends of a candidate. Parentheses are
/// left alone so numbered sense markers survive until meaning splitting.
pub fn is_edge_punctuation(c: char) -> bool {
    c.is_whitespace()
        || matches!(
            c,
            '.' | ',' | ';' | ':' | '!' | '?' | '*' | '#' | '"' | '«' | '»' | '„' | '“' | '”' | '‘' | '–' | '—'
                | '…' | '·' | '/' | '|' | '-' | '='
        )
}

/// Run a chain of steps over `text`.
pub fn clean_with(text: &str, chain: &[CleanStep]) -> String {
    chain
        .iter()
        .fold(text.to_string(), |acc, step| step.apply(&acc).into_owned())
}

/// Run the default chain.
pub fn clean(text: &str) -> String {
    clean_with(text, &DEFAULT_CHAIN)
}
