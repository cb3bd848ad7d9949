//! Reading `.dix` files back into records.

use std::collections::BTreeSet;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Error, Result};

use super::{BiRecord, MonoRecord};

/// Contents of a monolingual dictionary.
#[derive(Debug, Default)]
pub struct Monodix {
    pub pardefs: BTreeSet<String>,
    pub symbols: BTreeSet<String>,
    pub entries: Vec<MonoRecord>,
}

fn attribute(element: &BytesStart, key: &[u8]) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == key {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn required(element: &BytesStart, key: &[u8]) -> Result<String> {
    attribute(element, key)?.ok_or_else(|| {
        Error::RoundTrip(format!(
            "<{}> without {} attribute",
            String::from_utf8_lossy(element.name().as_ref()),
            String::from_utf8_lossy(key)
        ))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

pub fn read_monodix(xml: &str) -> Result<Monodix> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut dix = Monodix::default();
    let mut in_section = false;
    let mut in_root = false;
    let mut current: Option<MonoRecord> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"section" => in_section = true,
                b"pardef" => {
                    dix.pardefs.insert(required(&e, b"n")?);
                }
                b"e" if in_section => {
                    current = Some(MonoRecord {
                        lemma: required(&e, b"lm")?,
                        root: String::new(),
                        paradigm: String::new(),
                    });
                }
                b"i" => in_root = true,
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"sdef" => {
                    dix.symbols.insert(required(&e, b"n")?);
                }
                b"b" if in_root => {
                    if let Some(record) = current.as_mut() {
                        record.root.push(' ');
                    }
                }
                b"par" => {
                    if let Some(record) = current.as_mut() {
                        record.paradigm = required(&e, b"n")?;
                    }
                }
                _ => {}
            },
            Event::Text(t) if in_root => {
                if let Some(record) = current.as_mut() {
                    record.root.push_str(&t.unescape()?);
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"section" => in_section = false,
                b"i" => in_root = false,
                b"e" => {
                    if let Some(record) = current.take() {
                        dix.entries.push(record);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(dix)
}

pub fn read_bidix(xml: &str) -> Result<Vec<BiRecord>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut records = Vec::new();
    let mut in_section = false;
    let mut side: Option<Side> = None;
    let mut left = (String::new(), Vec::<String>::new());
    let mut right = (String::new(), Vec::<String>::new());

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"section" => in_section = true,
                b"e" if in_section => {
                    left = (String::new(), Vec::new());
                    right = (String::new(), Vec::new());
                }
                b"l" if in_section => side = Some(Side::Left),
                b"r" if in_section => side = Some(Side::Right),
                _ => {}
            },
            Event::Empty(e) => {
                let target = match side {
                    Some(Side::Left) => &mut left,
                    Some(Side::Right) => &mut right,
                    None => continue,
                };
                match e.name().as_ref() {
                    b"b" => target.0.push(' '),
                    b"s" => target.1.push(required(&e, b"n")?),
                    _ => {}
                }
            }
            Event::Text(t) => match side {
                Some(Side::Left) => left.0.push_str(&t.unescape()?),
                Some(Side::Right) => right.0.push_str(&t.unescape()?),
                None => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"section" => in_section = false,
                b"l" | b"r" => side = None,
                b"e" if in_section => {
                    if left.1 != right.1 {
                        return Err(Error::RoundTrip(format!(
                            "'{}' / '{}': tags {:?} and {:?} differ",
                            left.0, right.0, left.1, right.1
                        )));
                    }
                    records.push(BiRecord {
                        left: std::mem::take(&mut left.0),
                        right: std::mem::take(&mut right.0),
                        tag: left.1.first().cloned(),
                    });
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MONODIX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<dictionary>
  <alphabet>abc</alphabet>
  <sdefs>
    <sdef n="n" c="Noun"/>
  </sdefs>
  <pardefs>
    <pardef n="o__n">
      <e><p><l>o</l><r>o<s n="n"/><s n="sg"/></r></p></e>
    </pardef>
  </pardefs>
  <section id="main" type="standard">
    <e lm="hundo"><i>hund</i><par n="o__n"/></e>
    <e lm="bona tago"><i>bona<b/>tago</i><par n="__ij"/></e>
  </section>
</dictionary>
"#;

    #[test]
    fn reads_monodix_entries() {
        let dix = read_monodix(MONODIX).unwrap();
        assert!(dix.pardefs.contains("o__n"));
        assert!(dix.symbols.contains("n"));
        assert_eq!(
            dix.entries,
            vec![
                MonoRecord {
                    lemma: "hundo".to_string(),
                    root: "hund".to_string(),
                    paradigm: "o__n".to_string(),
                },
                MonoRecord {
                    lemma: "bona tago".to_string(),
                    root: "bona tago".to_string(),
                    paradigm: "__ij".to_string(),
                },
            ]
        );
    }

    #[test]
    fn reads_bidix_entries() {
        let xml = r#"<dictionary><section id="main">
<e><p><l>hundo<s n="n"/></l><r>hundo<s n="n"/></r></p></e>
<e><p><l>kun</l><r>kun&amp;a</r></p></e>
</section></dictionary>"#;
        let records = read_bidix(xml).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].tag.as_deref(), Some("n"));
        assert_eq!(records[1].right, "kun&a");
        assert_eq!(records[1].tag, None);
    }

    #[test]
    fn mismatched_tags_are_rejected() {
        let xml = r#"<dictionary><section id="main">
<e><p><l>hundo<s n="n"/></l><r>hundo<s n="adj"/></r></p></e>
</section></dictionary>"#;
        assert!(matches!(read_bidix(xml), Err(Error::RoundTrip(_))));
    }

    #[test]
    fn malformed_xml_is_an_error() {
        assert!(read_bidix("<dictionary><section><e></section>").is_err());
    }
}
