//! Apertium `.dix` rendering.
//!
//! Structural elements go on their own indented lines. Leaf content
//! (`<e>` of a section or pardef) stays on one line, so whitespace never
//! leaks into a surface form.

use std::collections::BTreeSet;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::{Error, Result};
use crate::morphology::paradigms::{self, symbol_description, Paradigm};

use super::{BiRecord, MonoRecord};

struct DixWriter {
    writer: Writer<Vec<u8>>,
}

impl DixWriter {
    fn new() -> Result<Self> {
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        Ok(DixWriter { writer })
    }

    fn newline(&mut self, depth: usize) -> Result<()> {
        let indent = format!("\n{}", "  ".repeat(depth));
        self.writer.write_event(Event::Text(BytesText::new(&indent)))?;
        Ok(())
    }

    /// Open a structural element on a new line.
    fn open(&mut self, depth: usize, element: BytesStart) -> Result<()> {
        self.newline(depth)?;
        self.start(element)
    }

    /// Close a structural element on a new line.
    fn close(&mut self, depth: usize, name: &str) -> Result<()> {
        self.newline(depth)?;
        self.end(name)
    }

    fn start(&mut self, element: BytesStart) -> Result<()> {
        self.writer.write_event(Event::Start(element))?;
        Ok(())
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn empty(&mut self, element: BytesStart) -> Result<()> {
        self.writer.write_event(Event::Empty(element))?;
        Ok(())
    }

    /// Surface text with spaces written as `<b/>`.
    fn surface(&mut self, text: &str) -> Result<()> {
        for (i, piece) in text.split(' ').enumerate() {
            if i > 0 {
                self.empty(BytesStart::new("b"))?;
            }
            if !piece.is_empty() {
                self.writer.write_event(Event::Text(BytesText::new(piece)))?;
            }
        }
        Ok(())
    }

    fn symbols<'s>(&mut self, symbols: impl IntoIterator<Item = &'s str>) -> Result<()> {
        for symbol in symbols {
            self.empty(BytesStart::new("s").with_attributes([("n", symbol)]))?;
        }
        Ok(())
    }

    /// `<l>` or `<r>` side: surface plus tags, `<l/>` when both are empty.
    fn side<'s>(&mut self, name: &str, text: &str, tags: &[&'s str]) -> Result<()> {
        if text.is_empty() && tags.is_empty() {
            return self.empty(BytesStart::new(name));
        }
        self.start(BytesStart::new(name))?;
        self.surface(text)?;
        self.symbols(tags.iter().copied())?;
        self.end(name)
    }

    fn sdefs(&mut self, symbols: &BTreeSet<&str>) -> Result<()> {
        if symbols.is_empty() {
            self.newline(1)?;
            return self.empty(BytesStart::new("sdefs"));
        }
        self.open(1, BytesStart::new("sdefs"))?;
        for symbol in symbols {
            self.newline(2)?;
            let mut sdef = BytesStart::new("sdef");
            sdef.push_attribute(("n", *symbol));
            let description = symbol_description(symbol);
            if !description.is_empty() {
                sdef.push_attribute(("c", description));
            }
            self.empty(sdef)?;
        }
        self.close(1, "sdefs")
    }

    fn alphabet(&mut self, alphabet: &str) -> Result<()> {
        self.newline(1)?;
        if alphabet.is_empty() {
            return self.empty(BytesStart::new("alphabet"));
        }
        self.start(BytesStart::new("alphabet"))?;
        self.writer.write_event(Event::Text(BytesText::new(alphabet)))?;
        self.end("alphabet")
    }

    fn open_section(&mut self) -> Result<()> {
        self.open(
            1,
            BytesStart::new("section").with_attributes([("id", "main"), ("type", "standard")]),
        )
    }

    fn finish(mut self) -> Result<Vec<u8>> {
        self.newline(0)?;
        Ok(self.writer.into_inner())
    }
}

fn paradigm(name: &str) -> Result<&'static Paradigm> {
    paradigms::lookup(name).ok_or_else(|| Error::RoundTrip(format!("unknown paradigm '{}'", name)))
}

/// Monolingual dictionary: alphabet, symbols, the referenced paradigms,
/// and one `<e lm>` per record.
pub fn write_monodix(records: &[MonoRecord], alphabet: &str) -> Result<Vec<u8>> {
    let used: BTreeSet<&str> = records.iter().map(|r| r.paradigm.as_str()).collect();
    let pardefs = used.into_iter().map(paradigm).collect::<Result<Vec<_>>>()?;
    let symbols: BTreeSet<&str> = pardefs.iter().flat_map(|p| p.symbols()).collect();

    let mut w = DixWriter::new()?;
    w.open(0, BytesStart::new("dictionary"))?;
    w.alphabet(alphabet)?;
    w.sdefs(&symbols)?;

    w.open(1, BytesStart::new("pardefs"))?;
    for pardef in &pardefs {
        w.open(2, BytesStart::new("pardef").with_attributes([("n", pardef.name.as_str())]))?;
        for form in &pardef.forms {
            let mut tags = vec![pardef.pos.symbol()];
            tags.extend_from_slice(form.tags);
            w.newline(3)?;
            w.start(BytesStart::new("e"))?;
            w.start(BytesStart::new("p"))?;
            w.side("l", form.ending, &[])?;
            w.side("r", pardef.lemma_suffix, &tags)?;
            w.end("p")?;
            w.end("e")?;
        }
        w.close(2, "pardef")?;
    }
    w.close(1, "pardefs")?;

    w.open_section()?;
    for record in records {
        w.newline(2)?;
        w.start(BytesStart::new("e").with_attributes([("lm", record.lemma.as_str())]))?;
        w.start(BytesStart::new("i"))?;
        w.surface(&record.root)?;
        w.end("i")?;
        w.empty(BytesStart::new("par").with_attributes([("n", record.paradigm.as_str())]))?;
        w.end("e")?;
    }
    w.close(1, "section")?;
    w.close(0, "dictionary")?;
    w.finish()
}

/// Bilingual dictionary: one `<e><p><l/><r/></p></e>` per record.
pub fn write_bidix(records: &[BiRecord]) -> Result<Vec<u8>> {
    let symbols: BTreeSet<&str> = records.iter().filter_map(|r| r.tag.as_deref()).collect();

    let mut w = DixWriter::new()?;
    w.open(0, BytesStart::new("dictionary"))?;
    w.alphabet("")?;
    w.sdefs(&symbols)?;

    w.open_section()?;
    for record in records {
        let tags: Vec<&str> = record.tag.as_deref().into_iter().collect();
        w.newline(2)?;
        w.start(BytesStart::new("e"))?;
        w.start(BytesStart::new("p"))?;
        w.side("l", &record.left, &tags)?;
        w.side("r", &record.right, &tags)?;
        w.end("p")?;
        w.end("e")?;
    }
    w.close(1, "section")?;
    w.close(0, "dictionary")?;
    w.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn monodix_layout() {
        let records = vec![MonoRecord {
            lemma: "hundo".to_string(),
            root: "hund".to_string(),
            paradigm: "o__n".to_string(),
        }];
        let xml = render(write_monodix(&records, "abc").unwrap());
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<dictionary>"));
        assert!(xml.contains("\n  <alphabet>abc</alphabet>"));
        assert!(xml.contains("<sdef n=\"n\" c=\"Noun\"/>"));
        assert!(xml.contains("<pardef n=\"o__n\">"));
        assert!(xml.contains("<e><p><l>i</l><r>o<s n=\"n\"/><s n=\"pl\"/></r></p></e>"));
        assert!(xml.contains("\n    <e lm=\"hundo\"><i>hund</i><par n=\"o__n\"/></e>"));
        assert!(xml.contains("<section id=\"main\" type=\"standard\">"));
        assert!(xml.ends_with("</dictionary>\n"));
    }

    #[test]
    fn only_referenced_paradigms_are_written() {
        let records = vec![MonoRecord {
            lemma: "kun".to_string(),
            root: "kun".to_string(),
            paradigm: "__pr".to_string(),
        }];
        let xml = render(write_monodix(&records, "").unwrap());
        assert!(xml.contains("<pardef n=\"__pr\">"));
        assert!(xml.contains("<e><p><l/><r><s n=\"pr\"/></r></p></e>"));
        assert!(!xml.contains("o__n"));
        assert!(xml.contains("<alphabet/>"));
    }

    #[test]
    fn spaces_become_blanks() {
        let records = vec![MonoRecord {
            lemma: "bona tago".to_string(),
            root: "bona tago".to_string(),
            paradigm: "__ij".to_string(),
        }];
        let xml = render(write_monodix(&records, "").unwrap());
        assert!(xml.contains("<e lm=\"bona tago\"><i>bona<b/>tago</i><par n=\"__ij\"/></e>"));
    }

    #[test]
    fn bidix_tags_only_when_given() {
        let records = vec![
            BiRecord {
                left: "hundo".to_string(),
                right: "hundo".to_string(),
                tag: Some("n".to_string()),
            },
            BiRecord {
                left: "kun".to_string(),
                right: "kun".to_string(),
                tag: None,
            },
        ];
        let xml = render(write_bidix(&records).unwrap());
        assert!(xml.contains("<e><p><l>hundo<s n=\"n\"/></l><r>hundo<s n=\"n\"/></r></p></e>"));
        assert!(xml.contains("<e><p><l>kun</l><r>kun</r></p></e>"));
        assert!(!xml.contains("sdef n=\"pr\""));
    }

    #[test]
    fn special_characters_are_escaped() {
        let records = vec![BiRecord {
            left: "a&b".to_string(),
            right: "<c>".to_string(),
            tag: None,
        }];
        let xml = render(write_bidix(&records).unwrap());
        assert!(xml.contains("<l>a&amp;b</l><r>&lt;c&gt;</r>"));
    }

    #[test]
    fn unknown_paradigm_is_an_error() {
        let records = vec![MonoRecord {
            lemma: "x".to_string(),
            root: "x".to_string(),
            paradigm: "nope".to_string(),
        }];
        assert!(write_monodix(&records, "").is_err());
    }
}
