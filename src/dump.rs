//! Streaming page reader for MediaWiki XML dumps (plain or bz2).
//!
//! Pages are cut out of a bounded byte buffer one `<page>...</page>` at a
//! time; the dump is never parsed as a whole document.

use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use bzip2::read::BzDecoder;
use lazy_static::lazy_static;
use regex::Regex;

const PAGE_OPEN: &[u8] = b"<page>";
const PAGE_CLOSE: &[u8] = b"</page>";
const CHUNK_SIZE: usize = 1024 * 1024; // 1MB chunks

lazy_static! {
    static ref TITLE_PATTERN: Regex = Regex::new(r"<title>([^<]+)</title>").unwrap();
    static ref NS_PATTERN: Regex = Regex::new(r"<ns>(-?\d+)</ns>").unwrap();
    static ref TEXT_PATTERN: Regex = Regex::new(r"(?s)<text[^>]*?(?:/>|>(.*?)</text>)").unwrap();
    static ref REDIRECT_PATTERN: Regex = Regex::new(r#"<redirect\s+title="[^"]+""#).unwrap();
}

/// The fields of a `<page>` element the pipeline uses.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPage {
    pub title: String,
    pub ns: Option<i64>,
    pub redirect: bool,
    /// Page markup with XML entities decoded.
    pub text: String,
}

impl RawPage {
    pub fn is_main_namespace(&self) -> bool {
        self.ns.map_or(true, |ns| ns == 0)
    }
}

/// Open a dump, decompressing `.bz2` files on the fly.
pub fn open_dump(path: &Path) -> io::Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    let reader: Box<dyn BufRead> = if path.extension().map_or(false, |ext| ext == "bz2") {
        Box::new(BufReader::with_capacity(256 * 1024, BzDecoder::new(file)))
    } else {
        Box::new(BufReader::with_capacity(256 * 1024, file))
    };
    Ok(reader)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Feed every complete `<page>` element to `callback` until it returns
/// false or the input ends. Bytes are only decoded once a page is
/// complete, so multi-byte characters split across reads survive.
pub fn scan_pages(mut reader: impl Read, mut callback: impl FnMut(&str) -> bool) -> io::Result<()> {
    let mut buffer: Vec<u8> = Vec::new();
    let mut chunk = vec![0u8; CHUNK_SIZE];

    loop {
        let bytes_read = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        buffer.extend_from_slice(&chunk[..bytes_read]);

        let mut consumed = 0;
        let mut pending_page = false;
        while let Some(offset) = find(&buffer[consumed..], PAGE_OPEN) {
            let start = consumed + offset;
            match find(&buffer[start..], PAGE_CLOSE) {
                Some(end_offset) => {
                    let end = start + end_offset + PAGE_CLOSE.len();
                    let page_xml = String::from_utf8_lossy(&buffer[start..end]);
                    if !callback(&page_xml) {
                        return Ok(());
                    }
                    consumed = end;
                }
                None => {
                    consumed = start;
                    pending_page = true;
                    break;
                }
            }
        }

        // Between pages keep only a tail that could be the start of "<page>"
        if !pending_page {
            consumed = consumed.max(buffer.len().saturating_sub(PAGE_OPEN.len() - 1));
        }
        buffer.drain(..consumed);
    }

    Ok(())
}

/// Pull title, namespace, redirect flag and text out of one page element.
/// Returns None when the page has no title.
pub fn parse_page(page_xml: &str) -> Option<RawPage> {
    let title = TITLE_PATTERN.captures(page_xml)?;
    let title = unescape(title[1].trim()).into_owned();

    let ns = NS_PATTERN
        .captures(page_xml)
        .and_then(|cap| cap[1].parse::<i64>().ok());

    let text = TEXT_PATTERN
        .captures(page_xml)
        .and_then(|cap| cap.get(1))
        .map(|m| unescape(m.as_str()).into_owned())
        .unwrap_or_default();

    Some(RawPage {
        title,
        ns,
        redirect: REDIRECT_PATTERN.is_match(page_xml),
        text,
    })
}

fn unescape(raw: &str) -> Cow<'_, str> {
    match quick_xml::escape::unescape(raw) {
        Ok(text) => text,
        Err(e) => {
            log::debug!("keeping undecodable text as is: {}", e);
            Cow::Borrowed(raw)
        }
    }
}
