use ingest_logging::ingest_warn;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::{NsReader, Reader};
use thiserror::Error;

const ATOM_NS: &[u8] = b"http://www.w3.org/2005/Atom";

/// One (title, link) candidate pulled out of a feed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed fetch failed: {0}")]
    Fetch(#[from] crate::RenderError),
    #[error("feed document is not parseable xml: {0}")]
    Xml(#[from] quick_xml::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    None,
    Title,
    Link,
}

/// Parse a feed document into entry candidates.
///
/// RSS `item` elements are tried first; when the document carries none,
/// the Atom form (`entry` elements under the Atom namespace, `link` as an
/// `href` attribute) is used instead. Entries that cannot be read are
/// skipped with a warning; one bad entry never aborts the feed.
pub fn parse_feed(bytes: &[u8]) -> Result<Vec<FeedEntry>, FeedError> {
    let (entries, seen_items) = parse_rss(bytes)?;
    if seen_items > 0 {
        return Ok(entries);
    }
    parse_atom(bytes)
}

/// Strip the stray markup some feeds leave in titles.
pub fn clean_title(raw: &str) -> String {
    raw.replace("<strong>", "")
        .replace("</strong>", "")
        .replace("&nbsp;", " ")
}

fn parse_rss(bytes: &[u8]) -> Result<(Vec<FeedEntry>, usize), FeedError> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut entries = Vec::new();
    let mut seen_items = 0usize;
    let mut in_item = false;
    let mut field = Field::None;
    let mut title = String::new();
    let mut link = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"item" => {
                    in_item = true;
                    seen_items += 1;
                    title.clear();
                    link.clear();
                }
                b"title" if in_item => field = Field::Title,
                b"link" if in_item => field = Field::Link,
                _ => {}
            },
            Event::Text(t) if in_item && field != Field::None => match t.unescape() {
                Ok(text) => append_field(&mut title, &mut link, field, &text),
                Err(err) => ingest_warn!("unreadable text in feed entry, skipping chunk: {err}"),
            },
            Event::CData(t) if in_item && field != Field::None => {
                let text = String::from_utf8_lossy(&t.into_inner()).into_owned();
                append_field(&mut title, &mut link, field, &text);
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"item" => {
                    in_item = false;
                    push_entry(&mut entries, &title, &link);
                }
                b"title" | b"link" => field = Field::None,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok((entries, seen_items))
}

fn parse_atom(bytes: &[u8]) -> Result<Vec<FeedEntry>, FeedError> {
    let mut reader = NsReader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut entries = Vec::new();
    let mut in_entry = false;
    let mut field = Field::None;
    let mut title = String::new();
    let mut link = String::new();

    loop {
        let (resolve, event) = reader.read_resolved_event_into(&mut buf)?;
        let in_atom = matches!(resolve, ResolveResult::Bound(Namespace(ns)) if ns == ATOM_NS);
        match event {
            Event::Start(e) if in_atom => match e.local_name().as_ref() {
                b"entry" => {
                    in_entry = true;
                    field = Field::None;
                    title.clear();
                    link.clear();
                }
                b"title" if in_entry => field = Field::Title,
                b"link" if in_entry => {
                    if link.is_empty() {
                        if let Some(href) = attr_href(&e) {
                            link = href;
                        }
                    }
                }
                _ => {}
            },
            Event::Empty(e)
                if in_atom && in_entry && e.local_name().as_ref() == b"link" =>
            {
                if link.is_empty() {
                    if let Some(href) = attr_href(&e) {
                        link = href;
                    }
                }
            }
            Event::Text(t) if in_entry && field == Field::Title => match t.unescape() {
                Ok(text) => title.push_str(&text),
                Err(err) => ingest_warn!("unreadable text in feed entry, skipping chunk: {err}"),
            },
            Event::CData(t) if in_entry && field == Field::Title => {
                title.push_str(&String::from_utf8_lossy(&t.into_inner()));
            }
            Event::End(e) if in_entry => match e.local_name().as_ref() {
                b"entry" => {
                    in_entry = false;
                    push_entry(&mut entries, &title, &link);
                }
                b"title" => field = Field::None,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(entries)
}

fn append_field(title: &mut String, link: &mut String, field: Field, text: &str) {
    match field {
        Field::Title => title.push_str(text),
        Field::Link => link.push_str(text),
        Field::None => {}
    }
}

fn push_entry(entries: &mut Vec<FeedEntry>, title: &str, link: &str) {
    if link.trim().is_empty() {
        ingest_warn!("feed entry {title:?} has no link, skipping");
        return;
    }
    entries.push(FeedEntry {
        title: title.trim().to_string(),
        link: link.trim().to_string(),
    });
}

fn attr_href(e: &BytesStart) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == b"href" {
            return attr.unescape_value().ok().map(|v| v.into_owned());
        }
    }
    None
}
