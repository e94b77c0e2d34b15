//! Extraction of readable/writable file formats from knowledge-graph entity pages.
//!
//! Entity pages list statements as runs of links. A statement starts with a property link
//! (`Property:P1072` for readable formats, `Property:P1073` for writable formats), followed by
//! links to the value entities and, interleaved, links to qualifier/reference properties.
//! The page is scanned link by link through [`ScanState::transition`].

use crate::types::{singletons, FormatSupport};
use once_cell::sync::Lazy;
use regex::Regex;

pub const READABLE_FILE_FORMAT: &str = "P1072";
pub const WRITABLE_FILE_FORMAT: &str = "P1073";

/// Reference/qualifier properties that may appear inside a format list without ending it
/// (reference URL, retrieved, title, publisher).
pub const LIST_QUALIFIERS: &[&str] = &["P854", "P813", "P1476", "P123"];

static ANCHOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?is)<a\b([^>]*)>"#).expect("anchor regex"));
static TITLE_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\btitle\s*=\s*"([^"]*)""#).expect("title regex"));
static HREF_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\bhref\s*=\s*"([^"]*)""#).expect("href regex"));
static PROPERTY_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Property:([A-Za-z]\d+)").expect("property regex"));
static ENTITY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(Q\d+)").expect("entity regex"));
static WIKI_HREF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/wiki/([A-Za-z]\d+)").expect("wiki href regex"));

/// A link on an entity page, classified by its `title` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageToken {
    /// `Property:Pnnn`
    Property(String),
    /// Any title mentioning an entity id `Qnnn`.
    Entity(String),
    Other,
}

impl PageToken {
    pub fn from_title(title: &str) -> Self {
        if let Some(caps) = PROPERTY_TITLE.captures(title) {
            return Self::Property(caps[1].to_string());
        }
        match ENTITY_TAG.captures(title) {
            Some(caps) => Self::Entity(caps[1].to_string()),
            None => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanState {
    #[default]
    Outside,
    Readable,
    Writable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emitted {
    Read(String),
    Write(String),
}

impl ScanState {
    /// Transition table of the page scanner.
    ///
    /// | state    | token                  | next     | emits    |
    /// |----------|------------------------|----------|----------|
    /// | any      | `Property(P1072)`      | Readable |          |
    /// | any      | `Property(P1073)`      | Writable |          |
    /// | any      | `Property(qualifier)`  | same     |          |
    /// | any      | `Property(other)`      | Outside  |          |
    /// | Readable | `Entity(q)`            | Readable | `Read(q)`  |
    /// | Writable | `Entity(q)`            | Writable | `Write(q)` |
    /// | any      | otherwise              | same     |          |
    pub fn transition(self, token: &PageToken) -> (Self, Option<Emitted>) {
        match token {
            PageToken::Property(id) if id == READABLE_FILE_FORMAT => (Self::Readable, None),
            PageToken::Property(id) if id == WRITABLE_FILE_FORMAT => (Self::Writable, None),
            PageToken::Property(id) if LIST_QUALIFIERS.contains(&id.as_str()) => (self, None),
            PageToken::Property(_) => (Self::Outside, None),
            PageToken::Entity(tag) => match self {
                Self::Readable => (self, Some(Emitted::Read(tag.clone()))),
                Self::Writable => (self, Some(Emitted::Write(tag.clone()))),
                Self::Outside => (self, None),
            },
            PageToken::Other => (self, None),
        }
    }
}

/// Tokens for every `<a>` element carrying a `title`, in document order.
pub fn tokenize(html: &str) -> Vec<PageToken> {
    ANCHOR
        .captures_iter(html)
        .filter_map(|anchor| {
            TITLE_ATTR
                .captures(&anchor[1])
                .map(|title| PageToken::from_title(&title[1]))
        })
        .collect()
}

/// Runs the scanner over an entity page.
///
/// A tag listed more than once within the same list is dropped entirely.
pub fn parse_entity_page(html: &str) -> FormatSupport {
    let mut state = ScanState::default();
    let mut read = Vec::new();
    let mut write = Vec::new();

    for token in tokenize(html) {
        let (next, emitted) = state.transition(&token);
        if next != state {
            log::debug!("scanner {:?} -> {:?} on {:?}", state, next, token);
        }
        match emitted {
            Some(Emitted::Read(tag)) => {
                log::debug!("readable format: {tag}");
                read.push(tag);
            }
            Some(Emitted::Write(tag)) => {
                log::debug!("writable format: {tag}");
                write.push(tag);
            }
            None => {}
        }
        state = next;
    }

    FormatSupport {
        read_formats: singletons(&read),
        write_formats: singletons(&write),
    }
}

/// Entity linked from a `Special:WhatLinksHere` page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedEntity {
    pub tag: String,
    pub name: String,
}

/// Entities linking to `target`, excluding the target itself.
pub fn parse_what_links_here(html: &str, target: &str) -> Vec<LinkedEntity> {
    let mut linked: Vec<LinkedEntity> = Vec::new();
    for anchor in ANCHOR.captures_iter(html) {
        let attrs = &anchor[1];
        let Some(href) = HREF_ATTR.captures(attrs) else {
            continue;
        };
        let Some(tag) = WIKI_HREF.captures(&href[1]).map(|c| c[1].to_string()) else {
            continue;
        };
        if tag == target || linked.iter().any(|e| e.tag == tag) {
            continue;
        }
        let name = TITLE_ATTR
            .captures(attrs)
            .map(|t| t[1].replace('\u{200e}', ""))
            .unwrap_or_default();
        linked.push(LinkedEntity { tag, name });
    }
    linked
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn link(title: &str) -> String {
        format!(r#"<a href="/wiki/{title}" title="{title}">x</a>"#)
    }

    fn page(titles: &[&str]) -> String {
        titles.iter().map(|t| link(t)).collect::<Vec<_>>().join("\n")
    }

    #[test]
    fn tokens_are_classified_by_title() {
        assert_eq!(
            PageToken::from_title("Property:P1072"),
            PageToken::Property("P1072".into())
        );
        assert_eq!(PageToken::from_title("Q11261"), PageToken::Entity("Q11261".into()));
        assert_eq!(PageToken::from_title("Main Page"), PageToken::Other);
    }

    #[test]
    fn qualifiers_keep_the_list_open() {
        let (state, _) = ScanState::Readable.transition(&PageToken::Property("P813".into()));
        assert_eq!(state, ScanState::Readable);
        let (state, _) = ScanState::Writable.transition(&PageToken::Property("P31".into()));
        assert_eq!(state, ScanState::Outside);
    }

    #[test]
    fn readable_and_writable_lists_are_separated() {
        let html = page(&[
            "Q1",
            "Property:P1072",
            "Q100",
            "Property:P854",
            "Q101",
            "Property:P1073",
            "Q200",
            "Property:P31",
            "Q300",
        ]);
        let support = parse_entity_page(&html);
        assert_eq!(support.read_formats, vec!["Q100", "Q101"]);
        assert_eq!(support.write_formats, vec!["Q200"]);
    }

    #[test]
    fn repeated_formats_are_dropped() {
        let html = page(&["Property:P1072", "Q100", "Q101", "Q100"]);
        assert_eq!(parse_entity_page(&html).read_formats, vec!["Q101"]);
    }

    #[test]
    fn anchors_without_title_are_ignored() {
        let html = r#"<a href="/x">no title</a><A class="p" TITLE="Property:P1072">r</A>
            <a title="Q7" href="/wiki/Q7">seven</a>"#;
        assert_eq!(
            tokenize(html),
            vec![
                PageToken::Property("P1072".into()),
                PageToken::Entity("Q7".into())
            ]
        );
    }

    #[test]
    fn what_links_here_skips_target_and_duplicates() {
        let html = "
            <a href=\"/wiki/Q86920\" title=\"Text file\">self</a>
            <a href=\"/wiki/Q11272\" title=\"Notepad\">a</a>
            <a href=\"/wiki/Q698\" title=\"Vim\u{200e}\">b</a>
            <a href=\"/wiki/Q698\" title=\"Vim\">again</a>
            <a href=\"/w/index.php\" title=\"Help\">c</a>";
        let linked = parse_what_links_here(&html, "Q86920");
        let tags: Vec<&str> = linked.iter().map(|e| e.tag.as_str()).collect();
        assert_eq!(tags, vec!["Q11272", "Q698"]);
        assert_eq!(linked[1].name, "Vim");
    }
}
