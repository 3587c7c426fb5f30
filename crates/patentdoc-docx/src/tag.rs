//! Hidden bookmarks that mark rendered sections and records.
//!
//! Word hides bookmarks whose names start with `_`. A tag name is a fixed
//! prefix plus 16 hex digits of a SHA-256, which keeps it within Word's
//! 40-character bookmark name limit and stable across runs.

use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

pub const RECORD_PREFIX: &str = "_pdr_";
pub const SECTION_PREFIX: &str = "_pds_";

static BOOKMARK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<w:bookmark(Start|End)\b[^>]*?/>").unwrap());

static ID_ATTR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"\bw:id="(\d+)""#).unwrap());

static NAME_ATTR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"\bw:name="([^"]*)""#).unwrap());

fn digest16(input: &str) -> String {
    let hash = Sha256::digest(input.as_bytes());
    hash.iter().take(8).map(|b| format!("{b:02x}")).collect()
}

pub fn section_tag(section: &str) -> String {
    format!("{SECTION_PREFIX}{}", digest16(section))
}

pub fn record_tag(section: &str, identifier: &str) -> String {
    format!("{RECORD_PREFIX}{}", digest16(&format!("{section}\u{1f}{identifier}")))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Section,
    Record,
}

/// Classify a bookmark name as one of ours.
pub fn tag_kind(name: &str) -> Option<TagKind> {
    if name.starts_with(SECTION_PREFIX) {
        Some(TagKind::Section)
    } else if name.starts_with(RECORD_PREFIX) {
        Some(TagKind::Record)
    } else {
        None
    }
}

pub fn bookmark_start(id: u32, name: &str) -> String {
    format!(r#"<w:bookmarkStart w:id="{id}" w:name="{name}"/>"#)
}

pub fn bookmark_end(id: u32) -> String {
    format!(r#"<w:bookmarkEnd w:id="{id}"/>"#)
}

/// A bookmark boundary found in some XML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    Start { id: u32, name: String },
    End { id: u32 },
}

impl Marker {
    pub fn id(&self) -> u32 {
        match self {
            Marker::Start { id, .. } | Marker::End { id } => *id,
        }
    }
}

/// Every bookmark boundary in document order.
pub fn scan_markers(xml: &str) -> Vec<Marker> {
    BOOKMARK
        .captures_iter(xml)
        .filter_map(|caps| {
            let tag = caps.get(0)?.as_str();
            let id = ID_ATTR.captures(tag)?[1].parse().ok()?;
            if &caps[1] == "Start" {
                let name = NAME_ATTR
                    .captures(tag)
                    .map(|n| n[1].to_string())
                    .unwrap_or_default();
                Some(Marker::Start { id, name })
            } else {
                Some(Marker::End { id })
            }
        })
        .collect()
}

/// Largest bookmark id used in `xml`.
pub fn max_bookmark_id(xml: &str) -> Option<u32> {
    scan_markers(xml).iter().map(Marker::id).max()
}

/// Remove the bookmark boundaries whose ids satisfy `is_ours`.
///
/// Returns `None` when nothing was removed.
pub fn strip_markers(xml: &str, is_ours: impl Fn(u32) -> bool) -> Option<String> {
    let mut out = String::with_capacity(xml.len());
    let mut last = 0;
    let mut removed = false;
    for m in BOOKMARK.find_iter(xml) {
        let id = ID_ATTR
            .captures(m.as_str())
            .and_then(|caps| caps[1].parse::<u32>().ok());
        if id.is_some_and(&is_ours) {
            out.push_str(&xml[last..m.start()]);
            last = m.end();
            removed = true;
        }
    }
    if !removed {
        return None;
    }
    out.push_str(&xml[last..]);
    Some(out)
}
