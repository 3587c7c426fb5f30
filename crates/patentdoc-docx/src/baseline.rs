//! The baseline an update run compares against, stored inside the document.
//!
//! Serialised as JSON and split over custom document properties
//! `PatentdocBaseline_000`, `_001`, ... in `docProps/custom.xml`, since Word
//! caps `vt:lpwstr` property values at 255 characters. Properties that are
//! not ours are kept.

use std::collections::{BTreeMap, BTreeSet};

use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{WriteError, XmlError};
use crate::package::{CONTENT_TYPES_PART, DocxPackage, ROOT_RELS_PART};

pub const CUSTOM_PART: &str = "docProps/custom.xml";
pub const PROPERTY_PREFIX: &str = "PatentdocBaseline_";
pub const CHUNK_CHARS: usize = 255;

const CUSTOM_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.custom-properties+xml";
const CUSTOM_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/custom-properties";
const PROPERTY_FMTID: &str = "{D5CDD505-2E9C-101B-9397-08002B2CF9AE}";

/// Per section: the placeholders its template used and the source
/// fingerprint of every record rendered into it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionBaseline {
    pub fields: BTreeSet<String>,
    pub records: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baseline {
    pub version: u32,
    pub sections: BTreeMap<String, SectionBaseline>,
}

impl Default for Baseline {
    fn default() -> Self {
        Self {
            version: Self::VERSION,
            sections: BTreeMap::new(),
        }
    }
}

impl Baseline {
    pub const VERSION: u32 = 1;

    /// Read the baseline from a package. `None` if it has none, or if what
    /// it has cannot be decoded.
    pub fn load(package: &DocxPackage) -> Option<Self> {
        let xml = package.text_part(CUSTOM_PART).ok()?;
        let properties = match parse_properties(xml) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "unreadable custom properties");
                return None;
            }
        };

        let mut chunks: Vec<(usize, &str)> = Vec::new();
        for property in &properties {
            let Some(suffix) = property.name.strip_prefix(PROPERTY_PREFIX) else {
                continue;
            };
            let Ok(index) = suffix.parse::<usize>() else {
                warn!(name = %property.name, "baseline chunk with a non-numeric index");
                return None;
            };
            chunks.push((index, property.value.as_str()));
        }
        if chunks.is_empty() {
            return None;
        }
        chunks.sort_by_key(|(index, _)| *index);
        if chunks.iter().enumerate().any(|(i, (index, _))| i != *index) {
            warn!(chunks = chunks.len(), "baseline chunks are not numbered 0..n");
            return None;
        }
        let json: String = chunks.into_iter().map(|(_, value)| value).collect();

        match serde_json::from_str::<Baseline>(&json) {
            Ok(baseline) if baseline.version == Self::VERSION => Some(baseline),
            Ok(baseline) => {
                warn!(version = baseline.version, "unsupported baseline version");
                None
            }
            Err(e) => {
                warn!(error = %e, "corrupt baseline");
                None
            }
        }
    }

    /// Write the baseline into a package, replacing any earlier one.
    pub fn store(&self, package: &mut DocxPackage) -> Result<(), WriteError> {
        let json = serde_json::to_string(self)?;

        let existing = match package.text_part(CUSTOM_PART) {
            Ok(xml) => Some(parse_properties(xml)?),
            Err(XmlError::MissingPart(_)) => None,
            Err(e) => return Err(e.into()),
        };
        let kept: Vec<Property> = existing
            .unwrap_or_default()
            .into_iter()
            .filter(|p| !p.name.starts_with(PROPERTY_PREFIX))
            .collect();

        let mut pid = kept.iter().map(|p| p.pid).max().unwrap_or(1).max(1);
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/custom-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">"#,
        );
        for property in &kept {
            xml.push_str(&property.raw);
        }
        let chunks = chunk_chars(&json, CHUNK_CHARS);
        for (i, chunk) in chunks.iter().enumerate() {
            pid += 1;
            xml.push_str(&format!(
                r#"<property fmtid="{PROPERTY_FMTID}" pid="{pid}" name="{PROPERTY_PREFIX}{i:03}"><vt:lpwstr>{}</vt:lpwstr></property>"#,
                escape(chunk.as_str())
            ));
        }
        xml.push_str("</Properties>");

        let is_new = !package.has_part(CUSTOM_PART);
        package.set_part(CUSTOM_PART, xml.into_bytes());
        if is_new {
            register_custom_part(package)?;
        }
        debug!(chunks = chunks.len(), bytes = json.len(), "stored baseline");
        Ok(())
    }
}

/// One `<property>` of `docProps/custom.xml`.
#[derive(Debug, Clone)]
struct Property {
    name: String,
    pid: u32,
    value: String,
    raw: String,
}

fn parse_properties(xml: &str) -> Result<Vec<Property>, XmlError> {
    let mut reader = Reader::from_str(xml);
    let mut properties = Vec::new();
    let mut current: Option<(usize, String, u32)> = None;
    let mut value = String::new();

    loop {
        let before = reader.buffer_position() as usize;
        let event = reader.read_event().map_err(XmlError::parse)?;
        let after = reader.buffer_position() as usize;
        match event {
            Event::Start(e) if e.name().as_ref() == b"property" => {
                let mut name = String::new();
                let mut pid = 0;
                for attr in e.attributes().flatten() {
                    let attr_value = attr.unescape_value().map_err(XmlError::parse)?;
                    match attr.key.as_ref() {
                        b"name" => name = attr_value.into_owned(),
                        b"pid" => pid = attr_value.parse().unwrap_or(0),
                        _ => {}
                    }
                }
                current = Some((before, name, pid));
                value.clear();
            }
            Event::Text(t) if current.is_some() => {
                value.push_str(&t.unescape().map_err(XmlError::parse)?);
            }
            Event::End(e) if e.name().as_ref() == b"property" => {
                if let Some((start, name, pid)) = current.take() {
                    properties.push(Property {
                        name,
                        pid,
                        value: std::mem::take(&mut value),
                        raw: xml[start..after].to_string(),
                    });
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(properties)
}

fn chunk_chars(s: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    chars
        .chunks(size)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Declare a newly added custom properties part in the content types and
/// the package relationships.
fn register_custom_part(package: &mut DocxPackage) -> Result<(), WriteError> {
    let types = package.text_part(CONTENT_TYPES_PART)?;
    if !types.contains("/docProps/custom.xml") {
        let updated = insert_before_close(
            types,
            "</Types>",
            &format!(r#"<Override PartName="/docProps/custom.xml" ContentType="{CUSTOM_CONTENT_TYPE}"/>"#),
        )?;
        package.set_part(CONTENT_TYPES_PART, updated.into_bytes());
    }

    let rels = package.text_part(ROOT_RELS_PART)?;
    if !rels.contains("docProps/custom.xml") {
        let updated = insert_before_close(
            rels,
            "</Relationships>",
            &format!(r#"<Relationship Id="rIdPatentdoc" Type="{CUSTOM_REL_TYPE}" Target="docProps/custom.xml"/>"#),
        )?;
        package.set_part(ROOT_RELS_PART, updated.into_bytes());
    }
    Ok(())
}

fn insert_before_close(xml: &str, close: &str, fragment: &str) -> Result<String, XmlError> {
    let at = xml
        .rfind(close)
        .ok_or_else(|| XmlError::Parse(format!("no {close} found")))?;
    let mut out = String::with_capacity(xml.len() + fragment.len());
    out.push_str(&xml[..at]);
    out.push_str(fragment);
    out.push_str(&xml[at..]);
    Ok(out)
}
