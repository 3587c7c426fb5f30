//! A generated report: static blocks plus tagged, rendered sections.
//!
//! On disk each rendered section is wrapped in a hidden `_pds_` bookmark and
//! each record inside it in a `_pdr_` bookmark. Reading a report back
//! recovers the same structure, which is what the update merger works on.
//! Bookmark ids are reassigned on every write.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use tracing::debug;

use crate::baseline::Baseline;
use crate::body::{BodyElement, BodyParts, split_body};
use crate::error::{MergeError, WriteError};
use crate::package::{DOCUMENT_PART, DocxPackage};
use crate::tag::{
    Marker, TagKind, bookmark_end, bookmark_start, max_bookmark_id, record_tag, scan_markers,
    section_tag, strip_markers, tag_kind,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedRecord {
    /// Known for freshly rendered records and for prior records named in
    /// the baseline.
    pub identifier: Option<String>,
    pub tag: String,
    pub elements: Vec<BodyElement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSection {
    pub name: String,
    pub tag: String,
    /// Content inside the section ahead of the first record.
    pub lead: Vec<BodyElement>,
    pub records: Vec<RenderedRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocBlock {
    Static(BodyElement),
    Section(RenderedSection),
}

#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    pub(crate) package: DocxPackage,
    pub(crate) head: String,
    pub(crate) tail: String,
    pub blocks: Vec<DocBlock>,
    pub baseline: Option<Baseline>,
}

impl GeneratedDocument {
    /// Recover a previously generated report from its package.
    pub fn from_package(package: DocxPackage) -> Result<Self, MergeError> {
        let parts = split_body(package.text_part(DOCUMENT_PART)?)?;
        let baseline = Baseline::load(&package);

        let mut ours: HashMap<u32, (TagKind, String)> = HashMap::new();
        for element in &parts.elements {
            for marker in scan_markers(element.xml()) {
                if let Marker::Start { id, name } = marker {
                    if let Some(kind) = tag_kind(&name) {
                        ours.insert(id, (kind, name));
                    }
                }
            }
        }
        if !ours.values().any(|(kind, _)| *kind == TagKind::Section) {
            return Err(MergeError::NoTags);
        }

        let mut parser = PriorParser::new(&ours, baseline.as_ref());
        for element in parts.elements {
            let markers: Vec<Marker> = scan_markers(element.xml())
                .into_iter()
                .filter(|m| ours.contains_key(&m.id()))
                .collect();
            if markers.is_empty() {
                parser.place(element);
                continue;
            }

            // Starts open before the element is placed; trailing ends close after.
            let split = markers
                .iter()
                .rposition(|m| matches!(m, Marker::Start { .. }))
                .map_or(0, |i| i + 1);
            for marker in &markers[..split] {
                parser.apply(marker)?;
            }
            if let Some(stripped) = strip_markers(element.xml(), |id| ours.contains_key(&id)) {
                if !stripped.trim().is_empty() {
                    parser.place(BodyElement::new(stripped));
                }
            }
            for marker in &markers[split..] {
                parser.apply(marker)?;
            }
        }
        let blocks = parser.finish()?;

        debug!(
            blocks = blocks.len(),
            baseline = baseline.is_some(),
            "parsed prior document"
        );
        Ok(Self {
            package,
            head: parts.head,
            tail: parts.tail,
            blocks,
            baseline,
        })
    }

    pub fn open(path: &Path, passphrase: Option<&str>) -> Result<Self, MergeError> {
        let package = DocxPackage::open(path, passphrase)?;
        Self::from_package(package)
    }

    pub fn sections(&self) -> impl Iterator<Item = &RenderedSection> {
        self.blocks.iter().filter_map(|b| match b {
            DocBlock::Section(s) => Some(s),
            DocBlock::Static(_) => None,
        })
    }

    pub fn section(&self, name: &str) -> Option<&RenderedSection> {
        self.sections().find(|s| s.name == name)
    }

    /// The main document part with fresh tag bookmarks.
    pub fn document_xml(&self) -> String {
        let mut next_id = self
            .elements()
            .into_iter()
            .filter_map(|e| max_bookmark_id(e.xml()))
            .max()
            .map_or(0, |max| max + 1);
        let mut take_id = || {
            let id = next_id;
            next_id += 1;
            id
        };

        let mut body = String::new();
        for block in &self.blocks {
            match block {
                DocBlock::Static(element) => body.push_str(element.xml()),
                DocBlock::Section(section) => {
                    let section_id = take_id();
                    body.push_str(&bookmark_start(section_id, &section.tag));
                    for element in &section.lead {
                        body.push_str(element.xml());
                    }
                    for record in &section.records {
                        let record_id = take_id();
                        body.push_str(&bookmark_start(record_id, &record.tag));
                        for element in &record.elements {
                            body.push_str(element.xml());
                        }
                        body.push_str(&bookmark_end(record_id));
                    }
                    body.push_str(&bookmark_end(section_id));
                }
            }
        }
        BodyParts::assemble(&self.head, &body, &self.tail)
    }

    pub fn to_package(&self) -> Result<DocxPackage, WriteError> {
        let mut package = self.package.clone();
        package.set_part(DOCUMENT_PART, self.document_xml().into_bytes());
        if let Some(baseline) = &self.baseline {
            baseline.store(&mut package)?;
        }
        Ok(package)
    }

    /// Write the report atomically to `path`.
    pub fn write(&self, path: &Path) -> Result<(), WriteError> {
        self.to_package()?.write_atomic(path)
    }

    fn elements(&self) -> Vec<&BodyElement> {
        let mut out = Vec::new();
        for block in &self.blocks {
            match block {
                DocBlock::Static(e) => out.push(e),
                DocBlock::Section(s) => {
                    out.extend(&s.lead);
                    for record in &s.records {
                        out.extend(&record.elements);
                    }
                }
            }
        }
        out
    }
}

struct OpenSection {
    id: u32,
    tag: String,
    lead: Vec<BodyElement>,
    records: Vec<RenderedRecord>,
}

struct OpenRecord {
    id: u32,
    tag: String,
    elements: Vec<BodyElement>,
}

/// Rebuilds blocks from a prior document's elements and tag boundaries.
struct PriorParser<'a> {
    ours: &'a HashMap<u32, (TagKind, String)>,
    section_names: HashMap<String, String>,
    record_ids: HashMap<String, String>,
    blocks: Vec<DocBlock>,
    /// Section and record tags met so far.
    seen: HashSet<String>,
    section: Option<OpenSection>,
    record: Option<OpenRecord>,
}

impl<'a> PriorParser<'a> {
    fn new(ours: &'a HashMap<u32, (TagKind, String)>, baseline: Option<&Baseline>) -> Self {
        let mut section_names = HashMap::new();
        let mut record_ids = HashMap::new();
        for (name, section) in baseline.iter().flat_map(|b| b.sections.iter()) {
            section_names.insert(section_tag(name), name.clone());
            for identifier in section.records.keys() {
                record_ids.insert(record_tag(name, identifier), identifier.clone());
            }
        }
        Self {
            ours,
            section_names,
            record_ids,
            blocks: Vec::new(),
            seen: HashSet::new(),
            section: None,
            record: None,
        }
    }

    fn apply(&mut self, marker: &Marker) -> Result<(), MergeError> {
        match marker {
            Marker::Start { id, name } => match self.ours.get(id).map(|(kind, _)| *kind) {
                Some(TagKind::Section) => {
                    if let Some(open) = &self.section {
                        return Err(MergeError::Nested {
                            outer: open.tag.clone(),
                            inner: name.clone(),
                        });
                    }
                    if !self.seen.insert(name.clone()) {
                        return Err(MergeError::DuplicateSection(name.clone()));
                    }
                    self.section = Some(OpenSection {
                        id: *id,
                        tag: name.clone(),
                        lead: Vec::new(),
                        records: Vec::new(),
                    });
                }
                Some(TagKind::Record) => {
                    if self.section.is_none() {
                        return Err(MergeError::RecordOutsideSection(name.clone()));
                    }
                    if let Some(open) = &self.record {
                        return Err(MergeError::Nested {
                            outer: open.tag.clone(),
                            inner: name.clone(),
                        });
                    }
                    if !self.seen.insert(name.clone()) {
                        return Err(MergeError::DuplicateRecord(name.clone()));
                    }
                    self.record = Some(OpenRecord {
                        id: *id,
                        tag: name.clone(),
                        elements: Vec::new(),
                    });
                }
                None => {}
            },
            Marker::End { id } => {
                if self.record.as_ref().is_some_and(|r| r.id == *id) {
                    if let (Some(record), Some(section)) = (self.record.take(), self.section.as_mut())
                    {
                        section.records.push(RenderedRecord {
                            identifier: self.record_ids.get(&record.tag).cloned(),
                            tag: record.tag,
                            elements: record.elements,
                        });
                    }
                } else if self.section.as_ref().is_some_and(|s| s.id == *id) {
                    if let Some(record) = &self.record {
                        return Err(MergeError::Unbalanced(record.tag.clone()));
                    }
                    if let Some(section) = self.section.take() {
                        let name = self
                            .section_names
                            .get(&section.tag)
                            .cloned()
                            .unwrap_or_else(|| section.tag.clone());
                        self.blocks.push(DocBlock::Section(RenderedSection {
                            name,
                            tag: section.tag,
                            lead: section.lead,
                            records: section.records,
                        }));
                    }
                } else if let Some((_, name)) = self.ours.get(id) {
                    return Err(MergeError::Unbalanced(name.clone()));
                }
            }
        }
        Ok(())
    }

    /// Content between records travels with the record before it.
    fn place(&mut self, element: BodyElement) {
        if let Some(record) = &mut self.record {
            record.elements.push(element);
        } else if let Some(section) = &mut self.section {
            match section.records.last_mut() {
                Some(last) => last.elements.push(element),
                None => section.lead.push(element),
            }
        } else {
            self.blocks.push(DocBlock::Static(element));
        }
    }

    fn finish(self) -> Result<Vec<DocBlock>, MergeError> {
        if let Some(record) = self.record {
            return Err(MergeError::Unclosed(record.tag));
        }
        if let Some(section) = self.section {
            return Err(MergeError::Unclosed(section.tag));
        }
        Ok(self.blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{SECT_PR, docx, para};

    fn tagged(sections: &[(&str, &[(&str, &str)])]) -> String {
        let mut body = para("Heading");
        let mut id = 10;
        for (section, records) in sections {
            let sid = id;
            id += 1;
            body.push_str(&bookmark_start(sid, &section_tag(section)));
            for (identifier, text) in *records {
                body.push_str(&bookmark_start(id, &record_tag(section, identifier)));
                body.push_str(&para(text));
                body.push_str(&bookmark_end(id));
                id += 1;
            }
            body.push_str(&bookmark_end(sid));
        }
        body.push_str(&para("Disclaimer"));
        body
    }

    #[test]
    fn recovers_sections_and_records() {
        let body = tagged(&[("reference", &[("US1", "one"), ("US2", "two")])]);
        let doc = GeneratedDocument::from_package(docx(&body)).unwrap();

        assert_eq!(doc.blocks.len(), 4);
        let section = doc.sections().next().unwrap();
        assert_eq!(section.tag, section_tag("reference"));
        assert_eq!(section.records.len(), 2);
        assert_eq!(section.records[1].tag, record_tag("reference", "US2"));
        assert_eq!(section.records[1].elements[0].text(), "two");
        assert!(matches!(&doc.blocks[3], DocBlock::Static(e) if e.xml().starts_with("<w:sectPr")));
    }

    #[test]
    fn write_read_cycle_is_stable() {
        let body = tagged(&[("reference", &[("US1", "one")])]);
        let doc = GeneratedDocument::from_package(docx(&body)).unwrap();
        let again = GeneratedDocument::from_package(doc.to_package().unwrap()).unwrap();
        assert_eq!(again.blocks, doc.blocks);
        assert!(again.document_xml().ends_with("</w:document>"));
        assert!(again.document_xml().contains(SECT_PR));
    }

    #[test]
    fn inserted_content_travels_with_preceding_record() {
        let mut body = bookmark_start(1, &section_tag("s"));
        body.push_str(&para("lead"));
        body.push_str(&bookmark_start(2, &record_tag("s", "A")));
        body.push_str(&para("a"));
        body.push_str(&bookmark_end(2));
        body.push_str(&para("note after a"));
        body.push_str(&bookmark_end(1));

        let doc = GeneratedDocument::from_package(docx(&body)).unwrap();
        let section = doc.sections().next().unwrap();
        assert_eq!(section.lead.len(), 1);
        assert_eq!(section.records[0].elements.len(), 2);
        assert_eq!(section.records[0].elements[1].text(), "note after a");
    }

    #[test]
    fn markers_moved_inside_paragraphs_are_recovered() {
        let body = format!(
            "{}<w:p>{}<w:r><w:t>a</w:t></w:r>{}{}</w:p>{}",
            bookmark_start(1, &section_tag("s")),
            bookmark_start(2, &record_tag("s", "A")),
            bookmark_end(2),
            bookmark_end(1),
            para("after"),
        );
        let doc = GeneratedDocument::from_package(docx(&body)).unwrap();
        let section = doc.sections().next().unwrap();
        assert_eq!(section.records.len(), 1);
        assert_eq!(
            section.records[0].elements[0].xml(),
            "<w:p><w:r><w:t>a</w:t></w:r></w:p>"
        );
        assert!(matches!(&doc.blocks[1], DocBlock::Static(e) if e.text() == "after"));
    }

    #[test]
    fn foreign_bookmarks_survive() {
        let body = format!(
            "{}{}<w:p>{}<w:r><w:t>a</w:t></w:r>{}</w:p>{}{}",
            bookmark_start(5, &section_tag("s")),
            bookmark_start(6, &record_tag("s", "A")),
            bookmark_start(0, "_GoBack"),
            bookmark_end(0),
            bookmark_end(6),
            bookmark_end(5),
        );
        let doc = GeneratedDocument::from_package(docx(&body)).unwrap();
        let xml = doc.document_xml();
        assert!(xml.contains(r#"w:name="_GoBack""#));
        assert!(xml.contains(&bookmark_start(1, &section_tag("s"))));
    }

    #[test]
    fn untagged_document_is_a_merge_error() {
        let err = GeneratedDocument::from_package(docx(&para("plain"))).unwrap_err();
        assert!(matches!(err, MergeError::NoTags));
    }

    #[test]
    fn broken_tag_structure() {
        let unclosed = format!("{}{}", bookmark_start(1, &section_tag("s")), para("x"));
        assert!(matches!(
            GeneratedDocument::from_package(docx(&unclosed)),
            Err(MergeError::Unclosed(_))
        ));

        let outside = format!(
            "{}{}{}{}",
            bookmark_start(1, &record_tag("s", "A")),
            bookmark_end(1),
            bookmark_start(2, &section_tag("s")),
            bookmark_end(2)
        );
        assert!(matches!(
            GeneratedDocument::from_package(docx(&outside)),
            Err(MergeError::RecordOutsideSection(_))
        ));

        let crossed = format!(
            "{}{}{}{}",
            bookmark_start(1, &section_tag("s")),
            bookmark_start(2, &record_tag("s", "A")),
            bookmark_end(1),
            bookmark_end(2)
        );
        assert!(matches!(
            GeneratedDocument::from_package(docx(&crossed)),
            Err(MergeError::Unbalanced(_))
        ));

        let twice = format!(
            "{}{}{}{}",
            bookmark_start(1, &section_tag("s")),
            bookmark_end(1),
            bookmark_start(2, &section_tag("s")),
            bookmark_end(2)
        );
        assert!(matches!(
            GeneratedDocument::from_package(docx(&twice)),
            Err(MergeError::DuplicateSection(_))
        ));
    }

    #[test]
    fn copied_record_block_is_rejected() {
        let mut body = bookmark_start(1, &section_tag("s"));
        for (id, text) in [(2, "original"), (3, "pasted copy")] {
            body.push_str(&bookmark_start(id, &record_tag("s", "A")));
            body.push_str(&para(text));
            body.push_str(&bookmark_end(id));
        }
        body.push_str(&bookmark_end(1));

        let err = GeneratedDocument::from_package(docx(&body)).unwrap_err();
        assert!(
            matches!(&err, MergeError::DuplicateRecord(tag) if *tag == record_tag("s", "A")),
            "{err}"
        );
    }
}
