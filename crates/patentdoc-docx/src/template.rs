//! Templates: static blocks and repeatable sections.
//!
//! A section is the run of body elements between two marker paragraphs whose
//! entire text is `{{#name}}` and `{{/name}}`. The markers themselves are not
//! part of the output.

use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use crate::body::{BodyElement, split_body};
use crate::error::RenderError;
use crate::package::{DOCUMENT_PART, DocxPackage};
use crate::placeholder::placeholder_names;

static MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\{\{\s*([#/])\s*([A-Za-z][A-Za-z0-9_.]*)\s*\}\}$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub elements: Vec<BodyElement>,
    /// Every placeholder name used inside the section.
    pub placeholders: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateBlock {
    Static(BodyElement),
    Repeat(Section),
}

#[derive(Debug, Clone)]
pub struct Template {
    pub(crate) package: DocxPackage,
    pub(crate) head: String,
    pub(crate) tail: String,
    blocks: Vec<TemplateBlock>,
}

#[derive(Debug, PartialEq, Eq)]
enum Marker {
    Open(String),
    Close(String),
}

fn marker(element: &BodyElement) -> Option<Marker> {
    if !element.is_paragraph() {
        return None;
    }
    let text = element.text();
    let caps = MARKER.captures(text.trim())?;
    let name = caps[2].to_string();
    Some(if &caps[1] == "#" {
        Marker::Open(name)
    } else {
        Marker::Close(name)
    })
}

impl Template {
    /// Parse the template's main document part.
    pub fn from_package(package: DocxPackage) -> Result<Self, RenderError> {
        let xml = package.text_part(DOCUMENT_PART)?;
        let parts = split_body(xml)?;

        let mut blocks = Vec::new();
        let mut names = HashSet::new();
        let mut open: Option<Section> = None;

        for element in parts.elements {
            match marker(&element) {
                Some(Marker::Open(name)) => {
                    if let Some(outer) = &open {
                        return Err(RenderError::NestedSection {
                            outer: outer.name.clone(),
                            inner: name,
                        });
                    }
                    if !names.insert(name.clone()) {
                        return Err(RenderError::DuplicateSection(name));
                    }
                    open = Some(Section {
                        name,
                        elements: Vec::new(),
                        placeholders: BTreeSet::new(),
                    });
                }
                Some(Marker::Close(name)) => {
                    let Some(section) = open.take() else {
                        return Err(RenderError::UnexpectedClose(name));
                    };
                    if name != section.name {
                        return Err(RenderError::MismatchedClose {
                            open: section.name,
                            close: name,
                        });
                    }
                    debug!(
                        section = %section.name,
                        elements = section.elements.len(),
                        placeholders = section.placeholders.len(),
                        "parsed section"
                    );
                    blocks.push(TemplateBlock::Repeat(section));
                }
                None => match open.as_mut() {
                    Some(section) => {
                        section.placeholders.extend(placeholder_names(&element.text()));
                        section.elements.push(element);
                    }
                    None => blocks.push(TemplateBlock::Static(element)),
                },
            }
        }

        if let Some(section) = open {
            return Err(RenderError::UnclosedSection(section.name));
        }
        if names.is_empty() {
            return Err(RenderError::NoSection);
        }

        info!(
            sections = names.len(),
            blocks = blocks.len(),
            "template loaded"
        );
        Ok(Self {
            head: parts.head,
            tail: parts.tail,
            package,
            blocks,
        })
    }

    pub fn blocks(&self) -> &[TemplateBlock] {
        &self.blocks
    }

    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.blocks.iter().filter_map(|b| match b {
            TemplateBlock::Repeat(s) => Some(s),
            TemplateBlock::Static(_) => None,
        })
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections().find(|s| s.name == name)
    }
}
