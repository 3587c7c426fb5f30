//! Splitting `word/document.xml` into its top-level body elements.
//!
//! Elements are kept as the exact source text, so anything this crate does
//! not touch is written back byte for byte.

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::XmlError;

/// One child of `<w:body>`: a paragraph, table, bookmark, `w:sectPr`, ...
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyElement {
    xml: String,
}

impl BodyElement {
    pub fn new(xml: impl Into<String>) -> Self {
        Self { xml: xml.into() }
    }

    pub fn xml(&self) -> &str {
        &self.xml
    }

    pub fn is_paragraph(&self) -> bool {
        self.xml.starts_with("<w:p>") || self.xml.starts_with("<w:p ")
    }

    /// Concatenated `w:t` text. Paragraphs are separated by `\n`.
    pub fn text(&self) -> String {
        let mut reader = Reader::from_str(&self.xml);
        let mut out = String::new();
        let mut in_text = false;
        let mut paragraphs = 0usize;
        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"w:t" => in_text = true,
                    b"w:p" => {
                        if paragraphs > 0 {
                            out.push('\n');
                        }
                        paragraphs += 1;
                    }
                    _ => {}
                },
                Ok(Event::End(e)) if e.name().as_ref() == b"w:t" => in_text = false,
                Ok(Event::Text(e)) if in_text => match e.unescape() {
                    Ok(text) => out.push_str(&text),
                    Err(_) => break,
                },
                Ok(Event::Eof) | Err(_) => break,
                _ => {}
            }
        }
        out
    }
}

/// `word/document.xml` cut into what precedes the body elements, the
/// elements themselves, and what follows them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyParts {
    /// Everything up to and including `<w:body>`.
    pub head: String,
    pub elements: Vec<BodyElement>,
    /// `</w:body>` and everything after it.
    pub tail: String,
}

impl BodyParts {
    pub fn assemble(head: &str, body: &str, tail: &str) -> String {
        let mut xml = String::with_capacity(head.len() + body.len() + tail.len());
        xml.push_str(head);
        xml.push_str(body);
        xml.push_str(tail);
        xml
    }
}

/// Split a document into head, top-level body elements and tail.
///
/// Whitespace between body elements is dropped.
pub fn split_body(xml: &str) -> Result<BodyParts, XmlError> {
    let mut reader = Reader::from_str(xml);
    let mut depth = 0usize;
    let mut body_depth: Option<usize> = None;
    let mut head_end = 0usize;
    let mut element_start = 0usize;
    let mut elements = Vec::new();

    loop {
        let before = reader.buffer_position() as usize;
        let event = reader.read_event().map_err(XmlError::parse)?;
        let after = reader.buffer_position() as usize;

        match event {
            Event::Start(e) => {
                depth += 1;
                match body_depth {
                    None if e.name().as_ref() == b"w:body" => {
                        body_depth = Some(depth);
                        head_end = after;
                    }
                    Some(bd) if depth == bd + 1 => element_start = before,
                    _ => {}
                }
            }
            Event::End(e) => {
                match body_depth {
                    Some(bd) if depth == bd && e.name().as_ref() == b"w:body" => {
                        return Ok(BodyParts {
                            head: xml[..head_end].to_string(),
                            elements,
                            tail: xml[before..].to_string(),
                        });
                    }
                    Some(bd) if depth == bd + 1 => {
                        elements.push(BodyElement::new(&xml[element_start..after]));
                    }
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Event::Empty(_) => {
                if body_depth.is_some_and(|bd| depth == bd) {
                    elements.push(BodyElement::new(&xml[before..after]));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Err(XmlError::NoBody)
}
