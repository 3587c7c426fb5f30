use std::fmt;
use std::path::PathBuf;

use patentdoc_core::LoadError;
use thiserror::Error;

/// Malformed or unexpected XML inside a package part.
#[derive(Debug, Error)]
pub enum XmlError {
    #[error("XML parse error: {0}")]
    Parse(String),

    #[error("XML write error: {0}")]
    Write(String),

    #[error("package part {0} is missing")]
    MissingPart(String),

    #[error("package part {0} is not UTF-8")]
    NotUtf8(String),

    #[error("document has no <w:body>")]
    NoBody,
}

impl XmlError {
    pub(crate) fn parse(e: impl fmt::Display) -> Self {
        XmlError::Parse(e.to_string())
    }

    pub(crate) fn write(e: impl fmt::Display) -> Self {
        XmlError::Write(e.to_string())
    }
}

/// The template cannot be rendered. Fatal for a run.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template XML: {0}")]
    Xml(#[from] XmlError),

    #[error("section '{0}' is opened but never closed")]
    UnclosedSection(String),

    #[error("section '{0}' is closed but was never opened")]
    UnexpectedClose(String),

    #[error("section '{open}' is closed by '{{{{/{close}}}}}'")]
    MismatchedClose { open: String, close: String },

    #[error("section '{inner}' is nested inside '{outer}'")]
    NestedSection { outer: String, inner: String },

    #[error("section '{0}' is defined more than once")]
    DuplicateSection(String),

    #[error("template has no repeatable section")]
    NoSection,
}

/// The prior document's tags cannot be recovered. The pipeline may fall back
/// to fresh generation.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("prior document XML: {0}")]
    Xml(#[from] XmlError),

    #[error("prior document has no section tags")]
    NoTags,

    #[error("tag {0} is not closed")]
    Unclosed(String),

    #[error("tag {inner} starts inside open tag {outer}")]
    Nested { outer: String, inner: String },

    #[error("tag {0} is closed out of order")]
    Unbalanced(String),

    #[error("record tag {0} is outside any section")]
    RecordOutsideSection(String),

    #[error("section tag {0} appears more than once")]
    DuplicateSection(String),

    #[error("record tag {0} appears more than once")]
    DuplicateRecord(String),

    #[error("template section '{0}' is not in the prior document")]
    MissingSection(String),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Load(#[from] LoadError),
}

/// The output document cannot be produced.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to package document: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Xml(#[from] XmlError),

    #[error("failed to encode baseline: {0}")]
    Baseline(#[from] serde_json::Error),
}
