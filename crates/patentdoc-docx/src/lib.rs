//! DOCX reports: templates with repeatable sections, fresh binding, and
//! update merging against a previously generated report.
//!
//! ```text
//! Template ──bind──▶ GeneratedDocument ──write──▶ report.docx
//!                          ▲                          │
//!                          └───merge◀──from_package───┘
//! ```

pub mod baseline;
pub mod binder;
pub mod body;
pub mod document;
mod error;
#[cfg(test)]
mod fixture;
pub mod merger;
pub mod package;
pub mod placeholder;
pub mod tag;
pub mod template;

pub use baseline::Baseline;
pub use binder::{DocumentContext, bind};
pub use document::{DocBlock, GeneratedDocument, RenderedRecord, RenderedSection};
pub use error::{MergeError, RenderError, WriteError, XmlError};
pub use merger::{MergeReport, SectionMerge, merge};
pub use package::DocxPackage;
pub use template::{Section, Template, TemplateBlock};
