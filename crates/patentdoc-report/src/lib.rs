//! The report pipeline.
//!
//! A run loads records from the results spreadsheet, fills blank abstracts
//! and claims from public patent pages, renders them through the template's
//! repeatable sections and writes a `.docx`. In update mode the records are
//! merged into a previously generated report instead, keeping whatever the
//! analyst edited there.

mod config;
pub mod context;
mod error;
mod pipeline;

pub use config::{EnrichmentConfig, RunConfig};
pub use error::ReportError;
pub use patentdoc_docx::DocumentContext;
pub use pipeline::{RunMode, RunSummary, run, run_with_source, today};
