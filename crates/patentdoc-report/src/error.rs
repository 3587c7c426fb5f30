use patentdoc_core::LoadError;
use patentdoc_docx::{MergeError, RenderError, WriteError};
use patentdoc_enrich::EnrichmentError;
use thiserror::Error;

/// Why a run produced no document.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("template: {0}")]
    Render(#[from] RenderError),

    #[error("cannot update prior report: {0}")]
    Merge(#[from] MergeError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("enrichment client: {0}")]
    Enrichment(#[from] EnrichmentError),
}
