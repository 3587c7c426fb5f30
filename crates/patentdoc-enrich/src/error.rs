use thiserror::Error;

use crate::Field;

/// A soft, per-record enrichment failure. Never aborts a run.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("{identifier}: request failed: {reason}")]
    Transport { identifier: String, reason: String },

    #[error("{identifier}: server returned HTTP {status}")]
    Status { identifier: String, status: u16 },

    #[error("{identifier}: no {field} found on the patent page")]
    NotFound { identifier: String, field: Field },

    #[error("{0}: enrichment is disabled")]
    Disabled(String),

    #[error("could not build HTTP client: {0}")]
    Client(String),
}
