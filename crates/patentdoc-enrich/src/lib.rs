//! Enrichment: fill blank abstract and claim fields from public patent pages.
//!
//! The network is behind the [`PatentSource`] trait. [`HttpPatentSource`]
//! (feature `http`) talks to Google Patents; tests and offline runs plug in
//! their own source.

mod enricher;
mod error;
pub mod extract;

#[cfg(feature = "http")]
pub mod http;

use std::time::Duration;

pub use enricher::{EnrichmentFailure, EnrichmentReport, Enricher, Field};
pub use error::EnrichmentError;

#[cfg(feature = "http")]
pub use http::HttpPatentSource;

/// Public patent page host.
pub const DEFAULT_BASE_URL: &str = "https://patents.google.com";

/// Per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Something that can return the HTML page for a publication number.
pub trait PatentSource {
    fn fetch_page(&self, identifier: &str) -> Result<String, EnrichmentError>;
}

/// A source that never has anything. Used when enrichment is switched off.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSource;

impl PatentSource for NoSource {
    fn fetch_page(&self, identifier: &str) -> Result<String, EnrichmentError> {
        Err(EnrichmentError::Disabled(identifier.to_string()))
    }
}
