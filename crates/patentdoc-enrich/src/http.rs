//! Blocking HTTP source for public patent pages.

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, info};

use crate::{EnrichmentError, PatentSource};

/// Fetches `{base_url}/patent/{identifier}/en`.
pub struct HttpPatentSource {
    client: Client,
    base_url: String,
}

impl HttpPatentSource {
    /// Create a source for the given host.
    ///
    /// `base_url` should be like `https://patents.google.com` (a trailing
    /// slash is dropped).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, EnrichmentError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("patentdoc/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| EnrichmentError::Client(e.to_string()))?;
        info!(base_url, timeout_secs = timeout.as_secs(), "patent page client ready");
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn page_url(&self, identifier: &str) -> String {
        format!("{}/patent/{}/en", self.base_url, identifier.trim())
    }
}

impl PatentSource for HttpPatentSource {
    fn fetch_page(&self, identifier: &str) -> Result<String, EnrichmentError> {
        let url = self.page_url(identifier);
        debug!(url = %url, "GET patent page");

        let transport = |e: reqwest::Error| EnrichmentError::Transport {
            identifier: identifier.to_string(),
            reason: e.to_string(),
        };

        let resp = self.client.get(&url).send().map_err(transport)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(EnrichmentError::Status {
                identifier: identifier.to_string(),
                status: status.as_u16(),
            });
        }
        resp.text().map_err(transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_url_template() {
        let source = HttpPatentSource::new("https://patents.example.com/", Duration::from_secs(1))
            .unwrap();
        assert_eq!(
            source.page_url("US1234567B2"),
            "https://patents.example.com/patent/US1234567B2/en"
        );
    }

    #[test]
    fn unreachable_host_is_transport_error() {
        let source = HttpPatentSource::new("http://127.0.0.1:9", Duration::from_millis(500))
            .unwrap();
        let err = source.fetch_page("US1234567").unwrap_err();
        assert!(matches!(err, EnrichmentError::Transport { .. }));
    }
}
