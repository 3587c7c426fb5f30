use std::fmt;

use patentdoc_core::Record;
use tracing::{debug, info, warn};

use crate::extract::{extract_abstract, select_claims};
use crate::{EnrichmentError, PatentSource};

/// An enrichable record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Abstract,
    Claims,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Abstract => "abstract",
            Field::Claims => "claims",
        })
    }
}

#[derive(Debug)]
pub struct EnrichmentFailure {
    pub identifier: String,
    pub field: Field,
    pub error: EnrichmentError,
}

/// What an enrichment pass did.
#[derive(Debug, Default)]
pub struct EnrichmentReport {
    /// Records that had at least one blank field.
    pub attempted: usize,
    pub abstracts_filled: usize,
    pub claims_filled: usize,
    pub failures: Vec<EnrichmentFailure>,
}

impl EnrichmentReport {
    pub fn filled(&self) -> usize {
        self.abstracts_filled + self.claims_filled
    }
}

/// Fills blank abstract and claim fields, one record at a time.
pub struct Enricher<'a> {
    source: &'a dyn PatentSource,
}

impl<'a> Enricher<'a> {
    pub fn new(source: &'a dyn PatentSource) -> Self {
        Self { source }
    }

    /// Enrich every record with a blank field.
    ///
    /// Each missing field costs one page request. Failures are logged and
    /// collected; the field stays blank. Populated fields are never touched.
    pub fn enrich(&self, records: &mut [Record]) -> EnrichmentReport {
        let mut report = EnrichmentReport::default();

        for record in records.iter_mut().filter(|r| r.needs_enrichment()) {
            report.attempted += 1;

            if record.abstract_text.is_none() {
                match self.fetch(record, Field::Abstract) {
                    Ok(text) => {
                        if record.fill_abstract(text) {
                            report.abstracts_filled += 1;
                        }
                    }
                    Err(error) => report.failures.push(failure(record, Field::Abstract, error)),
                }
            }

            if record.claims.is_none() {
                match self.fetch(record, Field::Claims) {
                    Ok(text) => {
                        if record.fill_claims(text) {
                            report.claims_filled += 1;
                        }
                    }
                    Err(error) => report.failures.push(failure(record, Field::Claims, error)),
                }
            }
        }

        info!(
            attempted = report.attempted,
            abstracts = report.abstracts_filled,
            claims = report.claims_filled,
            failures = report.failures.len(),
            "enrichment complete"
        );
        report
    }

    fn fetch(&self, record: &Record, field: Field) -> Result<String, EnrichmentError> {
        debug!(identifier = %record.identifier, %field, "fetching");
        let page = self.source.fetch_page(&record.identifier)?;
        let extracted = match field {
            Field::Abstract => extract_abstract(&page),
            Field::Claims => select_claims(&page, &record.claim_numbers),
        };
        extracted.ok_or_else(|| EnrichmentError::NotFound {
            identifier: record.identifier.clone(),
            field,
        })
    }
}

fn failure(record: &Record, field: Field, error: EnrichmentError) -> EnrichmentFailure {
    warn!(identifier = %record.identifier, %field, error = %error, "enrichment failed");
    EnrichmentFailure {
        identifier: record.identifier.clone(),
        field,
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NoSource;
    use std::cell::Cell;
    use std::collections::HashMap;

    const PAGE: &str = r#"<html><head>
        <meta name="DC.description" content="Fetched abstract.">
        </head><body><section itemprop="claims">
        <div class="claim-text">1. First claim.</div>
        <div class="claim-text">2. Second claim.</div>
        </section></body></html>"#;

    struct StubSource {
        pages: HashMap<&'static str, &'static str>,
        calls: Cell<usize>,
    }

    impl StubSource {
        fn new(pages: &[(&'static str, &'static str)]) -> Self {
            Self {
                pages: pages.iter().copied().collect(),
                calls: Cell::new(0),
            }
        }
    }

    impl PatentSource for StubSource {
        fn fetch_page(&self, identifier: &str) -> Result<String, EnrichmentError> {
            self.calls.set(self.calls.get() + 1);
            self.pages
                .get(identifier)
                .map(|page| page.to_string())
                .ok_or_else(|| EnrichmentError::Status {
                    identifier: identifier.to_string(),
                    status: 404,
                })
        }
    }

    #[test]
    fn fills_only_blank_fields() {
        let source = StubSource::new(&[("US1234567", PAGE)]);
        let mut records = vec![Record::new("US1234567", "Widget").with_abstract("From sheet.")];

        let report = Enricher::new(&source).enrich(&mut records);

        assert_eq!(records[0].abstract_text.as_deref(), Some("From sheet."));
        assert_eq!(
            records[0].claims.as_deref(),
            Some("1. First claim.\n\n2. Second claim.")
        );
        assert_eq!(report.claims_filled, 1);
        assert_eq!(report.abstracts_filled, 0);
        assert_eq!(source.calls.get(), 1);
    }

    #[test]
    fn one_request_per_missing_field() {
        let source = StubSource::new(&[("US1234567", PAGE)]);
        let mut records = vec![
            Record::new("US1234567", "Widget"),
            Record::new("US2345678", "Gadget")
                .with_abstract("a")
                .with_claims("c"),
        ];

        let report = Enricher::new(&source).enrich(&mut records);

        assert_eq!(source.calls.get(), 2);
        assert_eq!(report.attempted, 1);
        assert_eq!(report.filled(), 2);
    }

    #[test]
    fn claim_numbers_select_claims() {
        let source = StubSource::new(&[("US1234567", PAGE)]);
        let mut records = vec![
            Record::new("US1234567", "Widget")
                .with_abstract("a")
                .with_claim_numbers(vec![2]),
        ];
        Enricher::new(&source).enrich(&mut records);
        assert_eq!(records[0].claims.as_deref(), Some("2. Second claim."));
    }

    #[test]
    fn failures_are_soft_and_leave_fields_blank() {
        let source = StubSource::new(&[]);
        let mut records = vec![Record::new("US9999999", "Unknown")];
        let fingerprint = records[0].source_fingerprint().to_string();

        let report = Enricher::new(&source).enrich(&mut records);

        assert_eq!(records[0].abstract_text, None);
        assert_eq!(records[0].claims, None);
        assert_eq!(report.failures.len(), 2);
        assert!(matches!(
            report.failures[0].error,
            EnrichmentError::Status { status: 404, .. }
        ));
        assert_eq!(records[0].source_fingerprint(), fingerprint);
    }

    #[test]
    fn page_without_field_is_not_found() {
        let source = StubSource::new(&[("US1234567", "<html><body></body></html>")]);
        let mut records = vec![Record::new("US1234567", "Widget").with_claims("c")];
        let report = Enricher::new(&source).enrich(&mut records);
        assert!(matches!(
            report.failures[0].error,
            EnrichmentError::NotFound {
                field: Field::Abstract,
                ..
            }
        ));
    }

    #[test]
    fn no_source_reports_disabled() {
        let mut records = vec![Record::new("US1234567", "Widget")];
        let report = Enricher::new(&NoSource).enrich(&mut records);
        assert_eq!(report.failures.len(), 2);
        assert!(matches!(report.failures[0].error, EnrichmentError::Disabled(_)));
    }
}
