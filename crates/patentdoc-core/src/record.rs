//! The per-row unit of report data.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::claims::format_claim_ranges;
use crate::patent_number::{display_number, publication_name, short_name};

/// One reportable item, built from one spreadsheet row.
///
/// Builder methods (`with_*`) describe spreadsheet-sourced data and refresh
/// the source fingerprint. Enrichment goes through [`fill_abstract`] and
/// [`fill_claims`], which only write empty fields and leave the fingerprint
/// alone, so a later update run compares spreadsheet data only.
///
/// [`fill_abstract`]: Record::fill_abstract
/// [`fill_claims`]: Record::fill_claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub identifier: String,
    pub title: String,
    pub abstract_text: Option<String>,
    pub claims: Option<String>,
    /// Claims of interest; empty means all claims.
    pub claim_numbers: Vec<u32>,
    /// Every other column, keyed by normalised header name.
    pub fields: BTreeMap<String, String>,
    /// 1-based spreadsheet row.
    pub row: usize,
    source_fingerprint: String,
}

#[derive(Serialize)]
struct SourceView<'a> {
    identifier: &'a str,
    title: &'a str,
    abstract_text: Option<&'a str>,
    claims: Option<&'a str>,
    claim_numbers: &'a [u32],
    fields: &'a BTreeMap<String, String>,
}

impl Record {
    pub fn new(identifier: impl Into<String>, title: impl Into<String>) -> Self {
        let mut record = Self {
            identifier: identifier.into(),
            title: title.into(),
            abstract_text: None,
            claims: None,
            claim_numbers: Vec::new(),
            fields: BTreeMap::new(),
            row: 0,
            source_fingerprint: String::new(),
        };
        record.refresh_fingerprint();
        record
    }

    pub fn with_abstract(mut self, text: impl Into<String>) -> Self {
        self.abstract_text = Some(text.into());
        self.refresh_fingerprint();
        self
    }

    pub fn with_claims(mut self, text: impl Into<String>) -> Self {
        self.claims = Some(text.into());
        self.refresh_fingerprint();
        self
    }

    pub fn with_claim_numbers(mut self, numbers: Vec<u32>) -> Self {
        self.claim_numbers = numbers;
        self.refresh_fingerprint();
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self.refresh_fingerprint();
        self
    }

    pub fn with_row(mut self, row: usize) -> Self {
        self.row = row;
        self
    }

    /// SHA-256 over the spreadsheet-sourced values, as lowercase hex.
    pub fn source_fingerprint(&self) -> &str {
        &self.source_fingerprint
    }

    fn refresh_fingerprint(&mut self) {
        let view = SourceView {
            identifier: &self.identifier,
            title: &self.title,
            abstract_text: self.abstract_text.as_deref(),
            claims: self.claims.as_deref(),
            claim_numbers: &self.claim_numbers,
            fields: &self.fields,
        };
        // Serialising borrowed strings and a BTreeMap cannot fail.
        let canonical = serde_json::to_vec(&view).unwrap_or_default();
        self.source_fingerprint = format!("{:x}", Sha256::digest(&canonical));
    }

    /// Set the abstract if it is still empty. Returns whether it was written.
    pub fn fill_abstract(&mut self, text: String) -> bool {
        if self.abstract_text.is_some() {
            return false;
        }
        self.abstract_text = Some(text);
        true
    }

    /// Set the claim text if it is still empty. Returns whether it was written.
    pub fn fill_claims(&mut self, text: String) -> bool {
        if self.claims.is_some() {
            return false;
        }
        self.claims = Some(text);
        true
    }

    pub fn needs_enrichment(&self) -> bool {
        self.abstract_text.is_none() || self.claims.is_none()
    }

    /// Resolve a placeholder name against this record.
    ///
    /// Built-in names come first, then spreadsheet columns. `None` means the
    /// record has no such field at all; a known but empty abstract or claim
    /// resolves to `missing`.
    pub fn value(&self, name: &str, missing: &str) -> Option<String> {
        let value = match name {
            "identifier" => self.identifier.clone(),
            "title" => self.title.clone(),
            "abstract" => self
                .abstract_text
                .clone()
                .unwrap_or_else(|| missing.to_string()),
            "claims" => self.claims.clone().unwrap_or_else(|| missing.to_string()),
            "claim_numbers" => format_claim_ranges(&self.claim_numbers),
            "display_number" => display_number(&self.identifier),
            "short_name" => short_name(&self.identifier),
            "publication_name" => publication_name(&self.identifier),
            other => return self.fields.get(other).cloned(),
        };
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_tracks_source_fields() {
        let a = Record::new("US1234567", "Widget");
        let b = Record::new("US1234567", "Widget");
        assert_eq!(a.source_fingerprint(), b.source_fingerprint());
        assert_eq!(a.source_fingerprint().len(), 64);

        let c = b.clone().with_field("assignee", "Acme");
        assert_ne!(a.source_fingerprint(), c.source_fingerprint());
    }

    #[test]
    fn enrichment_leaves_fingerprint_alone() {
        let mut record = Record::new("US1234567", "Widget");
        let before = record.source_fingerprint().to_string();
        assert!(record.fill_abstract("fetched text".into()));
        assert_eq!(record.source_fingerprint(), before);
        assert_eq!(record.abstract_text.as_deref(), Some("fetched text"));
    }

    #[test]
    fn fill_never_overwrites() {
        let mut record = Record::new("US2", "Gadget").with_abstract("A");
        assert!(!record.fill_abstract("other".into()));
        assert_eq!(record.abstract_text.as_deref(), Some("A"));
    }

    #[test]
    fn value_resolution() {
        let record = Record::new("US10123456B2", "Widget")
            .with_claim_numbers(vec![1, 2, 3, 7])
            .with_field("assignee", "Acme Corp");
        assert_eq!(record.value("title", "").as_deref(), Some("Widget"));
        assert_eq!(record.value("abstract", "[n/a]").as_deref(), Some("[n/a]"));
        assert_eq!(record.value("claim_numbers", "").as_deref(), Some("1-3 and 7"));
        assert_eq!(
            record.value("display_number", "").as_deref(),
            Some("U.S. Patent No. 10,123,456")
        );
        assert_eq!(record.value("assignee", "").as_deref(), Some("Acme Corp"));
        assert_eq!(record.value("nope", ""), None);
    }
}
