//! Header row contract: which spreadsheet column feeds which record field.

use std::collections::HashSet;

use patentdoc_core::LoadError;

/// Where a column's values go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Column {
    Identifier,
    Title,
    Abstract,
    Claims,
    ClaimNumbers,
    /// Any other column, by normalised header name.
    Extra(String),
}

const IDENTIFIER: &[&str] = &[
    "publication_number",
    "patent_number",
    "publication_no",
    "patent_no",
    "identifier",
    "id",
];
const TITLE: &[&str] = &["title", "patent_title"];
const ABSTRACT: &[&str] = &["abstract"];
const CLAIMS: &[&str] = &["claims", "claim_text"];
const CLAIM_NUMBERS: &[&str] = &["claim_numbers", "required_claims"];

/// Normalise a header cell: lower case, runs of non-alphanumerics become a
/// single `_`, no leading or trailing `_`.
///
/// "Publication No." → "publication_no", "Claim #s / Notes" → "claim_s_notes"
pub fn normalize_header(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_sep = false;
    for ch in raw.trim().chars() {
        if ch.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out
}

fn classify(name: &str) -> Column {
    if IDENTIFIER.contains(&name) {
        Column::Identifier
    } else if TITLE.contains(&name) {
        Column::Title
    } else if ABSTRACT.contains(&name) {
        Column::Abstract
    } else if CLAIMS.contains(&name) {
        Column::Claims
    } else if CLAIM_NUMBERS.contains(&name) {
        Column::ClaimNumbers
    } else {
        Column::Extra(name.to_string())
    }
}

/// Column positions resolved from the header row.
#[derive(Debug, Clone)]
pub struct HeaderMap {
    pub identifier: usize,
    pub title: usize,
    pub abstract_text: Option<usize>,
    pub claims: Option<usize>,
    pub claim_numbers: Option<usize>,
    pub extras: Vec<(usize, String)>,
}

impl HeaderMap {
    /// Resolve the header row. Blank header cells are ignored.
    pub fn from_row(cells: &[String]) -> Result<Self, LoadError> {
        let mut seen = HashSet::new();
        let mut identifier = None;
        let mut title = None;
        let mut abstract_text = None;
        let mut claims = None;
        let mut claim_numbers = None;
        let mut extras = Vec::new();

        for (idx, raw) in cells.iter().enumerate() {
            let name = normalize_header(raw);
            if name.is_empty() {
                continue;
            }
            let column = classify(&name);
            let key = match &column {
                Column::Extra(n) => n.clone(),
                other => format!("{other:?}"),
            };
            if !seen.insert(key) {
                return Err(LoadError::DuplicateColumn(raw.trim().to_string()));
            }
            match column {
                Column::Identifier => identifier = Some(idx),
                Column::Title => title = Some(idx),
                Column::Abstract => abstract_text = Some(idx),
                Column::Claims => claims = Some(idx),
                Column::ClaimNumbers => claim_numbers = Some(idx),
                Column::Extra(n) => extras.push((idx, n)),
            }
        }

        Ok(Self {
            identifier: identifier.ok_or(LoadError::MissingColumn("Publication Number"))?,
            title: title.ok_or(LoadError::MissingColumn("Title"))?,
            abstract_text,
            claims,
            claim_numbers,
            extras,
        })
    }
}
