//! Structural extraction from a patent page.
//!
//! Google Patents serves the abstract twice: as a `DC.description` meta tag
//! and inside `<section itemprop="abstract">`. Claims live in
//! `<section itemprop="claims">`, one `div.claim` per claim, each starting
//! with its number ("1. A method ...").

use std::sync::LazyLock;

use patentdoc_core::patent_number::format_with_commas;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

static ABSTRACT_META: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[name="DC.description"]"#).unwrap());

static ABSTRACT_SECTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"section[itemprop="abstract"]"#).unwrap());

static CLAIMS_SECTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"section[itemprop="claims"]"#).unwrap());

/// "12. A method" but not "2.5 mm thick".
static CLAIM_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)\s*\.(?:\s|$)").unwrap());

static US_REFERENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bUS(\d{7,})\b").unwrap());

/// One numbered claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub number: u32,
    pub text: String,
}

/// The abstract, if the page has one.
pub fn extract_abstract(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    let from_meta = document
        .select(&ABSTRACT_META)
        .filter_map(|meta| meta.value().attr("content"))
        .map(str::trim)
        .find(|content| !content.is_empty());
    if let Some(text) = from_meta {
        return Some(text.to_string());
    }

    document
        .select(&ABSTRACT_SECTION)
        .map(|section| collapse_whitespace(&section))
        .find(|text| !text.is_empty())
}

/// Every numbered claim on the page, in page order.
pub fn extract_claims(html: &str) -> Vec<Claim> {
    let document = Html::parse_document(html);
    let Some(section) = document.select(&CLAIMS_SECTION).next() else {
        return Vec::new();
    };

    let mut claims: Vec<Claim> = Vec::new();
    for line in section.text().flat_map(str::lines).map(str::trim) {
        if line.is_empty() {
            continue;
        }
        let line = format_us_references(line);
        if let Some(number) = CLAIM_START
            .captures(&line)
            .and_then(|caps| caps[1].parse::<u32>().ok())
        {
            claims.push(Claim { number, text: line });
        } else if let Some(current) = claims.last_mut() {
            current.text.push('\n');
            current.text.push_str(&line);
        }
    }
    claims
}

/// Claim text for the requested claim numbers (all claims when empty),
/// separated by blank lines. `None` when none of them are on the page.
pub fn select_claims(html: &str, numbers: &[u32]) -> Option<String> {
    let selected: Vec<String> = extract_claims(html)
        .into_iter()
        .filter(|claim| numbers.is_empty() || numbers.contains(&claim.number))
        .map(|claim| claim.text)
        .collect();
    if selected.is_empty() {
        None
    } else {
        Some(selected.join("\n\n"))
    }
}

/// "cited in US1234567" → "cited in 1,234,567".
pub fn format_us_references(text: &str) -> String {
    US_REFERENCE
        .replace_all(text, |caps: &regex::Captures| format_with_commas(&caps[1]))
        .into_owned()
}

fn collapse_whitespace(element: &ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html><head>
  <meta name="DC.title" content="Widget assembly">
  <meta name="DC.description" content="  A widget assembly with a frame.  ">
</head><body>
  <section itemprop="abstract"><div class="abstract">Section abstract text.</div></section>
  <section itemprop="claims">
    <h2>Claims (3)</h2>
    <div class="claims">
      <div class="claim" num="1"><div class="claim-text">1. A widget comprising:
        <div class="claim-text">a frame; and</div>
        <div class="claim-text">a handle.</div></div></div>
      <div class="claim" num="2"><div class="claim-text">2. The widget of claim 1, as in US7654321.</div></div>
      <div class="claim" num="3"><div class="claim-text">3 . The widget of claim 2, painted.</div></div>
    </div>
  </section>
</body></html>"#;

    #[test]
    fn abstract_prefers_meta() {
        assert_eq!(
            extract_abstract(PAGE).as_deref(),
            Some("A widget assembly with a frame.")
        );
    }

    #[test]
    fn abstract_falls_back_to_section() {
        let html = r#"<html><body><section itemprop="abstract">
            <div>Only   in the
            section.</div></section></body></html>"#;
        assert_eq!(
            extract_abstract(html).as_deref(),
            Some("Only in the section.")
        );
    }

    #[test]
    fn abstract_absent() {
        assert_eq!(extract_abstract("<html><body><p>nothing</p></body></html>"), None);
    }

    #[test]
    fn claims_split_by_number() {
        let claims = extract_claims(PAGE);
        let numbers: Vec<u32> = claims.iter().map(|c| c.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(claims[0].text, "1. A widget comprising:\na frame; and\na handle.");
        assert_eq!(claims[1].text, "2. The widget of claim 1, as in 7,654,321.");
    }

    #[test]
    fn decimal_continuation_stays_in_claim() {
        let html = r#"<html><body><section itemprop="claims">
            <div>1. A sheet of glass, wherein the sheet is
            2.5 mm thick.</div>
            <div>2.</div><div>The sheet of claim 1, tinted.</div>
        </section></body></html>"#;
        let claims = extract_claims(html);
        assert_eq!(claims.len(), 2);
        assert_eq!(
            claims[0].text,
            "1. A sheet of glass, wherein the sheet is\n2.5 mm thick."
        );
        assert_eq!(claims[1].number, 2);
        assert_eq!(claims[1].text, "2.\nThe sheet of claim 1, tinted.");
    }

    #[test]
    fn heading_before_first_claim_ignored() {
        let claims = extract_claims(PAGE);
        assert!(!claims.iter().any(|c| c.text.contains("Claims (3)")));
    }

    #[test]
    fn selection_by_number() {
        let text = select_claims(PAGE, &[1, 3]).unwrap();
        assert!(text.starts_with("1. A widget"));
        assert!(text.contains("\n\n3 . The widget"));
        assert!(!text.contains("2. The widget"));
    }

    #[test]
    fn selection_empty_means_all() {
        let text = select_claims(PAGE, &[]).unwrap();
        assert_eq!(text.matches("\n\n").count(), 2);
    }

    #[test]
    fn selection_of_absent_claims() {
        assert_eq!(select_claims(PAGE, &[9]), None);
        assert_eq!(select_claims("<html></html>", &[]), None);
    }

    #[test]
    fn us_references_get_commas() {
        assert_eq!(
            format_us_references("see US10123456 and US123"),
            "see 10,123,456 and US123"
        );
    }
}
