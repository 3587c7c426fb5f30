//! Publication number normalisation and display forms.
//!
//! Spreadsheet cells carry publication numbers in whatever shape the analyst
//! pasted them ("US 10,123,456 B2", "us10123456b2", "See CN112233445A").
//! Everything downstream keys on the normalised form returned by
//! [`extract_publication_number`].
//!
//! # Numbering conventions
//!
//! - US grant: `US` + 7-8 digits + optional kind code (`US10123456B2`)
//! - US application: `US` + year + 7-digit serial (`US20140123456A1`)
//! - Other offices: two-letter country code + 7 or more digits + optional
//!   kind code (`CN112233445A`, `EP1234567B1`)

use std::sync::LazyLock;

use regex::Regex;

// ASCII digits only; the display helpers slice by byte offset.
static US_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(US[0-9]{7,11}(?:[A-Z][0-9]{1,2})?)").unwrap());

static GENERIC_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([A-Z]{2}[0-9]{7,}(?:[A-Z][0-9]{0,2})?)").unwrap());

static SHORT_FORM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^0-9]*)([0-9]+)([A-Z][0-9]{1,2})?$").unwrap());

static LEADING_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+").unwrap());

/// Extract a normalised publication number from a free-form cell value.
///
/// Commas and whitespace are removed before matching. US numbers are tried
/// first, then any two-letter office code. When nothing matches, the trimmed
/// input is returned unchanged so that non-patent identifiers survive.
pub fn extract_publication_number(cell: &str) -> String {
    let trimmed = cell.trim();
    let compact: String = trimmed
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    if let Some(m) = US_NUMBER.captures(&compact) {
        return m[1].to_ascii_uppercase();
    }
    if let Some(m) = GENERIC_NUMBER.captures(&compact) {
        return m[1].to_ascii_uppercase();
    }
    trimmed.to_string()
}

/// Whether a normalised number was issued by the USPTO.
pub fn is_us(number: &str) -> bool {
    number
        .get(..2)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("US"))
}

/// Format the leading digits of `s` with thousands separators.
///
/// "10123456B2" → "10,123,456". Input without leading digits is returned as is.
pub fn format_with_commas(s: &str) -> String {
    let Some(m) = LEADING_DIGITS.find(s) else {
        return s.to_string();
    };
    match m.as_str().parse::<u64>() {
        Ok(n) => group_thousands(n),
        Err(_) => s.to_string(),
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Long display form used in report prose.
///
/// US: "U.S. Patent No. 10,123,456" (kind code dropped). Other offices: the
/// number itself, no prefix.
pub fn display_number(number: &str) -> String {
    let number = number.trim();
    if number.is_empty() {
        return String::new();
    }
    if is_us(number) {
        let core = &number[2..];
        if LEADING_DIGITS.is_match(core) {
            return format!("U.S. Patent No. {}", format_with_commas(core));
        }
    }
    number.to_string()
}

/// Short citation form: the last three digits, e.g. "'456 Patent".
pub fn short_name(number: &str) -> String {
    let mut cleaned: String = number.chars().filter(|c| *c != ',' && *c != ' ').collect();
    if is_us(&cleaned) {
        cleaned.drain(..2);
    }

    let digits = match SHORT_FORM.captures(&cleaned) {
        Some(caps) => caps[2].to_string(),
        None => cleaned.chars().filter(char::is_ascii_digit).collect(),
    };
    let tail = if digits.len() >= 3 {
        &digits[digits.len() - 3..]
    } else {
        digits.as_str()
    };
    format!("'{tail} Patent")
}

/// Publication name as printed in reference tables.
///
/// - US application (11+ digits led by a year): "2014/0123456"
/// - US grant: "10,123,456"
/// - Other offices: unchanged
pub fn publication_name(number: &str) -> String {
    if !is_us(number) {
        return number.to_string();
    }
    let digits: String = number[2..].chars().filter(char::is_ascii_digit).collect();
    if digits.len() >= 11 {
        return format!("{}/{}", &digits[..4], &digits[4..11]);
    }
    match digits.trim_start_matches('0').parse::<u64>() {
        Ok(n) => group_thousands(n),
        Err(_) => digits,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_us_grant_with_kind_code() {
        assert_eq!(extract_publication_number("US10123456B2"), "US10123456B2");
        assert_eq!(extract_publication_number("us10123456b2"), "US10123456B2");
    }

    #[test]
    fn extracts_from_surrounding_text() {
        assert_eq!(
            extract_publication_number("Patent: US 10,123,456 B2 (granted)"),
            "US10123456B2"
        );
        assert_eq!(extract_publication_number("See CN112233445A"), "CN112233445A");
    }

    #[test]
    fn unmatched_input_is_trimmed_only() {
        assert_eq!(
            extract_publication_number("  Smith et al., Nature 2019 "),
            "Smith et al., Nature 2019"
        );
        assert_eq!(extract_publication_number(""), "");
    }

    #[test]
    fn display_number_variants() {
        assert_eq!(display_number("US10123456B2"), "U.S. Patent No. 10,123,456");
        assert_eq!(display_number("US7654321"), "U.S. Patent No. 7,654,321");
        assert_eq!(display_number("EP1234567B1"), "EP1234567B1");
        assert_eq!(display_number(""), "");
    }

    #[test]
    fn short_name_uses_last_three_digits() {
        assert_eq!(short_name("US10123456B2"), "'456 Patent");
        assert_eq!(short_name("CN112233445A"), "'445 Patent");
        assert_eq!(short_name("US12"), "'12 Patent");
    }

    #[test]
    fn non_ascii_digits_do_not_panic() {
        let number = extract_publication_number("X١٢٣٤");
        assert_eq!(number, "X١٢٣٤");
        assert_eq!(short_name(&number), "' Patent");
        assert_eq!(display_number("US١٢٣٤٥٦٧"), "US١٢٣٤٥٦٧");
        assert_eq!(publication_name("US١٢٣٤٥٦٧"), "");
        assert_eq!(format_with_commas("١٢٣٤"), "١٢٣٤");
    }

    #[test]
    fn publication_name_variants() {
        assert_eq!(publication_name("US20140123456A1"), "2014/0123456");
        assert_eq!(publication_name("US10123456B2"), "10,123,456");
        assert_eq!(publication_name("JP2019123456A"), "JP2019123456A");
    }

    #[test]
    fn commas() {
        assert_eq!(format_with_commas("1234567"), "1,234,567");
        assert_eq!(format_with_commas("123"), "123");
        assert_eq!(format_with_commas("B2"), "B2");
    }
}
