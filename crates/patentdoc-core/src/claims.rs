//! Claim number lists: parsing analyst input and formatting ranges for prose.

use std::collections::BTreeSet;

use tracing::warn;

/// Highest claim number accepted in a selection. Larger values are typos.
pub const MAX_CLAIM_NUMBER: u32 = 1000;

/// Parse a claim selection such as `"1-5, 10, 15-17"`.
///
/// Returns sorted, de-duplicated claim numbers. `"All"` (any case) and blank
/// input return an empty list, which callers treat as "every claim". Parts
/// that do not parse, or name claims above [`MAX_CLAIM_NUMBER`], are skipped.
pub fn parse_claim_numbers(input: &str) -> Vec<u32> {
    let input = input.trim();
    if input.is_empty() || input.eq_ignore_ascii_case("all") {
        return Vec::new();
    }

    let mut numbers = BTreeSet::new();
    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if let Some((start, end)) = part.split_once('-') {
            let (Ok(start), Ok(end)) = (start.trim().parse::<u32>(), end.trim().parse::<u32>())
            else {
                continue;
            };
            if end > MAX_CLAIM_NUMBER {
                warn!(part, max = MAX_CLAIM_NUMBER, "claim range out of bounds; skipped");
                continue;
            }
            numbers.extend(start..=end);
        } else {
            let digits: String = part
                .chars()
                .skip_while(|c| !c.is_ascii_digit())
                .take_while(char::is_ascii_digit)
                .collect();
            if digits.is_empty() {
                continue;
            }
            match digits.parse::<u32>() {
                Ok(n) if n <= MAX_CLAIM_NUMBER => {
                    numbers.insert(n);
                }
                _ => warn!(part, max = MAX_CLAIM_NUMBER, "claim number out of bounds; skipped"),
            }
        }
    }
    numbers.into_iter().collect()
}

/// Format claim numbers as prose ranges.
///
/// `[1, 2, 3, 5, 6, 10]` → `"1-3, 5, 6, and 10"`. Runs of three or more
/// collapse to `a-b`; runs of two are listed individually.
pub fn format_claim_ranges(claims: &[u32]) -> String {
    let sorted: BTreeSet<u32> = claims.iter().copied().collect();
    let nums: Vec<u32> = sorted.into_iter().collect();
    let Some(&first) = nums.first() else {
        return String::new();
    };

    let mut parts: Vec<String> = Vec::new();
    let push_run = |parts: &mut Vec<String>, start: u32, end: u32| {
        if start == end {
            parts.push(start.to_string());
        } else if end == start + 1 {
            parts.push(start.to_string());
            parts.push(end.to_string());
        } else {
            parts.push(format!("{start}-{end}"));
        }
    };

    let (mut start, mut end) = (first, first);
    for &n in &nums[1..] {
        if n == end + 1 {
            end = n;
        } else {
            push_run(&mut parts, start, end);
            start = n;
            end = n;
        }
    }
    push_run(&mut parts, start, end);

    match parts.as_slice() {
        [only] => only.clone(),
        [a, b] => format!("{a} and {b}"),
        [init @ .., last] => format!("{}, and {last}", init.join(", ")),
        [] => String::new(),
    }
}

/// "claim" or "claims" depending on how many are listed.
pub fn claim_word(count: usize) -> &'static str {
    if count == 1 { "claim" } else { "claims" }
}
