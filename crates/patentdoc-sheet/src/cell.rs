//! Cell value rendering as the analyst sees it in the sheet.

use calamine::Data;
use chrono::NaiveDate;

/// Render a cell as display text.
///
/// Whole floats lose their `.0`, dates print as "13 June 2008", error cells
/// and empties are blank.
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_float(*f),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) => format_date(datetime.date()),
            None => format_float(dt.as_f64()),
        },
        Data::DateTimeIso(s) => s
            .get(..10)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .map(format_date)
            .unwrap_or_else(|| s.trim().to_string()),
        Data::DurationIso(s) => s.trim().to_string(),
    }
}

fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

/// Day without leading zero, full month name, four-digit year.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%-d %B %Y").to_string()
}
