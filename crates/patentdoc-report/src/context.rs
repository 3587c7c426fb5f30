//! Document-level values derived from the run: client, date, file names.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::NaiveDate;
use patentdoc_docx::DocumentContext;
use regex::Regex;

use crate::RunConfig;

pub const UNKNOWN_CLIENT: &str = "UNKNOWN CLIENT";

/// `<matter>-<n> <Client Name> <publication>....xlsx`
static CLIENT_WITH_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^.*?([A-Za-z0-9]+-\d+)\s*([A-Za-z\s][A-Za-z\s.\-&]*?)\s*([A-Z]{2}\d+[A-Z]?\d*|US\d+|\d+).*\.xlsx$",
    )
    .unwrap()
});

/// `<matter>-<n> <Client Name>.xlsx`
static CLIENT_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^.*?([A-Za-z0-9]+-\d+)\s*(.+?)\.xlsx$").unwrap());

/// Client name from the spreadsheet's file name, upper-cased.
pub fn client_name(sheet: &Path) -> String {
    let Some(file_name) = sheet.file_name().and_then(|n| n.to_str()) else {
        return UNKNOWN_CLIENT.to_string();
    };
    CLIENT_WITH_NUMBER
        .captures(file_name)
        .or_else(|| CLIENT_ONLY.captures(file_name))
        .map(|caps| caps[2].trim().to_uppercase())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// "JUNE 01, 2024"
pub fn report_date(date: NaiveDate) -> String {
    date.format("%B %d, %Y").to_string().to_uppercase()
}

const OUTPUT_DATE: &str = "%d%b%Y";

fn output_prefix(sheet: &Path) -> String {
    let stem = sheet
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report".to_string());
    format!("GeneratedReport_{stem}_")
}

fn sheet_dir(sheet: &Path) -> &Path {
    match sheet.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

/// `GeneratedReport_<sheet stem>_<01Jun2024>.docx` beside the spreadsheet.
pub fn default_output_path(sheet: &Path, date: NaiveDate) -> PathBuf {
    let name = format!("{}{}.docx", output_prefix(sheet), date.format(OUTPUT_DATE));
    match sheet.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

/// The most recently dated report under the default naming scheme, if any.
pub fn latest_default_output(sheet: &Path) -> Option<PathBuf> {
    let prefix = output_prefix(sheet);
    let entries = std::fs::read_dir(sheet_dir(sheet)).ok()?;
    entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            let date = name.strip_prefix(&prefix)?.strip_suffix(".docx")?;
            let date = NaiveDate::parse_from_str(date, OUTPUT_DATE).ok()?;
            Some((date, entry.path()))
        })
        .max_by_key(|(date, _)| *date)
        .map(|(_, path)| path)
}

pub fn document_context(config: &RunConfig, date: NaiveDate) -> DocumentContext {
    DocumentContext {
        report_type: config.report_type.name().to_string(),
        report_date: report_date(date),
        client: client_name(&config.sheet),
        source: config
            .sheet
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        missing_marker: config.missing_marker.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_from_file_name() {
        assert_eq!(
            client_name(Path::new("/work/PD-123 Acme Corp US1234567.xlsx")),
            "ACME CORP"
        );
        assert_eq!(
            client_name(Path::new("AB12-7 Smith & Sons EP1234567B1 final.xlsx")),
            "SMITH & SONS"
        );
        assert_eq!(client_name(Path::new("PD-9 Globex.xlsx")), "GLOBEX");
        assert_eq!(client_name(Path::new("results.xlsx")), UNKNOWN_CLIENT);
        assert_eq!(client_name(Path::new("PD-9 Globex.ods")), UNKNOWN_CLIENT);
    }

    #[test]
    fn latest_default_output_picks_newest_date() {
        let dir = tempfile::tempdir().unwrap();
        let sheet = dir.path().join("results.xlsx");
        assert_eq!(latest_default_output(&sheet), None);

        for name in [
            "GeneratedReport_results_30May2024.docx",
            "GeneratedReport_results_02Jun2024.docx",
            "GeneratedReport_results_final.docx",
            "GeneratedReport_other_09Jun2024.docx",
        ] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        assert_eq!(
            latest_default_output(&sheet),
            Some(dir.path().join("GeneratedReport_results_02Jun2024.docx"))
        );
    }

    #[test]
    fn date_forms() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(report_date(date), "JUNE 01, 2024");
        assert_eq!(
            default_output_path(Path::new("/data/results.xlsx"), date),
            PathBuf::from("/data/GeneratedReport_results_01Jun2024.docx")
        );
    }
}
