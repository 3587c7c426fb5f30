//! Run configuration, passed explicitly to [`run`](crate::run).

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use patentdoc_core::ReportType;
use patentdoc_enrich::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use serde::Deserialize;

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub sheet: PathBuf,
    pub sheet_passphrase: Option<String>,
    /// Worksheet to read; the first one when unset.
    pub sheet_name: Option<String>,
    pub template: PathBuf,
    /// Also used to open the prior report in update mode.
    pub template_passphrase: Option<String>,
    pub report_type: ReportType,
    /// Merge into the prior report instead of generating from scratch.
    pub update: bool,
    /// Defaults to `GeneratedReport_<sheet stem>_<ddMonYYYY>.docx` next to
    /// the spreadsheet.
    pub output: Option<PathBuf>,
    /// Prior report for update mode. Defaults to `output` when that is set,
    /// otherwise to the newest dated report next to the spreadsheet.
    pub prior: Option<PathBuf>,
    pub enrichment: EnrichmentConfig,
    pub missing_marker: String,
    /// Defaults to today.
    pub report_date: Option<NaiveDate>,
    /// Regenerate from scratch when the prior report cannot be merged.
    pub fallback_on_merge_error: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    pub enabled: bool,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            sheet: PathBuf::new(),
            sheet_passphrase: None,
            sheet_name: None,
            template: PathBuf::new(),
            template_passphrase: None,
            report_type: ReportType::default(),
            update: false,
            output: None,
            prior: None,
            enrichment: EnrichmentConfig::default(),
            missing_marker: String::new(),
            report_date: None,
            fallback_on_merge_error: true,
        }
    }
}

impl RunConfig {
    pub fn new(sheet: impl AsRef<Path>, template: impl AsRef<Path>, report_type: ReportType) -> Self {
        Self {
            sheet: sheet.as_ref().to_path_buf(),
            template: template.as_ref().to_path_buf(),
            report_type,
            ..Default::default()
        }
    }
}

// Passphrases stay out of logs.
impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |p: &Option<String>| p.as_ref().map(|_| "<redacted>");
        f.debug_struct("RunConfig")
            .field("sheet", &self.sheet)
            .field("sheet_passphrase", &redact(&self.sheet_passphrase))
            .field("sheet_name", &self.sheet_name)
            .field("template", &self.template)
            .field("template_passphrase", &redact(&self.template_passphrase))
            .field("report_type", &self.report_type)
            .field("update", &self.update)
            .field("output", &self.output)
            .field("prior", &self.prior)
            .field("enrichment", &self.enrichment)
            .field("missing_marker", &self.missing_marker)
            .field("report_date", &self.report_date)
            .field("fallback_on_merge_error", &self.fallback_on_merge_error)
            .finish()
    }
}
