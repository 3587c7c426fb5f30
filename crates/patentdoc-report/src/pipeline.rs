//! One run: load, enrich, then bind or merge, then write.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use patentdoc_core::{LoadError, Record};
use patentdoc_docx::{
    DocumentContext, DocxPackage, GeneratedDocument, MergeReport, Template, bind, merge,
};
use patentdoc_enrich::{Enricher, EnrichmentReport, NoSource, PatentSource};
use patentdoc_sheet::{LoadOptions, load_records};
use tracing::{info, warn};

use crate::context::{default_output_path, document_context, latest_default_output};
use crate::{ReportError, RunConfig};

/// How the output document came about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    Fresh,
    Updated(MergeReport),
    /// Update was requested but the prior report could not be used.
    FallbackFresh { reason: String },
}

#[derive(Debug)]
pub struct RunSummary {
    pub output: PathBuf,
    pub records: usize,
    pub enrichment: EnrichmentReport,
    pub mode: RunMode,
}

/// Run with the configured enrichment source.
pub fn run(config: &RunConfig) -> Result<RunSummary, ReportError> {
    if !config.enrichment.enabled {
        return run_with_source(config, &NoSource);
    }
    run_online(config)
}

#[cfg(feature = "http")]
fn run_online(config: &RunConfig) -> Result<RunSummary, ReportError> {
    let source = patentdoc_enrich::HttpPatentSource::new(
        &config.enrichment.base_url,
        std::time::Duration::from_secs(config.enrichment.timeout_secs),
    )?;
    run_with_source(config, &source)
}

#[cfg(not(feature = "http"))]
fn run_online(config: &RunConfig) -> Result<RunSummary, ReportError> {
    warn!("built without http support; enrichment skipped");
    run_with_source(config, &NoSource)
}

/// Run with an explicit enrichment source.
pub fn run_with_source(
    config: &RunConfig,
    source: &dyn PatentSource,
) -> Result<RunSummary, ReportError> {
    let date = config.report_date.unwrap_or_else(today);
    let output = config
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&config.sheet, date));
    info!(
        sheet = %config.sheet.display(),
        template = %config.template.display(),
        report_type = %config.report_type,
        update = config.update,
        "starting run"
    );

    let options = LoadOptions {
        passphrase: config.sheet_passphrase.clone(),
        sheet: config.sheet_name.clone(),
    };
    let mut records = load_records(&config.sheet, &options)?;

    let enrichment = if config.enrichment.enabled {
        Enricher::new(source).enrich(&mut records)
    } else {
        EnrichmentReport::default()
    };

    check_template_name(config);
    let package = DocxPackage::open(&config.template, config.template_passphrase.as_deref())?;
    let template = Template::from_package(package)?;
    let context = document_context(config, date);

    let (document, mode) = if config.update {
        update(config, &template, &records, &context, &output)?
    } else {
        (bind(&template, &records, &context)?, RunMode::Fresh)
    };

    document.write(&output)?;
    info!(output = %output.display(), records = records.len(), "report written");
    Ok(RunSummary {
        output,
        records: records.len(),
        enrichment,
        mode,
    })
}

fn update(
    config: &RunConfig,
    template: &Template,
    records: &[Record],
    context: &DocumentContext,
    output: &Path,
) -> Result<(GeneratedDocument, RunMode), ReportError> {
    let prior_path = prior_path(config, output)?;
    info!(prior = %prior_path.display(), "updating prior report");

    let package = DocxPackage::open(&prior_path, config.template_passphrase.as_deref())?;
    let merged = GeneratedDocument::from_package(package)
        .and_then(|prior| merge(template, prior, records, context));
    match merged {
        Ok((document, report)) => {
            info!(
                added = report.added(),
                retained = report.retained(),
                rerendered = report.rerendered(),
                removed = report.removed(),
                "merged into prior report"
            );
            Ok((document, RunMode::Updated(report)))
        }
        Err(e) if config.fallback_on_merge_error => {
            warn!(prior = %prior_path.display(), error = %e, "cannot merge; generating fresh");
            let reason = e.to_string();
            Ok((bind(template, records, context)?, RunMode::FallbackFresh { reason }))
        }
        Err(e) => Err(e.into()),
    }
}

/// The report an update run merges into: the configured prior, else the
/// configured output, else the newest dated report beside the spreadsheet.
/// It must exist; updating never silently starts over.
fn prior_path(config: &RunConfig, output: &Path) -> Result<PathBuf, LoadError> {
    let path = match (&config.prior, &config.output) {
        (Some(prior), _) => prior.clone(),
        (None, Some(_)) => output.to_path_buf(),
        (None, None) => latest_default_output(&config.sheet)
            .ok_or_else(|| LoadError::NoPriorReport(config.sheet.clone()))?,
    };
    if !path.exists() {
        return Err(LoadError::NotFound(path));
    }
    Ok(path)
}

/// The template library names files after report types; a mismatch is
/// usually the wrong template picked.
fn check_template_name(config: &RunConfig) {
    let expected = config.report_type.expected_template();
    let actual = config.template.file_name().and_then(|n| n.to_str());
    if actual.is_some_and(|name| !name.eq_ignore_ascii_case(expected)) {
        warn!(
            template = ?actual,
            expected,
            report_type = %config.report_type,
            "template file name does not match report type"
        );
    }
}

/// Date a run uses when none is configured.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
