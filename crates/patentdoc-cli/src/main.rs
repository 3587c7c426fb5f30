mod display;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use patentdoc_core::ReportType;
use patentdoc_docx::GeneratedDocument;
use patentdoc_report::RunConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "patentdoc",
    version,
    about = "Generate and update patent search reports from a results spreadsheet"
)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a report, or update a prior one.
    Generate(GenerateArgs),
    /// Show the sections and records tagged in a generated report.
    Inspect {
        report: PathBuf,
        #[arg(long, env = "PATENTDOC_TEMPLATE_PASSPHRASE", hide_env_values = true)]
        passphrase: Option<String>,
    },
    /// List the report types and their template file names.
    Types,
}

#[derive(clap::Args, Debug)]
struct GenerateArgs {
    /// JSON run configuration; flags given here override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Results spreadsheet (.xlsx, .xls, .ods).
    #[arg(long)]
    sheet: Option<PathBuf>,

    /// Word template with repeatable sections.
    #[arg(long)]
    template: Option<PathBuf>,

    /// e.g. "fto", "invalidity", "evidence-of-use".
    #[arg(long, short = 't')]
    report_type: Option<ReportType>,

    /// Merge into the prior report, keeping manual edits.
    #[arg(long)]
    update: bool,

    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Prior report for --update; defaults to --output, else the newest
    /// dated report next to the spreadsheet.
    #[arg(long)]
    prior: Option<PathBuf>,

    /// Worksheet name; defaults to the first sheet.
    #[arg(long)]
    sheet_name: Option<String>,

    #[arg(long, env = "PATENTDOC_SHEET_PASSPHRASE", hide_env_values = true)]
    sheet_passphrase: Option<String>,

    /// Also used to open the prior report.
    #[arg(long, env = "PATENTDOC_TEMPLATE_PASSPHRASE", hide_env_values = true)]
    template_passphrase: Option<String>,

    /// Skip fetching missing abstracts and claims.
    #[arg(long)]
    offline: bool,

    #[arg(long)]
    base_url: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Text shown where an abstract or claims are unavailable.
    #[arg(long)]
    missing_marker: Option<String>,

    /// Report date (YYYY-MM-DD); defaults to today.
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Fail instead of regenerating when the prior report cannot be merged.
    #[arg(long)]
    strict_merge: bool,
}

impl GenerateArgs {
    fn into_config(self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => RunConfig::default(),
        };

        if let Some(sheet) = self.sheet {
            config.sheet = sheet;
        }
        if let Some(template) = self.template {
            config.template = template;
        }
        if let Some(report_type) = self.report_type {
            config.report_type = report_type;
        }
        config.update |= self.update;
        config.output = self.output.or(config.output);
        config.prior = self.prior.or(config.prior);
        config.sheet_name = self.sheet_name.or(config.sheet_name);
        config.sheet_passphrase = self.sheet_passphrase.or(config.sheet_passphrase);
        config.template_passphrase = self.template_passphrase.or(config.template_passphrase);
        if self.offline {
            config.enrichment.enabled = false;
        }
        if let Some(base_url) = self.base_url {
            config.enrichment.base_url = base_url;
        }
        if let Some(secs) = self.timeout_secs {
            config.enrichment.timeout_secs = secs;
        }
        if let Some(marker) = self.missing_marker {
            config.missing_marker = marker;
        }
        config.report_date = self.date.or(config.report_date);
        if self.strict_merge {
            config.fallback_on_merge_error = false;
        }

        if config.sheet.as_os_str().is_empty() {
            bail!("no spreadsheet given (--sheet)");
        }
        if config.template.as_os_str().is_empty() {
            bail!("no template given (--template)");
        }
        Ok(config)
    }
}

fn read_config(path: &Path) -> Result<RunConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!("patentdoc v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Generate(args) => {
            let config = args.into_config()?;
            tracing::debug!(?config, "run configuration");
            let summary = patentdoc_report::run(&config)?;
            display::print_summary(&summary);
        }
        Command::Inspect { report, passphrase } => {
            let document = GeneratedDocument::open(&report, passphrase.as_deref())
                .with_context(|| format!("cannot read tags from {}", report.display()))?;
            display::print_document(&report, &document);
        }
        Command::Types => display::print_report_types(),
    }
    Ok(())
}
