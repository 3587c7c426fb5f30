//! Plain-text summaries for the terminal.

use std::path::Path;

use patentdoc_core::ReportType;
use patentdoc_docx::{GeneratedDocument, MergeReport};
use patentdoc_report::{RunMode, RunSummary};

const MAX_LISTED: usize = 10;

pub fn print_summary(summary: &RunSummary) {
    println!("Wrote {}", summary.output.display());
    println!("  {:<12} {}", "records", summary.records);

    let enrichment = &summary.enrichment;
    if enrichment.attempted > 0 {
        println!(
            "  {:<12} {} abstracts, {} claims filled for {} records",
            "enrichment", enrichment.abstracts_filled, enrichment.claims_filled, enrichment.attempted
        );
        for failure in enrichment.failures.iter().take(MAX_LISTED) {
            println!("  {:<12} {}", "", failure.error);
        }
        if enrichment.failures.len() > MAX_LISTED {
            println!("  {:<12} ... and {} more", "", enrichment.failures.len() - MAX_LISTED);
        }
    }

    match &summary.mode {
        RunMode::Fresh => println!("  {:<12} fresh", "mode"),
        RunMode::FallbackFresh { reason } => {
            println!("  {:<12} fresh (prior report not used: {reason})", "mode");
        }
        RunMode::Updated(report) => {
            println!("  {:<12} update", "mode");
            print_merge(report);
        }
    }
}

fn print_merge(report: &MergeReport) {
    for section in &report.sections {
        println!("  [{}]", section.name);
        if section.template_changed {
            println!("    template gained placeholders; section re-rendered");
        }
        print_ids("added", &section.added);
        print_ids("re-rendered", &section.rerendered);
        print_ids("removed", &section.removed);
        println!("    {:<12} {}", "kept", section.retained.len());
    }
}

fn print_ids(label: &str, ids: &[String]) {
    if ids.is_empty() {
        return;
    }
    let mut shown = ids.iter().take(MAX_LISTED).cloned().collect::<Vec<_>>().join(", ");
    if ids.len() > MAX_LISTED {
        shown.push_str(&format!(", ... ({} total)", ids.len()));
    }
    println!("    {label:<12} {shown}");
}

pub fn print_document(path: &Path, document: &GeneratedDocument) {
    println!("=== {} ===", path.display());
    println!(
        "baseline: {}",
        if document.baseline.is_some() { "present" } else { "absent" }
    );
    for section in document.sections() {
        let name = if section.name.is_empty() { &section.tag } else { &section.name };
        println!("{name} ({} records)", section.records.len());
        for record in &section.records {
            println!("  {}", record.identifier.as_deref().unwrap_or(&record.tag));
        }
    }
}

pub fn print_report_types() {
    for report_type in ReportType::ALL {
        println!("{:<22} {}", report_type.name(), report_type.expected_template());
    }
}
