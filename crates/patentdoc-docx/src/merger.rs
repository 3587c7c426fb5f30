//! Update runs: fold current records into a previously generated report.
//!
//! Per section, in current record order:
//!
//! | prior block | baseline fingerprint | result |
//! |---|---|---|
//! | absent | | rendered fresh |
//! | present | equal, or none recorded | kept verbatim, edits and all |
//! | present | different | re-rendered |
//! | present, no current record | | removed |
//!
//! If the template now uses placeholders the baseline never saw, the whole
//! section is re-rendered. A kept block is also re-rendered when its
//! `{{index}}` would change, or when the section prints `{{report.records}}`
//! and the count changed. Static content of the prior report is kept as is.

use std::collections::HashMap;

use patentdoc_core::Record;
use tracing::{debug, info, warn};

use crate::binder::{DocumentContext, baseline_for, render_record};
use crate::document::{DocBlock, GeneratedDocument, RenderedRecord, RenderedSection};
use crate::error::MergeError;
use crate::tag::{record_tag, section_tag};
use crate::template::Template;

/// What happened to each record of one section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionMerge {
    pub name: String,
    pub added: Vec<String>,
    pub retained: Vec<String>,
    pub rerendered: Vec<String>,
    pub removed: Vec<String>,
    /// The template gained placeholders since the prior run.
    pub template_changed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub sections: Vec<SectionMerge>,
}

impl MergeReport {
    pub fn added(&self) -> usize {
        self.sections.iter().map(|s| s.added.len()).sum()
    }

    pub fn retained(&self) -> usize {
        self.sections.iter().map(|s| s.retained.len()).sum()
    }

    pub fn rerendered(&self) -> usize {
        self.sections.iter().map(|s| s.rerendered.len()).sum()
    }

    pub fn removed(&self) -> usize {
        self.sections.iter().map(|s| s.removed.len()).sum()
    }
}

/// Merge `records` into `prior`.
pub fn merge(
    template: &Template,
    prior: GeneratedDocument,
    records: &[Record],
    context: &DocumentContext,
) -> Result<(GeneratedDocument, MergeReport), MergeError> {
    for section in template.sections() {
        let tag = section_tag(&section.name);
        if !prior.sections().any(|s| s.tag == tag) {
            return Err(MergeError::MissingSection(section.name.clone()));
        }
    }

    let GeneratedDocument {
        package,
        head,
        tail,
        blocks: prior_blocks,
        baseline: prior_baseline,
    } = prior;
    let prior_baseline = prior_baseline.unwrap_or_default();

    let mut blocks = Vec::with_capacity(prior_blocks.len());
    let mut report = MergeReport::default();

    for block in prior_blocks {
        let prior_section = match block {
            DocBlock::Static(element) => {
                blocks.push(DocBlock::Static(element));
                continue;
            }
            DocBlock::Section(s) => s,
        };
        let Some(section) = template
            .sections()
            .find(|t| section_tag(&t.name) == prior_section.tag)
        else {
            warn!(tag = %prior_section.tag, name = %prior_section.name, "dropping section no longer in the template");
            continue;
        };

        let baseline = prior_baseline.sections.get(&section.name);
        let added_fields: Vec<&String> = match baseline {
            Some(b) => section.placeholders.difference(&b.fields).collect(),
            None => Vec::new(),
        };
        let template_changed = !added_fields.is_empty();
        if template_changed {
            warn!(
                section = %section.name,
                fields = ?added_fields,
                "template uses new placeholders; re-rendering the section"
            );
        }

        let mut merge = SectionMerge {
            name: section.name.clone(),
            template_changed,
            ..Default::default()
        };
        let prior_order: Vec<String> = prior_section.records.iter().map(|r| r.tag.clone()).collect();
        let uses_index = section.placeholders.contains("index");
        let count_changed = section.placeholders.contains("report.records")
            && prior_order.len() != records.len();
        let prior_position: HashMap<&str, usize> = prior_order
            .iter()
            .enumerate()
            .map(|(i, tag)| (tag.as_str(), i + 1))
            .collect();
        let mut by_tag: HashMap<String, RenderedRecord> = prior_section
            .records
            .into_iter()
            .map(|r| (r.tag.clone(), r))
            .collect();

        let mut merged = Vec::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            let tag = record_tag(&section.name, &record.identifier);
            let id = record.identifier.clone();
            match by_tag.remove(&tag) {
                None => {
                    merged.push(render_record(section, record, i + 1, context, records.len())?);
                    merge.added.push(id);
                }
                Some(prev) => {
                    let unchanged = baseline
                        .and_then(|b| b.records.get(&record.identifier))
                        .is_none_or(|fp| fp == record.source_fingerprint());
                    let moved = uses_index && prior_position.get(tag.as_str()) != Some(&(i + 1));
                    if unchanged && moved {
                        debug!(section = %section.name, identifier = %id, "index changed; re-rendering");
                    }
                    if unchanged && !template_changed && !moved && !count_changed {
                        merged.push(RenderedRecord {
                            identifier: Some(id.clone()),
                            ..prev
                        });
                        merge.retained.push(id);
                    } else {
                        merged.push(render_record(section, record, i + 1, context, records.len())?);
                        merge.rerendered.push(id);
                    }
                }
            }
        }

        for tag in prior_order {
            if let Some(stale) = by_tag.remove(&tag) {
                merge.removed.push(stale.identifier.unwrap_or(stale.tag));
            }
        }

        info!(
            section = %merge.name,
            added = merge.added.len(),
            retained = merge.retained.len(),
            rerendered = merge.rerendered.len(),
            removed = merge.removed.len(),
            "merged section"
        );
        blocks.push(DocBlock::Section(RenderedSection {
            name: section.name.clone(),
            tag: prior_section.tag,
            lead: prior_section.lead,
            records: merged,
        }));
        report.sections.push(merge);
    }

    let document = GeneratedDocument {
        package,
        head,
        tail,
        blocks,
        baseline: Some(baseline_for(template, records)),
    };
    Ok((document, report))
}
