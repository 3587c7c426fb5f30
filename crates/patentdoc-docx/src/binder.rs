//! Fresh rendering: one instance of every section per record.

use patentdoc_core::Record;
use tracing::{debug, info};

use crate::baseline::{Baseline, SectionBaseline};
use crate::body::BodyElement;
use crate::document::{DocBlock, GeneratedDocument, RenderedRecord, RenderedSection};
use crate::error::RenderError;
use crate::placeholder::substitute;
use crate::tag::{record_tag, section_tag};
use crate::template::{Section, Template, TemplateBlock};

/// Document-level values, available everywhere as `{{report.*}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentContext {
    pub report_type: String,
    pub report_date: String,
    pub client: String,
    /// File name of the spreadsheet the records came from.
    pub source: String,
    /// Rendered in place of a blank abstract or claim field.
    pub missing_marker: String,
}

impl DocumentContext {
    fn report_value(&self, name: &str, record_count: usize) -> Option<String> {
        let value = match name {
            "report.type" => self.report_type.clone(),
            "report.date" => self.report_date.clone(),
            "report.client" => self.client.clone(),
            "report.source" => self.source.clone(),
            "report.records" => record_count.to_string(),
            _ => return None,
        };
        Some(value)
    }
}

/// Render every template block against `records`, in record order.
pub fn bind(
    template: &Template,
    records: &[Record],
    context: &DocumentContext,
) -> Result<GeneratedDocument, RenderError> {
    let mut blocks = Vec::with_capacity(template.blocks().len());
    for block in template.blocks() {
        match block {
            TemplateBlock::Static(element) => {
                blocks.push(DocBlock::Static(render_static(element, context, records.len())?));
            }
            TemplateBlock::Repeat(section) => {
                let rendered = records
                    .iter()
                    .enumerate()
                    .map(|(i, record)| render_record(section, record, i + 1, context, records.len()))
                    .collect::<Result<Vec<_>, _>>()?;
                blocks.push(DocBlock::Section(RenderedSection {
                    name: section.name.clone(),
                    tag: section_tag(&section.name),
                    lead: Vec::new(),
                    records: rendered,
                }));
            }
        }
    }

    info!(
        records = records.len(),
        sections = template.sections().count(),
        "bound template"
    );
    Ok(GeneratedDocument {
        package: template.package.clone(),
        head: template.head.clone(),
        tail: template.tail.clone(),
        blocks,
        baseline: Some(baseline_for(template, records)),
    })
}

/// Static content only knows `{{report.*}}`; any other token stays as typed.
pub(crate) fn render_static(
    element: &BodyElement,
    context: &DocumentContext,
    record_count: usize,
) -> Result<BodyElement, RenderError> {
    let rendered = substitute(element.xml(), &mut |name| {
        context.report_value(name, record_count)
    })?;
    Ok(rendered.map_or_else(|| element.clone(), BodyElement::new))
}

/// One section instance for one record. Unknown tokens render empty.
pub(crate) fn render_record(
    section: &Section,
    record: &Record,
    index: usize,
    context: &DocumentContext,
    record_count: usize,
) -> Result<RenderedRecord, RenderError> {
    let mut resolve = |name: &str| {
        let value = match name {
            "index" => Some(index.to_string()),
            n if n.starts_with("report.") => context.report_value(n, record_count),
            n => record.value(n, &context.missing_marker),
        };
        if value.is_none() {
            debug!(identifier = %record.identifier, placeholder = name, "no value; rendering empty");
        }
        Some(value.unwrap_or_default())
    };

    let elements = section
        .elements
        .iter()
        .map(|element| {
            substitute(element.xml(), &mut resolve)
                .map(|out| out.map_or_else(|| element.clone(), BodyElement::new))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RenderedRecord {
        identifier: Some(record.identifier.clone()),
        tag: record_tag(&section.name, &record.identifier),
        elements,
    })
}

/// What an update run will compare against: every section's placeholders
/// and every record's source fingerprint.
pub(crate) fn baseline_for(template: &Template, records: &[Record]) -> Baseline {
    let mut baseline = Baseline::default();
    for section in template.sections() {
        baseline.sections.insert(
            section.name.clone(),
            SectionBaseline {
                fields: section.placeholders.clone(),
                records: records
                    .iter()
                    .map(|r| (r.identifier.clone(), r.source_fingerprint().to_string()))
                    .collect(),
            },
        );
    }
    baseline
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{docx, para};

    fn context() -> DocumentContext {
        DocumentContext {
            report_type: "Invalidity".into(),
            report_date: "JUNE 1, 2024".into(),
            client: "ACME CORP".into(),
            source: "results.xlsx".into(),
            missing_marker: "[not available]".into(),
        }
    }

    fn template() -> Template {
        let body: String = [
            "{{report.type}} REPORT FOR {{report.client}}",
            "Records: {{report.records}}; {{title}} stays literal here",
            "{{#reference}}",
            "{{index}}. {{display_number}}: {{title}}",
            "Abstract: {{abstract}}",
            "Assignee: {{assignee}}",
            "{{/reference}}",
            "End of report",
        ]
        .iter()
        .map(|t| para(t))
        .collect();
        Template::from_package(docx(&body)).unwrap()
    }

    fn texts(doc: &GeneratedDocument) -> Vec<String> {
        let mut out = Vec::new();
        for block in &doc.blocks {
            match block {
                DocBlock::Static(e) => out.push(e.text()),
                DocBlock::Section(s) => {
                    for r in &s.records {
                        out.extend(r.elements.iter().map(BodyElement::text));
                    }
                }
            }
        }
        out
    }

    #[test]
    fn one_instance_per_record_in_order() {
        let records = vec![
            Record::new("US1234567", "Widget").with_abstract("A widget."),
            Record::new("US2345678", "Gadget").with_field("assignee", "Globex"),
        ];
        let doc = bind(&template(), &records, &context()).unwrap();

        let section = doc.section("reference").unwrap();
        let ids: Vec<_> = section
            .records
            .iter()
            .map(|r| r.identifier.as_deref().unwrap())
            .collect();
        assert_eq!(ids, vec!["US1234567", "US2345678"]);

        let texts = texts(&doc);
        assert_eq!(texts[0], "Invalidity REPORT FOR ACME CORP");
        assert_eq!(texts[1], "Records: 2; {{title}} stays literal here");
        assert_eq!(texts[2], "1. U.S. Patent No. 1,234,567: Widget");
        assert_eq!(texts[3], "Abstract: A widget.");
        assert_eq!(texts[4], "Assignee: ");
        assert_eq!(texts[5], "2. U.S. Patent No. 2,345,678: Gadget");
        assert_eq!(texts[6], "Abstract: [not available]");
        assert_eq!(texts[7], "Assignee: Globex");
        assert_eq!(texts[8], "End of report");
    }

    #[test]
    fn zero_records_gives_empty_section() {
        let doc = bind(&template(), &[], &context()).unwrap();
        assert!(doc.section("reference").unwrap().records.is_empty());
        assert_eq!(
            doc.baseline.as_ref().unwrap().sections["reference"].records.len(),
            0
        );
    }

    #[test]
    fn baseline_records_fields_and_fingerprints() {
        let records = vec![Record::new("US1234567", "Widget")];
        let doc = bind(&template(), &records, &context()).unwrap();
        let section = &doc.baseline.as_ref().unwrap().sections["reference"];
        assert!(section.fields.contains("assignee"));
        assert_eq!(
            section.records["US1234567"],
            records[0].source_fingerprint()
        );
    }

    #[test]
    fn output_is_tagged_and_readable_back() {
        let records = vec![Record::new("US1234567", "Widget")];
        let doc = bind(&template(), &records, &context()).unwrap();
        let reread = GeneratedDocument::from_package(doc.to_package().unwrap()).unwrap();

        let section = reread.section("reference").unwrap();
        assert_eq!(section.records.len(), 1);
        assert_eq!(section.records[0].identifier.as_deref(), Some("US1234567"));
        assert_eq!(reread.baseline, doc.baseline);
        assert_eq!(reread.blocks, doc.blocks);
    }

    #[test]
    fn binding_twice_is_identical() {
        let records = vec![
            Record::new("US1234567", "Widget"),
            Record::new("EP1234567B1", "Gadget"),
        ];
        let a = bind(&template(), &records, &context()).unwrap();
        let b = bind(&template(), &records, &context()).unwrap();
        assert_eq!(a.document_xml(), b.document_xml());
    }
}
