//! Report types offered to the analyst.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportType {
    #[default]
    Invalidity,
    Fto,
    Patentability,
    FtoPatentability,
    EvidenceOfUse,
    DesignPatentability,
}

#[derive(Debug, Error)]
#[error("unknown report type '{0}' (expected one of: {list})", list = ReportType::names().join(", "))]
pub struct ParseReportTypeError(String);

impl ReportType {
    pub const ALL: [ReportType; 6] = [
        ReportType::Invalidity,
        ReportType::Fto,
        ReportType::Patentability,
        ReportType::FtoPatentability,
        ReportType::EvidenceOfUse,
        ReportType::DesignPatentability,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ReportType::Invalidity => "Invalidity",
            ReportType::Fto => "FTO",
            ReportType::Patentability => "Patentability",
            ReportType::FtoPatentability => "FTO Patentability",
            ReportType::EvidenceOfUse => "Evidence of Use",
            ReportType::DesignPatentability => "Design Patentability",
        }
    }

    fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|t| t.name()).collect()
    }

    /// File name the analysts' template library uses for this report type.
    pub fn expected_template(self) -> &'static str {
        match self {
            ReportType::Invalidity => "Invalidity_Template.docx",
            ReportType::Fto => "FTO_Template.docx",
            ReportType::Patentability => "Patentability_Template.docx",
            ReportType::FtoPatentability => "FTO_Patentability_Template.docx",
            ReportType::EvidenceOfUse => "Evidence_of_Use_Template.docx",
            ReportType::DesignPatentability => "Design_Patentability.docx",
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReportType {
    type Err = ParseReportTypeError;

    /// Accepts display names and their kebab/snake forms, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Self::ALL
            .into_iter()
            .find(|t| {
                let name: String = t
                    .name()
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .map(|c| c.to_ascii_lowercase())
                    .collect();
                name == key
            })
            .ok_or_else(|| ParseReportTypeError(s.to_string()))
    }
}
