use std::path::PathBuf;

use thiserror::Error;

/// Failure to read an input file: spreadsheet, template, or prior report.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} is password protected and no passphrase was given")]
    PassphraseRequired(PathBuf),

    #[error("could not decrypt {path}: {reason}")]
    Decrypt { path: PathBuf, reason: String },

    #[error("could not open workbook {path}: {reason}")]
    Workbook { path: PathBuf, reason: String },

    #[error("sheet '{0}' not found")]
    SheetNotFound(String),

    #[error("workbook has no sheets")]
    NoSheets,

    #[error("required column '{0}' not found in header row")]
    MissingColumn(&'static str),

    #[error("column '{0}' appears more than once in the header row")]
    DuplicateColumn(String),

    #[error("row {row}: publication number is blank")]
    MissingIdentifier { row: usize },

    #[error("row {row}: publication number {identifier} already appears on row {first_row}")]
    DuplicateIdentifier {
        identifier: String,
        row: usize,
        first_row: usize,
    },

    #[error("no prior report to update next to {0}; name one explicitly")]
    NoPriorReport(PathBuf),

    #[error("{path} is not a valid document package: {reason}")]
    Package { path: PathBuf, reason: String },
}
