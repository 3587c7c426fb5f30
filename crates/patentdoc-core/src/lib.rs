//! Core types shared across patentdoc: records, publication numbers, claim
//! ranges, report types, and protected package reading.

pub mod claims;
mod error;
pub mod package;
pub mod patent_number;
pub mod record;
pub mod report;

pub use error::LoadError;
pub use package::read_package;
pub use record::Record;
pub use report::ReportType;
