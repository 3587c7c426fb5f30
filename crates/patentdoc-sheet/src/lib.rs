//! Spreadsheet loading: one ordered [`Record`] per data row.
//!
//! Any format calamine understands is accepted (xlsx, xlsm, xls, ods).
//! Protected workbooks are decrypted in memory first.
//!
//! [`Record`]: patentdoc_core::Record

pub mod cell;
pub mod header;
mod loader;

pub use loader::{LoadOptions, load_records, records_from_range};
pub use patentdoc_core::LoadError;
