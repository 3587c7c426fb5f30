//! Spreadsheet → ordered records.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Range, Reader, open_workbook_auto_from_rs};
use patentdoc_core::claims::parse_claim_numbers;
use patentdoc_core::patent_number::extract_publication_number;
use patentdoc_core::{LoadError, Record, read_package};
use tracing::{debug, info};

use crate::cell::cell_text;
use crate::header::HeaderMap;

/// How to open the workbook.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Passphrase for a protected workbook. Ignored for unprotected files.
    pub passphrase: Option<String>,
    /// Sheet to read; the first sheet when `None`.
    pub sheet: Option<String>,
}

/// Load one record per data row, in row order.
///
/// The file is read (and decrypted if needed) into memory, then parsed with
/// whichever calamine reader matches its format.
pub fn load_records(path: &Path, options: &LoadOptions) -> Result<Vec<Record>, LoadError> {
    let bytes = read_package(path, options.passphrase.as_deref())?;
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| LoadError::Workbook {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let sheet_names = workbook.sheet_names();
    let sheet = match &options.sheet {
        Some(name) => sheet_names
            .iter()
            .find(|s| *s == name)
            .cloned()
            .ok_or_else(|| LoadError::SheetNotFound(name.clone()))?,
        None => sheet_names.first().cloned().ok_or(LoadError::NoSheets)?,
    };

    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| LoadError::Workbook {
            path: path.to_path_buf(),
            reason: format!("sheet '{sheet}': {e}"),
        })?;

    let records = records_from_range(&range)?;
    info!(
        path = %path.display(),
        sheet = %sheet,
        count = records.len(),
        "loaded records"
    );
    Ok(records)
}

/// Build records from a worksheet range.
///
/// The first non-blank row is the header. Fully blank rows are skipped.
pub fn records_from_range(range: &Range<Data>) -> Result<Vec<Record>, LoadError> {
    let first_row = range.start().map(|(r, _)| r as usize).unwrap_or(0);
    let mut rows = range
        .rows()
        .enumerate()
        .map(|(i, cells)| (first_row + i + 1, cells.iter().map(cell_text).collect::<Vec<_>>()))
        .filter(|(_, cells)| cells.iter().any(|c| !c.is_empty()));

    let Some((header_row, header_cells)) = rows.next() else {
        debug!("worksheet is empty");
        return Ok(Vec::new());
    };
    let header = HeaderMap::from_row(&header_cells)?;
    debug!(row = header_row, ?header, "resolved header");

    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut records = Vec::new();

    for (row, cells) in rows {
        let get = |idx: usize| cells.get(idx).map(String::as_str).unwrap_or("");

        let identifier = extract_publication_number(get(header.identifier));
        if identifier.is_empty() {
            return Err(LoadError::MissingIdentifier { row });
        }
        if let Some(&first_row) = seen.get(&identifier) {
            return Err(LoadError::DuplicateIdentifier {
                identifier,
                row,
                first_row,
            });
        }
        seen.insert(identifier.clone(), row);

        let mut record = Record::new(identifier, get(header.title)).with_row(row);
        if let Some(text) = header.abstract_text.map(get).filter(|s| !s.is_empty()) {
            record = record.with_abstract(text);
        }
        if let Some(text) = header.claims.map(get).filter(|s| !s.is_empty()) {
            record = record.with_claims(text);
        }
        if let Some(text) = header.claim_numbers.map(get) {
            record = record.with_claim_numbers(parse_claim_numbers(text));
        }
        for (idx, name) in &header.extras {
            record = record.with_field(name.clone(), get(*idx));
        }
        records.push(record);
    }

    Ok(records)
}
