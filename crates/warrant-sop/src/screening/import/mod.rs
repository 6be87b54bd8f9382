mod header;

use crate::screening::schema::RawFrame;
use std::io::Read;
use std::path::Path;
use tracing::debug;

#[derive(Debug)]
pub enum ReportImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    HeaderNotFound { scanned: usize },
    NoDataRows,
}

impl std::fmt::Display for ReportImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportImportError::Io(err) => write!(f, "failed to read warrant report: {}", err),
            ReportImportError::Csv(err) => write!(f, "invalid warrant report CSV: {}", err),
            ReportImportError::HeaderNotFound { scanned } => write!(
                f,
                "no header row with code and name columns in the first {} rows",
                scanned
            ),
            ReportImportError::NoDataRows => write!(f, "warrant report has no data rows"),
        }
    }
}

impl std::error::Error for ReportImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReportImportError::Io(err) => Some(err),
            ReportImportError::Csv(err) => Some(err),
            ReportImportError::HeaderNotFound { .. } | ReportImportError::NoDataRows => None,
        }
    }
}

impl From<std::io::Error> for ReportImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ReportImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Reads vendor CSV exports into a [`RawFrame`], locating the real header row.
pub struct ReportImporter;

impl ReportImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<RawFrame, ReportImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<RawFrame, ReportImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut records: Vec<Vec<String>> = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            records.push(record.iter().map(str::to_string).collect());
        }

        if let Some(first) = records.first_mut().and_then(|record| record.first_mut()) {
            if let Some(stripped) = first.strip_prefix('\u{feff}') {
                *first = stripped.to_string();
            }
        }

        let header_index =
            header::find_header_row(&records).ok_or(ReportImportError::HeaderNotFound {
                scanned: header::HEADER_SCAN_LIMIT.min(records.len()),
            })?;
        let headers = header::merged_headers(&records, header_index);

        let rows: Vec<Vec<String>> = records
            .into_iter()
            .skip(header_index + 1)
            .filter(|record| record.iter().any(|cell| !cell.trim().is_empty()))
            .collect();

        if rows.is_empty() {
            return Err(ReportImportError::NoDataRows);
        }

        debug!(
            header_row = header_index,
            columns = headers.len(),
            rows = rows.len(),
            "warrant report imported"
        );

        Ok(RawFrame::new(headers, rows))
    }
}
