use crate::error::Result;
use csv::{Reader, ReaderBuilder, StringRecord, StringRecordsIntoIter};
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// One source row, keyed by header name. All values are opaque strings,
/// exactly as they appear in the export.
#[derive(Debug, Clone)]
pub struct Row {
    columns: HashMap<String, String>,
}

impl Row {
    fn from_record(headers: &StringRecord, record: &StringRecord) -> Self {
        let columns = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.to_string(), v.to_string()))
            .collect();
        Self { columns }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns.get(column).map(|v| v.as_str())
    }
}

/// Lazy single-pass iterator over the rows of one source CSV. The line
/// table is too large to buffer, so consumers take rows one at a time and
/// must never collect the whole stream.
pub struct RowStream {
    headers: StringRecord,
    records: StringRecordsIntoIter<File>,
}

impl Iterator for RowStream {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        Some(
            record
                .map(|r| Row::from_record(&self.headers, &r))
                .map_err(Into::into),
        )
    }
}

fn open_reader(path: &Path) -> Result<Reader<File>> {
    Ok(ReaderBuilder::new().has_headers(true).from_path(path)?)
}

/// Stream rows without materializing the table.
pub fn stream_rows(path: &Path) -> Result<RowStream> {
    let mut reader = open_reader(path)?;
    let headers = reader.headers()?.clone();
    debug!("Streaming {} ({} columns)", path.display(), headers.len());
    Ok(RowStream {
        headers,
        records: reader.into_records(),
    })
}

/// Materialize a small or medium table so later stages can probe it.
pub fn read_rows(path: &Path) -> Result<Vec<Row>> {
    let rows: Result<Vec<Row>> = stream_rows(path)?.collect();
    let rows = rows?;
    debug!("Loaded {} rows from {}", rows.len(), path.display());
    Ok(rows)
}
