use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;
use tubefetch_core::{ResolutionRecord, Table, QUERY_COLUMN, URL_COLUMN};

use crate::persist::{self, PersistError};

const DELIMITER_CANDIDATES: [u8; 4] = [b',', b';', b'\t', b'|'];

#[derive(Debug, Error)]
pub enum TableError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
    #[error("table {path} has no {column:?} column")]
    MissingColumn { path: String, column: &'static str },
}

/// Pick the delimiter that occurs most often in the header line, outside quotes.
pub fn sniff_delimiter(content: &str) -> u8 {
    let header = content.lines().next().unwrap_or("");
    let mut counts = [0usize; DELIMITER_CANDIDATES.len()];
    let mut quoted = false;
    for byte in header.bytes() {
        if byte == b'"' {
            quoted = !quoted;
            continue;
        }
        if quoted {
            continue;
        }
        if let Some(idx) = DELIMITER_CANDIDATES.iter().position(|c| *c == byte) {
            counts[idx] += 1;
        }
    }
    counts
        .iter()
        .enumerate()
        .filter(|(_, count)| **count > 0)
        .max_by_key(|(idx, count)| (**count, std::cmp::Reverse(*idx)))
        .map(|(idx, _)| DELIMITER_CANDIDATES[idx])
        .unwrap_or(b',')
}

pub fn parse_table(content: &str) -> Result<Table, TableError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(sniff_delimiter(content))
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    Ok(Table::new(headers, rows))
}

pub fn read_table(path: &Path) -> Result<Table, TableError> {
    let content = fs::read_to_string(path)?;
    parse_table(&content)
}

/// Load every record of an output table; a missing file is an empty table.
pub fn read_records(path: &Path) -> Result<Vec<ResolutionRecord>, TableError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let table = read_table(path)?;
    let missing = |column| TableError::MissingColumn {
        path: path.display().to_string(),
        column,
    };
    let query = table
        .column_index(&[QUERY_COLUMN])
        .ok_or_else(|| missing(QUERY_COLUMN))?;
    let url = table
        .column_index(&[URL_COLUMN])
        .ok_or_else(|| missing(URL_COLUMN))?;

    Ok((0..table.len())
        .map(|row| ResolutionRecord::resolved(table.cell(row, query), table.cell(row, url)))
        .collect())
}

fn encode_rows<'a, I>(rows: I) -> Result<Vec<u8>, TableError>
where
    I: IntoIterator<Item = Vec<&'a str>>,
{
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    for row in rows {
        writer.write_record(row)?;
    }
    writer
        .into_inner()
        .map_err(|err| TableError::Io(err.into_error()))
}

/// Append records to the `query,url` output table, creating it with a header.
pub fn append_records(path: &Path, records: &[ResolutionRecord]) -> Result<(), TableError> {
    if records.is_empty() {
        return Ok(());
    }
    let header = encode_rows([vec![QUERY_COLUMN, URL_COLUMN]])?;
    let body = encode_rows(
        records
            .iter()
            .map(|record| vec![record.query.as_str(), record.url.as_str()]),
    )?;
    persist::append(path, &header, &body)?;
    Ok(())
}

/// Rewrite the one-column failed table so it holds exactly `queries`.
pub fn write_failed(path: &Path, queries: &[String]) -> Result<(), TableError> {
    let content = encode_rows(
        std::iter::once(vec![QUERY_COLUMN]).chain(queries.iter().map(|q| vec![q.as_str()])),
    )?;
    persist::write_atomic(path, &content)?;
    Ok(())
}
