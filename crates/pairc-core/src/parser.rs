//! CSV parser for detail, supplement and compiled table files

use crate::error::{Error, Result};
use crate::table::{CellValue, Column, Row, Table};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// UTF-8 byte-order mark, written by [`crate::writer`] and tolerated on read
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Parse a CSV file into a Table
pub fn parse_csv<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_csv_bytes(&bytes, path.to_path_buf())
}

/// Parse CSV from a string (useful for testing)
pub fn parse_csv_str(content: &str, source_name: &str) -> Result<Table> {
    parse_csv_bytes(content.as_bytes(), PathBuf::from(source_name))
}

fn parse_csv_bytes(bytes: &[u8], path: PathBuf) -> Result<Table> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // Short rows are padded below; long rows are rejected
        .from_reader(bytes);

    let headers = csv_reader.headers().map_err(|e| Error::Csv {
        path: path.clone(),
        source: e,
    })?;

    let columns: Vec<Column> = dedupe_headers(headers.iter())
        .into_iter()
        .enumerate()
        .map(|(i, name)| Column::new(name, i))
        .collect();

    if columns.is_empty() {
        return Err(Error::CsvParse {
            path,
            message: "no columns found in CSV".to_string(),
        });
    }

    let mut rows = Vec::new();
    for (row_idx, result) in csv_reader.records().enumerate() {
        let record = result.map_err(|e| Error::Csv {
            path: path.clone(),
            source: e,
        })?;

        if record.len() > columns.len() {
            return Err(Error::CsvParse {
                path,
                message: format!(
                    "row {} has {} fields, header has {}",
                    row_idx + 1,
                    record.len(),
                    columns.len()
                ),
            });
        }

        let mut cells: Vec<CellValue> = record.iter().map(CellValue::parse).collect();
        cells.resize(columns.len(), CellValue::Empty);

        rows.push(Row::new(cells));
    }

    Ok(Table {
        columns,
        rows,
        source_path: path,
    })
}

/// Make header names unique by suffixing repeats with `.1`, `.2`, ...
fn dedupe_headers<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();

    for name in names {
        let mut candidate = name.to_string();
        let mut n = 1;
        while seen.contains(&candidate) {
            candidate = format!("{}.{}", name, n);
            n += 1;
        }
        seen.insert(candidate.clone());
        out.push(candidate);
    }

    out
}
