//! CSV writer for compiled pairs and directory masters

use crate::error::{Error, Result};
use crate::parser::UTF8_BOM;
use crate::table::Table;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write a table to `path`, creating parent directories as needed.
///
/// With `bom` set the file starts with a UTF-8 byte-order mark so spreadsheet
/// tools pick the right encoding.
pub fn write_csv<P: AsRef<Path>>(table: &Table, path: P, bom: bool) -> Result<()> {
    let path = path.as_ref();
    let write_err = |e: std::io::Error| Error::FileWrite {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }

    let file = File::create(path).map_err(write_err)?;
    let mut out = BufWriter::new(file);
    if bom {
        out.write_all(UTF8_BOM).map_err(write_err)?;
    }

    write_records(table, &mut out).map_err(|e| Error::Csv {
        path: path.to_path_buf(),
        source: e,
    })?;

    out.flush().map_err(write_err)?;
    Ok(())
}

fn write_records<W: Write>(table: &Table, out: W) -> std::result::Result<(), csv::Error> {
    let mut writer = csv::WriterBuilder::new().from_writer(out);

    writer.write_record(table.columns.iter().map(|c| c.name.as_str()))?;
    for row in &table.rows {
        writer.write_record(row.cells.iter().map(|c| c.to_string_value()))?;
    }

    writer.flush()?;
    Ok(())
}
