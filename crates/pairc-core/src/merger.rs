//! Pair merger: row-wise concatenation of detail and supplement tables

use crate::config::Config;
use crate::error::Result;
use crate::parser::parse_csv;
use crate::resolver::CompletePair;
use crate::table::{CellValue, Column, Row, Table};
use crate::writer::write_csv;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use tracing::debug;

/// A merged pair, already written next to its sources
#[derive(Debug, Clone, Serialize)]
pub struct CompiledPair {
    pub base: String,
    /// Where the compiled table was written
    pub path: PathBuf,
    pub detail_rows: usize,
    pub supplement_rows: usize,
    #[serde(skip)]
    pub table: Table,
}

impl CompiledPair {
    pub fn row_count(&self) -> usize {
        self.table.row_count()
    }
}

/// Concatenate tables row-wise.
///
/// Columns are the union of all inputs in first-seen order; cells for columns
/// a table lacks are `Empty`. Row order within each input is preserved.
/// Inputs are borrowed; only the cells land in the new table.
pub fn concat_tables(tables: &[&Table], source_path: PathBuf) -> Table {
    let mut column_names: Vec<&str> = Vec::new();
    let mut seen_columns: HashSet<&str> = HashSet::new();

    for table in tables {
        for col in &table.columns {
            if seen_columns.insert(col.name.as_str()) {
                column_names.push(col.name.as_str());
            }
        }
    }

    let columns: Vec<Column> = column_names
        .iter()
        .enumerate()
        .map(|(i, name)| Column::new(name.to_string(), i))
        .collect();

    let total_rows = tables.iter().map(|t| t.row_count()).sum();
    let mut rows: Vec<Row> = Vec::with_capacity(total_rows);

    for table in tables {
        // Unified index -> this table's index
        let table_col_map: HashMap<&str, usize> = table
            .columns
            .iter()
            .map(|c| (c.name.as_str(), c.index))
            .collect();
        let mapping: Vec<Option<usize>> = columns
            .iter()
            .map(|c| table_col_map.get(c.name.as_str()).copied())
            .collect();

        for row in &table.rows {
            let cells = mapping
                .iter()
                .map(|idx| {
                    idx.and_then(|i| row.cells.get(i))
                        .cloned()
                        .unwrap_or(CellValue::Empty)
                })
                .collect();
            rows.push(Row::new(cells));
        }
    }

    Table {
        columns,
        rows,
        source_path,
    }
}

/// Load, concatenate and persist one complete pair as `<base>_COMPILED.<ext>`
///
/// Fails if either side cannot be parsed; nothing is written in that case.
pub fn compile_pair(pair: &CompletePair, config: &Config) -> Result<CompiledPair> {
    let detail = parse_csv(&pair.detail)?;
    let supplement = parse_csv(&pair.supplement)?;

    let path = pair.directory.join(config.compiled_pair_file_name(&pair.base));
    let (detail_rows, supplement_rows) = (detail.row_count(), supplement.row_count());
    let table = concat_tables(&[&detail, &supplement], path.clone());

    write_csv(&table, &path, config.write_bom)?;
    debug!(
        "compiled pair {} -> {} ({} rows)",
        pair.base,
        path.display(),
        table.row_count()
    );

    Ok(CompiledPair {
        base: pair.base.clone(),
        path,
        detail_rows,
        supplement_rows,
        table,
    })
}
