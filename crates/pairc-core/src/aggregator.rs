//! Directory aggregator: builds the sorted master table for one directory

use crate::config::Config;
use crate::error::Result;
use crate::merger::{concat_tables, CompiledPair};
use crate::table::{compare_sort_keys, CellValue, Row, Table};
use crate::writer::write_csv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// What happened when sorting a master table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum SortOutcome {
    /// Rows were sorted; `unsortable` rows had no numeric key and were placed last
    Sorted { unsortable: usize },
    /// The sort column does not exist; rows keep concatenation order
    MissingKey,
}

/// A directory master table, written to the clean output tree
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryMaster {
    pub name: String,
    pub path: PathBuf,
    pub pair_count: usize,
    pub row_count: usize,
    pub sort: SortOutcome,
}

/// Stable-sort rows ascending by the numeric value of `column`.
///
/// Cells without a numeric interpretation (text, empty, NaN) go after every
/// numeric cell and keep their relative order. Sorting twice changes nothing.
pub fn sort_by_numeric_key(table: &mut Table, column: &str) -> SortOutcome {
    let Some(index) = table.find_column(column).map(|c| c.index) else {
        return SortOutcome::MissingKey;
    };

    let mut keyed: Vec<(Option<f64>, Row)> = table
        .rows
        .drain(..)
        .map(|row| {
            let key = row.get(index).and_then(CellValue::as_number);
            (key, row)
        })
        .collect();
    let unsortable = keyed.iter().filter(|(key, _)| key.is_none()).count();

    keyed.sort_by(|a, b| compare_sort_keys(a.0, b.0));
    table.rows = keyed.into_iter().map(|(_, row)| row).collect();

    SortOutcome::Sorted { unsortable }
}

/// Concatenate a directory's compiled pairs, sort, and write the master to
/// `<output_root>/<name>/<name>_compiled_file.<ext>`.
///
/// Returns `None` without writing anything when there are no compiled pairs.
pub fn aggregate_directory(
    name: &str,
    pairs: &[CompiledPair],
    output_root: &Path,
    config: &Config,
) -> Result<Option<DirectoryMaster>> {
    if pairs.is_empty() {
        return Ok(None);
    }

    let path = output_root.join(name).join(config.master_file_name(name));
    let tables: Vec<&Table> = pairs.iter().map(|p| &p.table).collect();
    let mut master = concat_tables(&tables, path.clone());

    let sort = sort_by_numeric_key(&mut master, &config.sort_column);
    write_csv(&master, &path, config.write_bom)?;
    debug!("wrote master {} ({} rows)", path.display(), master.row_count());

    Ok(Some(DirectoryMaster {
        name: name.to_string(),
        path,
        pair_count: pairs.len(),
        row_count: master.row_count(),
        sort,
    }))
}
