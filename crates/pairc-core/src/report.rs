//! Run summary and non-fatal warnings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Per-directory counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub directory: String,
    /// Complete pairs found, including ones later skipped for parse errors
    pub pairs_found: usize,
    /// Rows in the directory master, 0 when none was written
    pub master_rows: usize,
}

/// One row per scanned directory, in processing order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub rows: Vec<SummaryRow>,
}

impl Summary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: SummaryRow) {
        self.rows.push(row);
    }

    /// Directories with at least one complete pair
    pub fn directories_with_pairs(&self) -> usize {
        self.rows.iter().filter(|r| r.pairs_found > 0).count()
    }

    /// Sum of master row counts across all directories
    pub fn total_master_rows(&self) -> usize {
        self.rows.iter().map(|r| r.master_rows).sum()
    }

    pub fn find(&self, directory: &str) -> Option<&SummaryRow> {
        self.rows.iter().find(|r| r.directory == directory)
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let width = self
            .rows
            .iter()
            .map(|r| r.directory.len())
            .chain(std::iter::once("Directory".len()))
            .max()
            .unwrap_or(0);

        writeln!(f, "{:<width$}  {:>11}  {:>11}", "Directory", "Pairs Found", "Master Rows")?;
        writeln!(f, "{}", "-".repeat(width + 26))?;
        for row in &self.rows {
            writeln!(
                f,
                "{:<width$}  {:>11}  {:>11}",
                row.directory, row.pairs_found, row.master_rows
            )?;
        }
        Ok(())
    }
}

/// A degradation that was tolerated during the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// One file of a pair could not be loaded; the pair was left out
    PairSkipped {
        directory: String,
        base: String,
        reason: String,
    },
    /// The sort column is absent from a directory master
    MissingSortKey { directory: String, column: String },
    /// Cells of the sort column had no numeric value and were ordered last
    UnsortableValues {
        directory: String,
        column: String,
        count: usize,
    },
    /// Another directory already claimed this output name
    NameCollision {
        directory: PathBuf,
        name: String,
        renamed_to: String,
    },
    /// A directory master could not be written
    DirectoryFailed { directory: String, reason: String },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::PairSkipped {
                directory,
                base,
                reason,
            } => write!(f, "{}: could not process pair '{}': {}", directory, base, reason),
            Warning::MissingSortKey { directory, column } => write!(
                f,
                "{}: '{}' column not found, skipping sort",
                directory, column
            ),
            Warning::UnsortableValues {
                directory,
                column,
                count,
            } => write!(
                f,
                "{}: {} non-numeric '{}' value(s) placed last",
                directory, count, column
            ),
            Warning::NameCollision {
                directory,
                name,
                renamed_to,
            } => write!(
                f,
                "{}: output name '{}' already used, writing as '{}'",
                directory.display(),
                name,
                renamed_to
            ),
            Warning::DirectoryFailed { directory, reason } => {
                write!(f, "{}: could not write master: {}", directory, reason)
            }
        }
    }
}

/// Everything a caller needs after a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Complete pairs found by resolution, before any were skipped
    pub total_pairs: usize,
    pub summary: Summary,
    pub warnings: Vec<Warning>,
    /// Master files written, relative to the output root
    pub masters: Vec<PathBuf>,
}

impl RunReport {
    /// Save the report as JSON
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
