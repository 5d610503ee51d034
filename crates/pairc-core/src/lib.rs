//! pairc-core: Core library for compiling paired table files
//!
//! This library provides functionality to:
//! - Scan a directory tree for `<base>_e_detail.csv` / `<base>_e_sup.csv` files
//! - Resolve them into complete detail/supplement pairs per directory
//! - Merge each pair into one compiled table
//! - Aggregate each directory's compiled pairs into a master sorted by `PART_NO`
//! - Summarize the run and package the masters into a zip archive

pub mod aggregator;
pub mod archive;
pub mod config;
pub mod error;
pub mod merger;
pub mod parser;
pub mod pipeline;
pub mod report;
pub mod resolver;
pub mod scanner;
pub mod table;
pub mod writer;

pub use aggregator::{aggregate_directory, sort_by_numeric_key, DirectoryMaster, SortOutcome};
pub use archive::{extract_archive, package_directory};
pub use config::{Config, PairingConfig};
pub use error::{Error, Result};
pub use merger::{compile_pair, concat_tables, CompiledPair};
pub use parser::{parse_csv, parse_csv_str};
pub use pipeline::{compile_tree, run_archive};
pub use report::{RunReport, Summary, SummaryRow, Warning};
pub use resolver::{resolve, CompletePair, DirectoryPlan, Resolution};
pub use scanner::{effective_root, scan_tree, PairGroup, RawFile, Role, ScanResult, ScannedDirectory};
pub use table::{CellValue, Column, Row, Table};
pub use writer::write_csv;
