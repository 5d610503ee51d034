//! Drives a full run: scan, resolve, merge each pair, aggregate each
//! directory, report, and (for archive input) package.

use crate::aggregator::{aggregate_directory, SortOutcome};
use crate::archive::{extract_archive, package_directory};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::merger::{compile_pair, CompiledPair};
use crate::report::{RunReport, Summary, SummaryRow, Warning};
use crate::resolver::{resolve, DirectoryPlan};
use crate::scanner::{effective_root, scan_tree};
use chrono::Utc;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Per-run results, threaded through each directory step
#[derive(Debug, Default)]
struct RunState {
    summary: Summary,
    warnings: Vec<Warning>,
    masters: Vec<PathBuf>,
    /// Output name -> times claimed
    claimed_names: HashMap<String, usize>,
}

impl RunState {
    fn warn(&mut self, warning: Warning) {
        warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// Reserve the output name for a directory, suffixing repeats with `_<n>`
    fn claim_name(&mut self, plan: &DirectoryPlan) -> String {
        let count = self.claimed_names.entry(plan.name.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            return plan.name.clone();
        }

        let mut n = *count;
        let renamed = loop {
            let candidate = format!("{}_{}", plan.name, n);
            if !self.claimed_names.contains_key(&candidate) {
                break candidate;
            }
            n += 1;
        };
        self.claimed_names.insert(renamed.clone(), 1);
        self.warn(Warning::NameCollision {
            directory: plan.path.clone(),
            name: plan.name.clone(),
            renamed_to: renamed.clone(),
        });
        renamed
    }
}

/// Compile every pair under `root` and write directory masters to `output_root`
pub fn compile_tree<P: AsRef<Path>, Q: AsRef<Path>>(
    root: P,
    output_root: Q,
    config: &Config,
) -> Result<RunReport> {
    let root = root.as_ref();
    let output_root = output_root.as_ref();
    let started_at = Utc::now();

    info!("Scanning {} for matching pairs", root.display());
    let scan = scan_tree(root, &config.pairing)?;
    let resolution = resolve(&scan);
    info!(
        "Grouping complete. Found {} unique pairs across {} folders",
        resolution.total_pairs,
        resolution.directories.len()
    );

    fs::create_dir_all(output_root).map_err(|e| Error::FileWrite {
        path: output_root.to_path_buf(),
        source: e,
    })?;

    let mut state = RunState::default();
    let total = resolution.directories.len();
    for (i, plan) in resolution.directories.iter().enumerate() {
        info!("[{}/{}] Processing folder: {}", i + 1, total, plan.name);
        compile_directory(plan, output_root, config, &mut state);
    }

    info!(
        "{} folders with pairs, {} rows in all master files",
        state.summary.directories_with_pairs(),
        state.summary.total_master_rows()
    );

    Ok(RunReport {
        started_at,
        finished_at: Utc::now(),
        total_pairs: resolution.total_pairs,
        summary: state.summary,
        warnings: state.warnings,
        masters: state.masters,
    })
}

/// Merge each pair of one directory, then aggregate the results.
///
/// Never fails: skipped pairs and an unwritable master become warnings.
fn compile_directory(
    plan: &DirectoryPlan,
    output_root: &Path,
    config: &Config,
    state: &mut RunState,
) {
    let mut compiled: Vec<CompiledPair> = Vec::new();

    for pair in &plan.pairs {
        match compile_pair(pair, config) {
            Ok(result) => {
                info!(
                    "  - Pair {}: compiled -> {} ({} rows)",
                    pair.base,
                    config.compiled_pair_file_name(&pair.base),
                    result.row_count()
                );
                compiled.push(result);
            }
            Err(e) => state.warn(Warning::PairSkipped {
                directory: plan.name.clone(),
                base: pair.base.clone(),
                reason: e.to_string(),
            }),
        }
    }

    if compiled.is_empty() {
        info!("  No complete pairs found in {} to create a master file", plan.name);
        state.summary.push(SummaryRow {
            directory: plan.name.clone(),
            pairs_found: plan.pairs.len(),
            master_rows: 0,
        });
        return;
    }

    let name = state.claim_name(plan);
    let master_rows = match aggregate_directory(&name, &compiled, output_root, config) {
        Ok(Some(master)) => {
            match master.sort {
                SortOutcome::MissingKey => state.warn(Warning::MissingSortKey {
                    directory: name.clone(),
                    column: config.sort_column.clone(),
                }),
                SortOutcome::Sorted { unsortable } if unsortable > 0 => {
                    state.warn(Warning::UnsortableValues {
                        directory: name.clone(),
                        column: config.sort_column.clone(),
                        count: unsortable,
                    })
                }
                SortOutcome::Sorted { .. } => {
                    info!("  - Sorted master file by '{}'", config.sort_column)
                }
            }
            info!(
                "  Folder master: created {} ({} rows)",
                config.master_file_name(&name),
                master.row_count
            );
            let relative = master
                .path
                .strip_prefix(output_root)
                .unwrap_or(&master.path)
                .to_path_buf();
            state.masters.push(relative);
            master.row_count
        }
        Ok(None) => 0,
        Err(e) => {
            state.warn(Warning::DirectoryFailed {
                directory: name.clone(),
                reason: e.to_string(),
            });
            0
        }
    };

    state.summary.push(SummaryRow {
        directory: name,
        pairs_found: plan.pairs.len(),
        master_rows,
    });
}

/// Run the whole pipeline on a zip archive and write the clean result zip.
///
/// Scratch files live in a temporary directory that is removed on every
/// return path. Pair and directory failures become warnings; an unreadable
/// archive aborts with [`Error::Extraction`].
pub fn run_archive<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    config: &Config,
) -> Result<RunReport> {
    let input = input.as_ref();
    let output = output.as_ref();

    let scratch = tempfile::Builder::new().prefix("pairc-").tempdir()?;
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "input".to_string());
    let extract_dir = scratch.path().join("extracted").join(stem);
    let clean_dir = scratch.path().join("clean_output");

    info!("Extracting {}", input.display());
    extract_archive(input, &extract_dir)?;
    let root = effective_root(&extract_dir)?;

    let report = compile_tree(&root, &clean_dir, config)?;

    let count = package_directory(&clean_dir, output)?;
    info!("Packaged {} master files into {}", count, output.display());

    Ok(report)
}
