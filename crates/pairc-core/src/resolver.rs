//! Pair resolution: selects the groups that have both roles present

use crate::scanner::{ScanResult, ScannedDirectory};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A group with both a detail and a supplement file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletePair {
    pub base: String,
    pub directory: PathBuf,
    pub detail: PathBuf,
    pub supplement: PathBuf,
}

/// The merge plan for one directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryPlan {
    pub path: PathBuf,
    pub name: String,
    /// Complete pairs in base-key order
    pub pairs: Vec<CompletePair>,
    /// Base keys missing one of the roles
    pub incomplete: Vec<String>,
}

/// Output of resolving a scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub directories: Vec<DirectoryPlan>,
    /// Complete pairs across all directories
    pub total_pairs: usize,
}

/// Split every scanned directory into complete pairs and leftovers
pub fn resolve(scan: &ScanResult) -> Resolution {
    let directories: Vec<DirectoryPlan> = scan.directories.iter().map(resolve_directory).collect();
    let total_pairs = directories.iter().map(|d| d.pairs.len()).sum();

    Resolution {
        directories,
        total_pairs,
    }
}

/// Resolve the groups of a single directory
pub fn resolve_directory(dir: &ScannedDirectory) -> DirectoryPlan {
    let mut pairs = Vec::new();
    let mut incomplete = Vec::new();

    for (base, group) in &dir.groups {
        match (&group.detail, &group.supplement) {
            (Some(detail), Some(supplement)) => pairs.push(CompletePair {
                base: base.clone(),
                directory: dir.path.clone(),
                detail: detail.clone(),
                supplement: supplement.clone(),
            }),
            _ => incomplete.push(base.clone()),
        }
    }

    DirectoryPlan {
        path: dir.path.clone(),
        name: dir.name.clone(),
        pairs,
        incomplete,
    }
}
