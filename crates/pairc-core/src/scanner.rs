//! Directory scanner for discovering and grouping detail/supplement files

use crate::config::PairingConfig;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Which side of a pair a file provides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Detail,
    Supplement,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Detail => write!(f, "detail"),
            Role::Supplement => write!(f, "supplement"),
        }
    }
}

/// A scanned file that matched one of the role suffixes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFile {
    /// Full path to the file
    pub path: PathBuf,
    /// Containing directory
    pub directory: PathBuf,
    pub role: Role,
    /// File name with the role suffix and extension removed
    pub base: String,
}

/// Files sharing a base key within one directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairGroup {
    pub base: String,
    pub detail: Option<PathBuf>,
    pub supplement: Option<PathBuf>,
}

impl PairGroup {
    fn new(base: String) -> Self {
        Self {
            base,
            ..Default::default()
        }
    }

    /// Both roles are present
    pub fn is_complete(&self) -> bool {
        self.detail.is_some() && self.supplement.is_some()
    }

    fn insert(&mut self, file: RawFile) {
        match file.role {
            Role::Detail => self.detail = Some(file.path),
            Role::Supplement => self.supplement = Some(file.path),
        }
    }
}

/// One directory that holds at least one candidate file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannedDirectory {
    pub path: PathBuf,
    /// Final path component, used to name the directory's outputs
    pub name: String,
    /// Groups keyed by base name
    pub groups: BTreeMap<String, PairGroup>,
}

/// Result of scanning a tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    /// Root that was scanned
    pub root: PathBuf,
    /// Directories with candidate files, sorted by path
    pub directories: Vec<ScannedDirectory>,
    /// Total number of candidate files found
    pub total_files: usize,
}

/// Scan `root` recursively and group candidate files by directory and base key
pub fn scan_tree<P: AsRef<Path>>(root: P, config: &PairingConfig) -> Result<ScanResult> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(Error::NotADirectory(root.to_path_buf()));
    }

    let mut dir_map: BTreeMap<PathBuf, BTreeMap<String, PairGroup>> = BTreeMap::new();
    let mut total_files = 0;

    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let Some(file) = classify(entry.path(), config) else {
            continue;
        };
        debug!("found {} file {}", file.role, file.path.display());

        dir_map
            .entry(file.directory.clone())
            .or_default()
            .entry(file.base.clone())
            .or_insert_with(|| PairGroup::new(file.base.clone()))
            .insert(file);
        total_files += 1;
    }

    let directories = dir_map
        .into_iter()
        .map(|(path, groups)| ScannedDirectory {
            name: directory_name(&path),
            path,
            groups,
        })
        .collect();

    Ok(ScanResult {
        root: root.to_path_buf(),
        directories,
        total_files,
    })
}

/// Match a path against the role suffixes
///
/// Examples with the default convention:
/// - "X_e_detail.csv" -> ("X", Detail)
/// - "X_e_sup.csv" -> ("X", Supplement)
/// - "X_COMPILED.csv" -> None
pub fn classify(path: &Path, config: &PairingConfig) -> Option<RawFile> {
    let file_name = path.file_name()?.to_str()?;
    let stem = file_name.strip_suffix(&format!(".{}", config.extension))?;

    let (base, role) = if let Some(base) = stem.strip_suffix(&config.detail_suffix) {
        (base, Role::Detail)
    } else if let Some(base) = stem.strip_suffix(&config.supplement_suffix) {
        (base, Role::Supplement)
    } else {
        return None;
    };

    if base.is_empty() {
        return None;
    }

    Some(RawFile {
        path: path.to_path_buf(),
        directory: path.parent()?.to_path_buf(),
        role,
        base: base.to_string(),
    })
}

/// Pick the effective root of an extracted archive.
///
/// A single wrapping top-level directory is descended into transparently.
pub fn effective_root<P: AsRef<Path>>(extraction_root: P) -> Result<PathBuf> {
    let extraction_root = extraction_root.as_ref();
    let entries: Vec<fs::DirEntry> = fs::read_dir(extraction_root)
        .map_err(|e| Error::FileRead {
            path: extraction_root.to_path_buf(),
            source: e,
        })?
        .collect::<std::io::Result<_>>()?;

    if let [only] = entries.as_slice() {
        if only.path().is_dir() {
            return Ok(only.path());
        }
    }

    Ok(extraction_root.to_path_buf())
}

fn directory_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "root".to_string())
}
