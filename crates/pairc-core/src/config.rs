//! Run configuration, persisted as JSON

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// File naming convention that assigns scanned files to a pair role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairingConfig {
    /// Stem suffix of detail files (`<base>_e_detail.csv`)
    pub detail_suffix: String,
    /// Stem suffix of supplement files (`<base>_e_sup.csv`)
    pub supplement_suffix: String,
    /// File extension without the dot
    pub extension: String,
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            detail_suffix: "_e_detail".to_string(),
            supplement_suffix: "_e_sup".to_string(),
            extension: "csv".to_string(),
        }
    }
}

/// Settings for one compile run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pairing: PairingConfig,
    /// Column the directory master is numerically sorted by
    pub sort_column: String,
    /// Stem suffix of the per-pair output (`<base>_COMPILED.csv`)
    pub compiled_pair_suffix: String,
    /// Stem suffix of the directory master (`<dir>_compiled_file.<ext>`)
    pub master_suffix: String,
    /// Prefix written tables with a UTF-8 byte-order mark
    pub write_bom: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pairing: PairingConfig::default(),
            sort_column: "PART_NO".to_string(),
            compiled_pair_suffix: "_COMPILED".to_string(),
            master_suffix: "_compiled_file".to_string(),
            write_bom: true,
        }
    }
}

impl Config {
    /// Load a config file from JSON
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| Error::FileRead {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    /// Save the config file to JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// File name of the compiled output for one pair
    pub fn compiled_pair_file_name(&self, base: &str) -> String {
        format!(
            "{}{}.{}",
            base, self.compiled_pair_suffix, self.pairing.extension
        )
    }

    /// File name of a directory's master table, with the same extension
    /// as the inputs it was built from
    pub fn master_file_name(&self, directory_name: &str) -> String {
        format!(
            "{}{}.{}",
            directory_name, self.master_suffix, self.pairing.extension
        )
    }
}
