//! Zip extraction of the input tree and packaging of the clean output tree

use crate::error::{Error, Result};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

/// Extract `archive` into `dest`.
///
/// Every failure maps to [`Error::Extraction`]. Entries whose names would
/// escape `dest` are rejected by the zip reader.
pub fn extract_archive<P: AsRef<Path>, Q: AsRef<Path>>(archive: P, dest: Q) -> Result<()> {
    let archive = archive.as_ref();
    let dest = dest.as_ref();
    let extraction_err = |message: String| Error::Extraction {
        path: archive.to_path_buf(),
        message,
    };

    let file = File::open(archive).map_err(|e| extraction_err(e.to_string()))?;
    let mut zip =
        ZipArchive::new(BufReader::new(file)).map_err(|e| extraction_err(e.to_string()))?;

    fs::create_dir_all(dest).map_err(|e| extraction_err(e.to_string()))?;
    zip.extract(dest).map_err(|e| extraction_err(e.to_string()))?;

    debug!("extracted {} entries from {}", zip.len(), archive.display());
    Ok(())
}

/// Write every file under `root` into a new zip at `output`.
///
/// Entry names are `/`-separated paths relative to `root`, added in sorted
/// order. Returns the number of files written.
pub fn package_directory<P: AsRef<Path>, Q: AsRef<Path>>(root: P, output: Q) -> Result<usize> {
    let root = root.as_ref();
    let output = output.as_ref();
    let archive_err = |e: zip::result::ZipError| Error::Archive {
        path: output.to_path_buf(),
        source: e,
    };

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let file = File::create(output).map_err(|e| Error::FileWrite {
        path: output.to_path_buf(),
        source: e,
    })?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let mut count = 0;
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        zip.start_file(name.as_str(), options).map_err(archive_err)?;
        let mut source = File::open(entry.path()).map_err(|e| Error::FileRead {
            path: entry.path().to_path_buf(),
            source: e,
        })?;
        io::copy(&mut source, &mut zip)?;
        count += 1;
    }

    zip.finish().map_err(archive_err)?;
    debug!("packaged {} files into {}", count, output.display());
    Ok(count)
}
