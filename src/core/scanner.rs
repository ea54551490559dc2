//! Recursive discovery of candidate executables
//!
//! Scanning is best-effort below the root: entries that cannot be read are
//! skipped and logged, while a root that cannot be enumerated aborts the scan.

use crate::core::error::{Error, Result};
use crate::core::glob::GlobPattern;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// A file found under the scan root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    pub full_path: PathBuf,
    pub file_name: String,
}

/// Fails with [`Error::InvalidPath`] unless `root` is an existing directory.
pub fn validate_root(root: &Path) -> Result<()> {
    if root.is_dir() {
        Ok(())
    } else {
        Err(Error::InvalidPath {
            path: root.to_path_buf(),
        })
    }
}

/// Lists files under `root` whose names match any of `extensions`.
///
/// Each glob is walked separately and the results are concatenated in glob
/// order, so a file matching two globs is returned twice.
///
/// # Errors
///
/// - [`Error::InvalidPath`] if `root` is not a directory
/// - [`Error::Scan`] if `root` itself cannot be listed
/// - [`Error::Validation`] if a glob is malformed
pub fn scan(root: &Path, extensions: &[String]) -> Result<Vec<FileCandidate>> {
    validate_root(root)?;

    // Surface root-level permission and I/O failures before walking
    std::fs::read_dir(root).map_err(|source| Error::Scan {
        path: root.to_path_buf(),
        source,
    })?;

    let patterns = extensions
        .iter()
        .map(|e| GlobPattern::new(e))
        .collect::<Result<Vec<_>>>()?;

    let mut candidates = Vec::new();
    for pattern in &patterns {
        let before = candidates.len();
        collect_matches(root, pattern, &mut candidates)?;
        debug!(
            "Glob '{}' matched {} file(s) under {}",
            pattern.as_str(),
            candidates.len() - before,
            root.display()
        );
    }

    Ok(candidates)
}

fn collect_matches(
    root: &Path,
    pattern: &GlobPattern,
    out: &mut Vec<FileCandidate>,
) -> Result<()> {
    for entry in WalkDir::new(root).min_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(Error::Scan {
                    path: root.to_path_buf(),
                    source: e.into(),
                });
            }
            Err(e) => {
                debug!("Skipping unreadable entry: {e}");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let Some(file_name) = entry.file_name().to_str() else {
            debug!("Skipping non-UTF-8 file name: {}", entry.path().display());
            continue;
        };

        if pattern.matches(file_name) {
            out.push(FileCandidate {
                file_name: file_name.to_string(),
                full_path: entry.into_path(),
            });
        }
    }
    Ok(())
}
