//! Input and output path resolution for the CLI
//!
//! Expands the `--input` arguments into a list of export files and makes sure
//! the output directory exists before any transcoding starts.

use crate::constants::INPUT_EXTENSION;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Expand files, directories and glob patterns into export paths.
///
/// Directories contribute every `*.txt` file below them, sorted by path.
/// Plain paths that do not exist are passed through so that the transcoder
/// reports them per file. Duplicates are dropped, first occurrence wins.
pub fn resolve_inputs(arguments: &[String]) -> Result<Vec<PathBuf>> {
    let mut resolved = Vec::new();

    for argument in arguments {
        let path = Path::new(argument);

        if path.is_dir() {
            resolved.extend(scan_directory(path)?);
        } else if path.exists() || !is_glob_pattern(argument) {
            resolved.push(path.to_path_buf());
        } else {
            let matches = expand_glob(argument)?;
            if matches.is_empty() {
                warn!("No files match pattern '{}'", argument);
            }
            resolved.extend(matches);
        }
    }

    let mut seen = HashSet::new();
    resolved.retain(|path| seen.insert(path.clone()));
    debug!("Resolved {} input files", resolved.len());

    Ok(resolved)
}

/// Create the output directory if needed and return it
pub fn prepare_output_dir(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create output directory {}", path.display()))?;
        debug!("Created output directory: {}", path.display());
    }
    Ok(path.to_path_buf())
}

fn scan_directory(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry
            .with_context(|| format!("Failed to walk input directory {}", dir.display()))?;
        if entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(INPUT_EXTENSION))
        {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in glob::glob(pattern).with_context(|| format!("Invalid glob pattern '{}'", pattern))? {
        let path = entry.with_context(|| format!("Failed to read match of '{}'", pattern))?;
        if path.is_file() {
            files.push(path);
        }
    }
    Ok(files)
}

fn is_glob_pattern(argument: &str) -> bool {
    argument.contains(['*', '?', '['])
}
