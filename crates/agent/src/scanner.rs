// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Directory walk producing candidate files for analysis.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use walkdir::WalkDir;

use sweep_wire::DateFilter;

/// Walk the configured directories, optionally filtering by modified
/// time. Unreadable entries are skipped, not fatal.
pub fn scan(dirs: &[PathBuf], date_filter: Option<&DateFilter>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for dir in dirs {
        if !dir.exists() {
            warn!(dir = %dir.display(), "scan directory does not exist");
            continue;
        }
        info!(dir = %dir.display(), "scanning directory");

        for entry in WalkDir::new(dir).into_iter() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(filter) = date_filter {
                if !within_window(entry.path(), filter) {
                    continue;
                }
            }
            files.push(entry.into_path());
        }
    }

    info!(count = files.len(), "files to analyze");
    files
}

/// Modified-time check; files whose mtime cannot be read are skipped
/// when a filter is active.
fn within_window(path: &Path, filter: &DateFilter) -> bool {
    let modified = match std::fs::metadata(path).and_then(|meta| meta.modified()) {
        Ok(time) => DateTime::<Utc>::from(time),
        Err(_) => return false,
    };
    if let Some(start) = filter.start {
        if modified < start {
            return false;
        }
    }
    if let Some(end) = filter.end {
        if modified > end {
            return false;
        }
    }
    true
}

#[cfg(test)]
#[path = "scanner_tests.rs"]
mod tests;
