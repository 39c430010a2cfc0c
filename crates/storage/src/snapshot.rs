// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot persistence for the table document.
//!
//! The full table set is written to a temp file and renamed over the
//! previous snapshot; the previous snapshot rotates into `.bak` files
//! so a torn write never loses the last good state.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Current snapshot schema version
pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

/// Errors that can occur in snapshot operations
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u32),
}

/// On-disk envelope around the table document.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot<T> {
    /// Schema version for migrations
    #[serde(rename = "v")]
    version: u32,
    tables: T,
    /// When this snapshot was written
    created_at: DateTime<Utc>,
}

const MAX_BAK_FILES: u32 = 3;

/// Pick the next `.bak` / `.bak.N` path, rotating older backups out.
///
/// Keeps up to [`MAX_BAK_FILES`] backups: `.bak`, `.bak.2`, `.bak.3`.
/// The oldest backup is removed when the limit is reached.
fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| {
        if n == 1 {
            path.with_extension("bak")
        } else {
            path.with_extension(format!("bak.{n}"))
        }
    };

    // Remove the oldest if at capacity
    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = fs::remove_file(&oldest);
    }

    // Shift existing backups up by one
    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }

    bak(1)
}

/// Write the table document atomically, rotating the previous snapshot
/// into the backup chain.
pub(crate) fn save<T: Serialize>(path: &Path, tables: &T) -> Result<(), SnapshotError> {
    let snapshot =
        Snapshot { version: CURRENT_SNAPSHOT_VERSION, tables, created_at: Utc::now() };
    let bytes = serde_json::to_vec(&snapshot)?;

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, &bytes)?;

    if path.exists() {
        let _ = fs::rename(path, rotate_bak_path(path));
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Load the table document, or `None` when no snapshot exists yet.
pub(crate) fn load<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, SnapshotError> {
    if !path.exists() {
        return Ok(None);
    }
    let bytes = fs::read(path)?;
    let snapshot: Snapshot<T> = serde_json::from_slice(&bytes)?;
    if snapshot.version > CURRENT_SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion(snapshot.version));
    }
    Ok(Some(snapshot.tables))
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
