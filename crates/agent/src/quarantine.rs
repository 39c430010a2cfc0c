// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Quarantine tree management.
//!
//! Suspected files move into a subtree under the quarantine root that
//! mirrors their original location, so restores are unambiguous and
//! files from different volumes cannot collide.

use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::{info, warn};

/// Manages one quarantine root.
#[derive(Debug, Clone)]
pub struct Quarantine {
    root: PathBuf,
}

impl Quarantine {
    /// Create the manager, ensuring the root directory exists.
    pub fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Move a file into quarantine, returning its new path.
    ///
    /// Rename first; an explicit cross-device failure falls back to
    /// copy-then-delete so quarantines across mount points still work.
    pub fn quarantine_file(&self, path: &Path) -> io::Result<PathBuf> {
        let destination = self.root.join(relative_tree_path(path));
        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent)?;
        }

        match std::fs::rename(path, &destination) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
                std::fs::copy(path, &destination)?;
                std::fs::remove_file(path)?;
            }
            Err(e) => return Err(e),
        }

        info!(from = %path.display(), to = %destination.display(), "quarantined");
        Ok(destination)
    }

    /// Permanently delete a quarantined file.
    pub fn delete_quarantined(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)?;
        info!(path = %path.display(), "deleted from quarantine");
        Ok(())
    }

    /// Move a quarantined file back to its original path.
    pub fn restore_file(&self, quarantine_path: &Path, original_path: &Path) -> io::Result<()> {
        if let Some(parent) = original_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        match std::fs::rename(quarantine_path, original_path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
                std::fs::copy(quarantine_path, original_path)?;
                std::fs::remove_file(quarantine_path)?;
            }
            Err(e) => {
                warn!(error = %e, path = %quarantine_path.display(), "restore failed");
                return Err(e);
            }
        }
        info!(from = %quarantine_path.display(), to = %original_path.display(), "restored");
        Ok(())
    }
}

/// A source path as a relative subtree: root and drive prefixes are
/// stripped so `/home/u/x.py` lands at `<root>/home/u/x.py`.
fn relative_tree_path(path: &Path) -> PathBuf {
    path.components()
        .filter(|component| {
            !matches!(component, Component::RootDir | Component::Prefix(_) | Component::CurDir)
        })
        .collect()
}

#[cfg(test)]
#[path = "quarantine_tests.rs"]
mod tests;
