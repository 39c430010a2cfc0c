// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pending-file rows: scan findings awaiting an admin verdict.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Deterministic pending-row identifier: `task_id|agent_ip|file_hash`.
///
/// Findings without a content hash substitute the SHA-256 of
/// `"{task_id}|{agent_ip}|{path}"` so the id stays stable across
/// repeated scans of the same file.
pub fn record_id(task_id: &str, agent_ip: &str, file_hash: &str, path: &str) -> String {
    let hash = if file_hash.is_empty() {
        let mut hasher = Sha256::new();
        hasher.update(format!("{task_id}|{agent_ip}|{path}").as_bytes());
        format!("{:x}", hasher.finalize())
    } else {
        file_hash.to_string()
    };
    format!("{task_id}|{agent_ip}|{hash}")
}

/// A scan finding queued for admin review.
///
/// The row carries no explicit state: existence means "pending". Verdicts
/// and outcomes live in the audit log and the deletion-report log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingFile {
    /// Deterministic record id (`record_id`)
    pub id: String,
    pub task_id: String,
    pub agent_ip: String,
    pub file_hash: String,
    pub filename: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub confidence: f64,
    pub reason: String,
    pub created_at_ms: u64,
}

#[cfg(test)]
#[path = "pending_tests.rs"]
mod tests;
