// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ingests agent scan results into the pending-review queue.
//!
//! The collector is the single writer of pending rows: each ingest
//! atomically replaces the previous finding set for that
//! `(task_id, agent_ip)` pair. It also keeps an in-memory per-task view
//! for the `/scan-results` endpoint.

use std::collections::HashMap;

use chrono::DateTime;
use parking_lot::Mutex;

use sweep_core::{record_id, PendingFile};
use sweep_storage::{Store, StoreError};
use sweep_wire::FileFinding;

/// Scan-result collector.
#[derive(Default)]
pub struct Collector {
    /// task_id → agent_ip → findings, most recent ingest wins
    results: Mutex<HashMap<String, HashMap<String, Vec<FileFinding>>>>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the finding set for `(task_id, agent_ip)`, replacing any
    /// previous set from the same scan.
    pub fn ingest(
        &self,
        store: &Store,
        agent_ip: &str,
        task_id: &str,
        findings: &[FileFinding],
        now_ms: u64,
    ) -> Result<(), StoreError> {
        let rows = findings.iter().map(|f| pending_row(task_id, agent_ip, f, now_ms)).collect();
        store.replace_pending_files(task_id, agent_ip, rows)?;

        self.results
            .lock()
            .entry(task_id.to_string())
            .or_default()
            .insert(agent_ip.to_string(), findings.to_vec());
        Ok(())
    }

    /// All agent results for a task.
    pub fn task_results(&self, task_id: &str) -> HashMap<String, Vec<FileFinding>> {
        self.results.lock().get(task_id).cloned().unwrap_or_default()
    }
}

fn pending_row(task_id: &str, agent_ip: &str, finding: &FileFinding, now_ms: u64) -> PendingFile {
    let path = finding.filepath.clone();
    let filename = if !finding.filename.is_empty() {
        finding.filename.clone()
    } else {
        match path.rsplit(['/', '\\']).next() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => "unknown".to_string(),
        }
    };
    let created_at_ms = DateTime::parse_from_rfc3339(&finding.modified_time)
        .map(|t| t.timestamp_millis() as u64)
        .unwrap_or(now_ms);

    PendingFile {
        id: record_id(task_id, agent_ip, &finding.file_hash, &path),
        task_id: task_id.to_string(),
        agent_ip: agent_ip.to_string(),
        file_hash: finding.file_hash.clone(),
        filename,
        path,
        language: (!finding.language.is_empty()).then(|| finding.language.clone()),
        confidence: finding.confidence,
        reason: finding.reason.clone(),
        created_at_ms,
    }
}

#[cfg(test)]
#[path = "collector_tests.rs"]
mod tests;
