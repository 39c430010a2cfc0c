// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The durable table store.
//!
//! Every public operation locks the table document, applies its change,
//! and persists before returning. Callers that stamp time pass `now_ms`
//! explicitly so tests can drive a fake clock.

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use sweep_core::{
    AgentRow, AgentStatus, AuditEntry, NewAuditEntry, NewReport, PendingFile, QueueStatus,
    QueuedCommand, ReportRow,
};

use crate::snapshot;

/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] snapshot::SnapshotError),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store at {0} is locked by another process")]
    Locked(PathBuf),
}

/// The complete logical table set, persisted as one document.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Tables {
    /// agent_ip → row; BTreeMap keeps `list_agents` ordered by ip
    agents: BTreeMap<String, AgentRow>,
    /// record_id → row; the key is deterministic, so re-ingest coalesces
    pending_files: HashMap<String, PendingFile>,
    delete_queue: Vec<QueuedCommand>,
    task_queue: Vec<QueuedCommand>,
    deletion_reports: Vec<ReportRow>,
    audit_log: Vec<AuditEntry>,
    next_command_id: u64,
    next_report_id: u64,
    next_audit_id: u64,
}

/// Durable store with a process-wide transaction mutex.
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    // NOTE(lifetime): held to maintain the exclusive lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    inner: Mutex<Tables>,
}

impl Store {
    /// Open (or create) the store at `path`.
    ///
    /// Takes an exclusive advisory lock on a sibling `.lock` file; a
    /// second master pointed at the same store fails fast here.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let lock_path = path.with_extension("lock");
        let lock_file = OpenOptions::new().create(true).truncate(false).write(true).open(&lock_path)?;
        if lock_file.try_lock_exclusive().is_err() {
            return Err(StoreError::Locked(path.to_path_buf()));
        }

        let tables = snapshot::load(path)?.unwrap_or_default();
        let store = Self { path: path.to_path_buf(), lock_file, inner: Mutex::new(tables) };

        // Create-on-open keeps `open` idempotent for a fresh directory.
        if !path.exists() {
            let tables = store.inner.lock();
            snapshot::save(&store.path, &*tables)?;
        }
        Ok(store)
    }

    fn save(&self, tables: &Tables) -> Result<(), StoreError> {
        snapshot::save(&self.path, tables)?;
        Ok(())
    }

    // -- agents --

    /// Insert or update an agent row, stamping `last_seen`.
    ///
    /// `client_id` is only overwritten when provided; a heartbeat-driven
    /// status change must not erase the registered identity.
    pub fn upsert_agent(
        &self,
        agent_ip: &str,
        status: AgentStatus,
        client_id: Option<&str>,
        now_ms: u64,
    ) -> Result<(), StoreError> {
        let mut tables = self.inner.lock();
        let row = tables.agents.entry(agent_ip.to_string()).or_insert_with(|| AgentRow {
            agent_ip: agent_ip.to_string(),
            status,
            last_seen_ms: now_ms,
            client_id: None,
        });
        row.status = status;
        row.last_seen_ms = now_ms;
        if let Some(id) = client_id {
            row.client_id = Some(id.to_string());
        }
        self.save(&tables)
    }

    /// Update only the status for a known agent, leaving `last_seen`.
    ///
    /// Used by the inactivity sweep: refreshing `last_seen` there would
    /// make a stale agent look recently seen to the online filter.
    pub fn set_agent_status(&self, agent_ip: &str, status: AgentStatus) -> Result<(), StoreError> {
        let mut tables = self.inner.lock();
        if let Some(row) = tables.agents.get_mut(agent_ip) {
            row.status = status;
            self.save(&tables)?;
        }
        Ok(())
    }

    /// Update only `last_seen` for a known agent.
    pub fn touch_agent(&self, agent_ip: &str, now_ms: u64) -> Result<(), StoreError> {
        let mut tables = self.inner.lock();
        if let Some(row) = tables.agents.get_mut(agent_ip) {
            row.last_seen_ms = now_ms;
            self.save(&tables)?;
        }
        Ok(())
    }

    /// All persisted agents, ordered by `agent_ip`.
    pub fn list_agents(&self) -> Vec<AgentRow> {
        self.inner.lock().agents.values().cloned().collect()
    }

    pub fn get_agent(&self, agent_ip: &str) -> Option<AgentRow> {
        self.inner.lock().agents.get(agent_ip).cloned()
    }

    // -- pending files --

    /// Atomically replace the pending set for `(task_id, agent_ip)`.
    ///
    /// Rows from a previous ingest of the same scan are dropped first;
    /// new rows insert by their deterministic id, so duplicates coalesce.
    pub fn replace_pending_files(
        &self,
        task_id: &str,
        agent_ip: &str,
        rows: Vec<PendingFile>,
    ) -> Result<(), StoreError> {
        let mut tables = self.inner.lock();
        tables
            .pending_files
            .retain(|_, row| !(row.task_id == task_id && row.agent_ip == agent_ip));
        for row in rows {
            tables.pending_files.insert(row.id.clone(), row);
        }
        self.save(&tables)
    }

    /// Pending rows, newest first, optionally filtered by a
    /// case-insensitive substring over filename, path, agent ip, task id,
    /// and language.
    pub fn list_pending_files(&self, search: Option<&str>) -> Vec<PendingFile> {
        let tables = self.inner.lock();
        let needle = search.map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty());

        let mut rows: Vec<PendingFile> = tables
            .pending_files
            .values()
            .filter(|row| match &needle {
                None => true,
                Some(n) => {
                    row.filename.to_lowercase().contains(n)
                        || row.path.to_lowercase().contains(n)
                        || row.agent_ip.to_lowercase().contains(n)
                        || row.task_id.to_lowercase().contains(n)
                        || row
                            .language
                            .as_deref()
                            .unwrap_or("")
                            .to_lowercase()
                            .contains(n)
                }
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms).then(a.id.cmp(&b.id)));
        rows
    }

    pub fn get_pending_by_ids(&self, ids: &[String]) -> Vec<PendingFile> {
        let tables = self.inner.lock();
        ids.iter().filter_map(|id| tables.pending_files.get(id).cloned()).collect()
    }

    pub fn delete_pending_by_ids(&self, ids: &[String]) -> Result<(), StoreError> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut tables = self.inner.lock();
        for id in ids {
            tables.pending_files.remove(id);
        }
        self.save(&tables)
    }

    // -- command queues --

    /// Queue a delete command; a pending row with an identical payload
    /// for the same agent and task is returned as-is instead.
    pub fn enqueue_delete_command(
        &self,
        agent_ip: &str,
        task_id: &str,
        payload: serde_json::Value,
        now_ms: u64,
    ) -> Result<u64, StoreError> {
        self.enqueue(QueueKind::Delete, agent_ip, task_id, payload, now_ms)
    }

    /// Pending delete commands for an agent, FIFO by id.
    pub fn fetch_pending_delete_commands(&self, agent_ip: &str, limit: usize) -> Vec<QueuedCommand> {
        self.fetch_pending(QueueKind::Delete, agent_ip, limit)
    }

    pub fn mark_delete_command_sent(&self, id: u64, now_ms: u64) -> Result<(), StoreError> {
        self.mark_sent(QueueKind::Delete, id, now_ms)
    }

    /// A failed send keeps the row pending with the error recorded.
    pub fn mark_delete_command_failed(&self, id: u64, error: &str) -> Result<(), StoreError> {
        self.mark_failed(QueueKind::Delete, id, error)
    }

    /// Queue a scan task for an agent with no live socket.
    pub fn enqueue_task(
        &self,
        agent_ip: &str,
        task_id: &str,
        payload: serde_json::Value,
        now_ms: u64,
    ) -> Result<u64, StoreError> {
        self.enqueue(QueueKind::Task, agent_ip, task_id, payload, now_ms)
    }

    pub fn fetch_pending_tasks(&self, agent_ip: &str, limit: usize) -> Vec<QueuedCommand> {
        self.fetch_pending(QueueKind::Task, agent_ip, limit)
    }

    pub fn mark_task_sent(&self, id: u64, now_ms: u64) -> Result<(), StoreError> {
        self.mark_sent(QueueKind::Task, id, now_ms)
    }

    pub fn mark_task_failed(&self, id: u64, error: &str) -> Result<(), StoreError> {
        self.mark_failed(QueueKind::Task, id, error)
    }

    fn enqueue(
        &self,
        kind: QueueKind,
        agent_ip: &str,
        task_id: &str,
        payload: serde_json::Value,
        now_ms: u64,
    ) -> Result<u64, StoreError> {
        let mut tables = self.inner.lock();
        let payload_text = payload.to_string();

        let queue = kind.rows(&tables);
        if let Some(existing) = queue.iter().find(|cmd| {
            cmd.status == QueueStatus::Pending
                && cmd.agent_ip == agent_ip
                && cmd.task_id == task_id
                && cmd.payload_text() == payload_text
        }) {
            debug!(id = existing.id, agent_ip, "duplicate pending command, not enqueued");
            return Ok(existing.id);
        }

        tables.next_command_id += 1;
        let id = tables.next_command_id;
        kind.rows_mut(&mut tables).push(QueuedCommand {
            id,
            agent_ip: agent_ip.to_string(),
            task_id: task_id.to_string(),
            payload,
            status: QueueStatus::Pending,
            error: None,
            created_at_ms: now_ms,
            sent_at_ms: None,
        });
        self.save(&tables)?;
        Ok(id)
    }

    fn fetch_pending(&self, kind: QueueKind, agent_ip: &str, limit: usize) -> Vec<QueuedCommand> {
        let limit = limit.clamp(1, 100);
        let tables = self.inner.lock();
        kind.rows(&tables)
            .iter()
            .filter(|cmd| cmd.status == QueueStatus::Pending && cmd.agent_ip == agent_ip)
            .take(limit)
            .cloned()
            .collect()
    }

    fn mark_sent(&self, kind: QueueKind, id: u64, now_ms: u64) -> Result<(), StoreError> {
        let mut tables = self.inner.lock();
        if let Some(cmd) = kind.rows_mut(&mut tables).iter_mut().find(|cmd| cmd.id == id) {
            cmd.status = QueueStatus::Sent;
            cmd.sent_at_ms = Some(now_ms);
            cmd.error = None;
            self.save(&tables)?;
        }
        Ok(())
    }

    fn mark_failed(&self, kind: QueueKind, id: u64, error: &str) -> Result<(), StoreError> {
        let mut tables = self.inner.lock();
        if let Some(cmd) = kind.rows_mut(&mut tables).iter_mut().find(|cmd| cmd.id == id) {
            cmd.status = QueueStatus::Pending;
            cmd.error = Some(truncate(error, 500));
            self.save(&tables)?;
        }
        Ok(())
    }

    // -- deletion reports --

    /// Append agent-reported deletion outcomes.
    pub fn add_deletion_reports(
        &self,
        agent_ip: &str,
        task_id: &str,
        reports: &[NewReport],
        now_ms: u64,
    ) -> Result<(), StoreError> {
        if reports.is_empty() {
            return Ok(());
        }
        let mut tables = self.inner.lock();
        for report in reports {
            tables.next_report_id += 1;
            let id = tables.next_report_id;
            tables.deletion_reports.push(ReportRow {
                id,
                agent_ip: agent_ip.to_string(),
                task_id: task_id.to_string(),
                file_hash: report.file_hash.clone(),
                path: report.path.clone(),
                status: report.status.clone(),
                details: report.details.clone(),
                created_at_ms: now_ms,
            });
        }
        self.save(&tables)
    }

    /// Deletion reports, newest first. `limit` is clamped to 1..=2000.
    pub fn list_deletion_reports(&self, limit: usize) -> Vec<ReportRow> {
        let limit = limit.clamp(1, 2000);
        let tables = self.inner.lock();
        tables.deletion_reports.iter().rev().take(limit).cloned().collect()
    }

    /// Drop pending rows settled by terminal reports.
    ///
    /// Matches by `(task_id, agent_ip, file_hash)` when the report has a
    /// hash, else by `(task_id, agent_ip, path)`.
    pub fn remove_pending_after_deletion_report(
        &self,
        agent_ip: &str,
        task_id: &str,
        reports: &[NewReport],
    ) -> Result<(), StoreError> {
        if reports.is_empty() {
            return Ok(());
        }
        let mut tables = self.inner.lock();
        let mut changed = false;
        for report in reports.iter().filter(|r| r.is_terminal()) {
            let before = tables.pending_files.len();
            if !report.file_hash.is_empty() {
                tables.pending_files.retain(|_, row| {
                    !(row.task_id == task_id
                        && row.agent_ip == agent_ip
                        && row.file_hash == report.file_hash)
                });
            } else if !report.path.is_empty() {
                tables.pending_files.retain(|_, row| {
                    !(row.task_id == task_id
                        && row.agent_ip == agent_ip
                        && row.path == report.path)
                });
            }
            changed |= tables.pending_files.len() != before;
        }
        if changed {
            self.save(&tables)?;
        }
        Ok(())
    }

    // -- audit log --

    /// Append admin-action audit rows, assigning ids and timestamps.
    pub fn add_audit_entries(
        &self,
        entries: Vec<NewAuditEntry>,
        now_ms: u64,
    ) -> Result<(), StoreError> {
        if entries.is_empty() {
            return Ok(());
        }
        let mut tables = self.inner.lock();
        for entry in entries {
            tables.next_audit_id += 1;
            let id = tables.next_audit_id;
            tables.audit_log.push(AuditEntry {
                id,
                record_id: entry.record_id,
                task_id: entry.task_id,
                agent_ip: entry.agent_ip,
                file_hash: entry.file_hash,
                filename: entry.filename,
                path: entry.path,
                language: entry.language,
                confidence: entry.confidence,
                action: entry.action,
                action_by: entry.action_by,
                notes: entry.notes,
                created_at_ms: now_ms,
            });
        }
        self.save(&tables)
    }

    /// Audit rows, newest first.
    pub fn list_audit(&self, limit: usize) -> Vec<AuditEntry> {
        let limit = limit.clamp(1, 1000);
        let tables = self.inner.lock();
        tables.audit_log.iter().rev().take(limit).cloned().collect()
    }
}

/// Which of the two command queues an operation addresses.
#[derive(Debug, Clone, Copy)]
enum QueueKind {
    Delete,
    Task,
}

impl QueueKind {
    fn rows<'t>(&self, tables: &'t Tables) -> &'t Vec<QueuedCommand> {
        match self {
            Self::Delete => &tables.delete_queue,
            Self::Task => &tables.task_queue,
        }
    }

    fn rows_mut<'t>(&self, tables: &'t mut Tables) -> &'t mut Vec<QueuedCommand> {
        match self {
            Self::Delete => &mut tables.delete_queue,
            Self::Task => &mut tables.task_queue,
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
