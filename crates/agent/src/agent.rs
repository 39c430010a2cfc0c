// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent orchestration: task execution and the connection loop.

use std::path::Path;
use std::time::Duration;

use tracing::{info, warn};
use walkdir::WalkDir;

use sweep_wire::{
    ApprovedEntry, CustomRule, DateFilter, Decision, FileFinding, Message, ProtocolError,
    ReportEntry, ReportStatus,
};

use crate::client::{spawn_heartbeat, MasterLink};
use crate::config::AgentConfig;
use crate::detector::{read_sample, sha256_file, Detector};
use crate::quarantine::Quarantine;
use crate::scanner;

/// Frame read timeout; keeps the loop responsive to reconnect checks.
const READ_TIMEOUT: Duration = Duration::from_secs(5);
/// Bytes of content considered for custom keyword/regex matching.
const CUSTOM_SAMPLE: usize = 50_000;
/// Ambiguous findings at or above this confidence still quarantine.
const AMBIGUOUS_QUARANTINE_THRESHOLD: f64 = 0.70;

/// Errors from agent setup and messaging.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// The endpoint agent.
pub struct Agent {
    config: AgentConfig,
    detector: Detector,
    quarantine: Quarantine,
    link: MasterLink,
}

impl Agent {
    pub fn new(config: AgentConfig) -> Result<Self, AgentError> {
        let quarantine = Quarantine::new(&config.quarantine_dir)?;
        let link = MasterLink::new(config.master_addr(), config.client_id.clone());
        Ok(Self { config, detector: Detector::new(), quarantine, link })
    }

    /// Run forever: connect with backoff, process frames, reconnect on
    /// loss.
    pub async fn run(&mut self) {
        info!(client_id = %self.config.client_id, "agent starting");
        loop {
            while !self.link.is_connected() {
                if let Err(e) = self.link.connect().await {
                    warn!(error = %e, delay = ?self.config.reconnect_delay, "connect failed, retrying");
                    tokio::time::sleep(self.config.reconnect_delay).await;
                }
            }

            let heartbeat = self.link.writer_handle().map(|writer| {
                spawn_heartbeat(
                    writer,
                    self.config.client_id.clone(),
                    self.config.heartbeat_interval,
                )
            });

            loop {
                match self.link.read_message(READ_TIMEOUT).await {
                    Ok(Some(message)) => self.handle_message(message).await,
                    Ok(None) => {} // read timeout; loop again
                    Err(e) => {
                        warn!(error = %e, "lost connection to master");
                        break;
                    }
                }
            }

            if let Some(handle) = heartbeat {
                handle.abort();
            }
            tokio::time::sleep(self.config.reconnect_delay).await;
        }
    }

    async fn handle_message(&mut self, message: Message) {
        match message {
            Message::ScanTask { task_id, target_languages, date_filter, custom, .. } => {
                self.execute_scan_task(task_id, target_languages, date_filter, custom).await;
            }
            Message::DeleteApproved { task_id, approved_entries, approved_hashes, .. } => {
                self.execute_deletion(task_id, approved_entries, approved_hashes).await;
            }
            Message::RestoreFile { file_hash, original_path } => {
                // Reserved by the protocol; restore is not wired up yet.
                info!(file_hash = %file_hash, original_path = %original_path, "restore requested, ignoring");
            }
            other => warn!(kind = other.kind(), "unknown message type"),
        }
    }

    async fn execute_scan_task(
        &mut self,
        task_id: String,
        target_languages: Vec<String>,
        date_filter: Option<DateFilter>,
        custom: Option<CustomRule>,
    ) {
        let task_id = if task_id.is_empty() { "unknown-task".to_string() } else { task_id };
        info!(task_id = %task_id, ?target_languages, "scan task received");

        let results = tokio::task::block_in_place(|| {
            self.collect_findings(&target_languages, date_filter.as_ref(), custom.as_ref())
        });

        if results.is_empty() {
            info!(task_id = %task_id, "no files matched the scan criteria");
            return;
        }

        let message = Message::ScanResults {
            task_id: task_id.clone(),
            client_id: self.config.client_id.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            files: results.clone(),
            results,
        };
        match self.link.send(&message).await {
            Ok(()) => info!(task_id = %task_id, "scan results sent"),
            Err(e) => warn!(task_id = %task_id, error = %e, "failed to send scan results"),
        }
    }

    /// Walk, analyze, and quarantine; pure filesystem work.
    fn collect_findings(
        &self,
        target_languages: &[String],
        date_filter: Option<&DateFilter>,
        custom: Option<&CustomRule>,
    ) -> Vec<FileFinding> {
        let files = scanner::scan(&self.config.scan_dirs, date_filter);
        let mut results = Vec::new();

        for path in files {
            if let Some(rule) = custom {
                if matches_custom(&path, rule) {
                    results.push(self.quarantine_custom_match(&path));
                }
                continue;
            }

            let mut finding = self.detector.analyze(&path);
            let targeted = target_languages.iter().any(|lang| lang == &finding.language);
            let should_quarantine = targeted
                && (finding.decision == Decision::Delete
                    || (finding.decision == Decision::Ambiguous
                        && finding.confidence >= AMBIGUOUS_QUARANTINE_THRESHOLD));
            if !should_quarantine {
                continue;
            }

            match self.quarantine.quarantine_file(&path) {
                Ok(quarantine_path) => {
                    finding.filepath = quarantine_path.display().to_string();
                    results.push(finding);
                }
                Err(e) => {
                    // Report the original entry anyway so the master
                    // keeps visibility of the failed quarantine.
                    warn!(path = %path.display(), error = %e, "failed to quarantine");
                    results.push(finding);
                }
            }
        }
        results
    }

    /// Quarantine a custom-rule match and synthesize its finding.
    fn quarantine_custom_match(&self, path: &Path) -> FileFinding {
        let (filepath, size, modified_time, file_hash) =
            match self.quarantine.quarantine_file(path) {
                Ok(quarantine_path) => {
                    let (size, modified) = file_meta(&quarantine_path);
                    let hash = sha256_file(&quarantine_path).unwrap_or_default();
                    (quarantine_path.display().to_string(), size, modified, hash)
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to quarantine");
                    let (size, modified) = file_meta(path);
                    let hash = sha256_file(path).unwrap_or_default();
                    (path.display().to_string(), size, modified, hash)
                }
            };
        let filename = Path::new(&filepath)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unknown".to_string());

        FileFinding {
            filepath,
            filename,
            size,
            modified_time,
            decision: Decision::Delete,
            confidence: 0.90,
            language: "custom".to_string(),
            method: "custom-filter".to_string(),
            reason: "Matched custom scan criteria".to_string(),
            file_hash,
        }
    }

    async fn execute_deletion(
        &mut self,
        task_id: String,
        approved_entries: Vec<ApprovedEntry>,
        approved_hashes: Vec<String>,
    ) {
        let task_id = if task_id.is_empty() { "unknown-task".to_string() } else { task_id };
        let entries = if approved_entries.is_empty() {
            approved_hashes
                .into_iter()
                .map(|file_hash| ApprovedEntry { file_hash, ..ApprovedEntry::default() })
                .collect()
        } else {
            approved_entries
        };
        info!(task_id = %task_id, count = entries.len(), "executing approved deletions");

        let reports = tokio::task::block_in_place(|| self.perform_deletions(&entries));
        let deleted = reports.iter().filter(|r| r.status == ReportStatus::Deleted).count();
        info!(task_id = %task_id, deleted, total = reports.len(), "deletions executed");

        let message = Message::DeletionReport {
            task_id: task_id.clone(),
            client_id: self.config.client_id.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            reports,
        };
        if let Err(e) = self.link.send(&message).await {
            warn!(task_id = %task_id, error = %e, "failed to send deletion report");
        }
    }

    /// Delete approved entries from the quarantine tree.
    ///
    /// Hash lookup first (walk + rehash), then the hint path. Entries
    /// already gone report `file not found in quarantine`, which the
    /// master treats as terminal, so re-delivered commands settle
    /// idempotently.
    fn perform_deletions(&self, entries: &[ApprovedEntry]) -> Vec<ReportEntry> {
        let mut reports = Vec::new();

        for entry in entries {
            let mut deleted = false;
            let mut deleted_path = String::new();
            let mut details = String::new();

            if !entry.file_hash.is_empty() {
                if let Some(found) = self.find_by_hash(&entry.file_hash) {
                    deleted = self.quarantine.delete_quarantined(&found).is_ok();
                    deleted_path = found.display().to_string();
                    details = if deleted {
                        "deleted by hash".to_string()
                    } else {
                        "hash found but delete failed".to_string()
                    };
                }
            }

            let hint = Path::new(&entry.path);
            if !deleted && !entry.path.is_empty() && hint.exists() {
                deleted = self.quarantine.delete_quarantined(hint).is_ok();
                deleted_path = entry.path.clone();
                details = if deleted {
                    "deleted by path fallback".to_string()
                } else {
                    "path found but delete failed".to_string()
                };
            }

            if !deleted && details.is_empty() {
                details = "file not found in quarantine".to_string();
            }

            reports.push(ReportEntry {
                file_hash: entry.file_hash.clone(),
                path: if deleted_path.is_empty() { entry.path.clone() } else { deleted_path },
                status: if deleted { ReportStatus::Deleted } else { ReportStatus::Failed },
                details,
            });
        }
        reports
    }

    /// Rehash the quarantine tree looking for a content match.
    fn find_by_hash(&self, file_hash: &str) -> Option<std::path::PathBuf> {
        for entry in WalkDir::new(self.quarantine.root()).into_iter().flatten() {
            if !entry.file_type().is_file() {
                continue;
            }
            if sha256_file(entry.path()).is_ok_and(|hash| hash == file_hash) {
                return Some(entry.into_path());
            }
        }
        None
    }
}

fn file_meta(path: &Path) -> (u64, String) {
    match std::fs::metadata(path) {
        Ok(meta) => {
            let modified = meta
                .modified()
                .map(|time| chrono::DateTime::<chrono::Utc>::from(time).to_rfc3339())
                .unwrap_or_default();
            (meta.len(), modified)
        }
        Err(_) => (0, String::new()),
    }
}

/// Whether a file matches an admin-defined custom rule.
fn matches_custom(path: &Path, rule: &CustomRule) -> bool {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if let Some(extension) = rule.extension.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
        let wanted = extension.trim_start_matches('.').to_lowercase();
        let actual = path.extension().map(|e| e.to_string_lossy().to_lowercase());
        if actual.as_deref() == Some(wanted.as_str()) {
            return true;
        }
    }

    if let Some(fragment) = rule.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        if name.contains(&fragment.to_lowercase()) {
            return true;
        }
    }

    let needs_content = rule
        .keywords
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .is_some()
        || rule.pattern.as_deref().map(str::trim).filter(|p| !p.is_empty()).is_some();
    if !needs_content {
        return false;
    }
    let content = match read_sample(path, CUSTOM_SAMPLE) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(_) => return false,
    };

    if let Some(keywords) = rule.keywords.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
        let haystack = content.to_lowercase();
        for keyword in keywords.split(',').map(str::trim).filter(|k| !k.is_empty()) {
            if haystack.contains(&keyword.to_lowercase()) {
                return true;
            }
        }
    }

    if let Some(pattern) = rule.pattern.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        match regex::Regex::new(pattern) {
            Ok(regex) => {
                if regex.is_match(&content) {
                    return true;
                }
            }
            Err(e) => warn!(pattern, error = %e, "invalid custom pattern"),
        }
    }
    false
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
