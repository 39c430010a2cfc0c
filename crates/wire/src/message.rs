// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

use crate::types::{ApprovedEntry, CustomRule, DateFilter, FileFinding, ReportEntry};

/// Messages exchanged between agent and master.
///
/// Serializes with `{"type": "...", ...fields}` format. Decoding is
/// lenient: missing fields default, unknown type tags deserialize to
/// `Unknown` (logged and ignored by both sides).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    /// First frame an agent sends on every connection
    #[serde(rename = "register")]
    Register {
        #[serde(default)]
        client_id: String,
        #[serde(default)]
        timestamp: String,
    },

    #[serde(rename = "heartbeat")]
    Heartbeat {
        #[serde(default)]
        client_id: String,
        #[serde(default)]
        timestamp: String,
    },

    /// Master → agent scan instruction
    #[serde(rename = "scan_task")]
    ScanTask {
        #[serde(default)]
        task_id: String,
        #[serde(default)]
        target_languages: Vec<String>,
        /// Always present on the wire, null when unfiltered
        #[serde(default)]
        date_filter: Option<DateFilter>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        custom: Option<CustomRule>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        created_at: Option<String>,
    },

    /// Agent → master scan outcome. `files` and `results` carry the same
    /// entries; older peers read one or the other.
    #[serde(rename = "scan_results", alias = "scan_result")]
    ScanResults {
        #[serde(default)]
        task_id: String,
        #[serde(default)]
        client_id: String,
        #[serde(default)]
        timestamp: String,
        #[serde(default)]
        files: Vec<FileFinding>,
        #[serde(default)]
        results: Vec<FileFinding>,
    },

    /// Master → agent: admin approved deletion of quarantined files
    #[serde(rename = "delete_approved")]
    DeleteApproved {
        #[serde(default)]
        task_id: String,
        #[serde(default)]
        approved_entries: Vec<ApprovedEntry>,
        #[serde(default)]
        approved_hashes: Vec<String>,
        #[serde(default)]
        timestamp: String,
    },

    /// Agent → master: per-file outcome of a delete command
    #[serde(rename = "deletion_report")]
    DeletionReport {
        #[serde(default)]
        task_id: String,
        #[serde(default)]
        client_id: String,
        #[serde(default)]
        timestamp: String,
        #[serde(default)]
        reports: Vec<ReportEntry>,
    },

    /// Reserved: restore a quarantined file to its original path
    #[serde(rename = "restore_file")]
    RestoreFile {
        #[serde(default)]
        file_hash: String,
        #[serde(default)]
        original_path: String,
    },

    /// Catch-all for unknown message types
    #[serde(other, skip_serializing)]
    Unknown,
}

impl Message {
    /// The wire `type` tag, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Register { .. } => "register",
            Self::Heartbeat { .. } => "heartbeat",
            Self::ScanTask { .. } => "scan_task",
            Self::ScanResults { .. } => "scan_results",
            Self::DeleteApproved { .. } => "delete_approved",
            Self::DeletionReport { .. } => "deletion_report",
            Self::RestoreFile { .. } => "restore_file",
            Self::Unknown => "unknown",
        }
    }
}

/// Pick the populated finding list from a `scan_results` frame.
///
/// Newer agents fill both `files` and `results`; some legacy senders
/// fill only one.
pub fn result_findings<'a>(files: &'a [FileFinding], results: &'a [FileFinding]) -> &'a [FileFinding] {
    if files.is_empty() {
        results
    } else {
        files
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
