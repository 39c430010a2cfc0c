// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Payload types carried inside protocol messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Detector verdict for a scanned file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Delete,
    #[default]
    Keep,
    Ambiguous,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delete => write!(f, "delete"),
            Self::Keep => write!(f, "keep"),
            Self::Ambiguous => write!(f, "ambiguous"),
        }
    }
}

/// One analyzed file, as produced by the agent-side detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileFinding {
    pub filepath: String,
    pub filename: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub modified_time: String,
    #[serde(default)]
    pub decision: Decision,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub language: String,
    /// How the verdict was reached (`pattern-based`, `binary-filter`, …)
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub file_hash: String,
}

/// A pending row the admin approved for deletion.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ApprovedEntry {
    #[serde(default)]
    pub file_hash: String,
    /// Hint path for agents whose quarantine copy no longer hashes
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub record_id: String,
}

/// Outcome of a single approved deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Deleted,
    #[default]
    Failed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deleted => "deleted",
            Self::Failed => "failed",
        }
    }
}

/// One entry of a `deletion_report` frame.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReportEntry {
    #[serde(default)]
    pub file_hash: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub status: ReportStatus,
    #[serde(default)]
    pub details: String,
}

/// Optional modified-time window for a scan task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateFilter {
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
}

/// Free-form matching rules for admin-defined ("Other") scans.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CustomRule {
    /// Filename substring, case-insensitive
    #[serde(default)]
    pub name: Option<String>,
    /// Comma-separated content keywords, case-insensitive
    #[serde(default)]
    pub keywords: Option<String>,
    /// Extension match, leading dot optional
    #[serde(default)]
    pub extension: Option<String>,
    /// Content regex
    #[serde(default)]
    pub pattern: Option<String>,
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
