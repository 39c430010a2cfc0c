// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Immutable log rows for agent-reported deletion outcomes.

use serde::{Deserialize, Serialize};

/// Whether a deletion outcome permits removal of the matching pending row.
///
/// A failure whose details say the file is no longer in quarantine is
/// terminal too: the file is effectively absent on the agent.
pub fn is_terminal_outcome(status: &str, details: &str) -> bool {
    status == "deleted"
        || (status == "failed" && details.to_lowercase().contains("not found in quarantine"))
}

/// One agent-reported deletion outcome, appended verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub id: u64,
    pub agent_ip: String,
    pub task_id: String,
    pub file_hash: String,
    pub path: String,
    /// `deleted` or `failed`
    pub status: String,
    pub details: String,
    pub created_at_ms: u64,
}

impl ReportRow {
    pub fn is_terminal(&self) -> bool {
        is_terminal_outcome(&self.status, &self.details)
    }
}

/// A deletion outcome as received from an agent, before the store
/// assigns it a row id and timestamp.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewReport {
    pub file_hash: String,
    pub path: String,
    pub status: String,
    pub details: String,
}

impl NewReport {
    pub fn is_terminal(&self) -> bool {
        is_terminal_outcome(&self.status, &self.details)
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
