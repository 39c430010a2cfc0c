// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admin-action audit trail.
//!
//! Audit rows record what the admin decided about a pending file and how
//! the decision travelled toward the agent. Agent-side outcomes
//! (`delete_confirmed` / `delete_failed`) are not stored here; the admin
//! API projects them from the deletion-report log at read time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The admin action (or dispatch outcome) recorded for a pending row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Approved and sent to the agent's live socket
    DeleteDispatched,
    /// Approved; command queued for the next heartbeat
    DeleteQueued,
    /// Approved but neither send nor enqueue succeeded
    DeleteDispatchFailed,
    /// Rejected in the review UI
    Rejected,
    /// Projected from a `deleted` report (read-time only)
    DeleteConfirmed,
    /// Projected from a `failed` report (read-time only)
    DeleteFailed,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::DeleteDispatched => "delete_dispatched",
            Self::DeleteQueued => "delete_queued",
            Self::DeleteDispatchFailed => "delete_dispatch_failed",
            Self::Rejected => "rejected",
            Self::DeleteConfirmed => "delete_confirmed",
            Self::DeleteFailed => "delete_failed",
        };
        write!(f, "{s}")
    }
}

/// An audit row before the store assigns it an id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditEntry {
    pub record_id: String,
    pub task_id: String,
    pub agent_ip: String,
    pub file_hash: String,
    pub filename: String,
    pub path: String,
    pub language: Option<String>,
    pub confidence: Option<f64>,
    pub action: AuditAction,
    pub action_by: String,
    pub notes: String,
}

/// One audit-trail row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: u64,
    pub record_id: String,
    pub task_id: String,
    pub agent_ip: String,
    pub file_hash: String,
    pub filename: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub action: AuditAction,
    pub action_by: String,
    pub notes: String,
    pub created_at_ms: u64,
}
