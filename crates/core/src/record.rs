// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted agent records and their lifecycle status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a fleet agent.
///
/// Created on first registration, mutated by connection-handler events,
/// forced to `Offline` on disconnect or after the inactivity timeout.
/// Agent rows are never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentStatus {
    Idle,
    Scanning,
    AwaitingApproval,
    DeletionDispatched,
    Offline,
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "IDLE"),
            Self::Scanning => write!(f, "SCANNING"),
            Self::AwaitingApproval => write!(f, "AWAITING_APPROVAL"),
            Self::DeletionDispatched => write!(f, "DELETION_DISPATCHED"),
            Self::Offline => write!(f, "OFFLINE"),
        }
    }
}

/// A persisted agent row, keyed by `agent_ip`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRow {
    pub agent_ip: String,
    pub status: AgentStatus,
    /// Epoch milliseconds of the last frame seen from this agent
    pub last_seen_ms: u64,
    /// Self-reported identity from the registration frame
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
