// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-agent command queues for delivery to possibly-offline agents.

use serde::{Deserialize, Serialize};

/// Delivery state of a queued command.
///
/// `Pending` rows are retried on every heartbeat until a send succeeds;
/// a send failure records the error but keeps the row pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Pending,
    Sent,
}

/// One queued wire payload addressed to an agent.
///
/// Used for both delete commands and scan tasks; the payload is the
/// complete frame body, stored as canonical JSON so identical pending
/// commands deduplicate by text comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedCommand {
    pub id: u64,
    pub agent_ip: String,
    pub task_id: String,
    pub payload: serde_json::Value,
    pub status: QueueStatus,
    /// Last transient delivery failure, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at_ms: Option<u64>,
}

impl QueuedCommand {
    /// Canonical JSON text of the payload, used for pending-dedup.
    pub fn payload_text(&self) -> String {
        self.payload.to_string()
    }
}
