// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    idle = { AgentStatus::Idle, "IDLE" },
    scanning = { AgentStatus::Scanning, "SCANNING" },
    awaiting = { AgentStatus::AwaitingApproval, "AWAITING_APPROVAL" },
    dispatched = { AgentStatus::DeletionDispatched, "DELETION_DISPATCHED" },
    offline = { AgentStatus::Offline, "OFFLINE" },
)]
fn status_serializes_screaming_snake(status: AgentStatus, expected: &str) {
    let json = serde_json::to_value(status).unwrap();
    assert_eq!(json, serde_json::json!(expected));
    assert_eq!(status.to_string(), expected);
}

#[test]
fn row_roundtrip_without_client_id() {
    let row = AgentRow {
        agent_ip: "10.0.0.7".into(),
        status: AgentStatus::Idle,
        last_seen_ms: 1234,
        client_id: None,
    };

    let json = serde_json::to_string(&row).unwrap();
    assert!(!json.contains("client_id"));

    let back: AgentRow = serde_json::from_str(&json).unwrap();
    assert_eq!(back, row);
}
