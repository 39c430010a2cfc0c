// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scan tasks queue for agents without a live socket and drain on the
//! next heartbeat.

use super::prelude::*;

#[tokio::test(flavor = "multi_thread")]
async fn queued_task_is_delivered_on_reconnect_heartbeat() {
    let tm = start_master().await;

    // The store knows the agent (a prior master run crashed before
    // flagging it OFFLINE), but no socket is connected right now.
    tm.master
        .store
        .upsert_agent("127.0.0.1", AgentStatus::Idle, Some("A"), tm.master.clock.epoch_ms())
        .unwrap();

    let body: Value =
        tm.admin.post("/scan").json(&json!({"target_language": "python"})).await.json();
    assert_eq!(body["sent"], 0);
    assert_eq!(body["queued"], 1);
    let task_id = body["task_id"].as_str().unwrap().to_string();

    assert_eq!(tm.master.store.fetch_pending_tasks("127.0.0.1", 20).len(), 1);

    // Agent reconnects; registration brings the usual initial task
    let mut agent = ScriptedAgent::connect(tm.addr).await;
    agent.register("A").await;

    // The heartbeat drains the queued task
    agent.heartbeat().await;
    let delivered = agent.recv().await;
    match delivered {
        Message::ScanTask { task_id: delivered_id, target_languages, .. } => {
            assert_eq!(delivered_id, task_id);
            assert_eq!(target_languages, vec!["python"]);
        }
        other => panic!("expected queued ScanTask, got {other:?}"),
    }

    let marked = wait_for(SPEC_WAIT_MAX_MS, || {
        tm.master.store.fetch_pending_tasks("127.0.0.1", 20).is_empty()
    })
    .await;
    assert!(marked, "delivered task should be marked sent");
}

#[tokio::test(flavor = "multi_thread")]
async fn offline_agents_are_not_queued() {
    let tm = start_master().await;

    tm.master
        .store
        .upsert_agent("127.0.0.1", AgentStatus::Offline, Some("A"), tm.master.clock.epoch_ms())
        .unwrap();

    // Nobody eligible: the scan is rejected outright
    let response = tm.admin.post("/scan").json(&json!({"target_language": "python"})).await;
    assert_eq!(response.status_code(), 400);
    assert!(tm.master.store.fetch_pending_tasks("127.0.0.1", 20).is_empty());
}
