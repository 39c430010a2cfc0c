// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! At-least-once delete delivery: an unacknowledged command is re-sent,
//! and the agent's idempotent not-found failure settles it.

use super::prelude::*;

#[tokio::test(flavor = "multi_thread")]
async fn redelivered_delete_settles_once_and_audit_hides_the_retry() {
    let tm = start_master().await;

    let mut agent = ScriptedAgent::connect(tm.addr).await;
    let initial = agent.register("A").await;
    let task_id = match initial {
        Message::ScanTask { task_id, .. } => task_id,
        other => panic!("expected ScanTask, got {other:?}"),
    };

    agent.send(&scan_results(&task_id, vec![finding("/y.py", "h2")])).await;
    let record_id = format!("{task_id}|127.0.0.1|h2");
    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || {
            tm.master.store.get_pending_by_ids(&[record_id.clone()]).len() == 1
        })
        .await
    );

    // The crash window: the approve payload reached the queue but was
    // never marked sent (master died between send and the mark).
    let payload = serde_json::json!({
        "type": "delete_approved",
        "task_id": task_id,
        "approved_entries": [{"file_hash": "h2", "path": "", "record_id": record_id}],
        "approved_hashes": ["h2"],
        "timestamp": "",
    });
    tm.master
        .store
        .enqueue_delete_command("127.0.0.1", &task_id, payload.clone(), tm.master.clock.epoch_ms())
        .unwrap();

    // First delivery: heartbeat drains the command, agent deletes
    agent.heartbeat().await;
    let first = agent.recv().await;
    assert!(matches!(first, Message::DeleteApproved { .. }), "got {first:?}");
    agent
        .send(&deletion_report(
            &task_id,
            vec![ReportEntry {
                file_hash: "h2".into(),
                path: "/q/y.py".into(),
                status: ReportStatus::Deleted,
                details: "deleted by hash".into(),
            }],
        ))
        .await;

    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || tm.master.store.list_pending_files(None).is_empty()).await,
        "terminal report should remove the pending row"
    );

    // Redelivery after a second crash window: the same payload queues
    // again (the prior row is sent, so dedup does not apply).
    tm.master
        .store
        .enqueue_delete_command("127.0.0.1", &task_id, payload, tm.master.clock.epoch_ms())
        .unwrap();
    agent.heartbeat().await;
    let second = agent.recv().await;
    assert!(matches!(second, Message::DeleteApproved { .. }), "got {second:?}");

    // The file is long gone; the agent reports the idempotent failure
    agent
        .send(&deletion_report(
            &task_id,
            vec![ReportEntry {
                file_hash: "h2".into(),
                path: "/q/y.py".into(),
                status: ReportStatus::Failed,
                details: "file not found in quarantine".into(),
            }],
        ))
        .await;

    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || tm.master.store.list_deletion_reports(10).len() == 2).await
    );
    assert!(tm.master.store.list_pending_files(None).is_empty());

    // The audit view shows the confirmation but hides the later
    // not-found failure for the same file.
    let rows: Value = tm.admin.get("/audit-logs").await.json();
    let actions: Vec<&str> =
        rows.as_array().unwrap().iter().map(|r| r["action"].as_str().unwrap()).collect();
    assert!(actions.contains(&"delete_confirmed"), "actions: {actions:?}");
    assert!(!actions.contains(&"delete_failed"), "actions: {actions:?}");
}
