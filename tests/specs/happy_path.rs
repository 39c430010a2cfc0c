// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Full approve-then-delete flow against a live master.

use super::prelude::*;

#[tokio::test(flavor = "multi_thread")]
async fn scan_approve_delete_settles_cleanly() {
    let tm = start_master().await;

    // Agent registers and receives the default scan task
    let mut agent = ScriptedAgent::connect(tm.addr).await;
    let initial = agent.register("A").await;
    let task_id = match initial {
        Message::ScanTask { task_id, target_languages, .. } => {
            assert_eq!(target_languages, vec!["python"]);
            task_id
        }
        other => panic!("expected ScanTask, got {other:?}"),
    };

    // Agent reports one delete-worthy file
    agent.send(&scan_results(&task_id, vec![finding("/x.py", "h1")])).await;

    let record_id = format!("{task_id}|127.0.0.1|h1");
    let ingested = wait_for(SPEC_WAIT_MAX_MS, || {
        tm.master.store.get_pending_by_ids(&[record_id.clone()]).len() == 1
    })
    .await;
    assert!(ingested, "scan result should become a pending row");
    assert_eq!(
        tm.master.store.get_agent("127.0.0.1").unwrap().status,
        AgentStatus::AwaitingApproval
    );

    // Admin approves; the live socket gets the delete command
    let body: Value = tm
        .admin
        .post("/approve-deletion")
        .json(&json!({"file_ids": [record_id]}))
        .await
        .json();
    assert_eq!(body["sent_to_agents"], 1);

    let command = agent.recv().await;
    match &command {
        Message::DeleteApproved { task_id: approved_task, approved_entries, .. } => {
            assert_eq!(approved_task, &task_id);
            assert_eq!(approved_entries.len(), 1);
            assert_eq!(approved_entries[0].file_hash, "h1");
        }
        other => panic!("expected DeleteApproved, got {other:?}"),
    }

    // Pending row is already gone: dispatched rows leave the queue
    assert!(tm.master.store.list_pending_files(None).is_empty());

    // Agent confirms the deletion
    agent
        .send(&deletion_report(
            &task_id,
            vec![ReportEntry {
                file_hash: "h1".into(),
                path: "/q/x.py".into(),
                status: ReportStatus::Deleted,
                details: "deleted by hash".into(),
            }],
        ))
        .await;

    let settled = wait_for(SPEC_WAIT_MAX_MS, || {
        tm.master.store.list_deletion_reports(10).len() == 1
    })
    .await;
    assert!(settled, "deletion report should be persisted");

    // Audit shows the dispatch and the agent's confirmation
    let rows: Value = tm.admin.get("/audit-logs").await.json();
    let actions: Vec<&str> =
        rows.as_array().unwrap().iter().map(|r| r["action"].as_str().unwrap()).collect();
    assert!(actions.contains(&"delete_dispatched"), "actions: {actions:?}");
    assert!(actions.contains(&"delete_confirmed"), "actions: {actions:?}");

    // And the agent is back to IDLE
    assert_eq!(tm.master.store.get_agent("127.0.0.1").unwrap().status, AgentStatus::Idle);
}
