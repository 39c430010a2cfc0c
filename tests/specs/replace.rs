// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Re-ingesting a scan result replaces the previous pending set.

use super::prelude::*;

#[tokio::test(flavor = "multi_thread")]
async fn second_scan_result_replaces_the_first_set() {
    let tm = start_master().await;

    let mut agent = ScriptedAgent::connect(tm.addr).await;
    agent.register("A").await;

    agent
        .send(&scan_results("T3", vec![finding("/a.py", "h1"), finding("/b.py", "h2")]))
        .await;
    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || tm.master.store.list_pending_files(None).len() == 2).await
    );
    let first_ids: Vec<String> =
        tm.master.store.list_pending_files(None).iter().map(|row| row.id.clone()).collect();

    agent.send(&scan_results("T3", vec![finding("/c.py", "h3"), finding("/d.py", "h4")])).await;
    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || {
            let rows = tm.master.store.list_pending_files(None);
            rows.len() == 2 && rows.iter().all(|row| ["h3", "h4"].contains(&row.file_hash.as_str()))
        })
        .await,
        "final set must equal the second set only"
    );

    assert!(tm.master.store.get_pending_by_ids(&first_ids).is_empty(), "first set must be gone");
}

#[tokio::test(flavor = "multi_thread")]
async fn legacy_results_field_is_accepted() {
    let tm = start_master().await;

    let mut agent = ScriptedAgent::connect(tm.addr).await;
    agent.register("A").await;

    // Older senders fill only `results`
    agent
        .send(&Message::ScanResults {
            task_id: "T4".into(),
            client_id: "A".into(),
            timestamp: String::new(),
            files: vec![],
            results: vec![finding("/legacy.py", "h9")],
        })
        .await;

    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || tm.master.store.list_pending_files(None).len() == 1).await
    );
    assert_eq!(tm.master.store.list_pending_files(None)[0].file_hash, "h9");
}
