// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inactivity sweep under a frozen clock.

use super::prelude::*;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread")]
async fn silent_agent_goes_offline_and_leaves_the_status_view() {
    let tm = start_master().await;

    let mut agent = ScriptedAgent::connect(tm.addr).await;
    agent.register("A").await;
    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || tm.master.store.get_agent("127.0.0.1").is_some()).await
    );

    // Visible while fresh
    let list: Value = tm.admin.get("/clients-status").await.json();
    assert_eq!(list.as_array().unwrap().len(), 1);

    // 61 s of silence on the frozen clock, then one sweep pass
    tm.master.clock.advance(Duration::from_secs(61));
    tm.master.registry.mark_offline_inactive(Duration::from_secs(60)).unwrap();

    assert!(tm.master.registry.get_active().is_empty(), "registry must drop the agent");
    assert_eq!(
        tm.master.store.get_agent("127.0.0.1").unwrap().status,
        AgentStatus::Offline,
        "store must mirror the OFFLINE transition"
    );

    let list: Value = tm.admin.get("/clients-status").await.json();
    assert!(
        list.as_array().unwrap().is_empty(),
        "stale agent must be omitted from the status view"
    );
}
