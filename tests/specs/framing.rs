// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Framing robustness at the connection boundary.

use super::prelude::*;
use tokio::io::AsyncWriteExt;

#[tokio::test(flavor = "multi_thread")]
async fn truncated_frame_closes_connection_without_partial_state() {
    let tm = start_master().await;

    let mut agent = ScriptedAgent::connect(tm.addr).await;

    // A 4-byte length promising 100 bytes, then only 3, then EOF
    agent.stream.write_all(&100u32.to_be_bytes()).await.unwrap();
    agent.stream.write_all(b"abc").await.unwrap();
    drop(agent);

    // The master treats it as end-of-stream: connection closed, nothing
    // ingested, agent flagged OFFLINE by the close path.
    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || {
            tm.master
                .store
                .get_agent("127.0.0.1")
                .is_some_and(|row| row.status == AgentStatus::Offline)
        })
        .await
    );
    assert!(tm.master.store.list_pending_files(None).is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn truncated_payload_mid_session_drops_the_connection() {
    let tm = start_master().await;

    let mut agent = ScriptedAgent::connect(tm.addr).await;
    agent.register("A").await;

    // Valid session so far; now a frame that never completes
    agent.stream.write_all(&50u32.to_be_bytes()).await.unwrap();
    agent.stream.write_all(b"{\"type\":").await.unwrap();
    drop(agent);

    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || tm.master.registry.sender_for("127.0.0.1").is_none()).await,
        "connection must be torn down"
    );
    assert!(tm.master.store.list_pending_files(None).is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn garbage_first_frame_is_an_invalid_registration() {
    let tm = start_master().await;

    let mut agent = ScriptedAgent::connect(tm.addr).await;
    agent.heartbeat().await;

    // Heartbeat before registration: rejected, never registered
    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || {
            tm.master
                .store
                .get_agent("127.0.0.1")
                .is_some_and(|row| row.status == AgentStatus::Offline)
        })
        .await
    );
    assert!(tm.master.registry.get_active().is_empty());
}
