// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared harness for control-plane specs.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

pub use axum_test::TestServer;
pub use serde_json::{json, Value};

pub use sweep_core::{AgentStatus, Clock, FakeClock};
pub use sweep_master::{api, listener, Master};
pub use sweep_storage::Store;
pub use sweep_wire::{
    read_frame, write_frame, Decision, FileFinding, Message, ReportEntry, ReportStatus,
};

use tokio::net::TcpStream;

/// Generous upper bound for condition polling.
pub const SPEC_WAIT_MAX_MS: u64 = 5_000;

/// A master under test: TCP plane on loopback plus the admin router.
pub struct TestMaster {
    pub master: Arc<Master<FakeClock>>,
    pub addr: SocketAddr,
    pub admin: TestServer,
    _dir: tempfile::TempDir,
}

/// Start a full master on an ephemeral port with a fake clock.
pub async fn start_master() -> TestMaster {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(Store::open(&dir.path().join("app.json")).unwrap());
    let master = Master::new(store, FakeClock::new());

    let tcp = listener::bind("127.0.0.1:0".parse().unwrap()).unwrap();
    let addr = tcp.local_addr().unwrap();
    tokio::spawn(listener::run(tcp, Arc::clone(&master)));

    let admin = TestServer::new(api::routes(Arc::clone(&master))).unwrap();
    TestMaster { master, addr, admin, _dir: dir }
}

/// A scripted agent speaking the framed protocol.
pub struct ScriptedAgent {
    pub stream: TcpStream,
}

impl ScriptedAgent {
    pub async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        Self { stream }
    }

    /// Register and consume the initial scan task the master pushes.
    pub async fn register(&mut self, client_id: &str) -> Message {
        self.send(&Message::Register { client_id: client_id.into(), timestamp: String::new() })
            .await;
        let initial = self.recv().await;
        assert!(matches!(initial, Message::ScanTask { .. }), "expected initial task, got {initial:?}");
        initial
    }

    pub async fn send(&mut self, message: &Message) {
        write_frame(&mut self.stream, message).await.unwrap();
    }

    pub async fn recv(&mut self) -> Message {
        tokio::time::timeout(Duration::from_secs(5), read_frame(&mut self.stream))
            .await
            .expect("timed out waiting for frame")
            .expect("read frame")
    }

    pub async fn heartbeat(&mut self) {
        self.send(&Message::Heartbeat { client_id: String::new(), timestamp: String::new() })
            .await;
    }
}

/// One delete-worthy finding.
pub fn finding(path: &str, hash: &str) -> FileFinding {
    FileFinding {
        filepath: path.into(),
        filename: path.rsplit('/').next().unwrap_or(path).into(),
        size: 10,
        modified_time: String::new(),
        decision: Decision::Delete,
        confidence: 0.9,
        language: "python".into(),
        method: "pattern-based".into(),
        reason: "High confidence python code".into(),
        file_hash: hash.into(),
    }
}

pub fn scan_results(task_id: &str, findings: Vec<FileFinding>) -> Message {
    Message::ScanResults {
        task_id: task_id.into(),
        client_id: "A".into(),
        timestamp: String::new(),
        files: findings.clone(),
        results: findings,
    }
}

pub fn deletion_report(task_id: &str, reports: Vec<ReportEntry>) -> Message {
    Message::DeletionReport {
        task_id: task_id.into(),
        client_id: "A".into(),
        timestamp: String::new(),
        reports,
    }
}

/// Poll until `cond` holds or the deadline passes.
pub async fn wait_for(max_ms: u64, cond: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_millis(max_ms);
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}
