// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent configuration from process environment.

use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration for one agent process.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub master_ip: String,
    pub master_port: u16,
    /// Self-reported identity, sent in the registration frame
    pub client_id: String,
    pub scan_dirs: Vec<PathBuf>,
    pub quarantine_dir: PathBuf,
    pub log_dir: PathBuf,
    pub heartbeat_interval: Duration,
    pub reconnect_delay: Duration,
}

impl AgentConfig {
    /// Load configuration from the environment, with home-relative
    /// defaults for paths.
    pub fn from_env() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));

        let scan_dirs = std::env::var("SCAN_DIRS")
            .map(|dirs| {
                dirs.split(',')
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .map(PathBuf::from)
                    .collect()
            })
            .unwrap_or_else(|_| vec![home.join("Downloads")]);

        Self {
            master_ip: std::env::var("MASTER_IP").unwrap_or_else(|_| "127.0.0.1".to_string()),
            master_port: std::env::var("MASTER_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            client_id: std::env::var("CLIENT_ID")
                .or_else(|_| std::env::var("HOSTNAME"))
                .unwrap_or_else(|_| "sweep-agent".to_string()),
            scan_dirs,
            quarantine_dir: std::env::var("QUARANTINE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| home.join("quarantine")),
            log_dir: std::env::var("LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| home.join("logs")),
            heartbeat_interval: secs_from_env("HEARTBEAT_INTERVAL", 30),
            reconnect_delay: secs_from_env("RECONNECT_DELAY", 10),
        }
    }

    /// Master endpoint in `host:port` form.
    pub fn master_addr(&self) -> String {
        format!("{}:{}", self.master_ip, self.master_port)
    }
}

fn secs_from_env(var: &str, default: u64) -> Duration {
    Duration::from_secs(
        std::env::var(var).ok().and_then(|s| s.parse().ok()).unwrap_or(default),
    )
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
