// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the master.

use std::path::PathBuf;

/// Resolve the state directory: `SWEEP_STATE_DIR` >
/// `XDG_STATE_HOME/sweep` > `~/.local/state/sweep`.
pub fn state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("SWEEP_STATE_DIR") {
        return PathBuf::from(dir);
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("sweep");
    }
    dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".local/state/sweep")
}

/// Path of the embedded store (`APP_DB_PATH`).
pub fn db_path() -> PathBuf {
    std::env::var("APP_DB_PATH").map(PathBuf::from).unwrap_or_else(|_| state_dir().join("app.json"))
}

/// Directory for the master log file (`LOG_DIR`).
pub fn log_dir() -> PathBuf {
    std::env::var("LOG_DIR").map(PathBuf::from).unwrap_or_else(|_| state_dir().join("logs"))
}

/// Agent-facing TCP port (`MASTER_PORT`, default 5000).
pub fn master_port() -> u16 {
    std::env::var("MASTER_PORT").ok().and_then(|s| s.parse().ok()).unwrap_or(5000)
}

/// Admin API port (`ADMIN_PORT`, default 8080).
pub fn admin_port() -> u16 {
    std::env::var("ADMIN_PORT").ok().and_then(|s| s.parse().ok()).unwrap_or(8080)
}

/// Whether to serve the admin API alongside the TCP plane
/// (`START_MASTER_WITH_UI`, default on).
pub fn start_with_ui() -> bool {
    std::env::var("START_MASTER_WITH_UI").map(|v| v != "0").unwrap_or(true)
}
