// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task ID generation

use uuid::Uuid;

/// Generate a fresh scan task id: `scan-` followed by 8 hex chars.
pub fn new_task_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("scan-{}", &hex[..8])
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
