// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timestamp rendering for API responses and logs.

use chrono::{DateTime, Utc};

/// Render epoch milliseconds as an RFC 3339 / ISO-8601 UTC timestamp.
pub fn epoch_ms_to_iso(ms: u64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms as i64)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
        .to_rfc3339()
}

/// Current wall-clock time as an ISO-8601 string, for wire timestamps.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
