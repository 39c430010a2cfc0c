// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background liveness sweeper.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use sweep_core::Clock;

use crate::master::Master;

/// How often the sweeper checks for stale agents.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(10);

/// Inactivity window after which an agent is flagged OFFLINE. The
/// `/clients-status` online filter uses the same value.
pub const OFFLINE_TIMEOUT: Duration = Duration::from_secs(60);

/// Periodically flag agents unseen for [`OFFLINE_TIMEOUT`] as OFFLINE.
pub async fn run_inactivity_sweeper<C: Clock>(master: Arc<Master<C>>) {
    let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        if let Err(e) = master.registry.mark_offline_inactive(OFFLINE_TIMEOUT) {
            warn!(error = %e, "inactivity sweep failed");
        }
    }
}
