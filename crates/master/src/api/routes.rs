// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Route definitions for the admin API.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use sweep_core::Clock;

use super::handlers;
use crate::master::Master;

/// Creates the router with all admin routes.
pub fn routes<C: Clock + 'static>(master: Arc<Master<C>>) -> Router {
    Router::new()
        .route("/submit-instruction", post(handlers::submit_instruction::<C>))
        .route("/scan", post(handlers::scan::<C>))
        .route("/scan-results", get(handlers::scan_results::<C>))
        .route("/clients-status", get(handlers::clients_status::<C>))
        .route("/files-preview", get(handlers::files_preview::<C>))
        .route("/audit-logs", get(handlers::audit_logs::<C>))
        .route("/approve-deletion", post(handlers::approve_deletion::<C>))
        .route("/reject-deletion", post(handlers::reject_deletion::<C>))
        .with_state(master)
}
