// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! sweep-masterd: fleet master daemon.
//!
//! Runs the agent-facing TCP plane, the inactivity sweeper, and
//! (unless disabled) the admin HTTP API, all on one runtime.

use std::error::Error;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

use sweep_core::SystemClock;
use sweep_master::{api, env, listener, master::Master, sweep};
use sweep_storage::Store;

#[tokio::main]
async fn main() -> ExitCode {
    let log_dir = env::log_dir();
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::never(&log_dir, "master.log");
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(file_writer.and(std::io::stderr))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "master failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn Error>> {
    let db_path = env::db_path();
    info!(db = %db_path.display(), "opening store");
    let store = Arc::new(Store::open(&db_path)?);
    let master = Master::new(store, SystemClock);

    let agent_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), env::master_port());
    let agent_listener = listener::bind(agent_addr)?;
    tokio::spawn(listener::run(agent_listener, Arc::clone(&master)));
    tokio::spawn(sweep::run_inactivity_sweeper(Arc::clone(&master)));

    if env::start_with_ui() {
        let admin_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), env::admin_port());
        let admin_listener = tokio::net::TcpListener::bind(admin_addr).await?;
        info!(%admin_addr, "admin API listening");
        axum::serve(admin_listener, api::routes(master))
            .with_graceful_shutdown(shutdown_signal())
            .await?;
    } else {
        info!("admin API disabled, running TCP plane only");
        shutdown_signal().await;
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
    }
}
