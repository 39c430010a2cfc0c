// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! sweep-agentd: endpoint agent daemon.

use std::process::ExitCode;

use tracing::error;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

use sweep_agent::{Agent, AgentConfig};

#[tokio::main]
async fn main() -> ExitCode {
    let config = AgentConfig::from_env();

    let _ = std::fs::create_dir_all(&config.log_dir);
    let file_appender = tracing_appender::rolling::never(&config.log_dir, "agent.log");
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(file_writer.and(std::io::stderr))
        .init();

    let mut agent = match Agent::new(config) {
        Ok(agent) => agent,
        Err(e) => {
            error!(error = %e, "agent setup failed");
            return ExitCode::FAILURE;
        }
    };
    agent.run().await;
    ExitCode::SUCCESS
}
