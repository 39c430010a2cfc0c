// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-agent connection handler: the protocol state machine.
//!
//! One instance runs per accepted connection. The first frame must be a
//! registration; after that the loop reads frames until EOF, touching
//! liveness on every frame and draining queued work on heartbeats.

use std::sync::Arc;

use tracing::{debug, info, warn};

use sweep_core::{AgentStatus, Clock, NewReport};
use sweep_storage::StoreError;
use sweep_wire::{read_frame, result_findings, Message, ProtocolError, ReportEntry};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::dispatch;
use crate::master::Master;
use crate::sender::AgentSender;

/// Errors that end one agent connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("invalid registration message")]
    InvalidRegistration,
}

/// Drive one agent connection to completion.
///
/// Never lets a connection failure escape: errors are logged and the
/// agent is flagged OFFLINE on the way out.
pub async fn handle_agent<C, R, W>(reader: R, writer: W, agent_ip: String, master: Arc<Master<C>>)
where
    C: Clock,
    R: AsyncRead + Unpin,
    W: AsyncWrite + Send + Unpin + 'static,
{
    if let Err(e) = run_connection(reader, writer, &agent_ip, &master).await {
        warn!(agent_ip = %agent_ip, error = %e, "agent connection error");
    }
    if let Err(e) = master.registry.remove(&agent_ip) {
        warn!(agent_ip = %agent_ip, error = %e, "failed to flag agent offline");
    }
    info!(agent_ip = %agent_ip, "agent disconnected");
}

async fn run_connection<C, R, W>(
    mut reader: R,
    writer: W,
    agent_ip: &str,
    master: &Master<C>,
) -> Result<(), ConnectionError>
where
    C: Clock,
    R: AsyncRead + Unpin,
    W: AsyncWrite + Send + Unpin + 'static,
{
    let sender = AgentSender::new(writer);

    // Registration must be the first frame on every connection.
    let client_id = match read_frame(&mut reader).await {
        Ok(Message::Register { client_id, .. }) => {
            (!client_id.is_empty()).then_some(client_id)
        }
        Ok(other) => {
            warn!(agent_ip, kind = other.kind(), "expected registration frame");
            return Err(ConnectionError::InvalidRegistration);
        }
        Err(_) => return Err(ConnectionError::InvalidRegistration),
    };
    master.registry.register(agent_ip, client_id.as_deref(), sender.clone())?;
    info!(agent_ip, client_id = client_id.as_deref().unwrap_or(""), "agent registered");

    // Kick off a scan right away so a fresh agent has work.
    dispatch::dispatch_scan_task(master, &sender, agent_ip, None).await;

    loop {
        let message = match read_frame(&mut reader).await {
            Ok(message) => message,
            Err(ProtocolError::ConnectionClosed) => break,
            Err(e) => return Err(e.into()),
        };

        master.registry.touch(agent_ip)?;

        match message {
            Message::Heartbeat { .. } => {
                debug!(agent_ip, "heartbeat");
                drain_delete_commands(master, &sender, agent_ip).await?;
                drain_tasks(master, &sender, agent_ip).await?;
            }

            Message::ScanResults { task_id, files, results, .. } => {
                let task_id = normalize_task_id(task_id);
                let findings = result_findings(&files, &results);
                master.collector.ingest(
                    &master.store,
                    agent_ip,
                    &task_id,
                    findings,
                    master.clock.epoch_ms(),
                )?;
                master.registry.update_status(agent_ip, AgentStatus::AwaitingApproval)?;
                info!(agent_ip, task_id = %task_id, files = findings.len(), "scan result received");
            }

            Message::DeletionReport { task_id, reports, .. } => {
                let task_id = normalize_task_id(task_id);
                let reports: Vec<NewReport> = reports.iter().map(new_report).collect();
                let now_ms = master.clock.epoch_ms();
                master.store.add_deletion_reports(agent_ip, &task_id, &reports, now_ms)?;
                master.store.remove_pending_after_deletion_report(agent_ip, &task_id, &reports)?;
                master.registry.update_status(agent_ip, AgentStatus::Idle)?;

                let deleted = reports.iter().filter(|r| r.status == "deleted").count();
                info!(
                    agent_ip,
                    task_id = %task_id,
                    deleted,
                    total = reports.len(),
                    "deletion report received"
                );
                drain_delete_commands(master, &sender, agent_ip).await?;
            }

            other => {
                warn!(agent_ip, kind = other.kind(), "unknown message type, ignoring");
            }
        }
    }
    Ok(())
}

fn normalize_task_id(task_id: String) -> String {
    if task_id.is_empty() {
        "unknown-task".to_string()
    } else {
        task_id
    }
}

fn new_report(entry: &ReportEntry) -> NewReport {
    NewReport {
        file_hash: entry.file_hash.clone(),
        path: entry.path.clone(),
        status: entry.status.as_str().to_string(),
        details: entry.details.clone(),
    }
}

/// Deliver queued delete commands in FIFO order.
///
/// Stops at the first send failure; the failed command stays pending for
/// the next heartbeat.
async fn drain_delete_commands<C: Clock>(
    master: &Master<C>,
    sender: &AgentSender,
    agent_ip: &str,
) -> Result<(), ConnectionError> {
    let commands = master.store.fetch_pending_delete_commands(agent_ip, 20);
    for command in commands {
        let payload = serde_json::to_vec(&command.payload).map_err(StoreError::from)?;
        match sender.send_raw(&payload).await {
            Ok(()) => {
                master.store.mark_delete_command_sent(command.id, master.clock.epoch_ms())?;
                info!(agent_ip, id = command.id, "queued delete command sent");
            }
            Err(e) => {
                master.store.mark_delete_command_failed(command.id, &e.to_string())?;
                warn!(agent_ip, id = command.id, error = %e, "queued delete command failed");
                break;
            }
        }
    }
    Ok(())
}

/// Deliver queued scan tasks in FIFO order; same failure policy as
/// delete commands.
async fn drain_tasks<C: Clock>(
    master: &Master<C>,
    sender: &AgentSender,
    agent_ip: &str,
) -> Result<(), ConnectionError> {
    let tasks = master.store.fetch_pending_tasks(agent_ip, 20);
    for task in tasks {
        let payload = serde_json::to_vec(&task.payload).map_err(StoreError::from)?;
        match sender.send_raw(&payload).await {
            Ok(()) => {
                master.store.mark_task_sent(task.id, master.clock.epoch_ms())?;
                info!(agent_ip, id = task.id, "queued scan task sent");
            }
            Err(e) => {
                master.store.mark_task_failed(task.id, &e.to_string())?;
                warn!(agent_ip, id = task.id, error = %e, "queued scan task failed");
                break;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "connection_tests.rs"]
mod tests;
