// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builds scan tasks and routes them to agents, live or queued.

use tracing::{info, warn};

use sweep_core::{new_task_id, time_fmt, AgentStatus, Clock};
use sweep_storage::StoreError;
use sweep_wire::Message;

use crate::master::Master;
use crate::sender::AgentSender;

/// The task sent to every agent right after registration.
pub fn default_scan_task() -> Message {
    Message::ScanTask {
        task_id: new_task_id(),
        target_languages: vec!["python".to_string()],
        date_filter: None,
        custom: None,
        created_at: Some(time_fmt::now_iso()),
    }
}

/// The `task_id` carried by a task message, empty for other kinds.
pub fn task_id_of(task: &Message) -> &str {
    match task {
        Message::ScanTask { task_id, .. } => task_id,
        _ => "",
    }
}

/// Send a scan task to a connected agent and move it to SCANNING.
///
/// Failures are logged and swallowed; the caller's connection loop
/// carries on either way.
pub async fn dispatch_scan_task<C: Clock>(
    master: &Master<C>,
    sender: &AgentSender,
    agent_ip: &str,
    task: Option<Message>,
) {
    let task = task.unwrap_or_else(default_scan_task);
    match sender.send(&task).await {
        Ok(()) => {
            if let Err(e) = master.registry.update_status(agent_ip, AgentStatus::Scanning) {
                warn!(agent_ip, error = %e, "failed to persist SCANNING status");
            }
            info!(agent_ip, task_id = task_id_of(&task), "scan task dispatched");
        }
        Err(e) => warn!(agent_ip, error = %e, "failed to dispatch scan task"),
    }
}

/// Outcome of a fleet-wide dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub task_id: String,
    pub sent: usize,
    pub queued: usize,
    pub failed: Vec<String>,
}

/// Send a task to every persisted agent not marked OFFLINE.
///
/// Agents with a live socket get the task immediately; the rest get it
/// queued for delivery on their next heartbeat.
pub async fn dispatch_to_fleet<C: Clock>(
    master: &Master<C>,
    task: &Message,
) -> Result<DispatchOutcome, StoreError> {
    let task_id = task_id_of(task).to_string();
    let payload = serde_json::to_value(task)?;

    let mut outcome = DispatchOutcome { task_id, sent: 0, queued: 0, failed: Vec::new() };
    for agent in master.store.list_agents() {
        if agent.status == AgentStatus::Offline {
            continue;
        }
        match master.registry.sender_for(&agent.agent_ip) {
            Some(sender) => match sender.send(task).await {
                Ok(()) => {
                    master.registry.update_status(&agent.agent_ip, AgentStatus::Scanning)?;
                    outcome.sent += 1;
                }
                Err(e) => {
                    warn!(agent_ip = %agent.agent_ip, error = %e, "fleet dispatch failed");
                    outcome.failed.push(agent.agent_ip);
                }
            },
            None => {
                master.store.enqueue_task(
                    &agent.agent_ip,
                    &outcome.task_id,
                    payload.clone(),
                    master.clock.epoch_ms(),
                )?;
                info!(agent_ip = %agent.agent_ip, task_id = %outcome.task_id, "scan task queued");
                outcome.queued += 1;
            }
        }
    }
    Ok(outcome)
}

/// Send a task to live connections only; no queueing for the rest.
pub async fn dispatch_to_live<C: Clock>(
    master: &Master<C>,
    task: &Message,
) -> Result<DispatchOutcome, StoreError> {
    let task_id = task_id_of(task).to_string();
    let mut outcome = DispatchOutcome { task_id, sent: 0, queued: 0, failed: Vec::new() };

    for (agent_ip, _) in master.registry.get_active() {
        match master.registry.sender_for(&agent_ip) {
            Some(sender) => match sender.send(task).await {
                Ok(()) => {
                    master.registry.update_status(&agent_ip, AgentStatus::Scanning)?;
                    outcome.sent += 1;
                }
                Err(e) => {
                    warn!(agent_ip = %agent_ip, error = %e, "live dispatch failed");
                    outcome.failed.push(agent_ip);
                }
            },
            None => outcome.failed.push(agent_ip),
        }
    }
    Ok(outcome)
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
