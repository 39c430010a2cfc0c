// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory mirror of the live agent fleet.
//!
//! The registry is the authority on who currently holds a socket; the
//! store is the authority on last-known status across restarts. Every
//! mutation here mirrors to the store so a restarted master recovers
//! agent state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::info;

use sweep_core::{AgentStatus, Clock};
use sweep_storage::{Store, StoreError};

use crate::sender::AgentSender;

/// Registry view of one agent, without the socket handle.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentInfo {
    pub status: AgentStatus,
    pub last_seen_ms: u64,
    pub client_id: Option<String>,
}

struct LiveAgent {
    status: AgentStatus,
    last_seen_ms: u64,
    client_id: Option<String>,
    /// Live socket handle; never persisted, absent once disconnected
    sender: Option<AgentSender>,
}

/// Thread-safe live agent map.
#[derive(Clone)]
pub struct Registry<C: Clock> {
    agents: Arc<Mutex<HashMap<String, LiveAgent>>>,
    store: Arc<Store>,
    clock: C,
}

impl<C: Clock> Registry<C> {
    pub fn new(store: Arc<Store>, clock: C) -> Self {
        Self { agents: Arc::new(Mutex::new(HashMap::new())), store, clock }
    }

    /// Track a freshly registered connection.
    pub fn register(
        &self,
        agent_ip: &str,
        client_id: Option<&str>,
        sender: AgentSender,
    ) -> Result<(), StoreError> {
        let now_ms = self.clock.epoch_ms();
        self.agents.lock().insert(
            agent_ip.to_string(),
            LiveAgent {
                status: AgentStatus::Idle,
                last_seen_ms: now_ms,
                client_id: client_id.map(str::to_string),
                sender: Some(sender),
            },
        );
        self.store.upsert_agent(agent_ip, AgentStatus::Idle, client_id, now_ms)
    }

    /// Transition an agent's status, refreshing `last_seen`.
    pub fn update_status(&self, agent_ip: &str, status: AgentStatus) -> Result<(), StoreError> {
        let now_ms = self.clock.epoch_ms();
        if let Some(agent) = self.agents.lock().get_mut(agent_ip) {
            agent.status = status;
            agent.last_seen_ms = now_ms;
        }
        self.store.upsert_agent(agent_ip, status, None, now_ms)
    }

    /// Refresh `last_seen` only.
    pub fn touch(&self, agent_ip: &str) -> Result<(), StoreError> {
        let now_ms = self.clock.epoch_ms();
        if let Some(agent) = self.agents.lock().get_mut(agent_ip) {
            agent.last_seen_ms = now_ms;
        }
        self.store.touch_agent(agent_ip, now_ms)
    }

    /// Drop the live entry and flag the agent OFFLINE in the store.
    pub fn remove(&self, agent_ip: &str) -> Result<(), StoreError> {
        self.agents.lock().remove(agent_ip);
        self.store.upsert_agent(agent_ip, AgentStatus::Offline, None, self.clock.epoch_ms())
    }

    /// All in-memory agents not currently OFFLINE.
    pub fn get_active(&self) -> Vec<(String, AgentInfo)> {
        let agents = self.agents.lock();
        let mut active: Vec<(String, AgentInfo)> = agents
            .iter()
            .filter(|(_, agent)| agent.status != AgentStatus::Offline)
            .map(|(ip, agent)| {
                (
                    ip.clone(),
                    AgentInfo {
                        status: agent.status,
                        last_seen_ms: agent.last_seen_ms,
                        client_id: agent.client_id.clone(),
                    },
                )
            })
            .collect();
        active.sort_by(|a, b| a.0.cmp(&b.0));
        active
    }

    /// The live socket handle for an agent, if one is connected.
    pub fn sender_for(&self, agent_ip: &str) -> Option<AgentSender> {
        self.agents.lock().get(agent_ip).and_then(|agent| agent.sender.clone())
    }

    /// Flag agents unseen for longer than `timeout` as OFFLINE, in memory
    /// and in the store.
    pub fn mark_offline_inactive(&self, timeout: Duration) -> Result<(), StoreError> {
        let now_ms = self.clock.epoch_ms();
        let timeout_ms = timeout.as_millis() as u64;

        let stale: Vec<String> = {
            let mut agents = self.agents.lock();
            let mut stale = Vec::new();
            for (ip, agent) in agents.iter_mut() {
                if agent.status != AgentStatus::Offline
                    && now_ms.saturating_sub(agent.last_seen_ms) > timeout_ms
                {
                    agent.status = AgentStatus::Offline;
                    stale.push(ip.clone());
                }
            }
            stale
        };

        for ip in stale {
            info!(agent_ip = %ip, "agent inactive, marking OFFLINE");
            self.store.set_agent_status(&ip, AgentStatus::Offline)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
