// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admin API handlers.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use sweep_core::{
    epoch_ms_to_iso, new_task_id, time_fmt, AgentStatus, AuditAction, Clock, NewAuditEntry,
    PendingFile,
};
use sweep_wire::{ApprovedEntry, CustomRule, Message};

use super::error::ApiError;
use crate::master::Master;
use crate::{dispatch, instructions};

/// The agent that decided a projected audit row.
const ACTION_BY_AGENT: &str = "agent";
/// The console operator; there is no per-admin identity.
const ACTION_BY_ADMIN: &str = "admin";

#[derive(Debug, Deserialize)]
pub struct SubmitInstructionRequest {
    #[serde(default)]
    pub instruction: Option<String>,
    #[serde(default)]
    pub target_languages: Option<Vec<String>>,
}

/// `POST /submit-instruction`: dispatch a scan to live agents.
pub async fn submit_instruction<C: Clock + 'static>(
    State(master): State<Arc<Master<C>>>,
    Json(req): Json<SubmitInstructionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let languages: Vec<String> = match req.target_languages.filter(|l| !l.is_empty()) {
        Some(languages) => languages
            .iter()
            .map(|l| l.trim().to_lowercase())
            .filter(|l| !l.is_empty())
            .collect(),
        None => {
            let instruction = req.instruction.unwrap_or_default();
            let instruction = instruction.trim();
            if instruction.is_empty() {
                return Err(ApiError::BadRequest("Instruction cannot be empty".to_string()));
            }
            instructions::infer_languages(instruction)
        }
    };

    let task = instructions::create_scan_instruction(&languages, None)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    if master.registry.get_active().is_empty() {
        return Err(ApiError::BadRequest("No active agents available".to_string()));
    }

    let outcome = dispatch::dispatch_to_live(&master, &task).await?;
    info!(task_id = %outcome.task_id, sent = outcome.sent, "instruction dispatched");

    Ok(Json(json!({
        "message": format!("Instruction dispatched to {} agent(s)", outcome.sent),
        "task_id": outcome.task_id,
        "target_languages": languages,
        "failed_agents": outcome.failed,
    })))
}

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    #[serde(default)]
    pub target_language: Option<String>,
    #[serde(default)]
    pub custom_name: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub extension: Option<String>,
    #[serde(default)]
    pub pattern: Option<String>,
}

/// `POST /scan`: dispatch to the whole persisted fleet, queueing tasks
/// for agents without a live socket.
pub async fn scan<C: Clock + 'static>(
    State(master): State<Arc<Master<C>>>,
    Json(req): Json<ScanRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let task = match req.target_language.as_deref() {
        Some(language) if language != "Other" => {
            instructions::create_scan_instruction(&[language.trim().to_lowercase()], None)
                .map_err(|e| ApiError::BadRequest(e.to_string()))?
        }
        _ => Message::ScanTask {
            task_id: new_task_id(),
            target_languages: Vec::new(),
            date_filter: None,
            custom: Some(CustomRule {
                name: req.custom_name,
                keywords: req.keywords,
                extension: req.extension,
                pattern: req.pattern,
            }),
            created_at: Some(time_fmt::now_iso()),
        },
    };

    let outcome = dispatch::dispatch_to_fleet(&master, &task).await?;
    if outcome.sent == 0 && outcome.queued == 0 {
        return Err(ApiError::BadRequest("No active agents available".to_string()));
    }

    Ok(Json(json!({
        "task_id": outcome.task_id,
        "sent": outcome.sent,
        "queued": outcome.queued,
        "failed_agents": outcome.failed,
        "results": [],
    })))
}

#[derive(Debug, Deserialize)]
pub struct ScanResultsQuery {
    pub task_id: Option<String>,
}

/// `GET /scan-results?task_id=...`: the collector's per-agent map.
pub async fn scan_results<C: Clock + 'static>(
    State(master): State<Arc<Master<C>>>,
    Query(query): Query<ScanResultsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let task_id = query
        .task_id
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::BadRequest("task_id required".to_string()))?;

    Ok(Json(json!({
        "task_id": task_id,
        "results": master.collector.task_results(&task_id),
    })))
}

/// `GET /clients-status`: agents seen within the last 60 s.
pub async fn clients_status<C: Clock + 'static>(
    State(master): State<Arc<Master<C>>>,
) -> Result<impl IntoResponse, ApiError> {
    let now_ms = master.clock.epoch_ms();

    // Persisted rows first, then live registry entries on top so a
    // socket connected right now always wins.
    let mut merged: BTreeMap<String, (AgentStatus, u64)> = master
        .store
        .list_agents()
        .into_iter()
        .map(|row| (row.agent_ip, (row.status, row.last_seen_ms)))
        .collect();
    for (ip, info) in master.registry.get_active() {
        merged.insert(ip, (info.status, info.last_seen_ms));
    }

    let mut list = Vec::new();
    let mut idx = 1usize;
    for (ip, (status, last_seen_ms)) in merged {
        if now_ms.saturating_sub(last_seen_ms) >= 60_000 {
            continue;
        }
        list.push(json!({
            "id": idx,
            "name": format!("Agent {idx}"),
            "ip": ip,
            "ip_address": ip,
            "status": if status == AgentStatus::Offline { "offline" } else { "online" },
            "raw_status": status.to_string(),
            "last_seen": epoch_ms_to_iso(last_seen_ms),
        }));
        idx += 1;
    }
    Ok(Json(list))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub search: String,
}

/// `GET /files-preview?search=...`: the pending review queue.
pub async fn files_preview<C: Clock + 'static>(
    State(master): State<Arc<Master<C>>>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = master.store.list_pending_files(Some(query.search.trim()));
    let view: Vec<serde_json::Value> = rows.iter().map(pending_view).collect();
    Ok(Json(view))
}

fn pending_view(row: &PendingFile) -> serde_json::Value {
    json!({
        "id": row.id,
        "task_id": row.task_id,
        "agent_ip": row.agent_ip,
        "file_hash": row.file_hash,
        "filename": row.filename,
        "path": row.path,
        "language": row.language,
        "confidence": row.confidence,
        "reason": row.reason,
        "created_at": epoch_ms_to_iso(row.created_at_ms),
        "status": "pending",
    })
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

struct AuditView {
    id: String,
    record_id: String,
    task_id: String,
    agent_ip: String,
    file_hash: String,
    filename: String,
    path: String,
    language: Option<String>,
    confidence: Option<f64>,
    action: String,
    action_by: String,
    notes: String,
    created_at_ms: u64,
}

/// `GET /audit-logs?limit=N`: audit rows merged with deletion-report
/// projections, newest first.
///
/// Two noise filters: `delete_dispatch_failed` rows stay in the store
/// but are hidden here, and a `delete_failed` projection is hidden once
/// a `delete_confirmed` exists for the same file.
pub async fn audit_logs<C: Clock + 'static>(
    State(master): State<Arc<Master<C>>>,
    Query(query): Query<LimitQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.unwrap_or(200).clamp(1, 1000);

    let mut rows: Vec<AuditView> = Vec::new();
    for entry in master.store.list_audit(limit) {
        if entry.action == AuditAction::DeleteDispatchFailed {
            continue;
        }
        rows.push(AuditView {
            id: entry.id.to_string(),
            record_id: entry.record_id,
            task_id: entry.task_id,
            agent_ip: entry.agent_ip,
            file_hash: entry.file_hash,
            filename: entry.filename,
            path: entry.path,
            language: entry.language,
            confidence: entry.confidence,
            action: entry.action.to_string(),
            action_by: entry.action_by,
            notes: entry.notes,
            created_at_ms: entry.created_at_ms,
        });
    }

    for report in master.store.list_deletion_reports(limit) {
        let filename = report
            .path
            .rsplit(['/', '\\'])
            .next()
            .filter(|name| !name.is_empty())
            .unwrap_or("unknown")
            .to_string();
        rows.push(AuditView {
            id: format!("rep-{}", report.id),
            record_id: String::new(),
            task_id: report.task_id,
            agent_ip: report.agent_ip,
            file_hash: report.file_hash,
            filename,
            path: report.path,
            language: None,
            confidence: None,
            action: if report.status == "deleted" {
                AuditAction::DeleteConfirmed.to_string()
            } else {
                AuditAction::DeleteFailed.to_string()
            },
            action_by: ACTION_BY_AGENT.to_string(),
            notes: report.details,
            created_at_ms: report.created_at_ms,
        });
    }

    rows.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms).then(b.id.cmp(&a.id)));

    // If the same file has a confirmed deletion, drop failed-not-found
    // noise rows for it.
    let confirmed: HashSet<(String, String, String, String)> = rows
        .iter()
        .filter(|row| row.action == "delete_confirmed")
        .map(audit_key)
        .collect();
    rows.retain(|row| row.action != "delete_failed" || !confirmed.contains(&audit_key(row)));
    rows.truncate(limit);

    let view: Vec<serde_json::Value> = rows
        .iter()
        .map(|row| {
            json!({
                "id": row.id,
                "record_id": row.record_id,
                "task_id": row.task_id,
                "agent_ip": row.agent_ip,
                "file_hash": row.file_hash,
                "filename": row.filename,
                "path": row.path,
                "language": row.language,
                "confidence": row.confidence,
                "action": row.action,
                "action_by": row.action_by,
                "notes": row.notes,
                "created_at": epoch_ms_to_iso(row.created_at_ms),
            })
        })
        .collect();
    Ok(Json(view))
}

fn audit_key(row: &AuditView) -> (String, String, String, String) {
    (row.task_id.clone(), row.agent_ip.clone(), row.file_hash.clone(), row.path.clone())
}

#[derive(Debug, Deserialize)]
pub struct FileIdsRequest {
    #[serde(default)]
    pub file_ids: Vec<String>,
}

/// `POST /approve-deletion`: turn selected pending rows into delete
/// commands, immediately sent or queued per agent.
pub async fn approve_deletion<C: Clock + 'static>(
    State(master): State<Arc<Master<C>>>,
    Json(req): Json<FileIdsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.file_ids.is_empty() {
        return Err(ApiError::BadRequest("file_ids must be a non-empty list".to_string()));
    }
    let selected = master.store.get_pending_by_ids(&req.file_ids);
    if selected.is_empty() {
        return Err(ApiError::NotFound("No matching pending files found".to_string()));
    }

    let mut groups: BTreeMap<(String, String), Vec<&PendingFile>> = BTreeMap::new();
    for row in &selected {
        groups.entry((row.agent_ip.clone(), row.task_id.clone())).or_default().push(row);
    }

    let mut sent_to = 0usize;
    let mut queued = 0usize;
    let mut delivered_ids: HashSet<String> = HashSet::new();
    let mut queued_ids: HashSet<String> = HashSet::new();
    let mut undelivered_agents: Vec<String> = Vec::new();

    for ((agent_ip, task_id), rows) in &groups {
        let approved_entries: Vec<ApprovedEntry> = rows
            .iter()
            .map(|row| ApprovedEntry {
                file_hash: row.file_hash.clone(),
                path: row.path.clone(),
                record_id: row.id.clone(),
            })
            .collect();
        let payload = Message::DeleteApproved {
            task_id: task_id.clone(),
            approved_hashes: approved_entries
                .iter()
                .filter(|e| !e.file_hash.is_empty())
                .map(|e| e.file_hash.clone())
                .collect(),
            approved_entries,
            timestamp: time_fmt::now_iso(),
        };

        // Immediate send on a live socket; anything else falls back to
        // the queue so the next heartbeat delivers it.
        let sent = match master.registry.sender_for(agent_ip) {
            Some(sender) => match sender.send(&payload).await {
                Ok(()) => {
                    master.registry.update_status(agent_ip, AgentStatus::DeletionDispatched)?;
                    sent_to += 1;
                    delivered_ids.extend(rows.iter().map(|row| row.id.clone()));
                    true
                }
                Err(e) => {
                    warn!(agent_ip = %agent_ip, error = %e, "delete dispatch failed, queueing");
                    false
                }
            },
            None => false,
        };

        if !sent {
            let payload_value = serde_json::to_value(&payload).map_err(sweep_storage::StoreError::from)?;
            match master.store.enqueue_delete_command(
                agent_ip,
                task_id,
                payload_value,
                master.clock.epoch_ms(),
            ) {
                Ok(_) => {
                    queued += 1;
                    queued_ids.extend(rows.iter().map(|row| row.id.clone()));
                    info!(agent_ip = %agent_ip, task_id = %task_id, "delete command queued");
                }
                Err(e) => {
                    warn!(agent_ip = %agent_ip, error = %e, "failed to queue delete command");
                    undelivered_agents.push(agent_ip.clone());
                }
            }
        }
    }

    let delivered: Vec<&PendingFile> =
        selected.iter().filter(|row| delivered_ids.contains(&row.id)).collect();
    let queued_rows: Vec<&PendingFile> =
        selected.iter().filter(|row| queued_ids.contains(&row.id)).collect();
    let undelivered: Vec<&PendingFile> = selected
        .iter()
        .filter(|row| !delivered_ids.contains(&row.id) && !queued_ids.contains(&row.id))
        .collect();

    let now_ms = master.clock.epoch_ms();
    if !delivered.is_empty() {
        master.store.add_audit_entries(
            audit_entries(
                &delivered,
                AuditAction::DeleteDispatched,
                &format!("Approved in UI and dispatched to {sent_to} agent(s)"),
            ),
            now_ms,
        )?;
        let ids: Vec<String> = delivered.iter().map(|row| row.id.clone()).collect();
        master.store.delete_pending_by_ids(&ids)?;
    }
    if !queued_rows.is_empty() {
        master.store.add_audit_entries(
            audit_entries(
                &queued_rows,
                AuditAction::DeleteQueued,
                "Delete command queued; will dispatch on next agent heartbeat",
            ),
            now_ms,
        )?;
    }
    if !undelivered.is_empty() {
        master.store.add_audit_entries(
            audit_entries(
                &undelivered,
                AuditAction::DeleteDispatchFailed,
                "Agent not connected or dispatch failed; kept pending",
            ),
            now_ms,
        )?;
    }

    undelivered_agents.sort();
    undelivered_agents.dedup();
    Ok(Json(json!({
        "message": format!(
            "Dispatch success: {} file(s), queued: {} file(s), failed: {} file(s).",
            delivered.len(),
            queued_rows.len(),
            undelivered.len(),
        ),
        "sent_to_agents": sent_to,
        "queued_agents": queued,
        "undelivered_agents": undelivered_agents,
    })))
}

/// `POST /reject-deletion`: audit and drop selected pending rows.
pub async fn reject_deletion<C: Clock + 'static>(
    State(master): State<Arc<Master<C>>>,
    Json(req): Json<FileIdsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.file_ids.is_empty() {
        return Err(ApiError::BadRequest("file_ids must be a non-empty list".to_string()));
    }
    let selected = master.store.get_pending_by_ids(&req.file_ids);
    if selected.is_empty() {
        return Err(ApiError::NotFound("No matching pending files found".to_string()));
    }

    let rows: Vec<&PendingFile> = selected.iter().collect();
    master.store.add_audit_entries(
        audit_entries(&rows, AuditAction::Rejected, "Rejected in UI"),
        master.clock.epoch_ms(),
    )?;
    let ids: Vec<String> = selected.iter().map(|row| row.id.clone()).collect();
    master.store.delete_pending_by_ids(&ids)?;

    Ok(Json(json!({ "message": format!("Rejected {} file(s)", selected.len()) })))
}

fn audit_entries(rows: &[&PendingFile], action: AuditAction, notes: &str) -> Vec<NewAuditEntry> {
    rows.iter()
        .map(|row| NewAuditEntry {
            record_id: row.id.clone(),
            task_id: row.task_id.clone(),
            agent_ip: row.agent_ip.clone(),
            file_hash: row.file_hash.clone(),
            filename: row.filename.clone(),
            path: row.path.clone(),
            language: row.language.clone(),
            confidence: Some(row.confidence),
            action,
            action_by: ACTION_BY_ADMIN.to_string(),
            notes: notes.to_string(),
        })
        .collect()
}

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;
