// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-half handle for a connected agent's socket.

use std::sync::Arc;

use tokio::io::AsyncWrite;
use tokio::sync::Mutex;

use sweep_wire::{write_frame, write_message, Message, ProtocolError};

/// Clonable sender over one agent socket.
///
/// All writes to an agent go through this handle, which serializes
/// concurrent senders (the connection handler's queue drains and the
/// admin API's immediate dispatch) so frames never interleave.
#[derive(Clone)]
pub struct AgentSender {
    writer: Arc<Mutex<Box<dyn AsyncWrite + Send + Unpin>>>,
}

impl AgentSender {
    pub fn new(writer: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        Self { writer: Arc::new(Mutex::new(Box::new(writer))) }
    }

    /// Send one typed message as a frame.
    pub async fn send(&self, message: &Message) -> Result<(), ProtocolError> {
        let mut writer = self.writer.lock().await;
        write_frame(&mut *writer, message).await
    }

    /// Send pre-encoded JSON (queued payloads are stored verbatim).
    pub async fn send_raw(&self, payload: &[u8]) -> Result<(), ProtocolError> {
        let mut writer = self.writer.lock().await;
        write_message(&mut *writer, payload).await
    }
}

impl std::fmt::Debug for AgentSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentSender").finish_non_exhaustive()
    }
}
