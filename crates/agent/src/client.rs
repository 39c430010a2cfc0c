// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Framed TCP link to the master.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{info, warn};

use sweep_wire::{read_frame, write_frame, Message, ProtocolError};

/// Shared write half; the heartbeat task and the main loop both send
/// through this lock.
pub type SharedWriter = Arc<Mutex<OwnedWriteHalf>>;

/// One connection attempt's worth of link state.
pub struct MasterLink {
    addr: String,
    client_id: String,
    reader: Option<OwnedReadHalf>,
    writer: Option<SharedWriter>,
}

impl MasterLink {
    pub fn new(addr: String, client_id: String) -> Self {
        Self { addr, client_id, reader: None, writer: None }
    }

    pub fn is_connected(&self) -> bool {
        self.reader.is_some()
    }

    /// Connect and send the registration frame.
    pub async fn connect(&mut self) -> Result<(), ProtocolError> {
        let stream = TcpStream::connect(&self.addr).await?;
        let (reader, writer) = stream.into_split();
        let writer = Arc::new(Mutex::new(writer));

        let register = Message::Register {
            client_id: self.client_id.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        {
            let mut guard = writer.lock().await;
            write_frame(&mut *guard, &register).await?;
        }

        self.reader = Some(reader);
        self.writer = Some(writer);
        info!(addr = %self.addr, "connected to master");
        Ok(())
    }

    /// Drop both halves; a later [`connect`](Self::connect) starts fresh.
    pub fn disconnect(&mut self) {
        self.reader = None;
        self.writer = None;
    }

    /// Read one frame with a short timeout.
    ///
    /// `Ok(None)` is a timeout (connection still healthy). Errors mean
    /// the connection is gone and the caller should reconnect.
    pub async fn read_message(&mut self, timeout: Duration) -> Result<Option<Message>, ProtocolError> {
        let reader = self.reader.as_mut().ok_or(ProtocolError::ConnectionClosed)?;
        match tokio::time::timeout(timeout, read_frame(reader)).await {
            Ok(Ok(message)) => Ok(Some(message)),
            Ok(Err(e)) => {
                self.disconnect();
                Err(e)
            }
            Err(_elapsed) => Ok(None),
        }
    }

    /// Send one frame on the shared writer.
    pub async fn send(&mut self, message: &Message) -> Result<(), ProtocolError> {
        let writer = self.writer.as_ref().ok_or(ProtocolError::ConnectionClosed)?;
        let result = {
            let mut guard = writer.lock().await;
            write_frame(&mut *guard, message).await
        };
        if result.is_err() {
            self.disconnect();
        }
        result
    }

    /// Clone of the shared writer, for the heartbeat task.
    pub fn writer_handle(&self) -> Option<SharedWriter> {
        self.writer.clone()
    }
}

/// Spawn the heartbeat loop for one connection.
///
/// Exits on the first send failure; the main loop notices the broken
/// connection through its own reads and reconnects.
pub fn spawn_heartbeat(
    writer: SharedWriter,
    client_id: String,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The immediate first tick would race the registration frame.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let heartbeat = Message::Heartbeat {
                client_id: client_id.clone(),
                timestamp: chrono::Utc::now().to_rfc3339(),
            };
            let mut guard = writer.lock().await;
            if let Err(e) = write_frame(&mut *guard, &heartbeat).await {
                warn!(error = %e, "heartbeat failed, stopping");
                break;
            }
        }
    })
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
