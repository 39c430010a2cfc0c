// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TCP listener for agent connections.
//!
//! Accepts in a loop and hands each connection to its own spawned task
//! running the connection state machine.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpSocket};
use tracing::{error, info};

use sweep_core::Clock;

use crate::connection;
use crate::master::Master;

/// Bind the agent listener with `SO_REUSEADDR` so a restarted master
/// reclaims the port immediately.
pub fn bind(addr: SocketAddr) -> io::Result<TcpListener> {
    let socket = match addr {
        SocketAddr::V4(_) => TcpSocket::new_v4()?,
        SocketAddr::V6(_) => TcpSocket::new_v6()?,
    };
    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;
    socket.listen(1024)
}

/// Run the accept loop until the process exits.
pub async fn run<C: Clock + 'static>(listener: TcpListener, master: Arc<Master<C>>) {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "master listening for agents");
    }
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                let master = Arc::clone(&master);
                tokio::spawn(async move {
                    let agent_ip = peer.ip().to_string();
                    info!(agent_ip = %agent_ip, "agent connected");
                    let (reader, writer) = stream.into_split();
                    connection::handle_agent(reader, writer, agent_ip, master).await;
                });
            }
            Err(e) => error!(error = %e, "accept error"),
        }
    }
}
