//! Raw TCP front.
//!
//! # Data Flow
//! ```text
//! Listener::accept (max_conn permits)
//!     → ConnectionId + ConnectionTable entry (writer channel)
//!     → connect / receive / close delivered to worker `id % worker_num`
//!     → Engine::send → writer channel → socket
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::engine::local::handle::Shared;
use crate::engine::local::roles::WorkerMessage;
use crate::engine::local::unix_now;
use crate::engine::ConnectionInfo;
use crate::lifecycle::Shutdown;
use crate::net::{ConnectionId, ConnectionPermit, Listener, ListenerError};

/// The local engine runs a single reactor.
const REACTOR_ID: u32 = 0;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Accept connections until `shutdown` triggers.
pub(crate) async fn serve(listener: Listener, shared: Arc<Shared>, shutdown: Shutdown) {
    let server_port = listener.local_addr().map(|addr| addr.port()).unwrap_or_default();
    tracing::info!(port = server_port, "Socket server starting");

    loop {
        let accepted = tokio::select! {
            _ = shutdown.wait() => break,
            accepted = listener.accept() => accepted,
        };

        match accepted {
            Ok((stream, peer, permit)) => {
                let shared = Arc::clone(&shared);
                let shutdown = shutdown.clone();
                tokio::spawn(async move {
                    handle_connection(stream, peer, permit, shared, server_port, shutdown).await;
                });
            }
            Err(ListenerError::Closed) => break,
            Err(e) => tracing::warn!(error = %e, "Accept failed"),
        }
    }

    tracing::info!("Socket server stopped");
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    permit: ConnectionPermit,
    shared: Arc<Shared>,
    server_port: u16,
    shutdown: Shutdown,
) {
    let fd = ConnectionId::next();
    let worker_id = (fd.as_u64() % shared.worker_num as u64) as usize;
    let (now, _) = unix_now();
    let info = ConnectionInfo {
        connect_time: now,
        last_time: now,
        server_port,
        remote_port: peer.port(),
        remote_ip: peer.ip().to_string(),
    };

    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();
    let guard = shared.connections.register(fd, info, tx);
    let (mut reader, mut writer) = stream.into_split();

    // Ends once the table entry, and with it the sender, is gone.
    tokio::spawn(async move {
        while let Some(data) = rx.recv().await {
            if let Err(e) = writer.write_all(&data).await {
                tracing::debug!(%fd, error = %e, "Socket write failed");
                break;
            }
        }
    });

    tracing::debug!(%fd, %peer, worker_id, "Socket connection assigned");
    shared.deliver(
        worker_id,
        WorkerMessage::Connect {
            fd,
            reactor_id: REACTOR_ID,
        },
    );

    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    loop {
        let read = tokio::select! {
            _ = shutdown.wait() => break,
            read = reader.read(&mut buf) => read,
        };

        match read {
            Ok(0) => break,
            Ok(n) => {
                shared.connections.touch(fd, unix_now().0);
                let message = WorkerMessage::Receive {
                    fd,
                    reactor_id: REACTOR_ID,
                    data: buf[..n].to_vec(),
                };
                if !shared.deliver(worker_id, message) {
                    break;
                }
            }
            Err(e) => {
                tracing::debug!(%fd, error = %e, "Socket read failed");
                break;
            }
        }
    }

    // The worker drops the guard after handling the close.
    shared.deliver(
        worker_id,
        WorkerMessage::Close {
            fd,
            reactor_id: REACTOR_ID,
            guard,
        },
    );
    drop(permit);
}
