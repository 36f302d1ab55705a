//! Connection ids and the live connection table.
//!
//! # Responsibilities
//! - Generate unique connection ids
//! - Keep per-connection engine details for `connection_info`
//! - Hold each connection's writer so `send` works from any thread
//! - Remove a connection when its guard is dropped

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::engine::ConnectionInfo;

/// Relaxed ordering is enough; only uniqueness matters.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection (the engine's `fd`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Allocate the next process-wide id.
    pub fn next() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Wrap an id handed over by an engine.
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

#[derive(Debug)]
struct Entry {
    info: ConnectionInfo,
    writer: mpsc::UnboundedSender<Vec<u8>>,
}

/// Live raw-socket connections, shared between the accept loop and role threads.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTable {
    entries: Arc<DashMap<ConnectionId, Entry>>,
}

impl ConnectionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection. The entry is removed when the guard drops.
    pub fn register(
        &self,
        id: ConnectionId,
        info: ConnectionInfo,
        writer: mpsc::UnboundedSender<Vec<u8>>,
    ) -> ConnectionGuard {
        self.entries.insert(id, Entry { info, writer });
        ConnectionGuard {
            entries: Arc::clone(&self.entries),
            id,
        }
    }

    pub fn info(&self, id: ConnectionId) -> Option<ConnectionInfo> {
        self.entries.get(&id).map(|entry| entry.info.clone())
    }

    /// Update the last-activity time of a connection.
    pub fn touch(&self, id: ConnectionId, now: i64) {
        if let Some(mut entry) = self.entries.get_mut(&id) {
            entry.info.last_time = now;
        }
    }

    /// Queue bytes for the connection's writer. `false` if it is gone.
    pub fn send(&self, id: ConnectionId, data: &[u8]) -> bool {
        match self.entries.get(&id) {
            Some(entry) => entry.writer.send(data.to_vec()).is_ok(),
            None => false,
        }
    }

    pub fn active_count(&self) -> usize {
        self.entries.len()
    }
}

/// Keeps a connection registered for as long as it is alive.
#[derive(Debug)]
pub struct ConnectionGuard {
    entries: Arc<DashMap<ConnectionId, Entry>>,
    id: ConnectionId,
}

impl ConnectionGuard {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.entries.remove(&self.id);
        tracing::trace!(connection_id = %self.id, "Connection unregistered");
    }
}
