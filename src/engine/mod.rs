//! Engine boundary.
//!
//! The multi-process socket engine is an external collaborator. This module
//! describes what the runtime needs from it ([`Engine`], [`HttpResponder`])
//! and what it receives from it ([`EngineCallback`]).
//!
//! # Data Flow
//! ```text
//! engine (any implementation)
//!     → EngineCallback (one value per native callback)
//!     → Server::handle
//!     → Engine / HttpResponder primitives for sends, tasks, titles
//! ```
//!
//! # Implementations
//! - local/ : single-process development engine on tokio + axum
//! - testing.rs : recording doubles for tests

pub mod callback;
pub mod local;
pub mod testing;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{EngineSettings, ServerType};
use crate::net::ConnectionId;
use crate::response::Cookie;

pub use callback::EngineCallback;
pub use local::{LocalEngine, RunningServer};

/// Task identifier assigned by the engine on enqueue.
pub type TaskId = u64;

/// The engine's server handle as seen from inside a role.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerInfo {
    pub master_pid: u32,
    pub manager_pid: u32,
    pub host: String,
    pub port: u16,
    pub kind: ServerType,
    pub settings: Arc<EngineSettings>,
}

/// Per-connection details the engine tracks for raw sockets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    /// Unix time the connection was accepted.
    pub connect_time: i64,
    /// Unix time of the last received packet.
    pub last_time: i64,
    pub server_port: u16,
    pub remote_port: u16,
    pub remote_ip: String,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no task workers are configured")]
    NoTaskWorkers,

    #[error("task queue is closed")]
    TaskQueueClosed,

    #[error("engine I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Primitives the runtime calls on the engine.
pub trait Engine {
    /// Which kind of server this engine runs.
    fn kind(&self) -> ServerType;

    fn info(&self) -> ServerInfo;

    /// Connection details for a raw-socket connection id.
    fn connection_info(&self, fd: ConnectionId) -> Option<ConnectionInfo>;

    /// Send raw bytes to a socket connection.
    fn send(&self, fd: ConnectionId, data: &[u8]) -> bool;

    /// Enqueue a payload for the task-worker pool. Returns immediately.
    fn task(&self, data: Vec<u8>) -> Result<TaskId, EngineError>;

    /// Signal task completion back to the worker that enqueued it.
    fn finish(&self, task_id: TaskId, data: Vec<u8>) -> bool;

    /// Deliver a message to another worker's pipe.
    fn send_message(&self, message: Vec<u8>, dst_worker_id: usize) -> bool;

    fn set_process_title(&self, title: &str) -> bool;
}

/// Native HTTP response primitives. `end` is terminal.
pub trait HttpResponder: fmt::Debug {
    fn header(&mut self, key: &str, value: &str) -> bool;

    fn cookie(&mut self, key: &str, cookie: &Cookie) -> bool;

    fn status(&mut self, code: u16) -> bool;

    fn end(&mut self, body: &[u8]) -> bool;
}
