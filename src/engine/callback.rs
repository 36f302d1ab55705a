//! Engine callbacks as values.

use crate::engine::{HttpResponder, TaskId};
use crate::net::ConnectionId;
use crate::request::HttpMessage;

/// One native engine callback with its arguments.
///
/// The server handle argument every native callback carries is not part of
/// the value; the runtime reads it from [`Engine::info`] instead.
///
/// [`Engine::info`]: crate::engine::Engine::info
#[derive(Debug)]
pub enum EngineCallback<'a> {
    Start,
    ManagerStart,
    WorkerStart {
        worker_id: usize,
    },
    Connect {
        fd: ConnectionId,
        reactor_id: u32,
    },
    Receive {
        fd: ConnectionId,
        reactor_id: u32,
        data: Vec<u8>,
    },
    Request {
        message: HttpMessage,
        responder: &'a mut (dyn HttpResponder + Send),
    },
    Task {
        task_id: TaskId,
        src_worker_id: usize,
        data: Vec<u8>,
    },
    PipeMessage {
        src_worker_id: usize,
        message: Vec<u8>,
    },
    ManagerStop,
    WorkerStop {
        worker_id: usize,
    },
    Finish {
        task_id: TaskId,
        data: Vec<u8>,
    },
    Close {
        fd: ConnectionId,
        reactor_id: u32,
    },
    WorkerError {
        worker_id: usize,
        worker_pid: u32,
        exit_code: i32,
        signal: i32,
    },
    WorkerExit {
        worker_id: usize,
    },
    Shutdown,
}

impl EngineCallback<'_> {
    /// Native callback name, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            EngineCallback::Start => "start",
            EngineCallback::ManagerStart => "manager_start",
            EngineCallback::WorkerStart { .. } => "worker_start",
            EngineCallback::Connect { .. } => "connect",
            EngineCallback::Receive { .. } => "receive",
            EngineCallback::Request { .. } => "request",
            EngineCallback::Task { .. } => "task",
            EngineCallback::PipeMessage { .. } => "pipe_message",
            EngineCallback::ManagerStop => "manager_stop",
            EngineCallback::WorkerStop { .. } => "worker_stop",
            EngineCallback::Finish { .. } => "finish",
            EngineCallback::Close { .. } => "close",
            EngineCallback::WorkerError { .. } => "worker_error",
            EngineCallback::WorkerExit { .. } => "worker_exit",
            EngineCallback::Shutdown => "shutdown",
        }
    }
}
