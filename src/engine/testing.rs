//! Recording doubles for driving a runtime without a live engine.
//!
//! # Features
//!
//! - [`RecordingEngine`]: an [`Engine`] that records sends, tasks, finishes,
//!   pipe messages and titles instead of performing them
//! - [`RecordingResponder`]: an [`HttpResponder`] that records every native call
//!
//! # Example
//!
//! ```
//! use worker_server::config::{ServerConfig, ServerType};
//! use worker_server::engine::testing::{RecordingEngine, RecordingResponder};
//! use worker_server::engine::EngineCallback;
//! use worker_server::request::HttpMessage;
//! use worker_server::server::{RequestContext, Server};
//!
//! let config = ServerConfig { worker_num: 1, ..ServerConfig::default() };
//! let engine = RecordingEngine::new(ServerType::Http, config.engine_settings());
//! let mut server = Server::new(config, |_: &mut RequestContext| "hello").unwrap();
//!
//! let mut responder = RecordingResponder::default();
//! server.handle(
//!     EngineCallback::Request {
//!         message: HttpMessage { path_info: "/".into(), ..HttpMessage::default() },
//!         responder: &mut responder,
//!     },
//!     &engine,
//! );
//! assert_eq!(responder.body(), Some(&b"hello"[..]));
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::{EngineSettings, ServerType};
use crate::engine::{ConnectionInfo, Engine, EngineError, HttpResponder, ServerInfo, TaskId};
use crate::net::ConnectionId;
use crate::response::Cookie;

/// One recorded native HTTP call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponderCall {
    Header(String, String),
    Cookie(String, Cookie),
    Status(u16),
    End(Vec<u8>),
}

/// Records native HTTP response calls. Calls after `end` are refused.
#[derive(Debug, Default)]
pub struct RecordingResponder {
    calls: Vec<ResponderCall>,
    ended: bool,
}

impl RecordingResponder {
    pub fn calls(&self) -> &[ResponderCall] {
        &self.calls
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Body passed to `end`, if it was called.
    pub fn body(&self) -> Option<&[u8]> {
        self.calls.iter().find_map(|call| match call {
            ResponderCall::End(body) => Some(body.as_slice()),
            _ => None,
        })
    }

    pub fn status_code(&self) -> Option<u16> {
        self.calls.iter().find_map(|call| match call {
            ResponderCall::Status(code) => Some(*code),
            _ => None,
        })
    }

    fn record(&mut self, call: ResponderCall) -> bool {
        if self.ended {
            return false;
        }
        if matches!(call, ResponderCall::End(_)) {
            self.ended = true;
        }
        self.calls.push(call);
        true
    }
}

impl HttpResponder for RecordingResponder {
    fn header(&mut self, key: &str, value: &str) -> bool {
        self.record(ResponderCall::Header(key.to_string(), value.to_string()))
    }

    fn cookie(&mut self, key: &str, cookie: &Cookie) -> bool {
        self.record(ResponderCall::Cookie(key.to_string(), cookie.clone()))
    }

    fn status(&mut self, code: u16) -> bool {
        self.record(ResponderCall::Status(code))
    }

    fn end(&mut self, body: &[u8]) -> bool {
        self.record(ResponderCall::End(body.to_vec()))
    }
}

#[derive(Debug, Default)]
struct Recorded {
    sent: Vec<(ConnectionId, Vec<u8>)>,
    tasks: Vec<Vec<u8>>,
    finished: Vec<(TaskId, Vec<u8>)>,
    messages: Vec<(usize, Vec<u8>)>,
    titles: Vec<String>,
}

/// An engine that only records what the runtime asked of it.
#[derive(Debug)]
pub struct RecordingEngine {
    info: ServerInfo,
    connections: HashMap<ConnectionId, ConnectionInfo>,
    refuse_tasks: bool,
    recorded: Mutex<Recorded>,
}

impl RecordingEngine {
    pub fn new(kind: ServerType, settings: EngineSettings) -> Self {
        Self {
            info: ServerInfo {
                master_pid: 4242,
                manager_pid: 4243,
                host: "127.0.0.1".to_string(),
                port: 9501,
                kind,
                settings: Arc::new(settings),
            },
            connections: HashMap::new(),
            refuse_tasks: false,
            recorded: Mutex::new(Recorded::default()),
        }
    }

    /// Override the reported master pid.
    pub fn with_master_pid(mut self, pid: u32) -> Self {
        self.info.master_pid = pid;
        self
    }

    /// Register connection details returned by `connection_info`.
    pub fn with_connection(mut self, fd: ConnectionId, info: ConnectionInfo) -> Self {
        self.connections.insert(fd, info);
        self
    }

    /// Make every `task` call fail with [`EngineError::TaskQueueClosed`].
    pub fn refusing_tasks(mut self) -> Self {
        self.refuse_tasks = true;
        self
    }

    pub fn sent(&self) -> Vec<(ConnectionId, Vec<u8>)> {
        self.lock().sent.clone()
    }

    pub fn tasks(&self) -> Vec<Vec<u8>> {
        self.lock().tasks.clone()
    }

    pub fn finished(&self) -> Vec<(TaskId, Vec<u8>)> {
        self.lock().finished.clone()
    }

    pub fn messages(&self) -> Vec<(usize, Vec<u8>)> {
        self.lock().messages.clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.lock().titles.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.recorded
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Engine for RecordingEngine {
    fn kind(&self) -> ServerType {
        self.info.kind
    }

    fn info(&self) -> ServerInfo {
        self.info.clone()
    }

    fn connection_info(&self, fd: ConnectionId) -> Option<ConnectionInfo> {
        self.connections.get(&fd).cloned()
    }

    fn send(&self, fd: ConnectionId, data: &[u8]) -> bool {
        self.lock().sent.push((fd, data.to_vec()));
        true
    }

    fn task(&self, data: Vec<u8>) -> Result<TaskId, EngineError> {
        if self.refuse_tasks {
            return Err(EngineError::TaskQueueClosed);
        }
        let mut recorded = self.lock();
        recorded.tasks.push(data);
        Ok(recorded.tasks.len() as TaskId - 1)
    }

    fn finish(&self, task_id: TaskId, data: Vec<u8>) -> bool {
        self.lock().finished.push((task_id, data));
        true
    }

    fn send_message(&self, message: Vec<u8>, dst_worker_id: usize) -> bool {
        self.lock().messages.push((dst_worker_id, message));
        true
    }

    fn set_process_title(&self, title: &str) -> bool {
        self.lock().titles.push(title.to_string());
        true
    }
}
