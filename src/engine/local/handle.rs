//! The [`Engine`] each local role thread sees.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::config::ServerType;
use crate::engine::local::roles::WorkerMessage;
use crate::engine::{ConnectionInfo, Engine, EngineError, ServerInfo, TaskId};
use crate::net::{ConnectionId, ConnectionTable};

/// State shared by every role of one local server.
#[derive(Debug)]
pub(crate) struct Shared {
    pub info: ServerInfo,
    pub connections: ConnectionTable,
    /// Inbox of every worker, indexed by worker id. Task workers follow event workers.
    pub workers: Vec<mpsc::UnboundedSender<WorkerMessage>>,
    pub worker_num: usize,
    pub task_worker_num: usize,
    next_task_id: AtomicU64,
    next_task_worker: AtomicUsize,
    /// Task id → worker that enqueued it.
    pending_tasks: DashMap<TaskId, usize>,
}

impl Shared {
    pub fn new(
        info: ServerInfo,
        connections: ConnectionTable,
        workers: Vec<mpsc::UnboundedSender<WorkerMessage>>,
    ) -> Self {
        let worker_num = info.settings.worker_num();
        let task_worker_num = workers.len().saturating_sub(worker_num);
        Self {
            info,
            connections,
            workers,
            worker_num,
            task_worker_num,
            next_task_id: AtomicU64::new(0),
            next_task_worker: AtomicUsize::new(0),
            pending_tasks: DashMap::new(),
        }
    }

    pub fn deliver(&self, worker_id: usize, message: WorkerMessage) -> bool {
        match self.workers.get(worker_id) {
            Some(inbox) => inbox.send(message).is_ok(),
            None => false,
        }
    }

    /// Forget a task that will never finish. Returns its source worker.
    pub fn abandon(&self, task_id: TaskId) -> Option<usize> {
        self.pending_tasks.remove(&task_id).map(|(_, src)| src)
    }

    pub fn pending_task_count(&self) -> usize {
        self.pending_tasks.len()
    }
}

/// Engine handle bound to one role.
#[derive(Debug, Clone)]
pub(crate) struct LocalHandle {
    shared: Arc<Shared>,
    worker_id: Option<usize>,
}

impl LocalHandle {
    pub fn new(shared: Arc<Shared>, worker_id: Option<usize>) -> Self {
        Self { shared, worker_id }
    }

    /// Drop the bookkeeping of a task whose worker crashed mid-run.
    pub fn abandon_task(&self, task_id: TaskId) {
        if let Some(src_worker_id) = self.shared.abandon(task_id) {
            tracing::warn!(task_id, src_worker_id, "Task abandoned, it will not finish");
        }
    }
}

impl Engine for LocalHandle {
    fn kind(&self) -> ServerType {
        self.shared.info.kind
    }

    fn info(&self) -> ServerInfo {
        self.shared.info.clone()
    }

    fn connection_info(&self, fd: ConnectionId) -> Option<ConnectionInfo> {
        self.shared.connections.info(fd)
    }

    fn send(&self, fd: ConnectionId, data: &[u8]) -> bool {
        self.shared.connections.send(fd, data)
    }

    fn task(&self, data: Vec<u8>) -> Result<TaskId, EngineError> {
        let shared = &self.shared;
        if shared.task_worker_num == 0 {
            return Err(EngineError::NoTaskWorkers);
        }

        let task_id = shared.next_task_id.fetch_add(1, Ordering::Relaxed);
        let src_worker_id = self.worker_id.unwrap_or(0);
        let slot = shared.next_task_worker.fetch_add(1, Ordering::Relaxed) % shared.task_worker_num;
        let dst = shared.worker_num + slot;

        shared.pending_tasks.insert(task_id, src_worker_id);
        let message = WorkerMessage::Task {
            task_id,
            src_worker_id,
            data,
        };
        if shared.deliver(dst, message) {
            Ok(task_id)
        } else {
            shared.pending_tasks.remove(&task_id);
            Err(EngineError::TaskQueueClosed)
        }
    }

    fn finish(&self, task_id: TaskId, data: Vec<u8>) -> bool {
        let Some((_, src_worker_id)) = self.shared.pending_tasks.remove(&task_id) else {
            tracing::warn!(task_id, "Finish for unknown task");
            return false;
        };
        self.shared
            .deliver(src_worker_id, WorkerMessage::Finish { task_id, data })
    }

    fn send_message(&self, message: Vec<u8>, dst_worker_id: usize) -> bool {
        let src_worker_id = self.worker_id.unwrap_or(0);
        self.shared.deliver(
            dst_worker_id,
            WorkerMessage::Pipe {
                src_worker_id,
                message,
            },
        )
    }

    /// Role threads are named after their title at spawn, so this only
    /// reports whether the running thread already carries `title`.
    fn set_process_title(&self, title: &str) -> bool {
        std::thread::current().name() == Some(title)
    }
}
