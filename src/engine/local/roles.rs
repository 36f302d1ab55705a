//! Role threads.
//!
//! # Responsibilities
//! - Run master, manager and every worker on its own named OS thread
//! - Give each role a fresh [`Server`] built from the shared config and app
//! - Recycle a worker after `max_request` messages or after a panic
//! - Stop roles in order: workers, manager, master
//!
//! # Design Decisions
//! - Role threads block on their inbox; they never run async code
//! - A panic is caught at the message boundary; the manager hears about it
//!   as `worker_error` and the worker restarts with a new runtime

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tokio::sync::{mpsc, oneshot};

use crate::config::ServerConfig;
use crate::engine::local::handle::{LocalHandle, Shared};
use crate::engine::local::http::BufferedResponder;
use crate::engine::{EngineCallback, EngineError, TaskId};
use crate::lifecycle::ProcessRole;
use crate::net::{ConnectionGuard, ConnectionId};
use crate::observability::metrics;
use crate::request::HttpMessage;
use crate::server::{Application, Server};

/// Exit code reported for a worker that panicked.
const PANIC_EXIT_CODE: i32 = 255;

/// Hook run on every freshly built role runtime, e.g. to register listeners.
pub type Setup = Arc<dyn Fn(&mut Server) + Send + Sync>;

/// Messages delivered to a worker thread.
#[derive(Debug)]
pub(crate) enum WorkerMessage {
    Request {
        message: HttpMessage,
        reply: oneshot::Sender<BufferedResponder>,
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
    /// The guard keeps the connection registered until the close is handled.
    Close {
        fd: ConnectionId,
        reactor_id: u32,
        guard: ConnectionGuard,
    },
    Task {
        task_id: TaskId,
        src_worker_id: usize,
        data: Vec<u8>,
    },
    Finish {
        task_id: TaskId,
        data: Vec<u8>,
    },
    Pipe {
        src_worker_id: usize,
        message: Vec<u8>,
    },
    Stop,
}

#[derive(Debug)]
enum ManagerMessage {
    WorkerError {
        worker_id: usize,
        worker_pid: u32,
        exit_code: i32,
        signal: i32,
    },
    Stop,
}

/// Everything a role thread needs to build its runtime.
#[derive(Clone)]
pub(crate) struct RoleEnv {
    pub config: Arc<ServerConfig>,
    pub app: Arc<dyn Application>,
    pub setup: Option<Setup>,
    pub shared: Arc<Shared>,
}

impl RoleEnv {
    fn build(&self) -> Option<Server> {
        match Server::with_shared(Arc::clone(&self.config), Arc::clone(&self.app)) {
            Ok(mut server) => {
                if let Some(setup) = &self.setup {
                    setup(&mut server);
                }
                Some(server)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to build role runtime");
                None
            }
        }
    }
}

/// Join handles of every running role, in stop order.
#[derive(Debug)]
pub(crate) struct RoleThreads {
    workers: Vec<(mpsc::UnboundedSender<WorkerMessage>, JoinHandle<()>)>,
    manager: (mpsc::UnboundedSender<ManagerMessage>, JoinHandle<()>),
    master: (oneshot::Sender<()>, JoinHandle<()>),
}

impl RoleThreads {
    /// Spawn master, manager and workers. `inboxes` are the receiving halves
    /// of `env.shared.workers`, in worker id order.
    pub fn spawn(
        env: RoleEnv,
        inboxes: Vec<mpsc::UnboundedReceiver<WorkerMessage>>,
    ) -> Result<Self, EngineError> {
        let process_name = env.config.process_name.clone();

        let (master_tx, master_rx) = oneshot::channel();
        let master_env = env.clone();
        let master = thread::Builder::new()
            .name(ProcessRole::Master.title(&process_name))
            .spawn(move || run_master(master_env, master_rx))?;

        let (manager_tx, manager_rx) = mpsc::unbounded_channel();
        let manager_env = env.clone();
        let manager = thread::Builder::new()
            .name(ProcessRole::Manager.title(&process_name))
            .spawn(move || run_manager(manager_env, manager_rx))?;

        let worker_num = env.shared.worker_num;
        let mut workers: Vec<(mpsc::UnboundedSender<WorkerMessage>, JoinHandle<()>)> =
            Vec::with_capacity(inboxes.len());
        for (worker_id, inbox) in inboxes.into_iter().enumerate() {
            let role = ProcessRole::classify(worker_id, worker_num);
            let worker_env = env.clone();
            let manager = manager_tx.clone();
            let spawned = thread::Builder::new()
                .name(role.title(&process_name))
                .spawn(move || run_worker(worker_env, worker_id, inbox, manager));
            let handle = match spawned {
                Ok(handle) => handle,
                Err(e) => {
                    // Dropping the master and manager senders stops those roles.
                    for (inbox, _) in &workers {
                        let _ = inbox.send(WorkerMessage::Stop);
                    }
                    return Err(e.into());
                }
            };
            workers.push((env.shared.workers[worker_id].clone(), handle));
        }

        Ok(Self {
            workers,
            manager: (manager_tx, manager),
            master: (master_tx, master),
        })
    }

    /// Stop every role and wait for its thread. Blocks.
    pub fn stop(self) {
        for (inbox, _) in &self.workers {
            let _ = inbox.send(WorkerMessage::Stop);
        }
        for (_, handle) in self.workers {
            join("worker", handle);
        }

        let (manager_tx, manager) = self.manager;
        let _ = manager_tx.send(ManagerMessage::Stop);
        join("manager", manager);

        let (master_tx, master) = self.master;
        let _ = master_tx.send(());
        join("master", master);
    }
}

fn join(role: &'static str, handle: JoinHandle<()>) {
    if handle.join().is_err() {
        tracing::error!(role, "Role thread panicked");
    }
}

fn run_master(env: RoleEnv, stop: oneshot::Receiver<()>) {
    let Some(mut server) = env.build() else { return };
    let engine = LocalHandle::new(Arc::clone(&env.shared), None);

    server.handle(EngineCallback::Start, &engine);
    // Either a stop request or a dropped sender ends the master.
    let _ = stop.blocking_recv();
    server.handle(EngineCallback::Shutdown, &engine);
}

fn run_manager(env: RoleEnv, mut inbox: mpsc::UnboundedReceiver<ManagerMessage>) {
    let Some(mut server) = env.build() else { return };
    let engine = LocalHandle::new(Arc::clone(&env.shared), None);

    server.handle(EngineCallback::ManagerStart, &engine);
    while let Some(message) = inbox.blocking_recv() {
        match message {
            ManagerMessage::WorkerError {
                worker_id,
                worker_pid,
                exit_code,
                signal,
            } => server.handle(
                EngineCallback::WorkerError {
                    worker_id,
                    worker_pid,
                    exit_code,
                    signal,
                },
                &engine,
            ),
            ManagerMessage::Stop => break,
        }
    }
    server.handle(EngineCallback::ManagerStop, &engine);
}

/// Why a worker runtime ended.
enum Exit {
    Stop,
    Recycle,
    Crashed,
}

fn run_worker(
    env: RoleEnv,
    worker_id: usize,
    mut inbox: mpsc::UnboundedReceiver<WorkerMessage>,
    manager: mpsc::UnboundedSender<ManagerMessage>,
) {
    let engine = LocalHandle::new(Arc::clone(&env.shared), Some(worker_id));
    let max_request = env.shared.info.settings.max_request();

    loop {
        let Some(mut server) = env.build() else { return };
        server.handle(EngineCallback::WorkerStart { worker_id }, &engine);

        let exit = serve(&mut server, &engine, &mut inbox, max_request);
        match exit {
            Exit::Stop => {
                server.handle(EngineCallback::WorkerExit { worker_id }, &engine);
                server.handle(EngineCallback::WorkerStop { worker_id }, &engine);
                return;
            }
            Exit::Recycle => {
                tracing::info!(worker_id, max_request, "Worker reached max_request, restarting");
                server.handle(EngineCallback::WorkerStop { worker_id }, &engine);
                metrics::record_worker_restart("max_request");
            }
            Exit::Crashed => {
                tracing::error!(worker_id, "Worker panicked, restarting");
                metrics::record_worker_restart("panic");
                let _ = manager.send(ManagerMessage::WorkerError {
                    worker_id,
                    worker_pid: std::process::id(),
                    exit_code: PANIC_EXIT_CODE,
                    signal: 0,
                });
            }
        }
    }
}

/// Feed inbox messages to `server` until it has to stop or restart.
fn serve(
    server: &mut Server,
    engine: &LocalHandle,
    inbox: &mut mpsc::UnboundedReceiver<WorkerMessage>,
    max_request: u64,
) -> Exit {
    let mut handled: u64 = 0;

    while let Some(message) = inbox.blocking_recv() {
        let counts = matches!(
            message,
            WorkerMessage::Request { .. } | WorkerMessage::Receive { .. } | WorkerMessage::Task { .. }
        );

        let survived = match message {
            WorkerMessage::Stop => return Exit::Stop,
            WorkerMessage::Request { message, reply } => {
                let mut responder = BufferedResponder::default();
                let survived = guarded(|| {
                    server.handle(
                        EngineCallback::Request {
                            message,
                            responder: &mut responder,
                        },
                        engine,
                    )
                });
                let responder = if survived {
                    responder
                } else {
                    BufferedResponder::bad_gateway()
                };
                // The HTTP front may have given up on the request.
                let _ = reply.send(responder);
                survived
            }
            WorkerMessage::Connect { fd, reactor_id } => {
                guarded(|| server.handle(EngineCallback::Connect { fd, reactor_id }, engine))
            }
            WorkerMessage::Receive {
                fd,
                reactor_id,
                data,
            } => guarded(|| {
                server.handle(
                    EngineCallback::Receive {
                        fd,
                        reactor_id,
                        data,
                    },
                    engine,
                )
            }),
            WorkerMessage::Close {
                fd,
                reactor_id,
                guard,
            } => {
                let survived =
                    guarded(|| server.handle(EngineCallback::Close { fd, reactor_id }, engine));
                drop(guard);
                survived
            }
            WorkerMessage::Task {
                task_id,
                src_worker_id,
                data,
            } => {
                let survived = guarded(|| {
                    server.handle(
                        EngineCallback::Task {
                            task_id,
                            src_worker_id,
                            data,
                        },
                        engine,
                    )
                });
                if !survived {
                    engine.abandon_task(task_id);
                }
                survived
            }
            WorkerMessage::Finish { task_id, data } => {
                guarded(|| server.handle(EngineCallback::Finish { task_id, data }, engine))
            }
            WorkerMessage::Pipe {
                src_worker_id,
                message,
            } => guarded(|| {
                server.handle(
                    EngineCallback::PipeMessage {
                        src_worker_id,
                        message,
                    },
                    engine,
                )
            }),
        };

        if !survived {
            return Exit::Crashed;
        }
        if counts {
            handled += 1;
            if max_request > 0 && handled >= max_request {
                return Exit::Recycle;
            }
        }
    }

    // Every sender is gone: the engine is shutting down.
    Exit::Stop
}

/// Run `f`, reporting whether it returned without panicking.
fn guarded(f: impl FnOnce()) -> bool {
    catch_unwind(AssertUnwindSafe(f)).is_ok()
}
