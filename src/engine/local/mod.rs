//! Single-process development engine.
//!
//! Emulates the multi-process engine inside one OS process: master, manager
//! and every worker run on their own named thread with their own [`Server`],
//! while a tokio front (axum for HTTP, a bounded TCP listener for sockets)
//! only forwards traffic to them.
//!
//! # Data Flow
//! ```text
//! LocalEngine::start
//!     → bind host:port
//!     → spawn role threads (roles.rs), each building its own Server
//!     → run the front (http.rs or socket.rs) on the tokio runtime
//!
//! RunningServer::wait
//!     → front stops on shutdown
//!     → workers stop, then the manager, then the master
//! ```
//!
//! # Design Decisions
//! - Role threads share nothing but the engine handle; the master pid is the
//!   process id, as every role lives in the same process
//! - Daemonizing is not supported and only logged
//!
//! # Example
//!
//! ```no_run
//! use worker_server::config::ServerConfig;
//! use worker_server::engine::local::LocalEngine;
//! use worker_server::server::RequestContext;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig { port: 9501, ..ServerConfig::default() };
//! let engine = LocalEngine::new(config, |_: &mut RequestContext| "hello")?;
//! let running = engine.start().await?;
//! running.stop().await?;
//! # Ok(())
//! # }
//! ```

mod handle;
mod http;
mod roles;
mod socket;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::{ServerConfig, ServerType};
use crate::engine::{EngineError, ServerInfo};
use crate::lifecycle::{startup, MasterPid, Shutdown, StartupError};
use crate::net::{ConnectionTable, Listener, ListenerError};
use crate::server::{Application, Server};

use handle::Shared;
use roles::{RoleEnv, RoleThreads};

pub use self::http::BufferedResponder;
pub use roles::Setup;

/// A configured, not yet started local engine.
pub struct LocalEngine {
    config: Arc<ServerConfig>,
    app: Arc<dyn Application>,
    setup: Option<Setup>,
}

impl LocalEngine {
    /// Validate `config` up front so no role thread starts with a bad one.
    pub fn new(config: ServerConfig, app: impl Application + 'static) -> Result<Self, StartupError> {
        startup::check(&config)?;
        Ok(Self {
            config: Arc::new(config),
            app: Arc::new(app),
            setup: None,
        })
    }

    /// Run `setup` on every role runtime the engine builds, including the
    /// fresh runtime of a restarted worker.
    pub fn setup(mut self, setup: impl Fn(&mut Server) + Send + Sync + 'static) -> Self {
        self.setup = Some(Arc::new(setup));
        self
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Bind, spawn every role and start serving.
    pub async fn start(self) -> Result<RunningServer, EngineError> {
        let config = Arc::clone(&self.config);
        let settings = config.engine_settings();
        if settings.daemonize() {
            tracing::warn!("daemonize is not supported by the local engine, staying in foreground");
        }

        let addr = resolve(&config.host, config.port).await?;
        let shutdown = Shutdown::new();

        let worker_num = settings.worker_num();
        let task_worker_num = settings.task_worker_num();
        let (senders, inboxes): (Vec<_>, Vec<_>) = (0..worker_num + task_worker_num)
            .map(|_| mpsc::unbounded_channel())
            .unzip();

        let (front, local_addr): (Front, SocketAddr) = match config.server_type {
            ServerType::Http => {
                let listener = TcpListener::bind(addr).await?;
                let local_addr = listener.local_addr()?;
                (Front::Http(listener), local_addr)
            }
            ServerType::Socket => {
                let listener = Listener::bind(addr, settings.max_conn())
                    .await
                    .map_err(listener_error)?;
                let local_addr = listener.local_addr()?;
                (Front::Socket(listener), local_addr)
            }
        };

        let pid = std::process::id();
        // Before any role thread exists.
        MasterPid::export(pid);
        let info = ServerInfo {
            master_pid: pid,
            manager_pid: pid,
            host: config.host.clone(),
            port: local_addr.port(),
            kind: config.server_type,
            settings: Arc::new(settings),
        };
        let shared = Arc::new(Shared::new(info, ConnectionTable::new(), senders));

        tracing::info!(
            address = %local_addr,
            server_type = %config.server_type,
            worker_num,
            task_worker_num,
            task_enable_coroutine = shared.info.settings.task_enable_coroutine(),
            "Local engine starting"
        );

        let roles = RoleThreads::spawn(
            RoleEnv {
                config,
                app: self.app,
                setup: self.setup,
                shared: Arc::clone(&shared),
            },
            inboxes,
        )?;

        let front_shutdown = shutdown.clone();
        let front = tokio::spawn(async move {
            match front {
                Front::Http(listener) => http::serve(listener, shared, front_shutdown).await,
                Front::Socket(listener) => {
                    socket::serve(listener, shared, front_shutdown).await;
                    Ok(())
                }
            }
        });

        Ok(RunningServer {
            local_addr,
            shutdown,
            front,
            roles,
        })
    }
}

enum Front {
    Http(TcpListener),
    Socket(Listener),
}

/// A started local engine.
#[derive(Debug)]
pub struct RunningServer {
    local_addr: SocketAddr,
    shutdown: Shutdown,
    front: JoinHandle<Result<(), std::io::Error>>,
    roles: RoleThreads,
}

impl RunningServer {
    /// Address actually bound; differs from the config when port is 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Handle that stops the server when triggered.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Wait for shutdown to be triggered, then stop every role in order.
    pub async fn wait(self) -> Result<(), EngineError> {
        let served = match self.front.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "Front task failed");
                Ok(())
            }
        };
        // Covers a front that ended on its own.
        self.shutdown.trigger();

        let roles = self.roles;
        if tokio::task::spawn_blocking(move || roles.stop()).await.is_err() {
            tracing::error!("Stopping role threads panicked");
        }

        tracing::info!("Local engine stopped");
        served.map_err(EngineError::from)
    }

    /// Trigger shutdown and wait for it to complete.
    pub async fn stop(self) -> Result<(), EngineError> {
        self.shutdown.trigger();
        self.wait().await
    }
}

async fn resolve(host: &str, port: u16) -> Result<SocketAddr, EngineError> {
    tokio::net::lookup_host((host, port))
        .await?
        .next()
        .ok_or_else(|| {
            EngineError::Io(std::io::Error::new(
                std::io::ErrorKind::AddrNotAvailable,
                format!("{host}:{port} did not resolve"),
            ))
        })
}

fn listener_error(e: ListenerError) -> EngineError {
    match e {
        ListenerError::Bind(io) | ListenerError::Accept(io) => EngineError::Io(io),
        ListenerError::Closed => EngineError::Io(std::io::Error::other("connection limit closed")),
    }
}

/// Current unix time in whole and fractional seconds.
pub(crate) fn unix_now() -> (i64, f64) {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    (elapsed.as_secs() as i64, elapsed.as_secs_f64())
}
