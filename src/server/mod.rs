//! Per-role server runtime.
//!
//! # Data Flow
//! ```text
//! EngineCallback
//!     → Server::handle
//!         role start/stop → RoleController → lifecycle event
//!         traffic         → Transport → router.rs → send
//!         task            → task event → application → engine.finish
//!         everything else → lifecycle event
//! ```
//!
//! # Design Decisions
//! - One `Server` per role; nothing here is shared across roles
//! - Startup validation happens in `new`, before any engine callback
//! - The application is shared behind an `Arc` so an engine can build one
//!   runtime per role from the same value

pub mod app;
pub mod router;

use std::sync::Arc;

use crate::config::{EngineSettings, ServerConfig};
use crate::engine::{Engine, EngineCallback};
use crate::event::{Arg, EventBus, ListenerResult};
use crate::lifecycle::{startup, ProcessRole, RoleController, RoleState, StartupError};
use crate::transport::{self, Dispatch, Transport};

pub use app::{Application, Reply, RequestContext};
pub use router::{ExecutionMode, ExecutionRouter, TASK_ACCEPTED_BODY};

/// The runtime one role runs: bus, role controller, transport and router.
#[derive(Debug)]
pub struct Server {
    config: Arc<ServerConfig>,
    settings: EngineSettings,
    bus: EventBus,
    controller: RoleController,
    transport: Box<dyn Transport>,
    router: ExecutionRouter,
}

impl Server {
    /// Validate `config` and build a runtime around `app`.
    pub fn new(config: ServerConfig, app: impl Application + 'static) -> Result<Self, StartupError> {
        Self::with_shared(Arc::new(config), Arc::new(app))
    }

    /// Build a runtime from an already shared config and application.
    pub fn with_shared(
        config: Arc<ServerConfig>,
        app: Arc<dyn Application>,
    ) -> Result<Self, StartupError> {
        startup::check(&config)?;

        let mode = ExecutionMode::for_config(&config);
        tracing::debug!(
            server_type = %config.server_type,
            mode = mode.as_str(),
            "Server runtime created"
        );

        Ok(Self {
            settings: config.engine_settings(),
            controller: RoleController::new(config.process_name.clone()),
            transport: transport::select(config.server_type),
            router: ExecutionRouter::new(mode, app),
            bus: EventBus::new(),
            config,
        })
    }

    /// Register an event listener.
    pub fn on<F>(&mut self, event: impl AsRef<str>, listener: F) -> &mut Self
    where
        F: Fn(&[Arg]) -> ListenerResult + Send + Sync + 'static,
    {
        self.bus.subscribe(event, listener);
        self
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Settings handed to the engine: defaults merged with `setting`.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn mode(&self) -> ExecutionMode {
        self.router.mode()
    }

    pub fn role(&self) -> Option<ProcessRole> {
        self.controller.role()
    }

    pub fn state(&self) -> RoleState {
        self.controller.state()
    }

    pub fn master_pid(&self) -> Option<u32> {
        self.controller.master_pid()
    }

    /// Consume one engine callback.
    pub fn handle(&mut self, callback: EngineCallback<'_>, engine: &dyn Engine) {
        tracing::trace!(callback = callback.name(), "Engine callback");

        match &callback {
            EngineCallback::Start => self.enter(engine, ProcessRole::Master),
            EngineCallback::ManagerStart => self.enter(engine, ProcessRole::Manager),
            EngineCallback::WorkerStart { worker_id } => {
                if let Err(e) = self.controller.start_worker(engine, *worker_id) {
                    tracing::error!(worker_id, error = %e, "Worker start rejected");
                }
            }
            EngineCallback::WorkerStop { .. }
            | EngineCallback::ManagerStop
            | EngineCallback::Shutdown => {
                if let Err(e) = self.controller.stop() {
                    tracing::error!(callback = callback.name(), error = %e, "Role stop rejected");
                }
            }
            _ => {}
        }

        transport::lifecycle::forward(&callback, &self.bus, engine.info());

        let ctx = Dispatch {
            bus: &self.bus,
            router: &self.router,
            engine,
        };

        match callback {
            EngineCallback::Connect { fd, reactor_id } => {
                self.transport.on_connect(ctx, fd, reactor_id)
            }
            EngineCallback::Receive {
                fd,
                reactor_id,
                data,
            } => self.transport.on_receive(ctx, fd, reactor_id, data),
            EngineCallback::Request { message, responder } => {
                self.transport.on_request(ctx, message, responder)
            }
            EngineCallback::Close { fd, reactor_id } => self.transport.on_close(ctx, fd, reactor_id),
            EngineCallback::Task { task_id, data, .. } => {
                self.router.run_task(task_id, &data);
                if !engine.finish(task_id, data) {
                    tracing::warn!(task_id, "Engine rejected task finish");
                }
            }
            _ => {}
        }
    }

    fn enter(&mut self, engine: &dyn Engine, role: ProcessRole) {
        if let Err(e) = self.controller.start(engine, role) {
            tracing::error!(%role, error = %e, "Role start rejected");
        }
    }
}
