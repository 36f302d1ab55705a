//! Role bookkeeping for one runtime instance.
//!
//! # Responsibilities
//! - Assign the role on the first role-start callback
//! - Record the master pid on every role start
//! - Set the process title through the engine
//! - Drive the role state machine
//!
//! Publishing the matching lifecycle event is left to the caller, so the
//! controller stays free of bus wiring.

use crate::engine::Engine;
use crate::lifecycle::identity::MasterPid;
use crate::lifecycle::role::ProcessRole;
use crate::lifecycle::state::{RoleState, TransitionError};

#[derive(Debug)]
pub struct RoleController {
    process_name: String,
    role: Option<ProcessRole>,
    state: RoleState,
    master_pid: Option<u32>,
}

impl RoleController {
    pub fn new(process_name: impl Into<String>) -> Self {
        Self {
            process_name: process_name.into(),
            role: None,
            state: RoleState::Unstarted,
            master_pid: None,
        }
    }

    /// Handle a worker-start callback. The worker id is classified against
    /// the engine's merged `worker_num`.
    pub fn start_worker(
        &mut self,
        engine: &dyn Engine,
        worker_id: usize,
    ) -> Result<ProcessRole, TransitionError> {
        let worker_num = engine.info().settings.worker_num();
        self.start(engine, ProcessRole::classify(worker_id, worker_num))
    }

    /// Enter `role`: record the master pid, set the title, advance to `Running`.
    pub fn start(
        &mut self,
        engine: &dyn Engine,
        role: ProcessRole,
    ) -> Result<ProcessRole, TransitionError> {
        let info = engine.info();
        self.master_pid = Some(info.master_pid);
        MasterPid::record(info.master_pid);

        let role = match self.role {
            Some(existing) if existing != role => {
                tracing::warn!(%existing, reported = %role, "Role already assigned, keeping it");
                existing
            }
            _ => role,
        };

        self.advance(RoleState::Starting)?;
        self.role = Some(role);

        let title = role.title(&self.process_name);
        if !engine.set_process_title(&title) {
            tracing::debug!(%title, "Engine did not set process title");
        }

        self.advance(RoleState::Running)?;
        tracing::info!(%role, master_pid = info.master_pid, "Role started");
        Ok(role)
    }

    /// Handle a role-stop callback. Stopping twice is tolerated and logged.
    pub fn stop(&mut self) -> Result<(), TransitionError> {
        if self.state >= RoleState::Stopping {
            tracing::debug!(state = %self.state, "Role already stopping");
            return Ok(());
        }
        self.advance(RoleState::Stopping)?;
        self.advance(RoleState::Stopped)?;
        if let Some(role) = self.role {
            tracing::info!(%role, "Role stopped");
        }
        Ok(())
    }

    pub fn role(&self) -> Option<ProcessRole> {
        self.role
    }

    pub fn state(&self) -> RoleState {
        self.state
    }

    /// Master pid as reported to this runtime.
    pub fn master_pid(&self) -> Option<u32> {
        self.master_pid
    }

    fn advance(&mut self, to: RoleState) -> Result<(), TransitionError> {
        match self.state.transition(to) {
            Ok(next) => {
                self.state = next;
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Rejected role transition");
                Err(e)
            }
        }
    }
}
