//! One-way role state machine.

use std::fmt;

use thiserror::Error;

/// Where a role is in its life.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum RoleState {
    #[default]
    Unstarted,
    Starting,
    Running,
    Stopping,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid role transition from {from} to {to}")]
pub struct TransitionError {
    pub from: RoleState,
    pub to: RoleState,
}

impl RoleState {
    /// Next state, or an error if `to` is not directly reachable from `self`.
    ///
    /// `Stopping` may also be entered straight from `Starting` so a role that
    /// fails while booting can still shut down.
    pub fn transition(self, to: RoleState) -> Result<RoleState, TransitionError> {
        use RoleState::*;
        match (self, to) {
            (Unstarted, Starting)
            | (Starting, Running)
            | (Starting, Stopping)
            | (Running, Stopping)
            | (Stopping, Stopped) => Ok(to),
            _ => Err(TransitionError { from: self, to }),
        }
    }

    pub fn is_running(self) -> bool {
        self == RoleState::Running
    }
}

impl fmt::Display for RoleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RoleState::Unstarted => "unstarted",
            RoleState::Starting => "starting",
            RoleState::Running => "running",
            RoleState::Stopping => "stopping",
            RoleState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}
