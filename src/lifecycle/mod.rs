//! Process role lifecycle.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validate config → StartupError before any engine starts
//!
//! Role start (controller.rs):
//!     start / manager_start / worker_start callback
//!         → role.rs (classify worker index against worker_num)
//!         → identity.rs (record + export master pid)
//!         → engine.set_process_title
//!         → state.rs (Unstarted → Starting → Running)
//!         → publish lifecycle event
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     SIGTERM/SIGINT → broadcast → roles stop → Stopping → Stopped
//! ```
//!
//! # Design Decisions
//! - A role is assigned once and never reassigned
//! - State transitions are one-way; out-of-order ones are rejected, not applied
//! - The master pid is the only value shared across roles

pub mod controller;
pub mod identity;
pub mod role;
pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod state;

pub use controller::RoleController;
pub use identity::{MasterPid, MASTER_PID_ENV};
pub use role::ProcessRole;
pub use shutdown::Shutdown;
pub use startup::StartupError;
pub use state::{RoleState, TransitionError};
