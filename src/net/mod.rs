//! Network helpers for the local engine's raw-socket front.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, max_conn limit)
//!     → connection.rs (id assignment, connection table, writer channel)
//!     → role thread owning the connection
//! ```
//!
//! # Design Decisions
//! - Bounded accept prevents resource exhaustion
//! - Each connection is registered in a table so any worker can write to it by id
//! - A table entry lives exactly as long as its guard

pub mod connection;
pub mod listener;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionTable};
pub use listener::{ConnectionPermit, Listener, ListenerError};
