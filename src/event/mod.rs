//! Event bus subsystem.
//!
//! # Data Flow
//! ```text
//! engine callback
//!     → transport / lifecycle controller
//!     → bus.rs publish(name, args)
//!     → every listener registered for `name`, in registration order
//! ```
//!
//! # Design Decisions
//! - One bus per role runtime; nothing crosses process boundaries here
//! - Payloads are positional (`Arg`), mirroring the engine callback arguments
//! - A failing listener is logged and skipped; it never aborts dispatch

pub mod bus;
pub mod names;
pub mod payload;

pub use bus::{EventBus, ListenerError, ListenerResult, PublishReport};
pub use names::Event;
pub use payload::Arg;
