//! Response accumulation subsystem.
//!
//! # Data Flow
//! ```text
//! application code
//!     → state.rs (set_body / set_header / set_status / set_cookie)
//!     → build() (defaults applied once, at send time)
//!     → send.rs
//!         HTTP:   header × N → cookie × N → status → end(body)
//!         socket: send(fd, body)
//! ```
//!
//! # Design Decisions
//! - Unset fields stay unset until `build()`
//! - Sending consumes the state, so a response goes out at most once
//! - A send through the wrong kind of engine reports `false` instead of failing

pub mod cookie;
pub mod send;
pub mod state;

pub use cookie::Cookie;
pub use state::{BuiltResponse, ResponseState, DEFAULT_STATUS};
