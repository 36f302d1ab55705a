//! Request normalization subsystem.
//!
//! # Data Flow
//! ```text
//! HTTP engine callback ──→ HttpMessage ──┐
//!                                        ├─→ RawMessage → CanonicalRequest
//! socket receive + ConnectionInfo ──→ SocketMessage ──┘
//!
//! CanonicalRequest
//!     → read by the application through accessors
//!     → codec.rs (JSON) when offloaded to a task worker
//! ```
//!
//! # Design Decisions
//! - One immutable request type for both transports; socket requests simply
//!   have no method, uri or path
//! - Header names are lower-cased once at construction
//! - `/favicon.ico` is answered before normalization by the HTTP transport

pub mod canonical;
pub mod codec;
pub mod normalizer;

pub use canonical::{CanonicalRequest, ServerMeta};
pub use codec::CodecError;
pub use normalizer::{is_favicon, parse_cookie_header, HttpMessage, RawMessage, SocketMessage};
