//! Transport adapters.
//!
//! # Data Flow
//! ```text
//! EngineCallback
//!     ├─ traffic (connect / receive / request / close)
//!     │     → Transport selected once from server_type
//!     │         http.rs:   favicon check → normalize → router → send_http
//!     │         socket.rs: connection info → normalize → router → send_socket
//!     └─ lifecycle (everything else)
//!           → lifecycle.rs → same-named bus event, payload positional
//! ```
//!
//! # Design Decisions
//! - One trait, two implementations, chosen once at startup
//! - Traffic a transport does not register is ignored with a debug log

pub mod http;
pub mod lifecycle;
pub mod socket;

use std::fmt;

use crate::config::ServerType;
use crate::engine::{Engine, HttpResponder};
use crate::event::EventBus;
use crate::net::ConnectionId;
use crate::request::HttpMessage;
use crate::server::ExecutionRouter;

pub use self::http::HttpTransport;
pub use self::socket::SocketTransport;

/// What a transport needs to serve one callback.
#[derive(Clone, Copy)]
pub struct Dispatch<'a> {
    pub bus: &'a EventBus,
    pub router: &'a ExecutionRouter,
    pub engine: &'a dyn Engine,
}

impl fmt::Debug for Dispatch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch")
            .field("bus", self.bus)
            .field("router", self.router)
            .field("engine", &self.engine.kind())
            .finish()
    }
}

/// Traffic handling for one kind of server.
pub trait Transport: fmt::Debug + Send {
    fn kind(&self) -> ServerType;

    fn on_connect(&self, _ctx: Dispatch<'_>, fd: ConnectionId, _reactor_id: u32) {
        ignored(self.kind(), "connect", Some(fd));
    }

    fn on_receive(&self, _ctx: Dispatch<'_>, fd: ConnectionId, _reactor_id: u32, _data: Vec<u8>) {
        ignored(self.kind(), "receive", Some(fd));
    }

    fn on_request(
        &self,
        _ctx: Dispatch<'_>,
        _message: HttpMessage,
        _responder: &mut (dyn HttpResponder + Send),
    ) {
        ignored(self.kind(), "request", None);
    }

    fn on_close(&self, _ctx: Dispatch<'_>, fd: ConnectionId, _reactor_id: u32) {
        ignored(self.kind(), "close", Some(fd));
    }
}

/// The transport for `kind`.
pub fn select(kind: ServerType) -> Box<dyn Transport> {
    match kind {
        ServerType::Http => Box::new(HttpTransport),
        ServerType::Socket => Box::new(SocketTransport),
    }
}

fn ignored(kind: ServerType, callback: &'static str, fd: Option<ConnectionId>) {
    tracing::debug!(transport = %kind, callback, fd = ?fd, "Callback not registered for this transport");
}
