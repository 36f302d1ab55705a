//! Raw TCP socket transport.

use crate::config::ServerType;
use crate::event::{Arg, Event};
use crate::net::ConnectionId;
use crate::request::{CanonicalRequest, SocketMessage};
use crate::transport::{Dispatch, Transport};

#[derive(Debug, Clone, Copy, Default)]
pub struct SocketTransport;

impl SocketTransport {
    fn publish(ctx: Dispatch<'_>, event: Event, fd: ConnectionId, reactor_id: u32) {
        ctx.bus.publish(
            event,
            &[
                Arg::Server(ctx.engine.info()),
                Arg::from(fd.as_u64()),
                Arg::from(reactor_id),
            ],
        );
    }
}

impl Transport for SocketTransport {
    fn kind(&self) -> ServerType {
        ServerType::Socket
    }

    fn on_connect(&self, ctx: Dispatch<'_>, fd: ConnectionId, reactor_id: u32) {
        tracing::debug!(%fd, reactor_id, "Socket connected");
        Self::publish(ctx, Event::Connect, fd, reactor_id);
    }

    fn on_receive(&self, ctx: Dispatch<'_>, fd: ConnectionId, reactor_id: u32, data: Vec<u8>) {
        let Some(connection) = ctx.engine.connection_info(fd) else {
            tracing::warn!(%fd, reactor_id, bytes = data.len(), "Receive on unknown connection, dropping");
            return;
        };

        let request = CanonicalRequest::from_raw(SocketMessage {
            input: data,
            connection,
        });
        let response = ctx.router.execute(request, ctx.bus, ctx.engine, "socket");
        if !response.send_socket(fd, ctx.engine) {
            tracing::warn!(%fd, "Socket response was not sent");
        }
    }

    fn on_close(&self, ctx: Dispatch<'_>, fd: ConnectionId, reactor_id: u32) {
        tracing::debug!(%fd, reactor_id, "Socket closed");
        Self::publish(ctx, Event::Close, fd, reactor_id);
    }
}
