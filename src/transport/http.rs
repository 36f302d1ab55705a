//! HTTP request/response transport.

use crate::config::ServerType;
use crate::engine::HttpResponder;
use crate::request::{is_favicon, CanonicalRequest, HttpMessage};
use crate::transport::{Dispatch, Transport};

#[derive(Debug, Clone, Copy, Default)]
pub struct HttpTransport;

impl Transport for HttpTransport {
    fn kind(&self) -> ServerType {
        ServerType::Http
    }

    fn on_request(
        &self,
        ctx: Dispatch<'_>,
        message: HttpMessage,
        responder: &mut (dyn HttpResponder + Send),
    ) {
        if is_favicon(&message) {
            responder.end(b"");
            return;
        }

        let request = CanonicalRequest::from_raw(message);
        let request_id = request.id();
        let response = ctx.router.execute(request, ctx.bus, ctx.engine, "http");
        if !response.send_http(responder, ctx.engine) {
            tracing::warn!(%request_id, "HTTP response was not fully sent");
        }
    }
}
