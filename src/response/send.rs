//! Emitting a finished response through the engine.

use crate::config::ServerType;
use crate::engine::{Engine, HttpResponder};
use crate::net::ConnectionId;
use crate::response::state::ResponseState;

impl ResponseState {
    /// Emit the response on an HTTP engine.
    ///
    /// Calls `header` once per header, `cookie` once per cookie, `status`
    /// once and `end` last. Returns `false` without touching the responder
    /// if the engine is not an HTTP engine.
    pub fn send_http(self, responder: &mut dyn HttpResponder, engine: &dyn Engine) -> bool {
        if engine.kind() != ServerType::Http {
            tracing::warn!(engine = %engine.kind(), "HTTP send on a non-HTTP engine");
            return false;
        }

        let built = self.into_built();
        let mut ok = true;
        for (key, value) in &built.headers {
            ok &= responder.header(key, value);
        }
        for (key, cookie) in &built.cookies {
            ok &= responder.cookie(key, cookie);
        }
        ok &= responder.status(built.status);
        responder.end(&built.body) && ok
    }

    /// Write the body verbatim to a socket connection.
    pub fn send_socket(self, fd: ConnectionId, engine: &dyn Engine) -> bool {
        if engine.kind() != ServerType::Socket {
            tracing::warn!(engine = %engine.kind(), %fd, "Socket send on a non-socket engine");
            return false;
        }

        let built = self.into_built();
        engine.send(fd, &built.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineSettings;
    use crate::engine::testing::{RecordingEngine, RecordingResponder, ResponderCall};
    use crate::response::Cookie;

    fn engine(kind: ServerType) -> RecordingEngine {
        RecordingEngine::new(kind, EngineSettings::default())
    }

    #[test]
    fn http_send_emits_calls_in_order() {
        let mut state = ResponseState::new();
        state
            .set_header("Content-Type", "text/plain")
            .set_cookie("sid", Cookie::new("abc").secure(true))
            .set_status(201)
            .set_body("created");

        let mut responder = RecordingResponder::default();
        assert!(state.send_http(&mut responder, &engine(ServerType::Http)));

        assert_eq!(
            responder.calls(),
            &[
                ResponderCall::Header("content-type".into(), "text/plain".into()),
                ResponderCall::Cookie("sid".into(), Cookie::new("abc").secure(true)),
                ResponderCall::Status(201),
                ResponderCall::End(b"created".to_vec()),
            ]
        );
    }

    #[test]
    fn untouched_state_sends_defaults() {
        let mut responder = RecordingResponder::default();
        assert!(ResponseState::new().send_http(&mut responder, &engine(ServerType::Http)));
        assert_eq!(responder.status_code(), Some(200));
        assert_eq!(responder.body(), Some(&b""[..]));
        assert_eq!(responder.calls().len(), 2);
    }

    #[test]
    fn http_send_on_socket_engine_fails() {
        let mut responder = RecordingResponder::default();
        let sent = ResponseState::with_body("x").send_http(&mut responder, &engine(ServerType::Socket));
        assert!(!sent);
        assert!(responder.calls().is_empty());
    }

    #[test]
    fn socket_send_writes_body_verbatim() {
        let engine = engine(ServerType::Socket);
        let fd = ConnectionId::from_raw(7);
        let body = vec![0u8, 1, 2, 255];

        assert!(ResponseState::with_body(body.clone()).send_socket(fd, &engine));
        assert_eq!(engine.sent(), vec![(fd, body)]);
    }

    #[test]
    fn socket_send_on_http_engine_fails() {
        let engine = engine(ServerType::Http);
        assert!(!ResponseState::with_body("x").send_socket(ConnectionId::from_raw(1), &engine));
        assert!(engine.sent().is_empty());
    }
}
