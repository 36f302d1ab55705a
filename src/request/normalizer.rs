//! Transport-specific messages and their conversion into [`CanonicalRequest`].

use std::collections::BTreeMap;

use crate::engine::ConnectionInfo;
use crate::request::canonical::{CanonicalRequest, Parts, ServerMeta};

const FAVICON_PATH: &str = "/favicon.ico";

/// An HTTP request as handed over by the engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HttpMessage {
    pub method: String,
    /// Request uri without the query string.
    pub request_uri: String,
    pub path_info: String,
    pub query_string: Option<String>,
    /// Header pairs in arrival order; a repeated name keeps its last value.
    pub headers: Vec<(String, String)>,
    pub cookies: BTreeMap<String, String>,
    pub get: BTreeMap<String, String>,
    pub post: BTreeMap<String, String>,
    pub body: Vec<u8>,
    pub server: ServerMeta,
}

/// Bytes received on a raw socket plus the engine's view of the connection.
#[derive(Debug, Clone, PartialEq)]
pub struct SocketMessage {
    pub input: Vec<u8>,
    pub connection: ConnectionInfo,
}

/// Either transport shape, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawMessage {
    Http(HttpMessage),
    Socket(SocketMessage),
}

impl From<HttpMessage> for RawMessage {
    fn from(message: HttpMessage) -> Self {
        RawMessage::Http(message)
    }
}

impl From<SocketMessage> for RawMessage {
    fn from(message: SocketMessage) -> Self {
        RawMessage::Socket(message)
    }
}

impl CanonicalRequest {
    /// Normalize either transport shape.
    pub fn from_raw(raw: impl Into<RawMessage>) -> Self {
        match raw.into() {
            RawMessage::Http(message) => Self::from_http(message),
            RawMessage::Socket(message) => Self::from_socket(message),
        }
    }

    fn from_http(message: HttpMessage) -> Self {
        CanonicalRequest::from_parts(Parts {
            method: Some(message.method),
            uri: Some(message.request_uri),
            path: Some(message.path_info),
            query_string: message.query_string,
            headers: message
                .headers
                .into_iter()
                .map(|(name, value)| (name.to_ascii_lowercase(), value))
                .collect(),
            cookies: message.cookies,
            get: message.get,
            post: message.post,
            input: message.body,
            server: message.server,
        })
    }

    fn from_socket(message: SocketMessage) -> Self {
        let info = message.connection;
        CanonicalRequest::from_parts(Parts {
            input: message.input,
            server: ServerMeta {
                request_time: info.connect_time,
                request_time_float: info.connect_time as f64,
                server_port: info.server_port,
                remote_port: info.remote_port,
                remote_addr: Some(info.remote_ip),
                master_time: info.last_time,
            },
            ..Parts::default()
        })
    }
}

/// True for browser favicon probes, matched exactly on path or uri.
pub fn is_favicon(message: &HttpMessage) -> bool {
    message.path_info == FAVICON_PATH || message.request_uri == FAVICON_PATH
}

/// Split a `Cookie` header into name/value pairs. Later duplicates win.
pub fn parse_cookie_header(header: &str) -> BTreeMap<String, String> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().trim_matches('"').to_string()))
        })
        .collect()
}
