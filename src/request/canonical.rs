//! The canonical request value.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Connection-side metadata attached to every request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerMeta {
    /// Unix time the connection (socket) or request (HTTP) started.
    pub request_time: i64,
    pub request_time_float: f64,
    pub server_port: u16,
    pub remote_port: u16,
    pub remote_addr: Option<String>,
    /// Unix time of the last activity the engine saw on the connection.
    pub master_time: i64,
}

/// One inbound transmission, independent of the transport it arrived on.
///
/// Built once and never mutated. Socket requests carry no method, uri or
/// path; their payload is available verbatim through [`input`].
///
/// [`input`]: CanonicalRequest::input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRequest {
    id: Uuid,
    method: Option<String>,
    uri: Option<String>,
    path: Option<String>,
    query_string: Option<String>,
    headers: BTreeMap<String, String>,
    cookies: BTreeMap<String, String>,
    get: BTreeMap<String, String>,
    post: BTreeMap<String, String>,
    input: Vec<u8>,
    server: ServerMeta,
}

/// Field-by-field constructor used by the normalizer.
#[derive(Debug, Default)]
pub(crate) struct Parts {
    pub method: Option<String>,
    pub uri: Option<String>,
    pub path: Option<String>,
    pub query_string: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub cookies: BTreeMap<String, String>,
    pub get: BTreeMap<String, String>,
    pub post: BTreeMap<String, String>,
    pub input: Vec<u8>,
    pub server: ServerMeta,
}

impl CanonicalRequest {
    pub(crate) fn from_parts(parts: Parts) -> Self {
        let headers = parts
            .headers
            .into_iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .collect();

        Self {
            id: Uuid::new_v4(),
            method: parts.method,
            uri: parts.uri,
            path: parts.path,
            query_string: parts.query_string,
            headers,
            cookies: parts.cookies,
            get: parts.get,
            post: parts.post,
            input: parts.input,
            server: parts.server,
        }
    }

    /// Correlation id, stable across the task boundary.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// HTTP method; `None` for socket requests.
    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    /// Raw request uri as reported by the engine.
    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    /// Path info; `None` for socket requests.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn query_string(&self) -> Option<&str> {
        self.query_string.as_deref()
    }

    /// URL without the query string. Uses the `Host` header when present.
    pub fn url(&self) -> Option<String> {
        let path = self.path()?;
        Some(match self.header("host") {
            Some(host) => format!("http://{host}{path}"),
            None => path.to_string(),
        })
    }

    /// Query-string parameter.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.get.get(key).map(String::as_str)
    }

    pub fn query(&self) -> &BTreeMap<String, String> {
        &self.get
    }

    /// Body parameter.
    pub fn post(&self, key: &str) -> Option<&str> {
        self.post.get(key).map(String::as_str)
    }

    pub fn post_params(&self) -> &BTreeMap<String, String> {
        &self.post
    }

    /// Parameter from either bag; the query string wins.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.get(key).or_else(|| self.post(key))
    }

    /// Raw payload: the request body for HTTP, the received bytes for sockets.
    pub fn input(&self) -> &[u8] {
        &self.input
    }

    /// The payload as UTF-8, if it is valid UTF-8.
    pub fn input_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.input).ok()
    }

    /// Header lookup, case-insensitive.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn cookie(&self, key: &str) -> Option<&str> {
        self.cookies.get(key).map(String::as_str)
    }

    pub fn cookies(&self) -> &BTreeMap<String, String> {
        &self.cookies
    }

    /// Client address as seen by the engine.
    pub fn ip(&self) -> Option<&str> {
        self.server.remote_addr.as_deref()
    }

    pub fn server(&self) -> &ServerMeta {
        &self.server
    }

    /// True when the request came from the raw socket transport.
    pub fn is_socket(&self) -> bool {
        self.method.is_none()
    }
}
