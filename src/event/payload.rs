//! Positional event payloads.

use std::sync::Arc;

use serde_json::Value;

use crate::engine::ServerInfo;
use crate::request::CanonicalRequest;
use crate::response::ResponseState;

/// One positional argument of an event.
#[derive(Debug, Clone)]
pub enum Arg {
    /// The engine's server handle, always first for runtime events.
    Server(ServerInfo),
    Int(i64),
    Text(String),
    Bytes(Vec<u8>),
    Request(Arc<CanonicalRequest>),
    Response(ResponseState),
    Value(Value),
}

impl Arg {
    pub fn as_server(&self) -> Option<&ServerInfo> {
        match self {
            Arg::Server(info) => Some(info),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Arg::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Arg::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Arg::Bytes(b) => Some(b),
            Arg::Text(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    pub fn as_request(&self) -> Option<&CanonicalRequest> {
        match self {
            Arg::Request(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_response(&self) -> Option<&ResponseState> {
        match self {
            Arg::Response(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Arg::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl From<i64> for Arg {
    fn from(n: i64) -> Self {
        Arg::Int(n)
    }
}

impl From<usize> for Arg {
    fn from(n: usize) -> Self {
        Arg::Int(n as i64)
    }
}

impl From<u64> for Arg {
    fn from(n: u64) -> Self {
        Arg::Int(n as i64)
    }
}

impl From<u32> for Arg {
    fn from(n: u32) -> Self {
        Arg::Int(i64::from(n))
    }
}

impl From<i32> for Arg {
    fn from(n: i32) -> Self {
        Arg::Int(i64::from(n))
    }
}

impl From<Vec<u8>> for Arg {
    fn from(b: Vec<u8>) -> Self {
        Arg::Bytes(b)
    }
}

impl From<ServerInfo> for Arg {
    fn from(info: ServerInfo) -> Self {
        Arg::Server(info)
    }
}

impl From<ResponseState> for Arg {
    fn from(response: ResponseState) -> Self {
        Arg::Response(response)
    }
}

impl From<Arc<CanonicalRequest>> for Arg {
    fn from(request: Arc<CanonicalRequest>) -> Self {
        Arg::Request(request)
    }
}
