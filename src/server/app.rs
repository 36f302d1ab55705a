//! Application contract.

use std::sync::Arc;

use crate::request::CanonicalRequest;
use crate::response::ResponseState;

/// Per-request state handed to the application.
///
/// Exactly one context exists per request; it is never shared.
#[derive(Debug)]
pub struct RequestContext {
    pub request: Arc<CanonicalRequest>,
    pub response: ResponseState,
}

impl RequestContext {
    pub fn new(request: Arc<CanonicalRequest>) -> Self {
        Self {
            request,
            response: ResponseState::new(),
        }
    }

    pub fn request(&self) -> &CanonicalRequest {
        &self.request
    }

    pub fn response(&mut self) -> &mut ResponseState {
        &mut self.response
    }
}

/// What an application hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Text body; the rest of the context's response is kept.
    Body(String),
    /// Raw body; the rest of the context's response is kept.
    Bytes(Vec<u8>),
    /// Replaces the context's response entirely.
    Response(ResponseState),
    /// Send the context's response as it is.
    Empty,
}

impl Reply {
    /// Fold this reply into the context's response.
    pub fn into_response(self, mut current: ResponseState) -> ResponseState {
        match self {
            Reply::Body(body) => {
                current.set_body(body);
                current
            }
            Reply::Bytes(body) => {
                current.set_body(body);
                current
            }
            Reply::Response(response) => response,
            Reply::Empty => current,
        }
    }
}

impl From<String> for Reply {
    fn from(body: String) -> Self {
        Reply::Body(body)
    }
}

impl From<&str> for Reply {
    fn from(body: &str) -> Self {
        Reply::Body(body.to_string())
    }
}

impl From<Vec<u8>> for Reply {
    fn from(body: Vec<u8>) -> Self {
        Reply::Bytes(body)
    }
}

impl From<ResponseState> for Reply {
    fn from(response: ResponseState) -> Self {
        Reply::Response(response)
    }
}

impl From<()> for Reply {
    fn from(_: ()) -> Self {
        Reply::Empty
    }
}

/// User code run for every request.
///
/// Panics propagate to the worker that ran the application.
pub trait Application: Send + Sync {
    fn call(&self, ctx: &mut RequestContext) -> Reply;
}

impl<F, R> Application for F
where
    F: Fn(&mut RequestContext) -> R + Send + Sync,
    R: Into<Reply>,
{
    fn call(&self, ctx: &mut RequestContext) -> Reply {
        self(ctx).into()
    }
}
