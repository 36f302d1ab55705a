//! HTTP front: axum accepts, role threads answer.
//!
//! # Data Flow
//! ```text
//! axum fallback handler
//!     → HttpMessage (query, form body, cookies, server meta)
//!     → event worker inbox (round-robin) + oneshot reply
//!     → Server::handle on the worker thread → BufferedResponder
//!     → axum Response
//! ```

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::engine::local::handle::Shared;
use crate::engine::local::roles::WorkerMessage;
use crate::engine::local::unix_now;
use crate::engine::HttpResponder;
use crate::lifecycle::Shutdown;
use crate::request::{parse_cookie_header, HttpMessage, ServerMeta};
use crate::response::Cookie;

/// Collects native response calls on a worker thread so the async front can
/// turn them into an axum response.
#[derive(Debug, Default)]
pub struct BufferedResponder {
    headers: Vec<(String, String)>,
    cookies: Vec<(String, Cookie)>,
    status: Option<u16>,
    body: Option<Vec<u8>>,
}

impl BufferedResponder {
    /// Stand-in for a request whose worker crashed.
    pub fn bad_gateway() -> Self {
        Self {
            status: Some(StatusCode::BAD_GATEWAY.as_u16()),
            body: Some(b"Bad Gateway".to_vec()),
            ..Self::default()
        }
    }

    pub fn is_ended(&self) -> bool {
        self.body.is_some()
    }

    pub fn into_response(self) -> Response {
        let Some(body) = self.body else {
            tracing::warn!("Worker never ended the response");
            return (StatusCode::BAD_GATEWAY, "Response was not ended").into_response();
        };

        let mut response = Response::new(Body::from(body));
        *response.status_mut() = self
            .status
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or(StatusCode::OK);

        let headers = response.headers_mut();
        for (name, value) in self.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(&value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => tracing::warn!(header = %name, "Dropping invalid response header"),
            }
        }
        for (name, cookie) in self.cookies {
            match HeaderValue::from_str(&cookie.to_header_value(&name)) {
                Ok(value) => {
                    headers.append(header::SET_COOKIE, value);
                }
                Err(_) => tracing::warn!(cookie = %name, "Dropping invalid cookie"),
            }
        }

        response
    }

    fn accept(&self) -> bool {
        if self.is_ended() {
            tracing::debug!("Response already ended");
        }
        !self.is_ended()
    }
}

impl HttpResponder for BufferedResponder {
    fn header(&mut self, key: &str, value: &str) -> bool {
        let accepted = self.accept();
        if accepted {
            self.headers.push((key.to_string(), value.to_string()));
        }
        accepted
    }

    fn cookie(&mut self, key: &str, cookie: &Cookie) -> bool {
        let accepted = self.accept();
        if accepted {
            self.cookies.push((key.to_string(), cookie.clone()));
        }
        accepted
    }

    fn status(&mut self, code: u16) -> bool {
        let accepted = self.accept();
        if accepted {
            self.status = Some(code);
        }
        accepted
    }

    fn end(&mut self, body: &[u8]) -> bool {
        let accepted = self.accept();
        if accepted {
            self.body = Some(body.to_vec());
        }
        accepted
    }
}

#[derive(Debug)]
struct HttpFront {
    shared: Arc<Shared>,
    next_worker: AtomicUsize,
    server_port: u16,
    max_body: usize,
}

impl HttpFront {
    fn pick_worker(&self) -> usize {
        self.next_worker.fetch_add(1, Ordering::Relaxed) % self.shared.worker_num
    }
}

fn build_router(shared: Arc<Shared>, server_port: u16) -> Router {
    let front = HttpFront {
        max_body: shared.info.settings.package_max_length(),
        shared,
        next_worker: AtomicUsize::new(0),
        server_port,
    };

    Router::new()
        .fallback(dispatch)
        .with_state(Arc::new(front))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

/// Serve HTTP on `listener` until `shutdown` triggers.
pub(crate) async fn serve(
    listener: TcpListener,
    shared: Arc<Shared>,
    shutdown: Shutdown,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "HTTP server starting");

    let app = build_router(shared, addr.port()).into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.wait().await })
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

async fn dispatch(
    State(front): State<Arc<HttpFront>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let message = match to_message(request, peer, front.server_port, front.max_body).await {
        Ok(message) => message,
        Err(response) => return response,
    };

    let worker_id = front.pick_worker();
    let (reply, response) = oneshot::channel();
    if !front
        .shared
        .deliver(worker_id, WorkerMessage::Request { message, reply })
    {
        tracing::error!(worker_id, "Worker inbox closed");
        return (StatusCode::SERVICE_UNAVAILABLE, "Worker unavailable").into_response();
    }

    match response.await {
        Ok(responder) => responder.into_response(),
        Err(_) => {
            tracing::error!(worker_id, "Worker dropped the request");
            (StatusCode::BAD_GATEWAY, "Bad Gateway").into_response()
        }
    }
}

async fn to_message(
    request: Request<Body>,
    peer: SocketAddr,
    server_port: u16,
    max_body: usize,
) -> Result<HttpMessage, Response> {
    let (parts, body) = request.into_parts();
    let body = to_bytes(body, max_body).await.map_err(|e| {
        tracing::warn!(error = %e, max_body, "Rejecting request body");
        (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response()
    })?;

    let query_string = parts.uri.query().map(str::to_string);
    let get = query_string
        .as_deref()
        .map(|q| decode_form(q.as_bytes()))
        .unwrap_or_default();
    let post = if is_form(&parts.headers) {
        decode_form(&body)
    } else {
        BTreeMap::new()
    };

    let headers = parts
        .headers
        .iter()
        .filter_map(|(name, value)| {
            let value = value.to_str().ok()?;
            Some((name.as_str().to_string(), value.to_string()))
        })
        .collect();
    let cookies = parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(parse_cookie_header)
        .collect();

    let (now, now_float) = unix_now();
    let path = parts.uri.path().to_string();
    Ok(HttpMessage {
        method: parts.method.to_string(),
        request_uri: path.clone(),
        path_info: path,
        query_string,
        headers,
        cookies,
        get,
        post,
        body: body.to_vec(),
        server: ServerMeta {
            request_time: now,
            request_time_float: now_float,
            server_port,
            remote_port: peer.port(),
            remote_addr: Some(peer.ip().to_string()),
            master_time: now,
        },
    })
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"))
}

fn decode_form(input: &[u8]) -> BTreeMap<String, String> {
    url::form_urlencoded::parse(input).into_owned().collect()
}
