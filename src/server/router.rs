//! Execution routing: run the application here or hand it to a task worker.
//!
//! # Responsibilities
//! - Decide the execution mode once, from `async` and the task worker count
//! - Bracket every execution with `request` and `response` events
//! - Offload: encode the request, enqueue it, answer with a placeholder
//! - Inline: run the application with a fresh [`RequestContext`]
//!
//! # Design Decisions
//! - The offload path never waits for the task; its output is only
//!   observable as a `finish` event on the enqueuing worker
//! - A failed enqueue is logged and counted, and the placeholder is still sent

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::config::ServerConfig;
use crate::engine::{Engine, TaskId};
use crate::event::{Arg, Event, EventBus};
use crate::observability::metrics;
use crate::request::CanonicalRequest;
use crate::response::ResponseState;
use crate::server::app::{Application, RequestContext};

/// Body of the immediate response sent when a request is offloaded.
pub const TASK_ACCEPTED_BODY: &str = "success";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Run the application on the receiving worker.
    Inline,
    /// Enqueue the request for the task-worker pool.
    Offload,
}

impl ExecutionMode {
    /// Offload only when `async` is on and the engine actually starts task
    /// workers, counted from the merged settings the engine sees.
    pub fn for_config(config: &ServerConfig) -> Self {
        if config.async_mode && config.engine_settings().task_worker_num() > 0 {
            ExecutionMode::Offload
        } else {
            ExecutionMode::Inline
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::Inline => "inline",
            ExecutionMode::Offload => "offload",
        }
    }
}

pub struct ExecutionRouter {
    mode: ExecutionMode,
    app: Arc<dyn Application>,
}

impl ExecutionRouter {
    pub fn new(mode: ExecutionMode, app: Arc<dyn Application>) -> Self {
        Self { mode, app }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Produce the response for one normalized request.
    pub fn execute(
        &self,
        request: CanonicalRequest,
        bus: &EventBus,
        engine: &dyn Engine,
        transport: &'static str,
    ) -> ResponseState {
        let start = Instant::now();
        let request = Arc::new(request);
        let span = tracing::debug_span!(
            "execute",
            request_id = %request.id(),
            transport,
            mode = self.mode.as_str()
        );
        let _enter = span.enter();

        let info = engine.info();
        bus.publish(
            Event::Request,
            &[Arg::Server(info.clone()), Arg::Request(Arc::clone(&request))],
        );

        let response = match self.mode {
            ExecutionMode::Offload => {
                self.offload(&request, engine);
                ResponseState::with_body(TASK_ACCEPTED_BODY)
            }
            ExecutionMode::Inline => self.run(request),
        };

        bus.publish(
            Event::Response,
            &[Arg::Server(info), Arg::Response(response.clone())],
        );
        metrics::record_request(transport, self.mode.as_str(), start);

        response
    }

    /// Run the application for `request` on this thread.
    pub fn run(&self, request: Arc<CanonicalRequest>) -> ResponseState {
        let mut ctx = RequestContext::new(request);
        let reply = self.app.call(&mut ctx);
        reply.into_response(ctx.response)
    }

    /// Task-worker side: decode an offloaded request and run the application.
    /// The application's output is discarded.
    pub fn run_task(&self, task_id: TaskId, data: &[u8]) {
        match CanonicalRequest::from_task_payload(data) {
            Ok(request) => {
                tracing::debug!(task_id, request_id = %request.id(), "Running task");
                let _ = self.run(Arc::new(request));
            }
            Err(e) => {
                tracing::error!(task_id, error = %e, "Failed to decode task payload");
            }
        }
    }

    fn offload(&self, request: &CanonicalRequest, engine: &dyn Engine) {
        let payload = match request.to_task_payload() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode task payload");
                metrics::record_task_enqueued(false);
                return;
            }
        };

        match engine.task(payload) {
            Ok(task_id) => {
                tracing::debug!(task_id, "Request offloaded");
                metrics::record_task_enqueued(true);
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to enqueue task");
                metrics::record_task_enqueued(false);
            }
        }
    }
}

impl fmt::Debug for ExecutionRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionRouter")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerType;
    use crate::engine::testing::RecordingEngine;
    use crate::request::HttpMessage;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn config(async_mode: bool, task_worker_num: i64) -> ServerConfig {
        ServerConfig {
            worker_num: 1,
            async_mode,
            task_worker_num,
            ..ServerConfig::default()
        }
    }

    fn request() -> CanonicalRequest {
        CanonicalRequest::from_raw(HttpMessage {
            method: "GET".into(),
            path_info: "/".into(),
            ..HttpMessage::default()
        })
    }

    #[test]
    fn mode_needs_async_and_task_workers() {
        assert_eq!(ExecutionMode::for_config(&config(true, 2)), ExecutionMode::Offload);
        assert_eq!(ExecutionMode::for_config(&config(true, 0)), ExecutionMode::Inline);
        assert_eq!(ExecutionMode::for_config(&config(true, -4)), ExecutionMode::Inline);
        assert_eq!(ExecutionMode::for_config(&config(false, 2)), ExecutionMode::Inline);
    }

    #[test]
    fn mode_follows_merged_task_worker_count() {
        let mut overridden = config(true, 2);
        overridden
            .setting
            .insert("task_worker_num".into(), serde_json::Value::from(0));
        assert_eq!(overridden.engine_settings().task_worker_num(), 0);
        assert_eq!(ExecutionMode::for_config(&overridden), ExecutionMode::Inline);

        let mut enabled = config(true, 0);
        enabled
            .setting
            .insert("task_worker_num".into(), serde_json::Value::from(2));
        assert_eq!(ExecutionMode::for_config(&enabled), ExecutionMode::Offload);
    }

    #[test]
    fn offload_answers_placeholder_without_running_app() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let router = ExecutionRouter::new(
            ExecutionMode::Offload,
            Arc::new(move |_: &mut RequestContext| {
                counter.fetch_add(1, Ordering::SeqCst);
                "from app"
            }),
        );
        let engine = RecordingEngine::new(ServerType::Http, config(true, 1).engine_settings());

        let request = request();
        let response = router.execute(request.clone(), &EventBus::new(), &engine, "http");

        assert_eq!(response.body_str(), Some(TASK_ACCEPTED_BODY));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let tasks = engine.tasks();
        assert_eq!(tasks.len(), 1);
        let decoded = CanonicalRequest::from_task_payload(&tasks[0]).unwrap();
        assert_eq!(decoded.id(), request.id());
    }

    #[test]
    fn failed_enqueue_still_answers_placeholder() {
        let router = ExecutionRouter::new(ExecutionMode::Offload, Arc::new(|_: &mut RequestContext| "x"));
        let engine =
            RecordingEngine::new(ServerType::Http, config(true, 1).engine_settings()).refusing_tasks();

        let response = router.execute(request(), &EventBus::new(), &engine, "http");
        assert_eq!(response.body_str(), Some(TASK_ACCEPTED_BODY));
    }

    #[test]
    fn inline_brackets_app_with_events() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();
        for event in [Event::Request, Event::Response] {
            let seen = seen.clone();
            bus.subscribe(event, move |args| {
                let detail = match &args[1] {
                    Arg::Request(r) => r.path().unwrap_or_default().to_string(),
                    Arg::Response(r) => r.body_str().unwrap_or_default().to_string(),
                    other => format!("{other:?}"),
                };
                seen.lock().unwrap().push((event, detail));
                Ok(())
            });
        }

        let router = ExecutionRouter::new(
            ExecutionMode::Inline,
            Arc::new(|ctx: &mut RequestContext| format!("path={}", ctx.request().path().unwrap_or("?"))),
        );
        let engine = RecordingEngine::new(ServerType::Http, config(false, 0).engine_settings());
        let response = router.execute(request(), &bus, &engine, "http");

        assert_eq!(response.body_str(), Some("path=/"));
        assert!(engine.tasks().is_empty());
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                (Event::Request, "/".to_string()),
                (Event::Response, "path=/".to_string()),
            ]
        );
    }

    #[test]
    fn run_task_tolerates_garbage() {
        let router = ExecutionRouter::new(ExecutionMode::Inline, Arc::new(|_: &mut RequestContext| ()));
        router.run_task(0, b"not json");
    }
}
