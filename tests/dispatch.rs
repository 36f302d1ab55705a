//! Drives a runtime through synthetic engine callbacks.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use worker_server::config::ServerType;
use worker_server::engine::testing::{RecordingEngine, RecordingResponder, ResponderCall};
use worker_server::engine::EngineCallback;
use worker_server::event::{Arg, Event};
use worker_server::lifecycle::{ProcessRole, RoleState};
use worker_server::net::ConnectionId;
use worker_server::request::{CanonicalRequest, HttpMessage};
use worker_server::response::Cookie;
use worker_server::server::TASK_ACCEPTED_BODY;
use worker_server::{RequestContext, Server};

mod common;
use common::EventLog;

fn counting_app(calls: Arc<AtomicUsize>) -> impl Fn(&mut RequestContext) -> String + Send + Sync {
    move |ctx: &mut RequestContext| {
        calls.fetch_add(1, Ordering::SeqCst);
        format!("hello {}", ctx.request().path().unwrap_or("-"))
    }
}

#[test]
fn favicon_is_answered_without_running_the_app() {
    let calls = Arc::new(AtomicUsize::new(0));
    let config = common::config(ServerType::Http, 1, 0);
    let engine = RecordingEngine::new(ServerType::Http, config.engine_settings());
    let mut server = Server::new(config, counting_app(Arc::clone(&calls))).unwrap();
    let log = EventLog::default();
    log.listen(&mut server, &[Event::Request, Event::Response]);

    let mut responder = RecordingResponder::default();
    server.handle(
        EngineCallback::Request {
            message: common::get("/favicon.ico"),
            responder: &mut responder,
        },
        &engine,
    );

    assert_eq!(responder.calls(), &[ResponderCall::End(Vec::new())]);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(log.names().is_empty());
}

#[test]
fn http_round_trip_applies_headers_cookies_and_status() {
    let config = common::config(ServerType::Http, 1, 0);
    let engine = RecordingEngine::new(ServerType::Http, config.engine_settings());
    let mut server = Server::new(config, |ctx: &mut RequestContext| {
        let user = ctx.request().get("user").unwrap_or("anon").to_string();
        ctx.response()
            .set_header("X-User", user.clone())
            .set_cookie("session", Cookie::new("abc").http_only(true))
            .set_status(201);
        format!("created {user}")
    })
    .unwrap();
    let log = EventLog::default();
    log.listen(&mut server, &[Event::Request, Event::Response]);

    let mut message = common::get("/users");
    message.query_string = Some("user=ada".into());
    message.get.insert("user".into(), "ada".into());

    let mut responder = RecordingResponder::default();
    server.handle(
        EngineCallback::Request {
            message,
            responder: &mut responder,
        },
        &engine,
    );

    assert_eq!(
        responder.calls(),
        &[
            ResponderCall::Header("x-user".into(), "ada".into()),
            ResponderCall::Cookie("session".into(), Cookie::new("abc").http_only(true)),
            ResponderCall::Status(201),
            ResponderCall::End(b"created ada".to_vec()),
        ]
    );
    assert_eq!(log.names(), vec![Event::Request, Event::Response]);

    let request = log.args(Event::Request).unwrap();
    assert!(request[0].as_server().is_some());
    let request = request[1].as_request().unwrap();
    assert_eq!(request.url().as_deref(), Some("/users"));
    assert_eq!(request.query_string(), Some("user=ada"));

    let response = log.args(Event::Response).unwrap();
    assert_eq!(response[1].as_response().unwrap().body_str(), Some("created ada"));
}

#[test]
fn socket_receive_normalizes_and_sends_raw_body() {
    let fd = ConnectionId::from_raw(7);
    let config = common::config(ServerType::Socket, 1, 0);
    let engine = RecordingEngine::new(ServerType::Socket, config.engine_settings())
        .with_connection(fd, common::connection(53211));
    let mut server = Server::new(config, |ctx: &mut RequestContext| {
        let request = ctx.request();
        assert!(request.is_socket());
        assert_eq!(request.ip(), Some("10.0.0.7"));
        assert_eq!(request.server().remote_port, 53211);
        format!("echo:{}", request.input_str().unwrap_or_default())
    })
    .unwrap();

    server.handle(
        EngineCallback::Receive {
            fd,
            reactor_id: 0,
            data: b"ping".to_vec(),
        },
        &engine,
    );

    assert_eq!(engine.sent(), vec![(fd, b"echo:ping".to_vec())]);
}

#[test]
fn receive_on_unknown_connection_is_dropped() {
    let calls = Arc::new(AtomicUsize::new(0));
    let config = common::config(ServerType::Socket, 1, 0);
    let engine = RecordingEngine::new(ServerType::Socket, config.engine_settings());
    let mut server = Server::new(config, counting_app(Arc::clone(&calls))).unwrap();

    server.handle(
        EngineCallback::Receive {
            fd: ConnectionId::from_raw(99),
            reactor_id: 0,
            data: b"lost".to_vec(),
        },
        &engine,
    );

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(engine.sent().is_empty());
}

#[test]
fn connect_and_close_publish_fd_and_reactor() {
    let fd = ConnectionId::from_raw(3);
    let config = common::config(ServerType::Socket, 1, 0);
    let engine = RecordingEngine::new(ServerType::Socket, config.engine_settings());
    let mut server = Server::new(config, |_: &mut RequestContext| ()).unwrap();
    let log = EventLog::default();
    log.listen(&mut server, &[Event::Connect, Event::Close]);

    server.handle(EngineCallback::Connect { fd, reactor_id: 2 }, &engine);
    server.handle(EngineCallback::Close { fd, reactor_id: 2 }, &engine);

    assert_eq!(log.names(), vec![Event::Connect, Event::Close]);
    let args = log.args(Event::Close).unwrap();
    assert_eq!(args[1].as_int(), Some(3));
    assert_eq!(args[2].as_int(), Some(2));
}

#[test]
fn async_mode_offloads_and_answers_placeholder() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut config = common::config(ServerType::Http, 2, 2);
    config.async_mode = true;
    let engine = RecordingEngine::new(ServerType::Http, config.engine_settings());
    let mut server = Server::new(config, counting_app(Arc::clone(&calls))).unwrap();

    let mut responder = RecordingResponder::default();
    server.handle(
        EngineCallback::Request {
            message: common::get("/slow"),
            responder: &mut responder,
        },
        &engine,
    );

    assert_eq!(responder.body(), Some(TASK_ACCEPTED_BODY.as_bytes()));
    assert_eq!(responder.status_code(), Some(200));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let tasks = engine.tasks();
    assert_eq!(tasks.len(), 1);
    let offloaded = CanonicalRequest::from_task_payload(&tasks[0]).unwrap();
    assert_eq!(offloaded.path(), Some("/slow"));
}

#[test]
fn async_mode_without_task_workers_runs_inline() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut config = common::config(ServerType::Http, 1, 0);
    config.async_mode = true;
    let engine = RecordingEngine::new(ServerType::Http, config.engine_settings());
    let mut server = Server::new(config, counting_app(Arc::clone(&calls))).unwrap();

    let mut responder = RecordingResponder::default();
    server.handle(
        EngineCallback::Request {
            message: common::get("/now"),
            responder: &mut responder,
        },
        &engine,
    );

    assert_eq!(responder.body(), Some(&b"hello /now"[..]));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(engine.tasks().is_empty());
}

#[test]
fn task_callback_runs_app_then_finishes_with_same_data() {
    let calls = Arc::new(AtomicUsize::new(0));
    let config = common::config(ServerType::Http, 1, 1);
    let engine = RecordingEngine::new(ServerType::Http, config.engine_settings());
    let mut server = Server::new(config, counting_app(Arc::clone(&calls))).unwrap();
    let log = EventLog::default();
    log.listen(&mut server, &[Event::Task]);

    let payload = CanonicalRequest::from_raw(common::get("/job"))
        .to_task_payload()
        .unwrap();
    server.handle(
        EngineCallback::Task {
            task_id: 11,
            src_worker_id: 0,
            data: payload.clone(),
        },
        &engine,
    );

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(engine.finished(), vec![(11, payload.clone())]);

    let args = log.args(Event::Task).unwrap();
    assert_eq!(args[1].as_int(), Some(11));
    assert_eq!(args[2].as_int(), Some(0));
    assert_eq!(args[3].as_bytes(), Some(payload.as_slice()));
}

#[test]
fn finish_is_forwarded_to_listeners() {
    let config = common::config(ServerType::Http, 1, 1);
    let engine = RecordingEngine::new(ServerType::Http, config.engine_settings());
    let mut server = Server::new(config, |_: &mut RequestContext| ()).unwrap();
    let log = EventLog::default();
    log.listen(&mut server, &[Event::Finish]);

    server.handle(
        EngineCallback::Finish {
            task_id: 4,
            data: b"done".to_vec(),
        },
        &engine,
    );

    let args = log.args(Event::Finish).unwrap();
    assert_eq!(args[1].as_int(), Some(4));
    assert_eq!(args[2].as_bytes(), Some(&b"done"[..]));
}

#[test]
fn worker_start_classifies_event_and_task_workers() {
    let config = common::config(ServerType::Http, 3, 2);
    let engine = RecordingEngine::new(ServerType::Http, config.engine_settings());

    let mut roles = Vec::new();
    for worker_id in 0..5 {
        let mut server = Server::new(config.clone(), |_: &mut RequestContext| ()).unwrap();
        server.handle(EngineCallback::WorkerStart { worker_id }, &engine);
        assert_eq!(server.state(), RoleState::Running);
        roles.push(server.role().unwrap());
    }

    assert_eq!(roles[2], ProcessRole::EventWorker { index: 2 });
    assert_eq!(roles[3], ProcessRole::TaskWorker { index: 3 });
    assert_eq!(
        engine.titles(),
        vec![
            "test-server: worker_event",
            "test-server: worker_event",
            "test-server: worker_event",
            "test-server: worker_task",
            "test-server: worker_task",
        ]
    );
}

#[test]
fn lifecycle_events_carry_server_first() {
    let config = common::config(ServerType::Http, 1, 0);
    let engine = RecordingEngine::new(ServerType::Http, config.engine_settings()).with_master_pid(777);
    let mut server = Server::new(config, |_: &mut RequestContext| ()).unwrap();
    let log = EventLog::default();
    log.listen(
        &mut server,
        &[Event::ManagerStart, Event::ManagerStop, Event::WorkerError],
    );

    server.handle(EngineCallback::ManagerStart, &engine);
    server.handle(
        EngineCallback::WorkerError {
            worker_id: 1,
            worker_pid: 3030,
            exit_code: 255,
            signal: 9,
        },
        &engine,
    );
    server.handle(EngineCallback::ManagerStop, &engine);

    assert_eq!(
        log.names(),
        vec![Event::ManagerStart, Event::WorkerError, Event::ManagerStop]
    );
    let start = log.args(Event::ManagerStart).unwrap();
    assert_eq!(start[0].as_server().map(|info| info.master_pid), Some(777));
    let error = log.args(Event::WorkerError).unwrap();
    let tail: Vec<_> = error[1..].iter().filter_map(Arg::as_int).collect();
    assert_eq!(tail, vec![1, 3030, 255, 9]);

    assert_eq!(server.role(), Some(ProcessRole::Manager));
    assert_eq!(server.state(), RoleState::Stopped);
}

#[test]
fn worker_exit_needs_reload_async() {
    let config = common::config(ServerType::Http, 1, 0);
    let engine = RecordingEngine::new(ServerType::Http, config.engine_settings());
    let mut server = Server::new(config, |_: &mut RequestContext| ()).unwrap();
    let log = EventLog::default();
    log.listen(&mut server, &[Event::WorkerExit]);
    server.handle(EngineCallback::WorkerExit { worker_id: 0 }, &engine);
    assert!(log.names().is_empty());

    let mut config = common::config(ServerType::Http, 1, 0);
    config.setting.insert("reload_async".into(), true.into());
    let engine = RecordingEngine::new(ServerType::Http, config.engine_settings());
    let mut server = Server::new(config, |_: &mut RequestContext| ()).unwrap();
    log.listen(&mut server, &[Event::WorkerExit]);
    server.handle(EngineCallback::WorkerExit { worker_id: 0 }, &engine);
    assert_eq!(log.names(), vec![Event::WorkerExit]);
}

#[test]
fn failing_listener_does_not_block_the_next_one() {
    let config = common::config(ServerType::Http, 1, 0);
    let engine = RecordingEngine::new(ServerType::Http, config.engine_settings());
    let mut server = Server::new(config, |_: &mut RequestContext| "ok").unwrap();

    let reached = Arc::new(AtomicUsize::new(0));
    server.on(Event::Request, |_| Err("listener broke".into()));
    server.on(Event::Request, |_| panic!("listener panicked"));
    let counter = Arc::clone(&reached);
    server.on(Event::Request, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    let mut responder = RecordingResponder::default();
    server.handle(
        EngineCallback::Request {
            message: common::get("/"),
            responder: &mut responder,
        },
        &engine,
    );

    assert_eq!(reached.load(Ordering::SeqCst), 1);
    assert_eq!(responder.body(), Some(&b"ok"[..]));
}

#[test]
fn traffic_for_the_other_transport_is_ignored() {
    let config = common::config(ServerType::Http, 1, 0);
    let engine = RecordingEngine::new(ServerType::Http, config.engine_settings())
        .with_connection(ConnectionId::from_raw(1), common::connection(1));
    let mut server = Server::new(config, |_: &mut RequestContext| "unused").unwrap();

    server.handle(
        EngineCallback::Receive {
            fd: ConnectionId::from_raw(1),
            reactor_id: 0,
            data: b"x".to_vec(),
        },
        &engine,
    );
    assert!(engine.sent().is_empty());

    let config = common::config(ServerType::Socket, 1, 0);
    let engine = RecordingEngine::new(ServerType::Socket, config.engine_settings());
    let mut server = Server::new(config, |_: &mut RequestContext| "unused").unwrap();
    let mut responder = RecordingResponder::default();
    server.handle(
        EngineCallback::Request {
            message: HttpMessage::default(),
            responder: &mut responder,
        },
        &engine,
    );
    assert!(responder.calls().is_empty());
}
