//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use worker_server::config::{ServerConfig, ServerType};
use worker_server::engine::ConnectionInfo;
use worker_server::event::{Arg, Event};
use worker_server::request::HttpMessage;
use worker_server::Server;

/// Config for a runtime driven by hand, with a fixed worker layout.
pub fn config(server_type: ServerType, worker_num: usize, task_worker_num: i64) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".into(),
        port: 0,
        server_type,
        worker_num,
        task_worker_num,
        process_name: "test-server".into(),
        ..ServerConfig::default()
    }
}

/// A minimal GET message for `path`.
pub fn get(path: &str) -> HttpMessage {
    HttpMessage {
        method: "GET".into(),
        request_uri: path.into(),
        path_info: path.into(),
        ..HttpMessage::default()
    }
}

pub fn connection(remote_port: u16) -> ConnectionInfo {
    ConnectionInfo {
        connect_time: 1_700_000_000,
        last_time: 1_700_000_010,
        server_port: 9501,
        remote_port,
        remote_ip: "10.0.0.7".into(),
    }
}

/// Records the name and positional payload of every event it listens to.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    seen: Arc<Mutex<Vec<(Event, Vec<Arg>)>>>,
}

impl EventLog {
    pub fn listen(&self, server: &mut Server, events: &[Event]) {
        for &event in events {
            let seen = Arc::clone(&self.seen);
            server.on(event, move |args| {
                seen.lock().unwrap().push((event, args.to_vec()));
                Ok(())
            });
        }
    }

    pub fn names(&self) -> Vec<Event> {
        self.seen.lock().unwrap().iter().map(|(e, _)| *e).collect()
    }

    pub fn args(&self, event: Event) -> Option<Vec<Arg>> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .find(|(e, _)| *e == event)
            .map(|(_, args)| args.clone())
    }
}

/// Poll `check` until it holds or `timeout` elapses.
pub async fn eventually(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}
