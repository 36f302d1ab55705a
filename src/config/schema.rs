//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::settings::EngineSettings;

/// Root configuration for the application server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind host (e.g., "0.0.0.0").
    pub host: String,

    /// Bind port. `0` lets the engine pick one.
    pub port: u16,

    /// Transport selection: "http" or anything else for raw sockets.
    pub server_type: ServerType,

    /// Number of event workers.
    pub worker_num: usize,

    /// Number of task workers. Negative values are clamped to zero.
    pub task_worker_num: i64,

    /// Ask the engine to detach from the terminal.
    pub daemonize: bool,

    /// Requests a worker handles before the engine recycles it (0 = unlimited).
    pub max_request: u64,

    /// Offload requests to task workers when enabled and task workers exist.
    #[serde(rename = "async")]
    pub async_mode: bool,

    /// Prefix for process titles.
    pub process_name: String,

    /// Free-form engine settings merged verbatim over the defaults above.
    pub setting: Map<String, Value>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 0,
            server_type: ServerType::Http,
            worker_num: default_worker_num(),
            task_worker_num: 0,
            daemonize: false,
            max_request: 0,
            async_mode: false,
            process_name: "worker-server".to_string(),
            setting: Map::new(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Task worker count with negative values clamped to zero.
    pub fn task_workers(&self) -> usize {
        self.task_worker_num.max(0) as usize
    }

    /// Build the engine setting map: defaults first, then `setting` merged over them.
    pub fn engine_settings(&self) -> EngineSettings {
        let mut merged = Map::new();
        merged.insert("worker_num".into(), Value::from(self.worker_num));
        merged.insert("task_worker_num".into(), Value::from(self.task_workers()));
        merged.insert("daemonize".into(), Value::from(self.daemonize));
        merged.insert("max_request".into(), Value::from(self.max_request));

        for (key, value) in &self.setting {
            merged.insert(key.clone(), value.clone());
        }

        EngineSettings::new(merged)
    }
}

fn default_worker_num() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Transport selected once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ServerType {
    /// HTTP request/response transport.
    Http,
    /// Raw TCP socket transport.
    Socket,
}

impl From<String> for ServerType {
    fn from(value: String) -> Self {
        if value.eq_ignore_ascii_case("http") {
            ServerType::Http
        } else {
            ServerType::Socket
        }
    }
}

impl std::fmt::Display for ServerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerType::Http => write!(f, "http"),
            ServerType::Socket => write!(f, "socket"),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
