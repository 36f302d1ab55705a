//! Merged engine settings.
//!
//! The engine receives one flat map: the typed defaults from [`ServerConfig`]
//! with the free-form `setting` table merged over them. Readers go through the
//! accessors below so that a string or float written in the free-form table
//! still resolves to a sensible value.
//!
//! [`ServerConfig`]: crate::config::ServerConfig

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const DEFAULT_MAX_CONN: usize = 10_000;
const DEFAULT_PACKAGE_MAX_LENGTH: usize = 2 * 1024 * 1024;

/// Flat engine setting map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EngineSettings(Map<String, Value>);

impl EngineSettings {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Raw lookup.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Event worker count, at least one. Worker indices at or above it
    /// belong to task workers.
    pub fn worker_num(&self) -> usize {
        self.usize_or("worker_num", 1).max(1)
    }

    pub fn task_worker_num(&self) -> usize {
        self.usize_or("task_worker_num", 0)
    }

    pub fn max_request(&self) -> u64 {
        self.get("max_request").and_then(as_u64).unwrap_or(0)
    }

    pub fn daemonize(&self) -> bool {
        self.flag("daemonize")
    }

    /// Enables the worker-exit callback. Only a boolean `true` counts.
    pub fn reload_async(&self) -> bool {
        matches!(self.get("reload_async"), Some(Value::Bool(true)))
    }

    pub fn task_enable_coroutine(&self) -> bool {
        self.flag("task_enable_coroutine")
    }

    /// Maximum concurrent raw-socket connections.
    pub fn max_conn(&self) -> usize {
        self.usize_or("max_conn", DEFAULT_MAX_CONN)
    }

    /// Largest HTTP request body accepted, in bytes.
    pub fn package_max_length(&self) -> usize {
        self.usize_or("package_max_length", DEFAULT_PACKAGE_MAX_LENGTH)
    }

    fn usize_or(&self, key: &str, default: usize) -> usize {
        self.get(key)
            .and_then(as_u64)
            .map(|n| n as usize)
            .unwrap_or(default)
    }

    fn flag(&self, key: &str) -> bool {
        match self.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
            Some(Value::String(s)) => matches!(s.as_str(), "1" | "true" | "on" | "yes"),
            _ => false,
        }
    }
}

fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_i64().map(|i| i.max(0) as u64))
            .or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn settings(value: Value) -> EngineSettings {
        match value {
            Value::Object(map) => EngineSettings::new(map),
            _ => unreachable!(),
        }
    }

    #[test]
    fn numeric_accessors_tolerate_loose_types() {
        let s = settings(json!({ "worker_num": "4", "task_worker_num": -2, "max_request": 10.0 }));
        assert_eq!(s.worker_num(), 4);
        assert_eq!(s.task_worker_num(), 0);
        assert_eq!(s.max_request(), 10);
    }

    #[test]
    fn flags_default_to_false() {
        let s = settings(json!({ "daemonize": 0 }));
        assert!(!s.reload_async());
        assert!(!s.daemonize());
        assert!(!s.task_enable_coroutine());
        assert_eq!(s.max_conn(), DEFAULT_MAX_CONN);
    }

    #[test]
    fn reload_async_needs_boolean_true() {
        for loose in [json!("yes"), json!("on"), json!(1), json!("true")] {
            assert!(!settings(json!({ "reload_async": loose })).reload_async());
        }
        assert!(settings(json!({ "reload_async": true })).reload_async());
    }
}
