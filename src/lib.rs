//! Process-oriented application server core.
//!
//! One worker pool serves HTTP or raw TCP traffic. Every inbound
//! transmission is normalized into a [`CanonicalRequest`], announced on a
//! per-role [`EventBus`], and either answered inline by the application or
//! offloaded to a task worker.
//!
//! [`CanonicalRequest`]: request::CanonicalRequest
//! [`EventBus`]: event::EventBus

pub mod config;
pub mod engine;
pub mod event;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod request;
pub mod response;
pub mod server;
pub mod transport;

pub use config::ServerConfig;
pub use engine::{Engine, EngineCallback, LocalEngine};
pub use lifecycle::Shutdown;
pub use server::{Application, Reply, RequestContext, Server};
