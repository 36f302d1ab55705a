//! worker-server
//!
//! Runs the application server core on the local engine with a demo
//! application that echoes every request back as JSON.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────┐
//!                     │                  worker-server                   │
//!   HTTP / TCP        │  ┌────────────┐      ┌────────────────────────┐  │
//!  ───────────────────┼─▶│   engine   │─────▶│  Server (one per role) │  │
//!                     │  │ local front│      │  transport → request   │  │
//!                     │  └────────────┘      │  → router → response   │  │
//!                     │        ▲             └───────────┬────────────┘  │
//!                     │        │                         │ offload       │
//!                     │        │   finish    ┌───────────▼────────────┐  │
//!                     │        └─────────────│      task workers      │  │
//!                     │                      └────────────────────────┘  │
//!                     │  cross-cutting: config, event bus, lifecycle,    │
//!                     │                 observability                    │
//!                     └──────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use serde_json::json;

use worker_server::config::{load_config, validate_config, ServerConfig, ServerType};
use worker_server::event::{Arg, Event};
use worker_server::lifecycle::signals;
use worker_server::observability::{logging, metrics};
use worker_server::{LocalEngine, RequestContext};

#[derive(Debug, Parser)]
#[command(name = "worker-server", version, about = "Process-oriented application server")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the transport: "http" or anything else for raw sockets.
    #[arg(long)]
    server_type: Option<String>,

    /// Override the event worker count.
    #[arg(long)]
    worker_num: Option<usize>,

    /// Override the task worker count.
    #[arg(long)]
    task_worker_num: Option<i64>,

    /// Offload requests to task workers.
    #[arg(long = "async")]
    async_mode: bool,
}

impl Cli {
    fn apply(&self, config: &mut ServerConfig) {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(server_type) = &self.server_type {
            config.server_type = ServerType::from(server_type.clone());
        }
        if let Some(worker_num) = self.worker_num {
            config.worker_num = worker_num;
        }
        if let Some(task_worker_num) = self.task_worker_num {
            config.task_worker_num = task_worker_num;
        }
        if self.async_mode {
            config.async_mode = true;
        }
    }
}

/// Echo the normalized request as JSON.
fn echo(ctx: &mut RequestContext) -> String {
    let request = ctx.request();
    let is_socket = request.is_socket();
    let mut body = json!({
        "id": request.id(),
        "method": request.method(),
        "path": request.path(),
        "url": request.url(),
        "query": request.query(),
        "post": request.post_params(),
        "cookies": request.cookies(),
        "input": String::from_utf8_lossy(request.input()),
        "ip": request.ip(),
    })
    .to_string();

    if is_socket {
        body.push('\n');
    } else {
        ctx.response().set_header("Content-Type", "application/json");
    }
    body
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    cli.apply(&mut config);
    if let Err(errors) = validate_config(&config) {
        for error in &errors {
            eprintln!("config error: {error}");
        }
        return Err(format!("{} configuration error(s)", errors.len()).into());
    }

    logging::init(&config.observability.log_level)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "worker-server starting");

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    tracing::info!(
        host = %config.host,
        port = config.port,
        server_type = %config.server_type,
        worker_num = config.worker_num,
        task_worker_num = config.engine_settings().task_worker_num(),
        async_mode = config.async_mode,
        "Configuration loaded"
    );

    let engine = LocalEngine::new(config, echo)?.setup(|server| {
        server.on(Event::WorkerStart, |args| {
            let worker_id = args.get(1).and_then(Arg::as_int);
            tracing::debug!(?worker_id, "worker_start listener");
            Ok(())
        });
        server.on(Event::Finish, |args| {
            let task_id = args.get(1).and_then(Arg::as_int);
            tracing::info!(?task_id, "Task finished");
            Ok(())
        });
    });

    let running = engine.start().await?;
    tracing::info!(address = %running.local_addr(), "Listening");

    tokio::spawn(signals::forward_to(running.shutdown_handle()));
    running.wait().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
