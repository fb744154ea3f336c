//! chain-dispatch server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ─────────────▶ http::server (axum, body buffering, timeout)
//!                        │
//!                        ▼
//!                    dispatch::exchange (request id, lifecycle, close once)
//!                        │
//!                        ▼
//!                    dispatch::dispatcher ── for each module in order ──┐
//!                        │                                             │
//!                        ▼                                             │
//!                    routing::matcher (wildcard | regex) ──────────────┤
//!                        │                                             │
//!                        ▼                                             │
//!                    dispatch::fault (invoke handler, contain faults) ─┘
//!                        │
//!     Client Response    ▼
//!     ◀───────────── ResponseSink (handler output / 404 / 500)
//! ```
//!
//! The binary ships a small demo chain: an `api` module, a `static`
//! catch-all that declines non-GET verbs, and a custom not-found page.

use std::path::PathBuf;
use std::sync::Arc;

use axum::http::StatusCode;
use clap::Parser;
use tokio::net::TcpListener;

use chain_dispatch::config::{load_config, ServerConfig};
use chain_dispatch::lifecycle::{shutdown_signal, Shutdown};
use chain_dispatch::observability::{logging, metrics};
use chain_dispatch::{Dispatcher, HandlerError, HttpServer, Module, RoutingStrategy};

#[derive(Parser, Debug)]
#[command(name = "chain-dispatch")]
#[command(about = "HTTP server dispatching requests through an ordered module chain", long_about = None)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address, overrides `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,

    /// Routing strategy (`wildcard` or `regex`), overrides `routing.strategy`.
    #[arg(short, long)]
    strategy: Option<RoutingStrategy>,
}

fn demo_dispatcher(strategy: RoutingStrategy) -> Result<Dispatcher, Box<dyn std::error::Error>> {
    let (hello, user) = match strategy {
        RoutingStrategy::Wildcard => ("/api/hello", "/api/users/*"),
        RoutingStrategy::Regex => ("/api/hello", "/api/users/{id}"),
    };

    let api = Module::new("api")
        .on_get(hello, |ctx, _cancel| {
            Box::pin(async move {
                ctx.response_mut().string_response("hello");
                Ok(true)
            })
        })
        .on_get(user, |ctx, _cancel| {
            Box::pin(async move {
                let id = ctx
                    .params()
                    .get("id")
                    .or_else(|| ctx.params().positional(0))
                    .unwrap_or_default()
                    .to_string();
                ctx.response_mut()
                    .json_response(StatusCode::OK, &serde_json::json!({ "id": id }))?;
                Ok(true)
            })
        })
        .on_any("/api/fail", |_ctx, _cancel| {
            Box::pin(async { Err(HandlerError::msg("demo failure")) })
        });

    let fallback = Module::new("static").on_any("*", |ctx, _cancel| {
        Box::pin(async move {
            if *ctx.method() != axum::http::Method::GET {
                return Ok(false);
            }
            ctx.response_mut()
                .html_response(StatusCode::OK, "<p>chain-dispatch</p>");
            Ok(true)
        })
    });

    let dispatcher = Dispatcher::builder(strategy)
        .module(api)
        .module(fallback)
        .on_not_found(|ctx| {
            Box::pin(async move {
                ctx.response_mut()
                    .html_response(StatusCode::NOT_FOUND, "<p>Nothing here.</p>");
            })
        })
        .build()?;
    Ok(dispatcher)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    if let Some(strategy) = cli.strategy {
        config.routing.strategy = strategy;
    }

    logging::init_logging(&config.observability.log_level);
    tracing::info!("chain-dispatch v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        strategy = %config.routing.strategy,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let dispatcher = Arc::new(demo_dispatcher(config.routing.strategy)?);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    let server = HttpServer::new(config, dispatcher, shutdown);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
