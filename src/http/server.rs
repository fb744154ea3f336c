//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with a single fallback into the dispatcher
//! - Wire up middleware (tracing, request timeout)
//! - Buffer request bodies up to the configured limit
//! - Bind to a listener and shut down gracefully

use std::future::IntoFuture;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServerConfig;
use crate::dispatch::{CancellationSignal, Dispatcher};
use crate::http::context::HttpContext;
use crate::lifecycle::Shutdown;

/// Application state injected into the fallback handler.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub cancel: CancellationSignal,
    pub max_body_bytes: usize,
}

/// HTTP front end for a [`Dispatcher`].
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
    shutdown: Shutdown,
}

impl HttpServer {
    /// Create a server; `shutdown` cancels in-flight handlers and stops the listener.
    pub fn new(config: ServerConfig, dispatcher: Arc<Dispatcher>, shutdown: Shutdown) -> Self {
        let state = AppState {
            dispatcher,
            cancel: shutdown.subscribe(),
            max_body_bytes: config.listener.max_body_bytes,
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            shutdown,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        Router::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http())
    }

    /// The router, for in-process use (e.g. `tower::ServiceExt::oneshot`).
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until shutdown.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        let stop = self.shutdown.subscribe();
        let serve = axum::serve(listener, app)
            .with_graceful_shutdown(async move { stop.cancelled().await })
            .into_future();

        let grace = Duration::from_secs(self.config.timeouts.shutdown_grace_secs);
        let deadline = self.shutdown.subscribe();
        let forced = async move {
            deadline.cancelled().await;
            tokio::time::sleep(grace).await;
        };

        tokio::select! {
            result = serve => result?,
            _ = forced => {
                tracing::warn!(grace_secs = grace.as_secs(), "Grace period elapsed, dropping in-flight requests");
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Every request lands here and is handed to the dispatcher.
async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
        .unwrap_or_else(|| SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)));

    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(
                source = %remote_addr,
                path = %parts.uri.path(),
                limit = state.max_body_bytes,
                error = %e,
                "Request body rejected"
            );
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    };

    let ctx = HttpContext::from_parts(parts, remote_addr, body);
    state
        .dispatcher
        .handle_request(ctx, state.cancel.clone())
        .await
        .into_response()
}
