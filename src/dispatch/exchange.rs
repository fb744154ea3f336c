//! Top-level request lifecycle.
//!
//! # States
//! ```text
//! Started → Dispatching → {Succeeded, Faulted, Exhausted, Aborted} → Finalizing → Closed
//! ```
//!
//! # State Transitions
//! ```text
//! Started → Dispatching: correlation id assigned, request logged
//! Dispatching → Succeeded: a handler returned true
//! Dispatching → Faulted: a handler failed, fault boundary answered
//! Dispatching → Exhausted: no handler answered, 404 or not-found hook
//! Dispatching → Aborted: panic outside the fault boundary (outer safety net)
//! any terminal → Finalizing → Closed: response closed exactly once
//! ```

use std::panic::AssertUnwindSafe;
use std::time::Instant;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures_util::FutureExt;

use crate::dispatch::cancel::CancellationSignal;
use crate::dispatch::dispatcher::DispatchOutcome;
use crate::dispatch::fault::panic_message;
use crate::dispatch::Dispatcher;
use crate::http::context::HttpContext;
use crate::observability::metrics;

/// Lifecycle state of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Started,
    Dispatching,
    Succeeded,
    Faulted,
    Exhausted,
    Aborted,
    Finalizing,
    Closed,
}

impl RequestState {
    fn can_advance_to(self, next: RequestState) -> bool {
        use RequestState::*;
        matches!(
            (self, next),
            (Started, Dispatching)
                | (Dispatching, Succeeded | Faulted | Exhausted | Aborted)
                | (Succeeded | Faulted | Exhausted | Aborted, Finalizing)
                | (Finalizing, Closed)
        )
    }
}

/// Tracks the state of one request and rejects illegal transitions.
#[derive(Debug)]
pub struct RequestLifecycle {
    state: RequestState,
}

impl RequestLifecycle {
    pub fn new() -> Self {
        Self {
            state: RequestState::Started,
        }
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    /// Move to `next`. Returns false and keeps the current state if the
    /// transition is not part of the lifecycle.
    pub fn advance(&mut self, next: RequestState) -> bool {
        if !self.state.can_advance_to(next) {
            tracing::warn!(from = ?self.state, to = ?next, "Illegal request state transition");
            return false;
        }
        tracing::trace!(from = ?self.state, to = ?next, "Request state");
        self.state = next;
        true
    }
}

impl Default for RequestLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// How a request left the `Dispatching` state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeOutcome {
    Succeeded { module: String },
    Faulted { module: String },
    Exhausted,
    Aborted,
}

impl ExchangeOutcome {
    fn state(&self) -> RequestState {
        match self {
            ExchangeOutcome::Succeeded { .. } => RequestState::Succeeded,
            ExchangeOutcome::Faulted { .. } => RequestState::Faulted,
            ExchangeOutcome::Exhausted => RequestState::Exhausted,
            ExchangeOutcome::Aborted => RequestState::Aborted,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ExchangeOutcome::Succeeded { .. } => "succeeded",
            ExchangeOutcome::Faulted { .. } => "faulted",
            ExchangeOutcome::Exhausted => "exhausted",
            ExchangeOutcome::Aborted => "aborted",
        }
    }
}

/// A completed request: its outcome and the closed context.
#[derive(Debug)]
pub struct Exchange {
    pub outcome: ExchangeOutcome,
    pub state: RequestState,
    pub context: HttpContext,
}

impl IntoResponse for Exchange {
    fn into_response(self) -> Response {
        self.context.into_response_sink().into_response()
    }
}

impl Dispatcher {
    /// Handle one request end to end. Never panics, always closes the response.
    pub async fn handle_request(&self, mut ctx: HttpContext, cancel: CancellationSignal) -> Exchange {
        let start_time = Instant::now();
        let mut lifecycle = RequestLifecycle::new();

        tracing::debug!(
            request_id = %ctx.request_id(),
            source = %ctx.remote_addr(),
            method = %ctx.method(),
            path = %ctx.path_and_query(),
            user_agent = ctx.user_agent().unwrap_or("-"),
            "Start of request"
        );

        lifecycle.advance(RequestState::Dispatching);
        let outcome = match AssertUnwindSafe(self.run(&mut ctx, &cancel))
            .catch_unwind()
            .await
        {
            Ok(outcome) => outcome,
            Err(payload) => {
                tracing::error!(
                    request_id = %ctx.request_id(),
                    panic = %panic_message(payload.as_ref()),
                    "Error handling request"
                );
                if ctx.response().body().is_empty() {
                    ctx.response_mut()
                        .standard_response_without_body(StatusCode::INTERNAL_SERVER_ERROR);
                }
                ExchangeOutcome::Aborted
            }
        };
        lifecycle.advance(outcome.state());

        lifecycle.advance(RequestState::Finalizing);
        if let Err(e) = ctx.response_mut().close() {
            tracing::warn!(request_id = %ctx.request_id(), error = %e, "Closing response failed");
        }
        lifecycle.advance(RequestState::Closed);

        metrics::record_request(
            ctx.verb(),
            ctx.response().status().as_u16(),
            outcome.label(),
            start_time,
        );
        tracing::debug!(
            request_id = %ctx.request_id(),
            status = ctx.response().status().as_u16(),
            outcome = outcome.label(),
            "End of request"
        );

        Exchange {
            outcome,
            state: lifecycle.state(),
            context: ctx,
        }
    }

    async fn run(&self, ctx: &mut HttpContext, cancel: &CancellationSignal) -> ExchangeOutcome {
        match self.dispatch_outcome(ctx, cancel).await {
            DispatchOutcome::Handled { module } => ExchangeOutcome::Succeeded { module },
            DispatchOutcome::Faulted { module, .. } => ExchangeOutcome::Faulted { module },
            DispatchOutcome::Exhausted => {
                tracing::warn!(
                    request_id = %ctx.request_id(),
                    path = %ctx.path(),
                    "No module generated a response, sending 404"
                );
                match self.not_found_hook() {
                    Some(hook) => hook(ctx).await,
                    None => ctx
                        .response_mut()
                        .standard_response_without_body(StatusCode::NOT_FOUND),
                }
                ExchangeOutcome::Exhausted
            }
        }
    }
}
