//! Fault boundary around handler invocations.
//!
//! # Responsibilities
//! - Run one handler, turning panics into `HandlerError::Panicked`
//! - Convert a fault into a terminal response
//!
//! # Fault Resolution
//! ```text
//! response status already 401  → keep the handler's response
//! custom exception hook        → hook returns true: done
//!                                hook returns false or panics: fall through
//! otherwise                    → 500 page with message and trace
//! ```
//!
//! # Design Decisions
//! - Nothing raised inside a handler or hook escapes this module
//! - Cancellation faults are resolved like any other fault

use std::any::Any;
use std::panic::AssertUnwindSafe;

use axum::http::StatusCode;
use futures_util::FutureExt;

use crate::dispatch::cancel::CancellationSignal;
use crate::dispatch::ExceptionHook;
use crate::http::context::HttpContext;
use crate::module::{Handler, HandlerError};

/// Invoke a handler, containing panics.
pub async fn invoke(
    handler: &dyn Handler,
    ctx: &mut HttpContext,
    cancel: CancellationSignal,
) -> Result<bool, HandlerError> {
    match AssertUnwindSafe(handler.call(ctx, cancel)).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(HandlerError::Panicked(panic_message(payload.as_ref()))),
    }
}

/// How a fault was turned into a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultResolution {
    /// The handler had already answered 401; nothing was generated.
    Unauthorized,
    /// The custom exception hook produced the response.
    Hook,
    /// The default 500 page was written.
    ServerError,
}

/// Write the terminal response for a handler fault.
pub async fn contain(
    hook: Option<&ExceptionHook>,
    ctx: &mut HttpContext,
    err: &HandlerError,
    cancel: &CancellationSignal,
) -> FaultResolution {
    if ctx.response().status() == StatusCode::UNAUTHORIZED {
        tracing::debug!(
            request_id = %ctx.request_id(),
            error = %err,
            "Handler failed after answering 401, keeping its response"
        );
        return FaultResolution::Unauthorized;
    }

    if let Some(hook) = hook {
        match AssertUnwindSafe(hook(ctx, err, cancel.clone())).catch_unwind().await {
            Ok(true) => return FaultResolution::Hook,
            Ok(false) => {}
            Err(payload) => {
                tracing::error!(
                    request_id = %ctx.request_id(),
                    panic = %panic_message(payload.as_ref()),
                    "Unhandled-exception hook panicked, sending default error page"
                );
            }
        }
    }

    ctx.response_mut().server_error_response(err);
    FaultResolution::ServerError
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
