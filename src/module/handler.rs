//! Handler trait and handler errors.
//!
//! A handler is an async function from the request context and a
//! cancellation signal to a "handled" flag:
//! - `Ok(true)`: the handler produced the final response, stop the chain
//! - `Ok(false)`: the handler declined, try the next module
//! - `Err(_)`: a fault, turned into a terminal response by the dispatcher

use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::fmt::Write as _;

use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::dispatch::cancel::CancellationSignal;
use crate::http::context::HttpContext;

/// Future returned by every handler invocation.
pub type HandlerFuture<'a> = BoxFuture<'a, Result<bool, HandlerError>>;

/// An async request handler.
pub trait Handler: Send + Sync {
    fn call<'a>(&'a self, ctx: &'a mut HttpContext, cancel: CancellationSignal) -> HandlerFuture<'a>;
}

/// Adapts a closure into a [`Handler`].
pub struct FnHandler<F> {
    func: F,
}

impl<F> Handler for FnHandler<F>
where
    F: for<'a> Fn(&'a mut HttpContext, CancellationSignal) -> HandlerFuture<'a> + Send + Sync,
{
    fn call<'a>(&'a self, ctx: &'a mut HttpContext, cancel: CancellationSignal) -> HandlerFuture<'a> {
        (self.func)(ctx, cancel)
    }
}

/// Wrap a closure as a handler.
///
/// ```ignore
/// let hello = handler_fn(|ctx, _cancel| Box::pin(async move {
///     ctx.response_mut().string_response("hello");
///     Ok(true)
/// }));
/// ```
pub fn handler_fn<F>(func: F) -> FnHandler<F>
where
    F: for<'a> Fn(&'a mut HttpContext, CancellationSignal) -> HandlerFuture<'a> + Send + Sync,
{
    FnHandler { func }
}

/// A handler fault.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The handler returned an error.
    #[error("{message}")]
    Failed {
        message: String,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
        /// Backtrace captured where the error was created.
        trace: String,
    },

    /// The handler panicked; carries the panic message.
    #[error("handler panicked: {0}")]
    Panicked(String),

    /// The handler gave up after observing cancellation.
    #[error("request cancelled")]
    Cancelled,
}

impl HandlerError {
    /// A fault with only a message.
    pub fn msg(message: impl Into<String>) -> Self {
        HandlerError::Failed {
            message: message.into(),
            source: None,
            trace: Backtrace::capture().to_string(),
        }
    }

    /// A fault wrapping an underlying error.
    pub fn from_error(err: impl StdError + Send + Sync + 'static) -> Self {
        HandlerError::Failed {
            message: err.to_string(),
            source: Some(Box::new(err)),
            trace: Backtrace::capture().to_string(),
        }
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self, HandlerError::Cancelled)
    }

    /// Cause chain followed by the captured backtrace, one frame per line.
    pub fn trace(&self) -> String {
        let mut out = String::new();

        let mut cause = StdError::source(self);
        while let Some(err) = cause {
            let _ = writeln!(out, "caused by: {}", err);
            cause = err.source();
        }

        match self {
            HandlerError::Failed { trace, .. } => out.push_str(trace),
            HandlerError::Panicked(_) => out.push_str("<panic: no backtrace captured>"),
            HandlerError::Cancelled => out.push_str("<cancelled>"),
        }
        out
    }
}

impl From<std::io::Error> for HandlerError {
    fn from(err: std::io::Error) -> Self {
        HandlerError::from_error(err)
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        HandlerError::from_error(err)
    }
}
