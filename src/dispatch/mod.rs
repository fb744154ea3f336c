//! Request dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Transport delivers HttpContext
//!     → exchange.rs (request lifecycle, correlation id, outer safety net)
//!     → dispatcher.rs (walk ModuleChain in registration order)
//!         → routing (resolve a handler per module)
//!         → fault.rs (invoke handler, contain panics and errors)
//!     → true: stop, response already written
//!     → false: next module
//!     → fault: terminal response (401 kept / custom hook / 500), stop
//!     → exhausted: 404 or custom not-found hook
//!     → response closed exactly once, context handed back
//! ```
//!
//! # Design Decisions
//! - The Dispatcher is immutable once built and shared via Arc
//! - Modules run strictly one after another, never in parallel
//! - Timeouts are not enforced here; handlers observe the cancellation signal

pub mod cancel;
pub mod dispatcher;
pub mod exchange;
pub mod fault;

use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::http::context::HttpContext;
use crate::module::{HandlerError, WebModule};
use crate::routing::{ModuleChain, RoutingError, RoutingStrategy};

pub use cancel::{CancellationSignal, CancellationSource};
pub use dispatcher::DispatchOutcome;
pub use exchange::{Exchange, ExchangeOutcome, RequestLifecycle, RequestState};
pub use fault::FaultResolution;

/// Called instead of the default 404 when no module handled a request.
pub type NotFoundHook = Arc<dyn for<'a> Fn(&'a mut HttpContext) -> BoxFuture<'a, ()> + Send + Sync>;

/// Called on a handler fault; returns true when it produced the response.
pub type ExceptionHook = Arc<
    dyn for<'a> Fn(&'a mut HttpContext, &'a HandlerError, CancellationSignal) -> BoxFuture<'a, bool>
        + Send
        + Sync,
>;

/// Wrap a closure as a [`NotFoundHook`].
pub fn not_found_hook<F>(func: F) -> NotFoundHook
where
    F: for<'a> Fn(&'a mut HttpContext) -> BoxFuture<'a, ()> + Send + Sync + 'static,
{
    Arc::new(func)
}

/// Wrap a closure as an [`ExceptionHook`].
pub fn exception_hook<F>(func: F) -> ExceptionHook
where
    F: for<'a> Fn(&'a mut HttpContext, &'a HandlerError, CancellationSignal) -> BoxFuture<'a, bool>
        + Send
        + Sync
        + 'static,
{
    Arc::new(func)
}

/// Server-wide dispatch configuration: module chain, strategy and hooks.
///
/// Built once at startup, then shared read-only by every request.
pub struct Dispatcher {
    chain: ModuleChain,
    not_found: Option<NotFoundHook>,
    unhandled_exception: Option<ExceptionHook>,
}

impl Dispatcher {
    pub fn builder(strategy: RoutingStrategy) -> DispatcherBuilder {
        DispatcherBuilder {
            strategy,
            modules: Vec::new(),
            not_found: None,
            unhandled_exception: None,
        }
    }

    pub fn chain(&self) -> &ModuleChain {
        &self.chain
    }

    pub fn strategy(&self) -> RoutingStrategy {
        self.chain.strategy()
    }

    pub(crate) fn not_found_hook(&self) -> Option<&NotFoundHook> {
        self.not_found.as_ref()
    }

    pub(crate) fn exception_hook(&self) -> Option<&ExceptionHook> {
        self.unhandled_exception.as_ref()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("chain", &self.chain)
            .field("not_found", &self.not_found.is_some())
            .field("unhandled_exception", &self.unhandled_exception.is_some())
            .finish()
    }
}

/// Collects modules and hooks, then compiles the chain.
pub struct DispatcherBuilder {
    strategy: RoutingStrategy,
    modules: Vec<Arc<dyn WebModule>>,
    not_found: Option<NotFoundHook>,
    unhandled_exception: Option<ExceptionHook>,
}

impl DispatcherBuilder {
    /// Append a module; modules are consulted in the order they are added.
    pub fn module(mut self, module: impl WebModule + 'static) -> Self {
        self.modules.push(Arc::new(module));
        self
    }

    pub fn shared_module(mut self, module: Arc<dyn WebModule>) -> Self {
        self.modules.push(module);
        self
    }

    pub fn on_not_found<F>(mut self, func: F) -> Self
    where
        F: for<'a> Fn(&'a mut HttpContext) -> BoxFuture<'a, ()> + Send + Sync + 'static,
    {
        self.not_found = Some(not_found_hook(func));
        self
    }

    pub fn on_unhandled_exception<F>(mut self, func: F) -> Self
    where
        F: for<'a> Fn(&'a mut HttpContext, &'a HandlerError, CancellationSignal) -> BoxFuture<'a, bool>
            + Send
            + Sync
            + 'static,
    {
        self.unhandled_exception = Some(exception_hook(func));
        self
    }

    /// Compile the chain. Fails on patterns invalid for the strategy.
    pub fn build(self) -> Result<Dispatcher, RoutingError> {
        let chain = ModuleChain::compile(self.strategy, self.modules)?;

        tracing::info!(
            strategy = %chain.strategy(),
            modules = ?chain.names(),
            "Dispatcher built"
        );

        Ok(Dispatcher {
            chain,
            not_found: self.not_found,
            unhandled_exception: self.unhandled_exception,
        })
    }
}
