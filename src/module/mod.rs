//! Modules: named, ordered groups of route entries.
//!
//! # Data Flow
//! ```text
//! Server start:
//!     Module::new("api")
//!     → .on_get(pattern, handler) / .route(pattern, verb, handler)
//!     → registered into the dispatcher builder (order matters)
//!
//! Per request:
//!     module.routes() scanned by the routing matcher
//!     → matched RouteEntry's handler invoked by the dispatcher
//! ```
//!
//! # Design Decisions
//! - Handler names are static descriptors set at registration
//! - Modules are read-only once the chain is built

pub mod handler;

use std::sync::Arc;

use crate::dispatch::cancel::CancellationSignal;
use crate::http::context::HttpContext;
use crate::routing::verb::{RouteVerb, Verb};

pub use handler::{handler_fn, FnHandler, Handler, HandlerError, HandlerFuture};

/// Anything that contributes ordered route entries to the chain.
pub trait WebModule: Send + Sync {
    fn name(&self) -> &str;

    fn routes(&self) -> &[RouteEntry];
}

/// Diagnostic name of a route's handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerDescriptor {
    name: &'static str,
}

impl HandlerDescriptor {
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// A (path pattern, verb, handler) triple.
#[derive(Clone)]
pub struct RouteEntry {
    pattern: String,
    verb: RouteVerb,
    descriptor: HandlerDescriptor,
    handler: Arc<dyn Handler>,
}

impl RouteEntry {
    pub fn new(
        pattern: impl Into<String>,
        verb: impl Into<RouteVerb>,
        descriptor: HandlerDescriptor,
        handler: impl Handler + 'static,
    ) -> Self {
        Self {
            pattern: pattern.into(),
            verb: verb.into(),
            descriptor,
            handler: Arc::new(handler),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn verb(&self) -> RouteVerb {
        self.verb
    }

    pub fn descriptor(&self) -> &HandlerDescriptor {
        &self.descriptor
    }

    pub fn handler(&self) -> &dyn Handler {
        self.handler.as_ref()
    }
}

impl std::fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteEntry")
            .field("pattern", &self.pattern)
            .field("verb", &self.verb)
            .field("handler", &self.descriptor.name)
            .finish()
    }
}

/// The standard module: a name and a list of route entries.
#[derive(Debug, Clone)]
pub struct Module {
    name: String,
    routes: Vec<RouteEntry>,
}

macro_rules! verb_shorthand {
    ($(#[$doc:meta] $method:ident => $verb:expr),* $(,)?) => {
        $(
            #[$doc]
            pub fn $method<F>(self, pattern: impl Into<String>, func: F) -> Self
            where
                F: for<'a> Fn(&'a mut HttpContext, CancellationSignal) -> HandlerFuture<'a>
                    + Send
                    + Sync
                    + 'static,
            {
                self.route_fn(pattern, $verb, stringify!($method), func)
            }
        )*
    };
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            routes: Vec::new(),
        }
    }

    /// Append a route backed by any [`Handler`] implementation.
    pub fn route(
        mut self,
        pattern: impl Into<String>,
        verb: impl Into<RouteVerb>,
        descriptor: HandlerDescriptor,
        handler: impl Handler + 'static,
    ) -> Self {
        self.routes
            .push(RouteEntry::new(pattern, verb, descriptor, handler));
        self
    }

    /// Append a route backed by a closure.
    pub fn route_fn<F>(
        self,
        pattern: impl Into<String>,
        verb: impl Into<RouteVerb>,
        name: &'static str,
        func: F,
    ) -> Self
    where
        F: for<'a> Fn(&'a mut HttpContext, CancellationSignal) -> HandlerFuture<'a>
            + Send
            + Sync
            + 'static,
    {
        self.route(pattern, verb, HandlerDescriptor::new(name), handler_fn(func))
    }

    verb_shorthand! {
        /// Route answering every verb.
        on_any => RouteVerb::Any,
        /// GET route.
        on_get => Verb::Get,
        /// POST route.
        on_post => Verb::Post,
        /// PUT route.
        on_put => Verb::Put,
        /// PATCH route.
        on_patch => Verb::Patch,
        /// DELETE route.
        on_delete => Verb::Delete,
        /// HEAD route.
        on_head => Verb::Head,
        /// OPTIONS route.
        on_options => Verb::Options,
    }
}

impl WebModule for Module {
    fn name(&self) -> &str {
        &self.name
    }

    fn routes(&self) -> &[RouteEntry] {
        &self.routes
    }
}
