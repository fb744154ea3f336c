//! Ordered module-chain request dispatch over HTTP.
//!
//! A server is configured with an ordered list of web modules. Each module
//! owns routes (path pattern + verb + handler). For every request the
//! dispatcher asks each module in turn for a matching handler and invokes
//! it; the first handler that reports success ends the chain. Faults are
//! contained and turned into error responses, unmatched requests get a 404,
//! and the response is closed exactly once.

pub mod config;
pub mod dispatch;
pub mod http;
pub mod lifecycle;
pub mod module;
pub mod observability;
pub mod routing;

pub use config::ServerConfig;
pub use dispatch::{CancellationSignal, Dispatcher, DispatcherBuilder};
pub use http::{HttpContext, HttpServer};
pub use lifecycle::Shutdown;
pub use module::{HandlerError, Module, WebModule};
pub use routing::{RoutingStrategy, Verb};
