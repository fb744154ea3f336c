//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, body buffering, timeout)
//!     → context.rs (HttpContext: request data + request id)
//!     → [dispatcher walks the module chain]
//!     → response.rs (ResponseSink written by handlers, closed once)
//!     → Send to client
//! ```

pub mod context;
pub mod request_id;
pub mod response;
pub mod server;

pub use context::HttpContext;
pub use request_id::RequestId;
pub use response::{ResponseError, ResponseSink};
pub use server::{AppState, HttpServer};
