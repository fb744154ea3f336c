//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher and transport produce:
//!     → logging.rs (structured log events, request_id on every line)
//!     → metrics.rs (request counter and latency histogram)
//!
//! Consumers:
//!     → stdout via tracing-subscriber
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every log line of a request
//! - Metric updates are fire-and-forget; without an exporter they are no-ops
//! - Log level comes from config, `RUST_LOG` wins when set

pub mod logging;
pub mod metrics;
