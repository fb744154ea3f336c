//! Module chain iteration.
//!
//! # Responsibilities
//! - Ask each module, in order, for a matching handler
//! - Invoke it and interpret the result (handled / declined / fault)
//! - Report whether any module produced the response
//!
//! # Design Decisions
//! - At most one module produces the final response per request
//! - A fault stops the chain and counts as handled
//! - The 404 fallback belongs to the caller, driven by the returned flag

use crate::dispatch::cancel::CancellationSignal;
use crate::dispatch::fault::{self, FaultResolution};
use crate::dispatch::Dispatcher;
use crate::http::context::HttpContext;

/// Result of walking the module chain once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A handler returned true.
    Handled { module: String },
    /// A handler failed; the fault boundary wrote the response.
    Faulted {
        module: String,
        resolution: FaultResolution,
    },
    /// No handler returned true.
    Exhausted,
}

impl DispatchOutcome {
    /// Whether a response was produced, i.e. the caller must not send a 404.
    pub fn is_handled(&self) -> bool {
        !matches!(self, DispatchOutcome::Exhausted)
    }
}

impl Dispatcher {
    /// Walk the chain; returns true when a response was produced.
    pub async fn dispatch(&self, ctx: &mut HttpContext, cancel: &CancellationSignal) -> bool {
        self.dispatch_outcome(ctx, cancel).await.is_handled()
    }

    /// Walk the chain and report how it ended.
    pub async fn dispatch_outcome(
        &self,
        ctx: &mut HttpContext,
        cancel: &CancellationSignal,
    ) -> DispatchOutcome {
        for link in self.chain().iter() {
            let Some(found) = link.resolve(ctx.path(), ctx.verb()) else {
                tracing::trace!(
                    request_id = %ctx.request_id(),
                    module = %link.name(),
                    "No route matched in module"
                );
                continue;
            };

            let entry = found.entry;
            ctx.set_params(found.params);

            tracing::debug!(
                request_id = %ctx.request_id(),
                module = %link.name(),
                handler = entry.descriptor().name(),
                pattern = %entry.pattern(),
                "Invoking handler"
            );

            match fault::invoke(entry.handler(), ctx, cancel.clone()).await {
                Ok(true) => {
                    tracing::trace!(request_id = %ctx.request_id(), result = true, "Handler result");
                    return DispatchOutcome::Handled {
                        module: link.name().to_string(),
                    };
                }
                Ok(false) => {
                    tracing::trace!(request_id = %ctx.request_id(), result = false, "Handler result");
                }
                Err(err) => {
                    if err.is_cancellation() {
                        tracing::warn!(
                            request_id = %ctx.request_id(),
                            module = %link.name(),
                            "Handler aborted on cancellation"
                        );
                    } else {
                        tracing::error!(
                            request_id = %ctx.request_id(),
                            module = %link.name(),
                            handler = entry.descriptor().name(),
                            error = %err,
                            "Handler failed"
                        );
                    }

                    let resolution = fault::contain(self.exception_hook(), ctx, &err, cancel).await;
                    return DispatchOutcome::Faulted {
                        module: link.name().to_string(),
                        resolution,
                    };
                }
            }
        }

        DispatchOutcome::Exhausted
    }
}
