//! The ordered module chain.
//!
//! # Responsibilities
//! - Keep modules in registration order
//! - Pair each module with a matcher compiled for the server strategy
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan over modules, O(m) over routes inside each module

use std::sync::Arc;

use crate::module::WebModule;
use crate::routing::matcher::{self, PathMatcher, RouteMatch};
use crate::routing::verb::Verb;
use crate::routing::{RoutingError, RoutingStrategy};

/// One module of the chain with its compiled matcher.
pub struct ChainLink {
    module: Arc<dyn WebModule>,
    matcher: Box<dyn PathMatcher>,
}

impl std::fmt::Debug for ChainLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainLink")
            .field("module", &self.module.name())
            .field("matcher", &self.matcher)
            .finish()
    }
}

impl ChainLink {
    pub fn name(&self) -> &str {
        self.module.name()
    }

    pub fn module(&self) -> &Arc<dyn WebModule> {
        &self.module
    }

    /// Find this module's handler for a request path and verb.
    pub fn resolve(&self, path: &str, verb: Option<Verb>) -> Option<RouteMatch<'_>> {
        self.matcher.find(self.module.routes(), path, verb)
    }
}

/// Ordered, read-only sequence of modules consulted for every request.
#[derive(Debug)]
pub struct ModuleChain {
    strategy: RoutingStrategy,
    links: Vec<ChainLink>,
}

impl ModuleChain {
    /// Compile every module under `strategy`, keeping the given order.
    pub fn compile(
        strategy: RoutingStrategy,
        modules: Vec<Arc<dyn WebModule>>,
    ) -> Result<Self, RoutingError> {
        let mut links = Vec::with_capacity(modules.len());

        for module in modules {
            let matcher =
                matcher::compile(strategy, module.routes()).map_err(|e| RoutingError::Module {
                    module: module.name().to_string(),
                    source: Box::new(e),
                })?;

            tracing::debug!(
                module = %module.name(),
                routes = module.routes().len(),
                strategy = %strategy,
                "Module compiled into chain"
            );

            links.push(ChainLink { module, matcher });
        }

        Ok(Self { strategy, links })
    }

    pub fn strategy(&self) -> RoutingStrategy {
        self.strategy
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChainLink> {
        self.links.iter()
    }

    pub fn get(&self, index: usize) -> Option<&ChainLink> {
        self.links.get(index)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Module names in chain order.
    pub fn names(&self) -> Vec<&str> {
        self.links.iter().map(ChainLink::name).collect()
    }
}
