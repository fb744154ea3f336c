//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Chain Compilation (at startup):
//!     Modules (ordered route entries)
//!     → chain.rs (one link per module, registration order kept)
//!     → matcher.rs (compile patterns under the server-wide strategy)
//!     → Freeze as immutable ModuleChain
//!
//! Per Request, per module:
//!     (path, verb)
//!     → matcher.rs (wildcard.rs or regex_path.rs)
//!     → Return: RouteMatch (entry + params) or no match
//! ```
//!
//! # Design Decisions
//! - One strategy for the whole server; patterns never mix strategies
//! - Chain immutable after construction (shared without locks)
//! - Invalid patterns fail when the chain is built, not at dispatch
//! - First match wins within a module

pub mod chain;
pub mod matcher;
pub mod params;
pub mod regex_path;
pub mod verb;
pub mod wildcard;

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use chain::{ChainLink, ModuleChain};
pub use matcher::{PathMatcher, RouteMatch};
pub use params::PathParams;
pub use verb::{RouteVerb, Verb};

/// Pattern that matches every request path under both strategies.
pub const ANY_PATH: &str = "*";

/// Path-matching algorithm used by every module of a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingStrategy {
    /// `*` wildcards, case-insensitive, longest literal match.
    #[default]
    Wildcard,
    /// Anchored regular expressions with capture groups.
    Regex,
}

impl FromStr for RoutingStrategy {
    type Err = RoutingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wildcard" => Ok(RoutingStrategy::Wildcard),
            "regex" => Ok(RoutingStrategy::Regex),
            _ => Err(RoutingError::UnknownStrategy(s.to_string())),
        }
    }
}

impl std::fmt::Display for RoutingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoutingStrategy::Wildcard => f.write_str("wildcard"),
            RoutingStrategy::Regex => f.write_str("regex"),
        }
    }
}

/// Routing configuration errors. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("unknown routing strategy `{0}` (expected `wildcard` or `regex`)")]
    UnknownStrategy(String),

    #[error("invalid route pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("module `{module}`: {source}")]
    Module {
        module: String,
        #[source]
        source: Box<RoutingError>,
    },
}
