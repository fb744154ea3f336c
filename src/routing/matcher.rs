//! Route matching logic.
//!
//! # Responsibilities
//! - Find the first route entry of a module matching a request path and verb
//! - One matcher implementation per routing strategy
//!
//! # Design Decisions
//! - Patterns compiled once when the chain is built, never per request
//! - Matchers hold one compiled pattern per route entry, in declaration order
//! - A module with no entries never matches

use crate::module::RouteEntry;
use crate::routing::params::PathParams;
use crate::routing::regex_path::RegexPattern;
use crate::routing::verb::Verb;
use crate::routing::wildcard::{self, WildcardPattern};
use crate::routing::{RoutingError, RoutingStrategy, ANY_PATH};

/// A route entry selected for a request, with its captured parameters.
#[derive(Debug)]
pub struct RouteMatch<'r> {
    pub entry: &'r RouteEntry,
    pub params: PathParams,
}

/// Trait for resolving a handler within one module.
pub trait PathMatcher: Send + Sync + std::fmt::Debug {
    /// Returns the first entry matching `path` and `verb`, if any.
    ///
    /// `routes` must be the slice the matcher was compiled from.
    fn find<'r>(&self, routes: &'r [RouteEntry], path: &str, verb: Option<Verb>)
        -> Option<RouteMatch<'r>>;

    /// The strategy this matcher implements.
    fn strategy(&self) -> RoutingStrategy;
}

/// Compile a module's route entries under the given strategy.
pub fn compile(
    strategy: RoutingStrategy,
    routes: &[RouteEntry],
) -> Result<Box<dyn PathMatcher>, RoutingError> {
    let matcher: Box<dyn PathMatcher> = match strategy {
        RoutingStrategy::Wildcard => Box::new(WildcardMatcher::new(routes)),
        RoutingStrategy::Regex => Box::new(RegexMatcher::new(routes)?),
    };
    Ok(matcher)
}

/// Matches with `*` wildcard patterns, case-insensitively.
#[derive(Debug)]
pub struct WildcardMatcher {
    patterns: Vec<WildcardPattern>,
}

impl WildcardMatcher {
    pub fn new(routes: &[RouteEntry]) -> Self {
        Self {
            patterns: routes
                .iter()
                .map(|r| WildcardPattern::compile(r.pattern()))
                .collect(),
        }
    }
}

impl PathMatcher for WildcardMatcher {
    fn find<'r>(
        &self,
        routes: &'r [RouteEntry],
        path: &str,
        verb: Option<Verb>,
    ) -> Option<RouteMatch<'r>> {
        let lowered = path.to_lowercase();

        // Resolve the path first, then select on the resolved form
        let resolved = wildcard::resolve(&self.patterns, &lowered).map(|i| &self.patterns[i]);

        routes
            .iter()
            .zip(&self.patterns)
            .find(|(entry, pattern)| {
                // Literal entries take part in resolution, so with no winner
                // only the any-path sentinel can still match
                let path_ok = match pattern {
                    WildcardPattern::AnyPath => true,
                    _ => resolved.is_some_and(|winner| *pattern == winner),
                };
                path_ok && entry.verb().accepts(verb)
            })
            .map(|(entry, pattern)| {
                let mut params = PathParams::new();
                if let Some(segment) = pattern.wildcard_segment(&lowered, path) {
                    params.push(None, segment);
                }
                RouteMatch { entry, params }
            })
    }

    fn strategy(&self) -> RoutingStrategy {
        RoutingStrategy::Wildcard
    }
}

/// Matches with anchored regular expressions.
#[derive(Debug)]
pub struct RegexMatcher {
    /// `None` marks the any-path sentinel.
    patterns: Vec<Option<RegexPattern>>,
}

impl RegexMatcher {
    pub fn new(routes: &[RouteEntry]) -> Result<Self, RoutingError> {
        let patterns = routes
            .iter()
            .map(|r| {
                if r.pattern() == ANY_PATH {
                    Ok(None)
                } else {
                    RegexPattern::compile(r.pattern()).map(Some)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }
}

impl PathMatcher for RegexMatcher {
    fn find<'r>(
        &self,
        routes: &'r [RouteEntry],
        path: &str,
        verb: Option<Verb>,
    ) -> Option<RouteMatch<'r>> {
        routes.iter().zip(&self.patterns).find_map(|(entry, pattern)| {
            if !entry.verb().accepts(verb) {
                return None;
            }
            let params = match pattern {
                None => PathParams::new(),
                Some(regex) => regex.captures(path)?,
            };
            Some(RouteMatch { entry, params })
        })
    }

    fn strategy(&self) -> RoutingStrategy {
        RoutingStrategy::Regex
    }
}
