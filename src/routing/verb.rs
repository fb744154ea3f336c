//! HTTP verb handling for route entries.
//!
//! # Design Decisions
//! - Request verbs outside the known set parse to `None` instead of an error
//! - `RouteVerb::Any` is the only way an unknown verb can match

use axum::http::Method;
use serde::{Deserialize, Serialize};

/// A concrete HTTP verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Connect,
    Trace,
}

impl Verb {
    /// Parse a method token, ignoring case. Unknown tokens yield `None`.
    pub fn parse(token: &str) -> Option<Self> {
        let verb = match token.to_ascii_uppercase().as_str() {
            "GET" => Verb::Get,
            "HEAD" => Verb::Head,
            "POST" => Verb::Post,
            "PUT" => Verb::Put,
            "PATCH" => Verb::Patch,
            "DELETE" => Verb::Delete,
            "OPTIONS" => Verb::Options,
            "CONNECT" => Verb::Connect,
            "TRACE" => Verb::Trace,
            _ => return None,
        };
        Some(verb)
    }

    /// Map an `http::Method` onto the verb set.
    pub fn from_method(method: &Method) -> Option<Self> {
        Self::parse(method.as_str())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Head => "HEAD",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
            Verb::Options => "OPTIONS",
            Verb::Connect => "CONNECT",
            Verb::Trace => "TRACE",
        }
    }
}

impl std::fmt::Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The verb a route entry answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteVerb {
    /// Matches every request verb, recognized or not.
    Any,
    /// Matches exactly one verb.
    Exact(Verb),
}

impl RouteVerb {
    /// Returns true if a request carrying `verb` satisfies this entry.
    pub fn accepts(&self, verb: Option<Verb>) -> bool {
        match self {
            RouteVerb::Any => true,
            RouteVerb::Exact(expected) => verb == Some(*expected),
        }
    }
}

impl From<Verb> for RouteVerb {
    fn from(verb: Verb) -> Self {
        RouteVerb::Exact(verb)
    }
}

impl std::fmt::Display for RouteVerb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteVerb::Any => f.write_str("ANY"),
            RouteVerb::Exact(verb) => verb.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(Verb::parse("get"), Some(Verb::Get));
        assert_eq!(Verb::parse("Delete"), Some(Verb::Delete));
        assert_eq!(Verb::parse("PROPFIND"), None);
        assert_eq!(Verb::from_method(&Method::PATCH), Some(Verb::Patch));
    }

    #[test]
    fn test_any_accepts_everything() {
        assert!(RouteVerb::Any.accepts(Some(Verb::Get)));
        assert!(RouteVerb::Any.accepts(Some(Verb::Trace)));
        assert!(RouteVerb::Any.accepts(None));
    }

    #[test]
    fn test_exact_verb_only_accepts_itself() {
        let get = RouteVerb::Exact(Verb::Get);
        assert!(get.accepts(Some(Verb::Get)));
        assert!(!get.accepts(Some(Verb::Post)));
        assert!(!get.accepts(None)); // Unknown custom verb
    }
}
