//! Regular-expression path patterns.
//!
//! # Design Decisions
//! - Patterns are anchored: a route matches the full request path only
//! - No implicit case folding; use `(?i)` in the pattern when needed
//! - `{name}` placeholders are shorthand for `(?P<name>[^/]+)`

use std::sync::OnceLock;

use regex::Regex;

use crate::routing::params::PathParams;
use crate::routing::RoutingError;

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder regex is valid")
    })
}

/// A route pattern compiled for the regex strategy.
#[derive(Debug, Clone)]
pub struct RegexPattern {
    regex: Regex,
}

impl RegexPattern {
    pub fn compile(pattern: &str) -> Result<Self, RoutingError> {
        let expanded = placeholder().replace_all(pattern, "(?P<$1>[^/]+)");
        let anchored = format!("^(?:{})$", expanded);

        let regex = Regex::new(&anchored).map_err(|e| RoutingError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self { regex })
    }

    /// Match the full path and collect its captures.
    pub fn captures(&self, path: &str) -> Option<PathParams> {
        let captures = self.regex.captures(path)?;
        let mut params = PathParams::new();

        for (index, name) in self.regex.capture_names().enumerate().skip(1) {
            match captures.get(index) {
                Some(value) => params.push(name, value.as_str()),
                None => params.push_unmatched(name),
            }
        }

        Some(params)
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_path_only() {
        let pattern = RegexPattern::compile("/a").unwrap();
        assert!(pattern.captures("/a").is_some());
        assert!(pattern.captures("/a/b").is_none());
        assert!(pattern.captures("/x/a").is_none());
    }

    #[test]
    fn test_named_and_positional_groups() {
        let pattern = RegexPattern::compile(r"/users/(?P<id>\d+)/(\w+)").unwrap();
        let params = pattern.captures("/users/17/posts").unwrap();

        assert_eq!(params.get("id"), Some("17"));
        assert_eq!(params.positional(0), Some("17"));
        assert_eq!(params.positional(1), Some("posts"));
    }

    #[test]
    fn test_positions_follow_group_numbers() {
        let pattern = RegexPattern::compile(r"/x(/(\d+))?/(\w+)").unwrap();

        let params = pattern.captures("/x/name").unwrap();
        assert_eq!(params.len(), 3);
        assert_eq!(params.positional(0), None);
        assert_eq!(params.positional(1), None);
        assert_eq!(params.positional(2), Some("name"));

        let params = pattern.captures("/x/7/name").unwrap();
        assert_eq!(params.positional(1), Some("7"));
        assert_eq!(params.positional(2), Some("name"));
    }

    #[test]
    fn test_placeholder_shorthand() {
        let pattern = RegexPattern::compile("/people/{id}").unwrap();
        let params = pattern.captures("/people/ada").unwrap();
        assert_eq!(params.get("id"), Some("ada"));
        assert!(pattern.captures("/people/ada/extra").is_none());
    }

    #[test]
    fn test_case_sensitivity_is_pattern_defined() {
        let strict = RegexPattern::compile("/Docs").unwrap();
        assert!(strict.captures("/docs").is_none());

        let folded = RegexPattern::compile("(?i)/Docs").unwrap();
        assert!(folded.captures("/docs").is_some());
    }

    #[test]
    fn test_unmatched_optional_group_has_no_value() {
        let pattern = RegexPattern::compile(r"/items(/(?P<page>\d+))?").unwrap();
        let params = pattern.captures("/items").unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("page"), None);
        assert_eq!(params.positional(1), None);
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let err = RegexPattern::compile("/broken(").unwrap_err();
        assert!(matches!(err, RoutingError::InvalidPattern { .. }));
    }
}
