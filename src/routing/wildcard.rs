//! Wildcard path patterns.
//!
//! # Responsibilities
//! - Compile route patterns into literal or `*`-split forms
//! - Resolve the best pattern for a request path
//!
//! # Design Decisions
//! - Comparison is case-insensitive (patterns and paths are lowercased)
//! - Only the first `*` splits a pattern; later ones are literal text
//! - Best match = longest literal text; ties keep the first declared pattern

use crate::routing::ANY_PATH;

/// A compiled pattern under the wildcard strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WildcardPattern {
    /// The `*` sentinel, matches every path but never takes part in resolution.
    AnyPath,
    /// A pattern without wildcard, compared as a whole.
    Literal(String),
    /// A pattern split around its first `*`.
    Split { prefix: String, suffix: String },
}

impl WildcardPattern {
    pub fn compile(pattern: &str) -> Self {
        if pattern == ANY_PATH {
            return WildcardPattern::AnyPath;
        }

        let lowered = pattern.to_lowercase();
        match lowered.find('*') {
            Some(star) => WildcardPattern::Split {
                prefix: lowered[..star].to_string(),
                suffix: lowered[star + 1..].to_string(),
            },
            None => WildcardPattern::Literal(lowered),
        }
    }

    /// Number of literal characters a match must cover, or `None` when
    /// `path` (already lowercased) does not match.
    fn literal_score(&self, path: &str) -> Option<usize> {
        match self {
            WildcardPattern::AnyPath => None,
            WildcardPattern::Literal(literal) => (literal == path).then_some(literal.len()),
            WildcardPattern::Split { prefix, suffix } => {
                let fits = path.len() >= prefix.len() + suffix.len()
                    && path.starts_with(prefix.as_str())
                    && path.ends_with(suffix.as_str());
                fits.then_some(prefix.len() + suffix.len())
            }
        }
    }

    /// The text covered by `*`, cut from `original`, for a path whose
    /// lowercased form `lowered` this pattern matches.
    pub fn wildcard_segment<'p>(&self, lowered: &str, original: &'p str) -> Option<&'p str> {
        match self {
            WildcardPattern::Split { prefix, suffix } => {
                self.literal_score(lowered)?;
                let start = original_offset(original, prefix.len())?;
                let end = original_offset(original, lowered.len() - suffix.len())?;
                original.get(start..end)
            }
            _ => None,
        }
    }
}

/// Byte offset in `original` whose lowercased prefix is `lowered_len` bytes
/// long. Lowercasing may change byte lengths, so offsets are walked per char.
fn original_offset(original: &str, lowered_len: usize) -> Option<usize> {
    let mut covered = 0;
    for (index, c) in original.char_indices() {
        if covered == lowered_len {
            return Some(index);
        }
        covered += c.to_lowercase().map(char::len_utf8).sum::<usize>();
        if covered > lowered_len {
            return None;
        }
    }
    (covered == lowered_len).then_some(original.len())
}

/// Pick the pattern whose literal text best covers `path` (lowercased).
///
/// Returns the index of the winning pattern, if any pattern matches.
pub fn resolve(patterns: &[WildcardPattern], path: &str) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;

    for (index, pattern) in patterns.iter().enumerate() {
        let Some(score) = pattern.literal_score(path) else {
            continue;
        };
        // Strictly greater keeps the earliest declaration on ties
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((index, score));
        }
    }

    best.map(|(index, _)| index)
}
