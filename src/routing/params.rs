//! Parameters captured from the request path.

/// One capture slot, optionally named. `value` is `None` for an optional
/// group that did not take part in the match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathParam {
    pub name: Option<String>,
    pub value: Option<String>,
}

/// Ordered parameters captured while matching a route.
///
/// Regex routes hold one slot per capture group, so `positional(n)` is
/// group `n + 1` of the pattern. Wildcard routes expose the text covered
/// by `*` as positional parameter 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    params: Vec<PathParam>,
}

impl PathParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, name: Option<&str>, value: impl Into<String>) {
        self.push_slot(name, Some(value.into()));
    }

    /// Record a group that did not participate, keeping later positions aligned.
    pub(crate) fn push_unmatched(&mut self, name: Option<&str>) {
        self.push_slot(name, None);
    }

    fn push_slot(&mut self, name: Option<&str>, value: Option<String>) {
        self.params.push(PathParam {
            name: name.map(str::to_string),
            value,
        });
    }

    /// Look up a named parameter.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.name.as_deref() == Some(name))
            .and_then(|p| p.value.as_deref())
    }

    /// Look up a parameter by capture position (named groups included).
    /// `None` when the slot is absent or its group did not match.
    pub fn positional(&self, index: usize) -> Option<&str> {
        self.params.get(index)?.value.as_deref()
    }

    /// Number of slots, matched or not.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathParam> {
        self.params.iter()
    }
}
