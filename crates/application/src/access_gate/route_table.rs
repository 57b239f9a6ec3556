use super::AccessRequirement;

/// Maps route path prefixes to access requirements.
///
/// Prefixes match on whole path segments, and the longest matching prefix
/// wins. Paths with no matching rule are open.
#[derive(Debug, Clone, Default)]
pub struct RouteAccessTable {
    rules: Vec<(String, AccessRequirement)>,
}

impl RouteAccessTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule for a path prefix, replacing any rule for the same prefix.
    #[must_use]
    pub fn with_rule(mut self, prefix: impl Into<String>, requirement: AccessRequirement) -> Self {
        let prefix = normalize_prefix(prefix.into());
        self.rules.retain(|(existing, _)| existing != &prefix);
        self.rules.push((prefix, requirement));
        self
    }

    /// Returns the requirement for a request path, if any rule covers it.
    #[must_use]
    pub fn requirement_for(&self, path: &str) -> Option<&AccessRequirement> {
        self.rules
            .iter()
            .filter(|(prefix, _)| prefix_matches(prefix, path))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, requirement)| requirement)
    }
}

fn normalize_prefix(prefix: String) -> String {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_owned();
    }
    if trimmed.starts_with('/') {
        trimmed.to_owned()
    } else {
        format!("/{trimmed}")
    }
}

fn prefix_matches(prefix: &str, path: &str) -> bool {
    if prefix == "/" {
        return true;
    }

    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}
