//! Options for a critical CSS reduction.

use crate::policy::CssFilePolicy;
use crate::result::CriticalResult;
use crate::whitelist::SelectorFilter;

/// Reduction options.
///
/// The live page is not part of the options; it is passed next to them so
/// that the same options can drive both the offline and the live path.
#[derive(Debug, Clone, Default)]
pub struct CriticalOptions {
    /// Stylesheet include/exclude policy
    pub policy: CssFilePolicy,
    /// Selectors forced into the critical set
    pub selector_filter: SelectorFilter,
}

impl CriticalOptions {
    /// Create default options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Always include stylesheets whose URL contains `pattern`
    #[must_use]
    pub fn with_include(mut self, pattern: impl Into<String>) -> Self {
        self.policy = self.policy.include(pattern);
        self
    }

    /// Skip stylesheets whose URL contains `pattern` (unless included)
    #[must_use]
    pub fn with_exclude(mut self, pattern: impl Into<String>) -> Self {
        self.policy = self.policy.exclude(pattern);
        self
    }

    /// Set the whole policy
    #[must_use]
    pub fn with_policy(mut self, policy: CssFilePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the selector whitelist
    #[must_use]
    pub fn with_selector_filter(mut self, filter: SelectorFilter) -> Self {
        self.selector_filter = filter;
        self
    }

    /// Compile and add a whitelist pattern
    pub fn with_selector_pattern(mut self, pattern: &str) -> CriticalResult<Self> {
        self.selector_filter = self.selector_filter.with_pattern(pattern)?;
        Ok(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = CriticalOptions::new();
        assert!(options.policy.include.is_empty());
        assert!(options.policy.exclude.is_empty());
        assert!(options.selector_filter.is_empty());
    }

    #[test]
    fn test_builder() {
        let options = CriticalOptions::new()
            .with_include("main.css")
            .with_exclude("vendor")
            .with_selector_pattern(":hover$")
            .unwrap();
        assert_eq!(options.policy.include, vec!["main.css"]);
        assert_eq!(options.policy.exclude, vec!["vendor"]);
        assert!(options.selector_filter.matches("a:hover"));
    }

    #[test]
    fn test_with_policy_replaces() {
        let options = CriticalOptions::new()
            .with_include("a")
            .with_policy(CssFilePolicy::new().exclude("b"));
        assert!(options.policy.include.is_empty());
        assert_eq!(options.policy.exclude, vec!["b"]);
    }
}
