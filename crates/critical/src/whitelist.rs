//! Selector whitelist: regex patterns that force selectors into the
//! critical set, for states a viewport check can never observe (`:hover`,
//! `:focus`, classes toggled by scripts).

use std::collections::HashSet;

use regex::Regex;
use tracing::debug;

use crate::result::{CriticalError, CriticalResult};

/// Compiled selector patterns
#[derive(Debug, Clone, Default)]
pub struct SelectorFilter {
    patterns: Vec<Regex>,
}

impl SelectorFilter {
    /// Create an empty filter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile pattern sources into a filter
    pub fn from_patterns<I, S>(patterns: I) -> CriticalResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| compile(p.as_ref()))
            .collect::<CriticalResult<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Compile and add a pattern
    pub fn with_pattern(mut self, pattern: &str) -> CriticalResult<Self> {
        self.patterns.push(compile(pattern)?);
        Ok(self)
    }

    /// Whether any pattern matches the selector
    #[must_use]
    pub fn matches(&self, selector: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(selector))
    }

    /// Number of patterns
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether there are no patterns
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Pattern sources, in insertion order
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(Regex::as_str)
    }

    /// Add every selector matched by a pattern to `critical`.
    /// Returns how many selectors were added.
    pub fn apply(&self, selectors: &[String], critical: &mut HashSet<String>) -> usize {
        if self.patterns.is_empty() {
            return 0;
        }
        let mut added = 0;
        for selector in selectors {
            if !critical.contains(selector) && self.matches(selector) {
                debug!(selector = %selector, "whitelisted by pattern");
                critical.insert(selector.clone());
                added += 1;
            }
        }
        added
    }
}

fn compile(pattern: &str) -> CriticalResult<Regex> {
    Regex::new(pattern).map_err(|e| CriticalError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn selectors(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_hover_pattern_adds_selector() {
        let filter = SelectorFilter::from_patterns([":hover$"]).unwrap();
        let mut critical = HashSet::new();
        let added = filter.apply(&selectors(&[".tooltip:hover", ".tooltip"]), &mut critical);
        assert_eq!(added, 1);
        assert!(critical.contains(".tooltip:hover"));
        assert!(!critical.contains(".tooltip"));
    }

    #[test]
    fn test_already_critical_not_counted() {
        let filter = SelectorFilter::from_patterns(["^\\.nav"]).unwrap();
        let mut critical: HashSet<String> = [".nav".to_string()].into_iter().collect();
        let added = filter.apply(&selectors(&[".nav", ".nav-item"]), &mut critical);
        assert_eq!(added, 1);
        assert_eq!(critical.len(), 2);
    }

    #[test]
    fn test_empty_filter_adds_nothing() {
        let mut critical = HashSet::new();
        assert_eq!(SelectorFilter::new().apply(&selectors(&[".a"]), &mut critical), 0);
        assert!(critical.is_empty());
    }

    #[test]
    fn test_invalid_pattern() {
        let err = SelectorFilter::from_patterns(["(unclosed"]).unwrap_err();
        assert!(matches!(err, CriticalError::InvalidPattern { .. }));
    }

    #[test]
    fn test_builder_and_sources() {
        let filter = SelectorFilter::new()
            .with_pattern(":focus")
            .unwrap()
            .with_pattern("^\\.is-open")
            .unwrap();
        assert_eq!(filter.len(), 2);
        assert_eq!(filter.sources().collect::<Vec<_>>(), vec![":focus", "^\\.is-open"]);
        assert!(!filter.matches(".menu.is-open"));
        assert!(filter.matches(".is-open .menu"));
    }
}
