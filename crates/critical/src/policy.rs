//! Stylesheet inclusion policy.
//!
//! Include patterns win over exclude patterns; a URL matching neither list
//! is allowed.

use serde::{Deserialize, Serialize};

/// Include/exclude lists of URL substrings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CssFilePolicy {
    /// Substrings that force a stylesheet in
    #[serde(default)]
    pub include: Vec<String>,
    /// Substrings that keep a stylesheet out
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Why a stylesheet was let in or kept out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    /// Matched an include pattern
    Included,
    /// Matched no pattern at all
    Allowed,
    /// Matched an exclude pattern and no include pattern
    Excluded,
}

impl PolicyDecision {
    /// Whether the stylesheet takes part in the reduction
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        !matches!(self, Self::Excluded)
    }
}

impl CssFilePolicy {
    /// Create an empty policy (allows everything)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an include pattern
    #[must_use]
    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.include.push(pattern.into());
        self
    }

    /// Add an exclude pattern
    #[must_use]
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude.push(pattern.into());
        self
    }

    /// Decide for a full stylesheet URL
    #[must_use]
    pub fn decide(&self, url: &str) -> PolicyDecision {
        if self.include.iter().any(|p| url.contains(p.as_str())) {
            PolicyDecision::Included
        } else if self.exclude.iter().any(|p| url.contains(p.as_str())) {
            PolicyDecision::Excluded
        } else {
            PolicyDecision::Allowed
        }
    }
}
