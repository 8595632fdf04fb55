//! Page capability used for viewport checks.
//!
//! The reduction only needs two things from a rendered page: every element
//! matching a selector, and whether a given element intersects the
//! viewport. Any automation backend can provide them.
//!
//! # Implementations
//!
//! - `CdpPage` - Chromium over CDP via chromiumoxide (`browser` feature)
//! - `MockPage` - In-memory page for unit testing

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::result::{CriticalError, CriticalResult};

/// A live page that can be queried by CSS selector
#[async_trait]
pub trait PageHandle: Send + Sync {
    /// Element handle type returned by queries
    type Element: ElementHandle;

    /// Query all elements matching `selector`
    async fn query_all(&self, selector: &str) -> CriticalResult<Vec<Self::Element>>;
}

/// An element on a live page
#[async_trait]
pub trait ElementHandle: Send + Sync {
    /// Whether the element's box overlaps the visible viewport
    async fn is_intersecting_viewport(&self) -> CriticalResult<bool>;
}

/// Mock element for unit testing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockElement {
    /// Element inside the viewport
    Visible,
    /// Element outside the viewport
    Hidden,
    /// Element whose viewport check fails
    Broken,
}

#[async_trait]
impl ElementHandle for MockElement {
    async fn is_intersecting_viewport(&self) -> CriticalResult<bool> {
        match self {
            Self::Visible => Ok(true),
            Self::Hidden => Ok(false),
            Self::Broken => Err(CriticalError::Viewport {
                message: "element detached".to_string(),
            }),
        }
    }
}

/// Mock page for unit testing
#[derive(Debug, Default, Clone)]
pub struct MockPage {
    /// Elements returned per selector
    pub elements: HashMap<String, Vec<MockElement>>,
    /// Selectors whose query fails
    pub failing: Vec<String>,
    /// Call history for verification
    call_history: Arc<Mutex<Vec<String>>>,
}

impl MockPage {
    /// Create new mock page
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the elements a selector matches
    #[must_use]
    pub fn with_elements(mut self, selector: &str, elements: &[MockElement]) -> Self {
        self.elements
            .entry(selector.to_string())
            .or_default()
            .extend_from_slice(elements);
        self
    }

    /// Make queries for `selector` fail
    #[must_use]
    pub fn with_failing(mut self, selector: &str) -> Self {
        self.failing.push(selector.to_string());
        self
    }

    /// Selectors queried so far, in call order
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.call_history
            .lock()
            .map(|history| history.clone())
            .unwrap_or_default()
    }

    /// Check if a selector was queried
    #[must_use]
    pub fn was_queried(&self, selector: &str) -> bool {
        self.history().iter().any(|s| s == selector)
    }
}

#[async_trait]
impl PageHandle for MockPage {
    type Element = MockElement;

    async fn query_all(&self, selector: &str) -> CriticalResult<Vec<MockElement>> {
        if let Ok(mut history) = self.call_history.lock() {
            history.push(selector.to_string());
        }
        if self.failing.iter().any(|s| s == selector) {
            return Err(CriticalError::Query {
                selector: selector.to_string(),
                message: "invalid selector".to_string(),
            });
        }
        Ok(self.elements.get(selector).cloned().unwrap_or_default())
    }
}
