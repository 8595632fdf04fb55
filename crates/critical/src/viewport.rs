//! Viewport matching: which selectors style something the user sees first.
//!
//! Every selector is checked in its own future and every matched element
//! in a nested one; both batches are awaited with `join_all` on the
//! current task, so nothing here needs a runtime of its own. A failed query
//! or element check becomes a [`SelectorOutcome::Failed`] value and never
//! aborts the batch.

use std::collections::HashSet;

use futures::future::join_all;
use tracing::{debug, trace};

use crate::page::{ElementHandle, PageHandle};

/// Result of checking one selector against the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorOutcome {
    /// At least one matched element intersects the viewport
    Visible,
    /// Matched nothing, or nothing that intersects
    Hidden,
    /// The query failed, or every element check that did not come back
    /// `false` failed
    Failed(String),
}

/// One selector together with its outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorCheck {
    /// Selector text
    pub selector: String,
    /// What the page said about it
    pub outcome: SelectorOutcome,
    /// Number of elements the query returned
    pub matched: usize,
}

impl SelectorCheck {
    /// Whether the selector is critical
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.outcome == SelectorOutcome::Visible
    }
}

/// Check every selector against the page concurrently
pub async fn check_selectors<P: PageHandle>(page: &P, selectors: &[String]) -> Vec<SelectorCheck> {
    join_all(selectors.iter().map(|selector| check_selector(page, selector))).await
}

/// Check a single selector: query its elements, then test them all
pub async fn check_selector<P: PageHandle>(page: &P, selector: &str) -> SelectorCheck {
    let elements = match page.query_all(selector).await {
        Ok(elements) => elements,
        Err(e) => {
            trace!(selector, error = %e, "selector query failed");
            return SelectorCheck {
                selector: selector.to_string(),
                outcome: SelectorOutcome::Failed(e.to_string()),
                matched: 0,
            };
        }
    };

    let results = join_all(elements.iter().map(|element| element.is_intersecting_viewport())).await;

    let mut failure = None;
    let mut visible = false;
    for result in results {
        match result {
            Ok(true) => visible = true,
            Ok(false) => {}
            Err(e) => {
                failure.get_or_insert_with(|| e.to_string());
            }
        }
    }

    let outcome = if visible {
        SelectorOutcome::Visible
    } else if let Some(message) = failure {
        SelectorOutcome::Failed(message)
    } else {
        SelectorOutcome::Hidden
    };

    SelectorCheck {
        selector: selector.to_string(),
        outcome,
        matched: elements.len(),
    }
}

/// Keep the visible selectors, discard everything else
#[must_use]
pub fn critical_selectors(checks: &[SelectorCheck]) -> HashSet<String> {
    let failed = checks
        .iter()
        .filter(|c| matches!(c.outcome, SelectorOutcome::Failed(_)))
        .count();
    if failed > 0 {
        debug!(failed, "selector checks failed and were treated as not critical");
    }
    checks
        .iter()
        .filter(|c| c.is_visible())
        .map(|c| c.selector.clone())
        .collect()
}
