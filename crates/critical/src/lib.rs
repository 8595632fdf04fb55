//! Critical CSS: the CSS a page needs to paint its first viewport.
//!
//! Browser coverage says which parts of each stylesheet were used while the
//! page loaded. This crate turns that coverage into a single stylesheet:
//! used ranges are cut out of each sheet, relative `url()` references are
//! made absolute, stylesheets are filtered by URL, and, given a live page,
//! every rule whose selectors match nothing inside the viewport is dropped.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐   ┌─────────────┐   ┌──────────────┐   ┌────────────┐
//! │ Coverage   │──►│ Normalize + │──►│ Viewport     │──►│ Extract +  │
//! │ entries    │   │ URL policy  │   │ match (page) │   │ minify     │
//! └────────────┘   └─────────────┘   └──────────────┘   └────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use critical_css::{critical_css, CoverageEntry, CriticalOptions, MockPage};
//!
//! let coverage = vec![CoverageEntry::new("https://example.com/site.css", ".a{color:red}")];
//! let options = CriticalOptions::new().with_exclude("fonts.googleapis.com");
//! let css = critical_css::<MockPage>(&coverage, &options, None).await?;
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

pub mod browser;
mod coverage;
mod critical;
mod options;
mod page;
mod policy;
mod report;
mod result;
#[allow(clippy::missing_errors_doc)]
mod stylesheet;
mod viewport;
mod whitelist;

#[cfg(feature = "browser")]
pub use browser::{Browser, CdpElement, CdpPage};
pub use browser::{BrowserConfig, INTERSECTS_VIEWPORT_JS};
pub use coverage::{
    absolutize_urls, normalize_entry, parse_coverage_json, substring, CoverageEntry,
    CoverageRange, RuleUsage,
};
pub use critical::{accumulate, append_entry, critical_css, reduce_entry, ReductionState};
pub use options::CriticalOptions;
pub use page::{ElementHandle, MockElement, MockPage, PageHandle};
pub use policy::{CssFilePolicy, PolicyDecision};
pub use report::{format_bytes, CriticalReport, PerformanceEntry, ResourceSizes};
pub use result::{CriticalError, CriticalResult};
pub use stylesheet::{collect_selectors, extract_rules, minify};
pub use viewport::{
    check_selector, check_selectors, critical_selectors, SelectorCheck, SelectorOutcome,
};
pub use whitelist::SelectorFilter;
