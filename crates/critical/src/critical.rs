//! The reduction: coverage entries in, critical CSS out.
//!
//! The reduction is a fold over coverage entries. The accumulator is the
//! current critical CSS text; each step appends the entry's used CSS and,
//! when a live page is available, immediately reduces the whole
//! accumulator again to the rules whose selectors are visible or
//! whitelisted.
//!
//! ```text
//! entry ─► normalize ─► policy ─► append ─┬─► (no page) next entry
//!                                         └─► collect ─► match ─► whitelist ─► extract ─► next entry
//! ```

use tracing::{debug, info, warn};

use crate::coverage::{normalize_entry, CoverageEntry};
use crate::options::CriticalOptions;
use crate::page::PageHandle;
use crate::result::CriticalResult;
use crate::stylesheet::{collect_selectors, extract_rules, minify};
use crate::viewport::{check_selectors, critical_selectors};

/// Which path a reduction runs on. Fixed for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReductionState {
    /// No page: concatenate filtered coverage text
    Accumulating,
    /// Live page: reduce after every entry
    Reducing,
}

impl ReductionState {
    /// State for a run with or without a page
    #[must_use]
    pub const fn for_page(has_page: bool) -> Self {
        if has_page {
            Self::Reducing
        } else {
            Self::Accumulating
        }
    }
}

/// Append the entry's CSS to the accumulator if the policy lets it in.
///
/// Fails only when the entry URL is malformed.
pub fn append_entry(
    mut accumulator: String,
    entry: &CoverageEntry,
    options: &CriticalOptions,
) -> CriticalResult<String> {
    let url = entry.parse_url()?;
    let decision = options.policy.decide(url.as_str());

    if decision.is_allowed() {
        let css = normalize_entry(entry, &url);
        debug!(
            url = %url,
            ?decision,
            used = entry.used_len(),
            bytes = css.len(),
            "stylesheet accepted"
        );
        accumulator.push_str(&css);
    } else {
        debug!(url = %url, "stylesheet excluded");
    }
    Ok(accumulator)
}

/// One step of the live-page fold.
///
/// Extraction failures keep the previous text; parse failures propagate.
pub async fn reduce_entry<P: PageHandle>(
    accumulator: String,
    entry: &CoverageEntry,
    options: &CriticalOptions,
    page: &P,
) -> CriticalResult<String> {
    let accumulator = append_entry(accumulator, entry, options)?;

    let selectors = collect_selectors(&accumulator)?;
    let checks = check_selectors(page, &selectors).await;
    let mut critical = critical_selectors(&checks);
    let visible = critical.len();
    let whitelisted = options.selector_filter.apply(&selectors, &mut critical);

    debug!(
        url = %entry.url,
        selectors = selectors.len(),
        visible,
        whitelisted,
        "selectors matched"
    );

    match extract_rules(&accumulator, &critical) {
        Ok(css) => Ok(css),
        Err(e) => {
            warn!(url = %entry.url, error = %e, "extraction failed, keeping previous CSS");
            Ok(accumulator)
        }
    }
}

/// Concatenate the used CSS of every allowed entry. Not minified.
pub fn accumulate(coverage: &[CoverageEntry], options: &CriticalOptions) -> CriticalResult<String> {
    coverage
        .iter()
        .try_fold(String::new(), |acc, entry| append_entry(acc, entry, options))
}

/// Compute critical CSS.
///
/// Without a page this is [`accumulate`]; the text is returned as is. With
/// a page every entry is folded through [`reduce_entry`] and the result is
/// minified.
pub async fn critical_css<P: PageHandle>(
    coverage: &[CoverageEntry],
    options: &CriticalOptions,
    page: Option<&P>,
) -> CriticalResult<String> {
    let state = ReductionState::for_page(page.is_some());
    info!(
        entries = coverage.len(),
        patterns = options.selector_filter.len(),
        ?state,
        "reducing coverage"
    );

    let Some(page) = page else {
        return accumulate(coverage, options);
    };

    let mut accumulator = String::new();
    for entry in coverage {
        accumulator = reduce_entry(accumulator, entry, options, page).await?;
    }

    let css = minify(&accumulator)?;
    info!(bytes = css.len(), "critical CSS ready");
    Ok(css)
}
