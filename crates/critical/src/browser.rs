//! Headless Chromium control for coverage collection and viewport checks.
//!
//! [`BrowserConfig`] is always available so front ends can carry it in their
//! configuration. The CDP implementation behind it needs the `browser`
//! feature and uses chromiumoxide.

/// Browser configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 800,
            viewport_height: 600,
            chromium_path: None,
            sandbox: true,
        }
    }
}

impl BrowserConfig {
    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

/// Resolves to whether the element (bound as `this`) intersects the layout
/// viewport. The observer fires once with the current state and is then
/// disconnected.
pub const INTERSECTS_VIEWPORT_JS: &str = "async function() {
    const element = this;
    const ratio = await new Promise((resolve) => {
        const observer = new IntersectionObserver((entries) => {
            resolve(entries[0].intersectionRatio);
            observer.disconnect();
        });
        observer.observe(element);
    });
    return ratio > 0;
}";

#[cfg(feature = "browser")]
mod cdp {
    use super::{BrowserConfig, INTERSECTS_VIEWPORT_JS};
    use crate::coverage::{CoverageEntry, RuleUsage};
    use crate::page::{ElementHandle, PageHandle};
    use crate::report::ResourceSizes;
    use crate::result::{CriticalError, CriticalResult};
    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::cdp::browser_protocol::css::{
        EnableParams as CssEnableParams, EventStyleSheetAdded, GetStyleSheetTextParams,
        StartRuleUsageTrackingParams, StopRuleUsageTrackingParams,
    };
    use chromiumoxide::cdp::browser_protocol::dom::EnableParams as DomEnableParams;
    use chromiumoxide::element::Element;
    use chromiumoxide::handler::viewport::Viewport;
    use chromiumoxide::page::Page;
    use futures::{FutureExt, StreamExt};
    use tracing::{debug, info, warn};

    /// Browser instance with a live CDP connection
    #[derive(Debug)]
    pub struct Browser {
        config: BrowserConfig,
        inner: CdpBrowser,
        handle: tokio::task::JoinHandle<()>,
    }

    impl Browser {
        /// Launch a new browser instance
        ///
        /// # Errors
        ///
        /// Returns error if browser cannot be launched
        pub async fn launch(config: BrowserConfig) -> CriticalResult<Self> {
            let mut builder = CdpConfig::builder()
                .window_size(config.viewport_width, config.viewport_height)
                .viewport(Viewport {
                    width: config.viewport_width,
                    height: config.viewport_height,
                    ..Viewport::default()
                });

            if !config.headless {
                builder = builder.with_head();
            }

            if !config.sandbox {
                builder = builder.no_sandbox();
            }

            if let Some(ref path) = config.chromium_path {
                builder = builder.chrome_executable(path);
            }

            let cdp_config = builder
                .build()
                .map_err(|message| CriticalError::BrowserLaunchError { message })?;

            let (inner, mut handler) = CdpBrowser::launch(cdp_config).await.map_err(|e| {
                CriticalError::BrowserLaunchError {
                    message: e.to_string(),
                }
            })?;

            let handle = tokio::spawn(async move {
                while let Some(h) = handler.next().await {
                    if h.is_err() {
                        break;
                    }
                }
            });

            info!(
                width = config.viewport_width,
                height = config.viewport_height,
                "browser launched"
            );
            Ok(Self {
                config,
                inner,
                handle,
            })
        }

        /// Open a blank page
        ///
        /// # Errors
        ///
        /// Returns error if page cannot be created
        pub async fn new_page(&self) -> CriticalResult<CdpPage> {
            let page = self
                .inner
                .new_page("about:blank")
                .await
                .map_err(|e| CriticalError::PageError {
                    message: e.to_string(),
                })?;
            Ok(CdpPage { inner: page })
        }

        /// Get the browser configuration
        #[must_use]
        pub const fn config(&self) -> &BrowserConfig {
            &self.config
        }

        /// Close the browser
        pub async fn close(mut self) -> CriticalResult<()> {
            self.inner
                .close()
                .await
                .map_err(|e| CriticalError::BrowserLaunchError {
                    message: e.to_string(),
                })?;
            self.handle.abort();
            Ok(())
        }
    }

    /// A page with a live CDP connection
    #[derive(Debug, Clone)]
    pub struct CdpPage {
        inner: Page,
    }

    impl CdpPage {
        /// Navigate to `url` and collect CSS coverage for the load.
        ///
        /// Rule usage tracking runs from before navigation until the load
        /// finishes. Every stylesheet the page added is reported, in the
        /// order the browser announced them; stylesheets without a source
        /// URL (inline `<style>` blocks) are skipped.
        ///
        /// # Errors
        ///
        /// Returns error if navigation or any CSS domain command fails
        pub async fn collect_css_coverage(&self, url: &str) -> CriticalResult<Vec<CoverageEntry>> {
            let coverage_err = |e: chromiumoxide::error::CdpError| CriticalError::CoverageError {
                message: e.to_string(),
            };

            let mut added = self
                .inner
                .event_listener::<EventStyleSheetAdded>()
                .await
                .map_err(coverage_err)?;

            self.inner
                .execute(DomEnableParams::default())
                .await
                .map_err(coverage_err)?;
            self.inner
                .execute(CssEnableParams::default())
                .await
                .map_err(coverage_err)?;
            self.inner
                .execute(StartRuleUsageTrackingParams::default())
                .await
                .map_err(coverage_err)?;

            self.goto(url).await?;

            let usage = self
                .inner
                .execute(StopRuleUsageTrackingParams::default())
                .await
                .map_err(coverage_err)?
                .result
                .rule_usage;

            let mut headers = Vec::new();
            while let Some(Some(event)) = added.next().now_or_never() {
                headers.push(event.header.clone());
            }

            let mut entries = Vec::with_capacity(headers.len());
            for header in headers {
                if header.source_url.is_empty() {
                    continue;
                }
                let text = match self
                    .inner
                    .execute(GetStyleSheetTextParams::new(header.style_sheet_id.clone()))
                    .await
                {
                    Ok(response) => response.result.text,
                    Err(e) => {
                        warn!(url = %header.source_url, error = %e, "stylesheet text unavailable");
                        continue;
                    }
                };
                let usages: Vec<RuleUsage> = usage
                    .iter()
                    .filter(|u| u.style_sheet_id == header.style_sheet_id)
                    .map(|u| RuleUsage {
                        start: u.start_offset,
                        end: u.end_offset,
                        used: u.used,
                    })
                    .collect();
                entries.push(CoverageEntry::from_rule_usage(
                    header.source_url.clone(),
                    text,
                    &usages,
                ));
            }

            info!(url, stylesheets = entries.len(), "collected CSS coverage");
            Ok(entries)
        }

        /// Navigate to a URL and wait for the load
        ///
        /// # Errors
        ///
        /// Returns error if navigation fails
        pub async fn goto(&self, url: &str) -> CriticalResult<()> {
            self.inner
                .goto(url)
                .await
                .map_err(|e| CriticalError::NavigationError {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            debug!(url, "navigated");
            Ok(())
        }

        /// Transfer sizes from the page's performance timeline
        ///
        /// # Errors
        ///
        /// Returns error if the timeline cannot be read
        pub async fn resource_sizes(&self) -> CriticalResult<ResourceSizes> {
            let json: String = self
                .inner
                .evaluate("JSON.stringify(performance.getEntries())")
                .await
                .map_err(|e| CriticalError::PageError {
                    message: e.to_string(),
                })?
                .into_value()
                .map_err(|e| CriticalError::PageError {
                    message: e.to_string(),
                })?;
            ResourceSizes::from_json(&json)
        }
    }

    #[async_trait]
    impl PageHandle for CdpPage {
        type Element = CdpElement;

        async fn query_all(&self, selector: &str) -> CriticalResult<Vec<CdpElement>> {
            let elements =
                self.inner
                    .find_elements(selector)
                    .await
                    .map_err(|e| CriticalError::Query {
                        selector: selector.to_string(),
                        message: e.to_string(),
                    })?;
            Ok(elements.into_iter().map(|inner| CdpElement { inner }).collect())
        }
    }

    /// An element handle on a [`CdpPage`]
    #[derive(Debug)]
    pub struct CdpElement {
        inner: Element,
    }

    #[async_trait]
    impl ElementHandle for CdpElement {
        async fn is_intersecting_viewport(&self) -> CriticalResult<bool> {
            let returns = self
                .inner
                .call_js_fn(INTERSECTS_VIEWPORT_JS, true)
                .await
                .map_err(|e| CriticalError::Viewport {
                    message: e.to_string(),
                })?;
            Ok(returns
                .result
                .value
                .and_then(|v| v.as_bool())
                .unwrap_or(false))
        }
    }
}

#[cfg(feature = "browser")]
pub use cdp::{Browser, CdpElement, CdpPage};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BrowserConfig::default();
        assert!(config.headless);
        assert!(config.sandbox);
        assert_eq!((config.viewport_width, config.viewport_height), (800, 600));
        assert!(config.chromium_path.is_none());
    }

    #[test]
    fn test_builder() {
        let config = BrowserConfig::default()
            .with_viewport(1280, 720)
            .with_headless(false)
            .with_chromium_path("/usr/bin/chromium")
            .with_no_sandbox();
        assert!(!config.headless);
        assert!(!config.sandbox);
        assert_eq!(config.viewport_width, 1280);
        assert_eq!(config.chromium_path.as_deref(), Some("/usr/bin/chromium"));
    }

    #[test]
    fn test_viewport_script_is_a_function() {
        assert!(INTERSECTS_VIEWPORT_JS.starts_with("async function()"));
        assert!(INTERSECTS_VIEWPORT_JS.contains("IntersectionObserver"));
    }
}
