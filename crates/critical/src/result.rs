//! Result and error types for critical CSS extraction.

use thiserror::Error;

/// Result type for critical CSS operations
pub type CriticalResult<T> = Result<T, CriticalError>;

/// Errors that can occur while reducing coverage to critical CSS
#[derive(Debug, Error)]
pub enum CriticalError {
    /// A coverage entry carried a URL that could not be parsed
    #[error("Invalid stylesheet URL '{url}': {message}")]
    InvalidUrl {
        /// URL as found in the coverage entry
        url: String,
        /// Error message
        message: String,
    },

    /// A selector filter pattern is not a valid regular expression
    #[error("Invalid selector pattern '{pattern}': {message}")]
    InvalidPattern {
        /// Pattern source
        pattern: String,
        /// Error message
        message: String,
    },

    /// CSS text could not be parsed
    #[error("CSS parse error: {message}")]
    Parse {
        /// Error message
        message: String,
    },

    /// Rule extraction failed
    #[error("Rule extraction failed: {message}")]
    Extract {
        /// Error message
        message: String,
    },

    /// Minification failed
    #[error("Minification failed: {message}")]
    Minify {
        /// Error message
        message: String,
    },

    /// Querying the page for a selector failed
    #[error("Query for '{selector}' failed: {message}")]
    Query {
        /// Selector that was queried
        selector: String,
        /// Error message
        message: String,
    },

    /// Viewport intersection test failed
    #[error("Viewport check failed: {message}")]
    Viewport {
        /// Error message
        message: String,
    },

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunchError {
        /// Error message
        message: String,
    },

    /// Page error
    #[error("Page error: {message}")]
    PageError {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    NavigationError {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Coverage collection error
    #[error("Coverage collection failed: {message}")]
    CoverageError {
        /// Error message
        message: String,
    },

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
