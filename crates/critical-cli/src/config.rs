//! CLI configuration

use std::path::Path;

use critical_css::{CriticalOptions, CssFilePolicy, SelectorFilter};
use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - minimal output
    Quiet,
    /// Normal - default output
    #[default]
    Normal,
    /// Verbose - extra output
    Verbose,
    /// Debug - maximum output
    Debug,
}

impl Verbosity {
    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Check if verbose or higher
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose | Self::Debug)
    }

    /// Default log filter when `RUST_LOG` is unset
    #[must_use]
    pub const fn log_filter(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "info",
            Self::Debug => "debug",
        }
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorChoice {
    /// Always use colors
    Always,
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Should use colors based on output detection
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => console::Term::stderr().features().colors_supported(),
        }
    }
}

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Color output choice
    pub color: ColorChoice,
}

impl CliConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set color choice
    #[must_use]
    pub const fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }
}

/// Viewport section of an options file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportSize {
    /// Width in CSS pixels
    pub width: u32,
    /// Height in CSS pixels
    pub height: u32,
}

/// Reduction options loaded from a YAML file.
///
/// ```yaml
/// include: ["main.css"]
/// exclude: ["fonts.googleapis.com"]
/// selector_filter: [":hover$", "^\\.modal"]
/// viewport: { width: 1280, height: 720 }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionsFile {
    /// Stylesheet URL substrings that are always kept
    pub include: Vec<String>,
    /// Stylesheet URL substrings that are dropped
    pub exclude: Vec<String>,
    /// Regular expressions for selectors kept regardless of visibility
    pub selector_filter: Vec<String>,
    /// Viewport used when loading a page
    pub viewport: Option<ViewportSize>,
}

impl OptionsFile {
    /// Parse YAML text
    pub fn from_yaml(yaml: &str) -> CliResult<Self> {
        serde_yaml_ng::from_str(yaml).map_err(|e| CliError::config(e.to_string()))
    }

    /// Load from a file
    pub fn load(path: &Path) -> CliResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// Add command-line values after the file's own
    #[must_use]
    pub fn merge(mut self, include: &[String], exclude: &[String], filters: &[String]) -> Self {
        self.include.extend_from_slice(include);
        self.exclude.extend_from_slice(exclude);
        self.selector_filter.extend_from_slice(filters);
        self
    }

    /// Build library options. Fails on an invalid selector pattern.
    pub fn to_options(&self) -> CliResult<CriticalOptions> {
        let policy = CssFilePolicy {
            include: self.include.clone(),
            exclude: self.exclude.clone(),
        };
        let filter = SelectorFilter::from_patterns(&self.selector_filter)?;
        Ok(CriticalOptions::new()
            .with_policy(policy)
            .with_selector_filter(filter))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod verbosity_tests {
        use super::*;

        #[test]
        fn test_default_verbosity() {
            assert_eq!(Verbosity::default(), Verbosity::Normal);
        }

        #[test]
        fn test_is_quiet() {
            assert!(Verbosity::Quiet.is_quiet());
            assert!(!Verbosity::Normal.is_quiet());
        }

        #[test]
        fn test_is_verbose() {
            assert!(!Verbosity::Normal.is_verbose());
            assert!(Verbosity::Verbose.is_verbose());
            assert!(Verbosity::Debug.is_verbose());
        }

        #[test]
        fn test_log_filter() {
            assert_eq!(Verbosity::Quiet.log_filter(), "error");
            assert_eq!(Verbosity::Debug.log_filter(), "debug");
        }
    }

    mod color_tests {
        use super::*;

        #[test]
        fn test_forced_choices() {
            assert!(ColorChoice::Always.should_color());
            assert!(!ColorChoice::Never.should_color());
        }
    }

    mod cli_config_tests {
        use super::*;

        #[test]
        fn test_builder() {
            let config = CliConfig::new()
                .with_verbosity(Verbosity::Debug)
                .with_color(ColorChoice::Never);
            assert_eq!(config.verbosity, Verbosity::Debug);
            assert_eq!(config.color, ColorChoice::Never);
        }
    }

    mod options_file_tests {
        use super::*;

        #[test]
        fn test_from_yaml() {
            let yaml = "include: [main.css]\nexclude: [fonts.googleapis.com]\nselector_filter: [':hover$']\nviewport: { width: 1280, height: 720 }\n";
            let file = OptionsFile::from_yaml(yaml).unwrap();
            assert_eq!(file.include, vec!["main.css"]);
            assert_eq!(file.exclude, vec!["fonts.googleapis.com"]);
            assert_eq!(file.selector_filter, vec![":hover$"]);
            assert_eq!(
                file.viewport,
                Some(ViewportSize {
                    width: 1280,
                    height: 720
                })
            );
        }

        #[test]
        fn test_missing_keys_default() {
            let file = OptionsFile::from_yaml("exclude: [ads]\n").unwrap();
            assert!(file.include.is_empty());
            assert!(file.viewport.is_none());
        }

        #[test]
        fn test_invalid_yaml() {
            let err = OptionsFile::from_yaml("include: [unclosed").unwrap_err();
            assert!(matches!(err, CliError::Config { .. }));
        }

        #[test]
        fn test_merge_and_build() {
            let file = OptionsFile::from_yaml("exclude: [vendor]\n")
                .unwrap()
                .merge(&["main".to_string()], &[], &["^\\.modal".to_string()]);
            let options = file.to_options().unwrap();
            assert!(options.policy.decide("https://cdn.example.com/vendor-main.css").is_allowed());
            assert!(!options.policy.decide("https://cdn.example.com/vendor.css").is_allowed());
            assert!(options.selector_filter.matches(".modal-open"));
        }

        #[test]
        fn test_bad_pattern() {
            let file = OptionsFile::default().merge(&[], &[], &["(".to_string()]);
            let err = file.to_options().unwrap_err();
            assert!(matches!(err, CliError::Critical(_)));
        }
    }
}
