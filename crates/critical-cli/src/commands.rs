//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// critical: extract the CSS needed to render the first viewport
#[derive(Parser, Debug)]
#[command(name = "critical")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Concatenate used CSS from a saved coverage file
    Extract(ExtractArgs),

    /// Load a page in Chromium and reduce its CSS to the viewport
    Page(PageArgs),
}

/// Options shared by every command that produces CSS
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Keep stylesheets whose URL contains this text (repeatable)
    #[arg(long = "include", value_name = "TEXT")]
    pub include: Vec<String>,

    /// Drop stylesheets whose URL contains this text (repeatable)
    #[arg(long = "exclude", value_name = "TEXT")]
    pub exclude: Vec<String>,

    /// Keep selectors matching this regular expression (repeatable).
    /// Only `page` matches selectors; `extract` warns and ignores it
    #[arg(long = "selector-filter", value_name = "REGEX")]
    pub selector_filter: Vec<String>,

    /// YAML options file; command-line values are added to it
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Arguments for the extract command
#[derive(Parser, Debug)]
pub struct ExtractArgs {
    /// Coverage JSON: an array of `{url, text, ranges}` entries
    #[arg(long, value_name = "FILE")]
    pub coverage: PathBuf,

    /// Write CSS to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print a size report to stderr
    #[arg(long)]
    pub report: bool,

    #[command(flatten)]
    pub filters: FilterArgs,
}

/// Arguments for the page command
#[derive(Parser, Debug)]
#[allow(clippy::struct_excessive_bools)]
pub struct PageArgs {
    /// Page to load
    pub url: String,

    /// Write CSS to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Viewport width
    #[arg(long)]
    pub width: Option<u32>,

    /// Viewport height
    #[arg(long)]
    pub height: Option<u32>,

    /// Path to the Chromium binary
    #[arg(long, value_name = "PATH")]
    pub chromium: Option<String>,

    /// Disable the Chromium sandbox (containers/CI)
    #[arg(long)]
    pub no_sandbox: bool,

    /// Show the browser window
    #[arg(long)]
    pub headful: bool,

    /// Also save the collected coverage as JSON
    #[arg(long, value_name = "FILE")]
    pub save_coverage: Option<PathBuf>,

    /// Print a size report to stderr
    #[arg(long)]
    pub report: bool,

    #[command(flatten)]
    pub filters: FilterArgs,
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
