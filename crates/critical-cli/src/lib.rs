//! critical CLI library
//!
//! Command-line front end for `critical-css`: reduce saved coverage or a
//! live page to its critical CSS.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::format_push_string)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
pub mod handlers;
mod output;

pub use commands::{Cli, ColorArg, Commands, ExtractArgs, FilterArgs, PageArgs};
pub use config::{CliConfig, ColorChoice, OptionsFile, Verbosity, ViewportSize};
pub use error::{CliError, CliResult};
pub use output::{write_css, Reporter};
