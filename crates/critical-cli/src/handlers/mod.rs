//! Command handlers - extracted from main.rs for testability

pub mod extract;
pub mod page;

use crate::commands::FilterArgs;
use crate::config::OptionsFile;
use crate::error::CliResult;

pub use extract::{execute_extract, extract_from_json};
pub use page::execute_page;

/// Load the options file named by `--config`, if any, and add the
/// command-line filters to it
pub fn load_options(filters: &FilterArgs) -> CliResult<OptionsFile> {
    let file = match filters.config {
        Some(ref path) => OptionsFile::load(path)?,
        None => OptionsFile::default(),
    };
    Ok(file.merge(&filters.include, &filters.exclude, &filters.selector_filter))
}
