//! Page command handler: load a URL, collect coverage, reduce to the
//! viewport

use critical_css::BrowserConfig;

use crate::commands::PageArgs;
use crate::config::{CliConfig, OptionsFile};
use crate::error::{CliError, CliResult};
use crate::handlers::load_options;

/// Browser settings from the options file, then the command line
pub fn browser_config(file: &OptionsFile, args: &PageArgs) -> BrowserConfig {
    let mut config = BrowserConfig::default().with_headless(!args.headful);
    if let Some(viewport) = file.viewport {
        config = config.with_viewport(viewport.width, viewport.height);
    }
    let width = args.width.unwrap_or(config.viewport_width);
    let height = args.height.unwrap_or(config.viewport_height);
    config = config.with_viewport(width, height);
    if let Some(ref path) = args.chromium {
        config = config.with_chromium_path(path);
    }
    if args.no_sandbox {
        config = config.with_no_sandbox();
    }
    config
}

/// Execute the page command
#[cfg(feature = "browser")]
pub fn execute_page(config: &CliConfig, args: &PageArgs) -> CliResult<()> {
    use critical_css::{critical_css, Browser, CriticalReport};
    use tracing::info;

    use crate::output::{write_css, Reporter};

    let file = load_options(&args.filters)?;
    let options = file.to_options()?;
    let browser_config = browser_config(&file, args);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::runtime(format!("Failed to create runtime: {e}")))?;

    let (css, resources, coverage) = rt.block_on(async {
        let browser = Browser::launch(browser_config).await?;
        let page = browser.new_page().await?;

        let coverage = page.collect_css_coverage(&args.url).await?;
        let resources = page.resource_sizes().await?;
        let css = critical_css(&coverage, &options, Some(&page)).await?;

        browser.close().await?;
        Ok::<_, CliError>((css, resources, coverage))
    })?;
    info!(url = %args.url, bytes = css.len(), "page reduced");

    if let Some(ref path) = args.save_coverage {
        std::fs::write(path, serde_json::to_string_pretty(&coverage)?)?;
        info!(path = %path.display(), "coverage saved");
    }
    write_css(args.output.as_deref(), &css)?;

    let reporter = Reporter::new(config.color.should_color(), config.verbosity.is_quiet());
    if let Some(ref output) = args.output {
        reporter.success(&format!("Critical CSS written to {}", output.display()));
    }
    if args.report {
        reporter.report(&CriticalReport::new(&css, Some(resources)));
    }
    Ok(())
}

/// Execute the page command
#[cfg(not(feature = "browser"))]
pub fn execute_page(_config: &CliConfig, args: &PageArgs) -> CliResult<()> {
    load_options(&args.filters)?.to_options()?;
    Err(CliError::invalid_argument(format!(
        "cannot load {}: browser support not enabled. Rebuild with --features browser",
        args.url
    )))
}
