//! Extract command handler: saved coverage in, concatenated CSS out

use critical_css::{
    accumulate, format_bytes, parse_coverage_json, CriticalOptions, CriticalReport,
};
use tracing::info;

use crate::commands::ExtractArgs;
use crate::config::CliConfig;
use crate::error::CliResult;
use crate::handlers::load_options;
use crate::output::{write_css, Reporter};

/// Execute the extract command
pub fn execute_extract(config: &CliConfig, args: &ExtractArgs) -> CliResult<()> {
    let options = load_options(&args.filters)?.to_options()?;
    let reporter = Reporter::new(config.color.should_color(), config.verbosity.is_quiet());
    if let Some(message) = ignored_filter_warning(&options) {
        reporter.warning(&message);
    }

    let json = std::fs::read_to_string(&args.coverage)?;
    info!(path = %args.coverage.display(), "loaded coverage");

    let coverage = parse_coverage_json(&json)?;
    let css = accumulate(&coverage, &options)?;
    write_css(args.output.as_deref(), &css)?;

    if config.verbosity.is_verbose() {
        reporter.success(&format!(
            "Extracted {} of {} stylesheets ({})",
            coverage
                .iter()
                .filter(|entry| options.policy.decide(&entry.url).is_allowed())
                .count(),
            coverage.len(),
            format_bytes(css.len())
        ));
    }
    if let Some(ref output) = args.output {
        reporter.success(&format!("Critical CSS written to {}", output.display()));
    }
    if args.report {
        reporter.report(&CriticalReport::new(&css, None));
    }
    Ok(())
}

/// Selector filters only act on rules matched against a live page
pub fn ignored_filter_warning(options: &CriticalOptions) -> Option<String> {
    if options.selector_filter.is_empty() {
        return None;
    }
    let patterns: Vec<&str> = options.selector_filter.sources().collect();
    Some(format!(
        "--selector-filter has no effect without a page, ignoring: {}",
        patterns.join(", ")
    ))
}

/// Concatenate the used CSS of a coverage JSON document
pub fn extract_from_json(json: &str, options: &CriticalOptions) -> CliResult<String> {
    let coverage = parse_coverage_json(json)?;
    Ok(accumulate(&coverage, options)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use critical_css::SelectorFilter;

    const COVERAGE: &str = r#"[
        {"url": "https://example.com/css/site.css",
         "text": ".hero { background: url(../img/bg.png) } .unused { color: red }",
         "ranges": [{"start": 0, "end": 41}]},
        {"url": "https://ads.example.net/ads.css", "text": ".ad { color: pink }", "ranges": []}
    ]"#;

    #[test]
    fn test_extract_ranges_and_urls() {
        let css = extract_from_json(COVERAGE, &CriticalOptions::new()).unwrap();
        assert!(css.starts_with("\n.hero { background: url(https://example.com/img/bg.png) }"));
        assert!(!css.contains(".unused"));
        assert!(css.ends_with(".ad { color: pink }"));
    }

    #[test]
    fn test_extract_with_exclude() {
        let options = CriticalOptions::new().with_exclude("ads.example.net");
        let css = extract_from_json(COVERAGE, &options).unwrap();
        assert!(!css.contains(".ad"));
    }

    #[test]
    fn test_no_warning_without_filters() {
        assert!(ignored_filter_warning(&CriticalOptions::new()).is_none());
    }

    #[test]
    fn test_warning_lists_ignored_filters() {
        let filter = SelectorFilter::from_patterns([":hover$", "^\\.modal"]).unwrap();
        let options = CriticalOptions::new().with_selector_filter(filter);
        let message = ignored_filter_warning(&options).unwrap();
        assert!(message.contains("--selector-filter"));
        assert!(message.ends_with(":hover$, ^\\.modal"));
    }

    #[test]
    fn test_filters_do_not_change_extracted_css() {
        let filter = SelectorFilter::from_patterns(["^\\.unused"]).unwrap();
        let options = CriticalOptions::new().with_selector_filter(filter);
        let filtered = extract_from_json(COVERAGE, &options).unwrap();
        let plain = extract_from_json(COVERAGE, &CriticalOptions::new()).unwrap();
        assert_eq!(filtered, plain);
    }

    #[test]
    fn test_extract_invalid_json() {
        let err = extract_from_json("{not json", &CriticalOptions::new()).unwrap_err();
        assert!(matches!(err, CliError::Critical(_)));
    }
}
