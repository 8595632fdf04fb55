//! Stylesheet operations backed by lightningcss: selector collection, rule
//! extraction and minification.
//!
//! Selector strings are lightningcss' own serialization of each selector,
//! so the strings produced by [`collect_selectors`] compare equal to the
//! ones [`extract_rules`] computes for the same selector.

use std::collections::HashSet;

use lightningcss::printer::PrinterOptions;
use lightningcss::rules::{CssRule, CssRuleList};
use lightningcss::selector::Selector;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, StyleSheet};
use lightningcss::traits::ToCss;
use tracing::trace;

use crate::result::{CriticalError, CriticalResult};

/// Coverage text is stitched together from rule fragments, so stray tokens
/// are expected; invalid rules are dropped instead of failing the parse.
fn parser_options<'i>() -> ParserOptions<'i> {
    ParserOptions {
        error_recovery: true,
        ..ParserOptions::default()
    }
}

fn selector_text(selector: &Selector<'_>) -> Option<String> {
    selector
        .to_css_string(PrinterOptions::default())
        .ok()
        .map(|text| text.trim().to_string())
}

/// Collect the selectors of top-level style rules, in source order and
/// without duplicates. Rules nested in at-rules are not visited.
pub fn collect_selectors(css: &str) -> CriticalResult<Vec<String>> {
    let sheet = StyleSheet::parse(css, parser_options()).map_err(|e| CriticalError::Parse {
        message: e.to_string(),
    })?;

    let mut seen = HashSet::new();
    let mut selectors = Vec::new();
    for rule in &sheet.rules.0 {
        let CssRule::Style(style) = rule else {
            continue;
        };
        for selector in style.selectors.0.iter() {
            if let Some(text) = selector_text(selector) {
                if !text.is_empty() && seen.insert(text.clone()) {
                    selectors.push(text);
                }
            }
        }
    }

    trace!(count = selectors.len(), "collected selectors");
    Ok(selectors)
}

/// Keep only the style rules that have a selector in `critical`.
///
/// Non-critical selectors are pruned from kept rules. Grouping at-rules
/// (`@media`, `@supports`, `@layer` blocks, `@container`, `@starting-style`,
/// `@scope`, `@-moz-document`) are filtered recursively and dropped once
/// empty. At-rules without style rules inside (`@font-face`, `@keyframes`,
/// `@import`, `@layer a, b;`) are kept untouched.
pub fn extract_rules(css: &str, critical: &HashSet<String>) -> CriticalResult<String> {
    let mut sheet =
        StyleSheet::parse(css, parser_options()).map_err(|e| CriticalError::Extract {
            message: e.to_string(),
        })?;

    retain_rules(&mut sheet.rules, critical);

    let output = sheet
        .to_css(PrinterOptions::default())
        .map_err(|e| CriticalError::Extract {
            message: e.to_string(),
        })?;
    Ok(output.code)
}

fn retain_rules(rules: &mut CssRuleList<'_>, critical: &HashSet<String>) {
    rules.0.retain_mut(|rule| match rule {
        CssRule::Style(style) => {
            style
                .selectors
                .0
                .retain(|selector| selector_text(selector).is_some_and(|t| critical.contains(&t)));
            !style.selectors.0.is_empty()
        }
        CssRule::Media(media) => retain_block(&mut media.rules, critical),
        CssRule::Supports(supports) => retain_block(&mut supports.rules, critical),
        CssRule::LayerBlock(layer) => retain_block(&mut layer.rules, critical),
        CssRule::Container(container) => retain_block(&mut container.rules, critical),
        CssRule::StartingStyle(starting) => retain_block(&mut starting.rules, critical),
        CssRule::Scope(scope) => retain_block(&mut scope.rules, critical),
        CssRule::MozDocument(document) => retain_block(&mut document.rules, critical),
        _ => true,
    });
}

/// Filter a grouping rule's body; the block survives only if something is left
fn retain_block(rules: &mut CssRuleList<'_>, critical: &HashSet<String>) -> bool {
    retain_rules(rules, critical);
    !rules.0.is_empty()
}

/// Minify CSS text
pub fn minify(css: &str) -> CriticalResult<String> {
    let mut sheet = StyleSheet::parse(css, parser_options()).map_err(|e| CriticalError::Minify {
        message: e.to_string(),
    })?;

    sheet
        .minify(MinifyOptions::default())
        .map_err(|e| CriticalError::Minify {
            message: e.to_string(),
        })?;

    let output = sheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .map_err(|e| CriticalError::Minify {
            message: e.to_string(),
        })?;
    Ok(output.code)
}
