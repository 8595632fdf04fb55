//! CSS coverage entries and their normalization into CSS text.
//!
//! A coverage entry is one stylesheet as seen by the browser: its URL, its
//! full text and the ranges of that text that were used while the page
//! rendered. Offsets are UTF-16 code units, the unit DevTools reports.
//!
//! ## Usage
//!
//! ```ignore
//! let entry = CoverageEntry::new("https://example.com/main.css", text)
//!     .with_range(0, 42);
//! let url = entry.parse_url()?;
//! let css = normalize_entry(&entry, &url);
//! ```

use serde::{Deserialize, Serialize};
use url::Url;

use crate::result::{CriticalError, CriticalResult};

/// A used range within a stylesheet's text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageRange {
    /// Start offset (inclusive)
    pub start: usize,
    /// End offset (exclusive)
    pub end: usize,
}

impl CoverageRange {
    /// Create a new range
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Coverage data for a single stylesheet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageEntry {
    /// Stylesheet URL
    pub url: String,
    /// Full stylesheet text
    #[serde(default)]
    pub text: String,
    /// Used ranges, ascending and non-overlapping
    #[serde(default)]
    pub ranges: Vec<CoverageRange>,
}

/// One rule usage record as reported by rule usage tracking
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleUsage {
    /// Start offset of the rule
    pub start: f64,
    /// End offset of the rule
    pub end: f64,
    /// Whether the rule applied to anything
    pub used: bool,
}

impl CoverageEntry {
    /// Create an entry without ranges
    #[must_use]
    pub fn new(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            text: text.into(),
            ranges: Vec::new(),
        }
    }

    /// Add a used range
    #[must_use]
    pub fn with_range(mut self, start: usize, end: usize) -> Self {
        self.ranges.push(CoverageRange::new(start, end));
        self
    }

    /// Build an entry from rule usage records, merging used rules into
    /// sorted disjoint ranges. Unused rules are dropped.
    #[must_use]
    pub fn from_rule_usage(
        url: impl Into<String>,
        text: impl Into<String>,
        usages: &[RuleUsage],
    ) -> Self {
        let mut used: Vec<CoverageRange> = usages
            .iter()
            .filter(|u| u.used && u.end > u.start)
            .map(|u| CoverageRange::new(u.start as usize, u.end as usize))
            .collect();
        used.sort_by_key(|r| (r.start, r.end));

        let mut ranges: Vec<CoverageRange> = Vec::with_capacity(used.len());
        for range in used {
            match ranges.last_mut() {
                Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
                _ => ranges.push(range),
            }
        }

        Self {
            url: url.into(),
            text: text.into(),
            ranges,
        }
    }

    /// Parse the entry URL. A malformed URL cannot be recovered from.
    pub fn parse_url(&self) -> CriticalResult<Url> {
        Url::parse(&self.url).map_err(|e| CriticalError::InvalidUrl {
            url: self.url.clone(),
            message: e.to_string(),
        })
    }

    /// Number of UTF-16 units covered by the ranges
    #[must_use]
    pub fn used_len(&self) -> usize {
        self.ranges
            .iter()
            .map(|r| r.end.saturating_sub(r.start))
            .sum()
    }
}

/// Load coverage entries from a JSON array
pub fn parse_coverage_json(json: &str) -> CriticalResult<Vec<CoverageEntry>> {
    Ok(serde_json::from_str(json)?)
}

/// Turn one coverage entry into a CSS fragment.
///
/// With ranges, every non-blank range is emitted on its own line with its
/// `url(...)` references resolved against `url`. Without ranges the whole
/// text is passed through untouched.
#[must_use]
pub fn normalize_entry(entry: &CoverageEntry, url: &Url) -> String {
    if entry.ranges.is_empty() {
        return entry.text.clone();
    }

    let mut cursor = Utf16Cursor::new(&entry.text);
    let mut css = String::new();
    for range in &entry.ranges {
        let slice = cursor.slice(range.start, range.end);
        if slice.trim().is_empty() {
            continue;
        }
        css.push('\n');
        css.push_str(&absolutize_urls(slice, url));
    }
    css
}

/// Slice `text` by UTF-16 offsets, clamping and ordering them the way a
/// JavaScript `substring` does.
#[must_use]
pub fn substring(text: &str, start: usize, end: usize) -> &str {
    Utf16Cursor::new(text).slice(start, end)
}

/// Maps UTF-16 offsets to byte offsets in one forward pass.
///
/// Lookups with ascending offsets resume where the previous one stopped; an
/// offset behind the cursor restarts the walk from the beginning.
#[derive(Debug)]
struct Utf16Cursor<'a> {
    text: &'a str,
    ascii: bool,
    units: usize,
    byte: usize,
}

impl<'a> Utf16Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            ascii: text.is_ascii(),
            units: 0,
            byte: 0,
        }
    }

    fn slice(&mut self, start: usize, end: usize) -> &'a str {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        let from = self.byte_offset(start);
        let to = self.byte_offset(end);
        &self.text[from..to]
    }

    /// Byte index of the first char boundary at or past `offset` units
    fn byte_offset(&mut self, offset: usize) -> usize {
        if self.ascii {
            return offset.min(self.text.len());
        }
        if offset < self.units {
            self.units = 0;
            self.byte = 0;
        }
        for ch in self.text[self.byte..].chars() {
            if self.units >= offset {
                break;
            }
            self.units += ch.len_utf16();
            self.byte += ch.len_utf8();
        }
        self.byte
    }
}

/// Rewrite relative `url(...)` references in `css` to absolute URLs
/// resolved against `base`. Quoting is preserved; absolute, `data:` and
/// fragment-only references are left as they are.
#[must_use]
pub fn absolutize_urls(css: &str, base: &Url) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;

    while let Some(pos) = find_url_function(rest) {
        let (head, tail) = rest.split_at(pos + 4);
        out.push_str(head);

        match UrlReference::split(tail) {
            Some(reference) => {
                out.push_str(reference.leading);
                out.push_str(reference.quote);
                match resolve_reference(reference.value, base) {
                    Some(resolved) => out.push_str(&resolved),
                    None => out.push_str(reference.value),
                }
                out.push_str(reference.quote);
                out.push_str(reference.trailing);
                rest = &tail[reference.consumed..];
            }
            None => rest = tail,
        }
    }

    out.push_str(rest);
    out
}

/// Byte position of the next `url(` that starts a function token
fn find_url_function(css: &str) -> Option<usize> {
    let bytes = css.as_bytes();
    bytes
        .windows(4)
        .enumerate()
        .filter(|(_, w)| w.eq_ignore_ascii_case(b"url("))
        .map(|(i, _)| i)
        .find(|&i| i == 0 || !is_ident_byte(bytes[i - 1]))
}

const fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

/// The argument of a `url(` function, split into its parts
struct UrlReference<'a> {
    leading: &'a str,
    quote: &'a str,
    value: &'a str,
    trailing: &'a str,
    consumed: usize,
}

impl<'a> UrlReference<'a> {
    fn split(tail: &'a str) -> Option<Self> {
        let body = tail.trim_start();
        let lead = tail.len() - body.len();
        let first = body.chars().next()?;

        if first == '\'' || first == '"' {
            let close = body[1..].find(first)?;
            Some(Self {
                leading: &tail[..lead],
                quote: &body[..1],
                value: &body[1..=close],
                trailing: "",
                consumed: lead + close + 2,
            })
        } else {
            let close = body.find(')')?;
            let value = body[..close].trim_end();
            Some(Self {
                leading: &tail[..lead],
                quote: "",
                value,
                trailing: &body[value.len()..close],
                consumed: lead + close,
            })
        }
    }
}

fn resolve_reference(value: &str, base: &Url) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    match Url::parse(trimmed) {
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            base.join(trimmed).ok().map(|u| u.as_str().to_owned())
        }
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/assets/css/main.css").unwrap()
    }

    mod normalize_tests {
        use super::*;

        #[test]
        fn test_ranges_emit_only_used_text() {
            let text = "abcde12345fghij67890";
            let entry = CoverageEntry::new("https://example.com/a.css", text)
                .with_range(0, 5)
                .with_range(10, 15);
            let css = normalize_entry(&entry, &base());
            assert_eq!(css, "\nabcde\nfghij");
        }

        #[test]
        fn test_empty_ranges_pass_text_through() {
            let text = ".a { background: url('/x.png') }";
            let entry = CoverageEntry::new("https://example.com/a.css", text);
            assert_eq!(normalize_entry(&entry, &base()), text);
        }

        #[test]
        fn test_blank_ranges_are_skipped() {
            let text = ".a{color:red}   \n  .b{color:blue}";
            let entry = CoverageEntry::new("https://example.com/a.css", text)
                .with_range(0, 13)
                .with_range(13, 19)
                .with_range(19, 33);
            let css = normalize_entry(&entry, &base());
            assert_eq!(css, "\n.a{color:red}\n.b{color:blue}");
        }

        #[test]
        fn test_ranges_are_clamped() {
            let entry = CoverageEntry::new("https://example.com/a.css", ".a{}").with_range(0, 99);
            assert_eq!(normalize_entry(&entry, &base()), "\n.a{}");
        }

        #[test]
        fn test_url_rewritten_with_origin() {
            let text = ".hero{background:url('/img.png')}";
            let entry = CoverageEntry::new("https://example.com/a.css", text)
                .with_range(0, text.len());
            let url = Url::parse("https://example.com/a.css").unwrap();
            let css = normalize_entry(&entry, &url);
            assert!(css.contains("url('https://example.com/img.png'"));
        }
    }

    mod substring_tests {
        use super::*;

        #[test]
        fn test_swapped_bounds() {
            assert_eq!(substring("abcdef", 4, 1), "bcd");
        }

        #[test]
        fn test_utf16_offsets() {
            // "é" is one UTF-16 unit but two bytes
            let text = "é.a{}";
            assert_eq!(substring(text, 1, 5), ".a{}");
        }

        #[test]
        fn test_surrogate_pairs() {
            let text = "/*😀*/.b{}";
            // comment is 6 UTF-16 units
            assert_eq!(substring(text, 6, 10), ".b{}");
        }
    }

    mod cursor_tests {
        use super::*;

        #[test]
        fn test_many_ranges_over_non_ascii_text() {
            let mut text = String::from("/* © 2024 → */");
            let mut units = text.encode_utf16().count();
            let mut expected = String::new();
            let mut entry_ranges = Vec::new();
            for i in 0..5_000 {
                let rule = format!(".r{i}{{content:\"…\"}}");
                let start = units;
                units += rule.encode_utf16().count();
                let end = units;
                text.push_str(&rule);
                if i % 2 == 0 {
                    entry_ranges.push((start, end));
                    expected.push('\n');
                    expected.push_str(&rule);
                }
            }
            let mut entry = CoverageEntry::new("https://example.com/a.css", text);
            for (start, end) in entry_ranges {
                entry = entry.with_range(start, end);
            }
            assert_eq!(normalize_entry(&entry, &base()), expected);
        }

        #[test]
        fn test_backwards_range_rescans() {
            let text = "é.a{}ü.b{}";
            let entry = CoverageEntry::new("https://example.com/a.css", text)
                .with_range(6, 10)
                .with_range(1, 5);
            assert_eq!(normalize_entry(&entry, &base()), "\n.b{}\n.a{}");
        }

        #[test]
        fn test_offset_inside_surrogate_pair_rounds_up() {
            let mut cursor = Utf16Cursor::new("😀.a{}");
            assert_eq!(cursor.byte_offset(1), 4);
            assert_eq!(cursor.byte_offset(2), 4);
            assert_eq!(cursor.byte_offset(99), "😀.a{}".len());
        }
    }

    mod url_tests {
        use super::*;

        #[test]
        fn test_root_relative() {
            let css = absolutize_urls("a{b:url('/img/x.png')}", &base());
            assert_eq!(css, "a{b:url('https://example.com/img/x.png')}");
        }

        #[test]
        fn test_document_relative_resolves_against_sheet() {
            let css = absolutize_urls("a{b:url(\"../fonts/f.woff2\")}", &base());
            assert_eq!(css, "a{b:url(\"https://example.com/assets/fonts/f.woff2\")}");
        }

        #[test]
        fn test_unquoted() {
            let css = absolutize_urls("a{b:url( x.png )}", &base());
            assert_eq!(css, "a{b:url( https://example.com/assets/css/x.png )}");
        }

        #[test]
        fn test_unquoted_whitespace_kept_when_untouched() {
            let input = "a{b:url( https://other.org/x.png\t)}c{filter:url( #f )}";
            assert_eq!(absolutize_urls(input, &base()), input);
        }

        #[test]
        fn test_protocol_relative() {
            let css = absolutize_urls("a{b:url('//cdn.example.net/x.png')}", &base());
            assert_eq!(css, "a{b:url('https://cdn.example.net/x.png')}");
        }

        #[test]
        fn test_absolute_and_data_untouched() {
            let input = "a{b:url('https://other.org/x.png');c:url(data:image/png;base64,AA==)}";
            assert_eq!(absolutize_urls(input, &base()), input);
        }

        #[test]
        fn test_fragment_untouched() {
            let input = "a{filter:url(#blur)}";
            assert_eq!(absolutize_urls(input, &base()), input);
        }

        #[test]
        fn test_multiple_references() {
            let css = absolutize_urls("a{b:url('/1.png')}c{d:url('/2.png')}", &base());
            assert_eq!(
                css,
                "a{b:url('https://example.com/1.png')}c{d:url('https://example.com/2.png')}"
            );
        }

        #[test]
        fn test_ident_prefix_is_not_a_url_function() {
            let input = "a{--myurl('/x')}";
            assert_eq!(absolutize_urls(input, &base()), input);
        }

        #[test]
        fn test_unterminated_is_left_alone() {
            let input = "a{b:url('/x.png";
            assert_eq!(absolutize_urls(input, &base()), input);
        }
    }

    mod entry_tests {
        use super::*;

        #[test]
        fn test_parse_url_error() {
            let entry = CoverageEntry::new("::nope::", "");
            let err = entry.parse_url().unwrap_err();
            assert!(matches!(err, CriticalError::InvalidUrl { .. }));
        }

        #[test]
        fn test_from_rule_usage_merges() {
            let usages = [
                RuleUsage { start: 20.0, end: 30.0, used: true },
                RuleUsage { start: 0.0, end: 10.0, used: true },
                RuleUsage { start: 10.0, end: 15.0, used: true },
                RuleUsage { start: 15.0, end: 20.0, used: false },
                RuleUsage { start: 25.0, end: 40.0, used: true },
            ];
            let entry = CoverageEntry::from_rule_usage("https://x/a.css", "", &usages);
            assert_eq!(
                entry.ranges,
                vec![CoverageRange::new(0, 15), CoverageRange::new(20, 40)]
            );
            assert_eq!(entry.used_len(), 35);
        }

        #[test]
        fn test_parse_coverage_json() {
            let json = r#"[
                {"url": "https://example.com/a.css", "text": ".a{}", "ranges": [{"start": 0, "end": 4}]},
                {"url": "https://example.com/b.css", "text": ".b{}"}
            ]"#;
            let entries = parse_coverage_json(json).unwrap();
            assert_eq!(entries.len(), 2);
            assert_eq!(entries[0].ranges, vec![CoverageRange::new(0, 4)]);
            assert!(entries[1].ranges.is_empty());
        }
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_blank_ranges_contribute_nothing(ws in "[ \t\n]{0,16}") {
                let entry = CoverageEntry::new("https://example.com/a.css", ws.clone())
                    .with_range(0, ws.len());
                prop_assert_eq!(normalize_entry(&entry, &base()), "");
            }

            #[test]
            fn prop_output_is_made_of_ranges(text in "[a-z{}:;.]{1,64}", cut in 0usize..64) {
                let cut = cut.min(text.len());
                let entry = CoverageEntry::new("https://example.com/a.css", text.clone())
                    .with_range(0, cut);
                let css = normalize_entry(&entry, &base());
                if cut == 0 {
                    prop_assert!(css.is_empty());
                } else {
                    let expected = format!("\n{}", &text[..cut]);
                    prop_assert_eq!(css, expected);
                }
            }
        }
    }
}
