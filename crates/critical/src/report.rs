//! Page weight report: resource transfer sizes from the browser's
//! performance timeline next to the size of the critical CSS.

use serde::{Deserialize, Serialize};

/// Binary size units used by [`format_bytes`]
const UNITS: [&str; 9] = ["Bytes", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// A performance timeline entry, as serialized by `performance.getEntries()`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceEntry {
    /// Entry name (usually a URL)
    #[serde(default)]
    pub name: String,
    /// Entry type (`navigation`, `resource`, `paint`, ...)
    #[serde(default)]
    pub entry_type: String,
    /// What started the request (`css`, `script`, `img`, ...)
    #[serde(default)]
    pub initiator_type: Option<String>,
    /// Bytes transferred over the network
    #[serde(default)]
    pub transfer_size: Option<f64>,
    /// Duration in milliseconds
    #[serde(default)]
    pub duration: f64,
}

/// Aggregated transfer sizes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceSizes {
    /// Bytes transferred for every resource
    pub total_size: f64,
    /// Bytes transferred for resources initiated by CSS
    pub css_size: f64,
    /// Duration of the first timeline entry (the document)
    pub dom_duration: f64,
}

impl ResourceSizes {
    /// Sum transfer sizes over performance entries
    #[must_use]
    pub fn from_entries(entries: &[PerformanceEntry]) -> Self {
        let mut sizes = Self {
            dom_duration: entries.first().map_or(0.0, |e| e.duration),
            ..Self::default()
        };
        for entry in entries {
            let size = entry.transfer_size.unwrap_or(0.0);
            if size <= 0.0 {
                continue;
            }
            if entry.initiator_type.as_deref() == Some("css") {
                sizes.css_size += size;
            }
            sizes.total_size += size;
        }
        sizes
    }

    /// Parse the JSON string of `performance.getEntries()`
    pub fn from_json(json: &str) -> crate::CriticalResult<Self> {
        let entries: Vec<PerformanceEntry> = serde_json::from_str(json)?;
        Ok(Self::from_entries(&entries))
    }
}

/// Format a byte count with binary units and at most two decimals,
/// trailing zeros dropped: `1536` -> `"1.5 KB"`.
#[must_use]
pub fn format_bytes(bytes: usize) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let bytes = bytes as f64;
    let exponent = (bytes.ln() / 1024f64.ln()).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);
    let value = bytes / 1024f64.powi(exponent as i32);

    let mut number = format!("{value:.2}");
    if number.contains('.') {
        number = number.trim_end_matches('0').trim_end_matches('.').to_string();
    }
    format!("{number} {}", UNITS[exponent])
}

/// Summary lines for a finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalReport {
    /// Resource sizes, when a page was loaded
    pub resources: Option<ResourceSizes>,
    /// Bytes of critical CSS produced
    pub critical_bytes: usize,
}

impl CriticalReport {
    /// Create a report for `css`
    #[must_use]
    pub fn new(css: &str, resources: Option<ResourceSizes>) -> Self {
        Self {
            resources,
            critical_bytes: css.len(),
        }
    }

    /// Render the report as plain text
    #[must_use]
    pub fn summary(&self) -> String {
        let mut s = String::new();
        if let Some(ref resources) = self.resources {
            s.push_str("==== DOM Duration ====\n");
            s.push_str(&format!("{}\n", resources.dom_duration));
            s.push_str("==== Resources size ====\n");
            s.push_str(&format!("Total Size: {}KB\n", resources.total_size / 1000.0));
            s.push_str(&format!("CSS Size: {}KB\n", resources.css_size / 1000.0));
        }
        s.push_str(&format!(
            "Viewport Critical CSS: {}\n",
            format_bytes(self.critical_bytes)
        ));
        s
    }
}
