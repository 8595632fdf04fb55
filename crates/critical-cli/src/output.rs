//! Output: CSS to a file or stdout, status lines to stderr

use std::io::Write;
use std::path::Path;

use console::{style, Term};
use critical_css::CriticalReport;

use crate::error::CliResult;

/// Write CSS to `path`, or to stdout when no path is given
pub fn write_css(path: Option<&Path>, css: &str) -> CliResult<()> {
    match path {
        Some(path) => std::fs::write(path, css)?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(css.as_bytes())?;
            if !css.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
            stdout.flush()?;
        }
    }
    Ok(())
}

/// Status reporter writing to stderr
#[derive(Debug)]
pub struct Reporter {
    term: Term,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl Reporter {
    /// Create a new reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            use_color,
            quiet,
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("✓").green().bold().to_string()
        } else {
            "OK".to_string()
        };
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("⚠").yellow().bold().to_string()
        } else {
            "WARN".to_string()
        };
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a size report
    pub fn report(&self, report: &CriticalReport) {
        if self.quiet {
            return;
        }
        for line in report.summary().lines() {
            let line = if self.use_color && line.starts_with("====") {
                style(line).cyan().bold().to_string()
            } else {
                line.to_string()
            };
            let _ = self.term.write_line(&line);
        }
    }
}
