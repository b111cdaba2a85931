//! Status lines collected by the smoke tests.

use std::fmt;

use console::style;
use tracing::{debug, error, info, Level};

/// Outcome of one smoke-test step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Fail,
    Info,
}

impl CheckStatus {
    fn marker(&self) -> &'static str {
        match self {
            CheckStatus::Pass => "✅",
            CheckStatus::Fail => "❌",
            CheckStatus::Info => "ℹ️ ",
        }
    }
}

/// One human-readable status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    pub status: CheckStatus,
    pub message: String,
}

impl fmt::Display for ReportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status.marker(), self.message)
    }
}

/// Ordered log of a smoke-test run.
#[derive(Debug, Clone)]
pub struct SmokeReport {
    title: String,
    lines: Vec<ReportLine>,
    echo: bool,
}

impl SmokeReport {
    /// A report that prints each line to stdout as it is recorded.
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            lines: Vec::new(),
            echo: true,
        }
    }

    /// A report that only records lines.
    pub fn quiet(title: &str) -> Self {
        Self {
            echo: false,
            ..Self::new(title)
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn pass(&mut self, message: impl Into<String>) {
        self.record(CheckStatus::Pass, message.into());
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.record(CheckStatus::Fail, message.into());
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.record(CheckStatus::Info, message.into());
    }

    /// Level a line is logged at. Echoed lines are already on stdout, so
    /// their log copy stays at debug.
    fn log_level(&self, status: CheckStatus) -> Level {
        match (self.echo, status) {
            (true, _) | (false, CheckStatus::Info) => Level::DEBUG,
            (false, CheckStatus::Pass) => Level::INFO,
            (false, CheckStatus::Fail) => Level::ERROR,
        }
    }

    fn record(&mut self, status: CheckStatus, message: String) {
        let level = self.log_level(status);
        if level == Level::ERROR {
            error!(report = %self.title, "{}", message);
        } else if level == Level::INFO {
            info!(report = %self.title, "{}", message);
        } else {
            debug!(report = %self.title, "{}", message);
        }

        let line = ReportLine { status, message };
        if self.echo {
            let text = match status {
                CheckStatus::Pass => style(line.to_string()).green(),
                CheckStatus::Fail => style(line.to_string()).red(),
                CheckStatus::Info => style(line.to_string()).dim(),
            };
            println!("{}", text);
        }
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[ReportLine] {
        &self.lines
    }

    /// Number of failed steps.
    pub fn failures(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| l.status == CheckStatus::Fail)
            .count()
    }

    /// True when no step failed.
    pub fn is_success(&self) -> bool {
        self.failures() == 0
    }

    /// Whether a line with `status` contains `needle`.
    pub fn has(&self, status: CheckStatus, needle: &str) -> bool {
        self.lines
            .iter()
            .any(|l| l.status == status && l.message.contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_tracks_failures() {
        let mut report = SmokeReport::quiet("test");
        report.info("starting");
        report.pass("step one");
        assert!(report.is_success());

        report.fail("step two");
        assert!(!report.is_success());
        assert_eq!(report.failures(), 1);
        assert_eq!(report.lines().len(), 3);
        assert!(report.has(CheckStatus::Fail, "two"));
        assert!(!report.has(CheckStatus::Pass, "two"));
    }

    #[test]
    fn test_echoed_lines_are_logged_at_debug_only() {
        let echoed = SmokeReport::new("echoed");
        for status in [CheckStatus::Pass, CheckStatus::Fail, CheckStatus::Info] {
            assert_eq!(echoed.log_level(status), Level::DEBUG);
        }

        let quiet = SmokeReport::quiet("quiet");
        assert_eq!(quiet.log_level(CheckStatus::Pass), Level::INFO);
        assert_eq!(quiet.log_level(CheckStatus::Fail), Level::ERROR);
        assert_eq!(quiet.log_level(CheckStatus::Info), Level::DEBUG);
        assert_eq!(quiet.title(), "quiet");
    }

    #[test]
    fn test_line_display_has_marker() {
        let line = ReportLine {
            status: CheckStatus::Fail,
            message: "boom".to_string(),
        };
        assert_eq!(line.to_string(), "❌ boom");
    }
}
