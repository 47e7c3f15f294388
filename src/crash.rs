//! Crash reports for handler failures swallowed by the executor

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// One failed handler invocation
#[derive(Debug, Clone, Serialize)]
pub struct CrashReport {
    /// Handler identity (function name)
    pub handler: String,

    /// Debug rendering of the argument tuple
    pub args: String,

    /// Error chain or panic message
    pub error: String,

    pub occurred_at: DateTime<Utc>,
}

impl CrashReport {
    pub fn new(
        handler: impl Into<String>,
        args: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            handler: handler.into(),
            args: args.into(),
            error: error.into(),
            occurred_at: Utc::now(),
        }
    }
}

/// Sink for crash reports.
///
/// Implementations must not fail or panic: they are called from the path
/// that exists to keep failures away from the caller.
pub trait CrashReporter: Send + Sync {
    fn record(&self, report: &CrashReport);
}

/// Emit crash reports as structured tracing events only
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl CrashReporter for TracingReporter {
    fn record(&self, report: &CrashReport) {
        tracing::error!(
            handler = %report.handler,
            args = %report.args,
            error = %report.error,
            occurred_at = %report.occurred_at.to_rfc3339(),
            "Crash report recorded"
        );
    }
}

/// Append crash reports to `<dir>/<handler>.txt`
#[derive(Debug, Clone)]
pub struct FileCrashReporter {
    dir: PathBuf,
}

impl FileCrashReporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the crash log for a handler; characters unsafe in file names become `_`
    pub fn log_path(&self, handler: &str) -> PathBuf {
        let file_name: String = handler
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.txt", file_name))
    }

    fn append(&self, report: &CrashReport) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.log_path(&report.handler))?;

        writeln!(
            file,
            "{} {}{}\n{}\n",
            report.occurred_at.format("%Y-%m-%d %H:%M:%S%.3f"),
            report.handler,
            report.args,
            report.error
        )
    }
}

impl CrashReporter for FileCrashReporter {
    fn record(&self, report: &CrashReport) {
        if let Err(e) = self.append(report) {
            tracing::warn!(
                handler = %report.handler,
                dir = %self.dir.display(),
                error = %e,
                "Failed to write crash log"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_path_sanitizes_handler() {
        let reporter = FileCrashReporter::new("/tmp/crash");
        assert_eq!(
            reporter.log_path("vk::poll_updates"),
            PathBuf::from("/tmp/crash/vk__poll_updates.txt")
        );
        assert_eq!(
            reporter.log_path("send-message"),
            PathBuf::from("/tmp/crash/send-message.txt")
        );
    }

    #[test]
    fn test_file_reporter_appends() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = FileCrashReporter::new(dir.path().join("crash"));

        reporter.record(&CrashReport::new("poll", "(1, \"a\")", "boom"));
        reporter.record(&CrashReport::new("poll", "(2, \"b\")", "bang"));

        let content = fs::read_to_string(reporter.log_path("poll")).unwrap();
        assert!(content.contains("poll(1, \"a\")"));
        assert!(content.contains("boom"));
        assert!(content.contains("poll(2, \"b\")"));
        assert!(content.contains("bang"));
    }

    #[test]
    fn test_file_reporter_swallows_io_errors() {
        let dir = tempfile::tempdir().unwrap();
        // a regular file where the directory should be
        let blocker = dir.path().join("blocked");
        fs::write(&blocker, "x").unwrap();

        let reporter = FileCrashReporter::new(&blocker);
        reporter.record(&CrashReport::new("poll", "()", "boom"));
    }

    #[test]
    fn test_report_serializes() {
        let report = CrashReport::new("poll", "()", "boom");
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["handler"], "poll");
        assert_eq!(value["error"], "boom");
        assert_eq!(
            value["occurred_at"],
            serde_json::to_value(report.occurred_at).unwrap()
        );
        assert!(value["occurred_at"].is_string());
    }
}
