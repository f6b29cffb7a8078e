//! Test runner for test sets.
//!
//! The runner walks a [`TestSet`], skips specs that report themselves invalid
//! or do not match the name filter, runs the rest and writes two logs:
//!
//! - the test log: output of failed tests (and of passed tests when
//!   [`RunConfig::log_passed`] is set) followed by a status line per test;
//! - the summary log: counts per test-path group, then totals.
//!
//! Both logs also receive the group headers and UTC start/finish stamps.

use crate::config::RunConfig;
use crate::result::{HexlError, HexlResult};
use crate::suite::{join_path, TestSet, TestSpec, TestStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Test counts by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TestStats {
    /// Passed tests
    pub passed: usize,
    /// Failed tests
    pub failed: usize,
    /// Tests that could not be carried out
    pub error: usize,
    /// Tests that do not apply
    pub na: usize,
}

impl TestStats {
    /// Count one result
    pub fn record(&mut self, status: TestStatus) {
        match status {
            TestStatus::Passed => self.passed += 1,
            TestStatus::Failed => self.failed += 1,
            TestStatus::Error => self.error += 1,
            TestStatus::NotApplicable => self.na += 1,
        }
    }

    /// Total tests counted
    #[must_use]
    pub const fn total(&self) -> usize {
        self.passed + self.failed + self.error + self.na
    }

    /// Whether no test failed or errored
    #[must_use]
    pub const fn all_passed(&self) -> bool {
        self.failed == 0 && self.error == 0
    }

    /// Reset all counts
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Display for TestStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total: {}  Passed: {}  Failed: {}  Error: {}  NA: {}",
            self.total(),
            self.passed,
            self.failed,
            self.error,
            self.na
        )
    }
}

/// Result of one executed test
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestRecord {
    /// Full test name, set path included
    pub name: String,
    /// Final status
    pub status: TestStatus,
    /// Wall-clock duration in seconds
    pub seconds: f64,
    /// Diagnostic output
    #[serde(skip_serializing_if = "String::is_empty")]
    pub output: String,
}

/// Everything a run produced
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Totals
    pub stats: TestStats,
    /// Specs skipped as invalid or filtered out
    pub skipped: usize,
    /// Executed tests in order
    pub results: Vec<TestRecord>,
    /// UTC start, RFC 3339
    pub started: String,
    /// UTC finish, RFC 3339
    pub finished: String,
}

impl RunSummary {
    /// Records that did not pass
    #[must_use]
    pub fn failures(&self) -> Vec<&TestRecord> {
        self.results
            .iter()
            .filter(|r| r.status != TestStatus::Passed)
            .collect()
    }
}

/// First `level` components of the directory part of `name`.
///
/// The last component (the test itself) is never part of the group.
#[must_use]
pub fn extract_test_path(name: &str, level: usize) -> String {
    let components: Vec<&str> = name.split('/').collect();
    let dirs = components.len().saturating_sub(1);
    components[..level.min(dirs)].join("/")
}

fn asctime(time: DateTime<Utc>) -> String {
    time.format("%a %b %e %H:%M:%S %Y").to_string()
}

/// Logs written during a run
struct RunLogs {
    test: BufWriter<File>,
    summary: BufWriter<File>,
}

impl RunLogs {
    fn create(test: &Path, summary: &Path) -> HexlResult<Self> {
        Ok(Self {
            test: BufWriter::new(File::create(test)?),
            summary: BufWriter::new(File::create(summary)?),
        })
    }

    /// Write to both logs
    fn both(&mut self, text: &str) -> HexlResult<()> {
        self.test.write_all(text.as_bytes())?;
        self.summary.write_all(text.as_bytes())?;
        Ok(())
    }

    fn flush(&mut self) -> HexlResult<()> {
        self.test.flush()?;
        self.summary.flush()?;
        Ok(())
    }
}

/// Runs test sets and writes logs
#[derive(Debug, Clone, Default)]
pub struct TestRunner {
    config: RunConfig,
}

impl TestRunner {
    /// Create a runner with the given configuration
    #[must_use]
    pub const fn new(config: RunConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run every applicable spec in `set`
    ///
    /// # Errors
    ///
    /// Returns an error if a log cannot be created or written.
    pub fn run(&self, set: &TestSet) -> HexlResult<RunSummary> {
        self.run_with(set, |_| {})
    }

    /// Run every applicable spec in `set`, calling `on_result` after each test
    ///
    /// # Errors
    ///
    /// Returns an error if a log cannot be created or written.
    pub fn run_with<F>(&self, set: &TestSet, mut on_result: F) -> HexlResult<RunSummary>
    where
        F: FnMut(&TestRecord),
    {
        let started = Utc::now();
        let mut logs = RunLogs::create(&self.config.test_log, &self.config.summary_log)?;
        let stamp = format!("UTC Start Date & Time: {}\n\n", asctime(started));
        logs.both(&stamp)?;
        logs.summary.write_all(b"\n\n")?;

        let mut stats = TestStats::default();
        let mut group_stats = TestStats::default();
        let mut group: Option<String> = None;
        let mut results = Vec::new();
        let mut skipped = 0;
        let mut failure: Option<HexlError> = None;

        set.iterate(|path, spec| {
            if failure.is_some() {
                return;
            }
            let name = join_path(path, &spec.name());
            if !self.selected(&name, spec) {
                skipped += 1;
                return;
            }

            let current = extract_test_path(&name, self.config.test_log_level);
            if group.as_deref() != Some(current.as_str()) {
                let header = if group.is_none() {
                    format!("{current}  \n")
                } else {
                    format!("  {group_stats}\n{current}  \n")
                };
                if let Err(err) = logs.both(&header) {
                    failure = Some(err);
                    return;
                }
                group_stats.clear();
                group = Some(current);
            }

            let record = Self::execute(&name, spec);
            if let Err(err) = self.log_record(&mut logs, &record) {
                failure = Some(err);
                return;
            }
            stats.record(record.status);
            group_stats.record(record.status);
            on_result(&record);
            results.push(record);
        });
        if let Some(err) = failure {
            return Err(err);
        }

        let finished = Utc::now();
        if group.is_some() {
            logs.both(&format!("  {group_stats}\n"))?;
        }
        logs.both(&format!("\nTestrun\n  {stats}\n"))?;
        logs.both(&format!("\nUTC Finish Date & Time: {}\n", asctime(finished)))?;
        logs.flush()?;

        info!(
            total = stats.total(),
            passed = stats.passed,
            failed = stats.failed,
            skipped,
            "Test run finished"
        );

        Ok(RunSummary {
            stats,
            skipped,
            results,
            started: started.to_rfc3339(),
            finished: finished.to_rfc3339(),
        })
    }

    fn selected(&self, name: &str, spec: &dyn TestSpec) -> bool {
        let matches = self
            .config
            .filter
            .as_deref()
            .map_or(true, |pattern| name.contains(pattern));
        matches && spec.is_valid()
    }

    fn execute(name: &str, spec: &dyn TestSpec) -> TestRecord {
        info!("START:  {name}");
        let start = Instant::now();
        let outcome = spec.run();
        let elapsed: Duration = start.elapsed();
        match outcome.status {
            TestStatus::Passed | TestStatus::NotApplicable => info!("{}: {name}", outcome.status),
            TestStatus::Failed | TestStatus::Error => warn!("{}: {name}", outcome.status),
        }
        TestRecord {
            name: name.to_string(),
            status: outcome.status,
            seconds: elapsed.as_secs_f64(),
            output: outcome.output,
        }
    }

    fn log_record(&self, logs: &mut RunLogs, record: &TestRecord) -> HexlResult<()> {
        let log = &mut logs.test;
        if record.status != TestStatus::Passed || self.config.log_passed {
            writeln!(log, "START:  {}", record.name)?;
            if !record.output.is_empty() {
                log.write_all(record.output.as_bytes())?;
                if !record.output.ends_with('\n') {
                    log.write_all(b"\n")?;
                }
            }
        }
        writeln!(log, "{}: {} {:.2}s", record.status, record.name, record.seconds)?;
        writeln!(log)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::suite::TestOutcome;
    use tempfile::TempDir;

    #[derive(Debug)]
    struct Fixed {
        name: &'static str,
        outcome: TestOutcome,
        valid: bool,
    }

    impl Fixed {
        fn new(name: &'static str, outcome: TestOutcome) -> Self {
            Self {
                name,
                outcome,
                valid: true,
            }
        }
    }

    impl TestSpec for Fixed {
        fn name(&self) -> String {
            self.name.to_string()
        }

        fn is_valid(&self) -> bool {
            self.valid
        }

        fn run(&self) -> TestOutcome {
            self.outcome.clone()
        }
    }

    fn runner_in(dir: &TempDir) -> TestRunner {
        TestRunner::new(
            RunConfig::default()
                .with_test_log(dir.path().join("test.log"))
                .with_summary_log(dir.path().join("summary.log"))
                .with_test_log_level(2),
        )
    }

    fn sample_set() -> TestSet {
        let mut core = TestSet::new("core");
        let mut memory = TestSet::new("memory");
        memory.add(Fixed::new("a/1", TestOutcome::pass()));
        memory.add(Fixed::new("b/1", TestOutcome::fail("dst mismatch")));
        let mut branch = TestSet::new("branch");
        branch.add(Fixed::new("c", TestOutcome::pass().with_output("quiet")));
        branch.add(Fixed {
            name: "d",
            outcome: TestOutcome::pass(),
            valid: false,
        });
        core.add_set(memory);
        core.add_set(branch);
        core
    }

    mod stats_tests {
        use super::*;

        #[test]
        fn test_record_and_total() {
            let mut stats = TestStats::default();
            stats.record(TestStatus::Passed);
            stats.record(TestStatus::Passed);
            stats.record(TestStatus::Failed);
            stats.record(TestStatus::NotApplicable);
            assert_eq!(stats.total(), 4);
            assert!(!stats.all_passed());
            assert_eq!(
                stats.to_string(),
                "Total: 4  Passed: 2  Failed: 1  Error: 0  NA: 1"
            );
            stats.clear();
            assert_eq!(stats.total(), 0);
            assert!(stats.all_passed());
        }
    }

    mod path_tests {
        use super::*;

        #[test]
        fn test_extract_test_path() {
            assert_eq!(extract_test_path("core/memory/atomicity/x/1_2_3", 2), "core/memory");
            assert_eq!(extract_test_path("core/memory/x", 4), "core/memory");
            assert_eq!(extract_test_path("x", 4), "");
        }
    }

    mod run_tests {
        use super::*;

        #[test]
        fn test_counts_and_skips() {
            let dir = TempDir::new().unwrap();
            let summary = runner_in(&dir).run(&sample_set()).unwrap();
            assert_eq!(summary.stats.passed, 2);
            assert_eq!(summary.stats.failed, 1);
            assert_eq!(summary.skipped, 1);
            assert_eq!(summary.results.len(), 3);
            assert_eq!(summary.failures().len(), 1);
            assert_eq!(summary.failures()[0].name, "core/memory/b/1");
        }

        #[test]
        fn test_test_log_contents() {
            let dir = TempDir::new().unwrap();
            runner_in(&dir).run(&sample_set()).unwrap();
            let log = std::fs::read_to_string(dir.path().join("test.log")).unwrap();
            assert!(log.starts_with("UTC Start Date & Time: "));
            assert!(log.contains("START:  core/memory/b/1\ndst mismatch\nFAILED: core/memory/b/1 "));
            assert!(log.contains("PASSED: core/memory/a/1 "));
            // passed output stays out of the log by default
            assert!(!log.contains("quiet"));
            assert!(log.contains("UTC Finish Date & Time: "));
        }

        #[test]
        fn test_summary_groups() {
            let dir = TempDir::new().unwrap();
            runner_in(&dir).run(&sample_set()).unwrap();
            let summary = std::fs::read_to_string(dir.path().join("summary.log")).unwrap();
            let memory = summary.find("core/memory  \n").unwrap();
            let branch = summary.find("core/branch  \n").unwrap();
            assert!(memory < branch);
            assert!(summary.contains("  Total: 2  Passed: 1  Failed: 1  Error: 0  NA: 0\ncore/branch"));
            assert!(summary.contains("\nTestrun\n  Total: 3  Passed: 2  Failed: 1  Error: 0  NA: 0\n"));
            assert!(!summary.contains("START:"));
        }

        #[test]
        fn test_log_passed_and_filter() {
            let dir = TempDir::new().unwrap();
            let runner = TestRunner::new(
                runner_in(&dir)
                    .config()
                    .clone()
                    .with_log_passed(true)
                    .with_filter("branch"),
            );
            let mut seen = Vec::new();
            let summary = runner
                .run_with(&sample_set(), |record| seen.push(record.name.clone()))
                .unwrap();
            assert_eq!(seen, vec!["core/branch/c"]);
            assert_eq!(summary.skipped, 3);
            let log = std::fs::read_to_string(dir.path().join("test.log")).unwrap();
            assert!(log.contains("quiet"));
        }

        #[test]
        fn test_unwritable_log_is_error() {
            let dir = TempDir::new().unwrap();
            let runner = TestRunner::new(
                RunConfig::default().with_test_log(dir.path().join("missing/dir/test.log")),
            );
            assert!(runner.run(&sample_set()).is_err());
        }
    }
}
