//! Atomics command handler

use crate::commands::AtomicsArgs;
use crate::error::CliResult;
use crate::handlers::geometry::check_wave_size;
use crate::output::{OutputFormat, ProgressReporter};
use hexl::atomic::atomic_suite;
use hexl::{RunConfig, RunSummary, TestRunner, TestSet, TestStatus};
use std::fmt::Write;
use std::time::Instant;
use tracing::debug;

/// Configuration file (or defaults) with command-line overrides applied
pub fn load_run_config(args: &AtomicsArgs) -> CliResult<RunConfig> {
    let mut config = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    if let Some(wave_size) = args.wavesize {
        config.wave_size = check_wave_size(wave_size)?;
    }
    if let Some(filter) = &args.filter {
        config.filter = Some(filter.clone());
    }
    if let Some(dir) = &args.output {
        std::fs::create_dir_all(dir)?;
        config.test_log = dir.join("test.log");
        config.summary_log = dir.join("test_summary.log");
    }
    if args.log_passed {
        config.log_passed = true;
    }
    config.validate()?;
    Ok(config)
}

/// Number of tests the runner will execute for `config`
#[must_use]
pub fn count_selected(set: &TestSet, config: &RunConfig) -> u64 {
    let mut count = 0;
    set.iterate(|path, spec| {
        let name = hexl::suite::join_path(path, &spec.name());
        let matches = config.filter.as_deref().map_or(true, |p| name.contains(p));
        if matches && spec.is_valid() {
            count += 1;
        }
    });
    count
}

/// Build the suite and run it with a progress bar
pub fn run_atomics(config: RunConfig, reporter: &mut ProgressReporter) -> CliResult<RunSummary> {
    let set = atomic_suite(&config.geometries()?, config.wave_size);
    let selected = count_selected(&set, &config);
    debug!(tests = set.len(), selected, "atomic suite built");

    let start = Instant::now();
    reporter.start_progress(selected, "atomics");
    let runner = TestRunner::new(config);
    let summary = runner.run_with(&set, |record| {
        reporter.increment(1);
        reporter.set_message(&record.name);
        if !matches!(record.status, TestStatus::Passed | TestStatus::NotApplicable) {
            reporter.failure(&format!("{}: {}", record.status, record.name));
        }
    })?;
    reporter.finish();

    let stats = &summary.stats;
    reporter.summary(
        stats.passed,
        stats.failed + stats.error,
        stats.na,
        start.elapsed(),
    );
    Ok(summary)
}

/// Render a run summary; text lists failures and the log locations
pub fn render_atomics(
    summary: &RunSummary,
    config: &RunConfig,
    format: OutputFormat,
) -> CliResult<String> {
    if let Some(text) = format.render(summary)? {
        return Ok(text);
    }
    let mut out = String::new();
    let _ = writeln!(out, "{}", summary.stats);
    let _ = writeln!(out, "Skipped: {}", summary.skipped);
    for record in summary.failures() {
        let _ = writeln!(out, "{}: {}", record.status, record.name);
    }
    let _ = writeln!(out, "Test log:    {}", config.test_log.display());
    let _ = writeln!(out, "Summary log: {}", config.summary_log.display());
    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::commands::FormatArg;
    use tempfile::TempDir;

    fn args(dir: &TempDir) -> AtomicsArgs {
        AtomicsArgs {
            config: None,
            wavesize: None,
            filter: None,
            output: Some(dir.path().join("logs")),
            log_passed: false,
            format: FormatArg::Text,
        }
    }

    #[test]
    fn test_overrides() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.yaml");
        std::fs::write(&path, "wave_size: 64\nfilter: atomic_add\n").unwrap();

        let mut a = args(&dir);
        a.config = Some(path);
        a.wavesize = Some(32);
        a.filter = Some("atomic_xor".into());
        a.log_passed = true;

        let config = load_run_config(&a).unwrap();
        assert_eq!(config.wave_size, 32);
        assert_eq!(config.filter.as_deref(), Some("atomic_xor"));
        assert!(config.log_passed);
        assert_eq!(config.test_log, dir.path().join("logs/test.log"));
        assert!(dir.path().join("logs").is_dir());
    }

    #[test]
    fn test_bad_wave_size() {
        let dir = TempDir::new().unwrap();
        let mut a = args(&dir);
        a.wavesize = Some(100);
        assert!(load_run_config(&a).is_err());
    }

    #[test]
    fn test_run_and_render() {
        let dir = TempDir::new().unwrap();
        let mut config = load_run_config(&args(&dir)).unwrap();
        config.grids = vec![hexl::GridSpec::linear(32, 32)];
        config.filter = Some("atomic_sub_global".into());

        let mut reporter = ProgressReporter::new(false, true);
        let summary = run_atomics(config.clone(), &mut reporter).unwrap();
        assert!(summary.stats.passed > 0);
        assert!(summary.stats.all_passed());

        let text = render_atomics(&summary, &config, OutputFormat::Text).unwrap();
        assert!(text.starts_with("Total: "));
        assert!(text.contains("test_summary.log"));

        let json = render_atomics(&summary, &config, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            value["stats"]["passed"].as_u64().unwrap() as usize,
            summary.stats.passed
        );
    }

    #[test]
    fn test_count_selected_matches_run() {
        let dir = TempDir::new().unwrap();
        let mut config = load_run_config(&args(&dir)).unwrap();
        config.grids = vec![hexl::GridSpec::linear(64, 64)];
        config.filter = Some("atomic_exch".into());
        let set = atomic_suite(&config.geometries().unwrap(), config.wave_size);
        let expected = count_selected(&set, &config);

        let mut reporter = ProgressReporter::new(false, true);
        let summary = run_atomics(config, &mut reporter).unwrap();
        assert_eq!(summary.stats.total() as u64, expected);
    }
}
