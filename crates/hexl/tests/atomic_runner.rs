//! Atomic suite driven through the runner with real log files.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use hexl::prelude::*;
use tempfile::TempDir;

fn config_in(dir: &TempDir, yaml: &str) -> RunConfig {
    RunConfig::from_yaml_str(yaml)
        .unwrap()
        .with_test_log(dir.path().join("test.log"))
        .with_summary_log(dir.path().join("test_summary.log"))
}

fn suite(config: &RunConfig) -> TestSet {
    atomic_suite(&config.geometries().unwrap(), config.wave_size)
}

#[test]
fn test_add_and_xor_pass_on_every_kind() {
    let dir = TempDir::new().unwrap();
    // wave, workgroup and agent kinds at wave size 32
    let config = config_in(
        &dir,
        "wave_size: 32\ngrids:\n  - { dims: 1, grid: [32, 1, 1], workgroup: [32, 1, 1] }\n  - { dims: 1, grid: [64, 1, 1], workgroup: [64, 1, 1] }\n  - { dims: 1, grid: [128, 1, 1], workgroup: [64, 1, 1] }\n",
    )
    .with_filter("_global_scar_");
    let set = suite(&config);

    let mut names = Vec::new();
    let summary = TestRunner::new(config)
        .run_with(&set, |record| names.push(record.name.clone()))
        .unwrap();

    assert!(summary.stats.passed > 0);
    assert_eq!(summary.stats.failed, 0, "{:?}", summary.failures());
    assert_eq!(summary.stats.error, 0);
    assert!(names.iter().any(|n| n.ends_with("/1_32x1x1_32x1x1")));
    assert!(names.iter().any(|n| n.ends_with("/1_128x1x1_64x1x1")));
    assert!(names.iter().all(|n| n.contains("_global_scar_")));
}

#[test]
fn test_logs_are_written() {
    let dir = TempDir::new().unwrap();
    let config = config_in(
        &dir,
        "grids:\n  - { dims: 2, grid: [8, 8, 1], workgroup: [8, 8, 1] }\ntest_log_level: 1\n",
    )
    .with_filter("atomicnoret_max_group")
    .with_log_passed(true);
    let set = suite(&config);
    let summary = TestRunner::new(config).run(&set).unwrap();
    assert!(summary.stats.all_passed());
    assert_eq!(summary.stats.total(), summary.results.len());

    let test_log = std::fs::read_to_string(dir.path().join("test.log")).unwrap();
    let first = &summary.results[0].name;
    assert!(test_log.contains(&format!("START:  {first}\n")));
    assert!(test_log.contains(&format!("PASSED: {first} ")));

    let summary_log = std::fs::read_to_string(dir.path().join("test_summary.log")).unwrap();
    assert!(summary_log.starts_with("UTC Start Date & Time: "));
    assert!(summary_log.contains("atomicity  \n"));
    assert!(summary_log.contains(&format!(
        "\nTestrun\n  Total: {n}  Passed: {n}  Failed: 0  Error: 0  NA: 0\n",
        n = summary.stats.total()
    )));
}

#[test]
fn test_invalid_combinations_are_skipped() {
    let dir = TempDir::new().unwrap();
    let config = config_in(
        &dir,
        "grids:\n  - { dims: 1, grid: [256, 1, 1], workgroup: [64, 1, 1] }\n",
    );
    let set = suite(&config);
    let total = set.len();
    let summary = TestRunner::new(config).run(&set).unwrap();

    // several workgroups: only agent/system scope on global memory survives
    assert_eq!(summary.stats.total() + summary.skipped, total);
    assert!(summary.skipped > summary.stats.total());
    assert!(summary
        .results
        .iter()
        .all(|r| r.name.contains("_agent_") || r.name.contains("_system_")));
    assert!(summary.results.iter().all(|r| !r.name.contains("group")));
    assert!(summary.stats.all_passed());
}
