//! Testgen command handler

use crate::commands::TestgenArgs;
use crate::error::CliResult;
use crate::output::OutputFormat;
use hexl::testgen::{dump_sample, InstFormat, InstructionSet, SearchMode, TableInstSet, TestGen};
use serde::Serialize;
use std::fmt::Write;
use tracing::info;

/// Search results for one opcode variant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OpcodeReport {
    /// Opcode name
    pub opcode: String,
    /// Whether the base-format variant was searched
    pub basic: bool,
    /// Valid primary combinations
    pub primary: usize,
    /// Positive samples including secondary variations
    pub positive: usize,
    /// Negative mutants
    pub negative: usize,
    /// Rendered samples, when dumping
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub samples: Vec<String>,
}

/// Options shared by every opcode searched in one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Secondary enumeration mode
    pub mode: SearchMode,
    /// Sweep negative mutants after each primary combination
    pub negative: bool,
    /// Keep rendered samples
    pub dump: bool,
}

/// Run the positive (and optionally negative) search for one variant
pub fn search_opcode(
    set: &TableInstSet,
    opcode: &str,
    basic: bool,
    options: SearchOptions,
) -> CliResult<OpcodeReport> {
    let mut search = TestGen::create(set, opcode, basic, options.mode)?;
    let mut report = OpcodeReport {
        opcode: opcode.to_string(),
        basic,
        ..OpcodeReport::default()
    };

    let mut start = true;
    while search.next_primary_set(start) {
        start = false;
        report.primary += 1;

        loop {
            report.positive += 1;
            if options.dump {
                report.samples.push(search.dump());
            }
            if !search.next_secondary_set() {
                break;
            }
        }

        if options.negative {
            search.reset_negative_set();
            while let Some((prop, value)) = search.next_negative_set() {
                report.negative += 1;
                if options.dump {
                    let name = set.value_name(prop, value).unwrap_or_else(|| value.to_string());
                    report.samples.push(format!(
                        "negative {}={name}\n{}",
                        set.prop_name(prop),
                        dump_sample(set, search.negative_sample())
                    ));
                }
            }
        }
    }

    info!(
        opcode,
        basic,
        primary = report.primary,
        positive = report.positive,
        negative = report.negative,
        "search finished"
    );
    Ok(report)
}

/// Search every requested opcode of the table
pub fn execute_testgen(args: &TestgenArgs) -> CliResult<Vec<OpcodeReport>> {
    let set = TableInstSet::load(&args.table)?;
    let options = SearchOptions {
        mode: if args.exhaustive {
            SearchMode::Exhaustive
        } else {
            SearchMode::Optimal
        },
        negative: args.negative,
        dump: args.dump,
    };

    let opcodes = match &args.opcode {
        Some(opcode) => vec![opcode.clone()],
        None => set.opcodes(),
    };

    let mut reports = Vec::new();
    for opcode in &opcodes {
        reports.push(search_opcode(&set, opcode, false, options)?);
        // An explicitly named opcode without a base format is reported as an error
        let has_base = set.format(opcode) == Some(InstFormat::Mod);
        if args.basic && (has_base || args.opcode.is_some()) {
            reports.push(search_opcode(&set, opcode, true, options)?);
        }
    }
    Ok(reports)
}

/// Render the reports as a table or a machine format
pub fn render_testgen(reports: &[OpcodeReport], format: OutputFormat) -> CliResult<String> {
    if let Some(text) = format.render(&reports)? {
        return Ok(text);
    }
    let mut out = String::new();
    for report in reports {
        for sample in &report.samples {
            out.push_str(sample);
        }
    }
    let _ = writeln!(
        out,
        "{:<16} {:>8} {:>9} {:>9}",
        "opcode", "primary", "positive", "negative"
    );
    for r in reports {
        let name = if r.basic {
            format!("{} (basic)", r.opcode)
        } else {
            r.opcode.clone()
        };
        let _ = writeln!(
            out,
            "{name:<16} {:>8} {:>9} {:>9}",
            r.primary, r.positive, r.negative
        );
    }
    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::commands::FormatArg;
    use tempfile::TempDir;

    const TABLE: &str = "
opcodes:
  - name: abs
    format: mod
    primary:
      - { prop: type, all: [s32, f32, b32], valid: [s32, f32] }
    secondary:
      - { prop: ftz, all: [0, 1] }
    implicit: { ftz: 0 }
    rules:
      - when: { type: [s32] }
        prop: ftz
        allowed: [0]
  - name: st
    format: mem
    primary:
      - { prop: segment, all: [global, group] }
";

    fn write_table(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("table.yaml");
        std::fs::write(&path, TABLE).unwrap();
        path
    }

    fn args(table: std::path::PathBuf) -> TestgenArgs {
        TestgenArgs {
            table,
            opcode: None,
            exhaustive: false,
            negative: false,
            dump: false,
            basic: false,
            format: FormatArg::Text,
        }
    }

    #[test]
    fn test_counts_per_opcode() {
        let dir = TempDir::new().unwrap();
        let mut a = args(write_table(&dir));
        a.negative = true;
        let reports = execute_testgen(&a).unwrap();
        assert_eq!(reports.len(), 2);

        let abs = &reports[0];
        assert_eq!(abs.opcode, "abs");
        assert_eq!((abs.primary, abs.positive, abs.negative), (2, 3, 2));
        let st = &reports[1];
        assert_eq!((st.primary, st.positive, st.negative), (2, 2, 0));
    }

    #[test]
    fn test_basic_variant_only_for_mod_opcodes() {
        let dir = TempDir::new().unwrap();
        let mut a = args(write_table(&dir));
        a.basic = true;
        let reports = execute_testgen(&a).unwrap();
        let basic: Vec<_> = reports.iter().filter(|r| r.basic).collect();
        assert_eq!(basic.len(), 1);
        assert_eq!(basic[0].opcode, "abs");
        assert_eq!(basic[0].primary, 2);

        a.opcode = Some("st".into());
        assert!(execute_testgen(&a).is_err());
    }

    #[test]
    fn test_dump_and_render() {
        let dir = TempDir::new().unwrap();
        let mut a = args(write_table(&dir));
        a.opcode = Some("abs".into());
        a.dump = true;
        a.negative = true;
        let reports = execute_testgen(&a).unwrap();
        assert_eq!(reports[0].samples.len(), 5);

        let text = render_testgen(&reports, OutputFormat::Text).unwrap();
        assert!(text.contains("type      = f32"));
        assert!(text.contains("negative type=b32"));
        assert!(text.contains("abs                     2         3         2"));

        let json = render_testgen(&reports, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["positive"], 3);
    }

    #[test]
    fn test_unknown_opcode() {
        let dir = TempDir::new().unwrap();
        let mut a = args(write_table(&dir));
        a.opcode = Some("mad".into());
        assert!(execute_testgen(&a).is_err());
    }
}
