//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// hexl: host-side tools for HSAIL conformance testing
#[derive(Parser, Debug)]
#[command(name = "hexl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Diagnostic log format on stderr
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormatArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Describe a dispatch geometry and its work-item ids
    Geometry(GeometryArgs),

    /// Run the atomic operation suite on the host emulator
    Atomics(AtomicsArgs),

    /// Search an instruction table for positive and negative tests
    Testgen(TestgenArgs),

    /// Print source values for a float-to-integer rounding test
    Rounding(RoundingArgs),
}

/// Arguments for the geometry command
#[derive(Args, Debug)]
pub struct GeometryArgs {
    /// Number of dimensions (1-3)
    #[arg(long, default_value = "1")]
    pub dims: u16,

    /// Grid size, comma separated (missing dimensions are 1)
    #[arg(long, value_delimiter = ',', num_args = 1..=3, required = true)]
    pub grid: Vec<u32>,

    /// Workgroup size, comma separated (missing dimensions are 1)
    #[arg(long, value_delimiter = ',', num_args = 1..=3, required = true)]
    pub workgroup: Vec<u32>,

    /// Wavefront size used for lane and wave ids
    #[arg(long, default_value = "64")]
    pub wavesize: u32,

    /// List every work-item with its ids
    #[arg(long)]
    pub points: bool,
}

/// Arguments for the atomics command
#[derive(Args, Debug)]
pub struct AtomicsArgs {
    /// Run configuration (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Wavefront size (overrides the configuration)
    #[arg(long)]
    pub wavesize: Option<u32>,

    /// Only run tests whose name contains this text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Directory for the test and summary logs (overrides the configuration)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Copy passing tests' output into the test log
    #[arg(long)]
    pub log_passed: bool,

    /// Report format
    #[arg(long, default_value = "text")]
    pub format: FormatArg,
}

/// Arguments for the testgen command
#[derive(Args, Debug)]
pub struct TestgenArgs {
    /// Instruction table (YAML)
    pub table: PathBuf,

    /// Only search this opcode
    #[arg(long)]
    pub opcode: Option<String>,

    /// Enumerate the full cross-product of secondary properties
    #[arg(long)]
    pub exhaustive: bool,

    /// Also sweep single-property negative mutants
    #[arg(long)]
    pub negative: bool,

    /// Print every generated sample
    #[arg(long)]
    pub dump: bool,

    /// Search the base-format variant of Mod opcodes
    #[arg(long)]
    pub basic: bool,

    /// Report format
    #[arg(long, default_value = "text")]
    pub format: FormatArg,
}

/// Arguments for the rounding command
#[derive(Args, Debug)]
pub struct RoundingArgs {
    /// Destination type (s8, u32, ...)
    #[arg(long = "type")]
    pub ty: String,

    /// Integer rounding mode (neari, zeroi, upi, downi and variants)
    #[arg(long, default_value = "neari")]
    pub rounding: String,

    /// Precision of the source values
    #[arg(long, default_value = "f32")]
    pub float: FloatArg,
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

/// Log format argument for CLI
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormatArg {
    /// Human-readable lines
    #[default]
    Text,
    /// JSON lines
    Json,
}

impl From<LogFormatArg> for crate::config::LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => Self::Text,
            LogFormatArg::Json => Self::Json,
        }
    }
}

/// Report format argument for CLI
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum FormatArg {
    /// Human-readable text
    #[default]
    Text,
    /// JSON
    Json,
    /// YAML
    Yaml,
}

impl From<FormatArg> for crate::output::OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => Self::Text,
            FormatArg::Json => Self::Json,
            FormatArg::Yaml => Self::Yaml,
        }
    }
}

/// Source precision for rounding data
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FloatArg {
    /// Half precision
    F16,
    /// Single precision
    #[default]
    F32,
    /// Double precision
    F64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::ColorChoice;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("hexl").chain(args.iter().copied())).unwrap()
    }

    mod parse_tests {
        use super::*;

        #[test]
        fn test_geometry_args() {
            let cli = parse(&["geometry", "--dims", "2", "--grid", "8,4", "--workgroup", "4,4", "--points"]);
            let Commands::Geometry(args) = cli.command else {
                panic!("expected geometry");
            };
            assert_eq!(args.dims, 2);
            assert_eq!(args.grid, vec![8, 4]);
            assert_eq!(args.workgroup, vec![4, 4]);
            assert_eq!(args.wavesize, 64);
            assert!(args.points);
        }

        #[test]
        fn test_atomics_args() {
            let cli = parse(&["-vv", "atomics", "--wavesize", "32", "--filter", "add", "--format", "json"]);
            assert_eq!(cli.verbose, 2);
            let Commands::Atomics(args) = cli.command else {
                panic!("expected atomics");
            };
            assert_eq!(args.wavesize, Some(32));
            assert_eq!(args.filter.as_deref(), Some("add"));
            assert!(matches!(args.format, FormatArg::Json));
        }

        #[test]
        fn test_testgen_args() {
            let cli = parse(&["testgen", "table.yaml", "--opcode", "add", "--negative", "--basic"]);
            let Commands::Testgen(args) = cli.command else {
                panic!("expected testgen");
            };
            assert_eq!(args.table, PathBuf::from("table.yaml"));
            assert!(args.negative);
            assert!(args.basic);
            assert!(!args.exhaustive);
        }

        #[test]
        fn test_rounding_args() {
            let cli = parse(&["rounding", "--type", "s8", "--float", "f16"]);
            let Commands::Rounding(args) = cli.command else {
                panic!("expected rounding");
            };
            assert_eq!(args.ty, "s8");
            assert_eq!(args.rounding, "neari");
            assert_eq!(args.float, FloatArg::F16);
        }

        #[test]
        fn test_global_flags_after_subcommand() {
            let cli = parse(&["rounding", "--type", "u8", "--color", "never", "-q"]);
            assert!(cli.quiet);
            assert_eq!(ColorChoice::from(cli.color), ColorChoice::Never);
        }

        #[test]
        fn test_grid_is_required() {
            let result = Cli::try_parse_from(["hexl", "geometry", "--workgroup", "4"]);
            assert!(result.is_err());
        }
    }
}
