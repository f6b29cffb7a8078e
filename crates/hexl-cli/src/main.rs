//! hexl: command-line front end for HSAIL conformance tooling
//!
//! ## Usage
//!
//! ```bash
//! hexl geometry --dims 2 --grid 64,8 --workgroup 16,4     # Describe a dispatch
//! hexl atomics --filter atomic_add --output logs           # Run the atomic suite
//! hexl testgen table.yaml --negative --dump                # Search an instruction table
//! hexl rounding --type s8 --rounding neari --float f16     # Boundary source values
//! ```

use clap::Parser;
use hexl_cli::{
    handlers::{
        execute_geometry, execute_rounding, execute_testgen, load_run_config, render_atomics,
        render_testgen, run_atomics,
    },
    logging::init_logging,
    AtomicsArgs, Cli, CliConfig, CliError, CliResult, Commands, ProgressReporter, Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    init_logging(
        config.verbosity,
        config.log_format,
        config.color.should_color(),
    )?;

    match cli.command {
        Commands::Geometry(args) => {
            print!("{}", execute_geometry(&args)?);
            Ok(())
        }
        Commands::Atomics(args) => run_atomics_command(&config, &args),
        Commands::Testgen(args) => {
            let reports = execute_testgen(&args)?;
            print!("{}", render_testgen(&reports, args.format.into())?);
            Ok(())
        }
        Commands::Rounding(args) => {
            print!("{}", execute_rounding(&args)?);
            Ok(())
        }
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(cli.color.into())
        .with_log_format(cli.log_format.into())
}

fn run_atomics_command(config: &CliConfig, args: &AtomicsArgs) -> CliResult<()> {
    let run_config = load_run_config(args)?;
    let mut reporter =
        ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
    if config.verbosity.is_verbose() {
        reporter.info(&format!(
            "wave size {}, {} grids",
            run_config.wave_size,
            run_config.grids.len()
        ));
    }

    let summary = run_atomics(run_config.clone(), &mut reporter)?;
    print!("{}", render_atomics(&summary, &run_config, args.format.into())?);

    let stats = &summary.stats;
    if stats.all_passed() {
        Ok(())
    } else {
        Err(CliError::test_execution(format!(
            "{} of {} tests did not pass",
            stats.failed + stats.error,
            stats.total()
        )))
    }
}
