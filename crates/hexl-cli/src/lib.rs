//! HEXL CLI Library
//!
//! Command-line front end for the HEXL conformance toolkit.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::format_push_string)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
pub mod handlers;
pub mod logging;
mod output;

pub use commands::{
    AtomicsArgs, Cli, ColorArg, Commands, FloatArg, FormatArg, GeometryArgs, LogFormatArg,
    RoundingArgs, TestgenArgs,
};
pub use config::{CliConfig, ColorChoice, LogFormat, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{OutputFormat, ProgressReporter};
