//! Command handlers - extracted from main.rs for testability
//!
//! Each handler module holds the execution logic of one command and returns
//! its report as a value; printing is left to the binary.

pub mod atomics;
pub mod geometry;
pub mod rounding;
pub mod testgen;

pub use atomics::{count_selected, load_run_config, render_atomics, run_atomics};
pub use geometry::{check_wave_size, describe, execute_geometry, parse_dim, point_lines};
pub use rounding::{execute_rounding, rounding_values};
pub use testgen::{execute_testgen, render_testgen, search_opcode, OpcodeReport, SearchOptions};
