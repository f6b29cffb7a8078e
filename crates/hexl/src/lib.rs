//! HEXL: host-side core of an HSAIL conformance test toolkit
//!
//! The crate covers the parts of conformance testing that do not need a
//! device: the geometry of a dispatch, the numeric boundaries used to test
//! rounding conversions, the search that generates valid and invalid
//! instruction variants, and an emulator for parallel atomic operations.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      HEXL Architecture                       │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐      │
//! │  │ Instruction  │   │ TestGen      │   │ Samples      │      │
//! │  │ Set (YAML)   │──►│ search       │──►│ + dump       │      │
//! │  └──────────────┘   └──────────────┘   └──────────────┘      │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐      │
//! │  │ Grid         │──►│ Atomic       │──►│ TestRunner   │      │
//! │  │ Geometry     │   │ emulation    │   │ + logs       │      │
//! │  └──────────────┘   └──────────────┘   └──────────────┘      │
//! └──────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

/// Atomic operation tests and their host emulation
#[allow(missing_docs)]
pub mod atomic;

/// Integer and floating-point boundary values for conversion tests
pub mod boundary;

/// Run configuration
#[allow(clippy::missing_errors_doc)]
pub mod config;

/// Grid geometry and work-item iteration
pub mod grid;

mod result;

/// Test runner and logs
pub mod runner;

/// Test specifications and test sets
pub mod suite;

/// Instruction property search
pub mod testgen;

/// Value types and rounding modes
pub mod types;

pub use atomic::{AtomicOp, AtomicTest, AtomicType, MemoryOrder, MemoryScope, Segment, TestKind};
pub use boundary::{rounding_tests_data, rounding_tests_num, TestFloat};
pub use config::{GridSpec, RunConfig};
pub use grid::{Dim, GridGeometry, GridIterator, WorkgroupIterator};
pub use result::{HexlError, HexlResult};
pub use runner::{RunSummary, TestRecord, TestRunner, TestStats};
pub use suite::{TestOutcome, TestSet, TestSpec, TestStatus};
pub use testgen::{InstDesc, InstructionSet, Prop, PropId, Sample, SearchMode, TableInstSet, TestGen};
pub use types::{AluModifier, Rounding, ValueType};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::atomic::*;
    pub use super::boundary::*;
    pub use super::config::*;
    pub use super::grid::*;
    pub use super::result::*;
    pub use super::runner::*;
    pub use super::suite::*;
    pub use super::testgen::*;
    pub use super::types::*;
}
