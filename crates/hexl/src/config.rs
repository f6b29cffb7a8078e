//! Run configuration.
//!
//! Loaded from YAML; every field has a default, so an empty document is a
//! valid configuration.
//!
//! ```yaml
//! wave_size: 32
//! mode: exhaustive
//! grids:
//!   - { dims: 1, grid: [64, 1, 1], workgroup: [32, 1, 1] }
//! test_log: out/test.log
//! test_log_level: 3
//! ```

use crate::grid::{Dim, GridGeometry};
use crate::result::{HexlError, HexlResult};
use crate::testgen::SearchMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Largest wavefront size a device may report
pub const MAX_WAVE_SIZE: u32 = 64;

/// Grid geometry as written in a configuration file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GridSpec {
    /// Number of active dimensions
    pub dims: u16,
    /// Grid size per dimension
    pub grid: [u32; 3],
    /// Workgroup size per dimension
    pub workgroup: [u32; 3],
}

impl GridSpec {
    /// One-dimensional grid
    #[must_use]
    pub const fn linear(grid: u32, workgroup: u32) -> Self {
        Self {
            dims: 1,
            grid: [grid, 1, 1],
            workgroup: [workgroup, 1, 1],
        }
    }

    /// Build the validated geometry
    pub fn geometry(&self) -> HexlResult<GridGeometry> {
        let [gx, gy, gz] = self.grid;
        let [wx, wy, wz] = self.workgroup;
        GridGeometry::new(self.dims, Dim::new(gx, gy, gz), Dim::new(wx, wy, wz))
    }
}

/// Settings shared by the suites and the runner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Wavefront size of the device
    pub wave_size: u32,
    /// Secondary search mode for instruction generation
    pub mode: SearchMode,
    /// Geometries the atomic suite runs on
    pub grids: Vec<GridSpec>,
    /// Per-test log
    pub test_log: PathBuf,
    /// Summary log
    pub summary_log: PathBuf,
    /// Number of leading path components used to group the summary
    pub test_log_level: usize,
    /// Also copy passing tests' output into the test log
    pub log_passed: bool,
    /// Only run tests whose full name contains this text
    pub filter: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            wave_size: MAX_WAVE_SIZE,
            mode: SearchMode::Optimal,
            grids: default_grids(),
            test_log: PathBuf::from("test.log"),
            summary_log: PathBuf::from("test_summary.log"),
            test_log_level: 4,
            log_passed: false,
            filter: None,
        }
    }
}

/// Wave, workgroup and agent geometries at both operand widths
fn default_grids() -> Vec<GridSpec> {
    vec![
        GridSpec::linear(32, 32),
        GridSpec::linear(64, 64),
        GridSpec::linear(64, 32),
        GridSpec::linear(256, 256),
        GridSpec::linear(1024, 256),
    ]
}

impl RunConfig {
    /// Create the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> HexlResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file
    pub fn load(path: impl AsRef<Path>) -> HexlResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&text)
    }

    /// Check ranges that serde cannot express
    pub fn validate(&self) -> HexlResult<()> {
        if self.wave_size == 0 || self.wave_size > MAX_WAVE_SIZE || !self.wave_size.is_power_of_two()
        {
            return Err(HexlError::config(format!(
                "wave_size must be a power of two in 1..={MAX_WAVE_SIZE} (got {})",
                self.wave_size
            )));
        }
        if self.test_log_level == 0 {
            return Err(HexlError::config("test_log_level must be at least 1"));
        }
        for spec in &self.grids {
            spec.geometry()?;
        }
        Ok(())
    }

    /// Validated geometries of [`grids`](Self::grids)
    pub fn geometries(&self) -> HexlResult<Vec<GridGeometry>> {
        self.grids.iter().map(GridSpec::geometry).collect()
    }

    #[must_use]
    pub const fn with_wave_size(mut self, wave_size: u32) -> Self {
        self.wave_size = wave_size;
        self
    }

    #[must_use]
    pub const fn with_mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_grids(mut self, grids: Vec<GridSpec>) -> Self {
        self.grids = grids;
        self
    }

    #[must_use]
    pub fn with_test_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.test_log = path.into();
        self
    }

    #[must_use]
    pub fn with_summary_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.summary_log = path.into();
        self
    }

    #[must_use]
    pub const fn with_test_log_level(mut self, level: usize) -> Self {
        self.test_log_level = level;
        self
    }

    #[must_use]
    pub const fn with_log_passed(mut self, log_passed: bool) -> Self {
        self.log_passed = log_passed;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }
}
