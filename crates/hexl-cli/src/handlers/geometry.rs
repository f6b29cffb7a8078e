//! Geometry command handler

use crate::commands::GeometryArgs;
use crate::error::{CliError, CliResult};
use hexl::config::MAX_WAVE_SIZE;
use hexl::{Dim, GridGeometry};
use std::fmt::Write;

/// Pad a 1-3 element size list with 1s
pub fn parse_dim(values: &[u32]) -> CliResult<Dim> {
    match *values {
        [x] => Ok(Dim::new(x, 1, 1)),
        [x, y] => Ok(Dim::new(x, y, 1)),
        [x, y, z] => Ok(Dim::new(x, y, z)),
        _ => Err(CliError::invalid_argument(format!(
            "expected 1 to 3 sizes, got {}",
            values.len()
        ))),
    }
}

/// Check a wavefront size given on the command line
pub fn check_wave_size(wave_size: u32) -> CliResult<u32> {
    if wave_size.is_power_of_two() && wave_size <= MAX_WAVE_SIZE {
        Ok(wave_size)
    } else {
        Err(CliError::invalid_argument(format!(
            "wave size must be a power of two no larger than {MAX_WAVE_SIZE} (got {wave_size})"
        )))
    }
}

/// Summary block: sizes, group counts and waves per group
#[must_use]
pub fn describe(geometry: &GridGeometry, wave_size: u32) -> String {
    let mut out = String::new();
    let groups = Dim::new(
        geometry.grid_groups(0),
        geometry.grid_groups(1),
        geometry.grid_groups(2),
    );
    let _ = writeln!(out, "Name:       {geometry}");
    out.push_str(&geometry.description());
    let _ = writeln!(out, "Work-items: {}", geometry.total_grid_size());
    let _ = writeln!(out, "Workgroups: {} ({groups})", geometry.total_grid_groups());
    let _ = writeln!(
        out,
        "Waves:      {} per workgroup, {} total (wave size {wave_size})",
        geometry.max_wave_num_in_workgroup(wave_size),
        geometry.max_wave_index(wave_size)
    );
    out
}

/// One line per work-item with its coordinate and ids
#[must_use]
pub fn point_lines(geometry: &GridGeometry, wave_size: u32) -> Vec<String> {
    geometry
        .points()
        .map(|p| {
            format!(
                "({:>4},{:>4},{:>4})  abs {:>6}  wg {:>4}  local {:>4}  lane {:>2}  wave {:>4}",
                p.x(),
                p.y(),
                p.z(),
                geometry.workitem_flat_abs_id(p),
                geometry.workgroup_flat_id(p),
                geometry.current_workitem_flat_id(p),
                geometry.lane_id(p, wave_size),
                geometry.wave_index(p, wave_size)
            )
        })
        .collect()
}

/// Build the geometry and render the report
pub fn execute_geometry(args: &GeometryArgs) -> CliResult<String> {
    let wave_size = check_wave_size(args.wavesize)?;
    let geometry = GridGeometry::new(
        args.dims,
        parse_dim(&args.grid)?,
        parse_dim(&args.workgroup)?,
    )?;

    let mut out = describe(&geometry, wave_size);
    if args.points {
        out.push('\n');
        for line in point_lines(&geometry, wave_size) {
            out.push_str(&line);
            out.push('\n');
        }
    }
    Ok(out)
}
