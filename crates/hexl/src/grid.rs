//! Grid geometry: mapping between an N-dimensional dispatch grid and the
//! work-item, workgroup and wavefront identifiers derived from it.
//!
//! Every generated test program relies on these functions to compute the
//! expected per-work-item results and to index host-side result buffers.
//!
//! # Example
//!
//! ```
//! use hexl::grid::{Dim, GridGeometry};
//!
//! let geometry = GridGeometry::new(1, Dim::new(50, 1, 1), Dim::new(16, 1, 1)).unwrap();
//! assert_eq!(geometry.grid_groups(0), 4);
//! assert_eq!(geometry.current_workgroup_size(Dim::new(49, 0, 0), 0), 2);
//! assert_eq!(geometry.points().count(), 50);
//! ```
//!
//! Dimension indices outside `{0, 1, 2}` are programming errors: they trip a
//! debug assertion and yield a neutral value in release builds.

use crate::result::{HexlError, HexlResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Index;

/// Index of the X dimension
pub const X: u16 = 0;
/// Index of the Y dimension
pub const Y: u16 = 1;
/// Index of the Z dimension
pub const Z: u16 = 2;

/// A three-component coordinate or size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Dim([u32; 3]);

impl Dim {
    /// Create a new coordinate
    #[must_use]
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self([x, y, z])
    }

    /// Create a coordinate from 64-bit components (truncated to 32 bits)
    #[must_use]
    pub const fn from_u64(x: u64, y: u64, z: u64) -> Self {
        Self([x as u32, y as u32, z as u32])
    }

    /// Component along `dim`
    #[must_use]
    pub fn get(self, dim: u16) -> u32 {
        match checked_dim(dim) {
            Some(d) => self.0[d],
            None => 0,
        }
    }

    /// Component along `dim`, widened to 64 bits
    #[must_use]
    pub fn get64(self, dim: u16) -> u64 {
        u64::from(self.get(dim))
    }

    /// X component
    #[must_use]
    pub const fn x(self) -> u32 {
        self.0[0]
    }

    /// Y component
    #[must_use]
    pub const fn y(self) -> u32 {
        self.0[1]
    }

    /// Z component
    #[must_use]
    pub const fn z(self) -> u32 {
        self.0[2]
    }

    /// Product of all three components in 64-bit arithmetic
    #[must_use]
    pub const fn volume(self) -> u64 {
        self.0[0] as u64 * self.0[1] as u64 * self.0[2] as u64
    }
}

impl Index<u16> for Dim {
    type Output = u32;

    fn index(&self, dim: u16) -> &u32 {
        &self.0[usize::from(dim)]
    }
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.0[0], self.0[1], self.0[2])
    }
}

fn checked_dim(dim: u16) -> Option<usize> {
    if dim <= Z {
        Some(usize::from(dim))
    } else {
        debug_assert!(false, "dimension index {dim} out of range");
        None
    }
}

/// Shape of a dispatch: dimensionality, grid size and workgroup size.
///
/// The grid size need not be a multiple of the workgroup size; the last
/// workgroup along a dimension may be partial.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridGeometry {
    n_dim: u16,
    grid_size: Dim,
    workgroup_size: Dim,
}

impl GridGeometry {
    /// Create a geometry.
    ///
    /// Sizes of inactive dimensions (`dim >= n_dim`) are forced to 1.
    ///
    /// # Errors
    ///
    /// Returns [`HexlError::InvalidGeometry`] if `n_dim` is not 1, 2 or 3, or if
    /// an active grid or workgroup size is zero.
    pub fn new(n_dim: u16, grid_size: Dim, workgroup_size: Dim) -> HexlResult<Self> {
        if !(1..=3).contains(&n_dim) {
            return Err(HexlError::invalid_geometry(format!(
                "dimensionality must be 1, 2 or 3 (got {n_dim})"
            )));
        }

        let mut grid = [1u32; 3];
        let mut group = [1u32; 3];
        for dim in 0..n_dim {
            let d = usize::from(dim);
            if grid_size[dim] == 0 || workgroup_size[dim] == 0 {
                return Err(HexlError::invalid_geometry(format!(
                    "zero size in dimension {dim} (grid {grid_size}, workgroup {workgroup_size})"
                )));
            }
            grid[d] = grid_size[dim];
            group[d] = workgroup_size[dim];
        }

        Ok(Self {
            n_dim,
            grid_size: Dim(grid),
            workgroup_size: Dim(group),
        })
    }

    /// Create a one-dimensional geometry
    ///
    /// # Errors
    ///
    /// Returns [`HexlError::InvalidGeometry`] if either size is zero.
    pub fn linear(grid_size: u32, workgroup_size: u32) -> HexlResult<Self> {
        Self::new(1, Dim::new(grid_size, 1, 1), Dim::new(workgroup_size, 1, 1))
    }

    /// Number of active dimensions
    #[must_use]
    pub const fn dimensions(&self) -> u16 {
        self.n_dim
    }

    /// Grid size vector
    #[must_use]
    pub const fn grid_dim(&self) -> Dim {
        self.grid_size
    }

    /// Nominal workgroup size vector
    #[must_use]
    pub const fn workgroup_dim(&self) -> Dim {
        self.workgroup_size
    }

    /// Grid size along `dim`
    #[must_use]
    pub fn grid_size(&self, dim: u16) -> u32 {
        self.grid_size.get(dim)
    }

    /// Total number of work-items in the grid
    #[must_use]
    pub const fn total_grid_size(&self) -> u64 {
        self.grid_size.volume()
    }

    /// Nominal workgroup size along `dim`
    #[must_use]
    pub fn workgroup_size(&self, dim: u16) -> u32 {
        self.workgroup_size.get(dim)
    }

    /// Nominal number of work-items in a workgroup
    #[must_use]
    pub const fn total_workgroup_size(&self) -> u32 {
        self.workgroup_size.volume() as u32
    }

    const fn is_active(&self, dim: u16) -> bool {
        dim < self.n_dim
    }

    /// Local id of `point` within its workgroup along `dim`
    #[must_use]
    pub fn workitem_id(&self, point: Dim, dim: u16) -> u32 {
        match checked_dim(dim) {
            Some(_) if self.is_active(dim) => point[dim] % self.workgroup_size[dim],
            _ => 0,
        }
    }

    /// Global id of `point` along `dim`, wrapped to the grid size
    #[must_use]
    pub fn workitem_abs_id(&self, point: Dim, dim: u16) -> u64 {
        match checked_dim(dim) {
            Some(_) if self.is_active(dim) => point.get64(dim) % self.grid_size.get64(dim),
            _ => 0,
        }
    }

    /// Row-major flat local id using the nominal workgroup size
    #[must_use]
    pub fn workitem_flat_id(&self, point: Dim) -> u32 {
        let wx = self.workgroup_size[X];
        let wy = self.workgroup_size[Y];
        self.workitem_id(point, X)
            + self.workitem_id(point, Y) * wx
            + self.workitem_id(point, Z) * wx * wy
    }

    /// Row-major flat local id using the current (possibly partial) workgroup size
    #[must_use]
    pub fn current_workitem_flat_id(&self, point: Dim) -> u32 {
        let cx = self.current_workgroup_size(point, X);
        let cy = self.current_workgroup_size(point, Y);
        self.workitem_id(point, X)
            + self.workitem_id(point, Y) * cx
            + self.workitem_id(point, Z) * cx * cy
    }

    /// Row-major flat global id
    #[must_use]
    pub fn workitem_flat_abs_id(&self, point: Dim) -> u64 {
        let gx = self.grid_size.get64(X);
        let gy = self.grid_size.get64(Y);
        self.workitem_abs_id(point, X)
            + self.workitem_abs_id(point, Y) * gx
            + self.workitem_abs_id(point, Z) * gx * gy
    }

    /// Workgroup id of `point` along `dim`
    #[must_use]
    pub fn workgroup_id(&self, point: Dim, dim: u16) -> u32 {
        match checked_dim(dim) {
            Some(_) if self.is_active(dim) => point[dim] / self.workgroup_size[dim],
            _ => 0,
        }
    }

    /// Row-major flat workgroup id
    #[must_use]
    pub fn workgroup_flat_id(&self, point: Dim) -> u32 {
        self.workgroup_id(point, X)
            + self.workgroup_id(point, Y) * self.grid_groups(X)
            + self.workgroup_id(point, Z) * self.grid_groups(X) * self.grid_groups(Y)
    }

    /// Number of workgroups along `dim`, counting a partial last group
    #[must_use]
    pub fn grid_groups(&self, dim: u16) -> u32 {
        match checked_dim(dim) {
            Some(_) if self.is_active(dim) => {
                self.grid_size[dim].div_ceil(self.workgroup_size[dim])
            }
            Some(_) => 1,
            None => 0,
        }
    }

    /// Number of workgroups in the whole grid
    #[must_use]
    pub fn total_grid_groups(&self) -> u32 {
        self.grid_groups(X) * self.grid_groups(Y) * self.grid_groups(Z)
    }

    /// Size of the workgroup containing `point` along `dim`.
    ///
    /// Points past the last full workgroup boundary get the remainder.
    #[must_use]
    pub fn current_workgroup_size(&self, point: Dim, dim: u16) -> u32 {
        match checked_dim(dim) {
            Some(_) if self.is_active(dim) => {
                let grid = self.grid_size[dim];
                let group = self.workgroup_size[dim];
                let whole = grid / group;
                if point[dim] < whole * group {
                    group
                } else {
                    grid % group
                }
            }
            _ => 1,
        }
    }

    /// Number of work-items in the workgroup containing `point`
    #[must_use]
    pub fn current_workgroup_size_total(&self, point: Dim) -> u32 {
        self.current_workgroup_size(point, X)
            * self.current_workgroup_size(point, Y)
            * self.current_workgroup_size(point, Z)
    }

    /// Decode a flat global id into a coordinate (inverse of
    /// [`workitem_flat_abs_id`](Self::workitem_flat_abs_id))
    #[must_use]
    pub fn point(&self, flat_abs_id: u64) -> Dim {
        let gx = self.grid_size.get64(X);
        let plane = gx * self.grid_size.get64(Y);
        let z = flat_abs_id / plane;
        let y = (flat_abs_id - z * plane) / gx;
        let x = flat_abs_id - z * plane - y * gx;
        Dim::from_u64(x, y, z)
    }

    /// Compose a coordinate from a workgroup flat id and an intra-workgroup flat id
    #[must_use]
    pub fn point_in_workgroup(&self, workgroup_flat_id: u32, workitem_flat_id: u32) -> Dim {
        self.point(
            u64::from(workgroup_flat_id) * u64::from(self.total_workgroup_size())
                + u64::from(workitem_flat_id),
        )
    }

    /// Lane of `point` within its wavefront
    #[must_use]
    pub fn lane_id(&self, point: Dim, wave_size: u32) -> u32 {
        self.current_workitem_flat_id(point) % wave_size
    }

    /// Index of the wavefront containing `point` within its workgroup
    #[must_use]
    pub fn wave_num_in_workgroup(&self, point: Dim, wave_size: u32) -> u32 {
        self.current_workitem_flat_id(point) / wave_size
    }

    /// Maximum number of wavefronts in one workgroup
    #[must_use]
    pub fn max_wave_num_in_workgroup(&self, wave_size: u32) -> u32 {
        self.total_workgroup_size().div_ceil(wave_size)
    }

    /// Grid-wide wavefront index of `point`
    #[must_use]
    pub fn wave_index(&self, point: Dim, wave_size: u32) -> u32 {
        self.workgroup_flat_id(point) * self.max_wave_num_in_workgroup(wave_size)
            + self.wave_num_in_workgroup(point, wave_size)
    }

    /// Upper bound (exclusive) of [`wave_index`](Self::wave_index)
    #[must_use]
    pub fn max_wave_index(&self, wave_size: u32) -> u32 {
        self.total_grid_groups() * self.max_wave_num_in_workgroup(wave_size)
    }

    /// Grid-wide wavefront number of `point`.
    ///
    /// Has no defined semantics; trips a debug assertion and returns 0.
    /// Use [`wave_index`](Self::wave_index) instead.
    #[must_use]
    pub fn wave_num(&self, _point: Dim, _wave_size: u32) -> u64 {
        debug_assert!(false, "GridGeometry::wave_num has no defined semantics");
        0
    }

    /// Iterator positioned at the first grid coordinate
    #[must_use]
    pub const fn grid_begin(&self) -> GridIterator<'_> {
        GridIterator {
            geometry: self,
            point: Dim::new(0, 0, 0),
        }
    }

    /// End sentinel: z at its size bound
    #[must_use]
    pub fn grid_end(&self) -> GridIterator<'_> {
        GridIterator {
            geometry: self,
            point: Dim::new(0, 0, self.grid_size[Z]),
        }
    }

    /// All grid coordinates in row-major order (x fastest)
    #[must_use]
    pub const fn points(&self) -> GridIterator<'_> {
        self.grid_begin()
    }

    /// First coordinate of the workgroup with the given flat id
    fn workgroup_origin(&self, workgroup_flat_id: u32) -> Dim {
        let gx = self.grid_groups(X);
        let gy = self.grid_groups(Y);
        let wz = workgroup_flat_id / (gx * gy);
        let wy = (workgroup_flat_id - wz * gx * gy) / gx;
        let wx = workgroup_flat_id - wz * gx * gy - wy * gx;
        Dim::new(
            wx * self.workgroup_size[X],
            wy * self.workgroup_size[Y],
            wz * self.workgroup_size[Z],
        )
    }

    /// Iterator over the work-items of one workgroup
    #[must_use]
    pub fn workgroup_begin(&self, workgroup_flat_id: u32) -> WorkgroupIterator<'_> {
        let origin = self.workgroup_origin(workgroup_flat_id);
        WorkgroupIterator {
            geometry: self,
            origin,
            point: origin,
            end: self.workgroup_end_point(origin),
        }
    }

    /// End sentinel of one workgroup
    #[must_use]
    pub fn workgroup_end(&self, workgroup_flat_id: u32) -> WorkgroupIterator<'_> {
        let origin = self.workgroup_origin(workgroup_flat_id);
        let end = self.workgroup_end_point(origin);
        WorkgroupIterator {
            geometry: self,
            origin,
            point: end,
            end,
        }
    }

    fn workgroup_end_point(&self, origin: Dim) -> Dim {
        Dim::new(
            origin[X],
            origin[Y],
            origin[Z] + self.current_workgroup_size(origin, Z),
        )
    }

    /// Multi-line human readable description
    #[must_use]
    pub fn description(&self) -> String {
        let g = self.grid_size;
        let w = self.workgroup_size;
        format!(
            "Dimensions: {}\nGrid:       ({}, {}, {})\nWorkgroup:  ({}, {}, {})\n",
            self.n_dim,
            g.x(),
            g.y(),
            g.z(),
            w.x(),
            w.y(),
            w.z()
        )
    }
}

impl fmt::Display for GridGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.n_dim, self.grid_size, self.workgroup_size)
    }
}

/// Row-major enumerator over all coordinates of a grid
#[derive(Debug, Clone)]
pub struct GridIterator<'a> {
    geometry: &'a GridGeometry,
    point: Dim,
}

impl GridIterator<'_> {
    /// Current coordinate
    #[must_use]
    pub const fn point(&self) -> Dim {
        self.point
    }

    /// Step to the next coordinate: x fastest, then y, then z
    pub fn advance(&mut self) {
        let mut x = self.point.x() + 1;
        let mut y = self.point.y();
        let mut z = self.point.z();
        if x == self.geometry.grid_size[X] {
            x = 0;
            y += 1;
            if y == self.geometry.grid_size[Y] {
                y = 0;
                z += 1;
            }
        }
        self.point = Dim::new(x, y, z);
    }

    fn at_end(&self) -> bool {
        self.point.z() >= self.geometry.grid_size[Z]
    }
}

impl PartialEq for GridIterator<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.geometry, other.geometry) && self.point == other.point
    }
}

impl Iterator for GridIterator<'_> {
    type Item = Dim;

    fn next(&mut self) -> Option<Dim> {
        if self.at_end() {
            return None;
        }
        let current = self.point;
        self.advance();
        Some(current)
    }
}

/// Enumerator over the work-items of a single workgroup.
///
/// Steps through the current flat id of the workgroup and decodes it with the
/// workgroup's current (possibly partial) size, so it never leaves the group.
#[derive(Debug, Clone)]
pub struct WorkgroupIterator<'a> {
    geometry: &'a GridGeometry,
    origin: Dim,
    point: Dim,
    end: Dim,
}

impl WorkgroupIterator<'_> {
    /// Current coordinate
    #[must_use]
    pub const fn point(&self) -> Dim {
        self.point
    }

    /// Step to the next work-item of the workgroup
    pub fn advance(&mut self) {
        let g = self.geometry;
        let cx = g.current_workgroup_size(self.origin, X);
        let cy = g.current_workgroup_size(self.origin, Y);
        let flat = g.current_workitem_flat_id(self.point) + 1;
        let lx = flat % cx;
        let ly = (flat / cx) % cy;
        let lz = flat / (cx * cy);
        self.point = Dim::new(
            self.origin[X] + lx,
            self.origin[Y] + ly,
            self.origin[Z] + lz,
        );
    }
}

impl PartialEq for WorkgroupIterator<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.geometry, other.geometry) && self.point == other.point
    }
}

impl Iterator for WorkgroupIterator<'_> {
    type Item = Dim;

    fn next(&mut self) -> Option<Dim> {
        if self.point == self.end {
            return None;
        }
        let current = self.point;
        self.advance();
        Some(current)
    }
}

/// Proptest strategies for grid geometries
#[cfg(any(test, feature = "proptest"))]
pub mod strategies {
    use super::{Dim, GridGeometry};
    use proptest::prelude::*;

    /// Arbitrary geometry with small sizes, ragged workgroups included
    pub fn arb_geometry() -> impl Strategy<Value = GridGeometry> {
        (
            1u16..=3,
            (1u32..=24, 1u32..=12, 1u32..=6),
            (1u32..=16, 1u32..=8, 1u32..=4),
        )
            .prop_map(|(n_dim, (gx, gy, gz), (wx, wy, wz))| {
                GridGeometry::new(n_dim, Dim::new(gx, gy, gz), Dim::new(wx, wy, wz))
                    .expect("strategy only produces non-zero sizes")
            })
    }

    /// Arbitrary geometry paired with a coordinate inside its grid
    pub fn arb_geometry_and_point() -> impl Strategy<Value = (GridGeometry, Dim)> {
        arb_geometry().prop_flat_map(|g| {
            let grid = g.grid_dim();
            (Just(g), 0..grid.x(), 0..grid.y(), 0..grid.z())
                .prop_map(|(g, x, y, z)| (g, Dim::new(x, y, z)))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn linear(grid: u32, group: u32) -> GridGeometry {
        GridGeometry::linear(grid, group).unwrap()
    }

    mod dim_tests {
        use super::*;

        #[test]
        fn test_accessors() {
            let d = Dim::new(3, 4, 5);
            assert_eq!(d.get(X), 3);
            assert_eq!(d.get(Y), 4);
            assert_eq!(d.get64(Z), 5);
            assert_eq!(d[1], 4);
            assert_eq!(d.volume(), 60);
        }

        #[test]
        fn test_display() {
            assert_eq!(Dim::new(64, 2, 1).to_string(), "64x2x1");
        }

        #[test]
        fn test_from_u64_truncates() {
            let d = Dim::from_u64(u64::from(u32::MAX) + 2, 0, 0);
            assert_eq!(d.x(), 1);
        }
    }

    mod construction_tests {
        use super::*;

        #[test]
        fn test_rejects_bad_dimensionality() {
            assert!(GridGeometry::new(0, Dim::new(1, 1, 1), Dim::new(1, 1, 1)).is_err());
            assert!(GridGeometry::new(4, Dim::new(1, 1, 1), Dim::new(1, 1, 1)).is_err());
        }

        #[test]
        fn test_rejects_zero_sizes() {
            assert!(GridGeometry::new(2, Dim::new(4, 0, 1), Dim::new(1, 1, 1)).is_err());
            assert!(GridGeometry::new(1, Dim::new(4, 1, 1), Dim::new(0, 1, 1)).is_err());
        }

        #[test]
        fn test_inactive_dimensions_forced_to_one() {
            let g = GridGeometry::new(1, Dim::new(8, 7, 6), Dim::new(4, 3, 2)).unwrap();
            assert_eq!(g.grid_dim(), Dim::new(8, 1, 1));
            assert_eq!(g.workgroup_dim(), Dim::new(4, 1, 1));
        }

        #[test]
        fn test_name_and_description() {
            let g = linear(64, 16);
            assert_eq!(g.to_string(), "1_64x1x1_16x1x1");
            assert!(g.description().contains("Grid:       (64, 1, 1)"));
        }
    }

    mod id_tests {
        use super::*;

        #[test]
        fn test_grid_groups() {
            let g = linear(64, 16);
            assert_eq!(g.grid_groups(X), 4);
            assert_eq!(g.grid_groups(Y), 1);
            assert_eq!(g.total_grid_groups(), 4);

            let ragged = linear(50, 16);
            assert_eq!(ragged.grid_groups(X), 4);
        }

        #[test]
        fn test_current_workgroup_size_full() {
            let g = linear(64, 16);
            assert_eq!(g.current_workgroup_size(Dim::new(50, 0, 0), X), 16);
        }

        #[test]
        fn test_current_workgroup_size_ragged() {
            let g = linear(50, 16);
            assert_eq!(g.current_workgroup_size(Dim::new(47, 0, 0), X), 16);
            assert_eq!(g.current_workgroup_size(Dim::new(48, 0, 0), X), 2);
            assert_eq!(g.current_workgroup_size(Dim::new(49, 0, 0), X), 2);
            assert_eq!(g.current_workgroup_size(Dim::new(49, 0, 0), Y), 1);
        }

        #[test]
        fn test_flat_ids_2d() {
            let g = GridGeometry::new(2, Dim::new(8, 6, 1), Dim::new(4, 3, 1)).unwrap();
            let p = Dim::new(5, 4, 0);
            assert_eq!(g.workitem_id(p, X), 1);
            assert_eq!(g.workitem_id(p, Y), 1);
            assert_eq!(g.workitem_flat_id(p), 1 + 4);
            assert_eq!(g.workitem_flat_abs_id(p), 5 + 4 * 8);
            assert_eq!(g.workgroup_id(p, X), 1);
            assert_eq!(g.workgroup_id(p, Y), 1);
            assert_eq!(g.workgroup_flat_id(p), 1 + 2);
        }

        #[test]
        fn test_inactive_dimension_ids_are_zero() {
            let g = linear(16, 4);
            let p = Dim::new(5, 3, 2);
            assert_eq!(g.workitem_id(p, Y), 0);
            assert_eq!(g.workitem_abs_id(p, Z), 0);
            assert_eq!(g.workgroup_id(p, Z), 0);
        }

        #[test]
        fn test_current_flat_id_uses_partial_size() {
            let g = GridGeometry::new(2, Dim::new(6, 4, 1), Dim::new(4, 4, 1)).unwrap();
            // Second group along X is 2 wide
            let p = Dim::new(5, 2, 0);
            assert_eq!(g.workitem_flat_id(p), 1 + 2 * 4);
            assert_eq!(g.current_workitem_flat_id(p), 1 + 2 * 2);
        }

        #[test]
        fn test_point_decodes_flat_abs_id() {
            let g = GridGeometry::new(3, Dim::new(4, 3, 2), Dim::new(2, 1, 1)).unwrap();
            assert_eq!(g.point(0), Dim::new(0, 0, 0));
            assert_eq!(g.point(5), Dim::new(1, 1, 0));
            assert_eq!(g.point(13), Dim::new(1, 0, 1));
        }

        #[test]
        fn test_point_in_workgroup() {
            let g = linear(64, 16);
            assert_eq!(g.point_in_workgroup(2, 3), Dim::new(35, 0, 0));
        }

        #[test]
        fn test_abs_id_wraps_large_coordinates() {
            let g = linear(u32::MAX, 256);
            let p = Dim::new(u32::MAX, 0, 0);
            assert_eq!(g.workitem_abs_id(p, X), 0);
        }
    }

    mod wave_tests {
        use super::*;

        #[test]
        fn test_lane_and_wave_numbers() {
            let g = linear(256, 128);
            let p = Dim::new(200, 0, 0);
            assert_eq!(g.lane_id(p, 64), 8);
            assert_eq!(g.wave_num_in_workgroup(p, 64), 1);
            assert_eq!(g.max_wave_num_in_workgroup(64), 2);
            assert_eq!(g.wave_index(p, 64), 3);
            assert_eq!(g.max_wave_index(64), 4);
        }

        #[test]
        fn test_wave_count_rounds_up() {
            let g = linear(100, 100);
            assert_eq!(g.max_wave_num_in_workgroup(64), 2);
            assert_eq!(g.wave_num_in_workgroup(Dim::new(99, 0, 0), 64), 1);
        }

        #[test]
        fn test_ragged_group_lane_ids() {
            let g = linear(70, 64);
            // Last group has 6 work-items
            assert_eq!(g.lane_id(Dim::new(69, 0, 0), 4), 1);
        }
    }

    mod iterator_tests {
        use super::*;

        #[test]
        fn test_grid_iteration_reaches_end() {
            let g = GridGeometry::new(3, Dim::new(3, 2, 2), Dim::new(2, 2, 1)).unwrap();
            let mut it = g.grid_begin();
            for _ in 0..g.total_grid_size() {
                assert!(it != g.grid_end());
                it.advance();
            }
            assert!(it == g.grid_end());
        }

        #[test]
        fn test_grid_iteration_order() {
            let g = GridGeometry::new(2, Dim::new(2, 2, 1), Dim::new(1, 1, 1)).unwrap();
            let pts: Vec<Dim> = g.points().collect();
            assert_eq!(
                pts,
                vec![
                    Dim::new(0, 0, 0),
                    Dim::new(1, 0, 0),
                    Dim::new(0, 1, 0),
                    Dim::new(1, 1, 0)
                ]
            );
        }

        #[test]
        fn test_iterators_over_distinct_geometries_differ() {
            let a = linear(4, 2);
            let b = linear(4, 2);
            assert!(a.grid_begin() != b.grid_begin());
            assert!(a.grid_begin() == a.grid_begin());
        }

        #[test]
        fn test_workgroup_iteration_linear() {
            let g = linear(50, 16);
            let group: Vec<u32> = g.workgroup_begin(1).map(Dim::x).collect();
            assert_eq!(group, (16..32).collect::<Vec<_>>());

            let last: Vec<u32> = g.workgroup_begin(3).map(Dim::x).collect();
            assert_eq!(last, vec![48, 49]);
        }

        #[test]
        fn test_workgroup_iteration_2d_stays_in_group() {
            let g = GridGeometry::new(2, Dim::new(6, 5, 1), Dim::new(4, 3, 1)).unwrap();
            // Group (1, 1) is 2x2
            let pts: Vec<Dim> = g.workgroup_begin(3).collect();
            assert_eq!(
                pts,
                vec![
                    Dim::new(4, 3, 0),
                    Dim::new(5, 3, 0),
                    Dim::new(4, 4, 0),
                    Dim::new(5, 4, 0)
                ]
            );
            assert!(pts.iter().all(|p| g.workgroup_flat_id(*p) == 3));
        }

        #[test]
        fn test_workgroup_begin_advanced_equals_end() {
            let g = linear(20, 8);
            let mut it = g.workgroup_begin(2);
            for _ in 0..4 {
                it.advance();
            }
            assert!(it == g.workgroup_end(2));
        }
    }

    mod property_tests {
        use super::*;
        use crate::grid::strategies::{arb_geometry, arb_geometry_and_point};
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_workitem_id_is_point_mod_workgroup((g, p) in arb_geometry_and_point()) {
                for dim in 0..3u16 {
                    let expected = if dim < g.dimensions() {
                        p[dim] % g.workgroup_size(dim)
                    } else {
                        0
                    };
                    prop_assert_eq!(g.workitem_id(p, dim), expected);
                }
            }

            #[test]
            fn prop_flat_abs_id_round_trip((g, p) in arb_geometry_and_point()) {
                prop_assert_eq!(g.point(g.workitem_flat_abs_id(p)), p);
            }

            #[test]
            fn prop_grid_iteration_is_bijection(g in arb_geometry()) {
                let pts: Vec<Dim> = g.points().collect();
                prop_assert_eq!(pts.len() as u64, g.total_grid_size());
                let unique: HashSet<Dim> = pts.iter().copied().collect();
                prop_assert_eq!(unique.len(), pts.len());
                for (i, p) in pts.iter().enumerate() {
                    prop_assert_eq!(g.workitem_flat_abs_id(*p), i as u64);
                }
            }

            #[test]
            fn prop_workgroups_partition_grid(g in arb_geometry()) {
                let mut seen = HashSet::new();
                for wg in 0..g.total_grid_groups() {
                    for p in g.workgroup_begin(wg) {
                        prop_assert_eq!(g.workgroup_flat_id(p), wg);
                        prop_assert!(seen.insert(p));
                    }
                }
                prop_assert_eq!(seen.len() as u64, g.total_grid_size());
            }

            #[test]
            fn prop_current_flat_id_below_current_size((g, p) in arb_geometry_and_point()) {
                prop_assert!(g.current_workitem_flat_id(p) < g.current_workgroup_size_total(p));
            }
        }
    }
}
