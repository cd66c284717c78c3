//! Navigation over a [`DualMesh`]
//!
//! Everything here is index arithmetic or a single array lookup, except the
//! circulation helpers which walk `opposite(next(s))` around a region. A walk
//! that fails to close within the side count is a topology bug; it is logged
//! and yields an empty result.

use tracing::error;

use super::delaunay::Point;
use super::dual::{next_side, prev_side, DualMesh};

impl DualMesh {
    #[inline]
    pub fn next_side(&self, s: usize) -> usize {
        next_side(s)
    }

    #[inline]
    pub fn prev_side(&self, s: usize) -> usize {
        prev_side(s)
    }

    #[inline]
    pub fn triangle_of_side(&self, s: usize) -> usize {
        s / 3
    }

    #[inline]
    pub fn opposite(&self, s: usize) -> usize {
        self.opposites[s]
    }

    /// Region the side starts from.
    #[inline]
    pub fn side_begin(&self, s: usize) -> usize {
        self.starts[s]
    }

    /// Region the side points to.
    #[inline]
    pub fn side_end(&self, s: usize) -> usize {
        self.starts[next_side(s)]
    }

    /// Triangle owning the side.
    #[inline]
    pub fn inner_triangle(&self, s: usize) -> usize {
        s / 3
    }

    /// Triangle on the far side of the side.
    #[inline]
    pub fn outer_triangle(&self, s: usize) -> usize {
        self.opposites[s] / 3
    }

    pub fn triangle_sides(&self, t: usize) -> [usize; 3] {
        [3 * t, 3 * t + 1, 3 * t + 2]
    }

    /// Corner regions of a triangle.
    pub fn triangle_regions(&self, t: usize) -> [usize; 3] {
        [self.starts[3 * t], self.starts[3 * t + 1], self.starts[3 * t + 2]]
    }

    /// The three triangles sharing an edge with `t`.
    pub fn triangle_neighbors(&self, t: usize) -> [usize; 3] {
        self.triangle_sides(t).map(|s| self.outer_triangle(s))
    }

    /// Sides ending at `r`, in circulation order.
    pub fn region_sides(&self, r: usize) -> Vec<usize> {
        let Some(start) = self.r_in_s.get(r).copied().flatten() else {
            return Vec::new();
        };

        let mut sides = Vec::new();
        let mut incoming = start;
        loop {
            sides.push(incoming);
            let outgoing = next_side(incoming);
            incoming = self.opposites[outgoing];
            if incoming == start {
                return sides;
            }
            if incoming >= self.num_sides() || sides.len() > self.num_sides() {
                error!(
                    "Circulation around region {} did not close (stopped at side {})",
                    r, incoming
                );
                return Vec::new();
            }
        }
    }

    /// Regions adjacent to `r`.
    pub fn region_neighbors(&self, r: usize) -> Vec<usize> {
        self.region_sides(r).into_iter().map(|s| self.starts[s]).collect()
    }

    /// Triangles with `r` as a corner.
    pub fn region_triangles(&self, r: usize) -> Vec<usize> {
        self.region_sides(r).into_iter().map(|s| s / 3).collect()
    }

    pub fn ghost_region(&self) -> usize {
        self.points.len() - 1
    }

    #[inline]
    pub fn is_ghost_side(&self, s: usize) -> bool {
        s >= self.num_solid_sides
    }

    #[inline]
    pub fn is_ghost_region(&self, r: usize) -> bool {
        r == self.points.len() - 1
    }

    #[inline]
    pub fn is_ghost_triangle(&self, t: usize) -> bool {
        self.is_ghost_side(3 * t)
    }

    /// Ghost side whose partner is a hull side of the solid mesh.
    #[inline]
    pub fn is_boundary_side(&self, s: usize) -> bool {
        self.is_ghost_side(s) && s % 3 == 0
    }

    /// Region placed on the map edge when the mesh was built.
    #[inline]
    pub fn is_boundary_region(&self, r: usize) -> bool {
        r < self.num_boundary_regions
    }

    pub fn region_position(&self, r: usize) -> Point {
        self.points[r]
    }

    pub fn triangle_position(&self, t: usize) -> Point {
        self.t_vertex[t]
    }

    /// Region position scaled into [-1, 1] on both axes.
    pub fn normalized_position(&self, r: usize) -> Point {
        let p = self.points[r];
        Point::new(
            2.0 * p.x / self.width - 1.0,
            2.0 * p.y / self.height - 1.0,
        )
    }
}
