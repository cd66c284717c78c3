//! Half-edge dual mesh with a ghost boundary
//!
//! Regions are the input points, triangles are the Delaunay faces and sides are
//! directed half-edges stored three per triangle (`3t`, `3t + 1`, `3t + 2`).
//! Side `s` starts at region `starts[s]` and ends where `next(s)` starts.
//!
//! Sides on the convex hull have no partner in the raw triangulation. Ghost
//! augmentation adds one extra region in the middle of the map and a fan of
//! ghost triangles linking every hull side to it, so that after construction
//! `opposite(opposite(s)) == s` holds for every side without exception.

use std::collections::HashMap;

use tracing::debug;

use super::delaunay::{self, Point, Triangle};
use crate::error::MeshError;

/// Raw side arrays before the boundary is closed.
#[derive(Clone, Debug)]
pub struct HalfEdges {
    /// Region each side starts from
    pub starts: Vec<usize>,
    /// Paired side across the same edge, `None` on the hull
    pub opposites: Vec<Option<usize>>,
}

impl HalfEdges {
    /// Lay out the sides of counter-clockwise triangles and pair them up.
    pub fn from_triangles(triangles: &[Triangle]) -> Self {
        let starts: Vec<usize> = triangles.iter().flat_map(|t| t.vertices).collect();

        let mut by_endpoints: HashMap<(usize, usize), usize> = HashMap::with_capacity(starts.len());
        for s in 0..starts.len() {
            by_endpoints.insert((starts[s], starts[next_side(s)]), s);
        }

        let opposites = (0..starts.len())
            .map(|s| by_endpoints.get(&(starts[next_side(s)], starts[s])).copied())
            .collect();

        Self { starts, opposites }
    }

    pub fn num_sides(&self) -> usize {
        self.starts.len()
    }

    pub fn num_unpaired(&self) -> usize {
        self.opposites.iter().filter(|o| o.is_none()).count()
    }
}

/// Side arrays after ghost augmentation.
#[derive(Clone, Debug)]
pub struct ClosedHalfEdges {
    pub starts: Vec<usize>,
    pub opposites: Vec<usize>,
    pub num_solid_sides: usize,
}

/// Close every unpaired side with a ghost triangle pointing at `ghost_region`.
///
/// The unpaired sides must form one simple ring: a region with two unpaired
/// sides leaving it, or a walk that does not return to its start, is rejected.
pub fn add_ghost_structure(
    half_edges: HalfEdges,
    ghost_region: usize,
) -> Result<ClosedHalfEdges, MeshError> {
    let HalfEdges { mut starts, opposites } = half_edges;
    let num_solid_sides = starts.len();

    let mut unpaired_from: HashMap<usize, usize> = HashMap::new();
    let mut first_unpaired = None;
    for s in 0..num_solid_sides {
        if opposites[s].is_none() {
            if unpaired_from.insert(starts[s], s).is_some() {
                return Err(MeshError::PinchedBoundary { region: starts[s] });
            }
            first_unpaired.get_or_insert(s);
        }
    }

    let num_unpaired = unpaired_from.len();
    let num_sides = num_solid_sides + 3 * num_unpaired;
    starts.resize(num_sides, 0);
    let mut paired: Vec<usize> = opposites
        .into_iter()
        .map(|o| o.unwrap_or(usize::MAX))
        .chain(std::iter::repeat(usize::MAX).take(3 * num_unpaired))
        .collect();

    let Some(first) = first_unpaired else {
        return Ok(ClosedHalfEdges {
            starts,
            opposites: paired,
            num_solid_sides,
        });
    };

    let mut s = first;
    for i in 0..num_unpaired {
        let ghost_side = num_solid_sides + 3 * i;
        let end = starts[next_side(s)];

        paired[s] = ghost_side;
        paired[ghost_side] = s;
        starts[ghost_side] = end;
        starts[ghost_side + 1] = starts[s];
        starts[ghost_side + 2] = ghost_region;

        let k = num_solid_sides + (3 * i + 4) % (3 * num_unpaired);
        paired[ghost_side + 2] = k;
        paired[k] = ghost_side + 2;

        s = match unpaired_from.get(&end) {
            Some(&next) => next,
            None => {
                return Err(MeshError::OpenBoundary {
                    side: s,
                    walked: i + 1,
                    expected: num_unpaired,
                })
            }
        };
        if s == first && i + 1 < num_unpaired {
            return Err(MeshError::OpenBoundary {
                side: s,
                walked: i + 1,
                expected: num_unpaired,
            });
        }
    }

    if s != first {
        return Err(MeshError::OpenBoundary {
            side: s,
            walked: num_unpaired,
            expected: num_unpaired,
        });
    }

    debug!(
        "Closed mesh boundary: {} solid sides, {} ghost triangles",
        num_solid_sides, num_unpaired
    );

    Ok(ClosedHalfEdges {
        starts,
        opposites: paired,
        num_solid_sides,
    })
}

/// Side following `s` within its triangle.
#[inline]
pub const fn next_side(s: usize) -> usize {
    if s % 3 == 2 {
        s - 2
    } else {
        s + 1
    }
}

/// Side preceding `s` within its triangle.
#[inline]
pub const fn prev_side(s: usize) -> usize {
    if s % 3 == 0 {
        s + 2
    } else {
        s - 1
    }
}

/// The finished dual mesh. Read-only once built.
#[derive(Clone, Debug)]
pub struct DualMesh {
    /// Region positions, ghost region last
    pub(crate) points: Vec<Point>,
    /// Region each side starts from
    pub(crate) starts: Vec<usize>,
    pub(crate) opposites: Vec<usize>,
    /// One side ending at each region, for circulation
    pub(crate) r_in_s: Vec<Option<usize>>,
    /// Triangle positions: circumcenters, or pushed-out hull midpoints for ghosts
    pub(crate) t_vertex: Vec<Point>,
    pub(crate) num_boundary_regions: usize,
    pub(crate) num_solid_sides: usize,
    pub(crate) width: f64,
    pub(crate) height: f64,
}

impl DualMesh {
    /// Triangulate `points` and build the closed mesh.
    ///
    /// The first `num_boundary_regions` points are treated as the map edge.
    pub fn new(
        points: Vec<Point>,
        num_boundary_regions: usize,
        width: f64,
        height: f64,
    ) -> Result<Self, MeshError> {
        let triangles = delaunay::triangulate(&points)?;
        Self::from_triangles(points, &triangles, num_boundary_regions, width, height)
    }

    /// Build the closed mesh from an existing triangulation of `points`.
    pub fn from_triangles(
        mut points: Vec<Point>,
        triangles: &[Triangle],
        num_boundary_regions: usize,
        width: f64,
        height: f64,
    ) -> Result<Self, MeshError> {
        if triangles.is_empty() {
            return Err(MeshError::EmptyTriangulation(points.len()));
        }

        let ghost_region = points.len();
        points.push(Point::new(width / 2.0, height / 2.0));

        let closed = add_ghost_structure(HalfEdges::from_triangles(triangles), ghost_region)?;
        let num_sides = closed.starts.len();

        let mut r_in_s = vec![None; points.len()];
        for s in 0..num_sides {
            let end = closed.starts[next_side(s)];
            if r_in_s[end].is_none() {
                r_in_s[end] = Some(s);
            }
        }

        let mut t_vertex: Vec<Point> = triangles.iter().map(|t| t.circumcenter).collect();
        for ghost_side in (closed.num_solid_sides..num_sides).step_by(3) {
            // The paired hull side runs counter-clockwise, so outward is to its right
            let hull_side = closed.opposites[ghost_side];
            let a = points[closed.starts[hull_side]];
            let b = points[closed.starts[next_side(hull_side)]];
            let mid = a.midpoint(&b);
            let (dx, dy) = (b.x - a.x, b.y - a.y);
            t_vertex.push(Point::new(mid.x + 0.5 * dy, mid.y - 0.5 * dx));
        }

        Ok(Self {
            points,
            starts: closed.starts,
            opposites: closed.opposites,
            r_in_s,
            t_vertex,
            num_boundary_regions,
            num_solid_sides: closed.num_solid_sides,
            width,
            height,
        })
    }

    pub fn num_regions(&self) -> usize {
        self.points.len()
    }

    pub fn num_solid_regions(&self) -> usize {
        self.points.len() - 1
    }

    pub fn num_sides(&self) -> usize {
        self.starts.len()
    }

    pub fn num_solid_sides(&self) -> usize {
        self.num_solid_sides
    }

    pub fn num_triangles(&self) -> usize {
        self.starts.len() / 3
    }

    pub fn num_solid_triangles(&self) -> usize {
        self.num_solid_sides / 3
    }

    pub fn num_boundary_regions(&self) -> usize {
        self.num_boundary_regions
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Region each side starts from, indexed by side.
    pub fn side_starts(&self) -> &[usize] {
        &self.starts
    }

    /// Opposite side, indexed by side.
    pub fn opposites(&self) -> &[usize] {
        &self.opposites
    }

    pub fn region_positions(&self) -> &[Point] {
        &self.points
    }

    pub fn triangle_positions(&self) -> &[Point] {
        &self.t_vertex
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Eight points on a ring around one interior point.
    fn octagon() -> Vec<Point> {
        let mut points: Vec<Point> = (0..8)
            .map(|i| {
                let angle = i as f64 * std::f64::consts::TAU / 8.0;
                Point::new(50.0 + 40.0 * angle.cos(), 50.0 + 40.0 * angle.sin())
            })
            .collect();
        points.push(Point::new(50.3, 49.8));
        points
    }

    fn assert_reciprocal(mesh: &DualMesh) {
        for s in 0..mesh.num_sides() {
            let o = mesh.opposites[s];
            assert!(o < mesh.num_sides(), "side {} has no partner", s);
            assert_eq!(mesh.opposites[o], s, "side {} not reciprocal", s);
            assert_ne!(o, s);
        }
    }

    #[test]
    fn test_next_prev_side() {
        assert_eq!(next_side(0), 1);
        assert_eq!(next_side(2), 0);
        assert_eq!(next_side(5), 3);
        assert_eq!(prev_side(3), 5);
        assert_eq!(prev_side(4), 3);
        for s in 0..30 {
            assert_eq!(prev_side(next_side(s)), s);
            assert_eq!(s / 3, next_side(s) / 3);
        }
    }

    #[test]
    fn test_half_edges_pair_interior_sides() {
        let points = octagon();
        let triangles = delaunay::triangulate(&points).unwrap();
        let half_edges = HalfEdges::from_triangles(&triangles);
        assert_eq!(half_edges.num_sides(), 3 * triangles.len());
        assert_eq!(half_edges.num_unpaired(), 8);
        for (s, o) in half_edges.opposites.iter().enumerate() {
            if let Some(o) = *o {
                assert_eq!(half_edges.opposites[o], Some(s));
            }
        }
    }

    #[test]
    fn test_octagon_gets_eight_ghost_triangles() {
        let mesh = DualMesh::new(octagon(), 8, 100.0, 100.0).unwrap();

        assert_eq!(mesh.num_solid_triangles(), 8);
        assert_eq!(mesh.num_triangles() - mesh.num_solid_triangles(), 8);
        assert_eq!(mesh.num_regions(), 10);
        assert_reciprocal(&mesh);

        let ghost_region = mesh.num_regions() - 1;
        for ghost_side in (mesh.num_solid_sides..mesh.num_sides()).step_by(3) {
            assert!(mesh.opposites[ghost_side] < mesh.num_solid_sides);
            assert_eq!(mesh.starts[ghost_side + 2], ghost_region);
        }
    }

    #[test]
    fn test_ghost_region_sits_in_map_center() {
        let mesh = DualMesh::new(octagon(), 8, 100.0, 60.0).unwrap();
        assert_eq!(mesh.points[mesh.num_regions() - 1], Point::new(50.0, 30.0));
    }

    #[test]
    fn test_ghost_triangle_positions_lie_outside_hull() {
        let mesh = DualMesh::new(octagon(), 8, 100.0, 100.0).unwrap();
        let center = Point::new(50.0, 50.0);
        for t in mesh.num_solid_triangles()..mesh.num_triangles() {
            assert!(mesh.t_vertex[t].distance(&center) > 35.0);
        }
    }

    #[test]
    fn test_every_region_has_incoming_side() {
        let mesh = DualMesh::new(octagon(), 8, 100.0, 100.0).unwrap();
        for r in 0..mesh.num_regions() {
            let s = mesh.r_in_s[r].unwrap();
            assert_eq!(mesh.starts[next_side(s)], r);
        }
    }

    #[test]
    fn test_pinched_boundary_rejected() {
        // Two triangles touching at a single vertex (region 0)
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(-1.0, 0.0),
            Point::new(0.0, -1.0),
        ];
        let triangles = vec![
            Triangle::new([0, 1, 2], [pts[0], pts[1], pts[2]]),
            Triangle::new([0, 3, 4], [pts[0], pts[3], pts[4]]),
        ];
        let result = DualMesh::from_triangles(pts.to_vec(), &triangles, 0, 2.0, 2.0);
        assert!(matches!(result, Err(MeshError::PinchedBoundary { region: 0 })));
    }

    #[test]
    fn test_disjoint_rings_rejected() {
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(5.0, 5.0),
            Point::new(6.0, 5.0),
            Point::new(5.0, 6.0),
        ];
        let triangles = vec![
            Triangle::new([0, 1, 2], [pts[0], pts[1], pts[2]]),
            Triangle::new([3, 4, 5], [pts[3], pts[4], pts[5]]),
        ];
        let result = DualMesh::from_triangles(pts.to_vec(), &triangles, 0, 10.0, 10.0);
        assert!(matches!(result, Err(MeshError::OpenBoundary { walked: 3, expected: 6, .. })));
    }

    fn point_set() -> impl Strategy<Value = Vec<Point>> {
        prop::collection::hash_set((0u32..200, 0u32..200), 6..60).prop_map(|cells| {
            // Distinct grid cells with a per-cell jitter keep points apart
            cells
                .into_iter()
                .map(|(x, y)| {
                    let jx = ((x * 31 + y * 17) % 97) as f64 / 400.0;
                    let jy = ((x * 13 + y * 29) % 89) as f64 / 400.0;
                    Point::new(x as f64 * 5.0 + jx, y as f64 * 5.0 + jy)
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_every_side_is_reciprocal(points in point_set()) {
            if let Ok(mesh) = DualMesh::new(points, 0, 1000.0, 1000.0) {
                for s in 0..mesh.num_sides() {
                    prop_assert_eq!(mesh.opposites[mesh.opposites[s]], s);
                }
            }
        }
    }
}
