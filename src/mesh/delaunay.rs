//! Bowyer-Watson Delaunay triangulation
//!
//! All input points are enclosed in one synthetic super-triangle, then inserted
//! one at a time. Each insertion removes every triangle whose circumcircle
//! contains the new point, collects the boundary of the resulting cavity (edges
//! seen exactly once among the removed triangles) and fans new triangles from
//! the point to that boundary. Triangles still touching a super-triangle vertex
//! are dropped at the end.
//!
//! Degenerate input (duplicates, three collinear points forming a triangle) is
//! not guarded against: circumcenters of zero-area triangles come out as
//! NaN/inf and propagate.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::MeshError;

/// A 2D coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_squared(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn distance(&self, other: &Point) -> f64 {
        self.distance_squared(other).sqrt()
    }

    pub fn midpoint(&self, other: &Point) -> Point {
        Point::new(0.5 * (self.x + other.x), 0.5 * (self.y + other.y))
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Twice the signed area of (a, b, c); positive when counter-clockwise.
pub fn orient(a: &Point, b: &Point, c: &Point) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Circumcenter of (p1, p2, p3) by the determinant formula.
pub fn circumcenter(p1: &Point, p2: &Point, p3: &Point) -> Point {
    let ab = p1.x * p1.x + p1.y * p1.y;
    let cd = p2.x * p2.x + p2.y * p2.y;
    let ef = p3.x * p3.x + p3.y * p3.y;

    let x = (ab * (p3.y - p2.y) + cd * (p1.y - p3.y) + ef * (p2.y - p1.y))
        / (p1.x * (p3.y - p2.y) + p2.x * (p1.y - p3.y) + p3.x * (p2.y - p1.y))
        / 2.0;
    let y = (ab * (p3.x - p2.x) + cd * (p1.x - p3.x) + ef * (p2.x - p1.x))
        / (p1.y * (p3.x - p2.x) + p2.y * (p1.x - p3.x) + p3.y * (p2.x - p1.x))
        / 2.0;

    Point::new(x, y)
}

/// An undirected edge between two point indices.
///
/// Endpoint order is kept (the cavity fan relies on it) but ignored by
/// equality and hashing.
#[derive(Clone, Copy, Debug)]
pub struct Edge {
    pub a: usize,
    pub b: usize,
}

impl Edge {
    pub fn new(a: usize, b: usize) -> Self {
        Self { a, b }
    }

    fn key(&self) -> (usize, usize) {
        (self.a.min(self.b), self.a.max(self.b))
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Edge {}

impl Hash for Edge {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

/// One triangle of the triangulation.
#[derive(Clone, Copy, Debug)]
pub struct Triangle {
    /// Indices into the input point list, counter-clockwise.
    pub vertices: [usize; 3],
    /// Corner positions, same order as `vertices`.
    pub points: [Point; 3],
    pub circumcenter: Point,
    radius_squared: f64,
}

impl Triangle {
    /// Build a triangle, reordering the corners counter-clockwise.
    pub fn new(vertices: [usize; 3], points: [Point; 3]) -> Self {
        let (vertices, points) = if orient(&points[0], &points[1], &points[2]) < 0.0 {
            (
                [vertices[0], vertices[2], vertices[1]],
                [points[0], points[2], points[1]],
            )
        } else {
            (vertices, points)
        };
        let circumcenter = circumcenter(&points[0], &points[1], &points[2]);
        Self {
            vertices,
            points,
            circumcenter,
            radius_squared: circumcenter.distance_squared(&points[0]),
        }
    }

    pub fn edges(&self) -> [Edge; 3] {
        let [a, b, c] = self.vertices;
        [Edge::new(a, b), Edge::new(b, c), Edge::new(c, a)]
    }

    pub fn contains_vertex(&self, index: usize) -> bool {
        self.vertices.contains(&index)
    }

    /// Strict in-circle test: points exactly on the circle are outside.
    pub fn circumcircle_contains(&self, p: &Point) -> bool {
        let [a, b, c] = self.points;
        let (adx, ady) = (a.x - p.x, a.y - p.y);
        let (bdx, bdy) = (b.x - p.x, b.y - p.y);
        let (cdx, cdy) = (c.x - p.x, c.y - p.y);
        let det = (adx * adx + ady * ady) * (bdx * cdy - cdx * bdy)
            - (bdx * bdx + bdy * bdy) * (adx * cdy - cdx * ady)
            + (cdx * cdx + cdy * cdy) * (adx * bdy - bdx * ady);
        if det.is_nan() {
            // Degenerate triangle: fall back to the circumcenter distance.
            return p.distance_squared(&self.circumcenter) < self.radius_squared;
        }
        det > 0.0
    }

    pub fn area(&self) -> f64 {
        0.5 * orient(&self.points[0], &self.points[1], &self.points[2]).abs()
    }
}

impl PartialEq for Triangle {
    fn eq(&self, other: &Self) -> bool {
        let mut mine = self.vertices;
        let mut theirs = other.vertices;
        mine.sort_unstable();
        theirs.sort_unstable();
        mine == theirs
    }
}

/// Triangulate `points`, returning triangles that reference the input indices.
pub fn triangulate(points: &[Point]) -> Result<Vec<Triangle>, MeshError> {
    if points.len() < 3 {
        return Err(MeshError::TooFewPoints(points.len()));
    }
    if let Some((index, p)) = points.iter().enumerate().find(|(_, p)| !p.is_finite()) {
        return Err(MeshError::NonFinitePoint {
            index,
            x: p.x,
            y: p.y,
        });
    }

    let mut min_x = points[0].x;
    let mut min_y = points[0].y;
    let mut max_x = min_x;
    let mut max_y = min_y;
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    let delta_max = (max_x - min_x).max(max_y - min_y).max(f64::EPSILON);
    let mid_x = (min_x + max_x) / 2.0;
    let mid_y = (min_y + max_y) / 2.0;

    // Super-triangle vertices live past the end of the input indices
    let n = points.len();
    let mut all_points = points.to_vec();
    all_points.push(Point::new(mid_x - 20.0 * delta_max, mid_y - delta_max));
    all_points.push(Point::new(mid_x, mid_y + 20.0 * delta_max));
    all_points.push(Point::new(mid_x + 20.0 * delta_max, mid_y - delta_max));

    let mut triangles = vec![make_triangle(&all_points, [n, n + 1, n + 2])];

    for (i, p) in points.iter().enumerate() {
        let mut polygon: Vec<Edge> = Vec::new();
        let mut edge_counts: HashMap<Edge, u32> = HashMap::new();

        triangles.retain(|t| {
            if t.circumcircle_contains(p) {
                for edge in t.edges() {
                    *edge_counts.entry(edge).or_insert(0) += 1;
                    polygon.push(edge);
                }
                false
            } else {
                true
            }
        });

        // Shared edges are interior to the cavity
        for edge in polygon {
            if edge_counts.get(&edge) == Some(&1) {
                triangles.push(make_triangle(&all_points, [edge.a, edge.b, i]));
            }
        }
    }

    triangles.retain(|t| !(t.contains_vertex(n) || t.contains_vertex(n + 1) || t.contains_vertex(n + 2)));

    if triangles.is_empty() {
        return Err(MeshError::EmptyTriangulation(n));
    }
    Ok(triangles)
}

fn make_triangle(points: &[Point], vertices: [usize; 3]) -> Triangle {
    Triangle::new(
        vertices,
        [points[vertices[0]], points[vertices[1]], points[vertices[2]]],
    )
}
