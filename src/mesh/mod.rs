//! Delaunay triangulation and the half-edge dual mesh built on top of it
//!
//! Indices are plain `usize`: regions `r`, triangles `t`, sides `s`.

pub mod builder;
pub mod delaunay;
pub mod dual;
mod queries;

pub use builder::MeshBuilder;
pub use delaunay::{circumcenter, orient, triangulate, Edge, Point, Triangle};
pub use dual::{add_ghost_structure, next_side, prev_side, ClosedHalfEdges, DualMesh, HalfEdges};
