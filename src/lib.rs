//! Polygonal island map generation
//!
//! Sample points are triangulated into a closed dual mesh, then a fixed
//! sequence of stages assigns water, elevation, rivers, moisture and biomes to
//! its regions and triangles. See [`island::IslandMap`] for the whole pipeline.

pub mod biomes;
pub mod config;
pub mod elevation;
pub mod error;
pub mod island;
pub mod mesh;
pub mod moisture;
pub mod points;
pub mod rivers;
pub mod seeds;
pub mod shape;
pub mod water;

pub use config::IslandConfig;
pub use error::{ConfigError, Error, MeshError, Result};
pub use island::{IslandMap, IslandSummary};
pub use mesh::{DualMesh, MeshBuilder, Point};
pub use seeds::IslandSeeds;
