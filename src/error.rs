//! Error types for the fallible parts of island generation
//!
//! Only mesh construction and configuration loading can fail outright. The
//! simulation stages log and fall back to empty results instead.

use std::path::PathBuf;

/// Failures while triangulating points or closing the mesh boundary.
#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    #[error("need at least 3 points to triangulate, got {0}")]
    TooFewPoints(usize),

    #[error("point {index} has non-finite coordinates ({x}, {y})")]
    NonFinitePoint { index: usize, x: f64, y: f64 },

    #[error("triangulation produced no triangles from {0} points (all collinear?)")]
    EmptyTriangulation(usize),

    #[error("region {region} has more than one unpaired boundary side")]
    PinchedBoundary { region: usize },

    #[error("boundary walk broke at side {side} after {walked} of {expected} unpaired sides")]
    OpenBoundary {
        side: usize,
        walked: usize,
        expected: usize,
    },
}

/// Failures while loading or validating an [`crate::config::IslandConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{field} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{min_field} ({min}) must not exceed {max_field} ({max})")]
    InvertedRange {
        min_field: &'static str,
        max_field: &'static str,
        min: f64,
        max: f64,
    },
}

/// Top-level error for callers driving a whole generation run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
