//! Staged construction of a [`DualMesh`]: boundary ring first, then interior points

use rand::Rng;
use tracing::info;

use super::delaunay::Point;
use super::dual::DualMesh;
use crate::error::MeshError;
use crate::points;

/// Collects points for a square map and builds the closed mesh.
///
/// Boundary points are always stored first, so `r < num_boundary_regions`
/// identifies them in the finished mesh.
#[derive(Clone, Debug)]
pub struct MeshBuilder {
    size: f64,
    boundary_spacing: f64,
    points: Vec<Point>,
    num_boundary_regions: usize,
}

impl MeshBuilder {
    pub fn new(size: f64, boundary_spacing: f64) -> Self {
        let points = points::boundary_points(boundary_spacing, size);
        Self {
            size,
            boundary_spacing,
            num_boundary_regions: points.len(),
            points,
        }
    }

    pub fn add_point(mut self, point: Point) -> Self {
        self.points.push(point);
        self
    }

    pub fn add_points(mut self, points: impl IntoIterator<Item = Point>) -> Self {
        self.points.extend(points);
        self
    }

    /// Fill the interior with Poisson-disc samples kept `spacing` apart.
    pub fn add_poisson<R: Rng>(mut self, rng: &mut R, spacing: f64, max_step_samples: usize) -> Self {
        let inset = self.boundary_spacing.max(0.0) / 2.0;
        let new_points = points::poisson_disc(
            &self.points,
            inset,
            self.size - inset,
            spacing,
            max_step_samples,
            rng,
        );
        self.points.extend(new_points);
        self
    }

    pub fn boundary_points(&self) -> &[Point] {
        &self.points[..self.num_boundary_regions]
    }

    pub fn clear_non_boundary_points(mut self) -> Self {
        self.points.truncate(self.num_boundary_regions);
        self
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    pub fn build(self) -> Result<DualMesh, MeshError> {
        let mesh = DualMesh::new(self.points, self.num_boundary_regions, self.size, self.size)?;
        info!(
            "Built mesh: {} regions ({} boundary), {} triangles ({} solid), {} sides",
            mesh.num_regions(),
            mesh.num_boundary_regions(),
            mesh.num_triangles(),
            mesh.num_solid_triangles(),
            mesh.num_sides()
        );
        Ok(mesh)
    }
}

/// Poisson-filled square mesh for tests across the crate.
#[cfg(test)]
pub(crate) fn poisson_mesh(size: f64, spacing: f64, seed: u64) -> DualMesh {
    use rand::SeedableRng;
    let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(seed);
    MeshBuilder::new(size, 10.0)
        .add_poisson(&mut rng, spacing, 30)
        .build()
        .unwrap()
}
