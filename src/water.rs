//! Water, ocean and coast classification
//!
//! Regions are first split into water and land by the island shape. Water that
//! connects to the ghost region (outside the map edge) is ocean; any other
//! water is a lake. Coast and freshwater flags follow from neighbor counts.

use tracing::{error, info};

use crate::mesh::DualMesh;
use crate::shape::LandShape;

/// Per-region water flags plus the per-triangle ocean vote.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WaterMap {
    pub water: Vec<bool>,
    pub ocean: Vec<bool>,
    pub coast: Vec<bool>,
    /// Lakes, plus land almost surrounded by water
    pub freshwater: Vec<bool>,
    /// Triangles with at least two ocean corners
    pub triangle_ocean: Vec<bool>,
}

impl WaterMap {
    /// Run every classification step in order.
    pub fn classify<S: LandShape + ?Sized>(
        mesh: &DualMesh,
        shape: &S,
        boundary_margin: f64,
        lake_threshold: f64,
    ) -> Self {
        let water = assign_water(mesh, shape, boundary_margin);
        let ocean = assign_ocean(mesh, &water);
        let coast = assign_coast(mesh, &water, &ocean);
        let freshwater = assign_freshwater(mesh, &water, &ocean, lake_threshold);
        let triangle_ocean = assign_triangle_ocean(mesh, &ocean);
        Self {
            water,
            ocean,
            coast,
            freshwater,
            triangle_ocean,
        }
    }

    pub fn is_land(&self, r: usize) -> bool {
        !self.water[r]
    }

    pub fn is_lake(&self, r: usize) -> bool {
        self.water[r] && !self.ocean[r]
    }

    /// Turn a land region into a lake after classification.
    pub fn flood(&mut self, r: usize) {
        self.water[r] = true;
        self.freshwater[r] = true;
        self.coast[r] = false;
    }
}

/// Test every region against the shape; the map edge and ghost are always water.
pub fn assign_water<S: LandShape + ?Sized>(mesh: &DualMesh, shape: &S, boundary_margin: f64) -> Vec<bool> {
    let (width, height) = (mesh.width(), mesh.height());
    let water: Vec<bool> = (0..mesh.num_regions())
        .map(|r| {
            if mesh.is_ghost_region(r) || mesh.is_boundary_region(r) {
                return true;
            }
            let p = mesh.region_position(r);
            if p.x < boundary_margin
                || p.y < boundary_margin
                || p.x > width - boundary_margin
                || p.y > height - boundary_margin
            {
                return true;
            }
            !shape.is_land(mesh.normalized_position(r))
        })
        .collect();

    info!(
        "Assigned {} water regions out of {} total",
        water.iter().filter(|&&w| w).count(),
        water.len()
    );
    water
}

/// Flood fill from the ghost region through water to find the ocean.
pub fn assign_ocean(mesh: &DualMesh, water: &[bool]) -> Vec<bool> {
    let mut ocean = vec![false; mesh.num_regions()];
    let ghost = mesh.ghost_region();
    ocean[ghost] = true;

    let mut stack = vec![ghost];
    while let Some(r) = stack.pop() {
        for neighbor in mesh.region_neighbors(r) {
            if water[neighbor] && !ocean[neighbor] {
                ocean[neighbor] = true;
                stack.push(neighbor);
            }
        }
    }

    let ocean_count = (0..mesh.num_solid_regions()).filter(|&r| ocean[r]).count();
    if ocean_count == 0 {
        error!("Did not generate any ocean regions");
    } else {
        info!(
            "Generated {} ocean regions out of {} total",
            ocean_count,
            mesh.num_solid_regions()
        );
    }
    ocean
}

/// Land regions touching both the ocean and other land.
pub fn assign_coast(mesh: &DualMesh, water: &[bool], ocean: &[bool]) -> Vec<bool> {
    (0..mesh.num_regions())
        .map(|r| {
            if ocean[r] || mesh.is_ghost_region(r) {
                return false;
            }
            let neighbors = mesh.region_neighbors(r);
            let touches_ocean = neighbors.iter().any(|&n| ocean[n]);
            let touches_land = neighbors.iter().any(|&n| !water[n]);
            touches_ocean && touches_land
        })
        .collect()
}

/// Lakes, plus land regions whose share of water neighbors exceeds `lake_threshold`.
pub fn assign_freshwater(mesh: &DualMesh, water: &[bool], ocean: &[bool], lake_threshold: f64) -> Vec<bool> {
    (0..mesh.num_regions())
        .map(|r| {
            if ocean[r] {
                return false;
            }
            if water[r] {
                return true;
            }
            let neighbors = mesh.region_neighbors(r);
            if neighbors.is_empty() {
                return false;
            }
            let wet = neighbors.iter().filter(|&&n| water[n]).count();
            wet as f64 / neighbors.len() as f64 > lake_threshold
        })
        .collect()
}

/// A triangle is ocean when at least two of its corners are.
pub fn assign_triangle_ocean(mesh: &DualMesh, ocean: &[bool]) -> Vec<bool> {
    (0..mesh.num_triangles())
        .map(|t| mesh.triangle_regions(t).iter().filter(|&&r| ocean[r]).count() >= 2)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{builder::poisson_mesh, Point};

    fn disc(p: Point) -> bool {
        p.x * p.x + p.y * p.y < 0.5
    }

    /// Disc island with a round lake in the middle.
    fn atoll(p: Point) -> bool {
        let d = p.x * p.x + p.y * p.y;
        d < 0.5 && d > 0.04
    }

    #[test]
    fn test_boundary_and_ghost_forced_water() {
        let mesh = poisson_mesh(200.0, 10.0, 1);
        let water = assign_water(&mesh, &|_: Point| true, 0.0);
        for r in 0..mesh.num_boundary_regions() {
            assert!(water[r]);
        }
        assert!(water[mesh.ghost_region()]);
        assert!(!water[mesh.num_boundary_regions()]);
    }

    #[test]
    fn test_margin_forces_water() {
        let mesh = poisson_mesh(200.0, 10.0, 2);
        let water = assign_water(&mesh, &|_: Point| true, 30.0);
        for r in 0..mesh.num_solid_regions() {
            let p = mesh.region_position(r);
            if p.x < 30.0 || p.y < 30.0 || p.x > 170.0 || p.y > 170.0 {
                assert!(water[r], "region {} at {:?} inside margin", r, p);
            }
        }
    }

    #[test]
    fn test_ocean_reaches_all_connected_water() {
        let mesh = poisson_mesh(300.0, 10.0, 3);
        let map = WaterMap::classify(&mesh, &disc, 0.0, 0.9);

        for r in 0..mesh.num_regions() {
            if !map.water[r] {
                assert!(!map.ocean[r], "land region {} marked ocean", r);
            }
            // Water next to ocean must itself be ocean
            if map.ocean[r] {
                for n in mesh.region_neighbors(r) {
                    if map.water[n] {
                        assert!(map.ocean[n]);
                    }
                }
            }
        }
    }

    #[test]
    fn test_inland_lake_is_not_ocean() {
        let mesh = poisson_mesh(300.0, 8.0, 4);
        let map = WaterMap::classify(&mesh, &atoll, 0.0, 0.9);

        let center = (0..mesh.num_solid_regions())
            .min_by(|&a, &b| {
                let pa = mesh.normalized_position(a);
                let pb = mesh.normalized_position(b);
                (pa.x * pa.x + pa.y * pa.y).total_cmp(&(pb.x * pb.x + pb.y * pb.y))
            })
            .unwrap();
        assert!(map.water[center]);
        assert!(!map.ocean[center]);
        assert!(map.is_lake(center));
        assert!(map.freshwater[center]);
    }

    #[test]
    fn test_coast_is_land_beside_ocean() {
        let mesh = poisson_mesh(300.0, 10.0, 5);
        let map = WaterMap::classify(&mesh, &disc, 0.0, 0.9);
        let coast_count = map.coast.iter().filter(|&&c| c).count();
        assert!(coast_count > 0);
        for r in 0..mesh.num_regions() {
            if map.coast[r] {
                assert!(!map.ocean[r]);
                assert!(mesh.region_neighbors(r).iter().any(|&n| map.ocean[n]));
            }
        }
    }

    #[test]
    fn test_freshwater_never_ocean() {
        let mesh = poisson_mesh(300.0, 10.0, 6);
        let map = WaterMap::classify(&mesh, &atoll, 0.0, 0.5);
        for r in 0..mesh.num_regions() {
            assert!(!(map.freshwater[r] && map.ocean[r]));
        }
    }

    #[test]
    fn test_triangle_ocean_vote() {
        let mesh = poisson_mesh(200.0, 10.0, 7);
        let map = WaterMap::classify(&mesh, &disc, 0.0, 0.9);
        for t in 0..mesh.num_triangles() {
            let votes = mesh.triangle_regions(t).iter().filter(|&&r| map.ocean[r]).count();
            assert_eq!(map.triangle_ocean[t], votes >= 2);
            if mesh.is_ghost_triangle(t) {
                assert!(map.triangle_ocean[t]);
            }
        }
    }

    #[test]
    fn test_flood_makes_a_lake() {
        let mesh = poisson_mesh(200.0, 10.0, 8);
        let mut map = WaterMap::classify(&mesh, &disc, 0.0, 0.9);
        let r = (0..mesh.num_solid_regions()).find(|&r| map.is_land(r)).unwrap();
        map.flood(r);
        assert!(map.is_lake(r));
        assert!(map.freshwater[r]);
    }
}
