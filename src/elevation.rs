//! Elevation from distance to the coast
//!
//! A breadth-first search runs outward from every coastal triangle, counting
//! steps over land and under the sea. Crossing a lake costs nothing and jumps
//! the queue, so a lake floods level before the search moves on. Each triangle
//! remembers the side it was reached through, which becomes its downslope
//! direction for rivers.
//!
//! Land elevations are then reshaped so high ground is rarer than low ground,
//! and regions take the mean elevation of the triangles around them.

use std::collections::VecDeque;

use rand::Rng;
use tracing::{error, info, warn};

use crate::mesh::DualMesh;
use crate::water::WaterMap;

/// Widens the mountain band; at 1.0 the top elevation barely appears.
const SCALE_FACTOR: f64 = 1.1;

/// Upper bound on any ocean region elevation.
pub const MAX_OCEAN_ELEVATION: f64 = -0.01;

/// Elevation fields for one island.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Elevation {
    /// Steps from the nearest coastal triangle, `None` if never reached
    pub coast_distance: Vec<Option<u32>>,
    /// Side leading toward the coast, `None` for the coast itself
    pub downslope: Vec<Option<usize>>,
    pub triangle: Vec<f64>,
    pub region: Vec<f64>,
}

impl Elevation {
    /// Run the coast search, land redistribution and region averaging.
    pub fn compute<R: Rng>(mesh: &DualMesh, water: &WaterMap, drainage_rng: &mut R) -> Self {
        let mut elevation = assign_triangle_elevation(mesh, water, drainage_rng);
        redistribute_triangle_elevation(&mut elevation.triangle, &water.triangle_ocean);
        elevation.region = assign_region_elevation(mesh, &elevation.triangle, &water.ocean);

        let (min, max) = elevation
            .region
            .iter()
            .fold((f64::MAX, f64::MIN), |(lo, hi), &e| (lo.min(e), hi.max(e)));
        info!("Region elevation range: {:.3} to {:.3}", min, max);
        elevation
    }
}

/// Triangles just inside the coast: owners of sides running from ocean to land.
///
/// Every triangle corner shows up in four directed sides, so checking the
/// ocean-to-land direction alone finds each coastal triangle once.
pub fn find_coast_triangles(mesh: &DualMesh, ocean: &[bool]) -> Vec<usize> {
    let mut seen = vec![false; mesh.num_triangles()];
    let mut coast = Vec::new();
    for s in 0..mesh.num_sides() {
        if ocean[mesh.side_begin(s)] && !ocean[mesh.side_end(s)] {
            let t = mesh.inner_triangle(s);
            if !seen[t] {
                seen[t] = true;
                coast.push(t);
            }
        }
    }
    coast
}

/// Search cost of crossing side `s`: free between two lake regions.
fn side_cost(mesh: &DualMesh, s: usize, water: &WaterMap) -> u32 {
    let lake = |r: usize| water.freshwater[r] && !water.ocean[r];
    if lake(mesh.side_begin(s)) && lake(mesh.side_end(s)) {
        0
    } else {
        1
    }
}

/// Coast distance, downslope sides and raw elevation for every triangle.
///
/// Leaves `region` empty. With no coastal triangles the fields stay at their
/// defaults and an error is logged.
pub fn assign_triangle_elevation<R: Rng>(mesh: &DualMesh, water: &WaterMap, drainage_rng: &mut R) -> Elevation {
    let num_triangles = mesh.num_triangles();
    let mut coast_distance: Vec<Option<u32>> = vec![None; num_triangles];
    let mut downslope: Vec<Option<usize>> = vec![None; num_triangles];
    let mut triangle = vec![0.0; num_triangles];

    let seeds = find_coast_triangles(mesh, &water.ocean);
    if seeds.is_empty() {
        error!("No triangles were marked as coast; skipping elevation");
        return Elevation {
            coast_distance,
            downslope,
            triangle,
            region: Vec::new(),
        };
    }
    for &t in &seeds {
        coast_distance[t] = Some(0);
    }

    // Deepest ocean and highest land distances seen
    let mut min_distance = 1u32;
    let mut max_distance = 1u32;

    let mut queue: VecDeque<usize> = seeds.into_iter().collect();
    while let Some(current) = queue.pop_front() {
        let current_distance = coast_distance[current].unwrap_or(0);
        let sides = mesh.triangle_sides(current);
        let offset = drainage_rng.gen_range(0..sides.len());

        for i in 0..sides.len() {
            let s = sides[(i + offset) % sides.len()];
            let cost = side_cost(mesh, s, water);
            let new_distance = current_distance + cost;
            let neighbor = mesh.outer_triangle(s);

            let closer = coast_distance[neighbor].map_or(true, |d| new_distance < d);
            if !closer {
                continue;
            }

            downslope[neighbor] = Some(mesh.opposite(s));
            update_coast_distance(mesh, water, &mut coast_distance, &mut downslope, neighbor, new_distance);

            if water.triangle_ocean[neighbor] {
                min_distance = min_distance.max(new_distance);
            } else {
                max_distance = max_distance.max(new_distance);
            }

            if cost == 0 {
                queue.push_front(neighbor);
            } else {
                queue.push_back(neighbor);
            }
        }
    }

    let unreached = coast_distance.iter().filter(|d| d.is_none()).count();
    if unreached > 0 {
        warn!("{} triangles never reached by the coast search", unreached);
    }

    for t in 0..num_triangles {
        let d = coast_distance[t].unwrap_or(0) as f64;
        triangle[t] = if water.triangle_ocean[t] {
            -d / min_distance as f64
        } else {
            d / max_distance as f64
        };
    }

    Elevation {
        coast_distance,
        downslope,
        triangle,
        region: Vec::new(),
    }
}

/// Set `t` to `distance` and relax everything that is now closer through it.
///
/// Relaxed triangles also take their new downslope side, so the side always
/// points at a triangle no further from the coast.
fn update_coast_distance(
    mesh: &DualMesh,
    water: &WaterMap,
    coast_distance: &mut [Option<u32>],
    downslope: &mut [Option<usize>],
    t: usize,
    distance: u32,
) {
    coast_distance[t] = Some(distance);
    let mut stack = vec![t];
    while let Some(current) = stack.pop() {
        let Some(d) = coast_distance[current] else {
            continue;
        };
        for s in mesh.triangle_sides(current) {
            let neighbor = mesh.outer_triangle(s);
            let candidate = d + side_cost(mesh, s, water);
            if coast_distance[neighbor].map_or(false, |cur| cur > candidate) {
                coast_distance[neighbor] = Some(candidate);
                downslope[neighbor] = Some(mesh.opposite(s));
                stack.push(neighbor);
            }
        }
    }
}

/// Reshape land elevations so the area at or below `x` is `1 - (1 - x)²`.
pub fn redistribute_triangle_elevation(elevation: &mut [f64], triangle_ocean: &[bool]) {
    let mut land: Vec<usize> = (0..elevation.len()).filter(|&t| !triangle_ocean[t]).collect();
    if land.is_empty() {
        return;
    }
    land.sort_by(|&a, &b| elevation[a].total_cmp(&elevation[b]));

    let last = (land.len() - 1).max(1) as f64;
    for (i, &t) in land.iter().enumerate() {
        let y = i as f64 / last;
        // Root of x² - 2x + y = 0, stretched by the scale factor
        let x = SCALE_FACTOR.sqrt() - (SCALE_FACTOR * (1.0 - y)).sqrt();
        elevation[t] = x.min(1.0);
    }
}

/// Mean of the surrounding triangles.
///
/// Ocean regions are capped below zero and land regions clamped to [0, 1], since
/// a coastal region also averages in the ocean triangles beside it.
pub fn assign_region_elevation(mesh: &DualMesh, triangle: &[f64], ocean: &[bool]) -> Vec<f64> {
    (0..mesh.num_regions())
        .map(|r| {
            let triangles = mesh.region_triangles(r);
            let elevation = if triangles.is_empty() {
                0.0
            } else {
                triangles.iter().map(|&t| triangle[t]).sum::<f64>() / triangles.len() as f64
            };
            if ocean[r] {
                elevation.min(MAX_OCEAN_ELEVATION)
            } else {
                elevation.clamp(0.0, 1.0)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{builder::poisson_mesh, Point};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn disc(p: Point) -> bool {
        p.x * p.x + p.y * p.y < 0.5
    }

    fn island(seed: u64) -> (DualMesh, WaterMap, Elevation) {
        let mesh = poisson_mesh(300.0, 10.0, seed);
        let water = WaterMap::classify(&mesh, &disc, 0.0, 0.9);
        let elevation = Elevation::compute(&mesh, &water, &mut ChaCha8Rng::seed_from_u64(seed));
        (mesh, water, elevation)
    }

    #[test]
    fn test_coast_triangles_touch_ocean_and_land() {
        let (mesh, water, _) = island(1);
        let coast = find_coast_triangles(&mesh, &water.ocean);
        assert!(!coast.is_empty());
        for t in coast {
            let corners = mesh.triangle_regions(t);
            assert!(corners.iter().any(|&r| water.ocean[r]));
            assert!(corners.iter().any(|&r| !water.ocean[r]));
        }
    }

    #[test]
    fn test_every_triangle_reached() {
        let (_, _, elevation) = island(2);
        assert!(elevation.coast_distance.iter().all(|d| d.is_some()));
    }

    #[test]
    fn test_land_elevation_in_unit_range() {
        let (mesh, water, elevation) = island(3);
        for t in 0..mesh.num_triangles() {
            if !water.triangle_ocean[t] {
                assert!((0.0..=1.0).contains(&elevation.triangle[t]));
            } else {
                assert!(elevation.triangle[t] <= 0.0);
            }
        }
        for r in 0..mesh.num_regions() {
            if water.ocean[r] {
                assert!(elevation.region[r] <= MAX_OCEAN_ELEVATION);
            } else {
                assert!((0.0..=1.0).contains(&elevation.region[r]));
            }
        }
    }

    #[test]
    fn test_downslope_leads_to_coast() {
        let (mesh, water, elevation) = island(4);
        for start in 0..mesh.num_triangles() {
            if water.triangle_ocean[start] {
                continue;
            }
            let mut t = start;
            let mut steps = 0;
            while let Some(s) = elevation.downslope[t] {
                let next = mesh.outer_triangle(s);
                assert!(
                    elevation.coast_distance[next] <= elevation.coast_distance[t],
                    "downslope climbs from {} to {}",
                    t,
                    next
                );
                t = next;
                steps += 1;
                assert!(steps <= mesh.num_triangles());
            }
            assert_eq!(elevation.coast_distance[t], Some(0));
        }
    }

    #[test]
    fn test_downslope_side_borders_both_triangles() {
        let (mesh, _, elevation) = island(5);
        for t in 0..mesh.num_triangles() {
            if let Some(s) = elevation.downslope[t] {
                assert_eq!(mesh.inner_triangle(s), t);
                assert_ne!(mesh.outer_triangle(s), t);
            }
        }
    }

    #[test]
    fn test_redistribution_curve() {
        let mut elevation = vec![0.9, 0.1, 0.5, -0.3, 0.2];
        let ocean = vec![false, false, false, true, false];
        redistribute_triangle_elevation(&mut elevation, &ocean);

        assert_eq!(elevation[1], 0.0);
        assert_eq!(elevation[0], 1.0_f64.min(SCALE_FACTOR.sqrt()));
        assert!(elevation[4] < elevation[2]);
        assert_eq!(elevation[3], -0.3);
        // Bottom-heavy: the median rank sits below the midpoint
        assert!(elevation[2] < 0.5);
    }

    #[test]
    fn test_redistribution_single_land_triangle() {
        let mut elevation = vec![0.7];
        redistribute_triangle_elevation(&mut elevation, &[false]);
        assert_eq!(elevation[0], 0.0);
    }

    #[test]
    fn test_lake_is_level() {
        let atoll = |p: Point| {
            let d = p.x * p.x + p.y * p.y;
            d < 0.5 && d > 0.04
        };
        let mesh = poisson_mesh(300.0, 8.0, 6);
        let water = WaterMap::classify(&mesh, &atoll, 0.0, 0.9);
        let elevation = assign_triangle_elevation(&mesh, &water, &mut ChaCha8Rng::seed_from_u64(6));

        let lake_distances: Vec<u32> = (0..mesh.num_solid_triangles())
            .filter(|&t| mesh.triangle_regions(t).iter().all(|&r| water.is_lake(r)))
            .filter_map(|t| elevation.coast_distance[t])
            .collect();
        assert!(!lake_distances.is_empty());
        assert!(lake_distances.iter().all(|&d| d == lake_distances[0]));
    }

    #[test]
    fn test_no_coast_logs_and_returns_defaults() {
        let mesh = poisson_mesh(100.0, 10.0, 7);
        let mut water = WaterMap::classify(&mesh, &disc, 0.0, 0.9);
        water.ocean.iter_mut().for_each(|o| *o = false);
        let elevation = assign_triangle_elevation(&mesh, &water, &mut ChaCha8Rng::seed_from_u64(7));
        assert!(elevation.coast_distance.iter().all(|d| d.is_none()));
        assert!(elevation.triangle.iter().all(|&e| e == 0.0));
    }
}
