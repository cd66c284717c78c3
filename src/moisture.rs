//! Moisture from distance to fresh water
//!
//! Riverbanks and lakeshores seed a breadth-first search over land. Distance
//! becomes moisture through a square-root falloff, and land moisture is then
//! spread evenly over the configured range by rank.

use std::collections::VecDeque;

use tracing::{info, warn};

use crate::config::BiomeBias;
use crate::mesh::DualMesh;
use crate::rivers::RiverNetwork;
use crate::water::WaterMap;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Moisture {
    /// Steps from the nearest seed, `None` for unreached land
    pub water_distance: Vec<Option<u32>>,
    pub region: Vec<f64>,
}

impl Moisture {
    /// Seed from rivers and lakes, then diffuse and redistribute.
    pub fn compute(mesh: &DualMesh, water: &WaterMap, rivers: &RiverNetwork, bias: &BiomeBias) -> Self {
        let seeds = find_moisture_seeds(mesh, water, &rivers.flow);
        Self::from_seeds(mesh, water, &seeds, bias)
    }

    /// Diffuse from any caller-chosen seed regions.
    pub fn from_seeds(mesh: &DualMesh, water: &WaterMap, seeds: &[usize], bias: &BiomeBias) -> Self {
        if seeds.is_empty() {
            warn!("No moisture seeds; land stays dry before redistribution");
        }
        let (water_distance, max_distance) = assign_water_distance(mesh, &water.water, seeds);
        let mut region = assign_moisture(&water.water, &water_distance, max_distance);
        redistribute_moisture(mesh, &water.water, &mut region, bias.min_moisture(), bias.max_moisture());

        info!(
            "Moisture from {} seeds, farthest land {} steps away",
            seeds.len(),
            max_distance
        );
        Self { water_distance, region }
    }
}

/// Both ends of every side carrying flow, and both ends of every lakeshore side.
pub fn find_moisture_seeds(mesh: &DualMesh, water: &WaterMap, flow: &[u32]) -> Vec<usize> {
    let mut is_seed = vec![false; mesh.num_regions()];
    for s in 0..mesh.num_solid_sides() {
        let begin = mesh.side_begin(s);
        let end = mesh.side_end(s);
        let riverbank = flow[s] > 0;
        let lakeshore = water.is_lake(begin) && !water.water[end];
        if riverbank || lakeshore {
            is_seed[begin] = true;
            is_seed[end] = true;
        }
    }
    is_seed[mesh.ghost_region()] = false;

    (0..mesh.num_regions()).filter(|&r| is_seed[r]).collect()
}

/// Plain FIFO search from the seeds through land; returns distances and the largest one.
pub fn assign_water_distance(mesh: &DualMesh, water: &[bool], seeds: &[usize]) -> (Vec<Option<u32>>, u32) {
    let mut distance: Vec<Option<u32>> = vec![None; mesh.num_regions()];
    let mut queue = VecDeque::new();
    for &r in seeds {
        if distance[r].is_none() {
            distance[r] = Some(0);
            queue.push_back(r);
        }
    }

    let mut max_distance = 1;
    while let Some(current) = queue.pop_front() {
        let next = distance[current].unwrap_or(0) + 1;
        for neighbor in mesh.region_neighbors(current) {
            if !water[neighbor] && distance[neighbor].is_none() {
                distance[neighbor] = Some(next);
                max_distance = max_distance.max(next);
                queue.push_back(neighbor);
            }
        }
    }
    (distance, max_distance)
}

/// Water is fully wet; land falls off with the square root of its distance.
pub fn assign_moisture(water: &[bool], distance: &[Option<u32>], max_distance: u32) -> Vec<f64> {
    let max = f64::from(max_distance.max(1));
    water
        .iter()
        .zip(distance)
        .map(|(&wet, d)| {
            if wet {
                1.0
            } else {
                // Unreached land counts as farthest
                let d = d.map_or(max, |d| f64::from(d).min(max));
                1.0 - (d / max).sqrt()
            }
        })
        .collect()
}

/// Replace land moisture by its rank, spaced evenly over `[min, max]`.
pub fn redistribute_moisture(mesh: &DualMesh, water: &[bool], moisture: &mut [f64], min: f64, max: f64) {
    let mut land: Vec<usize> = (0..mesh.num_solid_regions()).filter(|&r| !water[r]).collect();
    land.sort_by(|&a, &b| moisture[a].total_cmp(&moisture[b]).then(a.cmp(&b)));

    let last = land.len().saturating_sub(1).max(1) as f64;
    for (i, &r) in land.iter().enumerate() {
        moisture[r] = min + (max - min) * i as f64 / last;
    }
}
