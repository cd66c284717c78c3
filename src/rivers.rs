//! River network
//!
//! Springs are picked from land triangles in an elevation band and traced
//! toward the sea. Each step usually follows the triangle's downslope side but
//! may wander into standing water or a random neighbor. A trace that runs into
//! an existing river becomes its tributary. A trace never steps back onto its
//! own triangles; one that dead-ends or stays too short on its own is thrown
//! away whole.
//!
//! River identity is an index into [`RiverNetwork::rivers`]; a river can only
//! feed into one committed before it, so the feeding graph is a forest.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, error, info, warn};

use crate::config::RiverConfig;
use crate::elevation::Elevation;
use crate::mesh::DualMesh;
use crate::water::WaterMap;

/// Position of a triangle within a river.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RiverSection {
    pub river: usize,
    /// Index into that river's `triangles`
    pub index: usize,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct River {
    /// Triangles from source to mouth
    pub triangles: Vec<usize>,
    /// Side crossed when leaving the triangle at the same index
    pub sides: Vec<usize>,
    /// Where this river joins another, if it does
    pub feeds_into: Option<RiverSection>,
    /// Ended at the coast rather than in another river
    pub reaches_sea: bool,
}

impl River {
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn source(&self) -> Option<usize> {
        self.triangles.first().copied()
    }

    /// Last side crossed: into the sea, or into the river this one feeds.
    pub fn mouth(&self) -> Option<usize> {
        self.sides.last().copied()
    }

    pub fn is_tributary(&self) -> bool {
        self.feeds_into.is_some()
    }

    /// Reaches the sea itself or through the rivers it feeds.
    pub fn terminates(&self, network: &RiverNetwork) -> bool {
        let mut river = self;
        // Feeding only points to earlier rivers, so this walk is bounded
        for _ in 0..=network.rivers.len() {
            if river.reaches_sea {
                return true;
            }
            match river.feeds_into {
                Some(join) => river = &network.rivers[join.river],
                None => return false,
            }
        }
        false
    }
}

/// All rivers of one island plus the per-side flow they carry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RiverNetwork {
    pub rivers: Vec<River>,
    /// Flow across each side
    pub flow: Vec<u32>,
    river_at: Vec<Option<RiverSection>>,
}

/// A trace that has not been committed yet.
struct PendingRiver {
    triangles: Vec<usize>,
    sides: Vec<usize>,
    feeds_into: Option<RiverSection>,
    reaches_sea: bool,
}

impl RiverNetwork {
    pub fn empty(mesh: &DualMesh) -> Self {
        Self {
            rivers: Vec::new(),
            flow: vec![0; mesh.num_sides()],
            river_at: vec![None; mesh.num_triangles()],
        }
    }

    /// Trace rivers from shuffled springs, then pool rivers whose sources touch.
    pub fn generate<R: Rng>(
        mesh: &DualMesh,
        water: &mut WaterMap,
        elevation: &Elevation,
        config: &RiverConfig,
        rng: &mut R,
    ) -> Self {
        let mut network = Self::empty(mesh);
        let mut springs = find_spring_triangles(
            mesh,
            water,
            &elevation.triangle,
            config.min_spring_elevation,
            config.max_spring_elevation,
        );
        springs.shuffle(rng);
        debug!("Found {} spring candidates", springs.len());

        let mut discarded = 0;
        for &spring in &springs {
            if network.rivers.len() >= config.num_rivers {
                break;
            }
            if network.river_at[spring].is_some() {
                continue;
            }
            match network.trace(mesh, water, elevation, config, spring, rng) {
                Some(pending) if pending.triangles.len() > config.min_river_sections || pending.feeds_into.is_some() => {
                    network.commit(pending);
                }
                Some(_) | None => discarded += 1,
            }
        }

        if network.rivers.len() < config.num_rivers {
            warn!(
                "Asked for {} rivers but only {} could be made",
                config.num_rivers,
                network.rivers.len()
            );
        }

        let lakes = network.merge_source_lakes(mesh, water, config.lake_conversion, rng);
        info!(
            "Created {} rivers ({} tributaries), discarded {}, pooled {} lake regions",
            network.rivers.len(),
            network.rivers.iter().filter(|r| r.is_tributary()).count(),
            discarded,
            lakes
        );
        network
    }

    pub fn river_at(&self, t: usize) -> Option<RiverSection> {
        self.river_at.get(t).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.rivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rivers.is_empty()
    }

    /// Walk from `spring` until the sea or another river; `None` if the walk fails.
    fn trace<R: Rng>(
        &self,
        mesh: &DualMesh,
        water: &WaterMap,
        elevation: &Elevation,
        config: &RiverConfig,
        spring: usize,
        rng: &mut R,
    ) -> Option<PendingRiver> {
        let mut pending = PendingRiver {
            triangles: Vec::new(),
            sides: Vec::new(),
            feeds_into: None,
            reaches_sea: false,
        };
        let mut visited: HashSet<usize> = HashSet::new();
        let mut current = spring;

        loop {
            visited.insert(current);
            if let Some(join) = self.river_at(current) {
                pending.feeds_into = Some(join);
                return Some(pending);
            }
            pending.triangles.push(current);

            if elevation.downslope[current].is_none() {
                pending.sides.push(mouth_side(mesh, water, current));
                pending.reaches_sea = true;
                return Some(pending);
            }

            // Never offers a triangle already in the trace
            let Some(s) = self.choose_next_side(mesh, water, elevation, config, current, &visited, rng) else {
                warn!("River from triangle {} found no way out of triangle {}; discarding", spring, current);
                return None;
            };
            pending.sides.push(s);

            let next = mesh.outer_triangle(s);
            if water.triangle_ocean[next] {
                pending.reaches_sea = true;
                return Some(pending);
            }
            current = next;
        }
    }

    fn choose_next_side<R: Rng>(
        &self,
        mesh: &DualMesh,
        water: &WaterMap,
        elevation: &Elevation,
        config: &RiverConfig,
        current: usize,
        visited: &HashSet<usize>,
        rng: &mut R,
    ) -> Option<usize> {
        if rng.gen::<f64>() < config.downstream_bias {
            // A downslope back into this trace would loop; wander instead
            if let Some(s) = elevation.downslope[current].filter(|&s| !visited.contains(&mesh.outer_triangle(s))) {
                return Some(s);
            }
        }

        let mut candidates: Vec<usize> = mesh
            .triangle_sides(current)
            .into_iter()
            .filter(|&s| !visited.contains(&mesh.outer_triangle(s)))
            .collect();

        for &s in &candidates {
            let has_water = mesh
                .triangle_regions(mesh.outer_triangle(s))
                .iter()
                .any(|&r| water.water[r]);
            if has_water && rng.gen::<f64>() < config.standing_water_bias {
                return Some(s);
            }
        }

        while !candidates.is_empty() {
            let s = candidates.swap_remove(rng.gen_range(0..candidates.len()));
            if self.river_at(mesh.outer_triangle(s)).is_some() && rng.gen::<f64>() >= config.join_bias {
                continue;
            }
            return Some(s);
        }
        None
    }

    fn commit(&mut self, pending: PendingRiver) {
        let index = self.rivers.len();
        for (i, &t) in pending.triangles.iter().enumerate() {
            self.river_at[t] = Some(RiverSection { river: index, index: i });
        }
        // Flow grows by one for every triangle drained so far
        for (i, &s) in pending.sides.iter().enumerate() {
            self.flow[s] += i as u32 + 1;
        }
        if let Some(join) = pending.feeds_into {
            for &s in &self.rivers[join.river].sides[join.index..] {
                self.flow[s] += 1;
            }
        }

        self.rivers.push(River {
            triangles: pending.triangles,
            sides: pending.sides,
            feeds_into: pending.feeds_into,
            reaches_sea: pending.reaches_sea,
        });
    }

    /// Pool pairs of rivers whose sources share an inland corner.
    ///
    /// Each pair converts with probability `lake_conversion`; once paired, the
    /// second river is not considered again. Returns the number of flooded regions.
    pub fn merge_source_lakes<R: Rng>(
        &self,
        mesh: &DualMesh,
        water: &mut WaterMap,
        lake_conversion: f64,
        rng: &mut R,
    ) -> usize {
        let mut remaining: Vec<usize> = (0..self.rivers.len()).collect();
        let mut flooded = 0;
        while !remaining.is_empty() {
            let r1 = remaining.remove(0);
            let Some(source1) = self.rivers[r1].source() else {
                continue;
            };
            if touches_coast(mesh, water, source1) {
                continue;
            }
            let corners1 = mesh.triangle_regions(source1);

            let mut paired = Vec::new();
            for &r2 in &remaining {
                let feeds = |a: usize, b: usize| self.rivers[a].feeds_into.map(|j| j.river) == Some(b);
                if feeds(r1, r2) || feeds(r2, r1) {
                    continue;
                }
                let Some(source2) = self.rivers[r2].source() else {
                    continue;
                };
                if touches_coast(mesh, water, source2) {
                    continue;
                }

                let shared: Vec<usize> = mesh
                    .triangle_regions(source2)
                    .into_iter()
                    .filter(|r| corners1.contains(r) && !water.coast[*r])
                    .collect();
                if shared.is_empty() {
                    continue;
                }

                if rng.gen::<f64>() < lake_conversion {
                    for r in shared {
                        if !water.water[r] {
                            water.flood(r);
                            flooded += 1;
                        }
                    }
                }
                paired.push(r2);
            }
            remaining.retain(|r| !paired.contains(r));
        }
        flooded
    }
}

/// Solid land triangles within the elevation band with no water corner.
pub fn find_spring_triangles(
    mesh: &DualMesh,
    water: &WaterMap,
    triangle_elevation: &[f64],
    min_elevation: f64,
    max_elevation: f64,
) -> Vec<usize> {
    (0..mesh.num_solid_triangles())
        .filter(|&t| {
            let e = triangle_elevation[t];
            e >= min_elevation
                && e <= max_elevation
                && !mesh.triangle_regions(t).iter().any(|&r| water.water[r])
        })
        .collect()
}

fn touches_coast(mesh: &DualMesh, water: &WaterMap, t: usize) -> bool {
    mesh.triangle_regions(t).iter().any(|&r| water.coast[r])
}

/// Side out of a coastal triangle toward the most ocean.
fn mouth_side(mesh: &DualMesh, water: &WaterMap, t: usize) -> usize {
    let ocean_corners = |s: usize| {
        mesh.triangle_regions(mesh.outer_triangle(s))
            .iter()
            .filter(|&&r| water.ocean[r])
            .count()
    };
    let sides = mesh.triangle_sides(t);
    let mut best = sides[0];
    for &s in &sides[1..] {
        if ocean_corners(s) > ocean_corners(best) {
            best = s;
        }
    }
    best
}

/// The coastal triangle each triangle drains into, and how much drains there.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Watersheds {
    /// Drainage outlet per triangle; `None` for ocean triangles
    pub outlet: Vec<Option<usize>>,
    /// Triangles draining into each outlet, indexed by triangle
    pub size: Vec<usize>,
}

/// Follow downslope sides from every land triangle to its outlet.
pub fn assign_watersheds(mesh: &DualMesh, water: &WaterMap, elevation: &Elevation) -> Watersheds {
    let num_triangles = mesh.num_triangles();
    let mut outlet: Vec<Option<usize>> = vec![None; num_triangles];
    let mut size = vec![0; num_triangles];
    let mut path = Vec::new();

    for start in 0..num_triangles {
        if water.triangle_ocean[start] || outlet[start].is_some() {
            continue;
        }

        path.clear();
        let mut t = start;
        let found = loop {
            if let Some(o) = outlet[t] {
                break Some(o);
            }
            path.push(t);
            if path.len() > num_triangles {
                error!("Downslope chain from triangle {} never reaches the coast", start);
                break None;
            }
            match elevation.downslope[t] {
                Some(s) => {
                    let next = mesh.outer_triangle(s);
                    if water.triangle_ocean[next] {
                        break Some(t);
                    }
                    t = next;
                }
                None => break Some(t),
            }
        };

        if let Some(o) = found {
            for &p in &path {
                outlet[p] = Some(o);
            }
        }
    }

    for o in outlet.iter().flatten() {
        size[*o] += 1;
    }
    Watersheds { outlet, size }
}
