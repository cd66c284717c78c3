//! Island data container and the generation pipeline
//!
//! Stages run strictly in order, each one finishing before the next starts:
//! water, elevation, rivers, moisture, then temperature and biomes.

use tracing::info;

use crate::biomes::{self, Biome, BiomeClassifier, BiomeInput, BiomeTable};
use crate::config::IslandConfig;
use crate::elevation::Elevation;
use crate::error::Result;
use crate::mesh::{DualMesh, MeshBuilder, Point};
use crate::moisture::Moisture;
use crate::rivers::{self, RiverNetwork, Watersheds};
use crate::seeds::IslandSeeds;
use crate::shape::{self, LandShape};
use crate::water::WaterMap;

/// All generated island data bundled together
#[derive(Clone, Debug)]
pub struct IslandMap {
    /// Seeds used for generation (allows recreation)
    pub seeds: IslandSeeds,
    pub mesh: DualMesh,
    pub water: WaterMap,
    pub elevation: Elevation,
    pub rivers: RiverNetwork,
    pub watersheds: Watersheds,
    pub moisture: Moisture,
    /// Per region, 1 at sea level before the latitude bias
    pub temperature: Vec<f64>,
    pub biome_inputs: Vec<BiomeInput>,
    pub biomes: Vec<Biome>,
}

/// Everything known about one region
#[derive(Clone, Debug, PartialEq)]
pub struct RegionInfo {
    pub region: usize,
    pub position: Point,
    pub ocean: bool,
    pub water: bool,
    pub coast: bool,
    pub elevation: f64,
    pub moisture: f64,
    pub temperature: f64,
    pub biome: Biome,
}

/// Counts and ranges for reporting
#[derive(Clone, Debug, PartialEq)]
pub struct IslandSummary {
    pub regions: usize,
    pub triangles: usize,
    pub ocean_regions: usize,
    pub land_regions: usize,
    pub lake_regions: usize,
    pub coast_regions: usize,
    pub elevation_range: (f64, f64),
    pub moisture_range: (f64, f64),
    pub rivers: usize,
    pub tributaries: usize,
    pub biomes: Vec<(Biome, usize)>,
}

impl IslandMap {
    /// Convenience accessor for master seed
    pub fn seed(&self) -> u64 {
        self.seeds.master
    }

    /// Sample points, build the mesh and shape from the simulation stream, then simulate.
    pub fn generate(config: &IslandConfig, seeds: IslandSeeds) -> Result<Self> {
        let mut rng = seeds.simulation_rng();
        let map = &config.map;

        info!("Sampling points...");
        let mesh = MeshBuilder::new(map.size, map.boundary_spacing)
            .add_poisson(&mut rng, map.poisson_spacing, map.poisson_samples)
            .build()?;

        let shape = shape::from_config(&config.shape, &mut rng);
        Ok(Self::simulate(mesh, &*shape, config, seeds, &BiomeTable::default()))
    }

    /// Run every simulation stage over a finished mesh.
    pub fn simulate<S, C>(mesh: DualMesh, shape: &S, config: &IslandConfig, seeds: IslandSeeds, classifier: &C) -> Self
    where
        S: LandShape + ?Sized,
        C: BiomeClassifier + ?Sized,
    {
        info!("Classifying water...");
        let mut water = WaterMap::classify(&mesh, shape, config.map.boundary_margin, config.water.lake_threshold);

        info!("Assigning elevation...");
        let elevation = Elevation::compute(&mesh, &water, &mut seeds.drainage_rng());

        info!("Growing rivers...");
        let rivers = RiverNetwork::generate(&mesh, &mut water, &elevation, &config.rivers, &mut seeds.river_rng());
        let watersheds = rivers::assign_watersheds(&mesh, &water, &elevation);

        info!("Spreading moisture...");
        let moisture = Moisture::compute(&mesh, &water, &rivers, &config.biome);

        info!("Assigning biomes...");
        let temperature = biomes::assign_temperature(&mesh, &elevation.region, &config.biome);
        let biome_inputs = biomes::biome_inputs(&water, &elevation.region, &temperature, &moisture.region);
        let biomes = biomes::assign_biomes(&biome_inputs, classifier);

        Self {
            seeds,
            mesh,
            water,
            elevation,
            rivers,
            watersheds,
            moisture,
            temperature,
            biome_inputs,
            biomes,
        }
    }

    /// Get region info by index
    pub fn region_info(&self, r: usize) -> Option<RegionInfo> {
        if r >= self.mesh.num_regions() {
            return None;
        }
        Some(RegionInfo {
            region: r,
            position: self.mesh.region_position(r),
            ocean: self.water.ocean[r],
            water: self.water.water[r],
            coast: self.water.coast[r],
            elevation: self.elevation.region[r],
            moisture: self.moisture.region[r],
            temperature: self.temperature[r],
            biome: self.biomes[r],
        })
    }

    pub fn summary(&self) -> IslandSummary {
        let solid = 0..self.mesh.num_solid_regions();
        let count = |f: &dyn Fn(usize) -> bool| solid.clone().filter(|&r| f(r)).count();
        let range = |values: &[f64], keep: &dyn Fn(usize) -> bool| {
            solid
                .clone()
                .filter(|&r| keep(r))
                .map(|r| values[r])
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
        };
        let land = |r: usize| self.water.is_land(r);

        IslandSummary {
            regions: self.mesh.num_regions(),
            triangles: self.mesh.num_triangles(),
            ocean_regions: count(&|r| self.water.ocean[r]),
            land_regions: count(&land),
            lake_regions: count(&|r| self.water.is_lake(r)),
            coast_regions: count(&|r| self.water.coast[r]),
            elevation_range: range(&self.elevation.region, &|_| true),
            moisture_range: range(&self.moisture.region, &land),
            rivers: self.rivers.len(),
            tributaries: self.rivers.rivers.iter().filter(|r| r.is_tributary()).count(),
            biomes: biomes::biome_histogram(&self.biomes[..self.mesh.num_solid_regions()]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShapeConfig;
    use crate::mesh::builder::poisson_mesh;

    fn small_config() -> IslandConfig {
        let mut config = IslandConfig::default();
        config.map.size = 300.0;
        config.map.poisson_spacing = 10.0;
        config.rivers.num_rivers = 10;
        config.shape = ShapeConfig {
            round: 0.8,
            ..Default::default()
        };
        config
    }

    #[test]
    fn test_same_seed_same_island() {
        let config = small_config();
        let a = IslandMap::generate(&config, IslandSeeds::from_master(42)).unwrap();
        let b = IslandMap::generate(&config, IslandSeeds::from_master(42)).unwrap();

        assert_eq!(a.mesh.region_positions(), b.mesh.region_positions());
        assert_eq!(a.water, b.water);
        assert_eq!(a.elevation, b.elevation);
        assert_eq!(a.rivers, b.rivers);
        assert_eq!(a.moisture, b.moisture);
        assert_eq!(a.biomes, b.biomes);
    }

    #[test]
    fn test_river_seed_leaves_terrain_alone() {
        let config = small_config();
        let a = IslandMap::generate(&config, IslandSeeds::from_master(5)).unwrap();
        let b = IslandMap::generate(&config, IslandSeeds::builder(5).rivers(999).build()).unwrap();
        assert_eq!(a.mesh.region_positions(), b.mesh.region_positions());
        assert_eq!(a.elevation, b.elevation);
    }

    #[test]
    fn test_outputs_cover_every_region() {
        let island = IslandMap::generate(&small_config(), IslandSeeds::from_master(7)).unwrap();
        let n = island.mesh.num_regions();
        assert_eq!(island.water.water.len(), n);
        assert_eq!(island.elevation.region.len(), n);
        assert_eq!(island.moisture.region.len(), n);
        assert_eq!(island.temperature.len(), n);
        assert_eq!(island.biomes.len(), n);
        assert_eq!(island.rivers.flow.len(), island.mesh.num_sides());
        assert_eq!(island.elevation.downslope.len(), island.mesh.num_triangles());

        for r in 0..n {
            if island.water.ocean[r] {
                assert_eq!(island.biomes[r], Biome::Ocean);
            }
        }
        assert!(island.region_info(n).is_none());
        let info = island.region_info(0).unwrap();
        assert!(info.ocean);
    }

    #[test]
    fn test_custom_points_and_classifier() {
        let mesh = poisson_mesh(250.0, 10.0, 3);
        let disc = |p: Point| p.x * p.x + p.y * p.y < 0.5;
        let marsh_everywhere = |_: &BiomeInput| Biome::Marsh;
        let island = IslandMap::simulate(
            mesh,
            &disc,
            &IslandConfig::default(),
            IslandSeeds::from_master(3),
            &marsh_everywhere,
        );
        assert!(island.biomes.iter().all(|&b| b == Biome::Marsh));

        let summary = island.summary();
        assert!(summary.land_regions > 0);
        assert!(summary.ocean_regions > 0);
        assert_eq!(summary.biomes, vec![(Biome::Marsh, island.mesh.num_solid_regions())]);
        assert!(summary.moisture_range.0 >= 0.0 && summary.moisture_range.1 <= 1.0);
    }
}
