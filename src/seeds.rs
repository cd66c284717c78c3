//! Seed management for island generation
//!
//! The pipeline draws from three independent random streams so that changing how
//! rivers grow never shifts the island outline or the drainage tie-breaks, and
//! vice versa.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// One seed per random stream, normally all hashed from `master`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IslandSeeds {
    /// Seed the streams were derived from
    pub master: u64,
    /// Point sampling and island shape
    pub simulation: u64,
    /// Spring order, river wandering and lake pooling
    pub rivers: u64,
    /// Coast-distance search tie-breaks
    pub drainage: u64,
}

impl IslandSeeds {
    /// Hash every stream seed from `master`.
    pub fn from_master(master: u64) -> Self {
        Self {
            master,
            simulation: derive_seed(master, "simulation"),
            rivers: derive_seed(master, "rivers"),
            drainage: derive_seed(master, "drainage"),
        }
    }

    /// Start from `master` and pin chosen streams.
    pub fn builder(master: u64) -> IslandSeedsBuilder {
        IslandSeedsBuilder::new(master)
    }

    pub fn simulation_rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.simulation)
    }

    pub fn river_rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.rivers)
    }

    pub fn drainage_rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.drainage)
    }
}

impl Default for IslandSeeds {
    fn default() -> Self {
        Self::from_master(rand::random())
    }
}

/// Pins individual streams; unpinned ones stay derived from the master seed.
pub struct IslandSeedsBuilder {
    seeds: IslandSeeds,
}

impl IslandSeedsBuilder {
    pub fn new(master: u64) -> Self {
        Self {
            seeds: IslandSeeds::from_master(master),
        }
    }

    pub fn simulation(mut self, seed: u64) -> Self {
        self.seeds.simulation = seed;
        self
    }

    pub fn rivers(mut self, seed: u64) -> Self {
        self.seeds.rivers = seed;
        self
    }

    pub fn drainage(mut self, seed: u64) -> Self {
        self.seeds.drainage = seed;
        self
    }

    pub fn build(self) -> IslandSeeds {
        self.seeds
    }
}

/// Hash of the master seed and stream name.
fn derive_seed(master: u64, stream: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    master.hash(&mut hasher);
    stream.hash(&mut hasher);
    hasher.finish()
}

impl std::fmt::Display for IslandSeeds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "seed {} (simulation {}, rivers {}, drainage {})",
            self.master, self.simulation, self.rivers, self.drainage
        )
    }
}
