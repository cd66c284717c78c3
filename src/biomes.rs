//! Biome assignment
//!
//! Each region is summarized as a [`BiomeInput`] and handed to a
//! [`BiomeClassifier`]. The default classifier is an ordered rule table over
//! water flags, temperature and moisture, after the Whittaker diagram.

use tracing::info;

use crate::config::BiomeBias;
use crate::mesh::DualMesh;
use crate::water::WaterMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum Biome {
    Ocean,
    Lake,
    Marsh,
    Ice,
    Beach,
    Snow,
    Tundra,
    Bare,
    Scorched,
    Taiga,
    Shrubland,
    TemperateDesert,
    TemperateRainForest,
    TemperateDeciduousForest,
    Grassland,
    TropicalRainForest,
    TropicalSeasonalForest,
    SubtropicalDesert,
}

impl Biome {
    pub fn all() -> &'static [Self] {
        &[
            Self::Ocean,
            Self::Lake,
            Self::Marsh,
            Self::Ice,
            Self::Beach,
            Self::Snow,
            Self::Tundra,
            Self::Bare,
            Self::Scorched,
            Self::Taiga,
            Self::Shrubland,
            Self::TemperateDesert,
            Self::TemperateRainForest,
            Self::TemperateDeciduousForest,
            Self::Grassland,
            Self::TropicalRainForest,
            Self::TropicalSeasonalForest,
            Self::SubtropicalDesert,
        ]
    }

    /// Get display name for UI
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Ocean => "Ocean",
            Self::Lake => "Lake",
            Self::Marsh => "Marsh",
            Self::Ice => "Ice",
            Self::Beach => "Beach",
            Self::Snow => "Snow",
            Self::Tundra => "Tundra",
            Self::Bare => "Bare",
            Self::Scorched => "Scorched",
            Self::Taiga => "Taiga",
            Self::Shrubland => "Shrubland",
            Self::TemperateDesert => "Temperate Desert",
            Self::TemperateRainForest => "Temperate Rain Forest",
            Self::TemperateDeciduousForest => "Temperate Deciduous Forest",
            Self::Grassland => "Grassland",
            Self::TropicalRainForest => "Tropical Rain Forest",
            Self::TropicalSeasonalForest => "Tropical Seasonal Forest",
            Self::SubtropicalDesert => "Subtropical Desert",
        }
    }

    pub fn is_water(&self) -> bool {
        matches!(self, Self::Ocean | Self::Lake | Self::Marsh | Self::Ice)
    }
}

impl std::fmt::Display for Biome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Everything a classifier may look at for one region.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BiomeInput {
    pub ocean: bool,
    pub water: bool,
    pub coast: bool,
    pub elevation: f64,
    pub temperature: f64,
    pub moisture: f64,
}

/// Maps a region summary to a biome.
pub trait BiomeClassifier {
    fn classify(&self, input: &BiomeInput) -> Biome;
}

impl<F> BiomeClassifier for F
where
    F: Fn(&BiomeInput) -> Biome,
{
    fn classify(&self, input: &BiomeInput) -> Biome {
        self(input)
    }
}

/// Conditions for a table row. Unset flags match either way.
#[derive(Clone, Debug, PartialEq)]
pub struct BiomeCondition {
    pub ocean: Option<bool>,
    pub water: Option<bool>,
    pub coast: Option<bool>,
    /// Inclusive lower bound
    pub temp_min: f64,
    /// Exclusive upper bound
    pub temp_max: f64,
    /// Exclusive lower bound
    pub moisture_min: f64,
    /// Inclusive upper bound
    pub moisture_max: f64,
}

impl Default for BiomeCondition {
    fn default() -> Self {
        Self {
            ocean: None,
            water: None,
            coast: None,
            temp_min: f64::NEG_INFINITY,
            temp_max: f64::INFINITY,
            moisture_min: f64::NEG_INFINITY,
            moisture_max: f64::INFINITY,
        }
    }
}

impl BiomeCondition {
    pub fn matches(&self, input: &BiomeInput) -> bool {
        let flag = |want: Option<bool>, have: bool| want.map_or(true, |w| w == have);
        flag(self.ocean, input.ocean)
            && flag(self.water, input.water)
            && flag(self.coast, input.coast)
            && input.temperature >= self.temp_min
            && input.temperature < self.temp_max
            && input.moisture > self.moisture_min
            && input.moisture <= self.moisture_max
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BiomeRule {
    pub biome: Biome,
    pub condition: BiomeCondition,
}

/// Ordered rules; the first match wins.
#[derive(Clone, Debug, PartialEq)]
pub struct BiomeTable {
    pub rules: Vec<BiomeRule>,
    /// Used when no rule matches
    pub fallback: Biome,
}

impl BiomeClassifier for BiomeTable {
    fn classify(&self, input: &BiomeInput) -> Biome {
        self.rules
            .iter()
            .find(|rule| rule.condition.matches(input))
            .map_or(self.fallback, |rule| rule.biome)
    }
}

impl Default for BiomeTable {
    fn default() -> Self {
        Self::whittaker()
    }
}

impl BiomeTable {
    /// Water bodies by temperature, then beaches, then land by temperature band and moisture.
    pub fn whittaker() -> Self {
        let mut rules = vec![
            BiomeRule {
                biome: Biome::Ocean,
                condition: BiomeCondition {
                    ocean: Some(true),
                    ..Default::default()
                },
            },
            BiomeRule {
                biome: Biome::Marsh,
                condition: BiomeCondition {
                    water: Some(true),
                    temp_min: 0.9,
                    ..Default::default()
                },
            },
            BiomeRule {
                biome: Biome::Ice,
                condition: BiomeCondition {
                    water: Some(true),
                    temp_max: 0.2,
                    ..Default::default()
                },
            },
            BiomeRule {
                biome: Biome::Lake,
                condition: BiomeCondition {
                    water: Some(true),
                    ..Default::default()
                },
            },
            BiomeRule {
                biome: Biome::Beach,
                condition: BiomeCondition {
                    coast: Some(true),
                    ..Default::default()
                },
            },
        ];

        // (upper temperature bound, [(biome, moisture above)]) wettest first
        let bands: [(f64, &[(Biome, f64)]); 4] = [
            (
                0.2,
                &[
                    (Biome::Snow, 0.5),
                    (Biome::Tundra, 0.33),
                    (Biome::Bare, 0.16),
                    (Biome::Scorched, f64::NEG_INFINITY),
                ],
            ),
            (
                0.4,
                &[
                    (Biome::Taiga, 0.66),
                    (Biome::Shrubland, 0.33),
                    (Biome::TemperateDesert, f64::NEG_INFINITY),
                ],
            ),
            (
                0.7,
                &[
                    (Biome::TemperateRainForest, 0.83),
                    (Biome::TemperateDeciduousForest, 0.5),
                    (Biome::Grassland, 0.16),
                    (Biome::TemperateDesert, f64::NEG_INFINITY),
                ],
            ),
            (
                f64::INFINITY,
                &[
                    (Biome::TropicalRainForest, 0.66),
                    (Biome::TropicalSeasonalForest, 0.33),
                    (Biome::Grassland, 0.16),
                    (Biome::SubtropicalDesert, f64::NEG_INFINITY),
                ],
            ),
        ];
        for (temp_max, row) in bands {
            for &(biome, moisture_min) in row {
                rules.push(BiomeRule {
                    biome,
                    condition: BiomeCondition {
                        water: Some(false),
                        temp_max,
                        moisture_min,
                        ..Default::default()
                    },
                });
            }
        }

        Self {
            rules,
            fallback: Biome::Grassland,
        }
    }
}

/// Colder uphill, shifted by a north-south gradient.
pub fn assign_temperature(mesh: &DualMesh, elevation: &[f64], bias: &BiomeBias) -> Vec<f64> {
    let height = mesh.height();
    (0..mesh.num_regions())
        .map(|r| {
            let y = mesh.region_position(r).y;
            let t = if height > 0.0 { (y / height).clamp(0.0, 1.0) } else { 0.5 };
            let latitude = bias.northern_temperature + (bias.southern_temperature - bias.northern_temperature) * t;
            1.0 - elevation[r] + latitude
        })
        .collect()
}

/// Gather the per-region classifier inputs.
pub fn biome_inputs(water: &WaterMap, elevation: &[f64], temperature: &[f64], moisture: &[f64]) -> Vec<BiomeInput> {
    (0..water.water.len())
        .map(|r| BiomeInput {
            ocean: water.ocean[r],
            water: water.water[r],
            coast: water.coast[r],
            elevation: elevation[r],
            temperature: temperature[r],
            moisture: moisture[r],
        })
        .collect()
}

pub fn assign_biomes<C: BiomeClassifier + ?Sized>(inputs: &[BiomeInput], classifier: &C) -> Vec<Biome> {
    let biomes: Vec<Biome> = inputs.iter().map(|input| classifier.classify(input)).collect();
    info!("Assigned biomes to {} regions", biomes.len());
    biomes
}

/// Count of each biome present, most common first.
pub fn biome_histogram(biomes: &[Biome]) -> Vec<(Biome, usize)> {
    let mut counts: Vec<(Biome, usize)> = Biome::all()
        .iter()
        .map(|&b| (b, biomes.iter().filter(|&&x| x == b).count()))
        .filter(|&(_, n)| n > 0)
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::builder::poisson_mesh;

    fn land(temperature: f64, moisture: f64) -> BiomeInput {
        BiomeInput {
            ocean: false,
            water: false,
            coast: false,
            elevation: 1.0 - temperature,
            temperature,
            moisture,
        }
    }

    #[test]
    fn test_water_rows() {
        let table = BiomeTable::default();
        let ocean = BiomeInput {
            ocean: true,
            water: true,
            ..land(0.5, 1.0)
        };
        assert_eq!(table.classify(&ocean), Biome::Ocean);

        let lake = |temperature| BiomeInput {
            water: true,
            ..land(temperature, 1.0)
        };
        assert_eq!(table.classify(&lake(0.95)), Biome::Marsh);
        assert_eq!(table.classify(&lake(0.1)), Biome::Ice);
        assert_eq!(table.classify(&lake(0.5)), Biome::Lake);

        let beach = BiomeInput {
            coast: true,
            ..land(0.9, 0.1)
        };
        assert_eq!(table.classify(&beach), Biome::Beach);
    }

    #[test]
    fn test_land_bands() {
        let table = BiomeTable::whittaker();
        let cases = [
            (0.1, 0.9, Biome::Snow),
            (0.1, 0.4, Biome::Tundra),
            (0.1, 0.2, Biome::Bare),
            (0.1, 0.0, Biome::Scorched),
            (0.3, 0.7, Biome::Taiga),
            (0.3, 0.5, Biome::Shrubland),
            (0.3, 0.1, Biome::TemperateDesert),
            (0.5, 0.9, Biome::TemperateRainForest),
            (0.5, 0.6, Biome::TemperateDeciduousForest),
            (0.5, 0.3, Biome::Grassland),
            (0.5, 0.1, Biome::TemperateDesert),
            (0.9, 0.8, Biome::TropicalRainForest),
            (0.9, 0.5, Biome::TropicalSeasonalForest),
            (0.9, 0.2, Biome::Grassland),
            (0.9, 0.05, Biome::SubtropicalDesert),
        ];
        for (temperature, moisture, expected) in cases {
            assert_eq!(
                table.classify(&land(temperature, moisture)),
                expected,
                "temperature {} moisture {}",
                temperature,
                moisture
            );
        }
    }

    #[test]
    fn test_band_edges() {
        let table = BiomeTable::whittaker();
        // Upper temperature bound is exclusive, moisture lower bound too
        assert_eq!(table.classify(&land(0.2, 0.9)), Biome::Taiga);
        assert_eq!(table.classify(&land(0.1, 0.5)), Biome::Tundra);
    }

    #[test]
    fn test_closure_classifier() {
        let everything_is_grass = |_: &BiomeInput| Biome::Grassland;
        let inputs = vec![land(0.1, 0.9), land(0.9, 0.0)];
        assert_eq!(assign_biomes(&inputs, &everything_is_grass), vec![Biome::Grassland; 2]);
    }

    #[test]
    fn test_empty_table_uses_fallback() {
        let table = BiomeTable {
            rules: Vec::new(),
            fallback: Biome::Bare,
        };
        assert_eq!(table.classify(&land(0.5, 0.5)), Biome::Bare);
    }

    #[test]
    fn test_temperature_gradient() {
        let mesh = poisson_mesh(200.0, 10.0, 3);
        let elevation = vec![0.0; mesh.num_regions()];
        let bias = BiomeBias {
            northern_temperature: -0.5,
            southern_temperature: 0.5,
            ..Default::default()
        };
        let temperature = assign_temperature(&mesh, &elevation, &bias);
        for r in 0..mesh.num_solid_regions() {
            let y = mesh.region_position(r).y / 200.0;
            assert!((temperature[r] - (0.5 + y)).abs() < 1e-9);
        }

        let flat = assign_temperature(&mesh, &vec![0.25; mesh.num_regions()], &BiomeBias::default());
        assert!(flat.iter().all(|&t| (t - 0.75).abs() < 1e-12));
    }

    #[test]
    fn test_histogram_sorted() {
        let biomes = [Biome::Ocean, Biome::Beach, Biome::Ocean, Biome::Snow, Biome::Ocean, Biome::Beach];
        assert_eq!(
            biome_histogram(&biomes),
            vec![(Biome::Ocean, 3), (Biome::Beach, 2), (Biome::Snow, 1)]
        );
    }
}
