//! Scalar configuration for a generation run
//!
//! Every section falls back to its defaults when absent from a JSON file, so a
//! config only needs to name the values it changes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Map extent and point sampling.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Side length of the square map
    pub size: f64,
    /// Distance between points on the map edge
    pub boundary_spacing: f64,
    /// Minimum distance between interior points
    pub poisson_spacing: f64,
    /// Candidates tried around each active Poisson sample
    pub poisson_samples: usize,
    /// Regions closer than this to the map edge are forced water
    pub boundary_margin: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            size: 1000.0,
            boundary_spacing: 10.0,
            poisson_spacing: 15.0,
            poisson_samples: 30,
            boundary_margin: 0.0,
        }
    }
}

/// Which land predicate builds the island outline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    #[default]
    Noise,
    Radial,
}

/// Parameters of the island outline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeConfig {
    pub kind: ShapeKind,
    /// Fractal noise octaves
    pub octaves: usize,
    /// Amplitude falloff per octave
    pub persistence: f64,
    /// 0 = raw noise, 1 = perfectly round
    pub round: f64,
    /// Larger values grow the island toward the map edge
    pub inflate: f64,
    /// Noise value below which a point is water
    pub water_cutoff: f64,
    /// Noise frequency scale; for the radial shape, the gap between rings
    pub fragmentation: f64,
    /// Swap land and water
    pub invert: bool,
}

impl Default for ShapeConfig {
    fn default() -> Self {
        Self {
            kind: ShapeKind::Noise,
            octaves: 5,
            persistence: 0.5,
            round: 0.5,
            inflate: 0.4,
            water_cutoff: 0.0,
            fragmentation: 1.07,
            invert: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterConfig {
    /// Fraction of water neighbors above which a land region becomes a lake
    pub lake_threshold: f64,
}

impl Default for WaterConfig {
    fn default() -> Self {
        Self {
            lake_threshold: 0.9,
        }
    }
}

/// River growth knobs.
///
/// The three biases are tuned heuristics, kept as defaults pending calibration
/// against real maps.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiverConfig {
    pub num_rivers: usize,
    pub min_spring_elevation: f64,
    pub max_spring_elevation: f64,
    /// Chance of following the downslope side on each step
    pub downstream_bias: f64,
    /// Chance of stepping into an adjacent water triangle instead of wandering
    pub standing_water_bias: f64,
    /// Chance of accepting a neighbor that already belongs to another river
    pub join_bias: f64,
    /// Chance that two rivers with touching sources pool into a lake
    pub lake_conversion: f64,
    /// Rivers this short are dropped unless they feed another river
    pub min_river_sections: usize,
}

impl Default for RiverConfig {
    fn default() -> Self {
        Self {
            num_rivers: 30,
            min_spring_elevation: 0.3,
            max_spring_elevation: 0.9,
            downstream_bias: 0.5,
            standing_water_bias: 0.75,
            join_bias: 0.825,
            lake_conversion: 0.85,
            min_river_sections: 3,
        }
    }
}

/// Climate bias applied to moisture and temperature.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiomeBias {
    /// Shifts the land moisture range to `[rainfall, 1 + rainfall]`
    pub rainfall: f64,
    pub northern_temperature: f64,
    pub southern_temperature: f64,
}

impl Default for BiomeBias {
    fn default() -> Self {
        Self {
            rainfall: 0.0,
            northern_temperature: 0.0,
            southern_temperature: 0.0,
        }
    }
}

impl BiomeBias {
    pub fn min_moisture(&self) -> f64 {
        self.rainfall
    }

    pub fn max_moisture(&self) -> f64 {
        1.0 + self.rainfall
    }
}

/// Complete configuration for one island.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IslandConfig {
    pub map: MapConfig,
    pub shape: ShapeConfig,
    pub water: WaterConfig,
    pub rivers: RiverConfig,
    pub biome: BiomeBias,
}

impl IslandConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: IslandConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("map.size", self.map.size, f64::MIN_POSITIVE, f64::MAX)?;
        check_range(
            "map.boundary_spacing",
            self.map.boundary_spacing,
            f64::MIN_POSITIVE,
            self.map.size,
        )?;
        check_range(
            "map.poisson_spacing",
            self.map.poisson_spacing,
            f64::MIN_POSITIVE,
            self.map.size,
        )?;
        check_range("map.boundary_margin", self.map.boundary_margin, 0.0, self.map.size / 2.0)?;

        check_range("shape.persistence", self.shape.persistence, 0.0, 1.0)?;
        check_range("shape.round", self.shape.round, 0.0, 1.0)?;
        check_range("shape.inflate", self.shape.inflate, 0.0, 1.0)?;

        check_range("water.lake_threshold", self.water.lake_threshold, 0.0, 1.0)?;

        let r = &self.rivers;
        check_range("rivers.min_spring_elevation", r.min_spring_elevation, 0.0, 1.0)?;
        check_range("rivers.max_spring_elevation", r.max_spring_elevation, 0.0, 1.0)?;
        if r.min_spring_elevation > r.max_spring_elevation {
            return Err(ConfigError::InvertedRange {
                min_field: "rivers.min_spring_elevation",
                max_field: "rivers.max_spring_elevation",
                min: r.min_spring_elevation,
                max: r.max_spring_elevation,
            });
        }
        check_range("rivers.downstream_bias", r.downstream_bias, 0.0, 1.0)?;
        check_range("rivers.standing_water_bias", r.standing_water_bias, 0.0, 1.0)?;
        check_range("rivers.join_bias", r.join_bias, 0.0, 1.0)?;
        check_range("rivers.lake_conversion", r.lake_conversion, 0.0, 1.0)?;

        check_range("biome.rainfall", self.biome.rainfall, -1.0, 1.0)?;
        Ok(())
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    // NaN fails both comparisons
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_validate() {
        assert!(IslandConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = IslandConfig::from_json_str(r#"{ "rivers": { "num_rivers": 5 } }"#).unwrap();
        assert_eq!(config.rivers.num_rivers, 5);
        assert_eq!(config.rivers.join_bias, 0.825);
        assert_eq!(config.map, MapConfig::default());
    }

    #[test]
    fn test_shape_kind_snake_case() {
        let config = IslandConfig::from_json_str(r#"{ "shape": { "kind": "radial" } }"#).unwrap();
        assert_eq!(config.shape.kind, ShapeKind::Radial);
    }

    #[test]
    fn test_out_of_range_probability() {
        let err = IslandConfig::from_json_str(r#"{ "rivers": { "join_bias": 1.5 } }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::OutOfRange {
                field: "rivers.join_bias",
                ..
            }
        ));
    }

    #[test]
    fn test_inverted_spring_range() {
        let mut config = IslandConfig::default();
        config.rivers.min_spring_elevation = 0.8;
        config.rivers.max_spring_elevation = 0.2;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedRange { .. })
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            IslandConfig::from_json_str("{ not json"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "biome": {{ "rainfall": 0.25 }}, "map": {{ "size": 500.0 }} }}"#).unwrap();

        let config = IslandConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.map.size, 500.0);
        assert_eq!(config.biome.min_moisture(), 0.25);
        assert_eq!(config.biome.max_moisture(), 1.25);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = IslandConfig::from_json_file(dir.path().join("absent.json"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_json_round_trip() {
        let config = IslandConfig::default();
        let json = config.to_json().unwrap();
        assert_eq!(IslandConfig::from_json_str(&json).unwrap(), config);
    }
}
