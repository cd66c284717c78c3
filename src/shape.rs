//! Island outlines
//!
//! A shape answers one question: is this point land? Points arrive in
//! normalized map coordinates, `[-1, 1]` on both axes with the map center at
//! the origin.

use noise::{NoiseFn, Perlin};
use rand::Rng;

use crate::config::{ShapeConfig, ShapeKind};
use crate::mesh::Point;

/// Land test used by water classification.
pub trait LandShape {
    fn is_land(&self, p: Point) -> bool;
}

impl<F> LandShape for F
where
    F: Fn(Point) -> bool,
{
    fn is_land(&self, p: Point) -> bool {
        self(p)
    }
}

/// Fractal noise island with a square falloff toward the map edge.
pub struct NoiseIsland {
    perlin: Perlin,
    offset: Point,
    amplitudes: Vec<f64>,
    round: f64,
    inflate: f64,
    cutoff: f64,
    frequency: f64,
}

impl NoiseIsland {
    /// Draw the noise seed and sampling offset from `rng`.
    pub fn new<R: Rng>(config: &ShapeConfig, rng: &mut R) -> Self {
        let perlin = Perlin::new(rng.gen());
        let offset = Point::new(rng.gen_range(-64.0..64.0), rng.gen_range(-64.0..64.0));
        let amplitudes = (0..config.octaves.max(1))
            .map(|octave| config.persistence.powi(octave as i32))
            .collect();
        Self {
            perlin,
            offset,
            amplitudes,
            round: config.round,
            inflate: config.inflate,
            cutoff: config.water_cutoff,
            frequency: config.fragmentation,
        }
    }

    /// Amplitude-weighted fractal noise, roughly in [-1, 1].
    fn fbm(&self, p: Point) -> f64 {
        let mut sum = 0.0;
        let mut total = 0.0;
        for (octave, amplitude) in self.amplitudes.iter().enumerate() {
            let frequency = (1u64 << octave) as f64;
            sum += amplitude * self.perlin.get([p.x * frequency, p.y * frequency]);
            total += amplitude;
        }
        if total == 0.0 {
            0.0
        } else {
            sum / total
        }
    }
}

impl LandShape for NoiseIsland {
    fn is_land(&self, p: Point) -> bool {
        let sample = Point::new(
            (p.x + self.offset.x) * self.frequency,
            (p.y + self.offset.y) * self.frequency,
        );
        let n = lerp(self.fbm(sample), 0.5, self.round);
        let distance = p.x.abs().max(p.y.abs());
        n - (1.0 - self.inflate) * distance * distance >= self.cutoff
    }
}

/// Ring-shaped island whose radii wobble with the angle around the center.
#[derive(Clone, Debug)]
pub struct RadialIsland {
    pub bumps: f64,
    pub start_angle: f64,
    /// Angle (in multiples of pi) of the channel cut into the island
    pub angle_offset: f64,
    /// Half-width of the channel in radians
    pub min_angle: f64,
    pub land_scale: f64,
    pub cutoff: f64,
    pub fragmentation: f64,
}

impl Default for RadialIsland {
    fn default() -> Self {
        Self {
            bumps: 3.0,
            start_angle: 1.0,
            angle_offset: 1.0,
            min_angle: 0.5,
            land_scale: 1.25,
            cutoff: 0.0,
            fragmentation: 1.07,
        }
    }
}

impl RadialIsland {
    /// Randomize the bumps and angles from `rng`.
    pub fn new<R: Rng>(config: &ShapeConfig, rng: &mut R) -> Self {
        Self {
            bumps: rng.gen_range(1..6) as f64,
            start_angle: rng.gen_range(0.0..2.0),
            angle_offset: rng.gen_range(0.0..2.0),
            min_angle: rng.gen_range(0.2..0.5),
            cutoff: config.water_cutoff,
            fragmentation: config.fragmentation,
            ..Self::default()
        }
    }
}

impl LandShape for RadialIsland {
    fn is_land(&self, p: Point) -> bool {
        use std::f64::consts::PI;
        let x = self.land_scale * p.x;
        let y = self.land_scale * p.y;
        let angle = y.atan2(x);
        let length = 0.5 * (x.abs().max(y.abs()) + (x * x + y * y).sqrt()) + self.cutoff;

        let channel = self.angle_offset * PI;
        let in_channel = [0.0, 2.0 * PI, -2.0 * PI]
            .iter()
            .any(|wrap| (angle - channel + wrap).abs() < self.min_angle);

        let (inner, outer) = if in_channel {
            (0.2, 0.2)
        } else {
            (
                0.5 + 0.4 * (self.start_angle * PI + self.bumps * angle + ((self.bumps + 3.0) * angle).cos()).sin(),
                0.7 - 0.2 * (self.start_angle * PI + self.bumps * angle - ((self.bumps + 2.0) * angle).sin()).sin(),
            )
        };

        length < inner || (length > inner * self.fragmentation && length < outer)
    }
}

/// Flips another shape's answer.
pub struct Inverted<S>(pub S);

impl<S: LandShape> LandShape for Inverted<S> {
    fn is_land(&self, p: Point) -> bool {
        !self.0.is_land(p)
    }
}

/// Build the configured shape, drawing its randomness from `rng`.
pub fn from_config<R: Rng>(config: &ShapeConfig, rng: &mut R) -> Box<dyn LandShape> {
    match (config.kind, config.invert) {
        (ShapeKind::Noise, false) => Box::new(NoiseIsland::new(config, rng)),
        (ShapeKind::Noise, true) => Box::new(Inverted(NoiseIsland::new(config, rng))),
        (ShapeKind::Radial, false) => Box::new(RadialIsland::new(config, rng)),
        (ShapeKind::Radial, true) => Box::new(Inverted(RadialIsland::new(config, rng))),
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}
