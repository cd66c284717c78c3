//! Point sampling for mesh construction
//!
//! Boundary points ring the map edge; Poisson-disc or uniform samples fill the
//! interior. Everything random draws from a caller-supplied stream.

use rand::Rng;

use crate::mesh::Point;

/// Evenly spaced points along the four edges of a `size` x `size` map.
///
/// Each edge bows slightly outward (inset grows quadratically toward the
/// corners) so the triangulation does not build long slivers along the edge.
/// Corners themselves are left out.
pub fn boundary_points(spacing: f64, size: f64) -> Vec<Point> {
    if spacing <= 0.0 || size <= 0.0 {
        return Vec::new();
    }

    let count = (size / spacing).ceil() as usize;
    let mut points = Vec::with_capacity(4 * count);
    for i in 0..count {
        let t = (i as f64 + 0.5) / count as f64;
        let w = size * t;
        let offset = (t - 0.5).powi(2);
        points.push(Point::new(offset, w));
        points.push(Point::new(size - offset, w));
        points.push(Point::new(w, offset));
        points.push(Point::new(w, size - offset));
    }
    points
}

/// `count` points drawn uniformly from the square `[min, max]²`.
pub fn uniform<R: Rng>(count: usize, min: f64, max: f64, rng: &mut R) -> Vec<Point> {
    if max <= min {
        return Vec::new();
    }
    (0..count)
        .map(|_| Point::new(rng.gen_range(min..max), rng.gen_range(min..max)))
        .collect()
}

/// Bridson Poisson-disc sampling inside the square `[min, max]²`.
///
/// `existing` points (typically the boundary ring) are respected as already
/// placed samples and also seed the active list. Returns only the new points.
pub fn poisson_disc<R: Rng>(
    existing: &[Point],
    min: f64,
    max: f64,
    spacing: f64,
    max_step_samples: usize,
    rng: &mut R,
) -> Vec<Point> {
    if spacing <= 0.0 || max <= min {
        return Vec::new();
    }

    let cell_size = spacing / std::f64::consts::SQRT_2;
    let cells = ((max - min) / cell_size).ceil().max(1.0) as usize;
    let mut grid: Vec<Vec<usize>> = vec![Vec::new(); cells * cells];
    let cell_of = |p: &Point| -> (usize, usize) {
        let cx = ((p.x - min) / cell_size).floor().clamp(0.0, (cells - 1) as f64) as usize;
        let cy = ((p.y - min) / cell_size).floor().clamp(0.0, (cells - 1) as f64) as usize;
        (cx, cy)
    };

    let mut samples: Vec<Point> = existing.to_vec();
    let mut active: Vec<usize> = Vec::new();
    for (i, p) in samples.iter().enumerate() {
        let (cx, cy) = cell_of(p);
        grid[cy * cells + cx].push(i);
        active.push(i);
    }

    if active.is_empty() {
        let first = Point::new(rng.gen_range(min..max), rng.gen_range(min..max));
        let (cx, cy) = cell_of(&first);
        grid[cy * cells + cx].push(0);
        samples.push(first);
        active.push(0);
    }

    let spacing_sq = spacing * spacing;
    while !active.is_empty() {
        let slot = rng.gen_range(0..active.len());
        let center = samples[active[slot]];
        let mut placed = false;

        for _ in 0..max_step_samples {
            let angle = rng.gen_range(0.0..std::f64::consts::TAU);
            let radius = rng.gen_range(spacing..2.0 * spacing);
            let candidate = Point::new(
                center.x + radius * angle.cos(),
                center.y + radius * angle.sin(),
            );
            if candidate.x < min || candidate.x > max || candidate.y < min || candidate.y > max {
                continue;
            }

            // Out-of-domain seeds are clamped into edge cells, so search wider
            let (cx, cy) = cell_of(&candidate);
            let x_range = cx.saturating_sub(3)..=(cx + 3).min(cells - 1);
            let too_close = x_range.into_iter().any(|gx| {
                (cy.saturating_sub(3)..=(cy + 3).min(cells - 1)).any(|gy| {
                    grid[gy * cells + gx]
                        .iter()
                        .any(|&j| samples[j].distance_squared(&candidate) < spacing_sq)
                })
            });
            if too_close {
                continue;
            }

            let index = samples.len();
            grid[cy * cells + cx].push(index);
            samples.push(candidate);
            active.push(index);
            placed = true;
            break;
        }

        if !placed {
            active.swap_remove(slot);
        }
    }

    samples.split_off(existing.len())
}
