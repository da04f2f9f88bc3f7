//! Boid steering offsets.
//!
//! A scavenger looks at its flock neighbours and derives four offsets:
//! alignment (match the average heading), cohesion (move to the centroid),
//! separation (move away from close neighbours) and direction (move toward
//! the current target). The flocking brain decides how much of each to use.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::components::BoidConfigComponent;
use super::geometric_utils::{length, normalized};

/// A neighbour as seen by a boid.
#[derive(Debug, Clone)]
pub struct Neighbour {
    /// Neighbour position.
    pub position: Array1<f32>,
    /// Neighbour heading.
    pub forward: Array1<f32>,
}

/// The four steering offsets, each already scaled by the boid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SteeringOffsets {
    /// Toward the neighbours' average heading.
    pub alignment: Array1<f32>,
    /// Toward the neighbours' centroid.
    pub cohesion: Array1<f32>,
    /// Away from neighbours, stronger when closer.
    pub separation: Array1<f32>,
    /// Toward the current target.
    pub direction: Array1<f32>,
}

impl Default for SteeringOffsets {
    fn default() -> Self {
        Self {
            alignment: Array1::zeros(2),
            cohesion: Array1::zeros(2),
            separation: Array1::zeros(2),
            direction: Array1::zeros(2),
        }
    }
}

impl SteeringOffsets {
    /// Blends the offsets with per-offset weights (alignment, cohesion, separation, direction).
    pub fn blend(&self, weights: [f32; 4]) -> Array1<f32> {
        &self.alignment * weights[0]
            + &self.cohesion * weights[1]
            + &self.separation * weights[2]
            + &self.direction * weights[3]
    }
}

/// Neighbourhood summary fed to the flocking brain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlockStats {
    /// Number of neighbours within the radius.
    pub neighbours: usize,
    /// Average neighbour heading (unit or zero).
    pub average_heading: Array1<f32>,
    /// Offset from the boid to the neighbours' centroid.
    pub centroid_offset: Array1<f32>,
    /// Distance to the closest neighbour (radius when alone).
    pub nearest_distance: f32,
}

impl FlockStats {
    /// Statistics for a boid with no neighbours.
    pub fn alone(radius: f32) -> Self {
        Self {
            neighbours: 0,
            average_heading: Array1::zeros(2),
            centroid_offset: Array1::zeros(2),
            nearest_distance: radius,
        }
    }
}

/// Boid state carried by a scavenger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boid {
    /// Offsets computed during the last sensing pass.
    pub offsets: SteeringOffsets,
    /// Neighbourhood computed during the last sensing pass.
    pub stats: FlockStats,
}

impl Boid {
    /// Creates a boid with no neighbours.
    pub fn new(radius: f32) -> Self {
        Self {
            offsets: SteeringOffsets::default(),
            stats: FlockStats::alone(radius),
        }
    }
}

/// Computes the neighbourhood statistics and the four steering offsets.
///
/// `target` is the point the boid wants to reach, if any.
pub fn steer(
    position: &Array1<f32>,
    forward: &Array1<f32>,
    neighbours: &[Neighbour],
    target: Option<&Array1<f32>>,
    config: &BoidConfigComponent,
) -> (FlockStats, SteeringOffsets) {
    let direction = target
        .map(|t| normalized(&(t - position)) * config.direction)
        .unwrap_or_else(|| Array1::zeros(2));

    if neighbours.is_empty() {
        return (
            FlockStats::alone(config.radius),
            SteeringOffsets {
                direction,
                ..SteeringOffsets::default()
            },
        );
    }

    let count = neighbours.len() as f32;
    let mut heading_sum: Array1<f32> = Array1::zeros(2);
    let mut centroid: Array1<f32> = Array1::zeros(2);
    let mut push: Array1<f32> = Array1::zeros(2);
    let mut nearest = config.radius;

    for n in neighbours {
        heading_sum += &n.forward;
        centroid += &n.position;
        let away = position - &n.position;
        let dist = length(&away);
        nearest = nearest.min(dist);
        if dist > f32::EPSILON {
            // Inverse-distance weighting: close neighbours push harder.
            push += &(&away / (dist * dist));
        }
    }
    centroid /= count;

    let average_heading = normalized(&heading_sum);
    let centroid_offset = &centroid - position;

    let offsets = SteeringOffsets {
        alignment: normalized(&(&average_heading - forward)) * config.alignment,
        cohesion: normalized(&centroid_offset) * config.cohesion,
        separation: normalized(&push) * config.separation,
        direction,
    };
    let stats = FlockStats {
        neighbours: neighbours.len(),
        average_heading,
        centroid_offset,
        nearest_distance: nearest,
    };
    (stats, offsets)
}
