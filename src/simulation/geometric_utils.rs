//! Small vector helpers over 2D `Array1<f32>` positions.

use ndarray::Array1;

/// Wraps a position vector around the simulation box boundaries (toroidal topology).
///
/// # Arguments
///
/// * `v` - Mutable position vector to wrap
/// * `box_width` - Width of the simulation box
/// * `box_height` - Height of the simulation box
pub fn wrap_around_mut(v: &mut Array1<f32>, box_width: f32, box_height: f32) {
    v[0] = wrap(v[0], box_width);
    v[1] = wrap(v[1], box_height);
}

fn wrap(value: f32, size: f32) -> f32 {
    let wrapped = value.rem_euclid(size);
    // Tiny negatives round up to `size` itself.
    if wrapped >= size { 0.0 } else { wrapped }
}

/// Shortest vector from `from` to `to` when both edges of the box wrap.
pub fn toroidal_offset(
    from: &Array1<f32>,
    to: &Array1<f32>,
    box_width: f32,
    box_height: f32,
) -> Array1<f32> {
    Array1::from_vec(vec![
        shortest(to[0] - from[0], box_width),
        shortest(to[1] - from[1], box_height),
    ])
}

fn shortest(delta: f32, size: f32) -> f32 {
    if size <= 0.0 {
        return delta;
    }
    let d = delta.rem_euclid(size);
    if d > size / 2.0 { d - size } else { d }
}

/// Euclidean length.
pub fn length(v: &Array1<f32>) -> f32 {
    v.dot(v).sqrt()
}

/// Unit vector along `v`, or the zero vector if `v` is (nearly) zero.
pub fn normalized(v: &Array1<f32>) -> Array1<f32> {
    let len = length(v);
    if len > f32::EPSILON {
        v / len
    } else {
        Array1::zeros(v.len())
    }
}

/// Rotates a 2D vector by `angle` radians.
pub fn rotate(v: &Array1<f32>, angle: f32) -> Array1<f32> {
    let (sin, cos) = angle.sin_cos();
    Array1::from_vec(vec![v[0] * cos - v[1] * sin, v[0] * sin + v[1] * cos])
}

/// Whether every component is finite.
pub fn is_finite(v: &Array1<f32>) -> bool {
    v.iter().all(|c| c.is_finite())
}
