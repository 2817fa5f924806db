//! Joint angle geometry.
//!
//! All inputs are 2D points in aspect-corrected image space (y grows downward).

use nalgebra::Vector2;

/// Vectors shorter than this are treated as degenerate.
const MIN_LENGTH: f32 = 1e-6;

/// Angle at `b` between `b→a` and `b→c`, in degrees `[0, 180]`.
///
/// Returns `None` when either vector has zero length.
pub fn angle(a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> Option<f32> {
    let u = Vector2::new(a.0 - b.0, a.1 - b.1);
    let v = Vector2::new(c.0 - b.0, c.1 - b.1);
    angle_between(&u, &v)
}

fn angle_between(u: &Vector2<f32>, v: &Vector2<f32>) -> Option<f32> {
    let nu = u.norm();
    let nv = v.norm();
    if nu < MIN_LENGTH || nv < MIN_LENGTH {
        return None;
    }
    let cos = (u.dot(v) / (nu * nv)).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}

/// Included knee angle (hip-knee-ankle). 180° is a straight leg.
pub fn knee_angle(hip: (f32, f32), knee: (f32, f32), ankle: (f32, f32)) -> Option<f32> {
    angle(hip, knee, ankle)
}

/// Trunk lean from screen vertical: angle between `shoulder - hip` and straight up.
pub fn trunk_tilt_vertical(shoulder: (f32, f32), hip: (f32, f32)) -> Option<f32> {
    let trunk = Vector2::new(shoulder.0 - hip.0, shoulder.1 - hip.1);
    angle_between(&trunk, &Vector2::new(0.0, -1.0))
}

/// Hip-included angle between trunk and thigh.
pub fn trunk_to_thigh(shoulder: (f32, f32), hip: (f32, f32), knee: (f32, f32)) -> Option<f32> {
    angle(shoulder, hip, knee)
}

/// Euclidean distance between two points.
pub fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    Vector2::new(a.0 - b.0, a.1 - b.1).norm()
}
