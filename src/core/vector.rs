//! Flat buffer <-> vector conversion.
//!
//! Positions travel across the API as flat `[x, y, (z), x, y, (z), ...]`
//! buffers. Internally every particle is a `Vec3`; 2D simulations keep `z`
//! pinned at zero, so forces never leave the plane.

use glam::Vec3;

/// Supported dimensionalities.
pub const SUPPORTED_DIMS: [usize; 2] = [2, 3];

#[inline]
pub fn is_supported_dims(dims: usize) -> bool {
    SUPPORTED_DIMS.contains(&dims)
}

/// Read one point from a `dims`-long slice. Caller guarantees the length.
#[inline]
pub fn point_from_slice(chunk: &[f32]) -> Vec3 {
    match chunk.len() {
        2 => Vec3::new(chunk[0], chunk[1], 0.0),
        _ => Vec3::new(chunk[0], chunk[1], chunk[2]),
    }
}

/// Append the first `dims` components of `p` to `out`.
#[inline]
pub fn push_point(out: &mut Vec<f32>, p: Vec3, dims: usize) {
    out.push(p.x);
    out.push(p.y);
    if dims == 3 {
        out.push(p.z);
    }
}

/// Flatten a slice of points into a fresh buffer.
pub fn flatten(points: &[Vec3], dims: usize) -> Vec<f32> {
    let mut out = Vec::with_capacity(points.len() * dims);
    for p in points {
        push_point(&mut out, *p, dims);
    }
    out
}
