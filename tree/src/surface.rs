//! Equivalent/check surface generation.
//!
//! A single point pattern on the unit sphere (3D) or unit circle (2D) is
//! computed once per plan and reused, rescaled and translated, at every
//! level and for both the upward and downward passes.

use crate::geometry::Cube;

fn point_count(dim: usize, order: usize) -> usize {
    match dim {
        2 => (2 * order).max(4),
        3 => {
            let order = order.max(2);
            (6 * (order - 1).pow(2) + 2).max(6)
        }
        _ => panic!("surrounding_surface only supports dim in {{2, 3}}, got {dim}"),
    }
}

/// `K` points approximately uniformly distributed on the unit `(D-1)`-sphere,
/// with `K = O(order^(D-1))`.
///
/// Deterministic: the same `order` always yields the same point set, since
/// the pattern is baked into a plan once and must be stable across calls.
/// 3D uses a Fibonacci lattice (golden-angle spiral): deterministic, roughly
/// equidistributed, no iterative relaxation required. 2D uses equally spaced
/// angles.
pub fn surrounding_surface<const D: usize>(order: usize) -> Vec<[f64; D]> {
    let k = point_count(D, order);
    let golden_angle = std::f64::consts::PI * (3.0 - 5f64.sqrt());

    (0..k)
        .map(|i| {
            let mut p = [0.0; D];
            if D == 2 {
                let theta = 2.0 * std::f64::consts::PI * (i as f64) / (k as f64);
                p[0] = theta.cos();
                p[1] = theta.sin();
            } else {
                let y = 1.0 - 2.0 * (i as f64) / ((k - 1).max(1) as f64);
                let radius_at_y = (1.0 - y * y).max(0.0).sqrt();
                let theta = golden_angle * i as f64;
                p[0] = theta.cos() * radius_at_y;
                p[1] = y;
                p[2] = theta.sin() * radius_at_y;
            }
            p
        })
        .collect()
}

/// Rescale and translate the unit surface pattern `surf` onto a sphere of
/// radius `r * bounds.width` centered at `bounds.center`.
pub fn inscribe_surf<const D: usize>(bounds: &Cube<D>, r: f64, surf: &[[f64; D]]) -> Vec<[f64; D]> {
    surf.iter()
        .map(|s| {
            let mut p = [0.0; D];
            for d in 0..D {
                p[d] = bounds.center[d] + r * bounds.width * s[d];
            }
            p
        })
        .collect()
}
