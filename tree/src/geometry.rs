//! Axis-aligned cube geometry and the subcell indexing used by the octree
//! builder.
//!
//! `D` is the ambient dimension (2 or 3). Everything here is a total,
//! allocation-free function of its inputs.

/// An axis-aligned cube with side length `2 * width`, centered at `center`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cube<const D: usize> {
    pub center: [f64; D],
    pub width: f64,
}

impl<const D: usize> Cube<D> {
    pub fn new(center: [f64; D], width: f64) -> Self {
        Self { center, width }
    }

    /// The enclosing radius `width * sqrt(D)`: the largest distance from
    /// `center` to any point in the cube.
    pub fn enclosing_radius(&self) -> f64 {
        self.width * (D as f64).sqrt()
    }
}

pub fn dot<const D: usize>(a: &[f64; D], b: &[f64; D]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

pub fn sub<const D: usize>(a: &[f64; D], b: &[f64; D]) -> [f64; D] {
    let mut out = [0.0; D];
    for d in 0..D {
        out[d] = a[d] - b[d];
    }
    out
}

pub fn hypot<const D: usize>(v: &[f64; D]) -> f64 {
    dot(v, v).sqrt()
}

pub fn dist<const D: usize>(a: &[f64; D], b: &[f64; D]) -> f64 {
    hypot(&sub(a, b))
}

/// Number of children a node in a `D`-dimensional `2^D`-tree has.
pub const fn n_children(d: usize) -> usize {
    1 << d
}

/// A cube enclosing `pts`, built from the centroid plus the max per-axis
/// deviation from it (not the minimal bounding cube).
///
/// Returns a zero-width cube centered at the single point when `pts` has one
/// element, and a zero-width cube at the origin when `pts` is empty.
pub fn bounding_box<const D: usize>(pts: &[[f64; D]]) -> Cube<D> {
    if pts.is_empty() {
        return Cube::new([0.0; D], 0.0);
    }

    let mut center = [0.0; D];
    for p in pts {
        for d in 0..D {
            center[d] += p[d];
        }
    }
    let n = pts.len() as f64;
    for c in center.iter_mut() {
        *c /= n;
    }

    let mut max_width: f64 = 0.0;
    for p in pts {
        for d in 0..D {
            max_width = max_width.max((p[d] - center[d]).abs());
        }
    }

    Cube::new(center, max_width)
}

/// The child index (in `[0, 2^D)`) of the subcell of `b` containing `pt`.
///
/// Bit `d` (most significant first) is set iff `pt[d] > b.center[d]`.
pub fn find_containing_subcell<const D: usize>(b: &Cube<D>, pt: &[f64; D]) -> usize {
    let mut idx = 0usize;
    for d in 0..D {
        idx <<= 1;
        if pt[d] > b.center[d] {
            idx |= 1;
        }
    }
    idx
}

/// The geometric subcell of `b` with child index `child_idx` (as produced by
/// [`find_containing_subcell`]).
pub fn get_subcell<const D: usize>(b: &Cube<D>, child_idx: usize) -> Cube<D> {
    let new_width = b.width / 2.0;
    let mut new_center = b.center;
    for d in 0..D {
        let bit = (child_idx >> (D - 1 - d)) & 1;
        new_center[d] += (2.0 * bit as f64 - 1.0) * new_width;
    }
    Cube::new(new_center, new_width)
}

/// Whether `pt` lies within `b`, up to a small floating-point tolerance.
pub fn in_box<const D: usize>(b: &Cube<D>, pt: &[f64; D]) -> bool {
    const TOL: f64 = 1.0 + 1e-14;
    (0..D).all(|d| (pt[d] - b.center[d]).abs() < TOL * b.width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn bounding_box_centers_on_mean() {
        let pts = [[0.0, 0.0], [2.0, 0.0], [0.0, 2.0], [2.0, 2.0]];
        let b: Cube<2> = bounding_box(&pts);
        assert_relative_eq!(b.center[0], 1.0);
        assert_relative_eq!(b.center[1], 1.0);
        assert_relative_eq!(b.width, 1.0);
    }

    #[test]
    fn subcell_roundtrip() {
        let root: Cube<3> = Cube::new([0.0; 3], 1.0);
        for idx in 0..n_children(3) {
            let child = get_subcell(&root, idx);
            assert_eq!(find_containing_subcell(&root, &child.center), idx);
            assert_relative_eq!(child.width, 0.5);
        }
    }

    #[test]
    fn enclosing_radius_matches_pythagoras() {
        let c: Cube<3> = Cube::new([0.0; 3], 2.0);
        assert_relative_eq!(c.enclosing_radius(), 2.0 * 3f64.sqrt());
    }

    #[test]
    fn empty_bounding_box_is_zero_width() {
        let pts: [[f64; 3]; 0] = [];
        let b = bounding_box(&pts);
        assert_relative_eq!(b.width, 0.0);
    }
}
