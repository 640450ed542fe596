//! Per-level check-to-equivalent (`C2E`) translation operator builder.
//!
//! Because the kernel is translation-invariant and a level's operator
//! depends only on the cube width at that level, one dense `TK x TK` matrix
//! per level suffices for all nodes at that level — built once, applied to
//! every node via [`crate::evaluator`].

use kifmm_tree::{inscribe_surf, Cube};
use kifmm_kernel::{Kernel, NBodyProblem};
use nalgebra::DMatrix;
use rayon::prelude::*;

use crate::config::FmmConfig;
use crate::error::FmmError;

fn identity_flat(n: usize) -> Vec<f64> {
    let mut out = vec![0.0; n * n];
    for i in 0..n {
        out[i * n + i] = 1.0;
    }
    out
}

/// Truncated pseudoinverse of a row-major `n x n` matrix via SVD, discarding
/// singular values below `eps * sigma_max`. Returns a row-major `n x n`
/// matrix.
fn pseudoinverse(mat_flat: &[f64], n: usize, eps: f64) -> Result<Vec<f64>, FmmError> {
    let mat = DMatrix::from_row_slice(n, n, mat_flat);
    let svd = mat.svd(true, true);
    let u = svd.u.ok_or_else(|| FmmError::Numeric("SVD produced no U factor".to_string()))?;
    let v_t = svd.v_t.ok_or_else(|| FmmError::Numeric("SVD produced no V^T factor".to_string()))?;
    let sigma = svd.singular_values;

    let max_sigma = sigma.iter().cloned().fold(0.0_f64, f64::max);
    let mut rank = 0usize;
    let mut sigma_inv = DMatrix::<f64>::zeros(n, n);
    for i in 0..n {
        if sigma[i] > eps * max_sigma {
            sigma_inv[(i, i)] = 1.0 / sigma[i];
            rank += 1;
        }
    }
    if rank == 0 {
        return Err(FmmError::Numeric(
            "pseudoinverse rank collapse: no singular value exceeds eps * sigma_max".to_string(),
        ));
    }

    let pinv = v_t.transpose() * sigma_inv * u.transpose();
    let mut out = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..n {
            out[i * n + j] = pinv[(i, j)];
        }
    }
    Ok(out)
}

/// Build the `TK x TK` check-to-equivalent pseudoinverse for a single level.
///
/// `surf` provides both the point pattern and, reused verbatim, the normals
/// of the synthetic check/equivalent surfaces (the outward radial direction
/// of a point on the unit sphere/circle is itself, which is exactly what a
/// surface normal there should be).
fn build_level_operator<const D: usize, K: Kernel<D>>(
    kernel: &K,
    params: &[f64],
    surf: &[[f64; D]],
    root_width: f64,
    level: usize,
    check_r: f64,
    equiv_r: f64,
    eps: f64,
) -> Result<Vec<f64>, FmmError> {
    let n_rows = surf.len() * kernel.tensor_dim();
    let width = root_width / 2f64.powi(level as i32);

    if width == 0.0 {
        // Degenerate (all source points coincide): check and equivalent
        // surfaces both collapse onto a single point and the equivalent-to
        // -check kernel matrix is singular by construction. There is exactly
        // one point to represent, so the identity operator reproduces it
        // exactly without evaluating the kernel at r = 0.
        return Ok(identity_flat(n_rows));
    }

    let bounds = Cube::new([0.0; D], width);
    let check_surf = inscribe_surf(&bounds, check_r, surf);
    let equiv_surf = inscribe_surf(&bounds, equiv_r, surf);

    let problem = NBodyProblem::new(&check_surf, surf, &equiv_surf, surf, params);
    let mut e2c = vec![0.0; n_rows * n_rows];
    kernel.f(&problem, &mut e2c)?;

    pseudoinverse(&e2c, n_rows, eps)
}

/// Build the contiguous `(max_height + 1) * n_rows^2` array of per-level
/// operators, one independent SVD per level computed in parallel.
#[tracing::instrument(skip(kernel, cfg, surf))]
pub fn build_levels_operator<const D: usize, K: Kernel<D>>(
    kernel: &K,
    cfg: &FmmConfig,
    surf: &[[f64; D]],
    root_width: f64,
    max_height: usize,
    check_r: f64,
    equiv_r: f64,
) -> Result<Vec<f64>, FmmError> {
    let n_rows = surf.len() * kernel.tensor_dim();
    let results: Vec<Result<Vec<f64>, FmmError>> = (0..=max_height)
        .into_par_iter()
        .map(|level| build_level_operator(kernel, &cfg.params, surf, root_width, level, check_r, equiv_r, cfg.eps))
        .collect();

    let mut ops = vec![0.0; (max_height + 1) * n_rows * n_rows];
    for (level, res) in results.into_iter().enumerate() {
        let op = res?;
        tracing::debug!(level, n_rows, "built level operator");
        ops[level * n_rows * n_rows..(level + 1) * n_rows * n_rows].copy_from_slice(&op);
    }
    Ok(ops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use kifmm_kernel::Laplace3dKernel;
    use kifmm_tree::surrounding_surface;

    #[test]
    fn level_0_operator_inverts_equivalent_to_check_map() {
        let surf = surrounding_surface::<3>(4);
        let cfg = FmmConfig::new(1.05, 1.95, 4, 1, vec![]);
        let ops = build_levels_operator(&Laplace3dKernel, &cfg, &surf, 2.0, 0, cfg.inner_r, cfg.outer_r).unwrap();

        let n_rows = surf.len();
        assert_eq!(ops.len(), n_rows * n_rows);

        let bounds = Cube::new([0.0; 3], 2.0);
        let check_surf = inscribe_surf(&bounds, cfg.inner_r, &surf);
        let equiv_surf = inscribe_surf(&bounds, cfg.outer_r, &surf);
        let problem = NBodyProblem::new(&check_surf, &surf, &equiv_surf, &surf, &[]);
        let mut e2c = vec![0.0; n_rows * n_rows];
        Laplace3dKernel.f(&problem, &mut e2c).unwrap();

        // C2E * E2C should act close to identity on the range of E2C: spot
        // check that round-tripping a random equivalent density through
        // E2C then C2E approximately recovers it on a subspace compatible
        // with the SVD truncation tolerance.
        let x = vec![1.0; n_rows];
        let mut check_vals = vec![0.0; n_rows];
        for i in 0..n_rows {
            let mut acc = 0.0;
            for j in 0..n_rows {
                acc += e2c[i * n_rows + j] * x[j];
            }
            check_vals[i] = acc;
        }
        let mut recovered = vec![0.0; n_rows];
        for i in 0..n_rows {
            let mut acc = 0.0;
            for j in 0..n_rows {
                acc += ops[i * n_rows + j] * check_vals[j];
            }
            recovered[i] = acc;
        }
        let err: f64 = recovered.iter().zip(x.iter()).map(|(r, e)| (r - e).abs()).sum::<f64>() / n_rows as f64;
        assert!(err < 1e-2, "round-trip error too large: {err}");
    }

    #[test]
    fn degenerate_zero_width_level_is_identity() {
        let surf = surrounding_surface::<3>(4);
        let cfg = FmmConfig::new(1.05, 1.95, 4, 1, vec![]);
        let ops = build_levels_operator(&Laplace3dKernel, &cfg, &surf, 0.0, 0, cfg.inner_r, cfg.outer_r).unwrap();
        let n_rows = surf.len();
        for i in 0..n_rows {
            for j in 0..n_rows {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(ops[i * n_rows + j], expected, epsilon = 1e-12);
            }
        }
    }
}
