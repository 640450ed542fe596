//! Reference (dense, quadratic) evaluation, used by tests as the accuracy
//! baseline the matrix-free evaluator is checked against.

use kifmm_kernel::{Kernel, NBodyProblem};

use crate::error::FmmError;

/// Dense `T*n_obs x T*n_src` evaluation of `kernel` between two point
/// clouds.
pub fn direct_eval<const D: usize, K: Kernel<D>>(
    kernel: &K,
    obs_pts: &[[f64; D]],
    obs_ns: &[[f64; D]],
    src_pts: &[[f64; D]],
    src_ns: &[[f64; D]],
    params: &[f64],
) -> Result<Vec<f64>, FmmError> {
    let t = kernel.tensor_dim();
    let mut out = vec![0.0; t * obs_pts.len() * t * src_pts.len()];
    let problem = NBodyProblem::new(obs_pts, obs_ns, src_pts, src_ns, params);
    kernel.f(&problem, &mut out)?;
    Ok(out)
}

/// Reference matrix-free evaluation: `y = K(obs, src) * x`, computed
/// directly rather than through a plan.
pub fn mf_direct_eval<const D: usize, K: Kernel<D>>(
    kernel: &K,
    obs_pts: &[[f64; D]],
    obs_ns: &[[f64; D]],
    src_pts: &[[f64; D]],
    src_ns: &[[f64; D]],
    params: &[f64],
    x: &[f64],
) -> Result<Vec<f64>, FmmError> {
    let t = kernel.tensor_dim();
    if x.len() != t * src_pts.len() {
        return Err(FmmError::Usage(format!(
            "density has length {}, expected {} (= tensor_dim {} * n_src {})",
            x.len(),
            t * src_pts.len(),
            t,
            src_pts.len()
        )));
    }
    let mut out = vec![0.0; t * obs_pts.len()];
    let problem = NBodyProblem::new(obs_pts, obs_ns, src_pts, src_ns, params);
    kernel.mf_f(&problem, &mut out, x)?;
    Ok(out)
}
