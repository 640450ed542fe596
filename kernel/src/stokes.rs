use crate::error::KernelError;
use crate::problem::NBodyProblem;
use crate::traits::Kernel;

fn check_no_params(kernel: &'static str, params: &[f64]) -> Result<(), KernelError> {
    if !params.is_empty() {
        return Err(KernelError::ParamsLength {
            kernel,
            expected: 0,
            actual: params.len(),
        });
    }
    Ok(())
}

fn sub<const D: usize>(a: &[f64; D], b: &[f64; D]) -> [f64; D] {
    let mut out = [0.0; D];
    for d in 0..D {
        out[d] = a[d] - b[d];
    }
    out
}

fn dot<const D: usize>(a: &[f64; D], b: &[f64; D]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Coefficient of the Stokes double-layer (stresslet) kernel, which differs
/// between 2D and 3D both in normalization and in the power of `r` in the
/// denominator.
fn stresslet_block<const D: usize>(obs: &[f64; D], src: &[f64; D], src_n: &[f64; D]) -> [[f64; D]; D] {
    let r = sub(obs, src);
    let r2: f64 = dot(&r, &r);
    let r_dot_n = dot(&r, src_n);

    let (coeff, denom) = if D == 3 {
        (-6.0 / (8.0 * std::f64::consts::PI), r2.powf(2.5))
    } else {
        (-2.0 / std::f64::consts::PI, r2 * r2)
    };

    std::array::from_fn(|i| std::array::from_fn(|j| coeff * r[i] * r[j] * r_dot_n / denom))
}

/// The Stokes double-layer (stresslet) kernel, derived from the Stokeslet,
/// used as a boundary-integral traction operator. Tensor dimension equals the
/// ambient dimension (`T = 3` in 3D, `T = 2` in 2D).
#[derive(Debug, Clone, Copy, Default)]
pub struct StokesKernel<const D: usize>;

impl<const D: usize> Kernel<D> for StokesKernel<D> {
    fn tensor_dim(&self) -> usize {
        D
    }

    fn name(&self) -> &'static str {
        if D == 3 {
            "stokes_3d"
        } else {
            "stokes_2d"
        }
    }

    fn f(&self, problem: &NBodyProblem<D>, out: &mut [f64]) -> Result<(), KernelError> {
        check_no_params(self.name(), problem.params)?;
        let (n_obs, n_src) = (problem.n_obs(), problem.n_src());
        debug_assert_eq!(out.len(), n_obs * D * n_src * D);
        let row_len = n_src * D;
        for i in 0..n_obs {
            for j in 0..n_src {
                let block = stresslet_block(&problem.obs_pts[i], &problem.src_pts[j], &problem.src_ns[j]);
                for ti in 0..D {
                    for tj in 0..D {
                        out[(D * i + ti) * row_len + D * j + tj] = block[ti][tj];
                    }
                }
            }
        }
        Ok(())
    }

    fn mf_f(&self, problem: &NBodyProblem<D>, out: &mut [f64], x: &[f64]) -> Result<(), KernelError> {
        check_no_params(self.name(), problem.params)?;
        let (n_obs, n_src) = (problem.n_obs(), problem.n_src());
        debug_assert_eq!(out.len(), n_obs * D);
        debug_assert_eq!(x.len(), n_src * D);
        for i in 0..n_obs {
            let mut acc = [0.0; D];
            for j in 0..n_src {
                let block = stresslet_block(&problem.obs_pts[i], &problem.src_pts[j], &problem.src_ns[j]);
                for ti in 0..D {
                    for tj in 0..D {
                        acc[ti] += block[ti][tj] * x[D * j + tj];
                    }
                }
            }
            for ti in 0..D {
                out[D * i + ti] += acc[ti];
            }
        }
        Ok(())
    }
}
