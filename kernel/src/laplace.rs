use crate::error::KernelError;
use crate::problem::NBodyProblem;
use crate::traits::Kernel;

fn dist<const D: usize>(a: &[f64; D], b: &[f64; D]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum::<f64>().sqrt()
}

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

/// The 3D Laplace single-layer kernel, `1 / (4*pi*r)`. Scalar (`T = 1`).
#[derive(Debug, Clone, Copy, Default)]
pub struct Laplace3dKernel;

impl Kernel<3> for Laplace3dKernel {
    fn tensor_dim(&self) -> usize {
        1
    }

    fn name(&self) -> &'static str {
        "laplace_3d"
    }

    fn f(&self, problem: &NBodyProblem<3>, out: &mut [f64]) -> Result<(), KernelError> {
        check_no_params(self.name(), problem.params)?;
        let (n_obs, n_src) = (problem.n_obs(), problem.n_src());
        debug_assert_eq!(out.len(), n_obs * n_src);
        for i in 0..n_obs {
            for j in 0..n_src {
                let r = dist(&problem.obs_pts[i], &problem.src_pts[j]);
                out[i * n_src + j] = 1.0 / (4.0 * std::f64::consts::PI * r);
            }
        }
        Ok(())
    }

    fn mf_f(&self, problem: &NBodyProblem<3>, out: &mut [f64], x: &[f64]) -> Result<(), KernelError> {
        check_no_params(self.name(), problem.params)?;
        let (n_obs, n_src) = (problem.n_obs(), problem.n_src());
        debug_assert_eq!(out.len(), n_obs);
        debug_assert_eq!(x.len(), n_src);
        for i in 0..n_obs {
            let mut acc = 0.0;
            for j in 0..n_src {
                let r = dist(&problem.obs_pts[i], &problem.src_pts[j]);
                acc += x[j] / (4.0 * std::f64::consts::PI * r);
            }
            out[i] += acc;
        }
        Ok(())
    }
}

/// The 2D Laplace single-layer kernel, `-log(r) / (2*pi)`. Scalar (`T = 1`).
#[derive(Debug, Clone, Copy, Default)]
pub struct Laplace2dKernel;

impl Kernel<2> for Laplace2dKernel {
    fn tensor_dim(&self) -> usize {
        1
    }

    fn name(&self) -> &'static str {
        "laplace_2d"
    }

    fn f(&self, problem: &NBodyProblem<2>, out: &mut [f64]) -> Result<(), KernelError> {
        check_no_params(self.name(), problem.params)?;
        let (n_obs, n_src) = (problem.n_obs(), problem.n_src());
        debug_assert_eq!(out.len(), n_obs * n_src);
        for i in 0..n_obs {
            for j in 0..n_src {
                let r = dist(&problem.obs_pts[i], &problem.src_pts[j]);
                out[i * n_src + j] = -r.ln() / (2.0 * std::f64::consts::PI);
            }
        }
        Ok(())
    }

    fn mf_f(&self, problem: &NBodyProblem<2>, out: &mut [f64], x: &[f64]) -> Result<(), KernelError> {
        check_no_params(self.name(), problem.params)?;
        let (n_obs, n_src) = (problem.n_obs(), problem.n_src());
        debug_assert_eq!(out.len(), n_obs);
        debug_assert_eq!(x.len(), n_src);
        for i in 0..n_obs {
            let mut acc = 0.0;
            for j in 0..n_src {
                let r = dist(&problem.obs_pts[i], &problem.src_pts[j]);
                acc += x[j] * (-r.ln() / (2.0 * std::f64::consts::PI));
            }
            out[i] += acc;
        }
        Ok(())
    }
}
