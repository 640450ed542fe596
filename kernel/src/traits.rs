use crate::error::KernelError;
use crate::problem::NBodyProblem;

/// A named, translation-invariant pairwise kernel.
///
/// The interaction between one observation point and one source point is a
/// `tensor_dim x tensor_dim` block; a kernel is otherwise a pure function of
/// point positions, normals and `params` (no internal state, hence `&self`
/// methods take no `&mut self`).
pub trait Kernel<const D: usize>: Send + Sync {
    /// Per-point-pair block size `T` (1 for scalar Laplace, `D` for the
    /// Stokes double layer used here).
    fn tensor_dim(&self) -> usize;

    fn name(&self) -> &'static str;

    /// Dense evaluation: writes (not accumulates) a
    /// `T * n_obs x T * n_src` row-major block into `out`.
    ///
    /// `out[(T*i + ti) * (T*n_src) + (T*j + tj)]` is the response at
    /// observation `i`, component `ti`, due to source `j`, component `tj`.
    fn f(&self, problem: &NBodyProblem<D>, out: &mut [f64]) -> Result<(), KernelError>;

    /// Matrix-free application: `out += K(obs, src) * x`, accumulating into
    /// `out` rather than overwriting it.
    ///
    /// `x` has length `T * n_src`, `out` has length `T * n_obs`.
    fn mf_f(&self, problem: &NBodyProblem<D>, out: &mut [f64], x: &[f64]) -> Result<(), KernelError>;
}
