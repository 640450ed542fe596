//! Dense and matrix-free Green's function kernels for kernel-independent FMM.

pub mod error;
pub mod laplace;
pub mod problem;
pub mod registry;
pub mod stokes;
pub mod traits;

pub use error::KernelError;
pub use laplace::{Laplace2dKernel, Laplace3dKernel};
pub use problem::NBodyProblem;
pub use registry::{by_name_2d, by_name_3d};
pub use stokes::StokesKernel;
pub use traits::Kernel;
