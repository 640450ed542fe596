use crate::laplace::{Laplace2dKernel, Laplace3dKernel};
use crate::stokes::StokesKernel;
use crate::traits::Kernel;

/// String-name kernel lookup for the 3D kernel set, for callers that want
/// dynamic dispatch instead of the generic `K: Kernel<D>` bound (the
/// `direct_eval`/`mf_direct_eval` reference entry points, and anything
/// crossing a textual configuration boundary). `None` for an unrecognized
/// name.
pub fn by_name_3d(name: &str) -> Option<Box<dyn Kernel<3>>> {
    match name {
        "laplace_3d" => Some(Box::new(Laplace3dKernel)),
        "stokes_3d" => Some(Box::new(StokesKernel::<3>)),
        _ => None,
    }
}

/// String-name kernel lookup for the 2D kernel set. See [`by_name_3d`].
pub fn by_name_2d(name: &str) -> Option<Box<dyn Kernel<2>>> {
    match name {
        "laplace_2d" => Some(Box::new(Laplace2dKernel)),
        "stokes_2d" => Some(Box::new(StokesKernel::<2>)),
        _ => None,
    }
}
