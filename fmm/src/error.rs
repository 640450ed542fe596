use thiserror::Error;

/// Error taxonomy for plan construction and evaluation. All errors are
/// surfaced to the caller; the engine never attempts internal recovery.
/// Traversal and the up/down collectors are total functions of the trees and
/// cannot produce one of these — only `build_plan` and `matvec` do.
#[derive(Debug, Error)]
pub enum FmmError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("geometry error: {0}")]
    Geometry(String),

    #[error("numeric error: {0}")]
    Numeric(String),

    #[error("usage error: {0}")]
    Usage(String),
}

impl From<kifmm_kernel::KernelError> for FmmError {
    // A kernel only ever validates its own input shape (`params` length),
    // which belongs under configuration here.
    fn from(e: kifmm_kernel::KernelError) -> Self {
        FmmError::Configuration(e.to_string())
    }
}
