use thiserror::Error;

/// Errors a [`crate::Kernel`] can signal. Per the kernel contract, the only
/// thing a kernel validates is the shape of its own inputs; singular or
/// near-singular `obs == src` point pairs are its responsibility to evaluate
/// (not to reject), and any resulting NaN/Inf propagates silently.
#[derive(Debug, Error)]
pub enum KernelError {
    #[error("params has length {actual}, kernel {kernel} expects {expected}")]
    ParamsLength {
        kernel: &'static str,
        expected: usize,
        actual: usize,
    },
}
