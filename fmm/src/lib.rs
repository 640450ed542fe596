//! Kernel-independent FMM: plan construction and matrix-free evaluation.
//!
//! Tree construction lives in `kifmm-tree`, kernels in `kifmm-kernel`; this
//! crate wires both into a plan (`build_plan`) and an evaluator (`matvec`).

pub mod collect;
pub mod config;
pub mod direct;
pub mod error;
pub mod evaluator;
pub mod ops;
pub mod operators;
pub mod plan;
pub mod traversal;

pub use config::FmmConfig;
pub use direct::{direct_eval, mf_direct_eval};
pub use error::FmmError;
pub use evaluator::matvec;
pub use kifmm_tree::build_tree;
pub use plan::{build_plan, FmmMat};
