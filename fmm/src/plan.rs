use kifmm_kernel::Kernel;
use kifmm_tree::{surrounding_surface, Octree};

use crate::collect::{down_collect, up_collect};
use crate::config::FmmConfig;
use crate::error::FmmError;
use crate::ops::{LeveledOp, MatrixFreeOp};
use crate::operators::build_levels_operator;
use crate::traversal::{traverse, InteractionLists};

/// An FMM plan: both permuted trees, the configuration, the inscribed
/// surface pattern, every global and per-level interaction list, and the two
/// contiguous per-level dense operator arrays.
pub struct FmmMat<const D: usize, K: Kernel<D>> {
    pub obs_tree: Octree<D>,
    pub src_tree: Octree<D>,
    pub cfg: FmmConfig,
    pub kernel: K,
    pub surf: Vec<[f64; D]>,

    pub p2p: MatrixFreeOp,
    pub p2m: MatrixFreeOp,
    pub m2p: MatrixFreeOp,
    pub l2p: MatrixFreeOp,
    pub p2l: MatrixFreeOp,
    pub m2l: MatrixFreeOp,

    /// Indexed by the *parent's* (source) height.
    pub m2m: LeveledOp,
    /// Indexed by the *child's* (observation) depth.
    pub l2l: LeveledOp,
    /// Indexed by source node height.
    pub u2e: LeveledOp,
    /// Indexed by observation node depth.
    pub d2e: LeveledOp,

    /// `(src_tree.max_height + 1) * n_rows^2`, row-major per level.
    pub u2e_ops: Vec<f64>,
    /// `(obs_tree.max_height + 1) * n_rows^2`, row-major per level.
    pub d2e_ops: Vec<f64>,
    /// `tensor_dim * surf.len()`: the row/column count of a single
    /// per-level operator.
    pub n_rows: usize,
}

impl<const D: usize, K: Kernel<D>> FmmMat<D, K> {
    /// Total number of near-field (P2P) observation-source point pairs, the
    /// size of the sparse near-field matrix this plan implicitly represents.
    pub fn nnz(&self) -> usize {
        self.p2p
            .iter()
            .map(|e| (e.obs_end - e.obs_start) * (e.src_end - e.src_start))
            .sum()
    }

    /// Apply the upward M2M/U2E chain to caller-supplied per-node check
    /// values, skipping P2M. Useful for testing the translation operators
    /// without going through a density vector.
    pub fn apply_m2m_chain(&self, m_check: &[f64]) -> Result<Vec<f64>, FmmError> {
        crate::evaluator::m2m_chain(self, m_check)
    }

    /// Apply the M2P list directly to a caller-supplied multipole-density
    /// vector, bypassing the upward pass.
    pub fn apply_m2p(&self, multipoles: &[f64]) -> Result<Vec<f64>, FmmError> {
        crate::evaluator::m2p_eval(self, multipoles)
    }
}

/// Build an FMM plan from two already-constructed trees.
#[tracing::instrument(skip(obs_tree, src_tree, kernel))]
pub fn build_plan<const D: usize, K: Kernel<D>>(
    obs_tree: Octree<D>,
    src_tree: Octree<D>,
    cfg: FmmConfig,
    kernel: K,
) -> Result<FmmMat<D, K>, FmmError> {
    cfg.validate()?;

    let surf = surrounding_surface::<D>(cfg.order);
    let n_rows = surf.len() * kernel.tensor_dim();

    tracing::debug!(
        order = cfg.order,
        surf_len = surf.len(),
        n_rows,
        src_nodes = src_tree.nodes.len(),
        obs_nodes = obs_tree.nodes.len(),
        "building plan"
    );

    let u2e_ops = build_levels_operator(
        &kernel,
        &cfg,
        &surf,
        src_tree.root().bounds.width,
        src_tree.max_height,
        cfg.outer_r,
        cfg.inner_r,
    )?;
    let d2e_ops = build_levels_operator(
        &kernel,
        &cfg,
        &surf,
        obs_tree.root().bounds.width,
        obs_tree.max_height,
        cfg.inner_r,
        cfg.outer_r,
    )?;

    let mut u2e: LeveledOp = vec![MatrixFreeOp::new(); src_tree.max_height + 1];
    let mut m2m: LeveledOp = vec![MatrixFreeOp::new(); src_tree.max_height + 1];
    let mut p2m = MatrixFreeOp::new();
    up_collect(&src_tree, &mut u2e, &mut m2m, &mut p2m);

    let mut d2e: LeveledOp = vec![MatrixFreeOp::new(); obs_tree.max_height + 1];
    let mut l2l: LeveledOp = vec![MatrixFreeOp::new(); obs_tree.max_height + 1];
    let mut l2p = MatrixFreeOp::new();
    down_collect(&obs_tree, &mut d2e, &mut l2l, &mut l2p);

    let mut lists = InteractionLists::default();
    traverse(&cfg, surf.len(), &obs_tree, &src_tree, &mut lists);

    Ok(FmmMat {
        obs_tree,
        src_tree,
        cfg,
        kernel,
        surf,
        p2p: lists.p2p,
        p2m,
        m2p: lists.m2p,
        l2p,
        p2l: lists.p2l,
        m2l: lists.m2l,
        m2m,
        l2l,
        u2e,
        d2e,
        u2e_ops,
        d2e_ops,
        n_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kifmm_kernel::Laplace3dKernel;
    use kifmm_tree::build_tree;

    #[test]
    fn nnz_counts_every_p2p_point_pair() {
        let pts = vec![[0.0, 0.0, 0.0], [0.1, 0.0, 0.0], [0.2, 0.0, 0.0]];
        let normals = vec![[0.0, 0.0, 1.0]; pts.len()];
        let obs_tree = build_tree(&pts, &normals, 10);
        let src_tree = build_tree(&pts, &normals, 10);
        let cfg = FmmConfig::new(0.5, 1.5, 4, 10, vec![]);
        let plan = build_plan(obs_tree, src_tree, cfg, Laplace3dKernel).unwrap();

        assert_eq!(plan.p2p.len(), 1);
        assert_eq!(plan.nnz(), pts.len() * pts.len());
    }

    #[test]
    fn apply_m2m_chain_matches_manual_u2e_for_single_leaf_tree() {
        let pts = vec![[0.0, 0.0, 0.0], [0.1, 0.0, 0.0]];
        let normals = vec![[0.0, 0.0, 1.0]; pts.len()];
        let obs_tree = build_tree(&pts, &normals, 10);
        let src_tree = build_tree(&pts, &normals, 10);
        let cfg = FmmConfig::new(0.5, 1.5, 4, 10, vec![]);
        let plan = build_plan(obs_tree, src_tree, cfg, Laplace3dKernel).unwrap();
        assert_eq!(plan.src_tree.max_height, 0);

        let n = plan.n_rows;
        let m_check: Vec<f64> = (0..n).map(|i| (i as f64 + 1.0) * 0.1).collect();
        let chained = plan.apply_m2m_chain(&m_check).unwrap();

        let op = &plan.u2e_ops[0..n * n];
        let mut expected = vec![0.0; n];
        for (i, slot) in expected.iter_mut().enumerate() {
            *slot = (0..n).map(|j| op[i * n + j] * m_check[j]).sum();
        }
        for i in 0..n {
            assert!((chained[i] - expected[i]).abs() < 1e-10);
        }
    }

    #[test]
    fn apply_m2m_chain_rejects_wrong_length() {
        let pts = vec![[0.0, 0.0, 0.0], [0.1, 0.0, 0.0]];
        let normals = vec![[0.0, 0.0, 1.0]; pts.len()];
        let obs_tree = build_tree(&pts, &normals, 10);
        let src_tree = build_tree(&pts, &normals, 10);
        let cfg = FmmConfig::new(0.5, 1.5, 4, 10, vec![]);
        let plan = build_plan(obs_tree, src_tree, cfg, Laplace3dKernel).unwrap();

        assert!(matches!(plan.apply_m2m_chain(&[0.0; 3]), Err(FmmError::Usage(_))));
        assert!(matches!(plan.apply_m2p(&[0.0; 3]), Err(FmmError::Usage(_))));
    }
}
