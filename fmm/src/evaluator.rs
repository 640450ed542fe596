//! Matrix-free evaluator: applies every interaction list to a density
//! vector in the strict phase order upward -> M2L/P2L -> downward ->
//! near-field. Every kernel apply accumulates ("adds"); target buffers are
//! zeroed once per call.

use kifmm_kernel::{Kernel, NBodyProblem};
use kifmm_tree::{inscribe_surf, Octree};

use crate::error::FmmError;
use crate::ops::OpEntry;
use crate::plan::FmmMat;

fn copy_segment(buf: &[f64], start: usize, len: usize) -> Vec<f64> {
    buf[start..start + len].to_vec()
}

/// Apply a node's diagonal check-to-equivalent operator in place.
///
/// `ops` holds one dense block per tree *depth* (width depends only on
/// depth, regardless of how nodes are grouped into per-height or per-depth
/// lists for dependency ordering), so each entry looks up its own node's
/// depth rather than trusting the list's grouping key.
pub(crate) fn apply_diag_inplace<const D: usize>(
    buf: &mut [f64],
    ops: &[f64],
    level_entries: &[OpEntry],
    tree: &Octree<D>,
    n_rows: usize,
) {
    for e in level_entries {
        debug_assert_eq!(e.obs_idx, e.src_idx);
        let idx = e.obs_idx;
        let depth = tree.nodes[idx].depth;
        let op = &ops[depth * n_rows * n_rows..(depth + 1) * n_rows * n_rows];
        let input = copy_segment(buf, idx * n_rows, n_rows);
        let out = &mut buf[idx * n_rows..idx * n_rows + n_rows];
        for (i, slot) in out.iter_mut().enumerate() {
            let mut acc = 0.0;
            for (j, v) in input.iter().enumerate() {
                acc += op[i * n_rows + j] * v;
            }
            *slot = acc;
        }
    }
}

/// Run the matrix-free evaluator: density `x` (length `T * n_src_pts`) to
/// potential `y` (length `T * n_obs_pts`).
#[tracing::instrument(skip(plan, x))]
pub fn matvec<const D: usize, K: Kernel<D>>(plan: &FmmMat<D, K>, x: &[f64]) -> Result<Vec<f64>, FmmError> {
    let t = plan.kernel.tensor_dim();
    let ks = plan.surf.len();

    let n_src_pts = plan.src_tree.n_points();
    let n_obs_pts = plan.obs_tree.n_points();

    if x.len() != t * n_src_pts {
        return Err(FmmError::Usage(format!(
            "density has length {}, plan expects {} (= tensor_dim {} * n_src_pts {})",
            x.len(),
            t * n_src_pts,
            t,
            n_src_pts
        )));
    }

    let mut mult = vec![0.0; t * ks * plan.src_tree.nodes.len()];
    let mut loc = vec![0.0; t * ks * plan.obs_tree.nodes.len()];
    let mut y = vec![0.0; t * n_obs_pts];

    // 1. Upward pass over the source tree, by height.
    for level in 0..=plan.src_tree.max_height {
        if level == 0 {
            apply_p2m(plan, &mut mult, x)?;
        } else {
            apply_m2m(plan, &mut mult, level)?;
        }
        apply_diag_inplace(&mut mult, &plan.u2e_ops, &plan.u2e[level], &plan.src_tree, plan.n_rows);
    }

    // 2. M2L and P2L.
    apply_m2l(plan, &mut loc, &mult)?;
    apply_p2l(plan, &mut loc, x)?;

    // 3. Downward pass over the observation tree, by depth.
    for level in 0..=plan.obs_tree.max_height {
        if level > 0 {
            apply_l2l(plan, &mut loc, level)?;
        }
        apply_diag_inplace(&mut loc, &plan.d2e_ops, &plan.d2e[level], &plan.obs_tree, plan.n_rows);
    }

    // 4. Near field and post-processing.
    apply_l2p(plan, &mut y, &loc)?;
    apply_m2p(plan, &mut y, &mult)?;
    apply_p2p(plan, &mut y, x)?;

    Ok(y)
}

/// Apply the upward M2M chain (with its U2E diagonal conversions) starting
/// from caller-supplied check values at every source node, rather than from
/// P2M. Exercises the M2M/U2E translation operators in isolation, without a
/// density vector or leaf-level P2M step.
pub(crate) fn m2m_chain<const D: usize, K: Kernel<D>>(plan: &FmmMat<D, K>, m_check: &[f64]) -> Result<Vec<f64>, FmmError> {
    let expected = plan.n_rows * plan.src_tree.nodes.len();
    if m_check.len() != expected {
        return Err(FmmError::Usage(format!(
            "m_check has length {}, plan expects {} (= n_rows {} * src nodes {})",
            m_check.len(),
            expected,
            plan.n_rows,
            plan.src_tree.nodes.len()
        )));
    }

    let mut mult = m_check.to_vec();
    for level in 0..=plan.src_tree.max_height {
        if level > 0 {
            apply_m2m(plan, &mut mult, level)?;
        }
        apply_diag_inplace(&mut mult, &plan.u2e_ops, &plan.u2e[level], &plan.src_tree, plan.n_rows);
    }
    Ok(mult)
}

/// Apply the M2P list to a caller-supplied multipole-density vector
/// directly, bypassing the upward pass entirely.
pub(crate) fn m2p_eval<const D: usize, K: Kernel<D>>(plan: &FmmMat<D, K>, multipoles: &[f64]) -> Result<Vec<f64>, FmmError> {
    let expected = plan.n_rows * plan.src_tree.nodes.len();
    if multipoles.len() != expected {
        return Err(FmmError::Usage(format!(
            "multipoles has length {}, plan expects {} (= n_rows {} * src nodes {})",
            multipoles.len(),
            expected,
            plan.n_rows,
            plan.src_tree.nodes.len()
        )));
    }

    let t = plan.kernel.tensor_dim();
    let mut y = vec![0.0; t * plan.obs_tree.n_points()];
    apply_m2p(plan, &mut y, multipoles)?;
    Ok(y)
}

#[allow(clippy::too_many_arguments)]
fn interact_accumulate<const D: usize, K: Kernel<D>>(
    kernel: &K,
    params: &[f64],
    out: &mut [f64],
    obs_pts: &[[f64; D]],
    obs_ns: &[[f64; D]],
    out_start: usize,
    src_pts: &[[f64; D]],
    src_ns: &[[f64; D]],
    x: &[f64],
    x_start: usize,
) -> Result<(), FmmError> {
    if obs_pts.is_empty() || src_pts.is_empty() {
        return Ok(());
    }
    let t = kernel.tensor_dim();
    let problem = NBodyProblem::new(obs_pts, obs_ns, src_pts, src_ns, params);
    let out_slice = &mut out[t * out_start..t * out_start + t * obs_pts.len()];
    let x_slice = &x[t * x_start..t * x_start + t * src_pts.len()];
    kernel.mf_f(&problem, out_slice, x_slice)
        .map_err(FmmError::from)
}

fn apply_p2m<const D: usize, K: Kernel<D>>(plan: &FmmMat<D, K>, mult: &mut [f64], x: &[f64]) -> Result<(), FmmError> {
    let ks = plan.surf.len();
    for e in &plan.p2m {
        let src = &plan.src_tree.nodes[e.src_idx];
        let check = inscribe_surf(&src.bounds, plan.cfg.outer_r, &plan.surf);
        interact_accumulate(
            &plan.kernel,
            &plan.cfg.params,
            mult,
            &check,
            &plan.surf,
            src.idx * ks,
            &plan.src_tree.pts[src.start..src.end],
            &plan.src_tree.normals[src.start..src.end],
            x,
            src.start,
        )?;
    }
    Ok(())
}

pub(crate) fn apply_m2m<const D: usize, K: Kernel<D>>(plan: &FmmMat<D, K>, mult: &mut [f64], level: usize) -> Result<(), FmmError> {
    let ks = plan.surf.len();
    let t = plan.kernel.tensor_dim();
    for e in &plan.m2m[level] {
        let parent = &plan.src_tree.nodes[e.obs_idx];
        let child = &plan.src_tree.nodes[e.src_idx];
        let check = inscribe_surf(&parent.bounds, plan.cfg.outer_r, &plan.surf);
        let equiv = inscribe_surf(&child.bounds, plan.cfg.inner_r, &plan.surf);
        let child_vals = copy_segment(mult, t * ks * child.idx, t * ks);
        let problem = NBodyProblem::new(&check, &plan.surf, &equiv, &plan.surf, &plan.cfg.params);
        let out = &mut mult[t * ks * parent.idx..t * ks * parent.idx + t * ks];
        plan.kernel.mf_f(&problem, out, &child_vals)?;
    }
    Ok(())
}

fn apply_p2l<const D: usize, K: Kernel<D>>(plan: &FmmMat<D, K>, loc: &mut [f64], x: &[f64]) -> Result<(), FmmError> {
    let ks = plan.surf.len();
    for e in &plan.p2l {
        let obs = &plan.obs_tree.nodes[e.obs_idx];
        let src = &plan.src_tree.nodes[e.src_idx];
        let check = inscribe_surf(&obs.bounds, plan.cfg.inner_r, &plan.surf);
        interact_accumulate(
            &plan.kernel,
            &plan.cfg.params,
            loc,
            &check,
            &plan.surf,
            obs.idx * ks,
            &plan.src_tree.pts[src.start..src.end],
            &plan.src_tree.normals[src.start..src.end],
            x,
            src.start,
        )?;
    }
    Ok(())
}

fn apply_m2l<const D: usize, K: Kernel<D>>(plan: &FmmMat<D, K>, loc: &mut [f64], mult: &[f64]) -> Result<(), FmmError> {
    let ks = plan.surf.len();
    let t = plan.kernel.tensor_dim();
    for e in &plan.m2l {
        let obs = &plan.obs_tree.nodes[e.obs_idx];
        let src = &plan.src_tree.nodes[e.src_idx];
        let check = inscribe_surf(&obs.bounds, plan.cfg.inner_r, &plan.surf);
        let equiv = inscribe_surf(&src.bounds, plan.cfg.inner_r, &plan.surf);
        let src_vals = copy_segment(mult, t * ks * src.idx, t * ks);
        let problem = NBodyProblem::new(&check, &plan.surf, &equiv, &plan.surf, &plan.cfg.params);
        let out = &mut loc[t * ks * obs.idx..t * ks * obs.idx + t * ks];
        plan.kernel.mf_f(&problem, out, &src_vals)?;
    }
    Ok(())
}

fn apply_l2l<const D: usize, K: Kernel<D>>(plan: &FmmMat<D, K>, loc: &mut [f64], level: usize) -> Result<(), FmmError> {
    let ks = plan.surf.len();
    let t = plan.kernel.tensor_dim();
    for e in &plan.l2l[level] {
        let child = &plan.obs_tree.nodes[e.obs_idx];
        let parent = &plan.obs_tree.nodes[e.src_idx];
        let check = inscribe_surf(&child.bounds, plan.cfg.inner_r, &plan.surf);
        let equiv = inscribe_surf(&parent.bounds, plan.cfg.outer_r, &plan.surf);
        let parent_vals = copy_segment(loc, t * ks * parent.idx, t * ks);
        let problem = NBodyProblem::new(&check, &plan.surf, &equiv, &plan.surf, &plan.cfg.params);
        let out = &mut loc[t * ks * child.idx..t * ks * child.idx + t * ks];
        plan.kernel.mf_f(&problem, out, &parent_vals)?;
    }
    Ok(())
}

pub(crate) fn apply_m2p<const D: usize, K: Kernel<D>>(plan: &FmmMat<D, K>, y: &mut [f64], mult: &[f64]) -> Result<(), FmmError> {
    let ks = plan.surf.len();
    for e in &plan.m2p {
        let obs = &plan.obs_tree.nodes[e.obs_idx];
        let src = &plan.src_tree.nodes[e.src_idx];
        let equiv = inscribe_surf(&src.bounds, plan.cfg.inner_r, &plan.surf);
        interact_accumulate(
            &plan.kernel,
            &plan.cfg.params,
            y,
            &plan.obs_tree.pts[obs.start..obs.end],
            &plan.obs_tree.normals[obs.start..obs.end],
            obs.start,
            &equiv,
            &plan.surf,
            mult,
            src.idx * ks,
        )?;
    }
    Ok(())
}

fn apply_l2p<const D: usize, K: Kernel<D>>(plan: &FmmMat<D, K>, y: &mut [f64], loc: &[f64]) -> Result<(), FmmError> {
    let ks = plan.surf.len();
    for e in &plan.l2p {
        let obs = &plan.obs_tree.nodes[e.obs_idx];
        let equiv = inscribe_surf(&obs.bounds, plan.cfg.outer_r, &plan.surf);
        interact_accumulate(
            &plan.kernel,
            &plan.cfg.params,
            y,
            &plan.obs_tree.pts[obs.start..obs.end],
            &plan.obs_tree.normals[obs.start..obs.end],
            obs.start,
            &equiv,
            &plan.surf,
            loc,
            obs.idx * ks,
        )?;
    }
    Ok(())
}

fn apply_p2p<const D: usize, K: Kernel<D>>(plan: &FmmMat<D, K>, y: &mut [f64], x: &[f64]) -> Result<(), FmmError> {
    for e in &plan.p2p {
        let obs = &plan.obs_tree.nodes[e.obs_idx];
        let src = &plan.src_tree.nodes[e.src_idx];
        interact_accumulate(
            &plan.kernel,
            &plan.cfg.params,
            y,
            &plan.obs_tree.pts[obs.start..obs.end],
            &plan.obs_tree.normals[obs.start..obs.end],
            obs.start,
            &plan.src_tree.pts[src.start..src.end],
            &plan.src_tree.normals[src.start..src.end],
            x,
            src.start,
        )?;
    }
    Ok(())
}
