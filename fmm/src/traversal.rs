//! Dual-tree traversal: classifies every well-separated (or leaf-leaf) node
//! pair into one of six interaction lists via the multipole acceptance
//! criterion.

use kifmm_tree::{geometry::dist, Octree, OctreeNode};

use crate::config::FmmConfig;
use crate::ops::{MatrixFreeOp, OpEntry};

/// The four interaction lists the traversal itself produces. `P2M` and
/// `L2P` are populated separately by the up/down collectors.
#[derive(Default)]
pub struct InteractionLists {
    pub p2p: MatrixFreeOp,
    pub m2p: MatrixFreeOp,
    pub p2l: MatrixFreeOp,
    pub m2l: MatrixFreeOp,
}

pub fn traverse<const D: usize>(
    cfg: &FmmConfig,
    surf_len: usize,
    obs_tree: &Octree<D>,
    src_tree: &Octree<D>,
    lists: &mut InteractionLists,
) {
    traverse_pair(cfg, surf_len, obs_tree, src_tree, obs_tree.root(), src_tree.root(), lists);
}

fn traverse_pair<const D: usize>(
    cfg: &FmmConfig,
    surf_len: usize,
    obs_tree: &Octree<D>,
    src_tree: &Octree<D>,
    obs_n: &OctreeNode<D>,
    src_n: &OctreeNode<D>,
    lists: &mut InteractionLists,
) {
    let r_src = src_n.bounds.enclosing_radius();
    let r_obs = obs_n.bounds.enclosing_radius();
    let sep = dist(&obs_n.bounds.center, &src_n.bounds.center);

    if cfg.outer_r * r_src + cfg.inner_r * r_obs < cfg.mac_safety_factor * sep {
        let small_src = src_n.n_points() < surf_len;
        let small_obs = obs_n.n_points() < surf_len;
        let entry = OpEntry::new(obs_n, src_n);
        match (small_obs, small_src) {
            (true, true) => lists.p2p.push(entry),
            (true, false) => lists.m2p.push(entry),
            (false, true) => lists.p2l.push(entry),
            (false, false) => lists.m2l.push(entry),
        }
        return;
    }

    if obs_n.is_leaf && src_n.is_leaf {
        lists.p2p.push(OpEntry::new(obs_n, src_n));
        return;
    }

    let split_src = (r_obs < r_src && !src_n.is_leaf) || obs_n.is_leaf;
    if split_src {
        for &c in &src_n.children {
            traverse_pair(cfg, surf_len, obs_tree, src_tree, obs_n, &src_tree.nodes[c], lists);
        }
    } else {
        for &c in &obs_n.children {
            traverse_pair(cfg, surf_len, obs_tree, src_tree, &obs_tree.nodes[c], src_n, lists);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kifmm_tree::build_tree;

    #[test]
    fn well_separated_clusters_produce_single_m2l_no_p2p() {
        let mut left = Vec::new();
        let mut right = Vec::new();
        for i in 0..200 {
            let t = i as f64 * 0.001;
            left.push([t, t * 0.3, -t * 0.2]);
            right.push([10.0 + t, t * 0.3, -t * 0.2]);
        }
        let normals_left = vec![[1.0, 0.0, 0.0]; left.len()];
        let normals_right = vec![[1.0, 0.0, 0.0]; right.len()];

        let obs_tree = build_tree(&left, &normals_left, 50);
        let src_tree = build_tree(&right, &normals_right, 50);

        let cfg = FmmConfig::new(0.5, 1.5, 4, 50, vec![]);
        let surf_len = kifmm_tree::surrounding_surface::<3>(cfg.order).len();

        let mut lists = InteractionLists::default();
        traverse(&cfg, surf_len, &obs_tree, &src_tree, &mut lists);

        assert!(lists.p2p.is_empty());
        assert!(!lists.m2l.is_empty() || !lists.m2p.is_empty() || !lists.p2l.is_empty());
    }

    #[test]
    fn emitted_m2l_pairs_satisfy_mac() {
        let mut rng_pts = Vec::new();
        for i in 0..500 {
            let t = i as f64 / 500.0;
            rng_pts.push([t, (t * 7.0).sin() * 0.3, (t * 13.0).cos() * 0.3]);
        }
        let normals = vec![[0.0, 0.0, 1.0]; rng_pts.len()];
        let tree = build_tree(&rng_pts, &normals, 20);

        let cfg = FmmConfig::new(0.5, 1.5, 4, 20, vec![]);
        let surf_len = kifmm_tree::surrounding_surface::<3>(cfg.order).len();

        let mut lists = InteractionLists::default();
        traverse(&cfg, surf_len, &tree, &tree, &mut lists);

        for entry in lists.m2l.iter().chain(lists.m2p.iter()).chain(lists.p2l.iter()) {
            let obs = &tree.nodes[entry.obs_idx];
            let src = &tree.nodes[entry.src_idx];
            let r_o = obs.bounds.enclosing_radius();
            let r_s = src.bounds.enclosing_radius();
            let sep = dist(&obs.bounds.center, &src.bounds.center);
            assert!(cfg.outer_r * r_s + cfg.inner_r * r_o < cfg.mac_safety_factor * sep + 1e-9);
        }
    }

    #[test]
    fn every_point_pair_is_covered_exactly_once() {
        let mut pts = Vec::new();
        for i in 0..40 {
            let t = i as f64 / 40.0;
            pts.push([t, (t * 3.0).sin() * 0.4, (t * 5.0).cos() * 0.4]);
        }
        let normals = vec![[0.0, 0.0, 1.0]; pts.len()];
        let tree = build_tree(&pts, &normals, 5);

        let cfg = FmmConfig::new(0.5, 1.5, 4, 5, vec![]);
        let surf_len = kifmm_tree::surrounding_surface::<3>(cfg.order).len();

        let mut lists = InteractionLists::default();
        traverse(&cfg, surf_len, &tree, &tree, &mut lists);

        let n = pts.len();
        let mut coverage = vec![0u32; n * n];
        for entry in lists.p2p.iter().chain(lists.m2p.iter()).chain(lists.p2l.iter()).chain(lists.m2l.iter()) {
            for i in entry.obs_start..entry.obs_end {
                for j in entry.src_start..entry.src_end {
                    coverage[i * n + j] += 1;
                }
            }
        }
        assert!(coverage.iter().all(|&c| c == 1), "every (obs, src) point pair must be covered exactly once");
    }
}
