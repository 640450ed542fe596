//! Up/down collectors: build the per-level M2M/L2L lists and the diagonal
//! check-to-equivalent (U2E/D2E) lists, plus the leaf-level P2M/L2P lists.

use kifmm_tree::{Octree, OctreeNode};

use crate::ops::{LeveledOp, MatrixFreeOp, OpEntry};

/// Post-order walk of the source tree. `u2e[height]` gets `(s, s)` for every
/// node; leaves also go into `p2m`; every non-leaf appends `(parent, child)`
/// to `m2m[parent.height]` after recursing into the child.
pub fn up_collect<const D: usize>(src_tree: &Octree<D>, u2e: &mut LeveledOp, m2m: &mut LeveledOp, p2m: &mut MatrixFreeOp) {
    up_collect_node(src_tree, src_tree.root(), u2e, m2m, p2m);
}

fn up_collect_node<const D: usize>(
    src_tree: &Octree<D>,
    node: &OctreeNode<D>,
    u2e: &mut LeveledOp,
    m2m: &mut LeveledOp,
    p2m: &mut MatrixFreeOp,
) {
    u2e[node.height].push(OpEntry::new(node, node));
    if node.is_leaf {
        p2m.push(OpEntry::new(node, node));
    } else {
        for &c in &node.children {
            let child = &src_tree.nodes[c];
            up_collect_node(src_tree, child, u2e, m2m, p2m);
            m2m[node.height].push(OpEntry::new(node, child));
        }
    }
}

/// Pre-order walk of the observation tree. `d2e[depth]` gets `(o, o)` for
/// every node; leaves also go into `l2p`; every non-leaf appends
/// `(child, parent)` to `l2l[child.depth]` before recursing into the child.
pub fn down_collect<const D: usize>(obs_tree: &Octree<D>, d2e: &mut LeveledOp, l2l: &mut LeveledOp, l2p: &mut MatrixFreeOp) {
    down_collect_node(obs_tree, obs_tree.root(), d2e, l2l, l2p);
}

fn down_collect_node<const D: usize>(
    obs_tree: &Octree<D>,
    node: &OctreeNode<D>,
    d2e: &mut LeveledOp,
    l2l: &mut LeveledOp,
    l2p: &mut MatrixFreeOp,
) {
    d2e[node.depth].push(OpEntry::new(node, node));
    if node.is_leaf {
        l2p.push(OpEntry::new(node, node));
    } else {
        for &c in &node.children {
            let child = &obs_tree.nodes[c];
            l2l[child.depth].push(OpEntry::new(child, node));
            down_collect_node(obs_tree, child, d2e, l2l, l2p);
        }
    }
}
