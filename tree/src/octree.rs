//! Adaptive `2^D`-tree construction.

use crate::geometry::{bounding_box, find_containing_subcell, get_subcell, n_children, Cube};

/// A single node of a [`Octree`], stored by value in the tree's arena.
///
/// `[start, end)` indexes into the owning tree's permuted point arrays.
/// `children` is empty for a leaf and has one entry per non-empty subcell
/// otherwise (fewer than `2^D` when some subcells are empty).
#[derive(Debug, Clone)]
pub struct OctreeNode<const D: usize> {
    pub start: usize,
    pub end: usize,
    pub bounds: Cube<D>,
    pub is_leaf: bool,
    pub idx: usize,
    pub depth: usize,
    pub height: usize,
    pub children: Vec<usize>,
}

impl<const D: usize> OctreeNode<D> {
    pub fn n_points(&self) -> usize {
        self.end - self.start
    }
}

/// An adaptive `2^D`-tree over a permuted copy of a point cloud.
///
/// Nodes are stored in a single arena (`nodes`); all inter-node references
/// are indices into that arena, never pointers.
#[derive(Debug, Clone)]
pub struct Octree<const D: usize> {
    pub nodes: Vec<OctreeNode<D>>,
    pub pts: Vec<[f64; D]>,
    pub normals: Vec<[f64; D]>,
    /// `orig_idxs[i]` is the index, in the caller's original ordering, of the
    /// point now stored at permuted position `i`.
    pub orig_idxs: Vec<usize>,
    pub max_height: usize,
    pub n_per_cell: usize,
}

impl<const D: usize> Octree<D> {
    pub fn root(&self) -> &OctreeNode<D> {
        // The root is always the last node pushed: it is finalized only
        // after every descendant has been (post-order construction).
        self.nodes.last().expect("a tree always has at least one node")
    }

    pub fn n_points(&self) -> usize {
        self.pts.len()
    }
}

/// Build an adaptive `2^D`-tree over `points`/`normals`.
///
/// Total function of its input: an empty cloud produces a tree with a
/// single, zero-width, empty leaf.
pub fn build_tree<const D: usize>(
    points: &[[f64; D]],
    normals: &[[f64; D]],
    n_per_cell: usize,
) -> Octree<D> {
    assert_eq!(points.len(), normals.len(), "points/normals length mismatch");

    let n = points.len();
    let mut pts = points.to_vec();
    let mut normals = normals.to_vec();
    let mut orig_idxs: Vec<usize> = (0..n).collect();

    let root_bounds = bounding_box(&pts);
    let mut nodes = Vec::new();

    build_node(
        0,
        n,
        root_bounds,
        0,
        &mut pts,
        &mut normals,
        &mut orig_idxs,
        &mut nodes,
        n_per_cell.max(1),
    );

    let max_height = nodes.last().map(|n| n.height).unwrap_or(0);

    Octree {
        nodes,
        pts,
        normals,
        orig_idxs,
        max_height,
        n_per_cell: n_per_cell.max(1),
    }
}

#[allow(clippy::too_many_arguments)]
fn build_node<const D: usize>(
    start: usize,
    end: usize,
    bounds: Cube<D>,
    depth: usize,
    pts: &mut [[f64; D]],
    normals: &mut [[f64; D]],
    orig_idxs: &mut [usize],
    nodes: &mut Vec<OctreeNode<D>>,
    n_per_cell: usize,
) -> usize {
    let count = end - start;

    if count <= n_per_cell || bounds.width == 0.0 {
        let idx = nodes.len();
        nodes.push(OctreeNode {
            start,
            end,
            bounds,
            is_leaf: true,
            idx,
            depth,
            height: 0,
            children: Vec::new(),
        });
        return idx;
    }

    let offsets = partition_by_subcell(start, end, &bounds, pts, normals, orig_idxs);

    let mut children = Vec::new();
    let mut max_child_height = 0usize;
    for c in 0..n_children(D) {
        let (cstart, cend) = (offsets[c], offsets[c + 1]);
        if cstart == cend {
            continue;
        }
        let child_bounds = get_subcell(&bounds, c);
        let child_idx = build_node(
            cstart, cend, child_bounds, depth + 1, pts, normals, orig_idxs, nodes, n_per_cell,
        );
        max_child_height = max_child_height.max(nodes[child_idx].height);
        children.push(child_idx);
    }

    let idx = nodes.len();
    nodes.push(OctreeNode {
        start,
        end,
        bounds,
        is_leaf: false,
        idx,
        depth,
        height: 1 + max_child_height,
        children,
    });
    idx
}

/// In-place counting-sort partition of `[start, end)` into `2^D` buckets by
/// [`find_containing_subcell`], permuting `pts`, `normals` and `orig_idxs`
/// identically. Returns the `2^D + 1` bucket boundary offsets (absolute
/// indices, `offsets[c]..offsets[c+1]` is bucket `c`).
fn partition_by_subcell<const D: usize>(
    start: usize,
    end: usize,
    bounds: &Cube<D>,
    pts: &mut [[f64; D]],
    normals: &mut [[f64; D]],
    orig_idxs: &mut [usize],
) -> Vec<usize> {
    let nchild = n_children(D);
    let mut counts = vec![0usize; nchild];
    for p in &pts[start..end] {
        counts[find_containing_subcell(bounds, p)] += 1;
    }

    let mut offsets = vec![0usize; nchild + 1];
    offsets[0] = start;
    for c in 0..nchild {
        offsets[c + 1] = offsets[c] + counts[c];
    }

    let mut cursor = offsets[..nchild].to_vec();
    for c in 0..nchild {
        while cursor[c] < offsets[c + 1] {
            let i = cursor[c];
            let k = find_containing_subcell(bounds, &pts[i]);
            if k == c {
                cursor[c] += 1;
            } else {
                pts.swap(i, cursor[k]);
                normals.swap(i, cursor[k]);
                orig_idxs.swap(i, cursor[k]);
                cursor[k] += 1;
            }
        }
    }

    offsets
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn empty_cloud_is_single_leaf() {
        let tree: Octree<3> = build_tree(&[], &[], 10);
        assert_eq!(tree.nodes.len(), 1);
        assert!(tree.root().is_leaf);
        assert_eq!(tree.root().n_points(), 0);
        assert_eq!(tree.max_height, 0);
    }

    #[test]
    fn sibling_ranges_partition_parent_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let pts: Vec<[f64; 3]> = (0..2000)
            .map(|_| [rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)])
            .collect();
        let normals = vec![[0.0, 0.0, 1.0]; pts.len()];
        let tree = build_tree(&pts, &normals, 32);

        let leaf_points: usize = tree.nodes.iter().filter(|n| n.is_leaf).map(|n| n.n_points()).sum();
        assert_eq!(leaf_points, pts.len());

        let mut perm = tree.orig_idxs.clone();
        perm.sort_unstable();
        assert_eq!(perm, (0..pts.len()).collect::<Vec<_>>());

        for n in &tree.nodes {
            if !n.is_leaf {
                let mut covered = 0;
                for &c in &n.children {
                    let child = &tree.nodes[c];
                    assert!(child.start >= n.start && child.end <= n.end);
                    covered += child.n_points();
                }
                assert_eq!(covered, n.n_points());
            }
        }
    }

    #[test]
    fn bounds_match_geometric_subcell() {
        let mut rng = StdRng::seed_from_u64(7);
        let pts: Vec<[f64; 2]> = (0..500)
            .map(|_| [rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)])
            .collect();
        let normals = vec![[1.0, 0.0]; pts.len()];
        let tree = build_tree(&pts, &normals, 16);

        for n in &tree.nodes {
            for (child_rank, &c) in n.children.iter().enumerate() {
                // child_rank is the position in the children vec, not
                // necessarily the geometric subcell index (some subcells may
                // be empty and skipped), so recompute the subcell index from
                // the child's own center instead.
                let _ = child_rank;
                let child = &tree.nodes[c];
                let subcell_idx = find_containing_subcell(&n.bounds, &child.bounds.center);
                let expected = get_subcell(&n.bounds, subcell_idx);
                assert_eq!(child.bounds.center, expected.center);
                assert_eq!(child.bounds.width, expected.width);
            }
        }
    }

    #[test]
    fn height_and_depth_consistent() {
        let mut rng = StdRng::seed_from_u64(123);
        let pts: Vec<[f64; 3]> = (0..1000)
            .map(|_| [rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)])
            .collect();
        let normals = vec![[0.0, 1.0, 0.0]; pts.len()];
        let tree = build_tree(&pts, &normals, 20);

        for n in &tree.nodes {
            if n.is_leaf {
                assert_eq!(n.height, 0);
            } else {
                let max_child_height = n.children.iter().map(|&c| tree.nodes[c].height).max().unwrap();
                assert_eq!(n.height, 1 + max_child_height);
            }
        }
        assert_eq!(tree.max_height, tree.root().height);
    }
}
