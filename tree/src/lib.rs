//! Adaptive tree construction and equivalent-surface geometry for
//! kernel-independent FMM.

pub mod geometry;
pub mod octree;
pub mod surface;

pub use geometry::{bounding_box, in_box, n_children, Cube};
pub use octree::{build_tree, Octree, OctreeNode};
pub use surface::{inscribe_surf, surrounding_surface};
