//! Octree stock model.
//!
//! The tree covers a cubic domain centered at a fixed point. Nodes
//! store no geometry; a cell's center and extent are derived during
//! traversal from the root cube, so a node is one of three cheap
//! variants: uniformly solid or empty, a boundary leaf holding signed
//! corner distances, or a branch with eight children.
//!
//! Child index bits select the octant: bit 0 = +X, bit 1 = +Y,
//! bit 2 = +Z.

use std::mem;

use camcut_geo::{Bbox, Point3, Triangle};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::mc;
use crate::volume::SolidVolume;
use crate::{CutsimError, Result};

const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// One octree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OctreeNode {
    /// A leaf entirely inside (`inside: true`) or outside the stock.
    Solid {
        /// Whether the cell is filled with material.
        inside: bool,
    },
    /// A leaf straddling the stock surface, with signed distances to
    /// the surface at its 8 corners (negative inside).
    Boundary {
        /// Corner distances, in marching-cubes corner order.
        corners: [f64; 8],
    },
    /// An interior node with 8 children.
    Branch {
        /// Children, indexed by octant bits.
        children: Box<[OctreeNode; 8]>,
    },
}

/// A cube cell, derived on the way down the tree.
#[derive(Debug, Clone, Copy)]
struct Cube {
    center: Point3,
    half: f64,
}

impl Cube {
    fn child(&self, idx: usize) -> Cube {
        let q = self.half * 0.5;
        let sign = |bit: usize| if idx & bit != 0 { q } else { -q };
        Cube {
            center: Point3::new(
                self.center.x + sign(1),
                self.center.y + sign(2),
                self.center.z + sign(4),
            ),
            half: q,
        }
    }

    fn corner(&self, i: usize) -> Point3 {
        let off = mc::CORNER_OFFSETS[i];
        Point3::new(
            self.center.x + (2.0 * off[0] as f64 - 1.0) * self.half,
            self.center.y + (2.0 * off[1] as f64 - 1.0) * self.half,
            self.center.z + (2.0 * off[2] as f64 - 1.0) * self.half,
        )
    }

    fn corners(&self) -> [Point3; 8] {
        std::array::from_fn(|i| self.corner(i))
    }

    /// Center-to-corner distance, the radius of the bounding sphere.
    fn diagonal(&self) -> f64 {
        self.half * SQRT_3
    }

    fn bbox(&self) -> Bbox {
        let h = self.half;
        Bbox::new(
            Point3::new(self.center.x - h, self.center.y - h, self.center.z - h),
            Point3::new(self.center.x + h, self.center.y + h, self.center.z + h),
        )
    }
}

/// Octree stock model over a cubic domain.
///
/// Created empty of structure; [`init`](Octree::init) seeds it as a
/// uniform solid block, after which [`subtract`](Octree::subtract)
/// carves material away and [`extract_surface`](Octree::extract_surface)
/// triangulates whatever surface remains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Octree {
    root: Option<OctreeNode>,
    center: Point3,
    root_scale: f64,
    max_depth: u8,
}

impl Octree {
    /// Create a tree over the cube of half-width `root_scale` centered
    /// at `center`, refining at most `max_depth` levels below the root.
    pub fn new(center: Point3, root_scale: f64, max_depth: u8) -> Self {
        Self {
            root: None,
            center,
            root_scale,
            max_depth,
        }
    }

    /// Seed the tree as a full solid block, pre-split to `seed_depth`
    /// levels (clamped to `max_depth`) so the first subtractions do not
    /// bear the whole refinement cost.
    ///
    /// Re-initializing discards any previous carving.
    pub fn init(&mut self, seed_depth: u8) {
        let depth = seed_depth.min(self.max_depth);
        self.root = Some(seed_solid(depth));
        debug!(
            "octree seeded: scale {}, seed depth {depth}, max depth {}",
            self.root_scale, self.max_depth
        );
    }

    /// Side length of a leaf cell at maximum depth.
    pub fn leaf_scale(&self) -> f64 {
        2.0 * self.root_scale / 2.0_f64.powi(i32::from(self.max_depth))
    }

    /// The root node, if the tree has been initialized.
    pub fn root(&self) -> Option<&OctreeNode> {
        self.root.as_ref()
    }

    /// Remove the intersection of `vol` from the stock.
    ///
    /// Cells fully inside the volume empty out, cells the volume
    /// boundary passes through refine down to `max_depth` and store
    /// corner distances, untouched cells are left alone. Subtracting
    /// the same volume twice leaves the tree unchanged the second
    /// time, and a volume entirely outside the domain is a no-op.
    pub fn subtract(&mut self, vol: &SolidVolume) -> Result<()> {
        let root = self.root.as_mut().ok_or(CutsimError::NotInitialized)?;
        let cube = Cube {
            center: self.center,
            half: self.root_scale,
        };
        let node = mem::replace(root, OctreeNode::Solid { inside: false });
        *root = subtract_node(node, &cube, 0, self.max_depth, vol);
        Ok(())
    }

    /// Triangulate the stock surface from the boundary leaves.
    ///
    /// Returns an empty mesh for an uninitialized or fully carved
    /// tree. Triangles are oriented by marching-cubes convention with
    /// normals pointing out of the material.
    pub fn extract_surface(&self) -> Vec<Triangle> {
        let mut out = Vec::new();
        if let Some(root) = &self.root {
            let cube = Cube {
                center: self.center,
                half: self.root_scale,
            };
            collect_triangles(root, &cube, &mut out);
        }
        debug!("surface extraction: {} triangles", out.len());
        out
    }

    /// Total number of nodes, counting branches and leaves.
    pub fn node_count(&self) -> usize {
        fn count(node: &OctreeNode) -> usize {
            match node {
                OctreeNode::Branch { children } => 1 + children.iter().map(count).sum::<usize>(),
                _ => 1,
            }
        }
        self.root.as_ref().map_or(0, count)
    }

    /// Depth of the deepest leaf below the root.
    pub fn max_leaf_depth(&self) -> u8 {
        fn depth(node: &OctreeNode) -> u8 {
            match node {
                OctreeNode::Branch { children } => {
                    1 + children.iter().map(depth).max().unwrap_or(0)
                }
                _ => 0,
            }
        }
        self.root.as_ref().map_or(0, depth)
    }
}

fn seed_solid(depth: u8) -> OctreeNode {
    if depth == 0 {
        OctreeNode::Solid { inside: true }
    } else {
        OctreeNode::Branch {
            children: Box::new(std::array::from_fn(|_| seed_solid(depth - 1))),
        }
    }
}

/// Carve `vol` out of `node`, returning the replacement node.
fn subtract_node(
    node: OctreeNode,
    cube: &Cube,
    depth: u8,
    max_depth: u8,
    vol: &SolidVolume,
) -> OctreeNode {
    // Quick rejects before any distance evaluation.
    if !vol.bbox().overlaps(&cube.bbox()) {
        return node;
    }
    if matches!(node, OctreeNode::Solid { inside: false }) {
        return node;
    }

    let diag = cube.diagonal();
    let d_center = vol.sdf(&cube.center);
    if d_center >= diag {
        // Bounding sphere clear of the volume.
        return node;
    }
    if d_center <= -diag {
        // Bounding sphere swallowed whole.
        return OctreeNode::Solid { inside: false };
    }

    if depth >= max_depth {
        return subtract_leaf(node, cube, diag, vol);
    }

    let children = match node {
        OctreeNode::Branch { children } => children,
        // Solid{true} or Boundary at an interior level: spread into 8
        // copies and let recursion resolve each octant. A boundary
        // node can only sit above max_depth transiently, right here.
        other => Box::new(std::array::from_fn(|_| other.clone())),
    };

    let mut new_children: [OctreeNode; 8] =
        std::array::from_fn(|_| OctreeNode::Solid { inside: false });
    for (idx, child) in (*children).into_iter().enumerate() {
        new_children[idx] = subtract_node(child, &cube.child(idx), depth + 1, max_depth, vol);
    }

    collapse_branch(new_children)
}

/// Update one max-depth leaf by combining corner distances.
fn subtract_leaf(node: OctreeNode, cube: &Cube, diag: f64, vol: &SolidVolume) -> OctreeNode {
    // An interior cell far from any earlier cut has no stored
    // distances; seed its corners at a depth of one cell diagonal,
    // deep enough that the combine below cannot flip them spuriously.
    let old = match node {
        OctreeNode::Boundary { corners } => corners,
        OctreeNode::Solid { inside: true } => [-diag; 8],
        other => return other,
    };

    let mut corners = [0.0; 8];
    let mut any_inside = false;
    let mut all_inside = true;
    for i in 0..8 {
        // Boolean difference: new distance is the max of the stock
        // distance and the negated volume distance.
        let d = old[i].max(-vol.sdf(&cube.corner(i)));
        corners[i] = d;
        if d < 0.0 {
            any_inside = true;
        } else {
            all_inside = false;
        }
    }

    if !any_inside {
        OctreeNode::Solid { inside: false }
    } else if all_inside {
        OctreeNode::Solid { inside: true }
    } else {
        OctreeNode::Boundary { corners }
    }
}

/// Merge a fully uniform set of children back into one solid leaf.
fn collapse_branch(children: [OctreeNode; 8]) -> OctreeNode {
    let uniform = match &children[0] {
        OctreeNode::Solid { inside } => {
            let inside = *inside;
            children
                .iter()
                .all(|c| matches!(c, OctreeNode::Solid { inside: i } if *i == inside))
                .then_some(inside)
        }
        _ => None,
    };
    match uniform {
        Some(inside) => OctreeNode::Solid { inside },
        None => OctreeNode::Branch {
            children: Box::new(children),
        },
    }
}

fn collect_triangles(node: &OctreeNode, cube: &Cube, out: &mut Vec<Triangle>) {
    match node {
        OctreeNode::Solid { .. } => {}
        OctreeNode::Boundary { corners } => {
            mc::cell_triangles(corners, &cube.corners(), out);
        }
        OctreeNode::Branch { children } => {
            for (idx, child) in children.iter().enumerate() {
                collect_triangles(child, &cube.child(idx), out);
            }
        }
    }
}
