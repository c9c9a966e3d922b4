#![warn(missing_docs)]

//! Cutting simulation for the camcut CAM core.
//!
//! Represents stock material as an octree over a cubic domain. The
//! tree starts as a uniform solid block, is carved incrementally by
//! subtracting [`SolidVolume`]s (a cutter at rest or swept along a
//! segment), and can be converted to triangles at any point with a
//! marching-cubes pass over its boundary leaves.
//!
//! # Example
//!
//! ```
//! use camcut_cutsim::{Octree, SolidVolume};
//! use camcut_dropcutter::Cutter;
//! use camcut_geo::Point3;
//!
//! let mut tree = Octree::new(Point3::new(0.0, 0.0, 0.0), 10.0, 5);
//! tree.init(2);
//!
//! let tool = SolidVolume::tool(Cutter::ball(1.0, 20.0), Point3::new(0.0, 0.0, -1.0));
//! tree.subtract(&tool).unwrap();
//! let triangles = tree.extract_surface();
//! assert!(!triangles.is_empty());
//! ```

mod mc;
mod octree;
mod volume;

pub use octree::{Octree, OctreeNode};
pub use volume::SolidVolume;

use thiserror::Error;

/// Errors from cutting-simulation operations.
#[derive(Error, Debug, Clone)]
pub enum CutsimError {
    /// An operation requiring a seeded tree was invoked before `init`.
    #[error("octree not initialized: call init() before subtracting")]
    NotInitialized,
}

/// Result type for cutting-simulation operations.
pub type Result<T> = std::result::Result<T, CutsimError>;
