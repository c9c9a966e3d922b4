#![warn(missing_docs)]

//! Geometry primitives for the camcut CAM core.
//!
//! Provides the shared vocabulary of the workspace: points and vectors
//! (thin nalgebra aliases), axis-aligned bounding boxes, triangles with
//! derived facet data, and [`SurfaceModel`] — an indexed triangle soup
//! with bucketed 2D spatial queries used to prune drop-cutter contact
//! tests.

mod bbox;
mod surface;
mod triangle;

pub use bbox::Bbox;
pub use surface::SurfaceModel;
pub use triangle::Triangle;

use thiserror::Error;

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = nalgebra::Vector3<f64>;

/// Errors from geometry loading and validation.
#[derive(Error, Debug, Clone)]
pub enum GeoError {
    /// Mesh input is empty or contains degenerate geometry.
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),
}

/// Result type for geometry operations.
pub type Result<T> = std::result::Result<T, GeoError>;
