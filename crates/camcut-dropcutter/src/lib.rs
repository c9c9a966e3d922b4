#![warn(missing_docs)]

//! Drop-cutter computation for the camcut CAM core.
//!
//! Drop-cutter determines the highest Z at which a cutting tool,
//! positioned over a given (X, Y), touches a triangulated surface
//! without gouging it. [`BatchDropCutter`] evaluates a whole sequence
//! of sample columns against a [`SurfaceModel`](camcut_geo::SurfaceModel),
//! optionally in parallel, producing one [`ClPoint`] per column.
//!
//! # Supported cutter shapes
//!
//! - **Ball**: spherical tip, contact via facet/edge/vertex sphere tests
//! - **Cylindrical**: flat bottom with a sharp corner at the full radius
//! - **Conical**: V-shaped tip opening at a half-angle from the axis

mod batch;
mod clpoint;
mod cutter;
mod grid;

pub use batch::{BatchDropCutter, BatchOutput};
pub use clpoint::{CcType, ClPoint};
pub use cutter::{Cutter, CutterShape};
pub use grid::grid_columns;

use thiserror::Error;

/// Errors from drop-cutter batch evaluation.
#[derive(Error, Debug)]
pub enum DropCutterError {
    /// The requested worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result type for drop-cutter operations.
pub type Result<T> = std::result::Result<T, DropCutterError>;
