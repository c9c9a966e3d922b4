//! Axis-aligned bounding boxes.

use serde::{Deserialize, Serialize};

use crate::Point3;

/// A 3D axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bbox {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl Bbox {
    /// Create a bounding box from explicit corners.
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// An empty box that any `expand_point` call will snap to.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Create the bounding box of a set of points.
    pub fn from_points(points: &[Point3]) -> Self {
        let mut bb = Self::empty();
        for p in points {
            bb.expand_point(p);
        }
        bb
    }

    /// Grow the box to contain `p`.
    pub fn expand_point(&mut self, p: &Point3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Grow the box to contain another box.
    pub fn expand(&mut self, other: &Bbox) {
        self.expand_point(&other.min);
        self.expand_point(&other.max);
    }

    /// True when the two boxes intersect (touching counts).
    pub fn overlaps(&self, other: &Bbox) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
            && self.min.z <= other.max.z
            && other.min.z <= self.max.z
    }

    /// True when the box contains `p` (boundary inclusive).
    pub fn contains_point(&self, p: &Point3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Center of the box.
    pub fn center(&self) -> Point3 {
        Point3::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
            (self.min.z + self.max.z) / 2.0,
        )
    }

    /// True when no point has been added yet.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x
    }
}
