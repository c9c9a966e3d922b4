//! Cutter-location points.

use camcut_geo::Point3;
use serde::{Deserialize, Serialize};

/// Classification of the cutter-surface contact that produced a CL height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CcType {
    /// No triangle under the column; the height is undefined.
    #[default]
    None,
    /// The cutter rests on a mesh vertex.
    Vertex,
    /// The cutter rests on a mesh edge.
    Edge,
    /// The cutter rests on a triangle facet.
    Facet,
}

/// A cutter-location point: the computed non-gouging tip height at a
/// sample column, plus the contact classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClPoint {
    /// Column X coordinate.
    pub x: f64,
    /// Column Y coordinate.
    pub y: f64,
    /// Cutter tip height; `f64::NEG_INFINITY` when undefined.
    pub z: f64,
    /// Contact classification for `z`.
    pub cc: CcType,
}

impl ClPoint {
    /// A fresh, still-undefined CL point at a column.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            z: f64::NEG_INFINITY,
            cc: CcType::None,
        }
    }

    /// True once some contact has defined the height.
    pub fn is_defined(&self) -> bool {
        self.cc != CcType::None
    }

    /// The CL position as a point (undefined heights stay `-inf`).
    pub fn position(&self) -> Point3 {
        Point3::new(self.x, self.y, self.z)
    }

    /// Raise the height if `z` improves on it, recording the contact type.
    pub fn lift(&mut self, z: f64, cc: CcType) {
        if z > self.z {
            self.z = z;
            self.cc = cc;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_undefined() {
        let cl = ClPoint::new(1.0, 2.0);
        assert!(!cl.is_defined());
        assert_eq!(cl.z, f64::NEG_INFINITY);
    }

    #[test]
    fn test_lift_keeps_highest() {
        let mut cl = ClPoint::new(0.0, 0.0);
        cl.lift(1.0, CcType::Facet);
        cl.lift(0.5, CcType::Vertex);
        assert_eq!(cl.z, 1.0);
        assert_eq!(cl.cc, CcType::Facet);
        cl.lift(2.0, CcType::Edge);
        assert_eq!(cl.cc, CcType::Edge);
    }
}
