//! Mesh triangles with precomputed facet data.

use serde::{Deserialize, Serialize};

use crate::{Bbox, Point3, Vec3};

/// A triangle with derived unit normal and bounding box.
///
/// Immutable once constructed; owned by the [`SurfaceModel`](crate::SurfaceModel)
/// that contains it, or emitted by octree surface extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    /// Vertex positions.
    pub v: [Point3; 3],
    /// Unit facet normal.
    pub normal: Vec3,
    /// Axis-aligned bounding box of the vertices.
    pub bbox: Bbox,
}

impl Triangle {
    /// Create a triangle from three vertices.
    ///
    /// The normal falls back to +Z when the vertices are collinear; such
    /// triangles are rejected by `SurfaceModel::load`, not here.
    pub fn new(v0: Point3, v1: Point3, v2: Point3) -> Self {
        let n = (v1 - v0).cross(&(v2 - v0));
        let len = n.norm();
        let normal = if len > 1e-12 {
            n / len
        } else {
            Vec3::new(0.0, 0.0, 1.0)
        };
        let bbox = Bbox::from_points(&[v0, v1, v2]);
        Self {
            v: [v0, v1, v2],
            normal,
            bbox,
        }
    }

    /// Area of the triangle.
    pub fn area(&self) -> f64 {
        (self.v[1] - self.v[0])
            .cross(&(self.v[2] - self.v[0]))
            .norm()
            / 2.0
    }

    /// True when the triangle has (near) zero area.
    pub fn is_degenerate(&self) -> bool {
        self.area() < 1e-12
    }

    /// Z on the triangle's plane at `(x, y)`, or `None` when the facet is
    /// nearly vertical.
    pub fn z_at_xy(&self, x: f64, y: f64) -> Option<f64> {
        let nz = self.normal.z;
        if nz.abs() < 1e-10 {
            return None;
        }
        let d = self.normal.dot(&self.v[0].coords);
        Some((d - self.normal.x * x - self.normal.y * y) / nz)
    }

    /// True when `(x, y)` falls inside the triangle's XY projection.
    ///
    /// Uses barycentric coordinates with a small tolerance so points on
    /// edges are counted as inside.
    pub fn contains_xy(&self, x: f64, y: f64) -> bool {
        let v0 = &self.v[0];
        let v1 = &self.v[1];
        let v2 = &self.v[2];

        let d00 = (v1.x - v0.x) * (v1.x - v0.x) + (v1.y - v0.y) * (v1.y - v0.y);
        let d01 = (v1.x - v0.x) * (v2.x - v0.x) + (v1.y - v0.y) * (v2.y - v0.y);
        let d11 = (v2.x - v0.x) * (v2.x - v0.x) + (v2.y - v0.y) * (v2.y - v0.y);
        let d20 = (x - v0.x) * (v1.x - v0.x) + (y - v0.y) * (v1.y - v0.y);
        let d21 = (x - v0.x) * (v2.x - v0.x) + (y - v0.y) * (v2.y - v0.y);

        let denom = d00 * d11 - d01 * d01;
        if denom.abs() < 1e-10 {
            // Vertical or degenerate projection
            return false;
        }

        let v = (d11 * d20 - d01 * d21) / denom;
        let w = (d00 * d21 - d01 * d20) / denom;
        let u = 1.0 - v - w;

        let eps = -1e-8;
        u >= eps && v >= eps && w >= eps
    }

    /// The three edges as vertex pairs.
    pub fn edges(&self) -> [[Point3; 2]; 3] {
        [
            [self.v[0], self.v[1]],
            [self.v[1], self.v[2]],
            [self.v[2], self.v[0]],
        ]
    }

    /// Lowest vertex Z.
    pub fn min_z(&self) -> f64 {
        self.bbox.min.z
    }

    /// Highest vertex Z.
    pub fn max_z(&self) -> f64 {
        self.bbox.max.z
    }
}
