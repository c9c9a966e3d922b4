//! Cutter shapes and per-triangle drop computation.
//!
//! All heights use the tool *tip* as the reference point: the CL z is
//! the height of the tip when the cutter rests on the surface. Each
//! shape exposes its lower-surface height profile above the tip, and a
//! `drop` combining vertex, facet and edge contact candidates.

use camcut_geo::{Point3, Triangle};
use serde::{Deserialize, Serialize};

use crate::clpoint::{CcType, ClPoint};

/// Analytic cutter shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CutterShape {
    /// Ball end mill: spherical tip of the given radius.
    Ball {
        /// Sphere radius.
        radius: f64,
    },
    /// Cylindrical (flat) end mill.
    Cylindrical {
        /// Tool radius.
        radius: f64,
    },
    /// Conical cutter (V-bit): flank opens at `half_angle` from the axis.
    Conical {
        /// Radius at the top of the conical section.
        radius: f64,
        /// Half-angle between flank and tool axis, radians, in (0, pi/2).
        half_angle: f64,
    },
}

/// A cutter: shape plus shank clearance length above the tip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cutter {
    /// The cutting geometry.
    pub shape: CutterShape,
    /// Shank clearance above the tip.
    pub length: f64,
}

impl Cutter {
    /// Ball end mill.
    pub fn ball(radius: f64, length: f64) -> Self {
        Self {
            shape: CutterShape::Ball { radius },
            length,
        }
    }

    /// Cylindrical end mill.
    pub fn cylindrical(radius: f64, length: f64) -> Self {
        Self {
            shape: CutterShape::Cylindrical { radius },
            length,
        }
    }

    /// Conical cutter with the given half-angle from the axis.
    pub fn conical(radius: f64, half_angle: f64, length: f64) -> Self {
        Self {
            shape: CutterShape::Conical { radius, half_angle },
            length,
        }
    }

    /// Footprint radius.
    pub fn radius(&self) -> f64 {
        match self.shape {
            CutterShape::Ball { radius }
            | CutterShape::Cylindrical { radius }
            | CutterShape::Conical { radius, .. } => radius,
        }
    }

    /// Height of the cutter's lower surface above the tip at horizontal
    /// offset `d` from the axis, or `None` outside the footprint.
    pub fn profile(&self, d: f64) -> Option<f64> {
        let r = self.radius();
        if d > r + 1e-12 {
            return None;
        }
        match self.shape {
            CutterShape::Ball { radius } => {
                let d = d.min(radius);
                Some(radius - (radius * radius - d * d).sqrt())
            }
            CutterShape::Cylindrical { .. } => Some(0.0),
            CutterShape::Conical { half_angle, .. } => {
                let tan = half_angle.tan();
                if tan <= 1e-12 {
                    // Degenerate needle; only the axis touches
                    return (d < 1e-12).then_some(0.0);
                }
                Some(d / tan)
            }
        }
    }

    /// Quick footprint-vs-triangle overlap test in XY.
    ///
    /// Conservative: compares the footprint disc against the triangle's
    /// 2D bounding box, so false positives are possible.
    pub fn overlaps(&self, tri: &Triangle, x: f64, y: f64) -> bool {
        let r = self.radius();
        let cx = x.clamp(tri.bbox.min.x, tri.bbox.max.x);
        let cy = y.clamp(tri.bbox.min.y, tri.bbox.max.y);
        let dx = x - cx;
        let dy = y - cy;
        dx * dx + dy * dy <= r * r
    }

    /// Maximal non-gouging tip height against one triangle, with the
    /// contact classification, or `None` when the footprint misses the
    /// triangle entirely or every candidate is singular.
    pub fn drop(&self, tri: &Triangle, x: f64, y: f64) -> Option<(f64, CcType)> {
        if !self.overlaps(tri, x, y) {
            return None;
        }

        let r = self.radius();
        let mut cl = ClPoint::new(x, y);

        for v in &tri.v {
            let dx = x - v.x;
            let dy = y - v.y;
            let d2 = dx * dx + dy * dy;
            if d2 <= r * r {
                if let Some(h) = self.profile(d2.sqrt()) {
                    cl.lift(v.z - h, CcType::Vertex);
                }
            }
        }

        if let Some(z) = self.facet_drop(tri, x, y) {
            cl.lift(z, CcType::Facet);
        }

        for [a, b] in tri.edges() {
            if let Some(z) = self.edge_drop(&a, &b, x, y) {
                cl.lift(z, CcType::Edge);
            }
        }

        cl.is_defined().then_some((cl.z, cl.cc))
    }

    /// Facet (plane) contact: offset the plane by the cutter profile and
    /// intersect with the tool axis. The contact point must project
    /// inside the triangle.
    fn facet_drop(&self, tri: &Triangle, x: f64, y: f64) -> Option<f64> {
        // Orient the normal upward; skip near-vertical facets (the edge
        // and vertex candidates cover those).
        let mut n = tri.normal;
        if n.z < 0.0 {
            n = -n;
        }
        if n.z < 1e-9 {
            return None;
        }

        let r = self.radius();
        let xyn = (n.x * n.x + n.y * n.y).sqrt();

        let (cc_x, cc_y, lift) = match self.shape {
            CutterShape::Ball { radius } => {
                // Contact point sits radius*n below/beside the sphere
                // center; tip = sphere bottom.
                (x - radius * n.x, y - radius * n.y, radius * n.z - radius)
            }
            CutterShape::Cylindrical { .. } => {
                if xyn < 1e-12 {
                    (x, y, 0.0)
                } else {
                    // Rim corner in the downhill direction touches first.
                    (x - r * n.x / xyn, y - r * n.y / xyn, 0.0)
                }
            }
            CutterShape::Conical { half_angle, .. } => {
                let k = 1.0 / half_angle.tan(); // flank rise per radius
                let plane_slope = xyn / n.z;
                if plane_slope <= k {
                    // Shallow plane: the tip itself touches.
                    (x, y, 0.0)
                } else {
                    // Steep plane: the flank touches at the full radius.
                    (x - r * n.x / xyn, y - r * n.y / xyn, -k * r)
                }
            }
        };

        if !tri.contains_xy(cc_x, cc_y) {
            return None;
        }
        let z_cc = tri.z_at_xy(cc_x, cc_y)?;
        Some(z_cc + lift)
    }

    /// Edge contact: clip the edge to the footprint disc, then maximize
    /// the touch height `z(t) - profile(d(t))` over the clipped span.
    ///
    /// The maximum lies at a clip boundary or at a stationary point; the
    /// stationary points are roots of a quadratic obtained by squaring
    /// the derivative condition, so all real roots in range are simply
    /// evaluated alongside the boundaries.
    fn edge_drop(&self, a: &Point3, b: &Point3, x: f64, y: f64) -> Option<f64> {
        let r = self.radius();
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let ez = b.z - a.z;
        let ax = a.x - x;
        let ay = a.y - y;

        // Squared horizontal distance from the axis to the edge point at
        // parameter t: q(t) = qa*t^2 + qb*t + qc.
        let qa = dx * dx + dy * dy;
        let qb = 2.0 * (ax * dx + ay * dy);
        let qc = ax * ax + ay * ay;

        if qa < 1e-12 {
            // Edge projects to a point in XY.
            if qc > r * r {
                return None;
            }
            let h = self.profile(qc.sqrt())?;
            return Some(a.z.max(b.z) - h);
        }

        // Clip the parameter range to the footprint disc.
        let disc = qb * qb - 4.0 * qa * (qc - r * r);
        if disc <= 0.0 {
            return None;
        }
        let s = disc.sqrt();
        let lo = ((-qb - s) / (2.0 * qa)).max(0.0);
        let hi = ((-qb + s) / (2.0 * qa)).min(1.0);
        if lo > hi {
            return None;
        }

        let q_at = |t: f64| (qa * t + qb) * t + qc;
        let touch = |t: f64| -> Option<f64> {
            let d2 = q_at(t).clamp(0.0, r * r);
            Some(a.z + t * ez - self.profile(d2.sqrt())?)
        };

        let mut best: Option<f64> = None;
        let mut consider = |t: f64| {
            if (lo..=hi).contains(&t) {
                if let Some(z) = touch(t) {
                    best = Some(best.map_or(z, |b: f64| b.max(z)));
                }
            }
        };

        consider(lo);
        consider(hi);

        match self.shape {
            CutterShape::Cylindrical { .. } => {
                // profile == 0: touch height is linear in t, boundary
                // candidates already cover the maximum.
            }
            CutterShape::Ball { radius } => {
                // d/dt [z(t) + sqrt(r^2 - q(t))] = 0, squared:
                let r2 = radius * radius;
                let c2 = 4.0 * qa * (qa + ez * ez);
                let c1 = 4.0 * qb * (qa + ez * ez);
                let c0 = qb * qb + 4.0 * ez * ez * (qc - r2);
                for t in solve_quadratic(c2, c1, c0) {
                    consider(t);
                }
            }
            CutterShape::Conical { half_angle, .. } => {
                // d/dt [z(t) - k*sqrt(q(t))] = 0, squared:
                let k2 = {
                    let tan = half_angle.tan();
                    if tan <= 1e-12 {
                        return best;
                    }
                    1.0 / (tan * tan)
                };
                let c2 = 4.0 * qa * (k2 * qa - ez * ez);
                let c1 = 4.0 * qb * (k2 * qa - ez * ez);
                let c0 = k2 * qb * qb - 4.0 * ez * ez * qc;
                for t in solve_quadratic(c2, c1, c0) {
                    consider(t);
                }
            }
        }

        best
    }
}

/// Real roots of `c2*t^2 + c1*t + c0 = 0` (0, 1 or 2 of them).
fn solve_quadratic(c2: f64, c1: f64, c0: f64) -> impl Iterator<Item = f64> {
    let mut roots = [f64::NAN; 2];
    let mut n = 0;
    if c2.abs() < 1e-14 {
        if c1.abs() > 1e-14 {
            roots[0] = -c0 / c1;
            n = 1;
        }
    } else {
        let disc = c1 * c1 - 4.0 * c2 * c0;
        if disc >= 0.0 {
            let s = disc.sqrt();
            roots[0] = (-c1 - s) / (2.0 * c2);
            roots[1] = (-c1 + s) / (2.0 * c2);
            n = 2;
        }
    }
    roots.into_iter().take(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn flat_tri() -> Triangle {
        Triangle::new(
            Point3::new(-10.0, -10.0, 0.0),
            Point3::new(10.0, -10.0, 0.0),
            Point3::new(0.0, 10.0, 0.0),
        )
    }

    #[test]
    fn test_ball_flat_facet_contact() {
        // Tip convention: resting on a flat surface the tip is at the
        // surface height, independent of radius.
        let cutter = Cutter::ball(1.0, 20.0);
        let (z, cc) = cutter.drop(&flat_tri(), 0.0, 0.0).unwrap();
        assert_relative_eq!(z, 0.0, epsilon = 1e-9);
        assert_eq!(cc, CcType::Facet);
    }

    #[test]
    fn test_cylindrical_flat_contact() {
        let cutter = Cutter::cylindrical(2.0, 20.0);
        let (z, _) = cutter.drop(&flat_tri(), 0.0, 0.0).unwrap();
        assert_relative_eq!(z, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_conical_flat_contact() {
        let cutter = Cutter::conical(2.0, std::f64::consts::FRAC_PI_4, 20.0);
        let (z, _) = cutter.drop(&flat_tri(), 0.0, 0.0).unwrap();
        assert_relative_eq!(z, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_ball_vertex_contact() {
        // Single vertex under the cutter edge region.
        let tri = Triangle::new(
            Point3::new(0.0, 0.0, 5.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        );
        let cutter = Cutter::ball(2.0, 20.0);
        // Column offset 1.0 horizontally from the apex vertex.
        let (z, _) = cutter.drop(&tri, -1.0, 0.0).unwrap();
        // Vertex candidate: 5 + sqrt(4 - 1) - 2
        let expected = 5.0 + 3.0_f64.sqrt() - 2.0;
        assert_relative_eq!(z, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_ball_vertex_monotonic_in_radius() {
        let tri = Triangle::new(
            Point3::new(0.0, 0.0, 5.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        );
        let mut last = f64::NEG_INFINITY;
        for r in [1.5, 2.0, 3.0, 5.0] {
            let cutter = Cutter::ball(r, 20.0);
            let (z, _) = cutter.drop(&tri, -1.0, 0.0).unwrap();
            assert!(z >= last, "radius {r} lowered the vertex contact");
            last = z;
        }
    }

    #[test]
    fn test_drop_above_lowest_vertex() {
        // The result can never be below the lowest vertex inside the
        // footprint (that would gouge).
        let tri = Triangle::new(
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(2.0, 0.0, 3.0),
            Point3::new(0.0, 2.0, 2.0),
        );
        let cutter = Cutter::ball(5.0, 20.0);
        let (z, _) = cutter.drop(&tri, 0.5, 0.5).unwrap();
        assert!(z >= 1.0 - 1e-9);
    }

    #[test]
    fn test_no_overlap_returns_none() {
        let cutter = Cutter::ball(1.0, 20.0);
        assert!(cutter.drop(&flat_tri(), 100.0, 100.0).is_none());
    }

    #[test]
    fn test_vertical_triangle_no_nan() {
        let tri = Triangle::new(
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 4.0),
        );
        let cutter = Cutter::ball(1.5, 20.0);
        // Facet candidate is skipped (vertical); edges and vertices
        // still produce a finite height.
        if let Some((z, _)) = cutter.drop(&tri, 0.0, 0.0) {
            assert!(z.is_finite());
        }
    }

    #[test]
    fn test_ball_sloped_facet() {
        // 45-degree plane z = y. Sphere center offset from contact:
        // for the column over y=0 the cc point is uphill; check the
        // result is above the plane height under the tip.
        let tri = Triangle::new(
            Point3::new(-10.0, -10.0, -10.0),
            Point3::new(10.0, -10.0, -10.0),
            Point3::new(0.0, 10.0, 10.0),
        );
        let cutter = Cutter::ball(1.0, 20.0);
        let (z, _) = cutter.drop(&tri, 0.0, 0.0).unwrap();
        // Plane under the tip is z=0; a ball on a 45-degree slope rests
        // higher: z = r*(sqrt(2) - 1) for this configuration.
        assert!(z > 0.0);
        assert_relative_eq!(z, 2.0_f64.sqrt() - 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_cylindrical_edge_takes_highest_point() {
        // Rising edge through the footprint: the flat bottom must rest
        // on the highest covered point, not the nearest one.
        let a = Point3::new(-2.0, 0.5, 0.0);
        let b = Point3::new(2.0, 0.5, 4.0);
        let tri = Triangle::new(a, b, Point3::new(0.0, 5.0, 0.0));
        let cutter = Cutter::cylindrical(1.0, 20.0);
        let (z, _) = cutter.drop(&tri, 0.0, 0.0).unwrap();
        // Edge x span inside the footprint disc around (0,0) with the
        // edge at y=0.5: half-chord sqrt(1 - 0.25); edge z = x + 2.
        let x_max = (1.0_f64 - 0.25).sqrt();
        assert_relative_eq!(z, x_max + 2.0, epsilon = 1e-9);
    }
}
