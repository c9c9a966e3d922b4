//! Tool-shaped subtraction volumes.
//!
//! A [`SolidVolume`] is the region of space occupied by a cutter held
//! at one position, or swept along a straight segment. Volumes expose a
//! signed distance (negative inside, positive outside, zero on the
//! boundary) which the octree samples at cell corners; the distance is
//! exact near the boundary and may be conservative far from it, which
//! is all the conservative cell classification needs.
//!
//! Positions refer to the tool tip, matching the CL points produced by
//! the drop-cutter.

use camcut_dropcutter::{Cutter, CutterShape};
use camcut_geo::{Bbox, Point3, Vec3};
use serde::{Deserialize, Serialize};

/// A volume of space swept out by a cutter, used as the subtrahend of
/// an octree material-removal step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SolidVolume {
    /// A cutter at rest with its tip at `pos`.
    Tool {
        /// Tool geometry.
        cutter: Cutter,
        /// Tool tip position.
        pos: Point3,
    },
    /// A cutter swept along the segment from `start` to `end` (tip
    /// positions).
    Swept {
        /// Tool geometry.
        cutter: Cutter,
        /// Tip position at the start of the move.
        start: Point3,
        /// Tip position at the end of the move.
        end: Point3,
    },
}

impl SolidVolume {
    /// A static cutter with its tip at `pos`.
    pub fn tool(cutter: Cutter, pos: Point3) -> Self {
        Self::Tool { cutter, pos }
    }

    /// A cutter swept from tip position `start` to tip position `end`.
    pub fn swept(cutter: Cutter, start: Point3, end: Point3) -> Self {
        Self::Swept { cutter, start, end }
    }

    /// Signed distance from `p` to the volume boundary, negative
    /// inside.
    pub fn sdf(&self, p: &Point3) -> f64 {
        match self {
            Self::Tool { cutter, pos } => cutter_sdf(cutter, pos, p),
            Self::Swept { cutter, start, end } => swept_sdf(cutter, start, end, p),
        }
    }

    /// Whether `p` lies strictly inside the volume.
    pub fn contains(&self, p: &Point3) -> bool {
        self.sdf(p) < 0.0
    }

    /// Conservative axis-aligned bounds of the volume, used by the
    /// octree to skip untouched subtrees.
    pub fn bbox(&self) -> Bbox {
        match self {
            Self::Tool { cutter, pos } => cutter_bbox(cutter, pos),
            Self::Swept { cutter, start, end } => {
                let mut b = cutter_bbox(cutter, start);
                b.expand(&cutter_bbox(cutter, end));
                b
            }
        }
    }
}

/// Signed distance to a cutter with its tip at `pos`.
///
/// The shank above the cutting portion is included so that plunging
/// the tool through tall stock removes material along its full length.
fn cutter_sdf(cutter: &Cutter, pos: &Point3, p: &Point3) -> f64 {
    match cutter.shape {
        CutterShape::Ball { radius } => {
            let center = Point3::new(pos.x, pos.y, pos.z + radius);
            let ball = (p - center).norm() - radius;
            if cutter.length > radius {
                ball.min(capped_cylinder_sdf(p, pos, radius, radius, cutter.length))
            } else {
                ball
            }
        }
        CutterShape::Cylindrical { radius } => {
            capped_cylinder_sdf(p, pos, radius, 0.0, cutter.length)
        }
        CutterShape::Conical { radius, half_angle } => {
            cone_sdf(p, pos, radius, half_angle, cutter.length)
        }
    }
}

/// Signed distance to a cutter swept along a tip segment.
///
/// A swept ball head is exactly a capsule around the segment of ball
/// centers; other shapes use the nearest static placement along the
/// segment, which is exact for axis-aligned and horizontal moves and
/// conservative within the footprint otherwise.
fn swept_sdf(cutter: &Cutter, start: &Point3, end: &Point3, p: &Point3) -> f64 {
    let d = match cutter.shape {
        CutterShape::Ball { radius } => {
            let up = Vec3::new(0.0, 0.0, radius);
            capsule_sdf(p, &(start + up), &(end + up), radius)
        }
        _ => {
            let t = closest_segment_t(p, start, end);
            let pos = start + (end - start) * t;
            cutter_sdf(cutter, &pos, p)
        }
    };
    // Shanks at both endpoints cover the tool body above the head.
    d.min(cutter_sdf(cutter, start, p))
        .min(cutter_sdf(cutter, end, p))
}

/// Signed distance to a finite vertical cylinder with axis through
/// `pos` and caps at `pos.z + z_lo` and `pos.z + z_hi`.
fn capped_cylinder_sdf(p: &Point3, pos: &Point3, radius: f64, z_lo: f64, z_hi: f64) -> f64 {
    let dx = p.x - pos.x;
    let dy = p.y - pos.y;
    let dr = (dx * dx + dy * dy).sqrt() - radius;
    let dz = (pos.z + z_lo - p.z).max(p.z - (pos.z + z_hi));
    let outside = (dr.max(0.0).powi(2) + dz.max(0.0).powi(2)).sqrt();
    outside + dr.max(dz).min(0.0)
}

/// Signed distance to a capsule around segment `a`..`b` with radius
/// `r`.
fn capsule_sdf(p: &Point3, a: &Point3, b: &Point3, r: f64) -> f64 {
    let t = closest_segment_t(p, a, b);
    let closest = a + (b - a) * t;
    (p - closest).norm() - r
}

/// Signed distance to a conical cutter: tip at `pos`, flank opening at
/// `half_angle` from the axis up to the shaft `radius`, cylindrical
/// shank above, cap at `pos.z + length`.
fn cone_sdf(p: &Point3, pos: &Point3, radius: f64, half_angle: f64, length: f64) -> f64 {
    let h = p.z - pos.z;
    let radial = ((p.x - pos.x).powi(2) + (p.y - pos.y).powi(2)).sqrt();
    let (sin, cos) = half_angle.sin_cos();
    let tan = half_angle.tan();

    if h < 0.0 {
        // Below the tip plane the apex is nearest only inside its
        // normal cone; elsewhere the flank above is closer. The value
        // must never exceed the true distance, or a cell the flank
        // reaches would be classified as untouched.
        return if radial * tan + h <= 0.0 {
            (radial * radial + h * h).sqrt()
        } else {
            radial * cos - h * sin
        };
    }

    let flank_h = if tan > 1e-12 { radius / tan } else { 0.0 };
    let lateral = if h < flank_h {
        (radial - h * tan) * cos
    } else {
        radial - radius
    };
    lateral.max(h - length)
}

/// Parameter of the point on segment `a`..`b` closest to `p`, clamped
/// to `[0, 1]`.
fn closest_segment_t(p: &Point3, a: &Point3, b: &Point3) -> f64 {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 < 1e-12 {
        return 0.0;
    }
    ((p - a).dot(&ab) / len2).clamp(0.0, 1.0)
}

/// Conservative bounds of a static cutter: footprint disc by the
/// largest radius, tip to top of shank vertically.
fn cutter_bbox(cutter: &Cutter, pos: &Point3) -> Bbox {
    let r = cutter.radius();
    let top = match cutter.shape {
        CutterShape::Ball { radius } => cutter.length.max(2.0 * radius),
        _ => cutter.length,
    };
    Bbox::new(
        Point3::new(pos.x - r, pos.y - r, pos.z),
        Point3::new(pos.x + r, pos.y + r, pos.z + top),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ball_tool_sdf() {
        let vol = SolidVolume::tool(Cutter::ball(1.0, 20.0), Point3::new(0.0, 0.0, 0.0));
        // Ball center is one radius above the tip.
        assert_relative_eq!(vol.sdf(&Point3::new(0.0, 0.0, 1.0)), -1.0, epsilon = 1e-12);
        // Tip sits on the boundary.
        assert_relative_eq!(vol.sdf(&Point3::new(0.0, 0.0, 0.0)), 0.0, epsilon = 1e-12);
        assert!(vol.sdf(&Point3::new(3.0, 0.0, 1.0)) > 0.0);
        // The shank extends to the full tool length.
        assert!(vol.contains(&Point3::new(0.0, 0.0, 15.0)));
        assert!(!vol.contains(&Point3::new(0.0, 0.0, 25.0)));
    }

    #[test]
    fn test_cylindrical_tool_sdf() {
        let vol = SolidVolume::tool(Cutter::cylindrical(2.0, 10.0), Point3::new(1.0, 0.0, 0.0));
        assert!(vol.contains(&Point3::new(1.0, 0.0, 5.0)));
        assert_relative_eq!(vol.sdf(&Point3::new(4.0, 0.0, 5.0)), 1.0, epsilon = 1e-12);
        // Below the flat bottom.
        assert_relative_eq!(vol.sdf(&Point3::new(1.0, 0.0, -2.0)), 2.0, epsilon = 1e-12);
        assert!(!vol.contains(&Point3::new(1.0, 0.0, 11.0)));
    }

    #[test]
    fn test_conical_tool_sdf() {
        let half_angle = std::f64::consts::FRAC_PI_4;
        let vol = SolidVolume::tool(
            Cutter::conical(1.0, half_angle, 10.0),
            Point3::new(0.0, 0.0, 0.0),
        );
        // On the axis above the tip: inside.
        assert!(vol.contains(&Point3::new(0.0, 0.0, 0.5)));
        // At 45 degrees the flank passes through (0.5, 0, 0.5).
        assert_relative_eq!(
            vol.sdf(&Point3::new(0.5, 0.0, 0.5)),
            0.0,
            epsilon = 1e-12
        );
        // Wide of the flank: outside.
        assert!(vol.sdf(&Point3::new(2.0, 0.0, 0.5)) > 0.0);
        // Shank region above the cone.
        assert!(vol.contains(&Point3::new(0.5, 0.0, 5.0)));
        assert!(!vol.contains(&Point3::new(1.5, 0.0, 5.0)));
    }

    #[test]
    fn test_conical_sdf_below_tip_not_overestimated() {
        let vol = SolidVolume::tool(
            Cutter::conical(8.0, std::f64::consts::FRAC_PI_4, 30.0),
            Point3::new(0.0, 0.0, 0.0),
        );
        // Radially far below the tip: the nearest surface point is on
        // the flank at (7.4, 0, 7.4), not the tip.
        let p = Point3::new(15.2, 0.0, -0.4);
        assert_relative_eq!(vol.sdf(&p), 7.8 * 2.0_f64.sqrt(), epsilon = 1e-9);
        assert!(vol.sdf(&p) < (p - Point3::new(0.0, 0.0, 0.0)).norm());
        // Directly under the tip the tip itself is nearest.
        assert_relative_eq!(vol.sdf(&Point3::new(0.0, 0.0, -2.0)), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_swept_ball_is_capsule() {
        let vol = SolidVolume::swept(
            Cutter::ball(1.0, 20.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
        );
        // Midway along the sweep, at ball-center height.
        assert_relative_eq!(vol.sdf(&Point3::new(2.0, 0.0, 1.0)), -1.0, epsilon = 1e-12);
        // Bottom of the swept flute.
        assert_relative_eq!(vol.sdf(&Point3::new(2.0, 0.0, 0.0)), 0.0, epsilon = 1e-12);
        assert!(vol.sdf(&Point3::new(2.0, 0.0, -0.5)) > 0.0);
    }

    #[test]
    fn test_swept_covers_endpoints() {
        let cutter = Cutter::cylindrical(1.0, 10.0);
        let a = Point3::new(-3.0, 0.0, 0.0);
        let b = Point3::new(3.0, 1.0, -1.0);
        let vol = SolidVolume::swept(cutter, a, b);
        let start_only = SolidVolume::tool(cutter, a);
        let end_only = SolidVolume::tool(cutter, b);
        for p in [
            Point3::new(-3.0, 0.0, 2.0),
            Point3::new(3.0, 1.0, 0.5),
            Point3::new(0.0, 0.5, 1.0),
        ] {
            assert!(vol.sdf(&p) <= start_only.sdf(&p) + 1e-12);
            assert!(vol.sdf(&p) <= end_only.sdf(&p) + 1e-12);
        }
    }

    #[test]
    fn test_bbox_bounds_volume() {
        let vol = SolidVolume::swept(
            Cutter::ball(1.5, 20.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(5.0, 2.0, 1.0),
        );
        let b = vol.bbox();
        for p in [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(5.0, 2.0, 1.0),
            Point3::new(2.5, 1.0, 1.5),
            Point3::new(5.0, 2.0, 21.0),
        ] {
            assert!(vol.sdf(&p) > 0.0 || b.contains_point(&p));
        }
    }
}
