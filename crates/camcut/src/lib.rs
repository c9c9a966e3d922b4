#![warn(missing_docs)]

//! camcut — CAM toolpath core
//!
//! Two cooperating engines: a batch drop-cutter that computes the
//! highest non-gouging tool position over a triangulated surface for
//! many sample columns at once, and an octree cutting simulation that
//! carves tool-shaped volumes out of a stock block and triangulates
//! the machined surface.
//!
//! # Example
//!
//! ```
//! use camcut::{
//!     BatchDropCutter, Cutter, Octree, Point3, SolidVolume, SurfaceModel, Triangle,
//! };
//!
//! // A small sloped facet as the part surface.
//! let surface = SurfaceModel::load(
//!     vec![Triangle::new(
//!         Point3::new(-5.0, -5.0, 0.0),
//!         Point3::new(5.0, -5.0, 0.0),
//!         Point3::new(0.0, 5.0, 2.0),
//!     )],
//!     2.0,
//! )
//! .unwrap();
//!
//! // Drop a ball cutter along a scanline.
//! let columns = camcut::grid_columns(-4.0, 1.0, 4.0, 0.0, 1.0, 0.0);
//! let bdc = BatchDropCutter::new(Cutter::ball(1.0, 20.0));
//! let out = bdc.run(&surface, &columns).unwrap();
//!
//! // Replay the CL points against a stock block.
//! let mut stock = Octree::new(Point3::new(0.0, 0.0, 0.0), 8.0, 5);
//! stock.init(3);
//! for cl in out.points.iter().filter(|cl| cl.is_defined()) {
//!     let vol = SolidVolume::tool(*bdc.cutter(), cl.position());
//!     stock.subtract(&vol).unwrap();
//! }
//! let machined = stock.extract_surface();
//! assert!(!machined.is_empty());
//! ```

pub use camcut_cutsim::{CutsimError, Octree, OctreeNode, SolidVolume};
pub use camcut_dropcutter::{
    grid_columns, BatchDropCutter, BatchOutput, CcType, ClPoint, Cutter, CutterShape,
    DropCutterError,
};
pub use camcut_geo::{Bbox, GeoError, Point3, SurfaceModel, Triangle, Vec3};

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// A pyramid over a square base, apex at the origin top.
    fn pyramid_surface() -> SurfaceModel {
        let apex = Point3::new(0.0, 0.0, 3.0);
        let base = [
            Point3::new(-4.0, -4.0, 0.0),
            Point3::new(4.0, -4.0, 0.0),
            Point3::new(4.0, 4.0, 0.0),
            Point3::new(-4.0, 4.0, 0.0),
        ];
        let mut tris = Vec::new();
        for i in 0..4 {
            tris.push(Triangle::new(base[i], base[(i + 1) % 4], apex));
        }
        SurfaceModel::load(tris, 2.0).unwrap()
    }

    #[test]
    fn test_scan_then_carve_pipeline() {
        // Scan the part with a ball cutter, then replay the CL points
        // as swept subtractions against a stock block.
        let surface = pyramid_surface();
        let cutter = Cutter::ball(0.8, 10.0);
        let columns = grid_columns(-3.0, 0.5, 3.0, -3.0, 0.5, 3.0);

        let out = BatchDropCutter::new(cutter).run(&surface, &columns).unwrap();
        assert_eq!(out.points.len(), columns.len());
        assert!(out.dc_calls > 0);

        // Every column sits over the model, so every CL point is
        // defined, and none dips below the base plane.
        for cl in &out.points {
            assert!(cl.is_defined());
            assert!(cl.z >= -1e-9);
        }
        // Directly over the apex the cutter rides highest.
        let top = out
            .points
            .iter()
            .cloned()
            .reduce(|a, b| if b.z > a.z { b } else { a })
            .unwrap();
        assert_relative_eq!(top.x, 0.0, epsilon = 0.26);
        assert_relative_eq!(top.y, 0.0, epsilon = 0.26);

        let mut stock = Octree::new(Point3::new(0.0, 0.0, 4.0), 6.0, 5);
        stock.init(3);
        assert!(stock.extract_surface().is_empty());

        let defined: Vec<&ClPoint> = out.points.iter().filter(|cl| cl.is_defined()).collect();
        for pair in defined.windows(2) {
            let vol = SolidVolume::swept(cutter, pair[0].position(), pair[1].position());
            stock.subtract(&vol).unwrap();
        }

        let machined = stock.extract_surface();
        assert!(!machined.is_empty());

        // The machined surface stays inside the stock domain.
        for tri in &machined {
            for v in &tri.v {
                assert!(v.x.abs() <= 6.0 + 1e-9);
                assert!(v.y.abs() <= 6.0 + 1e-9);
                assert!(v.z >= -2.0 - 1e-9 && v.z <= 10.0 + 1e-9);
            }
        }
    }

    #[test]
    fn test_repeated_pass_leaves_stock_unchanged() {
        let cutter = Cutter::cylindrical(0.6, 8.0);
        let mut stock = Octree::new(Point3::new(0.0, 0.0, 0.0), 4.0, 4);
        stock.init(2);

        let path = [
            Point3::new(-2.0, 0.0, 0.5),
            Point3::new(2.0, 0.0, 0.5),
            Point3::new(2.0, 1.0, 0.5),
        ];
        for pair in path.windows(2) {
            let vol = SolidVolume::swept(cutter, pair[0], pair[1]);
            stock.subtract(&vol).unwrap();
        }
        let first = stock.clone();

        for pair in path.windows(2) {
            let vol = SolidVolume::swept(cutter, pair[0], pair[1]);
            stock.subtract(&vol).unwrap();
        }
        assert_eq!(stock, first);
    }
}
