//! Batch drop-cutter evaluation over many sample columns.

use camcut_geo::SurfaceModel;
use log::debug;
use rayon::prelude::*;

use crate::clpoint::ClPoint;
use crate::cutter::Cutter;
use crate::Result;

/// Result of a batch run: one CL point per input column, in input
/// order, plus the number of primitive cutter-triangle drop
/// evaluations performed (a performance diagnostic, not part of the
/// functional result).
#[derive(Debug, Clone)]
pub struct BatchOutput {
    /// Computed CL points, index-aligned with the input columns.
    pub points: Vec<ClPoint>,
    /// Number of `Cutter::drop` evaluations across all columns.
    pub dc_calls: u64,
}

/// Batch drop-cutter engine.
///
/// Columns are independent, so evaluation parallelizes over them; each
/// worker writes only its own output slot and the per-column call
/// counts are summed after collection, so results and diagnostics are
/// identical for any worker count.
#[derive(Debug, Clone)]
pub struct BatchDropCutter {
    cutter: Cutter,
    threads: Option<usize>,
}

impl BatchDropCutter {
    /// Create an engine for the given cutter, using the global rayon
    /// pool (platform concurrency) by default.
    pub fn new(cutter: Cutter) -> Self {
        Self {
            cutter,
            threads: None,
        }
    }

    /// Request a fixed worker count. `1` forces serial evaluation,
    /// which is convenient for debugging.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads.max(1));
        self
    }

    /// The configured cutter.
    pub fn cutter(&self) -> &Cutter {
        &self.cutter
    }

    /// Drop the cutter at every `(x, y)` column against `surface`.
    ///
    /// Output ordering matches input ordering regardless of execution
    /// order. Columns with no triangle under the footprint yield an
    /// undefined [`ClPoint`] (flagged, not an error); the batch never
    /// aborts on a degenerate contact candidate.
    pub fn run(&self, surface: &SurfaceModel, columns: &[(f64, f64)]) -> Result<BatchOutput> {
        debug!(
            "drop-cutter batch: {} columns, {} triangles",
            columns.len(),
            surface.len()
        );

        let eval = |&(x, y): &(f64, f64)| self.drop_column(surface, x, y);

        let results: Vec<(ClPoint, u64)> = match self.threads {
            Some(1) => columns.iter().map(eval).collect(),
            Some(n) => {
                let pool = rayon::ThreadPoolBuilder::new().num_threads(n).build()?;
                pool.install(|| columns.par_iter().map(eval).collect())
            }
            None => columns.par_iter().map(eval).collect(),
        };

        let mut points = Vec::with_capacity(results.len());
        let mut dc_calls = 0u64;
        for (cl, calls) in results {
            points.push(cl);
            dc_calls += calls;
        }

        debug!("drop-cutter batch done: {dc_calls} drop calls");
        Ok(BatchOutput { points, dc_calls })
    }

    /// Evaluate a single column: query the spatial index, then drop the
    /// cutter against each candidate triangle, keeping the highest
    /// contact.
    fn drop_column(&self, surface: &SurfaceModel, x: f64, y: f64) -> (ClPoint, u64) {
        let mut cl = ClPoint::new(x, y);
        let mut calls = 0u64;

        for idx in surface.query_circle(x, y, self.cutter.radius()) {
            let tri = surface.triangle(idx);
            if !self.cutter.overlaps(tri, x, y) {
                continue;
            }
            calls += 1;
            if let Some((z, cc)) = self.cutter.drop(tri, x, y) {
                cl.lift(z, cc);
            }
        }

        (cl, calls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clpoint::CcType;
    use approx::assert_relative_eq;
    use camcut_geo::{Point3, Triangle};

    fn flat_square_surface() -> SurfaceModel {
        // Two triangles forming a flat 20x20 square at z=0.
        let a = Point3::new(-10.0, -10.0, 0.0);
        let b = Point3::new(10.0, -10.0, 0.0);
        let c = Point3::new(10.0, 10.0, 0.0);
        let d = Point3::new(-10.0, 10.0, 0.0);
        SurfaceModel::load(
            vec![Triangle::new(a, b, c), Triangle::new(a, c, d)],
            5.0,
        )
        .unwrap()
    }

    #[test]
    fn test_flat_contact_scenario() {
        // Ball cutter radius 1.0 above a flat surface at z=0: CL height
        // is exactly 0.0.
        let surface = flat_square_surface();
        let bdc = BatchDropCutter::new(Cutter::ball(1.0, 20.0));
        let out = bdc.run(&surface, &[(0.0, 0.0)]).unwrap();
        assert_eq!(out.points.len(), 1);
        assert_relative_eq!(out.points[0].z, 0.0, epsilon = 1e-9);
        assert!(out.points[0].is_defined());
    }

    #[test]
    fn test_output_length_matches_input() {
        let surface = flat_square_surface();
        let columns: Vec<(f64, f64)> = (0..37).map(|i| (i as f64 * 0.37 - 7.0, 1.0)).collect();
        let bdc = BatchDropCutter::new(Cutter::ball(0.5, 10.0));
        let out = bdc.run(&surface, &columns).unwrap();
        assert_eq!(out.points.len(), columns.len());
        for (cl, &(x, y)) in out.points.iter().zip(&columns) {
            assert_eq!((cl.x, cl.y), (x, y));
        }
    }

    #[test]
    fn test_serial_parallel_identical() {
        let surface = flat_square_surface();
        let columns: Vec<(f64, f64)> = (0..200)
            .map(|i| {
                let x = (i % 20) as f64 - 9.5;
                let y = (i / 20) as f64 - 4.5;
                (x, y)
            })
            .collect();
        let cutter = Cutter::ball(1.3, 20.0);

        let serial = BatchDropCutter::new(cutter).with_threads(1);
        let parallel = BatchDropCutter::new(cutter).with_threads(4);
        let a = serial.run(&surface, &columns).unwrap();
        let b = parallel.run(&surface, &columns).unwrap();

        assert_eq!(a.points, b.points);
        assert_eq!(a.dc_calls, b.dc_calls);
    }

    #[test]
    fn test_undefined_column_flagged() {
        let surface = flat_square_surface();
        let bdc = BatchDropCutter::new(Cutter::ball(1.0, 20.0));
        let out = bdc.run(&surface, &[(100.0, 100.0), (0.0, 0.0)]).unwrap();
        assert_eq!(out.points[0].cc, CcType::None);
        assert!(!out.points[0].is_defined());
        assert!(out.points[1].is_defined());
    }

    #[test]
    fn test_dc_calls_counted() {
        let surface = flat_square_surface();
        let bdc = BatchDropCutter::new(Cutter::ball(1.0, 20.0));
        let out = bdc.run(&surface, &[(0.0, 0.0)]).unwrap();
        assert!(out.dc_calls >= 1);
        let far = bdc.run(&surface, &[(100.0, 100.0)]).unwrap();
        assert_eq!(far.dc_calls, 0);
    }
}
