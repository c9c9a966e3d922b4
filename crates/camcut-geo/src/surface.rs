//! Indexed triangle surface with bucketed 2D spatial queries.

use std::collections::HashMap;

use crate::{GeoError, Point3, Result, Triangle};

/// A triangle mesh with a bucketed XY grid index.
///
/// Drop-cutter queries work column-by-column in the XY plane, so the
/// index is two-dimensional: each grid cell stores the indices of every
/// triangle whose XY bounding box touches it. Queries return a superset
/// of the true overlaps — false positives are fine, false negatives are
/// not, since a missed triangle would let the cutter gouge.
#[derive(Debug, Clone)]
pub struct SurfaceModel {
    triangles: Vec<Triangle>,
    cell_size: f64,
    bounds: [f64; 4], // [min_x, min_y, max_x, max_y]
    grid_nx: usize,
    grid_ny: usize,
    cells: HashMap<(usize, usize), Vec<usize>>,
}

impl SurfaceModel {
    /// Build a surface model from owned triangles.
    ///
    /// Fails with [`GeoError::InvalidMesh`] on empty input or any
    /// zero-area triangle; nothing is partially loaded on failure.
    pub fn load(triangles: Vec<Triangle>, cell_size: f64) -> Result<Self> {
        if triangles.is_empty() {
            return Err(GeoError::InvalidMesh("mesh is empty".into()));
        }
        if !(cell_size > 0.0) {
            return Err(GeoError::InvalidMesh(format!(
                "bucket cell size must be positive, got {cell_size}"
            )));
        }
        for (i, t) in triangles.iter().enumerate() {
            if t.is_degenerate() {
                return Err(GeoError::InvalidMesh(format!(
                    "triangle {i} has zero area"
                )));
            }
            for v in &t.v {
                if !(v.x.is_finite() && v.y.is_finite() && v.z.is_finite()) {
                    return Err(GeoError::InvalidMesh(format!(
                        "triangle {i} has a non-finite vertex"
                    )));
                }
            }
        }

        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for t in &triangles {
            min_x = min_x.min(t.bbox.min.x);
            min_y = min_y.min(t.bbox.min.y);
            max_x = max_x.max(t.bbox.max.x);
            max_y = max_y.max(t.bbox.max.y);
        }

        // Pad so boundary triangles land strictly inside the grid.
        let padding = cell_size * 0.1;
        min_x -= padding;
        min_y -= padding;
        max_x += padding;
        max_y += padding;
        let bounds = [min_x, min_y, max_x, max_y];

        let grid_nx = ((max_x - min_x) / cell_size).ceil() as usize + 1;
        let grid_ny = ((max_y - min_y) / cell_size).ceil() as usize + 1;

        let mut cells: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
        for (tri_idx, tri) in triangles.iter().enumerate() {
            let x0 = ((tri.bbox.min.x - min_x) / cell_size).floor() as usize;
            let y0 = ((tri.bbox.min.y - min_y) / cell_size).floor() as usize;
            let x1 = ((tri.bbox.max.x - min_x) / cell_size).floor() as usize;
            let y1 = ((tri.bbox.max.y - min_y) / cell_size).floor() as usize;

            for iy in y0..=y1.min(grid_ny - 1) {
                for ix in x0..=x1.min(grid_nx - 1) {
                    cells.entry((ix, iy)).or_default().push(tri_idx);
                }
            }
        }

        Ok(Self {
            triangles,
            cell_size,
            bounds,
            grid_nx,
            grid_ny,
            cells,
        })
    }

    /// Build from an indexed vertex/triangle list.
    pub fn from_vertices(vertices: &[[f64; 3]], indices: &[u32], cell_size: f64) -> Result<Self> {
        let mut triangles = Vec::with_capacity(indices.len() / 3);
        for chunk in indices.chunks(3) {
            if chunk.len() == 3 {
                let v = |i: u32| -> Result<Point3> {
                    let p = vertices.get(i as usize).ok_or_else(|| {
                        GeoError::InvalidMesh(format!("vertex index {i} out of range"))
                    })?;
                    Ok(Point3::new(p[0], p[1], p[2]))
                };
                triangles.push(Triangle::new(v(chunk[0])?, v(chunk[1])?, v(chunk[2])?));
            }
        }
        Self::load(triangles, cell_size)
    }

    /// Build from a flat triangle soup, nine floats per triangle.
    pub fn from_triangle_soup(soup: &[[f64; 9]], cell_size: f64) -> Result<Self> {
        let triangles = soup
            .iter()
            .map(|t| {
                Triangle::new(
                    Point3::new(t[0], t[1], t[2]),
                    Point3::new(t[3], t[4], t[5]),
                    Point3::new(t[6], t[7], t[8]),
                )
            })
            .collect();
        Self::load(triangles, cell_size)
    }

    /// Indices of all triangles whose XY bbox may intersect the disc of
    /// `radius` around `(x, y)`, sorted ascending without duplicates.
    pub fn query_circle(&self, x: f64, y: f64, radius: f64) -> Vec<usize> {
        let mut result = Vec::new();

        let x0 = ((x - radius - self.bounds[0]) / self.cell_size).floor() as isize;
        let y0 = ((y - radius - self.bounds[1]) / self.cell_size).floor() as isize;
        let x1 = ((x + radius - self.bounds[0]) / self.cell_size).floor() as isize;
        let y1 = ((y + radius - self.bounds[1]) / self.cell_size).floor() as isize;

        for iy in y0.max(0)..=y1.min(self.grid_ny as isize - 1) {
            for ix in x0.max(0)..=x1.min(self.grid_nx as isize - 1) {
                if let Some(indices) = self.cells.get(&(ix as usize, iy as usize)) {
                    result.extend_from_slice(indices);
                }
            }
        }

        result.sort_unstable();
        result.dedup();
        result
    }

    /// Triangle by index.
    pub fn triangle(&self, idx: usize) -> &Triangle {
        &self.triangles[idx]
    }

    /// All triangles, in load order.
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Number of triangles.
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    /// True when the model holds no triangles (never true after `load`).
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// XY bounds of the indexed region `[min_x, min_y, max_x, max_y]`.
    pub fn bounds(&self) -> [f64; 4] {
        self.bounds
    }

    /// Z extent of the mesh.
    pub fn z_bounds(&self) -> (f64, f64) {
        let mut min_z = f64::INFINITY;
        let mut max_z = f64::NEG_INFINITY;
        for tri in &self.triangles {
            min_z = min_z.min(tri.min_z());
            max_z = max_z.max(tri.max_z());
        }
        (min_z, max_z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_triangle() -> Triangle {
        Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(5.0, 10.0, 0.0),
        )
    }

    #[test]
    fn test_load_empty_fails() {
        let err = SurfaceModel::load(Vec::new(), 1.0).unwrap_err();
        assert!(matches!(err, GeoError::InvalidMesh(_)));
    }

    #[test]
    fn test_load_degenerate_fails() {
        let bad = Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(2.0, 2.0, 0.0),
        );
        let err = SurfaceModel::load(vec![flat_triangle(), bad], 1.0).unwrap_err();
        assert!(matches!(err, GeoError::InvalidMesh(_)));
    }

    #[test]
    fn test_query_finds_triangle() {
        let s = SurfaceModel::load(vec![flat_triangle()], 5.0).unwrap();
        let hits = s.query_circle(5.0, 5.0, 1.0);
        assert_eq!(hits, vec![0]);
    }

    #[test]
    fn test_query_far_away_empty() {
        let s = SurfaceModel::load(vec![flat_triangle()], 5.0).unwrap();
        assert!(s.query_circle(100.0, 100.0, 1.0).is_empty());
    }

    #[test]
    fn test_query_superset_across_cells() {
        // A triangle spanning many cells must be found from every cell
        // its bbox touches.
        let big = Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(40.0, 0.0, 0.0),
            Point3::new(20.0, 40.0, 3.0),
        );
        let s = SurfaceModel::load(vec![big], 2.0).unwrap();
        for &(x, y) in &[(1.0, 1.0), (20.0, 20.0), (39.0, 1.0), (20.0, 39.0)] {
            assert_eq!(s.query_circle(x, y, 0.5), vec![0], "missed at ({x},{y})");
        }
    }

    #[test]
    fn test_query_wide_radius_dedups() {
        let second = Triangle::new(
            Point3::new(0.0, 12.0, 1.0),
            Point3::new(10.0, 12.0, 1.0),
            Point3::new(5.0, 20.0, 1.0),
        );
        let s = SurfaceModel::load(vec![flat_triangle(), second], 2.0).unwrap();
        // Both triangles span many cells; each index appears once.
        assert_eq!(s.query_circle(5.0, 10.0, 30.0), vec![0, 1]);
    }

    #[test]
    fn test_from_vertices() {
        let vertices = [[0.0, 0.0, 0.0], [10.0, 0.0, 0.0], [5.0, 10.0, 2.0]];
        let indices = [0u32, 1, 2];
        let s = SurfaceModel::from_vertices(&vertices, &indices, 5.0).unwrap();
        assert_eq!(s.len(), 1);
        let (zmin, zmax) = s.z_bounds();
        assert_eq!(zmin, 0.0);
        assert_eq!(zmax, 2.0);
    }

    #[test]
    fn test_from_vertices_bad_index() {
        let vertices = [[0.0, 0.0, 0.0]];
        let indices = [0u32, 1, 2];
        assert!(SurfaceModel::from_vertices(&vertices, &indices, 5.0).is_err());
    }
}
