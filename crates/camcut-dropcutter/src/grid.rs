//! Sample-column grid generation.

/// Generate a rectangular grid of `(x, y)` sample columns, row-major
/// (Y outer, X inner). The grid starts at the min corner and never
/// steps past the max bounds.
///
/// Returns an empty vector when a step is non-positive or a range is
/// inverted.
pub fn grid_columns(
    min_x: f64,
    dx: f64,
    max_x: f64,
    min_y: f64,
    dy: f64,
    max_y: f64,
) -> Vec<(f64, f64)> {
    if dx <= 0.0 || dy <= 0.0 || max_x < min_x || max_y < min_y {
        return Vec::new();
    }

    let nx = ((max_x - min_x) / dx + 1e-9).floor() as usize + 1;
    let ny = ((max_y - min_y) / dy + 1e-9).floor() as usize + 1;

    let mut columns = Vec::with_capacity(nx * ny);
    for iy in 0..ny {
        let y = min_y + iy as f64 * dy;
        for ix in 0..nx {
            let x = min_x + ix as f64 * dx;
            columns.push((x, y));
        }
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_counts() {
        let cols = grid_columns(0.0, 1.0, 4.0, 0.0, 1.0, 2.0);
        assert_eq!(cols.len(), 5 * 3);
        assert_eq!(cols[0], (0.0, 0.0));
        assert_eq!(*cols.last().unwrap(), (4.0, 2.0));
    }

    #[test]
    fn test_grid_row_major() {
        let cols = grid_columns(0.0, 1.0, 1.0, 0.0, 1.0, 1.0);
        assert_eq!(cols, vec![(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)]);
    }

    #[test]
    fn test_bad_step_empty() {
        assert!(grid_columns(0.0, 0.0, 4.0, 0.0, 1.0, 2.0).is_empty());
        assert!(grid_columns(4.0, 1.0, 0.0, 0.0, 1.0, 2.0).is_empty());
    }
}
