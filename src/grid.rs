use std::collections::HashSet;

/// Sparse per-target record of settled snow.
///
/// Column-major: one set of occupied rows per column. Only cells that received
/// a settle are present, absence means free. Columns outside `0..width` are
/// never occupied and ignore marks.
#[derive(Debug, Clone, Default)]
pub struct OccupancyGrid {
    columns: Vec<HashSet<i32>>,
}

/// Truncate a float coordinate to a cell index (toward zero, never rounded).
#[inline]
pub fn cell(coord: f32) -> i32 {
    coord as i32
}

impl OccupancyGrid {
    pub fn new(width: usize) -> Self {
        Self {
            columns: vec![HashSet::new(); width],
        }
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_occupied(&self, col: i32, row: i32) -> bool {
        self.column(col).is_some_and(|rows| rows.contains(&row))
    }

    /// Mark a cell occupied. Returns false when the column is out of range.
    pub fn mark_occupied(&mut self, col: i32, row: i32) -> bool {
        if col < 0 {
            return false;
        }
        match self.columns.get_mut(col as usize) {
            Some(rows) => {
                rows.insert(row);
                true
            }
            None => false,
        }
    }

    /// Total number of occupied cells
    pub fn occupied_count(&self) -> usize {
        self.columns.iter().map(HashSet::len).sum()
    }

    fn column(&self, col: i32) -> Option<&HashSet<i32>> {
        if col < 0 {
            None
        } else {
            self.columns.get(col as usize)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_grid_is_empty() {
        let grid = OccupancyGrid::new(8);
        assert_eq!(grid.width(), 8);
        assert_eq!(grid.occupied_count(), 0);
        for col in 0..8 {
            for row in 0..8 {
                assert!(!grid.is_occupied(col, row));
            }
        }
    }

    #[test]
    fn test_mark_and_query() {
        let mut grid = OccupancyGrid::new(4);
        assert!(grid.mark_occupied(2, 7));
        assert!(grid.is_occupied(2, 7));
        assert!(!grid.is_occupied(2, 6));
        assert!(!grid.is_occupied(3, 7));
        // Rows are unbounded; only columns are range checked
        assert!(grid.mark_occupied(1, 40));
        assert!(grid.is_occupied(1, 40));
        assert_eq!(grid.occupied_count(), 2);
    }

    #[test]
    fn test_out_of_range_columns() {
        let mut grid = OccupancyGrid::new(3);
        assert!(!grid.mark_occupied(3, 0));
        assert!(!grid.mark_occupied(-1, 0));
        assert!(!grid.is_occupied(3, 0));
        assert!(!grid.is_occupied(-1, 0));
        assert_eq!(grid.occupied_count(), 0);
    }

    #[test]
    fn test_marking_twice_is_idempotent() {
        let mut grid = OccupancyGrid::new(2);
        grid.mark_occupied(0, 5);
        grid.mark_occupied(0, 5);
        assert_eq!(grid.occupied_count(), 1);
    }

    #[test]
    fn test_cell_truncates() {
        assert_eq!(cell(3.99), 3);
        assert_eq!(cell(3.0), 3);
        assert_eq!(cell(0.5), 0);
        assert_eq!(cell(-0.5), 0);
        assert_eq!(cell(-1.5), -1);
    }
}
