/// Upper bound on grid resolution per axis
const MAX_CELLS_PER_AXIS: usize = 512;

/// Uniform grid over the square `[-extent, extent]²` used for short-range
/// neighbour queries. Cells are at least as wide as the query radius, so a
/// 3x3 block around a point covers every candidate.
pub struct SpatialGrid {
    extent: f32,
    inv_cell_size: f32,
    cols: usize,
    cells: Vec<Vec<u32>>,
}

impl SpatialGrid {
    pub fn new(extent: f32, radius: f32) -> Self {
        let width = 2.0 * extent;
        let cols = ((width / radius).floor() as usize).clamp(1, MAX_CELLS_PER_AXIS);
        let cell_size = width / cols as f32;
        let cells = (0..cols * cols).map(|_| Vec::new()).collect();
        Self {
            extent,
            inv_cell_size: 1.0 / cell_size,
            cols,
            cells,
        }
    }

    /// Build a grid holding every point of the two coordinate columns
    pub fn build(xs: &[f32], ys: &[f32], extent: f32, radius: f32) -> Self {
        let mut grid = Self::new(extent, radius);
        for (i, (&x, &y)) in xs.iter().zip(ys).enumerate() {
            grid.insert(x, y, i as u32);
        }
        grid
    }

    fn cell_coord(&self, v: f32) -> usize {
        let c = ((v + self.extent) * self.inv_cell_size).floor();
        (c.max(0.0) as usize).min(self.cols - 1)
    }

    pub fn insert(&mut self, x: f32, y: f32, index: u32) {
        let col = self.cell_coord(x);
        let row = self.cell_coord(y);
        self.cells[row * self.cols + col].push(index);
    }

    /// Indices stored in the 3x3 block of cells around (x, y)
    pub fn query(&self, x: f32, y: f32) -> impl Iterator<Item = u32> + '_ {
        let col = self.cell_coord(x) as i64;
        let row = self.cell_coord(y) as i64;
        let cols = self.cols as i64;

        (-1..=1i64)
            .flat_map(move |dy| (-1..=1i64).map(move |dx| (col + dx, row + dy)))
            .filter(move |&(c, r)| c >= 0 && c < cols && r >= 0 && r < cols)
            .flat_map(move |(c, r)| self.cells[(r * cols + c) as usize].iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_finds_close_points() {
        let xs = [0.0, 0.0005, 0.5, -0.9999];
        let ys = [0.0, 0.0, 0.5, -0.9999];
        let grid = SpatialGrid::build(&xs, &ys, 1.0, 0.001);

        let near: Vec<u32> = grid.query(0.0, 0.0).collect();
        assert!(near.contains(&0));
        assert!(near.contains(&1));
        assert!(!near.contains(&2));

        let corner: Vec<u32> = grid.query(-1.0, -1.0).collect();
        assert_eq!(corner, vec![3]);
    }

    #[test]
    fn test_resolution_is_capped() {
        let grid = SpatialGrid::new(1.0, 1e-6);
        assert_eq!(grid.cols, MAX_CELLS_PER_AXIS);
        let coarse = SpatialGrid::new(1.0, 5.0);
        assert_eq!(coarse.cols, 1);
    }

    #[test]
    fn test_out_of_domain_points_are_clamped() {
        let mut grid = SpatialGrid::new(1.0, 0.1);
        grid.insert(3.0, -3.0, 9);
        let found: Vec<u32> = grid.query(1.0, -1.0).collect();
        assert_eq!(found, vec![9]);
    }
}
