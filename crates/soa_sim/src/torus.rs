use serde::{Deserialize, Serialize};
use soa_core::Direction;

/// Row-major toroidal grid geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Torus {
    pub size_x: u32,
    pub size_y: u32,
}

impl Torus {
    pub fn new(size_x: u32, size_y: u32) -> Self {
        Self { size_x, size_y }
    }

    pub fn cell_count(&self) -> usize {
        self.size_x as usize * self.size_y as usize
    }

    /// `(x, y)` of a cell index
    pub fn coords(&self, cell: u32) -> (u32, u32) {
        (cell % self.size_x, cell / self.size_x)
    }

    /// Cell index of `(x, y)`; both must be in range
    pub fn cell(&self, x: u32, y: u32) -> u32 {
        y * self.size_x + x
    }

    /// Neighbouring cell, wrapping around both edges
    pub fn neighbor(&self, cell: u32, dir: Direction) -> u32 {
        let (x, y) = self.coords(cell);
        let (dx, dy) = dir.offset();
        let nx = (x as i64 + dx).rem_euclid(self.size_x as i64) as u32;
        let ny = (y as i64 + dy).rem_euclid(self.size_y as i64) as u32;
        self.cell(nx, ny)
    }
}
