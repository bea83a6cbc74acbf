use core::fmt;

/// A grid coordinate. `layer` separates stacked maze floors; planning moves within
/// a layer unless the [GridWorld](crate::grid_world::GridWorld) links two layers.
///
/// The derived ordering is lexical on `(col, row, layer)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cell {
    pub col: i32,
    pub row: i32,
    pub layer: i32,
}

impl Cell {
    pub const fn new(col: i32, row: i32, layer: i32) -> Cell {
        Cell { col, row, layer }
    }

    /// A cell on layer 0.
    pub const fn planar(col: i32, row: i32) -> Cell {
        Cell { col, row, layer: 0 }
    }

    /// The cell displaced by `(d_col, d_row)` on the same layer.
    pub fn offset(&self, d_col: i32, d_row: i32) -> Cell {
        Cell::new(self.col + d_col, self.row + d_row, self.layer)
    }

    pub fn manhattan_distance(&self, other: &Cell) -> i32 {
        (self.col - other.col).abs() + (self.row - other.row).abs()
    }

    pub fn chebyshev_distance(&self, other: &Cell) -> i32 {
        (self.col - other.col).abs().max((self.row - other.row).abs())
    }

    pub fn euclidean_distance(&self, other: &Cell) -> f32 {
        let d_col = (self.col - other.col) as f32;
        let d_row = (self.row - other.row) as f32;
        (d_col * d_col + d_row * d_row).sqrt()
    }
}

impl From<(i32, i32)> for Cell {
    fn from((col, row): (i32, i32)) -> Cell {
        Cell::planar(col, row)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {}, {})", self.col, self.row, self.layer)
    }
}
