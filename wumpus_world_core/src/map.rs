use crate::Position;

/// Represents errors that can occur within the grid operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("Coordinates ({x}, {y}) are out of bounds for grid size ({width}, {height})")]
    OutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
}

/// A fixed-size 2D layer of per-cell values.
///
/// Cells live in a flat vector in row-major order. Every object registry of
/// the world is one of these, so lookups by position are a single index.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    /// Creates a grid of the given dimensions with every cell set to `T::default()`.
    ///
    /// # Panics
    ///
    /// Panics if `width * height` overflows `usize`.
    pub fn new(width: usize, height: usize) -> Self
    where
        T: Default + Clone,
    {
        let size = width.checked_mul(height).expect("Grid size overflow");
        Grid {
            width,
            height,
            cells: vec![T::default(); size],
        }
    }

    /// Converts (x, y) coordinates to a flat vector index, `None` when out of bounds.
    #[inline]
    fn coords_to_index(&self, x: usize, y: usize) -> Option<usize> {
        if self.is_valid(x, y) {
            Some(y * self.width + x)
        } else {
            None
        }
    }

    /// Checks if the given coordinates are within the grid boundaries.
    #[inline]
    fn is_valid(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    /// Gets a reference to the cell at `position`, `None` when out of bounds.
    pub fn get(&self, position: Position) -> Option<&T> {
        let index = self.coords_to_index(position.x, position.y)?;
        self.cells.get(index)
    }

    /// Overwrites the cell at `position`.
    pub fn set(&mut self, position: Position, value: T) -> Result<(), GridError> {
        let index = self
            .coords_to_index(position.x, position.y)
            .ok_or(GridError::OutOfBounds {
                x: position.x,
                y: position.y,
                width: self.width,
                height: self.height,
            })?;
        self.cells[index] = value;
        Ok(())
    }

    /// Returns an iterator that yields `(Position, &T)` for each cell in row-major order.
    pub fn enumerate(&self) -> impl Iterator<Item = (Position, &T)> {
        let width = self.width;
        self.cells.iter().enumerate().map(move |(index, cell)| {
            let position = Position {
                x: index % width,
                y: index / width,
            };
            (position, cell)
        })
    }
}
