use core::ops::{Index, IndexMut};

use crate::geometry::{MazeCell, MazeSize};

/// Flat per-cell storage addressed by `MazeCell`.
///
/// `get`/`get_mut`/`set` are bounds-checked and never panic. The `Index`
/// impls are for cells already known to be in range (agents only index with
/// the robot's location or with neighbors returned by `MazeSize::neighbor`)
/// and panic otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid<T> {
    size: MazeSize,
    cells: Vec<T>,
}

impl<T: Clone> Grid<T> {
    pub fn new(size: MazeSize, fill: T) -> Self {
        Self {
            size,
            cells: vec![fill; size.cell_count()],
        }
    }

    pub fn fill(&mut self, value: T) {
        self.cells.fill(value);
    }
}

impl<T> Grid<T> {
    pub fn size(&self) -> MazeSize {
        self.size
    }

    pub fn get(&self, cell: MazeCell) -> Option<&T> {
        self.size.index_of(cell).map(|i| &self.cells[i])
    }

    pub fn get_mut(&mut self, cell: MazeCell) -> Option<&mut T> {
        self.size.index_of(cell).map(move |i| &mut self.cells[i])
    }

    /// Returns false (and stores nothing) for out-of-range cells.
    pub fn set(&mut self, cell: MazeCell, value: T) -> bool {
        match self.get_mut(cell) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Cells with their values, row-major.
    pub fn iter(&self) -> impl Iterator<Item = (MazeCell, &T)> {
        self.size.cells().zip(self.cells.iter())
    }

    pub fn values(&self) -> &[T] {
        &self.cells
    }
}

impl<T> Index<MazeCell> for Grid<T> {
    type Output = T;

    fn index(&self, cell: MazeCell) -> &T {
        match self.size.index_of(cell) {
            Some(i) => &self.cells[i],
            None => panic!("cell {cell} outside {} grid", self.size),
        }
    }
}

impl<T> IndexMut<MazeCell> for Grid<T> {
    fn index_mut(&mut self, cell: MazeCell) -> &mut T {
        match self.size.index_of(cell) {
            Some(i) => &mut self.cells[i],
            None => panic!("cell {cell} outside {} grid", self.size),
        }
    }
}
