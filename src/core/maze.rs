use core::fmt;

use crate::error::MazeError;
use crate::geometry::{Direction, DirectionSet, MazeCell, MazeSize};

const ALL_WALLS: u8 = 0x0F;

/// Wall topology of a rectangular maze.
///
/// Each cell stores one bit per direction (`Direction::bit()`); both cells
/// bordering an edge carry the bit, and every mutation updates both sides so
/// an edge is always observed identically from either cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MazeWallStore {
    size: MazeSize,
    cells: Vec<u8>,
}

impl MazeWallStore {
    /// Open maze: only the boundary and the start cell's East wall.
    pub fn new(size: MazeSize) -> Self {
        let mut maze = Self {
            size,
            cells: vec![0; size.cell_count()],
        };
        maze.clear_maze();
        maze
    }

    pub fn with_dimensions(width: u32, height: u32) -> Result<Self, MazeError> {
        Ok(Self::new(MazeSize::new(width, height)?))
    }

    /// Every edge walled. Starting point for carving.
    pub fn walled(size: MazeSize) -> Self {
        Self {
            size,
            cells: vec![ALL_WALLS; size.cell_count()],
        }
    }

    pub fn size(&self) -> MazeSize {
        self.size
    }

    /// Reset to the freshly constructed state.
    pub fn clear_maze(&mut self) {
        let (w, h) = (self.size.width(), self.size.height());
        for (cell, bits) in self.size.cells().zip(self.cells.iter_mut()) {
            let mut b = 0;
            if cell.y() == 1 {
                b |= Direction::North.bit();
            }
            if cell.y() == h {
                b |= Direction::South.bit();
            }
            if cell.x() == 1 {
                b |= Direction::West.bit();
            }
            if cell.x() == w {
                b |= Direction::East.bit();
            }
            *bits = b;
        }
        self.set_wall(self.size.start_cell(), Direction::East);
    }

    /// Walls around `cell`; out-of-range cells are fully walled.
    pub fn walls(&self, cell: MazeCell) -> DirectionSet {
        match self.size.index_of(cell) {
            Some(i) => DirectionSet::from_bits(self.cells[i]),
            None => DirectionSet::ALL,
        }
    }

    pub fn has_wall(&self, cell: MazeCell, dir: Direction) -> bool {
        if dir == Direction::Directionless {
            return true;
        }
        self.walls(cell).contains(dir)
    }

    pub fn set_wall(&mut self, cell: MazeCell, dir: Direction) {
        let Some(i) = self.size.index_of(cell) else {
            return;
        };
        self.cells[i] |= dir.bit();
        if let Some(n) = self.size.neighbor(cell, dir) {
            if let Some(j) = self.size.index_of(n) {
                self.cells[j] |= dir.opposite().bit();
            }
        }
    }

    /// Boundary edges and the start cell's guaranteed wall stay put.
    pub fn clear_wall(&mut self, cell: MazeCell, dir: Direction) {
        if !self.is_clearable(cell, dir) {
            return;
        }
        let Some(n) = self.size.neighbor(cell, dir) else {
            return;
        };
        if let (Some(i), Some(j)) = (self.size.index_of(cell), self.size.index_of(n)) {
            self.cells[i] &= !dir.bit();
            self.cells[j] &= !dir.opposite().bit();
        }
    }

    /// Whether `clear_wall(cell, dir)` would have any effect on the topology.
    pub fn is_clearable(&self, cell: MazeCell, dir: Direction) -> bool {
        let Some(n) = self.size.neighbor(cell, dir) else {
            return false;
        };
        let start = self.size.start_cell();
        let start_wall = (cell == start && dir == Direction::East)
            || (n == start && dir == Direction::West);
        !start_wall
    }

    /// Open edges between the center block and its surroundings.
    pub fn center_openings(&self) -> Vec<(MazeCell, Direction)> {
        self.size
            .center_outer_edges()
            .into_iter()
            .filter(|(c, d)| !self.has_wall(*c, *d))
            .collect()
    }

    /// Competition legality:
    /// - the start cell is walled on the East and open to the North;
    /// - exactly one opening leads into the center block;
    /// - the peg in the middle of the center block touches no wall;
    /// - every other interior peg touches at least one wall.
    pub fn is_legal(&self) -> bool {
        let start = self.size.start_cell();
        if !self.has_wall(start, Direction::East) || self.has_wall(start, Direction::North) {
            return false;
        }
        if self.center_openings().len() != 1 {
            return false;
        }

        let (cx, cy) = (self.size.width() / 2, self.size.height() / 2);
        for y in 1..self.size.height() {
            for x in 1..self.size.width() {
                let touches = self.peg_walls(x, y) > 0;
                let is_center_peg = x == cx && y == cy;
                if touches == is_center_peg {
                    return false;
                }
            }
        }
        true
    }

    /// Walls meeting at the peg in the south-east corner of cell `(x, y)`.
    fn peg_walls(&self, x: u32, y: u32) -> u32 {
        let nw = MazeCell::at(x, y);
        let se = MazeCell::at(x + 1, y + 1);
        [
            self.has_wall(nw, Direction::South),
            self.has_wall(nw, Direction::East),
            self.has_wall(se, Direction::North),
            self.has_wall(se, Direction::West),
        ]
        .into_iter()
        .filter(|w| *w)
        .count() as u32
    }

    /// Would the pegs at both ends of this edge still touch a wall without it?
    pub(crate) fn pegs_keep_walls_without(&self, cell: MazeCell, dir: Direction) -> bool {
        // Pegs are addressed by the cell on their north-west; translate the two
        // endpoints of the edge into that form.
        let (x, y) = (cell.x(), cell.y());
        let ends: [(u32, u32); 2] = match dir {
            Direction::North => [(x - 1, y - 1), (x, y - 1)],
            Direction::South => [(x - 1, y), (x, y)],
            Direction::West => [(x - 1, y - 1), (x - 1, y)],
            Direction::East => [(x, y - 1), (x, y)],
            Direction::Directionless => return false,
        };
        ends.into_iter().all(|(px, py)| {
            let on_boundary = px == 0
                || py == 0
                || px >= self.size.width()
                || py >= self.size.height();
            on_boundary || self.peg_walls(px, py) >= 2
        })
    }
}

impl fmt::Display for MazeWallStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (w, h) = (self.size.width(), self.size.height());
        for y in 1..=h {
            for x in 1..=w {
                let wall = self.has_wall(MazeCell::at(x, y), Direction::North);
                f.write_str(if wall { "+---" } else { "+   " })?;
            }
            f.write_str("+\n")?;
            for x in 1..=w {
                let cell = MazeCell::at(x, y);
                let wall = self.has_wall(cell, Direction::West);
                let mark = if self.size.is_start(cell) {
                    " S "
                } else if self.size.is_center(cell) {
                    " G "
                } else {
                    "   "
                };
                f.write_str(if wall { "|" } else { " " })?;
                f.write_str(mark)?;
            }
            f.write_str("|\n")?;
        }
        for _ in 1..=w {
            f.write_str("+---")?;
        }
        f.write_str("+\n")
    }
}
