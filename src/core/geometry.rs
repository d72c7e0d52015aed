use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::MazeError;

/// Absolute orientation on the maze grid.
///
/// North points toward `y - 1` (row 1 is the top row), East toward `x + 1`.
/// The index doubles as the bit position used by the wall encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    #[default]
    North,
    East,
    South,
    West,
    Directionless,
}

impl Direction {
    /// The four real directions in index order.
    pub const CARDINALS: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    pub fn index(self) -> Option<u8> {
        match self {
            Direction::North => Some(0),
            Direction::East => Some(1),
            Direction::South => Some(2),
            Direction::West => Some(3),
            Direction::Directionless => None,
        }
    }

    /// Wall/direction bit for this direction (0 for `Directionless`).
    #[inline]
    pub fn bit(self) -> u8 {
        self.index().map_or(0, |i| 1 << i)
    }

    pub fn left(self) -> Self {
        match self {
            Direction::North => Direction::West,
            Direction::East => Direction::North,
            Direction::South => Direction::East,
            Direction::West => Direction::South,
            Direction::Directionless => Direction::Directionless,
        }
    }

    pub fn right(self) -> Self {
        match self {
            Direction::North => Direction::East,
            Direction::East => Direction::South,
            Direction::South => Direction::West,
            Direction::West => Direction::North,
            Direction::Directionless => Direction::Directionless,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
            Direction::Directionless => Direction::Directionless,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::East => "east",
            Direction::South => "south",
            Direction::West => "west",
            Direction::Directionless => "none",
        }
    }

    /// Single-character tag, used by text renderings.
    pub fn arrow(self) -> char {
        match self {
            Direction::North => '^',
            Direction::East => '>',
            Direction::South => 'v',
            Direction::West => '<',
            Direction::Directionless => '.',
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Compact set of directions, one bit per `Direction::bit()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DirectionSet(u8);

impl DirectionSet {
    pub const EMPTY: DirectionSet = DirectionSet(0);
    pub const ALL: DirectionSet = DirectionSet(0x0F);

    pub fn from_bits(bits: u8) -> Self {
        Self(bits & Self::ALL.0)
    }

    pub fn only(dir: Direction) -> Self {
        Self(dir.bit())
    }

    #[inline]
    pub fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn contains(self, dir: Direction) -> bool {
        let bit = dir.bit();
        bit != 0 && self.0 & bit != 0
    }

    /// True when `dir` is the one and only member.
    pub fn is_only(self, dir: Direction) -> bool {
        dir.bit() != 0 && self.0 == dir.bit()
    }

    pub fn insert(&mut self, dir: Direction) {
        self.0 |= dir.bit();
    }

    pub fn remove(&mut self, dir: Direction) {
        self.0 &= !dir.bit();
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> u32 {
        self.0.count_ones()
    }

    pub fn iter(self) -> impl Iterator<Item = Direction> {
        Direction::CARDINALS
            .into_iter()
            .filter(move |d| self.contains(*d))
    }
}

/// One grid square. 1-based, `(1, 1)` is the upper-left cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MazeCell {
    // Field order gives row-major ordering (top to bottom, left to right).
    y: u32,
    x: u32,
}

impl MazeCell {
    pub fn new(x: u32, y: u32) -> Result<Self, MazeError> {
        if x == 0 || y == 0 {
            return Err(MazeError::IllegalGeometry { x, y });
        }
        Ok(Self { x, y })
    }

    /// Caller guarantees both coordinates are at least 1.
    pub(crate) const fn at(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn x(self) -> u32 {
        self.x
    }

    #[inline]
    pub fn y(self) -> u32 {
        self.y
    }

    /// Adjacent cell in `dir`, without any upper bound check.
    ///
    /// Returns `None` when the step would leave the 1-based quadrant or when
    /// `dir` is `Directionless`.
    pub fn step(self, dir: Direction) -> Option<MazeCell> {
        match dir {
            Direction::North if self.y > 1 => Some(Self::at(self.x, self.y - 1)),
            Direction::South => Some(Self::at(self.x, self.y + 1)),
            Direction::East => Some(Self::at(self.x + 1, self.y)),
            Direction::West if self.x > 1 => Some(Self::at(self.x - 1, self.y)),
            _ => None,
        }
    }

    /// Direction from `self` to an orthogonally adjacent `other`.
    pub fn direction_to(self, other: MazeCell) -> Direction {
        if other.x == self.x && other.y + 1 == self.y {
            Direction::North
        } else if other.x == self.x && other.y == self.y + 1 {
            Direction::South
        } else if other.y == self.y && other.x == self.x + 1 {
            Direction::East
        } else if other.y == self.y && other.x + 1 == self.x {
            Direction::West
        } else {
            Direction::Directionless
        }
    }
}

impl fmt::Display for MazeCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Maze dimensions plus the fixed locations derived from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MazeSize {
    width: u32,
    height: u32,
}

impl MazeSize {
    pub const MIN_SIDE: u32 = 2;
    pub const MAX_SIDE: u32 = 64;

    /// The classic competition maze.
    pub const CLASSIC: MazeSize = MazeSize {
        width: 16,
        height: 16,
    };

    pub fn new(width: u32, height: u32) -> Result<Self, MazeError> {
        let ok = |v: u32| (Self::MIN_SIDE..=Self::MAX_SIDE).contains(&v);
        if !ok(width) || !ok(height) {
            return Err(MazeError::IllegalDimensions {
                width,
                height,
                min: Self::MIN_SIDE,
                max: Self::MAX_SIDE,
            });
        }
        Ok(Self { width, height })
    }

    #[inline]
    pub fn width(self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(self) -> u32 {
        self.height
    }

    pub fn cell_count(self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    pub fn contains(self, cell: MazeCell) -> bool {
        cell.x <= self.width && cell.y <= self.height
    }

    /// In-range neighbor of `cell` in `dir`.
    pub fn neighbor(self, cell: MazeCell, dir: Direction) -> Option<MazeCell> {
        cell.step(dir).filter(|c| self.contains(*c))
    }

    /// Lower-left corner; the robot starts here facing North.
    pub fn start_cell(self) -> MazeCell {
        MazeCell::at(1, self.height)
    }

    pub fn is_start(self, cell: MazeCell) -> bool {
        cell == self.start_cell()
    }

    /// The 2x2 block in the middle of the maze.
    ///
    /// The start cell is excluded when the block would contain it, which only
    /// happens for two-row mazes.
    pub fn center_cells(self) -> Vec<MazeCell> {
        let (cx, cy) = (self.width / 2, self.height / 2);
        [(cx, cy), (cx + 1, cy), (cx, cy + 1), (cx + 1, cy + 1)]
            .into_iter()
            .map(|(x, y)| MazeCell::at(x, y))
            .filter(|c| !self.is_start(*c))
            .collect()
    }

    pub fn is_center(self, cell: MazeCell) -> bool {
        let (cx, cy) = (self.width / 2, self.height / 2);
        (cell.x == cx || cell.x == cx + 1)
            && (cell.y == cy || cell.y == cy + 1)
            && !self.is_start(cell)
    }

    /// Edges between the center block and the rest of the maze (boundary
    /// edges included), as `(center cell, outward direction)`.
    pub fn center_outer_edges(self) -> Vec<(MazeCell, Direction)> {
        let mut edges = Vec::with_capacity(8);
        for cell in self.center_cells() {
            for dir in Direction::CARDINALS {
                let inside = self
                    .neighbor(cell, dir)
                    .is_some_and(|n| self.is_center(n));
                if !inside {
                    edges.push((cell, dir));
                }
            }
        }
        edges
    }

    /// All cells in row-major order.
    pub fn cells(self) -> impl Iterator<Item = MazeCell> {
        let (w, h) = (self.width, self.height);
        (1..=h).flat_map(move |y| (1..=w).map(move |x| MazeCell::at(x, y)))
    }

    /// Row-major index of an in-range cell.
    #[inline]
    pub(crate) fn index_of(self, cell: MazeCell) -> Option<usize> {
        if cell.x == 0 || cell.y == 0 || !self.contains(cell) {
            return None;
        }
        Some(((cell.y - 1) as usize) * (self.width as usize) + (cell.x - 1) as usize)
    }
}

impl Default for MazeSize {
    fn default() -> Self {
        Self::CLASSIC
    }
}

impl fmt::Display for MazeSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
