use crate::error::MazeError;
use crate::geometry::{Direction, MazeCell, MazeSize};
use crate::maze::MazeWallStore;
use crate::prng::Prng;

/// Smallest side for which a generated maze can keep the start cell outside
/// the center block.
pub const MIN_GENERATED_SIDE: u32 = 4;

/// Carve a legal competition maze.
///
/// Depth-first backtracker over a fully walled grid. The start cell is a
/// leaf opening only to the North, and the center block is treated as a
/// single room that is entered once and never expanded, so it ends up with
/// exactly one opening. `extra_openings` then knocks out random interior
/// walls (never around the center or the start cell) to create loops, as
/// long as every peg still touches a wall.
///
/// The same `(size, seed, extra_openings)` always yields the same maze.
pub fn generate_maze(
    size: MazeSize,
    seed: u64,
    extra_openings: u32,
) -> Result<MazeWallStore, MazeError> {
    if size.width() < MIN_GENERATED_SIDE || size.height() < MIN_GENERATED_SIDE {
        return Err(MazeError::IllegalDimensions {
            width: size.width(),
            height: size.height(),
            min: MIN_GENERATED_SIDE,
            max: MazeSize::MAX_SIDE,
        });
    }

    let mut maze = MazeWallStore::walled(size);
    let mut rng = Prng::new(seed ^ 0xA5A5_5A5Au64);
    carve(&mut maze, &mut rng);
    open_loops(&mut maze, &mut rng, extra_openings);
    tracing::debug!(%size, seed, extra_openings, "generated maze");
    Ok(maze)
}

fn carve(maze: &mut MazeWallStore, rng: &mut Prng) {
    let size = maze.size();
    let mut visited = vec![false; size.cell_count()];
    let mark = |visited: &mut Vec<bool>, cell: MazeCell| {
        if let Some(i) = size.index_of(cell) {
            visited[i] = true;
        }
    };
    let is_visited =
        |visited: &Vec<bool>, cell: MazeCell| size.index_of(cell).map_or(true, |i| visited[i]);

    let start = size.start_cell();
    mark(&mut visited, start);
    let mut stack: Vec<MazeCell> = Vec::with_capacity(size.cell_count());
    if let Some(first) = size.neighbor(start, Direction::North) {
        maze.clear_wall(start, Direction::North);
        mark(&mut visited, first);
        stack.push(first);
    }

    while let Some(&cell) = stack.last() {
        let mut options = [Direction::Directionless; 4];
        let mut n = 0usize;
        for dir in Direction::CARDINALS {
            if let Some(next) = size.neighbor(cell, dir) {
                if !is_visited(&visited, next) {
                    options[n] = dir;
                    n += 1;
                }
            }
        }

        if n == 0 {
            stack.pop();
            continue;
        }

        let dir = options[rng.below(n as u32) as usize];
        let Some(next) = size.neighbor(cell, dir) else {
            continue;
        };
        maze.clear_wall(cell, dir);

        if size.is_center(next) {
            // The whole block becomes one room; its cells are never pushed.
            for room in size.center_cells() {
                mark(&mut visited, room);
                for inner in Direction::CARDINALS {
                    if size.neighbor(room, inner).is_some_and(|c| size.is_center(c)) {
                        maze.clear_wall(room, inner);
                    }
                }
            }
            continue;
        }

        mark(&mut visited, next);
        stack.push(next);
    }
}

fn open_loops(maze: &mut MazeWallStore, rng: &mut Prng, extra_openings: u32) {
    let size = maze.size();
    let start = size.start_cell();
    let mut opened = 0;
    let mut attempts = extra_openings.saturating_mul(32);

    while opened < extra_openings && attempts > 0 {
        attempts -= 1;
        let x = rng.range_inclusive(1, size.width());
        let y = rng.range_inclusive(1, size.height());
        let cell = MazeCell::at(x, y);
        let dir = Direction::CARDINALS[rng.below(4) as usize];

        let Some(next) = size.neighbor(cell, dir) else {
            continue;
        };
        if !maze.has_wall(cell, dir)
            || size.is_center(cell)
            || size.is_center(next)
            || cell == start
            || next == start
            || !maze.pegs_keep_walls_without(cell, dir)
        {
            continue;
        }
        maze.clear_wall(cell, dir);
        opened += 1;
    }

    if opened < extra_openings {
        tracing::debug!(opened, requested = extra_openings, "ran out of removable walls");
    }
}
