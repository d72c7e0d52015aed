use std::collections::HashSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::Crash;
use crate::geometry::{Direction, MazeCell, MazeSize};
use crate::maze::MazeWallStore;

/// One atomic action. Rotations are "turns", the two moves are "moves".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RobotStep {
    MoveForward,
    MoveBackward,
    RotateLeft,
    RotateRight,
}

impl RobotStep {
    pub fn is_turn(self) -> bool {
        matches!(self, RobotStep::RotateLeft | RobotStep::RotateRight)
    }
}

/// How an applied step is counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Turn,
    Move,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RunState {
    Running,
    Crashed(Crash),
}

/// What the robot can perceive. Agents see the world only through this.
pub trait Sensors {
    fn maze_size(&self) -> MazeSize;
    fn location(&self) -> MazeCell;
    fn facing(&self) -> Direction;
    fn is_wall_front(&self) -> bool;
    fn is_wall_back(&self) -> bool;
    fn is_wall_left(&self) -> bool;
    fn is_wall_right(&self) -> bool;

    /// Wall in an absolute direction, derived from the relative sensors.
    fn is_wall(&self, dir: Direction) -> bool {
        let facing = self.facing();
        if dir == facing {
            self.is_wall_front()
        } else if dir == facing.left() {
            self.is_wall_left()
        } else if dir == facing.right() {
            self.is_wall_right()
        } else if dir == facing.opposite() {
            self.is_wall_back()
        } else {
            true
        }
    }
}

/// Position, facing and path history of the simulated robot.
#[derive(Debug, Clone)]
pub struct RobotPose {
    start: MazeCell,
    start_facing: Direction,
    location: MazeCell,
    facing: Direction,
    state: RunState,
    path: Vec<MazeCell>,
    visited: HashSet<MazeCell>,
    first_run: Vec<MazeCell>,
    best_run: Vec<MazeCell>,
}

impl RobotPose {
    pub fn new(start: MazeCell, facing: Direction) -> Self {
        let mut pose = Self {
            start,
            start_facing: facing,
            location: start,
            facing,
            state: RunState::Running,
            path: Vec::with_capacity(128),
            visited: HashSet::with_capacity(128),
            first_run: Vec::new(),
            best_run: Vec::new(),
        };
        pose.initialize();
        pose
    }

    /// Placed at the start cell of `size`, facing North.
    pub fn at_start(size: MazeSize) -> Self {
        Self::new(size.start_cell(), Direction::North)
    }

    /// Back to the start cell and facing with all history and the crash
    /// state cleared.
    pub fn initialize(&mut self) {
        self.location = self.start;
        self.facing = self.start_facing;
        self.state = RunState::Running;
        self.path.clear();
        self.path.push(self.start);
        self.visited.clear();
        self.visited.insert(self.start);
        self.first_run.clear();
        self.best_run.clear();
    }

    pub fn location(&self) -> MazeCell {
        self.location
    }

    pub fn facing(&self) -> Direction {
        self.facing
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_crashed(&self) -> bool {
        matches!(self.state, RunState::Crashed(_))
    }

    pub fn is_wall_front(&self, maze: &MazeWallStore) -> bool {
        maze.has_wall(self.location, self.facing)
    }

    pub fn is_wall_back(&self, maze: &MazeWallStore) -> bool {
        maze.has_wall(self.location, self.facing.opposite())
    }

    pub fn is_wall_left(&self, maze: &MazeWallStore) -> bool {
        maze.has_wall(self.location, self.facing.left())
    }

    pub fn is_wall_right(&self, maze: &MazeWallStore) -> bool {
        maze.has_wall(self.location, self.facing.right())
    }

    /// Apply one action against the ground-truth maze.
    ///
    /// A move into a wall leaves the robot where it is and switches it to
    /// `Crashed`; every later step returns the same crash until
    /// `initialize()`.
    pub fn take_step(
        &mut self,
        maze: &MazeWallStore,
        step: RobotStep,
    ) -> Result<StepKind, Crash> {
        if let RunState::Crashed(crash) = self.state {
            return Err(crash);
        }
        let heading = match step {
            RobotStep::RotateLeft => {
                self.facing = self.facing.left();
                return Ok(StepKind::Turn);
            }
            RobotStep::RotateRight => {
                self.facing = self.facing.right();
                return Ok(StepKind::Turn);
            }
            RobotStep::MoveForward => self.facing,
            RobotStep::MoveBackward => self.facing.opposite(),
        };

        let target = if maze.has_wall(self.location, heading) {
            None
        } else {
            maze.size().neighbor(self.location, heading)
        };
        let Some(next) = target else {
            let crash = Crash {
                cell: self.location,
                direction: heading,
            };
            self.state = RunState::Crashed(crash);
            return Err(crash);
        };

        self.location = next;
        self.path.push(next);
        self.visited.insert(next);
        Ok(StepKind::Move)
    }

    /// Every cell occupied so far, starting with the start cell.
    pub fn path(&self) -> &[MazeCell] {
        &self.path
    }

    /// Path since the robot last stood on the start cell (inclusive).
    pub fn current_run(&self) -> &[MazeCell] {
        let from = self
            .path
            .iter()
            .rposition(|c| *c == self.start)
            .unwrap_or(0);
        &self.path[from..]
    }

    pub fn first_run(&self) -> &[MazeCell] {
        &self.first_run
    }

    pub fn best_run(&self) -> &[MazeCell] {
        &self.best_run
    }

    /// Run bookkeeping for an arrival in the center, driven by the controller.
    ///
    /// The first arrival becomes both the first and the best run; later
    /// arrivals replace the best run when strictly shorter.
    pub fn record_center_arrival(&mut self) {
        if self.first_run.is_empty() {
            self.first_run = self.path.clone();
            self.best_run = self.path.clone();
            return;
        }
        let current = self.current_run();
        if current.len() < self.best_run.len() {
            self.best_run = current.to_vec();
        }
    }

    pub fn has_visited(&self, cell: MazeCell) -> bool {
        self.visited.contains(&cell)
    }

    /// Number of distinct cells ever occupied.
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}

/// Sensor facade over a pose and the ground-truth maze.
#[derive(Debug, Clone, Copy)]
pub struct PoseSensors<'a> {
    maze: &'a MazeWallStore,
    pose: &'a RobotPose,
}

impl<'a> PoseSensors<'a> {
    pub fn new(maze: &'a MazeWallStore, pose: &'a RobotPose) -> Self {
        Self { maze, pose }
    }
}

impl Sensors for PoseSensors<'_> {
    fn maze_size(&self) -> MazeSize {
        self.maze.size()
    }

    fn location(&self) -> MazeCell {
        self.pose.location()
    }

    fn facing(&self) -> Direction {
        self.pose.facing()
    }

    fn is_wall_front(&self) -> bool {
        self.pose.is_wall_front(self.maze)
    }

    fn is_wall_back(&self) -> bool {
        self.pose.is_wall_back(self.maze)
    }

    fn is_wall_left(&self) -> bool {
        self.pose.is_wall_left(self.maze)
    }

    fn is_wall_right(&self) -> bool {
        self.pose.is_wall_right(self.maze)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_maze(w: u32, h: u32) -> MazeWallStore {
        MazeWallStore::with_dimensions(w, h).unwrap()
    }

    #[test]
    fn rotations_only_change_facing() {
        let maze = open_maze(4, 4);
        let mut pose = RobotPose::at_start(maze.size());
        let kind = pose.take_step(&maze, RobotStep::RotateRight).unwrap();
        assert_eq!(kind, StepKind::Turn);
        assert_eq!(pose.facing(), Direction::East);
        pose.take_step(&maze, RobotStep::RotateLeft).unwrap();
        pose.take_step(&maze, RobotStep::RotateLeft).unwrap();
        assert_eq!(pose.facing(), Direction::West);
        assert_eq!(pose.location(), MazeCell::at(1, 4));
        assert_eq!(pose.path().len(), 1);
    }

    #[test]
    fn moves_follow_facing_and_extend_path() {
        let maze = open_maze(4, 4);
        let mut pose = RobotPose::at_start(maze.size());
        let kind = pose.take_step(&maze, RobotStep::MoveForward).unwrap();
        assert_eq!(kind, StepKind::Move);
        assert_eq!(pose.location(), MazeCell::at(1, 3));
        pose.take_step(&maze, RobotStep::MoveBackward).unwrap();
        assert_eq!(pose.location(), MazeCell::at(1, 4));
        assert_eq!(pose.facing(), Direction::North);
        assert_eq!(
            pose.path(),
            &[MazeCell::at(1, 4), MazeCell::at(1, 3), MazeCell::at(1, 4)]
        );
        assert_eq!(pose.visited_count(), 2);
    }

    #[test]
    fn moving_into_a_wall_crashes_permanently() {
        let maze = open_maze(4, 4);
        let mut pose = RobotPose::at_start(maze.size());
        pose.take_step(&maze, RobotStep::RotateRight).unwrap();
        let crash = pose.take_step(&maze, RobotStep::MoveForward).unwrap_err();
        assert_eq!(crash.cell, MazeCell::at(1, 4));
        assert_eq!(crash.direction, Direction::East);
        assert!(pose.is_crashed());
        assert_eq!(pose.state(), RunState::Crashed(crash));
        assert_eq!(pose.location(), MazeCell::at(1, 4));

        // Even a harmless rotation is refused once crashed.
        assert_eq!(pose.take_step(&maze, RobotStep::RotateLeft), Err(crash));

        pose.initialize();
        assert!(!pose.is_crashed());
        assert_eq!(pose.state(), RunState::Running);
        assert_eq!(pose.facing(), Direction::North);
    }

    #[test]
    fn initialize_restores_the_starting_facing() {
        let maze = open_maze(4, 4);
        let mut pose = RobotPose::new(MazeCell::at(2, 2), Direction::West);
        assert_eq!(pose.facing(), Direction::West);
        pose.take_step(&maze, RobotStep::RotateLeft).unwrap();
        pose.take_step(&maze, RobotStep::MoveForward).unwrap();
        assert_eq!(pose.location(), MazeCell::at(2, 3));

        pose.initialize();
        assert_eq!(pose.location(), MazeCell::at(2, 2));
        assert_eq!(pose.facing(), Direction::West);
        assert_eq!(pose.path(), &[MazeCell::at(2, 2)]);
    }

    #[test]
    fn backing_into_the_boundary_crashes() {
        let maze = open_maze(4, 4);
        let mut pose = RobotPose::at_start(maze.size());
        let crash = pose.take_step(&maze, RobotStep::MoveBackward).unwrap_err();
        assert_eq!(crash.direction, Direction::South);
    }

    #[test]
    fn sensors_rotate_with_facing() {
        let maze = open_maze(4, 4);
        let mut pose = RobotPose::at_start(maze.size());
        {
            let s = PoseSensors::new(&maze, &pose);
            assert!(!s.is_wall_front());
            assert!(s.is_wall_left());
            assert!(s.is_wall_right());
            assert!(s.is_wall_back());
        }
        pose.take_step(&maze, RobotStep::RotateRight).unwrap();
        let s = PoseSensors::new(&maze, &pose);
        assert!(s.is_wall_front());
        assert!(!s.is_wall_left());
        assert!(s.is_wall_right());
        assert!(s.is_wall(Direction::South));
        assert!(!s.is_wall(Direction::North));
    }

    #[test]
    fn best_run_only_shrinks() {
        let maze = open_maze(4, 4);
        let mut pose = RobotPose::at_start(maze.size());
        for _ in 0..2 {
            pose.take_step(&maze, RobotStep::MoveForward).unwrap();
        }
        pose.record_center_arrival();
        assert_eq!(pose.first_run().len(), 3);
        assert_eq!(pose.best_run().len(), 3);

        for _ in 0..2 {
            pose.take_step(&maze, RobotStep::MoveBackward).unwrap();
        }
        assert_eq!(pose.current_run(), &[MazeCell::at(1, 4)]);
        pose.take_step(&maze, RobotStep::MoveForward).unwrap();
        pose.record_center_arrival();
        assert_eq!(pose.best_run(), &[MazeCell::at(1, 4), MazeCell::at(1, 3)]);
        assert_eq!(pose.first_run().len(), 3);
    }
}
