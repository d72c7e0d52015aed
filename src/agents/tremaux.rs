use std::collections::VecDeque;

use crate::geometry::{Direction, MazeSize};
use crate::grid::Grid;
use crate::pose::{RobotStep, Sensors};

use super::{Agent, Understanding};

/// Trémaux's ball of string: every cell remembers the way back the first
/// time it is entered. Unmarked cells are explored first (right, front,
/// left); with none left the robot rewinds along the string.
#[derive(Debug, Clone)]
pub struct Tremaux {
    trail: Grid<Direction>,
    queued: VecDeque<RobotStep>,
    turbo: bool,
}

impl Tremaux {
    pub fn new() -> Self {
        Self {
            trail: Grid::new(MazeSize::default(), Direction::Directionless),
            queued: VecDeque::with_capacity(2),
            turbo: false,
        }
    }

    pub fn trail(&self) -> &Grid<Direction> {
        &self.trail
    }

    fn is_unmarked(&self, sensors: &dyn Sensors, dir: Direction) -> bool {
        sensors
            .maze_size()
            .neighbor(sensors.location(), dir)
            .and_then(|n| self.trail.get(n))
            .is_some_and(|d| *d == Direction::Directionless)
    }

    fn explore(&mut self, sensors: &dyn Sensors) -> Option<RobotStep> {
        let facing = sensors.facing();
        let options = [
            (facing.right(), RobotStep::RotateRight),
            (facing, RobotStep::MoveForward),
            (facing.left(), RobotStep::RotateLeft),
        ];
        let (_, step) = options
            .into_iter()
            .find(|(dir, _)| !sensors.is_wall(*dir) && self.is_unmarked(sensors, *dir))?;
        if step.is_turn() {
            self.queued.push_back(RobotStep::MoveForward);
        }
        self.turbo = false;
        Some(step)
    }

    fn rewind(&mut self, facing: Direction, back: Direction) -> RobotStep {
        self.turbo = true;
        if back == facing {
            RobotStep::MoveForward
        } else if back == facing.left() {
            self.queued.push_back(RobotStep::MoveForward);
            RobotStep::RotateLeft
        } else if back == facing.right() {
            self.queued.push_back(RobotStep::MoveForward);
            RobotStep::RotateRight
        } else {
            self.queued.push_back(RobotStep::RotateRight);
            self.queued.push_back(RobotStep::MoveForward);
            RobotStep::RotateRight
        }
    }
}

impl Default for Tremaux {
    fn default() -> Self {
        Self::new()
    }
}

impl Agent for Tremaux {
    fn name(&self) -> &'static str {
        "tremaux"
    }

    fn initialize(&mut self, sensors: &dyn Sensors) {
        self.trail = Grid::new(sensors.maze_size(), Direction::Directionless);
        self.trail
            .set(sensors.location(), sensors.facing().opposite());
        self.queued.clear();
        self.turbo = false;
    }

    fn next_step(&mut self, sensors: &dyn Sensors) -> RobotStep {
        if let Some(step) = self.queued.pop_front() {
            return step;
        }
        let here = sensors.location();
        if self.trail.get(here) == Some(&Direction::Directionless) {
            self.trail.set(here, sensors.facing().opposite());
        }

        if let Some(step) = self.explore(sensors) {
            return step;
        }

        let back = self
            .trail
            .get(here)
            .copied()
            .unwrap_or(Direction::Directionless);
        if back != Direction::Directionless && !sensors.is_wall(back) {
            return self.rewind(sensors.facing(), back);
        }

        // The string is fully wound back in; lay a fresh one from here.
        tracing::debug!(cell = %here, "trail exhausted, starting a new pass");
        self.trail.fill(Direction::Directionless);
        self.trail.set(here, back);
        if let Some(step) = self.explore(sensors) {
            return step;
        }
        self.turbo = false;
        RobotStep::RotateRight
    }

    fn is_turbo_mode(&self) -> bool {
        self.turbo
    }

    fn understanding(&self) -> Understanding<'_> {
        Understanding::Trail(&self.trail)
    }
}
