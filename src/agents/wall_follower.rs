use crate::pose::{RobotStep, Sensors};

use super::Agent;

/// The hand kept on the wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WallSide {
    Left,
    Right,
}

/// Keep one hand on the wall: turn toward the reference side whenever it
/// opens up, otherwise go straight, otherwise rotate away from it.
#[derive(Debug, Clone)]
pub struct WallFollower {
    side: WallSide,
    queued: Option<RobotStep>,
}

impl WallFollower {
    pub fn new(side: WallSide) -> Self {
        Self { side, queued: None }
    }
}

impl Agent for WallFollower {
    fn name(&self) -> &'static str {
        match self.side {
            WallSide::Left => "left-wall-follower",
            WallSide::Right => "right-wall-follower",
        }
    }

    fn initialize(&mut self, _sensors: &dyn Sensors) {
        self.queued = None;
    }

    fn next_step(&mut self, sensors: &dyn Sensors) -> RobotStep {
        if let Some(step) = self.queued.take() {
            return step;
        }
        let (side_open, toward, away) = match self.side {
            WallSide::Left => (
                !sensors.is_wall_left(),
                RobotStep::RotateLeft,
                RobotStep::RotateRight,
            ),
            WallSide::Right => (
                !sensors.is_wall_right(),
                RobotStep::RotateRight,
                RobotStep::RotateLeft,
            ),
        };
        if side_open {
            self.queued = Some(RobotStep::MoveForward);
            toward
        } else if !sensors.is_wall_front() {
            RobotStep::MoveForward
        } else {
            away
        }
    }

    fn is_turbo_mode(&self) -> bool {
        false
    }
}
