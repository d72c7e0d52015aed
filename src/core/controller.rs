use crate::agents::Agent;
use crate::config::SimConfig;
use crate::error::{ConfigError, Crash};
use crate::generator::generate_maze;
use crate::geometry::MazeCell;
use crate::maze::MazeWallStore;
use crate::pose::{PoseSensors, RobotPose, StepKind};

/// What a single `next_step()` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Turned,
    Moved(MazeCell),
    /// Moved from outside the center block into it.
    ReachedCenter(MazeCell),
    Crashed(Crash),
    /// The run was already over; nothing happened.
    Halted,
}

/// Owns one simulated robot: the ground-truth maze, the pose and the agent
/// driving it.
pub struct RobotController {
    maze: MazeWallStore,
    pose: RobotPose,
    agent: Box<dyn Agent>,
    max_steps: u64,
    step_count: u64,
    move_count: u64,
    turn_count: u64,
    crash: Option<Crash>,
    ceiling_logged: bool,
}

impl RobotController {
    pub fn new(maze: MazeWallStore, agent: Box<dyn Agent>, max_steps: u64) -> Self {
        let pose = RobotPose::at_start(maze.size());
        let mut controller = Self {
            maze,
            pose,
            agent,
            max_steps,
            step_count: 0,
            move_count: 0,
            turn_count: 0,
            crash: None,
            ceiling_logged: false,
        };
        controller.initialize();
        controller
    }

    /// Generate the configured maze and agent.
    pub fn from_config(config: &SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let maze = generate_maze(config.size()?, config.seed, config.extra_openings)?;
        let mut agent = config.agent.build();
        agent.set_speed_run(config.speed_run);
        Ok(Self::new(maze, agent, config.max_steps))
    }

    /// Back to the start cell facing North with counters, crash state and
    /// the agent's knowledge reset.
    pub fn initialize(&mut self) {
        self.pose.initialize();
        self.step_count = 0;
        self.move_count = 0;
        self.turn_count = 0;
        self.crash = None;
        self.ceiling_logged = false;
        let sensors = PoseSensors::new(&self.maze, &self.pose);
        self.agent.initialize(&sensors);
    }

    pub fn next_step(&mut self) -> StepOutcome {
        if self.is_done() {
            self.log_ceiling();
            return StepOutcome::Halted;
        }

        let step = {
            let sensors = PoseSensors::new(&self.maze, &self.pose);
            self.agent.next_step(&sensors)
        };
        self.step_count += 1;
        let was_at_center = self.is_at_center();

        let outcome = match self.pose.take_step(&self.maze, step) {
            Ok(StepKind::Turn) => {
                self.turn_count += 1;
                StepOutcome::Turned
            }
            Ok(StepKind::Move) => {
                self.move_count += 1;
                let cell = self.pose.location();
                if !was_at_center && self.is_at_center() {
                    self.pose.record_center_arrival();
                    StepOutcome::ReachedCenter(cell)
                } else {
                    StepOutcome::Moved(cell)
                }
            }
            Err(crash) => {
                tracing::warn!(
                    agent = self.agent.name(),
                    step = self.step_count,
                    "{crash}"
                );
                self.crash = Some(crash);
                StepOutcome::Crashed(crash)
            }
        };
        if self.is_done() {
            self.log_ceiling();
        }
        outcome
    }

    fn log_ceiling(&mut self) {
        if self.crash.is_none() && !self.ceiling_logged {
            self.ceiling_logged = true;
            tracing::info!(
                agent = self.agent.name(),
                max_steps = self.max_steps,
                cell = %self.pose.location(),
                "step ceiling reached"
            );
        }
    }

    /// Crashed, or out of steps.
    pub fn is_done(&self) -> bool {
        self.crash.is_some() || self.step_count >= self.max_steps
    }

    /// Ran out of steps without crashing.
    pub fn is_unsolved(&self) -> bool {
        self.crash.is_none() && self.step_count >= self.max_steps
    }

    pub fn crash(&self) -> Option<Crash> {
        self.crash
    }

    pub fn move_count(&self) -> u64 {
        self.move_count
    }

    pub fn turn_count(&self) -> u64 {
        self.turn_count
    }

    /// Agent decisions taken so far, including one that crashed.
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn max_steps(&self) -> u64 {
        self.max_steps
    }

    pub fn pose(&self) -> &RobotPose {
        &self.pose
    }

    pub fn maze(&self) -> &MazeWallStore {
        &self.maze
    }

    /// Rebuild walls under a running agent.
    #[cfg(test)]
    pub(crate) fn maze_mut(&mut self) -> &mut MazeWallStore {
        &mut self.maze
    }

    pub fn agent(&self) -> &dyn Agent {
        self.agent.as_ref()
    }

    pub fn is_at_center(&self) -> bool {
        self.maze.size().is_center(self.pose.location())
    }

    pub fn is_at_start(&self) -> bool {
        self.maze.size().is_start(self.pose.location())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::AgentKind;
    use crate::geometry::{Direction, MazeSize};
    use crate::pose::{RobotStep, Sensors};

    /// Drives straight ahead no matter what.
    struct Reckless;

    impl Agent for Reckless {
        fn name(&self) -> &'static str {
            "reckless"
        }
        fn initialize(&mut self, _sensors: &dyn Sensors) {}
        fn next_step(&mut self, _sensors: &dyn Sensors) -> RobotStep {
            RobotStep::MoveForward
        }
        fn is_turbo_mode(&self) -> bool {
            false
        }
    }

    /// Spins in place forever.
    struct Spinner;

    impl Agent for Spinner {
        fn name(&self) -> &'static str {
            "spinner"
        }
        fn initialize(&mut self, _sensors: &dyn Sensors) {}
        fn next_step(&mut self, _sensors: &dyn Sensors) -> RobotStep {
            RobotStep::RotateLeft
        }
        fn is_turbo_mode(&self) -> bool {
            false
        }
    }

    #[test]
    fn crash_ends_the_run_without_counting_the_move() {
        let maze = MazeWallStore::with_dimensions(4, 4).unwrap();
        let mut controller = RobotController::new(maze, Box::new(Reckless), 100);
        let mut outcomes = Vec::new();
        while !controller.is_done() {
            outcomes.push(controller.next_step());
        }
        assert_eq!(outcomes.len(), 4);
        assert_eq!(
            outcomes[3],
            StepOutcome::Crashed(Crash {
                cell: MazeCell::at(1, 1),
                direction: Direction::North,
            })
        );
        assert_eq!(controller.move_count(), 3);
        assert!(!controller.is_unsolved());
        assert_eq!(controller.next_step(), StepOutcome::Halted);
        assert_eq!(controller.step_count(), 4);
    }

    #[test]
    fn ceiling_leaves_the_run_unsolved() {
        let maze = MazeWallStore::with_dimensions(4, 4).unwrap();
        let mut controller = RobotController::new(maze, Box::new(Spinner), 10);
        for _ in 0..20 {
            controller.next_step();
        }
        assert!(controller.is_done());
        assert!(controller.is_unsolved());
        assert_eq!(controller.turn_count(), 10);
        assert_eq!(controller.step_count(), controller.max_steps());
        assert_eq!(controller.move_count(), 0);
        assert!(controller.crash().is_none());
    }

    #[test]
    fn initialize_resets_everything() {
        let maze = MazeWallStore::with_dimensions(4, 4).unwrap();
        let mut controller = RobotController::new(maze, Box::new(Reckless), 100);
        while !controller.is_done() {
            controller.next_step();
        }
        controller.initialize();
        assert!(!controller.is_done());
        assert!(controller.is_at_start());
        assert_eq!(controller.pose().facing(), Direction::North);
        assert_eq!(controller.move_count() + controller.turn_count(), 0);
    }

    #[test]
    fn reports_center_arrivals() {
        let config = SimConfig::default().with_seed(4);
        let mut controller = RobotController::from_config(&config).unwrap();
        let mut arrived = None;
        while !controller.is_done() {
            if let StepOutcome::ReachedCenter(cell) = controller.next_step() {
                arrived = Some(cell);
                break;
            }
        }
        let cell = arrived.unwrap();
        assert!(MazeSize::CLASSIC.is_center(cell));
        assert!(controller.is_at_center());
        assert_eq!(
            controller.pose().first_run().len() as u64,
            controller.move_count() + 1
        );
    }

    #[test]
    fn every_agent_solves_a_generated_maze() {
        for kind in AgentKind::ALL {
            let config = SimConfig::default()
                .with_agent(kind)
                .with_seed(17)
                .with_max_steps(20_000);
            let mut controller = RobotController::from_config(&config).unwrap();
            while !controller.is_done() && !controller.is_at_center() {
                controller.next_step();
            }
            assert!(controller.is_at_center(), "{kind}");
            assert!(controller.crash().is_none(), "{kind}");
        }
    }
}
