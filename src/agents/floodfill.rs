use crate::geometry::{Direction, DirectionSet, MazeCell, MazeSize};
use crate::grid::Grid;
use crate::maze::MazeWallStore;
use crate::pose::{RobotStep, Sensors};

use super::{
    flood_fill, selection_order, steer, Agent, Goal, Knowledge, Understanding, UNREACHABLE,
};

/// State shared by the flood-fill family: belief map, distance field, active
/// goal, pending maneuver and the entry bookkeeping used to seal the center.
#[derive(Debug, Clone)]
pub(crate) struct FloodCore {
    pub(crate) knowledge: Knowledge,
    pub(crate) distance: Grid<u32>,
    pub(crate) goal: Goal,
    pub(crate) speed_run: bool,
    pub(crate) turbo: bool,
    queued: Option<RobotStep>,
    last_cell: Option<MazeCell>,
    entered_from: Option<Direction>,
}

impl FloodCore {
    pub(crate) fn new(size: MazeSize) -> Self {
        Self {
            knowledge: Knowledge::new(size),
            distance: Grid::new(size, UNREACHABLE),
            goal: Goal::Center,
            speed_run: false,
            turbo: false,
            queued: None,
            last_cell: None,
            entered_from: None,
        }
    }

    /// Fresh knowledge for the maze the sensors report. Speed-run stays as
    /// configured.
    pub(crate) fn reset(&mut self, sensors: &dyn Sensors) {
        let speed_run = self.speed_run;
        *self = Self::new(sensors.maze_size());
        self.speed_run = speed_run;
        self.last_cell = Some(sensors.location());
    }

    /// Track the edge crossed since the last call and hand out a queued
    /// maneuver if there is one.
    pub(crate) fn begin(&mut self, sensors: &dyn Sensors) -> Option<RobotStep> {
        let here = sensors.location();
        if let Some(prev) = self.last_cell {
            if prev != here {
                self.entered_from = Some(here.direction_to(prev));
            }
        }
        self.last_cell = Some(here);
        self.queued.take()
    }

    /// Sense the current cell on the first visit. Returns the walls found.
    pub(crate) fn sense_if_new(&mut self, sensors: &dyn Sensors) -> Option<DirectionSet> {
        if self.knowledge.is_explored(sensors.location()) {
            return None;
        }
        Some(self.knowledge.sense(sensors))
    }

    /// Flip the goal when standing on it. The first center arrival also seals
    /// the center block behind the robot.
    pub(crate) fn handle_goal(&mut self, here: MazeCell) -> bool {
        let size = self.knowledge.size();
        if !self.goal.contains(size, here) {
            return false;
        }
        if self.goal == Goal::Center && !self.knowledge.is_sealed() {
            let entry = self.entered_from.map(|d| (here, d));
            self.knowledge.seal_center(entry);
            tracing::debug!(cell = %here, "sealed center block");
        }
        self.goal = self.goal.flipped();
        tracing::debug!(cell = %here, goal = ?self.goal, "goal reached, heading back");
        true
    }

    pub(crate) fn speed_mode(&self) -> bool {
        self.speed_run && self.knowledge.is_sealed() && self.goal == Goal::Center
    }

    pub(crate) fn flood(&mut self, directions: Option<&mut Grid<DirectionSet>>) {
        let explored_only = self.speed_mode();
        flood_fill(
            &self.knowledge,
            self.goal,
            explored_only,
            &mut self.distance,
            directions,
        );
    }

    /// Flood, and when the robot turns out to be cut off from the goal, throw
    /// the belief map away and flood again.
    pub(crate) fn flood_with_purge(
        &mut self,
        sensors: &dyn Sensors,
        mut directions: Option<&mut Grid<DirectionSet>>,
    ) {
        let here = sensors.location();
        self.flood(directions.as_deref_mut());
        if self.distance[here] == UNREACHABLE {
            self.purge(sensors);
            self.flood(directions);
        }
    }

    pub(crate) fn purge(&mut self, sensors: &dyn Sensors) {
        tracing::debug!(cell = %sensors.location(), "belief contradicts itself, purging");
        self.knowledge.purge(sensors);
    }

    pub(crate) fn is_open(&self, here: MazeCell, dir: Direction) -> Option<MazeCell> {
        if self.knowledge.walls().has_wall(here, dir) {
            return None;
        }
        self.knowledge.size().neighbor(here, dir)
    }

    /// Commit to `heading`: set the turbo flag and translate into an action.
    pub(crate) fn commit(&mut self, sensors: &dyn Sensors, heading: Direction) -> RobotStep {
        let here = sensors.location();
        self.turbo = self
            .knowledge
            .size()
            .neighbor(here, heading)
            .is_some_and(|n| self.knowledge.is_explored(n));
        steer(sensors.facing(), heading, &mut self.queued)
    }

    /// Nothing sensible left to do; rotate in place.
    pub(crate) fn give_up(&mut self, here: MazeCell) -> RobotStep {
        tracing::warn!(cell = %here, goal = ?self.goal, "no move toward the goal");
        self.turbo = false;
        RobotStep::RotateRight
    }
}

/// Classic flood fill: recompute the whole distance field every decision and
/// step to any strictly closer open neighbor.
#[derive(Debug, Clone)]
pub struct Floodfill {
    core: FloodCore,
}

impl Floodfill {
    pub fn new() -> Self {
        Self {
            core: FloodCore::new(MazeSize::default()),
        }
    }

    pub fn distances(&self) -> &Grid<u32> {
        &self.core.distance
    }

    pub fn goal(&self) -> Goal {
        self.core.goal
    }

    fn select(&self, sensors: &dyn Sensors) -> Option<Direction> {
        let here = sensors.location();
        let current = self.core.distance[here];
        selection_order(sensors.facing()).find(|dir| {
            self.core
                .is_open(here, *dir)
                .is_some_and(|n| self.core.distance[n] < current)
        })
    }
}

impl Default for Floodfill {
    fn default() -> Self {
        Self::new()
    }
}

impl Agent for Floodfill {
    fn name(&self) -> &'static str {
        "floodfill"
    }

    fn initialize(&mut self, sensors: &dyn Sensors) {
        self.core.reset(sensors);
    }

    fn next_step(&mut self, sensors: &dyn Sensors) -> RobotStep {
        if let Some(step) = self.core.begin(sensors) {
            return step;
        }
        let here = sensors.location();
        self.core.sense_if_new(sensors);
        self.core.handle_goal(here);
        self.core.flood_with_purge(sensors, None);

        if let Some(dir) = self.select(sensors) {
            return self.core.commit(sensors, dir);
        }
        // Second and last attempt on a clean slate.
        self.core.purge(sensors);
        self.core.flood(None);
        if let Some(dir) = self.select(sensors) {
            return self.core.commit(sensors, dir);
        }
        self.core.give_up(here)
    }

    fn is_turbo_mode(&self) -> bool {
        self.core.turbo
    }

    fn set_speed_run(&mut self, enabled: bool) {
        self.core.speed_run = enabled;
    }

    fn understanding(&self) -> Understanding<'_> {
        Understanding::Distances(&self.core.distance)
    }

    fn known_walls(&self) -> Option<&MazeWallStore> {
        Some(self.core.knowledge.walls())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::testing::{drive, start};
    use crate::generator::generate_maze;
    use crate::pose::PoseSensors;

    #[test]
    fn reaches_goal_in_one_move_in_a_two_by_two_maze() {
        let size = MazeSize::new(2, 2).unwrap();
        let mut maze = MazeWallStore::walled(size);
        maze.clear_wall(size.start_cell(), Direction::North);

        let mut agent = Floodfill::new();
        let mut pose = start(&mut agent, &maze);
        let steps = drive(&mut agent, &maze, &mut pose, 10, |p| {
            size.is_center(p.location())
        });
        assert_eq!(steps, 1);
        assert_eq!(pose.path().len(), 2);
        assert_eq!(pose.location(), MazeCell::at(1, 1));
    }

    #[test]
    fn first_center_arrival_seals_all_but_the_entry() {
        let maze = generate_maze(MazeSize::CLASSIC, 11, 0).unwrap();
        let truth = maze.clone();
        let mut agent = Floodfill::new();
        let mut pose = start(&mut agent, &maze);
        drive(&mut agent, &maze, &mut pose, 10_000, |p| {
            maze.size().is_center(p.location())
        });
        assert!(maze.size().is_center(pose.location()));

        // The arrival is processed on the next decision.
        agent.next_step(&PoseSensors::new(&maze, &pose));
        let known = agent.known_walls().unwrap();
        assert_eq!(known.center_openings().len(), 1);
        assert_eq!(agent.goal(), Goal::Start);
        assert_eq!(maze, truth);
    }

    #[test]
    fn returns_to_start_after_the_center() {
        for seed in 0..5 {
            let maze = generate_maze(MazeSize::CLASSIC, seed, 8).unwrap();
            let mut agent = Floodfill::new();
            let mut pose = start(&mut agent, &maze);
            let size = maze.size();
            drive(&mut agent, &maze, &mut pose, 20_000, |p| {
                size.is_center(p.location())
            });
            assert!(size.is_center(pose.location()), "seed {seed}");
            drive(&mut agent, &maze, &mut pose, 20_000, |p| {
                size.is_start(p.location())
            });
            assert!(size.is_start(pose.location()), "seed {seed}");
        }
    }

    #[test]
    fn distance_field_is_a_gradient_after_flooding() {
        let maze = generate_maze(MazeSize::CLASSIC, 5, 4).unwrap();
        let mut agent = Floodfill::new();
        let pose = start(&mut agent, &maze);
        agent.next_step(&PoseSensors::new(&maze, &pose));

        let size = maze.size();
        let known = agent.known_walls().unwrap();
        let dist = agent.distances();
        for cell in size.center_cells() {
            assert_eq!(dist[cell], 0);
        }
        for cell in size.cells() {
            for dir in Direction::CARDINALS {
                if known.has_wall(cell, dir) {
                    continue;
                }
                if let Some(n) = size.neighbor(cell, dir) {
                    assert!(dist[cell].abs_diff(dist[n]) <= 1);
                }
            }
        }
    }

    #[test]
    fn turbo_tracks_explored_destinations() {
        let size = MazeSize::new(4, 4).unwrap();
        let maze = MazeWallStore::new(size);
        let mut agent = Floodfill::new();
        let pose = start(&mut agent, &maze);
        let step = agent.next_step(&PoseSensors::new(&maze, &pose));
        assert_eq!(step, RobotStep::MoveForward);
        assert!(!agent.is_turbo_mode());

        // Walk forward, then force a decision that leads back to start.
        let mut pose = pose;
        pose.take_step(&maze, step).unwrap();
        agent.core.goal = Goal::Start;
        let step = agent.next_step(&PoseSensors::new(&maze, &pose));
        assert_eq!(step, RobotStep::MoveBackward);
        assert!(agent.is_turbo_mode());
    }

    #[test]
    fn purge_recovers_from_a_contradictory_map() {
        let size = MazeSize::new(4, 4).unwrap();
        let maze = MazeWallStore::new(size);
        let mut agent = Floodfill::new();
        let pose = start(&mut agent, &maze);

        // Box the start cell in belief; the real maze is open to the North.
        let here = size.start_cell();
        agent.core.knowledge.walls.set_wall(here, Direction::North);

        let step = agent.next_step(&PoseSensors::new(&maze, &pose));
        assert_eq!(step, RobotStep::MoveForward);
        assert_ne!(agent.distances()[here], UNREACHABLE);
        assert!(!agent.known_walls().unwrap().has_wall(here, Direction::North));
    }

    #[test]
    fn stale_belief_drives_into_a_real_wall() {
        let size = MazeSize::new(4, 4).unwrap();
        let maze = MazeWallStore::new(size);
        let mut agent = Floodfill::new();
        let mut pose = start(&mut agent, &maze);

        // The start cell is sensed and the plan runs North through it.
        let step = agent.next_step(&PoseSensors::new(&maze, &pose));
        assert_eq!(step, RobotStep::MoveForward);
        let here = size.start_cell();
        assert!(agent.core.knowledge.is_explored(here));
        assert!(!agent.known_walls().unwrap().has_wall(here, Direction::North));

        let mut truth = maze.clone();
        truth.set_wall(here, Direction::North);
        let crash = pose.take_step(&truth, step).unwrap_err();
        assert_eq!(crash.cell, here);
        assert_eq!(crash.direction, Direction::North);
        assert!(pose.is_crashed());
    }

    #[test]
    fn controller_stops_on_a_crash_into_an_unknown_wall() {
        use crate::controller::{RobotController, StepOutcome};

        let size = MazeSize::new(4, 4).unwrap();
        let maze = MazeWallStore::new(size);
        let mut controller = RobotController::new(maze, Box::new(Floodfill::new()), 100);

        let side = MazeCell::at(1, 3);
        assert_eq!(controller.next_step(), StepOutcome::Moved(side));
        // Sensed open to the East; the agent turns and queues the move.
        assert_eq!(controller.next_step(), StepOutcome::Turned);
        assert!(!controller
            .agent()
            .known_walls()
            .unwrap()
            .has_wall(side, Direction::East));

        controller.maze_mut().set_wall(side, Direction::East);
        let outcome = controller.next_step();
        assert!(matches!(
            outcome,
            StepOutcome::Crashed(crash) if crash.cell == side && crash.direction == Direction::East
        ));
        assert!(controller.is_done());
        assert!(!controller.is_unsolved());
        assert_eq!(controller.move_count(), 1);
        assert_eq!(controller.next_step(), StepOutcome::Halted);
    }

    #[test]
    fn speed_run_plans_over_explored_cells() {
        let maze = generate_maze(MazeSize::CLASSIC, 3, 6).unwrap();
        let size = maze.size();
        let mut agent = Floodfill::new();
        agent.set_speed_run(true);
        let mut pose = start(&mut agent, &maze);
        for _ in 0..2 {
            drive(&mut agent, &maze, &mut pose, 20_000, |p| {
                size.is_center(p.location())
            });
            drive(&mut agent, &maze, &mut pose, 20_000, |p| {
                size.is_start(p.location())
            });
        }
        assert!(size.is_start(pose.location()));

        // Back on the start cell with the center sealed: the next plan only
        // walks explored cells.
        agent.next_step(&PoseSensors::new(&maze, &pose));
        assert!(agent.core.speed_mode());
        for (cell, d) in agent.distances().iter() {
            if *d != UNREACHABLE && !size.is_center(cell) {
                assert!(agent.core.knowledge.is_explored(cell), "{cell}");
            }
        }
    }
}
