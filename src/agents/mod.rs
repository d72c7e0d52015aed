//! Maze-solving agents.
//!
//! Every agent sees the maze only through [`Sensors`] and answers with one
//! [`RobotStep`] per call. Composite maneuvers (turn then move) are queued
//! inside the agent and delivered on the following calls.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::geometry::{Direction, DirectionSet, MazeCell, MazeSize};
use crate::grid::Grid;
use crate::maze::MazeWallStore;
use crate::pose::{RobotStep, Sensors};

pub mod floodfill;
pub mod modified_floodfill;
pub mod tremaux;
pub mod wall_follower;

pub use floodfill::Floodfill;
pub use modified_floodfill::ModifiedFloodfill;
pub use tremaux::Tremaux;
pub use wall_follower::{WallFollower, WallSide};

/// Distance value for cells no known path reaches.
pub const UNREACHABLE: u32 = u32::MAX;

pub trait Agent {
    fn name(&self) -> &'static str;

    /// Forget everything learned and get ready for a fresh run from the start
    /// cell.
    fn initialize(&mut self, sensors: &dyn Sensors);

    fn next_step(&mut self, sensors: &dyn Sensors) -> RobotStep;

    /// True when the cell being driven into was already explored.
    fn is_turbo_mode(&self) -> bool;

    /// Only meaningful for the flood-fill family.
    fn set_speed_run(&mut self, _enabled: bool) {}

    fn understanding(&self) -> Understanding<'_> {
        Understanding::None
    }

    /// Walls the agent currently believes in, if it keeps a map.
    fn known_walls(&self) -> Option<&MazeWallStore> {
        None
    }
}

/// Read-only view of an agent's per-cell state.
#[derive(Debug, Clone, Copy)]
pub enum Understanding<'a> {
    None,
    Distances(&'a Grid<u32>),
    Trail(&'a Grid<Direction>),
}

impl Understanding<'_> {
    /// Short text for one cell: a distance, `-` for unreachable, or a trail
    /// arrow. `None` when the agent has nothing to show.
    pub fn render_cell(&self, cell: MazeCell) -> Option<String> {
        match self {
            Understanding::None => None,
            Understanding::Distances(grid) => grid.get(cell).map(|d| {
                if *d == UNREACHABLE {
                    "-".to_string()
                } else {
                    d.to_string()
                }
            }),
            Understanding::Trail(grid) => grid.get(cell).map(|d| d.arrow().to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum AgentKind {
    #[default]
    Floodfill,
    ModifiedFloodfill,
    LeftWallFollower,
    RightWallFollower,
    Tremaux,
}

impl AgentKind {
    pub const ALL: [AgentKind; 5] = [
        AgentKind::Floodfill,
        AgentKind::ModifiedFloodfill,
        AgentKind::LeftWallFollower,
        AgentKind::RightWallFollower,
        AgentKind::Tremaux,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AgentKind::Floodfill => "floodfill",
            AgentKind::ModifiedFloodfill => "modified-floodfill",
            AgentKind::LeftWallFollower => "left-wall-follower",
            AgentKind::RightWallFollower => "right-wall-follower",
            AgentKind::Tremaux => "tremaux",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        let wanted = name.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|k| k.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownAgent(name.to_string()))
    }

    pub fn build(self) -> Box<dyn Agent> {
        match self {
            AgentKind::Floodfill => Box::new(Floodfill::new()),
            AgentKind::ModifiedFloodfill => Box::new(ModifiedFloodfill::new()),
            AgentKind::LeftWallFollower => Box::new(WallFollower::new(WallSide::Left)),
            AgentKind::RightWallFollower => Box::new(WallFollower::new(WallSide::Right)),
            AgentKind::Tremaux => Box::new(Tremaux::new()),
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AgentKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

/// Which cells a flood-fill agent is currently heading for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Goal {
    Center,
    Start,
}

impl Goal {
    pub fn contains(self, size: MazeSize, cell: MazeCell) -> bool {
        match self {
            Goal::Center => size.is_center(cell),
            Goal::Start => size.is_start(cell),
        }
    }

    pub fn cells(self, size: MazeSize) -> Vec<MazeCell> {
        match self {
            Goal::Center => size.center_cells(),
            Goal::Start => vec![size.start_cell()],
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Goal::Center => Goal::Start,
            Goal::Start => Goal::Center,
        }
    }
}

/// Private map of an agent: believed walls plus which cells have been sensed.
///
/// Starts optimistic (only the boundary and the start cell's East wall) and
/// only ever gains walls until purged.
#[derive(Debug, Clone)]
pub(crate) struct Knowledge {
    walls: MazeWallStore,
    explored: Grid<bool>,
    sealed: bool,
}

impl Knowledge {
    pub(crate) fn new(size: MazeSize) -> Self {
        Self {
            walls: MazeWallStore::new(size),
            explored: Grid::new(size, false),
            sealed: false,
        }
    }

    pub(crate) fn size(&self) -> MazeSize {
        self.walls.size()
    }

    pub(crate) fn walls(&self) -> &MazeWallStore {
        &self.walls
    }

    pub(crate) fn explored(&self) -> &Grid<bool> {
        &self.explored
    }

    pub(crate) fn is_explored(&self, cell: MazeCell) -> bool {
        self.explored.get(cell).copied().unwrap_or(false)
    }

    pub(crate) fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Read all four walls of the robot's cell and mark it explored.
    /// Returns the directions found walled.
    pub(crate) fn sense(&mut self, sensors: &dyn Sensors) -> DirectionSet {
        let here = sensors.location();
        let mut found = DirectionSet::EMPTY;
        for dir in Direction::CARDINALS {
            if sensors.is_wall(dir) {
                self.walls.set_wall(here, dir);
                found.insert(dir);
            }
        }
        self.explored.set(here, true);
        found
    }

    /// Close every outer edge of the center block except the one the robot
    /// came in through.
    pub(crate) fn seal_center(&mut self, entry: Option<(MazeCell, Direction)>) {
        for (cell, dir) in self.size().center_outer_edges() {
            if entry == Some((cell, dir)) {
                continue;
            }
            self.walls.set_wall(cell, dir);
        }
        self.sealed = true;
    }

    /// Drop every belief and start over from what can be sensed right here.
    pub(crate) fn purge(&mut self, sensors: &dyn Sensors) -> DirectionSet {
        self.walls.clear_maze();
        self.explored.fill(false);
        self.sealed = false;
        self.sense(sensors)
    }
}

/// Neighbor expansion order of the breadth-first flood.
const FLOOD_ORDER: [Direction; 4] = [
    Direction::North,
    Direction::South,
    Direction::West,
    Direction::East,
];

/// Candidate order when choosing a move: straight ahead first, then these.
pub(crate) const SELECTION_ORDER: [Direction; 4] = [
    Direction::North,
    Direction::East,
    Direction::West,
    Direction::South,
];

pub(crate) fn selection_order(facing: Direction) -> impl Iterator<Item = Direction> {
    std::iter::once(facing).chain(SELECTION_ORDER.into_iter().filter(move |d| *d != facing))
}

/// Breadth-first distances to `goal` over edges open in `knowledge`.
///
/// With `explored_only`, the flood never enters unexplored cells (goal cells
/// still seed it). When `directions` is given it receives, for every reached
/// cell, the set of directions that lead one step closer (ties kept).
pub(crate) fn flood_fill(
    knowledge: &Knowledge,
    goal: Goal,
    explored_only: bool,
    distance: &mut Grid<u32>,
    mut directions: Option<&mut Grid<DirectionSet>>,
) {
    let size = knowledge.size();
    distance.fill(UNREACHABLE);
    if let Some(dirs) = directions.as_deref_mut() {
        dirs.fill(DirectionSet::EMPTY);
    }

    let mut queue = VecDeque::with_capacity(size.cell_count());
    for cell in goal.cells(size) {
        distance[cell] = 0;
        queue.push_back(cell);
    }

    while let Some(cell) = queue.pop_front() {
        let next = distance[cell].saturating_add(1);
        for dir in FLOOD_ORDER {
            if knowledge.walls.has_wall(cell, dir) {
                continue;
            }
            let Some(n) = size.neighbor(cell, dir) else {
                continue;
            };
            if explored_only && !knowledge.is_explored(n) {
                continue;
            }
            if next < distance[n] {
                distance[n] = next;
                if let Some(dirs) = directions.as_deref_mut() {
                    dirs[n] = DirectionSet::only(dir.opposite());
                }
                queue.push_back(n);
            } else if next == distance[n] {
                if let Some(dirs) = directions.as_deref_mut() {
                    dirs[n].insert(dir.opposite());
                }
            }
        }
    }
}

/// Turn an absolute heading into the first action, queueing the follow-up
/// move for sideways headings.
pub(crate) fn steer(
    facing: Direction,
    heading: Direction,
    queued: &mut Option<RobotStep>,
) -> RobotStep {
    if heading == facing.left() {
        *queued = Some(RobotStep::MoveForward);
        RobotStep::RotateLeft
    } else if heading == facing.right() {
        *queued = Some(RobotStep::MoveForward);
        RobotStep::RotateRight
    } else if heading == facing.opposite() {
        RobotStep::MoveBackward
    } else {
        RobotStep::MoveForward
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::pose::{PoseSensors, RobotPose};

    /// Drive `agent` on `maze` until `done` says stop or `limit` steps pass.
    /// Panics on a crash or when a move crosses a wall the agent believes in.
    pub(crate) fn drive(
        agent: &mut dyn Agent,
        maze: &MazeWallStore,
        pose: &mut RobotPose,
        limit: usize,
        mut done: impl FnMut(&RobotPose) -> bool,
    ) -> usize {
        for n in 0..limit {
            if done(pose) {
                return n;
            }
            let step = agent.next_step(&PoseSensors::new(maze, pose));
            let heading = match step {
                RobotStep::MoveForward => Some(pose.facing()),
                RobotStep::MoveBackward => Some(pose.facing().opposite()),
                _ => None,
            };
            if let (Some(dir), Some(known)) = (heading, agent.known_walls()) {
                assert!(
                    !known.has_wall(pose.location(), dir),
                    "{} moved through a known wall at {} {dir}",
                    agent.name(),
                    pose.location()
                );
            }
            if let Err(crash) = pose.take_step(maze, step) {
                panic!("{} {crash}", agent.name());
            }
        }
        limit
    }

    pub(crate) fn start(agent: &mut dyn Agent, maze: &MazeWallStore) -> RobotPose {
        let pose = RobotPose::at_start(maze.size());
        agent.initialize(&PoseSensors::new(maze, &pose));
        pose
    }
}
