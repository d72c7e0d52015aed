//! # micromouse
//!
//! A micromouse maze simulator: a wall model of a rectangular maze, a robot
//! that turns and moves one cell at a time, a set of maze-solving agents,
//! and a scorer that measures how quickly an agent learns the maze.
//!
//! ## Quick Start
//!
//! ```
//! use micromouse::prelude::*;
//!
//! let config = SimConfig::default().with_seed(7).with_agent(AgentKind::Floodfill);
//! let mut controller = RobotController::from_config(&config).unwrap();
//!
//! let report = StatTracker::new().run(&mut controller);
//! assert_eq!(report.outcome, StatOutcome::Completed);
//! ```
//!
//! ## Coordinates
//!
//! Cells are 1-based `(x, y)` with `(1, 1)` in the upper-left corner; North
//! points toward smaller `y`. The robot starts in the lower-left cell
//! `(1, height)` facing North, and the goal is the 2x2 block in the middle.
//!
//! ## Feature Flags
//!
//! - `serde` (default): Serialization of configs, reports and snapshots
//! - `parallel`: Run sweeps on a rayon thread pool
//!
//! ## Modules
//!
//! - [`maze`]: Wall store, legality rules and text rendering
//! - [`generator`]: Seeded maze carving
//! - [`pose`]: Robot movement and sensors
//! - [`agents`]: Flood fill, modified flood fill, wall followers, Trémaux
//! - [`controller`]: Runs one agent against one maze
//! - [`stats`]: Scoring and sweeps
//! - [`observer`]: Read-only observation adapters

#[path = "core/error.rs"]
pub mod error;

#[path = "core/geometry.rs"]
pub mod geometry;

#[path = "core/grid.rs"]
pub mod grid;

#[path = "core/maze.rs"]
pub mod maze;

#[path = "core/prng.rs"]
pub mod prng;

#[path = "core/generator.rs"]
pub mod generator;

#[path = "core/pose.rs"]
pub mod pose;

#[path = "core/config.rs"]
pub mod config;

#[path = "core/controller.rs"]
pub mod controller;

#[path = "core/stats.rs"]
pub mod stats;

pub mod agents;
pub mod observer;

pub mod prelude {
    pub use crate::agents::{
        Agent, AgentKind, Floodfill, Goal, ModifiedFloodfill, Tremaux, Understanding,
        WallFollower, WallSide, UNREACHABLE,
    };
    pub use crate::config::SimConfig;
    pub use crate::controller::{RobotController, StepOutcome};
    pub use crate::error::{ConfigError, Crash, MazeError};
    pub use crate::generator::generate_maze;
    pub use crate::geometry::{Direction, DirectionSet, MazeCell, MazeSize};
    pub use crate::grid::Grid;
    pub use crate::maze::MazeWallStore;
    pub use crate::observer::{ControllerAdapter, ControllerSnapshot};
    pub use crate::pose::{PoseSensors, RobotPose, RobotStep, RunState, Sensors, StepKind};
    pub use crate::stats::{sweep, RunStats, StatOutcome, StatReport, StatTracker, SweepResult};
}
