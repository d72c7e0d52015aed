use thiserror::Error;

use crate::geometry::{Direction, MazeCell};

/// Geometry errors. These are rejected eagerly at construction time; wall
/// queries themselves never fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MazeError {
    #[error("illegal cell ({x}, {y}): coordinates are 1-based")]
    IllegalGeometry { x: u32, y: u32 },

    #[error("illegal maze dimensions {width}x{height} (each side must be in {min}..={max})")]
    IllegalDimensions {
        width: u32,
        height: u32,
        min: u32,
        max: u32,
    },
}

/// The robot was commanded to move through a wall.
///
/// Terminal for the current run; the controller keeps it for inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[error("robot crashed into the {direction} wall of {cell}")]
pub struct Crash {
    pub cell: MazeCell,
    pub direction: Direction,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Invalid(&'static str),

    #[error(transparent)]
    Geometry(#[from] MazeError),

    #[error("unknown agent '{0}'")]
    UnknownAgent(String),

    #[cfg(feature = "serde")]
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}
