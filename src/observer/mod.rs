#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::controller::RobotController;
use crate::error::Crash;
use crate::geometry::{Direction, MazeCell};

/// A read-only snapshot of what a controller and its agent are doing.
///
/// Design intent:
/// - Observers cannot mutate or steer the run.
/// - Snapshotting is on-demand and allocates; stepping is unaffected.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ControllerSnapshot {
    pub agent: String,
    pub location: MazeCell,
    pub facing: Direction,
    pub step_count: u64,
    pub max_steps: u64,
    pub move_count: u64,
    pub turn_count: u64,
    pub crash: Option<Crash>,
    pub turbo: bool,
    pub done: bool,
    pub unsolved: bool,
    pub first_run_len: usize,
    pub best_run_len: usize,
    pub visited_cells: usize,

    /// Agent state per cell, one inner `Vec` per maze row (top first).
    /// Empty for agents without internal grids.
    pub understanding: Vec<Vec<String>>,
}

pub struct ControllerAdapter<'a> {
    controller: &'a RobotController,
}

impl<'a> ControllerAdapter<'a> {
    pub fn new(controller: &'a RobotController) -> Self {
        Self { controller }
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        let c = self.controller;
        let pose = c.pose();
        let agent = c.agent();

        ControllerSnapshot {
            agent: agent.name().to_string(),
            location: pose.location(),
            facing: pose.facing(),
            step_count: c.step_count(),
            max_steps: c.max_steps(),
            move_count: c.move_count(),
            turn_count: c.turn_count(),
            crash: c.crash(),
            turbo: agent.is_turbo_mode(),
            done: c.is_done(),
            unsolved: c.is_unsolved(),
            first_run_len: pose.first_run().len(),
            best_run_len: pose.best_run().len(),
            visited_cells: pose.visited_count(),
            understanding: self.understanding_rows(),
        }
    }

    fn understanding_rows(&self) -> Vec<Vec<String>> {
        let size = self.controller.maze().size();
        let view = self.controller.agent().understanding();
        let mut rows = Vec::new();
        for y in 1..=size.height() {
            let row: Option<Vec<String>> = (1..=size.width())
                .map(|x| MazeCell::new(x, y).ok().and_then(|c| view.render_cell(c)))
                .collect();
            match row {
                Some(row) => rows.push(row),
                None => return Vec::new(),
            }
        }
        rows
    }

    /// The maze drawing with the robot's arrow in its cell.
    pub fn render(&self) -> String {
        let c = self.controller;
        let pose = c.pose();
        let text = c.maze().to_string();
        let size = c.maze().size();

        // Cell (x, y) is drawn on text line 2y-1, columns 4x-3..4x-1.
        let (x, y) = (pose.location().x() as usize, pose.location().y() as usize);
        let line = 2 * y - 1;
        let col = 4 * x - 2;
        text.lines()
            .enumerate()
            .map(|(i, l)| {
                if i == line && size.contains(pose.location()) {
                    let mut chars: Vec<char> = l.chars().collect();
                    if col < chars.len() {
                        chars[col] = pose.facing().arrow();
                    }
                    chars.into_iter().collect::<String>()
                } else {
                    l.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
