use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::geometry::{Direction, DirectionSet, MazeCell, MazeSize};
use crate::grid::Grid;
use crate::maze::MazeWallStore;
use crate::pose::{RobotStep, Sensors};

use super::floodfill::FloodCore;
use super::{selection_order, Agent, Goal, Understanding, UNREACHABLE};

/// Flood fill that keeps, per cell, the set of directions leading one step
/// closer to the goal. Newly sensed walls prune those sets, and a broken
/// route is fixed by a local repair around the robot instead of a full
/// re-flood.
#[derive(Debug, Clone)]
pub struct ModifiedFloodfill {
    core: FloodCore,
    directions: Grid<DirectionSet>,
    stale: bool,
}

impl ModifiedFloodfill {
    pub fn new() -> Self {
        let size = MazeSize::default();
        Self {
            core: FloodCore::new(size),
            directions: Grid::new(size, DirectionSet::EMPTY),
            stale: true,
        }
    }

    pub fn distances(&self) -> &Grid<u32> {
        &self.core.distance
    }

    pub fn directions(&self) -> &Grid<DirectionSet> {
        &self.directions
    }

    pub fn goal(&self) -> Goal {
        self.core.goal
    }

    fn full_flood(&mut self, sensors: &dyn Sensors) {
        self.core
            .flood_with_purge(sensors, Some(&mut self.directions));
        self.stale = false;
    }

    /// A sensed wall invalidates the matching direction on both of its sides.
    fn prune(&mut self, here: MazeCell, walls: DirectionSet) {
        let size = self.directions.size();
        for dir in walls.iter() {
            self.directions[here].remove(dir);
            if let Some(n) = size.neighbor(here, dir) {
                self.directions[n].remove(dir.opposite());
            }
        }
    }

    fn select(&self, sensors: &dyn Sensors) -> Option<Direction> {
        let here = sensors.location();
        let current = self.core.distance[here];
        let allowed = self.directions[here];
        selection_order(sensors.facing()).find(|dir| {
            allowed.contains(*dir)
                && self
                    .core
                    .is_open(here, *dir)
                    .is_some_and(|n| self.core.distance[n] < current)
        })
    }

    /// Rebuild distances around `here` after its route broke.
    ///
    /// The damaged region grows from `here` through every neighbor whose only
    /// way forward leads into the region; neighbors with alternatives just
    /// drop that direction. Region cells are then re-derived from the
    /// undamaged cells around them, nearest first, until `here` is settled.
    /// Returns false when nothing outside the region reaches `here`.
    fn repair(&mut self, here: MazeCell) -> bool {
        let size = self.core.knowledge.size();
        let goal = self.core.goal;
        let mut in_region = Grid::new(size, false);
        let mut region = Vec::new();
        let mut stack = vec![here];
        in_region[here] = true;

        while let Some(cell) = stack.pop() {
            region.push(cell);
            for dir in Direction::CARDINALS {
                let Some(n) = self.core.is_open(cell, dir) else {
                    continue;
                };
                if in_region[n] || goal.contains(size, n) {
                    continue;
                }
                let back = dir.opposite();
                if self.directions[n].is_only(back) {
                    in_region[n] = true;
                    stack.push(n);
                } else {
                    self.directions[n].remove(back);
                }
            }
        }

        for cell in &region {
            self.core.distance[*cell] = UNREACHABLE;
            self.directions[*cell] = DirectionSet::EMPTY;
        }

        let mut frontier = BinaryHeap::new();
        for cell in &region {
            for dir in Direction::CARDINALS {
                let Some(n) = self.core.is_open(*cell, dir) else {
                    continue;
                };
                if in_region[n] || self.core.distance[n] == UNREACHABLE {
                    continue;
                }
                self.relax(*cell, dir, self.core.distance[n] + 1);
            }
            let d = self.core.distance[*cell];
            if d != UNREACHABLE {
                frontier.push(Reverse((d, *cell)));
            }
        }

        while let Some(Reverse((d, cell))) = frontier.pop() {
            if d > self.core.distance[cell] {
                continue;
            }
            if cell == here {
                tracing::trace!(cell = %here, cells = region.len(), "route repaired");
                return true;
            }
            for dir in Direction::CARDINALS {
                let Some(n) = self.core.is_open(cell, dir) else {
                    continue;
                };
                if !in_region[n] {
                    continue;
                }
                if self.relax(n, dir.opposite(), d + 1) {
                    frontier.push(Reverse((d + 1, n)));
                }
            }
        }
        false
    }

    /// Offer `cell` a route of length `d` leaving through `dir`. Returns true
    /// when it is strictly better than what the cell had.
    fn relax(&mut self, cell: MazeCell, dir: Direction, d: u32) -> bool {
        let current = self.core.distance[cell];
        if d < current {
            self.core.distance[cell] = d;
            self.directions[cell] = DirectionSet::only(dir);
            true
        } else {
            if d == current {
                self.directions[cell].insert(dir);
            }
            false
        }
    }
}

impl Default for ModifiedFloodfill {
    fn default() -> Self {
        Self::new()
    }
}

impl Agent for ModifiedFloodfill {
    fn name(&self) -> &'static str {
        "modified-floodfill"
    }

    fn initialize(&mut self, sensors: &dyn Sensors) {
        self.core.reset(sensors);
        self.directions = Grid::new(sensors.maze_size(), DirectionSet::EMPTY);
        self.stale = true;
    }

    fn next_step(&mut self, sensors: &dyn Sensors) -> RobotStep {
        if let Some(step) = self.core.begin(sensors) {
            return step;
        }
        let here = sensors.location();
        if let Some(walls) = self.core.sense_if_new(sensors) {
            self.prune(here, walls);
        }
        if self.core.handle_goal(here) || self.stale {
            self.full_flood(sensors);
        }

        if let Some(dir) = self.select(sensors) {
            return self.core.commit(sensors, dir);
        }

        let repaired = !self.core.speed_mode() && self.repair(here);
        if !repaired {
            self.full_flood(sensors);
        }
        if let Some(dir) = self.select(sensors) {
            return self.core.commit(sensors, dir);
        }

        self.full_flood(sensors);
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
