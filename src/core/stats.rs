#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::controller::RobotController;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum StatOutcome {
    /// The step ceiling ran out before the center was reached.
    CenterNotFound,
    /// The robot hit a wall before reaching the center.
    Crashed,
    /// At least one run to the center was measured.
    Completed,
}

/// Moves ("cells") and turns of one measured leg or aggregate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunStats {
    pub cells: u64,
    pub turns: u64,
}

impl RunStats {
    pub fn steps(&self) -> u64 {
        self.cells + self.turns
    }
}

impl core::ops::Add for RunStats {
    type Output = RunStats;

    fn add(self, rhs: RunStats) -> RunStats {
        RunStats {
            cells: self.cells + rhs.cells,
            turns: self.turns + rhs.turns,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StatReport {
    pub outcome: StatOutcome,
    /// Start-to-center leg of the first cycle.
    pub first: Option<RunStats>,
    /// Shortest start-to-center leg measured.
    pub best: Option<RunStats>,
    /// Everything driven before the cycle that produced `best`, plus that
    /// cycle's start-to-center leg.
    pub through_best: Option<RunStats>,
    /// Everything driven during the whole measurement.
    pub total: RunStats,
    pub unique_cells: usize,
    pub cycles: u32,
}

/// One start -> center -> start round trip.
#[derive(Debug, Clone, Copy)]
struct Cycle {
    leg: RunStats,
    total: RunStats,
    reached_center: bool,
    returned: bool,
}

/// Measures an agent the way competitions score a mouse: keep doing round
/// trips while the start-to-center leg keeps getting shorter.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatTracker;

impl StatTracker {
    pub fn new() -> Self {
        Self
    }

    pub fn run(&self, controller: &mut RobotController) -> StatReport {
        controller.initialize();
        let first = Self::cycle(controller);
        let mut cycles = 1;

        if !first.reached_center {
            let outcome = if controller.crash().is_some() {
                StatOutcome::Crashed
            } else {
                StatOutcome::CenterNotFound
            };
            return Self::report(controller, outcome, None, None, None, cycles);
        }
        if !first.returned {
            return Self::report(
                controller,
                StatOutcome::Completed,
                Some(first.leg),
                Some(first.leg),
                Some(first.leg),
                cycles,
            );
        }

        let mut best = first;
        let mut driven = first.total;
        let mut through_best = first.leg;
        loop {
            let next = Self::cycle(controller);
            cycles += 1;
            let before = driven;
            driven = driven + next.total;
            if !next.returned || next.leg.cells >= best.leg.cells {
                break;
            }
            best = next;
            through_best = before + next.leg;
        }

        Self::report(
            controller,
            StatOutcome::Completed,
            Some(first.leg),
            Some(best.leg),
            Some(through_best),
            cycles,
        )
    }

    fn cycle(controller: &mut RobotController) -> Cycle {
        let at_begin = Self::counters(controller);
        while !controller.is_done() && !controller.is_at_center() {
            controller.next_step();
        }
        let at_center = Self::counters(controller);
        let leg = Self::delta(at_begin, at_center);
        if !controller.is_at_center() {
            return Cycle {
                leg,
                total: leg,
                reached_center: false,
                returned: false,
            };
        }

        while !controller.is_done() && !controller.is_at_start() {
            controller.next_step();
        }
        Cycle {
            leg,
            total: Self::delta(at_begin, Self::counters(controller)),
            reached_center: true,
            returned: controller.is_at_start(),
        }
    }

    fn counters(controller: &RobotController) -> RunStats {
        RunStats {
            cells: controller.move_count(),
            turns: controller.turn_count(),
        }
    }

    fn delta(from: RunStats, to: RunStats) -> RunStats {
        RunStats {
            cells: to.cells - from.cells,
            turns: to.turns - from.turns,
        }
    }

    fn report(
        controller: &RobotController,
        outcome: StatOutcome,
        first: Option<RunStats>,
        best: Option<RunStats>,
        through_best: Option<RunStats>,
        cycles: u32,
    ) -> StatReport {
        let report = StatReport {
            outcome,
            first,
            best,
            through_best,
            total: Self::counters(controller),
            unique_cells: controller.pose().visited_count(),
            cycles,
        };
        tracing::info!(
            agent = controller.agent().name(),
            outcome = ?report.outcome,
            best_cells = report.best.map(|b| b.cells),
            cycles,
            "stat run finished"
        );
        report
    }
}

/// One row of a sweep.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SweepResult {
    pub config: SimConfig,
    pub report: Option<StatReport>,
    pub error: Option<String>,
}

fn run_config(config: &SimConfig) -> SweepResult {
    match RobotController::from_config(config) {
        Ok(mut controller) => SweepResult {
            config: config.clone(),
            report: Some(StatTracker::new().run(&mut controller)),
            error: None,
        },
        Err(e) => SweepResult {
            config: config.clone(),
            report: None,
            error: Some(e.to_string()),
        },
    }
}

/// Run a StatTracker for every config. Results keep the input order.
pub fn sweep(configs: &[SimConfig]) -> Vec<SweepResult> {
    #[cfg(feature = "parallel")]
    {
        configs.par_iter().map(run_config).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        configs.iter().map(run_config).collect()
    }
}
