//! Criterion benchmarks for maze generation and the solving agents.
//!
//! Run with:
//!   cargo bench
//!   cargo bench --features parallel
//!
//! Results are saved to target/criterion/

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use micromouse::prelude::*;

fn config(size: u32, agent: AgentKind) -> SimConfig {
    SimConfig::default()
        .with_size(size, size)
        .with_seed(42)
        .with_extra_openings(size)
        .with_agent(agent)
        .with_max_steps(200_000)
}

/// Benchmark maze carving at different sizes.
fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");

    for size in [8u32, 16, 32, 64].iter() {
        let maze_size = MazeSize::new(*size, *size).unwrap();
        group.throughput(Throughput::Elements(maze_size.cell_count() as u64));
        group.bench_with_input(BenchmarkId::new("dfs", size), size, |b, &size| {
            let mut seed = 0u64;
            b.iter(|| {
                seed += 1;
                let maze = generate_maze(maze_size, seed, size).unwrap();
                black_box(maze.is_legal())
            });
        });
    }

    group.finish();
}

/// Benchmark a full scoring run per agent on the classic maze.
fn bench_stat_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("stat_run");
    group.sample_size(20);

    for kind in AgentKind::ALL {
        group.bench_function(kind.name(), |b| {
            let cfg = config(16, kind);
            b.iter(|| {
                let mut controller = RobotController::from_config(&cfg).unwrap();
                black_box(StatTracker::new().run(&mut controller))
            });
        });
    }

    group.finish();
}

/// Benchmark the first run to the center for the flood-fill family.
fn bench_first_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("first_run");
    group.sample_size(20);

    for kind in [AgentKind::Floodfill, AgentKind::ModifiedFloodfill] {
        for size in [16u32, 32, 64].iter() {
            group.bench_with_input(BenchmarkId::new(kind.name(), size), size, |b, &size| {
                let cfg = config(size, kind);
                b.iter(|| {
                    let mut controller = RobotController::from_config(&cfg).unwrap();
                    while !controller.is_done() && !controller.is_at_center() {
                        controller.next_step();
                    }
                    black_box(controller.step_count())
                });
            });
        }
    }

    group.finish();
}

/// Benchmark a sweep of seeds (parallel when the feature is enabled).
fn bench_sweep(c: &mut Criterion) {
    let configs: Vec<SimConfig> = (0..32)
        .map(|seed| config(16, AgentKind::Floodfill).with_seed(seed))
        .collect();
    c.bench_function("sweep_32", |b| b.iter(|| black_box(sweep(&configs).len())));
}

criterion_group!(
    benches,
    bench_generate,
    bench_stat_run,
    bench_first_run,
    bench_sweep
);
criterion_main!(benches);
