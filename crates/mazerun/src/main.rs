//! mazerun: command-line front end for the micromouse simulator.
//!
//! Examples:
//!   mazerun show --size 8x8 --seed 3
//!   mazerun run --agent modified-floodfill --seed 42
//!   mazerun stats --agent tremaux --openings 20 --json
//!   mazerun sweep 100 --agent left-wall-follower
//!   mazerun agents
//!
//! Set `RUST_LOG=micromouse=debug` to watch the agents think.

use std::process;

use micromouse::prelude::*;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
enum RunnerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Maze(#[from] MazeError),
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Usage(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Show,
    Run,
    Stats,
    Sweep(u64),
    Agents,
}

/// Command-line settings applied on top of the config file (or defaults).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct Overrides {
    agent: Option<AgentKind>,
    size: Option<(u32, u32)>,
    seed: Option<u64>,
    openings: Option<u32>,
    speed_run: bool,
    max_steps: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Options {
    command: Command,
    config_path: Option<String>,
    overrides: Overrides,
    json: bool,
}

fn usage() -> ! {
    eprintln!("mazerun (micromouse maze simulator)");
    eprintln!("Usage: mazerun [options] <command>\n");
    eprintln!("Commands:");
    eprintln!("  show                 Print the generated maze");
    eprintln!("  run                  Drive one run from start to center");
    eprintln!("  stats                Score the agent with round trips");
    eprintln!("  sweep <count>        Score the agent on <count> consecutive seeds");
    eprintln!("  agents               List agent names\n");
    eprintln!("Options:");
    eprintln!("  --config <file>      Load a JSON SimConfig first");
    eprintln!("  --agent <name>       Agent to drive the robot");
    eprintln!("  --size <W>x<H>       Maze dimensions (4..=64)");
    eprintln!("  --seed <n>           Generator seed");
    eprintln!("  --openings <n>       Extra interior walls removed after carving");
    eprintln!("  --speed-run          Plan over explored cells after the first arrival");
    eprintln!("  --max-steps <n>      Step ceiling per controller run");
    eprintln!("  --json               Machine-readable output");
    process::exit(1);
}

fn parse_size(text: &str) -> Result<(u32, u32), RunnerError> {
    let bad = || RunnerError::Usage(format!("size must look like 16x16, got '{text}'"));
    let (w, h) = text.split_once(['x', 'X']).ok_or_else(bad)?;
    let w = w.trim().parse().map_err(|_| bad())?;
    let h = h.trim().parse().map_err(|_| bad())?;
    Ok((w, h))
}

fn parse_number<T: std::str::FromStr>(flag: &str, text: &str) -> Result<T, RunnerError> {
    text.parse()
        .map_err(|_| RunnerError::Usage(format!("{flag} must be a number, got '{text}'")))
}

fn parse_args(args: &[String]) -> Result<Options, RunnerError> {
    let mut positional = Vec::new();
    let mut config_path = None;
    let mut overrides = Overrides::default();
    let mut json = false;

    let mut rest = args.iter();
    while let Some(arg) = rest.next() {
        if !arg.starts_with("--") {
            positional.push(arg.as_str());
            continue;
        }
        let mut value = || {
            rest.next()
                .ok_or_else(|| RunnerError::Usage(format!("{arg} needs a value")))
        };
        match arg.as_str() {
            "--config" => config_path = Some(value()?.clone()),
            "--agent" => overrides.agent = Some(value()?.parse()?),
            "--size" => overrides.size = Some(parse_size(value()?)?),
            "--seed" => overrides.seed = Some(parse_number(arg, value()?)?),
            "--openings" => overrides.openings = Some(parse_number(arg, value()?)?),
            "--max-steps" => overrides.max_steps = Some(parse_number(arg, value()?)?),
            "--speed-run" => overrides.speed_run = true,
            "--json" => json = true,
            other => return Err(RunnerError::Usage(format!("unknown option '{other}'"))),
        }
    }

    let (cmd, extra) = positional
        .split_first()
        .ok_or_else(|| RunnerError::Usage("missing command".into()))?;
    let command = match (*cmd, extra) {
        ("show", []) => Command::Show,
        ("run", []) => Command::Run,
        ("stats", []) => Command::Stats,
        ("agents", []) => Command::Agents,
        ("sweep", []) => return Err(RunnerError::Usage("sweep needs a seed count".into())),
        ("sweep", [count]) => Command::Sweep(parse_number("count", count)?),
        ("show" | "run" | "stats" | "agents" | "sweep", [.., last]) => {
            return Err(RunnerError::Usage(format!("unexpected argument '{last}'")))
        }
        (other, _) => return Err(RunnerError::Usage(format!("unknown command '{other}'"))),
    };

    Ok(Options {
        command,
        config_path,
        overrides,
        json,
    })
}

impl Overrides {
    fn apply(&self, mut config: SimConfig) -> SimConfig {
        if let Some(agent) = self.agent {
            config = config.with_agent(agent);
        }
        if let Some((w, h)) = self.size {
            config = config.with_size(w, h);
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if let Some(openings) = self.openings {
            config = config.with_extra_openings(openings);
        }
        if let Some(max_steps) = self.max_steps {
            config = config.with_max_steps(max_steps);
        }
        if self.speed_run {
            config = config.with_speed_run(true);
        }
        config
    }
}

fn load_config(options: &Options) -> Result<SimConfig, RunnerError> {
    let base = match &options.config_path {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            SimConfig::from_json_str(&text)?
        }
        None => SimConfig::default(),
    };
    let config = options.overrides.apply(base);
    config.validate()?;
    Ok(config)
}

fn show(config: &SimConfig, json: bool) -> Result<(), RunnerError> {
    let maze = generate_maze(config.size()?, config.seed, config.extra_openings)?;
    if json {
        let rows: Vec<Vec<u8>> = (1..=maze.size().height())
            .map(|y| {
                (1..=maze.size().width())
                    .map(|x| MazeCell::new(x, y).map(|c| maze.walls(c).bits()))
                    .collect::<Result<_, _>>()
            })
            .collect::<Result<_, _>>()?;
        println!("{}", serde_json::to_string(&rows)?);
    } else {
        println!("{maze}");
        println!("{} seed {} legal: {}", maze.size(), config.seed, maze.is_legal());
    }
    Ok(())
}

fn run(config: &SimConfig, json: bool) -> Result<(), RunnerError> {
    let mut controller = RobotController::from_config(config)?;
    while !controller.is_done() && !controller.is_at_center() {
        controller.next_step();
    }

    let adapter = ControllerAdapter::new(&controller);
    if json {
        println!("{}", serde_json::to_string_pretty(&adapter.snapshot())?);
        return Ok(());
    }

    println!("{}", adapter.render());
    let snap = adapter.snapshot();
    match (snap.crash, controller.is_at_center()) {
        (Some(crash), _) => println!("{}: {crash}", snap.agent),
        (None, true) => println!(
            "{}: reached {} in {} steps ({} moves, {} turns)",
            snap.agent, snap.location, snap.step_count, snap.move_count, snap.turn_count
        ),
        (None, false) => println!(
            "{}: gave up after {}/{} steps at {}",
            snap.agent, snap.step_count, snap.max_steps, snap.location
        ),
    }
    Ok(())
}

fn print_report(report: &StatReport) {
    let fmt = |stats: Option<RunStats>| match stats {
        Some(s) => format!("{} cells + {} turns", s.cells, s.turns),
        None => "-".to_string(),
    };
    println!("outcome       {:?}", report.outcome);
    println!("first run     {}", fmt(report.first));
    println!("best run      {}", fmt(report.best));
    println!("through best  {}", fmt(report.through_best));
    println!("total         {}", fmt(Some(report.total)));
    println!("unique cells  {}", report.unique_cells);
    println!("cycles        {}", report.cycles);
}

fn stats(config: &SimConfig, json: bool) -> Result<(), RunnerError> {
    let mut controller = RobotController::from_config(config)?;
    let report = StatTracker::new().run(&mut controller);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{} on {} seed {}", config.agent, config.size()?, config.seed);
        print_report(&report);
    }
    Ok(())
}

fn run_sweep(config: &SimConfig, count: u64, json: bool) -> Result<(), RunnerError> {
    let configs: Vec<SimConfig> = (0..count)
        .map(|i| config.clone().with_seed(config.seed.wrapping_add(i)))
        .collect();
    let results = sweep(&configs);
    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    let mut solved = 0u64;
    let mut best_cells = 0u64;
    for result in &results {
        let seed = result.config.seed;
        match (&result.report, &result.error) {
            (Some(report), _) => {
                let best = report.best.map(|b| b.cells);
                if let Some(cells) = best {
                    solved += 1;
                    best_cells += cells;
                }
                println!(
                    "seed {seed:>6}  {:<16} best {:>5}  total {:>7}",
                    format!("{:?}", report.outcome),
                    best.map_or("-".to_string(), |c| c.to_string()),
                    report.total.steps()
                );
            }
            (None, Some(error)) => println!("seed {seed:>6}  error: {error}"),
            (None, None) => {}
        }
    }
    if solved > 0 {
        println!(
            "{} solved {solved}/{count}, mean best run {:.1} cells",
            config.agent,
            best_cells as f64 / solved as f64
        );
    } else {
        println!("{} solved 0/{count}", config.agent);
    }
    Ok(())
}

fn execute(options: &Options) -> Result<(), RunnerError> {
    if options.command == Command::Agents {
        for kind in AgentKind::ALL {
            println!("{kind}");
        }
        return Ok(());
    }

    let config = load_config(options)?;
    tracing::debug!(?config, "loaded config");
    match options.command {
        Command::Show => show(&config, options.json),
        Command::Run => run(&config, options.json),
        Command::Stats => stats(&config, options.json),
        Command::Sweep(count) => run_sweep(&config, count, options.json),
        Command::Agents => Ok(()),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(RunnerError::Usage(msg)) => {
            eprintln!("{msg}\n");
            usage();
        }
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    if let Err(e) = execute(&options) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(text: &str) -> Vec<String> {
        text.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn parses_flags_in_any_order() {
        let options = parse_args(&args("stats --json --seed 9 --agent tremaux --size 8x10")).unwrap();
        assert_eq!(options.command, Command::Stats);
        assert!(options.json);
        assert_eq!(options.overrides.seed, Some(9));
        assert_eq!(options.overrides.agent, Some(AgentKind::Tremaux));
        assert_eq!(options.overrides.size, Some((8, 10)));
    }

    #[test]
    fn options_may_precede_the_command() {
        let options = parse_args(&args("--agent left-wall-follower --size 6x6 show")).unwrap();
        assert_eq!(options.command, Command::Show);
        assert_eq!(options.overrides.agent, Some(AgentKind::LeftWallFollower));
        assert!(parse_args(&args("run stats")).is_err());
    }

    #[test]
    fn sweep_takes_a_count() {
        let options = parse_args(&args("sweep 25 --speed-run")).unwrap();
        assert_eq!(options.command, Command::Sweep(25));
        assert!(options.overrides.speed_run);
        assert!(parse_args(&args("sweep")).is_err());
        assert!(parse_args(&args("sweep many")).is_err());
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_args(&[]).is_err());
        assert!(parse_args(&args("fly")).is_err());
        assert!(parse_args(&args("run --size 16")).is_err());
        assert!(parse_args(&args("run --seed")).is_err());
        assert!(matches!(
            parse_args(&args("run --agent random-walk")),
            Err(RunnerError::Config(ConfigError::UnknownAgent(_)))
        ));
    }

    #[test]
    fn overrides_replace_defaults() {
        let options = parse_args(&args("run --size 6x6 --openings 3 --max-steps 500")).unwrap();
        let config = load_config(&options).unwrap();
        assert_eq!((config.width, config.height), (6, 6));
        assert_eq!(config.extra_openings, 3);
        assert_eq!(config.max_steps, 500);
        assert_eq!(config.agent, AgentKind::Floodfill);
    }

    #[test]
    fn invalid_config_is_an_error() {
        let options = parse_args(&args("show --size 2x2")).unwrap();
        assert!(matches!(load_config(&options), Err(RunnerError::Config(_))));
    }
}
