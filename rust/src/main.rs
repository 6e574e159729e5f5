use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use dayplan_rust::time::{format_clock, local_time_of_day, parse_clock, SECONDS_PER_MINUTE};
use dayplan_rust::{make_schedule, parse_tasks, SearchConfig, DEFAULT_MAX_FRONTIER_SIZE};

const DEFAULT_REST_TIME: i64 = 300;

#[derive(Parser, Debug)]
#[command(
    name = "dayplan",
    about = "Plan the rest of the day from a list of tasks",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    /// Task lines, `[time spec][labels] name`; one argument may hold several lines
    tasks: Vec<String>,

    /// Read task lines from a file
    #[arg(long, short)]
    file: Option<PathBuf>,

    /// Start of the schedule (HH:MM); defaults to the current local time
    #[arg(long, value_parser = parse_start)]
    start: Option<i64>,

    /// Rest between consecutive tasks, in seconds
    #[arg(long, default_value_t = DEFAULT_REST_TIME)]
    rest: i64,

    /// Maximum number of partial schedules kept during the search
    #[arg(long, default_value_t = DEFAULT_MAX_FRONTIER_SIZE)]
    max_frontier: usize,

    /// Increase diagnostic output on stderr
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_start(s: &str) -> Result<i64, String> {
    parse_clock(s).ok_or_else(|| format!("expected HH:MM, got '{s}'"))
}

fn read_input(cli: &Cli) -> Result<String> {
    let mut input = String::new();
    if let Some(path) = &cli.file {
        input = fs::read_to_string(path)
            .with_context(|| format!("reading task file {}", path.display()))?;
    }
    for arg in &cli.tasks {
        if !input.is_empty() && !input.ends_with('\n') {
            input.push('\n');
        }
        input.push_str(arg);
    }
    if input.trim().is_empty() {
        bail!("no tasks given; pass task lines as arguments or use --file");
    }
    Ok(input)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let input = read_input(&cli)?;

    let now = cli.start.unwrap_or_else(local_time_of_day);
    let config = SearchConfig::default()
        .with_global_start_time(now)
        .with_rest_time(cli.rest)
        .with_max_frontier_size(cli.max_frontier)
        .with_verbosity(cli.verbose);

    let list = parse_tasks(&input, cli.verbose);
    let result = make_schedule(list.tasks(), &config).context("scheduling failed")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "Current time: {}", format_clock(now))?;
    write!(out, "{}", list.summary())?;
    writeln!(out, "#steps: {}", result.search_steps())?;

    for placed in &result.schedule {
        let Some(entry) = list.get(placed.task_index) else {
            continue;
        };
        writeln!(
            out,
            "{:>30} [{:>20}]   {} - {}",
            entry.name,
            entry.pattern,
            format_clock(placed.start),
            format_clock(placed.end)
        )?;
    }
    for entry in result.incomplete_tasks.iter().filter_map(|&i| list.get(i)) {
        writeln!(
            out,
            "{:>30} [{:>20}]   Task not yet assigned",
            entry.name, entry.pattern
        )?;
    }

    let pct = result.utilization().unwrap_or(0.0) * 100.0;
    writeln!(
        out,
        "Utility: {}/{} min ({:.1}%)",
        result.used_duration / SECONDS_PER_MINUTE,
        result.total_duration / SECONDS_PER_MINUTE,
        pct
    )?;

    Ok(())
}
