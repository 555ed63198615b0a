use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;
use darwin::event::TracingObserver;
use darwin::metrics::{dominant, is_fixated};
use darwin::simulation::{Simulation, SimulationConfig};
use darwin::species::{Color, Species};

#[derive(Parser)]
#[command(name = "darwin", about = "Darwin: creatures running tiny programs fight for a grid")]
struct Cli {
    /// Random seed for reproducibility.
    #[arg(long)]
    seed: u64,

    /// Number of rounds to run.
    #[arg(long)]
    rounds: u64,

    /// Species program file, optionally followed by `:COLOR` (repeatable).
    #[arg(long = "species", value_name = "FILE[:COLOR]", required = true)]
    species: Vec<String>,

    /// Grid width.
    #[arg(long, default_value_t = 15)]
    width: usize,

    /// Grid height.
    #[arg(long, default_value_t = 15)]
    height: usize,

    /// Creatures placed per species.
    #[arg(long, default_value_t = 10)]
    creatures: usize,

    /// Per-turn instruction budget as a multiple of program length.
    #[arg(long, default_value_t = darwin::interpreter::DEFAULT_BUDGET_FACTOR)]
    budget_factor: usize,

    /// Print the census every N rounds.
    #[arg(long, default_value_t = 1)]
    census_interval: u64,

    /// Pause between rounds, in milliseconds.
    #[arg(long, default_value_t = 0)]
    delay_ms: u64,

    /// Stop as soon as a single species owns every creature.
    #[arg(long)]
    stop_on_fixation: bool,
}

/// Split a `FILE[:COLOR]` argument. Only the last `:` separates the colour,
/// and only when something follows it.
fn parse_species_arg(arg: &str) -> (PathBuf, Color) {
    match arg.rsplit_once(':') {
        Some((path, color)) if !path.is_empty() && !color.is_empty() => {
            (PathBuf::from(path), Color::new(color))
        }
        _ => (PathBuf::from(arg), Color::default()),
    }
}

/// Build the log filter from a `RUST_LOG`-style string, falling back to
/// `info` when it is empty.
fn log_filter(directives: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .parse_lossy(directives)
}

fn main() -> Result<()> {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(&directives))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.census_interval == 0 {
        bail!("--census-interval must be positive");
    }

    let config = SimulationConfig {
        width: cli.width,
        height: cli.height,
        creatures_per_species: cli.creatures,
        step_budget_factor: cli.budget_factor,
    };
    let mut sim = Simulation::new(config, cli.seed).context("cannot set up the world")?;
    let mut observer = TracingObserver;

    for arg in &cli.species {
        let (path, color) = parse_species_arg(arg);
        let species = Species::from_file(&path, color)
            .with_context(|| format!("cannot load species from {}", path.display()))?;
        tracing::info!(name = species.name(), color = %species.color(), "adding species");
        let id = sim.add_species(species);
        sim.populate(id, &mut observer)?;
    }

    let names: Vec<&str> = sim.species().iter().map(Species::name).collect();
    println!("round,{}", names.join(","));
    print_census(&sim);

    let pause = Duration::from_millis(cli.delay_ms);
    for round in 1..=cli.rounds {
        let summary = sim.run_round(&mut observer);
        if summary.stalled > 0 {
            tracing::info!(round, stalled = summary.stalled, "round had stalled turns");
        }

        let fixated = cli.stop_on_fixation && is_fixated(&sim.census());
        if fixated || round % cli.census_interval == 0 || round == cli.rounds {
            print_census(&sim);
        }
        if fixated {
            break;
        }
        if !pause.is_zero() {
            std::thread::sleep(pause);
        }
    }

    if let Some((winner, count)) = dominant(&sim.census()) {
        let name = sim.species()[winner.index()].name();
        tracing::info!(rounds = sim.round(), leader = name, creatures = count, "simulation finished");
    }
    Ok(())
}

fn print_census(sim: &Simulation) {
    let counts: Vec<String> = sim.census().iter().map(ToString::to_string).collect();
    println!("{},{}", sim.round(), counts.join(","));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_species_arg() {
        let (path, color) = parse_species_arg("species/rover.txt:red");
        assert_eq!(path, PathBuf::from("species/rover.txt"));
        assert_eq!(color, Color::new("red"));

        let (path, color) = parse_species_arg("species/rover.txt");
        assert_eq!(path, PathBuf::from("species/rover.txt"));
        assert_eq!(color, Color::default());

        let (path, color) = parse_species_arg("odd:");
        assert_eq!(path, PathBuf::from("odd:"));
        assert_eq!(color, Color::default());
    }

    #[test]
    fn test_log_filter_honours_env_level() {
        assert_eq!(log_filter("trace").max_level_hint(), Some(LevelFilter::TRACE));
        assert_eq!(log_filter("warn").max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(log_filter("").max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "darwin",
            "--seed",
            "1",
            "--rounds",
            "10",
            "--species",
            "a.txt:red",
            "--species",
            "b.txt",
        ])
        .unwrap();
        assert_eq!(cli.species.len(), 2);
        assert_eq!(cli.width, 15);
        assert_eq!(cli.creatures, 10);
        assert!(Cli::try_parse_from(["darwin", "--seed", "1", "--rounds", "1"]).is_err());
    }
}
