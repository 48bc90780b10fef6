//! Savernet experiment runner
//!
//! Loads an experiment spec (or falls back to defaults), plays the game,
//! and prints a human summary. Per-round records can be streamed to a
//! JSONL file with `--output`.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use savernet_lab::{ExperimentSpec, LabError, RoundLog, SurvivalExperiment};

/// Command line arguments for the lab.
#[derive(Parser, Debug)]
#[command(name = "savernet-lab")]
#[command(about = "Runs saver-game experiments from a TOML spec")]
struct Args {
    /// Path to the experiment spec; defaults apply when omitted
    config: Option<PathBuf>,

    /// Random seed override
    #[arg(long)]
    seed: Option<u64>,

    /// Round count override
    #[arg(long)]
    rounds: Option<u64>,

    /// Agent count override
    #[arg(long)]
    agents: Option<usize>,

    /// Write per-round records to this JSONL file
    #[arg(long)]
    output: Option<PathBuf>,

    /// Suppress the banner and the summary
    #[arg(long)]
    quiet: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    if let Err(e) = run(Args::parse()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), LabError> {
    let mut spec = match &args.config {
        Some(path) => ExperimentSpec::from_file(path)?,
        None => ExperimentSpec::default(),
    };
    if let Some(seed) = args.seed {
        spec.game.seed = seed;
    }
    if let Some(rounds) = args.rounds {
        spec.game.rounds = rounds;
    }
    if let Some(agents) = args.agents {
        spec.population.agents = agents;
    }

    if !args.quiet {
        println!("Savernet Lab");
        println!("============");
        match &args.config {
            Some(path) => println!("Spec: {}", path.display()),
            None => println!("Spec: (defaults)"),
        }
        println!("Seed: {}", spec.game.seed);
        println!("Rounds: {}", spec.game.rounds);
        let (savers, non_savers) = spec.saver_counts()?;
        println!("Agents: {} savers / {} non-savers", savers, non_savers);
        if let Some(output) = &args.output {
            println!("Output: {}", output.display());
        }
        println!();
    }

    let mut log = match &args.output {
        Some(path) => RoundLog::create(path)?,
        None => RoundLog::null(),
    };

    let experiment = SurvivalExperiment::new(spec);
    let summary = experiment.run(&mut log)?;

    if !args.quiet {
        println!("Rounds played: {}", summary.rounds_played);
        println!(
            "Final savers: {}/{}",
            summary.final_savers, summary.final_agents
        );
        println!("Total savings: {:.2}", summary.final_total_savings);
        println!("Gini: {:.3}", summary.final_gini);
        println!(
            "Saver low point: {} at round {}",
            summary.min_savers, summary.min_savers_round
        );
        match summary.absorbed_at {
            Some(round) => println!("Absorbing state reached at round {}", round),
            None => println!("No absorbing state reached"),
        }
    }

    Ok(())
}
