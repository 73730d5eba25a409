//! Watch command - play one genome at human pace with rendered frames
//!
//! Frames go to the log on target `gridrun::display`.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use gridrun_eval::{BatchEvaluator, EvalConfig, LinearGenome, LinearTranscriber, MazeFactory};

use crate::population::{
    check_genome_sizes, create_rng, load_genomes, random_population, resolve_config, Overrides,
    VariantArg,
};

#[derive(Args, Clone, Debug)]
pub struct WatchArgs {
    /// JSON evaluation config (missing fields take defaults)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Observation/action variant (overrides the config file)
    #[arg(long, value_enum)]
    pub variant: Option<VariantArg>,

    /// Genome file; a random genome is used when absent
    #[arg(long, value_name = "FILE")]
    pub genomes: Option<PathBuf>,

    /// Which genome of the file to watch
    #[arg(long, default_value = "0")]
    pub index: usize,

    /// Timestep cap for the trial
    #[arg(long)]
    pub timesteps: Option<u32>,

    /// Pause after each frame in milliseconds
    #[arg(long)]
    pub frame_delay: Option<u64>,
}

/// Run watch command
pub fn run(args: WatchArgs, seed: Option<u64>) -> Result<()> {
    let mut config = resolve_config(&Overrides {
        config: args.config.clone(),
        variant: args.variant,
        timesteps: args.timesteps,
        seed,
        ..Default::default()
    })?;
    if let Some(delay) = args.frame_delay {
        config.display.frame_delay_ms = delay;
    }

    let genome = select_genome(&args, &config, seed)?;
    check_genome_sizes(std::slice::from_ref(&genome), &config);

    let transcriber =
        LinearTranscriber::new(config.variant.input_len(), config.variant.output_len());
    let mut evaluator = BatchEvaluator::new(transcriber, MazeFactory::classic(), config)
        .context("Failed to build evaluator")?;
    evaluator.enable_display();

    let mut candidates = vec![genome];
    let results = evaluator.evaluate_detailed(&mut candidates);

    match results.first() {
        Some(result) if result.is_failure() => {
            println!(
                "Genome {} failed: {}",
                candidates[0].id,
                result.failure.as_deref().unwrap_or("unknown error")
            );
        }
        Some(result) => {
            for trial in &result.trials {
                println!(
                    "Genome {}: score {} after {} steps ({:?})",
                    candidates[0].id, trial.score, trial.steps, trial.termination
                );
            }
        }
        None => bail!("No result produced"),
    }
    Ok(())
}

fn select_genome(args: &WatchArgs, config: &EvalConfig, seed: Option<u64>) -> Result<LinearGenome> {
    match &args.genomes {
        Some(path) => {
            let mut genomes = load_genomes(path)?;
            if args.index >= genomes.len() {
                bail!(
                    "Genome index {} out of range ({} genomes in {})",
                    args.index,
                    genomes.len(),
                    path.display()
                );
            }
            Ok(genomes.swap_remove(args.index))
        }
        None => {
            let mut rng = create_rng(seed);
            let mut population = random_population(config, 1, &mut rng);
            population.pop().context("Failed to generate genome")
        }
    }
}
