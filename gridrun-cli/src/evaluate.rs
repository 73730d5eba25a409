//! Evaluate command - score a population of linear genomes on the maze
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: prepare_population(), evaluate_population(), report()
//! - Level 3: rank(), build_report()
//! - Level 4: formatting utilities

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;

use gridrun_eval::{
    BatchEvaluator, BatchSummary, EvalConfig, FitnessResult, LinearGenome, LinearTranscriber,
    MazeFactory, Termination,
};

use crate::population::{
    check_genome_sizes, create_rng, load_genomes, random_population, resolve_config, save_genomes,
    Overrides, VariantArg,
};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args, Clone, Debug)]
pub struct EvaluateArgs {
    /// JSON evaluation config (missing fields take defaults)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Observation/action variant (overrides the config file)
    #[arg(long, value_enum)]
    pub variant: Option<VariantArg>,

    /// Random genomes to generate when --genomes is not given
    #[arg(long, default_value = "20")]
    pub candidates: usize,

    /// Trials per candidate
    #[arg(long)]
    pub trials: Option<u32>,

    /// Timestep cap per trial
    #[arg(long)]
    pub timesteps: Option<u32>,

    /// Evaluate candidates in parallel
    #[arg(long)]
    pub parallel: bool,

    /// Load genomes from a JSON array instead of generating them
    #[arg(long, value_name = "FILE")]
    pub genomes: Option<PathBuf>,

    /// Save the evaluated genomes (with fitness) to this file
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

impl EvaluateArgs {
    fn overrides(&self, seed: Option<u64>) -> Overrides {
        Overrides {
            config: self.config.clone(),
            variant: self.variant,
            trials: self.trials,
            timesteps: self.timesteps,
            seed,
            parallel: self.parallel,
        }
    }
}

/// One row of the ranked output
#[derive(Clone, Debug, Serialize)]
pub struct RankedCandidate {
    pub rank: usize,
    pub id: u64,
    pub fitness: u32,
    pub mean_score: f32,
    pub best_score: u32,
    pub total_steps: u64,
    pub wins: usize,
    pub failure: Option<String>,
}

/// Full JSON report of one evaluation run
#[derive(Clone, Debug, Serialize)]
pub struct EvaluationReport {
    pub evaluated_at: DateTime<Utc>,
    pub config: EvalConfig,
    pub summary: BatchSummary,
    pub candidates: Vec<RankedCandidate>,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run evaluate command
///
/// 1. Resolve configuration
/// 2. Load or generate genomes
/// 3. Evaluate them
/// 4. Report and optionally save
pub fn run(args: EvaluateArgs, seed: Option<u64>) -> Result<()> {
    let config = resolve_config(&args.overrides(seed))?;
    let mut population = prepare_population(&args, &config, seed)?;

    tracing::info!(
        "Evaluating {} genomes ({} inputs, {} outputs)",
        population.len(),
        config.variant.input_len(),
        config.variant.output_len()
    );

    let report = evaluate_population(&mut population, config)?;

    if let Some(path) = &args.output {
        save_genomes(&population, path)?;
    }

    print_report(&report, args.json)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn prepare_population(
    args: &EvaluateArgs,
    config: &EvalConfig,
    seed: Option<u64>,
) -> Result<Vec<LinearGenome>> {
    let population = match &args.genomes {
        Some(path) => load_genomes(path)?,
        None => {
            let mut rng = create_rng(seed);
            random_population(config, args.candidates, &mut rng)
        }
    };
    check_genome_sizes(&population, config);
    Ok(population)
}

/// Evaluate every genome in place and build the report
pub fn evaluate_population(
    population: &mut [LinearGenome],
    config: EvalConfig,
) -> Result<EvaluationReport> {
    let transcriber =
        LinearTranscriber::new(config.variant.input_len(), config.variant.output_len());
    let evaluator = BatchEvaluator::new(transcriber, MazeFactory::classic(), config)
        .context("Failed to build evaluator")?;

    let results = evaluator.evaluate_detailed(population);
    let summary = BatchSummary::from_results(&results, evaluator.max_fitness_value());

    Ok(build_report(
        population,
        &results,
        evaluator.config().clone(),
        summary,
    ))
}

fn print_report(report: &EvaluationReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print_table(report);
    }
    Ok(())
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

fn build_report(
    population: &[LinearGenome],
    results: &[FitnessResult],
    config: EvalConfig,
    summary: BatchSummary,
) -> EvaluationReport {
    EvaluationReport {
        evaluated_at: Utc::now(),
        config,
        summary,
        candidates: rank(population, results),
    }
}

/// Sort by fitness (descending), ties broken by id
fn rank(population: &[LinearGenome], results: &[FitnessResult]) -> Vec<RankedCandidate> {
    let mut rows: Vec<RankedCandidate> = population
        .iter()
        .zip(results)
        .map(|(genome, result)| RankedCandidate {
            rank: 0,
            id: genome.id,
            fitness: result.fitness,
            mean_score: result.mean_score(),
            best_score: result.best_trial().map_or(0, |t| t.score),
            total_steps: result.total_steps(),
            wins: result
                .trials
                .iter()
                .filter(|t| t.termination == Termination::Won)
                .count(),
            failure: result.failure.clone(),
        })
        .collect();

    rows.sort_by(|a, b| b.fitness.cmp(&a.fitness).then(a.id.cmp(&b.id)));
    for (i, row) in rows.iter_mut().enumerate() {
        row.rank = i + 1;
    }
    rows
}

// ============================================================================
// LEVEL 4 - FORMATTING
// ============================================================================

fn print_table(report: &EvaluationReport) {
    let summary = &report.summary;
    println!("\n=== Evaluation ({}) ===", report.evaluated_at.to_rfc3339());
    println!(
        "Trials: {}  Max steps: {}  Seed: {}",
        report.config.num_trials,
        report.config.max_timesteps,
        report.config.base_seed()
    );
    println!(
        "Best: {} / {}  Mean: {:.1}  Failures: {}/{}",
        summary.best, summary.max_fitness, summary.mean, summary.failures, summary.evaluated
    );
    println!();
    println!(
        "{:>4}  {:>8}  {:>8}  {:>8}  {:>6}  {:>8}  {:>4}",
        "Rank", "Genome", "Fitness", "Mean", "Best", "Steps", "Wins"
    );
    for row in &report.candidates {
        let line = format!(
            "{:>4}  {:>8}  {:>8}  {:>8.1}  {:>6}  {:>8}  {:>4}",
            row.rank, row.id, row.fitness, row.mean_score, row.best_score, row.total_steps, row.wins
        );
        match &row.failure {
            Some(reason) => println!("{}  FAILED: {}", line, reason),
            None => println!("{}", line),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
