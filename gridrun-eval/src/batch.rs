//! Batch evaluation - score a whole population
//!
//! Level 1 - Orchestration

use rayon::prelude::*;
use serde::Serialize;

use crate::config::EvalConfig;
use crate::controller::{Candidate, ControllerFactory};
use crate::encoder::{ObservationEncoder, WindowEncoder};
use crate::environment::EnvironmentFactory;
use crate::error::ConfigError;
use crate::fitness::{FitnessAggregator, FitnessResult};

/// Aggregate statistics for one evaluated batch
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BatchSummary {
    pub evaluated: usize,
    pub failures: usize,
    pub best: u32,
    pub mean: f32,
    /// Upper bound on any candidate's fitness
    pub max_fitness: u32,
}

impl BatchSummary {
    pub fn from_results(results: &[FitnessResult], max_fitness: u32) -> Self {
        let evaluated = results.len();
        let failures = results.iter().filter(|r| r.is_failure()).count();
        let best = results.iter().map(|r| r.fitness).max().unwrap_or(0);
        let mean = if evaluated == 0 {
            0.0
        } else {
            results.iter().map(|r| r.fitness as f64).sum::<f64>() as f32 / evaluated as f32
        };
        Self {
            evaluated,
            failures,
            best,
            mean,
            max_fitness,
        }
    }
}

/// Assigns a fitness to every candidate in a batch
pub struct BatchEvaluator<P, F, O = WindowEncoder> {
    controllers: P,
    environments: F,
    aggregator: FitnessAggregator<O>,
}

impl<P, F> BatchEvaluator<P, F, WindowEncoder>
where
    F: EnvironmentFactory,
{
    /// Validate `config` and build an evaluator using its variant geometry
    pub fn new(controllers: P, environments: F, config: EvalConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            controllers,
            environments,
            aggregator: FitnessAggregator::from_config(config),
        })
    }
}

impl<P, F, O> BatchEvaluator<P, F, O>
where
    F: EnvironmentFactory,
    O: ObservationEncoder,
{
    /// Build from a custom aggregator (e.g. a different observation encoder)
    pub fn with_aggregator(
        controllers: P,
        environments: F,
        aggregator: FitnessAggregator<O>,
    ) -> Result<Self, ConfigError> {
        aggregator.config().validate()?;
        Ok(Self {
            controllers,
            environments,
            aggregator,
        })
    }

    pub fn config(&self) -> &EvalConfig {
        self.aggregator.config()
    }

    pub fn environments(&self) -> &F {
        &self.environments
    }

    /// Upper bound on fitness: max per-trial score times trial count
    pub fn max_fitness_value(&self) -> u32 {
        self.aggregator.max_fitness(self.environments.max_trial_score())
    }

    /// Single trial per candidate, frames rendered at human pace
    pub fn enable_display(&mut self) {
        self.aggregator.enable_display();
    }

    /// Evaluate every candidate, writing fitness in place
    pub fn evaluate<C>(&self, candidates: &mut [C]) -> BatchSummary
    where
        C: Candidate + Send,
        P: ControllerFactory<C>,
    {
        let results = self.evaluate_detailed(candidates);
        BatchSummary::from_results(&results, self.max_fitness_value())
    }

    /// Like `evaluate`, also returning per-candidate results in input order
    pub fn evaluate_detailed<C>(&self, candidates: &mut [C]) -> Vec<FitnessResult>
    where
        C: Candidate + Send,
        P: ControllerFactory<C>,
    {
        let config = self.config();
        tracing::info!(
            "Evaluating {} candidates: {} trials each, max {} steps{}",
            candidates.len(),
            config.effective_trials(),
            config.max_timesteps,
            if config.display.enabled { " (display)" } else { "" }
        );

        let results: Vec<FitnessResult> = if config.parallel && !config.display.enabled {
            candidates
                .par_iter_mut()
                .map(|candidate| self.evaluate_one(candidate))
                .collect()
        } else {
            candidates
                .iter_mut()
                .map(|candidate| self.evaluate_one(candidate))
                .collect()
        };

        let summary = BatchSummary::from_results(&results, self.max_fitness_value());
        tracing::info!(
            "Batch done: best={}, mean={:.1}, failures={}/{}",
            summary.best,
            summary.mean,
            summary.failures,
            summary.evaluated
        );
        results
    }

    fn evaluate_one<C>(&self, candidate: &mut C) -> FitnessResult
    where
        C: Candidate,
        P: ControllerFactory<C>,
    {
        let result = self
            .aggregator
            .evaluate(candidate, &self.controllers, &self.environments);
        candidate.set_fitness(result.fitness);
        result
    }
}
