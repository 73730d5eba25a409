//! Fitness aggregation - many trials, one score
//!
//! Level 2 - Phase-level implementation

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use serde::Serialize;

use crate::config::{DisplayConfig, EvalConfig};
use crate::controller::{Candidate, ControllerFactory};
use crate::encoder::{ObservationEncoder, WindowEncoder};
use crate::environment::EnvironmentFactory;
use crate::error::EvalError;
use crate::trial::{TrialResult, TrialRunner};

/// Result of evaluating one candidate
#[derive(Clone, Debug, Serialize)]
pub struct FitnessResult {
    /// Sum of trial scores, 0 on failure
    pub fitness: u32,
    /// Per-trial results (empty on failure)
    pub trials: Vec<TrialResult>,
    /// Error that failed the candidate
    pub failure: Option<String>,
}

impl FitnessResult {
    /// Sum the scores of completed trials
    pub fn from_trials(trials: Vec<TrialResult>) -> Self {
        let fitness = trials.iter().map(|t| t.score).fold(0u32, u32::saturating_add);
        Self {
            fitness,
            trials,
            failure: None,
        }
    }

    /// Zero fitness; partial trial results are discarded
    pub fn failed(error: &EvalError) -> Self {
        Self {
            fitness: 0,
            trials: Vec::new(),
            failure: Some(error.to_string()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.failure.is_some()
    }

    pub fn total_steps(&self) -> u64 {
        self.trials.iter().map(|t| t.steps as u64).sum()
    }

    /// Mean trial score
    pub fn mean_score(&self) -> f32 {
        if self.trials.is_empty() {
            0.0
        } else {
            self.fitness as f32 / self.trials.len() as f32
        }
    }

    pub fn best_trial(&self) -> Option<&TrialResult> {
        self.trials.iter().max_by_key(|t| t.score)
    }
}

/// Runs the configured number of trials per candidate and sums them
#[derive(Clone, Debug)]
pub struct FitnessAggregator<O = WindowEncoder> {
    runner: TrialRunner<O>,
    config: EvalConfig,
}

impl FitnessAggregator<WindowEncoder> {
    pub fn from_config(config: EvalConfig) -> Self {
        let runner = TrialRunner::from_config(&config);
        Self { runner, config }
    }
}

impl<O: ObservationEncoder> FitnessAggregator<O> {
    pub fn new(runner: TrialRunner<O>, config: EvalConfig) -> Self {
        Self { runner, config }
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    pub fn runner(&self) -> &TrialRunner<O> {
        &self.runner
    }

    /// Switch to single-trial, rendered, human-paced evaluation
    pub fn enable_display(&mut self) {
        self.config.display.enabled = true;
        self.runner.set_display(self.config.display.clone());
    }

    pub fn set_display(&mut self, display: DisplayConfig) {
        self.config.display = display.clone();
        self.runner.set_display(display);
    }

    /// Upper bound: per-trial maximum times configured trial count
    pub fn max_fitness(&self, max_trial_score: u32) -> u32 {
        max_trial_score.saturating_mul(self.config.num_trials)
    }

    /// Evaluate one candidate. Any trial failure zeroes the whole candidate,
    /// including a panic raised by the controller or the environment.
    pub fn evaluate<C, P, F>(
        &self,
        candidate: &C,
        controllers: &P,
        environments: &F,
    ) -> FitnessResult
    where
        C: Candidate,
        P: ControllerFactory<C>,
        F: EnvironmentFactory,
    {
        match self.run_guarded(candidate, controllers, environments) {
            Ok(trials) => FitnessResult::from_trials(trials),
            Err(e) => {
                tracing::warn!("error evaluating candidate {}: {}", candidate.id(), e);
                FitnessResult::failed(&e)
            }
        }
    }

    // ========================================================================
    // Level 3 - Steps
    // ========================================================================

    fn run_guarded<C, P, F>(
        &self,
        candidate: &C,
        controllers: &P,
        environments: &F,
    ) -> Result<Vec<TrialResult>, EvalError>
    where
        C: Candidate,
        P: ControllerFactory<C>,
        F: EnvironmentFactory,
    {
        let trials = AssertUnwindSafe(|| self.run_trials(candidate, controllers, environments));
        panic::catch_unwind(trials)
            .unwrap_or_else(|payload| Err(EvalError::Panicked(panic_message(payload.as_ref()))))
    }

    /// Each trial gets a fresh controller and a freshly seeded environment
    fn run_trials<C, P, F>(
        &self,
        candidate: &C,
        controllers: &P,
        environments: &F,
    ) -> Result<Vec<TrialResult>, EvalError>
    where
        C: Candidate,
        P: ControllerFactory<C>,
        F: EnvironmentFactory,
    {
        (0..self.config.effective_trials())
            .map(|trial| {
                let mut controller = controllers.produce(candidate)?;
                self.runner
                    .run_trial(environments, self.config.trial_seed(trial), &mut controller)
            })
            .collect()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
