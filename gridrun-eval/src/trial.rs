//! Trial runner - drives one controller through one environment
//!
//! Level 3 - Step-level implementation
//!
//! A trial moves through three phases:
//! - Initializing: the environment is built; display mode primes one extra frame
//! - Running: encode, infer, decode, step, read score, check termination
//! - Terminated: the environment is released and the last score returned

use std::thread;
use std::time::Duration;

use gridrun_core::Pos;
use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::config::{DisplayConfig, EvalConfig};
use crate::controller::Controller;
use crate::decoder::ActionDecoder;
use crate::encoder::{ObservationEncoder, WindowEncoder};
use crate::environment::{Environment, EnvironmentFactory, TerminalFlags};
use crate::error::EvalError;

/// Why a trial ended
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    Stopped,
    Won,
    Over,
    NotStarted,
    /// Revisit countdown ran out
    Stuck,
    /// `max_timesteps` reached with no other condition
    TimestepLimit,
}

impl Termination {
    /// First raised flag, in stopped, won, over, not-started order
    pub fn from_flags(flags: TerminalFlags) -> Option<Self> {
        if flags.stopped {
            Some(Termination::Stopped)
        } else if flags.won {
            Some(Termination::Won)
        } else if flags.over {
            Some(Termination::Over)
        } else if flags.not_started {
            Some(Termination::NotStarted)
        } else {
            None
        }
    }
}

/// Outcome of a single trial
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TrialResult {
    /// Last score read from the environment
    pub score: u32,
    /// Steps driven by the runner (priming frame excluded)
    pub steps: u32,
    pub termination: Termination,
}

/// Counts down while the agent keeps revisiting known cells
#[derive(Clone, Debug)]
pub struct StuckDetector {
    visited: FxHashSet<Pos>,
    budget: u32,
    remaining: u32,
}

impl StuckDetector {
    pub fn new(budget: u32) -> Self {
        Self {
            visited: FxHashSet::default(),
            budget,
            remaining: budget,
        }
    }

    /// Record the agent position; true once the countdown is exhausted.
    ///
    /// A new cell resets the countdown, a known cell decrements it.
    pub fn observe(&mut self, pos: Pos) -> bool {
        if self.visited.insert(pos) {
            self.remaining = self.budget;
        } else {
            self.remaining = self.remaining.saturating_sub(1);
        }
        self.remaining == 0
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn visited(&self) -> usize {
        self.visited.len()
    }
}

/// Runs trials with a fixed encoder, decoder and limits
#[derive(Clone, Debug)]
pub struct TrialRunner<O = WindowEncoder> {
    encoder: O,
    decoder: ActionDecoder,
    max_timesteps: u32,
    stuck_budget: u32,
    display: DisplayConfig,
}

impl TrialRunner<WindowEncoder> {
    /// Runner using the window encoder and action table of the configured variant
    pub fn from_config(config: &EvalConfig) -> Self {
        Self::new(
            WindowEncoder::from_variant(&config.variant),
            ActionDecoder::from_variant(&config.variant),
            config,
        )
    }
}

impl<O: ObservationEncoder> TrialRunner<O> {
    pub fn new(encoder: O, decoder: ActionDecoder, config: &EvalConfig) -> Self {
        Self {
            encoder,
            decoder,
            max_timesteps: config.max_timesteps,
            stuck_budget: config.stuck_budget,
            display: config.display.clone(),
        }
    }

    pub fn encoder(&self) -> &O {
        &self.encoder
    }

    pub fn decoder(&self) -> &ActionDecoder {
        &self.decoder
    }

    pub fn set_display(&mut self, display: DisplayConfig) {
        self.display = display;
    }

    /// Build a fresh environment from `factory` and run one trial in it
    pub fn run_trial<F, C>(
        &self,
        factory: &F,
        seed: u64,
        controller: &mut C,
    ) -> Result<TrialResult, EvalError>
    where
        F: EnvironmentFactory,
        C: Controller,
    {
        let env = factory.construct(seed)?;
        self.run(env, controller)
    }

    /// Run one trial, consuming the environment
    pub fn run<E, C>(&self, mut env: E, controller: &mut C) -> Result<TrialResult, EvalError>
    where
        E: Environment,
        C: Controller,
    {
        let outcome = self
            .initialize(&mut env)
            .and_then(|()| self.run_steps(&mut env, controller));
        env.release();

        let result = outcome?;
        tracing::debug!(
            "trial took {} steps ({:?}, score {})",
            result.steps,
            result.termination,
            result.score
        );
        Ok(result)
    }

    // ========================================================================
    // Phases
    // ========================================================================

    /// Display mode primes one frame before control starts
    fn initialize<E: Environment>(&self, env: &mut E) -> Result<(), EvalError> {
        if self.display.enabled {
            env.step()?;
            self.show_frame(env, 0);
        }
        Ok(())
    }

    fn run_steps<E, C>(&self, env: &mut E, controller: &mut C) -> Result<TrialResult, EvalError>
    where
        E: Environment,
        C: Controller,
    {
        let mut stuck = StuckDetector::new(self.stuck_budget);
        let mut score = 0;

        for step in 1..=self.max_timesteps {
            let input = self.encoder.encode(env);
            let outputs = controller.infer(&input)?;
            let action = self.decoder.decode(&outputs)?;
            env.set_pending_action(action);
            env.step()?;
            self.show_frame(env, step);

            score = env.score();

            let is_stuck = stuck.observe(env.agent_position());
            if let Some(termination) = Termination::from_flags(env.terminal_flags()) {
                return Ok(TrialResult {
                    score,
                    steps: step,
                    termination,
                });
            }
            if is_stuck {
                return Ok(TrialResult {
                    score,
                    steps: step,
                    termination: Termination::Stuck,
                });
            }
        }

        Ok(TrialResult {
            score,
            steps: self.max_timesteps,
            termination: Termination::TimestepLimit,
        })
    }

    fn show_frame<E: Environment>(&self, env: &E, step: u32) {
        if !self.display.enabled {
            return;
        }
        tracing::info!(target: "gridrun::display", "step {}\n{}", step, env.render());
        if self.display.frame_delay_ms > 0 {
            thread::sleep(Duration::from_millis(self.display.frame_delay_ms));
        }
    }
}
