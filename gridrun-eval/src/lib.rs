//! GRIDRUN Eval - Fitness evaluation of controllers in a stepped environment
//!
//! This crate provides the evaluation harness:
//! - Observation encoding (window scan around the agent)
//! - Action decoding (arg-max through a direction table)
//! - Trial running with terminal-flag and stuck detection
//! - Fitness aggregation over several trials per candidate
//! - Batch evaluation of whole populations, optionally in parallel
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: BatchEvaluator (orchestration)
//! - Level 2: FitnessAggregator (phases)
//! - Level 3: TrialRunner, WindowEncoder, ActionDecoder (steps)
//! - Level 4: configuration, errors, collaborator traits

mod batch;
mod config;
mod controller;
mod decoder;
mod encoder;
mod environment;
mod error;
mod fitness;
mod trial;

#[cfg(test)]
mod testing;

pub use batch::{BatchEvaluator, BatchSummary};
pub use config::{
    ChannelSet, DisplayConfig, EvalConfig, VariantConfig, DEFAULT_FRAME_DELAY_MS,
    DEFAULT_MAX_TIMESTEPS, DEFAULT_NUM_TRIALS, DEFAULT_SEED, DEFAULT_STUCK_BUDGET,
    MAX_WINDOW_RADIUS,
};
pub use controller::{
    Candidate, Controller, ControllerFactory, LinearController, LinearGenome, LinearTranscriber,
};
pub use decoder::{argmax, ActionDecoder};
pub use encoder::{ObservationEncoder, WindowEncoder};
pub use environment::{Environment, EnvironmentFactory, MazeFactory, TerminalFlags};
pub use error::{ConfigError, EvalError};
pub use fitness::{FitnessAggregator, FitnessResult};
pub use trial::{StuckDetector, Termination, TrialResult, TrialRunner};
