//! Candidate and controller contracts, plus a linear reference controller
//!
//! Level 4 - Collaborator interfaces

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::EvalError;

/// Stateful map from observation vector to output vector
pub trait Controller {
    fn infer(&mut self, input: &[f64]) -> Result<Vec<f64>, EvalError>;
}

/// An evolvable unit the harness can score
pub trait Candidate {
    /// Identifier used in logs
    fn id(&self) -> String;

    fn set_fitness(&mut self, fitness: u32);
}

/// Realises candidates as controllers
pub trait ControllerFactory<C>: Sync {
    type Controller: Controller;

    fn produce(&self, candidate: &C) -> Result<Self::Controller, EvalError>;
}

// ============================================================================
// Linear reference controller
// ============================================================================

/// Weights of a single dense layer, stored row-major (one row per output)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearGenome {
    pub id: u64,
    pub weights: Vec<f64>,
    #[serde(default)]
    pub fitness: Option<u32>,
}

impl LinearGenome {
    pub fn new(id: u64, weights: Vec<f64>) -> Self {
        Self {
            id,
            weights,
            fitness: None,
        }
    }

    /// Genome with uniform weights in [-1, 1)
    pub fn random<R: Rng>(rng: &mut R, id: u64, inputs: usize, outputs: usize) -> Self {
        let weights = (0..inputs * outputs).map(|_| rng.gen_range(-1.0..1.0)).collect();
        Self::new(id, weights)
    }
}

impl Candidate for LinearGenome {
    fn id(&self) -> String {
        format!("genome-{}", self.id)
    }

    fn set_fitness(&mut self, fitness: u32) {
        self.fitness = Some(fitness);
    }
}

/// Dense layer with tanh activation
#[derive(Clone, Debug)]
pub struct LinearController {
    inputs: usize,
    outputs: usize,
    weights: Vec<f64>,
}

impl LinearController {
    pub fn inputs(&self) -> usize {
        self.inputs
    }

    pub fn outputs(&self) -> usize {
        self.outputs
    }
}

impl Controller for LinearController {
    fn infer(&mut self, input: &[f64]) -> Result<Vec<f64>, EvalError> {
        if input.len() != self.inputs {
            return Err(EvalError::Inference(format!(
                "expected {} inputs, got {}",
                self.inputs,
                input.len()
            )));
        }

        Ok(self
            .weights
            .chunks(self.inputs)
            .map(|row| row.iter().zip(input).map(|(w, x)| w * x).sum::<f64>().tanh())
            .collect())
    }
}

/// Builds `LinearController`s of a fixed shape from `LinearGenome`s
#[derive(Clone, Copy, Debug)]
pub struct LinearTranscriber {
    inputs: usize,
    outputs: usize,
}

impl LinearTranscriber {
    pub fn new(inputs: usize, outputs: usize) -> Self {
        Self { inputs, outputs }
    }

    /// Number of weights a genome needs
    pub fn genome_len(&self) -> usize {
        self.inputs * self.outputs
    }
}

impl ControllerFactory<LinearGenome> for LinearTranscriber {
    type Controller = LinearController;

    fn produce(&self, genome: &LinearGenome) -> Result<LinearController, EvalError> {
        if self.inputs == 0 || genome.weights.len() != self.genome_len() {
            return Err(EvalError::ControllerUnavailable(format!(
                "{} has {} weights, expected {}",
                genome.id(),
                genome.weights.len(),
                self.genome_len()
            )));
        }
        Ok(LinearController {
            inputs: self.inputs,
            outputs: self.outputs,
            weights: genome.weights.clone(),
        })
    }
}
