//! Test fixtures: grid stub environment and scripted controllers

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use gridrun_core::{Direction, Pos};

use crate::controller::{Candidate, Controller, ControllerFactory};
use crate::environment::{Environment, EnvironmentFactory, TerminalFlags};
use crate::error::EvalError;

/// Small open grid. Panics on any query outside its bounds.
#[derive(Clone, Debug)]
pub struct GridStub {
    pub width: i32,
    pub height: i32,
    pub agent: Pos,
    pub walls: Vec<Pos>,
    pub rewards: Vec<Pos>,
    pub threats: Vec<Pos>,
    pub pending: Option<Direction>,
    /// Score gained per step
    pub score_per_step: u32,
    /// Raise `won` once this many steps have run
    pub win_after: Option<u32>,
    /// Return an environment fault on this step (1-based)
    pub fault_at: Option<u32>,
    pub not_started: bool,
    pub ready: bool,
    pub score: u32,
    pub steps: u32,
    pub won: bool,
    pub released: bool,
}

impl GridStub {
    pub fn new(width: i32, height: i32, agent: Pos) -> Self {
        Self {
            width,
            height,
            agent,
            walls: Vec::new(),
            rewards: Vec::new(),
            threats: Vec::new(),
            pending: None,
            score_per_step: 0,
            win_after: None,
            fault_at: None,
            not_started: false,
            ready: true,
            score: 0,
            steps: 0,
            won: false,
            released: false,
        }
    }

    fn check(&self, x: i32, y: i32) {
        assert!(
            (0..self.width).contains(&x) && (0..self.height).contains(&y),
            "queried ({}, {}) outside {}x{}",
            x,
            y,
            self.width,
            self.height
        );
    }
}

impl Environment for GridStub {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn bounds(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    fn agent_position(&self) -> Pos {
        self.agent
    }

    fn is_traversable(&self, x: i32, y: i32) -> bool {
        self.check(x, y);
        !self.walls.contains(&Pos::new(x, y))
    }

    fn has_reward(&self, x: i32, y: i32) -> bool {
        self.check(x, y);
        self.rewards.contains(&Pos::new(x, y))
    }

    fn has_threat(&self, x: i32, y: i32) -> bool {
        self.check(x, y);
        self.threats.contains(&Pos::new(x, y))
    }

    fn set_pending_action(&mut self, action: Direction) {
        self.pending = Some(action);
    }

    fn step(&mut self) -> Result<(), EvalError> {
        self.steps += 1;
        if self.fault_at == Some(self.steps) {
            return Err(EvalError::Environment(format!("fault at step {}", self.steps)));
        }
        if let Some(dir) = self.pending {
            let next = self.agent.step(dir);
            let inside = (0..self.width).contains(&next.x) && (0..self.height).contains(&next.y);
            if inside && !self.walls.contains(&next) {
                self.agent = next;
            }
        }
        self.score += self.score_per_step;
        if self.win_after.is_some_and(|n| self.steps >= n) {
            self.won = true;
        }
        Ok(())
    }

    fn score(&self) -> u32 {
        self.score
    }

    fn terminal_flags(&self) -> TerminalFlags {
        TerminalFlags {
            won: self.won,
            not_started: self.not_started,
            ..Default::default()
        }
    }

    fn release(&mut self) {
        self.released = true;
    }
}

/// Hands out clones of a template stub
pub struct StubFactory {
    pub template: GridStub,
    pub max_score: u32,
}

impl EnvironmentFactory for StubFactory {
    type Env = GridStub;

    fn construct(&self, _seed: u64) -> Result<GridStub, EvalError> {
        Ok(self.template.clone())
    }

    fn max_trial_score(&self) -> u32 {
        self.max_score
    }
}

/// Replays a fixed list of output vectors, cycling
#[derive(Clone, Debug)]
pub struct ScriptedController {
    script: Vec<Vec<f64>>,
    cursor: usize,
    /// Inference calls across every controller sharing this counter
    calls: Arc<AtomicUsize>,
    fail_at: Option<usize>,
    panic_at: Option<usize>,
}

impl ScriptedController {
    pub fn new(script: Vec<Vec<f64>>) -> Self {
        Self {
            script,
            cursor: 0,
            calls: Arc::default(),
            fail_at: None,
            panic_at: None,
        }
    }

    /// Always choose `index`
    pub fn constant(index: usize) -> Self {
        Self::new(vec![one_hot(index)])
    }
}

impl Controller for ScriptedController {
    fn infer(&mut self, _input: &[f64]) -> Result<Vec<f64>, EvalError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_at == Some(call) {
            return Err(EvalError::Inference(format!("scripted failure at call {}", call)));
        }
        if self.panic_at == Some(call) {
            panic!("scripted panic at call {}", call);
        }
        let out = self.script[self.cursor % self.script.len()].clone();
        self.cursor += 1;
        Ok(out)
    }
}

/// Candidate carrying its own controller script
#[derive(Clone, Debug)]
pub struct ScriptedCandidate {
    pub name: &'static str,
    pub script: Vec<Vec<f64>>,
    /// Fail inference on this call (0-based, counted across trials)
    pub fail_at: Option<usize>,
    /// Panic inside inference on this call
    pub panic_at: Option<usize>,
    pub unavailable: bool,
    pub fitness: Option<u32>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedCandidate {
    pub fn new(name: &'static str, script: Vec<Vec<f64>>) -> Self {
        Self {
            name,
            script,
            fail_at: None,
            panic_at: None,
            unavailable: false,
            fitness: None,
            calls: Arc::default(),
        }
    }

    pub fn failing_at(mut self, call: usize) -> Self {
        self.fail_at = Some(call);
        self
    }

    pub fn panicking_at(mut self, call: usize) -> Self {
        self.panic_at = Some(call);
        self
    }
}

impl Candidate for ScriptedCandidate {
    fn id(&self) -> String {
        self.name.to_string()
    }

    fn set_fitness(&mut self, fitness: u32) {
        self.fitness = Some(fitness);
    }
}

pub struct ScriptedFactory;

impl ControllerFactory<ScriptedCandidate> for ScriptedFactory {
    type Controller = ScriptedController;

    fn produce(&self, candidate: &ScriptedCandidate) -> Result<ScriptedController, EvalError> {
        if candidate.unavailable {
            return Err(EvalError::ControllerUnavailable(candidate.name.to_string()));
        }
        let mut controller = ScriptedController::new(candidate.script.clone());
        controller.calls = Arc::clone(&candidate.calls);
        controller.fail_at = candidate.fail_at;
        controller.panic_at = candidate.panic_at;
        Ok(controller)
    }
}

/// One-hot output vector selecting `index`
pub fn one_hot(index: usize) -> Vec<f64> {
    let mut out = vec![0.0; 4];
    out[index] = 1.0;
    out
}
