//! Configuration types for evaluation
//!
//! Level 4 - Utilities and configuration

use std::path::Path;

use gridrun_core::Direction;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default timestep cap per trial
pub const DEFAULT_MAX_TIMESTEPS: u32 = 10_000;
/// Default trials per candidate
pub const DEFAULT_NUM_TRIALS: u32 = 10;
/// Default consecutive revisits tolerated before a trial counts as stuck
pub const DEFAULT_STUCK_BUDGET: u32 = 100;
/// Default pause between display frames
pub const DEFAULT_FRAME_DELAY_MS: u64 = 60;
/// Base seed used when none is configured
pub const DEFAULT_SEED: u64 = 42;

/// Largest accepted scan or capacity radius (a 129x129 window)
pub const MAX_WINDOW_RADIUS: u32 = 64;

const MAX_FRAME_DELAY_MS: u64 = 10_000;

/// Channels emitted per observed cell
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelSet {
    /// Occupancy and reward
    #[default]
    Basic,
    /// Occupancy, reward and threat
    HazardAware,
}

impl ChannelSet {
    /// Number of values written per cell
    pub fn count(self) -> usize {
        match self {
            ChannelSet::Basic => 2,
            ChannelSet::HazardAware => 3,
        }
    }
}

/// Observation geometry and action mapping for one environment variant
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariantConfig {
    /// Radius of the scanned square around the agent
    pub window_radius: u32,
    /// Radius the input vector is sized for (None = window radius)
    #[serde(default)]
    pub capacity_radius: Option<u32>,
    /// Channels per cell
    pub channels: ChannelSet,
    /// Output index to direction
    pub action_table: [Direction; 4],
}

impl Default for VariantConfig {
    fn default() -> Self {
        Self::hazard_aware()
    }
}

impl VariantConfig {
    /// Tight 3x3 scan with threat channel, sized for a 5x5 window
    pub fn hazard_aware() -> Self {
        Self {
            window_radius: 1,
            capacity_radius: Some(2),
            channels: ChannelSet::HazardAware,
            action_table: [Direction::Left, Direction::Up, Direction::Right, Direction::Down],
        }
    }

    /// Wide 9x9 scan without threat channel
    pub fn wide_window() -> Self {
        Self {
            window_radius: 4,
            capacity_radius: None,
            channels: ChannelSet::Basic,
            action_table: [Direction::Left, Direction::Right, Direction::Up, Direction::Down],
        }
    }

    pub fn capacity_radius(&self) -> u32 {
        self.capacity_radius.unwrap_or(self.window_radius)
    }

    /// Allocated observation length, bias included
    pub fn input_len(&self) -> usize {
        allocated_len(self.capacity_radius(), self.channels)
    }

    /// Controller output length
    pub fn output_len(&self) -> usize {
        self.action_table.len()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (field, radius) in [
            ("window_radius", self.window_radius),
            ("capacity_radius", self.capacity_radius()),
        ] {
            if radius > MAX_WINDOW_RADIUS {
                return Err(ConfigError::Radius {
                    field,
                    radius,
                    max: MAX_WINDOW_RADIUS,
                });
            }
        }
        if self.capacity_radius() < self.window_radius {
            return Err(ConfigError::Capacity {
                window: self.window_radius,
                capacity: self.capacity_radius(),
            });
        }
        for (i, dir) in self.action_table.iter().enumerate() {
            if self.action_table[..i].contains(dir) {
                return Err(ConfigError::DuplicateAction(*dir));
            }
        }
        Ok(())
    }
}

/// Vector length for a window of `capacity_radius`, bias included.
/// Radii above `MAX_WINDOW_RADIUS` are clamped.
pub(crate) fn allocated_len(capacity_radius: u32, channels: ChannelSet) -> usize {
    let side = 2 * capacity_radius.min(MAX_WINDOW_RADIUS) as usize + 1;
    side * side * channels.count() + 1
}

/// Human-visible display mode
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Render frames and run a single trial
    pub enabled: bool,
    /// Pause after each rendered frame
    pub frame_delay_ms: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            frame_delay_ms: DEFAULT_FRAME_DELAY_MS,
        }
    }
}

/// Configuration for fitness evaluation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Timestep cap per trial
    pub max_timesteps: u32,
    /// Trials per candidate
    pub num_trials: u32,
    /// Consecutive revisits tolerated before a trial counts as stuck
    pub stuck_budget: u32,
    /// Base seed for environments (None = DEFAULT_SEED)
    pub seed: Option<u64>,
    /// Evaluate candidates on the rayon pool
    pub parallel: bool,
    /// Display mode settings
    pub display: DisplayConfig,
    /// Observation and action geometry
    pub variant: VariantConfig,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            max_timesteps: DEFAULT_MAX_TIMESTEPS,
            num_trials: DEFAULT_NUM_TRIALS,
            stuck_budget: DEFAULT_STUCK_BUDGET,
            seed: None,
            parallel: false,
            display: DisplayConfig::default(),
            variant: VariantConfig::default(),
        }
    }
}

impl EvalConfig {
    /// Create config with the given number of trials per candidate
    pub fn new(num_trials: u32) -> Self {
        Self {
            num_trials,
            ..Default::default()
        }
    }

    /// Set base seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_trials(mut self, num_trials: u32) -> Self {
        self.num_trials = num_trials;
        self
    }

    pub fn with_timesteps(mut self, max_timesteps: u32) -> Self {
        self.max_timesteps = max_timesteps;
        self
    }

    pub fn with_variant(mut self, variant: VariantConfig) -> Self {
        self.variant = variant;
        self
    }

    pub fn with_display(mut self, enabled: bool) -> Self {
        self.display.enabled = enabled;
        self
    }

    pub fn base_seed(&self) -> u64 {
        self.seed.unwrap_or(DEFAULT_SEED)
    }

    /// Environment seed for the `trial`-th trial of every candidate
    pub fn trial_seed(&self, trial: u32) -> u64 {
        self.base_seed().wrapping_add(trial as u64)
    }

    /// Trials actually run per candidate (one in display mode)
    pub fn effective_trials(&self) -> u32 {
        if self.display.enabled {
            1
        } else {
            self.num_trials
        }
    }

    /// Reject configurations the harness cannot run
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_timesteps == 0 {
            return Err(ConfigError::Zero {
                field: "max_timesteps",
            });
        }
        if self.num_trials == 0 {
            return Err(ConfigError::Zero {
                field: "num_trials",
            });
        }
        if self.stuck_budget == 0 {
            return Err(ConfigError::Zero {
                field: "stuck_budget",
            });
        }
        if self.display.frame_delay_ms > MAX_FRAME_DELAY_MS {
            return Err(ConfigError::FrameDelay(self.display.frame_delay_ms));
        }
        self.variant.validate()
    }

    /// Parse and validate a JSON document; missing fields take defaults
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: EvalConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }
}
