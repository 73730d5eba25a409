//! Shared setup for commands - config resolution and genome files
//!
//! Level 3 - Steps shared by `evaluate` and `watch`

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use gridrun_eval::{EvalConfig, LinearGenome, VariantConfig};

/// Observation/action geometry selectable from the command line
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum VariantArg {
    /// Radius-1 scan with threat channel, LURD actions
    HazardAware,
    /// Radius-4 scan, no threat channel, LRUD actions
    WideWindow,
}

impl VariantArg {
    pub fn to_config(self) -> VariantConfig {
        match self {
            VariantArg::HazardAware => VariantConfig::hazard_aware(),
            VariantArg::WideWindow => VariantConfig::wide_window(),
        }
    }
}

/// Command-line overrides applied on top of a config file
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub variant: Option<VariantArg>,
    pub trials: Option<u32>,
    pub timesteps: Option<u32>,
    pub seed: Option<u64>,
    pub parallel: bool,
}

/// Load the config file (or defaults), apply overrides, validate
pub fn resolve_config(overrides: &Overrides) -> Result<EvalConfig> {
    let mut config = match &overrides.config {
        Some(path) => EvalConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EvalConfig::default(),
    };

    if let Some(variant) = overrides.variant {
        config.variant = variant.to_config();
    }
    if let Some(trials) = overrides.trials {
        config.num_trials = trials;
    }
    if let Some(timesteps) = overrides.timesteps {
        config.max_timesteps = timesteps;
    }
    if let Some(seed) = overrides.seed {
        config.seed = Some(seed);
    }
    if overrides.parallel {
        config.parallel = true;
    }

    config.validate().context("Invalid evaluation config")?;
    Ok(config)
}

/// Create RNG from seed or random
pub fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Random genomes sized for `config`'s variant, ids 0..count
pub fn random_population(
    config: &EvalConfig,
    count: usize,
    rng: &mut ChaCha8Rng,
) -> Vec<LinearGenome> {
    let inputs = config.variant.input_len();
    let outputs = config.variant.output_len();
    (0..count as u64)
        .map(|id| LinearGenome::random(rng, id, inputs, outputs))
        .collect()
}

/// Read a JSON array of genomes
pub fn load_genomes(path: &Path) -> Result<Vec<LinearGenome>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read genomes from {}", path.display()))?;
    let genomes: Vec<LinearGenome> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse genomes in {}", path.display()))?;
    if genomes.is_empty() {
        bail!("No genomes in {}", path.display());
    }
    Ok(genomes)
}

/// Write genomes (with their fitness) as pretty JSON
pub fn save_genomes(genomes: &[LinearGenome], path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(genomes)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write genomes to {}", path.display()))?;
    tracing::info!("Saved {} genomes to {}", genomes.len(), path.display());
    Ok(())
}

/// Warn about genomes whose weight count does not fit the variant
pub fn check_genome_sizes(genomes: &[LinearGenome], config: &EvalConfig) {
    let expected = config.variant.input_len() * config.variant.output_len();
    for genome in genomes.iter().filter(|g| g.weights.len() != expected) {
        tracing::warn!(
            "genome {} has {} weights, variant expects {}; it will score 0",
            genome.id,
            genome.weights.len(),
            expected
        );
    }
}
