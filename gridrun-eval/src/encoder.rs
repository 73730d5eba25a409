//! Observation encoding - environment state to controller input
//!
//! Level 3 - Step-level implementation

use crate::config::{allocated_len, ChannelSet, VariantConfig, MAX_WINDOW_RADIUS};
use crate::environment::Environment;

/// Turns an environment snapshot into a fixed-length input vector
pub trait ObservationEncoder: Sync {
    /// Allocated length of every vector returned by `encode`
    fn input_len(&self) -> usize;

    fn encode<E: Environment + ?Sized>(&self, env: &E) -> Vec<f64>;
}

/// Square window scan around the agent.
///
/// Cells are visited column by column (x outer, y inner). Cells outside the
/// environment bounds are skipped, not zero-filled, so populated values pack
/// to the front of the vector. The bias 1.0 follows the last populated cell
/// and any remaining slots stay 0.0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowEncoder {
    radius: i32,
    channels: ChannelSet,
    input_len: usize,
}

impl WindowEncoder {
    /// Both radii are clamped to `MAX_WINDOW_RADIUS`
    pub fn new(radius: u32, capacity_radius: u32, channels: ChannelSet) -> Self {
        let radius = radius.min(MAX_WINDOW_RADIUS);
        Self {
            radius: radius as i32,
            channels,
            input_len: allocated_len(capacity_radius.max(radius), channels),
        }
    }

    pub fn from_variant(variant: &VariantConfig) -> Self {
        Self::new(variant.window_radius, variant.capacity_radius(), variant.channels)
    }

    pub fn radius(&self) -> u32 {
        self.radius as u32
    }

    pub fn channels(&self) -> ChannelSet {
        self.channels
    }
}

impl ObservationEncoder for WindowEncoder {
    fn input_len(&self) -> usize {
        self.input_len
    }

    fn encode<E: Environment + ?Sized>(&self, env: &E) -> Vec<f64> {
        let mut input = vec![0.0; self.input_len];
        if !env.is_ready() {
            return input;
        }

        let (width, height) = env.bounds();
        let agent = env.agent_position();
        let mut p = 0;

        for x in agent.x - self.radius..=agent.x + self.radius {
            for y in agent.y - self.radius..=agent.y + self.radius {
                if x < 0 || y < 0 || x >= width || y >= height {
                    continue;
                }
                input[p] = flag(env.is_traversable(x, y));
                input[p + 1] = flag(env.has_reward(x, y));
                if self.channels == ChannelSet::HazardAware {
                    input[p + 2] = flag(env.has_threat(x, y));
                }
                p += self.channels.count();
            }
        }

        input[p] = 1.0;
        input
    }
}

fn flag(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::GridStub;
    use gridrun_core::Pos;

    fn populated(input: &[f64]) -> usize {
        // Bias is the last non-zero slot
        input.iter().rposition(|&v| v != 0.0).map_or(0, |i| i + 1)
    }

    #[test]
    fn test_interior_scan_layout() {
        let mut env = GridStub::new(5, 5, Pos::new(2, 2));
        env.walls.push(Pos::new(1, 1));
        env.rewards.push(Pos::new(1, 2));
        env.threats.push(Pos::new(3, 3));

        let encoder = WindowEncoder::new(1, 1, ChannelSet::HazardAware);
        let input = encoder.encode(&env);
        assert_eq!(input.len(), 9 * 3 + 1);

        // x=1 column first: (1,1) wall, (1,2) reward
        assert_eq!(&input[0..3], &[0.0, 0.0, 0.0]);
        assert_eq!(&input[3..6], &[1.0, 1.0, 0.0]);
        // last cell (3,3) carries the threat
        assert_eq!(&input[24..27], &[1.0, 0.0, 1.0]);
        assert_eq!(input[27], 1.0);
    }

    #[test]
    fn test_corner_skips_out_of_bounds() {
        // Panics if any out-of-bounds cell is queried
        let env = GridStub::new(20, 20, Pos::new(0, 0));
        let encoder = WindowEncoder::new(1, 1, ChannelSet::HazardAware);
        let input = encoder.encode(&env);

        assert_eq!(input.len(), 28);
        // 4 in-bounds cells, 3 channels, then bias
        assert_eq!(populated(&input), 4 * 3 + 1);
        assert_eq!(input[12], 1.0);
        assert!(input[13..].iter().all(|&v| v == 0.0));
        assert!(populated(&input) < input.len());
    }

    #[test]
    fn test_edge_skip_is_not_clamp() {
        let mut env = GridStub::new(20, 20, Pos::new(19, 10));
        env.rewards.push(Pos::new(18, 9));

        let encoder = WindowEncoder::new(1, 1, ChannelSet::Basic);
        let input = encoder.encode(&env);
        // Columns 18 and 19 only: 6 cells x 2 channels, reward at the first cell
        assert_eq!(&input[0..2], &[1.0, 1.0]);
        assert_eq!(input[12], 1.0);
        assert!(input[13..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_capacity_larger_than_scan() {
        let env = GridStub::new(20, 20, Pos::new(10, 10));
        let encoder = WindowEncoder::from_variant(&VariantConfig::hazard_aware());
        let input = encoder.encode(&env);
        assert_eq!(input.len(), 5 * 5 * 3 + 1);
        assert_eq!(input[27], 1.0);
        assert!(input[28..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_wide_window_interior_fills_vector() {
        let env = GridStub::new(20, 20, Pos::new(10, 10));
        let encoder = WindowEncoder::from_variant(&VariantConfig::wide_window());
        let input = encoder.encode(&env);
        assert_eq!(input.len(), 163);
        assert_eq!(input[162], 1.0);
    }

    #[test]
    fn test_uninitialised_environment_gives_zeros() {
        let mut env = GridStub::new(20, 20, Pos::new(10, 10));
        env.ready = false;
        let encoder = WindowEncoder::from_variant(&VariantConfig::wide_window());
        let input = encoder.encode(&env);
        assert_eq!(input.len(), 163);
        assert!(input.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_oversized_radius_is_clamped() {
        let encoder = WindowEncoder::new(u32::MAX, u32::MAX, ChannelSet::HazardAware);
        assert_eq!(encoder.radius(), MAX_WINDOW_RADIUS);
        assert_eq!(encoder.input_len(), 129 * 129 * 3 + 1);

        let env = GridStub::new(20, 20, Pos::new(10, 10));
        let input = encoder.encode(&env);
        // Whole 20x20 grid fits inside the clamped window
        assert_eq!(input[400 * 3], 1.0);
    }

    #[test]
    fn test_capacity_never_below_scan() {
        let encoder = WindowEncoder::new(3, 1, ChannelSet::Basic);
        assert_eq!(encoder.input_len(), 7 * 7 * 2 + 1);
    }
}
