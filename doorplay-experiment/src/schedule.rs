use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::config::ExperimentConfig;

/// One scheduled door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorPlan {
    pub reward: u32,
    pub punishment: u32,
    /// 1-based position in the reward × punishment grid.
    pub scenario_index: u32,
    pub high_value: bool,
}

/// Every reward/punishment pairing, rewards outermost.
pub fn value_grid(config: &ExperimentConfig) -> Vec<DoorPlan> {
    let top_reward = config.rewards.iter().copied().max().unwrap_or(0);
    let mut grid = Vec::with_capacity(config.rewards.len() * config.punishments.len());
    for &reward in &config.rewards {
        for &punishment in &config.punishments {
            grid.push(DoorPlan {
                reward,
                punishment,
                scenario_index: grid.len() as u32 + 1,
                high_value: reward == top_reward,
            });
        }
    }
    grid
}

/// Builds `len` doors by cycling freshly shuffled copies of the grid.
pub fn build_block<R: Rng + ?Sized>(
    config: &ExperimentConfig,
    len: usize,
    rng: &mut R,
) -> Vec<DoorPlan> {
    let grid = value_grid(config);
    if grid.is_empty() {
        return Vec::new();
    }

    let mut block = Vec::with_capacity(len);
    while block.len() < len {
        let mut pass = grid.clone();
        pass.shuffle(rng);
        let take = (len - block.len()).min(pass.len());
        block.extend_from_slice(&pass[..take]);
    }
    block
}
