use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reward draws at or above this value pay out the reward.
pub const REWARD_THRESHOLD: f64 = 0.5;

/// Scenario index offsets recorded for each terminal door state.
pub const LOCKED_SCENARIO_OFFSET: u32 = 50;
pub const REWARD_SCENARIO_OFFSET: u32 = 100;
pub const PUNISHMENT_SCENARIO_OFFSET: u32 = 200;

/// One-shot door state machine:
/// `Pending -> {Opened, Locked}`, `Opened -> {Rewarded, Punished}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorState {
    Pending,
    Opened,
    Locked,
    Rewarded,
    Punished,
}

#[derive(Debug, Error, PartialEq)]
pub enum DoorTransitionError {
    #[error("door cannot be opened from {from:?}")]
    NotPending { from: DoorState },
    #[error("door contents cannot be revealed from {from:?}")]
    NotOpened { from: DoorState },
}

impl DoorState {
    /// Opens the door iff `draw <= chance`.
    pub fn try_open(self, draw: f64, chance: f64) -> Result<Self, DoorTransitionError> {
        match self {
            Self::Pending if draw <= chance => Ok(Self::Opened),
            Self::Pending => Ok(Self::Locked),
            from => Err(DoorTransitionError::NotPending { from }),
        }
    }

    /// Decides what an opened door holds: reward iff `draw >= 0.5`.
    pub fn reveal(self, draw: f64) -> Result<Self, DoorTransitionError> {
        match self {
            Self::Opened if draw >= REWARD_THRESHOLD => Ok(Self::Rewarded),
            Self::Opened => Ok(Self::Punished),
            from => Err(DoorTransitionError::NotOpened { from }),
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Locked | Self::Rewarded | Self::Punished)
    }

    pub fn is_open(self) -> bool {
        matches!(self, Self::Opened | Self::Rewarded | Self::Punished)
    }

    pub fn scenario_offset(self) -> u32 {
        match self {
            Self::Locked => LOCKED_SCENARIO_OFFSET,
            Self::Rewarded => REWARD_SCENARIO_OFFSET,
            Self::Punished => PUNISHMENT_SCENARIO_OFFSET,
            Self::Pending | Self::Opened => 0,
        }
    }
}

/// Final state of a resolved door and the coins it pays.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DoorResolution {
    pub state: DoorState,
    pub coin_delta: i64,
}

/// The two independent uniform draws behind one door.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoorDraws {
    pub open: f64,
    pub reward: f64,
}

/// Resolves a door from its open chance and two uniform draws.
///
/// The reward draw is only consulted when the door opens.
pub fn resolve_door(
    chance: f64,
    draws: DoorDraws,
    reward: u32,
    punishment: u32,
) -> Result<DoorResolution, DoorTransitionError> {
    let state = DoorState::Pending.try_open(draws.open, chance)?;
    let state = if state.is_open() {
        state.reveal(draws.reward)?
    } else {
        state
    };

    let coin_delta = match state {
        DoorState::Rewarded => i64::from(reward),
        DoorState::Punished => -i64::from(punishment),
        _ => 0,
    };

    Ok(DoorResolution { state, coin_delta })
}
