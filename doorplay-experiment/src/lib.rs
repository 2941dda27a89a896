pub mod config;
pub mod schedule;
pub mod state;
pub mod trial;
pub use config::{ConfigError, ExperimentConfig, OpenChance, StartingDistance};
pub use schedule::{DoorPlan, build_block, value_grid};
pub use state::{ExperimentEvent, ExperimentStateMachine, SessionSummary};
pub use trial::{DoorTrial, TrialDurations, TrialTimestamps};
