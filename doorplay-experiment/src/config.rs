use std::path::{Path, PathBuf};

use doorplay_core::{AssetPaths, InputMode, Language, MAX_LOCATION, MIN_LOCATION, SoundTable};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where the participant starts relative to the door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StartingDistance {
    /// Anywhere in the full location range.
    #[serde(rename = "random", alias = "Random")]
    Random,
    /// Within a fifth of each bound, roughly distances 40 to 60.
    #[serde(rename = "40-60")]
    NearOrigin,
    #[default]
    #[serde(rename = "origin")]
    Origin,
}

impl StartingDistance {
    /// Raw location range to draw the start from, if any.
    pub fn range(self) -> Option<(f64, f64)> {
        match self {
            Self::Random => Some((MIN_LOCATION, MAX_LOCATION)),
            Self::NearOrigin => Some((MIN_LOCATION / 5.0, MAX_LOCATION / 5.0)),
            Self::Origin => None,
        }
    }
}

/// Which quantity is read as the door-open probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenChance {
    /// `location / 100` on the clamped raw location.
    #[default]
    RawLocation,
    /// `distance / 100` on the normalized distance.
    NormalizedDistance,
}

impl OpenChance {
    pub fn chance(self, location: f64, distance: u8) -> f64 {
        match self {
            Self::RawLocation => location / 100.0,
            Self::NormalizedDistance => f64::from(distance) / 100.0,
        }
    }
}

/// Errors raised while loading or validating an experiment configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
    #[error("{field} must be positive (got {value})")]
    NotPositive { field: &'static str, value: f64 },
    #[error("ITI window invalid (min {min} ms > max {max} ms)")]
    ItiRange { min: u64, max: u64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub language: Language,
    pub input_mode: InputMode,
    pub starting_distance: StartingDistance,
    pub open_chance: OpenChance,
    pub rewards: Vec<u32>,
    pub punishments: Vec<u32>,
    pub practice_trials: usize,
    pub trials_per_block: usize,
    pub step_units: f64,
    pub anticipation_base_ms: u64,
    pub anticipation_jitter_ms: u64,
    pub iti_range_ms: (u64, u64),
    pub wheel_awards: Vec<u32>,
    pub asset_root: PathBuf,
    pub door_image_prefix: String,
    pub image_suffix: String,
    pub sounds: SoundTable,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            language: Language::English,
            input_mode: InputMode::Keyboard,
            starting_distance: StartingDistance::Origin,
            open_chance: OpenChance::RawLocation,
            rewards: vec![1, 3, 5],
            punishments: vec![1, 3, 5],
            practice_trials: 3,
            trials_per_block: 9,
            step_units: doorplay_core::STEP_UNITS,
            anticipation_base_ms: 3000,
            anticipation_jitter_ms: 1000,
            iti_range_ms: (1000, 2000),
            wheel_awards: vec![5, 6, 7],
            asset_root: PathBuf::from("."),
            door_image_prefix: "img/Doors/".to_string(),
            image_suffix: ".jpg".to_string(),
            sounds: SoundTable::default(),
        }
    }
}

impl ExperimentConfig {
    /// Reads a JSON config; missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rewards.is_empty() {
            return Err(ConfigError::Empty { field: "rewards" });
        }
        if self.punishments.is_empty() {
            return Err(ConfigError::Empty {
                field: "punishments",
            });
        }
        if self.wheel_awards.is_empty() {
            return Err(ConfigError::Empty {
                field: "wheel_awards",
            });
        }
        if self.trials_per_block == 0 {
            return Err(ConfigError::NotPositive {
                field: "trials_per_block",
                value: 0.0,
            });
        }
        if self.step_units.is_nan() || self.step_units <= 0.0 {
            return Err(ConfigError::NotPositive {
                field: "step_units",
                value: self.step_units,
            });
        }
        let (min, max) = self.iti_range_ms;
        if min > max {
            return Err(ConfigError::ItiRange { min, max });
        }
        Ok(())
    }

    pub fn asset_paths(&self) -> AssetPaths {
        AssetPaths::new(
            self.asset_root.clone(),
            &self.door_image_prefix,
            &self.image_suffix,
        )
    }

    /// Trials in the block for `session`; session 0 is practice.
    pub fn block_len(&self, session: u8) -> usize {
        if session == 0 {
            self.practice_trials
        } else {
            self.trials_per_block
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(ExperimentConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: ExperimentConfig = serde_json::from_str(
            r#"{ "language": "Hebrew", "starting_distance": "40-60", "open_chance": "normalized_distance" }"#,
        )
        .unwrap();
        assert_eq!(config.language, Language::Hebrew);
        assert_eq!(config.starting_distance, StartingDistance::NearOrigin);
        assert_eq!(config.open_chance, OpenChance::NormalizedDistance);
        assert_eq!(config.rewards, vec![1, 3, 5]);
    }

    #[test]
    fn starting_distance_accepts_capitalized_random() {
        let config: ExperimentConfig =
            serde_json::from_str(r#"{ "starting_distance": "Random" }"#).unwrap();
        assert_eq!(config.starting_distance, StartingDistance::Random);
        let config: ExperimentConfig =
            serde_json::from_str(r#"{ "starting_distance": "random" }"#).unwrap();
        assert_eq!(config.starting_distance, StartingDistance::Random);
    }

    #[test]
    fn rejects_inverted_iti_window() {
        let config = ExperimentConfig {
            iti_range_ms: (3000, 1000),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ItiRange {
                min: 3000,
                max: 1000
            })
        ));
    }

    #[test]
    fn rejects_empty_value_grid() {
        let config = ExperimentConfig {
            punishments: Vec::new(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Empty {
                field: "punishments"
            })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = ExperimentConfig::load(Path::new("no/such/config.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn open_chance_sources() {
        assert_eq!(OpenChance::RawLocation.chance(1.0, 77), 0.01);
        assert_eq!(OpenChance::NormalizedDistance.chance(1.0, 77), 0.77);
    }

    #[test]
    fn starting_ranges() {
        assert_eq!(StartingDistance::Origin.range(), None);
        let (lo, hi) = StartingDistance::NearOrigin.range().unwrap();
        assert!((lo + 0.22).abs() < 1e-12);
        assert!((hi - 0.37).abs() < 1e-12);
    }
}
