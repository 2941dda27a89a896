use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::messages::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundKind {
    Lock,
    Reward,
    Punishment,
    Beep,
}

/// Relative paths of the task's sound effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundTable {
    pub lock: PathBuf,
    pub reward: PathBuf,
    pub punishment: PathBuf,
    pub beep: PathBuf,
}

impl Default for SoundTable {
    fn default() -> Self {
        Self {
            lock: "sounds/click_1s.wav".into(),
            reward: "sounds/new_reward.mp3".into(),
            punishment: "sounds/monster.mp3".into(),
            beep: "sounds/beep_for_anticipation.mp3".into(),
        }
    }
}

impl SoundTable {
    pub fn path(&self, kind: SoundKind) -> &Path {
        match kind {
            SoundKind::Lock => &self.lock,
            SoundKind::Reward => &self.reward,
            SoundKind::Punishment => &self.punishment,
            SoundKind::Beep => &self.beep,
        }
    }
}

/// Instruction screens that are shown as a single full-width image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionScreen {
    PracticeStart,
    StartMainGame,
    SimulationRunEnd,
}

impl InstructionScreen {
    fn file_stem(self) -> &'static str {
        match self {
            Self::PracticeStart => "practice_start",
            Self::StartMainGame => "start_main_game",
            Self::SimulationRunEnd => "SimulationRunEnd",
        }
    }
}

/// Builds asset paths under a common root.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetPaths {
    pub root: PathBuf,
    pub door_image_prefix: String,
    pub image_suffix: String,
}

impl AssetPaths {
    pub fn new(root: impl Into<PathBuf>, door_image_prefix: &str, image_suffix: &str) -> Self {
        Self {
            root: root.into(),
            door_image_prefix: door_image_prefix.to_string(),
            image_suffix: image_suffix.to_string(),
        }
    }

    pub fn door_image(&self, reward: u32, punishment: u32) -> PathBuf {
        self.root.join(format!(
            "{}p{}r{}{}",
            self.door_image_prefix, punishment, reward, self.image_suffix
        ))
    }

    pub fn instruction_image(&self, language: Language, screen: InstructionScreen) -> PathBuf {
        self.root
            .join("img")
            .join(format!("Instructions{}", language.name()))
            .join(format!("{}.jpeg", screen.file_stem()))
    }

    pub fn wheel_video(&self, language: Language, award: u32) -> PathBuf {
        self.root
            .join("img")
            .join("Wheels")
            .join(format!("{}_{}.mp4", award, language.short_tag()))
    }

    pub fn sound(&self, table: &SoundTable, kind: SoundKind) -> PathBuf {
        self.root.join(table.path(kind))
    }
}

/// Returns the path when it exists, logging a warning otherwise.
pub fn existing_asset(path: &Path) -> Option<&Path> {
    if path.exists() {
        Some(path)
    } else {
        log::warn!("asset {} not found, skipping", path.display());
        None
    }
}
