use std::path::PathBuf;

use crate::outcome::DoorState;

pub const MOVE_FORWARD: &str = "Move Forward";
pub const MOVE_BACKWARD: &str = "Move Backward";
pub const OPEN_DOOR: &str = "Open Door";
pub const CONTINUE: &str = "Continue";
pub const FINISH: &str = "Finish";

/// Door image width at scale 1.0.
pub const DOOR_BASE_WIDTH: f32 = 500.0;

/// Everything a front end needs to draw the current screen.
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    Instructions {
        image: PathBuf,
        caption: &'static str,
    },
    Message {
        text: String,
        button: &'static str,
    },
    Door(DoorView),
    Wheel {
        video: PathBuf,
        award: u32,
    },
    /// Between a block's last door and the next phase.
    Blank,
    Finished,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DoorView {
    pub image: PathBuf,
    pub caption: String,
    pub scale: f32,
    pub location: f64,
    pub distance: u8,
    pub total_coins: i64,
    pub stage: DoorStage,
    pub progress: Option<(usize, usize)>,
    pub practice: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DoorStage {
    Approach,
    Revealed { state: DoorState, coin_delta: i64 },
    Iti { fraction: f32 },
}

impl DoorView {
    pub fn width_px(&self) -> u32 {
        (DOOR_BASE_WIDTH * self.scale).round() as u32
    }
}

impl DoorStage {
    /// Feedback line for a revealed door.
    pub fn banner(&self) -> Option<String> {
        match *self {
            DoorStage::Revealed {
                state: DoorState::Rewarded,
                coin_delta,
            } => Some(format!("You earned {coin_delta} coins!")),
            DoorStage::Revealed {
                state: DoorState::Punished,
                coin_delta,
            } => Some(format!("You lost {} coins!", -coin_delta)),
            DoorStage::Revealed { .. } => Some("The door did not open.".to_string()),
            _ => None,
        }
    }
}

impl Screen {
    /// Labels of the controls active on this screen.
    pub fn controls(&self) -> &'static [&'static str] {
        match self {
            Screen::Door(DoorView {
                stage: DoorStage::Approach,
                ..
            }) => &[MOVE_FORWARD, MOVE_BACKWARD, OPEN_DOOR],
            Screen::Door(_) | Screen::Blank | Screen::Finished => &[],
            Screen::Message { button, .. } if *button == FINISH => &[FINISH],
            Screen::Instructions { .. } | Screen::Message { .. } | Screen::Wheel { .. } => {
                &[CONTINUE]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(stage: DoorStage) -> DoorView {
        DoorView {
            image: PathBuf::from("p1r1.jpg"),
            caption: "Reward: 1, Punishment: 1".into(),
            scale: 1.2,
            location: 0.2,
            distance: 55,
            total_coins: 0,
            stage,
            progress: Some((1, 10)),
            practice: false,
        }
    }

    #[test]
    fn banners_follow_outcome() {
        let won = DoorStage::Revealed {
            state: DoorState::Rewarded,
            coin_delta: 5,
        };
        let lost = DoorStage::Revealed {
            state: DoorState::Punished,
            coin_delta: -3,
        };
        let locked = DoorStage::Revealed {
            state: DoorState::Locked,
            coin_delta: 0,
        };
        assert_eq!(won.banner().as_deref(), Some("You earned 5 coins!"));
        assert_eq!(lost.banner().as_deref(), Some("You lost 3 coins!"));
        assert_eq!(locked.banner().as_deref(), Some("The door did not open."));
        assert_eq!(DoorStage::Approach.banner(), None);
    }

    #[test]
    fn door_width_tracks_scale() {
        assert_eq!(view(DoorStage::Approach).width_px(), 600);
    }

    #[test]
    fn approach_offers_movement_controls() {
        let screen = Screen::Door(view(DoorStage::Approach));
        assert_eq!(screen.controls(), &[MOVE_FORWARD, MOVE_BACKWARD, OPEN_DOOR]);
        let waiting = Screen::Door(view(DoorStage::Iti { fraction: 0.5 }));
        assert!(waiting.controls().is_empty());
    }
}
