use std::time::Duration;

use doorplay_core::{DoorResolution, TrialRecord, TrialState, normalize_location};

use super::schedule::DoorPlan;

/// Door image scale bounds and step per movement.
pub const MIN_SCALE: f32 = 0.5;
pub const MAX_SCALE: f32 = 2.0;
pub const SCALE_STEP: f32 = 0.1;

pub struct DoorTrial<T> {
    pub id: usize,
    pub plan: DoorPlan,
    /// Clamped raw location.
    pub location: f64,
    pub scale: f32,
    pub record: TrialRecord,
    pub resolution: Option<DoorResolution>,
    pub durations: TrialDurations,
    pub timestamps: TrialTimestamps<T>,
    pub state: TrialState,
}

#[derive(Debug, Clone)]
pub struct TrialDurations {
    pub anticipation: Duration,
    pub iti: Duration,
}

#[derive(Debug, Clone)]
pub struct TrialTimestamps<T> {
    pub start: T,
    pub resolved: Option<T>,
    pub iti_start: Option<T>,
}

impl<T> DoorTrial<T> {
    pub fn distance(&self) -> u8 {
        normalize_location(self.location)
    }

    /// Grows the door image on approach and shrinks it on retreat.
    pub fn rescale(&mut self, units: f64) {
        let step = if units > 0.0 { SCALE_STEP } else { -SCALE_STEP };
        self.scale = (self.scale + step).clamp(MIN_SCALE, MAX_SCALE);
    }
}
