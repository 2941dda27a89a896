use serde::{Deserialize, Serialize};

use crate::location::normalize_location;
use crate::outcome::{DoorResolution, DoorState};

/// Door trial lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialState {
    Approach,
    Anticipation,
    Iti,
    Complete,
}

/// Outcome category of an opened door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeKind {
    Reward,
    Punishment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoorStatus {
    Opened,
    Closed,
}

/// Recorded measurements for one door, keyed by the task's column names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    #[serde(rename = "TrialId")]
    pub trial_id: usize,
    #[serde(rename = "Session")]
    pub session: u8,
    #[serde(rename = "Reward")]
    pub reward: u32,
    #[serde(rename = "Punishment")]
    pub punishment: u32,
    #[serde(rename = "StartTime")]
    pub start_time: f64,
    #[serde(rename = "CurrentTime")]
    pub current_time: f64,
    #[serde(rename = "DistanceAtStart")]
    pub distance_at_start: f64,
    #[serde(rename = "CurrentDistance")]
    pub current_distance: u8,
    #[serde(rename = "Distance_min")]
    pub distance_min: Option<u8>,
    #[serde(rename = "Distance_max")]
    pub distance_max: Option<u8>,
    #[serde(rename = "ScenarioIndex")]
    pub scenario_index: u32,
    #[serde(rename = "Door_opened")]
    pub door_opened: Option<bool>,
    #[serde(rename = "DoorStatus")]
    pub door_status: Option<DoorStatus>,
    #[serde(rename = "Door_outcome")]
    pub door_outcome: Option<OutcomeKind>,
    #[serde(rename = "DidWin")]
    pub did_win: Option<bool>,
    #[serde(rename = "Total_coins")]
    pub total_coins: i64,
    #[serde(rename = "DoorAction_RT")]
    pub door_action_rt_ms: Option<f64>,
    #[serde(rename = "Door_anticipation_time")]
    pub door_anticipation_ms: Option<f64>,
}

/// Rounds to two decimals, the precision every time column is kept at.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl TrialRecord {
    /// Opens a record for a door set up at `location`.
    pub fn begin(start_time: f64, location: f64, scenario_index: u32) -> Self {
        let distance = normalize_location(location);
        Self {
            start_time,
            distance_at_start: location * 100.0,
            current_distance: distance,
            distance_min: Some(distance),
            distance_max: Some(distance),
            scenario_index,
            ..Default::default()
        }
    }

    /// Records a new normalized distance observed at `now` (seconds).
    pub fn update_movement(&mut self, distance: u8, now: f64) {
        self.current_time = round2(now - self.start_time);
        self.current_distance = distance;
        self.distance_max = Some(self.distance_max.unwrap_or(0).max(distance));
        self.distance_min = Some(self.distance_min.unwrap_or(100).min(distance));
    }

    /// Closes the record with the resolved door and the running coin total.
    pub fn record_outcome(&mut self, resolution: &DoorResolution, total_coins: i64, now: f64) {
        let opened = resolution.state.is_open();
        self.door_opened = Some(opened);
        self.door_status = Some(if opened {
            DoorStatus::Opened
        } else {
            DoorStatus::Closed
        });
        match resolution.state {
            DoorState::Rewarded => {
                self.did_win = Some(true);
                self.door_outcome = Some(OutcomeKind::Reward);
            }
            DoorState::Punished => {
                self.did_win = Some(false);
                self.door_outcome = Some(OutcomeKind::Punishment);
            }
            _ => {}
        }
        self.scenario_index += resolution.state.scenario_offset();
        self.total_coins = total_coins;
        self.current_time = round2(now - self.start_time);
        self.door_action_rt_ms = Some(round2((now - self.start_time) * 1000.0));
    }

    pub fn is_closed(&self) -> bool {
        self.door_status.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::{DoorResolution, DoorState};

    #[test]
    fn begin_seeds_min_and_max_from_start() {
        let record = TrialRecord::begin(10.0, 0.1, 7);
        assert_eq!(record.current_distance, 53);
        assert_eq!(record.distance_min, Some(53));
        assert_eq!(record.distance_max, Some(53));
        assert!((record.distance_at_start - 10.0).abs() < 1e-9);
        assert_eq!(record.scenario_index, 7);
    }

    #[test]
    fn updates_keep_current_between_min_and_max() {
        let mut record = TrialRecord::default();
        for (i, distance) in [50u8, 53, 57, 45, 0, 100, 62].into_iter().enumerate() {
            record.update_movement(distance, i as f64 * 0.5);
            let min = record.distance_min.unwrap();
            let max = record.distance_max.unwrap();
            assert!(min <= record.current_distance && record.current_distance <= max);
        }
        assert_eq!(record.distance_min, Some(0));
        assert_eq!(record.distance_max, Some(100));
    }

    #[test]
    fn first_zero_sets_both_bounds() {
        let mut record = TrialRecord::default();
        record.update_movement(0, 1.0);
        assert_eq!(record.distance_max, Some(0));
        assert_eq!(record.distance_min, Some(0));
        assert_eq!(record.current_distance, 0);

        let mut record = TrialRecord::default();
        record.update_movement(100, 1.0);
        assert_eq!(record.distance_min, Some(100));
        assert_eq!(record.distance_max, Some(100));
    }

    #[test]
    fn elapsed_time_is_rounded() {
        let mut record = TrialRecord::begin(1.0, 0.0, 1);
        record.update_movement(55, 3.456_78);
        assert_eq!(record.current_time, 2.46);
    }

    #[test]
    fn outcome_fills_door_columns() {
        let mut record = TrialRecord::begin(2.0, 0.0, 3);
        let resolution = DoorResolution {
            state: DoorState::Punished,
            coin_delta: -5,
        };
        record.record_outcome(&resolution, -5, 3.5);

        assert!(record.is_closed());
        assert_eq!(record.door_opened, Some(true));
        assert_eq!(record.door_status, Some(DoorStatus::Opened));
        assert_eq!(record.door_outcome, Some(OutcomeKind::Punishment));
        assert_eq!(record.did_win, Some(false));
        assert_eq!(record.scenario_index, 203);
        assert_eq!(record.door_action_rt_ms, Some(1500.0));
    }

    #[test]
    fn serializes_with_column_names() {
        let record = TrialRecord::begin(0.0, 0.0, 1);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["CurrentDistance"], 50);
        assert_eq!(json["Distance_max"], 50);
        assert!(json["DoorStatus"].is_null());
    }
}
