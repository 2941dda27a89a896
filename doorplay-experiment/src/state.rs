use super::config::ExperimentConfig;
use super::schedule::{DoorPlan, build_block};
use super::trial::{DoorTrial, TrialDurations, TrialTimestamps};
use doorplay_core::screen::{CONTINUE, FINISH};
use doorplay_core::{
    AssetPaths, DoorDraws, DoorStage, DoorState, DoorView, InstructionScreen, Phase, Screen,
    SoundKind, TrialRecord, TrialState, advance_location, catalog, resolve_door, round2,
    step_location,
};
use doorplay_timing::Timer;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExperimentEvent {
    MoveForward,
    MoveBackward,
    Confirm,
    Continue,
    AnticipationElapsed,
    ItiElapsed,
    PhaseComplete,
}

/// Aggregate figures over every completed door.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionSummary {
    pub trials: usize,
    pub doors_opened: usize,
    pub rewards: usize,
    pub punishments: usize,
    pub total_coins: i64,
    pub mean_rt_ms: Option<f64>,
    pub wheel_award: Option<u32>,
}

pub struct ExperimentStateMachine<P, T, R>
where
    P: Phase,
    T: Timer,
    R: Rng,
{
    pub phase: P,
    pub timer: T,
    pub rng: R,
    pub config: ExperimentConfig,
    pub assets: AssetPaths,
    pub current: Option<DoorTrial<T::Timestamp>>,
    pub block: Vec<DoorPlan>,
    pub trial_number: usize,
    pub phase_trial_number: usize,
    pub results: Vec<TrialRecord>,
    pub total_coins: i64,
    pub wheel_award: Option<u32>,
    pub finished: bool,
    cues: Vec<SoundKind>,
}

impl<P, T, R> ExperimentStateMachine<P, T, R>
where
    P: Phase,
    T: Timer<Timestamp = u64>,
    R: Rng,
{
    pub fn new(config: ExperimentConfig, timer: T, rng: R) -> Self {
        let assets = config.asset_paths();
        Self {
            phase: P::default(),
            timer,
            rng,
            config,
            assets,
            current: None,
            block: Vec::new(),
            trial_number: 0,
            phase_trial_number: 0,
            results: Vec::new(),
            total_coins: 0,
            wheel_award: None,
            finished: false,
            cues: Vec::new(),
        }
    }

    pub fn advance_phase(&mut self) -> bool {
        if let Some(next) = self.phase.next() {
            self.phase = next;
            self.phase_trial_number = 0;
            self.enter_phase();
            true
        } else {
            self.finished = true;
            log::info!("Session finished with {} coins", self.total_coins);
            false
        }
    }

    fn enter_phase(&mut self) {
        log::info!("Entering phase {:?}", self.phase);

        if self.phase.is_block() {
            let session = self.phase.session().unwrap_or_default();
            let len = self.config.block_len(session);
            self.block = build_block(&self.config, len, &mut self.rng);
            self.start_trial();
        } else if self.phase.is_wheel() {
            self.wheel_award = self.config.wheel_awards.choose(&mut self.rng).copied();
            log::info!("Wheel award drawn: {:?}", self.wheel_award);
        } else if self.phase.is_summary() {
            let summary = self.summary();
            log::info!(
                "Results: {} doors, {} opened ({} rewarded, {} punished), {} coins, mean RT {:?} ms",
                summary.trials,
                summary.doors_opened,
                summary.rewards,
                summary.punishments,
                summary.total_coins,
                summary.mean_rt_ms,
            );
        }
    }

    /// Sets up the next scheduled door of the current block.
    pub fn start_trial(&mut self) {
        let Some(&plan) = self.block.get(self.phase_trial_number) else {
            return;
        };

        let location = match self.config.starting_distance.range() {
            Some((lo, hi)) => round2(self.rng.random_range(lo..=hi)),
            None => 0.0,
        };
        let jitter_ms = self.config.anticipation_jitter_ms as f64 * self.rng.random::<f64>();
        let anticipation = Duration::from_millis(self.config.anticipation_base_ms)
            + Duration::from_secs_f64(jitter_ms / 1000.0);
        let (iti_min, iti_max) = self.config.iti_range_ms;
        let iti = Duration::from_millis(self.rng.random_range(iti_min..=iti_max));

        let now = self.timer.now();
        let mut record = TrialRecord::begin(self.timer.now_secs(), location, plan.scenario_index);
        record.trial_id = self.trial_number;
        record.session = self.phase.session().unwrap_or_default();
        record.reward = plan.reward;
        record.punishment = plan.punishment;
        record.total_coins = self.total_coins;

        self.current = Some(DoorTrial {
            id: self.trial_number,
            plan,
            location,
            scale: 1.0,
            record,
            resolution: None,
            durations: TrialDurations { anticipation, iti },
            timestamps: TrialTimestamps {
                start: now,
                resolved: None,
                iti_start: None,
            },
            state: TrialState::Approach,
        });
        self.cues.push(SoundKind::Beep);

        log::info!(
            "Trial {} started at {} ns: reward {}, punishment {}, location {:.2}",
            self.trial_number,
            now,
            plan.reward,
            plan.punishment,
            location
        );
        if plan.high_value {
            log::info!("High value door (reward {})", plan.reward);
        }
    }

    /// Polls the clock and reports the events that are due.
    pub fn update(&mut self) -> Vec<ExperimentEvent> {
        let mut events = Vec::new();
        if self.finished || !self.phase.is_block() {
            return events;
        }

        match &self.current {
            Some(trial) => match trial.state {
                TrialState::Anticipation => {
                    if let Some(resolved) = trial.timestamps.resolved {
                        if self.timer.elapsed(resolved) >= trial.durations.anticipation {
                            events.push(ExperimentEvent::AnticipationElapsed);
                        }
                    }
                }
                TrialState::Iti => {
                    if let Some(iti_start) = trial.timestamps.iti_start {
                        if self.timer.elapsed(iti_start) >= trial.durations.iti {
                            events.push(ExperimentEvent::ItiElapsed);
                        }
                    }
                }
                TrialState::Approach | TrialState::Complete => {}
            },
            None => {
                if self.phase_trial_number >= self.block.len() {
                    events.push(ExperimentEvent::PhaseComplete);
                }
            }
        }

        events
    }

    pub fn handle_event(&mut self, event: ExperimentEvent) -> bool {
        if self.finished {
            return false;
        }

        let phase = self.phase;
        let trial_state = self.current_trial_state();
        match event {
            // Instruction, rest, end, wheel and summary screens
            ExperimentEvent::Continue if !phase.is_block() => {
                self.advance_phase();
                true
            }

            ExperimentEvent::MoveForward if phase.allows_movement() => {
                self.move_door(self.config.step_units)
            }
            ExperimentEvent::MoveBackward if phase.allows_movement() => {
                self.move_door(-self.config.step_units)
            }
            ExperimentEvent::Confirm if phase.is_block() => self.resolve_current_door(),

            ExperimentEvent::AnticipationElapsed
                if trial_state == Some(TrialState::Anticipation) =>
            {
                self.start_iti();
                true
            }
            ExperimentEvent::ItiElapsed if trial_state == Some(TrialState::Iti) => {
                self.complete_current_trial();
                true
            }

            ExperimentEvent::PhaseComplete if phase.is_block() && self.current.is_none() => {
                self.advance_phase();
                true
            }

            _ => false,
        }
    }

    /// Steps the current door by `units`; positive approaches.
    pub fn move_door(&mut self, units: f64) -> bool {
        let now_secs = self.timer.now_secs();
        let Some(trial) = self.current.as_mut() else {
            return false;
        };
        if trial.state != TrialState::Approach {
            return false;
        }

        let distance = step_location(trial.location, units);
        trial.location = advance_location(trial.location, units);
        trial.rescale(units);
        trial.record.update_movement(distance, now_secs);

        log::debug!(
            "Trial {} moved {:+}: location {:.2}, distance {}, scale {:.1}",
            trial.id,
            units,
            trial.location,
            distance,
            trial.scale
        );
        true
    }

    /// Rolls the door outcome, pays out and starts the anticipation wait.
    pub fn resolve_current_door(&mut self) -> bool {
        let now = self.timer.now();
        let now_secs = self.timer.now_secs();
        let Some(trial) = self.current.as_mut() else {
            return false;
        };
        if trial.state != TrialState::Approach {
            return false;
        }

        let chance = self
            .config
            .open_chance
            .chance(trial.location, trial.distance());
        let draws = DoorDraws {
            open: self.rng.random(),
            reward: self.rng.random(),
        };
        let resolution = match resolve_door(chance, draws, trial.plan.reward, trial.plan.punishment)
        {
            Ok(resolution) => resolution,
            Err(err) => {
                log::error!("Trial {} could not be resolved: {err}", trial.id);
                return false;
            }
        };

        self.total_coins += resolution.coin_delta;
        trial
            .record
            .record_outcome(&resolution, self.total_coins, now_secs);
        trial.record.door_anticipation_ms =
            Some(trial.durations.anticipation.as_secs_f64() * 1000.0);
        trial.resolution = Some(resolution);
        trial.timestamps.resolved = Some(now);
        trial.state = TrialState::Anticipation;

        self.cues.push(match resolution.state {
            DoorState::Rewarded => SoundKind::Reward,
            DoorState::Punished => SoundKind::Punishment,
            _ => SoundKind::Lock,
        });

        log::info!(
            "Trial {} resolved: chance {:.4}, {:?}, {:+} coins (total {}), RT {:?} ms",
            trial.id,
            chance,
            resolution.state,
            resolution.coin_delta,
            self.total_coins,
            trial.record.door_action_rt_ms,
        );
        true
    }

    fn start_iti(&mut self) {
        let now = self.timer.now();
        if let Some(trial) = &mut self.current {
            trial.state = TrialState::Iti;
            trial.timestamps.iti_start = Some(now);
            log::debug!("Trial {} ITI for {:?}", trial.id, trial.durations.iti);
        }
    }

    /// Stores the finished record and sets up the next door, if any.
    fn complete_current_trial(&mut self) {
        if let Some(mut trial) = self.current.take() {
            trial.state = TrialState::Complete;
            match serde_json::to_string(&trial.record) {
                Ok(row) => log::debug!("Trial {} record: {row}", trial.id),
                Err(err) => log::warn!("Trial {} record not serializable: {err}", trial.id),
            }
            self.results.push(trial.record);
        }
        self.trial_number += 1;
        self.phase_trial_number += 1;

        if self.phase_trial_number < self.block.len() {
            self.start_trial();
        }
    }

    /// Sound cues raised since the last call.
    pub fn drain_cues(&mut self) -> Vec<SoundKind> {
        std::mem::take(&mut self.cues)
    }

    /// Time left on the current fixed wait, if one is running.
    pub fn remaining_wait(&self) -> Option<Duration> {
        let trial = self.current.as_ref()?;
        let (start, total) = match trial.state {
            TrialState::Anticipation => (trial.timestamps.resolved?, trial.durations.anticipation),
            TrialState::Iti => (trial.timestamps.iti_start?, trial.durations.iti),
            TrialState::Approach | TrialState::Complete => return None,
        };
        Some(total.saturating_sub(self.timer.elapsed(start)))
    }

    pub fn screen(&self) -> Screen {
        if self.finished {
            return Screen::Finished;
        }

        let language = self.config.language;
        let phase = self.phase;
        if phase.is_instructions() {
            match phase.session() {
                Some(0) => Screen::Instructions {
                    image: self
                        .assets
                        .instruction_image(language, InstructionScreen::PracticeStart),
                    caption: "Instruction Screen",
                },
                Some(1) => Screen::Instructions {
                    image: self
                        .assets
                        .instruction_image(language, InstructionScreen::StartMainGame),
                    caption: "Instruction Screen",
                },
                _ => Screen::Message {
                    text: catalog().rest_message(language, self.config.input_mode),
                    button: CONTINUE,
                },
            }
        } else if phase.is_block() {
            self.current
                .as_ref()
                .map_or(Screen::Blank, |trial| Screen::Door(self.door_view(trial)))
        } else if phase.is_simulation_end() {
            Screen::Instructions {
                image: self
                    .assets
                    .instruction_image(language, InstructionScreen::SimulationRunEnd),
                caption: "Simulation End",
            }
        } else if phase.is_wheel() {
            let award = self.wheel_award.unwrap_or_default();
            Screen::Wheel {
                video: self.assets.wheel_video(language, award),
                award,
            }
        } else {
            Screen::Message {
                text: catalog().final_summary(language, self.total_coins),
                button: FINISH,
            }
        }
    }

    fn door_view(&self, trial: &DoorTrial<u64>) -> DoorView {
        let stage = match (trial.state, trial.resolution) {
            (TrialState::Anticipation, Some(resolution)) => DoorStage::Revealed {
                state: resolution.state,
                coin_delta: resolution.coin_delta,
            },
            (TrialState::Iti | TrialState::Complete, _) => DoorStage::Iti {
                fraction: self.iti_fraction(trial),
            },
            _ => DoorStage::Approach,
        };

        DoorView {
            image: self
                .assets
                .door_image(trial.plan.reward, trial.plan.punishment),
            caption: format!(
                "Reward: {}, Punishment: {}",
                trial.plan.reward, trial.plan.punishment
            ),
            scale: trial.scale,
            location: trial.location,
            distance: trial.distance(),
            total_coins: self.total_coins,
            stage,
            progress: self.trial_progress(),
            practice: self.phase.is_practice(),
        }
    }

    fn iti_fraction(&self, trial: &DoorTrial<u64>) -> f32 {
        let Some(start) = trial.timestamps.iti_start else {
            return 0.0;
        };
        if trial.durations.iti.is_zero() {
            return 1.0;
        }
        let done = self.timer.elapsed(start).as_secs_f64() / trial.durations.iti.as_secs_f64();
        done.min(1.0) as f32
    }

    pub fn summary(&self) -> SessionSummary {
        let opened: Vec<&TrialRecord> = self
            .results
            .iter()
            .filter(|r| r.door_opened == Some(true))
            .collect();
        let rts: Vec<f64> = self
            .results
            .iter()
            .filter_map(|r| r.door_action_rt_ms)
            .collect();
        let mean_rt_ms = if rts.is_empty() {
            None
        } else {
            Some(round2(rts.iter().sum::<f64>() / rts.len() as f64))
        };

        SessionSummary {
            trials: self.results.len(),
            doors_opened: opened.len(),
            rewards: opened.iter().filter(|r| r.did_win == Some(true)).count(),
            punishments: opened.iter().filter(|r| r.did_win == Some(false)).count(),
            total_coins: self.total_coins,
            mean_rt_ms,
            wheel_award: self.wheel_award,
        }
    }

    pub fn current_phase(&self) -> &P {
        &self.phase
    }

    pub fn current_trial_state(&self) -> Option<TrialState> {
        self.current.as_ref().map(|trial| trial.state)
    }

    pub fn results(&self) -> &[TrialRecord] {
        &self.results
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn trial_progress(&self) -> Option<(usize, usize)> {
        if self.phase.is_block() {
            Some((self.phase_trial_number + 1, self.block.len()))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OpenChance;
    use doorplay_core::DoorPhase;
    use doorplay_timing::ManualTimer;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    type Machine = ExperimentStateMachine<DoorPhase, ManualTimer, StdRng>;

    fn machine(config: ExperimentConfig) -> (Machine, ManualTimer) {
        let timer = ManualTimer::new();
        let m = Machine::new(config, timer.clone(), StdRng::seed_from_u64(42));
        (m, timer)
    }

    fn into_practice(m: &mut Machine) {
        assert!(m.handle_event(ExperimentEvent::Continue));
        assert_eq!(m.phase, DoorPhase::Block { session: 0 });
    }

    #[test]
    fn starts_on_practice_instructions() {
        let (m, _) = machine(ExperimentConfig::default());
        match m.screen() {
            Screen::Instructions { image, caption } => {
                assert!(image.ends_with("InstructionsEnglish/practice_start.jpeg"));
                assert_eq!(caption, "Instruction Screen");
            }
            other => panic!("unexpected screen {other:?}"),
        }
    }

    #[test]
    fn movement_is_ignored_outside_blocks() {
        let (mut m, _) = machine(ExperimentConfig::default());
        assert!(!m.handle_event(ExperimentEvent::MoveForward));
        assert!(!m.handle_event(ExperimentEvent::Confirm));
    }

    #[test]
    fn movement_updates_record_and_scale() {
        let (mut m, timer) = machine(ExperimentConfig::default());
        into_practice(&mut m);
        assert_eq!(m.drain_cues(), vec![SoundKind::Beep]);

        timer.advance(Duration::from_millis(250));
        assert!(m.handle_event(ExperimentEvent::MoveForward));
        assert!(m.handle_event(ExperimentEvent::MoveForward));
        assert!(m.handle_event(ExperimentEvent::MoveBackward));

        let trial = m.current.as_ref().unwrap();
        assert!((trial.location - 0.1).abs() < 1e-9);
        assert_eq!(trial.record.current_distance, 53);
        assert_eq!(trial.record.distance_max, Some(55));
        assert_eq!(trial.record.distance_min, Some(50));
        assert_eq!(trial.record.current_time, 0.25);
        assert!((trial.scale - 1.1).abs() < 1e-6);
    }

    #[test]
    fn raw_location_chance_keeps_origin_door_locked() {
        let (mut m, _) = machine(ExperimentConfig::default());
        into_practice(&mut m);
        m.drain_cues();

        assert!(m.handle_event(ExperimentEvent::MoveBackward));
        assert!(m.handle_event(ExperimentEvent::Confirm));

        let trial = m.current.as_ref().unwrap();
        assert_eq!(trial.state, TrialState::Anticipation);
        assert_eq!(trial.resolution.unwrap().state, DoorState::Locked);
        assert_eq!(m.total_coins, 0);
        assert_eq!(m.drain_cues(), vec![SoundKind::Lock]);
        assert!(!m.handle_event(ExperimentEvent::MoveForward));
    }

    #[test]
    fn waits_run_on_the_clock() {
        let config = ExperimentConfig {
            open_chance: OpenChance::NormalizedDistance,
            ..Default::default()
        };
        let (mut m, timer) = machine(config);
        into_practice(&mut m);
        m.handle_event(ExperimentEvent::Confirm);

        let anticipation = m.current.as_ref().unwrap().durations.anticipation;
        assert!(anticipation >= Duration::from_secs(3) && anticipation < Duration::from_secs(4));
        assert!(m.update().is_empty());

        timer.advance(anticipation);
        assert_eq!(m.update(), vec![ExperimentEvent::AnticipationElapsed]);
        assert!(m.handle_event(ExperimentEvent::AnticipationElapsed));
        assert_eq!(m.current_trial_state(), Some(TrialState::Iti));

        let iti = m.current.as_ref().unwrap().durations.iti;
        timer.advance(iti / 2);
        match m.screen() {
            Screen::Door(view) => match view.stage {
                DoorStage::Iti { fraction } => assert!((fraction - 0.5).abs() < 0.01),
                other => panic!("unexpected stage {other:?}"),
            },
            other => panic!("unexpected screen {other:?}"),
        }
        assert_eq!(m.remaining_wait(), Some(iti - iti / 2));

        timer.advance(iti);
        assert_eq!(m.update(), vec![ExperimentEvent::ItiElapsed]);
        assert!(m.handle_event(ExperimentEvent::ItiElapsed));
        assert_eq!(m.results().len(), 1);
        assert_eq!(m.phase_trial_number, 1);
        assert_eq!(m.current_trial_state(), Some(TrialState::Approach));
    }

    #[test]
    fn full_approach_always_opens_with_normalized_chance() {
        let config = ExperimentConfig {
            open_chance: OpenChance::NormalizedDistance,
            ..Default::default()
        };
        let (mut m, _) = machine(config);
        into_practice(&mut m);
        for _ in 0..20 {
            m.handle_event(ExperimentEvent::MoveForward);
        }
        assert_eq!(m.current.as_ref().unwrap().distance(), 100);
        assert!(m.handle_event(ExperimentEvent::Confirm));

        let trial = m.current.as_ref().unwrap();
        let resolution = trial.resolution.unwrap();
        assert!(resolution.state.is_open());
        assert_eq!(m.total_coins, resolution.coin_delta);
        assert_eq!(trial.record.total_coins, m.total_coins);
        assert_eq!(trial.record.door_opened, Some(true));
        assert!(trial.record.scenario_index > 100);
    }

    #[test]
    fn rest_screen_follows_language_and_input() {
        let config = ExperimentConfig {
            language: doorplay_core::Language::Hebrew,
            input_mode: doorplay_core::InputMode::Joystick,
            ..Default::default()
        };
        let (mut m, _) = machine(config);
        m.phase = DoorPhase::Instructions { session: 2 };
        match m.screen() {
            Screen::Message { text, button } => {
                assert!(text.contains("ג'ויסטיק"));
                assert_eq!(button, CONTINUE);
            }
            other => panic!("unexpected screen {other:?}"),
        }
    }
}
