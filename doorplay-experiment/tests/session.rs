use doorplay_core::{DoorPhase, DoorStage, Phase, Screen, TrialRecord};
use doorplay_experiment::{ExperimentConfig, ExperimentEvent, ExperimentStateMachine, OpenChance};
use doorplay_timing::{ManualTimer, Timer};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::Duration;

type Machine = ExperimentStateMachine<DoorPhase, ManualTimer, StdRng>;

/// Plays a whole session, pressing forward `steps` times before each door.
fn play(config: ExperimentConfig, seed: u64, steps: usize) -> (Machine, Vec<DoorPhase>) {
    let timer = ManualTimer::new();
    let mut m = Machine::new(config, timer.clone(), StdRng::seed_from_u64(seed));
    let mut phases = vec![m.phase];

    for _ in 0..10_000 {
        for event in m.update() {
            m.handle_event(event);
        }
        if phases.last() != Some(&m.phase) {
            phases.push(m.phase);
        }

        match m.screen() {
            Screen::Finished => return (m, phases),
            Screen::Blank => {}
            Screen::Door(view) => match view.stage {
                DoorStage::Approach => {
                    timer.advance(Duration::from_millis(400));
                    for _ in 0..steps {
                        assert!(m.handle_event(ExperimentEvent::MoveForward));
                    }
                    assert!(m.handle_event(ExperimentEvent::Confirm));
                }
                DoorStage::Revealed { .. } | DoorStage::Iti { .. } => {
                    let wait = m.remaining_wait().expect("waiting stage");
                    timer.advance(wait);
                }
            },
            Screen::Instructions { .. } | Screen::Message { .. } | Screen::Wheel { .. } => {
                assert!(m.handle_event(ExperimentEvent::Continue));
            }
        }
    }
    panic!("session did not finish");
}

fn payout(record: &TrialRecord) -> i64 {
    match record.did_win {
        Some(true) => i64::from(record.reward),
        Some(false) => -i64::from(record.punishment),
        None => 0,
    }
}

#[test]
fn full_session_walks_every_phase() {
    let config = ExperimentConfig::default();
    let expected_trials = config.practice_trials + 3 * config.trials_per_block;
    let (m, phases) = play(config, 11, 3);

    let mut expected = vec![DoorPhase::default()];
    let mut phase = DoorPhase::default();
    while let Some(next) = phase.next() {
        expected.push(next);
        phase = next;
    }
    assert_eq!(phases, expected);
    assert!(m.is_finished());
    assert_eq!(m.results().len(), expected_trials);
    assert!(matches!(m.wheel_award, Some(5..=7)));
}

#[test]
fn coin_total_is_the_sum_of_payouts() {
    let config = ExperimentConfig {
        open_chance: OpenChance::NormalizedDistance,
        ..Default::default()
    };
    let (m, _) = play(config, 3, 20);

    let mut running = 0;
    for record in m.results() {
        running += payout(record);
        assert_eq!(record.total_coins, running);
        assert_eq!(record.door_opened, Some(true));
    }
    assert_eq!(m.total_coins, running);

    let summary = m.summary();
    assert_eq!(summary.doors_opened, m.results().len());
    assert_eq!(summary.rewards + summary.punishments, summary.doors_opened);
    assert_eq!(summary.total_coins, running);
}

#[test]
fn staying_at_the_origin_never_pays_with_raw_location_chance() {
    let (m, _) = play(ExperimentConfig::default(), 5, 0);
    assert_eq!(m.total_coins, 0);
    assert!(m.results().iter().all(|r| r.door_opened == Some(false)));
    assert!(m.results().iter().all(|r| r.scenario_index > 50 && r.scenario_index <= 59));
}

#[test]
fn every_record_keeps_distance_bounds() {
    let config = ExperimentConfig {
        starting_distance: doorplay_experiment::StartingDistance::Random,
        ..Default::default()
    };
    let (m, _) = play(config, 99, 4);

    for record in m.results() {
        let min = record.distance_min.unwrap();
        let max = record.distance_max.unwrap();
        assert!(min <= record.current_distance && record.current_distance <= max);
        assert!(max <= 100);
        assert_eq!(record.door_action_rt_ms, Some(400.0));
        let anticipation = record.door_anticipation_ms.unwrap();
        assert!((3000.0..4000.0).contains(&anticipation));
    }
}

#[test]
fn summary_screen_reports_final_coins() {
    let timer = ManualTimer::new();
    let mut m = Machine::new(ExperimentConfig::default(), timer.clone(), StdRng::seed_from_u64(0));
    m.phase = DoorPhase::Wheel;
    m.total_coins = 17;

    assert!(m.handle_event(ExperimentEvent::Continue));
    match m.screen() {
        Screen::Message { text, button } => {
            assert!(text.starts_with("You scored 17 Coins!"));
            assert_eq!(button, "Finish");
        }
        other => panic!("unexpected screen {other:?}"),
    }
    assert!(m.handle_event(ExperimentEvent::Continue));
    assert_eq!(m.screen(), Screen::Finished);
    assert!(!m.handle_event(ExperimentEvent::Continue));
    assert_eq!(timer.now(), 0);
}

#[test]
fn same_seed_replays_the_same_session() {
    let config = ExperimentConfig {
        starting_distance: doorplay_experiment::StartingDistance::Random,
        open_chance: OpenChance::NormalizedDistance,
        ..Default::default()
    };
    let (a, _) = play(config.clone(), 21, 2);
    let (b, _) = play(config, 21, 2);

    let starts = |m: &Machine| {
        m.results()
            .iter()
            .map(|r| (r.scenario_index, r.distance_at_start, r.did_win))
            .collect::<Vec<_>>()
    };
    assert_eq!(starts(&a), starts(&b));
    assert_eq!(a.total_coins, b.total_coins);
    // Starting points are drawn per door from the one stream.
    let first = a.results()[0].distance_at_start;
    assert!(a.results().iter().any(|r| r.distance_at_start != first));
}
