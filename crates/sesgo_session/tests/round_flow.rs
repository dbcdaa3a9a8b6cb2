//! End-to-end exercise of one round over the wire protocol.

use sesgo_core::{LabConfig, ParticipantState, RoundOrder, Side};
use sesgo_session::{ClientMessage, ManualClock, ServerMessage, SessionScheduler};
use std::sync::Arc;

fn config() -> LabConfig {
    let mut cfg = LabConfig::default();
    cfg.primary = Some(["thin people".into(), "heavy people".into()]);
    cfg.secondary = Some(["good".into(), "bad".into()]);
    cfg.num_iterations.insert(1, 5);
    for cat in ["thin people", "heavy people", "good", "bad"] {
        cfg.stimuli
            .insert(cat.into(), vec![format!("{cat} 1"), format!("{cat} 2")]);
    }
    cfg
}

fn parse(raw: &str) -> ClientMessage {
    serde_json::from_str(raw).expect("valid client message")
}

#[test]
fn five_iteration_round_with_throttle_and_wrong_answer() {
    let cfg = config();
    let clock = Arc::new(ManualClock::new());
    let mut scheduler = SessionScheduler::new(
        &cfg,
        &cfg.block_schedule(),
        cfg.catalog(),
        ParticipantState::new("e2e", RoundOrder::Direct),
        1,
        clock.clone(),
    )
    .with_rng_seed(99);

    // trial #1
    match scheduler.handle(parse(r#"{"type":"next"}"#)) {
        ServerMessage::Trial { progress, .. } => assert_eq!(progress.iteration, 1),
        other => panic!("unexpected: {other:?}"),
    }

    // answer with the wrong side
    let correct = scheduler
        .participant()
        .trials
        .current(1, 1)
        .expect("current trial")
        .correct;
    let wrong = match correct {
        Side::Left => "right",
        Side::Right => "left",
    };
    clock.advance(0.3);
    let raw = format!(r#"{{"type":"answer","answer":"{wrong}","reaction_time":0.8}}"#);
    match scheduler.handle(parse(&raw)) {
        ServerMessage::Feedback { is_correct, .. } => assert!(!is_correct),
        other => panic!("unexpected: {other:?}"),
    }

    // next before trial_delay has elapsed since trial creation
    clock.advance(0.1); // 0.4s total, delay is 0.5s
    match scheduler.handle(parse(r#"{"type":"next"}"#)) {
        ServerMessage::Error { kind, .. } => assert_eq!(kind, "rate_limited"),
        other => panic!("unexpected: {other:?}"),
    }

    // after waiting, trial #2 arrives with the expected progress
    clock.advance(0.5);
    match scheduler.handle(parse(r#"{"type":"next"}"#)) {
        ServerMessage::Trial { progress, .. } => {
            assert_eq!(progress.num_trials, 1);
            assert_eq!(progress.num_correct, 0);
            assert_eq!(progress.num_incorrect, 1);
            assert_eq!(progress.iteration, 2);
            assert_eq!(progress.total, 5);
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn unrecognized_message_is_a_parse_error_upstream() {
    // The gateway maps undecodable payloads to an unrecognized_message
    // error; the scheduler itself only ever sees decoded messages.
    assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"restart"}"#).is_err());
}

#[test]
fn reconnect_with_shared_clock_is_not_throttled() {
    // Stored trial timestamps outlive the connection, so a scheduler
    // built for a reconnect must read the same clock that stamped them.
    let cfg = config();
    let clock = Arc::new(ManualClock::new());
    clock.set(121.0);
    let mut first = SessionScheduler::new(
        &cfg,
        &cfg.block_schedule(),
        cfg.catalog(),
        ParticipantState::new("e2e", RoundOrder::Direct),
        1,
        clock.clone(),
    )
    .with_rng_seed(5);
    assert!(matches!(
        first.handle(parse(r#"{"type":"next"}"#)),
        ServerMessage::Trial { .. }
    ));
    clock.advance(0.8);
    let correct = first
        .participant()
        .trials
        .current(1, 1)
        .expect("current trial")
        .correct;
    let raw = format!(
        r#"{{"type":"answer","answer":"{}","reaction_time":0.8}}"#,
        correct.as_str()
    );
    assert!(matches!(
        first.handle(parse(&raw)),
        ServerMessage::Feedback { .. }
    ));

    // connection drops; the record comes back through a new scheduler
    // that shares the process clock
    let record = first.into_participant();
    let mut second = SessionScheduler::new(
        &cfg,
        &cfg.block_schedule(),
        cfg.catalog(),
        record,
        1,
        clock.clone(),
    )
    .with_rng_seed(6);
    clock.advance(1.0);
    match second.handle(parse(r#"{"type":"next"}"#)) {
        ServerMessage::Trial { progress, .. } => assert_eq!(progress.iteration, 2),
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn reload_mid_trial_returns_pending_trial() {
    let cfg = config();
    let clock = Arc::new(ManualClock::new());
    let mut scheduler = SessionScheduler::new(
        &cfg,
        &cfg.block_schedule(),
        cfg.catalog(),
        ParticipantState::new("e2e", RoundOrder::Direct),
        1,
        clock,
    )
    .with_rng_seed(7);

    scheduler.handle(parse(r#"{"type":"next"}"#));
    match scheduler.handle(parse(r#"{"type":"load"}"#)) {
        ServerMessage::Status { trial, .. } => assert!(trial.is_some()),
        other => panic!("unexpected: {other:?}"),
    }
}
