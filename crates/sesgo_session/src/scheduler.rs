//! Per-participant, per-round trial state machine.
//!
//! The scheduler processes one message at a time and never shares mutable
//! state with other participants. Counters follow a "latest answer wins"
//! rule: a retried answer first subtracts the previous response's
//! contribution, so `num_trials == num_correct + num_incorrect` holds
//! after every fully-processed answer.

use crate::cheat::CheatSampler;
use crate::clock::Clock;
use crate::wire::{ClientMessage, ServerMessage, TrialView};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use sesgo_core::{
    BlockSchedule, BlockSetup, LabConfig, ParticipantState, Progress, SessionError, Side,
    StimulusCatalog, Trial,
};
use std::sync::Arc;

pub struct SessionScheduler {
    participant: ParticipantState,
    /// Round as presented to the participant.
    displayed_round: u32,
    /// Block round actually played (after counterbalancing).
    round: u32,
    block: BlockSetup,
    catalog: StimulusCatalog,
    total_iterations: u32,
    trial_delay: f64,
    retry_delay: f64,
    clock: Arc<dyn Clock>,
    rng: StdRng,
    /// Present only when the deployment enabled debug mode.
    cheat: Option<CheatSampler>,
}

impl SessionScheduler {
    pub fn new(
        config: &LabConfig,
        schedule: &BlockSchedule,
        catalog: StimulusCatalog,
        participant: ParticipantState,
        displayed_round: u32,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let round = participant.round_order.actual_round(displayed_round);
        Self {
            participant,
            displayed_round,
            round,
            block: schedule.get(round),
            catalog,
            total_iterations: config.num_iterations_for(displayed_round),
            trial_delay: config.trial_delay,
            retry_delay: config.retry_delay,
            clock,
            rng: StdRng::from_entropy(),
            cheat: config.debug.then(CheatSampler::new),
        }
    }

    /// Fixed RNG seed, for deterministic tests.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn participant(&self) -> &ParticipantState {
        &self.participant
    }

    pub fn into_participant(self) -> ParticipantState {
        self.participant
    }

    pub fn displayed_round(&self) -> u32 {
        self.displayed_round
    }

    /// Handle one inbound message, producing exactly one response. Any
    /// error degrades to a structured `error` response; the channel is
    /// never torn down from here.
    pub fn handle(&mut self, msg: ClientMessage) -> ServerMessage {
        match self.dispatch(msg) {
            Ok(response) => response,
            Err(err) => {
                tracing::debug!(
                    participant = %self.participant.code,
                    round = self.round,
                    kind = err.kind(),
                    "rejected message: {err}"
                );
                ServerMessage::error(err)
            }
        }
    }

    fn dispatch(&mut self, msg: ClientMessage) -> Result<ServerMessage, SessionError> {
        let now = self.clock.now();
        match msg {
            ClientMessage::Load => self.on_load(),
            ClientMessage::Next => self.on_next(now),
            ClientMessage::Answer {
                answer,
                reaction_time,
            } => self.on_answer(now, answer, reaction_time),
            ClientMessage::Cheat { reaction } => self.on_cheat(now, reaction),
        }
    }

    fn progress(&self) -> Progress {
        let c = self.participant.counters(self.round);
        Progress {
            num_trials: c.num_trials,
            num_correct: c.num_correct,
            num_incorrect: c.num_incorrect,
            iteration: c.iteration,
            total: self.total_iterations,
        }
    }

    fn on_load(&mut self) -> Result<ServerMessage, SessionError> {
        let iteration = self.participant.counters(self.round).iteration;
        let trial = self
            .participant
            .trials
            .current(self.round, iteration)
            .map(TrialView::encode);
        Ok(ServerMessage::Status {
            progress: self.progress(),
            trial,
            iterations_left: None,
        })
    }

    fn on_next(&mut self, now: f64) -> Result<ServerMessage, SessionError> {
        let iteration = self.participant.counters(self.round).iteration;
        if let Some(current) = self.participant.trials.current(self.round, iteration) {
            if !current.answered() {
                return Err(SessionError::InvalidState);
            }
            if now < current.timestamp + self.trial_delay {
                return Err(SessionError::RateLimited("advancing too fast"));
            }
        }
        if iteration >= self.total_iterations {
            return Ok(ServerMessage::Status {
                progress: self.progress(),
                trial: None,
                iterations_left: Some(0),
            });
        }
        let trial = self.generate_trial(now)?;
        Ok(ServerMessage::Trial {
            trial: TrialView::encode(&trial),
            progress: self.progress(),
        })
    }

    fn on_answer(
        &mut self,
        now: f64,
        answer: Option<String>,
        reaction_time: Option<f64>,
    ) -> Result<ServerMessage, SessionError> {
        let iteration = self.participant.counters(self.round).iteration;
        let (answered, prev_correct, prev_timestamp, revision, retries) = {
            let current = self
                .participant
                .trials
                .current(self.round, iteration)
                .ok_or(SessionError::NoActiveTrial)?;
            (
                current.answered(),
                current.is_correct,
                current.response_timestamp,
                current.revision,
                current.retries,
            )
        };

        if answered {
            let prev = prev_timestamp.unwrap_or_default();
            if now < prev + self.retry_delay {
                return Err(SessionError::RateLimited("answering too fast"));
            }
        }

        // Validated before the rollback so a malformed retry cannot leave
        // the counters missing one response.
        let side: Side = answer
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(SessionError::InvalidInput("answer is required"))?
            .parse()
            .map_err(|_| SessionError::InvalidInput("answer must be left or right"))?;

        if answered {
            // A stored response must be exactly one revision ahead of the
            // retry count, otherwise a rollback would undo more (or less)
            // than one response.
            if revision != retries + 1 {
                return Err(SessionError::Internal(format!(
                    "trial revision {revision} does not match retry count {retries}"
                )));
            }
            let c = self.participant.counters_mut(self.round);
            c.num_trials -= 1;
            if prev_correct == Some(true) {
                c.num_correct -= 1;
            } else {
                c.num_incorrect -= 1;
            }
        }

        let is_correct = {
            let current = self
                .participant
                .trials
                .current_mut(self.round, iteration)
                .ok_or(SessionError::NoActiveTrial)?;
            if answered {
                current.retries += 1;
            }
            let is_correct = side == current.correct;
            current.response = Some(side);
            current.reaction_time = Some(reaction_time.unwrap_or(0.0));
            current.is_correct = Some(is_correct);
            current.response_timestamp = Some(now);
            current.revision += 1;
            is_correct
        };

        let c = self.participant.counters_mut(self.round);
        if is_correct {
            c.num_correct += 1;
        } else {
            c.num_incorrect += 1;
        }
        c.num_trials += 1;

        Ok(ServerMessage::Feedback {
            is_correct,
            progress: self.progress(),
        })
    }

    /// Debug-only: discard the current trial and auto-answer every
    /// remaining iteration with synthetic latencies. Without the injected
    /// capability this message is indistinguishable from an unknown one.
    fn on_cheat(&mut self, now: f64, reaction_mean: f64) -> Result<ServerMessage, SessionError> {
        let sampler = self.cheat.ok_or(SessionError::UnrecognizedMessage)?;

        let iteration = self.participant.counters(self.round).iteration;
        if let Some(dropped) = self.participant.trials.remove_current(self.round, iteration) {
            let c = self.participant.counters_mut(self.round);
            c.iteration -= 1;
            if dropped.answered() {
                c.num_trials -= 1;
                if dropped.is_correct == Some(true) {
                    c.num_correct -= 1;
                } else {
                    c.num_incorrect -= 1;
                }
            }
        }

        while self.participant.counters(self.round).iteration < self.total_iterations {
            let trial = self.generate_trial(now)?;
            let latency = sampler.sample(reaction_mean, &mut self.rng);
            let offset = trial.iteration as f64;
            let current = self
                .participant
                .trials
                .current_mut(self.round, trial.iteration)
                .ok_or_else(|| SessionError::Internal("synthetic trial vanished".into()))?;
            current.response = Some(current.correct);
            current.is_correct = Some(true);
            current.reaction_time = Some(latency);
            current.response_timestamp = Some(now + offset);
            current.revision += 1;
            let c = self.participant.counters_mut(self.round);
            c.num_correct += 1;
            c.num_trials += 1;
        }

        tracing::info!(
            participant = %self.participant.code,
            round = self.round,
            "synthetic fast-forward completed"
        );
        Ok(ServerMessage::Status {
            progress: self.progress(),
            trial: None,
            iterations_left: Some(0),
        })
    }

    /// Pick a side, a class defined for that side, a category and a
    /// stimulus, all uniformly at random, then advance the iteration.
    fn generate_trial(&mut self, now: f64) -> Result<Trial, SessionError> {
        let side = *[Side::Left, Side::Right]
            .choose(&mut self.rng)
            .expect("non-empty side slice");
        let classes = self.block.classes_for(side);
        let class = *classes.choose(&mut self.rng).ok_or_else(|| {
            SessionError::Internal(format!("no categories configured for round {}", self.round))
        })?;
        let category = self
            .block
            .category(side, class)
            .ok_or_else(|| SessionError::Internal("class without category".into()))?
            .to_string();
        let stimulus = self
            .catalog
            .items(&category)
            .choose(&mut self.rng)
            .ok_or_else(|| {
                SessionError::Internal(format!("no stimuli for category {category}"))
            })?
            .clone();

        let counters = self.participant.counters_mut(self.round);
        counters.iteration += 1;
        let trial = Trial {
            round: self.round,
            iteration: counters.iteration,
            timestamp: now,
            stimulus_cls: class,
            stimulus_cat: category,
            stimulus,
            correct: side,
            response: None,
            response_timestamp: None,
            reaction_time: None,
            is_correct: None,
            retries: 0,
            revision: 0,
        };
        self.participant.trials.append(trial.clone());
        Ok(trial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use sesgo_core::{ParticipantState, RoundOrder};

    fn config() -> LabConfig {
        let mut cfg = LabConfig::default();
        cfg.primary = Some(["thin".into(), "heavy".into()]);
        cfg.secondary = Some(["good".into(), "bad".into()]);
        for cat in ["thin", "heavy", "good", "bad"] {
            cfg.stimuli.insert(
                cat.into(),
                vec![format!("{cat}_a"), format!("{cat}_b")],
            );
        }
        cfg
    }

    fn scheduler_for_round(cfg: &LabConfig, round: u32) -> (SessionScheduler, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let scheduler = SessionScheduler::new(
            cfg,
            &cfg.block_schedule(),
            cfg.catalog(),
            ParticipantState::new("p1", RoundOrder::Direct),
            round,
            clock.clone(),
        )
        .with_rng_seed(42);
        (scheduler, clock)
    }

    fn wrong_side(scheduler: &SessionScheduler) -> String {
        let iteration = scheduler.participant().counters(scheduler.round).iteration;
        let correct = scheduler
            .participant()
            .trials
            .current(scheduler.round, iteration)
            .unwrap()
            .correct;
        match correct {
            Side::Left => "right".to_string(),
            Side::Right => "left".to_string(),
        }
    }

    fn answer(side: &str, rt: f64) -> ClientMessage {
        ClientMessage::Answer {
            answer: Some(side.into()),
            reaction_time: Some(rt),
        }
    }

    #[test]
    fn test_load_without_trial_reports_progress_only() {
        let cfg = config();
        let (mut s, _clock) = scheduler_for_round(&cfg, 1);
        match s.handle(ClientMessage::Load) {
            ServerMessage::Status {
                progress, trial, ..
            } => {
                assert_eq!(progress.iteration, 0);
                assert!(trial.is_none());
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_next_generates_then_requires_answer() {
        let cfg = config();
        let (mut s, clock) = scheduler_for_round(&cfg, 1);
        assert!(matches!(
            s.handle(ClientMessage::Next),
            ServerMessage::Trial { .. }
        ));
        clock.advance(1.0);
        // unanswered current trial blocks the next one
        match s.handle(ClientMessage::Next) {
            ServerMessage::Error { kind, .. } => assert_eq!(kind, "invalid_state"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_trial_delay_gate_creates_no_trial() {
        let cfg = config();
        let (mut s, clock) = scheduler_for_round(&cfg, 1);
        s.handle(ClientMessage::Next);
        s.handle(answer("left", 0.7));
        // too soon after trial creation
        clock.advance(0.1);
        match s.handle(ClientMessage::Next) {
            ServerMessage::Error { kind, .. } => assert_eq!(kind, "rate_limited"),
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(s.participant().counters(1).iteration, 1);
        clock.advance(1.0);
        assert!(matches!(
            s.handle(ClientMessage::Next),
            ServerMessage::Trial { .. }
        ));
        assert_eq!(s.participant().counters(1).iteration, 2);
    }

    #[test]
    fn test_answer_without_trial() {
        let cfg = config();
        let (mut s, _clock) = scheduler_for_round(&cfg, 1);
        match s.handle(answer("left", 0.5)) {
            ServerMessage::Error { kind, .. } => assert_eq!(kind, "no_active_trial"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_counters_balance_after_each_answer() {
        let cfg = config();
        let (mut s, clock) = scheduler_for_round(&cfg, 3);
        for _ in 0..5 {
            clock.advance(1.0);
            s.handle(ClientMessage::Next);
            clock.advance(1.0);
            let side = if clock.now() as u32 % 2 == 0 { "left" } else { "right" };
            match s.handle(answer(side, 0.6)) {
                ServerMessage::Feedback { progress, .. } => {
                    assert_eq!(
                        progress.num_trials,
                        progress.num_correct + progress.num_incorrect
                    );
                }
                other => panic!("unexpected: {other:?}"),
            }
        }
    }

    #[test]
    fn test_retry_rollback_latest_answer_wins() {
        let cfg = config();
        let (mut s, clock) = scheduler_for_round(&cfg, 1);
        assert!(matches!(
            s.handle(ClientMessage::Next),
            ServerMessage::Trial { .. }
        ));
        clock.advance(1.0);
        let wrong = wrong_side(&s);
        match s.handle(answer(&wrong, 0.9)) {
            ServerMessage::Feedback {
                is_correct,
                progress,
            } => {
                assert!(!is_correct);
                assert_eq!(progress.num_incorrect, 1);
            }
            other => panic!("unexpected: {other:?}"),
        }
        // retry before the delay elapses is throttled
        clock.advance(0.1);
        let correct = if wrong == "left" { "right" } else { "left" };
        match s.handle(answer(correct, 1.2)) {
            ServerMessage::Error { kind, .. } => assert_eq!(kind, "rate_limited"),
            other => panic!("unexpected: {other:?}"),
        }
        // after the delay the retry overwrites and the counters roll back
        clock.advance(1.0);
        match s.handle(answer(correct, 1.2)) {
            ServerMessage::Feedback {
                is_correct,
                progress,
            } => {
                assert!(is_correct);
                assert_eq!(progress.num_correct, 1);
                assert_eq!(progress.num_incorrect, 0);
                assert_eq!(progress.num_trials, 1);
            }
            other => panic!("unexpected: {other:?}"),
        }
        let trial = s.participant().trials.current(1, 1).unwrap();
        assert_eq!(trial.retries, 1);
        assert_eq!(trial.revision, 2);
        assert_eq!(trial.reaction_time, Some(1.2));
    }

    #[test]
    fn test_invalid_retry_answer_keeps_counters_intact() {
        let cfg = config();
        let (mut s, clock) = scheduler_for_round(&cfg, 1);
        s.handle(ClientMessage::Next);
        clock.advance(1.0);
        s.handle(answer("left", 0.5));
        clock.advance(1.0);
        match s.handle(ClientMessage::Answer {
            answer: Some(String::new()),
            reaction_time: None,
        }) {
            ServerMessage::Error { kind, .. } => assert_eq!(kind, "invalid_input"),
            other => panic!("unexpected: {other:?}"),
        }
        let c = s.participant().counters(1);
        assert_eq!(c.num_trials, 1);
        assert_eq!(c.num_correct + c.num_incorrect, 1);
    }

    #[test]
    fn test_iteration_cap_returns_zero_marker() {
        let mut cfg = config();
        cfg.num_iterations.insert(1, 2);
        let (mut s, clock) = scheduler_for_round(&cfg, 1);
        for _ in 0..2 {
            clock.advance(1.0);
            assert!(matches!(
                s.handle(ClientMessage::Next),
                ServerMessage::Trial { .. }
            ));
            clock.advance(1.0);
            s.handle(answer("left", 0.5));
        }
        clock.advance(1.0);
        match s.handle(ClientMessage::Next) {
            ServerMessage::Status {
                iterations_left, ..
            } => assert_eq!(iterations_left, Some(0)),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_cheat_rejected_without_debug() {
        let cfg = config();
        let (mut s, _clock) = scheduler_for_round(&cfg, 1);
        match s.handle(ClientMessage::Cheat { reaction: 0.8 }) {
            ServerMessage::Error { kind, .. } => assert_eq!(kind, "unrecognized_message"),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(s.participant().trials.is_empty());
    }

    #[test]
    fn test_cheat_fills_round_when_debug() {
        let mut cfg = config();
        cfg.debug = true;
        let (mut s, clock) = scheduler_for_round(&cfg, 3);
        // leave one real answered trial, then fast-forward
        s.handle(ClientMessage::Next);
        clock.advance(1.0);
        s.handle(answer("left", 0.5));
        match s.handle(ClientMessage::Cheat { reaction: 0.8 }) {
            ServerMessage::Status {
                progress,
                iterations_left,
                ..
            } => {
                assert_eq!(iterations_left, Some(0));
                assert_eq!(progress.iteration, 10);
                assert_eq!(progress.num_trials, 10);
                assert_eq!(progress.num_trials, progress.num_correct);
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(s
            .participant()
            .trials
            .round(3)
            .all(|t| t.is_correct == Some(true)));
    }

    #[test]
    fn test_rotated_order_plays_other_block() {
        let cfg = config();
        let clock = Arc::new(ManualClock::new());
        let mut s = SessionScheduler::new(
            &cfg,
            &cfg.block_schedule(),
            cfg.catalog(),
            ParticipantState::new("p2", RoundOrder::Rotated),
            8,
            clock,
        )
        .with_rng_seed(1);
        // displayed round 8 maps to block round 1, which is configured
        assert!(matches!(
            s.handle(ClientMessage::Next),
            ServerMessage::Trial { .. }
        ));
        assert_eq!(s.participant().counters(1).iteration, 1);
    }
}
