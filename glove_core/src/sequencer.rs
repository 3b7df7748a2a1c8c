//! Step sequencing and timing engine.
//!
//! The sequencer walks a [`Plan`] unit by unit, emitting [`SequenceEvent`]s
//! and appending one [`LogEntry`] per unit to a caller-owned [`RunLog`].
//!
//! ## Timing
//!
//! - **Automatic**: steps tick once per second through the [`Clock`];
//!   rotation turns wait `per_turn_seconds` as a single unit.
//! - **Manual**: every timed step and every rotation turn suspends the run.
//!   [`Sequencer::advance`] returns [`RunStatus::Suspended`] with a
//!   [`ContinueToken`] and keeps returning the same token until
//!   [`Sequencer::resume`] is called with it.
//!
//! Entries are appended only when a unit finishes, so a run abandoned
//! mid-way leaves a valid partial log.

use crate::plan::Unit;
use crate::{
    Clock, Durations, Error, EventSink, LogEntry, Mode, Plan, Result, RunLog, Section,
    SequenceEvent,
};
use serde::Serialize;
use std::time::Duration;

const TICK: Duration = Duration::from_secs(1);

/// Handle for one manual-mode suspension
///
/// Tokens are single use. A token from an earlier suspension (or an
/// abandoned run) is rejected by [`Sequencer::resume`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ContinueToken {
    pub unit: String,
    /// Turn number inside a rotation block, starting at 1
    pub turn: Option<u32>,
    serial: u64,
}

impl ContinueToken {
    pub fn serial(&self) -> u64 {
        self.serial
    }
}

/// Where a run stands after [`Sequencer::advance`] returns
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunStatus {
    /// No run has been started, or the last one already finished
    Idle,
    /// Waiting for an explicit continue
    Suspended(ContinueToken),
    /// Every unit ran; holds the entries this run appended
    Finished(Vec<LogEntry>),
}

impl RunStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, RunStatus::Finished(_))
    }

    pub fn token(&self) -> Option<&ContinueToken> {
        match self {
            RunStatus::Suspended(token) => Some(token),
            _ => None,
        }
    }

    /// Entries appended by a finished run
    pub fn entries(&self) -> &[LogEntry] {
        match self {
            RunStatus::Finished(entries) => entries,
            _ => &[],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Pending,
    AwaitingStep,
    Turn(u32),
    AwaitingTurn(u32),
    TurnsDone,
}

#[derive(Debug)]
struct Cursor {
    plan: Plan,
    index: usize,
    phase: Phase,
    waiting: Option<ContinueToken>,
    appended: Vec<LogEntry>,
}

impl Cursor {
    fn finish_unit(&mut self, entry: LogEntry, log: &mut RunLog) {
        tracing::debug!("Logged {} = {}s", entry.step, entry.seconds);
        log.append(entry.clone());
        self.appended.push(entry);
        self.index += 1;
        self.phase = Phase::Pending;
    }
}

/// Runs plans against a clock, an event sink and a run log
pub struct Sequencer<C: Clock, S: EventSink> {
    mode: Mode,
    clock: C,
    sink: S,
    cursor: Option<Cursor>,
    serial: u64,
}

impl<C: Clock, S: EventSink> Sequencer<C, S> {
    pub fn new(mode: Mode, clock: C, sink: S) -> Self {
        Self {
            mode,
            clock,
            sink,
            cursor: None,
            serial: 0,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Change the timing mode; applies from the next unit phase onwards
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// True while a started run has not finished
    pub fn is_running(&self) -> bool {
        self.cursor.is_some()
    }

    /// Token of the current suspension, if any
    pub fn pending_token(&self) -> Option<&ContinueToken> {
        self.cursor.as_ref().and_then(|c| c.waiting.as_ref())
    }

    /// Start a plan from its first unit
    ///
    /// A run already in progress is abandoned; the entries it appended stay
    /// in the log.
    pub fn begin(&mut self, plan: Plan) {
        if let Some(previous) = self.cursor.take() {
            tracing::info!(
                "Abandoning run after {} of {} units",
                previous.index,
                previous.plan.len()
            );
        }

        tracing::info!("Starting run with {} units ({:?})", plan.len(), self.mode);
        self.sink.emit(&SequenceEvent::RunStarted {
            units: plan.len(),
            planned_seconds: plan.planned_seconds(),
        });

        self.cursor = Some(Cursor {
            plan,
            index: 0,
            phase: Phase::Pending,
            waiting: None,
            appended: Vec::new(),
        });
    }

    /// Release the current suspension
    ///
    /// The run does not move until the next [`advance`](Self::advance).
    pub fn resume(&mut self, token: &ContinueToken) -> Result<()> {
        let cursor = self
            .cursor
            .as_mut()
            .ok_or_else(|| Error::Continue("no run in progress".into()))?;

        match &cursor.waiting {
            Some(waiting) if waiting == token => {
                tracing::debug!("Continue received for {}", token.unit);
                cursor.waiting = None;
                Ok(())
            }
            Some(waiting) => Err(Error::Continue(format!(
                "token for {} does not match current suspension at {}",
                token.unit, waiting.unit
            ))),
            None => Err(Error::Continue(format!(
                "run is not waiting (token for {})",
                token.unit
            ))),
        }
    }

    /// Resume with `token` and keep running
    pub fn continue_run(&mut self, token: &ContinueToken, log: &mut RunLog) -> Result<RunStatus> {
        self.resume(token)?;
        Ok(self.advance(log))
    }

    /// Run until the plan finishes or a manual suspension is reached
    pub fn advance(&mut self, log: &mut RunLog) -> RunStatus {
        let Self {
            mode,
            clock,
            sink,
            cursor: slot,
            serial,
        } = self;

        let Some(cursor) = slot.as_mut() else {
            return RunStatus::Idle;
        };

        loop {
            if let Some(token) = &cursor.waiting {
                return RunStatus::Suspended(token.clone());
            }

            let Some(unit) = cursor.plan.units().get(cursor.index).cloned() else {
                break;
            };

            match unit {
                Unit::Forced(name) => {
                    sink.emit(&SequenceEvent::CascadeSkipped { name: name.clone() });
                    cursor.finish_unit(LogEntry::skipped(name), log);
                }

                Unit::Step(step) if !step.is_active() => {
                    sink.emit(&SequenceEvent::StepSkipped {
                        name: step.name.clone(),
                    });
                    cursor.finish_unit(LogEntry::skipped(step.name), log);
                }

                Unit::Step(step) => match cursor.phase {
                    Phase::Pending => {
                        sink.emit(&SequenceEvent::StepStarted {
                            name: step.name.clone(),
                            seconds: step.seconds,
                        });
                        match mode {
                            Mode::Automatic => {
                                for sec in 0..step.seconds {
                                    sink.emit(&SequenceEvent::Tick {
                                        name: step.name.clone(),
                                        remaining: step.seconds - sec,
                                        progress: (sec + 1) as f32 / step.seconds as f32,
                                    });
                                    clock.sleep(TICK);
                                }
                                complete_step(sink, cursor, step.name, step.seconds, log);
                            }
                            Mode::Manual => {
                                let token = issue_token(serial, &step.name, None);
                                sink.emit(&SequenceEvent::AwaitingContinue {
                                    token: token.clone(),
                                    seconds: step.seconds,
                                });
                                cursor.phase = Phase::AwaitingStep;
                                cursor.waiting = Some(token);
                            }
                        }
                    }
                    Phase::AwaitingStep => {
                        complete_step(sink, cursor, step.name, step.seconds, log);
                    }
                    phase => unreachable_phase(&step.name, phase),
                },

                Unit::Rotation(rotation) if !rotation.is_active() => {
                    sink.emit(&SequenceEvent::RotationSkipped {
                        title: rotation.title.clone(),
                    });
                    cursor.finish_unit(LogEntry::skipped(rotation.title), log);
                }

                Unit::Rotation(rotation) => match cursor.phase {
                    Phase::Pending => {
                        sink.emit(&SequenceEvent::RotationStarted {
                            title: rotation.title.clone(),
                            turns: rotation.turns,
                            per_turn_seconds: rotation.per_turn_seconds,
                        });
                        cursor.phase = Phase::Turn(1);
                    }
                    Phase::TurnsDone => {
                        let seconds = rotation.total_seconds();
                        sink.emit(&SequenceEvent::RotationCompleted {
                            title: rotation.title.clone(),
                            seconds,
                        });
                        cursor.finish_unit(LogEntry::new(rotation.title, seconds), log);
                    }
                    Phase::Turn(turn) => {
                        sink.emit(&SequenceEvent::TurnStarted {
                            title: rotation.title.clone(),
                            turn,
                            turns: rotation.turns,
                        });
                        match mode {
                            Mode::Automatic => {
                                clock.sleep(Duration::from_secs(u64::from(
                                    rotation.per_turn_seconds,
                                )));
                                cursor.phase = after_turn(turn, rotation.turns);
                            }
                            Mode::Manual => {
                                let token = issue_token(serial, &rotation.title, Some(turn));
                                sink.emit(&SequenceEvent::AwaitingContinue {
                                    token: token.clone(),
                                    seconds: rotation.per_turn_seconds,
                                });
                                cursor.phase = Phase::AwaitingTurn(turn);
                                cursor.waiting = Some(token);
                            }
                        }
                    }
                    Phase::AwaitingTurn(turn) => {
                        cursor.phase = after_turn(turn, rotation.turns);
                    }
                    phase => unreachable_phase(&rotation.title, phase),
                },
            }
        }

        let entries = slot
            .take()
            .map(|cursor| cursor.appended)
            .unwrap_or_default();
        let seconds = entries.iter().map(|e| e.seconds).sum();
        sink.emit(&SequenceEvent::RunFinished {
            entries: entries.len(),
            seconds,
        });
        tracing::info!("Run finished with {} entries ({}s)", entries.len(), seconds);
        RunStatus::Finished(entries)
    }

    /// Start `plan` and run it as far as it goes
    pub fn run(&mut self, plan: Plan, log: &mut RunLog) -> RunStatus {
        self.begin(plan);
        self.advance(log)
    }

    /// Run a single timed step
    pub fn run_step(&mut self, name: &str, seconds: u32, log: &mut RunLog) -> RunStatus {
        self.run(Plan::step(name, seconds), log)
    }

    /// Run a single rotation block
    pub fn run_rotation(
        &mut self,
        title: &str,
        per_turn_seconds: u32,
        turns: u32,
        log: &mut RunLog,
    ) -> RunStatus {
        self.run(Plan::rotation(title, per_turn_seconds, turns), log)
    }

    /// Coag, Coag Cure, Dip
    pub fn run_pre_dip(&mut self, durations: &Durations, log: &mut RunLog) -> RunStatus {
        self.run_section(Section::PreDip, durations, log)
    }

    /// Rotation, SANDY, Leech, Cure
    pub fn run_dip_block(&mut self, durations: &Durations, log: &mut RunLog) -> RunStatus {
        self.run_section(Section::Dip, durations, log)
    }

    /// Dip 2, Rotation 2, Leech 2, Cure 2 with the Dip 2 cascade applied
    pub fn run_dip2_block(&mut self, durations: &Durations, log: &mut RunLog) -> RunStatus {
        self.run_section(Section::Dip2, durations, log)
    }

    /// All eleven steps in order
    pub fn run_all(&mut self, durations: &Durations, log: &mut RunLog) -> RunStatus {
        self.run_section(Section::All, durations, log)
    }

    pub fn run_section(
        &mut self,
        section: Section,
        durations: &Durations,
        log: &mut RunLog,
    ) -> RunStatus {
        tracing::info!("Running section {}", section);
        self.run(Plan::for_section(section, durations), log)
    }
}

fn complete_step(
    sink: &mut impl EventSink,
    cursor: &mut Cursor,
    name: String,
    seconds: u32,
    log: &mut RunLog,
) {
    let seconds = u64::from(seconds);
    sink.emit(&SequenceEvent::StepCompleted {
        name: name.clone(),
        seconds,
    });
    cursor.finish_unit(LogEntry::new(name, seconds), log);
}

/// Phase following a finished turn; never counts past `turns`
fn after_turn(turn: u32, turns: u32) -> Phase {
    if turn >= turns {
        Phase::TurnsDone
    } else {
        Phase::Turn(turn + 1)
    }
}

fn issue_token(serial: &mut u64, unit: &str, turn: Option<u32>) -> ContinueToken {
    *serial += 1;
    ContinueToken {
        unit: unit.to_string(),
        turn,
        serial: *serial,
    }
}

// Phases are only ever set by the matching unit kind.
fn unreachable_phase(unit: &str, phase: Phase) -> ! {
    unreachable!("unit {} cannot be in phase {:?}", unit, phase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{LEECH_2, ROTATION_2};
    use crate::{NullSink, RecordingSink, VirtualClock};

    type TestSequencer = Sequencer<VirtualClock, RecordingSink>;

    fn automatic() -> TestSequencer {
        crate::logging::init_test();
        Sequencer::new(Mode::Automatic, VirtualClock::new(), RecordingSink::new())
    }

    fn manual() -> TestSequencer {
        crate::logging::init_test();
        Sequencer::new(Mode::Manual, VirtualClock::new(), RecordingSink::new())
    }

    fn pairs(log: &RunLog) -> Vec<(String, u64)> {
        log.export()
            .iter()
            .map(|e| (e.step.clone(), e.seconds))
            .collect()
    }

    fn reference_durations() -> Durations {
        Durations {
            coag: 10,
            coag_cure: 10,
            dip: 10,
            rotation_per_turn: 2,
            rotation_turns: 4,
            sandy: 10,
            leech: 10,
            cure: 2400,
            dip2: 0,
            rotation2_per_turn: 2,
            rotation2_turns: 4,
            leech2: 10,
            cure2: 2400,
        }
    }

    #[test]
    fn test_step_ticks_once_per_second() {
        let mut seq = automatic();
        let mut log = RunLog::new();

        let status = seq.run_step("Coag", 5, &mut log);

        assert_eq!(status.entries(), &[LogEntry::new("Coag", 5)]);
        assert_eq!(log.len(), 1);
        assert_eq!(seq.sink().ticks_for("Coag"), 5);
        assert_eq!(seq.clock().elapsed(), Duration::from_secs(5));

        let events = seq.sink().events();
        assert!(matches!(events[1], SequenceEvent::StepStarted { .. }));
        assert!(matches!(
            events[2],
            SequenceEvent::Tick { remaining: 5, .. }
        ));
        assert!(matches!(
            events[events.len() - 2],
            SequenceEvent::StepCompleted { seconds: 5, .. }
        ));
        assert!(!seq.is_running());
    }

    #[test]
    fn test_tick_progress_reaches_one() {
        let mut seq = automatic();
        let mut log = RunLog::new();
        seq.run_step("Dip", 4, &mut log);

        let last_tick = seq
            .sink()
            .events()
            .iter()
            .rev()
            .find_map(|e| match e {
                SequenceEvent::Tick {
                    remaining,
                    progress,
                    ..
                } => Some((*remaining, *progress)),
                _ => None,
            })
            .unwrap();
        assert_eq!(last_tick, (1, 1.0));
    }

    #[test]
    fn test_zero_step_is_skipped_without_ticks() {
        let mut seq = automatic();
        let mut log = RunLog::new();

        let status = seq.run_step("SANDY", 0, &mut log);

        assert_eq!(status.entries(), &[LogEntry::new("SANDY", 0)]);
        assert_eq!(seq.sink().ticks_for("SANDY"), 0);
        assert_eq!(seq.clock().sleeps(), 0);
        assert!(seq
            .sink()
            .events()
            .contains(&SequenceEvent::StepSkipped { name: "SANDY".into() }));
    }

    #[test]
    fn test_rotation_logs_aggregate() {
        let mut seq = automatic();
        let mut log = RunLog::new();

        let status = seq.run_rotation("Rotation", 2, 4, &mut log);

        assert_eq!(status.entries(), &[LogEntry::new("Rotation", 8)]);
        assert_eq!(seq.clock().sleeps(), 4);
        assert_eq!(seq.clock().elapsed(), Duration::from_secs(8));

        let turns: Vec<u32> = seq
            .sink()
            .events()
            .iter()
            .filter_map(|e| match e {
                SequenceEvent::TurnStarted { turn, .. } => Some(*turn),
                _ => None,
            })
            .collect();
        assert_eq!(turns, vec![1, 2, 3, 4]);
        assert_eq!(seq.sink().ticks_for("Rotation"), 0);
    }

    #[test]
    fn test_rotation_with_a_zero_factor_is_full_skip() {
        for (per_turn, turns) in [(0, 4), (2, 0), (0, 0)] {
            let mut seq = automatic();
            let mut log = RunLog::new();

            let status = seq.run_rotation("Rotation", per_turn, turns, &mut log);

            assert_eq!(status.entries(), &[LogEntry::new("Rotation", 0)]);
            assert_eq!(seq.clock().sleeps(), 0);
            assert!(seq.sink().events().contains(&SequenceEvent::RotationSkipped {
                title: "Rotation".into()
            }));
        }
    }

    #[test]
    fn test_run_all_matches_reference_log() {
        let mut seq = automatic();
        let mut log = RunLog::new();

        let status = seq.run_all(&reference_durations(), &mut log);

        assert!(status.is_finished());
        let expected: Vec<(String, u64)> = [
            ("Coag", 10),
            ("Coag Cure", 10),
            ("Dip", 10),
            ("Rotation", 8),
            ("SANDY", 10),
            ("Leech", 10),
            ("Cure", 2400),
            ("Dip 2", 0),
            ("Rotation 2", 0),
            ("Leech 2", 0),
            ("Cure 2", 2400),
        ]
        .iter()
        .map(|(n, s)| (n.to_string(), *s))
        .collect();
        assert_eq!(pairs(&log), expected);
        assert_eq!(status.entries().len(), 11);
    }

    #[test]
    fn test_run_all_always_eleven_entries() {
        let mut durations = reference_durations();
        durations.dip2 = 5;
        durations.coag = 0;
        durations.rotation_turns = 0;

        let mut seq = automatic();
        let mut log = RunLog::new();
        seq.run_all(&durations, &mut log);

        let names: Vec<String> = log.export().iter().map(|e| e.step.clone()).collect();
        assert_eq!(names, crate::plan::SEQUENCE.to_vec());
    }

    #[test]
    fn test_dip2_cascade_ignores_dependent_config() {
        let mut durations = reference_durations();
        durations.dip2 = 0;
        durations.rotation2_per_turn = 9;
        durations.rotation2_turns = 9;
        durations.leech2 = 99;

        let mut seq = automatic();
        let mut log = RunLog::new();
        seq.run_dip2_block(&durations, &mut log);

        assert_eq!(log.export()[1], LogEntry::new(ROTATION_2, 0));
        assert_eq!(log.export()[2], LogEntry::new(LEECH_2, 0));

        let cascades = seq
            .sink()
            .events()
            .iter()
            .filter(|e| matches!(e, SequenceEvent::CascadeSkipped { .. }))
            .count();
        assert_eq!(cascades, 2);
        // Cure 2 is the only thing that waited
        assert_eq!(seq.clock().elapsed(), Duration::from_secs(2400));
    }

    #[test]
    fn test_dip2_block_runs_dependents() {
        let mut durations = reference_durations();
        durations.dip2 = 30;
        durations.rotation2_per_turn = 3;
        durations.rotation2_turns = 2;
        durations.leech2 = 5;

        let mut seq = automatic();
        let mut log = RunLog::new();
        seq.run_dip2_block(&durations, &mut log);

        assert_eq!(
            pairs(&log),
            vec![
                ("Dip 2".to_string(), 30),
                ("Rotation 2".to_string(), 6),
                ("Leech 2".to_string(), 5),
                ("Cure 2".to_string(), 2400),
            ]
        );
    }

    #[test]
    fn test_sections_append_across_runs_until_reset() {
        let durations = reference_durations();
        let mut seq = automatic();
        let mut log = RunLog::new();

        seq.run_pre_dip(&durations, &mut log);
        seq.run_dip_block(&durations, &mut log);
        assert_eq!(log.len(), 7);

        log.clear();
        assert!(log.is_empty());

        seq.run_pre_dip(&durations, &mut log);
        assert_eq!(log.len(), 3);
        assert_eq!(log.export()[0], LogEntry::new("Coag", 10));
    }

    #[test]
    fn test_sink_does_not_affect_log() {
        let durations = reference_durations();

        let mut recorded = automatic();
        let mut log_a = RunLog::new();
        recorded.run_all(&durations, &mut log_a);

        let mut silent = Sequencer::new(Mode::Automatic, VirtualClock::new(), NullSink);
        let mut log_b = RunLog::new();
        silent.run_all(&durations, &mut log_b);

        assert_eq!(log_a, log_b);
    }

    #[test]
    fn test_manual_step_stays_suspended() {
        let mut seq = manual();
        let mut log = RunLog::new();

        let status = seq.run_step("Leech", 10, &mut log);
        let token = status.token().cloned().unwrap();
        assert_eq!(token.unit, "Leech");
        assert_eq!(token.turn, None);

        for _ in 0..3 {
            assert_eq!(seq.advance(&mut log), RunStatus::Suspended(token.clone()));
        }
        assert!(log.is_empty());
        assert_eq!(seq.clock().sleeps(), 0);
        assert_eq!(seq.pending_token(), Some(&token));

        let status = seq.continue_run(&token, &mut log).unwrap();
        assert_eq!(status.entries(), &[LogEntry::new("Leech", 10)]);
        assert_eq!(seq.sink().ticks_for("Leech"), 0);
        assert_eq!(seq.advance(&mut log), RunStatus::Idle);
    }

    #[test]
    fn test_manual_rotation_suspends_each_turn() {
        let mut seq = manual();
        let mut log = RunLog::new();

        let mut status = seq.run_rotation("Rotation", 3, 3, &mut log);
        let mut turns = Vec::new();
        while let RunStatus::Suspended(token) = status {
            turns.push(token.turn.unwrap());
            status = seq.continue_run(&token, &mut log).unwrap();
        }

        assert_eq!(turns, vec![1, 2, 3]);
        assert_eq!(status.entries(), &[LogEntry::new("Rotation", 9)]);
        assert_eq!(seq.clock().sleeps(), 0);
    }

    #[test]
    fn test_manual_skips_do_not_suspend() {
        let mut durations = reference_durations();
        durations.coag = 0;
        durations.coag_cure = 0;
        durations.dip = 7;

        let mut seq = manual();
        let mut log = RunLog::new();

        let status = seq.run_pre_dip(&durations, &mut log);
        let token = status.token().cloned().unwrap();
        assert_eq!(token.unit, "Dip");
        assert_eq!(
            pairs(&log),
            vec![("Coag".to_string(), 0), ("Coag Cure".to_string(), 0)]
        );

        seq.continue_run(&token, &mut log).unwrap();
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_stale_token_rejected() {
        let mut seq = manual();
        let mut log = RunLog::new();

        let first = seq
            .run_rotation("Rotation", 1, 2, &mut log)
            .token()
            .cloned()
            .unwrap();
        let second = seq
            .continue_run(&first, &mut log)
            .unwrap()
            .token()
            .cloned()
            .unwrap();
        assert_ne!(first, second);

        assert!(matches!(seq.resume(&first), Err(Error::Continue(_))));
        assert_eq!(seq.pending_token(), Some(&second));
    }

    #[test]
    fn test_resume_without_run_is_error() {
        let mut seq = manual();
        let mut log = RunLog::new();
        let token = seq.run_step("Cure", 1, &mut log).token().cloned().unwrap();
        seq.continue_run(&token, &mut log).unwrap();

        assert!(matches!(seq.resume(&token), Err(Error::Continue(_))));
    }

    #[test]
    fn test_new_run_abandons_suspended_one() {
        let durations = reference_durations();
        let mut seq = manual();
        let mut log = RunLog::new();

        let token = seq.run_step("Coag", 10, &mut log).token().cloned().unwrap();
        assert!(seq.continue_run(&token, &mut log).unwrap().is_finished());

        let first = seq.run_pre_dip(&durations, &mut log).token().cloned().unwrap();
        seq.begin(Plan::step("Dip", 0));

        assert!(matches!(seq.resume(&first), Err(Error::Continue(_))));
        let status = seq.advance(&mut log);
        assert_eq!(status.entries(), &[LogEntry::new("Dip", 0)]);
        // partial pre-dip left nothing behind, earlier entry kept
        assert_eq!(
            pairs(&log),
            vec![("Coag".to_string(), 10), ("Dip".to_string(), 0)]
        );
    }

    #[test]
    fn test_mode_switch_between_runs() {
        let mut seq = manual();
        let mut log = RunLog::new();
        assert!(seq.run_step("Cure", 3, &mut log).token().is_some());

        seq.set_mode(Mode::Automatic);
        let status = seq.run_step("Cure", 3, &mut log);
        assert!(status.is_finished());
        assert_eq!(seq.clock().elapsed(), Duration::from_secs(3));
    }

    #[test]
    fn test_mode_switch_while_suspended_applies_to_remaining_turns() {
        let mut seq = manual();
        let mut log = RunLog::new();

        let status = seq.run_rotation("Rotation", 2, 4, &mut log);
        let token = status.token().cloned().unwrap();
        assert_eq!(token.turn, Some(1));

        seq.set_mode(Mode::Automatic);
        let status = seq.continue_run(&token, &mut log).unwrap();

        assert!(status.is_finished());
        assert_eq!(status.entries(), &[LogEntry::new("Rotation", 8)]);
        assert!(seq.pending_token().is_none());
        // turn 1 was manual, turns 2 to 4 went through the clock
        assert_eq!(seq.clock().sleeps(), 3);
        assert_eq!(seq.clock().elapsed(), Duration::from_secs(6));

        let awaiting = seq
            .sink()
            .events()
            .iter()
            .filter(|e| matches!(e, SequenceEvent::AwaitingContinue { .. }))
            .count();
        assert_eq!(awaiting, 1);
    }

    #[test]
    fn test_mode_switch_while_suspended_on_step() {
        let mut seq = manual();
        let mut log = RunLog::new();

        let token = seq
            .run_pre_dip(&reference_durations(), &mut log)
            .token()
            .cloned()
            .unwrap();
        assert_eq!(token.unit, "Coag");

        seq.set_mode(Mode::Automatic);
        let status = seq.continue_run(&token, &mut log).unwrap();

        assert!(status.is_finished());
        assert_eq!(log.len(), 3);
        assert_eq!(seq.clock().elapsed(), Duration::from_secs(20));
    }

    #[test]
    fn test_after_turn_stops_at_last_turn() {
        assert_eq!(after_turn(1, 4), Phase::Turn(2));
        assert_eq!(after_turn(4, 4), Phase::TurnsDone);
        assert_eq!(after_turn(u32::MAX, u32::MAX), Phase::TurnsDone);
    }

    #[test]
    fn test_run_finished_event_totals() {
        let mut seq = automatic();
        let mut log = RunLog::new();
        seq.run_pre_dip(&reference_durations(), &mut log);

        assert_eq!(
            seq.sink().events().last(),
            Some(&SequenceEvent::RunFinished {
                entries: 3,
                seconds: 30
            })
        );
        assert_eq!(
            seq.sink().events().first(),
            Some(&SequenceEvent::RunStarted {
                units: 3,
                planned_seconds: 30
            })
        );
    }
}
