//! Cooperative single-threaded driver for timed round work
//!
//! The host event loop calls [`Scheduler::poll`] between input events. The
//! scheduler never blocks and never spawns: it fires whatever scheduled work
//! is due (countdown tick, solver step, end of input cooldown) and
//! reschedules repeating tasks.
//!
//! Each task is bound to the round it was scheduled for and carries a
//! cancellation token. A task whose token was cancelled, whose round has
//! ended, or whose round was replaced is a stale callback: it is dropped
//! without touching the round.

use crate::presenter::{format_clock, Presenter};
use crate::round::GuessOutcome;
use crate::solver::{Solver, SolverStep};
use crate::{ComplexValue, RoundState};
use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);
pub const AUTO_STEP_INTERVAL: Duration = Duration::from_millis(150);
pub const INPUT_COOLDOWN: Duration = Duration::from_millis(200);

/// Shared cancellation flag
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent
    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

/// Handle to a scheduled task
///
/// Cancelling is always safe: twice, after the task fired, or after the
/// scheduler itself stopped it.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: u64,
    token: CancelToken,
}

impl TaskHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }
}

#[derive(Debug)]
struct ScheduledTask {
    handle: TaskHandle,
    round_id: u64,
    due: Instant,
    every: Duration,
}

impl ScheduledTask {
    fn reschedule(&mut self, now: Instant) {
        let next = self.due + self.every;
        // Never queue a burst of catch-up firings after a stall
        self.due = if next > now { next } else { now + self.every };
    }
}

/// Something the scheduler did during a poll
#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerEvent {
    Ticked {
        remaining_secs: u64,
    },
    SolverGuessed {
        guess: ComplexValue,
        outcome: GuessOutcome,
    },
    SolverExhausted,
    InputReleased,
    Stopped(StopReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    RoundOver,
    /// The presentation surface disappeared
    SurfaceGone,
}

#[derive(Debug)]
pub struct Scheduler {
    timer: Option<ScheduledTask>,
    auto_step: Option<ScheduledTask>,
    cooldown: Option<ScheduledTask>,
    solver: Option<Solver>,
    next_id: u64,
    tick_interval: Duration,
    step_interval: Duration,
    cooldown_interval: Duration,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self::with_intervals(TICK_INTERVAL, AUTO_STEP_INTERVAL, INPUT_COOLDOWN)
    }

    pub fn with_intervals(tick: Duration, step: Duration, cooldown: Duration) -> Self {
        Self {
            timer: None,
            auto_step: None,
            cooldown: None,
            solver: None,
            next_id: 1,
            tick_interval: tick,
            step_interval: step,
            cooldown_interval: cooldown,
        }
    }

    fn schedule(&mut self, round: &RoundState, due: Instant, every: Duration) -> ScheduledTask {
        let handle = TaskHandle {
            id: self.next_id,
            token: CancelToken::new(),
        };
        self.next_id += 1;
        ScheduledTask {
            handle,
            round_id: round.id(),
            due,
            every,
        }
    }

    /// Start the once-per-interval countdown tick, replacing any previous timer
    pub fn start_timer(&mut self, round: &RoundState, now: Instant) -> TaskHandle {
        cancel_slot(&mut self.timer);
        let task = self.schedule(round, now + self.tick_interval, self.tick_interval);
        let handle = task.handle.clone();
        self.timer = Some(task);
        handle
    }

    /// Attach a solver and start stepping it, replacing any previous one
    pub fn start_auto(&mut self, round: &RoundState, solver: Solver, now: Instant) -> TaskHandle {
        cancel_slot(&mut self.auto_step);
        let task = self.schedule(round, now + self.step_interval, self.step_interval);
        let handle = task.handle.clone();
        self.auto_step = Some(task);
        self.solver = Some(solver);
        handle
    }

    /// Disable the submit control until the cooldown elapses
    pub fn start_cooldown(
        &mut self,
        round: &RoundState,
        now: Instant,
        presenter: &mut dyn Presenter,
    ) -> TaskHandle {
        cancel_slot(&mut self.cooldown);
        let task = self.schedule(round, now + self.cooldown_interval, self.cooldown_interval);
        let handle = task.handle.clone();
        self.cooldown = Some(task);
        presenter.set_submit_enabled(false);
        handle
    }

    /// Whether the submit control is currently disabled
    pub fn input_locked(&self) -> bool {
        is_live(&self.cooldown)
    }

    pub fn solver(&self) -> Option<&Solver> {
        self.solver.as_ref()
    }

    /// Number of tasks still waiting to fire
    pub fn pending(&self) -> usize {
        [&self.timer, &self.auto_step, &self.cooldown]
            .into_iter()
            .filter(|slot| is_live(slot))
            .count()
    }

    /// Cancel every scheduled task and drop the solver
    pub fn stop_all(&mut self) {
        cancel_slot(&mut self.timer);
        cancel_slot(&mut self.auto_step);
        cancel_slot(&mut self.cooldown);
        self.solver = None;
        debug!("Stopped all scheduled tasks");
    }

    /// Fire everything that is due at `now`
    pub fn poll(
        &mut self,
        now: Instant,
        round: &mut RoundState,
        presenter: &mut dyn Presenter,
    ) -> Vec<SchedulerEvent> {
        let mut events = Vec::new();
        if self.pending() == 0 {
            self.stop_all_quiet();
            return events;
        }

        if !presenter.is_alive() {
            warn!(round = round.id(), "Presentation surface gone, stopping");
            self.stop_all();
            events.push(SchedulerEvent::Stopped(StopReason::SurfaceGone));
            return events;
        }

        if take_due(&mut self.cooldown, now, round, "cooldown") {
            cancel_slot(&mut self.cooldown);
            presenter.set_submit_enabled(true);
            events.push(SchedulerEvent::InputReleased);
        }

        if take_due(&mut self.timer, now, round, "timer") {
            round.tick(now);
            let remaining_secs = round.remaining_seconds(now);
            presenter.show_timer(&format_clock(remaining_secs));
            events.push(SchedulerEvent::Ticked { remaining_secs });
            if let Some(task) = self.timer.as_mut() {
                task.reschedule(now);
            }
        }

        if take_due(&mut self.auto_step, now, round, "auto_step") {
            self.step_solver(now, round, presenter, &mut events);
        }

        if round.is_terminal() && self.pending() > 0 {
            self.stop_all();
            events.push(SchedulerEvent::Stopped(StopReason::RoundOver));
        }

        events
    }

    fn step_solver(
        &mut self,
        now: Instant,
        round: &mut RoundState,
        presenter: &mut dyn Presenter,
        events: &mut Vec<SchedulerEvent>,
    ) {
        let Some(solver) = self.solver.as_mut() else {
            cancel_slot(&mut self.auto_step);
            return;
        };

        match solver.next_guess() {
            SolverStep::Guess(guess) => match round.submit_guess_at(guess, now) {
                Ok(outcome) => {
                    solver.observe(guess, round);
                    presenter.log_line(&format!(
                        "Attempt {}: {} (|{:.2}|)",
                        round.attempts_used(),
                        guess,
                        guess.magnitude()
                    ));
                    presenter.show_feedback(&outcome.feedback());
                    events.push(SchedulerEvent::SolverGuessed { guess, outcome });
                }
                Err(err) => debug!(%guess, %err, "Solver guess rejected"),
            },
            SolverStep::Exhausted => {
                round.force_end(now);
                presenter.log_line("Solver exhausted search.");
                events.push(SchedulerEvent::SolverExhausted);
            }
        }

        if let Some(task) = self.auto_step.as_mut() {
            task.reschedule(now);
        }
    }

    fn stop_all_quiet(&mut self) {
        self.timer = None;
        self.auto_step = None;
        self.cooldown = None;
        self.solver = None;
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        // Outstanding handles must not report a task that can never fire
        cancel_slot(&mut self.timer);
        cancel_slot(&mut self.auto_step);
        cancel_slot(&mut self.cooldown);
    }
}

fn is_live(slot: &Option<ScheduledTask>) -> bool {
    slot.as_ref().is_some_and(|task| task.handle.is_active())
}

fn cancel_slot(slot: &mut Option<ScheduledTask>) {
    if let Some(task) = slot.take() {
        task.handle.cancel();
    }
}

/// Whether the task in `slot` should fire now; clears stale tasks
fn take_due(slot: &mut Option<ScheduledTask>, now: Instant, round: &RoundState, name: &str) -> bool {
    let Some(task) = slot.as_ref() else {
        return false;
    };
    if !task.handle.is_active() || task.round_id != round.id() || round.is_terminal() {
        debug!(task = name, id = task.handle.id, round = round.id(), "Dropping stale callback");
        cancel_slot(slot);
        return false;
    }
    now >= task.due
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presenter::RecordingPresenter;
    use crate::solver::SpiralSolver;
    use crate::{DifficultyProfile, Outcome};

    fn setup(target: (i64, i64), profile: DifficultyProfile) -> (RoundState, Instant) {
        let now = Instant::now();
        (
            RoundState::new(7, ComplexValue::new(target.0, target.1), profile, now),
            now,
        )
    }

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_timer_ticks_and_times_out() {
        let (mut round, start) = setup((1, 1), DifficultyProfile::new(10, 15, 3));
        let mut presenter = RecordingPresenter::new();
        let mut scheduler = Scheduler::new();
        scheduler.start_timer(&round, start);

        let events = scheduler.poll(start + Duration::from_millis(500), &mut round, &mut presenter);
        assert!(events.is_empty());

        let events = scheduler.poll(start + secs(1), &mut round, &mut presenter);
        assert_eq!(events, vec![SchedulerEvent::Ticked { remaining_secs: 2 }]);
        assert_eq!(presenter.timer.as_deref(), Some("0:02"));

        scheduler.poll(start + secs(2), &mut round, &mut presenter);
        let events = scheduler.poll(start + secs(3), &mut round, &mut presenter);
        assert_eq!(
            events,
            vec![
                SchedulerEvent::Ticked { remaining_secs: 0 },
                SchedulerEvent::Stopped(StopReason::RoundOver)
            ]
        );
        assert_eq!(round.outcome(), Outcome::LostTimeout);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_cancel_twice_is_harmless() {
        let (mut round, start) = setup((1, 1), DifficultyProfile::default());
        let mut presenter = RecordingPresenter::new();
        let mut scheduler = Scheduler::new();

        let handle = scheduler.start_timer(&round, start);
        handle.cancel();
        handle.cancel();
        assert!(!handle.is_active());
        assert_eq!(scheduler.pending(), 0);

        let events = scheduler.poll(start + secs(5), &mut round, &mut presenter);
        assert!(events.is_empty());
        assert!(presenter.timer.is_none());
    }

    #[test]
    fn test_cancel_after_fire_leaves_nothing_pending() {
        let (mut round, start) = setup((1, 1), DifficultyProfile::default());
        let mut presenter = RecordingPresenter::new();
        let mut scheduler = Scheduler::new();

        let handle = scheduler.start_cooldown(&round, start, &mut presenter);
        assert!(scheduler.input_locked());
        assert!(!presenter.submit_enabled);

        let events = scheduler.poll(start + INPUT_COOLDOWN, &mut round, &mut presenter);
        assert_eq!(events, vec![SchedulerEvent::InputReleased]);
        assert!(presenter.submit_enabled);

        handle.cancel();
        handle.cancel();
        assert_eq!(scheduler.pending(), 0);
        assert!(!scheduler.input_locked());
    }

    #[test]
    fn test_stop_all_cancels_handles() {
        let (round, start) = setup((1, 1), DifficultyProfile::default());
        let mut presenter = RecordingPresenter::new();
        let mut scheduler = Scheduler::new();

        let timer = scheduler.start_timer(&round, start);
        let step = scheduler.start_auto(&round, Solver::Spiral(SpiralSolver::new(10).unwrap()), start);
        let cooldown = scheduler.start_cooldown(&round, start, &mut presenter);
        assert_eq!(scheduler.pending(), 3);

        scheduler.stop_all();
        scheduler.stop_all();
        assert!(!timer.is_active() && !step.is_active() && !cooldown.is_active());
        assert_eq!(scheduler.pending(), 0);
        assert!(scheduler.solver().is_none());
    }

    #[test]
    fn test_stale_tick_against_finished_round_is_dropped() {
        let (mut round, start) = setup((1, 1), DifficultyProfile::default());
        let mut presenter = RecordingPresenter::new();
        let mut scheduler = Scheduler::new();
        scheduler.start_timer(&round, start);

        round.submit_guess_at(ComplexValue::new(1, 1), start).unwrap();
        let attempts = round.attempts_used();

        let events = scheduler.poll(start + secs(1), &mut round, &mut presenter);
        assert!(events.is_empty());
        assert!(presenter.timer.is_none());
        assert_eq!(round.attempts_used(), attempts);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_task_for_replaced_round_is_dropped() {
        let (old_round, start) = setup((1, 1), DifficultyProfile::default());
        let mut presenter = RecordingPresenter::new();
        let mut scheduler = Scheduler::new();
        scheduler.start_timer(&old_round, start);

        let mut new_round = RoundState::new(
            old_round.id() + 1,
            ComplexValue::new(2, 2),
            DifficultyProfile::default(),
            start,
        );
        let events = scheduler.poll(start + secs(1), &mut new_round, &mut presenter);
        assert!(events.is_empty());
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_spiral_auto_step_finds_target() {
        let (mut round, start) = setup((1, 0), DifficultyProfile::new(10, 15, 120));
        let mut presenter = RecordingPresenter::new();
        let mut scheduler = Scheduler::new();
        scheduler.start_timer(&round, start);
        scheduler.start_auto(&round, Solver::Spiral(SpiralSolver::new(10).unwrap()), start);

        let mut now = start;
        for _ in 0..20 {
            now += AUTO_STEP_INTERVAL;
            scheduler.poll(now, &mut round, &mut presenter);
            if round.is_terminal() {
                break;
            }
        }

        // (0,0), (-1,-1), (0,-1), (1,-1), (1,0)
        assert_eq!(round.attempts_used(), 5);
        assert!(round.outcome().is_win());
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(presenter.log.len(), 5);
    }

    #[test]
    fn test_spiral_exhaustion_is_lost_attempts() {
        let (mut round, start) = setup((9, 9), DifficultyProfile::new(10, 50, 120));
        let mut presenter = RecordingPresenter::new();
        let mut scheduler = Scheduler::new();
        scheduler.start_auto(&round, Solver::Spiral(SpiralSolver::new(1).unwrap()), start);

        let mut now = start;
        let mut exhausted = false;
        for _ in 0..20 {
            now += AUTO_STEP_INTERVAL;
            let events = scheduler.poll(now, &mut round, &mut presenter);
            if events.contains(&SchedulerEvent::SolverExhausted) {
                exhausted = true;
                break;
            }
        }

        assert!(exhausted);
        assert_eq!(round.attempts_used(), 9);
        assert_eq!(round.outcome(), Outcome::LostAttempts);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_surface_gone_stops_scheduler() {
        let (mut round, start) = setup((1, 1), DifficultyProfile::default());
        let mut presenter = RecordingPresenter::new();
        presenter.alive = false;
        let mut scheduler = Scheduler::new();
        scheduler.start_timer(&round, start);

        let events = scheduler.poll(start + secs(1), &mut round, &mut presenter);
        assert_eq!(events, vec![SchedulerEvent::Stopped(StopReason::SurfaceGone)]);
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(round.outcome(), Outcome::InProgress);
    }

    #[test]
    fn test_stall_does_not_burst() {
        let (mut round, start) = setup((1, 1), DifficultyProfile::new(10, 15, 120));
        let mut presenter = RecordingPresenter::new();
        let mut scheduler = Scheduler::new();
        scheduler.start_timer(&round, start);

        let events = scheduler.poll(start + secs(10), &mut round, &mut presenter);
        assert_eq!(events.len(), 1);
        let events = scheduler.poll(start + secs(10), &mut round, &mut presenter);
        assert!(events.is_empty());
    }
}
