//! Round orchestration
//!
//! A [`Session`] owns the current [`RoundState`] and the [`Scheduler`] that
//! drives it, and forwards terminal outcomes to the [`ScoreStore`] and
//! [`Presenter`] collaborators exactly once per round.

use crate::achievements::{self, Achievement};
use crate::generator;
use crate::presenter::{format_clock, Presenter};
use crate::round::GuessOutcome;
use crate::scheduler::{Scheduler, SchedulerEvent, StopReason};
use crate::solver::{Solver, SolverKind};
use crate::{
    AbortReason, ComplexValue, Difficulty, DifficultyProfile, GameMode, GuessError, Outcome,
    RoundState, SolverError, StoreResult,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{info, warn};

/// Most recent rounds kept in history
pub const MAX_HISTORY: usize = 200;

/// Leaderboard row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub name: String,
    pub points: u32,
    pub attempts: u32,
    /// Seconds taken
    pub time: u64,
    pub mode: GameMode,
    pub date: String,
}

/// One finished round, newest first in the history log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub result: String,
    pub target: String,
    pub attempts: u32,
    pub time: u64,
    pub points: u32,
    pub mode: GameMode,
    /// Stamped by the store when the record is written
    #[serde(default)]
    pub date: String,
}

/// Persistence collaborator
///
/// Failures are reported but never abort a round; the session logs them and
/// carries on with empty defaults.
pub trait ScoreStore {
    fn record_result(
        &mut self,
        name: &str,
        points: u32,
        attempts: u32,
        elapsed_secs: u64,
        mode: GameMode,
    ) -> StoreResult<()>;

    /// Best scores, points descending
    fn top_scores(&self, limit: usize) -> StoreResult<Vec<ScoreEntry>>;

    fn record_history(&mut self, record: HistoryRecord) -> StoreResult<()>;

    /// Persist `earned` and return the ones that were not unlocked before
    fn unlock_achievements(&mut self, earned: &[Achievement]) -> StoreResult<Vec<Achievement>>;

    fn clear_leaderboard(&mut self) -> StoreResult<()>;
}

/// Everything needed to start a round
#[derive(Debug, Clone, PartialEq)]
pub struct RoundSetup {
    pub profile: DifficultyProfile,
    pub mode: GameMode,
    /// Opaque seed for a reproducible target
    pub seed: Option<String>,
    pub solver: Option<SolverKind>,
    pub solver_seed: Option<u64>,
}

impl RoundSetup {
    pub fn standard(difficulty: Difficulty) -> Self {
        Self {
            profile: difficulty.profile(),
            mode: GameMode::Standard,
            seed: None,
            solver: None,
            solver_seed: None,
        }
    }

    /// Medium tier seeded from a `YYYY-MM-DD` date
    pub fn daily(date: &str) -> Self {
        Self {
            mode: GameMode::Daily,
            seed: Some(generator::daily_seed(date)),
            ..Self::standard(Difficulty::Medium)
        }
    }

    pub fn survival() -> Self {
        Self {
            profile: DifficultyProfile::survival(),
            mode: GameMode::Survival,
            ..Self::standard(Difficulty::Easy)
        }
    }

    pub fn solver(difficulty: Difficulty, kind: SolverKind) -> Self {
        Self {
            mode: GameMode::Solver,
            solver: Some(kind),
            ..Self::standard(difficulty)
        }
    }

    pub fn with_profile(mut self, profile: DifficultyProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_seed(mut self, seed: impl Into<String>) -> Self {
        self.seed = Some(seed.into());
        self
    }

    pub fn with_solver_seed(mut self, seed: u64) -> Self {
        self.solver_seed = Some(seed);
        self
    }
}

/// Progress through a multi-round survival run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurvivalProgress {
    /// 1-based index of the current round
    pub round: u32,
    pub wins: u32,
    pub target_rounds: u32,
    /// The run is over: every round cleared, or one lost
    pub finished: bool,
}

impl SurvivalProgress {
    pub fn new(target_rounds: u32) -> Self {
        Self {
            round: 1,
            wins: 0,
            target_rounds: target_rounds.max(1),
            finished: false,
        }
    }

    pub fn completed(&self) -> bool {
        self.finished && self.wins >= self.target_rounds
    }
}

/// The one-shot message payload for a finished round
#[derive(Debug, Clone, PartialEq)]
pub struct RoundSummary {
    pub outcome: Outcome,
    pub target: ComplexValue,
    pub attempts: u32,
    pub elapsed_secs: u64,
    pub points: u32,
    pub mode: GameMode,
    /// Driven by a solver rather than a player
    pub auto: bool,
    pub new_achievements: Vec<Achievement>,
    pub survival: Option<SurvivalProgress>,
}

impl RoundSummary {
    pub fn message(&self) -> String {
        let target = self.target;
        let mut msg = match self.outcome {
            Outcome::Won { points } => format!(
                "Correct! You guessed {} in {} attempts. Points: {}.",
                target, self.attempts, points
            ),
            Outcome::LostAttempts if self.auto => format!(
                "Solver failed after {} attempts. The number was {}",
                self.attempts, target
            ),
            Outcome::LostAttempts => format!("Out of attempts! The number was {}", target),
            Outcome::LostTimeout => format!("Time's up! The number was {}", target),
            Outcome::Aborted(AbortReason::Cheated) => format!("Cheat used. The number was {}", target),
            Outcome::Aborted(AbortReason::GaveUp) => format!("Gave up. The number was {}", target),
            Outcome::Aborted(AbortReason::Abandoned) => {
                format!("Round abandoned. The number was {}", target)
            }
            Outcome::InProgress => "Round in progress".to_string(),
        };

        if !self.new_achievements.is_empty() {
            let titles: Vec<_> = self.new_achievements.iter().map(|a| a.title()).collect();
            msg.push_str(&format!("\nNew Achievements: {}", titles.join(", ")));
        }

        if let Some(run) = self.survival {
            if run.completed() {
                msg.push_str(&format!(
                    "\nSurvival complete: {}/{} rounds!",
                    run.wins, run.target_rounds
                ));
            } else if run.finished {
                msg.push_str(&format!("\nSurvival over after {} wins", run.wins));
            } else {
                msg.push_str(&format!(
                    "\nSurvival: round {}/{} cleared",
                    run.round, run.target_rounds
                ));
            }
        }

        msg
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Name recorded on the leaderboard; wins are not recorded without one
    pub player_name: Option<String>,
    pub enforce_bounds: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            player_name: None,
            enforce_bounds: true,
        }
    }
}

pub struct Session<S: ScoreStore> {
    store: S,
    config: SessionConfig,
    scheduler: Scheduler,
    round: Option<RoundState>,
    mode: GameMode,
    auto: bool,
    next_round_id: u64,
    finalized: bool,
    survival: Option<SurvivalProgress>,
    last_summary: Option<RoundSummary>,
}

impl<S: ScoreStore> Session<S> {
    pub fn new(store: S, config: SessionConfig) -> Self {
        Self::with_scheduler(store, config, Scheduler::new())
    }

    pub fn with_scheduler(store: S, config: SessionConfig, scheduler: Scheduler) -> Self {
        Self {
            store,
            config,
            scheduler,
            round: None,
            mode: GameMode::Standard,
            auto: false,
            next_round_id: 1,
            finalized: false,
            survival: None,
            last_summary: None,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn round(&self) -> Option<&RoundState> {
        self.round.as_ref()
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn last_summary(&self) -> Option<&RoundSummary> {
        self.last_summary.as_ref()
    }

    pub fn survival(&self) -> Option<SurvivalProgress> {
        self.survival
    }

    pub fn set_player_name(&mut self, name: Option<String>) {
        self.config.player_name = name.filter(|n| !n.trim().is_empty());
    }

    pub fn player_name(&self) -> Option<&str> {
        self.config.player_name.as_deref()
    }

    /// Whether a solver is driving the current round
    pub fn is_auto(&self) -> bool {
        self.auto
    }

    pub fn in_progress(&self) -> bool {
        self.round.as_ref().is_some_and(|r| !r.is_terminal())
    }

    /// Start a new round, cancelling everything scheduled for the previous one
    ///
    /// A requested solver is validated before anything is torn down, so a
    /// refused solver leaves the current round untouched.
    pub fn start_round(
        &mut self,
        setup: RoundSetup,
        now: Instant,
        presenter: &mut dyn Presenter,
    ) -> Result<(), SolverError> {
        let profile = setup.profile;
        let target = generator::generate(profile.range, setup.seed.as_deref());
        let round = RoundState::new(self.next_round_id, target, profile, now)
            .with_bounds_check(self.config.enforce_bounds);

        let solver = setup
            .solver
            .map(|kind| Solver::for_round(kind, &round, setup.solver_seed))
            .transpose()?;

        self.scheduler.stop_all();
        self.next_round_id += 1;
        self.mode = setup.mode;
        self.auto = solver.is_some();
        self.finalized = false;
        self.last_summary = None;
        if setup.mode != GameMode::Survival {
            self.survival = None;
        }

        self.scheduler.start_timer(&round, now);
        presenter.set_submit_enabled(true);
        presenter.show_timer(&format_clock(profile.time_limit_secs));
        presenter.show_feedback(&format!(
            "Guess a complex number (a + bi) where 'a' and 'b' are between -{} and {}",
            profile.range, profile.range
        ));
        if let Some(solver) = solver {
            presenter.log_line(&format!("Solver started ({}).", solver.kind()));
            info!(solver = solver.name(), "Solver attached");
            self.scheduler.start_auto(&round, solver, now);
        }

        info!(round = round.id(), mode = %setup.mode, seeded = setup.seed.is_some(), "New round");
        self.round = Some(round);
        Ok(())
    }

    /// Begin a survival run of `rounds` consecutive rounds
    pub fn start_survival(&mut self, rounds: u32, now: Instant, presenter: &mut dyn Presenter) {
        self.survival = Some(SurvivalProgress::new(rounds));
        // Survival rounds never carry a solver, so this cannot fail
        if let Err(err) = self.start_round(RoundSetup::survival(), now, presenter) {
            warn!(%err, "Survival round refused");
        }
        presenter.log_line(&format!("Survival mode: {} rounds. Good luck!", rounds.max(1)));
    }

    /// Advance a survival run after a cleared round. Returns false if the run is over.
    pub fn next_survival_round(&mut self, now: Instant, presenter: &mut dyn Presenter) -> bool {
        let in_progress = self.in_progress();
        let Some(run) = self.survival.as_mut() else {
            return false;
        };
        if run.finished || in_progress {
            return false;
        }
        run.round += 1;
        let round_no = run.round;
        if let Err(err) = self.start_round(RoundSetup::survival(), now, presenter) {
            warn!(%err, "Survival round refused");
            return false;
        }
        presenter.log_line(&format!("Survival round {}", round_no));
        true
    }

    /// Parse and submit a guess typed by the player
    pub fn submit_text(
        &mut self,
        real: &str,
        imag: &str,
        now: Instant,
        presenter: &mut dyn Presenter,
    ) -> Result<GuessOutcome, GuessError> {
        let result = self.submit_text_inner(real, imag, now, presenter);
        if let Err(ref err) = result {
            presenter.show_feedback(&err.to_string());
        }
        result
    }

    fn submit_text_inner(
        &mut self,
        real: &str,
        imag: &str,
        now: Instant,
        presenter: &mut dyn Presenter,
    ) -> Result<GuessOutcome, GuessError> {
        let round = self.round.as_mut().ok_or(GuessError::NoRound)?;
        if round.is_terminal() {
            return Err(GuessError::RoundOver);
        }
        if self.auto || self.scheduler.input_locked() {
            return Err(GuessError::InputLocked);
        }

        let real = parse_part(real)?;
        let imag = parse_part(imag)?;
        let guess = ComplexValue::new(real, imag);
        let outcome = round.submit_guess_at(guess, now)?;

        presenter.log_line(&format!(
            "Attempt {}: {} (|{:.2}|)",
            round.attempts_used(),
            guess,
            guess.magnitude()
        ));
        presenter.show_feedback(&outcome.feedback());
        if !round.is_terminal() {
            self.scheduler.start_cooldown(round, now, presenter);
        }

        self.finalize_if_over(now, presenter);
        Ok(outcome)
    }

    /// Explicit hint request; always reveals the component hint
    pub fn request_hint(&mut self, presenter: &mut dyn Presenter) -> Option<String> {
        let hint = self.round.as_mut().and_then(RoundState::request_hint);
        match &hint {
            Some(text) => presenter.show_feedback(text),
            None => presenter.show_feedback("No extra component hints at this time."),
        }
        hint
    }

    /// Reveal the answer and end the round; never scored
    pub fn cheat(&mut self, now: Instant, presenter: &mut dyn Presenter) {
        self.abort(AbortReason::Cheated, now, presenter);
    }

    pub fn give_up(&mut self, now: Instant, presenter: &mut dyn Presenter) {
        self.abort(AbortReason::GaveUp, now, presenter);
    }

    fn abort(&mut self, reason: AbortReason, now: Instant, presenter: &mut dyn Presenter) {
        let Some(round) = self.round.as_mut() else {
            return;
        };
        if round.abort(reason, now) {
            info!(round = round.id(), ?reason, "Round aborted");
            presenter.log_line(&format!("The number was {}.", round.target()));
        }
        self.finalize_if_over(now, presenter);
    }

    /// Fire due scheduled work and finalize the round if it ended
    pub fn poll(&mut self, now: Instant, presenter: &mut dyn Presenter) -> Vec<SchedulerEvent> {
        let Some(round) = self.round.as_mut() else {
            return Vec::new();
        };
        let events = self.scheduler.poll(now, round, presenter);
        if events.contains(&SchedulerEvent::Stopped(StopReason::SurfaceGone))
            && round.abort(AbortReason::Abandoned, now)
        {
            info!(round = round.id(), "Round abandoned");
        }
        self.finalize_if_over(now, presenter);
        events
    }

    /// Best scores; storage failures yield an empty list
    pub fn top_scores(&self, limit: usize) -> Vec<ScoreEntry> {
        self.store.top_scores(limit).unwrap_or_else(|err| {
            warn!(%err, "Could not load leaderboard");
            Vec::new()
        })
    }

    /// Tear down: nothing scheduled survives the session
    pub fn end(&mut self) {
        self.scheduler.stop_all();
    }

    fn finalize_if_over(&mut self, now: Instant, presenter: &mut dyn Presenter) {
        if self.finalized {
            return;
        }
        let Some(round) = self.round.as_ref() else {
            return;
        };
        if !round.is_terminal() {
            return;
        }
        self.finalized = true;
        let auto = self.auto;
        self.scheduler.stop_all();
        // A cooldown cut short by the round ending must not leave input locked
        presenter.set_submit_enabled(true);

        let outcome = round.outcome();
        let attempts = round.attempts_used();
        let elapsed_secs = round.elapsed(now).as_secs();
        let points = match outcome {
            Outcome::Won { points } => points,
            _ => 0,
        };
        let hint_used = round.hint_used();
        let target = round.target();

        let mut new_achievements = Vec::new();
        if outcome.is_win() && !auto {
            let earned = achievements::earned(attempts, elapsed_secs, hint_used);
            new_achievements = self.store.unlock_achievements(&earned).unwrap_or_else(|err| {
                warn!(%err, "Could not update achievements");
                Vec::new()
            });

            if let Some(name) = self.config.player_name.as_deref() {
                if let Err(err) =
                    self.store
                        .record_result(name, points, attempts, elapsed_secs, self.mode)
                {
                    warn!(%err, "Could not record score");
                }
            }
        }

        let record = HistoryRecord {
            result: outcome.label().to_string(),
            target: target.to_string(),
            attempts,
            time: elapsed_secs,
            points,
            mode: self.mode,
            date: String::new(),
        };
        if let Err(err) = self.store.record_history(record) {
            warn!(%err, "Could not record history");
        }

        let survival = match self.survival.as_mut() {
            Some(run) if self.mode == GameMode::Survival => {
                if outcome.is_win() {
                    run.wins += 1;
                }
                run.finished = !outcome.is_win() || run.wins >= run.target_rounds;
                Some(*run)
            }
            _ => None,
        };

        let summary = RoundSummary {
            outcome,
            target,
            attempts,
            elapsed_secs,
            points,
            mode: self.mode,
            auto,
            new_achievements,
            survival,
        };
        presenter.show_outcome(&summary);
        self.last_summary = Some(summary);
    }
}

impl<S: ScoreStore> Drop for Session<S> {
    fn drop(&mut self) {
        self.end();
    }
}

fn parse_part(text: &str) -> Result<i64, GuessError> {
    text.trim().parse().map_err(|_| GuessError::InvalidInput)
}

/// In-memory [`ScoreStore`]; backs tests and ephemeral sessions
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    pub scores: Vec<ScoreEntry>,
    pub history: Vec<HistoryRecord>,
    pub unlocked: Vec<Achievement>,
    /// Simulate a broken backend
    pub fail: bool,
    /// Maximum leaderboard size
    pub capacity: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            capacity: 10,
            ..Default::default()
        }
    }

    fn check(&self) -> StoreResult<()> {
        if self.fail {
            return Err(crate::StoreError::Format("store unavailable".to_string()));
        }
        Ok(())
    }
}

impl ScoreStore for MemoryStore {
    fn record_result(
        &mut self,
        name: &str,
        points: u32,
        attempts: u32,
        elapsed_secs: u64,
        mode: GameMode,
    ) -> StoreResult<()> {
        self.check()?;
        let entry = ScoreEntry {
            name: name.to_string(),
            points,
            attempts,
            time: elapsed_secs,
            mode,
            date: String::new(),
        };
        insert_ranked(&mut self.scores, entry, self.capacity);
        Ok(())
    }

    fn top_scores(&self, limit: usize) -> StoreResult<Vec<ScoreEntry>> {
        self.check()?;
        Ok(self.scores.iter().take(limit).cloned().collect())
    }

    fn record_history(&mut self, record: HistoryRecord) -> StoreResult<()> {
        self.check()?;
        self.history.insert(0, record);
        self.history.truncate(MAX_HISTORY);
        Ok(())
    }

    fn unlock_achievements(&mut self, earned: &[Achievement]) -> StoreResult<Vec<Achievement>> {
        self.check()?;
        let fresh: Vec<_> = earned
            .iter()
            .copied()
            .filter(|a| !self.unlocked.contains(a))
            .collect();
        self.unlocked.extend(&fresh);
        Ok(fresh)
    }

    fn clear_leaderboard(&mut self) -> StoreResult<()> {
        self.check()?;
        self.scores.clear();
        Ok(())
    }
}

/// Insert keeping points descending (ties stay in arrival order), then trim
pub fn insert_ranked(entries: &mut Vec<ScoreEntry>, entry: ScoreEntry, capacity: usize) {
    let pos = entries
        .iter()
        .position(|e| e.points < entry.points)
        .unwrap_or(entries.len());
    entries.insert(pos, entry);
    entries.truncate(capacity);
}
