use crate::hints::{self, MagnitudeHint};
use crate::{AbortReason, ComplexValue, DifficultyProfile, GuessError, GuessRecord, Outcome};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Result of an accepted guess
#[derive(Debug, Clone, PartialEq)]
pub enum GuessOutcome {
    Won {
        points: u32,
        attempts: u32,
        elapsed_secs: u64,
    },
    Miss {
        magnitude: MagnitudeHint,
        component: Option<String>,
        /// Whether this guess used up the last attempt
        exhausted: bool,
    },
}

impl GuessOutcome {
    pub fn is_win(&self) -> bool {
        matches!(self, GuessOutcome::Won { .. })
    }

    /// Feedback text shown to the player
    pub fn feedback(&self) -> String {
        match self {
            GuessOutcome::Won {
                points, attempts, ..
            } => format!("Correct in {} attempts. Points: {}", attempts, points),
            GuessOutcome::Miss {
                magnitude,
                component: Some(hint),
                ..
            } => format!("{}\n{}", magnitude, hint),
            GuessOutcome::Miss { magnitude, .. } => magnitude.to_string(),
        }
    }
}

/// Points for a win: `max(0, 1000 - 40*attempts - 2*floor(seconds))`
pub fn score(attempts: u32, elapsed_secs: u64) -> u32 {
    let points = 1000i64 - attempts as i64 * 40 - elapsed_secs as i64 * 2;
    points.max(0) as u32
}

/// State machine for a single round
///
/// Every transition out of `InProgress` is final: once terminal, `tick`,
/// `submit_guess`, `abort` and `force_end` leave the state untouched.
#[derive(Debug, Clone)]
pub struct RoundState {
    id: u64,
    target: ComplexValue,
    target_magnitude: f64,
    profile: DifficultyProfile,
    attempts_used: u32,
    started_at: Instant,
    /// Set on the terminal transition; freezes elapsed time
    ended_at: Option<Instant>,
    hints_revealed: u32,
    hint_used: bool,
    outcome: Outcome,
    history: Vec<GuessRecord>,
    enforce_bounds: bool,
}

impl RoundState {
    pub fn new(id: u64, target: ComplexValue, profile: DifficultyProfile, now: Instant) -> Self {
        info!(
            round = id,
            range = profile.range,
            max_attempts = profile.max_attempts,
            time_limit = profile.time_limit_secs,
            "Round started"
        );
        debug!(round = id, %target, "Target chosen");

        Self {
            id,
            target,
            target_magnitude: target.magnitude(),
            profile,
            attempts_used: 0,
            started_at: now,
            ended_at: None,
            hints_revealed: 0,
            hint_used: false,
            outcome: Outcome::InProgress,
            history: Vec::new(),
            enforce_bounds: true,
        }
    }

    /// Reject (without penalty) guesses outside the configured range
    pub fn with_bounds_check(mut self, enforce: bool) -> Self {
        self.enforce_bounds = enforce;
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn target(&self) -> ComplexValue {
        self.target
    }

    /// Target magnitude, read by the adaptive solver after each scored guess
    pub fn target_magnitude(&self) -> f64 {
        self.target_magnitude
    }

    pub fn profile(&self) -> &DifficultyProfile {
        &self.profile
    }

    pub fn attempts_used(&self) -> u32 {
        self.attempts_used
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome.is_terminal()
    }

    pub fn hint_used(&self) -> bool {
        self.hint_used
    }

    pub fn hints_revealed(&self) -> u32 {
        self.hints_revealed
    }

    pub fn history(&self) -> &[GuessRecord] {
        &self.history
    }

    pub fn last_guess(&self) -> Option<ComplexValue> {
        self.history.last().map(|record| record.guess)
    }

    /// Elapsed time, frozen once the round is over
    pub fn elapsed(&self, now: Instant) -> Duration {
        let end = self.ended_at.unwrap_or(now);
        end.saturating_duration_since(self.started_at)
    }

    pub fn remaining_seconds(&self, now: Instant) -> u64 {
        self.profile
            .time_limit_secs
            .saturating_sub(self.elapsed(now).as_secs())
    }

    pub fn remaining_attempts(&self) -> u32 {
        self.profile.max_attempts.saturating_sub(self.attempts_used)
    }

    /// Submit a guess at the current wall-clock time
    pub fn submit_guess(&mut self, real: i64, imag: i64) -> Result<GuessOutcome, GuessError> {
        self.submit_guess_at(ComplexValue::new(real, imag), Instant::now())
    }

    pub fn submit_guess_at(
        &mut self,
        guess: ComplexValue,
        now: Instant,
    ) -> Result<GuessOutcome, GuessError> {
        if self.is_terminal() {
            debug!(round = self.id, %guess, "Guess rejected, round over");
            return Err(GuessError::RoundOver);
        }
        if self.enforce_bounds && !guess.within(self.profile.range) {
            return Err(GuessError::OutOfRange {
                range: self.profile.range,
            });
        }

        self.attempts_used += 1;
        let offset = self.elapsed(now);
        self.history.push(GuessRecord { guess, offset });
        debug!(
            round = self.id,
            attempt = self.attempts_used,
            %guess,
            magnitude = guess.magnitude(),
            "Guess submitted"
        );

        if guess == self.target {
            let elapsed_secs = offset.as_secs();
            let points = score(self.attempts_used, elapsed_secs);
            self.finish(Outcome::Won { points }, now);
            return Ok(GuessOutcome::Won {
                points,
                attempts: self.attempts_used,
                elapsed_secs,
            });
        }

        let magnitude = hints::magnitude_hint(self.target_magnitude, guess.magnitude());
        let component = hints::component_hint(self.target, self.attempts_used, false);
        if component.is_some() {
            self.mark_hint();
        }

        let exhausted = self.attempts_used >= self.profile.max_attempts;
        if exhausted {
            self.finish(Outcome::LostAttempts, now);
        }

        Ok(GuessOutcome::Miss {
            magnitude,
            component,
            exhausted,
        })
    }

    /// Explicit hint request; always reveals the component hint while in progress
    pub fn request_hint(&mut self) -> Option<String> {
        if self.is_terminal() {
            return None;
        }
        let hint = hints::component_hint(self.target, self.attempts_used, true);
        if hint.is_some() {
            self.mark_hint();
        }
        hint
    }

    /// Advance the clock. Returns the outcome if this tick ended the round.
    pub fn tick(&mut self, now: Instant) -> Option<Outcome> {
        if self.is_terminal() {
            return None;
        }
        if self.elapsed(now) >= self.profile.time_limit() {
            self.finish(Outcome::LostTimeout, now);
            return Some(self.outcome);
        }
        None
    }

    /// Force the round into `Aborted`. Returns false if it was already over.
    pub fn abort(&mut self, reason: AbortReason, now: Instant) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.finish(Outcome::Aborted(reason), now);
        true
    }

    /// End the round as lost on attempts, used when a solver runs out of guesses
    pub fn force_end(&mut self, now: Instant) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.finish(Outcome::LostAttempts, now);
        true
    }

    fn mark_hint(&mut self) {
        self.hint_used = true;
        self.hints_revealed += 1;
    }

    fn finish(&mut self, outcome: Outcome, now: Instant) {
        self.outcome = outcome;
        self.ended_at = Some(now);
        info!(
            round = self.id,
            outcome = outcome.label(),
            attempts = self.attempts_used,
            "Round over"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round(target: (i64, i64), profile: DifficultyProfile) -> (RoundState, Instant) {
        let now = Instant::now();
        (
            RoundState::new(1, ComplexValue::new(target.0, target.1), profile, now),
            now,
        )
    }

    #[test]
    fn test_score_formula() {
        assert_eq!(score(1, 0), 960);
        assert_eq!(score(2, 10), 900);
        assert_eq!(score(15, 120), 160);
        assert_eq!(score(25, 0), 0);
        assert_eq!(score(10, 400), 0);
    }

    #[test]
    fn test_win_transitions_and_scores() {
        let (mut round, start) = round((3, -4), DifficultyProfile::new(10, 15, 120));
        let now = start + Duration::from_millis(7_900);

        let outcome = round.submit_guess_at(ComplexValue::new(3, -4), now).unwrap();

        assert_eq!(
            outcome,
            GuessOutcome::Won {
                points: 1000 - 40 - 14,
                attempts: 1,
                elapsed_secs: 7
            }
        );
        assert_eq!(round.outcome(), Outcome::Won { points: 946 });
        assert!(round.is_terminal());
    }

    #[test]
    fn test_miss_gives_magnitude_hint() {
        let (mut round, start) = round((3, -4), DifficultyProfile::new(10, 15, 120));

        let low = round.submit_guess_at(ComplexValue::new(0, 0), start).unwrap();
        assert_eq!(
            low,
            GuessOutcome::Miss {
                magnitude: MagnitudeHint::TooLow,
                component: None,
                exhausted: false
            }
        );

        let high = round.submit_guess_at(ComplexValue::new(9, 9), start).unwrap();
        match high {
            GuessOutcome::Miss {
                magnitude,
                component,
                ..
            } => {
                assert_eq!(magnitude, MagnitudeHint::TooHigh);
                assert_eq!(component.as_deref(), Some("Hint: Real part is odd"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(round.hint_used());
        assert_eq!(round.hints_revealed(), 1);
    }

    #[test]
    fn test_attempts_exhausted() {
        let (mut round, start) = round((1, 1), DifficultyProfile::new(10, 2, 120));
        round.submit_guess_at(ComplexValue::new(0, 0), start).unwrap();
        let last = round.submit_guess_at(ComplexValue::new(0, 1), start).unwrap();

        assert!(matches!(last, GuessOutcome::Miss { exhausted: true, .. }));
        assert_eq!(round.outcome(), Outcome::LostAttempts);
        assert_eq!(round.remaining_attempts(), 0);
    }

    #[test]
    fn test_terminal_round_rejects_guesses() {
        let (mut round, start) = round((1, 1), DifficultyProfile::new(10, 1, 120));
        round.submit_guess_at(ComplexValue::new(0, 0), start).unwrap();

        let rejected = round.submit_guess_at(ComplexValue::new(1, 1), start);
        assert_eq!(rejected, Err(GuessError::RoundOver));
        assert_eq!(round.attempts_used(), 1);
        assert_eq!(round.history().len(), 1);
        assert_eq!(round.outcome(), Outcome::LostAttempts);
    }

    #[test]
    fn test_out_of_range_costs_nothing() {
        let (mut round, start) = round((1, 1), DifficultyProfile::new(10, 15, 120));
        let err = round.submit_guess_at(ComplexValue::new(11, 0), start);

        assert_eq!(err, Err(GuessError::OutOfRange { range: 10 }));
        assert_eq!(round.attempts_used(), 0);
        assert!(round.history().is_empty());
    }

    #[test]
    fn test_bounds_check_can_be_disabled() {
        let now = Instant::now();
        let mut round = RoundState::new(1, ComplexValue::new(1, 1), DifficultyProfile::default(), now)
            .with_bounds_check(false);
        assert!(round.submit_guess_at(ComplexValue::new(50, 50), now).is_ok());
    }

    #[test]
    fn test_tick_times_out_once() {
        let (mut round, start) = round((1, 1), DifficultyProfile::new(10, 15, 5));

        assert_eq!(round.tick(start + Duration::from_secs(4)), None);
        assert_eq!(
            round.tick(start + Duration::from_secs(5)),
            Some(Outcome::LostTimeout)
        );
        assert_eq!(round.tick(start + Duration::from_secs(6)), None);
        assert_eq!(round.outcome(), Outcome::LostTimeout);
    }

    #[test]
    fn test_guess_before_tick_is_accepted() {
        let (mut round, start) = round((1, 1), DifficultyProfile::new(10, 15, 5));
        let boundary = start + Duration::from_secs(5);

        let outcome = round.submit_guess_at(ComplexValue::new(1, 1), boundary).unwrap();
        assert!(outcome.is_win());
        assert_eq!(round.tick(boundary), None);
        assert!(round.outcome().is_win());
    }

    #[test]
    fn test_abort_is_terminal() {
        let (mut round, start) = round((1, 1), DifficultyProfile::default());
        assert!(round.abort(AbortReason::Cheated, start));
        assert!(!round.abort(AbortReason::GaveUp, start));
        assert!(!round.force_end(start));
        assert_eq!(round.outcome(), Outcome::Aborted(AbortReason::Cheated));
        assert_eq!(round.request_hint(), None);
    }

    #[test]
    fn test_remaining_clamped() {
        let (mut round, start) = round((1, 1), DifficultyProfile::new(10, 15, 5));
        assert_eq!(round.remaining_seconds(start + Duration::from_secs(2)), 3);
        assert_eq!(round.remaining_seconds(start + Duration::from_secs(60)), 0);

        round.tick(start + Duration::from_secs(7));
        // Elapsed is frozen at the terminal tick
        assert_eq!(round.elapsed(start + Duration::from_secs(90)).as_secs(), 7);
    }

    #[test]
    fn test_forced_hint() {
        let (mut round, start) = round((4, 5), DifficultyProfile::default());
        round.submit_guess_at(ComplexValue::new(0, 0), start).unwrap();
        assert!(!round.hint_used());

        let hint = round.request_hint().unwrap();
        assert_eq!(hint, "Hint: Real part is even, Imaginary part is prime");
        assert!(round.hint_used());
    }

    #[test]
    fn test_feedback_text() {
        let miss = GuessOutcome::Miss {
            magnitude: MagnitudeHint::TooLow,
            component: Some("Hint: Real part is odd".to_string()),
            exhausted: false,
        };
        assert_eq!(miss.feedback(), "Magnitude is TOO LOW.\nHint: Real part is odd");
    }
}
