use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A Gaussian integer `real + imag·i`, used both for the secret target and for guesses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComplexValue {
    pub real: i64,
    pub imag: i64,
}

impl ComplexValue {
    pub const fn new(real: i64, imag: i64) -> Self {
        Self { real, imag }
    }

    /// Euclidean norm, `sqrt(real² + imag²)`
    pub fn magnitude(&self) -> f64 {
        (self.real as f64).hypot(self.imag as f64)
    }

    /// Clamp both components into `[-range, range]`
    pub fn clamped(&self, range: u32) -> Self {
        let r = range as i64;
        Self {
            real: self.real.clamp(-r, r),
            imag: self.imag.clamp(-r, r),
        }
    }

    /// Whether both components lie within `[-range, range]`
    pub fn within(&self, range: u32) -> bool {
        let r = range as i64;
        self.real.abs() <= r && self.imag.abs() <= r
    }
}

impl fmt::Display for ComplexValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.imag < 0 { '-' } else { '+' };
        write!(f, "{} {} {}i", self.real, sign, self.imag.unsigned_abs())
    }
}

/// Canonical difficulty tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// The round parameters for this tier
    pub fn profile(&self) -> DifficultyProfile {
        match self {
            Difficulty::Easy => DifficultyProfile::new(10, 15, 120),
            Difficulty::Medium => DifficultyProfile::new(50, 10, 180),
            Difficulty::Hard => DifficultyProfile::new(100, 8, 300),
        }
    }

    pub fn all_levels() -> &'static [Difficulty] {
        &[Difficulty::Easy, Difficulty::Medium, Difficulty::Hard]
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        };
        write!(f, "{}", name)
    }
}

/// Parameters of a single round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    /// Bound on |real| and |imag|
    pub range: u32,
    pub max_attempts: u32,
    pub time_limit_secs: u64,
}

impl DifficultyProfile {
    pub const fn new(range: u32, max_attempts: u32, time_limit_secs: u64) -> Self {
        Self {
            range,
            max_attempts,
            time_limit_secs,
        }
    }

    /// Short timer, small range: one stage of a survival run
    pub const fn survival() -> Self {
        Self::new(8, 15, 25)
    }

    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(self.time_limit_secs)
    }
}

impl Default for DifficultyProfile {
    fn default() -> Self {
        Difficulty::Easy.profile()
    }
}

/// How a round was started; stored alongside scores and history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Standard,
    Daily,
    Survival,
    Solver,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Standard => "standard",
            GameMode::Daily => "daily",
            GameMode::Survival => "survival",
            GameMode::Solver => "solver",
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a round was forced to end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbortReason {
    /// The answer was revealed on request
    Cheated,
    /// The player gave up
    GaveUp,
    /// The presentation surface went away mid-round
    Abandoned,
}

/// State of a round. Everything except `InProgress` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    InProgress,
    Won { points: u32 },
    LostAttempts,
    LostTimeout,
    Aborted(AbortReason),
}

impl Outcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::InProgress)
    }

    pub fn is_win(&self) -> bool {
        matches!(self, Outcome::Won { .. })
    }

    /// Short label used in history records
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::InProgress => "in_progress",
            Outcome::Won { .. } => "win",
            Outcome::LostAttempts => "out_of_attempts",
            Outcome::LostTimeout => "timeout",
            Outcome::Aborted(AbortReason::Cheated) => "cheated",
            Outcome::Aborted(AbortReason::GaveUp) => "gave_up",
            Outcome::Aborted(AbortReason::Abandoned) => "abandoned",
        }
    }
}

/// One submitted guess
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GuessRecord {
    pub guess: ComplexValue,
    /// Time since the round started
    pub offset: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magnitude() {
        assert_eq!(ComplexValue::new(3, -4).magnitude(), 5.0);
        assert_eq!(ComplexValue::new(0, 0).magnitude(), 0.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(ComplexValue::new(3, -4).to_string(), "3 - 4i");
        assert_eq!(ComplexValue::new(-2, 7).to_string(), "-2 + 7i");
        assert_eq!(ComplexValue::new(0, 0).to_string(), "0 + 0i");
    }

    #[test]
    fn test_clamped() {
        let c = ComplexValue::new(12, -40).clamped(10);
        assert_eq!(c, ComplexValue::new(10, -10));
        assert!(c.within(10));
        assert!(!ComplexValue::new(11, 0).within(10));
    }

    #[test]
    fn test_canonical_tiers() {
        assert_eq!(Difficulty::Easy.profile(), DifficultyProfile::new(10, 15, 120));
        assert_eq!(Difficulty::Medium.profile(), DifficultyProfile::new(50, 10, 180));
        assert_eq!(Difficulty::Hard.profile(), DifficultyProfile::new(100, 8, 300));
    }

    #[test]
    fn test_mode_serializes_lowercase() {
        let json = serde_json::to_string(&GameMode::Daily).unwrap();
        assert_eq!(json, "\"daily\"");
    }

    #[test]
    fn test_terminal_outcomes() {
        assert!(!Outcome::InProgress.is_terminal());
        assert!(Outcome::Won { points: 0 }.is_terminal());
        assert!(Outcome::LostAttempts.is_terminal());
        assert!(Outcome::LostTimeout.is_terminal());
        assert!(Outcome::Aborted(AbortReason::Cheated).is_terminal());
    }
}
