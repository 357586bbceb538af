use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Achievement {
    OneShot,
    QuickWin,
    NoHints,
    SpeedRunner,
}

/// Wins under this many seconds earn `QuickWin`
pub const QUICK_WIN_SECS: u64 = 30;
/// Wins under this many seconds earn `SpeedRunner`
pub const SPEED_RUNNER_SECS: u64 = 10;

impl Achievement {
    pub fn all() -> &'static [Achievement] {
        &[
            Achievement::OneShot,
            Achievement::QuickWin,
            Achievement::NoHints,
            Achievement::SpeedRunner,
        ]
    }

    pub fn title(&self) -> &'static str {
        match self {
            Achievement::OneShot => "One-Shot",
            Achievement::QuickWin => "Quick Win",
            Achievement::NoHints => "Pure Luck",
            Achievement::SpeedRunner => "Speed Runner",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Achievement::OneShot => "Win in 1 attempt",
            Achievement::QuickWin => "Win under 30 seconds",
            Achievement::NoHints => "Win without component hints",
            Achievement::SpeedRunner => "Win under 10 seconds",
        }
    }
}

impl fmt::Display for Achievement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Achievements a winning round qualifies for, before checking what is already unlocked
pub fn earned(attempts: u32, elapsed_secs: u64, hint_used: bool) -> Vec<Achievement> {
    let mut earned = Vec::new();
    if attempts == 1 {
        earned.push(Achievement::OneShot);
    }
    if elapsed_secs < SPEED_RUNNER_SECS {
        earned.push(Achievement::SpeedRunner);
    }
    if elapsed_secs < QUICK_WIN_SECS {
        earned.push(Achievement::QuickWin);
    }
    if !hint_used {
        earned.push(Achievement::NoHints);
    }
    earned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fast_one_shot_earns_everything() {
        let mut got = earned(1, 3, false);
        got.sort();
        assert_eq!(got, Achievement::all().to_vec());
    }

    #[test]
    fn test_slow_hinted_win_earns_nothing() {
        assert!(earned(4, 45, true).is_empty());
    }

    #[test]
    fn test_time_thresholds_are_strict() {
        assert_eq!(earned(3, 10, true), vec![Achievement::QuickWin]);
        assert!(earned(3, 30, true).is_empty());
    }

    #[test]
    fn test_serialized_keys() {
        let json = serde_json::to_string(&Achievement::SpeedRunner).unwrap();
        assert_eq!(json, "\"speed_runner\"");
    }
}
