use complex_guess_core::{GameMode, HistoryRecord};

/// Aggregates over the round history
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsSummary {
    pub total_rounds: usize,
    pub wins: usize,
    /// Rounds played by a solver
    pub solver_rounds: usize,
    pub best_points: Option<u32>,
    pub fastest_win_secs: Option<u64>,
    /// Mean attempts over human wins
    pub avg_attempts: Option<f32>,
    /// Consecutive wins at the head of the history
    pub current_streak: usize,
}

impl StatsSummary {
    /// Summarize newest-first history records
    pub fn from_history(history: &[HistoryRecord]) -> Self {
        let mut summary = StatsSummary {
            total_rounds: history.len(),
            ..Default::default()
        };

        let mut attempts_total = 0u32;
        let mut human_wins = 0u32;
        for record in history {
            if record.mode == GameMode::Solver {
                summary.solver_rounds += 1;
            }
            if record.result != "win" {
                continue;
            }
            summary.wins += 1;
            summary.best_points = summary.best_points.max(Some(record.points));
            if record.mode != GameMode::Solver {
                human_wins += 1;
                attempts_total += record.attempts;
                summary.fastest_win_secs = Some(
                    summary
                        .fastest_win_secs
                        .map_or(record.time, |t| t.min(record.time)),
                );
            }
        }

        if human_wins > 0 {
            summary.avg_attempts = Some(attempts_total as f32 / human_wins as f32);
        }
        summary.current_streak = history.iter().take_while(|r| r.result == "win").count();
        summary
    }

    pub fn win_rate(&self) -> f32 {
        if self.total_rounds > 0 {
            self.wins as f32 / self.total_rounds as f32 * 100.0
        } else {
            0.0
        }
    }
}

/// Format seconds as MM:SS or HH:MM:SS
pub fn format_time(secs: u64) -> String {
    if secs >= 3600 {
        format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
    } else {
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }
}
