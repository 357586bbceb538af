use crate::session::RoundSummary;

/// Presentation surface the core talks to
///
/// Implementations are UI specific. The core never retries a failed update;
/// when `is_alive` reports false the scheduler treats the round as over.
pub trait Presenter {
    /// Whether the surface backing the round still exists
    fn is_alive(&self) -> bool {
        true
    }

    fn show_feedback(&mut self, text: &str);

    /// Countdown text, formatted `M:SS`
    fn show_timer(&mut self, text: &str);

    /// One-shot summary when a round reaches a terminal outcome
    fn show_outcome(&mut self, summary: &RoundSummary);

    fn set_submit_enabled(&mut self, enabled: bool);

    /// Append a line to the round log
    fn log_line(&mut self, text: &str);
}

/// Format seconds as `M:SS`
pub fn format_clock(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Presenter that only records what it was told; useful headless and in tests
#[derive(Debug, Default, Clone)]
pub struct RecordingPresenter {
    pub alive: bool,
    pub feedback: Vec<String>,
    pub timer: Option<String>,
    pub outcomes: Vec<RoundSummary>,
    pub submit_enabled: bool,
    pub log: Vec<String>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self {
            alive: true,
            submit_enabled: true,
            ..Default::default()
        }
    }

    pub fn last_feedback(&self) -> Option<&str> {
        self.feedback.last().map(String::as_str)
    }
}

impl Presenter for RecordingPresenter {
    fn is_alive(&self) -> bool {
        self.alive
    }

    fn show_feedback(&mut self, text: &str) {
        self.feedback.push(text.to_string());
    }

    fn show_timer(&mut self, text: &str) {
        self.timer = Some(text.to_string());
    }

    fn show_outcome(&mut self, summary: &RoundSummary) {
        self.outcomes.push(summary.clone());
    }

    fn set_submit_enabled(&mut self, enabled: bool) {
        self.submit_enabled = enabled;
    }

    fn log_line(&mut self, text: &str) {
        self.log.push(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(format_clock(59), "0:59");
        assert_eq!(format_clock(120), "2:00");
        assert_eq!(format_clock(305), "5:05");
    }
}
