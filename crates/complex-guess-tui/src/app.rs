use crate::leaderboard::{today, Store, UnlockedAchievement, MAX_LEADERBOARD};
use crate::settings::Settings;
use crate::stats::StatsSummary;
use crate::theme::Theme;
use complex_guess_core::{
    Difficulty, DifficultyProfile, GameMode, HistoryRecord, Presenter, RoundSetup, RoundSummary,
    ScoreEntry, ScoreStore, Session, SessionConfig, SolverKind,
};
use crossterm::event::{KeyCode, KeyEvent};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::warn;

/// Longest text accepted in a guess field
const MAX_FIELD_LEN: usize = 8;
/// Longest accepted player name
const MAX_NAME_LEN: usize = 20;
/// Round log lines kept on screen
const MAX_LOG_LINES: usize = 200;

/// Result of handling a key press
pub enum AppAction {
    Continue,
    Quit,
}

/// Current screen state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenState {
    /// Main menu
    Menu,
    /// A round in progress or just finished
    Playing,
    /// Top scores
    Leaderboard,
    /// Recent rounds and aggregate stats
    History,
    /// Unlocked achievements
    Achievements,
    /// Editing the player name
    NameEntry,
}

/// Which guess field has focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Real,
    Imag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    Play(Difficulty),
    Daily,
    Survival,
    Solver(SolverKind),
    Leaderboard,
    History,
    Achievements,
    ChangeName,
    ToggleTheme,
    Quit,
}

impl MenuItem {
    pub const ALL: [MenuItem; 12] = [
        MenuItem::Play(Difficulty::Easy),
        MenuItem::Play(Difficulty::Medium),
        MenuItem::Play(Difficulty::Hard),
        MenuItem::Daily,
        MenuItem::Survival,
        MenuItem::Solver(SolverKind::Spiral),
        MenuItem::Solver(SolverKind::Adaptive),
        MenuItem::Leaderboard,
        MenuItem::History,
        MenuItem::Achievements,
        MenuItem::ChangeName,
        MenuItem::ToggleTheme,
    ];

    pub fn label(&self) -> String {
        match self {
            MenuItem::Play(difficulty) => {
                let p = difficulty.profile();
                format!(
                    "{} (range ±{}, {} attempts, {}s)",
                    difficulty, p.range, p.max_attempts, p.time_limit_secs
                )
            }
            MenuItem::Daily => "Daily challenge".to_string(),
            MenuItem::Survival => "Survival".to_string(),
            MenuItem::Solver(kind) => format!("Watch the {} solver", kind),
            MenuItem::Leaderboard => "Leaderboard".to_string(),
            MenuItem::History => "History".to_string(),
            MenuItem::Achievements => "Achievements".to_string(),
            MenuItem::ChangeName => "Change player name".to_string(),
            MenuItem::ToggleTheme => "Toggle theme".to_string(),
            MenuItem::Quit => "Quit".to_string(),
        }
    }
}

/// Round parameters taken from the command line
#[derive(Debug, Clone)]
pub struct GameOptions {
    /// Tier used by solver rounds and `--mode standard`
    pub difficulty: Difficulty,
    pub range: Option<u32>,
    pub attempts: Option<u32>,
    pub time_limit: Option<u64>,
    pub seed: Option<String>,
    pub solver_seed: Option<u64>,
    /// Length of a survival run
    pub rounds: u32,
}

impl Default for GameOptions {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Easy,
            range: None,
            attempts: None,
            time_limit: None,
            seed: None,
            solver_seed: None,
            rounds: 3,
        }
    }
}

impl GameOptions {
    /// The tier's profile with command line overrides applied
    pub fn profile_for(&self, difficulty: Difficulty) -> DifficultyProfile {
        let base = difficulty.profile();
        DifficultyProfile::new(
            self.range.unwrap_or(base.range).max(1),
            self.attempts.unwrap_or(base.max_attempts).max(1),
            self.time_limit.unwrap_or(base.time_limit_secs).max(1),
        )
    }

    pub fn standard(&self, difficulty: Difficulty) -> RoundSetup {
        let setup = RoundSetup::standard(difficulty).with_profile(self.profile_for(difficulty));
        match &self.seed {
            Some(seed) => setup.with_seed(seed.clone()),
            None => setup,
        }
    }

    pub fn solver(&self, kind: SolverKind) -> RoundSetup {
        let mut setup = RoundSetup::solver(self.difficulty, kind)
            .with_profile(self.profile_for(self.difficulty));
        if let Some(seed) = &self.seed {
            setup = setup.with_seed(seed.clone());
        }
        if let Some(seed) = self.solver_seed {
            setup = setup.with_solver_seed(seed);
        }
        setup
    }
}

/// What the core last told the screen
#[derive(Debug, Clone, Default)]
pub struct TuiSurface {
    pub feedback: String,
    pub timer: String,
    pub log: Vec<String>,
    pub submit_enabled: bool,
    pub outcome: Option<RoundSummary>,
}

impl TuiSurface {
    pub fn new() -> Self {
        Self {
            submit_enabled: true,
            ..Default::default()
        }
    }

    fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Presenter for TuiSurface {
    fn show_feedback(&mut self, text: &str) {
        self.feedback = text.to_string();
    }

    fn show_timer(&mut self, text: &str) {
        self.timer = text.to_string();
    }

    fn show_outcome(&mut self, summary: &RoundSummary) {
        self.outcome = Some(summary.clone());
    }

    fn set_submit_enabled(&mut self, enabled: bool) {
        self.submit_enabled = enabled;
    }

    fn log_line(&mut self, text: &str) {
        self.log.push(text.to_string());
        if self.log.len() > MAX_LOG_LINES {
            self.log.remove(0);
        }
    }
}

/// The main application state
pub struct App {
    pub session: Session<Store>,
    pub surface: TuiSurface,
    pub screen_state: ScreenState,
    pub menu_selection: usize,
    pub theme: Theme,
    pub settings: Settings,
    pub options: GameOptions,
    /// Where settings are saved; `None` keeps them in memory
    data_dir: Option<PathBuf>,
    pub real_input: String,
    pub imag_input: String,
    pub focus: Field,
    pub name_input: String,
    /// Message to display
    pub message: Option<String>,
    /// Message timer
    message_timer: u32,
    /// Setup of the last round, for quick restart
    last_setup: Option<RoundSetup>,
    /// Scroll offset for history view
    pub history_scroll: usize,
}

impl App {
    pub fn new(store: Store, settings: Settings, options: GameOptions, data_dir: Option<PathBuf>) -> Self {
        let config = SessionConfig {
            player_name: settings.player_name.clone(),
            enforce_bounds: true,
        };
        Self {
            session: Session::new(store, config),
            surface: TuiSurface::new(),
            screen_state: ScreenState::Menu,
            menu_selection: 0,
            theme: settings.theme.theme(),
            settings,
            options,
            data_dir,
            real_input: String::new(),
            imag_input: String::new(),
            focus: Field::Real,
            name_input: String::new(),
            message: None,
            message_timer: 0,
            last_setup: None,
            history_scroll: 0,
        }
    }

    /// Get the tick rate based on current screen
    pub fn get_tick_rate(&self) -> Duration {
        if self.screen_state == ScreenState::Playing && self.session.in_progress() {
            Duration::from_millis(50)
        } else {
            Duration::from_millis(100)
        }
    }

    /// Drive the session and expire messages (called every tick)
    pub fn tick(&mut self, now: Instant) {
        if self.message_timer > 0 {
            self.message_timer -= 1;
            if self.message_timer == 0 {
                self.message = None;
            }
        }
        self.session.poll(now, &mut self.surface);
    }

    /// Show a temporary message
    pub fn show_message(&mut self, msg: &str) {
        self.message = Some(msg.to_string());
        self.message_timer = 30;
    }

    pub fn top_scores(&self) -> Vec<ScoreEntry> {
        self.session.top_scores(MAX_LEADERBOARD)
    }

    pub fn history(&self) -> Vec<HistoryRecord> {
        self.session.store().history()
    }

    pub fn achievements(&self) -> Vec<UnlockedAchievement> {
        self.session.store().achievements()
    }

    pub fn stats(&self) -> StatsSummary {
        StatsSummary::from_history(&self.history())
    }

    /// Start a round from a launch mode, as `--mode` does
    pub fn launch(&mut self, mode: GameMode, solver: SolverKind, now: Instant) {
        let item = match mode {
            GameMode::Standard => MenuItem::Play(self.options.difficulty),
            GameMode::Daily => MenuItem::Daily,
            GameMode::Survival => MenuItem::Survival,
            GameMode::Solver => MenuItem::Solver(solver),
        };
        self.activate(item, now);
    }

    fn start(&mut self, setup: RoundSetup, now: Instant) {
        // A refused solver must leave the current screen intact
        let mut surface = TuiSurface::new();
        match self.session.start_round(setup.clone(), now, &mut surface) {
            Ok(()) => {
                self.surface = surface;
                self.last_setup = Some(setup);
                self.clear_inputs();
                self.screen_state = ScreenState::Playing;
            }
            Err(err) => self.show_message(&err.to_string()),
        }
    }

    fn start_survival(&mut self, now: Instant) {
        self.surface.reset();
        self.session
            .start_survival(self.options.rounds, now, &mut self.surface);
        self.last_setup = Some(RoundSetup::survival());
        self.clear_inputs();
        self.screen_state = ScreenState::Playing;
    }

    fn clear_inputs(&mut self) {
        self.real_input.clear();
        self.imag_input.clear();
        self.focus = Field::Real;
    }

    fn activate(&mut self, item: MenuItem, now: Instant) -> AppAction {
        match item {
            MenuItem::Play(difficulty) => self.start(self.options.standard(difficulty), now),
            MenuItem::Daily => self.start(RoundSetup::daily(&today()), now),
            MenuItem::Survival => self.start_survival(now),
            MenuItem::Solver(kind) => self.start(self.options.solver(kind), now),
            MenuItem::Leaderboard => self.screen_state = ScreenState::Leaderboard,
            MenuItem::History => {
                self.history_scroll = 0;
                self.screen_state = ScreenState::History;
            }
            MenuItem::Achievements => self.screen_state = ScreenState::Achievements,
            MenuItem::ChangeName => {
                self.name_input = self.settings.player_name.clone().unwrap_or_default();
                self.screen_state = ScreenState::NameEntry;
            }
            MenuItem::ToggleTheme => self.toggle_theme(),
            MenuItem::Quit => return AppAction::Quit,
        }
        AppAction::Continue
    }

    fn toggle_theme(&mut self) {
        self.settings.theme = self.settings.theme.toggled();
        self.theme = self.settings.theme.theme();
        self.save_settings();
    }

    fn save_settings(&mut self) {
        let Some(dir) = self.data_dir.as_deref() else {
            return;
        };
        if let Err(err) = self.settings.save(dir) {
            warn!(%err, "Could not save settings");
            self.show_message("Could not save settings");
        }
    }

    /// Handle a key press
    pub fn handle_key(&mut self, key: KeyEvent) -> AppAction {
        self.handle_key_at(key, Instant::now())
    }

    pub fn handle_key_at(&mut self, key: KeyEvent, now: Instant) -> AppAction {
        match self.screen_state {
            ScreenState::Menu => self.handle_menu_key(key, now),
            ScreenState::Playing => self.handle_game_key(key, now),
            ScreenState::Leaderboard => self.handle_leaderboard_key(key),
            ScreenState::History => self.handle_history_key(key),
            ScreenState::Achievements => self.handle_back_key(key),
            ScreenState::NameEntry => self.handle_name_key(key),
        }
    }

    fn handle_menu_key(&mut self, key: KeyEvent, now: Instant) -> AppAction {
        let count = MenuItem::ALL.len() + 1;
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.menu_selection = (self.menu_selection + count - 1) % count;
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.menu_selection = (self.menu_selection + 1) % count;
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                let item = MenuItem::ALL
                    .get(self.menu_selection)
                    .copied()
                    .unwrap_or(MenuItem::Quit);
                return self.activate(item, now);
            }
            KeyCode::Char('t') => self.toggle_theme(),
            KeyCode::Char('q') | KeyCode::Esc => return AppAction::Quit,
            _ => {}
        }
        AppAction::Continue
    }

    fn handle_game_key(&mut self, key: KeyEvent, now: Instant) -> AppAction {
        let in_progress = self.session.in_progress();
        match key.code {
            KeyCode::Char(c) if in_progress && (c.is_ascii_digit() || c == '-' || c == '+') => {
                let field = self.focused_input();
                if field.len() < MAX_FIELD_LEN {
                    field.push(c);
                }
            }
            KeyCode::Backspace if in_progress => {
                self.focused_input().pop();
            }
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Left | KeyCode::Right => {
                self.focus = match self.focus {
                    Field::Real => Field::Imag,
                    Field::Imag => Field::Real,
                };
            }
            KeyCode::Enter if in_progress => self.submit(now),
            KeyCode::Enter | KeyCode::Char('n') if !in_progress => self.continue_after_round(now),
            KeyCode::Char('h') if in_progress => {
                self.session.request_hint(&mut self.surface);
            }
            KeyCode::Char('c') if in_progress => self.session.cheat(now, &mut self.surface),
            KeyCode::Char('g') if in_progress => self.session.give_up(now, &mut self.surface),
            KeyCode::Char('t') => self.toggle_theme(),
            KeyCode::Esc | KeyCode::Char('m') => {
                // Leaving a live round counts as giving up
                if in_progress {
                    self.session.give_up(now, &mut self.surface);
                }
                self.screen_state = ScreenState::Menu;
            }
            KeyCode::Char('q') => {
                if in_progress {
                    self.session.give_up(now, &mut self.surface);
                }
                return AppAction::Quit;
            }
            _ => {}
        }
        AppAction::Continue
    }

    fn focused_input(&mut self) -> &mut String {
        match self.focus {
            Field::Real => &mut self.real_input,
            Field::Imag => &mut self.imag_input,
        }
    }

    fn submit(&mut self, now: Instant) {
        let accepted = self
            .session
            .submit_text(&self.real_input, &self.imag_input, now, &mut self.surface)
            .is_ok();
        if accepted {
            self.clear_inputs();
        }
    }

    /// Next survival round, or a fresh round with the last setup
    fn continue_after_round(&mut self, now: Instant) {
        if let Some(run) = self.session.survival() {
            if !run.finished {
                self.surface.reset();
                self.session.next_survival_round(now, &mut self.surface);
                self.clear_inputs();
                return;
            }
        }
        match self.last_setup.clone() {
            Some(setup) if setup.mode == GameMode::Survival => self.start_survival(now),
            Some(setup) => self.start(setup, now),
            None => self.screen_state = ScreenState::Menu,
        }
    }

    fn handle_leaderboard_key(&mut self, key: KeyEvent) -> AppAction {
        if key.code == KeyCode::Char('c') {
            match self.session.store_mut().clear_leaderboard() {
                Ok(()) => self.show_message("Leaderboard cleared"),
                Err(err) => {
                    warn!(%err, "Could not clear leaderboard");
                    self.show_message("Could not clear leaderboard");
                }
            }
            return AppAction::Continue;
        }
        self.handle_back_key(key)
    }

    fn handle_history_key(&mut self, key: KeyEvent) -> AppAction {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.history_scroll = self.history_scroll.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.history_scroll + 1 < self.history().len() {
                    self.history_scroll += 1;
                }
            }
            _ => return self.handle_back_key(key),
        }
        AppAction::Continue
    }

    fn handle_back_key(&mut self, key: KeyEvent) -> AppAction {
        match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('b') => {
                self.screen_state = ScreenState::Menu;
            }
            KeyCode::Char('q') => return AppAction::Quit,
            _ => {}
        }
        AppAction::Continue
    }

    fn handle_name_key(&mut self, key: KeyEvent) -> AppAction {
        match key.code {
            KeyCode::Char(c) if !c.is_control() && self.name_input.chars().count() < MAX_NAME_LEN => {
                self.name_input.push(c);
            }
            KeyCode::Backspace => {
                self.name_input.pop();
            }
            KeyCode::Enter => {
                let name = self.name_input.trim().to_string();
                let name = (!name.is_empty()).then_some(name);
                self.session.set_player_name(name.clone());
                self.settings.player_name = name;
                self.save_settings();
                self.screen_state = ScreenState::Menu;
            }
            KeyCode::Esc => self.screen_state = ScreenState::Menu,
            _ => {}
        }
        AppAction::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::ThemeName;
    use complex_guess_core::{MemoryStore, Outcome};
    use crossterm::event::KeyModifiers;

    fn app() -> App {
        let settings = Settings {
            theme: ThemeName::Dark,
            player_name: Some("Ada".to_string()),
        };
        let options = GameOptions {
            seed: Some("fixed".to_string()),
            ..Default::default()
        };
        App::new(Store::Memory(MemoryStore::new()), settings, options, None)
    }

    fn press(app: &mut App, code: KeyCode, now: Instant) -> AppAction {
        app.handle_key_at(KeyEvent::new(code, KeyModifiers::NONE), now)
    }

    fn type_text(app: &mut App, text: &str, now: Instant) {
        for c in text.chars() {
            press(app, KeyCode::Char(c), now);
        }
    }

    fn type_guess(app: &mut App, real: i64, imag: i64, now: Instant) {
        type_text(app, &real.to_string(), now);
        press(app, KeyCode::Tab, now);
        type_text(app, &imag.to_string(), now);
        press(app, KeyCode::Enter, now);
    }

    #[test]
    fn test_menu_starts_selected_tier() {
        let mut app = app();
        let now = Instant::now();
        press(&mut app, KeyCode::Down, now);
        press(&mut app, KeyCode::Enter, now);

        assert_eq!(app.screen_state, ScreenState::Playing);
        assert_eq!(app.session.round().unwrap().profile().range, 50);
        assert_eq!(app.surface.timer, "3:00");
    }

    #[test]
    fn test_winning_by_keyboard() {
        let mut app = app();
        let now = Instant::now();
        app.launch(GameMode::Standard, SolverKind::Spiral, now);
        let target = app.session.round().unwrap().target();

        type_guess(&mut app, target.real, target.imag, now);

        let summary = app.surface.outcome.as_ref().unwrap();
        assert!(summary.outcome.is_win());
        assert!(summary.message().starts_with("Correct! You guessed"));
        assert_eq!(app.top_scores().len(), 1);
        assert_eq!(app.history()[0].result, "win");
        assert!(app.real_input.is_empty() && app.imag_input.is_empty());
    }

    #[test]
    fn test_invalid_input_keeps_fields() {
        let mut app = app();
        let now = Instant::now();
        app.launch(GameMode::Standard, SolverKind::Spiral, now);

        type_text(&mut app, "-", now);
        press(&mut app, KeyCode::Tab, now);
        type_text(&mut app, "3", now);
        press(&mut app, KeyCode::Enter, now);

        assert_eq!(
            app.surface.feedback,
            "Please enter valid integers for both real and imaginary parts"
        );
        assert_eq!(app.real_input, "-");
        assert_eq!(app.session.round().unwrap().attempts_used(), 0);
    }

    #[test]
    fn test_submit_locked_during_cooldown() {
        let mut app = app();
        let now = Instant::now();
        app.launch(GameMode::Standard, SolverKind::Spiral, now);
        let target = app.session.round().unwrap().target();
        let miss = if target.real == 0 { 1 } else { 0 };

        type_guess(&mut app, miss, 0, now);
        assert!(!app.surface.submit_enabled);
        type_guess(&mut app, miss, 0, now);
        assert_eq!(app.surface.feedback, "Submit is temporarily disabled");
        assert_eq!(app.session.round().unwrap().attempts_used(), 1);

        app.tick(now + Duration::from_millis(250));
        assert!(app.surface.submit_enabled);
    }

    #[test]
    fn test_escape_gives_up_round() {
        let mut app = app();
        let now = Instant::now();
        app.launch(GameMode::Standard, SolverKind::Spiral, now);
        press(&mut app, KeyCode::Esc, now);

        assert_eq!(app.screen_state, ScreenState::Menu);
        assert_eq!(app.history()[0].result, "gave_up");
    }

    #[test]
    fn test_cheat_reveals_and_restart() {
        let mut app = app();
        let now = Instant::now();
        app.launch(GameMode::Standard, SolverKind::Spiral, now);
        let first_id = app.session.round().unwrap().id();

        press(&mut app, KeyCode::Char('c'), now);
        assert!(app.surface.outcome.as_ref().unwrap().message().starts_with("Cheat used."));

        press(&mut app, KeyCode::Enter, now);
        assert!(app.surface.outcome.is_none());
        assert_ne!(app.session.round().unwrap().id(), first_id);
        assert!(app.session.in_progress());
    }

    #[test]
    fn test_refused_solver_shows_message() {
        let mut app = app();
        app.options.difficulty = Difficulty::Hard;
        app.launch(GameMode::Solver, SolverKind::Spiral, Instant::now());

        assert_eq!(app.screen_state, ScreenState::Menu);
        assert!(app.message.as_deref().unwrap().contains("ranges <= 30"));
    }

    #[test]
    fn test_solver_round_plays_itself() {
        let mut app = app();
        app.options.range = Some(1);
        app.options.attempts = Some(9);
        let start = Instant::now();
        app.launch(GameMode::Solver, SolverKind::Spiral, start);

        let mut now = start;
        for _ in 0..20 {
            now += Duration::from_millis(150);
            app.tick(now);
        }

        let summary = app.surface.outcome.as_ref().unwrap();
        assert_eq!(summary.mode, GameMode::Solver);
        assert!(matches!(summary.outcome, Outcome::Won { .. }));
        assert!(app.top_scores().is_empty());
        assert!(app.surface.log.iter().any(|l| l.starts_with("Attempt 1: 0 + 0i")));
    }

    #[test]
    fn test_survival_advances_on_enter() {
        let mut app = app();
        let now = Instant::now();
        app.launch(GameMode::Survival, SolverKind::Spiral, now);
        let target = app.session.round().unwrap().target();

        type_guess(&mut app, target.real, target.imag, now);
        press(&mut app, KeyCode::Enter, now);

        assert_eq!(app.session.survival().unwrap().round, 2);
        assert!(app.session.in_progress());
        assert!(app.surface.outcome.is_none());
    }

    #[test]
    fn test_change_name() {
        let mut app = app();
        app.activate(MenuItem::ChangeName, Instant::now());
        assert_eq!(app.name_input, "Ada");

        for _ in 0..3 {
            press(&mut app, KeyCode::Backspace, Instant::now());
        }
        type_text(&mut app, "Grace", Instant::now());
        press(&mut app, KeyCode::Enter, Instant::now());

        assert_eq!(app.screen_state, ScreenState::Menu);
        assert_eq!(app.settings.player_name.as_deref(), Some("Grace"));
        assert_eq!(app.session.player_name(), Some("Grace"));
    }

    #[test]
    fn test_toggle_theme() {
        let mut app = app();
        press(&mut app, KeyCode::Char('t'), Instant::now());
        assert_eq!(app.settings.theme, ThemeName::Light);
        assert_eq!(app.theme.name, ThemeName::Light);
    }

    #[test]
    fn test_profile_overrides() {
        let options = GameOptions {
            range: Some(5),
            time_limit: Some(30),
            ..Default::default()
        };
        assert_eq!(
            options.profile_for(Difficulty::Medium),
            DifficultyProfile::new(5, 10, 30)
        );
    }
}
