mod app;
mod leaderboard;
mod render;
mod settings;
mod stats;
mod theme;

use anyhow::{Context, Result};
use app::{App, GameOptions};
use clap::{Parser, ValueEnum};
use complex_guess_core::{Difficulty, GameMode, SolverKind};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use leaderboard::{Environment, Store};
use settings::Settings;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;
use theme::ThemeName;

/// Guess a hidden complex number from magnitude feedback
#[derive(Parser, Debug)]
#[command(name = "complex-guess")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Difficulty tier
    #[arg(short, long, value_enum, default_value_t = DifficultyArg::Easy)]
    difficulty: DifficultyArg,

    /// Override the range bound for both parts
    #[arg(long)]
    range: Option<u32>,

    /// Override the attempt budget
    #[arg(long)]
    attempts: Option<u32>,

    /// Override the time limit in seconds
    #[arg(long)]
    time_limit: Option<u64>,

    /// Start straight into a round instead of the menu
    #[arg(short, long, value_enum)]
    mode: Option<ModeArg>,

    /// Solver used by `--mode solver`
    #[arg(long, value_enum, default_value_t = SolverArg::Spiral)]
    solver: SolverArg,

    /// Rounds in a survival run
    #[arg(long, default_value_t = 3)]
    rounds: u32,

    /// Seed for a reproducible target
    #[arg(long)]
    seed: Option<String>,

    /// Seed for the adaptive solver
    #[arg(long)]
    solver_seed: Option<u64>,

    /// Player name recorded on the leaderboard (saved for next time)
    #[arg(short, long)]
    name: Option<String>,

    /// Directory for scores, history, settings and the log file
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Color theme (saved for next time)
    #[arg(long, value_enum)]
    theme: Option<ThemeName>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DifficultyArg {
    Easy,
    Medium,
    Hard,
}

impl From<DifficultyArg> for Difficulty {
    fn from(arg: DifficultyArg) -> Self {
        match arg {
            DifficultyArg::Easy => Difficulty::Easy,
            DifficultyArg::Medium => Difficulty::Medium,
            DifficultyArg::Hard => Difficulty::Hard,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Standard,
    Daily,
    Survival,
    Solver,
}

impl From<ModeArg> for GameMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Standard => GameMode::Standard,
            ModeArg::Daily => GameMode::Daily,
            ModeArg::Survival => GameMode::Survival,
            ModeArg::Solver => GameMode::Solver,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SolverArg {
    Spiral,
    Adaptive,
}

impl From<SolverArg> for SolverKind {
    fn from(arg: SolverArg) -> Self {
        match arg {
            SolverArg::Spiral => SolverKind::Spiral,
            SolverArg::Adaptive => SolverKind::Adaptive,
        }
    }
}

/// Log to a file; the terminal belongs to the UI
fn init_logging(data_dir: &Path, verbose: u8) -> Result<()> {
    let log_level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    let path = data_dir.join("complex-guess.log");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let data_dir = cli.data_dir.clone().unwrap_or_else(leaderboard::default_data_dir);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data directory {}", data_dir.display()))?;
    init_logging(&data_dir, cli.verbose)?;

    let mut settings = Settings::load(&data_dir);
    let mut settings_changed = false;
    if let Some(name) = cli.name.clone().filter(|n| !n.trim().is_empty()) {
        settings.player_name = Some(name);
        settings_changed = true;
    }
    if let Some(theme) = cli.theme {
        settings.theme = theme;
        settings_changed = true;
    }
    if settings_changed {
        if let Err(err) = settings.save(&data_dir) {
            tracing::warn!(%err, "Could not save settings");
        }
    }

    let env = Environment::detect();
    let store = Store::for_environment(env, &data_dir);
    tracing::info!(?env, data_dir = %data_dir.display(), "Starting");

    let options = GameOptions {
        difficulty: cli.difficulty.into(),
        range: cli.range,
        attempts: cli.attempts,
        time_limit: cli.time_limit,
        seed: cli.seed.clone(),
        solver_seed: cli.solver_seed,
        rounds: cli.rounds.max(1),
    };
    let mut app = App::new(store, settings, options, Some(data_dir));
    if let Some(mode) = cli.mode {
        app.launch(mode.into(), cli.solver.into(), Instant::now());
    }

    // Setup terminal
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;

    let result = run_app(&mut stdout, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(stdout, LeaveAlternateScreen)?;
    app.session.end();

    if let Err(e) = result {
        tracing::error!(error = %e, "UI loop failed");
        eprintln!("Error: {}", e);
    }

    Ok(())
}

fn run_app(stdout: &mut io::Stdout, app: &mut App) -> io::Result<()> {
    loop {
        render::render(stdout, app)?;
        stdout.flush()?;

        // Short poll so scheduled work fires close to its due time
        if event::poll(app.get_tick_rate())? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    // Handle Ctrl+C
                    if key.modifiers.contains(KeyModifiers::CONTROL)
                        && key.code == KeyCode::Char('c')
                    {
                        break;
                    }

                    match app.handle_key(key) {
                        app::AppAction::Continue => {}
                        app::AppAction::Quit => break,
                    }
                }
                _ => {}
            }
        }

        app.tick(Instant::now());
    }

    Ok(())
}
