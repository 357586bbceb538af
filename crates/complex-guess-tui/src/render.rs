use crate::app::{App, Field, MenuItem, ScreenState};
use crate::leaderboard::format_entry;
use crate::stats::format_time;
use complex_guess_core::{Achievement, Outcome, RoundSummary};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute,
    style::{Color, Print, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};
use std::io;

pub fn render(stdout: &mut io::Stdout, app: &App) -> io::Result<()> {
    let (term_width, term_height) = terminal::size()?;

    execute!(stdout, Hide)?;
    execute!(stdout, SetBackgroundColor(app.theme.bg), Clear(ClearType::All))?;

    match app.screen_state {
        ScreenState::Menu => render_menu_screen(stdout, app, term_width)?,
        ScreenState::Playing => render_game_screen(stdout, app, term_width, term_height)?,
        ScreenState::Leaderboard => render_leaderboard_screen(stdout, app, term_width)?,
        ScreenState::History => render_history_screen(stdout, app, term_width, term_height)?,
        ScreenState::Achievements => render_achievements_screen(stdout, app, term_width)?,
        ScreenState::NameEntry => render_name_screen(stdout, app, term_width)?,
    }

    if let Some(ref msg) = app.message {
        render_message(stdout, app, msg, term_width)?;
    }

    execute!(stdout, Show)?;
    Ok(())
}

fn render_title(stdout: &mut io::Stdout, app: &App, title: &str, term_width: u16) -> io::Result<()> {
    let title = format!("═══ {} ═══", title);
    let x = term_width.saturating_sub(title.chars().count() as u16) / 2;
    execute!(
        stdout,
        MoveTo(x, 1),
        SetForegroundColor(app.theme.accent),
        Print(title)
    )
}

fn render_footer(stdout: &mut io::Stdout, app: &App, y: u16, keys: &[(&str, &str)]) -> io::Result<()> {
    execute!(stdout, MoveTo(4, y))?;
    for (key, action) in keys {
        execute!(
            stdout,
            SetForegroundColor(app.theme.key),
            Print(key),
            SetForegroundColor(app.theme.info),
            Print(format!(" {}   ", action))
        )?;
    }
    Ok(())
}

fn render_menu_screen(stdout: &mut io::Stdout, app: &App, term_width: u16) -> io::Result<()> {
    let theme = &app.theme;
    render_title(stdout, app, "COMPLEX NUMBER GUESSING GAME", term_width)?;

    let player = app.session.player_name().unwrap_or("(anonymous)");
    execute!(
        stdout,
        MoveTo(4, 3),
        SetForegroundColor(theme.info),
        Print(format!("Player: {}   Theme: {}", player, theme.name.label()))
    )?;

    let items = MenuItem::ALL.iter().chain(std::iter::once(&MenuItem::Quit));
    for (i, item) in items.enumerate() {
        let y = 5 + i as u16;
        let selected = i == app.menu_selection;
        let (marker, color) = if selected {
            ("▶ ", theme.accent)
        } else {
            ("  ", theme.fg)
        };
        execute!(
            stdout,
            MoveTo(4, y),
            SetForegroundColor(color),
            Print(format!("{}{}", marker, item.label()))
        )?;
    }

    let footer_y = 7 + MenuItem::ALL.len() as u16;
    render_footer(
        stdout,
        app,
        footer_y,
        &[("↑↓", "select"), ("Enter", "choose"), ("t", "theme"), ("q", "quit")],
    )
}

fn render_game_screen(
    stdout: &mut io::Stdout,
    app: &App,
    term_width: u16,
    term_height: u16,
) -> io::Result<()> {
    let theme = &app.theme;
    let Some(round) = app.session.round() else {
        return render_title(stdout, app, "NO ROUND", term_width);
    };
    let profile = round.profile();

    render_title(
        stdout,
        app,
        &format!("{} ROUND", app.session.mode().as_str().to_uppercase()),
        term_width,
    )?;

    execute!(
        stdout,
        MoveTo(4, 3),
        SetForegroundColor(theme.fg),
        Print(format!(
            "Guess a + bi with a, b in [-{}, {}]",
            profile.range, profile.range
        )),
        MoveTo(4, 4),
        SetForegroundColor(theme.info),
        Print(format!(
            "Time: {}   Attempts left: {}   Hints revealed: {}",
            app.surface.timer,
            round.remaining_attempts(),
            round.hints_revealed()
        ))
    )?;

    if let Some(run) = app.session.survival() {
        execute!(
            stdout,
            Print(format!(
                "   Survival: round {}/{}",
                run.round, run.target_rounds
            ))
        )?;
    }

    render_inputs(stdout, app, 6)?;

    let feedback_color = if app.surface.feedback.contains("TOO LOW") {
        theme.low
    } else if app.surface.feedback.contains("TOO HIGH") {
        theme.high
    } else {
        theme.fg
    };
    for (i, line) in app.surface.feedback.lines().enumerate() {
        execute!(
            stdout,
            MoveTo(4, 9 + i as u16),
            SetForegroundColor(feedback_color),
            Print(line)
        )?;
    }

    let mut log_y = 12;
    if let Some(ref summary) = app.surface.outcome {
        log_y = render_outcome(stdout, app, summary, 12)? + 1;
    }

    // Round log, most recent lines that fit
    let footer_y = term_height.saturating_sub(2);
    let visible = footer_y.saturating_sub(log_y + 1) as usize;
    let skip = app.surface.log.len().saturating_sub(visible);
    for (i, line) in app.surface.log.iter().skip(skip).enumerate() {
        execute!(
            stdout,
            MoveTo(4, log_y + i as u16),
            SetForegroundColor(theme.info),
            Print(line)
        )?;
    }

    if app.session.in_progress() {
        let keys: &[(&str, &str)] = if app.session.is_auto() {
            &[("Esc", "menu"), ("q", "quit")]
        } else {
            &[
                ("Tab", "switch field"),
                ("Enter", "guess"),
                ("h", "hint"),
                ("c", "cheat"),
                ("g", "give up"),
                ("Esc", "menu"),
            ]
        };
        render_footer(stdout, app, footer_y, keys)
    } else {
        render_footer(
            stdout,
            app,
            footer_y,
            &[("Enter", "continue"), ("m", "menu"), ("t", "theme"), ("q", "quit")],
        )
    }
}

fn render_inputs(stdout: &mut io::Stdout, app: &App, y: u16) -> io::Result<()> {
    let theme = &app.theme;
    let locked = !app.surface.submit_enabled || app.session.is_auto();
    let text_color = if locked { theme.disabled } else { theme.fg };

    let field = |value: &str, focused: bool| -> (String, Color) {
        let bg = if focused && !locked { theme.input_bg } else { theme.bg };
        (format!("[{:>8}]", value), bg)
    };
    let (real, real_bg) = field(&app.real_input, app.focus == Field::Real);
    let (imag, imag_bg) = field(&app.imag_input, app.focus == Field::Imag);

    execute!(
        stdout,
        MoveTo(4, y),
        SetForegroundColor(text_color),
        SetBackgroundColor(real_bg),
        Print(real),
        SetBackgroundColor(theme.bg),
        Print(" + "),
        SetBackgroundColor(imag_bg),
        Print(imag),
        SetBackgroundColor(theme.bg),
        Print(" i")
    )
}

/// Draw the outcome panel; returns the first free row below it
fn render_outcome(
    stdout: &mut io::Stdout,
    app: &App,
    summary: &RoundSummary,
    y: u16,
) -> io::Result<u16> {
    let color = match summary.outcome {
        Outcome::Won { .. } => app.theme.success,
        _ => app.theme.error,
    };
    let mut row = y;
    for line in summary.message().lines() {
        execute!(stdout, MoveTo(4, row), SetForegroundColor(color), Print(line))?;
        row += 1;
    }
    execute!(
        stdout,
        MoveTo(4, row),
        SetForegroundColor(app.theme.info),
        Print(format!("Time taken: {}", format_time(summary.elapsed_secs)))
    )?;
    Ok(row + 1)
}

fn render_leaderboard_screen(
    stdout: &mut io::Stdout,
    app: &App,
    term_width: u16,
) -> io::Result<()> {
    let theme = &app.theme;
    render_title(stdout, app, "LEADERBOARD", term_width)?;

    execute!(
        stdout,
        MoveTo(4, 3),
        SetForegroundColor(theme.info),
        Print(format!("Backend: {}", app.session.store().backend_name()))
    )?;

    let entries = app.top_scores();
    if entries.is_empty() {
        execute!(
            stdout,
            MoveTo(4, 5),
            SetForegroundColor(theme.info),
            Print("No scores yet.")
        )?;
    }
    for (i, entry) in entries.iter().enumerate() {
        let rank_color = match i {
            0 => Color::Yellow,
            1 => Color::Grey,
            2 => Color::Rgb {
                r: 205,
                g: 127,
                b: 50,
            },
            _ => theme.fg,
        };
        execute!(
            stdout,
            MoveTo(4, 5 + i as u16),
            SetForegroundColor(rank_color),
            Print(format_entry(i + 1, entry)),
            SetForegroundColor(theme.info),
            Print(format!("  [{}] {}", entry.mode, entry.date))
        )?;
    }

    let footer_y = 7 + entries.len() as u16;
    render_footer(stdout, app, footer_y, &[("c", "clear"), ("Esc", "back")])
}

fn render_history_screen(
    stdout: &mut io::Stdout,
    app: &App,
    term_width: u16,
    term_height: u16,
) -> io::Result<()> {
    let theme = &app.theme;
    render_title(stdout, app, "HISTORY", term_width)?;

    let stats = app.stats();
    execute!(
        stdout,
        MoveTo(4, 3),
        SetForegroundColor(theme.fg),
        Print(format!(
            "Rounds: {}   Wins: {} ({:.0}%)   Streak: {}   Best: {}",
            stats.total_rounds,
            stats.wins,
            stats.win_rate(),
            stats.current_streak,
            stats
                .best_points
                .map_or_else(|| "-".to_string(), |p| format!("{} pts", p))
        )),
        MoveTo(4, 4),
        SetForegroundColor(theme.info),
        Print(format!(
            "Fastest win: {}   Avg attempts: {}   Solver rounds: {}",
            stats.fastest_win_secs.map_or_else(|| "-".to_string(), format_time),
            stats
                .avg_attempts
                .map_or_else(|| "-".to_string(), |a| format!("{:.1}", a)),
            stats.solver_rounds
        ))
    )?;

    execute!(
        stdout,
        MoveTo(4, 6),
        SetForegroundColor(theme.fg),
        Print(format!(
            "{:<17} {:<16} {:<14} {:>8} {:>6} {:>6} {:>9}",
            "Date", "Result", "Target", "Attempts", "Time", "Points", "Mode"
        )),
        MoveTo(4, 7),
        SetForegroundColor(theme.border),
        Print("─".repeat(82))
    )?;

    let history = app.history();
    let footer_y = term_height.saturating_sub(2);
    let visible = footer_y.saturating_sub(9) as usize;
    for (i, record) in history
        .iter()
        .skip(app.history_scroll)
        .take(visible)
        .enumerate()
    {
        let color = if record.result == "win" {
            theme.success
        } else {
            theme.fg
        };
        execute!(
            stdout,
            MoveTo(4, 8 + i as u16),
            SetForegroundColor(color),
            Print(format!(
                "{:<17} {:<16} {:<14} {:>8} {:>6} {:>6} {:>9}",
                record.date,
                record.result,
                record.target,
                record.attempts,
                format_time(record.time),
                record.points,
                record.mode.as_str()
            ))
        )?;
    }

    render_footer(stdout, app, footer_y, &[("↑↓", "scroll"), ("Esc", "back")])
}

fn render_achievements_screen(
    stdout: &mut io::Stdout,
    app: &App,
    term_width: u16,
) -> io::Result<()> {
    let theme = &app.theme;
    render_title(stdout, app, "ACHIEVEMENTS", term_width)?;

    let unlocked = app.achievements();
    for (i, achievement) in Achievement::all().iter().enumerate() {
        let date = unlocked
            .iter()
            .find(|u| u.achievement == *achievement)
            .map(|u| u.date.as_str());
        let (mark, color, when) = match date {
            Some(d) => ("★", theme.success, format!("  unlocked {}", d)),
            None => ("☆", theme.disabled, String::new()),
        };
        execute!(
            stdout,
            MoveTo(4, 3 + i as u16 * 2),
            SetForegroundColor(color),
            Print(format!("{} {}", mark, achievement.title())),
            SetForegroundColor(theme.info),
            Print(format!(" - {}{}", achievement.description(), when))
        )?;
    }

    let footer_y = 4 + Achievement::all().len() as u16 * 2;
    render_footer(stdout, app, footer_y, &[("Esc", "back")])
}

fn render_name_screen(stdout: &mut io::Stdout, app: &App, term_width: u16) -> io::Result<()> {
    let theme = &app.theme;
    render_title(stdout, app, "PLAYER NAME", term_width)?;
    execute!(
        stdout,
        MoveTo(4, 3),
        SetForegroundColor(theme.info),
        Print("Wins are only recorded on the leaderboard under a name."),
        MoveTo(4, 5),
        SetForegroundColor(theme.fg),
        SetBackgroundColor(theme.input_bg),
        Print(format!(" {:<20} ", app.name_input)),
        SetBackgroundColor(theme.bg)
    )?;
    render_footer(stdout, app, 7, &[("Enter", "save"), ("Esc", "cancel")])
}

fn render_message(
    stdout: &mut io::Stdout,
    app: &App,
    msg: &str,
    term_width: u16,
) -> io::Result<()> {
    let theme = &app.theme;
    let padded = format!("  {}  ", msg);
    let x = term_width.saturating_sub(padded.chars().count() as u16) / 2;

    execute!(
        stdout,
        MoveTo(x, 0),
        SetForegroundColor(theme.fg),
        SetBackgroundColor(theme.input_bg),
        Print(&padded),
        SetBackgroundColor(theme.bg)
    )?;

    Ok(())
}
