//! Basic example of driving the guessing engine headless

use complex_guess_core::{
    Difficulty, Generator, MemoryStore, RecordingPresenter, RoundSetup, RoundState,
    Session, SessionConfig, SolverKind,
};
use std::time::{Duration, Instant};

fn main() {
    // Draw a reproducible target
    let mut generator = Generator::from_seed_str("demo");
    let profile = Difficulty::Easy.profile();
    let target = generator.generate(profile.range);
    println!("Target: {} (|{:.2}|)\n", target, target.magnitude());

    // Play a few guesses by hand along the real axis
    let start = Instant::now();
    let mut round = RoundState::new(1, target, profile, start);
    for real in -2..=2 {
        match round.submit_guess(real, 0) {
            Ok(outcome) => println!("Guess {} + 0i: {}", real, outcome.feedback()),
            Err(e) => println!("Rejected: {}", e),
        }
        if round.is_terminal() {
            break;
        }
    }
    if let Some(hint) = round.request_hint() {
        println!("{}", hint);
    }
    println!("Attempts left: {}\n", round.remaining_attempts());

    // Let the spiral solver finish a seeded round
    println!("--- Spiral solver ---\n");
    let mut session = Session::new(MemoryStore::new(), SessionConfig::default());
    let mut presenter = RecordingPresenter::new();
    let setup = RoundSetup::solver(Difficulty::Easy, SolverKind::Spiral).with_seed("demo");
    if let Err(e) = session.start_round(setup, start, &mut presenter) {
        println!("Solver refused: {}", e);
        return;
    }

    let mut now = start;
    while session.in_progress() {
        now += Duration::from_millis(150);
        session.poll(now, &mut presenter);
    }
    for line in presenter.log.iter().rev().take(3).rev() {
        println!("{}", line);
    }
    if let Some(summary) = session.last_summary() {
        println!("\n{}", summary.message());
    }
}
