//! Core engine for the complex-number guessing game
//!
//! A secret Gaussian integer is drawn inside a square range and the player
//! narrows it down from magnitude feedback and occasional parity/primality
//! hints, against an attempt budget and a countdown. Rounds can also be
//! played by an automated [`Solver`].
//!
//! The crate is UI agnostic: a [`Session`] drives rounds through the
//! [`Presenter`] trait and persists results through the [`ScoreStore`] trait.

pub mod achievements;
mod error;
pub mod generator;
pub mod hints;
pub mod presenter;
mod round;
pub mod scheduler;
pub mod session;
pub mod solver;
mod types;

pub use achievements::Achievement;
pub use error::{GuessError, SolverError, StoreError, StoreResult};
pub use generator::Generator;
pub use hints::MagnitudeHint;
pub use presenter::{format_clock, Presenter, RecordingPresenter};
pub use round::{score, GuessOutcome, RoundState};
pub use scheduler::{Scheduler, SchedulerEvent, StopReason, TaskHandle};
pub use session::{
    HistoryRecord, MemoryStore, RoundSetup, RoundSummary, ScoreEntry, ScoreStore, Session,
    SessionConfig, SurvivalProgress,
};
pub use solver::{Solver, SolverKind, SolverStep};
pub use types::{
    AbortReason, ComplexValue, Difficulty, DifficultyProfile, GameMode, GuessRecord, Outcome,
};
