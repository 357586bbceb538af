//! Error types for the guessing core

use thiserror::Error;

/// Reasons a guess was not accepted. None of these consume an attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GuessError {
    #[error("Please enter valid integers for both real and imaginary parts")]
    InvalidInput,

    #[error("Both parts must be between -{range} and {range}")]
    OutOfRange { range: u32 },

    #[error("The round is over")]
    RoundOver,

    #[error("Submit is temporarily disabled")]
    InputLocked,

    #[error("No round in progress")]
    NoRound,
}

/// Errors raised when attaching a solver to a round
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SolverError {
    #[error("Solver only runs on ranges <= {ceiling} (got {range})")]
    RangeTooLarge { range: u32, ceiling: u32 },
}

/// Score storage failures
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage format error: {0}")]
    Format(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
