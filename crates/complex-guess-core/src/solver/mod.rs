//! Automated guessing strategies
//!
//! A [`Solver`] is chosen once when a round starts and is driven by the
//! [`Scheduler`](crate::Scheduler) at a fixed cadence. The two variants trade
//! completeness for speed:
//! - [`SpiralSolver`]: deterministic full sweep, only for small ranges
//! - [`AdaptiveSolver`]: randomized search steered by magnitude feedback

mod adaptive;
mod spiral;

pub use adaptive::AdaptiveSolver;
pub use spiral::{spiral_offsets, SpiralSolver, SPIRAL_MAX_RADIUS};

use crate::{ComplexValue, RoundState, SolverError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a solver produced for the next step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverStep {
    Guess(ComplexValue),
    /// No guesses left; the round ends as lost on attempts
    Exhausted,
}

/// Which strategy to attach to a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SolverKind {
    Spiral,
    Adaptive,
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverKind::Spiral => f.write_str("deterministic spiral"),
            SolverKind::Adaptive => f.write_str("adaptive search"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Solver {
    Spiral(SpiralSolver),
    Adaptive(AdaptiveSolver),
}

impl Solver {
    /// Build a solver sized to the round's range
    pub fn for_round(
        kind: SolverKind,
        round: &RoundState,
        seed: Option<u64>,
    ) -> Result<Self, SolverError> {
        let range = round.profile().range;
        match kind {
            SolverKind::Spiral => Ok(Solver::Spiral(SpiralSolver::new(range)?)),
            SolverKind::Adaptive => Ok(Solver::Adaptive(match seed {
                Some(seed) => AdaptiveSolver::with_seed(range, seed),
                None => AdaptiveSolver::new(range),
            })),
        }
    }

    pub fn kind(&self) -> SolverKind {
        match self {
            Solver::Spiral(_) => SolverKind::Spiral,
            Solver::Adaptive(_) => SolverKind::Adaptive,
        }
    }

    /// Short label for logs and the status line
    pub fn name(&self) -> &'static str {
        match self {
            Solver::Spiral(_) => "spiral",
            Solver::Adaptive(_) => "adaptive",
        }
    }

    pub fn next_guess(&mut self) -> SolverStep {
        match self {
            Solver::Spiral(solver) => solver.next_guess(),
            Solver::Adaptive(solver) => SolverStep::Guess(solver.next_guess()),
        }
    }

    /// Feed back the round state after a guess has been scored
    pub fn observe(&mut self, guess: ComplexValue, round: &RoundState) {
        match self {
            Solver::Spiral(_) => {}
            Solver::Adaptive(solver) => solver.observe(guess, round.target_magnitude()),
        }
    }
}
