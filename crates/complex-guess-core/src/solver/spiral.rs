use super::SolverStep;
use crate::{ComplexValue, SolverError};
use std::collections::{HashSet, VecDeque};

/// Largest range the spiral solver accepts
pub const SPIRAL_MAX_RADIUS: u32 = 30;

/// Deterministic square-spiral enumerator
///
/// Visits every lattice point of `[-r, r]²` exactly once, ring by ring in
/// increasing Chebyshev radius, so the number of guesses needed for a target
/// is known in advance.
#[derive(Debug, Clone)]
pub struct SpiralSolver {
    range: u32,
    remaining: VecDeque<ComplexValue>,
}

impl SpiralSolver {
    /// Precompute the sweep for a round of the given range
    pub fn new(range: u32) -> Result<Self, SolverError> {
        if range > SPIRAL_MAX_RADIUS {
            return Err(SolverError::RangeTooLarge {
                range,
                ceiling: SPIRAL_MAX_RADIUS,
            });
        }
        Ok(Self {
            range,
            remaining: spiral_offsets(range).into(),
        })
    }

    /// Pop the next offset, clamped into the active range
    pub fn next_guess(&mut self) -> SolverStep {
        match self.remaining.pop_front() {
            Some(offset) => SolverStep::Guess(offset.clamped(self.range)),
            None => SolverStep::Exhausted,
        }
    }

    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }
}

/// Ring-by-ring square spiral centred on the origin
///
/// Ring `r` walks the border of `[-r, r]²`: top row left to right, right
/// column downwards, bottom row right to left, left column upwards.
pub fn spiral_offsets(radius: u32) -> Vec<ComplexValue> {
    let radius = radius as i64;
    let side = 2 * radius + 1;
    let mut coords = Vec::with_capacity((side * side) as usize);

    for r in 0..=radius {
        if r == 0 {
            coords.push(ComplexValue::new(0, 0));
            continue;
        }
        for x in -r..=r {
            coords.push(ComplexValue::new(x, -r));
        }
        for y in (-r + 1)..=r {
            coords.push(ComplexValue::new(r, y));
        }
        for x in (-r..r).rev() {
            coords.push(ComplexValue::new(x, r));
        }
        for y in ((-r + 1)..r).rev() {
            coords.push(ComplexValue::new(-r, y));
        }
    }

    let mut seen = HashSet::with_capacity(coords.len());
    coords.retain(|c| c.within(radius as u32) && seen.insert(*c));
    coords
}
