use crate::ComplexValue;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Magnitude-guided random search
///
/// Samples from a square whose half-width tracks the magnitude feedback:
/// overshooting pulls the radius toward the midpoint of the two magnitudes,
/// improving tightens it slightly and regressing widens it to escape local
/// traps. This is a heuristic with no convergence guarantee; running out of
/// attempts is a normal result.
#[derive(Debug, Clone)]
pub struct AdaptiveSolver {
    range: u32,
    current_radius: f64,
    last_magnitude_error: f64,
    rng: ChaCha8Rng,
}

const OVERSHOOT_DAMPING: f64 = 2.1;
const TIGHTEN: f64 = 0.98;
const WIDEN: f64 = 1.1;
const MAX_RADIUS_FACTOR: f64 = 1.5;

impl AdaptiveSolver {
    pub fn new(range: u32) -> Self {
        Self::with_rng(range, ChaCha8Rng::from_entropy())
    }

    pub fn with_seed(range: u32, seed: u64) -> Self {
        Self::with_rng(range, ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_rng(range: u32, rng: ChaCha8Rng) -> Self {
        Self {
            range,
            current_radius: range as f64,
            last_magnitude_error: f64::INFINITY,
            rng,
        }
    }

    pub fn current_radius(&self) -> f64 {
        self.current_radius
    }

    /// Draw uniformly from `[-ceil(r), ceil(r)]²`, clamped into the round's range
    pub fn next_guess(&mut self) -> ComplexValue {
        let r = self.current_radius.ceil() as i64;
        let real = self.rng.gen_range(-r..=r);
        let imag = self.rng.gen_range(-r..=r);
        ComplexValue::new(real, imag).clamped(self.range)
    }

    /// Update the radius after a guess has been scored
    pub fn observe(&mut self, guess: ComplexValue, target_magnitude: f64) {
        let guess_magnitude = guess.magnitude();
        if guess_magnitude > target_magnitude {
            self.current_radius = (target_magnitude + guess_magnitude) / OVERSHOOT_DAMPING;
        }

        let error = (guess_magnitude - target_magnitude).abs();
        if error < self.last_magnitude_error {
            self.current_radius *= TIGHTEN;
        } else {
            self.current_radius *= WIDEN;
        }
        self.last_magnitude_error = error;

        let upper = (self.range as f64 * MAX_RADIUS_FACTOR).max(1.0);
        self.current_radius = self.current_radius.clamp(1.0, upper);
    }
}
