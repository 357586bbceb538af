//! Feedback policy: magnitude direction plus periodic component hints

use crate::ComplexValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a wrong guess, compared by magnitude
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MagnitudeHint {
    TooLow,
    TooHigh,
}

impl fmt::Display for MagnitudeHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MagnitudeHint::TooLow => f.write_str("Magnitude is TOO LOW."),
            MagnitudeHint::TooHigh => f.write_str("Magnitude is TOO HIGH."),
        }
    }
}

/// Equal magnitudes report `TooHigh`; an exact hit is a win and never reaches here.
pub fn magnitude_hint(target_magnitude: f64, guess_magnitude: f64) -> MagnitudeHint {
    if guess_magnitude < target_magnitude {
        MagnitudeHint::TooLow
    } else {
        MagnitudeHint::TooHigh
    }
}

/// Component hint for the target, revealed on even attempt counts or on request
pub fn component_hint(target: ComplexValue, attempts_used: u32, forced: bool) -> Option<String> {
    if attempts_used % 2 != 0 && !forced {
        return None;
    }

    let mut hints = Vec::with_capacity(2);
    hints.push(if target.real % 2 == 0 {
        "Real part is even"
    } else {
        "Real part is odd"
    });
    if is_prime(target.imag) {
        hints.push("Imaginary part is prime");
    }

    Some(format!("Hint: {}", hints.join(", ")))
}

/// Primality of `|n|`; 0 and 1 are not prime
pub fn is_prime(n: i64) -> bool {
    let n = n.unsigned_abs();
    if n < 2 {
        return false;
    }
    let mut i = 2u64;
    while i * i <= n {
        if n % i == 0 {
            return false;
        }
        i += 1;
    }
    true
}
