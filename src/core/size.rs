//! Byte counts with a compact human-readable notation (`"1.5 m"`, `"10g"`).

use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

const KILO: f64 = 1024.0;
const SUFFIXES: [char; 5] = ['b', 'k', 'm', 'g', 't'];

/// A size in bytes.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Size(pub u64);

impl Size {
    pub const ZERO: Size = Size(0);

    pub fn bytes(self) -> u64 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64
    }

    pub fn saturating_sub(self, other: Size) -> Size {
        Size(self.0.saturating_sub(other.0))
    }

    /// Rate of `delta` bytes spread over `elapsed`, truncated to whole bytes.
    pub fn per_second(delta: Size, elapsed: Duration) -> Size {
        let secs = elapsed.as_secs_f64();
        if secs <= 0.0 {
            return Size::ZERO;
        }
        Size((delta.as_f64() / secs) as u64)
    }

    /// Parse `"<number><suffix>"` where suffix is one of `b k m g t`
    /// (case-insensitive, powers of 1024). `"0"` needs no suffix.
    pub fn parse(s: &str) -> Result<Size, ParseError> {
        let normalized: String = s
            .split_whitespace()
            .collect::<String>()
            .to_lowercase();

        if normalized.is_empty() {
            return Err(ParseError::Empty);
        }
        if normalized == "0" {
            return Ok(Size::ZERO);
        }

        let Some(last) = normalized.chars().last() else {
            return Err(ParseError::Empty);
        };
        let Some(power) = SUFFIXES.iter().position(|&c| c == last) else {
            return Err(ParseError::Unit(s.to_string()));
        };

        let number = &normalized[..normalized.len() - last.len_utf8()];
        let value: f64 = number
            .parse()
            .map_err(|_| ParseError::Number(s.to_string()))?;
        if !value.is_finite() || value < 0.0 {
            return Err(ParseError::Number(s.to_string()));
        }

        Ok(Size((value * KILO.powi(power as i32)) as u64))
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut value = self.as_f64();
        let mut nth = 0;
        while value >= KILO && nth < SUFFIXES.len() - 1 {
            value /= KILO;
            nth += 1;
        }
        write!(f, "{:.1} {}", value, SUFFIXES[nth])
    }
}

impl FromStr for Size {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Size::parse(s)
    }
}

impl Add for Size {
    type Output = Size;

    fn add(self, rhs: Size) -> Size {
        Size(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Size {
    fn sum<I: Iterator<Item = Size>>(iter: I) -> Size {
        iter.fold(Size::ZERO, Add::add)
    }
}
