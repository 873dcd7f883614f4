//! Threshold expressions such as `>=80%`, `<100m`, `=10m/s` or `>32c`.
//!
//! Grammar (case-insensitive, no whitespace): `<comparator><number><unit>`.
//!
//! | unit             | kind        | value stored as        |
//! |------------------|-------------|------------------------|
//! | `%`              | Percent     | the number             |
//! | `b k m g t`      | Size        | bytes                  |
//! | size unit + `/s` | Speed       | bytes per second       |
//! | `c`              | Temperature | degrees celsius        |

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::size::Size;
use crate::error::{ParseError, RuleError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Comparator {
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
}

impl Comparator {
    /// Comparators ordered so that two-character forms are tried first.
    const PREFIXES: [(&'static str, Comparator); 5] = [
        ("<=", Comparator::Le),
        (">=", Comparator::Ge),
        ("<", Comparator::Lt),
        (">", Comparator::Gt),
        ("=", Comparator::Eq),
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Comparator::Lt => "<",
            Comparator::Le => "<=",
            Comparator::Eq => "=",
            Comparator::Ge => ">=",
            Comparator::Gt => ">",
        }
    }

    /// Plain IEEE comparison; `Eq` is exact equality.
    pub fn compare(self, current: f64, threshold: f64) -> bool {
        match self {
            Comparator::Lt => current < threshold,
            Comparator::Le => current <= threshold,
            Comparator::Eq => current == threshold,
            Comparator::Ge => current >= threshold,
            Comparator::Gt => current > threshold,
        }
    }

    fn split(expr: &str) -> Option<(Comparator, &str)> {
        Self::PREFIXES
            .iter()
            .find_map(|(prefix, cmp)| expr.strip_prefix(prefix).map(|rest| (*cmp, rest)))
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdKind {
    Percent,
    Size,
    Speed,
    Temperature,
}

impl ThresholdKind {
    pub fn name(self) -> &'static str {
        match self {
            ThresholdKind::Percent => "percent",
            ThresholdKind::Size => "size",
            ThresholdKind::Speed => "speed",
            ThresholdKind::Temperature => "temperature",
        }
    }
}

impl fmt::Display for ThresholdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A live metric value tagged with what it measures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    /// 0-100
    Percent(f64),
    Size(Size),
    /// Bytes per second.
    Speed(Size),
    /// Degrees celsius.
    Temperature(f64),
}

impl Reading {
    pub fn kind(&self) -> ThresholdKind {
        match self {
            Reading::Percent(_) => ThresholdKind::Percent,
            Reading::Size(_) => ThresholdKind::Size,
            Reading::Speed(_) => ThresholdKind::Speed,
            Reading::Temperature(_) => ThresholdKind::Temperature,
        }
    }

    pub fn value(&self) -> f64 {
        match *self {
            Reading::Percent(v) | Reading::Temperature(v) => v,
            Reading::Size(s) | Reading::Speed(s) => s.as_f64(),
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Percent(v) => write!(f, "{:.2}%", v),
            Reading::Size(s) => write!(f, "{}", s),
            Reading::Speed(s) => write!(f, "{}/s", s),
            Reading::Temperature(v) => write!(f, "{:.2}°C", v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Threshold {
    pub kind: ThresholdKind,
    pub value: f64,
    pub comparator: Comparator,
}

impl Threshold {
    pub fn parse(expr: &str) -> Result<Threshold, ParseError> {
        let normalized = expr.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(ParseError::Empty);
        }

        let (comparator, rest) =
            Comparator::split(&normalized).ok_or_else(|| ParseError::Comparator(expr.to_string()))?;
        if rest.is_empty() {
            return Err(ParseError::TooShort(expr.to_string()));
        }

        let (kind, value) = if let Some(number) = rest.strip_suffix('%') {
            (ThresholdKind::Percent, parse_number(number, expr)?)
        } else if let Some(size) = rest.strip_suffix("/s") {
            (ThresholdKind::Speed, parse_size(size, expr)?)
        } else if rest.ends_with(['b', 'k', 'm', 'g', 't']) {
            (ThresholdKind::Size, parse_size(rest, expr)?)
        } else if let Some(number) = rest.strip_suffix('c') {
            (ThresholdKind::Temperature, parse_number(number, expr)?)
        } else {
            return Err(ParseError::Unit(expr.to_string()));
        };

        Ok(Threshold {
            kind,
            value,
            comparator,
        })
    }

    /// Compare a live reading against this threshold.
    ///
    /// A reading of a different kind is a configuration error, never `false`.
    pub fn evaluate(&self, current: &Reading) -> Result<bool, RuleError> {
        if current.kind() != self.kind {
            return Err(RuleError::TypeMismatch {
                expected: self.kind,
                found: current.kind(),
            });
        }
        Ok(self.comparator.compare(current.value(), self.value))
    }
}

fn parse_number(number: &str, expr: &str) -> Result<f64, ParseError> {
    if number.is_empty() {
        return Err(ParseError::TooShort(expr.to_string()));
    }
    number
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ParseError::Number(expr.to_string()))
}

fn parse_size(number: &str, expr: &str) -> Result<f64, ParseError> {
    if number.is_empty() {
        return Err(ParseError::TooShort(expr.to_string()));
    }
    Size::parse(number).map(Size::as_f64).map_err(|e| match e {
        ParseError::Unit(_) => ParseError::Unit(expr.to_string()),
        _ => ParseError::Number(expr.to_string()),
    })
}

impl FromStr for Threshold {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Threshold::parse(s)
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ThresholdKind::Percent => write!(f, "{}{}%", self.comparator, self.value),
            ThresholdKind::Temperature => write!(f, "{}{}c", self.comparator, self.value),
            ThresholdKind::Size => write!(f, "{}{}", self.comparator, Size(self.value as u64)),
            ThresholdKind::Speed => write!(f, "{}{}/s", self.comparator, Size(self.value as u64)),
        }
    }
}
