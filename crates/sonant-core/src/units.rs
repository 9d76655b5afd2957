//! Semantic units for signal values.
//!
//! A [`Signal`](crate::Signal) stores and schedules *raw* values, the numbers
//! the engine interpolates. Its [`Units`] tag decides how caller-facing values
//! map to and from that raw domain. This module is the only place where units
//! are interpreted.
//!
//! | Units | to raw | to semantic |
//! |-------|--------|-------------|
//! | `Time` | time expression → seconds | identity |
//! | `Frequency` | pitch expression → Hz | identity |
//! | `Decibels` | dB → linear gain | linear gain → dB |
//! | `NormalRange` | clamp to \[0, 1\] | identity |
//! | `AudioRange` | clamp to \[-1, 1\] | identity |
//! | `Positive` | clamp to \[0, ∞) | identity |
//! | `Default`, `Bpm` | identity | identity |
//!
//! ```rust
//! use sonant_core::{Clock, Units, Value};
//!
//! let clock = Clock::default();
//! let raw = Units::Decibels.to_raw(&Value::from(-6.0), &clock).unwrap();
//! assert!((raw - 0.501).abs() < 1e-3);
//! assert!((Units::Decibels.to_semantic(raw) + 6.0).abs() < 1e-9);
//!
//! assert_eq!(Units::Frequency.to_raw(&Value::from("A4"), &clock).unwrap(), 440.0);
//! assert_eq!(Units::NormalRange.to_raw(&Value::from(1.7), &clock).unwrap(), 1.0);
//! ```

use core::str::FromStr;

use libm::{log10, pow};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SignalError};
use crate::time::{Clock, Time};

/// Semantic interpretation of a signal's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Units {
    /// Plain number.
    #[default]
    Default,
    /// Seconds, written as any time expression.
    Time,
    /// Hz, written as a number, note name or time expression.
    Frequency,
    /// Decibels over a linear gain.
    Decibels,
    /// Values in \[0, 1\].
    NormalRange,
    /// Values in \[-1, 1\].
    AudioRange,
    /// Values in \[0, ∞).
    Positive,
    /// Beats per minute.
    Bpm,
}

impl Units {
    /// Every unit tag, in declaration order.
    pub const ALL: [Units; 8] = [
        Units::Default,
        Units::Time,
        Units::Frequency,
        Units::Decibels,
        Units::NormalRange,
        Units::AudioRange,
        Units::Positive,
        Units::Bpm,
    ];

    /// Stable lowercase name, as used in configuration files.
    pub fn name(self) -> &'static str {
        match self {
            Units::Default => "default",
            Units::Time => "time",
            Units::Frequency => "frequency",
            Units::Decibels => "decibels",
            Units::NormalRange => "normal_range",
            Units::AudioRange => "audio_range",
            Units::Positive => "positive",
            Units::Bpm => "bpm",
        }
    }

    /// Converts a semantic value into the raw domain.
    ///
    /// Textual values are resolved for `Time` and `Frequency`; other units
    /// accept numeric strings only.
    pub fn to_raw(self, value: &Value, clock: &Clock) -> Result<f64> {
        match self {
            Units::Time => match value {
                Value::Number(n) => Ok(*n),
                Value::Expr(e) => clock.resolve(&Time::Expr(e.clone())),
            },
            Units::Frequency => match value {
                Value::Number(n) => Ok(*n),
                Value::Expr(e) => clock.frequency(e),
            },
            _ => Ok(self.number_to_raw(value.number(self)?)),
        }
    }

    /// Converts a raw engine value back into this unit's semantic domain.
    pub fn to_semantic(self, raw: f64) -> f64 {
        match self {
            Units::Decibels => gain_to_db(raw),
            _ => raw,
        }
    }

    /// Numeric half of [`to_raw`](Self::to_raw), for callers that already
    /// hold a number.
    pub fn number_to_raw(self, value: f64) -> f64 {
        match self {
            Units::Decibels => db_to_gain(value),
            Units::NormalRange => value.clamp(0.0, 1.0),
            Units::AudioRange => value.clamp(-1.0, 1.0),
            Units::Positive => value.max(0.0),
            Units::Default | Units::Time | Units::Frequency | Units::Bpm => value,
        }
    }
}

impl core::fmt::Display for Units {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown unit name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown units: {0}")]
pub struct UnknownUnits(pub String);

impl FromStr for Units {
    type Err = UnknownUnits;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Units::ALL
            .into_iter()
            .find(|u| u.name() == key)
            .or(match key.as_str() {
                "number" => Some(Units::Default),
                "db" => Some(Units::Decibels),
                "hz" => Some(Units::Frequency),
                "seconds" => Some(Units::Time),
                _ => None,
            })
            .ok_or_else(|| UnknownUnits(s.to_string()))
    }
}

/// A caller-facing value before unit conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// A number in the signal's semantic units.
    Number(f64),
    /// A textual expression such as `"4n"` or `"C#4"`.
    Expr(String),
}

impl Value {
    /// The numeric content, parsing numeric strings.
    fn number(&self, units: Units) -> Result<f64> {
        match self {
            Value::Number(n) => Ok(*n),
            Value::Expr(e) => e.trim().parse().map_err(|_| SignalError::InvalidValue {
                expr: e.clone(),
                units,
            }),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<&str> for Value {
    fn from(expr: &str) -> Self {
        Value::Expr(expr.to_string())
    }
}

impl From<String> for Value {
    fn from(expr: String) -> Self {
        Value::Expr(expr)
    }
}

/// Convert decibels to linear gain: `10^(dB/20)`.
///
/// `-inf` dB maps to silence (0.0).
#[inline]
pub fn db_to_gain(db: f64) -> f64 {
    pow(10.0, db / 20.0)
}

/// Convert linear gain to decibels: `20·log10(gain)`.
///
/// Silence (0.0) maps to `-inf`.
#[inline]
pub fn gain_to_db(gain: f64) -> f64 {
    20.0 * log10(gain)
}
