//! Time expressions and their resolution to engine seconds.
//!
//! Scheduling calls accept a [`Time`]: either plain seconds or a textual
//! expression resolved against a [`Clock`] (tempo, meter and the engine's
//! current time).
//!
//! ## Expression Grammar
//!
//! | Form | Meaning | Example (120 BPM, 4/4) |
//! |------|---------|------------------------|
//! | `1.5` | seconds | 1.5 s |
//! | `+0.5` | relative to now | now + 0.5 s |
//! | `4n` | note value | 0.5 s |
//! | `8n.` | dotted note value | 0.375 s |
//! | `8t` | triplet note value | 0.1667 s |
//! | `2m` | measures | 4.0 s |
//! | `1:2:2` | bars:beats:sixteenths | 3.25 s |
//! | `96i` | ticks (PPQ) | 1.0 s at 48 PPQ |
//! | `4hz` | period of a frequency | 0.25 s |
//! | `250ms` | milliseconds | 0.25 s |
//! | `128samples` | sample frames | 128 / sample rate |
//!
//! Terms may be summed: `"1m + 4n"`. A leading `+` makes the whole sum
//! relative to [`Clock::now`].
//!
//! ```rust
//! use sonant_core::{Clock, Time};
//!
//! let clock = Clock::default().at(2.0);
//! assert_eq!(clock.resolve(&Time::from("4n")).unwrap(), 0.5);
//! assert_eq!(clock.resolve(&Time::from("+4n")).unwrap(), 2.5);
//! assert_eq!(clock.resolve(&Time::from("1m + 4n")).unwrap(), 2.5);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, SignalError};

/// Default tempo in beats per minute.
pub const DEFAULT_BPM: f64 = 120.0;

/// Default ticks per quarter note.
pub const DEFAULT_PPQ: f64 = 48.0;

/// A point in time or a span, as given by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Time {
    /// Seconds on the engine clock.
    Seconds(f64),
    /// A textual expression (see the module docs).
    Expr(String),
}

impl From<f64> for Time {
    fn from(seconds: f64) -> Self {
        Time::Seconds(seconds)
    }
}

impl From<f32> for Time {
    fn from(seconds: f32) -> Self {
        Time::Seconds(f64::from(seconds))
    }
}

impl From<i32> for Time {
    fn from(seconds: i32) -> Self {
        Time::Seconds(f64::from(seconds))
    }
}

impl From<&str> for Time {
    fn from(expr: &str) -> Self {
        Time::Expr(expr.to_string())
    }
}

impl From<String> for Time {
    fn from(expr: String) -> Self {
        Time::Expr(expr)
    }
}

impl core::fmt::Display for Time {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Time::Seconds(s) => write!(f, "{s}"),
            Time::Expr(e) => f.write_str(e),
        }
    }
}

/// Tempo and meter used to interpret musical time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeBase {
    /// Tempo in beats (quarter notes) per minute.
    pub bpm: f64,
    /// Quarter-note beats in one measure.
    pub beats_per_bar: f64,
    /// Ticks per quarter note.
    pub ppq: f64,
}

impl TimeBase {
    /// Seconds per quarter-note beat.
    #[inline]
    pub fn beat_seconds(&self) -> f64 {
        60.0 / self.bpm
    }
}

impl Default for TimeBase {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            beats_per_bar: 4.0,
            ppq: DEFAULT_PPQ,
        }
    }
}

/// Snapshot of everything needed to turn expressions into seconds.
///
/// Obtained from [`Context::clock`](crate::Context::clock); cheap to copy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clock {
    /// Tempo and meter.
    pub time_base: TimeBase,
    /// Current engine time in seconds.
    pub now: f64,
    /// Engine sample rate in Hz.
    pub sample_rate: f64,
}

impl Default for Clock {
    fn default() -> Self {
        Self {
            time_base: TimeBase::default(),
            now: 0.0,
            sample_rate: 44100.0,
        }
    }
}

impl Clock {
    /// Returns a copy of this clock positioned at `now`.
    pub fn at(mut self, now: f64) -> Self {
        self.now = now;
        self
    }

    /// Resolves a time to absolute engine seconds.
    ///
    /// Plain seconds and unprefixed expressions are absolute; a leading `+`
    /// offsets from [`now`](Self::now). The result is not range checked.
    pub fn resolve(&self, time: &Time) -> Result<f64> {
        match time {
            Time::Seconds(s) => Ok(*s),
            Time::Expr(expr) => {
                let trimmed = expr.trim();
                match trimmed.strip_prefix('+') {
                    Some(rest) => Ok(self.now + self.span(rest)?),
                    None => self.span(trimmed),
                }
            }
        }
    }

    /// Resolves a time as a span in seconds. A leading `+` is ignored.
    pub fn duration(&self, time: &Time) -> Result<f64> {
        match time {
            Time::Seconds(s) => Ok(*s),
            Time::Expr(expr) => {
                let trimmed = expr.trim();
                self.span(trimmed.strip_prefix('+').unwrap_or(trimmed))
            }
        }
    }

    /// Seconds of a single term such as `4n` or `250ms`, or `None` if it is
    /// not a time term.
    pub fn term_seconds(&self, term: &str) -> Option<f64> {
        let term = term.trim().to_ascii_lowercase();
        if term.is_empty() {
            return None;
        }
        let beat = self.time_base.beat_seconds();

        if term.contains(':') {
            return self.transport_seconds(&term);
        }
        if let Some(n) = term.strip_suffix("samples") {
            return parse_number(n).map(|n| n / self.sample_rate);
        }
        if let Some(n) = term.strip_suffix("ms") {
            return parse_number(n).map(|n| n / 1000.0);
        }
        if let Some(n) = term.strip_suffix("hz") {
            return parse_number(n).filter(|&f| f > 0.0).map(|f| 1.0 / f);
        }
        if let Some(n) = term.strip_suffix("n.") {
            return note_beats(n).map(|b| b * 1.5 * beat);
        }
        if let Some(n) = term.strip_suffix('n') {
            return note_beats(n).map(|b| b * beat);
        }
        if let Some(n) = term.strip_suffix('t') {
            return note_beats(n).map(|b| b * (2.0 / 3.0) * beat);
        }
        if let Some(n) = term.strip_suffix('m') {
            return parse_number(n).map(|m| m * self.time_base.beats_per_bar * beat);
        }
        if let Some(n) = term.strip_suffix('i') {
            return parse_number(n).map(|ticks| ticks / self.time_base.ppq * beat);
        }
        if let Some(n) = term.strip_suffix('s') {
            return parse_number(n);
        }
        parse_number(&term)
    }

    fn span(&self, expr: &str) -> Result<f64> {
        if expr.is_empty() {
            return Err(SignalError::InvalidTime(expr.to_string()));
        }
        let mut total = 0.0;
        for term in split_terms(expr) {
            total += self
                .term_seconds(term)
                .ok_or_else(|| SignalError::InvalidTime(expr.to_string()))?;
        }
        Ok(total)
    }

    fn transport_seconds(&self, term: &str) -> Option<f64> {
        let mut parts = term.split(':');
        let bars = parse_number(parts.next()?)?;
        let beats = parse_number(parts.next()?)?;
        let sixteenths = match parts.next() {
            Some(s) => parse_number(s)?,
            None => 0.0,
        };
        if parts.next().is_some() {
            return None;
        }
        let total_beats = bars * self.time_base.beats_per_bar + beats + sixteenths / 4.0;
        Some(total_beats * self.time_base.beat_seconds())
    }
}

/// Splits a summed expression on `+`, except the sign of an exponent as in
/// `1e+3`.
fn split_terms(expr: &str) -> impl Iterator<Item = &str> {
    let bytes = expr.as_bytes();
    let mut start = 0;
    let mut pieces = Vec::new();
    for (i, &b) in bytes.iter().enumerate() {
        let exponent = i >= 2
            && matches!(bytes[i - 1], b'e' | b'E')
            && (bytes[i - 2].is_ascii_digit() || bytes[i - 2] == b'.');
        if b == b'+' && !exponent {
            pieces.push(&expr[start..i]);
            start = i + 1;
        }
    }
    pieces.push(&expr[start..]);
    pieces.into_iter()
}

/// Quarter-note beats in a `1/n` note; `n` must be positive.
fn note_beats(n: &str) -> Option<f64> {
    parse_number(n).filter(|&n| n > 0.0).map(|n| 4.0 / n)
}

fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}
