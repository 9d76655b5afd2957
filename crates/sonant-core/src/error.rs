//! Error types for signal scheduling.

use thiserror::Error;

use crate::graph::GraphError;

/// Errors surfaced by [`Signal`](crate::Signal) and operator calls.
///
/// Every variant is a configuration error: the call is rejected before anything
/// reaches the engine's timeline, and retrying the same call fails the same way.
/// Exponential-domain violations (zero or negative targets) are not errors; they
/// are floored to [`MIN_OUTPUT`](crate::MIN_OUTPUT).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SignalError {
    /// A value was NaN, or converted to a non-finite raw value.
    #[error("value {value} is not finite")]
    NonFinite {
        /// The offending value (semantic or raw).
        value: f64,
    },

    /// A time resolved to a point before the engine's time origin.
    #[error("time {time} resolves before the time origin")]
    NegativeTime {
        /// The resolved time in seconds.
        time: f64,
    },

    /// A time expression could not be parsed.
    #[error("invalid time expression: {0}")]
    InvalidTime(String),

    /// A frequency or pitch expression could not be parsed.
    #[error("invalid frequency expression: {0}")]
    InvalidFrequency(String),

    /// A textual value was given for units that only accept numbers.
    #[error("'{expr}' is not a valid {units} value")]
    InvalidValue {
        /// The expression as written.
        expr: String,
        /// Units the value was converted for.
        units: crate::Units,
    },

    /// A value curve had no points.
    #[error("value curve must contain at least one point")]
    EmptyCurve,

    /// A duration was zero or negative where a positive span is required.
    #[error("duration {0} must be positive")]
    InvalidDuration(f64),

    /// The underlying graph rejected the operation.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Convenience result type for signal operations.
pub type Result<T> = core::result::Result<T, SignalError>;

/// Rejects NaN and infinities.
pub(crate) fn ensure_finite(value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SignalError::NonFinite { value })
    }
}

/// Rejects resolved times before zero (and non-finite times).
pub(crate) fn ensure_time(time: f64) -> Result<f64> {
    let time = ensure_finite(time)?;
    if time < 0.0 {
        Err(SignalError::NegativeTime { time })
    } else {
        Ok(time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finite_values_pass_through() {
        assert_eq!(ensure_finite(1.5), Ok(1.5));
        assert_eq!(ensure_finite(-0.0), Ok(-0.0));
    }

    #[test]
    fn nan_and_infinity_rejected() {
        assert!(matches!(
            ensure_finite(f64::NAN),
            Err(SignalError::NonFinite { .. })
        ));
        assert!(matches!(
            ensure_finite(f64::INFINITY),
            Err(SignalError::NonFinite { .. })
        ));
    }

    #[test]
    fn negative_time_rejected() {
        assert_eq!(ensure_time(0.0), Ok(0.0));
        assert_eq!(
            ensure_time(-0.25),
            Err(SignalError::NegativeTime { time: -0.25 })
        );
    }

    #[test]
    fn display_messages() {
        assert_eq!(
            SignalError::InvalidTime("4q".to_string()).to_string(),
            "invalid time expression: 4q"
        );
        assert_eq!(
            SignalError::InvalidDuration(0.0).to_string(),
            "duration 0 must be positive"
        );
    }
}
