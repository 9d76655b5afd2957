//! Context and script validation.
//!
//! Validation runs before anything is built, so a bad file is reported as a
//! whole: every problem found is collected, and more than one is returned as
//! [`ValidationError::Multiple`].
//!
//! # Example
//!
//! ```rust
//! use sonant_config::{ContextConfig, ValidationError, validate_context};
//!
//! let config = ContextConfig { bpm: 0.0, ..ContextConfig::default() };
//! assert!(matches!(
//!     validate_context(&config),
//!     Err(ValidationError::OutOfRange { field: "bpm", .. })
//! ));
//! ```

use sonant_core::{Clock, Time, Units};
use thiserror::Error;

use crate::context_config::ContextConfig;
use crate::script::{AutomationScript, AutomationStep};

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Unknown units name.
    #[error("unknown units: {0}")]
    UnknownUnits(String),

    /// A context setting must be positive and finite.
    #[error("{field} must be positive, got {value}")]
    OutOfRange {
        /// Name of the setting.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// The script's render duration is missing, unparseable or not positive.
    #[error("invalid render duration '{0}'")]
    InvalidDuration(String),

    /// A step time or duration could not be resolved.
    #[error("step {step}: invalid time '{expr}'")]
    InvalidTime {
        /// Zero-based step index.
        step: usize,
        /// The expression as written.
        expr: String,
    },

    /// A time resolves before the start of the render.
    #[error("step {step}: time '{expr}' is negative")]
    NegativeTime {
        /// Zero-based step index.
        step: usize,
        /// The expression as written.
        expr: String,
    },

    /// A curve step has no points.
    #[error("step {0}: curve has no values")]
    EmptyCurve(usize),

    /// A target step's time constant is not finite.
    #[error("step {step}: time constant {value} is not finite")]
    InvalidTimeConstant {
        /// Zero-based step index.
        step: usize,
        /// The rejected value.
        value: f64,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Parses a units name, accepting the same aliases as configuration files.
pub fn validate_units(name: &str) -> ValidationResult<Units> {
    name.parse()
        .map_err(|_| ValidationError::UnknownUnits(name.to_string()))
}

/// Validates context settings: sample rate, tempo, meter and PPQ must all be
/// positive.
pub fn validate_context(config: &ContextConfig) -> ValidationResult<()> {
    let mut errors = Vec::new();
    for (field, value) in [
        ("sample_rate", f64::from(config.sample_rate)),
        ("bpm", config.bpm),
        ("beats_per_bar", config.beats_per_bar),
        ("ppq", config.ppq),
    ] {
        if !(value.is_finite() && value > 0.0) {
            errors.push(ValidationError::OutOfRange { field, value });
        }
    }
    collect(errors)
}

/// Validates a script against the clock it will be rendered with.
///
/// Checks the render duration and every step's times, durations, curve
/// points and time constants. Values are checked when the script is applied.
pub fn validate_script(script: &AutomationScript, clock: &Clock) -> ValidationResult<()> {
    let mut errors = Vec::new();

    match clock.duration(&script.duration) {
        Ok(d) if d.is_finite() && d > 0.0 => {}
        _ => errors.push(ValidationError::InvalidDuration(script.duration.to_string())),
    }

    for (step, event) in script.events.iter().enumerate() {
        match event {
            AutomationStep::Set { time, .. }
            | AutomationStep::Linear { time, .. }
            | AutomationStep::Exponential { time, .. }
            | AutomationStep::Cancel { time } => {
                errors.extend(check_time(clock, step, time, false));
            }
            AutomationStep::RampTo { duration, .. } => {
                errors.extend(check_time(clock, step, duration, true));
            }
            AutomationStep::Target {
                time,
                time_constant,
                ..
            } => {
                errors.extend(check_time(clock, step, time, false));
                if !time_constant.is_finite() {
                    errors.push(ValidationError::InvalidTimeConstant {
                        step,
                        value: *time_constant,
                    });
                }
            }
            AutomationStep::Curve {
                values,
                time,
                duration,
            } => {
                errors.extend(check_time(clock, step, time, false));
                errors.extend(check_time(clock, step, duration, true));
                if values.is_empty() {
                    errors.push(ValidationError::EmptyCurve(step));
                }
            }
        }
    }

    collect(errors)
}

/// A step time (or, with `span`, a duration) that does not resolve to a
/// finite, non-negative number of seconds.
fn check_time(clock: &Clock, step: usize, time: &Time, span: bool) -> Option<ValidationError> {
    let resolved = if span {
        clock.duration(time)
    } else {
        clock.resolve(time)
    };
    match resolved {
        Ok(t) if t.is_finite() && t >= 0.0 => None,
        Ok(_) => Some(ValidationError::NegativeTime {
            step,
            expr: time.to_string(),
        }),
        Err(_) => Some(ValidationError::InvalidTime {
            step,
            expr: time.to_string(),
        }),
    }
}

fn collect(mut errors: Vec<ValidationError>) -> ValidationResult<()> {
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sonant_core::Value;

    fn script(events: Vec<AutomationStep>) -> AutomationScript {
        AutomationScript {
            events,
            ..AutomationScript::new("test", Time::from(1.0))
        }
    }

    #[test]
    fn test_units_names_and_aliases() {
        assert_eq!(validate_units("frequency").unwrap(), Units::Frequency);
        assert_eq!(validate_units("dB").unwrap(), Units::Decibels);
        assert_eq!(
            validate_units("lumens"),
            Err(ValidationError::UnknownUnits("lumens".to_string()))
        );
    }

    #[test]
    fn test_default_context_is_valid() {
        assert!(validate_context(&ContextConfig::default()).is_ok());
    }

    #[test]
    fn test_context_collects_every_problem() {
        let config = ContextConfig {
            sample_rate: 0,
            bpm: f64::NAN,
            beats_per_bar: 4.0,
            ppq: -1.0,
        };
        match validate_context(&config) {
            Err(ValidationError::Multiple(errors)) => assert_eq!(errors.len(), 3),
            other => panic!("expected multiple errors, got {other:?}"),
        }
    }

    #[test]
    fn test_script_duration_must_be_positive() {
        let clock = Clock::default();
        let mut s = script(Vec::new());
        s.duration = Time::from("0");
        assert!(matches!(
            validate_script(&s, &clock),
            Err(ValidationError::InvalidDuration(_))
        ));
        s.duration = Time::from("2m");
        assert!(validate_script(&s, &clock).is_ok());
    }

    #[test]
    fn test_step_errors_carry_index() {
        let clock = Clock::default();
        let s = script(vec![
            AutomationStep::Set {
                value: Value::from(1.0),
                time: Time::from(0.0),
            },
            AutomationStep::Curve {
                values: Vec::new(),
                time: Time::from("soon"),
                duration: Time::from(1.0),
            },
            AutomationStep::Target {
                value: Value::from(0.0),
                time: Time::from(-1.0),
                time_constant: f64::INFINITY,
            },
        ]);
        match validate_script(&s, &clock) {
            Err(ValidationError::Multiple(errors)) => {
                assert!(errors.contains(&ValidationError::InvalidTime {
                    step: 1,
                    expr: "soon".to_string()
                }));
                assert!(errors.contains(&ValidationError::EmptyCurve(1)));
                assert!(errors.contains(&ValidationError::NegativeTime {
                    step: 2,
                    expr: "-1".to_string()
                }));
                assert!(errors.iter().any(|e| matches!(
                    e,
                    ValidationError::InvalidTimeConstant { step: 2, .. }
                )));
            }
            other => panic!("expected multiple errors, got {other:?}"),
        }
    }

    #[test]
    fn test_multiple_display_joins_messages() {
        let err = ValidationError::Multiple(vec![
            ValidationError::EmptyCurve(0),
            ValidationError::UnknownUnits("x".to_string()),
        ]);
        assert_eq!(
            err.to_string(),
            "multiple validation errors: step 0: curve has no values; unknown units: x"
        );
    }
}
