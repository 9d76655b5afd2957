//! Declarative automation scripts.
//!
//! A script describes one [`Signal`]: its units, its resting value, and an
//! ordered list of scheduling steps. Rendering a script builds a context,
//! applies every step in order and records the signal's engine output.
//!
//! # Example TOML
//!
//! ```toml
//! name = "filter sweep"
//! units = "frequency"
//! initial = "A3"
//! duration = "2m"
//!
//! [[events]]
//! type = "set"
//! value = "A3"
//! time = 0.0
//!
//! [[events]]
//! type = "exponential"
//! value = "A6"
//! time = "1m"
//!
//! [[events]]
//! type = "target"
//! value = 220.0
//! time = "1m"
//! time_constant = 0.25
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use sonant_core::{Context, Signal, SignalError, SignalOptions, Time, Units, Value};

use crate::context_config::ContextConfig;
use crate::error::ConfigError;
use crate::validation::validate_script;

/// One scheduling call. Values are in the script's units; times accept
/// seconds or any time expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AutomationStep {
    /// Jump to `value` at `time`.
    Set {
        /// Target value.
        value: Value,
        /// When the jump happens.
        time: Time,
    },
    /// Linear ramp from the previous step, reaching `value` at `time`.
    Linear {
        /// Value at the end of the ramp.
        value: Value,
        /// End of the ramp.
        time: Time,
    },
    /// Exponential ramp from the previous step, reaching `value` at `time`.
    Exponential {
        /// Value at the end of the ramp.
        value: Value,
        /// End of the ramp.
        time: Time,
    },
    /// Ramp from the value at the render start over `duration`, with the
    /// curve shape chosen by the units.
    RampTo {
        /// Value at the end of the ramp.
        value: Value,
        /// Length of the ramp.
        duration: Time,
    },
    /// Exponential approach toward `value` starting at `time`.
    Target {
        /// Value approached.
        value: Value,
        /// Start of the approach.
        time: Time,
        /// Time constant in seconds.
        time_constant: f64,
    },
    /// Points spread evenly over `duration` from `time`.
    Curve {
        /// Curve points.
        values: Vec<Value>,
        /// Start of the curve.
        time: Time,
        /// Length of the curve.
        duration: Time,
    },
    /// Drop every step at or after `time`.
    Cancel {
        /// Cancellation time.
        time: Time,
    },
}

impl AutomationStep {
    /// Applies this step to a signal.
    pub fn apply(&self, signal: &mut Signal, ctx: &mut Context) -> Result<(), SignalError> {
        match self {
            AutomationStep::Set { value, time } => {
                signal.set_value_at_time(ctx, value.clone(), time.clone())
            }
            AutomationStep::Linear { value, time } => {
                signal.linear_ramp_to_value_at_time(ctx, value.clone(), time.clone())
            }
            AutomationStep::Exponential { value, time } => {
                signal.exponential_ramp_to_value_at_time(ctx, value.clone(), time.clone())
            }
            AutomationStep::RampTo { value, duration } => {
                signal.ramp_to(ctx, value.clone(), duration.clone())
            }
            AutomationStep::Target {
                value,
                time,
                time_constant,
            } => signal.set_target_at_time(ctx, value.clone(), time.clone(), *time_constant),
            AutomationStep::Curve {
                values,
                time,
                duration,
            } => signal.set_value_curve_at_time(
                ctx,
                values.iter().cloned(),
                time.clone(),
                duration.clone(),
            ),
            AutomationStep::Cancel { time } => signal.cancel_scheduled_values(ctx, time.clone()),
        }
    }
}

/// A named automation script for a single signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationScript {
    /// Script name, used in error messages.
    pub name: String,

    /// Optional description.
    #[serde(default)]
    pub description: String,

    /// Units of every value in the script.
    #[serde(default)]
    pub units: Units,

    /// When `false`, values pass through without unit conversion.
    #[serde(default = "default_convert")]
    pub convert: bool,

    /// Resting value before the first step.
    #[serde(default = "default_initial")]
    pub initial: Value,

    /// Length of the render.
    pub duration: Time,

    /// Steps, applied in order.
    #[serde(default)]
    pub events: Vec<AutomationStep>,
}

fn default_convert() -> bool {
    true
}

fn default_initial() -> Value {
    Value::Number(0.0)
}

impl AutomationScript {
    /// Create an empty script in default units.
    pub fn new(name: impl Into<String>, duration: impl Into<Time>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            units: Units::Default,
            convert: default_convert(),
            initial: default_initial(),
            duration: duration.into(),
            events: Vec::new(),
        }
    }

    /// Set the units.
    pub fn with_units(mut self, units: Units) -> Self {
        self.units = units;
        self
    }

    /// Set the resting value.
    pub fn with_initial(mut self, initial: impl Into<Value>) -> Self {
        self.initial = initial.into();
        self
    }

    /// Append a step.
    pub fn push(&mut self, step: AutomationStep) {
        self.events.push(step);
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if the script has no steps.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Load a script from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let script = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), name = %script.name, steps = script.len(), "loaded automation script");
        Ok(script)
    }

    /// Parse a script from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the script to a TOML file, creating the parent directory if
    /// needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        tracing::debug!(path = %path.display(), name = %self.name, "saved automation script");
        Ok(())
    }

    /// Serialize the script to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Creates the signal this script drives, at its resting value.
    pub fn build_signal(&self, ctx: &mut Context) -> Result<Signal, ConfigError> {
        Ok(Signal::with_options(
            ctx,
            SignalOptions {
                value: self.initial.clone(),
                units: self.units,
                convert: self.convert,
                param: None,
            },
        )?)
    }

    /// Applies every step to `signal`, stopping at the first rejected one.
    pub fn apply(&self, signal: &mut Signal, ctx: &mut Context) -> Result<(), ConfigError> {
        for (index, step) in self.events.iter().enumerate() {
            step.apply(signal, ctx)
                .map_err(|e| ConfigError::step(&self.name, index, e))?;
        }
        Ok(())
    }

    /// Number of frames rendered at `sample_rate`.
    pub fn frames(&self, ctx: &Context) -> Result<usize, ConfigError> {
        let seconds = ctx.clock().duration(&self.duration)?;
        Ok((seconds * ctx.sample_rate()).round().max(0.0) as usize)
    }

    /// Validates the script, renders it under `config` and returns the
    /// signal's engine-domain output, one value per frame.
    pub fn render(&self, config: &ContextConfig) -> Result<Vec<f64>, ConfigError> {
        let mut ctx = config.build_context()?;
        validate_script(self, &ctx.clock())?;

        let mut signal = self.build_signal(&mut ctx)?;
        self.apply(&mut signal, &mut ctx)?;

        let frames = self.frames(&ctx)?;
        tracing::debug!(name = %self.name, frames, sample_rate = config.sample_rate, "rendering automation script");
        Ok(ctx.render(frames, signal.output())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(sample_rate: u32) -> ContextConfig {
        ContextConfig {
            sample_rate,
            ..ContextConfig::default()
        }
    }

    #[test]
    fn test_parse_tagged_steps() {
        let script = AutomationScript::from_toml(
            r#"
name = "mixed"
units = "decibels"
duration = "1m"

[[events]]
type = "set"
value = -12
time = "4n"

[[events]]
type = "ramp_to"
value = 0.0
duration = "+2n"

[[events]]
type = "curve"
values = [0.0, -6.0, "-3"]
time = 1.0
duration = "8n"

[[events]]
type = "cancel"
time = 1.5
"#,
        )
        .unwrap();

        assert_eq!(script.units, Units::Decibels);
        assert!(script.convert);
        assert_eq!(script.initial, Value::Number(0.0));
        assert_eq!(script.len(), 4);
        assert_eq!(
            script.events[0],
            AutomationStep::Set {
                value: Value::Number(-12.0),
                time: Time::from("4n"),
            }
        );
        assert!(matches!(
            &script.events[2],
            AutomationStep::Curve { values, .. } if values.len() == 3
        ));
    }

    #[test]
    fn test_unknown_step_type_rejected() {
        let err = AutomationScript::from_toml(
            "name = \"x\"\nduration = 1.0\n[[events]]\ntype = \"wobble\"\ntime = 0.0\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut script = AutomationScript::new("round", "1m")
            .with_units(Units::Frequency)
            .with_initial("A4");
        script.push(AutomationStep::Exponential {
            value: Value::from(880.0),
            time: Time::from("2n"),
        });
        script.push(AutomationStep::Target {
            value: Value::from(110.0),
            time: Time::from(1.0),
            time_constant: 0.1,
        });

        let parsed = AutomationScript::from_toml(&script.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, script);
    }

    #[test]
    fn test_render_linear_ramp() {
        let mut script = AutomationScript::new("ramp", 1.0);
        script.push(AutomationStep::Set {
            value: Value::from(1.0),
            time: Time::from(0.0),
        });
        script.push(AutomationStep::Linear {
            value: Value::from(0.0),
            time: Time::from(1.0),
        });

        let out = script.render(&config(100)).unwrap();
        assert_eq!(out.len(), 100);
        assert!((out[0] - 1.0).abs() < 1e-9);
        assert!((out[50] - 0.5).abs() < 1e-9);
        assert!((out[99] - 0.01).abs() < 1e-9);
    }

    #[test]
    fn test_render_uses_units_conversion() {
        let script = AutomationScript::new("level", "4n")
            .with_units(Units::Decibels)
            .with_initial(-20.0);

        // 4n at 120 bpm is half a second.
        let out = script.render(&config(200)).unwrap();
        assert_eq!(out.len(), 100);
        assert!(out.iter().all(|&s| (s - 0.1).abs() < 1e-9));
    }

    #[test]
    fn test_exponential_to_zero_is_floored() {
        let mut script = AutomationScript::new("fade", 1.0).with_initial(1.0);
        script.push(AutomationStep::Set {
            value: Value::from(1.0),
            time: Time::from(0.0),
        });
        script.push(AutomationStep::Exponential {
            value: Value::from(0.0),
            time: Time::from(0.5),
        });

        let out = script.render(&config(100)).unwrap();
        assert!(out.iter().all(|&s| s > 0.0));
        assert!((out[75] - sonant_core::MIN_OUTPUT).abs() < 1e-12);
    }

    #[test]
    fn test_step_error_names_script_and_index() {
        let mut script = AutomationScript::new("bad", 1.0).with_units(Units::Frequency);
        script.push(AutomationStep::Set {
            value: Value::from(440.0),
            time: Time::from(0.0),
        });
        script.push(AutomationStep::Set {
            value: Value::from("not a pitch"),
            time: Time::from(0.5),
        });

        let err = script.render(&config(100)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Step { ref script, step: 1, .. } if script == "bad"
        ));
    }

    #[test]
    fn test_render_validates_before_scheduling() {
        let mut script = AutomationScript::new("empty curve", 1.0);
        script.push(AutomationStep::Curve {
            values: Vec::new(),
            time: Time::from(0.0),
            duration: Time::from(1.0),
        });
        let err = script.render(&config(100)).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
