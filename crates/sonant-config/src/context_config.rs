//! Context settings: sample rate, tempo and meter.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sonant_core::{Context, DEFAULT_BPM, DEFAULT_PPQ, TimeBase};

use crate::error::ConfigError;
use crate::validation::{ValidationResult, validate_context};

/// Settings used to build a [`Context`].
///
/// Every field has a default, so an empty file is a valid configuration.
///
/// # Example TOML
///
/// ```toml
/// sample_rate = 44100
/// bpm = 90.0
/// beats_per_bar = 3.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Engine sample rate in Hz.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Tempo in quarter-note beats per minute.
    #[serde(default = "default_bpm")]
    pub bpm: f64,

    /// Quarter-note beats per measure.
    #[serde(default = "default_beats_per_bar")]
    pub beats_per_bar: f64,

    /// Ticks per quarter note.
    #[serde(default = "default_ppq")]
    pub ppq: f64,
}

fn default_sample_rate() -> u32 {
    48000
}

fn default_bpm() -> f64 {
    DEFAULT_BPM
}

fn default_beats_per_bar() -> f64 {
    4.0
}

fn default_ppq() -> f64 {
    DEFAULT_PPQ
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            bpm: default_bpm(),
            beats_per_bar: default_beats_per_bar(),
            ppq: default_ppq(),
        }
    }
}

impl ContextConfig {
    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), sample_rate = config.sample_rate, bpm = config.bpm, "loaded context config");
        Ok(config)
    }

    /// Parse settings from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save settings to a TOML file, creating the parent directory if needed.
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
        tracing::debug!(path = %path.display(), "saved context config");
        Ok(())
    }

    /// Serialize settings to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Tempo, meter and PPQ as a [`TimeBase`].
    pub fn time_base(&self) -> TimeBase {
        TimeBase {
            bpm: self.bpm,
            beats_per_bar: self.beats_per_bar,
            ppq: self.ppq,
        }
    }

    /// Check that every setting is usable.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_context(self)
    }

    /// Validate and build a ready [`Context`].
    pub fn build_context(&self) -> Result<Context, ConfigError> {
        self.validate()?;
        Ok(Context::with_time_base(
            f64::from(self.sample_rate),
            self.time_base(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationError;
    use sonant_core::ProviderState;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = ContextConfig::from_toml("").unwrap();
        assert_eq!(config, ContextConfig::default());
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.bpm, 120.0);
        assert_eq!(config.beats_per_bar, 4.0);
        assert_eq!(config.ppq, 48.0);
    }

    #[test]
    fn test_partial_toml() {
        let config = ContextConfig::from_toml("bpm = 90.0\nbeats_per_bar = 3.0").unwrap();
        assert_eq!(config.bpm, 90.0);
        assert_eq!(config.beats_per_bar, 3.0);
        assert_eq!(config.sample_rate, 48000);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = ContextConfig {
            sample_rate: 44100,
            bpm: 140.0,
            beats_per_bar: 7.0,
            ppq: 96.0,
        };
        let parsed = ContextConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        let err = ContextConfig::from_toml("bpm = \"fast\"").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[test]
    fn test_build_context_applies_time_base() {
        let config = ContextConfig {
            bpm: 60.0,
            ..ContextConfig::default()
        };
        let ctx = config.build_context().unwrap();
        assert_eq!(ctx.state(), ProviderState::Ready);
        assert_eq!(ctx.sample_rate(), 48000.0);
        assert!((ctx.resolve("4n").unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_build_context_rejects_invalid() {
        let config = ContextConfig {
            sample_rate: 0,
            ..ContextConfig::default()
        };
        let err = config.build_context().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Validation(ValidationError::OutOfRange {
                field: "sample_rate",
                ..
            })
        ));
    }
}
