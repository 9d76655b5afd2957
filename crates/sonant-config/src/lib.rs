//! Configuration for sonant signals.
//!
//! This crate loads the settings a [`sonant_core::Context`] is built from and
//! the declarative automation scripts the `sonant` CLI renders.
//!
//! # Features
//!
//! - **Context settings**: Sample rate, tempo, meter and PPQ from TOML
//! - **Automation scripts**: A signal's units, resting value and scheduling steps
//! - **Validation**: Every problem in a file reported at once
//!
//! # Example
//!
//! ```rust
//! use sonant_config::{AutomationScript, ContextConfig};
//!
//! let script = AutomationScript::from_toml(r#"
//! name = "swell"
//! units = "decibels"
//! initial = -60.0
//! duration = 1.0
//!
//! [[events]]
//! type = "ramp_to"
//! value = 0.0
//! duration = 0.5
//! "#).unwrap();
//!
//! let config = ContextConfig { sample_rate: 1000, ..ContextConfig::default() };
//! let out = script.render(&config).unwrap();
//! assert_eq!(out.len(), 1000);
//! assert!((out[999] - 1.0).abs() < 1e-9);
//! ```

mod context_config;
mod error;
mod script;
mod validation;

pub use context_config::ContextConfig;
pub use error::ConfigError;
pub use script::{AutomationScript, AutomationStep};
pub use validation::{
    ValidationError, ValidationResult, validate_context, validate_script, validate_units,
};
