//! Sonant Core - schedulable audio-rate signals and graph-composed operators
//!
//! This crate turns a write-only, sample-accurate engine parameter into a
//! typed value you can schedule, read back and connect like any other signal,
//! and builds higher-level operators by wiring primitive nodes instead of
//! writing per-sample code.
//!
//! # Core Abstractions
//!
//! ## Signals
//!
//! - [`Signal`] - Unit-aware value with set/ramp/target/curve/cancel scheduling
//! - [`SignalOptions`] - Initial value, units, conversion flag, driven parameter
//! - [`RampKind`] - Linear or exponential, picked from the units by [`Signal::ramp_to`]
//!
//! ## Units and Expressions
//!
//! - [`Units`] - Default, Time, Frequency, Decibels, NormalRange, AudioRange, Positive, Bpm
//! - [`Time`] / [`Clock`] - Seconds or musical time (`"4n"`, `"+1m"`, `"1:2:0"`)
//! - Pitch helpers: [`note_to_frequency`], [`midi_to_frequency`], [`frequency_to_note`]
//!
//! ## Automation
//!
//! - [`AutomationTimeline`] - Ordered events and their interpolation
//! - [`MIN_OUTPUT`] - Floor for exponential ramps and target approaches
//!
//! ## Engine and Context
//!
//! - [`Engine`] - Offline node graph rendered sample by sample
//! - [`PendingContext`] / [`Context`] - Engine readiness and the shared unity source
//!
//! ## Operators
//!
//! - [`SignalNode`] - Port interface shared by signals and operators
//! - [`Min`] / [`Max`] - Clamps built from a comparator and a gated switch
//!
//! # Example
//!
//! ```rust
//! use sonant_core::{Context, Min, Signal, Units};
//!
//! let mut ctx = Context::new(48000.0);
//!
//! // A decibel-valued signal stores linear gain.
//! let level = Signal::with_units(&mut ctx, -6.0, Units::Decibels).unwrap();
//! assert!((level.value(&ctx) + 6.0).abs() < 1e-9);
//!
//! // Clamp a signal to at most 0.25.
//! let min = Min::new(&mut ctx, 0.25).unwrap();
//! level.connect(&mut ctx, min.input()).unwrap();
//! let out = ctx.render(64, min.output()).unwrap();
//! assert!(out.iter().all(|&s| s == 0.25));
//! ```
//!
//! # Features
//!
//! - `tracing` - Emit `tracing` events for graph mutations, provider
//!   installation, signal lifecycle and exponential floors

pub mod automation;
pub mod context;
pub mod error;
pub mod graph;
pub mod operators;
pub mod pitch;
pub mod signal;
pub mod time;
pub mod units;

// Re-export main types at crate root
pub use automation::{AutomationEvent, AutomationTimeline, EventKind, MIN_OUTPUT, floor_output};
pub use context::{ConstantSource, Context, PendingContext, ProviderState};
pub use error::{Result, SignalError};
pub use graph::{CompareOp, EdgeId, Engine, GraphError, Inlet, NodeId, NodeKind, ParamId};
pub use operators::{Max, Min, SignalNode};
pub use pitch::{
    A4_HZ, frequency_to_midi, frequency_to_note, midi_to_frequency, note_to_frequency,
    note_to_midi,
};
pub use signal::{RampKind, Signal, SignalOptions};
pub use time::{Clock, DEFAULT_BPM, DEFAULT_PPQ, Time, TimeBase};
pub use units::{UnknownUnits, Units, Value, db_to_gain, gain_to_db};
