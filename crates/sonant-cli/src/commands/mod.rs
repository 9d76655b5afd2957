//! CLI command implementations.

pub mod clamp;
pub mod convert;
pub mod render;
