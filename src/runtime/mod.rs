//! Application lifecycle and execution modes
//!
//! - `lifetime`: startup context and shutdown signal
//! - `modes`: one entry point per CLI command group

pub mod lifetime;
pub mod modes;
