//! # chainwatch-observability
//!
//! `tracing` subscriber setup shared by every chainwatch binary: one global
//! level, per-crate overrides, text or JSON output.

pub mod tracing_setup;

pub use tracing_setup::{init_tracing, LogConfig};
