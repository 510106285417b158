//! Fairness-aware volunteer assignment for recurring organizational events.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
