//! Discovery runs.
//!
//! This module provides:
//! - The run orchestrator over queries, search pages and candidate URLs
//! - Per-query and per-run reports

mod report;
mod runner;

#[cfg(test)]
mod integration_tests;

pub use report::{QueryReport, RunReport, StopReason};
pub use runner::{MentionScout, RunContext};
