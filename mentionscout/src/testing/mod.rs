//! Testing utilities for discovery runs.
//!
//! This module provides:
//! - Scripted search providers and page fetchers
//! - A store that always fails
//! - Configuration and store fixtures

mod fixtures;
mod mocks;

pub use fixtures::{sample_config, StoreFixture};
pub use mocks::{FailingStore, ScriptedSearchProvider, StaticPageFetcher};
