//! Shared utilities for fraudscan integration tests.
//!
//! - `TestHarness` gives each test its own temp tree with fake analysis
//!   programs written as small `sh` scripts
//! - `ConfigBuilder` assembles a `Config` pointing at that tree

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::TestHarness;
