//! Testflow - a declarative YAML test-step orchestration engine
//!
//! Takes an ordered list of named steps, resolves each to a registered
//! action, evaluates the step's property tree against the mutable run
//! state, executes the action, and records outcomes - aborting the run on
//! the first failure while guaranteeing resource cleanup.

pub mod actions;
pub mod cli;
pub mod commands;
pub mod common;
pub mod engine;
pub mod model;
pub mod provider;
pub mod screenshot;

// Re-export commonly used types for tests and embedders
pub use common::{Config, Error, Result};
pub use engine::{default_registry, Engine};
pub use model::{Test, TestStep};
