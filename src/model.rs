//! Test definition types
//!
//! Defines the data structures for deserializing YAML test definitions.
//! A test is immutable once loaded; step properties are re-evaluated fresh
//! against the run state on every execution.

use serde::Deserialize;
use serde_yaml::{Mapping, Value};

/// The raw, possibly-nested configuration data attached to a step
pub type PropertyTree = Value;

/// A complete test loaded from a provider
#[derive(Deserialize, Debug, Clone)]
pub struct Test {
    /// Name of the test
    pub name: String,
    /// Page objects seeded into the variable store before the first step
    #[serde(default)]
    pub pages: Option<Mapping>,
    /// The ordered sequence of steps to execute
    #[serde(default)]
    pub steps: Vec<TestStep>,
}

/// A single step in the execution flow
#[derive(Deserialize, Debug, Clone)]
pub struct TestStep {
    /// Action alias to execute (e.g. "set-variable", "click")
    #[serde(rename = "type")]
    pub step_type: String,
    /// Display name; defaulted from the action's metadata when absent
    #[serde(default)]
    pub name: Option<String>,
    /// Raw property tree handed to the evaluator chain before execution
    #[serde(default)]
    pub properties: PropertyTree,
    /// Variable name the action's return value is stored under
    #[serde(default)]
    pub result: Option<String>,
    /// Nested sub-steps, used by control-flow actions
    #[serde(default)]
    pub steps: Vec<TestStep>,
}
