//! Variable store for a single test run
//!
//! Holds the live state of a run: initial inputs, page objects, step
//! results, and the step-counter bookkeeping used for artifact naming.
//! Expressions such as `user.name` or `items.0` resolve by walking the
//! stored value along dotted path segments.

use std::collections::HashMap;

use serde_yaml::{Mapping, Value};

use crate::common::{Error, Result};

/// Reserved variable holding the active step path (e.g. `"3.2"`)
pub const STEP_PATH_VARIABLE: &str = "test_step";

/// Ordered key/value state of one test run
#[derive(Debug, Default, Clone)]
pub struct VariableStore {
    values: HashMap<String, Value>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value under a name, replacing any previous value
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Look up a variable by exact name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Record the active step path under [`STEP_PATH_VARIABLE`]
    pub fn set_step_path(&mut self, path: &str) {
        self.set(STEP_PATH_VARIABLE, Value::String(path.to_string()));
    }

    /// The active step path, if a step is executing
    pub fn step_path(&self) -> Option<&str> {
        match self.get(STEP_PATH_VARIABLE) {
            Some(Value::String(path)) => Some(path),
            _ => None,
        }
    }

    /// Seed the store from a test's `pages` mapping
    ///
    /// Each top-level page entry becomes a variable, so `$home.url` resolves
    /// after seeding `pages: {home: {url: ...}}`.
    pub fn seed_pages(&mut self, pages: &Mapping) {
        for (key, value) in pages {
            if let Value::String(name) = key {
                self.set(name.clone(), value.clone());
            }
        }
    }

    /// Resolve a dotted-path expression against the store
    ///
    /// The first segment names a variable; the remaining segments index into
    /// nested mappings (by key) and sequences (by 0-based position).
    pub fn resolve(&self, expression: &str) -> Result<Value> {
        let mut segments = expression.split('.');

        let root = segments
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::UnresolvedExpression(expression.to_string()))?;

        let mut current = self
            .get(root)
            .ok_or_else(|| Error::UnresolvedExpression(expression.to_string()))?;

        for segment in segments {
            current = match current {
                Value::Mapping(map) => map.get(&Value::String(segment.to_string())),
                Value::Sequence(seq) => segment.parse::<usize>().ok().and_then(|i| seq.get(i)),
                _ => None,
            }
            .ok_or_else(|| Error::UnresolvedExpression(expression.to_string()))?;
        }

        Ok(current.clone())
    }
}
