//! Action contract and registry
//!
//! An action is the external unit of work a step resolves to: it declares
//! its alias set, a default display name, and its required properties, and
//! executes asynchronously against the run state with an already-resolved
//! property tree.

pub mod builtin;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_yaml::Value;

use crate::common::{Error, Result};
use crate::engine::state::RunState;

/// Static metadata an action declares about itself
///
/// This is the explicit schema descriptor: required property names are
/// validated against the resolved tree before the action binds it.
#[derive(Debug, Clone, Copy)]
pub struct ActionMeta {
    /// Aliases usable as a step's `type`
    pub aliases: &'static [&'static str],
    /// Display name used when a step omits `name`
    pub default_name: &'static str,
    /// Property keys that must be present after evaluation
    pub required: &'static [&'static str],
}

/// Executable unit of work identified by a type alias
#[async_trait]
pub trait Action: Send + Sync {
    fn meta(&self) -> &ActionMeta;

    /// Execute with resolved properties; the return value enters the
    /// variable store only through the step's declared `result` name.
    async fn execute(&self, state: &mut RunState, properties: &Value) -> Result<Value>;
}

/// Maps action aliases to executable actions
///
/// Registration is keyed per alias; a later registration for the same alias
/// shadows the earlier one, which is how override-tier extensions replace
/// built-ins.
#[derive(Default)]
pub struct ActionRegistry {
    actions: HashMap<String, Arc<dyn Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an action under every alias it declares
    pub fn register(&mut self, action: Arc<dyn Action>) {
        for alias in action.meta().aliases {
            self.actions.insert(alias.to_string(), action.clone());
        }
    }

    /// Resolve an action by alias
    pub fn resolve(&self, alias: &str) -> Result<Arc<dyn Action>> {
        self.actions
            .get(alias)
            .cloned()
            .ok_or_else(|| Error::UnknownOption(alias.to_string()))
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.actions.contains_key(alias)
    }

    /// Registered aliases in sorted order
    pub fn aliases(&self) -> Vec<&str> {
        let mut aliases: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        aliases.sort_unstable();
        aliases
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Check that every required property is present in the resolved tree
///
/// Runs before binding so a missing field surfaces as a structured error
/// instead of a deserialization message.
pub fn validate_required(meta: &ActionMeta, properties: &Value) -> Result<()> {
    for property in meta.required {
        let present = matches!(properties, Value::Mapping(map)
            if map.contains_key(&Value::String((*property).to_string())));
        if !present {
            return Err(Error::missing_property(meta.default_name, property));
        }
    }
    Ok(())
}

/// Bind a resolved property tree to an action's typed property struct
pub fn bind_properties<T: DeserializeOwned>(meta: &ActionMeta, properties: &Value) -> Result<T> {
    serde_yaml::from_value(properties.clone()).map_err(|e| {
        Error::Config(format!(
            "Invalid properties for '{}': {}",
            meta.default_name, e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    static NOOP_META: ActionMeta = ActionMeta {
        aliases: &["noop", "nothing"],
        default_name: "No-op",
        required: &["target"],
    };

    #[async_trait]
    impl Action for Noop {
        fn meta(&self) -> &ActionMeta {
            &NOOP_META
        }

        async fn execute(&self, _state: &mut RunState, _properties: &Value) -> Result<Value> {
            Ok(Value::Null)
        }
    }

    #[test]
    fn test_register_and_resolve_by_alias() {
        let mut registry = ActionRegistry::new();
        registry.register(Arc::new(Noop));
        assert!(registry.resolve("noop").is_ok());
        assert!(registry.resolve("nothing").is_ok());
        assert!(matches!(
            registry.resolve("missing"),
            Err(Error::UnknownOption(_))
        ));
    }

    #[test]
    fn test_validate_required() {
        let present: Value = serde_yaml::from_str("target: x").unwrap();
        assert!(validate_required(&NOOP_META, &present).is_ok());

        let absent: Value = serde_yaml::from_str("other: x").unwrap();
        let err = validate_required(&NOOP_META, &absent).unwrap_err();
        assert!(matches!(err, Error::MissingProperty { .. }));

        assert!(validate_required(&NOOP_META, &Value::Null).is_err());
    }
}
