//! Built-in engine-level actions
//!
//! The orchestration engine ships a handful of generic actions; domain
//! action packs (browser automation and the like) are contributed by
//! action-provider extensions.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_yaml::Value;

use super::{bind_properties, Action, ActionMeta, ActionRegistry};
use crate::common::{Error, Result};
use crate::engine::state::RunState;

/// Register every built-in action
pub fn register_builtin_actions(registry: &mut ActionRegistry) {
    registry.register(Arc::new(SetVariable));
    registry.register(Arc::new(Echo));
    registry.register(Arc::new(Wait));
    registry.register(Arc::new(Fail));
    registry.register(Arc::new(Group));
}

/// Write a value into the variable store
pub struct SetVariable;

static SET_VARIABLE_META: ActionMeta = ActionMeta {
    aliases: &["set-variable", "set"],
    default_name: "Set variable",
    required: &["variable"],
};

#[derive(Deserialize)]
struct SetVariableProperties {
    variable: String,
    #[serde(default)]
    value: Value,
}

#[async_trait]
impl Action for SetVariable {
    fn meta(&self) -> &ActionMeta {
        &SET_VARIABLE_META
    }

    async fn execute(&self, state: &mut RunState, properties: &Value) -> Result<Value> {
        let props: SetVariableProperties = bind_properties(self.meta(), properties)?;
        tracing::debug!(variable = %props.variable, "Setting variable");
        state.variables.set(props.variable, props.value.clone());
        Ok(props.value)
    }
}

/// Print a message to standard output
pub struct Echo;

static ECHO_META: ActionMeta = ActionMeta {
    aliases: &["echo", "print"],
    default_name: "Echo",
    required: &["message"],
};

#[derive(Deserialize)]
struct EchoProperties {
    message: String,
}

#[async_trait]
impl Action for Echo {
    fn meta(&self) -> &ActionMeta {
        &ECHO_META
    }

    async fn execute(&self, _state: &mut RunState, properties: &Value) -> Result<Value> {
        let props: EchoProperties = bind_properties(self.meta(), properties)?;
        println!("{}", props.message);
        Ok(Value::String(props.message))
    }
}

/// Suspend the run for a number of seconds
pub struct Wait;

static WAIT_META: ActionMeta = ActionMeta {
    aliases: &["wait", "sleep"],
    default_name: "Wait",
    required: &["seconds"],
};

#[derive(Deserialize)]
struct WaitProperties {
    seconds: f64,
}

#[async_trait]
impl Action for Wait {
    fn meta(&self) -> &ActionMeta {
        &WAIT_META
    }

    async fn execute(&self, _state: &mut RunState, properties: &Value) -> Result<Value> {
        let props: WaitProperties = bind_properties(self.meta(), properties)?;
        if !props.seconds.is_finite() || props.seconds < 0.0 {
            return Err(Error::Config(format!(
                "Invalid wait duration: {}",
                props.seconds
            )));
        }
        tokio::time::sleep(Duration::from_secs_f64(props.seconds)).await;
        Ok(Value::Null)
    }
}

/// Fail the step unconditionally; useful for guarding unreachable branches
pub struct Fail;

static FAIL_META: ActionMeta = ActionMeta {
    aliases: &["fail"],
    default_name: "Fail",
    required: &[],
};

#[derive(Deserialize, Default)]
struct FailProperties {
    #[serde(default)]
    message: Option<String>,
}

#[async_trait]
impl Action for Fail {
    fn meta(&self) -> &ActionMeta {
        &FAIL_META
    }

    async fn execute(&self, _state: &mut RunState, properties: &Value) -> Result<Value> {
        let props: FailProperties = match properties {
            Value::Null => FailProperties::default(),
            other => bind_properties(self.meta(), other)?,
        };
        Err(Error::Action(
            props.message.unwrap_or_else(|| "explicit failure".to_string()),
        ))
    }
}

/// Structural no-op; the nested `steps` sequence does the work
pub struct Group;

static GROUP_META: ActionMeta = ActionMeta {
    aliases: &["group", "section"],
    default_name: "Group",
    required: &[],
};

#[async_trait]
impl Action for Group {
    fn meta(&self) -> &ActionMeta {
        &GROUP_META
    }

    async fn execute(&self, _state: &mut RunState, _properties: &Value) -> Result<Value> {
        Ok(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[tokio::test]
    async fn test_set_variable_writes_store() {
        let mut state = RunState::new("t");
        let value = SetVariable
            .execute(&mut state, &yaml("variable: x\nvalue: 41"))
            .await
            .unwrap();
        assert_eq!(value, yaml("41"));
        assert_eq!(state.variables.resolve("x").unwrap(), yaml("41"));
    }

    #[tokio::test]
    async fn test_set_variable_defaults_to_null() {
        let mut state = RunState::new("t");
        SetVariable
            .execute(&mut state, &yaml("variable: empty"))
            .await
            .unwrap();
        assert_eq!(state.variables.get("empty"), Some(&Value::Null));
    }

    #[tokio::test]
    async fn test_fail_uses_message() {
        let mut state = RunState::new("t");
        let err = Fail
            .execute(&mut state, &yaml("message: nope"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "nope");

        let err = Fail.execute(&mut state, &Value::Null).await.unwrap_err();
        assert_eq!(err.to_string(), "explicit failure");
    }

    #[tokio::test]
    async fn test_wait_rejects_negative() {
        let mut state = RunState::new("t");
        let err = Wait
            .execute(&mut state, &yaml("seconds: -1.0"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_registration_covers_all_aliases() {
        let mut registry = ActionRegistry::new();
        register_builtin_actions(&mut registry);
        for alias in ["set-variable", "set", "echo", "print", "wait", "sleep", "fail", "group", "section"] {
            assert!(registry.contains(alias), "missing alias {alias}");
        }
    }
}
