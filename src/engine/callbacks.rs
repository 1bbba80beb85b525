//! Pre- and post-step callbacks
//!
//! Callbacks run around every step in priority order. Pre-step failures are
//! fatal to the step; post-step callbacks are best-effort and must never
//! mask the step's own outcome.

use std::sync::Arc;

use async_trait::async_trait;
use serde_yaml::Value;

use crate::actions::ActionRegistry;
use crate::common::Result;
use crate::engine::state::RunState;
use crate::model::TestStep;
use crate::screenshot::ScreenshotSink;

/// Hook invoked around step execution
#[async_trait]
pub trait StepCallback: Send + Sync {
    /// Invocation order; lower priorities run first
    fn priority(&self) -> i32;

    /// Runs before the step's properties are evaluated
    ///
    /// Receives the run's working copy of the step and may rewrite it. A
    /// failure here aborts the step.
    async fn before_step(
        &self,
        _step: &mut TestStep,
        _registry: &ActionRegistry,
        _state: &mut RunState,
    ) -> Result<()> {
        Ok(())
    }

    /// Runs after the action, whether it succeeded or failed
    ///
    /// Failures are logged by the runner and suppressed.
    async fn after_step(
        &self,
        _step: &TestStep,
        _step_path: &str,
        _step_name: &str,
        _outcome: &Result<Value>,
        _state: &mut RunState,
    ) -> Result<()> {
        Ok(())
    }
}

/// Ordered set of registered callbacks
#[derive(Default)]
pub struct CallbackSet {
    callbacks: Vec<Arc<dyn StepCallback>>,
}

impl CallbackSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a callback, keeping ascending priority; ties keep
    /// registration order
    pub fn register(&mut self, callback: Arc<dyn StepCallback>) {
        let position = self
            .callbacks
            .iter()
            .position(|c| c.priority() > callback.priority())
            .unwrap_or(self.callbacks.len());
        self.callbacks.insert(position, callback);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn StepCallback>> {
        self.callbacks.iter()
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

/// Defaults a step's display name from its action's metadata
///
/// Referencing an unregistered action type fails here with the same
/// "unknown option" error the runner would raise, before any evaluation
/// work happens.
pub struct NameDefaultingCallback;

#[async_trait]
impl StepCallback for NameDefaultingCallback {
    fn priority(&self) -> i32 {
        0
    }

    async fn before_step(
        &self,
        step: &mut TestStep,
        registry: &ActionRegistry,
        _state: &mut RunState,
    ) -> Result<()> {
        if step.name.is_none() {
            let action = registry.resolve(&step.step_type)?;
            step.name = Some(action.meta().default_name.to_string());
        }
        Ok(())
    }
}

/// Captures a screenshot of the current session after every step
pub struct ScreenshotCallback {
    sink: Arc<dyn ScreenshotSink>,
}

impl ScreenshotCallback {
    pub fn new(sink: Arc<dyn ScreenshotSink>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl StepCallback for ScreenshotCallback {
    fn priority(&self) -> i32 {
        100
    }

    async fn after_step(
        &self,
        _step: &TestStep,
        step_path: &str,
        step_name: &str,
        outcome: &Result<Value>,
        state: &mut RunState,
    ) -> Result<()> {
        let test_name = state.test_name.clone();
        let Some(session) = state.current_session() else {
            return Ok(());
        };
        let Some(image) = session.screenshot().await? else {
            return Ok(());
        };
        let suffix = outcome.is_err().then_some("failed");
        self.sink
            .save(&image, &test_name, step_path, step_name, suffix)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::builtin::register_builtin_actions;
    use crate::common::Error;

    fn step(step_type: &str) -> TestStep {
        TestStep {
            step_type: step_type.to_string(),
            name: None,
            properties: Value::Null,
            result: None,
            steps: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_name_defaulting() {
        let mut registry = ActionRegistry::new();
        register_builtin_actions(&mut registry);
        let mut state = RunState::new("t");

        let mut named = step("set-variable");
        named.name = Some("custom".to_string());
        NameDefaultingCallback
            .before_step(&mut named, &registry, &mut state)
            .await
            .unwrap();
        assert_eq!(named.name.as_deref(), Some("custom"));

        let mut unnamed = step("set-variable");
        NameDefaultingCallback
            .before_step(&mut unnamed, &registry, &mut state)
            .await
            .unwrap();
        assert_eq!(unnamed.name.as_deref(), Some("Set variable"));
    }

    #[tokio::test]
    async fn test_unknown_type_fails_defaulting() {
        let registry = ActionRegistry::new();
        let mut state = RunState::new("t");
        let err = NameDefaultingCallback
            .before_step(&mut step("no-such-action"), &registry, &mut state)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnknownOption(_)));
    }

    #[test]
    fn test_callback_set_ordering() {
        struct P(i32);
        #[async_trait]
        impl StepCallback for P {
            fn priority(&self) -> i32 {
                self.0
            }
        }

        let mut set = CallbackSet::new();
        set.register(Arc::new(P(10)));
        set.register(Arc::new(P(0)));
        set.register(Arc::new(P(10)));
        let priorities: Vec<i32> = set.iter().map(|c| c.priority()).collect();
        assert_eq!(priorities, vec![0, 10, 10]);
    }
}
