//! Step runner
//!
//! Drives a test run: sequences steps in declaration order, applies pre-
//! and post-step callbacks, evaluates each step's properties against the
//! live run state, executes the resolved action, and aborts the run on the
//! first failure. Whatever the outcome, every session the run opened is
//! released exactly once before the result is reported.

use futures_util::future::BoxFuture;
use serde_yaml::Value;

use crate::actions::{validate_required, ActionRegistry};
use crate::common::{Error, Result};
use crate::engine::callbacks::CallbackSet;
use crate::engine::evaluator::{EvaluatorChain, STEPS_KEY};
use crate::engine::state::RunState;
use crate::model::{Test, TestStep};

/// Terminal outcome of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Completed,
    Failed,
}

/// Executes the steps of one test against one run state
pub struct StepRunner<'a> {
    actions: &'a ActionRegistry,
    chain: &'a EvaluatorChain,
    callbacks: &'a CallbackSet,
}

impl<'a> StepRunner<'a> {
    pub fn new(
        actions: &'a ActionRegistry,
        chain: &'a EvaluatorChain,
        callbacks: &'a CallbackSet,
    ) -> Self {
        Self {
            actions,
            chain,
            callbacks,
        }
    }

    /// Run a complete test; `true` only if every step completed
    ///
    /// Seeds the variable store from the test's `pages`, executes the step
    /// sequence, logs and absorbs any propagated step error, and releases
    /// all sessions before returning.
    pub async fn run(&self, test: &Test) -> bool {
        let mut state = RunState::new(&test.name);
        if let Some(pages) = &test.pages {
            state.variables.seed_pages(pages);
        }

        tracing::info!(test = %test.name, steps = test.steps.len(), "Starting test run");

        let phase = match self.run_steps(&test.steps, "", &mut state).await {
            Ok(()) => {
                tracing::info!(test = %test.name, "Test run completed");
                RunPhase::Completed
            }
            Err(e) => {
                tracing::error!(test = %test.name, error = %e, "Test run failed");
                RunPhase::Failed
            }
        };

        // Sessions are released exactly once, in every outcome; a release
        // failure is logged inside and never flips the result.
        state.release_sessions().await;

        phase == RunPhase::Completed
    }

    /// Execute a step sequence under a parent path prefix
    ///
    /// Aborts on the first failing step; the step error propagates to the
    /// caller, recursively aborting ancestor sequences.
    pub fn run_steps<'b>(
        &'b self,
        steps: &'b [TestStep],
        parent_path: &'b str,
        state: &'b mut RunState,
    ) -> BoxFuture<'b, Result<()>> {
        Box::pin(async move {
            for (index, step) in steps.iter().enumerate() {
                let path = if parent_path.is_empty() {
                    (index + 1).to_string()
                } else {
                    format!("{}.{}", parent_path, index + 1)
                };
                self.run_step(step, &path, state).await?;
            }
            Ok(())
        })
    }

    async fn run_step(&self, step: &TestStep, path: &str, state: &mut RunState) -> Result<()> {
        state.variables.set_step_path(path);

        // The step itself is immutable input; callbacks work on the run's
        // own copy (e.g. to default the name).
        let mut step = step.clone();
        for callback in self.callbacks.iter() {
            if let Err(e) = callback.before_step(&mut step, self.actions, state).await {
                return Err(self.wrap(path, &step, e));
            }
        }

        let action = match self.actions.resolve(&step.step_type) {
            Ok(action) => action,
            Err(e) => return Err(self.wrap(path, &step, e)),
        };
        let name = step
            .name
            .clone()
            .unwrap_or_else(|| action.meta().default_name.to_string());

        tracing::info!(step = %path, name = %name, action = %step.step_type, "Executing step");

        // Properties are evaluated fresh against the current state on every
        // execution; evaluation and validation failures count as the step's
        // outcome just like action failures.
        let mut resolved = Value::Null;
        let outcome = match self
            .chain
            .evaluate_properties(&step.properties, state, true)
            .await
            .and_then(|properties| {
                validate_required(action.meta(), &properties)?;
                Ok(properties)
            }) {
            Ok(properties) => {
                resolved = properties;
                action.execute(state, &resolved).await
            }
            Err(e) => Err(e),
        };

        for callback in self.callbacks.iter() {
            if let Err(e) = callback
                .after_step(&step, path, &name, &outcome, state)
                .await
            {
                tracing::warn!(step = %path, error = %e, "Post-step callback failed");
            }
        }

        let value = match outcome {
            Ok(value) => value,
            Err(e) => return Err(Error::step(path, &name, e)),
        };

        if let Some(result_name) = &step.result {
            state.variables.set(result_name.clone(), value);
        }

        if !step.steps.is_empty() {
            self.run_steps(&step.steps, path, state).await?;
        } else if let Some(embedded) = embedded_steps(&resolved) {
            let embedded = match embedded {
                Ok(steps) => steps,
                Err(e) => return Err(Error::step(path, &name, e)),
            };
            self.run_steps(&embedded, path, state).await?;
        }

        Ok(())
    }

    fn wrap(&self, path: &str, step: &TestStep, cause: Error) -> Error {
        let name = step.name.as_deref().unwrap_or(&step.step_type);
        Error::step(path, name, cause)
    }
}

/// Extract an embedded step sequence produced by the control-step evaluator
fn embedded_steps(resolved: &Value) -> Option<Result<Vec<TestStep>>> {
    let Value::Mapping(map) = resolved else {
        return None;
    };
    let steps = map.get(&Value::String(STEPS_KEY.to_string()))?;
    if !steps.is_sequence() {
        return None;
    }
    Some(
        serde_yaml::from_value(steps.clone())
            .map_err(|e| Error::Config(format!("Invalid embedded step sequence: {e}"))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn test_embedded_steps_extraction() {
        assert!(embedded_steps(&Value::Null).is_none());
        assert!(embedded_steps(&yaml("steps: not-a-sequence")).is_none());

        let resolved = yaml("steps:\n  - type: echo\n    properties:\n      message: hi");
        let steps = embedded_steps(&resolved).unwrap().unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].step_type, "echo");

        let broken = yaml("steps:\n  - properties: {}");
        assert!(embedded_steps(&broken).unwrap().is_err());
    }
}
