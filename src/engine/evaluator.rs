//! Property evaluator chain
//!
//! Turns a step's raw property tree into concrete action arguments by
//! running every key/value pair of a mapping through an ordered chain of
//! evaluators. Each evaluator either handles the pair and stops the chain,
//! delegates to the next evaluator, or restarts the chain from the front
//! with a rewritten pair.
//!
//! The chain is an explicit ordered list; evaluators never call each other
//! directly. Key markers:
//!
//! * `~key` keeps the value exactly as written, no recursion or binding
//! * `$key: expr` resolves `expr` against the variable store and re-enters
//!   the chain with the stripped key and the resolved value
//! * `key: "$expr"` resolves a bindable-expression scalar in value position
//! * `steps: "expr"` resolves to an embedded step sequence for the runner

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use serde_yaml::{Mapping, Value};

use crate::common::{Error, Result};
use crate::engine::state::RunState;

/// Key prefix suppressing evaluation of the value
pub const LITERAL_MARKER: &str = "~";
/// Key prefix binding the value to the variable store
pub const EXPRESSION_MARKER: &str = "$";
/// Reserved key carrying an embedded step sequence
pub const STEPS_KEY: &str = "steps";

/// One key/value pair of a mapping node under evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyPair {
    pub key: String,
    pub value: Value,
}

impl PropertyPair {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self { key: key.into(), value }
    }
}

/// What an evaluator decided about a pair
pub enum Outcome {
    /// The pair is fully resolved; stop the chain
    Handled(PropertyPair),
    /// Pass the (possibly rewritten) pair to the next evaluator
    Delegate(PropertyPair),
    /// Re-enter the chain from the first evaluator with a rewritten pair
    Restart(PropertyPair),
}

/// One transformation rule in the chain
#[async_trait]
pub trait PropertyEvaluator: Send + Sync {
    /// Position in the chain; lower priorities are consulted first
    fn priority(&self) -> i32;

    async fn evaluate(
        &self,
        pair: PropertyPair,
        chain: &EvaluatorChain,
        state: &RunState,
        recursive: bool,
        depth: usize,
    ) -> Result<Outcome>;
}

/// Ordered list of evaluators driving per-pair resolution
pub struct EvaluatorChain {
    evaluators: Vec<Arc<dyn PropertyEvaluator>>,
    depth_limit: usize,
}

impl EvaluatorChain {
    pub fn new(depth_limit: usize) -> Self {
        Self {
            evaluators: Vec::new(),
            depth_limit,
        }
    }

    /// Insert an evaluator, keeping the list ascending by priority
    ///
    /// Equal priorities keep registration order.
    pub fn register(&mut self, evaluator: Arc<dyn PropertyEvaluator>) {
        let position = self
            .evaluators
            .iter()
            .position(|e| e.priority() > evaluator.priority())
            .unwrap_or(self.evaluators.len());
        self.evaluators.insert(position, evaluator);
    }

    pub fn len(&self) -> usize {
        self.evaluators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.evaluators.is_empty()
    }

    /// Resolve a whole property tree against the run state
    ///
    /// Applies the per-pair chain to every pair of a mapping, evaluates
    /// every element of a sequence, and recurses into nested containers
    /// when `recursive` is set. Plain scalars pass through untouched.
    pub fn evaluate_properties<'a>(
        &'a self,
        properties: &'a Value,
        state: &'a RunState,
        recursive: bool,
    ) -> BoxFuture<'a, Result<Value>> {
        self.evaluate_value(properties, state, recursive, 0)
    }

    pub(crate) fn evaluate_value<'a>(
        &'a self,
        value: &'a Value,
        state: &'a RunState,
        recursive: bool,
        depth: usize,
    ) -> BoxFuture<'a, Result<Value>> {
        Box::pin(async move {
            if depth > self.depth_limit {
                return Err(Error::EvaluationDepth(self.depth_limit));
            }

            match value {
                Value::Mapping(mapping) => {
                    let mut resolved = Mapping::new();
                    for (key, val) in mapping {
                        match key {
                            Value::String(key) => {
                                let pair = self
                                    .evaluate_pair(PropertyPair::new(key.clone(), val.clone()), state, recursive, depth)
                                    .await?;
                                resolved.insert(Value::String(pair.key), pair.value);
                            }
                            // Non-string keys carry no markers; only the value is walked
                            other => {
                                let val = self.evaluate_value(val, state, recursive, depth + 1).await?;
                                resolved.insert(other.clone(), val);
                            }
                        }
                    }
                    Ok(Value::Mapping(resolved))
                }
                Value::Sequence(elements) => {
                    let mut resolved = Vec::with_capacity(elements.len());
                    for element in elements {
                        let element = match element {
                            // Sequence elements have no key to carry a marker;
                            // bindable-expression scalars resolve in place.
                            Value::String(s) => match s.strip_prefix(EXPRESSION_MARKER) {
                                Some(expression) if !expression.is_empty() => {
                                    state.variables.resolve(expression)?
                                }
                                _ => element.clone(),
                            },
                            other => self.evaluate_value(other, state, recursive, depth + 1).await?,
                        };
                        resolved.push(element);
                    }
                    Ok(Value::Sequence(resolved))
                }
                scalar => Ok(scalar.clone()),
            }
        })
    }

    /// Run one key/value pair through the chain until some evaluator stops it
    ///
    /// If no evaluator handles the pair it passes through as-is. Restarts
    /// count against the depth limit so a pathological `$`-binding fails
    /// loudly instead of looping.
    pub async fn evaluate_pair(
        &self,
        pair: PropertyPair,
        state: &RunState,
        recursive: bool,
        depth: usize,
    ) -> Result<PropertyPair> {
        let mut pair = pair;
        let mut index = 0;
        let mut depth = depth;

        while index < self.evaluators.len() {
            match self.evaluators[index]
                .evaluate(pair, self, state, recursive, depth)
                .await?
            {
                Outcome::Handled(resolved) => return Ok(resolved),
                Outcome::Delegate(next) => {
                    pair = next;
                    index += 1;
                }
                Outcome::Restart(rewritten) => {
                    depth += 1;
                    if depth > self.depth_limit {
                        return Err(Error::EvaluationDepth(self.depth_limit));
                    }
                    pair = rewritten;
                    index = 0;
                }
            }
        }

        Ok(pair)
    }
}

/// Fallback evaluator guaranteeing nested structures are always walked
///
/// Pairs whose key carries a marker belong to a later evaluator and are
/// delegated untouched; everything else has container values recursively
/// evaluated and bindable-expression scalars (`"$expr"` in value position)
/// resolved before delegating so later evaluators can still post-process.
pub struct DefaultEvaluator;

#[async_trait]
impl PropertyEvaluator for DefaultEvaluator {
    fn priority(&self) -> i32 {
        1
    }

    async fn evaluate(
        &self,
        pair: PropertyPair,
        chain: &EvaluatorChain,
        state: &RunState,
        recursive: bool,
        depth: usize,
    ) -> Result<Outcome> {
        let marked = pair.key.starts_with(LITERAL_MARKER)
            || pair.key.starts_with(EXPRESSION_MARKER)
            || (pair.key == STEPS_KEY && pair.value.is_string());
        if marked {
            return Ok(Outcome::Delegate(pair));
        }

        let value = match &pair.value {
            Value::Mapping(_) | Value::Sequence(_) if recursive => {
                chain.evaluate_value(&pair.value, state, recursive, depth + 1).await?
            }
            Value::String(s) => match s.strip_prefix(EXPRESSION_MARKER) {
                Some(expression) if !expression.is_empty() => state.variables.resolve(expression)?,
                _ => pair.value.clone(),
            },
            _ => pair.value.clone(),
        };

        Ok(Outcome::Delegate(PropertyPair::new(pair.key, value)))
    }
}

/// Keeps `~`-marked pairs exactly as written
pub struct LiteralEvaluator;

#[async_trait]
impl PropertyEvaluator for LiteralEvaluator {
    fn priority(&self) -> i32 {
        2
    }

    async fn evaluate(
        &self,
        pair: PropertyPair,
        _chain: &EvaluatorChain,
        _state: &RunState,
        _recursive: bool,
        _depth: usize,
    ) -> Result<Outcome> {
        match pair.key.strip_prefix(LITERAL_MARKER) {
            Some(stripped) => Ok(Outcome::Handled(PropertyPair::new(stripped, pair.value))),
            None => Ok(Outcome::Delegate(pair)),
        }
    }
}

/// Resolves a string-valued `steps` key into an embedded step sequence
///
/// The expression is resolved non-recursively; the runner interprets the
/// resulting sequence as nested steps.
pub struct ControlStepEvaluator;

#[async_trait]
impl PropertyEvaluator for ControlStepEvaluator {
    fn priority(&self) -> i32 {
        5
    }

    async fn evaluate(
        &self,
        pair: PropertyPair,
        _chain: &EvaluatorChain,
        state: &RunState,
        _recursive: bool,
        _depth: usize,
    ) -> Result<Outcome> {
        if pair.key == STEPS_KEY {
            if let Value::String(expression) = &pair.value {
                let expression = expression.strip_prefix(EXPRESSION_MARKER).unwrap_or(expression);
                let resolved = state.variables.resolve(expression)?;
                return Ok(Outcome::Handled(PropertyPair::new(pair.key, resolved)));
            }
        }
        Ok(Outcome::Delegate(pair))
    }
}

/// Resolves `$key: expr` pairs against the variable store
///
/// The resolved pair is reinjected at the front of the chain so other
/// marker rules can still apply to the result.
pub struct ExpressionBindingEvaluator;

#[async_trait]
impl PropertyEvaluator for ExpressionBindingEvaluator {
    fn priority(&self) -> i32 {
        9
    }

    async fn evaluate(
        &self,
        pair: PropertyPair,
        _chain: &EvaluatorChain,
        state: &RunState,
        _recursive: bool,
        _depth: usize,
    ) -> Result<Outcome> {
        if let Some(stripped) = pair.key.strip_prefix(EXPRESSION_MARKER) {
            if let Value::String(expression) = &pair.value {
                let resolved = state.variables.resolve(expression)?;
                return Ok(Outcome::Restart(PropertyPair::new(stripped, resolved)));
            }
        }
        Ok(Outcome::Delegate(pair))
    }
}

/// Build a chain carrying the built-in evaluators
pub fn default_chain(depth_limit: usize) -> EvaluatorChain {
    let mut chain = EvaluatorChain::new(depth_limit);
    register_default_evaluators(&mut chain);
    chain
}

/// Register the built-in evaluators on an existing chain
pub fn register_default_evaluators(chain: &mut EvaluatorChain) {
    chain.register(Arc::new(DefaultEvaluator));
    chain.register(Arc::new(LiteralEvaluator));
    chain.register(Arc::new(ControlStepEvaluator));
    chain.register(Arc::new(ExpressionBindingEvaluator));
}
