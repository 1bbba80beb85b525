//! Extension registry
//!
//! Extensions are pluggable units contributing actions, evaluators, step
//! callbacks, or test providers. They are registered explicitly (no
//! directory scanning), ordered by ascending priority with ties keeping
//! registration order, and initialized exactly once before any test step
//! runs. An initialization failure is fatal: the engine must not run with a
//! partially populated registry.

use std::sync::Arc;

use crate::actions::ActionRegistry;
use crate::common::{Config, Error, Result};
use crate::engine::callbacks::CallbackSet;
use crate::engine::evaluator::EvaluatorChain;
use crate::provider::TestProvider;

/// Conventional priority tiers
///
/// Base providers run first; override-tier extensions run last so their
/// keyed registrations shadow earlier ones.
pub mod priority {
    /// Default/base providers
    pub const BASE: i32 = 0;
    /// Ordinary built-ins
    pub const STANDARD: i32 = 100;
    /// Overrides shadowing earlier registrations
    pub const OVERRIDE: i32 = 200;
}

/// What a registered extension contributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionKind {
    /// Populates the action registry
    ActionProvider,
    /// Populates the evaluator chain and callback set
    ServiceProvider,
    /// Contributes test providers
    TestProvider,
}

/// Mutable registration surface handed to an extension's `init`
pub struct ExtensionContext<'a> {
    pub actions: &'a mut ActionRegistry,
    pub evaluators: &'a mut EvaluatorChain,
    pub callbacks: &'a mut CallbackSet,
    pub providers: &'a mut Vec<Arc<dyn TestProvider>>,
    pub config: &'a Config,
}

type InitFn = Box<dyn FnOnce(&mut ExtensionContext<'_>) -> Result<()> + Send>;

/// A pluggable unit activated once at engine bootstrap
pub struct Extension {
    name: String,
    priority: i32,
    kind: ExtensionKind,
    init: Option<InitFn>,
}

impl Extension {
    pub fn new(
        name: impl Into<String>,
        priority: i32,
        kind: ExtensionKind,
        init: impl FnOnce(&mut ExtensionContext<'_>) -> Result<()> + Send + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            priority,
            kind,
            init: Some(Box::new(init)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn kind(&self) -> ExtensionKind {
        self.kind
    }
}

/// Discovers and initializes extensions in priority order
#[derive(Default)]
pub struct ExtensionRegistry {
    extensions: Vec<Extension>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, extension: Extension) {
        tracing::debug!(
            extension = %extension.name,
            priority = extension.priority,
            kind = ?extension.kind,
            "Registered extension"
        );
        self.extensions.push(extension);
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Initialize every not-yet-initialized extension of a kind
    ///
    /// Ascending priority, ties in registration order. Each `init` runs at
    /// most once; the first failure aborts with the causing error attached.
    pub fn initialize_all(
        &mut self,
        kind: ExtensionKind,
        ctx: &mut ExtensionContext<'_>,
    ) -> Result<()> {
        let mut order: Vec<usize> = self
            .extensions
            .iter()
            .enumerate()
            .filter(|(_, e)| e.kind == kind)
            .map(|(i, _)| i)
            .collect();
        // Stable sort keeps registration order for equal priorities
        order.sort_by_key(|&i| self.extensions[i].priority);

        for index in order {
            let extension = &mut self.extensions[index];
            let Some(init) = extension.init.take() else {
                continue;
            };
            tracing::debug!(extension = %extension.name, "Initializing extension");
            init(ctx).map_err(|e| Error::extension(&extension.name, e))?;
        }
        Ok(())
    }
}
