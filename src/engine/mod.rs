//! Orchestration engine
//!
//! The engine is built by initializing an extension registry: action
//! providers populate the action registry, service providers populate the
//! evaluator chain and callback set, and test providers are collected for
//! argument resolution. All extensions finish initializing before the first
//! step of any test runs.

pub mod callbacks;
pub mod evaluator;
pub mod extensions;
pub mod runner;
pub mod state;
pub mod variables;

use std::sync::Arc;

use crate::actions::builtin::register_builtin_actions;
use crate::actions::ActionRegistry;
use crate::common::{Config, Result};
use crate::engine::callbacks::{CallbackSet, NameDefaultingCallback, ScreenshotCallback};
use crate::engine::evaluator::{register_default_evaluators, EvaluatorChain};
use crate::engine::extensions::{
    priority, Extension, ExtensionContext, ExtensionKind, ExtensionRegistry,
};
use crate::engine::runner::StepRunner;
use crate::model::Test;
use crate::provider::{TestProvider, YamlFileProvider};
use crate::screenshot::FsScreenshotSink;

/// Fully initialized engine: registries, chain, callbacks, and providers
pub struct Engine {
    actions: ActionRegistry,
    evaluators: EvaluatorChain,
    callbacks: CallbackSet,
    providers: Vec<Arc<dyn TestProvider>>,
}

impl Engine {
    /// Initialize all registered extensions and assemble the engine
    ///
    /// Providers are initialized kind by kind, so action and service
    /// providers are complete before any test provider could consult them.
    /// The first failing `init` aborts bootstrap.
    pub fn bootstrap(config: &Config, mut registry: ExtensionRegistry) -> Result<Self> {
        let mut actions = ActionRegistry::new();
        let mut evaluators = EvaluatorChain::new(config.limits.max_evaluation_depth);
        let mut callbacks = CallbackSet::new();
        let mut providers: Vec<Arc<dyn TestProvider>> = Vec::new();

        {
            let mut ctx = ExtensionContext {
                actions: &mut actions,
                evaluators: &mut evaluators,
                callbacks: &mut callbacks,
                providers: &mut providers,
                config,
            };
            registry.initialize_all(ExtensionKind::ActionProvider, &mut ctx)?;
            registry.initialize_all(ExtensionKind::ServiceProvider, &mut ctx)?;
            registry.initialize_all(ExtensionKind::TestProvider, &mut ctx)?;
        }

        tracing::debug!(
            actions = actions.len(),
            evaluators = evaluators.len(),
            callbacks = callbacks.len(),
            providers = providers.len(),
            "Engine bootstrapped"
        );

        Ok(Self {
            actions,
            evaluators,
            callbacks,
            providers,
        })
    }

    /// Convenience bootstrap with only the built-in extensions
    pub fn with_defaults(config: &Config) -> Result<Self> {
        Self::bootstrap(config, default_registry(config))
    }

    /// Resolve a test from raw arguments via the providers, in order
    pub async fn provide_test(&self, args: &[String]) -> Result<Test> {
        for provider in &self.providers {
            if let Some(test) = provider.provide(args).await? {
                return Ok(test);
            }
        }
        Err(crate::common::Error::NoProvider)
    }

    /// Run a test to completion; `true` only if every step passed
    ///
    /// This is the top-level facade: it owns the run state for the duration
    /// of the run, maps any propagated failure to `false`, and guarantees
    /// session cleanup.
    pub async fn run(&self, test: &Test) -> bool {
        StepRunner::new(&self.actions, &self.evaluators, &self.callbacks)
            .run(test)
            .await
    }

    pub fn actions(&self) -> &ActionRegistry {
        &self.actions
    }
}

/// Extension registry carrying the built-in extensions
///
/// Hosts embed the engine by starting from this registry and registering
/// their own extensions (domain action packs, custom evaluators, other test
/// sources) before bootstrap.
pub fn default_registry(config: &Config) -> ExtensionRegistry {
    let mut registry = ExtensionRegistry::new();

    registry.register(Extension::new(
        "core-actions",
        priority::BASE,
        ExtensionKind::ActionProvider,
        |ctx| {
            register_builtin_actions(ctx.actions);
            Ok(())
        },
    ));

    registry.register(Extension::new(
        "core-evaluators",
        priority::BASE,
        ExtensionKind::ServiceProvider,
        |ctx| {
            register_default_evaluators(ctx.evaluators);
            Ok(())
        },
    ));

    registry.register(Extension::new(
        "step-naming",
        priority::BASE,
        ExtensionKind::ServiceProvider,
        |ctx| {
            ctx.callbacks.register(Arc::new(NameDefaultingCallback));
            Ok(())
        },
    ));

    if config.screenshots.enabled {
        registry.register(Extension::new(
            "screenshots",
            priority::STANDARD,
            ExtensionKind::ServiceProvider,
            |ctx| {
                let sink = Arc::new(FsScreenshotSink::new(ctx.config.screenshots.dir.clone()));
                ctx.callbacks.register(Arc::new(ScreenshotCallback::new(sink)));
                Ok(())
            },
        ));
    }

    registry.register(Extension::new(
        "yaml-provider",
        priority::STANDARD,
        ExtensionKind::TestProvider,
        |ctx| {
            ctx.providers.push(Arc::new(YamlFileProvider));
            Ok(())
        },
    ));

    registry
}
