//! CLI command handling
//!
//! Dispatches CLI commands against an engine built from the default
//! extensions plus a console reporter, and formats output.

use std::sync::Arc;

use async_trait::async_trait;
use colored::Colorize;
use serde_yaml::Value;

use crate::commands::Commands;
use crate::common::{Config, Result};
use crate::engine::callbacks::StepCallback;
use crate::engine::extensions::{priority, Extension, ExtensionKind};
use crate::engine::state::RunState;
use crate::engine::{default_registry, Engine};
use crate::model::TestStep;

/// Dispatch a CLI command; the boolean is the process success
pub async fn dispatch(command: Commands, config: Config) -> Result<bool> {
    match command {
        Commands::Run { args } => {
            let mut registry = default_registry(&config);
            registry.register(Extension::new(
                "console-reporter",
                priority::STANDARD,
                ExtensionKind::ServiceProvider,
                |ctx| {
                    ctx.callbacks.register(Arc::new(ConsoleReporter));
                    Ok(())
                },
            ));
            let engine = Engine::bootstrap(&config, registry)?;

            let test = engine.provide_test(&args).await?;
            println!(
                "\n{} {}",
                "Running test:".blue().bold(),
                test.name.white().bold()
            );

            let passed = engine.run(&test).await;
            if passed {
                println!("\n{} {}\n", "✓".green().bold(), "Test passed".green().bold());
            } else {
                println!("\n{} {}\n", "✗".red().bold(), "Test failed".red().bold());
            }
            Ok(passed)
        }

        Commands::Actions => {
            let engine = Engine::bootstrap(&config, default_registry(&config))?;
            println!("Registered actions:");
            for alias in engine.actions().aliases() {
                let action = engine.actions().resolve(alias)?;
                println!("  {} - {}", alias, action.meta().default_name.dimmed());
            }
            Ok(true)
        }
    }
}

/// Prints per-step progress the way a person watches a run
struct ConsoleReporter;

#[async_trait]
impl StepCallback for ConsoleReporter {
    fn priority(&self) -> i32 {
        priority::STANDARD
    }

    async fn after_step(
        &self,
        _step: &TestStep,
        step_path: &str,
        step_name: &str,
        outcome: &Result<Value>,
        _state: &mut RunState,
    ) -> Result<()> {
        match outcome {
            Ok(_) => println!("  {} Step {}: {}", "✓".green(), step_path, step_name.dimmed()),
            Err(e) => println!("  {} Step {}: {} - {}", "✗".red(), step_path, step_name, e),
        }
        Ok(())
    }
}
