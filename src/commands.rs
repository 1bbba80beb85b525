//! CLI command definitions
//!
//! Defines the clap commands for the testflow CLI.

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Run a test definition
    Run {
        /// Arguments handed to the test providers in priority order
        /// (e.g. the path of a YAML test file)
        #[arg(required = true)]
        args: Vec<String>,
    },

    /// List the registered actions
    Actions,
}
