//! Testflow CLI - run declarative YAML test definitions
//!
//! Maps a run's boolean outcome to the process exit code: 0 when the test
//! passed, 1 when it failed, 2 on engine or configuration errors.

use std::path::PathBuf;

use clap::Parser;
use testflow::commands::Commands;
use testflow::common::{logging, Config};
use testflow::cli;

#[derive(Parser)]
#[command(name = "testflow", about = "Declarative YAML test-step runner")]
#[command(version, long_about = None)]
struct Cli {
    /// Path to a configuration file (defaults to the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    logging::init();

    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    };

    match cli::dispatch(cli.command, config).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    }
}
