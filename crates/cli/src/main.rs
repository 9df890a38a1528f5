//! # Bug Warden CLI
//!
//! Command-line interface for checking Bugzilla bugs against branch policies.
//!
//! The CLI never writes to Bugzilla or GitHub. It answers the questions a
//! maintainer has while writing or debugging a bug warden configuration.
//!
//! # Commands
//!
//! - `validate` - Validate a bug against the policy of a branch
//! - `policy` - Show the policy that applies to a branch
//! - `commands` - List the pull request comment commands
//!
//! # Examples
//!
//! ```bash
//! # Check whether bug 123 would be accepted on release-4.4
//! BUGZILLA_API_KEY=... bug-warden validate --org my-org --repo my-repo --branch release-4.4 --bug 123
//!
//! # Show the resolved policy
//! bug-warden policy --org my-org --repo my-repo --branch release-4.4
//! ```

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

use clap::{Parser, Subcommand};
use tracing::{error, info, instrument};

/// Command implementations for the CLI.
mod commands;

/// Configuration loading for the CLI.
mod config;

/// Error types specific to the CLI.
mod errors;

use commands::{policy::PolicyArgs, validate::ValidateArgs};
use errors::CliError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Command-line interface structure for Bug Warden.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// The subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

/// Available commands for the Bug Warden CLI.
#[derive(Subcommand)]
enum Commands {
    /// Validate a bug against the policy of a branch
    Validate(ValidateArgs),

    /// Show the policy that applies to a branch
    Policy(PolicyArgs),

    /// List the commands that can be posted on pull requests
    Commands,
}

/// Main entry point for the Bug Warden CLI.
///
/// # Errors
///
/// Returns the `CliError` of the command that failed. A bug that fails
/// validation is reported as `CliError::ValidationFailed`.
#[tokio::main]
#[instrument]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::registry()
        .with(fmt::layer().pretty().with_writer(std::io::stderr))
        .with(EnvFilter::from_env("BUG_WARDEN_LOG"))
        .init();

    let cli = Cli::parse();

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    match cli.command {
        Commands::Validate(args) => {
            if let Err(e) = commands::validate::execute(args).await {
                error!("Error validating bug: {}", e);
                return Err(e);
            }
        }
        Commands::Policy(args) => {
            if let Err(e) = commands::policy::execute(args) {
                error!("Error resolving policy: {}", e);
                return Err(e);
            }
        }
        Commands::Commands => commands::usage::execute(),
    }

    Ok(())
}
