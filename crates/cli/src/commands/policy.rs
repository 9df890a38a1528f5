use bug_warden_core::config::{BranchPolicy, PolicySource};
use bug_warden_core::help::describe_policy;
use clap::Args;

use crate::config::{get_config_path, load_config};
use crate::errors::CliError;

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;

/// Arguments for the policy command
#[derive(Args, Debug)]
pub struct PolicyArgs {
    /// Organization that owns the repository
    #[arg(long)]
    pub org: String,

    /// Repository name
    #[arg(long)]
    pub repo: String,

    /// Branch to resolve the policy for
    #[arg(long)]
    pub branch: String,

    /// Alternate config file
    #[arg(short, long)]
    pub config: Option<String>,
}

/// Renders a resolved policy as JSON followed by a plain language description.
pub fn render_policy(args: &PolicyArgs, policy: &BranchPolicy) -> Result<String, CliError> {
    Ok(format!(
        "{}\n\nFor {}/{} on {}, {}",
        serde_json::to_string_pretty(policy)?,
        args.org,
        args.repo,
        args.branch,
        describe_policy(policy)
    ))
}

/// Execute the policy command
pub fn execute(args: PolicyArgs) -> Result<(), CliError> {
    let config = load_config(&get_config_path(args.config.as_deref()))?;
    let policy = config.policy_for(&args.org, &args.repo, &args.branch);

    println!("{}", render_policy(&args, &policy)?);
    Ok(())
}
