use std::env;

use bug_warden_core::config::{BranchPolicy, PolicySource};
use bug_warden_core::validation::{validate_bug, ValidationVerdict};
use bug_warden_developer_platforms::bugzilla::BugzillaClient;
use bug_warden_developer_platforms::errors::Error;
use bug_warden_developer_platforms::BugTracker;
use clap::Args;
use tracing::{debug, info, instrument};

use crate::config::{get_config_path, load_config};
use crate::errors::CliError;

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;

/// Environment variable holding the Bugzilla API key
pub const BUGZILLA_API_KEY_VAR: &str = "BUGZILLA_API_KEY";

/// Arguments for the validate command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Organization that owns the repository
    #[arg(long)]
    pub org: String,

    /// Repository name
    #[arg(long)]
    pub repo: String,

    /// Branch the pull request would target
    #[arg(long)]
    pub branch: String,

    /// ID of the bug to validate
    #[arg(long)]
    pub bug: u64,

    /// Alternate config file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Print the verdict as JSON
    #[arg(long)]
    pub json: bool,
}

/// Maps a tracker failure to a CLI error.
fn tracker_error(e: Error) -> CliError {
    if e.is_not_found() {
        CliError::InvalidArguments(e.to_string())
    } else {
        CliError::NetworkError(e.to_string())
    }
}

/// Fetches a bug, and its dependents when the policy needs them, and validates it.
///
/// Nothing is written to the tracker.
#[instrument(skip(tracker, policy))]
pub async fn validate_bug_id<T: BugTracker>(
    tracker: &T,
    bug_id: u64,
    policy: &BranchPolicy,
) -> Result<ValidationVerdict, CliError> {
    let bug = tracker.get_bug(bug_id).await.map_err(tracker_error)?;

    let mut dependents = Vec::new();
    if policy.checks_dependents() {
        for dependent_id in &bug.depends_on {
            debug!(bug = bug_id, dependent = dependent_id, "Fetching dependent bug");
            dependents.push(tracker.get_bug(*dependent_id).await.map_err(tracker_error)?);
        }
    }

    Ok(validate_bug(&bug, &dependents, policy, tracker.endpoint()))
}

/// Renders a verdict for the terminal.
pub fn render_verdict(bug_id: u64, verdict: &ValidationVerdict) -> String {
    let mut lines = Vec::new();
    if verdict.valid {
        lines.push(format!("Bug {} is valid.", bug_id));
    } else {
        lines.push(format!("Bug {} is invalid:", bug_id));
        lines.extend(verdict.reasons.iter().map(|r| format!("  - {}", r)));
    }

    if verdict.validations.is_empty() {
        if verdict.valid {
            lines.push("No checks are configured for this branch.".to_string());
        }
    } else {
        lines.push("Passed checks:".to_string());
        lines.extend(verdict.validations.iter().map(|v| format!("  - {}", v)));
    }

    lines.join("\n")
}

/// Execute the validate command
pub async fn execute(args: ValidateArgs) -> Result<(), CliError> {
    let config = load_config(&get_config_path(args.config.as_deref()))?;
    let policy = config.policy_for(&args.org, &args.repo, &args.branch);

    let api_key = env::var(BUGZILLA_API_KEY_VAR)
        .map_err(|_| CliError::AuthError(format!("{} is not set", BUGZILLA_API_KEY_VAR)))?;
    let tracker = BugzillaClient::new(&config.bugzilla.endpoint, &api_key)
        .map_err(|e| CliError::ConfigError(e.to_string()))?;

    info!(
        repository_owner = %args.org,
        repository = %args.repo,
        branch = %args.branch,
        bug = args.bug,
        "Validating bug"
    );
    let verdict = validate_bug_id(&tracker, args.bug, &policy).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&verdict)?);
    } else {
        println!("{}", render_verdict(args.bug, &verdict));
    }

    if verdict.valid {
        Ok(())
    } else {
        Err(CliError::ValidationFailed(format!(
            "bug {} does not satisfy the policy for {}/{} on {}",
            args.bug, args.org, args.repo, args.branch
        )))
    }
}
