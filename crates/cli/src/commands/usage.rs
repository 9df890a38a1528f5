use bug_warden_core::help::COMMANDS;

#[cfg(test)]
#[path = "usage_tests.rs"]
mod tests;

/// Lists the commands that can be posted as pull request comments.
pub fn render_commands() -> String {
    COMMANDS
        .iter()
        .map(|c| format!("{}\n    {}", c.usage, c.description))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Execute the commands command
pub fn execute() {
    println!("{}", render_commands());
}
