use super::*;
use bug_warden_core::config::PolicySource;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_get_config_path_uses_argument() {
    assert_eq!(
        get_config_path(Some("/etc/bug-warden/config.toml")),
        PathBuf::from("/etc/bug-warden/config.toml")
    );
}

#[test]
fn test_get_config_path_defaults_to_current_directory() {
    let path = get_config_path(None);
    assert!(path.ends_with(DEFAULT_CONFIG_FILENAME));
}

#[test]
fn test_load_config() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join(DEFAULT_CONFIG_FILENAME);
    fs::write(
        &path,
        r#"
schemaVersion = 1

[bugzilla]
endpoint = "https://bugzilla.example.com"

[policies.branches."*"]
target_release = "4.5.0"

[policies.orgs.my-org.repos.my-repo.branches."release-4.4"]
target_release = "4.4.z"
"#,
    )
    .unwrap();

    let config = load_config(&path).unwrap();

    assert_eq!(config.bugzilla.endpoint, "https://bugzilla.example.com");
    assert_eq!(
        config
            .policy_for("my-org", "my-repo", "release-4.4")
            .target_release
            .as_deref(),
        Some("4.4.z")
    );
    assert_eq!(
        config
            .policy_for("my-org", "my-repo", "main")
            .target_release
            .as_deref(),
        Some("4.5.0")
    );
}

#[test]
fn test_load_missing_config() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("missing.toml");

    let result = load_config(&path);

    match result {
        Err(CliError::ConfigError(msg)) => assert!(msg.contains("not found")),
        other => panic!("Expected a configuration error, got {:?}", other),
    }
}

#[test]
fn test_load_config_with_unsupported_schema() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join(DEFAULT_CONFIG_FILENAME);
    fs::write(&path, "schemaVersion = 2\n").unwrap();

    let result = load_config(&path);

    assert!(matches!(result, Err(CliError::ConfigError(_))));
}
