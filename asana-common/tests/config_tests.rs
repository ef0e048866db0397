//! Configuration loading and root folder resolution tests
//!
//! Tests that manipulate environment variables are marked with #[serial]
//! so they never race each other.

use asana_common::config::{
    load_toml_config, RootFolderInitializer, RootFolderResolver, TomlConfig, DATABASE_FILE_NAME,
};
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};

const TEST_ENV_VAR: &str = "ASANA_TEST_ROOT_FOLDER";

#[test]
#[serial]
fn test_cli_argument_wins_over_everything() {
    env::set_var(TEST_ENV_VAR, "/from/env");
    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/from/toml")),
        ..Default::default()
    };

    let resolver = RootFolderResolver::with_env_var(TEST_ENV_VAR);
    let root = resolver.resolve(Some(Path::new("/from/cli")), &toml);

    assert_eq!(root, PathBuf::from("/from/cli"));
    env::remove_var(TEST_ENV_VAR);
}

#[test]
#[serial]
fn test_env_wins_over_toml() {
    env::set_var(TEST_ENV_VAR, "/from/env");
    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/from/toml")),
        ..Default::default()
    };

    let root = RootFolderResolver::with_env_var(TEST_ENV_VAR).resolve(None, &toml);

    assert_eq!(root, PathBuf::from("/from/env"));
    env::remove_var(TEST_ENV_VAR);
}

#[test]
#[serial]
fn test_toml_used_when_env_missing() {
    env::remove_var(TEST_ENV_VAR);
    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/from/toml")),
        ..Default::default()
    };

    let root = RootFolderResolver::with_env_var(TEST_ENV_VAR).resolve(None, &toml);

    assert_eq!(root, PathBuf::from("/from/toml"));
}

#[test]
#[serial]
fn test_falls_back_to_compiled_default() {
    env::remove_var(TEST_ENV_VAR);

    let root = RootFolderResolver::with_env_var(TEST_ENV_VAR).resolve(None, &TomlConfig::default());

    assert!(!root.as_os_str().is_empty());
    assert!(root.to_string_lossy().contains("asana"));
}

#[test]
fn test_missing_toml_file_yields_defaults() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = load_toml_config(&temp_dir.path().join("missing.toml")).unwrap();

    assert_eq!(config, TomlConfig::default());
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_partial_toml_file_loads() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("asana-ci.toml");
    std::fs::write(
        &path,
        r#"
collaborator_url = "https://admin.example.com/api"
request_timeout_secs = 20

[logging]
level = "debug"
"#,
    )
    .unwrap();

    let config = load_toml_config(&path).unwrap();

    assert_eq!(
        config.collaborator_url.as_deref(),
        Some("https://admin.example.com/api")
    );
    assert_eq!(config.request_timeout_secs, Some(20));
    assert_eq!(config.logging.level, "debug");
    assert!(config.root_folder.is_none());
}

#[test]
fn test_malformed_toml_is_config_error() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("broken.toml");
    std::fs::write(&path, "collaborator_url = [unterminated").unwrap();

    let result = load_toml_config(&path);

    assert!(matches!(result, Err(asana_common::Error::Config(_))));
}

#[test]
fn test_initializer_creates_layout() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path().join("nested").join("root");
    let initializer = RootFolderInitializer::new(root.clone());

    initializer.ensure_directory_exists().unwrap();

    assert!(root.is_dir());
    assert!(initializer.previews_dir().is_dir());
    assert_eq!(initializer.database_path(), root.join(DATABASE_FILE_NAME));
    assert_eq!(initializer.root_folder(), root.as_path());
}
