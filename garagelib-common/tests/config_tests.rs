//! Config file and root folder resolution tests

use garagelib_common::config::{
    ensure_root_folder, env_value, resolve_root_folder, TomlConfig, DATABASE_FILE_NAME,
    ROOT_FOLDER_ENV,
};
use serial_test::serial;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
fn test_load_explicit_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
        bot_token = "123:abc"
        bot_version = "v1.2"
        release_notes = "Artist cards"
        health_port = 5790
        "#,
    )
    .unwrap();

    let config = TomlConfig::load_or_default(Some(&path)).unwrap();
    assert_eq!(config.bot_token.as_deref(), Some("123:abc"));
    assert_eq!(config.bot_version.as_deref(), Some("v1.2"));
    assert_eq!(config.health_port, Some(5790));
}

#[test]
fn test_explicit_missing_config_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("absent.toml");
    assert!(TomlConfig::load_or_default(Some(&path)).is_err());
}

#[test]
fn test_malformed_config_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "storage_chat_id = \"not a number\"").unwrap();
    assert!(TomlConfig::load(&path).is_err());
}

#[test]
#[serial]
fn test_env_root_folder_wins_over_toml() {
    std::env::set_var(ROOT_FOLDER_ENV, "/from/env");
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/from/toml")),
        ..Default::default()
    };

    let resolved = resolve_root_folder(None, &config);
    std::env::remove_var(ROOT_FOLDER_ENV);

    assert_eq!(resolved, PathBuf::from("/from/env"));
}

#[test]
#[serial]
fn test_toml_root_folder_used_without_env() {
    std::env::remove_var(ROOT_FOLDER_ENV);
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/from/toml")),
        ..Default::default()
    };
    assert_eq!(resolve_root_folder(None, &config), Path::new("/from/toml"));
}

#[test]
#[serial]
fn test_env_value_skips_blank_and_respects_order() {
    std::env::set_var("GARAGELIB_TEST_PRIMARY", "  ");
    std::env::set_var("GARAGELIB_TEST_LEGACY", "legacy");

    assert_eq!(
        env_value(&["GARAGELIB_TEST_PRIMARY", "GARAGELIB_TEST_LEGACY"]).as_deref(),
        Some("legacy")
    );

    std::env::set_var("GARAGELIB_TEST_PRIMARY", "primary");
    assert_eq!(
        env_value(&["GARAGELIB_TEST_PRIMARY", "GARAGELIB_TEST_LEGACY"]).as_deref(),
        Some("primary")
    );

    std::env::remove_var("GARAGELIB_TEST_PRIMARY");
    std::env::remove_var("GARAGELIB_TEST_LEGACY");
}

#[test]
fn test_ensure_root_folder_creates_directory() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("garagelib");

    let db_path = ensure_root_folder(&root).unwrap();

    assert!(root.is_dir());
    assert_eq!(db_path, root.join(DATABASE_FILE_NAME));
}
