//! Unit tests for config module
//!
//! Tests configuration types, defaults, serialization and import merging.
//! Filesystem tests use temporary directories only.

#![allow(clippy::unwrap_used)]

use std::fs;

use tempfile::TempDir;

use crate::{
    ArtisanError,
    config::{CommandEntry, Config, ConfigPaths, LogFormat, LogLevel},
};

#[test]
fn config_default() {
    let config = Config::default();

    assert_eq!(config.app.name, None);
    assert!(!config.app.debug);
    assert!(config.rc.commands.is_empty());
    assert_eq!(config.logging.level, LogLevel::Warn);
    assert_eq!(config.logging.format, LogFormat::Pretty);
}

#[test]
fn config_deserialize_toml() {
    let config = Config::from_toml_str(
        r#"
        [app]
        name = "Playground"
        version = "2.0.0"
        debug = true

        [rc.commands]
        hello = "./commands/hello.rs"
        serve = { path = "./commands/serve.rs", stayAlive = true }

        [logging]
        level = "info"
        format = "json"
    "#,
    )
    .unwrap();

    assert_eq!(config.app.name.as_deref(), Some("Playground"));
    assert_eq!(config.app.version.as_deref(), Some("2.0.0"));
    assert!(config.app.debug);
    assert_eq!(config.rc.commands.len(), 2);
    assert_eq!(config.logging.level, LogLevel::Info);
    assert_eq!(config.logging.format, LogFormat::Json);
}

#[test]
fn command_entry_defaults() {
    let entry: CommandEntry = toml::from_str(r#"path = "./commands/make.rs""#).unwrap();

    assert!(!entry.load_app);
    assert!(!entry.stay_alive);
    assert!(!entry.load_all_commands);
    assert_eq!(entry.environments, vec!["console".to_string()]);
}

#[test]
fn malformed_command_record_does_not_fail_loading() {
    let config = Config::from_toml_str(
        r#"
        [rc.commands.serve]
        stayAlive = "forever"
    "#,
    )
    .unwrap();

    let record = config.rc.commands["serve"].clone();
    assert!(record.try_into::<CommandEntry>().is_err());
}

#[test]
fn invalid_toml_is_a_parse_error() {
    let error = Config::from_toml_str("[app\nname =").unwrap_err();

    assert!(matches!(error, ArtisanError::TomlParseError { .. }));
}

#[test]
fn invalid_field_type_is_rejected() {
    let error = Config::from_toml_str(
        r#"
        [logging]
        level = "loud"
    "#,
    )
    .unwrap_err();

    assert!(matches!(error, ArtisanError::TomlParseError { .. }));
}

#[test]
fn imports_merge_under_main_file() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("base.toml"),
        r#"
        [app]
        name = "Base"
        version = "1.0.0"

        [rc.commands.serve]
        stayAlive = true
    "#,
    )
    .unwrap();

    let main = dir.path().join(".artisanrc.toml");
    fs::write(
        &main,
        r#"
        "@base" = true

        [app]
        name = "Main"
    "#,
    )
    .unwrap();

    let config = Config::load_with_imports(&main).unwrap();

    assert_eq!(config.app.name.as_deref(), Some("Main"));
    assert_eq!(config.app.version.as_deref(), Some("1.0.0"));
    assert!(config.rc.commands.contains_key("serve"));
}

#[test]
fn missing_import_is_an_import_error() {
    let dir = TempDir::new().unwrap();
    let main = dir.path().join(".artisanrc.toml");
    fs::write(&main, r#""@missing" = true"#).unwrap();

    let error = Config::load_with_imports(&main).unwrap_err();

    assert!(matches!(error, ArtisanError::ImportError { .. }));
}

#[test]
fn import_path_gets_toml_extension() {
    let base = std::path::Path::new("/project/.artisanrc.toml");

    assert_eq!(
        Config::resolve_import_path(base, "shared/commands").unwrap(),
        std::path::PathBuf::from("/project/shared/commands.toml")
    );
    assert_eq!(
        Config::resolve_import_path(base, "extra.toml").unwrap(),
        std::path::PathBuf::from("/project/extra.toml")
    );
}

#[test]
fn ensure_log_dir_creates_directory() {
    let dir = TempDir::new().unwrap();
    let logs = dir.path().join("logs").join("artisan");

    let created = ConfigPaths::ensure_log_dir(&logs).unwrap();

    assert_eq!(created, logs);
    assert!(logs.is_dir());
}
