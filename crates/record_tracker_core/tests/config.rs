use record_tracker_core::config::{DATABASE_URL_ENV, DEFAULT_DATABASE_URL};
use record_tracker_core::{ConfigError, StoreBackend, TrackerConfig};
use std::io::Write;
use std::path::PathBuf;

#[test]
fn empty_config_uses_defaults() {
    let config = TrackerConfig::from_toml_str("").unwrap();

    assert_eq!(config, TrackerConfig::default());
    assert_eq!(config.store.backend, StoreBackend::Http);
    assert_eq!(config.store.url, DEFAULT_DATABASE_URL);
    assert_eq!(config.store.retry.max_attempts, 1);
    assert!(config.logging.dir.is_none());
}

#[test]
fn file_config_overrides_sections() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[store]
backend = "sqlite"
sqlite_path = "/tmp/tracker.sqlite3"

[store.retry]
max_attempts = 3

[logging]
level = "warn"
dir = "/var/log/tracker"
"#
    )
    .unwrap();

    let config = TrackerConfig::load(file.path()).unwrap();
    assert_eq!(config.store.backend, StoreBackend::Sqlite);
    assert_eq!(config.store.sqlite_path, PathBuf::from("/tmp/tracker.sqlite3"));
    assert_eq!(config.store.retry.max_attempts, 3);
    assert_eq!(config.store.retry.base_backoff_ms, 120);
    assert_eq!(config.logging.level, "warn");
    assert_eq!(config.logging.dir, Some(PathBuf::from("/var/log/tracker")));
}

#[test]
fn env_override_replaces_url() {
    let mut config = TrackerConfig::default();
    config.apply_env_overrides(|key| {
        (key == DATABASE_URL_ENV).then(|| " https://other-db.example.com/ ".to_string())
    });
    assert_eq!(config.store.url, "https://other-db.example.com/");

    config.apply_env_overrides(|_| Some("   ".to_string()));
    assert_eq!(config.store.url, "https://other-db.example.com/");
}

#[test]
fn invalid_values_are_rejected() {
    let err = TrackerConfig::from_toml_str("[store]\ntimeout_ms = 0\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(ref message) if message.contains("timeout_ms")));

    let err = TrackerConfig::from_toml_str("[store]\nbackend = \"ftp\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));

    let err = TrackerConfig::from_toml_str("[store.retry]\nmax_attempts = 0\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = TrackerConfig::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}
