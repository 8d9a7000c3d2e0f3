use deduplicate_files::config::{Config, DEFAULT_IO_THREADS};
use deduplicate_files::duplicates::KeepPolicy;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_config_round_trip_on_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("deep/er/config.json");
    let config = Config {
        keep: Some(KeepPolicy::Oldest),
        quarantine_dir: Some(PathBuf::from("/srv/quarantine")),
        io_threads: Some(12),
    };

    config.save_to(&path).unwrap();
    let raw = fs::read_to_string(&path).unwrap();
    assert!(raw.contains("\"oldest\""));
    assert_eq!(Config::load_from(&path).unwrap(), config);
}

#[test]
fn test_unknown_keys_are_ignored() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{"io_threads": 2, "theme": "dark"}"#).unwrap();

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.io_threads_or(None), 2);
    assert_eq!(config.keep_or(None), KeepPolicy::LongestPath);
}

#[test]
fn test_bad_policy_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{"keep": "newest"}"#).unwrap();

    assert!(Config::load_from(&path).is_err());
}

#[test]
fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.io_threads_or(None), DEFAULT_IO_THREADS);
    assert!(Config::config_path().map_or(true, |p| p.ends_with("config.json")));
}
