use std::time::Duration;

use podhut_core::{Config, ConfigError, DEFAULT_API_BASE};

#[test]
fn missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();

    let config = Config::load_from(&dir.path().join("config.json")).unwrap();

    assert_eq!(config, Config::default());
    assert_eq!(config.api_base, DEFAULT_API_BASE);
    assert_eq!(config.shows_ttl(), Duration::from_secs(300));
    assert_eq!(config.show_ttl(), Duration::from_secs(600));
    assert_eq!(config.progress_interval(), Duration::from_secs(10));
    assert_eq!(config.page_size, 15);
}

#[test]
fn partial_file_fills_in_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"api_base": "http://localhost:8080", "skip_seconds": 30}"#).unwrap();

    let config = Config::load_from(&path).unwrap();

    assert_eq!(config.api_base, "http://localhost:8080");
    assert_eq!(config.skip_seconds, 30.0);
    assert_eq!(config.search_threshold, 0.4);
}

#[test]
fn save_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.json");
    let config = Config {
        data_dir: Some(dir.path().join("data")),
        page_size: 20,
        ..Config::default()
    };

    config.save_to(&path).unwrap();
    let loaded = Config::load_from(&path).unwrap();

    assert_eq!(loaded, config);
    assert_eq!(loaded.data_dir(), dir.path().join("data"));
}

#[test]
fn malformed_file_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    let result = Config::load_from(&path);

    assert!(matches!(result, Err(ConfigError::Parse { .. })));
}
