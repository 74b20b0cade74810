//! Config module tests

use crate::config::{Config, QueryConfig, StoreBackend};
use tempfile::TempDir;

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(config.store.backend, StoreBackend::Sqlite);
    assert!(config.store.path.is_none());
    assert_eq!(config.store.max_connections, 5);

    assert_eq!(config.query.default_org, "default");
    assert_eq!(config.query.default_limit, 100);
    assert_eq!(config.query.max_query_depth, 5);

    assert_eq!(config.metadata.repository, "default");
    assert_eq!(config.metadata.branch, "main");
    assert_eq!(config.metadata.version, "1.0.0");
    assert!(config.validate().is_ok());
}

#[test]
fn test_partial_file_fills_defaults() {
    let config: Config = toml::from_str(
        r#"
        [query]
        default_org = "acme"
        "#,
    )
    .expect("Should parse");

    assert_eq!(config.query.default_org, "acme");
    assert_eq!(config.query.default_limit, 100);
    assert_eq!(config.store.backend, StoreBackend::Sqlite);
}

#[test]
fn test_validate_rejects_bad_query_bounds() {
    let mut config = Config::default();
    config.query = QueryConfig {
        default_limit: 0,
        ..QueryConfig::default()
    };
    assert!(config.validate().is_err());

    config.query = QueryConfig {
        max_query_depth: 0,
        ..QueryConfig::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_get_and_set() {
    let mut config = Config::default();

    config.set("store.backend", "memory").unwrap();
    config.set("query.default_limit", "25").unwrap();
    config.set("metadata.branch", "develop").unwrap();

    assert_eq!(config.get("store.backend").unwrap(), "memory");
    assert_eq!(config.get("query.default_limit").unwrap(), "25");
    assert_eq!(config.get("metadata.branch").unwrap(), "develop");
}

#[test]
fn test_set_rejects_invalid_values() {
    let mut config = Config::default();

    assert!(config.set("store.backend", "postgres").is_err());
    assert!(config.set("query.default_limit", "-1").is_err());
    assert!(config.set("query.max_query_depth", "zero").is_err());
    assert!(config.set("query.default_org", "  ").is_err());
    assert!(config.set("nope", "1").is_err());
    assert!(config.get("nope").is_err());

    assert_eq!(config, Config::default());
}

#[test]
fn test_list_covers_every_key() {
    let config = Config::default();
    let listed = config.list().unwrap();

    assert_eq!(listed.len(), Config::KEYS.len());
    assert!(listed.contains(&("query.default_org".to_string(), "default".to_string())));
}

#[test]
fn test_save_and_load_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("config.toml");

    let mut config = Config::default();
    config.set("query.default_org", "acme").unwrap();
    config.set("store.path", "/tmp/graph.db").unwrap();
    config.save_to(&path).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_missing_file_loads_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let loaded = Config::load_from(&temp_dir.path().join("config.toml")).unwrap();
    assert_eq!(loaded, Config::default());
}

#[test]
fn test_invalid_file_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "[query]\nmax_query_depth = 0\n").unwrap();

    assert!(Config::load_from(&path).is_err());
}

#[test]
fn test_default_org_override() {
    let mut config = Config::default();

    config.apply_overrides(Some("globex".to_string()));
    assert_eq!(config.query.default_org, "globex");

    config.apply_overrides(Some(String::new()));
    assert_eq!(config.query.default_org, "globex");

    config.apply_overrides(None);
    assert_eq!(config.query.default_org, "globex");
}

#[test]
fn test_service_settings_follow_config() {
    let mut config = Config::default();
    config.set("query.max_query_depth", "3").unwrap();
    config.set("metadata.version", "2.1.0").unwrap();

    let settings = config.service_settings();
    assert_eq!(settings.max_query_depth, 3);
    assert_eq!(settings.version, "2.1.0");

    let db = config.database_config();
    assert_eq!(db.max_connections, 5);
    assert_eq!(db.path, config.store.resolved_path());
}
