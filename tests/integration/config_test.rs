use boxwatch::core::config::{AppConfig, CONFIG_VERSION};
use boxwatch::core::rule::{MonitorType, Rule};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_load_missing_file_writes_default() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("boxwatch").join("config.json");

    let config = AppConfig::load(&path).unwrap();
    assert_eq!(config, AppConfig::default());
    assert!(path.exists());

    // The written file loads back unchanged
    assert_eq!(AppConfig::load(&path).unwrap(), config);
}

#[test]
fn test_save_and_load_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");

    let mut config = AppConfig::default();
    config.name = "db-1".to_string();
    config.interval = "5s".to_string();
    config.rules.push(Rule::new(MonitorType::Disk, ">=90%", "/"));
    config.save(&path).unwrap();

    let loaded = AppConfig::load(&path).unwrap();
    assert_eq!(loaded.name, "db-1");
    assert_eq!(loaded.rules.len(), 2);
    assert_eq!(loaded.rules[1], Rule::new(MonitorType::Disk, ">=90%", "/"));
}

#[test]
fn test_old_config_is_migrated_and_backed_up() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    let original = r#"{
        "version": 2,
        "interval": "7s",
        "rate": "2/1m",
        "name": "legacy",
        "rules": [
            { "type": "memory", "threshold": ">=90%", "matcher": "used" },
            { "type": "network", "threshold": ">=10m/s", "matcher": "eth0-in" }
        ],
        "pushes": []
    }"#;
    fs::write(&path, original).unwrap();

    let config = AppConfig::load(&path).unwrap();
    assert_eq!(config.version, CONFIG_VERSION);
    assert_eq!(config.name, "legacy");
    assert_eq!(config.rules[0].monitor_type, MonitorType::Mem);
    assert_eq!(config.rules[1].monitor_type, MonitorType::Net);
    assert!(config.validate().is_empty());

    let backup = temp_dir.path().join("config.json.bak");
    assert_eq!(fs::read_to_string(backup).unwrap(), original);

    // The rewritten file is already current
    let rewritten: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(rewritten["version"], CONFIG_VERSION);
    assert_eq!(rewritten["rules"][0]["type"], "mem");
}

#[test]
fn test_newer_config_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    fs::write(&path, format!(r#"{{ "version": {} }}"#, CONFIG_VERSION + 1)).unwrap();

    assert!(AppConfig::load(&path).is_err());
    assert!(!temp_dir.path().join("config.json.bak").exists());
}

#[test]
fn test_unknown_monitor_type_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    fs::write(
        &path,
        format!(
            r#"{{ "version": {}, "rules": [{{ "type": "gpu", "threshold": ">1%", "matcher": "" }}] }}"#,
            CONFIG_VERSION
        ),
    )
    .unwrap();

    assert!(AppConfig::load(&path).is_err());
}

#[test]
fn test_missing_optional_fields_use_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    fs::write(&path, format!(r#"{{ "version": {} }}"#, CONFIG_VERSION)).unwrap();

    let config = AppConfig::load(&path).unwrap();
    assert_eq!(config.interval, "7s");
    assert_eq!(config.rate, "1/1m");
    assert_eq!(config.name, "Server 1");
    assert!(config.rules.is_empty());
    assert!(config.pushes.is_empty());
}
