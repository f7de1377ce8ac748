use saldo_config::{Appearance, Config, ConfigError, ConfigManager};
use tempfile::tempdir;

#[test]
fn default_config_targets_brazilian_real() {
    let cfg = Config::default();

    assert_eq!(cfg.locale, "pt-BR");
    assert_eq!(cfg.currency_symbol, "R$");
    assert_eq!(cfg.decimal_separator, ',');
    assert_eq!(cfg.recent_window, 10);
    assert!(!cfg.is_dark_mode());
    assert!(cfg.validate().is_ok());
}

#[test]
fn missing_file_loads_defaults() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::new(dir.path().join("config.json"));

    assert_eq!(manager.load().expect("load config"), Config::default());
}

#[test]
fn config_manager_persists_and_loads_config() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).expect("manager");

    let mut cfg = Config::default();
    cfg.currency = "USD".to_string();
    cfg.currency_symbol = "$".to_string();
    cfg.decimal_separator = '.';
    cfg.recent_window = 5;
    cfg.toggle_appearance();

    manager.save(&cfg).expect("save config");
    assert!(manager.config_path().exists());
    let loaded = manager.load().expect("load config");

    assert_eq!(loaded, cfg);
    assert!(loaded.is_dark_mode());
}

#[test]
fn partial_file_fills_in_defaults() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{"locale": "pt-BR", "currency": "BRL", "appearance": "Escuro"}"#,
    )
    .expect("write");

    let loaded = ConfigManager::new(path).load().expect("load config");
    assert_eq!(loaded.appearance, Appearance::Dark);
    assert_eq!(loaded.transactions_collection, "transactions");
    assert_eq!(loaded.users_collection, "users");
    assert_eq!(loaded.recent_window, 10);
}

#[test]
fn invalid_values_are_rejected_on_save() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::new(dir.path().join("config.json"));

    let cfg = Config {
        recent_window: 0,
        ..Config::default()
    };
    assert!(matches!(manager.save(&cfg), Err(ConfigError::Invalid(_))));
    assert!(!manager.config_path().exists());
}

#[test]
fn malformed_file_reports_serde_error() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{not json").expect("write");

    let err = ConfigManager::new(path).load().unwrap_err();
    assert!(matches!(err, ConfigError::Serde(_)));
}
