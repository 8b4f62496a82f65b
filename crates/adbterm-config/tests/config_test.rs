//! File-backed config loading and session persistence.

use std::time::Duration;

use pretty_assertions::assert_eq;

use adbterm_config::{Config, ConfigError, JsonSessionStore, load_config_from, save_config_to};
use adbterm_core::{Endpoint, SessionStore};

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = load_config_from(&dir.path().join("config.toml")).expect("load");

    assert_eq!(config.session, Config::default().session);
    assert_eq!(config.paths.device_downloads, "/storage/emulated/0/Download/");
}

#[test]
fn file_values_override_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[session]
poll_interval_ms = 250

[paths]
search_root = "/srv/apks"
device_downloads = "/sdcard/Transfer/"
"#,
    )
    .expect("write");

    let config = load_config_from(&path).expect("load");

    assert_eq!(config.poll_interval(), Duration::from_millis(250));
    assert_eq!(config.search_root(), std::path::PathBuf::from("/srv/apks"));
    assert_eq!(config.paths.device_downloads, "/sdcard/Transfer/");
}

#[test]
fn invalid_values_are_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.toml");

    std::fs::write(&path, "[session]\npoll_interval_ms = \"fast\"\n").expect("write");
    assert!(matches!(load_config_from(&path), Err(ConfigError::Figment(_))));

    std::fs::write(&path, "[session]\npoll_interval_ms = 0\n").expect("write");
    assert!(matches!(
        load_config_from(&path),
        Err(ConfigError::Validation { .. })
    ));
}

#[test]
fn saved_config_loads_back() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested/config.toml");
    let mut config = Config::default();
    config.tools.platform_tools = Some("/opt/android/platform-tools".into());
    config.session.poll_interval_ms = 750;

    save_config_to(&config, &path).expect("save");
    let loaded = load_config_from(&path).expect("load");

    assert_eq!(loaded.session.poll_interval_ms, 750);
    assert_eq!(loaded.paths, config.paths);
}

#[test]
fn session_record_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = JsonSessionStore::new(dir.path().join("data/session.json"));
    assert_eq!(store.load().expect("load"), None);

    let paired = Endpoint::new("10.0.0.5", None);
    store.save(&paired).expect("save");
    assert_eq!(store.load().expect("load"), Some(paired));

    let raw = std::fs::read_to_string(store.path()).expect("read");
    let json: serde_json::Value = serde_json::from_str(&raw).expect("json");
    assert_eq!(json, serde_json::json!({"ip": "10.0.0.5", "port": null}));

    let connected = Endpoint::new("10.0.0.5", Some("41235".into()));
    store.save(&connected).expect("save");
    assert_eq!(store.load().expect("load"), Some(connected));
}

#[test]
fn corrupt_session_record_is_a_persistence_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("session.json");
    std::fs::write(&path, "{ not json").expect("write");

    let err = JsonSessionStore::new(&path).load().expect_err("corrupt");
    assert!(matches!(err, adbterm_core::CoreError::Persistence { .. }));
}
