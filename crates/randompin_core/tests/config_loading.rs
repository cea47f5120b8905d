use randompin_core::{ConfigError, ModuleConfig, CONFIG_FILE_NAME};
use std::fs;

#[test]
fn missing_config_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = ModuleConfig::load_from_dir(dir.path()).expect("defaults");
    assert_eq!(config, ModuleConfig::default());
}

#[test]
fn installed_config_file_is_parsed() {
    let dir = tempfile::tempdir().expect("temp dir");
    fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        r#"{
            "shuffle_keypad": true,
            "min_digit_keys": 9,
            "double_tap_lock": false,
            "log_level": "debug"
        }"#,
    )
    .expect("write config");

    let config = ModuleConfig::load_from_dir(dir.path()).expect("valid config");
    assert_eq!(config.min_digit_keys, 9);
    assert!(!config.double_tap_lock);
    assert_eq!(config.log_level, "debug");
    assert_eq!(config.target_package, "com.android.systemui");
}

#[test]
fn unknown_keys_are_ignored() {
    let dir = tempfile::tempdir().expect("temp dir");
    fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        r#"{"enabled": false, "theme": "dark"}"#,
    )
    .expect("write config");

    let config = ModuleConfig::load_from_dir(dir.path()).expect("forward compatible");
    assert!(!config.enabled);
}

#[test]
fn invalid_config_file_reports_violation() {
    let dir = tempfile::tempdir().expect("temp dir");
    fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        r#"{"target_package": "systemui"}"#,
    )
    .expect("write config");

    let err = ModuleConfig::load_from_dir(dir.path()).expect_err("single segment package");
    assert!(matches!(err, ConfigError::Invalid(_)));
    assert!(err.to_string().contains("target_package"));
}

#[test]
fn unreadable_config_path_is_an_io_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    fs::create_dir(dir.path().join(CONFIG_FILE_NAME)).expect("directory in place of file");

    let err = ModuleConfig::load_from_dir(dir.path()).expect_err("directory is not a config");
    assert!(matches!(err, ConfigError::Io(_)));
}
