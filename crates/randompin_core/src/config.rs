//! Module configuration stored as `config.json` in the module directory.
//!
//! # Responsibility
//! - Parse and validate user-editable module settings.
//! - Fall back to defaults when no config file is installed.
//!
//! # Invariants
//! - Every key is optional; omitted keys take their default value.
//! - A config returned from this module has passed `validate()`.
//! - `target_package` is stored without surrounding whitespace, exactly as it
//!   is matched against data directories.

use crate::gesture::{DEFAULT_DOUBLE_TAP_MIN_INTERVAL_MS, DEFAULT_DOUBLE_TAP_TIMEOUT_MS};
use crate::keypad::FULL_PAD_DIGITS;
use crate::logging::normalize_level;
use crate::model::process::SYSTEMUI_PACKAGE;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{ErrorKind, Read};
use std::path::Path;

/// File name looked up inside the module directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// User-facing module settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ModuleConfig {
    /// Master switch; when false the module unloads itself everywhere.
    pub enabled: bool,
    /// Package whose data directory marks the keyguard process.
    pub target_package: String,
    pub shuffle_keypad: bool,
    /// Digit keys that must be present before a pad is shuffled (1..=10).
    pub min_digit_keys: usize,
    pub double_tap_lock: bool,
    pub double_tap_timeout_ms: u64,
    pub double_tap_min_interval_ms: u64,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            target_package: SYSTEMUI_PACKAGE.to_string(),
            shuffle_keypad: true,
            min_digit_keys: FULL_PAD_DIGITS,
            double_tap_lock: true,
            double_tap_timeout_ms: DEFAULT_DOUBLE_TAP_TIMEOUT_MS,
            double_tap_min_interval_ms: DEFAULT_DOUBLE_TAP_MIN_INTERVAL_MS,
            log_level: "info".to_string(),
        }
    }
}

impl ModuleConfig {
    /// Parses and validates a JSON config document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        config.target_package = config.target_package.trim().to_string();
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config document.
    pub fn from_reader(mut reader: impl Read) -> Result<Self, ConfigError> {
        let mut raw = String::new();
        reader.read_to_string(&mut raw).map_err(ConfigError::Io)?;
        Self::from_json_str(&raw)
    }

    /// Loads `config.json` from `module_dir`.
    ///
    /// Returns defaults when the file does not exist.
    ///
    /// # Errors
    /// - `Io` when the file exists but cannot be read.
    /// - `Parse` / `Invalid` when the content is malformed.
    pub fn load_from_dir(module_dir: &Path) -> Result<Self, ConfigError> {
        let path = module_dir.join(CONFIG_FILE_NAME);
        match std::fs::File::open(&path) {
            Ok(file) => Self::from_reader(file),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    /// Validates value ranges and cross-field constraints.
    ///
    /// `target_package` is checked as stored; padding is rejected here since
    /// a padded package never matches a data directory.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_package_name(&self.target_package) {
            return Err(ConfigError::Invalid(ConfigViolation::TargetPackage(
                self.target_package.clone(),
            )));
        }
        if self.min_digit_keys == 0 || self.min_digit_keys > FULL_PAD_DIGITS {
            return Err(ConfigError::Invalid(ConfigViolation::MinDigitKeys(
                self.min_digit_keys,
            )));
        }
        if self.double_tap_min_interval_ms >= self.double_tap_timeout_ms {
            return Err(ConfigError::Invalid(ConfigViolation::DoubleTapWindow {
                min_interval_ms: self.double_tap_min_interval_ms,
                timeout_ms: self.double_tap_timeout_ms,
            }));
        }
        if normalize_level(&self.log_level).is_err() {
            return Err(ConfigError::Invalid(ConfigViolation::LogLevel(
                self.log_level.clone(),
            )));
        }
        Ok(())
    }
}

fn is_valid_package_name(value: &str) -> bool {
    let mut segments = 0;
    for segment in value.split('.') {
        let mut chars = segment.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() => {}
            _ => return false,
        }
        if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return false;
        }
        segments += 1;
    }
    segments >= 2
}

/// Rejected config values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigViolation {
    TargetPackage(String),
    MinDigitKeys(usize),
    DoubleTapWindow { min_interval_ms: u64, timeout_ms: u64 },
    LogLevel(String),
}

impl Display for ConfigViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TargetPackage(value) => write!(f, "target_package is invalid: `{value}`"),
            Self::MinDigitKeys(value) => {
                write!(f, "min_digit_keys must be within 1..={FULL_PAD_DIGITS}, got {value}")
            }
            Self::DoubleTapWindow {
                min_interval_ms,
                timeout_ms,
            } => write!(
                f,
                "double_tap_min_interval_ms ({min_interval_ms}) must be below double_tap_timeout_ms ({timeout_ms})"
            ),
            Self::LogLevel(value) => write!(f, "log_level is unsupported: `{value}`"),
        }
    }
}

/// Config loading errors.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(ConfigViolation),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read module config: {err}"),
            Self::Parse(err) => write!(f, "failed to parse module config: {err}"),
            Self::Invalid(violation) => write!(f, "invalid module config: {violation}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{is_valid_package_name, ConfigError, ConfigViolation, ModuleConfig};

    #[test]
    fn empty_document_yields_defaults() {
        let config = ModuleConfig::from_json_str("{}").expect("empty object");
        assert_eq!(config, ModuleConfig::default());
        assert_eq!(config.target_package, "com.android.systemui");
        assert_eq!(config.min_digit_keys, 10);
    }

    #[test]
    fn partial_document_overrides_only_given_keys() {
        let config =
            ModuleConfig::from_json_str(r#"{"double_tap_lock": false, "log_level": "DEBUG"}"#)
                .expect("partial config");
        assert!(!config.double_tap_lock);
        assert!(config.shuffle_keypad);
        assert_eq!(config.log_level, "DEBUG");
    }

    #[test]
    fn rejects_out_of_range_digit_minimum() {
        let err = ModuleConfig::from_json_str(r#"{"min_digit_keys": 11}"#)
            .expect_err("eleven digits do not exist");
        assert!(matches!(
            err,
            ConfigError::Invalid(ConfigViolation::MinDigitKeys(11))
        ));
    }

    #[test]
    fn rejects_inverted_double_tap_window() {
        let err = ModuleConfig::from_json_str(
            r#"{"double_tap_timeout_ms": 100, "double_tap_min_interval_ms": 100}"#,
        )
        .expect_err("empty window");
        assert!(matches!(
            err,
            ConfigError::Invalid(ConfigViolation::DoubleTapWindow { .. })
        ));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = ModuleConfig::from_json_str("{ enabled: true").expect_err("not json");
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("parse"));
    }

    #[test]
    fn padded_target_package_is_trimmed_on_parse() {
        let config =
            ModuleConfig::from_json_str(r#"{"target_package": " com.android.systemui "}"#)
                .expect("padding is tolerated in the file");
        assert_eq!(config.target_package, "com.android.systemui");
    }

    #[test]
    fn padded_target_package_fails_direct_validation() {
        let config = ModuleConfig {
            target_package: "com.android.systemui\n".to_string(),
            ..ModuleConfig::default()
        };
        let err = config.validate().expect_err("padding never matches a data dir");
        assert!(matches!(
            err,
            ConfigError::Invalid(ConfigViolation::TargetPackage(_))
        ));
    }

    #[test]
    fn package_name_rules() {
        assert!(is_valid_package_name("com.android.systemui"));
        assert!(is_valid_package_name("com.vendor_x.keyguard2"));
        assert!(!is_valid_package_name("systemui"));
        assert!(!is_valid_package_name("com..systemui"));
        assert!(!is_valid_package_name("com.1android"));
        assert!(!is_valid_package_name(""));
    }
}
