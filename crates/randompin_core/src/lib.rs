//! Core domain logic for the RandomPIN module.
//! This crate holds everything that does not depend on the Zygisk host or JNI.

pub mod config;
pub mod gesture;
pub mod hook;
pub mod keypad;
pub mod logging;
pub mod model;

pub use config::{ConfigError, ConfigViolation, ModuleConfig, CONFIG_FILE_NAME};
pub use gesture::{
    is_tap_command, DoubleTapDetector, TapOutcome, MOTION_ACTION_DOWN, WALLPAPER_TAP_ACTION,
};
pub use hook::{HookPhase, HookPlan, HookPurpose, HookSignature, HookTarget};
pub use keypad::{
    classify_key, find_pin_container, plan_shuffle, KeyRole, KeySnapshot, KeypadContainer,
    KeypadError, KeypadSession, ShuffleOutcome, ShufflePlan, ViewNode,
};
pub use logging::{default_log_level, init_logging, logging_status, set_level};
pub use model::process::{
    classify_data_dir, ProcessIdentity, ServerIdentity, TargetProcess, SYSTEMUI_PACKAGE,
};

/// Stable module id, matching `id=` in the module's `module.prop`.
pub const MODULE_ID: &str = "randompin";

/// Log tag used for every line this module emits.
pub const LOG_TAG: &str = "RandomPIN";

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
