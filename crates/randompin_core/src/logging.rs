//! Logging bootstrap for code injected into host processes.
//!
//! # Responsibility
//! - Initialize the platform log backend exactly once per process.
//! - Emit stable, metadata-only diagnostic events.
//!
//! # Invariants
//! - Logging init is idempotent for the same tag; a repeated call only
//!   applies its level.
//! - Logging initialization must not panic.
//! - Re-initialization with a different tag is rejected.
//! - The `log` max level is the only level gate; backends accept everything.
//!
//! # See also
//! - docs/architecture/logging.md

use log::{error, info, LevelFilter};
use once_cell::sync::OnceCell;

const MAX_PANIC_PAYLOAD_CHARS: usize = 160;

static LOGGING_STATE: OnceCell<LoggingState> = OnceCell::new();
static PANIC_HOOK_INSTALLED: OnceCell<()> = OnceCell::new();

#[cfg(target_os = "android")]
type BackendHandle = ();
#[cfg(not(target_os = "android"))]
type BackendHandle = flexi_logger::LoggerHandle;

struct LoggingState {
    tag: String,
    _backend: BackendHandle,
}

/// Initializes logging with level and tag.
///
/// On Android the tag is the logcat tag; elsewhere lines go to stderr.
///
/// # Invariants
/// - Calling this function repeatedly with the same `tag` is idempotent; a
///   different `level` on a repeated call is applied as in [`set_level`].
/// - Re-initialization with a different `tag` is rejected.
/// - Initialization never panics.
///
/// # Errors
/// - Returns an error when `level` is unsupported or `tag` is empty.
/// - Returns an error when the logger backend setup fails.
pub fn init_logging(level: &str, tag: &str) -> Result<(), String> {
    let normalized_level = normalize_level(level)?;
    let normalized_tag = normalize_tag(tag)?;

    if let Some(state) = LOGGING_STATE.get() {
        if state.tag != normalized_tag {
            return Err(format!(
                "logging already initialized with tag `{}`; refusing to switch to `{}`",
                state.tag, normalized_tag
            ));
        }
        log::set_max_level(level_filter(normalized_level));
        return Ok(());
    }

    let state = LOGGING_STATE.get_or_try_init(|| -> Result<LoggingState, String> {
        let backend = start_backend(normalized_tag)?;
        log::set_max_level(level_filter(normalized_level));

        install_panic_hook_once();

        info!(
            "event=module_load module=core status=ok platform={} build_mode={} version={}",
            std::env::consts::OS,
            build_mode(),
            env!("CARGO_PKG_VERSION")
        );
        info!(
            "event=logging_init module=core status=ok level={} pid={}",
            normalized_level,
            std::process::id()
        );

        Ok(LoggingState {
            tag: normalized_tag.to_string(),
            _backend: backend,
        })
    })?;

    if state.tag != normalized_tag {
        return Err(format!(
            "logging already initialized with tag `{}`; refusing to switch to `{}`",
            state.tag, normalized_tag
        ));
    }

    Ok(())
}

/// Changes the active max level, e.g. after the module config is read.
pub fn set_level(level: &str) -> Result<(), String> {
    let normalized = normalize_level(level)?;
    log::set_max_level(level_filter(normalized));
    Ok(())
}

/// Returns active logging status metadata.
///
/// Returns `None` when logging has not been initialized.
/// Returns `(max_level, tag)` when logging is active.
pub fn logging_status() -> Option<(LevelFilter, String)> {
    LOGGING_STATE
        .get()
        .map(|state| (log::max_level(), state.tag.clone()))
}

/// Returns the default log level for current build mode.
///
/// - `debug` builds -> `debug`
/// - `release` builds -> `info`
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

pub(crate) fn normalize_level(level: &str) -> Result<&'static str, String> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(format!(
            "unsupported log level `{other}`; expected trace|debug|info|warn|error"
        )),
    }
}

fn normalize_tag(tag: &str) -> Result<&str, String> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        return Err("log tag cannot be empty".to_string());
    }
    Ok(trimmed)
}

fn level_filter(level: &str) -> LevelFilter {
    match level {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    }
}

#[cfg(target_os = "android")]
fn start_backend(tag: &str) -> Result<BackendHandle, String> {
    android_logger::init_once(
        android_logger::Config::default()
            .with_max_level(LevelFilter::Trace)
            .with_tag(tag),
    );
    Ok(())
}

#[cfg(not(target_os = "android"))]
fn start_backend(tag: &str) -> Result<BackendHandle, String> {
    flexi_logger::Logger::try_with_str("trace")
        .map_err(|err| format!("invalid log spec for `{tag}`: {err}"))?
        .log_to_stderr()
        .format_for_stderr(flexi_logger::detailed_format)
        .start()
        .map_err(|err| format!("failed to start logger: {err}"))
}

fn build_mode() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "release"
    }
}

fn install_panic_hook_once() {
    if PANIC_HOOK_INSTALLED.get().is_some() {
        return;
    }

    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        // Payload may carry arbitrary text from the host process; sanitize and
        // cap it before it reaches the system log.
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = panic_payload_summary(panic_info);
        error!(
            "event=panic_captured module=core status=error location={} payload={}",
            location, payload
        );
        previous_hook(panic_info);
    }));

    let _ = PANIC_HOOK_INSTALLED.set(());
}

fn panic_payload_summary(info: &std::panic::PanicHookInfo<'_>) -> String {
    let payload = if let Some(message) = info.payload().downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = info.payload().downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    };

    sanitize_message(&payload, MAX_PANIC_PAYLOAD_CHARS)
}

fn sanitize_message(value: &str, max_chars: usize) -> String {
    let normalized = value.replace(['\n', '\r'], " ");
    let mut truncated = normalized.chars().take(max_chars).collect::<String>();
    if normalized.chars().count() > max_chars {
        truncated.push_str("...");
    }
    truncated
}
