//! Process identity snapshots taken during specialization.
//!
//! # Responsibility
//! - Hold the host-provided identity fields in owned Rust types.
//! - Decide which process the module is running in.
//!
//! # Invariants
//! - Snapshots are transient: built once per specialization, never persisted.
//! - Target detection is a plain substring test on the data directory.
//!
//! # See also
//! - docs/architecture/lifecycle.md

/// Package name of the SystemUI process hosting the keyguard.
pub const SYSTEMUI_PACKAGE: &str = "com.android.systemui";

/// Process the module is currently loaded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetProcess {
    /// SystemUI, owner of the keyguard PIN pad.
    SystemUi,
    /// The system server (`android` package).
    SystemServer,
    /// Any other app process.
    Other,
}

impl TargetProcess {
    /// Stable label used in log lines.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SystemUi => "systemui",
            Self::SystemServer => "system_server",
            Self::Other => "other",
        }
    }
}

/// Classifies an app process by its private data directory.
///
/// Returns `SystemUi` when `data_dir` contains `target_package`, which also
/// matches per-user paths such as `/data/user/10/com.android.systemui`.
pub fn classify_data_dir(data_dir: Option<&str>, target_package: &str) -> TargetProcess {
    match data_dir {
        Some(dir) if !target_package.is_empty() && dir.contains(target_package) => {
            TargetProcess::SystemUi
        }
        _ => TargetProcess::Other,
    }
}

/// Identity of an app process about to be specialized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessIdentity {
    pub uid: i32,
    pub gid: i32,
    /// Supplementary group ids.
    pub gids: Vec<i32>,
    pub runtime_flags: i32,
    /// Process name as given by the activity manager, when present.
    pub nice_name: Option<String>,
    /// Private data directory, e.g. `/data/user_de/0/com.android.systemui`.
    pub app_data_dir: Option<String>,
}

impl ProcessIdentity {
    pub fn target(&self, target_package: &str) -> TargetProcess {
        classify_data_dir(self.app_data_dir.as_deref(), target_package)
    }
}

/// Identity of the system server about to be specialized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerIdentity {
    pub uid: i32,
    pub gid: i32,
    pub gids: Vec<i32>,
    pub runtime_flags: i32,
    pub permitted_capabilities: i64,
    pub effective_capabilities: i64,
}
