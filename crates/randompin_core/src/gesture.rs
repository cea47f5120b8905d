//! Double tap on empty wallpaper to lock the screen.
//!
//! # Invariants
//! - A tap counts as the second of a pair only when it lands strictly between
//!   `min_interval_ms` and `timeout_ms` after the first.
//! - A completed pair disarms the detector; the next tap starts a new pair.

use log::debug;

/// Default upper bound between the two taps.
pub const DEFAULT_DOUBLE_TAP_TIMEOUT_MS: u64 = 400;
/// Default lower bound between the two taps; filters duplicate dispatch.
pub const DEFAULT_DOUBLE_TAP_MIN_INTERVAL_MS: u64 = 50;

/// Wallpaper command the system server receives for a tap on empty wallpaper.
pub const WALLPAPER_TAP_ACTION: &str = "android.wallpaper.tap";

/// `MotionEvent.ACTION_DOWN`, the masked action counted as a tap.
pub const MOTION_ACTION_DOWN: i32 = 0;

/// Returns true when one of a command's arguments is the tap action.
///
/// The action's position moved between releases, so every argument is checked.
pub fn is_tap_command<'a>(args: impl IntoIterator<Item = &'a str>) -> bool {
    args.into_iter().any(|arg| arg == WALLPAPER_TAP_ACTION)
}

/// Decision for one tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapOutcome {
    /// First tap of a potential pair, or a tap outside the window.
    Armed,
    /// Second tap of a pair: the screen should be locked.
    Lock,
}

/// Tracks wallpaper taps on the uptime clock.
#[derive(Debug, Clone)]
pub struct DoubleTapDetector {
    timeout_ms: u64,
    min_interval_ms: u64,
    last_tap_ms: Option<u64>,
}

impl Default for DoubleTapDetector {
    fn default() -> Self {
        Self::new(
            DEFAULT_DOUBLE_TAP_TIMEOUT_MS,
            DEFAULT_DOUBLE_TAP_MIN_INTERVAL_MS,
        )
    }
}

impl DoubleTapDetector {
    pub fn new(timeout_ms: u64, min_interval_ms: u64) -> Self {
        Self {
            timeout_ms,
            min_interval_ms,
            last_tap_ms: None,
        }
    }

    /// Feeds one tap at `now_ms` (monotonic uptime milliseconds).
    pub fn on_tap(&mut self, now_ms: u64) -> TapOutcome {
        if let Some(last) = self.last_tap_ms {
            let delta = now_ms.saturating_sub(last);
            if delta > self.min_interval_ms && delta < self.timeout_ms {
                self.last_tap_ms = None;
                debug!("event=double_tap module=gesture status=lock delta_ms={delta}");
                return TapOutcome::Lock;
            }
        }
        self.last_tap_ms = Some(now_ms);
        TapOutcome::Armed
    }

    pub fn is_armed(&self) -> bool {
        self.last_tap_ms.is_some()
    }
}
