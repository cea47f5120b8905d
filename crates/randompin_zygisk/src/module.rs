//! RandomPIN module lifecycle.
//!
//! # Responsibility
//! - React to the host's load and specialize callbacks.
//! - Detect SystemUI by its data directory and install the keypad hook there.
//! - Release the library from every process the module has no work in.
//!
//! # Invariants
//! - `is_systemui` is true iff the data directory of the current process
//!   contains the configured target package.
//! - The module directory is only touched during `pre[XXX]Specialize`.
//! - Callbacks never panic on host or config failures; they log and degrade.
//!
//! # See also
//! - docs/architecture/lifecycle.md

use crate::abi::{ZygiskOption, PROCESS_ON_DENYLIST};
use crate::api::HostApi;
use log::{debug, info, warn};
use randompin_core::{
    default_log_level, find_pin_container, init_logging, is_tap_command, set_level,
    DoubleTapDetector, HookPlan, HookPurpose, KeypadContainer, KeypadError, KeypadSession,
    ModuleConfig, ProcessIdentity, ServerIdentity, ShuffleOutcome, TapOutcome, TargetProcess,
    ViewNode, LOG_TAG, MOTION_ACTION_DOWN,
};
use std::os::fd::{AsRawFd, OwnedFd};
use std::path::PathBuf;

/// Per-process module state.
#[derive(Debug)]
pub struct RandomPinModule {
    config: ModuleConfig,
    target: TargetProcess,
    is_systemui: bool,
    on_denylist: bool,
    hook_plan: Option<HookPlan>,
    keypad: KeypadSession,
    double_tap: DoubleTapDetector,
}

impl Default for RandomPinModule {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomPinModule {
    pub fn new() -> Self {
        Self {
            config: ModuleConfig::default(),
            target: TargetProcess::Other,
            is_systemui: false,
            on_denylist: false,
            hook_plan: None,
            keypad: KeypadSession::default(),
            double_tap: DoubleTapDetector::default(),
        }
    }

    /// Runs once, right after the host accepted the registration.
    pub fn on_load(&mut self) {
        // No channel is left to report a failed logger start through.
        let _ = init_logging(default_log_level(), LOG_TAG);
        debug!(
            "event=on_load module=lifecycle status=ok pid={}",
            std::process::id()
        );
    }

    /// Inspects the app about to be specialized.
    pub fn pre_app_specialize(&mut self, host: &impl HostApi, identity: &ProcessIdentity) {
        self.load_config(host);
        self.on_denylist = read_denylist_flag(host);
        self.target = identity.target(&self.config.target_package);
        self.is_systemui = self.target == TargetProcess::SystemUi;
        debug!(
            "event=pre_app_specialize module=lifecycle status=ok uid={} target={} denylist={}",
            identity.uid,
            self.target.as_str(),
            self.on_denylist
        );
    }

    /// Installs the keypad hook in SystemUI; unloads everywhere else.
    ///
    /// SystemUI also carries the wallpaper touch fallback when the double-tap
    /// gesture is enabled, and stays loaded for it alone.
    pub fn post_app_specialize(&mut self, host: &impl HostApi, sdk: i32) {
        if self.is_systemui
            && self.is_active()
            && (self.config.shuffle_keypad || self.config.double_tap_lock)
        {
            self.install_keypad_hook(sdk);
            return;
        }
        self.request_unload(host);
    }

    /// Inspects the system server about to be specialized.
    pub fn pre_server_specialize(&mut self, host: &impl HostApi, identity: &ServerIdentity) {
        self.load_config(host);
        self.on_denylist = read_denylist_flag(host);
        self.target = TargetProcess::SystemServer;
        self.is_systemui = false;
        debug!(
            "event=pre_server_specialize module=lifecycle status=ok uid={} caps={:#x}",
            identity.uid, identity.effective_capabilities
        );
    }

    /// Installs the wallpaper double-tap hook when the gesture is enabled.
    pub fn post_server_specialize(&mut self, host: &impl HostApi, sdk: i32) {
        if self.is_active() && self.config.double_tap_lock {
            self.install_wallpaper_hook(sdk);
            return;
        }
        self.request_unload(host);
    }

    /// Parent container of a key inflated under a planned hook.
    ///
    /// `ShuffleParent` hooks fire once per key, so they share the latch of the
    /// current bouncer. `ShuffleKeypad` hooks fire on a whole PIN view and go
    /// through [`Self::on_pin_view_inflated`]; every other purpose is ignored.
    pub fn on_keypad_inflated(
        &mut self,
        purpose: HookPurpose,
        container: &mut dyn KeypadContainer,
    ) -> Option<ShuffleOutcome> {
        if !self.is_systemui || purpose != HookPurpose::ShuffleParent {
            return None;
        }
        let mut rng = rand::thread_rng();
        shuffle_result(self.keypad.shuffle_once(container, &mut rng))
    }

    /// PIN view inflated under a `ShuffleKeypad` hook.
    ///
    /// Locates the keypad container below `view` and shuffles it; each
    /// inflation gets a fresh order.
    pub fn on_pin_view_inflated<V: ViewNode>(&mut self, view: &mut V) -> Option<ShuffleOutcome> {
        if !self.is_systemui {
            return None;
        }
        let mut container = match find_pin_container(view, self.keypad.min_digits()) {
            Ok(Some(container)) => container,
            Ok(None) => {
                debug!("event=keypad_lookup module=lifecycle status=skipped reason=not_found");
                return None;
            }
            Err(err) => {
                debug!("event=keypad_lookup module=lifecycle status=error error={err}");
                return None;
            }
        };
        let mut rng = rand::thread_rng();
        shuffle_result(self.keypad.shuffle_fresh(&mut container, &mut rng))
    }

    /// Bouncer hidden: the next keypad gets a fresh order.
    pub fn on_bouncer_hidden(&mut self) {
        self.keypad.reset();
    }

    /// `sendWallpaperCommand` observed in the system server.
    ///
    /// Returns `None` unless one of `args` is the wallpaper tap action.
    pub fn on_wallpaper_command<'a>(
        &mut self,
        args: impl IntoIterator<Item = &'a str>,
        uptime_ms: u64,
    ) -> Option<TapOutcome> {
        if !is_tap_command(args) {
            return None;
        }
        self.on_wallpaper_tap(uptime_ms)
    }

    /// Touch event on the SystemUI image wallpaper; only touch-down counts.
    pub fn on_wallpaper_touch(
        &mut self,
        action_masked: i32,
        uptime_ms: u64,
    ) -> Option<TapOutcome> {
        if action_masked != MOTION_ACTION_DOWN {
            return None;
        }
        self.on_wallpaper_tap(uptime_ms)
    }

    pub fn is_systemui(&self) -> bool {
        self.is_systemui
    }

    pub fn target(&self) -> TargetProcess {
        self.target
    }

    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    pub fn hook_plan(&self) -> Option<&HookPlan> {
        self.hook_plan.as_ref()
    }

    fn is_active(&self) -> bool {
        self.config.enabled && !self.on_denylist
    }

    fn on_wallpaper_tap(&mut self, uptime_ms: u64) -> Option<TapOutcome> {
        if !self.hook_plan.as_ref().is_some_and(HookPlan::watches_wallpaper) {
            return None;
        }
        let outcome = self.double_tap.on_tap(uptime_ms);
        if outcome == TapOutcome::Lock {
            info!(
                "event=double_tap_lock module=lifecycle status=ok target={}",
                self.target.as_str()
            );
        }
        Some(outcome)
    }

    fn install_keypad_hook(&mut self, sdk: i32) {
        let mut plan = if self.config.shuffle_keypad {
            HookPlan::for_systemui(sdk)
        } else {
            HookPlan::empty(TargetProcess::SystemUi, sdk)
        };
        if self.config.double_tap_lock {
            plan = plan.with_wallpaper_fallback();
            self.arm_double_tap();
        }
        log_plan(&plan);
        self.keypad = KeypadSession::new(self.config.min_digit_keys);
        self.hook_plan = Some(plan);
    }

    fn install_wallpaper_hook(&mut self, sdk: i32) {
        let plan = HookPlan::for_system_server(sdk);
        log_plan(&plan);
        self.arm_double_tap();
        self.hook_plan = Some(plan);
    }

    fn arm_double_tap(&mut self) {
        self.double_tap = DoubleTapDetector::new(
            self.config.double_tap_timeout_ms,
            self.config.double_tap_min_interval_ms,
        );
    }

    fn request_unload(&self, host: &impl HostApi) {
        match host.set_option(ZygiskOption::DlcloseModuleLibrary) {
            Ok(()) => debug!(
                "event=unload module=lifecycle status=ok target={}",
                self.target.as_str()
            ),
            Err(err) => warn!("event=unload module=lifecycle status=error error={err}"),
        }
    }

    fn load_config(&mut self, host: &impl HostApi) {
        let dir = match host.module_dir() {
            Ok(dir) => dir,
            Err(err) => {
                debug!("event=config_load module=lifecycle status=defaults reason={err}");
                return;
            }
        };
        match ModuleConfig::load_from_dir(&fd_path(&dir)) {
            Ok(config) => {
                if let Err(err) = set_level(&config.log_level) {
                    warn!("event=config_load module=lifecycle status=error error={err}");
                }
                self.config = config;
            }
            Err(err) => {
                warn!("event=config_load module=lifecycle status=defaults error={err}");
            }
        }
    }
}

fn shuffle_result(result: Result<ShuffleOutcome, KeypadError>) -> Option<ShuffleOutcome> {
    match result {
        Ok(outcome) => Some(outcome),
        Err(err) => {
            debug!("event=keypad_shuffle module=lifecycle status=skipped reason={err}");
            None
        }
    }
}

fn read_denylist_flag(host: &impl HostApi) -> bool {
    match host.flags() {
        Ok(flags) => flags & PROCESS_ON_DENYLIST != 0,
        Err(err) => {
            debug!("event=flags module=lifecycle status=error error={err}");
            false
        }
    }
}

/// Directory path of an open descriptor, valid while `dir` stays open.
fn fd_path(dir: &OwnedFd) -> PathBuf {
    PathBuf::from(format!("/proc/self/fd/{}", dir.as_raw_fd()))
}

fn log_plan(plan: &HookPlan) {
    info!(
        "event=hook_plan module=lifecycle status=ok process={} sdk={} targets={}",
        plan.process.as_str(),
        plan.sdk,
        plan.len()
    );
    for target in &plan.targets {
        debug!(
            "event=hook_target module=lifecycle class={} method={} purpose={:?} optional={}",
            target.class_name,
            target.method.unwrap_or("<probe>"),
            target.purpose,
            target.optional
        );
    }
}

#[cfg(test)]
mod tests {
    use super::RandomPinModule;
    use crate::abi::ZygiskOption;
    use crate::api::{HostApi, HostError};
    use randompin_core::{HookPurpose, ProcessIdentity, TargetProcess};
    use std::cell::RefCell;
    use std::os::fd::OwnedFd;

    #[derive(Default)]
    struct NoDirHost {
        options: RefCell<Vec<ZygiskOption>>,
    }

    impl HostApi for NoDirHost {
        fn set_option(&self, option: ZygiskOption) -> Result<(), HostError> {
            self.options.borrow_mut().push(option);
            Ok(())
        }

        fn module_dir(&self) -> Result<OwnedFd, HostError> {
            Err(HostError::ModuleDirUnavailable)
        }

        fn flags(&self) -> Result<u32, HostError> {
            Ok(0)
        }
    }

    fn app(data_dir: &str) -> ProcessIdentity {
        ProcessIdentity {
            uid: 10_100,
            app_data_dir: Some(data_dir.to_string()),
            ..ProcessIdentity::default()
        }
    }

    #[test]
    fn flag_follows_data_dir_substring() {
        let host = NoDirHost::default();
        let mut module = RandomPinModule::new();

        module.pre_app_specialize(&host, &app("/data/user_de/0/com.android.systemui"));
        assert!(module.is_systemui());
        assert_eq!(module.target(), TargetProcess::SystemUi);

        let mut module = RandomPinModule::new();
        module.pre_app_specialize(&host, &app("/data/user/0/com.android.chrome"));
        assert!(!module.is_systemui());
    }

    #[test]
    fn keypad_events_outside_systemui_are_ignored() {
        struct Unreachable;
        impl randompin_core::KeypadContainer for Unreachable {
            fn keys(
                &mut self,
            ) -> Result<Vec<randompin_core::KeySnapshot>, randompin_core::KeypadError> {
                unreachable!("not systemui")
            }
            fn reorder(&mut self, _order: &[usize]) -> Result<(), randompin_core::KeypadError> {
                unreachable!("not systemui")
            }
        }

        let mut module = RandomPinModule::new();
        assert!(module
            .on_keypad_inflated(HookPurpose::ShuffleParent, &mut Unreachable)
            .is_none());
    }
}
