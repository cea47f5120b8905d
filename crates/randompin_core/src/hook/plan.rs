//! Per-process hook plans.
//!
//! # Responsibility
//! - Decide which framework classes and methods the module intercepts.
//! - Pick the keyguard layout generation from the device SDK level.
//!
//! # Invariants
//! - SDK >= 35 plans always keep the legacy PIN views as a fallback, since
//!   heavily customized vendor builds still ship them.
//! - Optional targets may be missing on a device without failing the plan.

use crate::model::process::TargetProcess;

/// First SDK level whose keyguard builds the PIN pad from `NumPadKey` views
/// directly under the bouncer.
pub const NUMPAD_LAYOUT_MIN_SDK: i32 = 35;

const CLASS_PIN_VIEW: &str = "com.android.keyguard.KeyguardPINView";
const CLASS_SIM_PIN_VIEW: &str = "com.android.keyguard.KeyguardSimPinView";
const CLASS_SIM_PUK_VIEW: &str = "com.android.keyguard.KeyguardSimPukView";
const CLASS_NUM_PAD_KEY: &str = "com.android.keyguard.NumPadKey";
const CLASS_BOUNCER: &str = "com.android.keyguard.KeyguardBouncer";
const CLASS_LOCK_PATTERN_VIEW: &str = "com.android.internal.widget.LockPatternView";
const CLASS_WALLPAPER_SERVICE: &str = "com.android.server.wallpaper.WallpaperManagerService";
const CLASS_IMAGE_WALLPAPER_ENGINE: &str =
    "com.android.systemui.wallpapers.ImageWallpaper$GLEngine";

/// When the hook callback runs relative to the original method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
    Before,
    After,
}

/// What a hook callback does once it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPurpose {
    /// Shuffle the digit keys of the hooked view's keypad container.
    ShuffleKeypad,
    /// Shuffle the digit keys of the hooked key's parent container.
    ShuffleParent,
    /// Reset the shuffle latch so the next bouncer gets a fresh order.
    ResetShuffle,
    /// Observe only; leaves the original call untouched.
    Observe,
    /// Only check that the class exists on this build.
    Probe,
    /// Feed wallpaper taps (commands or touch-down events) into the
    /// double-tap detector.
    WallpaperTap,
}

/// Parameter shape expected on the hooked method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookSignature {
    /// Exact JNI signature.
    Exact(&'static str),
    /// Every overload with this name; used where vendors changed the arity.
    AnyOverload,
}

/// One interception point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookTarget {
    pub class_name: &'static str,
    /// `None` for class probes.
    pub method: Option<&'static str>,
    pub signature: HookSignature,
    pub phase: HookPhase,
    pub purpose: HookPurpose,
    pub optional: bool,
}

impl HookTarget {
    fn new(
        class_name: &'static str,
        method: &'static str,
        phase: HookPhase,
        purpose: HookPurpose,
    ) -> Self {
        Self {
            class_name,
            method: Some(method),
            signature: HookSignature::Exact("()V"),
            phase,
            purpose,
            optional: false,
        }
    }

    fn after(class_name: &'static str, method: &'static str, purpose: HookPurpose) -> Self {
        Self::new(class_name, method, HookPhase::After, purpose)
    }

    fn before(class_name: &'static str, method: &'static str, purpose: HookPurpose) -> Self {
        Self::new(class_name, method, HookPhase::Before, purpose)
    }

    fn probe(class_name: &'static str) -> Self {
        Self {
            class_name,
            method: None,
            signature: HookSignature::AnyOverload,
            phase: HookPhase::Before,
            purpose: HookPurpose::Probe,
            optional: true,
        }
    }

    fn with_signature(mut self, signature: HookSignature) -> Self {
        self.signature = signature;
        self
    }

    fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// Ordered set of interception points for one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookPlan {
    pub process: TargetProcess,
    pub sdk: i32,
    pub targets: Vec<HookTarget>,
}

impl HookPlan {
    /// Builds the keyguard plan for SystemUI on the given SDK level.
    pub fn for_systemui(sdk: i32) -> Self {
        let mut targets = Vec::new();
        if sdk >= NUMPAD_LAYOUT_MIN_SDK {
            targets.push(HookTarget::after(
                CLASS_NUM_PAD_KEY,
                "onFinishInflate",
                HookPurpose::ShuffleParent,
            ));
            targets.push(
                HookTarget::after(CLASS_BOUNCER, "hide", HookPurpose::ResetShuffle)
                    .with_signature(HookSignature::Exact("(Z)V"))
                    .optional(),
            );
            // Vendor builds keep the older PIN views around.
            for class_name in [CLASS_PIN_VIEW, CLASS_SIM_PIN_VIEW, CLASS_SIM_PUK_VIEW] {
                targets.extend(pin_view_targets(class_name, true));
            }
        } else {
            for class_name in [CLASS_PIN_VIEW, CLASS_SIM_PIN_VIEW, CLASS_SIM_PUK_VIEW] {
                targets.extend(pin_view_targets(class_name, class_name != CLASS_PIN_VIEW));
            }
            targets.push(HookTarget::probe(CLASS_LOCK_PATTERN_VIEW));
            targets.push(
                HookTarget::after(CLASS_NUM_PAD_KEY, "onFinishInflate", HookPurpose::Observe)
                    .optional(),
            );
        }

        Self {
            process: TargetProcess::SystemUi,
            sdk,
            targets,
        }
    }

    /// Plan without targets, extended by the builders below.
    pub fn empty(process: TargetProcess, sdk: i32) -> Self {
        Self {
            process,
            sdk,
            targets: Vec::new(),
        }
    }

    /// Builds the wallpaper double-tap plan for the system server.
    pub fn for_system_server(sdk: i32) -> Self {
        Self {
            process: TargetProcess::SystemServer,
            sdk,
            // Newer releases added display and binder parameters.
            targets: vec![HookTarget::before(
                CLASS_WALLPAPER_SERVICE,
                "sendWallpaperCommand",
                HookPurpose::WallpaperTap,
            )
            .with_signature(HookSignature::AnyOverload)],
        }
    }

    /// Adds the SystemUI image wallpaper touch hook, used when the system
    /// server never sees wallpaper tap commands.
    pub fn with_wallpaper_fallback(mut self) -> Self {
        self.targets.push(
            HookTarget::before(
                CLASS_IMAGE_WALLPAPER_ENGINE,
                "onTouchEvent",
                HookPurpose::WallpaperTap,
            )
            .with_signature(HookSignature::Exact("(Landroid/view/MotionEvent;)V"))
            .optional(),
        );
        self
    }

    /// Returns true when any target feeds the double-tap detector.
    pub fn watches_wallpaper(&self) -> bool {
        self.targets
            .iter()
            .any(|target| target.purpose == HookPurpose::WallpaperTap)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Targets that must be present for the plan to be useful.
    pub fn required(&self) -> impl Iterator<Item = &HookTarget> {
        self.targets.iter().filter(|target| !target.optional)
    }

    pub fn with_purpose(&self, purpose: HookPurpose) -> Vec<&HookTarget> {
        self.targets
            .iter()
            .filter(|target| target.purpose == purpose)
            .collect()
    }
}

fn pin_view_targets(class_name: &'static str, optional: bool) -> [HookTarget; 2] {
    let mut inflate = HookTarget::after(class_name, "onFinishInflate", HookPurpose::ShuffleKeypad);
    let mut verify =
        HookTarget::before(class_name, "verifyPasswordAndUnlock", HookPurpose::Observe);
    inflate.optional = optional;
    verify.optional = true;
    [inflate, verify]
}
