//! PIN pad shuffling.
//!
//! # Responsibility
//! - Recognize digit keys among the children of a keyguard keypad.
//! - Reorder the digit keys randomly, once per bouncer appearance.
//!
//! # Invariants
//! - Only the order of existing views changes; no key is added or dropped.
//! - Nothing typed on the pad is ever observed here.

pub mod classify;
pub mod locate;
pub mod shuffle;

pub use classify::{classify_key, KeyRole, KeySnapshot};
pub use locate::{digit_count, find_pin_container, ViewNode, ENTER_KEY_ID};
pub use shuffle::{
    plan_shuffle, KeypadContainer, KeypadError, KeypadSession, ShuffleOutcome, ShufflePlan,
    FULL_PAD_DIGITS,
};
