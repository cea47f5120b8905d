//! Keypad shuffle planning and per-bouncer session state.
//!
//! # Responsibility
//! - Compute a new child order with the digit keys permuted.
//! - Apply that order through a container abstraction.
//!
//! # Invariants
//! - Non-digit keys keep their relative order and follow the digits.
//! - A pad with fewer digits than required is left untouched.
//! - A latched session shuffles at most once until it is reset.

use crate::keypad::classify::{classify_key, KeySnapshot};
use log::{debug, info};
use rand::seq::SliceRandom;
use rand::Rng;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Digit keys on a complete PIN pad.
pub const FULL_PAD_DIGITS: usize = 10;

/// Child order produced for one keypad container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShufflePlan {
    /// New position -> index of the child in the original order.
    pub order: Vec<usize>,
    pub digit_count: usize,
}

impl ShufflePlan {
    /// Returns true when applying this plan changes nothing.
    pub fn is_identity(&self) -> bool {
        self.order.iter().enumerate().all(|(pos, idx)| pos == *idx)
    }
}

/// Plans a shuffled order for the given keypad children.
///
/// # Errors
/// - `NotEnoughDigits` when fewer than `min_digits` (at least one) digit keys
///   are present, e.g. while the pad is still inflating.
pub fn plan_shuffle<R: Rng + ?Sized>(
    keys: &[KeySnapshot],
    min_digits: usize,
    rng: &mut R,
) -> Result<ShufflePlan, KeypadError> {
    let (mut digits, others): (Vec<usize>, Vec<usize>) =
        (0..keys.len()).partition(|idx| classify_key(&keys[*idx]).is_digit());

    let required = min_digits.max(1);
    if digits.len() < required {
        return Err(KeypadError::NotEnoughDigits {
            found: digits.len(),
            required,
        });
    }

    digits.shuffle(rng);
    let digit_count = digits.len();
    let mut order = digits;
    order.extend(others);
    Ok(ShufflePlan { order, digit_count })
}

/// View group holding the keypad keys.
pub trait KeypadContainer {
    /// Snapshots the current children in layout order.
    fn keys(&mut self) -> Result<Vec<KeySnapshot>, KeypadError>;

    /// Re-adds the children so that position `n` holds original child
    /// `order[n]`.
    fn reorder(&mut self, order: &[usize]) -> Result<(), KeypadError>;
}

/// Result of one shuffle request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShuffleOutcome {
    Shuffled { digits: usize },
    /// The latch was already set for the current bouncer.
    AlreadyShuffled,
}

/// Shuffle state for the bouncer currently on screen.
#[derive(Debug, Clone)]
pub struct KeypadSession {
    min_digits: usize,
    shuffled: bool,
}

impl Default for KeypadSession {
    fn default() -> Self {
        Self::new(FULL_PAD_DIGITS)
    }
}

impl KeypadSession {
    pub fn new(min_digits: usize) -> Self {
        Self {
            min_digits,
            shuffled: false,
        }
    }

    pub fn min_digits(&self) -> usize {
        self.min_digits
    }

    pub fn is_shuffled(&self) -> bool {
        self.shuffled
    }

    /// Shuffles unless this bouncer already got a shuffled pad.
    ///
    /// Used where every key's inflation fires the hook.
    pub fn shuffle_once<C, R>(
        &mut self,
        container: &mut C,
        rng: &mut R,
    ) -> Result<ShuffleOutcome, KeypadError>
    where
        C: KeypadContainer + ?Sized,
        R: Rng + ?Sized,
    {
        if self.shuffled {
            debug!("event=keypad_shuffle module=keypad status=skipped reason=latched");
            return Ok(ShuffleOutcome::AlreadyShuffled);
        }
        self.shuffle_fresh(container, rng)
    }

    /// Shuffles regardless of the latch.
    ///
    /// Used where the hook fires once per inflated PIN view.
    pub fn shuffle_fresh<C, R>(
        &mut self,
        container: &mut C,
        rng: &mut R,
    ) -> Result<ShuffleOutcome, KeypadError>
    where
        C: KeypadContainer + ?Sized,
        R: Rng + ?Sized,
    {
        let keys = container.keys()?;
        let plan = plan_shuffle(&keys, self.min_digits, rng)?;
        container.reorder(&plan.order)?;
        self.shuffled = true;
        info!(
            "event=keypad_shuffle module=keypad status=ok digits={} children={}",
            plan.digit_count,
            keys.len()
        );
        Ok(ShuffleOutcome::Shuffled {
            digits: plan.digit_count,
        })
    }

    /// Clears the latch once the bouncer hides.
    pub fn reset(&mut self) {
        if self.shuffled {
            debug!("event=keypad_reset module=keypad status=ok");
        }
        self.shuffled = false;
    }
}

/// Keypad shuffle errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeypadError {
    NotEnoughDigits { found: usize, required: usize },
    /// The view hierarchy could not be read or rewritten.
    Container(String),
}

impl Display for KeypadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotEnoughDigits { found, required } => write!(
                f,
                "keypad has {found} digit key(s); at least {required} required"
            ),
            Self::Container(message) => write!(f, "keypad container access failed: {message}"),
        }
    }
}

impl Error for KeypadError {}
