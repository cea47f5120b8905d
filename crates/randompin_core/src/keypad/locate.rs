//! Keypad container lookup inside a PIN view hierarchy.
//!
//! Older keyguards fire the inflate hook on the PIN view itself, whose direct
//! children are layout wrappers rather than keys.
//!
//! # Invariants
//! - The parent of the enter key wins over the recursive search.
//! - The search is depth-first in layout order and returns the first group
//!   holding enough digit keys as direct children.

use crate::keypad::classify::classify_key;
use crate::keypad::shuffle::{KeypadContainer, KeypadError};

/// Resource entry name of the PIN pad's enter key.
pub const ENTER_KEY_ID: &str = "key_enter";

/// Traversable view inside a keyguard PIN view.
pub trait ViewNode: KeypadContainer + Sized {
    /// True for `ViewGroup`s.
    fn is_group(&self) -> bool;

    /// Direct children in layout order.
    fn children(&mut self) -> Result<Vec<Self>, KeypadError>;

    fn parent(&mut self) -> Result<Option<Self>, KeypadError>;

    /// Descendant whose resource entry name in the keyguard package is
    /// `id_name`.
    fn find_by_id_name(&mut self, id_name: &str) -> Result<Option<Self>, KeypadError>;
}

/// Finds the group whose children are the PIN pad keys.
///
/// Returns `Ok(None)` when no group below `root` holds at least `min_digits`
/// (at least one) digit keys.
pub fn find_pin_container<N: ViewNode>(
    root: &mut N,
    min_digits: usize,
) -> Result<Option<N>, KeypadError> {
    if let Some(mut enter) = root.find_by_id_name(ENTER_KEY_ID)? {
        if let Some(parent) = enter.parent()? {
            if parent.is_group() {
                return Ok(Some(parent));
            }
        }
    }
    search(root, min_digits.max(1))
}

/// Counts digit keys among the direct children of `container`.
pub fn digit_count<C: KeypadContainer + ?Sized>(container: &mut C) -> Result<usize, KeypadError> {
    Ok(container
        .keys()?
        .iter()
        .filter(|key| classify_key(key).is_digit())
        .count())
}

fn search<N: ViewNode>(node: &mut N, min_digits: usize) -> Result<Option<N>, KeypadError> {
    for mut child in node.children()? {
        if !child.is_group() {
            continue;
        }
        if digit_count(&mut child)? >= min_digits {
            return Ok(Some(child));
        }
        if let Some(found) = search(&mut child, min_digits)? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}
