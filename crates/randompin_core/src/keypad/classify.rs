//! Digit key detection for keypad child views.

use once_cell::sync::Lazy;
use regex::Regex;

static SINGLE_DIGIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]$").expect("valid digit regex"));

/// Observed state of one child view inside a keypad container.
///
/// Every field is optional because different keyguard generations expose the
/// digit through different channels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySnapshot {
    /// Fully qualified Java class name of the view.
    pub class_name: String,
    /// Visible text for `Button`/`TextView` keys.
    pub text: Option<String>,
    /// Integer view tag, when the tag is an `Integer`.
    pub tag: Option<i32>,
    /// Value of the `mDigit` field on `NumPadKey` views.
    pub digit_field: Option<i32>,
    pub content_description: Option<String>,
}

impl KeySnapshot {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            ..Self::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_tag(mut self, tag: i32) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn with_digit_field(mut self, digit: i32) -> Self {
        self.digit_field = Some(digit);
        self
    }

    pub fn with_content_description(mut self, value: impl Into<String>) -> Self {
        self.content_description = Some(value.into());
        self
    }
}

/// Role of one keypad child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRole {
    /// Digit key; the value is `None` when the view is a `NumPadKey` whose
    /// digit could not be read.
    Digit(Option<u8>),
    /// Delete, enter, emergency and any other non-digit key.
    Other,
}

impl KeyRole {
    pub fn is_digit(self) -> bool {
        matches!(self, Self::Digit(_))
    }
}

/// Classifies one keypad child.
pub fn classify_key(key: &KeySnapshot) -> KeyRole {
    if key.class_name.contains("NumPadKey") {
        return match key.digit_field {
            Some(value) => match digit_from_int(value) {
                Some(digit) => KeyRole::Digit(Some(digit)),
                None => KeyRole::Other,
            },
            None => KeyRole::Digit(None),
        };
    }

    if let Some(digit) = key.text.as_deref().and_then(digit_from_label) {
        return KeyRole::Digit(Some(digit));
    }
    if let Some(digit) = key.tag.and_then(digit_from_int) {
        return KeyRole::Digit(Some(digit));
    }
    if let Some(digit) = key.content_description.as_deref().and_then(digit_from_label) {
        return KeyRole::Digit(Some(digit));
    }
    KeyRole::Other
}

fn digit_from_label(label: &str) -> Option<u8> {
    if !SINGLE_DIGIT_RE.is_match(label) {
        return None;
    }
    label.bytes().next().map(|byte| byte - b'0')
}

fn digit_from_int(value: i32) -> Option<u8> {
    u8::try_from(value).ok().filter(|digit| *digit <= 9)
}
