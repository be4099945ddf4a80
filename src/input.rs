//! Key and mouse event descriptors.
//!
//! [`KeyInfo`] describes a single keyboard event: either an observed press
//! (modifier flags concrete) or a hotkey chord / key to synthesize (modifier
//! flags may be left as "don't care"). [`MouseInfo`] describes a single mouse
//! action to synthesize.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Modifier names, in hold-down order. Releases happen in reverse.
pub const MODIFIER_NAMES: [&str; 3] = ["ctrl", "alt", "shift"];

/// Map a raw modifier key name (including left/right variants as OS hooks
/// report them) to its canonical name, or `None` for non-modifier keys.
pub fn canonical_modifier(key: &str) -> Option<&'static str> {
    match key {
        "ctrl" | "ctrl_l" | "ctrl_r" | "control" => Some("ctrl"),
        "alt" | "alt_l" | "alt_r" | "alt_gr" => Some("alt"),
        "shift" | "shift_l" | "shift_r" => Some("shift"),
        _ => None,
    }
}

/// Whether `key` names a modifier.
pub fn is_modifier(key: &str) -> bool {
    canonical_modifier(key).is_some()
}

/// Whether `key` is accepted as the non-modifier part of a hotkey chord:
/// lowercase ascii letters, digits, f1-f12, "space" and "esc".
pub fn is_recognized_key(key: &str) -> bool {
    let mut chars = key.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return c.is_ascii_lowercase() || c.is_ascii_digit();
    }
    if matches!(key, "space" | "esc") {
        return true;
    }
    key.strip_prefix('f')
        .and_then(|n| n.parse::<u8>().ok())
        .is_some_and(|n| (1..=12).contains(&n))
}

/// A single key event or key-press instruction.
///
/// The three modifier flags are tri-state: `Some(true)` means the modifier is
/// (or must be) held, `Some(false)` means it is (or must be) up, and `None`
/// means "don't care" when matching. Observed events always carry concrete
/// `Some(_)` flags. The key identifier is lowercase-normalized and must be
/// non-empty; registration paths additionally require it to be recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInfo {
    /// Key identifier: a single character or a named key ("f1", "esc", "space").
    pub key: String,
    /// Ctrl flag (tri-state, see type docs).
    pub ctrl: Option<bool>,
    /// Alt flag (tri-state, see type docs).
    pub alt: Option<bool>,
    /// Shift flag (tri-state, see type docs).
    pub shift: Option<bool>,
    /// Delay to wait after this key when part of an action sequence.
    pub delay: Duration,
    /// How long to hold the key down; zero means a plain tap.
    pub hold: Duration,
}

impl KeyInfo {
    /// Create a key descriptor with don't-care modifiers and no timing.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into().to_lowercase(),
            ctrl: None,
            alt: None,
            shift: None,
            delay: Duration::ZERO,
            hold: Duration::ZERO,
        }
    }

    /// Expand a text string into one tap per character, each followed by
    /// `key_delay`. Useful for macros that type words.
    pub fn from_text(text: &str, key_delay: Duration) -> Vec<Self> {
        text.chars()
            .map(|c| Self::new(c.to_string()).delay(key_delay))
            .collect()
    }

    /// Set the ctrl requirement.
    pub fn ctrl(mut self, held: bool) -> Self {
        self.ctrl = Some(held);
        self
    }

    /// Set the alt requirement.
    pub fn alt(mut self, held: bool) -> Self {
        self.alt = Some(held);
        self
    }

    /// Set the shift requirement.
    pub fn shift(mut self, held: bool) -> Self {
        self.shift = Some(held);
        self
    }

    /// Set the inter-action delay.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Set the hold duration.
    pub fn hold(mut self, hold: Duration) -> Self {
        self.hold = hold;
        self
    }

    /// Modifier-tolerant comparison: keys must be identical; each modifier
    /// dimension matches when either side is `None` or both sides agree.
    pub fn matches(&self, other: &Self) -> bool {
        self.key == other.key
            && modifier_matches(self.ctrl, other.ctrl)
            && modifier_matches(self.alt, other.alt)
            && modifier_matches(self.shift, other.shift)
    }

    /// Modifiers that must be held for this key, in hold-down order.
    pub fn held_modifiers(&self) -> Vec<&'static str> {
        let flags = [self.ctrl, self.alt, self.shift];
        MODIFIER_NAMES
            .iter()
            .zip(flags)
            .filter(|(_, held)| *held == Some(true))
            .map(|(name, _)| *name)
            .collect()
    }

    /// The held modifiers followed by the key itself, as passed to an
    /// injector's tap primitive.
    pub fn hotkey_list(&self) -> Vec<&str> {
        let mut keys = self.held_modifiers();
        keys.push(self.key.as_str());
        keys
    }
}

fn modifier_matches(a: Option<bool>, b: Option<bool>) -> bool {
    match (a, b) {
        (Some(x), Some(y)) => x == y,
        _ => true,
    }
}

impl fmt::Display for KeyInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hotkey_list().join("+"))
    }
}

/// What a [`MouseInfo`] performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickKind {
    /// Placeholder kind; skipped with a warning at execution time.
    Undefined,
    /// Left button click.
    #[default]
    Left,
    /// Right button click.
    Right,
    /// Middle button click.
    Middle,
    /// Left button double click.
    DoubleClick,
    /// Move the cursor to absolute coordinates.
    Move,
    /// Move the cursor relative to its current position.
    MoveRelative,
}

impl fmt::Display for ClickKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Undefined => "undefined",
            Self::Left => "left click",
            Self::Right => "right click",
            Self::Middle => "middle click",
            Self::DoubleClick => "double click",
            Self::Move => "move",
            Self::MoveRelative => "move relative",
        };
        f.write_str(name)
    }
}

/// A single mouse action instruction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MouseInfo {
    /// Which action to perform.
    pub kind: ClickKind,
    /// Absolute x target (clicks may carry one to click at a position).
    pub x: Option<i32>,
    /// Absolute y target.
    pub y: Option<i32>,
    /// Relative x offset, for [`ClickKind::MoveRelative`].
    pub dx: Option<i32>,
    /// Relative y offset, for [`ClickKind::MoveRelative`].
    pub dy: Option<i32>,
    /// Delay to wait after this action when part of a sequence.
    pub delay: Duration,
    /// How long a cursor move takes.
    pub duration: Duration,
}

impl MouseInfo {
    /// A click of the given kind at the current cursor position.
    pub fn click(kind: ClickKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// A cursor move to absolute coordinates over `duration`.
    pub fn move_to(x: i32, y: i32, duration: Duration) -> Self {
        Self {
            kind: ClickKind::Move,
            x: Some(x),
            y: Some(y),
            duration,
            ..Self::default()
        }
    }

    /// A cursor move relative to the current position over `duration`.
    pub fn move_by(dx: i32, dy: i32, duration: Duration) -> Self {
        Self {
            kind: ClickKind::MoveRelative,
            dx: Some(dx),
            dy: Some(dy),
            duration,
            ..Self::default()
        }
    }

    /// Set an absolute click position.
    pub fn at(mut self, x: i32, y: i32) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    /// Set the inter-action delay.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Absolute position, when both coordinates are present.
    pub fn position(&self) -> Option<(i32, i32)> {
        self.x.zip(self.y)
    }

    /// Relative offset, when both components are present.
    pub fn offset(&self) -> Option<(i32, i32)> {
        self.dx.zip(self.dy)
    }
}
