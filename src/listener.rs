//! Input hook interface.
//!
//! The OS-level global keyboard hook is an external collaborator: it runs on a
//! dedicated blocking thread and forwards every observed event into an
//! unbounded channel, so delivery never waits on macro execution.

use tokio::sync::mpsc::UnboundedSender;

/// One raw event from the input hook.
///
/// `named` is true for keys reported by name (modifiers, function and
/// navigation keys, "space", "esc"); character keys deliver the literal
/// character with `named` false. Implementations should report left/right
/// modifier variants with their usual suffixed names ("ctrl_l", "shift_r");
/// the engine canonicalizes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// A key went down.
    Press {
        /// Key identifier (character or key name).
        key: String,
        /// Whether `key` is a named key rather than a literal character.
        named: bool,
    },
    /// A key came up.
    Release {
        /// Key identifier (character or key name).
        key: String,
        /// Whether `key` is a named key rather than a literal character.
        named: bool,
    },
}

/// Channel end the listener feeds events into.
pub type EventSender = UnboundedSender<InputEvent>;

/// A global input hook.
pub trait InputListener: Send + 'static {
    /// Run the hook loop, forwarding every observed key event into `events`.
    ///
    /// Called on a dedicated blocking thread; blocking freely is fine.
    /// Returning (or a send failing because the engine is gone) ends the hook.
    fn run(&mut self, events: EventSender) -> anyhow::Result<()>;
}
