//! Command variants bound to hotkeys.
//!
//! A [`Command`] is what a matched hotkey dispatches: a keyboard action, a
//! mouse action, or a script of arbitrary callbacks. The hotkey itself lives
//! in the [`Registration`] the manager creates — it is attached exactly once,
//! at registration, and never changes afterwards.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

use crate::action::Action;
use crate::error::{MacroError, Result};
use crate::history::PressHistory;
use crate::injector::InjectorHandle;
use crate::input::KeyInfo;

/// Future type produced by asynchronous script callbacks.
pub type BoxedFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// A zero-argument script callback, synchronous or asynchronous.
pub enum Callback {
    /// Runs to completion before the next callback is considered.
    Sync(Box<dyn Fn() + Send + Sync>),
    /// Spawned onto the runtime; later callbacks do not wait for it.
    Async(Box<dyn Fn() -> BoxedFuture + Send + Sync>),
}

impl Callback {
    /// Wrap a synchronous closure.
    pub fn sync(f: impl Fn() + Send + Sync + 'static) -> Self {
        Self::Sync(Box::new(f))
    }

    /// Wrap an asynchronous closure.
    pub fn asynchronous<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self::Async(Box::new(move || Box::pin(f())))
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("Callback::Sync"),
            Self::Async(_) => f.write_str("Callback::Async"),
        }
    }
}

/// A keyboard macro: wraps an [`Action`] restricted to key primitives.
#[derive(Debug, Clone)]
pub struct KeyboardCommand {
    action: Action,
}

impl KeyboardCommand {
    /// Wrap `action`, rejecting actions without keys or with mouse steps.
    pub fn new(action: Action) -> Result<Self> {
        if action.keys().is_empty() {
            return Err(MacroError::empty_action(
                "keyboard command needs at least one key",
            ));
        }
        if !action.clicks().is_empty() {
            return Err(MacroError::config_validation(
                "keyboard command cannot carry mouse steps",
            ));
        }
        Ok(Self { action })
    }

    /// The wrapped action.
    pub fn action(&self) -> &Action {
        &self.action
    }
}

/// A mouse macro: wraps an [`Action`] restricted to mouse primitives.
#[derive(Debug, Clone)]
pub struct MouseCommand {
    action: Action,
}

impl MouseCommand {
    /// Wrap `action`, rejecting actions without mouse steps or with keys.
    pub fn new(action: Action) -> Result<Self> {
        if action.clicks().is_empty() {
            return Err(MacroError::empty_action(
                "mouse command needs at least one mouse step",
            ));
        }
        if !action.keys().is_empty() {
            return Err(MacroError::config_validation(
                "mouse command cannot carry key steps",
            ));
        }
        Ok(Self { action })
    }

    /// The wrapped action.
    pub fn action(&self) -> &Action {
        &self.action
    }
}

/// An arbitrary side-effect macro: an ordered callback list with its own
/// start delay. Used for things an action cannot express, such as setting the
/// engine's exit flag.
#[derive(Debug)]
pub struct ScriptCommand {
    callbacks: Vec<Callback>,
    start_delay: Duration,
}

impl ScriptCommand {
    /// Create a script command from its callbacks.
    pub fn new(callbacks: Vec<Callback>) -> Self {
        Self {
            callbacks,
            start_delay: Duration::ZERO,
        }
    }

    /// Set the delay before the first callback runs.
    pub fn start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = delay;
        self
    }

    /// Wait the start delay, then run the callbacks in order. Synchronous
    /// callbacks complete inline; asynchronous ones are spawned and left to
    /// run independently.
    pub async fn execute(&self) {
        if !self.start_delay.is_zero() {
            sleep(self.start_delay).await;
        }
        for callback in &self.callbacks {
            match callback {
                Callback::Sync(f) => f(),
                Callback::Async(f) => {
                    tokio::spawn(f());
                }
            }
        }
    }
}

/// The closed set of command variants.
#[derive(Debug)]
pub enum Command {
    /// Keyboard macro.
    Keyboard(KeyboardCommand),
    /// Mouse macro.
    Mouse(MouseCommand),
    /// Script macro.
    Script(ScriptCommand),
}

impl Command {
    /// Variant name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Keyboard(_) => "keyboard",
            Self::Mouse(_) => "mouse",
            Self::Script(_) => "script",
        }
    }

    /// Execute the command against the injector.
    pub async fn execute(&self, injector: &InjectorHandle) -> Result<()> {
        match self {
            Self::Keyboard(cmd) => cmd.action().execute(injector).await,
            Self::Mouse(cmd) => cmd.action().execute(injector).await,
            Self::Script(cmd) => {
                cmd.execute().await;
                Ok(())
            }
        }
    }
}

/// A command bound to its parsed hotkey, as stored in the manager's registry.
#[derive(Debug)]
pub struct Registration {
    spec: String,
    hotkey: Vec<KeyInfo>,
    command: Command,
}

impl Registration {
    pub(crate) fn new(spec: impl Into<String>, hotkey: Vec<KeyInfo>, command: Command) -> Self {
        Self {
            spec: spec.into(),
            hotkey,
            command,
        }
    }

    /// The original specification string, used to identify the command in
    /// logs.
    pub fn spec(&self) -> &str {
        &self.spec
    }

    /// The parsed chord sequence (most-recent-key-last).
    pub fn hotkey(&self) -> &[KeyInfo] {
        &self.hotkey
    }

    /// The bound command.
    pub fn command(&self) -> &Command {
        &self.command
    }

    /// Whether the hotkey matches the most recent presses: the chord sequence
    /// (most-recent-key-last) is compared element-wise against the history
    /// prefix of equal length (most-recent-first), using modifier-tolerant
    /// key equality. A hotkey longer than the history never matches; there is
    /// no partial/prefix matching.
    pub fn matches(&self, history: &PressHistory) -> bool {
        if self.hotkey.is_empty() || self.hotkey.len() > history.len() {
            return false;
        }
        let matched = self
            .hotkey
            .iter()
            .rev()
            .zip(history.iter())
            .all(|(chord, observed)| chord.matches(observed));
        if matched {
            debug!(spec = self.spec.as_str(), "hotkey matched history");
        }
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn observed(key: &str, ctrl: bool, alt: bool, shift: bool) -> KeyInfo {
        KeyInfo::new(key).ctrl(ctrl).alt(alt).shift(shift)
    }

    fn registration(spec: &str, hotkey: Vec<KeyInfo>) -> Registration {
        let action = Action::keyboard(vec![KeyInfo::new("x")]).unwrap();
        let command = Command::Keyboard(KeyboardCommand::new(action).unwrap());
        Registration::new(spec, hotkey, command)
    }

    #[test]
    fn test_hotkey_longer_than_history_never_matches() {
        let reg = registration("a,b", vec![KeyInfo::new("a"), KeyInfo::new("b")]);
        let mut history = PressHistory::new();
        history.push(observed("b", false, false, false));
        assert!(!reg.matches(&history));
    }

    #[test]
    fn test_matches_most_recent_prefix_in_reverse_order() {
        // Hotkey "a then b": most recent press must be "b".
        let reg = registration("a,b", vec![KeyInfo::new("a"), KeyInfo::new("b")]);

        let mut history = PressHistory::new();
        history.push(observed("a", false, false, false));
        history.push(observed("b", false, false, false));
        assert!(reg.matches(&history));

        let mut reversed = PressHistory::new();
        reversed.push(observed("b", false, false, false));
        reversed.push(observed("a", false, false, false));
        assert!(!reg.matches(&reversed));
    }

    #[test]
    fn test_older_history_beyond_hotkey_is_ignored() {
        let reg = registration("alt+1", vec![KeyInfo::new("1").alt(true)]);
        let mut history = PressHistory::new();
        history.push(observed("z", false, false, false));
        history.push(observed("1", false, true, false));
        assert!(reg.matches(&history));
    }

    #[test]
    fn test_modifier_tolerance_in_matching() {
        let reg = registration("alt+1", vec![KeyInfo::new("1").alt(true)]);

        // Shift also held: still matches since the chord leaves shift None.
        let mut history = PressHistory::new();
        history.push(observed("1", false, true, true));
        assert!(reg.matches(&history));

        // Alt not held: no match.
        let mut history = PressHistory::new();
        history.push(observed("1", false, false, false));
        assert!(!reg.matches(&history));
    }

    #[test]
    fn test_keyboard_command_validation() {
        let mixed = Action::new(
            vec![KeyInfo::new("a")],
            vec![crate::input::MouseInfo::default()],
        )
        .unwrap();
        assert!(KeyboardCommand::new(mixed.clone()).is_err());
        assert!(MouseCommand::new(mixed).is_err());

        let keys_only = Action::keyboard(vec![KeyInfo::new("a")]).unwrap();
        assert!(KeyboardCommand::new(keys_only.clone()).is_ok());
        assert!(MouseCommand::new(keys_only).is_err());
    }

    #[tokio::test]
    async fn test_script_sync_callbacks_run_in_order() {
        let order = Arc::new(AtomicUsize::new(0));
        let first = Arc::clone(&order);
        let second = Arc::clone(&order);

        let script = ScriptCommand::new(vec![
            Callback::sync(move || {
                let _ = first.compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst);
            }),
            Callback::sync(move || {
                let _ = second.compare_exchange(1, 2, Ordering::SeqCst, Ordering::SeqCst);
            }),
        ]);
        script.execute().await;
        assert_eq!(order.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_script_async_callback_does_not_block() {
        let flag = Arc::new(AtomicUsize::new(0));
        let async_flag = Arc::clone(&flag);
        let sync_flag = Arc::clone(&flag);

        let script = ScriptCommand::new(vec![
            Callback::asynchronous(move || {
                let flag = Arc::clone(&async_flag);
                async move {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    flag.fetch_add(10, Ordering::SeqCst);
                }
            }),
            // Runs before the spawned callback finishes sleeping.
            Callback::sync(move || {
                sync_flag.fetch_add(1, Ordering::SeqCst);
            }),
        ]);
        script.execute().await;
        assert_eq!(flag.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(flag.load(Ordering::SeqCst), 11);
    }
}
