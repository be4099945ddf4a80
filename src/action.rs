//! Declarative timed action sequences.
//!
//! An [`Action`] describes what a macro does: an ordered set of key presses
//! and/or mouse actions with a start delay, a repeat delay and a repeat count.
//! [`Action::steps`] lowers the description into a lazy sequence of tagged
//! wait/key/mouse steps — fresh and restartable per trigger, infinite while
//! the toggle flag is set — and [`Action::execute`] walks that sequence
//! strictly in order, sleeping on waits and injecting everything else.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use crate::error::{MacroError, Result};
use crate::injector::InjectorHandle;
use crate::input::{ClickKind, KeyInfo, MouseInfo};

/// Delay between repeat blocks unless configured otherwise.
pub const DEFAULT_REPEAT_DELAY: Duration = Duration::from_millis(10);

/// One step of a lowered action sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionStep {
    /// Suspend for the given duration.
    Wait(Duration),
    /// Tap or hold a key.
    Key(KeyInfo),
    /// Perform a mouse action.
    Mouse(MouseInfo),
}

/// A repeatable, optionally continuous sequence of input primitives.
///
/// Immutable after construction except for the toggle flag, which external
/// code may clear through a [`ToggleHandle`] to stop a continuous action at
/// its next block boundary.
#[derive(Debug, Clone)]
pub struct Action {
    keys: Vec<KeyInfo>,
    clicks: Vec<MouseInfo>,
    start_delay: Duration,
    repeat_delay: Duration,
    repeat_amount: u32,
    toggle: Arc<AtomicBool>,
}

/// Shared handle to an action's toggle flag.
#[derive(Debug, Clone)]
pub struct ToggleHandle(Arc<AtomicBool>);

impl ToggleHandle {
    /// Set the flag: the action keeps repeating.
    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Clear the flag: a running continuous action stops at its next block
    /// boundary.
    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    /// Whether the flag is currently set.
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl Action {
    /// Create an action from its key and mouse primitives.
    ///
    /// Fails when both lists are empty, and when a cursor move lacks its
    /// target coordinates or offset.
    pub fn new(keys: Vec<KeyInfo>, clicks: Vec<MouseInfo>) -> Result<Self> {
        if keys.is_empty() && clicks.is_empty() {
            return Err(MacroError::empty_action(
                "action has no keys and no mouse steps",
            ));
        }
        for click in &clicks {
            match click.kind {
                ClickKind::Move if click.position().is_none() => {
                    return Err(MacroError::config_validation(
                        "mouse move needs target coordinates",
                    ));
                }
                ClickKind::MoveRelative if click.offset().is_none() => {
                    return Err(MacroError::config_validation(
                        "relative mouse move needs an offset",
                    ));
                }
                _ => {}
            }
        }
        Ok(Self {
            keys,
            clicks,
            start_delay: Duration::ZERO,
            repeat_delay: DEFAULT_REPEAT_DELAY,
            repeat_amount: 0,
            toggle: Arc::new(AtomicBool::new(false)),
        })
    }

    /// A keyboard-only action.
    pub fn keyboard(keys: Vec<KeyInfo>) -> Result<Self> {
        Self::new(keys, Vec::new())
    }

    /// A mouse-only action.
    pub fn mouse(clicks: Vec<MouseInfo>) -> Result<Self> {
        Self::new(Vec::new(), clicks)
    }

    /// Set the delay before the first block runs.
    pub fn start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = delay;
        self
    }

    /// Set the delay emitted after each block.
    pub fn repeat_delay(mut self, delay: Duration) -> Self {
        self.repeat_delay = delay;
        self
    }

    /// Set how many additional times the block runs beyond the first.
    /// Irrelevant while the action is continuous.
    pub fn repeat_amount(mut self, amount: u32) -> Self {
        self.repeat_amount = amount;
        self
    }

    /// Mark the action continuous: it repeats until the toggle is cleared.
    pub fn continuous(self) -> Self {
        self.toggle.store(true, Ordering::SeqCst);
        self
    }

    /// Handle to the toggle flag.
    pub fn toggle_handle(&self) -> ToggleHandle {
        ToggleHandle(Arc::clone(&self.toggle))
    }

    /// Whether the toggle flag is currently set.
    pub fn is_continuous(&self) -> bool {
        self.toggle.load(Ordering::SeqCst)
    }

    /// The action's key primitives.
    pub fn keys(&self) -> &[KeyInfo] {
        &self.keys
    }

    /// The action's mouse primitives.
    pub fn clicks(&self) -> &[MouseInfo] {
        &self.clicks
    }

    /// Lower the action into its lazy step sequence. Each call returns a
    /// fresh iterator starting from the beginning.
    pub fn steps(&self) -> ActionSteps<'_> {
        ActionSteps {
            action: self,
            phase: Phase::Start,
            iteration: 0,
            exhausted: false,
        }
    }

    /// Run the action once: walk the step sequence in order against the
    /// injector. Continuous actions return only after the toggle is cleared.
    pub async fn execute(&self, injector: &InjectorHandle) -> Result<()> {
        for step in self.steps() {
            match step {
                ActionStep::Wait(delay) => {
                    if !delay.is_zero() {
                        sleep(delay).await;
                    }
                }
                ActionStep::Key(key) => {
                    if key.hold.is_zero() {
                        injector.press_hotkey(&key).await?;
                    } else {
                        injector.hold_key(&key).await?;
                    }
                }
                ActionStep::Mouse(info) => injector.mouse_action(&info).await?,
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy)]
enum Phase {
    Start,
    Key(usize),
    KeyDelay(usize),
    Mouse(usize),
    MouseDelay(usize),
    Repeat,
}

/// Lazy step sequence of one action execution.
///
/// Emits the start delay (when non-zero), then per block every key followed by
/// its delay and every mouse action followed by its delay, then the repeat
/// delay. Blocks repeat `repeat_amount` additional times, and indefinitely
/// while the toggle flag stays set — the flag is re-read at every block
/// boundary, so clearing it ends the sequence.
pub struct ActionSteps<'a> {
    action: &'a Action,
    phase: Phase,
    iteration: u32,
    exhausted: bool,
}

impl Iterator for ActionSteps<'_> {
    type Item = ActionStep;

    fn next(&mut self) -> Option<ActionStep> {
        if self.exhausted {
            return None;
        }
        loop {
            match self.phase {
                Phase::Start => {
                    self.phase = Phase::Key(0);
                    if !self.action.start_delay.is_zero() {
                        return Some(ActionStep::Wait(self.action.start_delay));
                    }
                }
                Phase::Key(index) => {
                    if let Some(key) = self.action.keys.get(index) {
                        self.phase = Phase::KeyDelay(index);
                        return Some(ActionStep::Key(key.clone()));
                    }
                    self.phase = Phase::Mouse(0);
                }
                Phase::KeyDelay(index) => {
                    self.phase = Phase::Key(index + 1);
                    return Some(ActionStep::Wait(self.action.keys[index].delay));
                }
                Phase::Mouse(index) => {
                    if let Some(click) = self.action.clicks.get(index) {
                        self.phase = Phase::MouseDelay(index);
                        return Some(ActionStep::Mouse(click.clone()));
                    }
                    self.phase = Phase::Repeat;
                }
                Phase::MouseDelay(index) => {
                    self.phase = Phase::Mouse(index + 1);
                    return Some(ActionStep::Wait(self.action.clicks[index].delay));
                }
                Phase::Repeat => {
                    if self.iteration < self.action.repeat_amount {
                        self.iteration += 1;
                        self.phase = Phase::Key(0);
                    } else if self.action.toggle.load(Ordering::SeqCst) {
                        self.iteration = 0;
                        self.phase = Phase::Key(0);
                    } else {
                        self.exhausted = true;
                    }
                    return Some(ActionStep::Wait(self.action.repeat_delay));
                }
            }
        }
    }
}
