//! Synthetic input injection.
//!
//! [`InputInjector`] is the seam to the OS-level primitives that actually
//! press keys and move the mouse; the engine only ever talks to it through
//! [`InjectorHandle`], which serializes all injection under one gate and
//! credits the suppression counters before every synthetic key event.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{MacroError, Result};
use crate::input::{ClickKind, KeyInfo, MouseInfo};
use crate::suppress::SuppressionCounters;

/// OS-level input injection primitives, implemented by a platform backend.
///
/// Implementations must be cheap to call and are free to return any error;
/// the engine wraps failures with the offending target and isolates them to
/// the executing command.
pub trait InputInjector: Send + Sync {
    /// Press and release `keys` as one combination (modifiers first).
    fn tap_hotkey(&self, keys: &[&str]) -> anyhow::Result<()>;

    /// Press `key` down without releasing it.
    fn key_down(&self, key: &str) -> anyhow::Result<()>;

    /// Release a previously pressed `key`.
    fn key_up(&self, key: &str) -> anyhow::Result<()>;

    /// Click at `position`, or at the current cursor position when `None`.
    fn mouse_click(&self, kind: ClickKind, position: Option<(i32, i32)>) -> anyhow::Result<()>;

    /// Move the cursor to absolute coordinates over `duration`.
    fn mouse_move(&self, x: i32, y: i32, duration: Duration) -> anyhow::Result<()>;

    /// Move the cursor by a relative offset over `duration`.
    fn mouse_move_relative(&self, dx: i32, dy: i32, duration: Duration) -> anyhow::Result<()>;
}

/// Gated, suppression-crediting wrapper around the injection backend.
///
/// One shared `tokio::sync::Mutex` serializes every injection; a hold bracket
/// (modifiers down, key down, hold, key up, modifiers up in reverse) keeps the
/// gate for its whole duration so two concurrent actions can never interleave
/// their modifier brackets and leave a modifier stuck.
#[derive(Clone)]
pub struct InjectorHandle {
    backend: Arc<dyn InputInjector>,
    gate: Arc<Mutex<()>>,
    suppression: SuppressionCounters,
}

impl InjectorHandle {
    /// Wrap a backend, sharing `suppression` with the listener side.
    pub fn new(backend: Arc<dyn InputInjector>, suppression: SuppressionCounters) -> Self {
        Self {
            backend,
            gate: Arc::new(Mutex::new(())),
            suppression,
        }
    }

    /// Tap a key combination (press and release, modifiers first).
    pub async fn press_hotkey(&self, key: &KeyInfo) -> Result<()> {
        let keys = key.hotkey_list();
        let _gate = self.gate.lock().await;
        debug!(hotkey = %key, "pressing hotkey");
        // One credit per synthetic key-down and key-up the tap produces.
        self.suppression.credit_presses(keys.len());
        self.suppression.credit_releases(keys.len());
        self.backend
            .tap_hotkey(&keys)
            .map_err(|e| MacroError::injection(key.to_string(), e.to_string()))
    }

    /// Hold a key (with its required modifiers) down for its hold duration.
    pub async fn hold_key(&self, key: &KeyInfo) -> Result<()> {
        let modifiers = key.held_modifiers();
        let _gate = self.gate.lock().await;

        for name in modifiers.iter().copied() {
            debug!(modifier = name, "holding modifier");
            self.suppression.credit_presses(1);
            self.down(name, key)?;
        }
        debug!(key = %key.key, hold_ms = key.hold.as_millis() as u64, "holding key");
        self.suppression.credit_presses(1);
        self.down(&key.key, key)?;

        sleep(key.hold).await;

        debug!(key = %key.key, "releasing key");
        self.suppression.credit_releases(1);
        self.up(&key.key, key)?;
        for name in modifiers.iter().rev().copied() {
            debug!(modifier = name, "releasing modifier");
            self.suppression.credit_releases(1);
            self.up(name, key)?;
        }
        Ok(())
    }

    /// Perform one mouse action.
    pub async fn mouse_action(&self, info: &MouseInfo) -> Result<()> {
        let _gate = self.gate.lock().await;
        debug!(action = %info.kind, "mouse action");
        let outcome = match info.kind {
            ClickKind::Undefined => {
                warn!("skipping undefined mouse action");
                return Ok(());
            }
            ClickKind::Move => {
                let (x, y) = info.position().ok_or_else(|| {
                    MacroError::config_validation("mouse move needs target coordinates")
                })?;
                self.backend.mouse_move(x, y, info.duration)
            }
            ClickKind::MoveRelative => {
                let (dx, dy) = info.offset().ok_or_else(|| {
                    MacroError::config_validation("relative mouse move needs an offset")
                })?;
                self.backend.mouse_move_relative(dx, dy, info.duration)
            }
            kind => self.backend.mouse_click(kind, info.position()),
        };
        outcome.map_err(|e| MacroError::injection(info.kind.to_string(), e.to_string()))
    }

    fn down(&self, name: &str, target: &KeyInfo) -> Result<()> {
        self.backend
            .key_down(name)
            .map_err(|e| MacroError::injection(target.to_string(), e.to_string()))
    }

    fn up(&self, name: &str, target: &KeyInfo) -> Result<()> {
        self.backend
            .key_up(name)
            .map_err(|e| MacroError::injection(target.to_string(), e.to_string()))
    }
}
