//! Test support utilities for the unit and integration test suites.
//!
//! Public so the `tests/` directory can use them; lightweight enough to ship.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::bail;

use crate::injector::InputInjector;
use crate::input::ClickKind;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectedCall {
    /// `tap_hotkey` with the given key list.
    TapHotkey(Vec<String>),
    /// `key_down` of the given key.
    KeyDown(String),
    /// `key_up` of the given key.
    KeyUp(String),
    /// `mouse_click` of the given kind and position.
    MouseClick(ClickKind, Option<(i32, i32)>),
    /// `mouse_move` to the given coordinates.
    MouseMove(i32, i32, Duration),
    /// `mouse_move_relative` by the given offset.
    MouseMoveRelative(i32, i32, Duration),
}

/// Recording injection backend. Clones share the same call log, so a test can
/// keep one clone while the engine owns the other.
#[derive(Debug, Clone, Default)]
pub struct MockInjector {
    calls: Arc<Mutex<Vec<InjectedCall>>>,
    failing: Arc<Mutex<bool>>,
}

impl MockInjector {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded calls, in order.
    pub fn calls(&self) -> Vec<InjectedCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of recorded calls.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Drop all recorded calls.
    pub fn clear(&self) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    /// Make every subsequent call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap_or_else(|e| e.into_inner()) = failing;
    }

    fn record(&self, call: InjectedCall) -> anyhow::Result<()> {
        if *self.failing.lock().unwrap_or_else(|e| e.into_inner()) {
            bail!("injector offline");
        }
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
        Ok(())
    }
}

impl InputInjector for MockInjector {
    fn tap_hotkey(&self, keys: &[&str]) -> anyhow::Result<()> {
        self.record(InjectedCall::TapHotkey(
            keys.iter().map(|k| (*k).to_string()).collect(),
        ))
    }

    fn key_down(&self, key: &str) -> anyhow::Result<()> {
        self.record(InjectedCall::KeyDown(key.to_string()))
    }

    fn key_up(&self, key: &str) -> anyhow::Result<()> {
        self.record(InjectedCall::KeyUp(key.to_string()))
    }

    fn mouse_click(&self, kind: ClickKind, position: Option<(i32, i32)>) -> anyhow::Result<()> {
        self.record(InjectedCall::MouseClick(kind, position))
    }

    fn mouse_move(&self, x: i32, y: i32, duration: Duration) -> anyhow::Result<()> {
        self.record(InjectedCall::MouseMove(x, y, duration))
    }

    fn mouse_move_relative(&self, dx: i32, dy: i32, duration: Duration) -> anyhow::Result<()> {
        self.record(InjectedCall::MouseMoveRelative(dx, dy, duration))
    }
}

/// Await until the mock has recorded at least `at_least` calls, up to
/// `timeout_ms`. Generous timeouts are cheap under a paused clock: the polls
/// advance virtual time, not wall time.
pub async fn wait_for_calls(mock: &MockInjector, at_least: usize, timeout_ms: u64) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
    loop {
        if mock.call_count() >= at_least {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
}
