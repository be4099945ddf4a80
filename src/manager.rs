//! Command registry, dispatch and feedback suppression.
//!
//! The [`Manager`] owns the registry, the rolling press history, the
//! held-modifier state and the suppression counters. The listener delivery
//! path (`on_press`/`on_release`) is synchronous and never waits on macro
//! execution: every matched command runs on its own spawned task.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, trace, warn};

use crate::command::{Command, Registration};
use crate::error::Result;
use crate::history::PressHistory;
use crate::hotkey::parse_hotkey_spec;
use crate::injector::{InjectorHandle, InputInjector};
use crate::input::{canonical_modifier, KeyInfo};
use crate::listener::{InputEvent, InputListener};
use crate::suppress::SuppressionCounters;

#[derive(Debug, Default, Clone, Copy)]
struct ModifierState {
    ctrl: bool,
    alt: bool,
    shift: bool,
}

impl ModifierState {
    fn set(&mut self, name: &str, held: bool) {
        match name {
            "ctrl" => self.ctrl = held,
            "alt" => self.alt = held,
            "shift" => self.shift = held,
            _ => {}
        }
    }
}

struct Inner {
    registry: Mutex<Vec<Arc<Registration>>>,
    history: Mutex<PressHistory>,
    modifiers: Mutex<ModifierState>,
    suppression: SuppressionCounters,
    injector: InjectorHandle,
    exit_tx: watch::Sender<bool>,
}

/// The macro engine: registry, matcher, dispatcher and suppression owner.
///
/// Cheap to clone; clones share all state. Script callbacks typically capture
/// a clone to call [`Manager::request_exit`].
#[derive(Clone)]
pub struct Manager {
    inner: Arc<Inner>,
}

impl Manager {
    /// Create an engine around an injection backend.
    pub fn new(backend: Arc<dyn InputInjector>) -> Self {
        let suppression = SuppressionCounters::new();
        let injector = InjectorHandle::new(backend, suppression.clone());
        let (exit_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                registry: Mutex::new(Vec::new()),
                history: Mutex::new(PressHistory::new()),
                modifiers: Mutex::new(ModifierState::default()),
                suppression,
                injector,
                exit_tx,
            }),
        }
    }

    /// Parse `spec` and bind `command` to it. The hotkey is attached here,
    /// exactly once; parse failures are fatal configuration errors.
    pub fn register(&self, spec: &str, command: Command) -> Result<()> {
        let hotkey = parse_hotkey_spec(spec)?;
        info!(
            spec = spec,
            kind = command.kind(),
            chords = hotkey.len(),
            "registered hotkey"
        );
        lock(&self.inner.registry).push(Arc::new(Registration::new(spec, hotkey, command)));
        Ok(())
    }

    /// Number of registered commands.
    pub fn command_count(&self) -> usize {
        lock(&self.inner.registry).len()
    }

    /// The gated injector handle, for executing actions outside the usual
    /// hotkey dispatch.
    pub fn injector(&self) -> &InjectorHandle {
        &self.inner.injector
    }

    /// Current `(presses, releases)` pending-suppression counts.
    pub fn pending_suppression(&self) -> (usize, usize) {
        self.inner.suppression.pending()
    }

    /// Set the exit flag; [`Manager::run`] returns once it observes it.
    pub fn request_exit(&self) {
        info!("exit requested");
        self.inner.exit_tx.send_replace(true);
    }

    /// Whether the exit flag has been set.
    pub fn exit_requested(&self) -> bool {
        *self.inner.exit_tx.borrow()
    }

    /// Handle one key-down report from the listener.
    ///
    /// Suppressed echoes are dropped first; bare modifier presses only update
    /// the held-modifier state. Everything else is stamped with the current
    /// modifiers, recorded in the history, and matched against every
    /// registration — each match is dispatched on its own task, so this call
    /// never waits on a macro.
    pub fn on_press(&self, key: &str, named: bool) {
        let key = key.to_lowercase();
        if self.inner.suppression.consume_press() {
            trace!(key = key.as_str(), "suppressed synthetic press");
            return;
        }
        if named {
            if let Some(name) = canonical_modifier(&key) {
                lock(&self.inner.modifiers).set(name, true);
                trace!(modifier = name, "modifier down");
                return;
            }
        }

        let stamped = {
            let modifiers = lock(&self.inner.modifiers);
            KeyInfo::new(key)
                .ctrl(modifiers.ctrl)
                .alt(modifiers.alt)
                .shift(modifiers.shift)
        };
        debug!(key = %stamped, "key pressed");

        let matched: Vec<Arc<Registration>> = {
            let mut history = lock(&self.inner.history);
            history.push(stamped);
            let registry = lock(&self.inner.registry);
            registry
                .iter()
                .filter(|registration| registration.matches(&history))
                .cloned()
                .collect()
        };
        for registration in matched {
            self.dispatch(registration);
        }
    }

    /// Handle one key-up report from the listener. Releases update modifier
    /// state only — they are not part of the matching model.
    pub fn on_release(&self, key: &str, named: bool) {
        let key = key.to_lowercase();
        if self.inner.suppression.consume_release() {
            trace!(key = key.as_str(), "suppressed synthetic release");
            return;
        }
        if named {
            if let Some(name) = canonical_modifier(&key) {
                lock(&self.inner.modifiers).set(name, false);
                trace!(modifier = name, "modifier up");
                return;
            }
        }
        trace!(key = key.as_str(), "key released");
    }

    fn dispatch(&self, registration: Arc<Registration>) {
        info!(
            spec = registration.spec(),
            kind = registration.command().kind(),
            "hotkey matched, dispatching"
        );
        let injector = self.inner.injector.clone();
        tokio::spawn(async move {
            if let Err(e) = registration.command().execute(&injector).await {
                error!(
                    spec = registration.spec(),
                    error = %e,
                    "command execution failed"
                );
            }
        });
    }

    /// Start `listener` on a blocking thread and process its events until the
    /// exit flag is set. The event loop itself never suspends on macros; if
    /// the listener ends early, the engine keeps waiting for the exit flag.
    pub async fn run<L: InputListener>(&self, listener: L) -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut listener = listener;
        tokio::task::spawn_blocking(move || {
            if let Err(e) = listener.run(tx) {
                error!(error = %e, "input listener failed");
            }
        });

        let mut exit_rx = self.inner.exit_tx.subscribe();
        let mut listener_done = false;
        info!("macro engine running");
        loop {
            if *exit_rx.borrow() {
                break;
            }
            tokio::select! {
                changed = exit_rx.changed() => {
                    if changed.is_err() || *exit_rx.borrow() {
                        break;
                    }
                }
                event = rx.recv(), if !listener_done => {
                    match event {
                        Some(InputEvent::Press { key, named }) => self.on_press(&key, named),
                        Some(InputEvent::Release { key, named }) => self.on_release(&key, named),
                        None => {
                            warn!("input listener ended; still waiting for the exit flag");
                            listener_done = true;
                        }
                    }
                }
            }
        }
        info!("macro engine stopping");
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
