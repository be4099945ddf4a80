//! # Macro Key Runner
//!
//! A desktop input-automation macro engine: it watches the global keyboard
//! stream, matches the most recent presses against registered hotkey
//! sequences, and replays parameterized keyboard/mouse actions in response.
//!
//! ## Features
//!
//! - Hotkey chords (`"ctrl+alt+f"`) and chord sequences (`"h,e,l,l,o"`)
//!   matched against a rolling window of the last 20 key presses
//! - Timed actions: start delays, per-key delays, holds, repeat counts and
//!   continuous (toggled) repetition
//! - Script commands for arbitrary side effects, such as stopping the engine
//! - Self-feedback suppression: the engine's own synthetic key events are
//!   never mistaken for user input
//! - Matched commands run concurrently; the input hook is never blocked
//! - JSON macro-definitions file support
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use macro_key_runner::{
//!     Action, Command, KeyInfo, KeyboardCommand, Manager,
//!     test_support::MockInjector,
//! };
//!
//! // Create the engine around an injection backend.
//! let manager = Manager::new(Arc::new(MockInjector::new()));
//!
//! // Hotkey "alt+e": press the key E twenty times.
//! let action = Action::keyboard(vec![KeyInfo::new("e")])
//!     .unwrap()
//!     .start_delay(Duration::from_secs(1))
//!     .repeat_amount(19);
//! manager
//!     .register("alt+e", Command::Keyboard(KeyboardCommand::new(action).unwrap()))
//!     .unwrap();
//! ```
//!
//! ## Configuration
//!
//! Macros can also be loaded from a JSON definitions file:
//!
//! ```json
//! {
//!   "macros": [
//!     {
//!       "hotkey": "alt+1",
//!       "action": {
//!         "type": "mouse",
//!         "clicks": [{"kind": "left"}],
//!         "start_delay": "1s",
//!         "repeat_amount": 2
//!       }
//!     },
//!     {"hotkey": "alt+q", "action": {"type": "exit"}}
//!   ]
//! }
//! ```

pub mod action;
pub mod command;
pub mod config;
pub mod error;
pub mod history;
pub mod hotkey;
pub mod injector;
pub mod input;
pub mod listener;
pub mod manager;
pub mod suppress;
pub mod test_support;

pub use action::{Action, ActionStep, ToggleHandle, DEFAULT_REPEAT_DELAY};
pub use command::{Callback, Command, KeyboardCommand, MouseCommand, ScriptCommand};
pub use config::{parse_duration, MacroFile};
pub use error::{MacroError, Result};
pub use history::{PressHistory, HISTORY_LIMIT};
pub use hotkey::parse_hotkey_spec;
pub use injector::{InjectorHandle, InputInjector};
pub use input::{ClickKind, KeyInfo, MouseInfo};
pub use listener::{EventSender, InputEvent, InputListener};
pub use manager::Manager;
pub use suppress::SuppressionCounters;
