//! JSON macro-definitions file.
//!
//! Declarative counterpart to registering commands in code: a definitions
//! file lists hotkeys and the actions they trigger, with all delays written
//! as duration strings (`"500ms"`, `"2s"`, `"1m"`, or a bare number of
//! milliseconds). Loaded once at startup; any invalid entry aborts before the
//! listener starts.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::action::{Action, DEFAULT_REPEAT_DELAY};
use crate::command::{Callback, Command, KeyboardCommand, MouseCommand, ScriptCommand};
use crate::error::{MacroError, Result};
use crate::input::{ClickKind, KeyInfo, MouseInfo};
use crate::manager::Manager;

/// Parse a duration string: optional `ms`, `s` or `m` suffix, bare numbers
/// are milliseconds. Case-insensitive, surrounding whitespace ignored,
/// negative and malformed values rejected.
pub fn parse_duration(value: &str) -> Result<Duration> {
    let trimmed = value.trim().to_lowercase();
    if trimmed.is_empty() {
        return Err(MacroError::invalid_duration(value, "empty duration"));
    }

    let (number, multiplier_ms) = if let Some(n) = trimmed.strip_suffix("ms") {
        (n, 1)
    } else if let Some(n) = trimmed.strip_suffix('s') {
        (n, 1_000)
    } else if let Some(n) = trimmed.strip_suffix('m') {
        (n, 60_000)
    } else {
        (trimmed.as_str(), 1)
    };

    let amount: u64 = number.trim().parse().map_err(|_| {
        MacroError::invalid_duration(value, "expected a non-negative number with ms/s/m suffix")
    })?;
    Ok(Duration::from_millis(amount * multiplier_ms))
}

mod duration_str {
    use super::parse_duration;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{}ms", value.as_millis()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}

fn default_repeat_delay() -> Duration {
    DEFAULT_REPEAT_DELAY
}

/// Timing knobs shared by keyboard and mouse macro definitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingDef {
    /// Delay before the first block runs.
    #[serde(default, with = "duration_str")]
    pub start_delay: Duration,
    /// Delay after each block.
    #[serde(default = "default_repeat_delay", with = "duration_str")]
    pub repeat_delay: Duration,
    /// Additional repeats beyond the first execution.
    #[serde(default)]
    pub repeat_amount: u32,
    /// Repeat until toggled off instead of a fixed amount.
    #[serde(default)]
    pub continuous: bool,
}

impl Default for TimingDef {
    fn default() -> Self {
        Self {
            start_delay: Duration::ZERO,
            repeat_delay: DEFAULT_REPEAT_DELAY,
            repeat_amount: 0,
            continuous: false,
        }
    }
}

/// One key to press within a keyboard macro.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyDef {
    /// Key identifier.
    pub key: String,
    /// Hold ctrl while pressing (omit for don't-care).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ctrl: Option<bool>,
    /// Hold alt while pressing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<bool>,
    /// Hold shift while pressing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift: Option<bool>,
    /// Delay after this key.
    #[serde(default, with = "duration_str")]
    pub delay: Duration,
    /// Hold duration; zero taps.
    #[serde(default, with = "duration_str")]
    pub hold: Duration,
}

impl KeyDef {
    fn to_key_info(&self) -> KeyInfo {
        KeyInfo {
            key: self.key.to_lowercase(),
            ctrl: self.ctrl,
            alt: self.alt,
            shift: self.shift,
            delay: self.delay,
            hold: self.hold,
        }
    }
}

/// One mouse action within a mouse macro.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClickDef {
    /// What to perform.
    #[serde(default)]
    pub kind: ClickKind,
    /// Absolute x target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    /// Absolute y target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    /// Relative x offset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dx: Option<i32>,
    /// Relative y offset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dy: Option<i32>,
    /// Delay after this action.
    #[serde(default, with = "duration_str")]
    pub delay: Duration,
    /// Cursor move duration.
    #[serde(default, with = "duration_str")]
    pub duration: Duration,
}

impl ClickDef {
    fn to_mouse_info(&self) -> MouseInfo {
        MouseInfo {
            kind: self.kind,
            x: self.x,
            y: self.y,
            dx: self.dx,
            dy: self.dy,
            delay: self.delay,
            duration: self.duration,
        }
    }
}

/// The action half of a macro definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionDef {
    /// Press a sequence of keys.
    Keyboard {
        /// Keys to press, in order.
        keys: Vec<KeyDef>,
        /// Timing knobs.
        #[serde(flatten)]
        timing: TimingDef,
    },
    /// Perform a sequence of mouse actions.
    Mouse {
        /// Mouse actions to perform, in order.
        clicks: Vec<ClickDef>,
        /// Timing knobs.
        #[serde(flatten)]
        timing: TimingDef,
    },
    /// Set the engine's exit flag.
    Exit {
        /// Delay before exiting.
        #[serde(default, with = "duration_str")]
        start_delay: Duration,
    },
}

impl ActionDef {
    fn build(&self, manager: &Manager) -> Result<Command> {
        match self {
            Self::Keyboard { keys, timing } => {
                let keys = keys.iter().map(KeyDef::to_key_info).collect();
                let action = apply_timing(Action::keyboard(keys)?, timing);
                Ok(Command::Keyboard(KeyboardCommand::new(action)?))
            }
            Self::Mouse { clicks, timing } => {
                let clicks = clicks.iter().map(ClickDef::to_mouse_info).collect();
                let action = apply_timing(Action::mouse(clicks)?, timing);
                Ok(Command::Mouse(MouseCommand::new(action)?))
            }
            Self::Exit { start_delay } => {
                let manager = manager.clone();
                let script = ScriptCommand::new(vec![Callback::sync(move || {
                    info!("exit hotkey pressed");
                    manager.request_exit();
                })])
                .start_delay(*start_delay);
                Ok(Command::Script(script))
            }
        }
    }
}

fn apply_timing(action: Action, timing: &TimingDef) -> Action {
    let action = action
        .start_delay(timing.start_delay)
        .repeat_delay(timing.repeat_delay)
        .repeat_amount(timing.repeat_amount);
    if timing.continuous {
        action.continuous()
    } else {
        action
    }
}

/// One hotkey binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MacroDef {
    /// Hotkey specification, e.g. `"alt+1"` or `"h,e,l,l,o"`.
    pub hotkey: String,
    /// What the hotkey triggers.
    pub action: ActionDef,
}

/// A macro definitions file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MacroFile {
    /// All macro definitions.
    #[serde(default)]
    pub macros: Vec<MacroDef>,
}

impl MacroFile {
    /// Load definitions from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| MacroError::config_load(path.display().to_string(), e.to_string()))?;
        serde_json::from_str(&contents)
            .map_err(|e| MacroError::config_load(path.display().to_string(), e.to_string()))
    }

    /// Write definitions to a JSON file.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| MacroError::config_save(path.display().to_string(), e.to_string()))?;
        fs::write(path, contents)
            .map_err(|e| MacroError::config_save(path.display().to_string(), e.to_string()))
    }

    /// Validate the definitions without registering anything.
    pub fn validate(&self) -> Result<()> {
        if self.macros.is_empty() {
            return Err(MacroError::config_validation("no macros defined"));
        }
        for def in &self.macros {
            if def.hotkey.trim().is_empty() {
                return Err(MacroError::config_validation("macro hotkey cannot be empty"));
            }
            match &def.action {
                ActionDef::Keyboard { keys, .. } if keys.is_empty() => {
                    return Err(MacroError::config_validation(format!(
                        "macro '{}' has no keys",
                        def.hotkey
                    )));
                }
                ActionDef::Mouse { clicks, .. } if clicks.is_empty() => {
                    return Err(MacroError::config_validation(format!(
                        "macro '{}' has no mouse actions",
                        def.hotkey
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Validate, build and register every definition on `manager`.
    pub fn apply(&self, manager: &Manager) -> Result<()> {
        self.validate()?;
        for def in &self.macros {
            let command = def.action.build(manager)?;
            manager.register(&def.hotkey, command)?;
        }
        info!(count = self.macros.len(), "macro definitions applied");
        Ok(())
    }
}
