//! Custom error types for macro-key-runner.
//!
//! This module provides structured error types using `thiserror` for better
//! error handling and more informative error messages.

use std::io;
use thiserror::Error;

/// Main error type for macro-key-runner operations.
///
/// Configuration errors (invalid hotkey specs, empty actions, malformed
/// definitions files) are raised before the input listener starts and are fatal
/// to startup. Injection errors occur while a command executes and are confined
/// to that command's task.
#[derive(Error, Debug)]
pub enum MacroError {
    /// Error parsing a hotkey specification string.
    #[error("invalid hotkey '{spec}': {reason}")]
    InvalidHotkey { spec: String, reason: String },

    /// The specified key is invalid or unsupported.
    #[error("invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    /// An action was constructed without any primitives to perform.
    #[error("empty action: {0}")]
    EmptyAction(String),

    /// Configuration validation error.
    #[error("configuration error: {0}")]
    ConfigValidation(String),

    /// Error reading or parsing the macro definitions file.
    #[error("failed to load macro definitions from '{path}': {reason}")]
    ConfigLoad { path: String, reason: String },

    /// Error writing the macro definitions file.
    #[error("failed to save macro definitions to '{path}': {reason}")]
    ConfigSave { path: String, reason: String },

    /// Error parsing duration string.
    #[error("invalid duration '{value}': {reason}")]
    InvalidDuration { value: String, reason: String },

    /// A synthetic input injection failed.
    #[error("injection failed for '{target}': {reason}")]
    Injection { target: String, reason: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for macro-key-runner operations.
pub type Result<T> = std::result::Result<T, MacroError>;

impl MacroError {
    /// Create a new InvalidHotkey error.
    pub fn invalid_hotkey(spec: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidHotkey {
            spec: spec.into(),
            reason: reason.into(),
        }
    }

    /// Create a new InvalidKey error.
    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create a new EmptyAction error.
    pub fn empty_action(message: impl Into<String>) -> Self {
        Self::EmptyAction(message.into())
    }

    /// Create a new ConfigValidation error.
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation(message.into())
    }

    /// Create a new ConfigLoad error.
    pub fn config_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a new ConfigSave error.
    pub fn config_save(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigSave {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a new InvalidDuration error.
    pub fn invalid_duration(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDuration {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a new Injection error.
    pub fn injection(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Injection {
            target: target.into(),
            reason: reason.into(),
        }
    }
}
