//! Host preference switches the loader may temporarily override.
//!
//! A load runs with reduced verbosity and a continue-on-error mode so
//! one broken fragment cannot halt the bootstrap. The previous values
//! must be restored on every exit path, so [`SharedPreferences`]
//! exposes swap-style setters that hand back the prior value.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How much progress detail the host surfaces while running.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Verbosity {
    /// Suppress progress output entirely.
    Silent,
    /// Default operator-facing output.
    #[default]
    Normal,
    /// Per-step detail for troubleshooting.
    Verbose,
}

/// How the host reacts to a recoverable error.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ErrorMode {
    /// Stop at the first error.
    #[default]
    Halt,
    /// Record the error and keep going.
    Continue,
}

/// Ambient preference switches consulted by the host environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Preferences {
    /// Progress detail level.
    pub verbosity: Verbosity,
    /// Reaction to recoverable errors.
    pub error_mode: ErrorMode,
}

/// Shared, process-wide handle to the host preferences.
///
/// Cloning the handle shares the underlying state. Accessors recover
/// from mutex poisoning by taking the inner value; preferences are
/// plain copies, so a poisoned lock cannot leave them torn.
#[derive(Debug, Clone, Default)]
pub struct SharedPreferences {
    inner: Arc<Mutex<Preferences>>,
}

impl SharedPreferences {
    /// Creates a handle seeded with the given preferences.
    #[must_use]
    pub fn new(preferences: Preferences) -> Self {
        Self {
            inner: Arc::new(Mutex::new(preferences)),
        }
    }

    /// Returns a copy of the current preferences.
    #[must_use]
    pub fn snapshot(&self) -> Preferences {
        *self.lock()
    }

    /// Replaces the preferences wholesale, returning the prior values.
    #[must_use = "restore the prior preferences when the override ends"]
    pub fn replace(&self, preferences: Preferences) -> Preferences {
        std::mem::replace(&mut *self.lock(), preferences)
    }

    /// Sets the verbosity, returning the prior value.
    pub fn set_verbosity(&self, verbosity: Verbosity) -> Verbosity {
        std::mem::replace(&mut self.lock().verbosity, verbosity)
    }

    /// Sets the error mode, returning the prior value.
    pub fn set_error_mode(&self, error_mode: ErrorMode) -> ErrorMode {
        std::mem::replace(&mut self.lock().error_mode, error_mode)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Preferences> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
