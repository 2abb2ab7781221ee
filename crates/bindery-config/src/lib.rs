//! Configuration types shared across the bindery workspace.
//!
//! This crate defines the small set of ambient settings the loader
//! consults or temporarily overrides while bootstrapping a module:
//! the logging output format and the host preference switches
//! (verbosity and error-handling mode). Loads must restore any
//! preference they alter before returning, so the preference types
//! here are deliberately cheap to copy and compare.

mod logging;
mod preferences;

pub use self::logging::{LogFormat, LogFormatParseError};
pub use self::preferences::{ErrorMode, Preferences, SharedPreferences, Verbosity};
