//! Load reporting: diagnostics, the export surface, and the final report.
//!
//! The loader never aborts on a recoverable failure, so operator
//! visibility carries the weight instead: every fragment failure,
//! extraction miss, and unresolved dependency lands in a
//! [`Diagnostics`] accumulator and is rendered once at the end of the
//! load. The [`LoadReport`] is the immutable record handed back to the
//! caller; it serialises to JSON the same way the rest of the system
//! snapshots state.

use std::collections::HashSet;

use serde::{Serialize, Serializer};
use tracing::{error, info, warn};

use crate::resolve::DependencyOutcome;

/// Tracing target for load reporting.
const REPORT_TARGET: &str = "bindery_loader::report";

/// Severity of one diagnostic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    /// Progress notes; not a failure.
    Info,
    /// Recovered conditions that degrade the load.
    Warning,
    /// Recovered failures that cost the load a fragment or dependency.
    Error,
}

impl Level {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One leveled message recorded during a load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    level: Level,
    message: String,
}

impl Diagnostic {
    /// Returns the severity.
    #[must_use]
    pub const fn level(&self) -> Level {
        self.level
    }

    /// Returns the message text.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Ordered accumulator of leveled diagnostics.
///
/// Accumulation and rendering never fail and never panic; a reporter
/// that throws would defeat its purpose.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an informational note.
    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Level::Info, message.into());
    }

    /// Records a recovered degradation.
    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(Level::Warning, message.into());
    }

    /// Records a recovered failure.
    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Level::Error, message.into());
    }

    fn push(&mut self, level: Level, message: String) {
        self.entries.push(Diagnostic { level, message });
    }

    /// Returns every recorded entry in order.
    #[must_use]
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Returns the messages of warning- and error-level entries, in
    /// the order they were recorded.
    #[must_use]
    pub fn failure_messages(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|d| d.level >= Level::Warning)
            .map(|d| d.message.clone())
            .collect()
    }

    /// Returns whether no entries have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Emits every entry through the logging subsystem, once, at the
    /// end of a load.
    pub fn render(&self, module: &str) {
        for entry in &self.entries {
            match entry.level {
                Level::Info => {
                    info!(target: REPORT_TARGET, module, "{}", entry.message);
                }
                Level::Warning => {
                    warn!(target: REPORT_TARGET, module, "{}", entry.message);
                }
                Level::Error => {
                    error!(target: REPORT_TARGET, module, "{}", entry.message);
                }
            }
        }
    }
}

/// Deduplicated, insertion-ordered set of exported operation names.
///
/// # Example
///
/// ```
/// use bindery_loader::ExportSet;
///
/// let mut exports = ExportSet::new();
/// assert!(exports.insert("Get-Thing"));
/// assert!(!exports.insert("Get-Thing"));
/// assert!(!exports.insert(""));
/// assert_eq!(exports.names(), ["Get-Thing"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSet {
    names: Vec<String>,
    seen: HashSet<String>,
}

impl ExportSet {
    /// Creates an empty export set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a name, rejecting empties and duplicates.
    ///
    /// Returns whether the name was added. Insertion order is
    /// preserved for diagnostic reproducibility.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if name.is_empty() || self.seen.contains(&name) {
            return false;
        }
        self.names.push(name.clone());
        let _was_new = self.seen.insert(name);
        true
    }

    /// Returns the exported names in insertion order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Returns whether the set contains `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.seen.contains(name)
    }

    /// Returns the number of exported names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns whether two sets export the same names, ignoring order.
    #[must_use]
    pub fn set_eq(&self, other: &Self) -> bool {
        self.seen == other.seen
    }
}

impl Serialize for ExportSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.names.serialize(serializer)
    }
}

impl<'a> IntoIterator for &'a ExportSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter()
    }
}

/// Final classification of a completed load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    /// Every dependency resolved and every fragment contributed.
    Success,
    /// The load completed but lost dependencies, fragments, or names.
    Degraded,
}

impl LoadStatus {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Degraded => "degraded",
        }
    }
}

impl std::fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable record of one load invocation.
///
/// Created by the orchestrator, returned to the caller, and never
/// mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub(crate) module: String,
    pub(crate) status: LoadStatus,
    pub(crate) fragments_found: usize,
    pub(crate) fragments_loaded: usize,
    pub(crate) dependencies_satisfied: usize,
    pub(crate) dependencies_missing: usize,
    pub(crate) failures: Vec<String>,
    pub(crate) dependencies: Vec<DependencyOutcome>,
    pub(crate) exports: ExportSet,
}

impl LoadReport {
    /// Creates an empty degraded report for a load that never started.
    #[must_use]
    pub(crate) fn rejected(module: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            status: LoadStatus::Degraded,
            fragments_found: 0,
            fragments_loaded: 0,
            dependencies_satisfied: 0,
            dependencies_missing: 0,
            failures: vec![reason.into()],
            dependencies: Vec::new(),
            exports: ExportSet::new(),
        }
    }

    /// Returns the identity of the loaded module.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Returns the final classification.
    #[must_use]
    pub const fn status(&self) -> LoadStatus {
        self.status
    }

    /// Returns whether the load completed without degradation.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.status, LoadStatus::Success)
    }

    /// Returns the number of fragments discovered across both tiers.
    #[must_use]
    pub const fn fragments_found(&self) -> usize {
        self.fragments_found
    }

    /// Returns the number of fragments that executed successfully.
    #[must_use]
    pub const fn fragments_loaded(&self) -> usize {
        self.fragments_loaded
    }

    /// Returns the number of dependencies satisfied by any strategy.
    #[must_use]
    pub const fn dependencies_satisfied(&self) -> usize {
        self.dependencies_satisfied
    }

    /// Returns the number of dependencies no strategy could satisfy.
    #[must_use]
    pub const fn dependencies_missing(&self) -> usize {
        self.dependencies_missing
    }

    /// Returns the ordered failure messages.
    #[must_use]
    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    /// Returns the per-dependency resolution outcomes in declaration
    /// order.
    #[must_use]
    pub fn dependencies(&self) -> &[DependencyOutcome] {
        &self.dependencies
    }

    /// Returns the outcome recorded for one dependency identity.
    #[must_use]
    pub fn dependency(&self, id: &str) -> Option<&DependencyOutcome> {
        self.dependencies.iter().find(|outcome| outcome.id() == id)
    }

    /// Returns the final export surface.
    #[must_use]
    pub const fn exports(&self) -> &ExportSet {
        &self.exports
    }

    /// Emits a one-line structured summary through the logging
    /// subsystem. Serialisation problems downgrade to the debug
    /// rendering; the summary never fails.
    pub fn render(&self) {
        match serde_json::to_string(self) {
            Ok(json) => {
                info!(target: REPORT_TARGET, module = %self.module, report = %json, "load complete");
            }
            Err(error) => {
                warn!(
                    target: REPORT_TARGET,
                    module = %self.module,
                    error = %error,
                    report = ?self,
                    "load complete (summary not serialisable)"
                );
            }
        }
    }
}
