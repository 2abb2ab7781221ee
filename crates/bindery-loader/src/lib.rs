//! Module bootstrap runtime for fragment-based module trees.
//!
//! The `bindery-loader` crate implements the dependency resolution and
//! fragment-loading layer every module in a bindery deployment relies
//! on to bootstrap itself. A module is a directory carrying `Private/`
//! and `Public/` subtrees of source fragments; at load time the loader
//! resolves the module's declared dependencies (tolerating partial
//! availability), executes each fragment with per-fragment fault
//! isolation, extracts every public fragment's operation name from its
//! own text, and publishes the deduplicated export surface to the
//! host.
//!
//! # Architecture
//!
//! [`ModuleLoader`] is the orchestrator. It latches a process-wide
//! [`guard::ReentrancyGuard`] so mutually dependent modules cannot
//! recurse into each other, resolves dependencies through a
//! [`resolve::ModuleRegistry`] with sibling-path and global-registry
//! fallback, walks both fragment tiers with [`FragmentScanner`], and
//! hands the assembled [`ExportSet`] to the host's [`ExportSink`].
//! Every recoverable failure degrades the resulting [`LoadReport`]
//! instead of aborting the load.
//!
//! # Example
//!
//! ```rust,no_run
//! use bindery_loader::{
//!     DiscardSink, Fragment, FragmentExecutor, LoaderError, ModuleDescriptor, ModuleLoader,
//! };
//! use bindery_loader::resolve::ProcessRegistry;
//!
//! struct NullExecutor;
//! impl FragmentExecutor for NullExecutor {
//!     fn execute(&mut self, _fragment: &Fragment) -> Result<(), LoaderError> {
//!         Ok(())
//!     }
//! }
//!
//! let descriptor = ModuleDescriptor::new(
//!     "Storage",
//!     "/srv/modules/Storage",
//!     vec!["Core".into()],
//! );
//! let mut loader = ModuleLoader::new(descriptor, NullExecutor, DiscardSink);
//! let mut registry = ProcessRegistry::new();
//! let report = loader.load(&mut registry).expect("load completes");
//! assert_eq!(report.module(), "Storage");
//! ```

pub mod convention;
pub mod error;
pub mod extract;
pub mod fragment;
pub mod guard;
pub mod loader;
pub mod report;
pub mod resolve;
pub mod telemetry;

#[cfg(test)]
mod tests;

pub use self::convention::Convention;
pub use self::error::LoaderError;
pub use self::fragment::{Fragment, FragmentScanner, Tier};
pub use self::loader::{
    DiscardSink, ExportSink, FragmentExecutor, LifecycleState, ModuleDescriptor, ModuleLoader,
    ScopedPreferences,
};
pub use self::report::{Diagnostics, ExportSet, Level, LoadReport, LoadStatus};
pub use self::resolve::{DependencyOutcome, DependencyResolver, ResolutionSource};
