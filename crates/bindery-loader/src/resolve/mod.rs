//! Dependency resolution with sibling-path and global-registry fallback.
//!
//! Each declared dependency is resolved independently through three
//! strategies in order: already active in the process-wide registry,
//! activatable from the conventional sibling descriptor path, or
//! activatable through the host's ambient lookup. A failure in one
//! strategy falls through to the next, and a failure for one
//! dependency never halts resolution of the rest — the resolver always
//! returns a complete outcome list, and the orchestrator decides how
//! to react downstream.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::convention::Convention;
use crate::error::LoaderError;

/// Tracing target for dependency resolution.
const RESOLVE_TARGET: &str = "bindery_loader::resolve";

/// How a dependency was satisfied, or that it was not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    /// The module was already active in the process-wide registry.
    AlreadyActive,
    /// The module was activated from its sibling descriptor path.
    SiblingPath,
    /// The module was activated through the host's ambient lookup.
    GlobalRegistry,
    /// No strategy could activate the module.
    Unresolved,
}

impl ResolutionSource {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AlreadyActive => "already_active",
            Self::SiblingPath => "sibling_path",
            Self::GlobalRegistry => "global_registry",
            Self::Unresolved => "unresolved",
        }
    }
}

impl std::fmt::Display for ResolutionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The recorded result of resolving one dependency.
///
/// Outcomes are append-only while resolution runs and frozen once the
/// resolver returns; nothing retroactively rewrites an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyOutcome {
    id: String,
    source: ResolutionSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl DependencyOutcome {
    /// Records a dependency satisfied by the given strategy.
    #[must_use]
    pub fn resolved(id: impl Into<String>, source: ResolutionSource) -> Self {
        Self {
            id: id.into(),
            source,
            error: None,
        }
    }

    /// Records a dependency no strategy could satisfy.
    #[must_use]
    pub fn unresolved(id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: ResolutionSource::Unresolved,
            error: Some(error.into()),
        }
    }

    /// Returns the dependency identity.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the strategy that satisfied the dependency.
    #[must_use]
    pub const fn source(&self) -> ResolutionSource {
        self.source
    }

    /// Returns the recorded error detail for an unresolved dependency.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns whether any strategy satisfied the dependency.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        !matches!(self.source, ResolutionSource::Unresolved)
    }
}

/// Process-wide module activation state, injected rather than ambient.
///
/// The registry is passed to the resolver by the caller so tests can
/// substitute a fake; production code shares one [`ProcessRegistry`]
/// across every loader in the process.
pub trait ModuleRegistry {
    /// Returns whether the module is already active.
    fn is_active(&self, id: &str) -> bool;

    /// Activates a module from an explicit descriptor path.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::Activation`] when the module cannot be
    /// activated from that path.
    fn activate_at(&mut self, id: &str, descriptor: &Path) -> Result<(), LoaderError>;

    /// Activates a module through the host's ambient lookup.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::Activation`] when the ambient lookup
    /// cannot supply the module.
    fn activate_ambient(&mut self, id: &str) -> Result<(), LoaderError>;

    /// Records a module as active without re-activating it.
    ///
    /// Called by the orchestrator once a module's own load completes,
    /// so later sibling loads observe it as already active.
    fn mark_active(&mut self, id: &str);
}

/// In-process [`ModuleRegistry`] implementation.
///
/// Tracks the set of active module identities plus an ambient
/// catalogue of identities the host can supply without a path (the
/// stand-in for the host environment's standard lookup mechanism).
///
/// # Example
///
/// ```
/// use bindery_loader::resolve::{ModuleRegistry, ProcessRegistry};
///
/// let mut registry = ProcessRegistry::new();
/// registry.add_ambient("Core");
/// assert!(!registry.is_active("Core"));
/// registry.activate_ambient("Core").expect("ambient activation");
/// assert!(registry.is_active("Core"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ProcessRegistry {
    active: HashSet<String>,
    ambient: HashSet<String>,
}

impl ProcessRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a module identity to the ambient catalogue.
    pub fn add_ambient(&mut self, id: impl Into<String>) {
        let _known = self.ambient.insert(id.into());
    }

    /// Returns the number of active modules.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}

impl ModuleRegistry for ProcessRegistry {
    fn is_active(&self, id: &str) -> bool {
        self.active.contains(id)
    }

    fn activate_at(&mut self, id: &str, descriptor: &Path) -> Result<(), LoaderError> {
        if !descriptor.is_file() {
            return Err(LoaderError::Activation {
                id: id.to_owned(),
                message: format!("descriptor '{}' not found", descriptor.display()),
            });
        }
        let _was_new = self.active.insert(id.to_owned());
        info!(
            target: RESOLVE_TARGET,
            module = id,
            descriptor = %descriptor.display(),
            "activated module from descriptor"
        );
        Ok(())
    }

    fn activate_ambient(&mut self, id: &str) -> Result<(), LoaderError> {
        if !self.ambient.contains(id) {
            return Err(LoaderError::Activation {
                id: id.to_owned(),
                message: String::from("not present in ambient catalogue"),
            });
        }
        let _was_new = self.active.insert(id.to_owned());
        info!(target: RESOLVE_TARGET, module = id, "activated module from ambient catalogue");
        Ok(())
    }

    fn mark_active(&mut self, id: &str) {
        let _was_new = self.active.insert(id.to_owned());
    }
}

/// Resolves a module's declared dependencies against a registry.
#[derive(Debug, Clone)]
pub struct DependencyResolver {
    module_root: PathBuf,
    convention: Convention,
}

impl DependencyResolver {
    /// Creates a resolver for the module rooted at `module_root`.
    #[must_use]
    pub fn new(module_root: impl Into<PathBuf>, convention: Convention) -> Self {
        Self {
            module_root: module_root.into(),
            convention,
        }
    }

    /// Resolves every declared dependency, continuing past failures.
    ///
    /// The returned outcomes preserve the declaration order and always
    /// contain one entry per dependency, resolved or not.
    pub fn resolve<R: ModuleRegistry + ?Sized>(
        &self,
        dependencies: &[String],
        registry: &mut R,
    ) -> Vec<DependencyOutcome> {
        dependencies
            .iter()
            .map(|id| self.resolve_one(id, registry))
            .collect()
    }

    fn resolve_one<R: ModuleRegistry + ?Sized>(
        &self,
        id: &str,
        registry: &mut R,
    ) -> DependencyOutcome {
        if registry.is_active(id) {
            debug!(target: RESOLVE_TARGET, dependency = id, "dependency already active");
            return DependencyOutcome::resolved(id, ResolutionSource::AlreadyActive);
        }
        if let Some(outcome) = self.try_sibling(id, registry) {
            return outcome;
        }
        match registry.activate_ambient(id) {
            Ok(()) => DependencyOutcome::resolved(id, ResolutionSource::GlobalRegistry),
            Err(error) => {
                warn!(
                    target: RESOLVE_TARGET,
                    dependency = id,
                    error = %error,
                    "dependency unresolved by any strategy"
                );
                DependencyOutcome::unresolved(id, error.to_string())
            }
        }
    }

    /// Attempts sibling-path activation; `None` falls through to the
    /// ambient strategy.
    fn try_sibling<R: ModuleRegistry + ?Sized>(
        &self,
        id: &str,
        registry: &mut R,
    ) -> Option<DependencyOutcome> {
        let descriptor = self.convention.sibling_descriptor(&self.module_root, id)?;
        if !descriptor.is_file() {
            return None;
        }
        match registry.activate_at(id, &descriptor) {
            Ok(()) => Some(DependencyOutcome::resolved(id, ResolutionSource::SiblingPath)),
            Err(error) => {
                debug!(
                    target: RESOLVE_TARGET,
                    dependency = id,
                    descriptor = %descriptor.display(),
                    error = %error,
                    "sibling activation failed; falling through to ambient lookup"
                );
                None
            }
        }
    }
}
