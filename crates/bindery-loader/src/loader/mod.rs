//! Load orchestration: guard, resolve, execute, export, report.
//!
//! [`ModuleLoader`] sequences a module bootstrap end to end: latch the
//! re-entrancy guard, resolve declared dependencies, execute the
//! private then public fragment tiers with per-fragment fault
//! isolation, extract and deduplicate the export surface, hand it to
//! the host's [`ExportSink`], and return a [`LoadReport`]. Ambient
//! preference switches are overridden for the duration of the load and
//! restored on every exit path.
//!
//! Only a defect in the loader's own bookkeeping (a leaked latch) is
//! fatal; broken fragments and missing dependencies degrade the load
//! and are reported instead of aborting it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use bindery_config::{ErrorMode, Preferences, SharedPreferences, Verbosity};

use crate::convention::Convention;
use crate::error::LoaderError;
use crate::extract::{KeywordExtractor, NameExtractor};
use crate::fragment::{Fragment, FragmentScanner, Tier};
use crate::guard::ReentrancyGuard;
use crate::report::{Diagnostics, ExportSet, LoadReport, LoadStatus};
use crate::resolve::{DependencyOutcome, DependencyResolver, ModuleRegistry};

/// Tracing target for load orchestration.
const LOADER_TARGET: &str = "bindery_loader::loader";

/// Lifecycle of a module within the process.
///
/// The state is monotonic within one load; re-invocation from
/// `Active` or `Failed` back to `Loading` is permitted so a module can
/// be explicitly retried or refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// No load has been attempted.
    Unloaded,
    /// A load is in flight.
    Loading,
    /// The last load completed with a usable export surface.
    Active,
    /// The last load could not publish its export surface.
    Failed,
}

impl LifecycleState {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unloaded => "unloaded",
            Self::Loading => "loading",
            Self::Active => "active",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity, layout, and lifecycle of one loadable module.
///
/// Owned exclusively by the loader handling that module; it is never
/// shared mutably across modules.
#[derive(Debug, Clone)]
pub struct ModuleDescriptor {
    identity: String,
    root: PathBuf,
    dependencies: Vec<String>,
    state: LifecycleState,
}

impl ModuleDescriptor {
    /// Creates a descriptor for a module rooted at `root`.
    #[must_use]
    pub fn new(
        identity: impl Into<String>,
        root: impl Into<PathBuf>,
        dependencies: Vec<String>,
    ) -> Self {
        Self {
            identity: identity.into(),
            root: root.into(),
            dependencies,
            state: LifecycleState::Unloaded,
        }
    }

    /// Returns the module identity.
    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Returns the module root path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the declared dependency identities in order.
    #[must_use]
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> LifecycleState {
        self.state
    }

    fn begin_load(&mut self) {
        self.state = LifecycleState::Loading;
    }

    fn finish_load(&mut self, operational: bool) {
        self.state = if operational {
            LifecycleState::Active
        } else {
            LifecycleState::Failed
        };
    }
}

/// Host hook executing one fragment.
///
/// Fragment execution is inherently sequential: later fragments may
/// rely on state established by earlier ones, so the loader never
/// parallelises calls. A failure is caught, reported, and the load
/// continues with the next fragment.
pub trait FragmentExecutor {
    /// Executes one fragment.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::FragmentExecution`] when the fragment
    /// fails; the loader records the failure and carries on.
    fn execute(&mut self, fragment: &Fragment) -> Result<(), LoaderError>;
}

/// Host hook receiving the assembled export surface.
pub trait ExportSink {
    /// Publishes the deduplicated export names.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::PublishFailed`] when the host cannot
    /// accept the export surface; the load completes as degraded.
    fn publish(&mut self, exports: &ExportSet) -> Result<(), LoaderError>;
}

/// Sink for hosts without an export mechanism; accepts and discards.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

impl ExportSink for DiscardSink {
    fn publish(&mut self, _exports: &ExportSet) -> Result<(), LoaderError> {
        Ok(())
    }
}

/// Scoped override of the shared host preferences.
///
/// Applies the override on construction and restores the prior values
/// when dropped, including on panic unwinds, so an aborted load cannot
/// leave the host in silent or continue-on-error mode.
#[derive(Debug)]
pub struct ScopedPreferences {
    handle: SharedPreferences,
    prior: Preferences,
}

impl ScopedPreferences {
    /// Overrides the shared preferences until the guard drops.
    #[must_use]
    pub fn apply(handle: &SharedPreferences, overrides: Preferences) -> Self {
        let prior = handle.replace(overrides);
        Self {
            handle: handle.clone(),
            prior,
        }
    }

    /// Returns the preferences that will be restored.
    #[must_use]
    pub const fn prior(&self) -> Preferences {
        self.prior
    }
}

impl Drop for ScopedPreferences {
    fn drop(&mut self) {
        let _overridden = self.handle.replace(self.prior);
    }
}

/// Per-tier bookkeeping produced while executing fragments.
#[derive(Default)]
struct TierOutcome {
    found: usize,
    loaded: usize,
    errors: usize,
    executed: Vec<Fragment>,
}

/// Orchestrates one module's bootstrap against injected host hooks.
///
/// # Example
///
/// ```
/// use bindery_loader::{
///     DiscardSink, Fragment, LoaderError, ModuleDescriptor, ModuleLoader,
/// };
/// use bindery_loader::loader::FragmentExecutor;
/// use bindery_loader::resolve::ProcessRegistry;
///
/// struct NullExecutor;
/// impl FragmentExecutor for NullExecutor {
///     fn execute(&mut self, _fragment: &Fragment) -> Result<(), LoaderError> {
///         Ok(())
///     }
/// }
///
/// let descriptor = ModuleDescriptor::new("Demo", "/srv/modules/Demo", vec![]);
/// let mut loader = ModuleLoader::new(descriptor, NullExecutor, DiscardSink);
/// let mut registry = ProcessRegistry::new();
/// let report = loader.load(&mut registry).expect("load completes");
/// assert!(report.is_success());
/// ```
pub struct ModuleLoader<E, S> {
    descriptor: ModuleDescriptor,
    convention: Convention,
    executor: E,
    sink: S,
    guard: Arc<ReentrancyGuard>,
    preferences: SharedPreferences,
    extractor: Option<Box<dyn NameExtractor + Send>>,
    last_report: Option<LoadReport>,
}

impl<E, S> std::fmt::Debug for ModuleLoader<E, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleLoader")
            .field("descriptor", &self.descriptor)
            .field("convention", &self.convention)
            .finish_non_exhaustive()
    }
}

impl<E, S> ModuleLoader<E, S> {
    /// Creates a loader with default convention, a fresh guard, and
    /// default shared preferences.
    #[must_use]
    pub fn new(descriptor: ModuleDescriptor, executor: E, sink: S) -> Self {
        Self {
            descriptor,
            convention: Convention::default(),
            executor,
            sink,
            guard: Arc::new(ReentrancyGuard::new()),
            preferences: SharedPreferences::default(),
            extractor: None,
            last_report: None,
        }
    }

    /// Overrides the module tree convention.
    #[must_use]
    pub fn with_convention(mut self, convention: Convention) -> Self {
        self.convention = convention;
        self
    }

    /// Shares a re-entrancy guard with other loaders in the process.
    #[must_use]
    pub fn with_guard(mut self, guard: Arc<ReentrancyGuard>) -> Self {
        self.guard = guard;
        self
    }

    /// Shares the host preference handle the load will override.
    #[must_use]
    pub fn with_preferences(mut self, preferences: SharedPreferences) -> Self {
        self.preferences = preferences;
        self
    }

    /// Replaces the keyword-based name extractor.
    #[must_use]
    pub fn with_extractor(mut self, extractor: Box<dyn NameExtractor + Send>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Returns the module descriptor.
    #[must_use]
    pub const fn descriptor(&self) -> &ModuleDescriptor {
        &self.descriptor
    }

    /// Returns the fragment executor.
    #[must_use]
    pub const fn executor(&self) -> &E {
        &self.executor
    }

    /// Returns the export sink.
    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Returns the report from the most recently completed load.
    #[must_use]
    pub const fn last_report(&self) -> Option<&LoadReport> {
        self.last_report.as_ref()
    }
}

impl<E: FragmentExecutor, S: ExportSink> ModuleLoader<E, S> {
    /// Runs the full bootstrap sequence for this module.
    ///
    /// Always produces a [`LoadReport`]; recoverable failures degrade
    /// the load rather than erroring.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::GuardLeak`] only when the re-entrancy
    /// latch was found in an inconsistent state as the completed load
    /// released it. Corrupted latch bookkeeping would poison every
    /// later load of this module, so it is not reported as a mere
    /// degradation.
    pub fn load<R: ModuleRegistry + ?Sized>(
        &mut self,
        registry: &mut R,
    ) -> Result<LoadReport, LoaderError> {
        let identity = self.descriptor.identity().to_owned();
        info!(target: LOADER_TARGET, module = %identity, "module load started");

        let Some(permit) = ReentrancyGuard::try_enter(&self.guard, &identity) else {
            return Ok(self.rejected_report(&identity));
        };

        let _ambient = ScopedPreferences::apply(
            &self.preferences,
            Preferences {
                verbosity: Verbosity::Silent,
                error_mode: ErrorMode::Continue,
            },
        );

        self.descriptor.begin_load();
        let mut diagnostics = Diagnostics::new();

        let outcomes = self.resolve_dependencies(registry, &mut diagnostics);
        let missing = outcomes.iter().filter(|o| !o.is_resolved()).count();
        let satisfied = outcomes.len() - missing;

        let private_root = self.descriptor.root().join(self.convention.private_dir());
        let private = self.load_tier(private_root, Tier::Private, &mut diagnostics);

        let public_root = self.descriptor.root().join(self.convention.public_dir());
        let public = self.load_tier(public_root, Tier::Public, &mut diagnostics);

        let (public_fragments, name_misses) =
            self.extract_names(public.executed, &mut diagnostics);
        let exports = assemble_exports(&public_fragments, &mut diagnostics);

        let published = match self.sink.publish(&exports) {
            Ok(()) => true,
            Err(error) => {
                diagnostics.error(error.to_string());
                false
            }
        };
        if published {
            registry.mark_active(&identity);
        }
        self.descriptor.finish_load(published);

        let degraded = missing > 0
            || name_misses > 0
            || !published
            || private.errors + public.errors > 0
            || private.loaded + public.loaded < private.found + public.found;
        let report = LoadReport {
            module: identity.clone(),
            status: if degraded {
                LoadStatus::Degraded
            } else {
                LoadStatus::Success
            },
            fragments_found: private.found + public.found,
            fragments_loaded: private.loaded + public.loaded,
            dependencies_satisfied: satisfied,
            dependencies_missing: missing,
            failures: diagnostics.failure_messages(),
            dependencies: outcomes,
            exports,
        };
        diagnostics.render(&identity);
        report.render();
        self.last_report = Some(report.clone());

        if !permit.release() {
            return Err(LoaderError::GuardLeak { module: identity });
        }
        Ok(report)
    }

    /// Builds the short-circuit report for a rejected re-entrant load.
    fn rejected_report(&self, identity: &str) -> LoadReport {
        self.last_report.clone().unwrap_or_else(|| {
            LoadReport::rejected(
                identity,
                format!("re-entrant load of module '{identity}' rejected"),
            )
        })
    }

    fn resolve_dependencies<R: ModuleRegistry + ?Sized>(
        &self,
        registry: &mut R,
        diagnostics: &mut Diagnostics,
    ) -> Vec<DependencyOutcome> {
        let resolver =
            DependencyResolver::new(self.descriptor.root(), self.convention.clone());
        let outcomes = resolver.resolve(self.descriptor.dependencies(), registry);
        for outcome in &outcomes {
            if outcome.is_resolved() {
                diagnostics.info(format!(
                    "dependency '{}' satisfied via {}",
                    outcome.id(),
                    outcome.source()
                ));
            } else {
                diagnostics.error(format!(
                    "dependency '{}' unresolved: {}",
                    outcome.id(),
                    outcome.error().unwrap_or("no strategy succeeded")
                ));
            }
        }
        outcomes
    }

    /// Scans one tier and executes every discovered fragment, isolating
    /// per-fragment failures.
    fn load_tier(
        &mut self,
        root: PathBuf,
        tier: Tier,
        diagnostics: &mut Diagnostics,
    ) -> TierOutcome {
        let scanner = FragmentScanner::new(root, tier, self.convention.fragment_extension());
        let mut outcome = TierOutcome::default();
        if !scanner.root_exists() {
            diagnostics.info(format!(
                "{tier} tier absent under '{}'",
                scanner.root().display()
            ));
            return outcome;
        }
        for result in scanner.iter() {
            match result {
                Ok(fragment) => {
                    outcome.found += 1;
                    match self.executor.execute(&fragment) {
                        Ok(()) => {
                            outcome.loaded += 1;
                            outcome.executed.push(fragment);
                        }
                        Err(error) => diagnostics.error(error.to_string()),
                    }
                }
                Err(error) => {
                    outcome.errors += 1;
                    diagnostics.error(error.to_string());
                }
            }
        }
        outcome
    }

    /// Attaches extracted operation names to executed public fragments.
    ///
    /// Returns the fragments with names attached where extraction
    /// succeeded, plus the number of fragments that declared none.
    fn extract_names(
        &self,
        fragments: Vec<Fragment>,
        diagnostics: &mut Diagnostics,
    ) -> (Vec<Fragment>, usize) {
        let fallback;
        let extractor: &dyn NameExtractor = match &self.extractor {
            Some(custom) => custom.as_ref(),
            None => {
                fallback = KeywordExtractor::new(self.convention.defining_keyword());
                &fallback
            }
        };
        let mut named = Vec::with_capacity(fragments.len());
        let mut misses = 0;
        for fragment in fragments {
            match extractor.extract(fragment.text()) {
                Some(name) => named.push(fragment.with_name(name)),
                None => {
                    misses += 1;
                    diagnostics.warning(format!(
                        "fragment '{}' declared no exportable name",
                        fragment.path().display()
                    ));
                    named.push(fragment);
                }
            }
        }
        (named, misses)
    }
}

/// Collapses the named fragments' operations into the final
/// deduplicated export set.
fn assemble_exports(fragments: &[Fragment], diagnostics: &mut Diagnostics) -> ExportSet {
    let mut exports = ExportSet::new();
    for name in fragments.iter().filter_map(Fragment::name) {
        if !exports.insert(name) {
            diagnostics.info(format!("duplicate export '{name}' collapsed"));
        }
    }
    exports
}
