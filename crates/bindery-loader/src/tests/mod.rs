//! Crate-level end-to-end tests over on-disk module trees.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use crate::error::LoaderError;
use crate::fragment::Fragment;
use crate::guard::ReentrancyGuard;
use crate::loader::{
    DiscardSink, ExportSink, FragmentExecutor, ModuleDescriptor, ModuleLoader,
};
use crate::report::{ExportSet, LoadStatus};
use crate::resolve::{ModuleRegistry, ProcessRegistry, ResolutionSource};

/// Executor that fails fragments whose file name contains "broken".
#[derive(Debug, Default)]
struct StubExecutor {
    executed: Vec<PathBuf>,
}

impl FragmentExecutor for StubExecutor {
    fn execute(&mut self, fragment: &Fragment) -> Result<(), LoaderError> {
        self.executed.push(fragment.path().to_path_buf());
        let broken = fragment
            .path()
            .file_name()
            .is_some_and(|n| n.to_string_lossy().contains("broken"));
        if broken {
            return Err(LoaderError::FragmentExecution {
                path: fragment.path().to_path_buf(),
                message: String::from("stub failure"),
            });
        }
        Ok(())
    }
}

fn write_fragment(root: &Path, relative: &str, text: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create fragment directory");
    }
    fs::write(path, text).expect("write fragment");
}

fn storage_tree() -> TempDir {
    let dir = TempDir::new().expect("create temp dir");
    let storage = dir.path().join("Storage");
    write_fragment(&storage, "Private/helper.ps1", "$state = @{}");
    write_fragment(
        &storage,
        "Public/Get-Thing.ps1",
        "function Get-Thing { $state }",
    );
    dir
}

fn loader_for(
    tree: &TempDir,
    dependencies: &[&str],
) -> ModuleLoader<StubExecutor, DiscardSink> {
    let deps = dependencies.iter().map(|d| (*d).to_owned()).collect();
    let descriptor = ModuleDescriptor::new("Storage", tree.path().join("Storage"), deps);
    ModuleLoader::new(descriptor, StubExecutor::default(), DiscardSink)
}

// ---------------------------------------------------------------------------
// Concrete scenarios
// ---------------------------------------------------------------------------

#[test]
fn active_dependency_and_two_fragments_load_cleanly() {
    let tree = storage_tree();
    let mut registry = ProcessRegistry::new();
    registry.mark_active("Core");

    let mut loader = loader_for(&tree, &["Core"]);
    let report = loader.load(&mut registry).expect("load completes");

    assert_eq!(report.dependencies_satisfied(), 1);
    assert_eq!(report.dependencies_missing(), 0);
    assert_eq!(report.fragments_found(), 2);
    assert_eq!(report.exports().names(), ["Get-Thing"]);
    assert_eq!(report.status(), LoadStatus::Success);
    assert_eq!(
        report.dependency("Core").map(|o| o.source()),
        Some(ResolutionSource::AlreadyActive)
    );
    assert!(registry.is_active("Storage"), "completed load registers itself");
}

#[test]
fn ghost_dependency_degrades_but_load_completes() {
    let tree = storage_tree();
    let mut registry = ProcessRegistry::new();

    let mut loader = loader_for(&tree, &["Ghost"]);
    let report = loader.load(&mut registry).expect("load completes");

    assert_eq!(
        report.dependency("Ghost").map(|o| o.source()),
        Some(ResolutionSource::Unresolved)
    );
    assert_eq!(report.status(), LoadStatus::Degraded);
    assert_eq!(report.dependencies_missing(), 1);
    assert_eq!(report.exports().names(), ["Get-Thing"], "exports survive");
}

#[test]
fn sibling_module_is_activated_from_its_descriptor() {
    let tree = storage_tree();
    write_fragment(tree.path(), "Core/Core.psd1", "@{}");
    let mut registry = ProcessRegistry::new();

    let mut loader = loader_for(&tree, &["Core"]);
    let report = loader.load(&mut registry).expect("load completes");

    assert_eq!(
        report.dependency("Core").map(|o| o.source()),
        Some(ResolutionSource::SiblingPath)
    );
    assert!(registry.is_active("Core"));
    assert_eq!(report.status(), LoadStatus::Success);
}

// ---------------------------------------------------------------------------
// Fault injection
// ---------------------------------------------------------------------------

#[test]
fn one_broken_public_fragment_does_not_sink_the_rest() {
    let tree = storage_tree();
    let storage = tree.path().join("Storage");
    write_fragment(&storage, "Public/Set-Thing.ps1", "function Set-Thing { }");
    write_fragment(
        &storage,
        "Public/broken-op.ps1",
        "function Get-Broken { throw }",
    );

    let mut loader = loader_for(&tree, &[]);
    let report = loader
        .load(&mut ProcessRegistry::new())
        .expect("load completes");

    assert_eq!(report.fragments_found(), 4);
    assert_eq!(report.fragments_loaded(), 3);
    assert_eq!(report.status(), LoadStatus::Degraded);
    assert!(report.exports().contains("Get-Thing"));
    assert!(report.exports().contains("Set-Thing"));
    assert!(!report.exports().contains("Get-Broken"));
    let execution_failures = report
        .failures()
        .iter()
        .filter(|f| f.contains("failed during execution"))
        .count();
    assert_eq!(execution_failures, 1);
}

// ---------------------------------------------------------------------------
// Idempotence and vacuous resolution
// ---------------------------------------------------------------------------

#[test]
fn sequential_reloads_yield_set_equal_exports() {
    let tree = storage_tree();
    let mut registry = ProcessRegistry::new();
    let mut loader = loader_for(&tree, &[]);

    let first = loader.load(&mut registry).expect("first load");
    let second = loader.load(&mut registry).expect("second load");

    assert!(first.exports().set_eq(second.exports()));
    assert_eq!(second.status(), LoadStatus::Success);
}

#[test]
fn no_declared_dependencies_never_query_the_registry() {
    /// Registry that fails the test if any activation strategy runs.
    #[derive(Debug, Default)]
    struct UntouchableRegistry {
        marked: Vec<String>,
    }

    impl ModuleRegistry for UntouchableRegistry {
        fn is_active(&self, _id: &str) -> bool {
            panic!("is_active must not be called for a dependency-free module");
        }
        fn activate_at(&mut self, _id: &str, _descriptor: &Path) -> Result<(), LoaderError> {
            panic!("activate_at must not be called for a dependency-free module");
        }
        fn activate_ambient(&mut self, _id: &str) -> Result<(), LoaderError> {
            panic!("activate_ambient must not be called for a dependency-free module");
        }
        fn mark_active(&mut self, id: &str) {
            self.marked.push(id.to_owned());
        }
    }

    let tree = storage_tree();
    let mut registry = UntouchableRegistry::default();
    let mut loader = loader_for(&tree, &[]);
    let report = loader.load(&mut registry).expect("load completes");

    assert_eq!(report.dependencies_missing(), 0);
    assert_eq!(report.dependencies_satisfied(), 0);
    assert_eq!(registry.marked, vec![String::from("Storage")]);
}

// ---------------------------------------------------------------------------
// Re-entrancy through a fragment
// ---------------------------------------------------------------------------

/// Executor whose fragments recursively re-load their own module.
struct RecursiveExecutor {
    inner: Option<ModuleLoader<StubExecutor, DiscardSink>>,
    inner_statuses: Vec<LoadStatus>,
}

impl FragmentExecutor for RecursiveExecutor {
    fn execute(&mut self, _fragment: &Fragment) -> Result<(), LoaderError> {
        if let Some(inner) = self.inner.as_mut() {
            let report = inner
                .load(&mut ProcessRegistry::new())
                .expect("inner load returns a report");
            self.inner_statuses.push(report.status());
        }
        Ok(())
    }
}

#[test]
fn self_load_from_a_fragment_is_rejected_not_recursive() {
    let tree = storage_tree();
    let guard = Arc::new(ReentrancyGuard::new());

    let inner_descriptor =
        ModuleDescriptor::new("Storage", tree.path().join("Storage"), vec![]);
    let inner = ModuleLoader::new(inner_descriptor, StubExecutor::default(), DiscardSink)
        .with_guard(Arc::clone(&guard));

    let outer_descriptor =
        ModuleDescriptor::new("Storage", tree.path().join("Storage"), vec![]);
    let executor = RecursiveExecutor {
        inner: Some(inner),
        inner_statuses: Vec::new(),
    };
    let mut outer = ModuleLoader::new(outer_descriptor, executor, DiscardSink)
        .with_guard(Arc::clone(&guard));

    let report = outer
        .load(&mut ProcessRegistry::new())
        .expect("outer load completes");

    assert_eq!(report.status(), LoadStatus::Success, "outer load unharmed");
    assert!(!outer.executor().inner_statuses.is_empty(), "inner load ran");
    assert!(
        outer
            .executor()
            .inner_statuses
            .iter()
            .all(|status| *status == LoadStatus::Degraded),
        "every inner self-load must be rejected as degraded"
    );
    assert!(!guard.is_held("Storage"), "latch released after the dust settles");
}

// ---------------------------------------------------------------------------
// Export surface law
// ---------------------------------------------------------------------------

#[test]
fn export_count_never_exceeds_named_public_fragments() {
    let tree = storage_tree();
    let storage = tree.path().join("Storage");
    write_fragment(&storage, "Public/dup-a.ps1", "function Shared-Op { }");
    write_fragment(&storage, "Public/dup-b.ps1", "function Shared-Op { }");
    write_fragment(&storage, "Public/nameless.ps1", "$x = 1");

    let mut loader = loader_for(&tree, &[]);
    let report = loader
        .load(&mut ProcessRegistry::new())
        .expect("load completes");

    // Four public fragments, three with names, two distinct names.
    let mut expected = ExportSet::new();
    assert!(expected.insert("Get-Thing"));
    assert!(expected.insert("Shared-Op"));
    assert!(report.exports().set_eq(&expected));
    assert!(report.exports().len() <= 3);
}

/// Sink double proving published names match the report.
#[derive(Debug, Default)]
struct CapturingSink {
    names: Vec<String>,
}

impl ExportSink for CapturingSink {
    fn publish(&mut self, exports: &ExportSet) -> Result<(), LoaderError> {
        self.names = exports.names().to_vec();
        Ok(())
    }
}

#[test]
fn report_and_sink_agree_on_the_export_surface() {
    let tree = storage_tree();
    let descriptor = ModuleDescriptor::new("Storage", tree.path().join("Storage"), vec![]);
    let mut loader =
        ModuleLoader::new(descriptor, StubExecutor::default(), CapturingSink::default());
    let report = loader
        .load(&mut ProcessRegistry::new())
        .expect("load completes");
    assert_eq!(loader.sink().names, report.exports().names());
}
