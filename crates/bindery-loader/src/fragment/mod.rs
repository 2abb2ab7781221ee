//! Fragment discovery under a module's tier directories.
//!
//! A fragment is one source file defining at most one callable
//! operation. [`FragmentScanner`] walks a tier root recursively and
//! yields a [`Fragment`] for every file carrying the conventional
//! extension. Directory entries are visited in sorted order so two
//! scans of an unchanged tree produce the same sequence, which keeps
//! diagnostics reproducible.
//!
//! Scanning reads fragments as opaque text; name extraction is a
//! separate concern handled by [`crate::extract`].

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LoaderError;

/// Tracing target for fragment discovery.
const FRAGMENT_TARGET: &str = "bindery_loader::fragment";

/// Visibility tier of a fragment within its module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Internal helpers, loaded but never exported.
    Private,
    /// Externally callable operations contributing to the export surface.
    Public,
}

impl Tier {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Public => "public",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One discovered source fragment.
///
/// # Example
///
/// ```
/// use bindery_loader::{Fragment, Tier};
/// use std::path::PathBuf;
///
/// let fragment = Fragment::new(
///     PathBuf::from("/mods/demo/Public/Get-Thing.ps1"),
///     Tier::Public,
///     "function Get-Thing { }",
/// );
/// assert_eq!(fragment.tier(), Tier::Public);
/// assert!(fragment.name().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    path: PathBuf,
    tier: Tier,
    text: String,
    name: Option<String>,
}

impl Fragment {
    /// Creates a fragment from its path, tier, and raw text.
    #[must_use]
    pub fn new(path: PathBuf, tier: Tier, text: impl Into<String>) -> Self {
        Self {
            path,
            tier,
            text: text.into(),
            name: None,
        }
    }

    /// Attaches the extracted operation name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Returns the fragment file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the fragment tier.
    #[must_use]
    pub const fn tier(&self) -> Tier {
        self.tier
    }

    /// Returns the raw fragment text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the extracted operation name, if one has been attached.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Recursive scanner for one tier of a module tree.
///
/// The scanner is lazy and restartable: construction touches nothing
/// on disk, and every call to [`FragmentScanner::iter`] starts a fresh
/// walk. A missing tier root is not an error; the resulting iterator
/// is simply empty and [`FragmentScanner::root_exists`] lets the
/// caller record the absence.
#[derive(Debug, Clone)]
pub struct FragmentScanner {
    root: PathBuf,
    tier: Tier,
    extension: String,
}

impl FragmentScanner {
    /// Creates a scanner over `root` for the given tier.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, tier: Tier, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            tier,
            extension: extension.into(),
        }
    }

    /// Returns the tier root this scanner walks.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns whether the tier root exists on disk.
    #[must_use]
    pub fn root_exists(&self) -> bool {
        self.root.is_dir()
    }

    /// Starts a fresh walk of the tier root.
    #[must_use]
    pub fn iter(&self) -> FragmentIter {
        let mut pending_dirs = Vec::new();
        if self.root_exists() {
            pending_dirs.push(self.root.clone());
        } else {
            debug!(
                target: FRAGMENT_TARGET,
                root = %self.root.display(),
                tier = %self.tier,
                "tier root absent; yielding no fragments"
            );
        }
        FragmentIter {
            tier: self.tier,
            extension: self.extension.clone(),
            pending_dirs,
            pending_files: VecDeque::new(),
        }
    }
}

/// Iterator over the fragments of one tier.
///
/// Yields `Err` for entries that exist but cannot be read; the walk
/// continues past such entries so one unreadable file cannot hide the
/// rest of the tree.
#[derive(Debug)]
pub struct FragmentIter {
    tier: Tier,
    extension: String,
    pending_dirs: Vec<PathBuf>,
    pending_files: VecDeque<PathBuf>,
}

impl FragmentIter {
    /// Reads one directory, queueing subdirectories and matching files.
    fn enter_directory(&mut self, dir: &Path) -> Result<(), LoaderError> {
        let entries = fs::read_dir(dir).map_err(|source| LoaderError::DirectoryRead {
            path: dir.to_path_buf(),
            source: Arc::new(source),
        })?;
        let mut names: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| LoaderError::DirectoryRead {
                path: dir.to_path_buf(),
                source: Arc::new(source),
            })?;
            names.push(entry.path());
        }
        names.sort();
        // Reverse so the Vec-as-stack pops subdirectories in sorted order.
        for path in names.iter().rev() {
            if path.is_dir() {
                self.pending_dirs.push(path.clone());
            }
        }
        for path in names {
            if path.is_file() && self.matches_extension(&path) {
                self.pending_files.push_back(path);
            }
        }
        Ok(())
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension))
    }

    fn read_fragment(&self, path: PathBuf) -> Result<Fragment, LoaderError> {
        let text = fs::read_to_string(&path).map_err(|source| LoaderError::FragmentRead {
            path: path.clone(),
            source: Arc::new(source),
        })?;
        debug!(
            target: FRAGMENT_TARGET,
            path = %path.display(),
            tier = %self.tier,
            bytes = text.len(),
            "discovered fragment"
        );
        Ok(Fragment::new(path, self.tier, text))
    }
}

impl Iterator for FragmentIter {
    type Item = Result<Fragment, LoaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(path) = self.pending_files.pop_front() {
                return Some(self.read_fragment(path));
            }
            let dir = self.pending_dirs.pop()?;
            if let Err(error) = self.enter_directory(&dir) {
                return Some(Err(error));
            }
        }
    }
}
