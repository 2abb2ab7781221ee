//! Filesystem and source conventions a module tree follows.
//!
//! The loader is convention-driven: fragments live under `Private/`
//! and `Public/` subtrees of the module root, carry a well-known file
//! extension, and declare their operation with a defining keyword in
//! their own text. Sibling dependencies are located through the
//! descriptor naming scheme `<parent>/<id>/<id>.<descriptor-ext>`.
//! [`Convention`] gathers those knobs so hosts with a different
//! fragment dialect can reuse the loader unchanged.

use std::path::{Path, PathBuf};

/// Default extension for executable source fragments.
const DEFAULT_FRAGMENT_EXTENSION: &str = "ps1";

/// Default extension for module descriptor files.
const DEFAULT_DESCRIPTOR_EXTENSION: &str = "psd1";

/// Default keyword that introduces an operation definition.
const DEFAULT_DEFINING_KEYWORD: &str = "function";

/// Naming and layout conventions for a module tree.
///
/// # Example
///
/// ```
/// use bindery_loader::Convention;
///
/// let convention = Convention::default();
/// assert_eq!(convention.fragment_extension(), "ps1");
/// assert_eq!(convention.private_dir(), "Private");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Convention {
    fragment_extension: String,
    descriptor_extension: String,
    private_dir: String,
    public_dir: String,
    defining_keyword: String,
}

impl Default for Convention {
    fn default() -> Self {
        Self {
            fragment_extension: DEFAULT_FRAGMENT_EXTENSION.to_owned(),
            descriptor_extension: DEFAULT_DESCRIPTOR_EXTENSION.to_owned(),
            private_dir: String::from("Private"),
            public_dir: String::from("Public"),
            defining_keyword: DEFAULT_DEFINING_KEYWORD.to_owned(),
        }
    }
}

impl Convention {
    /// Overrides the fragment file extension (without the dot).
    #[must_use]
    pub fn with_fragment_extension(mut self, extension: impl Into<String>) -> Self {
        self.fragment_extension = extension.into();
        self
    }

    /// Overrides the module descriptor extension (without the dot).
    #[must_use]
    pub fn with_descriptor_extension(mut self, extension: impl Into<String>) -> Self {
        self.descriptor_extension = extension.into();
        self
    }

    /// Overrides the keyword that introduces an operation definition.
    #[must_use]
    pub fn with_defining_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.defining_keyword = keyword.into();
        self
    }

    /// Returns the fragment file extension.
    #[must_use]
    pub fn fragment_extension(&self) -> &str {
        &self.fragment_extension
    }

    /// Returns the module descriptor extension.
    #[must_use]
    pub fn descriptor_extension(&self) -> &str {
        &self.descriptor_extension
    }

    /// Returns the private-tier directory name.
    #[must_use]
    pub fn private_dir(&self) -> &str {
        &self.private_dir
    }

    /// Returns the public-tier directory name.
    #[must_use]
    pub fn public_dir(&self) -> &str {
        &self.public_dir
    }

    /// Returns the defining keyword.
    #[must_use]
    pub fn defining_keyword(&self) -> &str {
        &self.defining_keyword
    }

    /// Computes the conventional descriptor path for a dependency that
    /// is a sibling of the requesting module.
    ///
    /// Returns `None` when the module root has no parent directory.
    #[must_use]
    pub fn sibling_descriptor(&self, module_root: &Path, dependency: &str) -> Option<PathBuf> {
        let parent = module_root.parent()?;
        Some(
            parent
                .join(dependency)
                .join(format!("{dependency}.{}", self.descriptor_extension)),
        )
    }
}
