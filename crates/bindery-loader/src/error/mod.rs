//! Domain errors raised by loader operations.
//!
//! All errors use `thiserror`-derived enums with structured context so
//! callers can inspect the failure programmatically. I/O errors are
//! wrapped in `Arc` to satisfy the `result_large_err` Clippy lint.
//!
//! Most failure classes in this subsystem are recovered locally and
//! surfaced through the load report rather than propagated: a broken
//! fragment or an unresolvable dependency degrades the load, it does
//! not abort it. The one exception is [`LoaderError::GuardLeak`],
//! which indicates the loader's own bookkeeping is corrupt.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Errors arising from module load operations.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// A fragment directory could not be enumerated.
    #[error("failed to read fragment directory '{path}': {source}")]
    DirectoryRead {
        /// Directory that was being enumerated.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// A fragment file could not be read.
    #[error("failed to read fragment '{path}': {source}")]
    FragmentRead {
        /// Fragment file that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// A fragment failed while executing.
    #[error("fragment '{path}' failed during execution: {message}")]
    FragmentExecution {
        /// Fragment file that was executing.
        path: PathBuf,
        /// Human-readable failure description from the executor.
        message: String,
    },

    /// A dependency module could not be activated.
    #[error("failed to activate module '{id}': {message}")]
    Activation {
        /// Identity of the module that was being activated.
        id: String,
        /// Description of the activation failure.
        message: String,
    },

    /// The assembled export set could not be handed to the host.
    #[error("failed to publish exports for module '{module}': {message}")]
    PublishFailed {
        /// Identity of the module whose exports were being published.
        module: String,
        /// Description of the publication failure.
        message: String,
    },

    /// The re-entrancy latch was already clear when the load released it.
    ///
    /// This indicates corrupted loader bookkeeping and is the only
    /// failure class treated as fatal: a latch in an inconsistent state
    /// cannot be trusted to reject future re-entrant loads.
    #[error("re-entrancy latch corrupted for module '{module}'")]
    GuardLeak {
        /// Identity of the module whose latch was corrupted.
        module: String,
    },
}

#[cfg(test)]
mod tests;
