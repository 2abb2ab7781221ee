//! Process-wide re-entrancy latch for in-flight module loads.
//!
//! Mutual dependencies make recursive self-loading a real hazard: two
//! modules that depend on each other would otherwise re-enter one
//! another's bootstrap forever. [`ReentrancyGuard`] converts that
//! implicit cyclic-graph risk into an explicit, testable rejection: a
//! latch keyed by module identity, acquired with an atomic
//! test-and-set and released by an RAII permit on every exit path.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

/// Tracing target for latch operations.
const GUARD_TARGET: &str = "bindery_loader::guard";

/// Latch set keyed by module identity.
///
/// Shared across loaders via `Arc`; the inner mutex makes the
/// check-and-mark step indivisible, so concurrent loads of the same
/// identity cannot both proceed past [`ReentrancyGuard::try_enter`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use bindery_loader::guard::ReentrancyGuard;
///
/// let guard = Arc::new(ReentrancyGuard::new());
/// let permit = ReentrancyGuard::try_enter(&guard, "Storage");
/// assert!(permit.is_some());
/// assert!(ReentrancyGuard::try_enter(&guard, "Storage").is_none());
/// drop(permit);
/// assert!(ReentrancyGuard::try_enter(&guard, "Storage").is_some());
/// ```
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    in_flight: Mutex<HashSet<String>>,
}

impl ReentrancyGuard {
    /// Creates a guard with no in-flight loads.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically latches `identity`, failing fast when already held.
    ///
    /// Returns `None` without blocking if a load of the same identity
    /// is in flight. The returned [`LoadPermit`] clears the latch when
    /// dropped, on success and failure paths alike.
    #[must_use]
    pub fn try_enter(guard: &Arc<Self>, identity: &str) -> Option<LoadPermit> {
        let mut in_flight = guard.lock();
        if in_flight.contains(identity) {
            warn!(
                target: GUARD_TARGET,
                module = identity,
                "re-entrant load attempt rejected"
            );
            return None;
        }
        let _was_new = in_flight.insert(identity.to_owned());
        drop(in_flight);
        debug!(target: GUARD_TARGET, module = identity, "latch acquired");
        Some(LoadPermit {
            guard: Arc::clone(guard),
            identity: identity.to_owned(),
            released: false,
        })
    }

    /// Returns whether a load of `identity` is currently latched.
    #[must_use]
    pub fn is_held(&self, identity: &str) -> bool {
        self.lock().contains(identity)
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        // The set holds completed inserts only, so the state is sound
        // even when a holder panicked mid-load.
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// RAII permit clearing the latch for one module identity on drop.
#[derive(Debug)]
pub struct LoadPermit {
    guard: Arc<ReentrancyGuard>,
    identity: String,
    released: bool,
}

impl LoadPermit {
    /// Returns the latched module identity.
    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Clears the latch now, reporting whether it was still held.
    ///
    /// A `false` return means the latch vanished while the permit was
    /// alive, which indicates a bookkeeping fault in the guard's user.
    #[must_use]
    pub fn release(mut self) -> bool {
        self.released = true;
        let held = self.guard.lock().remove(&self.identity);
        if held {
            debug!(target: GUARD_TARGET, module = %self.identity, "latch released");
        }
        held
    }
}

impl Drop for LoadPermit {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let held = self.guard.lock().remove(&self.identity);
        if held {
            debug!(target: GUARD_TARGET, module = %self.identity, "latch released");
        } else {
            warn!(
                target: GUARD_TARGET,
                module = %self.identity,
                "latch already clear on release"
            );
        }
    }
}
