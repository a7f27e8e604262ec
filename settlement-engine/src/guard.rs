//! Reentrancy guard
//!
//! Binary execution lock scoped around every fund-moving entry point. A
//! transfer can hand control to untrusted code (a recipient's receive hook);
//! any attempt to re-enter a guarded entry point during that window must
//! fail immediately, never queue.

use crate::error::{Error, Result, StateError};
use std::sync::atomic::{AtomicBool, Ordering};

/// Mutual-exclusion flag with RAII release
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    held: AtomicBool,
}

impl ReentrancyGuard {
    /// Create a released guard
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock, failing if it is already held
    ///
    /// The returned token releases the lock when dropped, on every exit
    /// path including errors and panics.
    pub fn enter(&self) -> Result<GuardToken<'_>> {
        if self
            .held
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(Error::State(StateError::ReentrantCall));
        }
        Ok(GuardToken { guard: self })
    }
}

/// RAII token releasing the guard on drop
#[derive(Debug)]
pub struct GuardToken<'a> {
    guard: &'a ReentrancyGuard,
}

impl Drop for GuardToken<'_> {
    fn drop(&mut self) {
        self.guard.held.store(false, Ordering::Release);
    }
}
