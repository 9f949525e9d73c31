//! Reentrancy guard.
//!
//! Held for the whole of a gateway mutation. While it is held, any other
//! entry into a guarded gateway operation is refused with
//! [`PaygateError::Reentrancy`] instead of blocking.

use std::sync::atomic::{AtomicBool, Ordering};

use paygate_types::{PaygateError, Result};

#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    entered: AtomicBool,
}

impl ReentrancyGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the guard. The returned token releases it on drop.
    ///
    /// # Errors
    /// `Reentrancy` if the guard is already held.
    pub fn enter(&self) -> Result<Entered<'_>> {
        self.entered
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map_err(|_| {
                tracing::warn!("Reentrant gateway call rejected");
                PaygateError::Reentrancy
            })?;
        Ok(Entered { guard: self })
    }

    #[must_use]
    pub fn is_entered(&self) -> bool {
        self.entered.load(Ordering::Acquire)
    }
}

/// Proof the guard is held.
#[derive(Debug)]
pub struct Entered<'a> {
    guard: &'a ReentrancyGuard,
}

impl Drop for Entered<'_> {
    fn drop(&mut self) {
        self.guard.entered.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_entry_refused() {
        let guard = ReentrancyGuard::new();
        let _held = guard.enter().unwrap();
        assert!(guard.is_entered());
        assert!(matches!(guard.enter().unwrap_err(), PaygateError::Reentrancy));
    }

    #[test]
    fn released_on_drop() {
        let guard = ReentrancyGuard::new();
        {
            let _held = guard.enter().unwrap();
        }
        assert!(!guard.is_entered());
        guard.enter().unwrap();
    }

    #[test]
    fn released_on_error_path() {
        fn fails(guard: &ReentrancyGuard) -> Result<()> {
            let _held = guard.enter()?;
            Err(PaygateError::Internal("boom".into()))
        }
        let guard = ReentrancyGuard::new();
        assert!(fails(&guard).is_err());
        assert!(!guard.is_entered());
    }
}
