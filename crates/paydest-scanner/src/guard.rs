//! Re-entrancy guard for continuous scanning.
//!
//! The guard is held from the moment a frame starts parsing until its outcome
//! has been emitted. Release happens in [`Drop`], so early returns, dropped
//! futures and unwinding all put the guard back to [`Phase::Idle`].

use std::sync::atomic::{AtomicU8, Ordering};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Phase {
    Idle = 0,
    Parsing = 1,
    Resolving = 2,
}

impl Phase {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Parsing,
            2 => Self::Resolving,
            _ => Self::Idle,
        }
    }
}

#[derive(Debug, Default)]
pub struct ScanGuard {
    phase: AtomicU8,
}

impl ScanGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move `Idle -> Parsing`. Returns `None` while another action holds the guard.
    pub fn try_acquire(&self) -> Option<GuardPermit<'_>> {
        self.phase
            .compare_exchange(
                Phase::Idle as u8,
                Phase::Parsing as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .ok()
            .map(|_| GuardPermit { guard: self })
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        Phase::from_u8(self.phase.load(Ordering::Acquire))
    }
}

#[derive(Debug)]
pub struct GuardPermit<'a> {
    guard: &'a ScanGuard,
}

impl GuardPermit<'_> {
    pub fn enter_resolving(&self) {
        self.guard
            .phase
            .store(Phase::Resolving as u8, Ordering::Release);
    }
}

impl Drop for GuardPermit<'_> {
    fn drop(&mut self) {
        self.guard.phase.store(Phase::Idle as u8, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::{Phase, ScanGuard};

    #[test]
    fn second_acquire_fails_until_release() {
        let guard = ScanGuard::new();
        let permit = guard.try_acquire();
        assert!(permit.is_some());
        assert_eq!(guard.phase(), Phase::Parsing);
        assert!(guard.try_acquire().is_none());

        drop(permit);
        assert_eq!(guard.phase(), Phase::Idle);
        assert!(guard.try_acquire().is_some());
    }

    #[test]
    fn resolving_phase_is_visible_and_reset_on_drop() {
        let guard = ScanGuard::new();
        if let Some(permit) = guard.try_acquire() {
            permit.enter_resolving();
            assert_eq!(guard.phase(), Phase::Resolving);
            assert!(guard.try_acquire().is_none());
        }
        assert_eq!(guard.phase(), Phase::Idle);
    }

    #[test]
    fn guard_resets_when_holder_unwinds() {
        let guard = ScanGuard::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _permit = guard.try_acquire();
            std::panic::resume_unwind(Box::new("collaborator failed"));
        }));
        assert!(result.is_err());
        assert_eq!(guard.phase(), Phase::Idle);
    }
}
