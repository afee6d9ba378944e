//! `FutexLock` — the default per-node lock.

use super::{LockDomain, RawLock};
use crate::concurrency::{wait_on_u32, wake_one_u32};
use core::sync::atomic::{AtomicU32, Ordering};
use crossbeam_utils::Backoff;

const UNLOCKED: u32 = 0;
const LOCKED: u32 = 1;
const CONTENDED: u32 = 2;

/// A 4-byte blocking lock.
///
/// Small enough to embed in every list node. Short critical sections are
/// common under lock coupling, so a contended `lock` spins with exponential
/// backoff before parking on the state word.
///
/// # States
/// - 0: unlocked
/// - 1: locked, no waiters
/// - 2: locked, waiters may be parked
pub struct FutexLock {
    state: AtomicU32,
}

impl FutexLock {
    /// Creates an unlocked lock.
    pub const fn new() -> Self {
        Self {
            state: AtomicU32::new(UNLOCKED),
        }
    }

    /// Returns `true` if some thread holds the lock right now.
    ///
    /// The answer may be stale by the time the caller reads it.
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.state.load(Ordering::Relaxed) != UNLOCKED
    }

    #[cold]
    fn lock_slow(&self) {
        let backoff = Backoff::new();
        let mut state = self.state.load(Ordering::Relaxed);

        // Spin while the holder is likely to finish soon.
        while !backoff.is_completed() {
            if state == UNLOCKED {
                match self
                    .state
                    .compare_exchange_weak(UNLOCKED, LOCKED, Ordering::Acquire, Ordering::Relaxed)
                {
                    Ok(_) => return,
                    Err(s) => state = s,
                }
            }
            if state == CONTENDED {
                break;
            }
            backoff.snooze();
            state = self.state.load(Ordering::Relaxed);
        }

        // Park. Taking the lock as CONTENDED here is conservative: an unlock
        // may issue one wake that nobody needs.
        loop {
            if self.state.swap(CONTENDED, Ordering::Acquire) == UNLOCKED {
                return;
            }
            wait_on_u32(&self.state, CONTENDED);
        }
    }
}

impl Default for FutexLock {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for FutexLock {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FutexLock")
            .field("locked", &self.is_locked())
            .finish()
    }
}

// SAFETY: the state word only moves away from UNLOCKED through an Acquire
// CAS/swap, and only the holder stores UNLOCKED (Release).
unsafe impl RawLock for FutexLock {
    #[inline]
    fn new(_domain: LockDomain) -> Self {
        Self::new()
    }

    #[inline]
    fn lock(&self) {
        if self
            .state
            .compare_exchange(UNLOCKED, LOCKED, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            self.lock_slow();
        }
    }

    #[inline]
    fn try_lock(&self) -> bool {
        self.state
            .compare_exchange(UNLOCKED, LOCKED, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    #[inline]
    unsafe fn unlock(&self) {
        if self.state.swap(UNLOCKED, Ordering::Release) == CONTENDED {
            wake_one_u32(&self.state);
        }
    }
}
