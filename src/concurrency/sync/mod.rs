//! Raw locks and scoped guards for lock coupling.
//!
//! A lock-coupled structure owns many small locks in two domains: one lock
//! for the entry point ([`LockDomain::Head`]) and one per node
//! ([`LockDomain::Node`]). Acquisition order is always head first, then nodes
//! in chain order. [`RawLock`] is the seam that lets tests substitute an
//! instrumented lock and check that order.

mod futex_lock;

pub use futex_lock::FutexLock;

/// Which part of a lock-coupled structure a lock protects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LockDomain {
    /// Guards the structure's entry pointer only.
    Head,
    /// Guards one node's forward link.
    Node,
}

/// A raw mutual-exclusion lock without associated data.
///
/// # Safety
///
/// Implementors must guarantee that between a successful `lock` (or a
/// `try_lock` returning `true`) and the matching `unlock`, no other thread's
/// `lock` returns and no other thread's `try_lock` returns `true`. `lock`
/// must synchronize-with the previous `unlock` (acquire/release).
pub unsafe trait RawLock {
    /// Creates an unlocked lock for the given domain.
    fn new(domain: LockDomain) -> Self;

    /// Blocks until the lock is held by the calling thread.
    fn lock(&self);

    /// Acquires the lock if it is free, without blocking.
    fn try_lock(&self) -> bool;

    /// Releases the lock.
    ///
    /// # Safety
    ///
    /// The calling thread must currently hold the lock.
    unsafe fn unlock(&self);
}

/// Holds a [`RawLock`] until dropped.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct LockGuard<'a, L: RawLock> {
    lock: &'a L,
}

impl<'a, L: RawLock> LockGuard<'a, L> {
    /// Blocks until `lock` is acquired.
    #[inline]
    pub fn acquire(lock: &'a L) -> Self {
        lock.lock();
        Self { lock }
    }

    /// Acquires `lock` only if it is currently free.
    #[inline]
    pub fn try_acquire(lock: &'a L) -> Option<Self> {
        lock.try_lock().then_some(Self { lock })
    }
}

impl<L: RawLock> Drop for LockGuard<'_, L> {
    #[inline]
    fn drop(&mut self) {
        // SAFETY: a guard only exists while its lock is held.
        unsafe { self.lock.unlock() }
    }
}
