//! `LockCoupledList` — a singly-linked sequence with hand-over-hand locking.
//!
//! Instead of one lock around the whole chain, every node carries its own
//! lock and the list keeps a separate lock for its head pointer. A walking
//! thread holds at most two adjacent node locks: it takes the next node's
//! lock before releasing the one behind it. Inserts aimed at different parts
//! of the chain therefore only serialize on their common prefix.
//!
//! ## Lock order
//!
//! Every walker acquires `head_lock → node 1 → node 2 → …`, never skipping a
//! node and never going backwards. The head lock is released as soon as the
//! first node's lock is held, before any second node lock is requested.
//! Because all walkers share this single total order, no cycle of waiters
//! can form.
//!
//! ## Positions
//!
//! [`LockCoupledList::insert`] starts its walk with the head fixed as the
//! predecessor and counts the node after it as slot 1. The new value lands
//! after the `max(pos, 1)`-th node, or at the tail if the chain is shorter:
//!
//! ```
//! use coupled::LockCoupledList;
//!
//! let list = LockCoupledList::new();
//! list.insert(1, 1);
//! list.insert(3, 2);
//! list.insert(5, 3);
//! assert_eq!(list.to_vec(), [1, 3, 5]);
//!
//! list.insert(10, 2);
//! assert_eq!(list.to_vec(), [1, 3, 10, 5]);
//!
//! list.insert(20, 100);
//! assert_eq!(list.to_string(), "[1 -> 3 -> 10 -> 5 -> 20]");
//! ```
//!
//! ## Reclamation
//!
//! Nodes are never unlinked while the list is shared, so a node reference
//! obtained under a lock stays valid for as long as the `&self` borrow it came
//! from. All nodes are freed together once the list is exclusively owned
//! again (drop or [`LockCoupledList::into_vec`]).

mod node;

use self::node::{Link, Node};
use crate::concurrency::sync::{FutexLock, LockDomain, LockGuard, RawLock};
use core::cell::UnsafeCell;
use core::fmt;
use core::marker::PhantomData;
use core::ptr::NonNull;
use core::sync::atomic::{AtomicUsize, Ordering};
use crossbeam_utils::CachePadded;

/// A concurrent singly-linked list supporting positional insertion under
/// lock coupling.
///
/// `L` is the raw lock used for the head pointer and for every node. It
/// defaults to [`FutexLock`]; tests plug in instrumented locks to observe the
/// acquisition order.
pub struct LockCoupledList<T, L = FutexLock> {
    head_lock: L,
    head: UnsafeCell<Link<T, L>>,
    len: CachePadded<AtomicUsize>,
    _owns: PhantomData<Box<Node<T, L>>>,
}

// SAFETY: the list owns its values and locks; moving it moves them.
unsafe impl<T: Send, L: Send> Send for LockCoupledList<T, L> {}
// SAFETY: links are only touched under their lock. Values are moved in from
// any thread (Send) and read by concurrent walkers (Sync). Locks are shared
// by every walker and dropped by whichever thread drops the list.
unsafe impl<T: Send + Sync, L: Send + Sync> Sync for LockCoupledList<T, L> {}

impl<T> LockCoupledList<T> {
    /// Creates an empty list using the default [`FutexLock`].
    pub fn new() -> Self {
        Self::with_raw_lock()
    }
}

impl<T, L: RawLock> LockCoupledList<T, L> {
    /// Creates an empty list whose head and nodes are guarded by `L`.
    pub fn with_raw_lock() -> Self {
        Self {
            head_lock: L::new(LockDomain::Head),
            head: UnsafeCell::new(None),
            len: CachePadded::new(AtomicUsize::new(0)),
            _owns: PhantomData,
        }
    }

    /// Inserts `value` after the `pos`-th node, walking with lock coupling.
    ///
    /// The head is always the starting predecessor and counts as slot 1, so
    /// the value lands after the `max(pos, 1)`-th node: `0` and `1` both
    /// place it directly after the head, `2` after the second node. A `pos`
    /// past the end appends at the tail. On an empty list the value becomes
    /// the head regardless of `pos`. No position is rejected.
    ///
    /// The node is allocated before any lock is taken; if allocation fails
    /// the process aborts and the list is untouched.
    pub fn insert(&self, value: T, pos: usize) {
        let mut node = Node::<T, L>::new(value);

        let head_guard = LockGuard::acquire(&self.head_lock);
        // SAFETY: `head_lock` is held.
        let head = unsafe { *self.head.get() };
        let Some(first) = head else {
            // SAFETY: `head_lock` is still held.
            unsafe { *self.head.get() = Some(Self::leak(node)) };
            self.len.fetch_add(1, Ordering::Relaxed);
            #[cfg(feature = "tracing")]
            tracing::trace!(pos, "inserted into empty list as head");
            return;
        };

        // Take the first node's lock before giving up the head lock, so
        // `first` is still the head when we own it.
        // SAFETY: `first` is reachable from the head.
        let mut prev = unsafe { self.node(first) };
        let mut prev_guard = LockGuard::acquire(&prev.lock);
        drop(head_guard);

        // SAFETY: `prev.lock` is held for every `prev.next()` below.
        let mut current = unsafe { prev.next() };
        let mut curr_pos = 1;
        while let Some(next) = current {
            if curr_pos >= pos {
                break;
            }
            // SAFETY: `next` was read from `prev`'s link under its lock.
            let next = unsafe { self.node(next) };
            let next_guard = LockGuard::acquire(&next.lock);
            drop(prev_guard);
            prev_guard = next_guard;
            prev = next;
            current = unsafe { prev.next() };
            curr_pos += 1;
        }

        // `current` need not be locked: only `prev`'s link is rewritten.
        *node.next.get_mut() = current;
        // SAFETY: `prev.lock` is held.
        unsafe { prev.set_next(Some(Self::leak(node))) };
        self.len.fetch_add(1, Ordering::Relaxed);
        drop(prev_guard);

        #[cfg(feature = "tracing")]
        tracing::trace!(pos, slot = curr_pos + 1, "spliced node");
    }

    /// Clones every value into a `Vec`, front to back.
    ///
    /// The walk uses the same lock coupling as [`insert`](Self::insert), so it
    /// observes a consistent chain even while other threads insert; values
    /// inserted behind the walker's position are not seen.
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        let mut out = Vec::with_capacity(self.len());
        let _ = self.try_for_each(|value| {
            out.push(value.clone());
            Ok::<(), core::convert::Infallible>(())
        });
        out
    }

    /// Walks the chain under lock coupling, stopping at the first error.
    ///
    /// `f` runs while the visited node's lock is held.
    fn try_for_each<E>(&self, mut f: impl FnMut(&T) -> Result<(), E>) -> Result<(), E> {
        let head_guard = LockGuard::acquire(&self.head_lock);
        // SAFETY: `head_lock` is held.
        let head = unsafe { *self.head.get() };
        let Some(first) = head else {
            return Ok(());
        };
        // SAFETY: `first` is reachable from the head.
        let mut node = unsafe { self.node(first) };
        let mut guard = LockGuard::acquire(&node.lock);
        drop(head_guard);

        loop {
            f(&node.value)?;
            // SAFETY: `node.lock` is held.
            let Some(next) = (unsafe { node.next() }) else {
                return Ok(());
            };
            // SAFETY: `next` was read under the predecessor's lock.
            let next = unsafe { self.node(next) };
            let next_guard = LockGuard::acquire(&next.lock);
            drop(guard);
            guard = next_guard;
            node = next;
        }
    }
}

impl<T, L> LockCoupledList<T, L> {
    /// Number of values in the list.
    ///
    /// Under concurrent inserts this is a snapshot.
    #[inline]
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    /// Returns `true` if no value has been inserted yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Takes the values out of the list, front to back.
    pub fn into_vec(mut self) -> Vec<T> {
        let mut out = Vec::with_capacity(*self.len.get_mut());
        let mut link = self.head.get_mut().take();
        while let Some(ptr) = link {
            // SAFETY: `self` is owned, so no walker exists; each node was
            // leaked from a `Box` once and is reachable from exactly one link.
            let node = unsafe { Box::from_raw(ptr.as_ptr()) };
            let Node { value, next, .. } = *node;
            out.push(value);
            link = next.into_inner();
        }
        *self.len.get_mut() = 0;
        out
    }

    /// Dereferences a link for the duration of the `&self` borrow.
    ///
    /// # Safety
    /// `ptr` must be reachable from this list's head. Nodes are only freed
    /// through `&mut self` or `self`, which cannot coexist with the borrow.
    #[inline]
    unsafe fn node(&self, ptr: NonNull<Node<T, L>>) -> &Node<T, L> {
        &*ptr.as_ptr()
    }

    #[inline]
    fn leak(node: Box<Node<T, L>>) -> NonNull<Node<T, L>> {
        NonNull::from(Box::leak(node))
    }
}

impl<T, L> Drop for LockCoupledList<T, L> {
    fn drop(&mut self) {
        // Iterative, so long chains cannot overflow the stack.
        let mut link = self.head.get_mut().take();
        while let Some(ptr) = link {
            // SAFETY: see `into_vec`.
            let node = unsafe { Box::from_raw(ptr.as_ptr()) };
            let Node { next, .. } = *node;
            link = next.into_inner();
        }
    }
}

impl<T, L: RawLock> Default for LockCoupledList<T, L> {
    fn default() -> Self {
        Self::with_raw_lock()
    }
}

impl<T, L: RawLock> Extend<T> for LockCoupledList<T, L> {
    /// Appends every value at the tail.
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        // `&mut self` excludes every walker, so links are followed without locks.
        let mut slot: *mut Link<T, L> = self.head.get_mut();
        // SAFETY: every non-null link points at a live node owned by the list.
        unsafe {
            while let Some(node) = *slot {
                slot = (*node.as_ptr()).next.get();
            }
        }
        for value in iter {
            let node = Self::leak(Node::new(value));
            // SAFETY: `slot` is the tail link; `node` was just allocated.
            unsafe {
                *slot = Some(node);
                slot = (*node.as_ptr()).next.get();
            }
            *self.len.get_mut() += 1;
        }
    }
}

impl<T, L: RawLock> FromIterator<T> for LockCoupledList<T, L> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::with_raw_lock();
        list.extend(iter);
        list
    }
}

impl<T: fmt::Display, L: RawLock> fmt::Display for LockCoupledList<T, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        let mut first = true;
        self.try_for_each(|value| {
            if !first {
                f.write_str(" -> ")?;
            }
            first = false;
            write!(f, "{value}")
        })?;
        f.write_str("]")
    }
}

impl<T: fmt::Debug, L: RawLock> fmt::Debug for LockCoupledList<T, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        self.try_for_each(|value| {
            list.entry(value);
            Ok::<(), fmt::Error>(())
        })?;
        list.finish()
    }
}
