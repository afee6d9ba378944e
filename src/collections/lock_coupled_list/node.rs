use crate::concurrency::sync::{LockDomain, RawLock};
use core::cell::UnsafeCell;
use core::ptr::NonNull;

/// Forward link: the next node, or none at the tail.
pub(super) type Link<T, L> = Option<NonNull<Node<T, L>>>;

/// One element of the chain.
///
/// `lock` lives inline for the node's whole life. `next` may only be read or
/// written by a thread holding `lock`, or by the owner of the whole list.
pub(super) struct Node<T, L> {
    pub(super) value: T,
    pub(super) lock: L,
    pub(super) next: UnsafeCell<Link<T, L>>,
}

impl<T, L: RawLock> Node<T, L> {
    pub(super) fn new(value: T) -> Box<Self> {
        Box::new(Self {
            value,
            lock: L::new(LockDomain::Node),
            next: UnsafeCell::new(None),
        })
    }
}

impl<T, L> Node<T, L> {
    /// Reads the forward link.
    ///
    /// # Safety
    /// The caller holds `self.lock` or owns the list exclusively.
    #[inline]
    pub(super) unsafe fn next(&self) -> Link<T, L> {
        *self.next.get()
    }

    /// Replaces the forward link.
    ///
    /// # Safety
    /// Same contract as [`Node::next`].
    #[inline]
    pub(super) unsafe fn set_next(&self, link: Link<T, L>) {
        *self.next.get() = link;
    }
}
