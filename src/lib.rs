//! # `coupled` - Hand-over-hand locked collections
//!
//! A concurrent singly-linked list whose writers lock one node at a time
//! instead of the whole structure. Positional inserts aimed at different
//! regions of the chain proceed in parallel once they are past their shared
//! prefix.
//!
//! ## Locking Protocol
//!
//! - **Two lock domains**: a head lock guards only the entry pointer; every
//!   node owns a lock guarding its forward link.
//! - **Lock coupling**: a walker acquires the next node's lock before it
//!   releases the current one, and never holds more than two node locks.
//! - **Total order**: every walker acquires `head → node 1 → node 2 → …`.
//!   The head lock is dropped before a second node lock is requested. This
//!   shared order is what rules out deadlock.
//!
//! ## Architecture
//!
//! 1. **Raw locks** (`concurrency::sync`):
//!    - [`RawLock`] trait with the two [`LockDomain`]s, so instrumented locks
//!      can be substituted in tests
//!    - [`FutexLock`], a 4-byte spin-then-park lock embedded in every node
//!    - `LockGuard`, releasing on every exit path
//!
//! 2. **Collections** (`collections`):
//!    - [`LockCoupledList`] with positional `insert`, coupled read walks
//!      (`to_vec`, `Display`, `Debug`) and single-owner teardown
//!
//! ## Example
//!
//! ```rust
//! use coupled::LockCoupledList;
//! use std::thread;
//!
//! let list = LockCoupledList::new();
//! list.insert(1, 1);
//! list.insert(3, 2);
//! list.insert(5, 3);
//!
//! thread::scope(|s| {
//!     s.spawn(|| list.insert(30, 2));
//!     s.spawn(|| list.insert(40, 4));
//!     s.spawn(|| list.insert(50, 10));
//! });
//!
//! let mut values = list.into_vec();
//! assert_eq!(values[0], 1);
//! values.sort_unstable();
//! assert_eq!(values, [1, 3, 5, 30, 40, 50]);
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod collections;
pub mod concurrency;

pub use collections::LockCoupledList;
pub use concurrency::sync::{FutexLock, LockDomain, RawLock};

// Compile-time assertions for memory layout
const _: () = {
    use core::mem;

    // The per-node lock is a single state word.
    assert!(mem::size_of::<FutexLock>() == mem::size_of::<u32>());

    // Links are nullable pointers with no extra tag.
    assert!(
        mem::size_of::<Option<core::ptr::NonNull<u8>>>() == mem::size_of::<usize>()
    );
};
