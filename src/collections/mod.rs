//! Lock-coupled collections.
//!
//! - `lock_coupled_list`: singly-linked list with per-node locks and
//!   hand-over-hand positional insertion

pub mod lock_coupled_list;

pub use lock_coupled_list::LockCoupledList;
