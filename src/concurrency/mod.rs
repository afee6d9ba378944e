//! Blocking primitives behind the coupled list.
//!
//! The wait/wake helpers park a thread on a 32-bit word until another thread
//! changes it. They are the slow path of [`sync::FutexLock`].

pub mod sync;

use core::sync::atomic::AtomicU32;
#[cfg(not(any(windows, target_os = "linux")))]
use core::sync::atomic::Ordering;

#[cfg(windows)]
use windows_sys::Win32::System::Threading::{WaitOnAddress, WakeByAddressAll, WakeByAddressSingle};

#[cfg(target_os = "linux")]
use libc::{SYS_futex, FUTEX_PRIVATE_FLAG, FUTEX_WAIT, FUTEX_WAKE};

#[cfg(target_os = "linux")]
#[inline]
fn futex_wait(addr: *const u32, expected: u32) {
    // Spurious returns (EINTR, EAGAIN) are fine: every caller re-checks the word.
    unsafe {
        libc::syscall(
            SYS_futex,
            addr,
            FUTEX_WAIT | FUTEX_PRIVATE_FLAG,
            expected,
            core::ptr::null::<libc::timespec>(),
        );
    }
}

#[cfg(target_os = "linux")]
#[inline]
fn futex_wake(addr: *const u32, count: i32) {
    unsafe {
        libc::syscall(SYS_futex, addr, FUTEX_WAKE | FUTEX_PRIVATE_FLAG, count);
    }
}

/// Blocks while `addr` still holds `expected`.
///
/// May return spuriously; callers must re-check the word in a loop.
#[inline]
pub fn wait_on_u32(addr: &AtomicU32, expected: u32) {
    #[cfg(windows)]
    unsafe {
        let expected_ptr = core::ptr::addr_of!(expected).cast::<core::ffi::c_void>();
        let addr_ptr = addr.as_ptr().cast_const().cast::<core::ffi::c_void>();
        WaitOnAddress(addr_ptr, expected_ptr, core::mem::size_of::<u32>(), u32::MAX);
    }
    #[cfg(target_os = "linux")]
    futex_wait(addr.as_ptr().cast_const(), expected);
    #[cfg(not(any(windows, target_os = "linux")))]
    while addr.load(Ordering::Acquire) == expected {
        std::thread::yield_now();
    }
}

/// Wakes one thread parked on `addr`.
#[inline]
pub fn wake_one_u32(addr: &AtomicU32) {
    #[cfg(windows)]
    unsafe {
        WakeByAddressSingle(addr.as_ptr().cast_const().cast());
    }
    #[cfg(target_os = "linux")]
    futex_wake(addr.as_ptr().cast_const(), 1);
    #[cfg(not(any(windows, target_os = "linux")))]
    let _ = addr;
}

/// Wakes every thread parked on `addr`.
#[inline]
pub fn wake_all_u32(addr: &AtomicU32) {
    #[cfg(windows)]
    unsafe {
        WakeByAddressAll(addr.as_ptr().cast_const().cast());
    }
    #[cfg(target_os = "linux")]
    futex_wake(addr.as_ptr().cast_const(), i32::MAX);
    #[cfg(not(any(windows, target_os = "linux")))]
    let _ = addr;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn test_wait_on_u32_wake() {
        let flag = Arc::new(AtomicU32::new(0));
        let barrier = Arc::new(Barrier::new(2));
        let flag_thread = flag.clone();
        let barrier_thread = barrier.clone();

        let handle = thread::spawn(move || {
            barrier_thread.wait();
            while flag_thread.load(Ordering::SeqCst) == 0 {
                wait_on_u32(&flag_thread, 0);
            }
            flag_thread.load(Ordering::SeqCst)
        });

        barrier.wait();
        flag.store(1, Ordering::SeqCst);
        wake_all_u32(&flag);

        let value = handle.join().unwrap();
        assert_eq!(value, 1);
    }

    #[test]
    fn test_wait_returns_immediately_on_mismatch() {
        let flag = AtomicU32::new(7);
        // Word already differs from `expected`, so this must not park.
        wait_on_u32(&flag, 0);
        wake_one_u32(&flag);
        assert_eq!(flag.load(Ordering::SeqCst), 7);
    }
}
