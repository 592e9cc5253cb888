// SPDX-License-Identifier: Unlicense

//! Wrapper for locking and releasing a mutex through a local variable.

use spin::{Mutex, MutexGuard};

/// Wraps a generic object in a Mutex.
pub struct Locked<A> {
    inner: Mutex<A>,
}

impl<A> Locked<A> {
    /// Create a Mutex wrapping an object.
    pub const fn new(inner: A) -> Self {
        Locked {
            inner: Mutex::new(inner),
        }
    }

    /// Hold the lock on the Mutex while local variable is live.
    ///
    /// NOTE: Cannot log here as debug Uart is a Locked object.
    pub fn lock(&self) -> MutexGuard<A> {
        self.inner.lock()
    }

    /// Take the lock only if nobody holds it.
    ///
    /// For paths that may run while the lock is already held on this core,
    /// eg. the panic handler.
    pub fn try_lock(&self) -> Option<MutexGuard<A>> {
        self.inner.try_lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_lock_while_held() {
        let locked = Locked::new(0x1000u32);
        {
            let guard = locked.lock();
            assert_eq!(*guard, 0x1000);
            assert_none!(locked.try_lock());
        }
        assert_some_eq!(locked.try_lock().map(|g| *g), 0x1000);
    }
}
