use core::time::Duration;
use parking_lot::{Condvar, Mutex};
use std::time::Instant;

/// A one-shot gate letting a blocking thread wait for an async terminal
/// signal.
///
/// The first [`release`](CompletionGate::release) opens the gate and wakes
/// every waiter; later calls are no-ops and return `false`. The gate never
/// closes again, so a waiter arriving after the release returns immediately.
#[derive(Debug, Default)]
pub struct CompletionGate {
    released: Mutex<bool>,
    cond: Condvar,
}

impl CompletionGate {
    pub const fn new() -> Self {
        Self {
            released: Mutex::new(false),
            cond: Condvar::new(),
        }
    }

    /// Opens the gate. Returns `true` only for the call that actually opened
    /// it.
    pub fn release(&self) -> bool {
        let mut released = self.released.lock();
        if *released {
            return false;
        }
        *released = true;
        self.cond.notify_all();
        true
    }

    pub fn is_released(&self) -> bool {
        *self.released.lock()
    }

    /// Blocks the calling thread until the gate is released.
    ///
    /// Must not be called from inside an async task: it parks the OS thread.
    pub fn wait(&self) {
        let mut released = self.released.lock();
        while !*released {
            self.cond.wait(&mut released);
        }
    }

    /// Like [`wait`](CompletionGate::wait) but gives up after `timeout`.
    /// Returns whether the gate was released.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut released = self.released.lock();
        while !*released {
            if self.cond.wait_until(&mut released, deadline).timed_out() {
                break;
            }
        }
        *released
    }
}
