//! Event bits shared between the control surface and the playback thread.

use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// Control surface asks the playback thread to stop.
pub const NEED_STOP: u32 = 1 << 0;
/// Playback thread has honored a stop request.
pub const STOP_ACK: u32 = 1 << 1;
/// Control surface asks the playback thread to exit.
pub const NEED_DELETE: u32 = 1 << 2;
/// Playback thread is exiting.
pub const DELETE_ACK: u32 = 1 << 3;
/// Display finished presenting the last flushed split.
pub const FLUSH_DONE: u32 = 1 << 4;

/// A set of event bits with blocking, deadline-bounded waits.
#[derive(Debug, Default)]
pub struct EventGroup {
    bits: Mutex<u32>,
    cond: Condvar,
}

impl EventGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `mask` and wake every waiter. Returns the resulting bits.
    pub fn set(&self, mask: u32) -> u32 {
        let mut bits = self.bits.lock();
        *bits |= mask;
        self.cond.notify_all();
        *bits
    }

    /// Clear `mask`. Returns the bits before clearing.
    pub fn clear(&self, mask: u32) -> u32 {
        let mut bits = self.bits.lock();
        let before = *bits;
        *bits &= !mask;
        before
    }

    pub fn get(&self) -> u32 {
        *self.bits.lock()
    }

    /// Wait until any bit in `mask` is set, or `timeout` elapses.
    ///
    /// Returns the matched bits, or `None` on timeout. A zero timeout polls.
    /// With `clear_on_exit`, matched bits are cleared before returning.
    pub fn wait_any(&self, mask: u32, timeout: Duration, clear_on_exit: bool) -> Option<u32> {
        let deadline = Instant::now() + timeout;
        let mut bits = self.bits.lock();
        loop {
            let matched = *bits & mask;
            if matched != 0 {
                if clear_on_exit {
                    *bits &= !matched;
                }
                return Some(matched);
            }
            if self.cond.wait_until(&mut bits, deadline).timed_out() {
                let matched = *bits & mask;
                if matched == 0 {
                    return None;
                }
                if clear_on_exit {
                    *bits &= !matched;
                }
                return Some(matched);
            }
        }
    }

    /// Wait for `mask` with a deadline, running `fallback` if it expires.
    ///
    /// Returns `true` when the bits were signaled in time.
    pub fn wait_or<F: FnOnce()>(&self, mask: u32, timeout: Duration, fallback: F) -> bool {
        match self.wait_any(mask, timeout, false) {
            Some(_) => true,
            None => {
                fallback();
                false
            }
        }
    }
}
