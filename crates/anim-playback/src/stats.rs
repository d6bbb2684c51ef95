//! Playback counters.
//!
//! Written by the playback thread, readable from any thread.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct PlaybackStats {
    frames_decoded: AtomicU64,
    frames_failed: AtomicU64,
    splits_failed: AtomicU64,
    flush_timeouts: AtomicU64,
    passes_completed: AtomicU64,
    breaker_trips: AtomicU64,
}

impl PlaybackStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn record_frame(&self, splits_failed: usize) {
        self.frames_decoded.fetch_add(1, Ordering::Relaxed);
        self.splits_failed
            .fetch_add(splits_failed as u64, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_frame_failure(&self) {
        self.frames_failed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_flush_timeout(&self) {
        self.flush_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_pass(&self) {
        self.passes_completed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_breaker_trip(&self) {
        self.breaker_trips.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PlaybackStatsSnapshot {
        PlaybackStatsSnapshot {
            frames_decoded: self.frames_decoded.load(Ordering::Relaxed),
            frames_failed: self.frames_failed.load(Ordering::Relaxed),
            splits_failed: self.splits_failed.load(Ordering::Relaxed),
            flush_timeouts: self.flush_timeouts.load(Ordering::Relaxed),
            passes_completed: self.passes_completed.load(Ordering::Relaxed),
            breaker_trips: self.breaker_trips.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`PlaybackStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackStatsSnapshot {
    pub frames_decoded: u64,
    pub frames_failed: u64,
    pub splits_failed: u64,
    pub flush_timeouts: u64,
    pub passes_completed: u64,
    pub breaker_trips: u64,
}
