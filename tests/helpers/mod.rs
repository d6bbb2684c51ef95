//! Test helpers and fixtures for anim-player integration tests
//!
//! Frames are built with [`FrameEncoder`] so every fixture is a real `_S`
//! frame; packed containers go through [`PackedAssets::pack`].

use anim_player::core::rgb565;
use anim_player::{Encoding, FrameEncoder, PackedAssets, PlayerEvent};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

/// Generous upper bound for anything the playback thread should do promptly.
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Install a test-friendly tracing subscriber (respects `RUST_LOG`).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Palette where index `i` is pure red of intensity `i`.
pub fn red_palette() -> Vec<[u8; 4]> {
    (0..=255u8).map(|i| [0, 0, i, 0xff]).collect()
}

/// RGB565 value `red_palette` resolves `index` to.
pub fn red(index: u8, swap: bool) -> u16 {
    rgb565(index, 0, 0, swap)
}

/// A single-color 8-bit frame.
pub fn solid_frame(width: u16, height: u16, split_height: u16, index: u8) -> Vec<u8> {
    FrameEncoder::new(8, width, height, split_height)
        .expect("valid geometry")
        .palette(red_palette())
        .encoding(Encoding::Huffman)
        .encode(&vec![index; width as usize * height as usize])
        .expect("encodable frame")
}

/// Packed container with `frames` solid 4x4 frames, frame `i` colored `i + 1`.
pub fn packed_animation(frames: usize) -> Vec<u8> {
    let encoded: Vec<(String, Vec<u8>)> = (0..frames)
        .map(|i| (format!("frame_{i:03}.sbmp"), solid_frame(4, 4, 2, i as u8 + 1)))
        .collect();
    PackedAssets::pack(encoded.iter().map(|(n, d)| (n.as_str(), d.as_slice())))
}

/// Collects update events from the playback thread.
pub struct EventLog {
    rx: Receiver<PlayerEvent>,
    seen: Vec<PlayerEvent>,
}

impl EventLog {
    /// Returns the log and the sender to move into the update callback.
    pub fn new() -> (Self, Sender<PlayerEvent>) {
        let (tx, rx) = channel();
        (Self { rx, seen: Vec::new() }, tx)
    }

    /// Wait until `event` arrives, returning every event seen so far.
    pub fn wait_for(&mut self, event: PlayerEvent) -> &[PlayerEvent] {
        let deadline = Instant::now() + EVENT_TIMEOUT;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(e) => {
                    self.seen.push(e);
                    if e == event {
                        return &self.seen;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    panic!("timed out waiting for {event:?}, saw {:?}", self.seen)
                }
                Err(RecvTimeoutError::Disconnected) => {
                    panic!("event sender dropped waiting for {event:?}, saw {:?}", self.seen)
                }
            }
        }
    }

    /// Collect whatever arrives within `window`.
    pub fn drain_for(&mut self, window: Duration) -> &[PlayerEvent] {
        let deadline = Instant::now() + window;
        while let Ok(e) = self
            .rx
            .recv_timeout(deadline.saturating_duration_since(Instant::now()))
        {
            self.seen.push(e);
        }
        &self.seen
    }

    pub fn count(&self, event: PlayerEvent) -> usize {
        self.seen.iter().filter(|&&e| e == event).count()
    }
}
