//! Command and event types exchanged with the playback thread.

use std::time::Duration;

/// Default playback rate when a source is loaded.
pub const DEFAULT_FPS: u32 = 30;

/// Playback action requested through [`AnimPlayer::update`](crate::AnimPlayer::update).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerAction {
    Start,
    Stop,
}

/// Progress notification delivered to the update callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerEvent {
    /// One frame was decoded and flushed.
    OneFrameDone,
    /// A full pass over the segment finished.
    AllFramesDone,
    /// Playback left the playing state.
    Idle,
}

/// Inclusive frame range with rate and loop flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Segment {
    pub start: u32,
    pub end: u32,
    pub fps: u32,
    pub repeat: bool,
}

impl Segment {
    /// Whole-source segment for a source whose last frame is `last`.
    pub fn full(last: u32, fps: u32) -> Self {
        Self {
            start: 0,
            end: last,
            fps,
            repeat: true,
        }
    }

    /// Target time between frame starts.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(1000 / self.fps.max(1) as u64)
    }

    pub fn frame_count(&self) -> u32 {
        self.end - self.start + 1
    }
}

/// Command sent to the playback thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PlayerCommand {
    /// Begin (or restart) playback of a segment.
    Start(Segment),
    /// Stop playback at the next frame boundary.
    Stop,
}

impl PlayerCommand {
    pub(crate) fn new(action: PlayerAction, segment: Segment) -> Self {
        match action {
            PlayerAction::Start => PlayerCommand::Start(segment),
            PlayerAction::Stop => PlayerCommand::Stop,
        }
    }
}
