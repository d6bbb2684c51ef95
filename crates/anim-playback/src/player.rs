//! Public control surface.

use crate::config::PlayerConfig;
use crate::error::{Error, Result};
use crate::events::{EventGroup, DELETE_ACK, FLUSH_DONE, NEED_DELETE, NEED_STOP, STOP_ACK};
use crate::flush::{FlushNotifier, UserData};
use crate::fsm::PlaybackState;
use crate::request::{PlayerAction, PlayerCommand, Segment};
use crate::stats::PlaybackStatsSnapshot;
use crate::thread::{PlaybackTask, SharedState};
use anim_core::{AssetSource, PackedAssets};
use crossbeam_channel::{bounded, SendTimeoutError, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Segment bookkeeping for the loaded source.
#[derive(Debug, Clone, Copy)]
struct SegmentSlot {
    last_frame: u32,
    segment: Segment,
}

/// Animation player handle.
///
/// Owns the playback thread. Dropping the handle stops and joins it.
pub struct AnimPlayer {
    command_tx: Sender<PlayerCommand>,
    shared: Arc<SharedState>,
    segment: Mutex<Option<SegmentSlot>>,
    user_data: Option<UserData>,
    thread: Option<JoinHandle<()>>,
    default_fps: u32,
    control_timeout: Duration,
    send_timeout: Duration,
}

impl AnimPlayer {
    /// Validate `config` and spawn the playback thread.
    pub fn init(mut config: PlayerConfig) -> Result<Self> {
        config.validate()?;

        let (command_tx, command_rx) = bounded(config.queue_depth);
        let shared = Arc::new(SharedState::new(Arc::new(EventGroup::new())));
        let task = PlaybackTask::new(command_rx, Arc::clone(&shared), &mut config);
        let thread = task.spawn(&config.task)?;

        tracing::info!(
            thread = %config.task.name,
            queue_depth = config.queue_depth,
            swap_bytes = config.swap_bytes,
            "animation player started"
        );

        Ok(Self {
            command_tx,
            shared,
            segment: Mutex::new(None),
            user_data: config.user_data.take(),
            thread: Some(thread),
            default_fps: config.default_fps,
            control_timeout: config.control_timeout,
            send_timeout: config.send_timeout,
        })
    }

    /// Parse a packed asset blob and make it the current source.
    ///
    /// On parse failure the previous source stays in place.
    pub fn set_source_data(&self, data: Vec<u8>) -> Result<()> {
        let assets = PackedAssets::parse(data)?;
        self.set_source(Arc::new(assets))
    }

    /// Stop playback, swap in `source` and reset the segment to cover it.
    pub fn set_source(&self, source: Arc<dyn AssetSource>) -> Result<()> {
        let last_frame = source.last_frame().ok_or(Error::EmptySource)?;
        let last_frame = u32::try_from(last_frame).unwrap_or(u32::MAX);

        // Held across stop and swap so a concurrent start cannot queue the
        // old segment against the new source.
        let mut slot = self.segment.lock();
        self.stop_sync()?;

        *self.shared.source.write() = Some(source);
        *slot = Some(SegmentSlot {
            last_frame,
            segment: Segment::full(last_frame, self.default_fps),
        });
        drop(slot);

        tracing::info!(frames = u64::from(last_frame) + 1, "animation source loaded");
        Ok(())
    }

    /// Replace the segment used by the next start.
    ///
    /// Requires `start <= end <= last frame` and `fps > 0`; otherwise the
    /// current segment is left untouched.
    pub fn set_segment(&self, start: u32, end: u32, fps: u32, repeat: bool) -> Result<()> {
        let mut guard = self.segment.lock();
        let Some(slot) = guard.as_mut() else {
            tracing::error!("set_segment called before a source was loaded");
            return Err(Error::NoSource);
        };

        if start > end || end > slot.last_frame {
            tracing::error!(start, end, last = slot.last_frame, "invalid segment");
            return Err(Error::InvalidSegment {
                start,
                end,
                last: slot.last_frame,
            });
        }
        if fps == 0 {
            tracing::error!("invalid segment fps: 0");
            return Err(Error::InvalidFps(fps));
        }

        slot.segment = Segment {
            start,
            end,
            fps,
            repeat,
        };
        tracing::debug!(start, end, fps, repeat, "segment updated");
        Ok(())
    }

    /// Current `(start, end)` frame range.
    pub fn segment(&self) -> Option<(u32, u32)> {
        self.current_segment().map(|s| (s.start, s.end))
    }

    pub fn current_segment(&self) -> Option<Segment> {
        self.segment.lock().map(|slot| slot.segment)
    }

    /// Ask the playback thread to start or stop.
    ///
    /// Never blocks longer than the configured send timeout. Failures are
    /// logged, not returned.
    pub fn update(&self, action: PlayerAction) {
        // Held until the command is queued; see `set_source`.
        let slot = self.segment.lock();
        let cmd = match (action, slot.map(|s| s.segment)) {
            (PlayerAction::Start, None) => {
                tracing::warn!("start requested without a source, ignoring");
                return;
            }
            (PlayerAction::Start, Some(segment)) => PlayerCommand::new(action, segment),
            (PlayerAction::Stop, _) => PlayerCommand::Stop,
        };

        match self.command_tx.send_timeout(cmd, self.send_timeout) {
            Ok(()) => tracing::debug!(?action, "command queued"),
            Err(SendTimeoutError::Timeout(cmd)) => {
                tracing::error!(?cmd, "command queue full, dropping command")
            }
            Err(SendTimeoutError::Disconnected(cmd)) => {
                tracing::error!(?cmd, "playback thread gone, dropping command")
            }
        }
    }

    pub fn user_data(&self) -> Option<&UserData> {
        self.user_data.as_ref()
    }

    /// Signal that the display finished with the last flushed split.
    pub fn flush_ready(&self) {
        self.shared.events.set(FLUSH_DONE);
    }

    /// Detached handle for signaling flush completion from other threads.
    pub fn flush_notifier(&self) -> FlushNotifier {
        FlushNotifier::new(Arc::clone(&self.shared.events))
    }

    pub fn state(&self) -> PlaybackState {
        self.shared.state()
    }

    pub fn stats(&self) -> PlaybackStatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// Stop the playback thread and release everything it holds.
    pub fn deinit(mut self) -> Result<()> {
        self.shutdown()
    }

    /// Synchronous stop: returns once the playback thread has left playing.
    fn stop_sync(&self) -> Result<()> {
        let events = &self.shared.events;
        events.clear(STOP_ACK);
        events.set(NEED_STOP);
        if events
            .wait_any(STOP_ACK, self.control_timeout, true)
            .is_none()
        {
            events.clear(NEED_STOP);
            tracing::error!("playback thread did not acknowledge stop");
            return Err(Error::Timeout("stop"));
        }
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        let Some(handle) = self.thread.take() else {
            return Ok(());
        };

        let events = &self.shared.events;
        events.set(NEED_DELETE);
        let acked = events
            .wait_any(DELETE_ACK, self.control_timeout, true)
            .is_some();

        if acked {
            if handle.join().is_err() {
                tracing::error!("playback thread panicked");
            }
        } else {
            tracing::warn!("playback thread did not acknowledge exit, detaching");
        }

        *self.shared.source.write() = None;
        *self.segment.lock() = None;
        tracing::info!("animation player stopped");

        if acked {
            Ok(())
        } else {
            Err(Error::Timeout("exit"))
        }
    }
}

impl Drop for AnimPlayer {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

impl std::fmt::Debug for AnimPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimPlayer")
            .field("state", &self.state())
            .field("segment", &self.current_segment())
            .field("running", &self.thread.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TaskConfig;
    use anim_core::FrameList;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn source(frames: usize) -> Arc<dyn AssetSource> {
        Arc::new(FrameList::new(vec![vec![0u8; 4]; frames]))
    }

    #[test]
    fn test_segment_requires_source() {
        init_tracing();
        let player = AnimPlayer::init(PlayerConfig::default()).unwrap();
        assert!(matches!(
            player.set_segment(0, 0, 30, true),
            Err(Error::NoSource)
        ));
        assert_eq!(player.segment(), None);
    }

    #[test]
    fn test_set_source_resets_segment() {
        let player = AnimPlayer::init(PlayerConfig::default()).unwrap();
        player.set_source(source(4)).unwrap();
        assert_eq!(player.segment(), Some((0, 3)));

        player.set_segment(1, 2, 10, false).unwrap();
        assert_eq!(player.segment(), Some((1, 2)));

        player.set_source(source(6)).unwrap();
        assert_eq!(player.segment(), Some((0, 5)));
        let seg = player.current_segment().unwrap();
        assert_eq!(seg.fps, 30);
        assert!(seg.repeat);
    }

    #[test]
    fn test_invalid_segment_keeps_previous() {
        let player = AnimPlayer::init(PlayerConfig::default()).unwrap();
        player.set_source(source(4)).unwrap();
        player.set_segment(1, 2, 10, false).unwrap();

        assert!(matches!(
            player.set_segment(3, 1, 10, false),
            Err(Error::InvalidSegment { .. })
        ));
        assert!(matches!(
            player.set_segment(0, 4, 10, false),
            Err(Error::InvalidSegment { last: 3, .. })
        ));
        assert!(matches!(
            player.set_segment(0, 3, 0, false),
            Err(Error::InvalidFps(0))
        ));
        assert_eq!(player.segment(), Some((1, 2)));
    }

    #[test]
    fn test_empty_source_rejected() {
        let player = AnimPlayer::init(PlayerConfig::default()).unwrap();
        assert!(matches!(
            player.set_source(Arc::new(FrameList::new(Vec::new()))),
            Err(Error::EmptySource)
        ));
    }

    #[test]
    fn test_bad_asset_data_keeps_source() {
        let player = AnimPlayer::init(PlayerConfig::default()).unwrap();
        player.set_source(source(2)).unwrap();
        assert!(matches!(
            player.set_source_data(vec![1, 2, 3]),
            Err(Error::Asset(_))
        ));
        assert_eq!(player.segment(), Some((0, 1)));
    }

    #[test]
    fn test_user_data_roundtrip() {
        let data: UserData = Arc::new(42u32);
        let player = AnimPlayer::init(PlayerConfig::default().user_data(data)).unwrap();
        let value = player.user_data().unwrap().downcast_ref::<u32>();
        assert_eq!(value, Some(&42));
    }

    #[test]
    fn test_deinit() {
        init_tracing();
        let player = AnimPlayer::init(PlayerConfig::default()).unwrap();
        assert_eq!(player.state(), PlaybackState::Idle);
        player.deinit().unwrap();
    }

    #[test]
    fn test_pinned_thread_starts_and_stops() {
        init_tracing();
        let config = PlayerConfig::default().task(TaskConfig {
            name: "anim-pinned".into(),
            core: Some(0),
            ..Default::default()
        });
        let player = AnimPlayer::init(config).unwrap();
        player.set_source(source(3)).unwrap();
        assert_eq!(player.segment(), Some((0, 2)));
        player.deinit().unwrap();
    }

    #[test]
    fn test_unknown_core_is_not_fatal() {
        init_tracing();
        let player = AnimPlayer::init(PlayerConfig::default().pin_to_core(usize::MAX)).unwrap();
        player.set_source(source(1)).unwrap();
        player.deinit().unwrap();
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PlayerConfig {
            queue_depth: 0,
            ..Default::default()
        };
        assert!(matches!(
            AnimPlayer::init(config),
            Err(Error::InvalidConfig(_))
        ));
    }
}
