//! Playback thread: paces frames, decodes them and dispatches flushes.

use crate::config::{PlayerConfig, TaskConfig};
use crate::error::Result;
use crate::events::{EventGroup, DELETE_ACK, FLUSH_DONE, NEED_DELETE, NEED_STOP, STOP_ACK};
use crate::flush::{FlushCallback, FlushNotifier, UpdateCallback};
use crate::fsm::{PlaybackFsm, PlaybackInput, PlaybackState, Transition};
use crate::request::{PlayerCommand, PlayerEvent};
use crate::stats::PlaybackStats;
use anim_core::{AssetSource, BufferPool, DecodeError, FrameDecoder, FrameReport, SplitOutput};
use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

/// State shared between [`AnimPlayer`](crate::AnimPlayer) and the playback thread.
pub(crate) struct SharedState {
    pub(crate) events: Arc<EventGroup>,
    pub(crate) source: RwLock<Option<Arc<dyn AssetSource>>>,
    pub(crate) state: AtomicU8,
    pub(crate) stats: PlaybackStats,
}

impl SharedState {
    pub(crate) fn new(events: Arc<EventGroup>) -> Self {
        Self {
            events,
            source: RwLock::new(None),
            state: AtomicU8::new(PlaybackState::Idle as u8),
            stats: PlaybackStats::new(),
        }
    }

    pub(crate) fn state(&self) -> PlaybackState {
        PlaybackState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn publish(&self, state: PlaybackState) {
        self.state.store(state as u8, Ordering::Release);
    }
}

#[derive(Debug, Error)]
enum FrameFailure {
    #[error("frame {0} missing from source")]
    Missing(u32),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    None,
    Stopped,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PassOutcome {
    Completed,
    Interrupted,
    Delete,
}

/// Decoder and its pooled buffers. Only touched by the playback thread.
struct Renderer {
    decoder: FrameDecoder,
    pool: BufferPool,
}

/// Caller-facing callbacks and the flush handshake.
struct Dispatch {
    flush_cb: Option<FlushCallback>,
    update_cb: Option<UpdateCallback>,
    notifier: FlushNotifier,
    shared: Arc<SharedState>,
    flush_timeout: Duration,
}

impl Dispatch {
    fn emit(&mut self, event: PlayerEvent) {
        tracing::trace!(?event, "update event");
        if let Some(update) = self.update_cb.as_mut() {
            update(event);
        }
    }

    /// Hand a split to the display and wait (bounded) for its completion.
    fn flush(&mut self, split: SplitOutput<'_>) {
        let events = &self.shared.events;
        let Some(flush) = self.flush_cb.as_mut() else {
            events.set(FLUSH_DONE);
            return;
        };

        events.clear(FLUSH_DONE);
        flush(&self.notifier, split.info.area, split.pixels);

        let stats = &self.shared.stats;
        events.wait_or(FLUSH_DONE, self.flush_timeout, || {
            tracing::warn!(
                split = split.info.index,
                timeout_ms = self.flush_timeout.as_millis() as u64,
                "flush not acknowledged in time, continuing"
            );
            stats.record_flush_timeout();
            events.set(FLUSH_DONE);
        });
    }
}

/// Pin the calling thread to `id`. Only cores the process may run on are
/// accepted.
fn pin_to_core(id: usize) {
    let available = core_affinity::get_core_ids()
        .is_some_and(|cores| cores.iter().any(|core| core.id == id));
    if !available || !core_affinity::set_for_current(core_affinity::CoreId { id }) {
        tracing::warn!(core = id, "failed to pin playback thread to core");
    }
}

/// Everything the playback thread owns.
pub(crate) struct PlaybackTask {
    rx: Receiver<PlayerCommand>,
    shared: Arc<SharedState>,
    fsm: PlaybackFsm,
    renderer: Renderer,
    dispatch: Dispatch,
    idle_poll: Duration,
    last_frame_at: Option<Instant>,
}

impl PlaybackTask {
    /// Build the task, taking the callbacks out of `config`.
    pub(crate) fn new(
        rx: Receiver<PlayerCommand>,
        shared: Arc<SharedState>,
        config: &mut PlayerConfig,
    ) -> Self {
        let notifier = FlushNotifier::new(Arc::clone(&shared.events));
        Self {
            rx,
            fsm: PlaybackFsm::new(),
            renderer: Renderer {
                decoder: FrameDecoder::new(config.swap_bytes),
                pool: BufferPool::new(),
            },
            dispatch: Dispatch {
                flush_cb: config.flush_cb.take(),
                update_cb: config.update_cb.take(),
                notifier,
                shared: Arc::clone(&shared),
                flush_timeout: config.flush_timeout,
            },
            shared,
            idle_poll: config.idle_poll,
            last_frame_at: None,
        }
    }

    /// Spawn the playback thread.
    pub(crate) fn spawn(self, task: &TaskConfig) -> Result<JoinHandle<()>> {
        let mut builder = thread::Builder::new().name(task.name.clone());
        if let Some(size) = task.stack_size {
            builder = builder.stack_size(size);
        }
        let priority = task.priority;
        let core = task.core;

        let handle = builder.spawn(move || {
            if let Some(priority) = priority {
                if let Err(err) = thread_priority::set_current_thread_priority(priority) {
                    tracing::warn!(?err, "failed to set playback thread priority");
                }
            }
            if let Some(id) = core {
                pin_to_core(id);
            }
            self.run();
        })?;
        Ok(handle)
    }

    fn run(mut self) {
        tracing::debug!("playback thread started");

        loop {
            if self.poll_control() == Control::Delete {
                break;
            }

            if !self.fsm.is_playing() {
                match self.rx.recv_timeout(self.idle_poll) {
                    Ok(cmd) => self.apply(cmd),
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => break,
                }
                continue;
            }

            if !self.drain_commands() {
                break;
            }

            if self.fsm.is_playing() && self.play_pass() == PassOutcome::Delete {
                break;
            }
        }

        let transition = self.fsm.transition(PlaybackInput::Delete);
        self.after_transition(transition);
        self.shared.events.set(DELETE_ACK);
        tracing::debug!("playback thread exiting");
    }

    /// Honor pending stop/delete requests without blocking.
    ///
    /// Delete wins when both are pending.
    fn poll_control(&mut self) -> Control {
        let Some(bits) = self
            .shared
            .events
            .wait_any(NEED_DELETE | NEED_STOP, Duration::ZERO, true)
        else {
            return Control::None;
        };

        if bits & NEED_DELETE != 0 {
            return Control::Delete;
        }

        let transition = self.fsm.transition(PlaybackInput::Stop);
        self.after_transition(transition);

        let dropped = self.rx.try_iter().count();
        if dropped > 0 {
            tracing::debug!(dropped, "discarded queued commands on stop");
        }

        self.shared.events.set(STOP_ACK);
        Control::Stopped
    }

    /// Apply every queued command in order. Returns `false` if the
    /// control surface is gone.
    fn drain_commands(&mut self) -> bool {
        loop {
            match self.rx.try_recv() {
                Ok(cmd) => self.apply(cmd),
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Disconnected) => return false,
            }
        }
    }

    fn apply(&mut self, cmd: PlayerCommand) {
        tracing::debug!(?cmd, "playback command");
        let transition = match cmd {
            PlayerCommand::Start(segment) => {
                self.last_frame_at = None;
                self.fsm.transition(PlaybackInput::Start(segment))
            }
            PlayerCommand::Stop => self.fsm.transition(PlaybackInput::Stop),
        };
        self.after_transition(transition);
    }

    fn after_transition(&mut self, transition: Transition) {
        self.shared.publish(transition.to);
        if transition.left_playing() {
            self.dispatch.emit(PlayerEvent::Idle);
        }
    }

    /// Play the current segment once, front to back.
    fn play_pass(&mut self) -> PassOutcome {
        let Some(run) = self.fsm.run() else {
            let transition = self.fsm.transition(PlaybackInput::Stop);
            self.after_transition(transition);
            return PassOutcome::Interrupted;
        };

        let source = self.shared.source.read().clone();
        let Some(source) = source else {
            tracing::warn!("start requested without a source, stopping");
            let transition = self.fsm.transition(PlaybackInput::Stop);
            self.after_transition(transition);
            return PassOutcome::Interrupted;
        };

        let interval = run.frame_interval();
        for index in run.start..=run.end {
            self.pace(interval);

            match self.poll_control() {
                Control::Delete => return PassOutcome::Delete,
                Control::Stopped => return PassOutcome::Interrupted,
                Control::None => {}
            }

            match self.rx.try_recv() {
                Ok(cmd) => {
                    self.apply(cmd);
                    return PassOutcome::Interrupted;
                }
                Err(TryRecvError::Disconnected) => return PassOutcome::Delete,
                Err(TryRecvError::Empty) => {}
            }

            match self.render_frame(source.as_ref(), index) {
                Ok(report) => {
                    self.shared.stats.record_frame(report.splits_failed);
                    self.fsm.transition(PlaybackInput::FrameDecoded);
                    self.dispatch.emit(PlayerEvent::OneFrameDone);
                }
                Err(err) => {
                    tracing::warn!(frame = index, error = %err, "frame decode failed");
                    self.shared.stats.record_frame_failure();
                    let transition = self.fsm.transition(PlaybackInput::FrameFailed);
                    if transition.breaker_tripped {
                        tracing::error!(
                            frame = index,
                            "too many consecutive frame failures, stopping playback"
                        );
                        self.shared.stats.record_breaker_trip();
                        self.after_transition(transition);
                        return PassOutcome::Interrupted;
                    }
                }
            }
        }

        self.shared.stats.record_pass();
        self.dispatch.emit(PlayerEvent::AllFramesDone);
        let transition = self.fsm.transition(PlaybackInput::PassComplete);
        self.after_transition(transition);
        PassOutcome::Completed
    }

    /// Sleep out the rest of the frame interval, waking early on stop/delete.
    fn pace(&mut self, interval: Duration) {
        if let Some(last) = self.last_frame_at {
            let elapsed = last.elapsed();
            if elapsed < interval {
                self.shared
                    .events
                    .wait_any(NEED_DELETE | NEED_STOP, interval - elapsed, false);
            }
        }
        self.last_frame_at = Some(Instant::now());
    }

    fn render_frame(
        &mut self,
        source: &dyn AssetSource,
        index: u32,
    ) -> std::result::Result<FrameReport, FrameFailure> {
        let data = source
            .frame(index as usize)
            .ok_or(FrameFailure::Missing(index))?;

        let Self {
            renderer, dispatch, ..
        } = self;
        let report = renderer
            .decoder
            .decode_frame(data, &mut renderer.pool, |split| dispatch.flush(split))?;
        Ok(report)
    }
}
