//! Player configuration.

use crate::error::{Error, Result};
use crate::flush::{FlushCallback, FlushNotifier, UpdateCallback, UserData};
use crate::request::{PlayerEvent, DEFAULT_FPS};
use anim_core::FlushArea;
use std::fmt;
use std::time::Duration;
use thread_priority::ThreadPriority;

/// Placement of the playback thread.
#[derive(Debug, Clone)]
pub struct TaskConfig {
    /// Thread name (default: "anim-player")
    pub name: String,
    /// Stack size in bytes; `None` uses the platform default (default: 64KB)
    pub stack_size: Option<usize>,
    /// Thread priority; `None` inherits the spawner's (default: None)
    pub priority: Option<ThreadPriority>,
    /// Core to pin the thread to; `None` lets the OS schedule it (default: None)
    pub core: Option<usize>,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            name: "anim-player".into(),
            stack_size: Some(64 * 1024),
            priority: None,
            core: None,
        }
    }
}

/// Configuration for [`AnimPlayer`](crate::AnimPlayer).
pub struct PlayerConfig {
    pub flush_cb: Option<FlushCallback>,
    pub update_cb: Option<UpdateCallback>,
    pub user_data: Option<UserData>,
    /// Emit byte-swapped RGB565 (default: false)
    pub swap_bytes: bool,
    pub task: TaskConfig,
    /// Longest wait for a flush to be acknowledged (default: 20ms)
    pub flush_timeout: Duration,
    /// Longest wait for stop/delete acknowledgement (default: 1s)
    pub control_timeout: Duration,
    /// Longest wait to enqueue a command (default: 10ms)
    pub send_timeout: Duration,
    /// Poll interval while not playing (default: 10ms)
    pub idle_poll: Duration,
    /// Command queue capacity (default: 5)
    pub queue_depth: usize,
    /// Frame rate applied when a new source is loaded (default: 30)
    pub default_fps: u32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            flush_cb: None,
            update_cb: None,
            user_data: None,
            swap_bytes: false,
            task: TaskConfig::default(),
            flush_timeout: Duration::from_millis(20),
            control_timeout: Duration::from_secs(1),
            send_timeout: Duration::from_millis(10),
            idle_poll: Duration::from_millis(10),
            queue_depth: 5,
            default_fps: DEFAULT_FPS,
        }
    }
}

impl PlayerConfig {
    pub fn on_flush<F>(mut self, flush: F) -> Self
    where
        F: FnMut(&FlushNotifier, FlushArea, &[u16]) + Send + 'static,
    {
        self.flush_cb = Some(Box::new(flush));
        self
    }

    pub fn on_update<F>(mut self, update: F) -> Self
    where
        F: FnMut(PlayerEvent) + Send + 'static,
    {
        self.update_cb = Some(Box::new(update));
        self
    }

    pub fn user_data(mut self, data: UserData) -> Self {
        self.user_data = Some(data);
        self
    }

    pub fn swap_bytes(mut self, swap: bool) -> Self {
        self.swap_bytes = swap;
        self
    }

    /// Pin the playback thread to `core`.
    pub fn pin_to_core(mut self, core: usize) -> Self {
        self.task.core = Some(core);
        self
    }

    pub fn task(mut self, task: TaskConfig) -> Self {
        self.task = task;
        self
    }

    pub fn flush_timeout(mut self, timeout: Duration) -> Self {
        self.flush_timeout = timeout;
        self
    }

    pub fn default_fps(mut self, fps: u32) -> Self {
        self.default_fps = fps;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.queue_depth == 0 {
            return Err(Error::InvalidConfig("queue_depth must be at least 1".into()));
        }
        if self.default_fps == 0 {
            return Err(Error::InvalidFps(self.default_fps));
        }
        if self.task.name.is_empty() {
            return Err(Error::InvalidConfig("task name must not be empty".into()));
        }
        if matches!(self.task.stack_size, Some(size) if size < 16 * 1024) {
            return Err(Error::InvalidConfig(format!(
                "stack_size {:?} below 16KB minimum",
                self.task.stack_size
            )));
        }
        if self.control_timeout.is_zero() {
            return Err(Error::InvalidConfig("control_timeout must be non-zero".into()));
        }
        Ok(())
    }
}

impl fmt::Debug for PlayerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerConfig")
            .field("flush_cb", &self.flush_cb.is_some())
            .field("update_cb", &self.update_cb.is_some())
            .field("user_data", &self.user_data.is_some())
            .field("swap_bytes", &self.swap_bytes)
            .field("task", &self.task)
            .field("flush_timeout", &self.flush_timeout)
            .field("control_timeout", &self.control_timeout)
            .field("send_timeout", &self.send_timeout)
            .field("idle_poll", &self.idle_poll)
            .field("queue_depth", &self.queue_depth)
            .field("default_fps", &self.default_fps)
            .finish()
    }
}
