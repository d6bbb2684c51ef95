//! Builder for configuring and constructing an `AnimPlayer`.

use crate::{AnimPlayer, PlayerAction, PlayerConfig, Result, TaskConfig};
use anim_core::{AssetSource, FlushArea};
use anim_playback::{FlushNotifier, PlayerEvent, UserData};
use std::sync::Arc;
use std::time::Duration;

enum InitialSource {
    Data(Vec<u8>),
    Source(Arc<dyn AssetSource>),
    #[cfg(feature = "std")]
    File(std::path::PathBuf),
}

/// Collects callbacks, thread placement and an optional initial source,
/// then starts the player in one step.
///
/// # Example
///
/// ```ignore
/// use anim_player::prelude::*;
///
/// let player = anim_player::builder()
///     .on_flush(|done, area, pixels| {
///         lcd.draw(area, pixels);
///         done.notify();
///     })
///     .source_file("assets/boot.bin")
///     .segment(0, 29, 30, false)
///     .autoplay(true)
///     .build()?;
/// ```
pub struct AnimPlayerBuilder {
    config: PlayerConfig,
    source: Option<InitialSource>,
    segment: Option<(u32, u32, u32, bool)>,
    autoplay: bool,
}

impl Default for AnimPlayerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimPlayerBuilder {
    pub fn new() -> Self {
        Self {
            config: PlayerConfig::default(),
            source: None,
            segment: None,
            autoplay: false,
        }
    }

    /// Start from an existing configuration.
    pub fn with_config(config: PlayerConfig) -> Self {
        Self {
            config,
            ..Self::new()
        }
    }

    pub fn on_flush<F>(mut self, flush: F) -> Self
    where
        F: FnMut(&FlushNotifier, FlushArea, &[u16]) + Send + 'static,
    {
        self.config = self.config.on_flush(flush);
        self
    }

    pub fn on_update<F>(mut self, update: F) -> Self
    where
        F: FnMut(PlayerEvent) + Send + 'static,
    {
        self.config = self.config.on_update(update);
        self
    }

    pub fn user_data(mut self, data: UserData) -> Self {
        self.config = self.config.user_data(data);
        self
    }

    pub fn swap_bytes(mut self, swap: bool) -> Self {
        self.config = self.config.swap_bytes(swap);
        self
    }

    pub fn task(mut self, task: TaskConfig) -> Self {
        self.config = self.config.task(task);
        self
    }

    pub fn flush_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.flush_timeout(timeout);
        self
    }

    /// Frame rate applied whenever a source is loaded.
    pub fn fps(mut self, fps: u32) -> Self {
        self.config = self.config.default_fps(fps);
        self
    }

    /// Load a packed asset blob after start.
    pub fn source_data(mut self, data: Vec<u8>) -> Self {
        self.source = Some(InitialSource::Data(data));
        self
    }

    pub fn source(mut self, source: Arc<dyn AssetSource>) -> Self {
        self.source = Some(InitialSource::Source(source));
        self
    }

    /// Load a packed asset file after start.
    #[cfg(feature = "std")]
    pub fn source_file(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.source = Some(InitialSource::File(path.into()));
        self
    }

    /// Segment applied after the initial source is loaded.
    pub fn segment(mut self, start: u32, end: u32, fps: u32, repeat: bool) -> Self {
        self.segment = Some((start, end, fps, repeat));
        self
    }

    /// Start playback once built. Requires a source.
    pub fn autoplay(mut self, enabled: bool) -> Self {
        self.autoplay = enabled;
        self
    }

    pub fn build(self) -> Result<AnimPlayer> {
        let player = AnimPlayer::init(self.config)?;

        match self.source {
            Some(InitialSource::Data(data)) => player.set_source_data(data)?,
            Some(InitialSource::Source(source)) => player.set_source(source)?,
            #[cfg(feature = "std")]
            Some(InitialSource::File(path)) => {
                let assets = anim_core::PackedAssets::open(&path)?;
                tracing::debug!(path = %path.display(), "loaded packed assets");
                player.set_source(Arc::new(assets))?;
            }
            None => {}
        }

        if let Some((start, end, fps, repeat)) = self.segment {
            player.set_segment(start, end, fps, repeat)?;
        }

        if self.autoplay {
            player.update(PlayerAction::Start);
        }
        Ok(player)
    }
}
