//! Error types.

use thiserror::Error;

/// Error type.
#[derive(Error, Debug)]
pub enum Error {
    /// No animation source has been set.
    #[error("No animation source loaded")]
    NoSource,

    /// Source has no frames.
    #[error("Animation source contains no frames")]
    EmptySource,

    /// Segment outside the loaded source.
    #[error("Invalid segment: start={start}, end={end}, last frame={last}")]
    InvalidSegment { start: u32, end: u32, last: u32 },

    /// Frame rate must be positive.
    #[error("Invalid fps: {0}. Must be greater than 0")]
    InvalidFps(u32),

    /// Invalid player configuration.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Packed asset parsing failed.
    #[error("Asset error: {0}")]
    Asset(#[from] anim_core::AssetError),

    /// The playback thread did not acknowledge a control request in time.
    #[error("Timed out waiting for playback thread to {0}")]
    Timeout(&'static str),

    /// Failed to spawn the playback thread.
    #[error("Failed to spawn playback thread")]
    Spawn(#[from] std::io::Error),
}

/// Result type.
pub type Result<T> = std::result::Result<T, Error>;
