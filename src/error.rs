//! Centralized error type for the anim-player umbrella crate.
//!
//! Wraps all subsystem errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Playback(#[from] anim_playback::Error),

    #[error("Decode: {0}")]
    Decode(#[from] anim_core::DecodeError),

    #[error("Encode: {0}")]
    Encode(#[from] anim_core::EncodeError),

    #[error("Asset: {0}")]
    Asset(#[from] anim_core::AssetError),
}

pub type Result<T> = std::result::Result<T, Error>;
