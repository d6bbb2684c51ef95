//! # anim-player - Split-image animation player
//!
//! Plays palette-indexed, split-compressed animations onto RGB565 displays.
//!
//! ## Architecture
//!
//! anim-player is an umbrella crate that coordinates:
//! - **anim-core** - Frame decoding (`_S` header, RLE / Huffman splits, palette
//!   cache, buffer pool) and packed asset containers. `no_std` + `alloc`.
//! - **anim-playback** - Playback thread, state machine, flush handshake and
//!   the [`AnimPlayer`] control surface
//!
//! ## Quick Start
//!
//! ```ignore
//! use anim_player::prelude::*;
//!
//! let player = anim_player::builder()
//!     .on_flush(|done, area, pixels| {
//!         lcd.draw(area.x1, area.y1, area.x2, area.y2, pixels);
//!         done.notify();
//!     })
//!     .on_update(|event| {
//!         if event == PlayerEvent::AllFramesDone {
//!             println!("loop finished");
//!         }
//!     })
//!     .source_file("assets/boot.bin")
//!     .build()?;
//!
//! player.set_segment(0, 29, 30, false)?;
//! player.update(PlayerAction::Start);
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default) - Loading packed assets from disk

/// Re-export of anim-core for direct access
pub use anim_core as core;

/// Re-export of anim-playback for direct access
pub use anim_playback as playback;

// Decoding
pub use anim_core::{
    AssetEntry, AssetSource, BufferPool, Encoding, FlushArea, FrameDecoder, FrameEncoder,
    FrameList, FrameReport, ImageHeader, PackedAssets, SplitInfo, SplitOutput,
};

// Playback
pub use anim_playback::{
    AnimPlayer, FlushNotifier, PlaybackState, PlaybackStatsSnapshot, PlayerAction, PlayerConfig,
    PlayerEvent, Segment, TaskConfig, ThreadPriority, UserData,
};

mod error;
pub use error::{Error, Result};

mod builder;
pub use builder::AnimPlayerBuilder;

mod render;
pub use render::{OfflineRenderer, RenderedFrame};

/// Start configuring a player.
pub fn builder() -> AnimPlayerBuilder {
    AnimPlayerBuilder::new()
}

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        AnimPlayer, AnimPlayerBuilder, AssetSource, FlushArea, FlushNotifier, FrameList,
        OfflineRenderer, PackedAssets, PlaybackState, PlayerAction, PlayerConfig, PlayerEvent,
        Segment,
    };
    pub use crate::{Error, Result};
    pub use std::sync::Arc;
}
