//! Playback thread, state machine and control surface for split-image animations.
//!
//! # Features
//!
//! - **Playback thread**: Paces frames at the segment's rate, decodes them with
//!   [`anim_core::FrameDecoder`] and hands each split to the flush callback
//! - **Flush handshake**: The display acknowledges every split through
//!   [`FlushNotifier`]; unacknowledged flushes time out and playback continues
//! - **Control surface**: [`AnimPlayer`] loads sources, selects segments and
//!   starts/stops playback without blocking on the playback thread
//!
//! # Example
//!
//! ```ignore
//! use anim_playback::{AnimPlayer, PlayerAction, PlayerConfig};
//!
//! let player = AnimPlayer::init(
//!     PlayerConfig::default()
//!         .on_flush(|done, area, pixels| {
//!             display.draw(area, pixels);
//!             done.notify();
//!         })
//!         .on_update(|event| println!("{event:?}")),
//! )?;
//!
//! player.set_source_data(std::fs::read("anim.bin")?)?;
//! player.set_segment(0, 9, 15, true)?;
//! player.update(PlayerAction::Start);
//! ```

pub mod error;
pub use error::{Error, Result};

mod config;
pub use config::{PlayerConfig, TaskConfig};

pub mod events;
pub use events::EventGroup;

mod flush;
pub use flush::{FlushCallback, FlushNotifier, UpdateCallback, UserData};

pub mod fsm;
pub use fsm::{PlaybackFsm, PlaybackInput, PlaybackState, Transition, MAX_CONSECUTIVE_FAILURES};

mod request;
pub use request::{PlayerAction, PlayerEvent, Segment, DEFAULT_FPS};

mod stats;
pub use stats::{PlaybackStats, PlaybackStatsSnapshot};

mod player;
pub use player::AnimPlayer;

mod thread;

pub use thread_priority::ThreadPriority;
