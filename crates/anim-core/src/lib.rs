//! Frame decoding kernel for split, palette-indexed animations.
//!
//! # Primary API
//!
//! - [`ImageHeader`]: Per-frame metadata parsed from the `_S` header
//! - [`BufferPool`]: Reusable frame/decode/huffman buffers and the palette cache
//! - [`FrameDecoder`]: RLE / Huffman split decoding and RGB565 expansion
//! - [`FrameEncoder`]: Builds `_S` frames from indexed pixels
//! - [`AssetSource`], [`PackedAssets`], [`FrameList`]: Frame providers
//!
//! # Features
//!
//! - `"std"`: [`PackedAssets::open`] for loading packed assets from disk (enabled by default)
//!
//! # Example
//!
//! ```ignore
//! use anim_core::{BufferPool, FrameDecoder, PackedAssets, AssetSource};
//!
//! let assets = PackedAssets::parse(bytes)?;
//! let mut pool = BufferPool::new();
//! let decoder = FrameDecoder::new(false);
//!
//! decoder.decode_frame(assets.frame(0).unwrap(), &mut pool, |split| {
//!     display.draw(split.info.area, split.pixels);
//! })?;
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// Compatibility layer for no_std + alloc.
pub mod compat;

pub mod error;
pub use error::{AssetError, DecodeError, EncodeError, OutOfMemory, Result};

pub mod header;
pub use header::{ImageHeader, MAX_DIMENSION};

pub mod buffer;
pub use buffer::{BufferAllocator, HeapAllocator, MemoryCaps, ResizableBuffer};

mod palette;
pub use palette::{rgb565, PaletteCache};

pub mod pool;
pub use pool::BufferPool;

pub mod codec;
pub use codec::Encoding;

mod decoder;
pub use decoder::{FlushArea, FrameDecoder, FrameReport, SplitInfo, SplitOutput};

mod encoder;
pub use encoder::FrameEncoder;

pub mod asset;
pub use asset::{AssetEntry, AssetSource, FrameList, PackedAssets};
