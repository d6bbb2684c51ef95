//! Error types for anim-core.

use crate::compat::String;
use thiserror::Error;

/// Allocation failure while growing a pooled buffer.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Out of memory: failed to allocate {requested} bytes")]
pub struct OutOfMemory {
    pub requested: usize,
}

/// Error type for header parsing and split decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Invalid image header: {0}")]
    InvalidHeader(String),

    #[error("Truncated data: needed {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("Unsupported bit depth: {0}. Must be 4 or 8")]
    UnsupportedBitDepth(u8),

    #[error("Unsupported split encoding: {0}")]
    UnsupportedEncoding(u8),

    #[error("Decoded data overflows output buffer ({capacity} bytes)")]
    Overflow { capacity: usize },

    #[error("Invalid Huffman stream: {0}")]
    Huffman(String),

    #[error("Split {index} out of range (splits={splits})")]
    SplitOutOfRange { index: usize, splits: usize },

    #[error("Decode buffer unavailable, frame skipped")]
    DecodeBufferUnavailable,

    #[error("All {0} splits failed to decode")]
    AllSplitsFailed(usize),

    #[error(transparent)]
    OutOfMemory(#[from] OutOfMemory),
}

/// Errors from building `_S` frames.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("Unsupported bit depth: {0}. Must be 4 or 8")]
    UnsupportedBitDepth(u8),

    #[error("Invalid {name}: {value}. Must be 1..={max}")]
    InvalidDimension { name: &'static str, value: u16, max: u16 },

    #[error("Expected {expected} pixel indices, got {actual}")]
    PixelCount { expected: usize, actual: usize },

    #[error("Palette index {index} out of range for {colors} colors")]
    IndexOutOfRange { index: u8, colors: usize },

    #[error("Palette has {len} entries, bit depth allows {colors}")]
    PaletteTooLarge { len: usize, colors: usize },

    #[error("Split {split} payload is {len} bytes, exceeds the 16-bit length field")]
    SplitTooLarge { split: usize, len: usize },
}

/// Errors from packed asset parsing.
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Asset data too short: needed {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("Asset checksum mismatch: expected {expected:#010x}, computed {computed:#010x}")]
    Checksum { expected: u32, computed: u32 },

    #[error("Asset '{name}' has bad magic at offset {offset}")]
    BadMagic { name: String, offset: usize },

    #[error("Asset contains no frames")]
    Empty,

    #[cfg(feature = "std")]
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, DecodeError>;
