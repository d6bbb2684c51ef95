//! Split-image (`_S`) header parsing.
//!
//! Layout (little-endian):
//!
//! ```text
//! 0   "_S"            magic
//! 2   u8              reserved
//! 3   [u8; 6]         version
//! 9   u8              bit depth (4 or 8)
//! 10  u16             width
//! 12  u16             height
//! 14  u16             splits
//! 16  u16             split height
//! 18  [u16; splits]   compressed split lengths
//! ..  [[u8; 4]; 1 << bit_depth]   palette (B, G, R, A)
//! ..                  split payloads
//! ```

use crate::compat::{format, Vec};
use crate::error::{DecodeError, Result};

/// Upper bound on width, height and split height.
pub const MAX_DIMENSION: u16 = 2000;

const MAGIC: &[u8; 2] = b"_S";
const FIXED_LEN: usize = 18;
const PALETTE_ENTRY_LEN: usize = 4;

/// Parsed per-frame metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHeader {
    pub version: [u8; 6],
    pub bit_depth: u8,
    pub width: u16,
    pub height: u16,
    pub splits: u16,
    pub split_height: u16,
    pub split_lengths: Vec<u16>,
    /// Palette entries as stored: blue, green, red, alpha.
    pub palette: Vec<[u8; 4]>,
    /// Offset of the first split payload from the start of the frame data.
    pub data_offset: usize,
}

impl ImageHeader {
    /// Parse and validate a header from the start of a frame blob.
    pub fn parse(data: &[u8]) -> Result<Self> {
        need(data, FIXED_LEN)?;

        if &data[0..2] != MAGIC {
            return Err(DecodeError::InvalidHeader(format!(
                "bad magic {:02x}{:02x}",
                data[0], data[1]
            )));
        }

        let mut version = [0u8; 6];
        version.copy_from_slice(&data[3..9]);

        let bit_depth = data[9];
        if bit_depth != 4 && bit_depth != 8 {
            return Err(DecodeError::UnsupportedBitDepth(bit_depth));
        }

        let width = read_u16(data, 10);
        let height = read_u16(data, 12);
        let splits = read_u16(data, 14);
        let split_height = read_u16(data, 16);

        check_dimension("width", width)?;
        check_dimension("height", height)?;
        check_dimension("split_height", split_height)?;

        let expected_splits = height.div_ceil(split_height);
        if splits != expected_splits {
            return Err(DecodeError::InvalidHeader(format!(
                "splits={splits} but height {height} / split_height {split_height} needs {expected_splits}"
            )));
        }

        let lengths_end = FIXED_LEN + splits as usize * 2;
        need(data, lengths_end)?;
        let split_lengths: Vec<u16> = (0..splits as usize)
            .map(|i| read_u16(data, FIXED_LEN + i * 2))
            .collect();

        let num_colors = 1usize << bit_depth;
        let palette_end = lengths_end + num_colors * PALETTE_ENTRY_LEN;
        need(data, palette_end)?;
        let palette = data[lengths_end..palette_end]
            .chunks_exact(PALETTE_ENTRY_LEN)
            .map(|c| [c[0], c[1], c[2], c[3]])
            .collect();

        let payload: usize = split_lengths.iter().map(|&l| l as usize).sum();
        need(data, palette_end + payload)?;

        Ok(Self {
            version,
            bit_depth,
            width,
            height,
            splits,
            split_height,
            split_lengths,
            palette,
            data_offset: palette_end,
        })
    }

    pub fn num_colors(&self) -> usize {
        1 << self.bit_depth
    }

    /// Pixels in one full split.
    pub fn split_pixels(&self) -> usize {
        self.width as usize * self.split_height as usize
    }

    /// Bytes needed for one split of RGB565 output.
    pub fn frame_buffer_size(&self) -> usize {
        frame_buffer_size(self.width, self.split_height)
    }

    /// Bytes needed for one split of indexed pixels at this bit depth.
    pub fn decode_buffer_size(&self) -> usize {
        decode_buffer_size(self.width, self.split_height, self.bit_depth)
    }

    /// Rows actually covered by split `index`; the last split may be short.
    pub fn split_rows(&self, index: usize) -> u16 {
        let start = index * self.split_height as usize;
        let remaining = (self.height as usize).saturating_sub(start);
        remaining.min(self.split_height as usize) as u16
    }

    /// Compressed payload of split `index` within the frame blob.
    pub fn split_data<'a>(&self, data: &'a [u8], index: usize) -> Result<&'a [u8]> {
        if index >= self.split_lengths.len() {
            return Err(DecodeError::SplitOutOfRange {
                index,
                splits: self.split_lengths.len(),
            });
        }
        let start = self.data_offset
            + self.split_lengths[..index]
                .iter()
                .map(|&l| l as usize)
                .sum::<usize>();
        let end = start + self.split_lengths[index] as usize;
        need(data, end)?;
        Ok(&data[start..end])
    }

    /// Version string with trailing NULs removed.
    pub fn version_str(&self) -> &str {
        let len = self
            .version
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.version.len());
        core::str::from_utf8(&self.version[..len]).unwrap_or("")
    }
}

/// RGB565 bytes for a `width` x `split_height` split.
pub fn frame_buffer_size(width: u16, split_height: u16) -> usize {
    width as usize * split_height as usize * 2
}

/// Indexed-pixel bytes for a `width` x `split_height` split.
pub fn decode_buffer_size(width: u16, split_height: u16, bit_depth: u8) -> usize {
    let pixels = width as usize * split_height as usize;
    if bit_depth == 4 {
        pixels.div_ceil(2)
    } else {
        pixels
    }
}

fn check_dimension(name: &str, value: u16) -> Result<()> {
    if value == 0 || value > MAX_DIMENSION {
        return Err(DecodeError::InvalidHeader(format!(
            "{name} {value} out of range (1-{MAX_DIMENSION})"
        )));
    }
    Ok(())
}

#[inline]
fn read_u16(data: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([data[at], data[at + 1]])
}

#[inline]
fn need(data: &[u8], needed: usize) -> Result<()> {
    if data.len() < needed {
        return Err(DecodeError::Truncated {
            needed,
            available: data.len(),
        });
    }
    Ok(())
}
