//! `_S` frame encoder.

use crate::codec::{huffman, rle, Encoding};
use crate::compat::{vec, Vec};
use crate::error::EncodeError;
use crate::header::MAX_DIMENSION;

const VERSION: &[u8; 6] = b"V1.00\0";

/// Builds `_S` frames from palette-indexed pixels.
///
/// # Example
///
/// ```ignore
/// let encoder = FrameEncoder::new(8, 64, 64, 16)?
///     .palette(palette)
///     .encoding(Encoding::Huffman);
/// let frame = encoder.encode(&indices)?;
/// ```
#[derive(Debug, Clone)]
pub struct FrameEncoder {
    bit_depth: u8,
    width: u16,
    height: u16,
    split_height: u16,
    palette: Vec<[u8; 4]>,
    encoding: Encoding,
}

impl FrameEncoder {
    pub fn new(
        bit_depth: u8,
        width: u16,
        height: u16,
        split_height: u16,
    ) -> Result<Self, EncodeError> {
        if bit_depth != 4 && bit_depth != 8 {
            return Err(EncodeError::UnsupportedBitDepth(bit_depth));
        }
        for (name, value) in [
            ("width", width),
            ("height", height),
            ("split_height", split_height),
        ] {
            if value == 0 || value > MAX_DIMENSION {
                return Err(EncodeError::InvalidDimension {
                    name,
                    value,
                    max: MAX_DIMENSION,
                });
            }
        }

        Ok(Self {
            bit_depth,
            width,
            height,
            split_height,
            palette: Vec::new(),
            encoding: Encoding::Rle,
        })
    }

    /// Palette entries as blue, green, red, alpha. Missing entries are black.
    pub fn palette(mut self, palette: Vec<[u8; 4]>) -> Self {
        self.palette = palette;
        self
    }

    /// Encoding used for every split (default: RLE).
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn splits(&self) -> u16 {
        self.height.div_ceil(self.split_height)
    }

    /// Encode a full `width * height` image of palette indices.
    pub fn encode(&self, indices: &[u8]) -> Result<Vec<u8>, EncodeError> {
        let colors = 1usize << self.bit_depth;
        let expected = self.width as usize * self.height as usize;
        if indices.len() != expected {
            return Err(EncodeError::PixelCount {
                expected,
                actual: indices.len(),
            });
        }
        if self.palette.len() > colors {
            return Err(EncodeError::PaletteTooLarge {
                len: self.palette.len(),
                colors,
            });
        }
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= colors) {
            return Err(EncodeError::IndexOutOfRange { index, colors });
        }

        let rows_per_split = self.split_height as usize;
        let payloads = indices
            .chunks(self.width as usize * rows_per_split)
            .enumerate()
            .map(|(split, rows)| {
                let payload = self.encode_split(rows);
                if payload.len() > u16::MAX as usize {
                    return Err(EncodeError::SplitTooLarge {
                        split,
                        len: payload.len(),
                    });
                }
                Ok(payload)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut out = Vec::new();
        out.extend_from_slice(b"_S\0");
        out.extend_from_slice(VERSION);
        out.push(self.bit_depth);
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        out.extend_from_slice(&self.splits().to_le_bytes());
        out.extend_from_slice(&self.split_height.to_le_bytes());
        for payload in &payloads {
            out.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        }
        for i in 0..colors {
            out.extend_from_slice(&self.palette.get(i).copied().unwrap_or_default());
        }
        for payload in &payloads {
            out.extend_from_slice(payload);
        }
        Ok(out)
    }

    fn encode_split(&self, indices: &[u8]) -> Vec<u8> {
        let packed = if self.bit_depth == 4 {
            indices
                .chunks(2)
                .map(|pair| (pair[0] << 4) | pair.get(1).copied().unwrap_or(0))
                .collect()
        } else {
            indices.to_vec()
        };

        let stream = rle::encode(&packed);
        let mut payload = vec![u8::from(self.encoding)];
        match self.encoding {
            Encoding::Rle => payload.extend_from_slice(&stream),
            Encoding::Huffman => payload.extend_from_slice(&huffman::encode(&stream)),
        }
        payload
    }
}
