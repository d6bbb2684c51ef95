//! Split-image frame decoder.

use crate::buffer::BufferAllocator;
use crate::codec::{huffman, rle, Encoding};
use crate::error::{DecodeError, Result};
use crate::header::ImageHeader;
use crate::palette::PaletteCache;
use crate::pool::BufferPool;

/// Pixel rectangle handed to the display, with exclusive `x2` / `y2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlushArea {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl FlushArea {
    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    pub fn pixel_count(&self) -> usize {
        self.width() as usize * self.height() as usize
    }
}

/// Result of decoding one split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitInfo {
    pub index: usize,
    pub encoding: Encoding,
    pub area: FlushArea,
}

/// A decoded split ready for display.
#[derive(Debug)]
pub struct SplitOutput<'a> {
    pub info: SplitInfo,
    /// RGB565 pixels, `area.pixel_count()` long.
    pub pixels: &'a [u16],
}

/// Summary of one frame decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameReport {
    pub width: u16,
    pub height: u16,
    pub splits_ok: usize,
    pub splits_failed: usize,
}

/// Decodes `_S` frames split by split into RGB565.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameDecoder {
    swap_bytes: bool,
}

impl FrameDecoder {
    /// `swap_bytes` emits byte-swapped RGB565 (big-endian panels).
    pub fn new(swap_bytes: bool) -> Self {
        Self { swap_bytes }
    }

    pub fn swap_bytes(&self) -> bool {
        self.swap_bytes
    }

    /// Decode a whole frame, passing every successfully decoded split to `sink`.
    ///
    /// A split that fails to decode is logged and skipped. The frame fails if
    /// the header is invalid, the pool cannot provide buffers, or no split
    /// decoded.
    pub fn decode_frame<A, F>(
        &self,
        data: &[u8],
        pool: &mut BufferPool<A>,
        mut sink: F,
    ) -> Result<FrameReport>
    where
        A: BufferAllocator,
        F: FnMut(SplitOutput<'_>),
    {
        let header = ImageHeader::parse(data)?;
        pool.ensure(
            header.frame_buffer_size(),
            header.decode_buffer_size(),
            header.bit_depth,
        )?;
        if pool.decode_buffer().is_none() {
            return Err(DecodeError::DecodeBufferUnavailable);
        }

        let mut report = FrameReport {
            width: header.width,
            height: header.height,
            ..Default::default()
        };

        for index in 0..header.splits as usize {
            match self.decode_split(data, &header, index, pool) {
                Ok(info) => {
                    let Some(frame) = pool.frame_buffer() else {
                        return Err(DecodeError::DecodeBufferUnavailable);
                    };
                    sink(SplitOutput {
                        info,
                        pixels: &frame[..info.area.pixel_count()],
                    });
                    report.splits_ok += 1;
                }
                Err(err) => {
                    tracing::warn!(split = index, error = %err, "split decode failed, skipping");
                    report.splits_failed += 1;
                }
            }
        }

        if report.splits_ok == 0 {
            return Err(DecodeError::AllSplitsFailed(report.splits_failed));
        }
        Ok(report)
    }

    /// Decode split `index` of `data` into the pool's frame buffer.
    ///
    /// The pool must have been prepared with [`BufferPool::ensure`] for
    /// `header`.
    pub fn decode_split<A: BufferAllocator>(
        &self,
        data: &[u8],
        header: &ImageHeader,
        index: usize,
        pool: &mut BufferPool<A>,
    ) -> Result<SplitInfo> {
        let payload = header.split_data(data, index)?;
        let Some((&tag, body)) = payload.split_first() else {
            return Err(DecodeError::Truncated {
                needed: 1,
                available: 0,
            });
        };
        let encoding = Encoding::try_from(tag)?;

        let rows = header.split_rows(index);
        let pixels = header.width as usize * rows as usize;
        let needed = if header.bit_depth == 4 {
            pixels.div_ceil(2)
        } else {
            pixels
        };

        if encoding == Encoding::Huffman {
            // RLE worst case is two bytes per output byte.
            pool.ensure_huffman(header.decode_buffer_size() * 2)?;
        }

        let bufs = pool
            .split_buffers()
            .ok_or(DecodeError::DecodeBufferUnavailable)?;
        if bufs.decode.len() < needed || bufs.frame.len() < pixels {
            return Err(DecodeError::Overflow {
                capacity: bufs.decode.len(),
            });
        }

        let written = match encoding {
            Encoding::Rle => rle::decode(body, &mut bufs.decode[..needed])?,
            Encoding::Huffman => {
                let stream_len = huffman::decode(body, bufs.huffman)?;
                rle::decode(&bufs.huffman[..stream_len], &mut bufs.decode[..needed])?
            }
        };
        if written < needed {
            return Err(DecodeError::Truncated {
                needed,
                available: written,
            });
        }

        expand_indices(
            &bufs.decode[..needed],
            &mut bufs.frame[..pixels],
            header,
            bufs.palette,
            self.swap_bytes,
        );

        let y1 = (index * header.split_height as usize) as u32;
        Ok(SplitInfo {
            index,
            encoding,
            area: FlushArea {
                x1: 0,
                y1,
                x2: header.width as u32,
                y2: y1 + rows as u32,
            },
        })
    }
}

/// Resolve palette indices into RGB565 pixels.
fn expand_indices(
    indices: &[u8],
    out: &mut [u16],
    header: &ImageHeader,
    palette: &mut PaletteCache,
    swap_bytes: bool,
) {
    if header.bit_depth == 4 {
        for (i, px) in out.iter_mut().enumerate() {
            let byte = indices[i / 2];
            let index = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
            *px = palette.resolve(index as usize, &header.palette, swap_bytes);
        }
    } else {
        for (px, &index) in out.iter_mut().zip(indices) {
            *px = palette.resolve(index as usize, &header.palette, swap_bytes);
        }
    }
}
