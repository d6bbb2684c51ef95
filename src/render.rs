//! Offline renderer for whole frames
//!
//! The `OfflineRenderer` decodes frames outside the playback thread and
//! composes their splits into a full RGB565 canvas, with no pacing or flush
//! handshake.

use crate::Result;
use anim_core::{AssetSource, BufferPool, FrameDecoder, FrameReport, ImageHeader};

/// A fully composed frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFrame {
    pub width: u16,
    pub height: u16,
    /// Row-major RGB565 pixels, `width * height` long
    pub pixels: Vec<u16>,
    pub report: FrameReport,
}

impl RenderedFrame {
    pub fn pixel(&self, x: u16, y: u16) -> Option<u16> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Pixels of row `y`.
    pub fn row(&self, y: u16) -> Option<&[u16]> {
        let width = self.width as usize;
        let start = y as usize * width;
        self.pixels.get(start..start + width)
    }
}

/// Offline frame renderer
///
/// Reuses one buffer pool across frames, like the playback thread does.
pub struct OfflineRenderer {
    decoder: FrameDecoder,
    pool: BufferPool,
}

impl OfflineRenderer {
    pub fn new(swap_bytes: bool) -> Self {
        Self {
            decoder: FrameDecoder::new(swap_bytes),
            pool: BufferPool::new(),
        }
    }

    /// Decode `data` into a full canvas. Splits that fail to decode stay black.
    pub fn render(&mut self, data: &[u8]) -> Result<RenderedFrame> {
        let header = ImageHeader::parse(data)?;
        let width = header.width as usize;
        let mut canvas = vec![0u16; width * header.height as usize];

        let report = self.decoder.decode_frame(data, &mut self.pool, |split| {
            let start = split.info.area.y1 as usize * width;
            canvas[start..start + split.pixels.len()].copy_from_slice(split.pixels);
        })?;

        Ok(RenderedFrame {
            width: report.width,
            height: report.height,
            pixels: canvas,
            report,
        })
    }

    /// Render frame `index` of `source`, or `None` if it does not exist.
    pub fn render_frame(
        &mut self,
        source: &dyn AssetSource,
        index: usize,
    ) -> Option<Result<RenderedFrame>> {
        source.frame(index).map(|data| self.render(data))
    }

    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anim_core::{rgb565, Encoding, FrameEncoder};

    fn palette() -> Vec<[u8; 4]> {
        (0..=255u8).map(|i| [0, i, 0, 0xff]).collect()
    }

    #[test]
    fn test_render_composes_splits() {
        // 3 x 5 image, split height 2: three splits, the last one row.
        let indices: Vec<u8> = (0..15).collect();
        let frame = FrameEncoder::new(8, 3, 5, 2)
            .unwrap()
            .palette(palette())
            .encoding(Encoding::Huffman)
            .encode(&indices)
            .unwrap();

        let mut renderer = OfflineRenderer::new(false);
        let rendered = renderer.render(&frame).unwrap();
        assert_eq!(rendered.report.splits_ok, 3);
        assert_eq!(rendered.pixels.len(), 15);
        assert_eq!(rendered.pixel(0, 0), Some(rgb565(0, 0, 0, false)));
        assert_eq!(rendered.pixel(2, 4), Some(rgb565(0, 14, 0, false)));
        assert_eq!(rendered.pixel(3, 0), None);
        assert_eq!(rendered.row(1).map(<[u16]>::len), Some(3));
    }

    #[test]
    fn test_render_reuses_pool() {
        let frame = FrameEncoder::new(4, 8, 8, 4)
            .unwrap()
            .encode(&[3; 64])
            .unwrap();

        let mut renderer = OfflineRenderer::new(false);
        renderer.render(&frame).unwrap();
        let allocations = renderer.pool().allocations();
        renderer.render(&frame).unwrap();
        assert_eq!(renderer.pool().allocations(), allocations);
    }

    #[test]
    fn test_render_invalid_frame() {
        let mut renderer = OfflineRenderer::new(false);
        assert!(matches!(
            renderer.render(b"not a frame"),
            Err(crate::Error::Decode(_))
        ));
    }
}
