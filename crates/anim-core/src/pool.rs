//! Reusable decode buffers owned by a single player.
//!
//! The pool holds three grow-only buffers plus the palette cache:
//!
//! - frame buffer: RGB565 output for one split
//! - decode buffer: indexed pixels for one split
//! - huffman buffer: RLE stream produced by the Huffman stage
//!
//! Buffers are reused while large enough and released only when the pool
//! is dropped.

use crate::buffer::{BufferAllocator, HeapAllocator, MemoryCaps, ResizableBuffer};
use crate::error::OutOfMemory;
use crate::palette::PaletteCache;

/// Mutable views of every pooled buffer for one split decode.
pub struct SplitBuffers<'a> {
    pub frame: &'a mut [u16],
    pub decode: &'a mut [u8],
    pub huffman: &'a mut [u8],
    pub palette: &'a mut PaletteCache,
}

/// Buffer pool for frame decoding.
#[derive(Debug)]
pub struct BufferPool<A: BufferAllocator = HeapAllocator> {
    allocator: A,
    frame: ResizableBuffer<u16>,
    decode: ResizableBuffer<u8>,
    huffman: ResizableBuffer<u8>,
    palette: PaletteCache,
}

impl BufferPool<HeapAllocator> {
    pub fn new() -> Self {
        Self::with_allocator(HeapAllocator)
    }
}

impl Default for BufferPool<HeapAllocator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: BufferAllocator> BufferPool<A> {
    pub fn with_allocator(allocator: A) -> Self {
        Self {
            allocator,
            frame: ResizableBuffer::new(),
            decode: ResizableBuffer::new(),
            huffman: ResizableBuffer::new(),
            palette: PaletteCache::new(),
        }
    }

    /// Make the pool ready for a frame.
    ///
    /// `frame_size` and `decode_size` are in bytes, `palette_depth` is the
    /// bit depth (4 or 8). The decode buffer grows first. If it cannot grow
    /// the call still succeeds and [`decode_buffer`](Self::decode_buffer)
    /// returns `None`, which tells the caller to skip the frame. A frame
    /// buffer failure is an error; a decode buffer grown by this call is
    /// released again before returning.
    pub fn ensure(
        &mut self,
        frame_size: usize,
        decode_size: usize,
        palette_depth: u8,
    ) -> Result<(), OutOfMemory> {
        let decode_before = self.decode.allocations();
        if let Err(err) = self.decode.try_grow(decode_size, &self.allocator) {
            tracing::warn!(
                requested = err.requested,
                "decode buffer allocation failed, frame will be skipped"
            );
            self.decode.release();
            return Ok(());
        }
        let decode_grew = self.decode.allocations() != decode_before;

        let frame_pixels = frame_size.div_ceil(2);
        if let Err(err) = self.frame.try_grow(frame_pixels, &self.allocator) {
            tracing::error!(
                requested = err.requested,
                "frame buffer allocation failed"
            );
            if decode_grew {
                self.decode.release();
            }
            return Err(err);
        }

        self.palette.reset(1usize << palette_depth.min(8));
        Ok(())
    }

    /// Make the huffman buffer hold at least `len` bytes.
    pub fn ensure_huffman(&mut self, len: usize) -> Result<(), OutOfMemory> {
        self.huffman.try_grow(len, &self.allocator)
    }

    /// Borrow every buffer at once, or `None` if the decode buffer is missing.
    pub fn split_buffers(&mut self) -> Option<SplitBuffers<'_>> {
        if !self.decode.is_allocated() || !self.frame.is_allocated() {
            return None;
        }
        Some(SplitBuffers {
            frame: self.frame.as_mut_slice(),
            decode: self.decode.as_mut_slice(),
            huffman: self.huffman.as_mut_slice(),
            palette: &mut self.palette,
        })
    }

    pub fn frame_buffer(&self) -> Option<&[u16]> {
        self.frame.is_allocated().then(|| self.frame.as_slice())
    }

    pub fn decode_buffer(&self) -> Option<&[u8]> {
        self.decode.is_allocated().then(|| self.decode.as_slice())
    }

    pub fn palette(&self) -> &PaletteCache {
        &self.palette
    }

    /// Frame buffer capacity in bytes.
    pub fn frame_buffer_size(&self) -> usize {
        self.frame.size_bytes()
    }

    /// Decode buffer capacity in bytes.
    pub fn decode_buffer_size(&self) -> usize {
        self.decode.size_bytes()
    }

    /// Huffman buffer capacity in bytes.
    pub fn huffman_buffer_size(&self) -> usize {
        self.huffman.size_bytes()
    }

    pub fn frame_buffer_caps(&self) -> Option<MemoryCaps> {
        self.frame.caps()
    }

    /// Total successful allocations across all pooled buffers.
    pub fn allocations(&self) -> u64 {
        self.frame.allocations() + self.decode.allocations() + self.huffman.allocations()
    }

    /// Release every buffer.
    pub fn release(&mut self) {
        self.frame.release();
        self.decode.release();
        self.huffman.release();
        self.palette.reset(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::tests::LimitedAllocator;
    use crate::header::{decode_buffer_size, frame_buffer_size};
    use proptest::prelude::*;

    #[test]
    fn test_ensure_allocates() {
        let mut pool = BufferPool::new();
        pool.ensure(100 * 10 * 2, 100 * 10, 8).unwrap();
        assert_eq!(pool.frame_buffer_size(), 2000);
        assert_eq!(pool.decode_buffer_size(), 1000);
        assert_eq!(pool.palette().len(), 256);
        assert!(pool.palette().is_cold());
        assert_eq!(pool.allocations(), 2);
    }

    #[test]
    fn test_ensure_reuses_when_not_growing() {
        let mut pool = BufferPool::new();
        pool.ensure(4000, 2000, 8).unwrap();
        let allocations = pool.allocations();

        pool.ensure(4000, 2000, 8).unwrap();
        pool.ensure(1000, 500, 4).unwrap();
        assert_eq!(pool.allocations(), allocations);
        assert_eq!(pool.frame_buffer_size(), 4000);
        assert_eq!(pool.palette().len(), 16);
    }

    #[test]
    fn test_palette_reset_on_reuse() {
        let mut pool = BufferPool::new();
        pool.ensure(64, 32, 4).unwrap();
        let palette = [[0u8, 0, 0xff, 0xff]; 16];
        {
            let bufs = pool.split_buffers().unwrap();
            bufs.palette.resolve(5, &palette, false);
        }
        assert!(!pool.palette().is_cold());

        pool.ensure(64, 32, 4).unwrap();
        assert!(pool.palette().is_cold());
    }

    #[test]
    fn test_decode_failure_is_tolerated() {
        let alloc = LimitedAllocator::new(100, false);
        let mut pool = BufferPool::with_allocator(alloc);
        assert!(pool.ensure(50, 200, 8).is_ok());
        assert!(pool.decode_buffer().is_none());
        assert!(pool.split_buffers().is_none());
    }

    #[test]
    fn test_frame_failure_rolls_back_decode() {
        let alloc = LimitedAllocator::new(300, false);
        let mut pool = BufferPool::with_allocator(alloc);
        let err = pool.ensure(400, 200, 8).unwrap_err();
        assert_eq!(err.requested, 400);
        assert!(pool.decode_buffer().is_none());
        assert_eq!(pool.decode_buffer_size(), 0);
    }

    #[test]
    fn test_frame_failure_keeps_reused_decode() {
        let alloc = LimitedAllocator::new(300, false);
        let mut pool = BufferPool::with_allocator(alloc);
        pool.ensure(200, 100, 8).unwrap();

        // Decode buffer already large enough; only the frame buffer grows.
        let err = pool.ensure(400, 100, 8);
        assert!(err.is_err());
        assert_eq!(pool.decode_buffer_size(), 100);
        assert_eq!(pool.frame_buffer_size(), 200);
    }

    #[test]
    fn test_huffman_grows_on_demand() {
        let mut pool = BufferPool::new();
        pool.ensure_huffman(128).unwrap();
        assert_eq!(pool.huffman_buffer_size(), 128);
        pool.ensure_huffman(64).unwrap();
        assert_eq!(pool.huffman_buffer_size(), 128);
    }

    #[test]
    fn test_largest_split_sizes() {
        assert_eq!(frame_buffer_size(2000, 2000), 8_000_000);
        assert_eq!(decode_buffer_size(2000, 2000, 8), 4_000_000);
        assert_eq!(decode_buffer_size(1999, 1, 4), 1000);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_sizes_match_dimensions(
            width in 1u16..=2000,
            split_height in 1u16..=2000,
            eight_bit in any::<bool>(),
        ) {
            let depth = if eight_bit { 8 } else { 4 };
            let frame = frame_buffer_size(width, split_height);
            let decode = decode_buffer_size(width, split_height, depth);
            prop_assert_eq!(frame, width as usize * split_height as usize * 2);

            let mut pool = BufferPool::new();
            pool.ensure(frame, decode, depth).unwrap();
            prop_assert_eq!(pool.frame_buffer_size(), frame);
            prop_assert_eq!(pool.decode_buffer_size(), decode);

            let allocations = pool.allocations();
            pool.ensure(frame, decode, depth).unwrap();
            prop_assert_eq!(pool.allocations(), allocations);
        }

        #[test]
        fn prop_size_arithmetic_is_exact(
            width in 1u16..=2000,
            split_height in 1u16..=2000,
        ) {
            let pixels = (width as usize).checked_mul(split_height as usize);
            let bytes = pixels.and_then(|p| p.checked_mul(2));
            prop_assert_eq!(Some(frame_buffer_size(width, split_height)), bytes);
            prop_assert_eq!(Some(decode_buffer_size(width, split_height, 8)), pixels);
            prop_assert_eq!(
                Some(decode_buffer_size(width, split_height, 4)),
                pixels.map(|p| p.div_ceil(2))
            );
        }
    }
}
