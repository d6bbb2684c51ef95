//! Grow-only buffers with external-first allocation.

use crate::compat::Vec;
use crate::error::OutOfMemory;
use core::mem::size_of;

/// Memory region a buffer is placed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryCaps {
    /// Large, slower memory (SPIRAM / PSRAM). Tried first.
    External,
    /// Internal heap. Fallback when external allocation fails.
    Internal,
}

/// Source of backing storage for pooled buffers.
///
/// Implementations must return a vector whose `len()` equals `len`, or an
/// [`OutOfMemory`] error. They must not abort on exhaustion.
pub trait BufferAllocator {
    fn allocate<T: Copy + Default>(
        &self,
        len: usize,
        caps: MemoryCaps,
    ) -> Result<Vec<T>, OutOfMemory>;
}

/// Global-allocator backed [`BufferAllocator`].
///
/// Both regions are served from the process heap; exhaustion surfaces as a
/// `try_reserve_exact` failure instead of an abort.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeapAllocator;

impl BufferAllocator for HeapAllocator {
    fn allocate<T: Copy + Default>(
        &self,
        len: usize,
        _caps: MemoryCaps,
    ) -> Result<Vec<T>, OutOfMemory> {
        let requested = len.saturating_mul(size_of::<T>());
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| OutOfMemory { requested })?;
        data.resize(len, T::default());
        Ok(data)
    }
}

/// A buffer that only ever grows.
///
/// `capacity()` is always the length of the live allocation. Growing
/// allocates the new storage before the old one is released, so a failed
/// grow leaves the previous contents usable.
#[derive(Debug)]
pub struct ResizableBuffer<T> {
    data: Vec<T>,
    caps: Option<MemoryCaps>,
    allocations: u64,
}

impl<T: Copy + Default> ResizableBuffer<T> {
    pub const fn new() -> Self {
        Self {
            data: Vec::new(),
            caps: None,
            allocations: 0,
        }
    }

    /// Ensure at least `len` elements are available.
    ///
    /// No-op when the current capacity suffices. Otherwise tries
    /// [`MemoryCaps::External`] then [`MemoryCaps::Internal`].
    pub fn try_grow<A: BufferAllocator>(
        &mut self,
        len: usize,
        allocator: &A,
    ) -> Result<(), OutOfMemory> {
        if len <= self.data.len() {
            return Ok(());
        }

        let (data, caps) = match allocator.allocate(len, MemoryCaps::External) {
            Ok(data) => (data, MemoryCaps::External),
            Err(_) => {
                tracing::debug!(len, "external allocation failed, falling back to internal");
                (allocator.allocate(len, MemoryCaps::Internal)?, MemoryCaps::Internal)
            }
        };

        self.data = data;
        self.caps = Some(caps);
        self.allocations += 1;
        Ok(())
    }

    /// Drop the backing storage.
    pub fn release(&mut self) {
        self.data = Vec::new();
        self.caps = None;
    }

    /// Elements currently allocated.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Bytes currently allocated.
    pub fn size_bytes(&self) -> usize {
        self.data.len() * size_of::<T>()
    }

    pub fn is_allocated(&self) -> bool {
        !self.data.is_empty()
    }

    /// Region of the live allocation, if any.
    pub fn caps(&self) -> Option<MemoryCaps> {
        self.caps
    }

    /// Number of successful (re)allocations over the buffer's lifetime.
    pub fn allocations(&self) -> u64 {
        self.allocations
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }
}

impl<T: Copy + Default> Default for ResizableBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}
