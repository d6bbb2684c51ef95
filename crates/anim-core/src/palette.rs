//! Palette index to RGB565 resolution with a per-frame cache.

use crate::compat::{vec, Vec};

/// Pack 8-bit channels into RGB565, optionally byte-swapped for SPI panels.
#[inline]
pub fn rgb565(r: u8, g: u8, b: u8, swap_bytes: bool) -> u16 {
    let color = ((r as u16 >> 3) << 11) | ((g as u16 >> 2) << 5) | (b as u16 >> 3);
    if swap_bytes {
        color.swap_bytes()
    } else {
        color
    }
}

/// Lazily resolved palette.
///
/// Entries start unresolved and are computed from the raw palette on first
/// use. [`reset`](Self::reset) makes every entry unresolved again.
#[derive(Debug, Default)]
pub struct PaletteCache {
    entries: Vec<Option<u16>>,
    misses: u64,
}

impl PaletteCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resize to `len` entries and mark all of them unresolved.
    pub fn reset(&mut self, len: usize) {
        if self.entries.len() == len {
            self.entries.fill(None);
        } else {
            self.entries = vec![None; len];
        }
    }

    /// Resolve `index` against `palette` (B, G, R, A entries).
    #[inline]
    pub fn resolve(&mut self, index: usize, palette: &[[u8; 4]], swap_bytes: bool) -> u16 {
        if let Some(Some(color)) = self.entries.get(index) {
            return *color;
        }

        self.misses += 1;
        let color = palette
            .get(index)
            .map(|&[b, g, r, _]| rgb565(r, g, b, swap_bytes))
            .unwrap_or(0);
        if let Some(slot) = self.entries.get_mut(index) {
            *slot = Some(color);
        }
        color
    }

    /// Cached value for `index`, if resolved.
    pub fn get(&self, index: usize) -> Option<u16> {
        self.entries.get(index).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when no entry has been resolved since the last reset.
    pub fn is_cold(&self) -> bool {
        self.entries.iter().all(Option::is_none)
    }

    /// Lifetime count of cache misses (palette computations).
    pub fn misses(&self) -> u64 {
        self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn palette() -> Vec<[u8; 4]> {
        (0..16u8).map(|i| [i * 16, i * 8, i * 4, 0xff]).collect()
    }

    #[test]
    fn test_rgb565() {
        assert_eq!(rgb565(0xff, 0xff, 0xff, false), 0xffff);
        assert_eq!(rgb565(0xff, 0, 0, false), 0xf800);
        assert_eq!(rgb565(0, 0xff, 0, false), 0x07e0);
        assert_eq!(rgb565(0, 0, 0xff, false), 0x001f);
        assert_eq!(rgb565(0xff, 0, 0, true), 0x00f8);
    }

    #[test]
    fn test_resolve_caches() {
        let pal = palette();
        let mut cache = PaletteCache::new();
        cache.reset(16);
        assert!(cache.is_cold());

        let first = cache.resolve(3, &pal, false);
        assert_eq!(cache.misses(), 1);
        let second = cache.resolve(3, &pal, false);
        assert_eq!(first, second);
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.get(3), Some(first));
    }

    #[test]
    fn test_reset_makes_cold() {
        let pal = palette();
        let mut cache = PaletteCache::new();
        cache.reset(16);
        cache.resolve(1, &pal, false);
        cache.resolve(2, &pal, false);
        assert!(!cache.is_cold());

        cache.reset(16);
        assert!(cache.is_cold());
        assert_eq!(cache.len(), 16);

        cache.reset(256);
        assert!(cache.is_cold());
        assert_eq!(cache.len(), 256);
    }

    #[test]
    fn test_palette_channel_order() {
        // Stored as B, G, R, A.
        let pal = [[0x00, 0x00, 0xff, 0xff]];
        let mut cache = PaletteCache::new();
        cache.reset(1);
        assert_eq!(cache.resolve(0, &pal, false), 0xf800);
    }
}
