//! Frame providers.
//!
//! [`PackedAssets`] reads the packed asset container produced by the asset
//! packer:
//!
//! ```text
//! u32  total_files
//! u32  checksum      wrapping sum of every byte in the data region
//! u32  table_len     bytes of the file table
//! table: total_files x { name: [u8; 32], size: u32, offset: u32, width: u16, height: u16 }
//! data region: per file, 0x5A 0x5A magic at `offset`, then `size` bytes
//! ```

use crate::compat::{String, Vec};
use crate::error::AssetError;
use crate::header::ImageHeader;

const PREAMBLE_LEN: usize = 12;
const NAME_LEN: usize = 32;
const ENTRY_LEN: usize = NAME_LEN + 4 + 4 + 2 + 2;
const FILE_MAGIC: [u8; 2] = [0x5a, 0x5a];

/// Indexed access to animation frames.
pub trait AssetSource: Send + Sync {
    fn frame_count(&self) -> usize;

    /// Encoded frame data, or `None` if `index` is out of range.
    fn frame(&self, index: usize) -> Option<&[u8]>;

    /// Index of the last frame, or `None` for an empty source.
    fn last_frame(&self) -> Option<usize> {
        self.frame_count().checked_sub(1)
    }
}

/// In-memory list of encoded frames.
#[derive(Debug, Clone, Default)]
pub struct FrameList {
    frames: Vec<Vec<u8>>,
}

impl FrameList {
    pub fn new(frames: Vec<Vec<u8>>) -> Self {
        Self { frames }
    }

    pub fn push(&mut self, frame: Vec<u8>) {
        self.frames.push(frame);
    }
}

impl AssetSource for FrameList {
    fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn frame(&self, index: usize) -> Option<&[u8]> {
        self.frames.get(index).map(Vec::as_slice)
    }
}

/// One file in a packed container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetEntry {
    pub name: String,
    pub size: u32,
    /// Offset of the file magic within the data region.
    pub offset: u32,
    pub width: u16,
    pub height: u16,
}

/// Parsed packed asset container.
#[derive(Debug, Clone)]
pub struct PackedAssets {
    data: Vec<u8>,
    data_start: usize,
    entries: Vec<AssetEntry>,
}

impl PackedAssets {
    /// Parse and verify a packed container.
    pub fn parse(data: Vec<u8>) -> Result<Self, AssetError> {
        need(&data, PREAMBLE_LEN)?;
        let total_files = read_u32(&data, 0) as usize;
        let checksum = read_u32(&data, 4);
        let table_len = read_u32(&data, 8) as usize;

        if total_files == 0 {
            return Err(AssetError::Empty);
        }

        let table_needed = total_files.saturating_mul(ENTRY_LEN);
        let data_start = PREAMBLE_LEN + table_len.max(table_needed);
        need(&data, data_start)?;

        let computed = data[data_start..]
            .iter()
            .fold(0u32, |acc, &b| acc.wrapping_add(b as u32));
        if computed != checksum {
            return Err(AssetError::Checksum {
                expected: checksum,
                computed,
            });
        }

        let mut entries = Vec::with_capacity(total_files);
        for i in 0..total_files {
            let at = PREAMBLE_LEN + i * ENTRY_LEN;
            let name_bytes = &data[at..at + NAME_LEN];
            let name_len = name_bytes.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
            let name = String::from_utf8_lossy(&name_bytes[..name_len]).into_owned();

            let entry = AssetEntry {
                name,
                size: read_u32(&data, at + NAME_LEN),
                offset: read_u32(&data, at + NAME_LEN + 4),
                width: read_u16(&data, at + NAME_LEN + 8),
                height: read_u16(&data, at + NAME_LEN + 10),
            };

            let start = data_start + entry.offset as usize;
            need(&data, start + FILE_MAGIC.len() + entry.size as usize)?;
            if data[start..start + FILE_MAGIC.len()] != FILE_MAGIC {
                return Err(AssetError::BadMagic {
                    name: entry.name,
                    offset: entry.offset as usize,
                });
            }
            entries.push(entry);
        }

        tracing::debug!(files = total_files, bytes = data.len(), "parsed packed assets");
        Ok(Self {
            data,
            data_start,
            entries,
        })
    }

    /// Read and parse a packed container from disk.
    #[cfg(feature = "std")]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, AssetError> {
        let data = std::fs::read(path)?;
        Self::parse(data)
    }

    /// Build a packed container from named files.
    ///
    /// Width and height are taken from each file's `_S` header when present.
    pub fn pack<'a>(files: impl IntoIterator<Item = (&'a str, &'a [u8])>) -> Vec<u8> {
        let files: Vec<(&str, &[u8])> = files.into_iter().collect();

        let mut table = Vec::with_capacity(files.len() * ENTRY_LEN);
        let mut region = Vec::new();
        for (name, content) in &files {
            let mut name_field = [0u8; NAME_LEN];
            let n = name.len().min(NAME_LEN - 1);
            name_field[..n].copy_from_slice(&name.as_bytes()[..n]);

            let (width, height) = ImageHeader::parse(content)
                .map(|h| (h.width, h.height))
                .unwrap_or((0, 0));

            table.extend_from_slice(&name_field);
            table.extend_from_slice(&(content.len() as u32).to_le_bytes());
            table.extend_from_slice(&(region.len() as u32).to_le_bytes());
            table.extend_from_slice(&width.to_le_bytes());
            table.extend_from_slice(&height.to_le_bytes());

            region.extend_from_slice(&FILE_MAGIC);
            region.extend_from_slice(content);
        }

        let checksum = region.iter().fold(0u32, |acc, &b| acc.wrapping_add(b as u32));
        let mut out = Vec::with_capacity(PREAMBLE_LEN + table.len() + region.len());
        out.extend_from_slice(&(files.len() as u32).to_le_bytes());
        out.extend_from_slice(&checksum.to_le_bytes());
        out.extend_from_slice(&(table.len() as u32).to_le_bytes());
        out.extend_from_slice(&table);
        out.extend_from_slice(&region);
        out
    }

    pub fn entries(&self) -> &[AssetEntry] {
        &self.entries
    }

    /// Look up a file by name.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name)
    }
}

impl AssetSource for PackedAssets {
    fn frame_count(&self) -> usize {
        self.entries.len()
    }

    fn frame(&self, index: usize) -> Option<&[u8]> {
        let entry = self.entries.get(index)?;
        let start = self.data_start + entry.offset as usize + FILE_MAGIC.len();
        self.data.get(start..start + entry.size as usize)
    }
}

fn read_u32(data: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

fn read_u16(data: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([data[at], data[at + 1]])
}

fn need(data: &[u8], needed: usize) -> Result<(), AssetError> {
    if data.len() < needed {
        return Err(AssetError::Truncated {
            needed,
            available: data.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compat::vec;

    #[test]
    fn test_pack_and_parse() {
        let a = vec![1u8, 2, 3];
        let b = vec![9u8; 10];
        let packed = PackedAssets::pack([("a.sbmp", a.as_slice()), ("b.sbmp", b.as_slice())]);
        let assets = PackedAssets::parse(packed).unwrap();

        assert_eq!(assets.frame_count(), 2);
        assert_eq!(assets.last_frame(), Some(1));
        assert_eq!(assets.frame(0), Some(a.as_slice()));
        assert_eq!(assets.frame(1), Some(b.as_slice()));
        assert_eq!(assets.frame(2), None);
        assert_eq!(assets.find("b.sbmp"), Some(1));
        assert_eq!(assets.entries()[0].size, 3);
    }

    #[test]
    fn test_checksum_mismatch() {
        let mut packed = PackedAssets::pack([("a", [1u8, 2].as_slice())]);
        let last = packed.len() - 1;
        packed[last] ^= 0xff;
        assert!(matches!(
            PackedAssets::parse(packed),
            Err(AssetError::Checksum { .. })
        ));
    }

    #[test]
    fn test_bad_magic() {
        let mut packed = PackedAssets::pack([("a", [1u8, 2].as_slice())]);
        let magic_at = PREAMBLE_LEN + ENTRY_LEN;
        packed[magic_at] = 0x00;
        packed[magic_at + 2] = packed[magic_at + 2].wrapping_add(0x5a);
        assert!(matches!(
            PackedAssets::parse(packed),
            Err(AssetError::BadMagic { .. })
        ));
    }

    #[test]
    fn test_empty_and_truncated() {
        assert!(matches!(
            PackedAssets::parse(vec![0u8; 12]),
            Err(AssetError::Empty)
        ));
        assert!(matches!(
            PackedAssets::parse(vec![1, 0, 0, 0]),
            Err(AssetError::Truncated { .. })
        ));
    }

    #[test]
    fn test_frame_list() {
        let mut list = FrameList::default();
        assert_eq!(list.last_frame(), None);
        list.push(vec![1]);
        list.push(vec![2]);
        assert_eq!(list.frame_count(), 2);
        assert_eq!(list.frame(1), Some([2u8].as_slice()));
    }

    #[test]
    #[cfg(feature = "std")]
    fn test_open_from_file() {
        use std::io::Write;

        let packed = PackedAssets::pack([("frame", [7u8; 4].as_slice())]);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&packed).unwrap();

        let assets = PackedAssets::open(file.path()).unwrap();
        assert_eq!(assets.frame(0), Some([7u8; 4].as_slice()));
    }
}
