//! On-disk page layouts shared by the B-tree SST format and the legacy
//! flat format.
//!
//! Every SST is a sequence of `PAGE_SIZE`-byte pages. Page 0 is always a
//! metadata page, written last by the writer (everything else is already
//! on disk by the time its contents are known) but always read first by
//! the reader. All multi-byte integers are little-endian.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use kvcore::{Key, Value, INVALID, KEYS_PER_INTERNAL_PAGE, KV_PER_LEAF_PAGE, PAGE_SIZE};
use std::io::{self, Read, Write};

/// Identifies a page-0 metadata page for the paged B-tree format.
pub const BTREE_MAGIC: u32 = 0x4254_5330; // "BTS0"

/// Identifies a page-0 metadata page for the flat binary-search format.
pub const FLAT_MAGIC: u32 = 0x464c_5430; // "FLT0"

/// Metadata page written at page index 0 of a B-tree SST.
///
/// `level_start[i]` is the absolute page index where level `i` begins;
/// `level_start[0]` is the root, `level_start.last()` is the leaf level.
/// Every level's pages are filled to capacity except possibly the last
/// page of that level, so no per-page counts need to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BTreeMetadata {
    pub level_start: Vec<u64>,
    pub leaf_page_count: u64,
    pub total_entries: u64,
    pub bloom_offset: Option<u64>,
    pub bloom_len: u64,
}

impl BTreeMetadata {
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u32::<LittleEndian>(BTREE_MAGIC)?;
        w.write_u32::<LittleEndian>(self.level_start.len() as u32)?;
        w.write_u64::<LittleEndian>(self.leaf_page_count)?;
        w.write_u64::<LittleEndian>(self.total_entries)?;
        w.write_u64::<LittleEndian>(self.bloom_offset.unwrap_or(u64::MAX))?;
        w.write_u64::<LittleEndian>(self.bloom_len)?;
        for &p in &self.level_start {
            w.write_u64::<LittleEndian>(p)?;
        }
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let magic = r.read_u32::<LittleEndian>()?;
        if magic != BTREE_MAGIC {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("bad B-tree SST magic: {magic:#x}"),
            ));
        }
        let num_levels = r.read_u32::<LittleEndian>()? as usize;
        let leaf_page_count = r.read_u64::<LittleEndian>()?;
        let total_entries = r.read_u64::<LittleEndian>()?;
        let bloom_offset_raw = r.read_u64::<LittleEndian>()?;
        let bloom_len = r.read_u64::<LittleEndian>()?;
        let bloom_offset = if bloom_offset_raw == u64::MAX {
            None
        } else {
            Some(bloom_offset_raw)
        };

        let mut level_start = Vec::with_capacity(num_levels);
        for _ in 0..num_levels {
            level_start.push(r.read_u64::<LittleEndian>()?);
        }

        Ok(Self {
            level_start,
            leaf_page_count,
            total_entries,
            bloom_offset,
            bloom_len,
        })
    }

    /// Depth of the tree (number of levels including the leaf level).
    #[must_use]
    pub fn num_levels(&self) -> usize {
        self.level_start.len()
    }

    /// Page count of level `level`, derived from the next level's start
    /// (or `leaf_page_count` for the last level).
    #[must_use]
    pub fn pages_in_level(&self, level: usize) -> u64 {
        if level + 1 < self.level_start.len() {
            self.level_start[level + 1] - self.level_start[level]
        } else {
            self.leaf_page_count
        }
    }
}

/// Metadata page written at page index 0 of a flat binary-search SST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatMetadata {
    pub page_count: u64,
    pub total_entries: u64,
}

impl FlatMetadata {
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u32::<LittleEndian>(FLAT_MAGIC)?;
        w.write_u32::<LittleEndian>(0)?; // reserved, keeps header shape consistent
        w.write_u64::<LittleEndian>(self.page_count)?;
        w.write_u64::<LittleEndian>(self.total_entries)?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let magic = r.read_u32::<LittleEndian>()?;
        if magic != FLAT_MAGIC {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("bad flat SST magic: {magic:#x}"),
            ));
        }
        let _reserved = r.read_u32::<LittleEndian>()?;
        let page_count = r.read_u64::<LittleEndian>()?;
        let total_entries = r.read_u64::<LittleEndian>()?;
        Ok(Self {
            page_count,
            total_entries,
        })
    }
}

/// Encodes a leaf page: up to `KV_PER_LEAF_PAGE` `(key, value)` pairs,
/// ascending, zero-padded to `PAGE_SIZE`.
pub fn encode_leaf_page(entries: &[(Key, Value)]) -> [u8; PAGE_SIZE] {
    assert!(entries.len() <= KV_PER_LEAF_PAGE);
    let mut page = [0u8; PAGE_SIZE];
    let mut cursor = &mut page[..];
    for &(k, v) in entries {
        cursor.write_u64::<LittleEndian>(k).unwrap();
        cursor.write_u64::<LittleEndian>(v).unwrap();
    }
    page
}

/// Decodes the first `count` KV pairs from a leaf page.
pub fn decode_leaf_page(page: &[u8], count: usize) -> Vec<(Key, Value)> {
    let mut out = Vec::with_capacity(count);
    let mut cursor = page;
    for _ in 0..count {
        let k = cursor.read_u64::<LittleEndian>().unwrap();
        let v = cursor.read_u64::<LittleEndian>().unwrap();
        out.push((k, v));
    }
    out
}

/// Encodes an internal (fence-key) page: up to `KEYS_PER_INTERNAL_PAGE`
/// keys, ascending, padded with [`INVALID`] (never a meaningful fence key
/// position beyond `count`, since the reader always knows `count` from
/// the metadata page and never reads padding).
pub fn encode_internal_page(keys: &[Key]) -> [u8; PAGE_SIZE] {
    assert!(keys.len() <= KEYS_PER_INTERNAL_PAGE);
    let mut page = [0u8; PAGE_SIZE];
    let mut cursor = &mut page[..];
    for &k in keys {
        cursor.write_u64::<LittleEndian>(k).unwrap();
    }
    for _ in keys.len()..KEYS_PER_INTERNAL_PAGE {
        cursor.write_u64::<LittleEndian>(INVALID).unwrap();
    }
    page
}

/// Decodes the first `count` fence keys from an internal page.
pub fn decode_internal_page(page: &[u8], count: usize) -> Vec<Key> {
    let mut out = Vec::with_capacity(count);
    let mut cursor = page;
    for _ in 0..count {
        out.push(cursor.read_u64::<LittleEndian>().unwrap());
    }
    out
}
