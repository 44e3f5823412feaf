//! Readers for both on-disk SST formats.
//!
//! Neither [`BTreeSstReader`] nor [`FlatSstReader`] keeps a persistent
//! file handle. `open` reads just
//! the page-0 metadata (and bloom filter, if present) once and closes the
//! file immediately; every `find`/`scan` afterwards opens the file fresh
//! on a cache miss, through [`pagecache::BufferPool`], and the handle
//! never outlives that single page read. No public operation here holds
//! a file descriptor past its own return.

use crate::format::{
    decode_internal_page, decode_leaf_page, BTreeMetadata, FlatMetadata,
};
use anyhow::{Context, Result};
use bloom::BloomFilter;
use kvcore::{page_id, Key, Value, KV_PER_LEAF_PAGE, PAGE_SIZE};
use pagecache::BufferPool;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

fn read_page_from_disk(path: &Path, page_index: u64) -> Result<Vec<u8>> {
    let mut file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    file.seek(SeekFrom::Start(page_index * PAGE_SIZE as u64))?;
    let mut buf = vec![0u8; PAGE_SIZE];
    file.read_exact(&mut buf)?;
    Ok(buf)
}

/// Reads a page through the buffer pool, identified by `(path, page_index)`
/// as specified by `kvcore::page_id`. Opens the file fresh on a miss.
fn cached_page(path: &Path, page_index: u64, pool: &mut BufferPool) -> Result<Vec<u8>> {
    let id = page_id(&path.to_string_lossy(), page_index);
    if let Some(bytes) = pool.get(&id) {
        return Ok(bytes);
    }
    let bytes = read_page_from_disk(path, page_index)?;
    pool.insert(&id, bytes.clone());
    Ok(bytes)
}

/// Reader for the paged B-tree SST format. Descends the internal levels
/// for point lookups and walks the leaf level sequentially for scans.
pub struct BTreeSstReader {
    path: PathBuf,
    metadata: BTreeMetadata,
    bloom: Option<BloomFilter>,
}

impl BTreeSstReader {
    /// Loads the metadata page and, if present, the bloom filter. Opens
    /// the file once for this and keeps no handle afterward.
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let mut page0 = [0u8; PAGE_SIZE];
        file.read_exact(&mut page0)?;
        let metadata = BTreeMetadata::read_from(&mut &page0[..])?;

        let bloom = match metadata.bloom_offset {
            Some(offset) => {
                file.seek(SeekFrom::Start(offset))?;
                Some(BloomFilter::read_from(&mut file)?)
            }
            None => None,
        };

        Ok(Self {
            path: path.to_path_buf(),
            metadata,
            bloom,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn total_entries(&self) -> u64 {
        self.metadata.total_entries
    }

    #[must_use]
    pub fn leaf_page_count(&self) -> u64 {
        self.metadata.leaf_page_count
    }

    /// Reads and decodes leaf page `leaf_index` (0-based within the leaf
    /// level), routed through `pool`. Used by [`crate::bufio::BufferedInput`]
    /// for a plain sequential walk of the whole SST.
    pub fn read_leaf(&self, leaf_index: u64, pool: &mut BufferPool) -> Result<Vec<(Key, Value)>> {
        let leaf_start = self.metadata.level_start[self.metadata.num_levels() - 1];
        let count = self.leaf_page_len(leaf_index);
        let bytes = cached_page(&self.path, leaf_start + leaf_index, pool)?;
        Ok(decode_leaf_page(&bytes, count))
    }

    fn leaf_page_len(&self, leaf_index: u64) -> usize {
        let last = self.metadata.leaf_page_count - 1;
        if leaf_index < last {
            KV_PER_LEAF_PAGE
        } else {
            let full = last as usize * KV_PER_LEAF_PAGE;
            (self.metadata.total_entries as usize).saturating_sub(full)
        }
    }

    fn internal_page_len(&self, level: usize, page_in_level: u64) -> usize {
        let pages_here = self.metadata.pages_in_level(level);
        let total_keys = self.metadata.pages_in_level(level + 1);
        if page_in_level + 1 < pages_here {
            kvcore::KEYS_PER_INTERNAL_PAGE
        } else {
            (total_keys as usize).saturating_sub((pages_here - 1) as usize * kvcore::KEYS_PER_INTERNAL_PAGE)
        }
    }

    /// Descends from the root to the leaf page that would hold `key`,
    /// returning its absolute page index.
    fn descend_to_leaf(&self, key: Key, pool: &mut BufferPool) -> Result<u64> {
        let mut page_index = self.metadata.level_start[0];
        for level in 0..self.metadata.num_levels() - 1 {
            let page_in_level = page_index - self.metadata.level_start[level];
            let count = self.internal_page_len(level, page_in_level);
            let bytes = cached_page(&self.path, page_index, pool)?;
            let keys = decode_internal_page(&bytes, count);
            let child_offset = match keys.binary_search(&key) {
                Ok(i) => i,
                Err(i) => i.saturating_sub(1),
            };
            page_index = self.metadata.level_start[level + 1]
                + page_in_level * kvcore::KEYS_PER_INTERNAL_PAGE as u64
                + child_offset as u64;
        }
        Ok(page_index)
    }

    /// Point lookup. Returns `Ok(None)` if the bloom filter rejects the
    /// key or the descent finds no matching entry; `Ok(Some(v))` may
    /// return `v == kvcore::TOMBSTONE`, which callers interpret as
    /// "deleted", not "absent".
    pub fn find(&self, key: Key, pool: &mut BufferPool) -> Result<Option<Value>> {
        if let Some(bf) = &self.bloom {
            if !bf.contains(key) {
                return Ok(None);
            }
        }
        if self.metadata.total_entries == 0 {
            return Ok(None);
        }

        let leaf_page = self.descend_to_leaf(key, pool)?;
        let leaf_index = leaf_page - self.metadata.level_start[self.metadata.num_levels() - 1];
        let count = self.leaf_page_len(leaf_index);
        let bytes = cached_page(&self.path, leaf_page, pool)?;
        let entries = decode_leaf_page(&bytes, count);

        Ok(entries
            .binary_search_by_key(&key, |&(k, _)| k)
            .ok()
            .map(|i| entries[i].1))
    }

    /// Inclusive range scan over `[k1, k2]`, ascending, via a B-tree
    /// descent to the starting leaf followed by a sequential leaf walk.
    pub fn scan(&self, k1: Key, k2: Key, pool: &mut BufferPool) -> Result<Vec<(Key, Value)>> {
        let mut out = Vec::new();
        if k1 > k2 || self.metadata.total_entries == 0 {
            return Ok(out);
        }

        let leaf_level = self.metadata.num_levels() - 1;
        let start_leaf = self.descend_to_leaf(k1, pool)?;
        let leaf_start = self.metadata.level_start[leaf_level];
        let mut leaf_index = start_leaf - leaf_start;

        'outer: while leaf_index < self.metadata.leaf_page_count {
            let count = self.leaf_page_len(leaf_index);
            let bytes = cached_page(&self.path, leaf_start + leaf_index, pool)?;
            let entries = decode_leaf_page(&bytes, count);
            for (k, v) in entries {
                if k > k2 {
                    break 'outer;
                }
                if k >= k1 {
                    out.push((k, v));
                }
            }
            leaf_index += 1;
        }
        Ok(out)
    }
}

/// Reader for the legacy flat binary-search format.
pub struct FlatSstReader {
    path: PathBuf,
    metadata: FlatMetadata,
}

impl FlatSstReader {
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let mut page0 = [0u8; PAGE_SIZE];
        file.read_exact(&mut page0)?;
        let metadata = FlatMetadata::read_from(&mut &page0[..])?;
        Ok(Self {
            path: path.to_path_buf(),
            metadata,
        })
    }

    #[must_use]
    pub fn total_entries(&self) -> u64 {
        self.metadata.total_entries
    }

    fn page_len(&self, page_index: u64) -> usize {
        let last = self.metadata.page_count - 1;
        if page_index < last {
            KV_PER_LEAF_PAGE
        } else {
            let full = last as usize * KV_PER_LEAF_PAGE;
            (self.metadata.total_entries as usize).saturating_sub(full)
        }
    }

    /// Binary-searches the page range by each candidate page's first key,
    /// then binary-searches within the winning page.
    fn find_page(&self, key: Key, pool: &mut BufferPool) -> Result<Option<u64>> {
        let mut lo = 0u64;
        let mut hi = self.metadata.page_count;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let bytes = cached_page(&self.path, mid + 1, pool)?;
            let first_key = decode_leaf_page(&bytes, 1)[0].0;
            if first_key <= key {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        if lo == 0 {
            Ok(None)
        } else {
            Ok(Some(lo - 1))
        }
    }

    pub fn find(&self, key: Key, pool: &mut BufferPool) -> Result<Option<Value>> {
        if self.metadata.total_entries == 0 {
            return Ok(None);
        }
        let Some(page_index) = self.find_page(key, pool)? else {
            return Ok(None);
        };
        let count = self.page_len(page_index);
        let bytes = cached_page(&self.path, page_index + 1, pool)?;
        let entries = decode_leaf_page(&bytes, count);
        Ok(entries
            .binary_search_by_key(&key, |&(k, _)| k)
            .ok()
            .map(|i| entries[i].1))
    }

    pub fn scan(&self, k1: Key, k2: Key, pool: &mut BufferPool) -> Result<Vec<(Key, Value)>> {
        let mut out = Vec::new();
        if k1 > k2 || self.metadata.total_entries == 0 {
            return Ok(out);
        }
        let start_page = self.find_page(k1, pool)?.unwrap_or(0);
        'outer: for page_index in start_page..self.metadata.page_count {
            let count = self.page_len(page_index);
            let bytes = cached_page(&self.path, page_index + 1, pool)?;
            let entries = decode_leaf_page(&bytes, count);
            for (k, v) in entries {
                if k > k2 {
                    break 'outer;
                }
                if k >= k1 {
                    out.push((k, v));
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests;
