//! Writers for both on-disk SST formats.
//!
//! [`BTreeSstWriter`] bulk-loads a paged B-tree SST from a sorted slice in
//! one call. [`BufferedOutput`] does the same thing incrementally, one
//! pushed entry at a time, streaming leaf pages to disk as soon as they
//! fill so memory stays proportional to the fence-key index rather than
//! the dataset — the shape compaction needs.
//!
//! Both converge on [`finalize_btree`], which builds the internal levels
//! bottom-up from the buffered fence keys, appends the optional bloom
//! filter, and writes the metadata page last by seeking back to the
//! placeholder reserved at offset 0. The file is written under a `.tmp`
//! path and renamed into place only once `sync_all` succeeds, so a crash
//! never leaves a half-written SST visible under its real name.

use crate::format::{encode_internal_page, encode_leaf_page, BTreeMetadata, FlatMetadata};
use anyhow::{Context, Result};
use bloom::BloomFilter;
use kvcore::{Key, Value, INVALID, KEYS_PER_INTERNAL_PAGE, KV_PER_LEAF_PAGE, PAGE_SIZE};
use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

fn tmp_path(path: &Path) -> PathBuf {
    let mut p = path.as_os_str().to_owned();
    p.push(".tmp");
    PathBuf::from(p)
}

/// Builds the internal levels above a completed run of leaf pages, then
/// writes the bloom filter and the page-0 metadata, and atomically
/// renames the temp file into place.
fn finalize_btree(
    mut file: File,
    tmp: &Path,
    dest: &Path,
    mut leaf_fence_keys: Vec<Key>,
    leaf_page_count: u64,
    total_entries: u64,
    bloom: Option<BloomFilter>,
) -> Result<()> {
    if leaf_fence_keys.is_empty() {
        leaf_fence_keys.push(INVALID);
    }

    let mut level_starts_bottom_up = vec![1u64];
    let mut next_page_index = 1 + leaf_page_count;
    let mut current_keys = leaf_fence_keys;

    while current_keys.len() > 1 {
        let level_start = next_page_index;
        let mut next_keys =
            Vec::with_capacity(current_keys.len().div_ceil(KEYS_PER_INTERNAL_PAGE));
        for chunk in current_keys.chunks(KEYS_PER_INTERNAL_PAGE) {
            next_keys.push(chunk[0]);
            let page = encode_internal_page(chunk);
            file.write_all(&page)?;
            next_page_index += 1;
        }
        level_starts_bottom_up.push(level_start);
        current_keys = next_keys;
    }

    let mut level_start = level_starts_bottom_up;
    level_start.reverse();

    let (bloom_offset, bloom_len) = match &bloom {
        Some(bf) => {
            let offset = file.stream_position()?;
            bf.write_to(&mut file)?;
            (Some(offset), bf.serialized_size() as u64)
        }
        None => (None, 0),
    };

    let metadata = BTreeMetadata {
        level_start,
        leaf_page_count,
        total_entries,
        bloom_offset,
        bloom_len,
    };

    let mut page0 = [0u8; PAGE_SIZE];
    {
        let mut cursor = &mut page0[..];
        metadata.write_to(&mut cursor)?;
    }
    file.seek(SeekFrom::Start(0))?;
    file.write_all(&page0)?;
    file.sync_all()?;
    drop(file);

    std::fs::rename(tmp, dest).context("renaming completed SST into place")?;
    Ok(())
}

/// One-shot bulk loader for the paged B-tree format: given an already
/// sorted, already deduplicated slice of entries, writes a complete SST
/// in a single call.
pub struct BTreeSstWriter;

impl BTreeSstWriter {
    /// Writes `entries` (ascending, unique keys) to `path` as a B-tree
    /// SST. Pass `bloom_bits_per_entry` to embed a bloom filter.
    pub fn write(path: &Path, entries: &[(Key, Value)], bloom_bits_per_entry: Option<u32>) -> Result<()> {
        let tmp = tmp_path(path);
        let mut file = File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
        file.seek(SeekFrom::Start(PAGE_SIZE as u64))?;

        let mut leaf_fence_keys = Vec::with_capacity(entries.len().div_ceil(KV_PER_LEAF_PAGE.max(1)));
        let mut leaf_page_count = 0u64;
        for chunk in entries.chunks(KV_PER_LEAF_PAGE) {
            leaf_fence_keys.push(chunk[0].0);
            let page = encode_leaf_page(chunk);
            file.write_all(&page)?;
            leaf_page_count += 1;
        }
        if leaf_page_count == 0 {
            file.write_all(&encode_leaf_page(&[]))?;
            leaf_page_count = 1;
        }

        let bloom = bloom_bits_per_entry.map(|bits| {
            let mut bf = BloomFilter::new(bits, entries.len().max(1) as u64);
            bf.insert_all(entries.iter().map(|&(k, _)| k));
            bf
        });

        finalize_btree(
            file,
            &tmp,
            path,
            leaf_fence_keys,
            leaf_page_count,
            entries.len() as u64,
            bloom,
        )
    }
}

/// Incremental bulk loader for the paged B-tree format, used by
/// compaction so a merge never has to hold the whole output in memory.
///
/// Leaf pages flush to disk as soon as [`KV_PER_LEAF_PAGE`] entries have
/// been pushed; only the per-leaf fence keys stay buffered until
/// [`finish`](Self::finish) builds the internal levels.
pub struct BufferedOutput {
    file: File,
    tmp: PathBuf,
    dest: PathBuf,
    pending: Vec<(Key, Value)>,
    flush_threshold: usize,
    leaf_fence_keys: Vec<Key>,
    leaf_page_count: u64,
    total_entries: u64,
    bloom: Option<BloomFilter>,
}

impl BufferedOutput {
    /// Opens `path` for incremental writing. `expected_keys` sizes the
    /// optional bloom filter; pass `None` for `bloom_bits_per_entry` to
    /// write no bloom section at all. `capacity_pages` is how many leaf
    /// pages' worth of entries accumulate before a batch is written to
    /// disk (the output-side counterpart of `BufferedInput`'s read
    /// batching).
    pub fn create(
        path: &Path,
        bloom_bits_per_entry: Option<u32>,
        expected_keys: u64,
        capacity_pages: usize,
    ) -> Result<Self> {
        let tmp = tmp_path(path);
        let mut file = File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
        file.seek(SeekFrom::Start(PAGE_SIZE as u64))?;

        let flush_threshold = KV_PER_LEAF_PAGE * capacity_pages.max(1);
        Ok(Self {
            file,
            tmp,
            dest: path.to_path_buf(),
            pending: Vec::with_capacity(flush_threshold),
            flush_threshold,
            leaf_fence_keys: Vec::new(),
            leaf_page_count: 0,
            total_entries: 0,
            bloom: bloom_bits_per_entry.map(|bits| BloomFilter::new(bits, expected_keys.max(1))),
        })
    }

    /// Appends one entry. Keys must arrive in ascending order; this is
    /// not checked here, since the only caller is a merge that already
    /// guarantees it.
    pub fn push(&mut self, key: Key, value: Value) -> Result<()> {
        if let Some(bf) = &mut self.bloom {
            bf.insert(key);
        }
        self.pending.push((key, value));
        self.total_entries += 1;
        if self.pending.len() >= self.flush_threshold {
            self.flush_full_pages()?;
        }
        Ok(())
    }

    /// Writes every full leaf page currently buffered, leaving any
    /// remainder smaller than one page in `pending`.
    fn flush_full_pages(&mut self) -> Result<()> {
        let mut start = 0;
        while self.pending.len() - start >= KV_PER_LEAF_PAGE {
            let chunk = &self.pending[start..start + KV_PER_LEAF_PAGE];
            self.leaf_fence_keys.push(chunk[0].0);
            self.file.write_all(&encode_leaf_page(chunk))?;
            self.leaf_page_count += 1;
            start += KV_PER_LEAF_PAGE;
        }
        self.pending.drain(0..start);
        Ok(())
    }

    /// Flushes every remaining entry (a full or partial leaf page),
    /// builds the internal levels, and renames the finished SST into
    /// place.
    pub fn finish(mut self) -> Result<()> {
        self.flush_full_pages()?;
        if !self.pending.is_empty() {
            self.leaf_fence_keys.push(self.pending[0].0);
            self.file.write_all(&encode_leaf_page(&self.pending))?;
            self.leaf_page_count += 1;
            self.pending.clear();
        }
        if self.leaf_page_count == 0 {
            self.file.write_all(&encode_leaf_page(&[]))?;
            self.leaf_page_count = 1;
        }
        finalize_btree(
            self.file,
            &self.tmp,
            &self.dest,
            self.leaf_fence_keys,
            self.leaf_page_count,
            self.total_entries,
            self.bloom,
        )
    }

    #[must_use]
    pub fn entries_written(&self) -> u64 {
        self.total_entries
    }
}

/// Writer for the legacy flat binary-search format: contiguous KV pages
/// with no fence-key index, searched by reading candidate pages directly.
pub struct FlatSstWriter;

impl FlatSstWriter {
    pub fn write(path: &Path, entries: &[(Key, Value)]) -> Result<()> {
        let tmp = tmp_path(path);
        let mut file = File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
        file.seek(SeekFrom::Start(PAGE_SIZE as u64))?;

        let mut page_count = 0u64;
        for chunk in entries.chunks(KV_PER_LEAF_PAGE) {
            file.write_all(&encode_leaf_page(chunk))?;
            page_count += 1;
        }
        if page_count == 0 {
            file.write_all(&encode_leaf_page(&[]))?;
            page_count = 1;
        }

        let metadata = FlatMetadata {
            page_count,
            total_entries: entries.len() as u64,
        };
        let mut page0 = [0u8; PAGE_SIZE];
        {
            let mut cursor = &mut page0[..];
            metadata.write_to(&mut cursor)?;
        }
        file.seek(SeekFrom::Start(0))?;
        file.write_all(&page0)?;
        file.sync_all()?;
        drop(file);

        std::fs::rename(&tmp, path).context("renaming completed SST into place")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests;
