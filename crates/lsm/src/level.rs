//! One LSM tier: at most two SSTs, merged into the next tier on overflow.

use anyhow::{ensure, Result};
use kvcore::{Key, Value};
use pagecache::BufferPool;
use sstable::{BTreeSstReader, BTreeSstWriter, BufferedInput, BufferedOutput, MergeIterator};
use std::path::{Path, PathBuf};

/// Number of SSTs a level may hold before it must merge into the next one.
pub const LEVEL_SIZE_RATIO: usize = 2;

/// An ordered list of at most [`LEVEL_SIZE_RATIO`] SSTs at one LSM tier.
///
/// SSTs are kept in insertion order; the last entry is always the newest,
/// which is the tie-break source during [`sort_merge_into`](Self::sort_merge_into).
pub struct Level {
    level_number: u32,
    ssts: Vec<PathBuf>,
    bloom_bits_per_entry: u32,
    input_buffer_pages: usize,
    output_buffer_pages: usize,
}

impl Level {
    #[must_use]
    pub fn new(
        level_number: u32,
        bloom_bits_per_entry: u32,
        input_buffer_pages: usize,
        output_buffer_pages: usize,
    ) -> Self {
        Self {
            level_number,
            ssts: Vec::with_capacity(LEVEL_SIZE_RATIO),
            bloom_bits_per_entry,
            input_buffer_pages,
            output_buffer_pages,
        }
    }

    #[must_use]
    pub fn level_number(&self) -> u32 {
        self.level_number
    }

    #[must_use]
    pub fn sst_count(&self) -> usize {
        self.ssts.len()
    }

    #[must_use]
    pub fn ssts(&self) -> &[PathBuf] {
        &self.ssts
    }

    /// Writes `sorted_run` to `path` as a new SST and appends it to this
    /// level. Does not itself enforce the ≤2 capacity — the caller
    /// (`LsmTree::maintain`) drives the merge that keeps it satisfied.
    pub fn write_data(&mut self, sorted_run: &[(Key, Value)], path: PathBuf) -> Result<()> {
        BTreeSstWriter::write(&path, sorted_run, Some(self.bloom_bits_per_entry))?;
        self.ssts.push(path);
        Ok(())
    }

    /// Merges this level's two SSTs into one, appended to `next_level`.
    ///
    /// On a key tie the newer (second, by insertion order) SST's value
    /// wins. Both source files are deleted from disk once the merged
    /// file is fully persisted.
    pub fn sort_merge_into(&mut self, next_level: &mut Level, out_path: &Path, pool: &mut BufferPool) -> Result<()> {
        ensure!(
            self.ssts.len() == 2,
            "sort_merge_into requires exactly 2 SSTs, level {} has {}",
            self.level_number,
            self.ssts.len()
        );

        let older_path = self.ssts[0].clone();
        let newer_path = self.ssts[1].clone();
        let older_reader = BTreeSstReader::open(&older_path)?;
        let newer_reader = BTreeSstReader::open(&newer_path)?;
        let expected_keys = older_reader.total_entries() + newer_reader.total_entries();

        let older_input = BufferedInput::new(&older_reader, self.input_buffer_pages);
        let newer_input = BufferedInput::new(&newer_reader, self.input_buffer_pages);
        let mut merge = MergeIterator::new(vec![older_input, newer_input], pool)?;

        let mut output = BufferedOutput::create(
            out_path,
            Some(self.bloom_bits_per_entry),
            expected_keys,
            self.output_buffer_pages,
        )?;
        while let Some((k, v)) = merge.next_pair(pool)? {
            output.push(k, v)?;
        }
        output.finish()?;

        drop(older_reader);
        drop(newer_reader);
        std::fs::remove_file(&older_path)?;
        std::fs::remove_file(&newer_path)?;

        self.ssts.clear();
        next_level.ssts.push(out_path.to_path_buf());
        Ok(())
    }
}
