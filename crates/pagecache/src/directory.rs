//! Extendible hash directory over page identities.
//!
//! The directory is a map from a binary-string prefix of a page-id hash to
//! a bucket of cached entries. It grows and shrinks by doubling or halving
//! itself (`expand_directory`/`shrink_directory`), and individual buckets
//! grow by splitting when they overflow and have room to distinguish
//! themselves with one more hash bit (`local_depth < global_depth`).

use std::collections::HashMap;

struct Bucket {
    local_depth: u32,
    entries: Vec<(String, Vec<u8>)>,
}

impl Bucket {
    fn find(&self, page_id: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == page_id)
    }
}

/// Outcome of [`ExtendibleHashDirectory::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The page was stored (new entry or overwritten in place).
    Inserted,
    /// The target bucket is full and already at `global_depth`; the
    /// caller must `expand_directory()` or evict a page first, then
    /// retry.
    NeedsExpansion,
}

/// Dynamic hash directory keyed by binary-string prefixes of a page-id
/// hash, with per-bucket local depth tracking how many low-order hash
/// bits currently distinguish it from its pair.
pub struct ExtendibleHashDirectory {
    global_depth: u32,
    min_depth: u32,
    max_depth: u32,
    bucket_max_size: usize,
    size: usize,
    directory: HashMap<String, usize>,
    buckets: Vec<Bucket>,
}

impl ExtendibleHashDirectory {
    /// Creates a directory with `2^min_depth` initially distinct, empty
    /// buckets.
    ///
    /// # Panics
    ///
    /// Panics if `min_depth > max_depth` or `bucket_max_size == 0`.
    #[must_use]
    pub fn new(min_depth: u32, max_depth: u32, bucket_max_size: usize) -> Self {
        assert!(min_depth <= max_depth, "min_depth must be <= max_depth");
        assert!(bucket_max_size > 0, "bucket_max_size must be > 0");

        let mut directory = HashMap::new();
        let mut buckets = Vec::new();
        for i in 0..(1u64 << min_depth) {
            let key = dir_key(i, min_depth);
            buckets.push(Bucket {
                local_depth: min_depth,
                entries: Vec::new(),
            });
            directory.insert(key, buckets.len() - 1);
        }

        Self {
            global_depth: min_depth,
            min_depth,
            max_depth,
            bucket_max_size,
            size: 0,
            directory,
            buckets,
        }
    }

    /// Current directory fan-out (`2^global_depth`).
    #[must_use]
    pub fn num_directory_entries(&self) -> usize {
        1usize << self.global_depth
    }

    /// Total cached entries across every bucket.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn global_depth(&self) -> u32 {
        self.global_depth
    }

    #[must_use]
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Sets the maximum depth the directory may grow to. Used by the
    /// buffer pool after a `resize`.
    pub fn set_max_depth(&mut self, max_depth: u32) {
        self.max_depth = max_depth;
    }

    /// Looks up `page_id`, returning a copy of its cached bytes.
    #[must_use]
    pub fn get(&self, page_id: &str) -> Option<Vec<u8>> {
        let idx = self.bucket_index(page_id);
        self.buckets[idx]
            .find(page_id)
            .map(|pos| self.buckets[idx].entries[pos].1.clone())
    }

    fn bucket_index(&self, page_id: &str) -> usize {
        let h = hash_page_id(page_id);
        let key = dir_key(h, self.global_depth);
        self.directory[&key]
    }

    /// Inserts or overwrites `page_id`'s cached bytes, splitting buckets
    /// as needed. See [`InsertOutcome`] for the expansion-needed case.
    pub fn insert(&mut self, page_id: &str, bytes: Vec<u8>) -> InsertOutcome {
        loop {
            let idx = self.bucket_index(page_id);

            if let Some(pos) = self.buckets[idx].find(page_id) {
                self.buckets[idx].entries[pos].1 = bytes;
                return InsertOutcome::Inserted;
            }

            if self.buckets[idx].entries.len() < self.bucket_max_size {
                self.buckets[idx].entries.push((page_id.to_string(), bytes));
                self.size += 1;
                return InsertOutcome::Inserted;
            }

            if self.buckets[idx].local_depth < self.global_depth {
                self.split_bucket(idx);
                continue;
            }

            return InsertOutcome::NeedsExpansion;
        }
    }

    fn split_bucket(&mut self, idx: usize) {
        let old_local = self.buckets[idx].local_depth;
        let new_local = old_local + 1;

        let new_idx = self.buckets.len();
        self.buckets.push(Bucket {
            local_depth: new_local,
            entries: Vec::new(),
        });
        self.buckets[idx].local_depth = new_local;

        let old_entries = std::mem::take(&mut self.buckets[idx].entries);
        for (page_id, bytes) in old_entries {
            let h = hash_page_id(&page_id);
            let bit = (h >> (new_local - 1)) & 1;
            if bit == 1 {
                self.buckets[new_idx].entries.push((page_id, bytes));
            } else {
                self.buckets[idx].entries.push((page_id, bytes));
            }
        }

        let leading_pos = (self.global_depth - new_local) as usize;
        for (key, bucket_idx) in self.directory.iter_mut() {
            if *bucket_idx != idx {
                continue;
            }
            if key.as_bytes()[leading_pos] == b'1' {
                *bucket_idx = new_idx;
            }
        }
    }

    /// Doubles the directory, duplicating every entry's bucket pointer as
    /// both a `0`-prefixed and `1`-prefixed key. Fails once `max_depth` is
    /// reached.
    pub fn expand_directory(&mut self) -> bool {
        if self.global_depth == self.max_depth {
            return false;
        }
        let mut new_directory = HashMap::with_capacity(self.directory.len() * 2);
        for (key, idx) in &self.directory {
            new_directory.insert(format!("0{key}"), *idx);
            new_directory.insert(format!("1{key}"), *idx);
        }
        self.directory = new_directory;
        self.global_depth += 1;
        true
    }

    /// Removes `page_id` if present.
    pub fn remove(&mut self, page_id: &str) -> bool {
        let idx = self.bucket_index(page_id);
        if let Some(pos) = self.buckets[idx].find(page_id) {
            self.buckets[idx].entries.remove(pos);
            self.size -= 1;
            true
        } else {
            false
        }
    }

    /// Halves the directory, merging each bucket with its leading-bit
    /// pair. A no-op once `global_depth == min_depth`.
    pub fn shrink_directory(&mut self) {
        if self.global_depth == self.min_depth {
            return;
        }
        let new_depth = self.global_depth - 1;
        let mut new_directory = HashMap::with_capacity(self.directory.len() / 2);

        let zero_keys: Vec<String> = self
            .directory
            .keys()
            .filter(|k| k.starts_with('0'))
            .cloned()
            .collect();

        for key in zero_keys {
            let pair = format!("1{}", &key[1..]);
            let idx0 = self.directory[&key];
            let idx1 = self.directory[&pair];
            let new_key = key[1..].to_string();

            if idx0 == idx1 {
                new_directory.insert(new_key, idx0);
            } else {
                let moved = std::mem::take(&mut self.buckets[idx1].entries);
                self.buckets[idx0].entries.extend(moved);
                self.buckets[idx0].local_depth -= 1;
                new_directory.insert(new_key, idx0);
            }
        }

        self.directory = new_directory;
        self.global_depth = new_depth;
    }
}

/// Binary-string prefix of `hash`'s low `depth` bits, MSB-first.
fn dir_key(hash: u64, depth: u32) -> String {
    (0..depth)
        .rev()
        .map(|i| if (hash >> i) & 1 == 1 { '1' } else { '0' })
        .collect()
}

fn hash_page_id(page_id: &str) -> u64 {
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = 0xcbf2_9ce4_8422_2325u64;
    for &byte in page_id.as_bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

#[cfg(test)]
mod tests;
