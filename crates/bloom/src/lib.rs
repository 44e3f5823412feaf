///! # Bloom Filter
///!
///! A space-efficient probabilistic set for 64-bit keys.
///!
///! A bloom filter can tell you with certainty that a key is **not** in the
///! set (no false negatives), but may occasionally report that a key **is**
///! in the set when it isn't. The false-positive rate is controlled by
///! `bits_per_entry`.
///!
///! ## Usage in RiptideKV-U64
///!
///! Each SSTable embeds a bloom filter built from its keys. During point
///! lookups the LSM tree checks the filter first — if it says "not
///! present", the whole B-tree descent for that SSTable is skipped.
///!
///! ## Example
///!
///! ```rust
///! use bloom::BloomFilter;
///!
///! let mut bf = BloomFilter::new(10, 1000);
///! bf.insert(42);
///! assert!(bf.contains(42));
///! ```
use kvcore::Key;
use std::io::{self, Read, Write};

/// A bloom filter backed by a `u64` bit array with `k` probes per key.
///
/// Bit layout is MSB-first within each `u64` word: bit `i` of word `w`
/// occupies logical bit position `64*w + i`. This determines the on-disk
/// representation, read bit-for-bit identically whether the filter lives
/// in memory or was just loaded from an SST's bloom section.
pub struct BloomFilter {
    /// Backing bit array. `words.len() * 64 == num_bits`.
    words: Vec<u64>,
    /// Number of bits in the filter.
    num_bits: u64,
    /// Number of probes (`k`) per key.
    num_hashes: u32,
}

impl BloomFilter {
    /// Creates a new, empty bloom filter sized for `max_keys` entries at
    /// `bits_per_entry` bits/key.
    ///
    /// `num_bits = ceil(bits_per_entry * max_keys / 64) * 64`,
    /// `k = ceil(ln 2 * bits_per_entry)`, clamped to `k >= 1`.
    ///
    /// # Panics
    ///
    /// Panics if `bits_per_entry` is 0.
    #[must_use]
    pub fn new(bits_per_entry: u32, max_keys: u64) -> Self {
        assert!(bits_per_entry > 0, "bits_per_entry must be > 0");

        let max_keys = max_keys.max(1);
        let raw_bits = (bits_per_entry as u128) * (max_keys as u128);
        let num_words = ((raw_bits + 63) / 64).max(1) as u64;
        let num_bits = num_words * 64;

        let k = ((bits_per_entry as f64) * std::f64::consts::LN_2).ceil() as u32;
        let num_hashes = k.max(1);

        Self {
            words: vec![0u64; num_words as usize],
            num_bits,
            num_hashes,
        }
    }

    fn from_raw(words: Vec<u64>, num_bits: u64, num_hashes: u32) -> Self {
        Self {
            words,
            num_bits,
            num_hashes,
        }
    }

    /// Inserts a key into the filter.
    pub fn insert(&mut self, key: Key) {
        let (h1, h2) = Self::hash_pair(key);
        for i in 0..self.num_hashes {
            let bit = Self::probe(h1, h2, i, self.num_bits);
            set_bit(&mut self.words, bit);
        }
    }

    /// Inserts every key from `keys` into the filter.
    pub fn insert_all<I: IntoIterator<Item = Key>>(&mut self, keys: I) {
        for k in keys {
            self.insert(k);
        }
    }

    /// Returns `true` if `key` **might** be in the set, `false` if it is
    /// **definitely not**.
    #[must_use]
    pub fn contains(&self, key: Key) -> bool {
        let (h1, h2) = Self::hash_pair(key);
        for i in 0..self.num_hashes {
            let bit = Self::probe(h1, h2, i, self.num_bits);
            if !get_bit(&self.words, bit) {
                return false;
            }
        }
        true
    }

    /// Number of bits backing the filter.
    #[must_use]
    pub fn num_bits(&self) -> u64 {
        self.num_bits
    }

    /// Number of probes (`k`) per key.
    #[must_use]
    pub fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    /// Size in bytes of one serialized copy of this filter, as written by
    /// [`write_to`](Self::write_to): `num_bits(u64) + num_hashes(u32) +
    /// word_count(u32) + 8*word_count`.
    #[must_use]
    pub fn serialized_size(&self) -> usize {
        8 + 4 + 4 + self.words.len() * 8
    }

    /// Serializes the filter: `[num_bits: u64 LE][num_hashes: u32 LE]
    /// [word_count: u32 LE][words: u64 LE, ...]`.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.num_bits.to_le_bytes())?;
        w.write_all(&self.num_hashes.to_le_bytes())?;
        w.write_all(&(self.words.len() as u32).to_le_bytes())?;
        for word in &self.words {
            w.write_all(&word.to_le_bytes())?;
        }
        Ok(())
    }

    /// Deserializes a filter written by [`write_to`](Self::write_to).
    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut buf8 = [0u8; 8];
        let mut buf4 = [0u8; 4];

        r.read_exact(&mut buf8)?;
        let num_bits = u64::from_le_bytes(buf8);

        r.read_exact(&mut buf4)?;
        let num_hashes = u32::from_le_bytes(buf4);

        r.read_exact(&mut buf4)?;
        let word_count = u32::from_le_bytes(buf4) as usize;

        // Safety cap: 128 MiB of bloom bits is already a very large filter.
        const MAX_WORDS: usize = 16 * 1024 * 1024;
        if word_count > MAX_WORDS {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("bloom filter too large: {word_count} words"),
            ));
        }

        let mut words = Vec::with_capacity(word_count);
        for _ in 0..word_count {
            r.read_exact(&mut buf8)?;
            words.push(u64::from_le_bytes(buf8));
        }

        Ok(Self::from_raw(words, num_bits, num_hashes))
    }

    /// Two independent 64-bit hashes of `key`'s little-endian byte
    /// encoding, used as the double-hashing basis `h(i) = h1 + i*h2`.
    fn hash_pair(key: Key) -> (u64, u64) {
        let bytes = key.to_le_bytes();
        let h1 = fnv1a_64(&bytes, 0xcbf2_9ce4_8422_2325);
        let h2 = fnv1a_64(&bytes, 0x517c_c1b7_2722_0a95) | 1; // odd: avoids a degenerate h2 = 0
        (h1, h2)
    }

    fn probe(h1: u64, h2: u64, i: u32, num_bits: u64) -> u64 {
        h1.wrapping_add((i as u64).wrapping_mul(h2)) % num_bits
    }
}

/// Sets the bit at logical position `pos`, MSB-first within its word.
fn set_bit(words: &mut [u64], pos: u64) {
    let w = (pos / 64) as usize;
    let i = pos % 64;
    words[w] |= 1u64 << (63 - i);
}

/// Reads the bit at logical position `pos`, MSB-first within its word.
fn get_bit(words: &[u64], pos: u64) -> bool {
    let w = (pos / 64) as usize;
    let i = pos % 64;
    (words[w] >> (63 - i)) & 1 == 1
}

impl std::fmt::Debug for BloomFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BloomFilter")
            .field("num_bits", &self.num_bits)
            .field("num_hashes", &self.num_hashes)
            .field("words", &self.words.len())
            .finish()
    }
}

/// FNV-1a 64-bit hash with a configurable starting basis.
fn fnv1a_64(data: &[u8], basis: u64) -> u64 {
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = basis;
    for &byte in data {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}
