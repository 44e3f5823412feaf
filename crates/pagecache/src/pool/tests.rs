use super::*;
use crate::eviction::{Clock, Lru};

#[test]
fn get_miss_returns_none() {
    let mut pool = BufferPool::new(2, 8, 4, Box::new(Lru::new()));
    assert_eq!(pool.get("missing"), None);
}

#[test]
fn insert_then_get_roundtrips() {
    let mut pool = BufferPool::new(2, 8, 4, Box::new(Lru::new()));
    pool.insert("p0", vec![1, 2, 3]);
    assert_eq!(pool.get("p0"), Some(vec![1, 2, 3]));
}

#[test]
fn pool_evicts_under_lru_when_over_capacity() {
    let mut pool = BufferPool::new(1, 1, 2, Box::new(Lru::new()));
    // min == max == 1 page worth of directory depth, bucket_max_size 2:
    // directory cannot expand past depth 0, so once the single bucket is
    // full and distinct keys keep arriving, eviction must kick in.
    for i in 0..20u64 {
        pool.insert(&format!("p{i}"), vec![i as u8]);
    }
    assert!(pool.size() <= 2);
}

#[test]
fn pool_evicts_under_clock_when_over_capacity() {
    let mut pool = BufferPool::new(1, 1, 2, Box::new(Clock::new()));
    for i in 0..20u64 {
        pool.insert(&format!("p{i}"), vec![i as u8]);
    }
    assert!(pool.size() <= 2);
}

#[test]
fn remove_purges_page() {
    let mut pool = BufferPool::new(2, 8, 4, Box::new(Lru::new()));
    pool.insert("p0", vec![1]);
    pool.remove("p0");
    assert_eq!(pool.get("p0"), None);
}

#[test]
fn resize_shrinks_without_losing_live_pages_under_new_capacity() {
    let mut pool = BufferPool::new(4, 64, 4, Box::new(Lru::new()));
    for i in 0..8u64 {
        pool.insert(&format!("p{i}"), vec![i as u8]);
    }
    pool.resize(4);
    assert_eq!(pool.max_size(), 4);
    assert!(pool.size() <= 8);
}

#[test]
fn access_protects_a_page_from_lru_eviction() {
    // 4 buckets, high per-bucket capacity: eviction is driven purely by
    // the EXPAND_THRESHOLD load factor, not bucket overflow.
    let mut pool = BufferPool::new(4, 4, 100, Box::new(Lru::new()));
    pool.insert("a", vec![1]);
    pool.insert("b", vec![2]);
    pool.insert("c", vec![3]);
    pool.insert("d", vec![4]);
    pool.get("a"); // "a" becomes most-recently-used

    pool.insert("e", vec![5]); // over threshold: evicts the LRU victim

    assert_eq!(pool.get("a"), Some(vec![1]));
    assert_eq!(pool.get("b"), None);
}
