//! # CLI - RiptideKV-U64 Interactive Shell
//!
//! A REPL-style demo harness for [`engine::Store`]. Reads commands from
//! stdin, executes them against a store, and prints results to stdout.
//! Designed for both interactive use and scripted testing (pipe commands
//! via stdin).
//!
//! ## Commands
//!
//! ```text
//! PUT key value      Insert a key-value pair (both u64)
//! GET key            Look up a key (prints value or "(absent)")
//! UPDATE key value   Overwrite a key (LSM mode only)
//! DEL key            Delete a key, writing a tombstone (LSM mode only)
//! SCAN k1 k2         Inclusive range scan
//! STATS              Print store debug info
//! EXIT / QUIT        Flush and shut down
//! ```
//!
//! ## Configuration
//!
//! All settings are controlled via environment variables — this is the
//! harness's own concern, not `engine::Store`'s, which takes no
//! environment variables at all:
//!
//! ```text
//! RIPTIDE_DIR            Store directory                 (default: "data")
//! RIPTIDE_MEMTABLE_MAX   memtable_max_entries             (default: 1024)
//! RIPTIDE_LSM            "true" to enable LSM mode        (default: "true")
//! RIPTIDE_BLOOM_BITS     lsm.bloom_bits_per_entry         (default: 10)
//! RIPTIDE_BUFFER_MIN     buffer_pool.min_size             (default: 16)
//! RIPTIDE_BUFFER_MAX     buffer_pool.max_size             (default: 1024)
//! ```

use anyhow::{Context, Result};
use config::{BufferPoolConfig, LsmConfig, SearchMode, StoreConfig};
use engine::Store;
use std::io::{self, BufRead, Write};

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn build_config() -> StoreConfig {
    let lsm_mode = env_or("RIPTIDE_LSM", "true") == "true";
    let mut builder = StoreConfig::builder()
        .memtable_max_entries(env_parsed("RIPTIDE_MEMTABLE_MAX", 1024))
        .buffer_pool(BufferPoolConfig {
            min_size: env_parsed("RIPTIDE_BUFFER_MIN", 16),
            max_size: env_parsed("RIPTIDE_BUFFER_MAX", 1024),
            ..BufferPoolConfig::default()
        });
    if lsm_mode {
        builder = builder.search_mode(SearchMode::BTreeSearch).lsm(LsmConfig {
            bloom_bits_per_entry: env_parsed("RIPTIDE_BLOOM_BITS", 10),
            ..LsmConfig::default()
        });
    }
    builder.build().expect("environment produced an invalid StoreConfig")
}

/// Executes one REPL command line against `store`, returning the text to
/// print. Kept separate from `main`'s I/O loop so the command grammar can
/// be exercised directly by tests without spawning the binary.
fn execute(store: &mut Store, line: &str) -> String {
    let mut parts = line.split_whitespace();
    let Some(cmd) = parts.next() else {
        return String::new();
    };

    match cmd.to_uppercase().as_str() {
        "PUT" => match (parts.next().and_then(|k| k.parse().ok()), parts.next().and_then(|v| v.parse().ok())) {
            (Some(k), Some(v)) => match store.put(k, v) {
                Ok(()) => "OK".to_string(),
                Err(e) => format!("ERR {e}"),
            },
            _ => "ERR usage: PUT key value".to_string(),
        },
        "UPDATE" => match (parts.next().and_then(|k| k.parse().ok()), parts.next().and_then(|v| v.parse().ok())) {
            (Some(k), Some(v)) => match store.update(k, v) {
                Ok(()) => "OK".to_string(),
                Err(e) => format!("ERR {e}"),
            },
            _ => "ERR usage: UPDATE key value".to_string(),
        },
        "GET" => match parts.next().and_then(|k| k.parse().ok()) {
            Some(k) => match store.get(k) {
                Ok(Some(v)) => v.to_string(),
                Ok(None) => "(absent)".to_string(),
                Err(e) => format!("ERR {e}"),
            },
            None => "ERR usage: GET key".to_string(),
        },
        "DEL" => match parts.next().and_then(|k| k.parse().ok()) {
            Some(k) => match store.delete(k) {
                Ok(()) => "OK".to_string(),
                Err(e) => format!("ERR {e}"),
            },
            None => "ERR usage: DEL key".to_string(),
        },
        "SCAN" => match (parts.next().and_then(|k| k.parse().ok()), parts.next().and_then(|k| k.parse().ok())) {
            (Some(k1), Some(k2)) => match store.scan(k1, k2) {
                Ok(results) if results.is_empty() => "(empty)".to_string(),
                Ok(results) => {
                    let mut out = String::new();
                    for (k, v) in &results {
                        out.push_str(&format!("{k} -> {v}\n"));
                    }
                    out.push_str(&format!("({} entries)", results.len()));
                    out
                }
                Err(e) => format!("ERR {e}"),
            },
            _ => "ERR usage: SCAN k1 k2".to_string(),
        },
        "STATS" => format!("{store:?}"),
        "EXIT" | "QUIT" => "bye".to_string(),
        other => format!("unknown command: {other}"),
    }
}

fn main() -> Result<()> {
    let dir = env_or("RIPTIDE_DIR", "data");
    let cfg = build_config();
    let mut store = Store::open(&dir, cfg).with_context(|| format!("opening store at {dir}"))?;

    println!(
        "RiptideKV-U64 started (dir={}, lsm_mode={})",
        dir,
        store.is_lsm_mode()
    );
    println!("Commands: PUT key value | GET key | UPDATE key value | DEL key | SCAN k1 k2 | STATS | EXIT");
    print!("> ");
    io::stdout().flush().ok();

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let is_exit = line.split_whitespace().next().is_some_and(|c| {
            let c = c.to_uppercase();
            c == "EXIT" || c == "QUIT"
        });
        println!("{}", execute(&mut store, &line));
        if is_exit {
            break;
        }
        print!("> ");
        io::stdout().flush().ok();
    }

    store.close()?;
    Ok(())
}
