//! Cold-start discovery: populating a freshly opened [`Store`] from what
//! (if anything) already sits in its directory.

use crate::{Store, StoreError};
use config::StoreConfig;
use lsm::LsmTree;
use std::path::Path;

/// Populates `store` from `store.dir` according to `cfg`.
///
/// In LSM mode, opening an existing directory is not supported — the
/// caller gets a fresh [`LsmTree`] regardless of what is already on disk
/// (see `DESIGN.md` Open Question O1). In flat mode, every `<seq>.sst`
/// file present is reopened and registered, newest (highest `seq`) first,
/// and `next_seq` is set one past the highest `seq` found so new flushes
/// never collide with an existing file name.
pub(crate) fn discover(store: &mut Store, cfg: &StoreConfig) -> Result<(), StoreError> {
    if let Some(lsm_cfg) = &cfg.lsm {
        store.lsm = Some(LsmTree::new(store.dir.clone(), lsm_cfg));
        return Ok(());
    }

    let mut found: Vec<(u64, std::path::PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(&store.dir)? {
        let path = entry?.path();
        if let Some(seq) = flat_seq(&path) {
            found.push((seq, path));
        }
    }
    found.sort_by_key(|&(seq, _)| seq);

    store.next_seq = found.last().map_or(0, |&(seq, _)| seq + 1);
    store.flat_ssts = found.into_iter().rev().map(|(_, path)| path).collect();
    Ok(())
}

/// Parses the `<seq>` component of a `<seq>.sst` flat-mode filename.
fn flat_seq(path: &Path) -> Option<u64> {
    if path.extension()?.to_str()? != "sst" {
        return None;
    }
    path.file_stem()?.to_str()?.parse().ok()
}
