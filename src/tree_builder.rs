//! Builds tree objects from a flat list of index entries.
//!
//! Entries are grouped into one bucket per directory, every ancestor up to
//! the root included. Buckets are then written longest path first, so each
//! subtree exists before the directory that lists it.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{Error, Result};
use crate::index::IndexEntry;
use crate::objects::{LooseObjectStore, Mode, Object, Oid, Tree, TreeEntry};

/// Writes the trees for `entries` and returns the root tree's id.
///
/// An empty entry list yields the empty tree.
///
/// # Errors
///
/// - `Error::UnmergedEntry` if any entry has a non-zero merge stage
/// - `Error::InvalidIndex` for names with empty or `.`/`..` components, or
///   when one name is both a file and a directory (`a` next to `a/b`)
/// - `Error::UnknownMode` if an entry's mode cannot be expressed in a tree
pub fn tree_from_index(store: &LooseObjectStore, entries: &[IndexEntry]) -> Result<Oid> {
    let mut buckets: BTreeMap<String, Vec<TreeEntry>> = BTreeMap::new();
    buckets.insert(String::new(), Vec::new());

    for entry in entries {
        if entry.stage() != 0 {
            return Err(Error::UnmergedEntry(entry.name().to_string()));
        }
        check_name(entry.name())?;

        let (dir, base) = split_path(entry.name());

        let mut ancestor = dir;
        while !ancestor.is_empty() && !buckets.contains_key(ancestor) {
            buckets.insert(ancestor.to_string(), Vec::new());
            ancestor = split_path(ancestor).0;
        }

        let bucket = buckets.entry(dir.to_string()).or_default();
        check_unique(bucket, entry.name(), base)?;
        bucket.push(TreeEntry::new(entry.mode()?, base, *entry.oid()));
    }

    let mut dirs: Vec<String> = buckets.keys().cloned().collect();
    dirs.sort_by(|a, b| b.len().cmp(&a.len()));

    let mut root = None;
    for dir in dirs {
        let items = buckets.remove(&dir).unwrap_or_default();
        let count = items.len();
        let oid = store.write(&Object::Tree(Tree::from_entries(items)))?;
        debug!(dir = %dir, %oid, entries = count, "built tree");

        if dir.is_empty() {
            root = Some(oid);
        } else {
            let (parent, base) = split_path(&dir);
            let bucket = buckets.entry(parent.to_string()).or_default();
            check_unique(bucket, &dir, base)?;
            bucket.push(TreeEntry::new(Mode::DIRECTORY, base, oid));
        }
    }

    root.ok_or_else(|| Error::InvalidIndex {
        reason: "no root tree was built".to_string(),
    })
}

/// Splits `a/b/c` into (`a/b`, `c`); a bare name has an empty directory.
fn split_path(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(pos) => (&path[..pos], &path[pos + 1..]),
        None => ("", path),
    }
}

/// A directory may hold each name only once, whether file or subtree.
fn check_unique(bucket: &[TreeEntry], path: &str, base: &str) -> Result<()> {
    if bucket.iter().any(|e| e.path() == base) {
        return Err(Error::InvalidIndex {
            reason: format!("duplicate tree entry: {:?}", path),
        });
    }
    Ok(())
}

fn check_name(name: &str) -> Result<()> {
    let valid = name
        .split('/')
        .all(|part| !part.is_empty() && part != "." && part != "..");
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidIndex {
            reason: format!("invalid entry name: {:?}", name),
        })
    }
}
