//! Git index (staging area) operations.
//!
//! The index file (`.git/index`) is a binary file that acts as a staging
//! area between the working tree and the repository. Only format version 2
//! without extensions is supported.

mod reader;
mod writer;

use crate::error::{Error, Result};
use crate::objects::{Mode, Oid};

pub use reader::parse;
pub use writer::write;

/// The only index format version this crate reads or writes.
pub const INDEX_VERSION: u32 = 2;

/// A Git index (staging area).
///
/// Entries keep their on-disk order. [`Index::add`] inserts new entries
/// in name order, so an index built through it stays sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    version: u32,
    entries: Vec<IndexEntry>,
}

impl Default for Index {
    fn default() -> Self {
        Index::new()
    }
}

impl Index {
    /// Creates a new empty version 2 index.
    pub fn new() -> Self {
        Self {
            version: INDEX_VERSION,
            entries: Vec::new(),
        }
    }

    /// Creates an index holding the given entries, in the given order.
    pub fn from_entries(entries: Vec<IndexEntry>) -> Self {
        Self {
            version: INDEX_VERSION,
            entries,
        }
    }

    /// Returns the index format version.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Returns the number of entries in the index.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the index has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns a slice of all entries in the index.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Finds the first entry with the given name, at any stage.
    pub fn get(&self, name: &str) -> Option<&IndexEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Returns an iterator over the entries.
    pub fn iter(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.iter()
    }

    /// Adds or updates an entry in the index.
    ///
    /// An entry with the same name and stage is replaced in place; a new
    /// entry is inserted before the first entry whose name sorts after it.
    pub fn add(&mut self, entry: IndexEntry) {
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|e| e.name == entry.name && e.stage == entry.stage)
        {
            *existing = entry;
            return;
        }

        let pos = self
            .entries
            .iter()
            .position(|e| (e.name.as_str(), e.stage) > (entry.name.as_str(), entry.stage))
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, entry);
    }

    /// Removes every entry (all stages) with the given name.
    ///
    /// Returns `true` if anything was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.name != name);
        self.entries.len() != before
    }

    /// Clears all entries from the index.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// A timestamp as stored in the index: seconds and nanoseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timestamp {
    /// Seconds since the Unix epoch.
    pub seconds: u32,
    /// Nanosecond fraction.
    pub nanoseconds: u32,
}

impl Timestamp {
    /// Creates a timestamp.
    pub fn new(seconds: u32, nanoseconds: u32) -> Self {
        Timestamp {
            seconds,
            nanoseconds,
        }
    }
}

/// The object type recorded in the top four bits of an index mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeType {
    /// Regular file (`0b1000`).
    Regular,
    /// Symbolic link (`0b1010`).
    Symlink,
    /// Submodule commit (`0b1110`).
    Gitlink,
}

impl ModeType {
    /// Decodes the 4-bit type tag.
    pub fn from_bits(bits: u16) -> Result<Self> {
        match bits {
            0b1000 => Ok(ModeType::Regular),
            0b1010 => Ok(ModeType::Symlink),
            0b1110 => Ok(ModeType::Gitlink),
            other => Err(Error::UnknownMode(format!("{:04b}", other))),
        }
    }

    /// Returns the 4-bit type tag.
    pub fn bits(&self) -> u16 {
        match self {
            ModeType::Regular => 0b1000,
            ModeType::Symlink => 0b1010,
            ModeType::Gitlink => 0b1110,
        }
    }
}

/// An entry in the Git index.
///
/// Each entry represents a file that is staged for the next commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    ctime: Timestamp,
    mtime: Timestamp,
    dev: u32,
    ino: u32,
    mode_type: ModeType,
    /// Low nine permission bits (e.g. `0o644`).
    perms: u16,
    uid: u32,
    gid: u32,
    size: u32,
    oid: Oid,
    assume_valid: bool,
    /// Merge stage (0 for normal, 1-3 for conflicts).
    stage: u8,
    /// Path relative to the repository root, `/`-separated.
    name: String,
}

impl IndexEntry {
    /// Creates an entry with zeroed stat data.
    pub fn new(name: impl Into<String>, oid: Oid, mode_type: ModeType, perms: u16) -> Self {
        Self {
            ctime: Timestamp::default(),
            mtime: Timestamp::default(),
            dev: 0,
            ino: 0,
            mode_type,
            perms: perms & 0o777,
            uid: 0,
            gid: 0,
            size: 0,
            oid,
            assume_valid: false,
            stage: 0,
            name: name.into(),
        }
    }

    /// Sets creation and modification times.
    pub fn with_times(mut self, ctime: Timestamp, mtime: Timestamp) -> Self {
        self.ctime = ctime;
        self.mtime = mtime;
        self
    }

    /// Sets device and inode numbers.
    pub fn with_device(mut self, dev: u32, ino: u32) -> Self {
        self.dev = dev;
        self.ino = ino;
        self
    }

    /// Sets owner ids.
    pub fn with_owner(mut self, uid: u32, gid: u32) -> Self {
        self.uid = uid;
        self.gid = gid;
        self
    }

    /// Sets the file size.
    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    /// Sets the assume-valid flag.
    pub fn with_assume_valid(mut self, assume_valid: bool) -> Self {
        self.assume_valid = assume_valid;
        self
    }

    /// Sets the merge stage (masked to 0-3).
    pub fn with_stage(mut self, stage: u8) -> Self {
        self.stage = stage & 0b11;
        self
    }

    /// Returns the ctime (metadata change time).
    pub fn ctime(&self) -> Timestamp {
        self.ctime
    }

    /// Returns the mtime (modification time).
    pub fn mtime(&self) -> Timestamp {
        self.mtime
    }

    /// Returns the device ID.
    pub fn dev(&self) -> u32 {
        self.dev
    }

    /// Returns the inode number.
    pub fn ino(&self) -> u32 {
        self.ino
    }

    /// Returns the type tag of the mode.
    pub fn mode_type(&self) -> ModeType {
        self.mode_type
    }

    /// Returns the permission bits.
    pub fn perms(&self) -> u16 {
        self.perms
    }

    /// Returns the full mode word, e.g. `0o100644`.
    pub fn mode_bits(&self) -> u32 {
        (u32::from(self.mode_type.bits()) << 12) | u32::from(self.perms)
    }

    /// Returns the mode as a tree entry mode.
    pub fn mode(&self) -> Result<Mode> {
        Mode::from_bits(self.mode_bits())
    }

    /// Returns the user ID.
    pub fn uid(&self) -> u32 {
        self.uid
    }

    /// Returns the group ID.
    pub fn gid(&self) -> u32 {
        self.gid
    }

    /// Returns the file size in bytes.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Returns the object ID of the staged content.
    pub fn oid(&self) -> &Oid {
        &self.oid
    }

    /// Returns the assume-valid flag.
    pub fn assume_valid(&self) -> bool {
        self.assume_valid
    }

    /// Returns the stage number.
    ///
    /// - 0: Normal entry
    /// - 1: Base version in a merge conflict
    /// - 2: "Ours" version in a merge conflict
    /// - 3: "Theirs" version in a merge conflict
    pub fn stage(&self) -> u8 {
        self.stage
    }

    /// Returns true if this entry is in a merge conflict.
    pub fn is_conflicted(&self) -> bool {
        self.stage != 0
    }

    /// Returns the path of the entry relative to the repository root.
    pub fn name(&self) -> &str {
        &self.name
    }
}
