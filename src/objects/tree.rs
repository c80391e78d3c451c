//! Git tree object implementation.

use std::cmp::Ordering;
use std::fmt;

use super::oid::{Oid, OID_BYTES};
use super::store::ObjectType;
use crate::error::{Error, Result};

/// The raw mode of a tree entry, normalized to six ASCII octal digits.
///
/// Git writes directory modes with five digits (`40000`). In memory such
/// modes carry a leading space (` 40000`) so every mode has the same width;
/// the space is dropped again on serialization.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mode([u8; 6]);

impl Mode {
    /// Subdirectory (tree).
    pub const DIRECTORY: Mode = Mode(*b" 40000");
    /// Regular non-executable file.
    pub const REGULAR: Mode = Mode(*b"100644");
    /// Executable file.
    pub const EXECUTABLE: Mode = Mode(*b"100755");
    /// Symbolic link.
    pub const SYMLINK: Mode = Mode(*b"120000");
    /// Submodule (gitlink).
    pub const GITLINK: Mode = Mode(*b"160000");

    /// Parses the mode text of a tree entry (5 or 6 octal digits).
    pub fn parse(text: &[u8]) -> Result<Self> {
        let valid =
            matches!(text.len(), 5 | 6) && text.iter().all(|b| (b'0'..=b'7').contains(b));
        if !valid {
            return Err(Error::UnknownMode(String::from_utf8_lossy(text).into_owned()));
        }

        let mut bytes = [b' '; 6];
        bytes[6 - text.len()..].copy_from_slice(text);
        Ok(Mode(bytes))
    }

    /// Builds a mode from its numeric value, e.g. `0o100644`.
    pub fn from_bits(bits: u32) -> Result<Self> {
        Mode::parse(format!("{:o}", bits).as_bytes())
    }

    /// Returns the numeric value of the mode.
    pub fn bits(&self) -> u32 {
        self.as_bytes()
            .iter()
            .fold(0, |acc, b| (acc << 3) | u32::from(b - b'0'))
    }

    /// Returns the mode as written on disk, without the normalizing space.
    pub fn as_bytes(&self) -> &[u8] {
        match self.0[0] {
            b' ' => &self.0[1..],
            _ => &self.0,
        }
    }

    /// Returns the normalized six-character form.
    pub fn as_normalized(&self) -> &[u8; 6] {
        &self.0
    }

    /// Returns true if this mode points at a subtree.
    pub fn is_tree(&self) -> bool {
        self.bits() & 0o170000 == 0o040000
    }

    /// Classifies the mode.
    ///
    /// Returns `Error::UnknownMode` for type bits other than directory,
    /// regular file, symlink or gitlink.
    pub fn file_mode(&self) -> Result<FileMode> {
        match self.bits() & 0o170000 {
            0o040000 => Ok(FileMode::Directory),
            0o100000 if self.bits() & 0o111 != 0 => Ok(FileMode::Executable),
            0o100000 => Ok(FileMode::Regular),
            0o120000 => Ok(FileMode::Symlink),
            0o160000 => Ok(FileMode::Submodule),
            _ => Err(Error::UnknownMode(self.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}

impl fmt::Debug for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mode({})", self)
    }
}

/// Classification of a tree entry's mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    /// Regular file (non-executable): 100644
    Regular,
    /// Executable file: 100755
    Executable,
    /// Symbolic link: 120000
    Symlink,
    /// Subdirectory (tree): 40000
    Directory,
    /// Git submodule (commit): 160000
    Submodule,
}

impl FileMode {
    /// Returns the type of object an entry with this mode points to.
    pub fn object_type(&self) -> ObjectType {
        match self {
            FileMode::Directory => ObjectType::Tree,
            FileMode::Submodule => ObjectType::Commit,
            FileMode::Regular | FileMode::Executable | FileMode::Symlink => ObjectType::Blob,
        }
    }
}

/// An entry in a Git tree object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    mode: Mode,
    path: String,
    oid: Oid,
}

impl TreeEntry {
    /// Creates an entry. `path` is a single path component.
    pub fn new(mode: Mode, path: impl Into<String>, oid: Oid) -> Self {
        Self {
            mode,
            path: path.into(),
            oid,
        }
    }

    /// Returns the mode of the entry.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns the name of the entry.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the object ID of the entry.
    pub fn oid(&self) -> &Oid {
        &self.oid
    }

    /// Returns true if this entry represents a directory (tree).
    pub fn is_tree(&self) -> bool {
        self.mode.is_tree()
    }

    /// Canonical ordering: by name, with directories compared as if their
    /// name ended in `/`.
    fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(other.sort_key())
    }

    fn sort_key(&self) -> impl Iterator<Item = &u8> + '_ {
        let suffix: &'static [u8] = if self.is_tree() { b"/" } else { b"" };
        self.path.as_bytes().iter().chain(suffix.iter())
    }
}

/// A Git tree object representing a directory listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

impl Tree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tree from entries given in any order.
    ///
    /// The entries are stored in canonical order, so two trees built from
    /// the same entries compare equal regardless of input order.
    pub fn from_entries(mut entries: Vec<TreeEntry>) -> Self {
        entries.sort_by(TreeEntry::canonical_cmp);
        Self { entries }
    }

    /// Parses a tree payload.
    ///
    /// Each entry is `<mode> <name>\0<20-byte-sha1>`. Entries are kept in
    /// on-disk order.
    pub fn parse(content: &[u8]) -> Result<Self> {
        let mut entries = Vec::new();
        let mut pos = 0;

        while pos < content.len() {
            let space = content[pos..]
                .iter()
                .position(|&b| b == b' ')
                .ok_or_else(|| malformed("missing space in tree entry"))?;
            let mode = Mode::parse(&content[pos..pos + space])?;
            pos += space + 1;

            let nul = content[pos..]
                .iter()
                .position(|&b| b == 0)
                .ok_or_else(|| malformed("missing null byte in tree entry"))?;
            let path = std::str::from_utf8(&content[pos..pos + nul])
                .map_err(|_| Error::InvalidUtf8)?
                .to_string();
            pos += nul + 1;

            if content.len() - pos < OID_BYTES {
                return Err(Error::TruncatedTree { offset: pos });
            }
            let oid = Oid::from_slice(&content[pos..pos + OID_BYTES])?;
            pos += OID_BYTES;

            entries.push(TreeEntry { mode, path, oid });
        }

        Ok(Tree { entries })
    }

    /// Serializes the tree payload in canonical order.
    pub fn serialize(&self) -> Vec<u8> {
        let mut sorted: Vec<&TreeEntry> = self.entries.iter().collect();
        sorted.sort_by(|a, b| a.canonical_cmp(b));

        let mut content = Vec::new();
        for entry in sorted {
            content.extend_from_slice(entry.mode.as_bytes());
            content.push(b' ');
            content.extend_from_slice(entry.path.as_bytes());
            content.push(0);
            content.extend_from_slice(entry.oid.as_bytes());
        }
        content
    }

    /// Adds an entry at its canonical position, after any entry that
    /// compares equal.
    pub fn push(&mut self, entry: TreeEntry) {
        let pos = self
            .entries
            .iter()
            .position(|e| e.canonical_cmp(&entry) == Ordering::Greater)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, entry);
    }

    /// Returns a slice of all entries in the tree.
    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    /// Returns the number of entries in the tree.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the tree has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finds an entry by name.
    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.path == name)
    }

    /// Returns an iterator over the entries.
    pub fn iter(&self) -> impl Iterator<Item = &TreeEntry> {
        self.entries.iter()
    }
}

fn malformed(reason: &str) -> Error {
    Error::InvalidObject {
        oid: String::new(),
        reason: reason.to_string(),
    }
}
