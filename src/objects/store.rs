//! Git loose object store implementation.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, trace};

use super::oid::{Oid, OID_HEX_LEN};
use super::Object;
use crate::error::{Error, Result};
use crate::infra::compression::DEFAULT_LEVEL;
use crate::infra::{compress, decompress, hash_object, read_file, write_file_atomic};

/// The type of a Git object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    /// A blob (file content).
    Blob,
    /// A tree (directory listing).
    Tree,
    /// A commit.
    Commit,
    /// A tag.
    Tag,
}

impl ObjectType {
    /// Returns the type name as used in Git object headers.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Blob => "blob",
            ObjectType::Tree => "tree",
            ObjectType::Commit => "commit",
            ObjectType::Tag => "tag",
        }
    }

    /// Parses a type name from a Git object header.
    pub fn from_bytes(name: &[u8]) -> Result<Self> {
        match name {
            b"blob" => Ok(ObjectType::Blob),
            b"tree" => Ok(ObjectType::Tree),
            b"commit" => Ok(ObjectType::Commit),
            b"tag" => Ok(ObjectType::Tag),
            _ => Err(Error::UnknownObjectType(
                String::from_utf8_lossy(name).into_owned(),
            )),
        }
    }
}

impl FromStr for ObjectType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ObjectType::from_bytes(s.as_bytes())
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A store for reading and writing loose Git objects.
///
/// Loose objects are stored in `objects/` as individual zlib-compressed
/// files, with the path determined by the object's SHA-1 hash.
#[derive(Debug)]
pub struct LooseObjectStore {
    /// Path to the objects directory (e.g., `.git/objects`).
    objects_dir: PathBuf,
    /// Zlib level used for new objects.
    compression_level: u8,
}

impl LooseObjectStore {
    /// Creates a new LooseObjectStore for the given objects directory.
    pub fn new<P: AsRef<Path>>(objects_dir: P) -> Self {
        LooseObjectStore {
            objects_dir: objects_dir.as_ref().to_path_buf(),
            compression_level: DEFAULT_LEVEL,
        }
    }

    /// Sets the zlib level used when writing objects.
    pub fn with_compression_level(mut self, level: u8) -> Self {
        self.compression_level = level;
        self
    }

    /// Converts an Oid to the path of its loose object file.
    ///
    /// For example, `da39a3ee5e6b4b0d3255bfef95601890afd80709` becomes
    /// `objects/da/39a3ee5e6b4b0d3255bfef95601890afd80709`.
    pub fn oid_to_path(&self, oid: &Oid) -> PathBuf {
        let hex = oid.to_hex();
        self.objects_dir.join(&hex[..2]).join(&hex[2..])
    }

    /// Reads and decodes a Git object by its Oid.
    ///
    /// # Errors
    ///
    /// - `Error::ObjectNotFound` if no file exists for the Oid
    /// - `Error::DecompressionFailed` if the file is not valid zlib
    /// - `Error::InvalidObject` / `Error::UnknownObjectType` if decoding fails
    pub fn read(&self, oid: &Oid) -> Result<Object> {
        let compressed = read_file(self.oid_to_path(oid))?
            .ok_or_else(|| Error::ObjectNotFound(oid.to_hex()))?;
        let decompressed = decompress(&compressed)?;
        Object::decode(&decompressed).map_err(|e| match e {
            Error::InvalidObject { reason, .. } => Error::InvalidObject {
                oid: oid.to_hex(),
                reason,
            },
            other => other,
        })
    }

    /// Checks if an object exists in the store.
    pub fn exists(&self, oid: &Oid) -> bool {
        self.oid_to_path(oid).exists()
    }

    /// Finds objects whose Oid starts with the given prefix.
    ///
    /// The prefix must be 4 to 40 hexadecimal characters. Every loose
    /// object whose name starts with it is returned, sorted.
    pub fn find_objects_by_prefix(&self, prefix: &str) -> Result<Vec<Oid>> {
        if !Oid::is_hex_prefix(prefix) {
            return Err(Error::InvalidOid(prefix.to_string()));
        }

        let prefix = prefix.to_lowercase();
        let (dir_prefix, file_prefix) = prefix.split_at(2);

        let subdir = self.objects_dir.join(dir_prefix);
        if !subdir.is_dir() {
            return Ok(Vec::new());
        }

        let mut matches = Vec::new();
        for entry in fs::read_dir(&subdir)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let name = file_name.to_string_lossy();

            if name.starts_with(file_prefix) && name.len() == OID_HEX_LEN - 2 {
                if let Ok(oid) = Oid::from_hex(&format!("{}{}", dir_prefix, name)) {
                    matches.push(oid);
                }
            }
        }

        matches.sort();
        Ok(matches)
    }

    /// Computes the Oid a payload would have, without touching the store.
    pub fn hash_only(object_type: ObjectType, content: &[u8]) -> Oid {
        Oid::from_bytes(hash_object(object_type.as_str(), content))
    }

    /// Encodes and writes an object.
    ///
    /// Writing is idempotent: if the object already exists the file is
    /// left alone and the same Oid is returned.
    pub fn write(&self, object: &Object) -> Result<Oid> {
        self.write_raw(object.kind(), &object.serialize())
    }

    /// Writes an already-serialized payload of the given type.
    pub fn write_raw(&self, object_type: ObjectType, content: &[u8]) -> Result<Oid> {
        let oid = Self::hash_only(object_type, content);

        let path = self.oid_to_path(&oid);
        if path.exists() {
            trace!(%oid, kind = %object_type, "object already stored");
            return Ok(oid);
        }

        let mut raw = format!("{} {}\0", object_type.as_str(), content.len()).into_bytes();
        raw.extend_from_slice(content);

        write_file_atomic(&path, &compress(&raw, self.compression_level))?;
        debug!(%oid, kind = %object_type, size = content.len(), "wrote object");

        Ok(oid)
    }
}
