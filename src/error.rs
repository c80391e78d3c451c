//! Error types for gitcore.

use std::path::PathBuf;

use thiserror::Error;

use crate::objects::Oid;

/// Broad category of an [`Error`].
///
/// Callers that only need to know *what went wrong* (absent, ambiguous,
/// corrupt, unrecognized) can match on this instead of individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// An object, reference or name does not exist.
    NotFound,
    /// A name matched more than one object.
    Ambiguous,
    /// Persisted data failed a consistency check.
    Malformed,
    /// An object type or mode outside the recognized set.
    UnknownKind,
    /// The operating system reported a failure.
    Io,
    /// The caller asked for something the store refuses to do.
    Usage,
}

/// The main error type for gitcore operations.
#[derive(Debug, Error)]
pub enum Error {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The specified path is not a usable control directory.
    #[error("not a git repository: {}", .0.display())]
    NotARepository(PathBuf),

    /// The requested object was not found.
    #[error("object not found: {0}")]
    ObjectNotFound(String),

    /// The requested reference was not found.
    #[error("reference not found: {0}")]
    RefNotFound(String),

    /// A name did not resolve to any object.
    #[error("no such reference: {0}")]
    NameNotFound(String),

    /// A name resolved to more than one object.
    #[error("ambiguous reference {name}: candidates are {}", format_candidates(.candidates))]
    Ambiguous {
        /// The name that was resolved.
        name: String,
        /// Every object the name matched.
        candidates: Vec<Oid>,
    },

    /// The provided string is not a valid object ID.
    #[error("invalid object id: {0}")]
    InvalidOid(String),

    /// The provided string is not a valid reference name.
    #[error("invalid reference name: {0}")]
    InvalidRefName(String),

    /// The object is invalid or corrupted.
    #[error("invalid object {oid}: {reason}")]
    InvalidObject {
        /// The object ID (empty when not yet known).
        oid: String,
        /// The reason for invalidity.
        reason: String,
    },

    /// An object header names a type outside blob/tree/commit/tag.
    #[error("unknown object type: {0}")]
    UnknownObjectType(String),

    /// A tree or index mode outside the recognized set.
    #[error("unknown file mode: {0}")]
    UnknownMode(String),

    /// A commit or tag payload is not a valid key-value list.
    #[error("malformed key-value list: {0}")]
    MalformedKvlm(String),

    /// A tree entry ends before its 20-byte object ID.
    #[error("truncated tree entry at offset {offset}")]
    TruncatedTree {
        /// Byte offset of the entry's object ID.
        offset: usize,
    },

    /// The index file does not start with `DIRC`.
    #[error("bad index signature: {0:?}")]
    BadIndexSignature([u8; 4]),

    /// The index file version is not 2.
    #[error("unsupported index version: {0}")]
    UnsupportedIndexVersion(u32),

    /// The index file is invalid.
    #[error("invalid index: {reason}")]
    InvalidIndex {
        /// The reason for invalidity.
        reason: String,
    },

    /// Type mismatch when expecting a specific object type.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The expected type.
        expected: &'static str,
        /// The actual type.
        actual: &'static str,
    },

    /// Invalid UTF-8 sequence encountered.
    #[error("invalid UTF-8 sequence")]
    InvalidUtf8,

    /// Zlib decompression failed.
    #[error("zlib decompression failed")]
    DecompressionFailed,

    /// The reference already exists.
    #[error("reference already exists: {0}")]
    RefAlreadyExists(String),

    /// Another writer holds the lock file.
    #[error("unable to lock {}: lock file exists", .0.display())]
    Locked(PathBuf),

    /// The index holds a conflicted (stage > 0) entry.
    #[error("cannot build a tree from unmerged entry: {0}")]
    UnmergedEntry(String),
}

fn format_candidates(candidates: &[Oid]) -> String {
    candidates
        .iter()
        .map(|oid| oid.to_hex())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Error {
    /// Returns the broad category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ObjectNotFound(_) | Error::RefNotFound(_) | Error::NameNotFound(_) => {
                ErrorKind::NotFound
            }
            Error::Ambiguous { .. } => ErrorKind::Ambiguous,
            Error::InvalidObject { .. }
            | Error::MalformedKvlm(_)
            | Error::TruncatedTree { .. }
            | Error::BadIndexSignature(_)
            | Error::UnsupportedIndexVersion(_)
            | Error::InvalidIndex { .. }
            | Error::InvalidOid(_)
            | Error::InvalidUtf8
            | Error::DecompressionFailed => ErrorKind::Malformed,
            Error::UnknownObjectType(_) | Error::UnknownMode(_) => ErrorKind::UnknownKind,
            Error::Io(_) => ErrorKind::Io,
            Error::NotARepository(_)
            | Error::InvalidRefName(_)
            | Error::TypeMismatch { .. }
            | Error::RefAlreadyExists(_)
            | Error::Locked(_)
            | Error::UnmergedEntry(_) => ErrorKind::Usage,
        }
    }
}

/// Result type alias for gitcore operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    // E-001: Error::Io can be created from std::io::Error
    #[test]
    fn test_error_from_io() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: Error = io_error.into();
        assert!(matches!(error, Error::Io(_)));
        assert!(error.to_string().contains("I/O error"));
        assert_eq!(error.kind(), ErrorKind::Io);
    }

    // E-002: Display messages
    #[test]
    fn test_error_display() {
        let error = Error::ObjectNotFound("abc123".to_string());
        assert_eq!(error.to_string(), "object not found: abc123");

        let error = Error::UnsupportedIndexVersion(3);
        assert_eq!(error.to_string(), "unsupported index version: 3");

        let error = Error::TruncatedTree { offset: 12 };
        assert_eq!(error.to_string(), "truncated tree entry at offset 12");
    }

    // E-003: Ambiguous lists every candidate
    #[test]
    fn test_ambiguous_display() {
        let a = Oid::from_hex("abcd000000000000000000000000000000000001").unwrap();
        let b = Oid::from_hex("abcd000000000000000000000000000000000002").unwrap();
        let error = Error::Ambiguous {
            name: "abcd".to_string(),
            candidates: vec![a, b],
        };
        let message = error.to_string();
        assert!(message.contains(&a.to_hex()));
        assert!(message.contains(&b.to_hex()));
        assert_eq!(error.kind(), ErrorKind::Ambiguous);
    }

    // E-004: source() exposes the underlying io::Error only
    #[test]
    fn test_error_source() {
        let error: Error = std::io::Error::new(std::io::ErrorKind::Other, "test").into();
        assert!(StdError::source(&error).is_some());
        assert!(StdError::source(&Error::InvalidUtf8).is_none());
    }

    // E-005: kind() groups variants into the four store categories
    #[test]
    fn test_error_kinds() {
        assert_eq!(
            Error::NameNotFound("x".to_string()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(Error::BadIndexSignature(*b"XXXX").kind(), ErrorKind::Malformed);
        assert_eq!(
            Error::UnknownObjectType("blub".to_string()).kind(),
            ErrorKind::UnknownKind
        );
        assert_eq!(Error::UnknownMode("777".to_string()).kind(), ErrorKind::UnknownKind);
        assert_eq!(
            Error::MalformedKvlm("no message".to_string()).kind(),
            ErrorKind::Malformed
        );
    }
}
