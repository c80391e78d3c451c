//! Git object types and the object codec.
//!
//! Every object is stored as `<type> <decimal-length>\0<payload>`; its id is
//! the SHA-1 of exactly those bytes.

pub mod blob;
pub mod commit;
pub mod kvlm;
pub mod oid;
pub mod store;
pub mod tag;
pub mod tree;

pub use blob::Blob;
pub use commit::{Commit, Signature};
pub use kvlm::Kvlm;
pub use oid::Oid;
pub use store::{LooseObjectStore, ObjectType};
pub use tag::Tag;
pub use tree::{FileMode, Mode, Tree, TreeEntry};

use crate::error::{Error, Result};

/// Any Git object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Object {
    /// A blob object containing file content.
    Blob(Blob),
    /// A tree object containing directory entries.
    Tree(Tree),
    /// A commit object.
    Commit(Commit),
    /// An annotated tag object.
    Tag(Tag),
}

impl Object {
    /// Returns the type of this object.
    pub fn kind(&self) -> ObjectType {
        match self {
            Object::Blob(_) => ObjectType::Blob,
            Object::Tree(_) => ObjectType::Tree,
            Object::Commit(_) => ObjectType::Commit,
            Object::Tag(_) => ObjectType::Tag,
        }
    }

    /// Decodes a payload of a known type.
    pub fn from_payload(kind: ObjectType, payload: &[u8]) -> Result<Self> {
        Ok(match kind {
            ObjectType::Blob => Object::Blob(Blob::new(payload)),
            ObjectType::Tree => Object::Tree(Tree::parse(payload)?),
            ObjectType::Commit => Object::Commit(Commit::parse(payload)?),
            ObjectType::Tag => Object::Tag(Tag::parse(payload)?),
        })
    }

    /// Serializes the payload (without the header).
    pub fn serialize(&self) -> Vec<u8> {
        match self {
            Object::Blob(blob) => blob.content().to_vec(),
            Object::Tree(tree) => tree.serialize(),
            Object::Commit(commit) => commit.serialize(),
            Object::Tag(tag) => tag.serialize(),
        }
    }

    /// Encodes the object as `<type> <len>\0<payload>`.
    pub fn encode(&self) -> Vec<u8> {
        let payload = self.serialize();
        let mut out = format!("{} {}\0", self.kind().as_str(), payload.len()).into_bytes();
        out.extend_from_slice(&payload);
        out
    }

    /// Decodes `<type> <len>\0<payload>`.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidObject` if the header is malformed or the declared
    ///   length differs from the payload length
    /// - `Error::UnknownObjectType` if the type is not blob/tree/commit/tag
    pub fn decode(data: &[u8]) -> Result<Self> {
        let nul = data
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| invalid("missing null byte in header"))?;
        let header = &data[..nul];

        let space = header
            .iter()
            .position(|&b| b == b' ')
            .ok_or_else(|| invalid("missing object size"))?;
        let kind = ObjectType::from_bytes(&header[..space])?;

        let size = parse_size(&header[space + 1..]).ok_or_else(|| invalid("invalid size"))?;

        let payload = &data[nul + 1..];
        if payload.len() != size {
            return Err(invalid(&format!(
                "bad length: header says {} but content is {} bytes",
                size,
                payload.len()
            )));
        }

        Object::from_payload(kind, payload)
    }

    /// Computes this object's id.
    pub fn oid(&self) -> Oid {
        LooseObjectStore::hash_only(self.kind(), &self.serialize())
    }

    /// Returns a reference to the inner Blob if this is a Blob object.
    pub fn as_blob(&self) -> Option<&Blob> {
        match self {
            Object::Blob(blob) => Some(blob),
            _ => None,
        }
    }

    /// Returns a reference to the inner Tree if this is a Tree object.
    pub fn as_tree(&self) -> Option<&Tree> {
        match self {
            Object::Tree(tree) => Some(tree),
            _ => None,
        }
    }

    /// Returns a reference to the inner Commit if this is a Commit object.
    pub fn as_commit(&self) -> Option<&Commit> {
        match self {
            Object::Commit(commit) => Some(commit),
            _ => None,
        }
    }

    /// Returns a reference to the inner Tag if this is a Tag object.
    pub fn as_tag(&self) -> Option<&Tag> {
        match self {
            Object::Tag(tag) => Some(tag),
            _ => None,
        }
    }

    /// Consumes this Object and returns the inner Tree, or a type mismatch.
    pub fn into_tree(self) -> Result<Tree> {
        match self {
            Object::Tree(tree) => Ok(tree),
            other => Err(mismatch("tree", other.kind())),
        }
    }

    /// Consumes this Object and returns the inner Commit, or a type mismatch.
    pub fn into_commit(self) -> Result<Commit> {
        match self {
            Object::Commit(commit) => Ok(commit),
            other => Err(mismatch("commit", other.kind())),
        }
    }
}

/// Parses a canonical decimal length: digits only, no leading zero
/// unless the length is zero itself.
fn parse_size(digits: &[u8]) -> Option<usize> {
    let canonical = !digits.is_empty()
        && digits.iter().all(u8::is_ascii_digit)
        && (digits[0] != b'0' || digits.len() == 1);
    if !canonical {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}

fn invalid(reason: &str) -> Error {
    Error::InvalidObject {
        oid: String::new(),
        reason: reason.to_string(),
    }
}

fn mismatch(expected: &'static str, actual: ObjectType) -> Error {
    Error::TypeMismatch {
        expected,
        actual: actual.as_str(),
    }
}

impl From<Blob> for Object {
    fn from(blob: Blob) -> Self {
        Object::Blob(blob)
    }
}

impl From<Tree> for Object {
    fn from(tree: Tree) -> Self {
        Object::Tree(tree)
    }
}

impl From<Commit> for Object {
    fn from(commit: Commit) -> Self {
        Object::Commit(commit)
    }
}

impl From<Tag> for Object {
    fn from(tag: Tag) -> Self {
        Object::Tag(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMMIT: &str = "tree da39a3ee5e6b4b0d3255bfef95601890afd80709\n\
author John Doe <john@example.com> 1234567890 +0000\n\
committer John Doe <john@example.com> 1234567890 +0000\n\
\n\
Test commit\n";

    fn sample_tree() -> Tree {
        Tree::from_entries(vec![
            TreeEntry::new(Mode::REGULAR, "README", Oid::from_bytes([1; 20])),
            TreeEntry::new(Mode::DIRECTORY, "src", Oid::from_bytes([2; 20])),
        ])
    }

    // OB-001: encode prefixes the typed header
    #[test]
    fn test_encode_header() {
        let blob = Object::from(Blob::new(b"hello".to_vec()));
        assert_eq!(blob.encode(), b"blob 5\0hello");
    }

    // OB-002: decode(encode(o)) == o for all four kinds
    #[test]
    fn test_roundtrip_all_kinds() {
        let tag = Tag::parse(
            b"object da39a3ee5e6b4b0d3255bfef95601890afd80709\ntype commit\ntag v1\n\nmsg\n",
        )
        .unwrap();
        let objects = vec![
            Object::from(Blob::new(vec![0, 1, 2, 255])),
            Object::from(sample_tree()),
            Object::from(Commit::parse(COMMIT.as_bytes()).unwrap()),
            Object::from(tag),
        ];

        for object in objects {
            assert_eq!(Object::decode(&object.encode()).unwrap(), object);
        }
    }

    // OB-008: a tree assembled entry by entry survives the codec
    #[test]
    fn test_roundtrip_pushed_tree() {
        let mut tree = Tree::new();
        tree.push(TreeEntry::new(Mode::REGULAR, "b.txt", Oid::from_bytes([1; 20])));
        tree.push(TreeEntry::new(Mode::DIRECTORY, "a", Oid::from_bytes([2; 20])));
        let object = Object::from(tree);

        assert_eq!(Object::decode(&object.encode()).unwrap(), object);
    }

    // OB-003: length mismatch is malformed
    #[test]
    fn test_decode_bad_length() {
        assert!(matches!(
            Object::decode(b"blob 4\0hello"),
            Err(Error::InvalidObject { .. })
        ));
        assert!(matches!(
            Object::decode(b"blob 6\0hello"),
            Err(Error::InvalidObject { .. })
        ));
    }

    // OB-004: unknown type
    #[test]
    fn test_decode_unknown_type() {
        assert!(matches!(
            Object::decode(b"blurb 5\0hello"),
            Err(Error::UnknownObjectType(name)) if name == "blurb"
        ));
    }

    // OB-005: header errors
    #[test]
    fn test_decode_bad_header() {
        assert!(Object::decode(b"blob 5hello").is_err());
        assert!(Object::decode(b"blob\0").is_err());
        assert!(Object::decode(b"blob x\0").is_err());
        let non_canonical: [&[u8]; 4] = [
            b"blob +5\0hello",
            b"blob 05\0hello",
            b"blob  5\0hello",
            b"blob 5 \0hello",
        ];
        for header in non_canonical {
            assert!(
                matches!(Object::decode(header), Err(Error::InvalidObject { .. })),
                "{:?} accepted",
                String::from_utf8_lossy(header)
            );
        }
        assert_eq!(
            Object::decode(b"blob 0\0").unwrap(),
            Object::from(Blob::new(Vec::new()))
        );
    }

    // OB-006: oid() is the hash of the encoding
    #[test]
    fn test_oid() {
        let blob = Object::from(Blob::new(b"hello\n".to_vec()));
        assert_eq!(blob.oid().to_hex(), "ce013625030ba8dba906f756967f9e9ca394464a");
        assert_eq!(
            Object::from(Tree::new()).oid().to_hex(),
            "4b825dc642cb6eb9a060e54bf8d69288fbee4904"
        );
    }

    // OB-007: accessors
    #[test]
    fn test_accessors() {
        let tree = Object::from(sample_tree());
        assert_eq!(tree.kind(), ObjectType::Tree);
        assert!(tree.as_tree().is_some());
        assert!(tree.as_blob().is_none());
        assert!(tree.as_commit().is_none());
        assert!(tree.as_tag().is_none());
        assert!(matches!(
            tree.clone().into_commit(),
            Err(Error::TypeMismatch {
                expected: "commit",
                actual: "tree"
            })
        ));
        assert_eq!(tree.into_tree().unwrap().len(), 2);
    }
}
