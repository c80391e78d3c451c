//! Git annotated tag object implementation.

use super::commit::{missing, parse_oid, Signature};
use super::kvlm::Kvlm;
use super::oid::Oid;
use super::store::ObjectType;
use crate::error::{Error, Result};

/// An annotated tag object.
///
/// Annotated tags are real objects that name another object (usually a
/// commit) together with a tagger and a message. Lightweight tags, by
/// contrast, are plain refs.
///
/// ```text
/// object <sha1>
/// type <type>
/// tag <tag-name>
/// tagger <signature>
///
/// <message>
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    kvlm: Kvlm,
}

impl Tag {
    /// Builds a tag pointing at `object`.
    pub fn new(
        object: &Oid,
        object_type: ObjectType,
        tag_name: &str,
        tagger: &Signature,
        message: &str,
    ) -> Self {
        let mut kvlm = Kvlm::new();
        kvlm.push("object", object.to_hex());
        kvlm.push("type", object_type.as_str());
        kvlm.push("tag", tag_name);
        kvlm.push("tagger", tagger.to_string());
        kvlm.set_message(format!("{}\n", message.trim()));
        Tag { kvlm }
    }

    /// Parses a tag payload.
    pub fn parse(content: &[u8]) -> Result<Self> {
        Ok(Tag {
            kvlm: Kvlm::parse(content)?,
        })
    }

    /// Serializes the tag payload.
    pub fn serialize(&self) -> Vec<u8> {
        self.kvlm.serialize()
    }

    /// Returns the underlying key-value list.
    pub fn kvlm(&self) -> &Kvlm {
        &self.kvlm
    }

    /// Returns the OID of the tagged object.
    pub fn object(&self) -> Result<Oid> {
        let value = self.kvlm.get(b"object").ok_or_else(|| missing("object"))?;
        parse_oid(value)
    }

    /// Returns the declared type of the tagged object.
    pub fn object_type(&self) -> Result<ObjectType> {
        let value = self.kvlm.get(b"type").ok_or_else(|| missing("type"))?;
        ObjectType::from_bytes(value)
    }

    /// Returns the tag name.
    pub fn tag_name(&self) -> Result<&str> {
        let value = self.kvlm.get(b"tag").ok_or_else(|| missing("tag"))?;
        std::str::from_utf8(value).map_err(|_| Error::InvalidUtf8)
    }

    /// Returns the tagger's signature.
    pub fn tagger(&self) -> Result<Signature> {
        let value = self.kvlm.get(b"tagger").ok_or_else(|| missing("tagger"))?;
        Signature::parse(std::str::from_utf8(value).map_err(|_| Error::InvalidUtf8)?)
    }

    /// Returns the tag message.
    pub fn message(&self) -> Result<&str> {
        std::str::from_utf8(self.kvlm.message()).map_err(|_| Error::InvalidUtf8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TARGET: &str = "0123456789abcdef0123456789abcdef01234567";

    fn make_tag_content() -> Vec<u8> {
        format!(
            "object {}\ntype commit\ntag v1.0.0\ntagger John Doe <john@example.com> 1700000000 +0000\n\nRelease v1.0.0\n",
            TARGET
        )
        .into_bytes()
    }

    // TG-001: Parse tag fields
    #[test]
    fn test_parse_tag() {
        let tag = Tag::parse(&make_tag_content()).unwrap();

        assert_eq!(tag.object().unwrap().to_hex(), TARGET);
        assert_eq!(tag.object_type().unwrap(), ObjectType::Commit);
        assert_eq!(tag.tag_name().unwrap(), "v1.0.0");
        assert_eq!(tag.tagger().unwrap().name(), "John Doe");
        assert_eq!(tag.message().unwrap(), "Release v1.0.0\n");
    }

    // TG-002: Tag::new produces the same bytes Git writes
    #[test]
    fn test_new_tag() {
        let tagger = Signature::new("John Doe", "john@example.com", 1700000000, 0);
        let tag = Tag::new(
            &Oid::from_hex(TARGET).unwrap(),
            ObjectType::Commit,
            "v1.0.0",
            &tagger,
            "Release v1.0.0",
        );
        assert_eq!(tag.serialize(), make_tag_content());
    }

    // TG-003: missing object field
    #[test]
    fn test_missing_object() {
        let tag = Tag::parse(b"type commit\n\nmsg").unwrap();
        assert!(matches!(tag.object(), Err(Error::InvalidObject { .. })));
    }

    // TG-004: unknown target type
    #[test]
    fn test_unknown_target_type() {
        let tag = Tag::parse(b"type gizmo\n\n").unwrap();
        assert!(matches!(
            tag.object_type(),
            Err(Error::UnknownObjectType(_))
        ));
    }
}
