//! Git commit object implementation.

use std::fmt;

use super::kvlm::Kvlm;
use super::oid::Oid;
use crate::error::{Error, Result};

/// A signature representing an author, committer or tagger.
///
/// Contains the name, email, timestamp, and timezone offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    name: String,
    email: String,
    /// Unix timestamp (seconds since epoch).
    timestamp: i64,
    /// Timezone offset in minutes (e.g., +0900 = 540, -0500 = -300).
    tz_offset: i32,
}

impl Signature {
    /// Creates a new Signature.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        timestamp: i64,
        tz_offset: i32,
    ) -> Self {
        Signature {
            name: name.into(),
            email: email.into(),
            timestamp,
            tz_offset,
        }
    }

    /// Creates a signature stamped with the current system time at `+0000`.
    pub fn now(name: impl Into<String>, email: impl Into<String>) -> Self {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        Signature::new(name, email, timestamp, 0)
    }

    /// Returns the name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the email address.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns the Unix timestamp.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Returns the timezone offset in minutes.
    pub fn tz_offset(&self) -> i32 {
        self.tz_offset
    }

    /// Parses a signature from a Git signature line.
    ///
    /// Format: `Name <email> timestamp timezone`
    /// Example: `John Doe <john@example.com> 1234567890 +0900`
    pub fn parse(s: &str) -> Result<Self> {
        let email_start = s.find('<').ok_or_else(|| bad_signature(s))?;
        let email_end = s.find('>').ok_or_else(|| bad_signature(s))?;
        if email_start >= email_end {
            return Err(bad_signature(s));
        }

        let name = s[..email_start].trim().to_string();
        let email = s[email_start + 1..email_end].to_string();

        let mut parts = s[email_end + 1..].split_whitespace();
        let timestamp: i64 = parts
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| bad_signature(s))?;
        let tz_offset = parts
            .next()
            .and_then(parse_timezone)
            .ok_or_else(|| bad_signature(s))?;

        Ok(Signature {
            name,
            email,
            timestamp,
            tz_offset,
        })
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.tz_offset < 0 { '-' } else { '+' };
        let offset = self.tz_offset.abs();
        write!(
            f,
            "{} <{}> {} {}{:02}{:02}",
            self.name,
            self.email,
            self.timestamp,
            sign,
            offset / 60,
            offset % 60
        )
    }
}

/// Parses a timezone string like "+0900" or "-0500" into minutes offset.
fn parse_timezone(s: &str) -> Option<i32> {
    if s.len() != 5 {
        return None;
    }

    let sign = match s.as_bytes()[0] {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };

    let hours: i32 = s[1..3].parse().ok()?;
    let minutes: i32 = s[3..5].parse().ok()?;

    Some(sign * (hours * 60 + minutes))
}

fn bad_signature(s: &str) -> Error {
    Error::InvalidObject {
        oid: String::new(),
        reason: format!("malformed signature: {}", s),
    }
}

/// A Git commit object.
///
/// A thin view over the commit's key-value list; headers other than the
/// ones exposed here (`gpgsig`, `encoding`, ...) are preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    kvlm: Kvlm,
}

impl Commit {
    /// Builds a commit.
    ///
    /// The message is trimmed and given exactly one trailing newline.
    pub fn new(
        tree: &Oid,
        parents: &[Oid],
        author: &Signature,
        committer: &Signature,
        message: &str,
    ) -> Self {
        let mut kvlm = Kvlm::new();
        kvlm.push("tree", tree.to_hex());
        for parent in parents {
            kvlm.push("parent", parent.to_hex());
        }
        kvlm.push("author", author.to_string());
        kvlm.push("committer", committer.to_string());
        kvlm.set_message(format!("{}\n", message.trim()));
        Commit { kvlm }
    }

    /// Parses a commit payload.
    pub fn parse(content: &[u8]) -> Result<Self> {
        Ok(Commit {
            kvlm: Kvlm::parse(content)?,
        })
    }

    /// Serializes the commit payload.
    pub fn serialize(&self) -> Vec<u8> {
        self.kvlm.serialize()
    }

    /// Returns the underlying key-value list.
    pub fn kvlm(&self) -> &Kvlm {
        &self.kvlm
    }

    /// Returns the tree object ID.
    pub fn tree(&self) -> Result<Oid> {
        let value = self.kvlm.get(b"tree").ok_or_else(|| missing("tree"))?;
        parse_oid(value)
    }

    /// Returns the parent commit IDs. Empty for root commits.
    pub fn parents(&self) -> Result<Vec<Oid>> {
        self.kvlm
            .get_all(b"parent")
            .iter()
            .map(|value| parse_oid(value))
            .collect()
    }

    /// Returns the author signature.
    pub fn author(&self) -> Result<Signature> {
        self.signature("author")
    }

    /// Returns the committer signature.
    pub fn committer(&self) -> Result<Signature> {
        self.signature("committer")
    }

    /// Returns the full commit message.
    pub fn message(&self) -> Result<&str> {
        std::str::from_utf8(self.kvlm.message()).map_err(|_| Error::InvalidUtf8)
    }

    /// Returns the first line of the commit message.
    pub fn summary(&self) -> Result<&str> {
        Ok(self.message()?.lines().next().unwrap_or(""))
    }

    fn signature(&self, key: &'static str) -> Result<Signature> {
        let value = self
            .kvlm
            .get(key.as_bytes())
            .ok_or_else(|| missing(key))?;
        Signature::parse(std::str::from_utf8(value).map_err(|_| Error::InvalidUtf8)?)
    }
}

/// Parses a hex object ID stored as a header value.
pub(crate) fn parse_oid(value: &[u8]) -> Result<Oid> {
    let hex = std::str::from_utf8(value).map_err(|_| Error::InvalidUtf8)?;
    Oid::from_hex(hex)
}

pub(crate) fn missing(key: &str) -> Error {
    Error::InvalidObject {
        oid: String::new(),
        reason: format!("missing {}", key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TREE: &str = "da39a3ee5e6b4b0d3255bfef95601890afd80709";
    const PARENT: &str = "0123456789abcdef0123456789abcdef01234567";

    fn make_commit_content(parents: &[&str]) -> Vec<u8> {
        let mut content = format!("tree {}\n", TREE);
        for parent in parents {
            content.push_str(&format!("parent {}\n", parent));
        }
        content.push_str("author John Doe <john@example.com> 1700000000 +0900\n");
        content.push_str("committer Jane Doe <jane@example.com> 1700000001 -0500\n");
        content.push_str("\nInitial commit\n\nBody text\n");
        content.into_bytes()
    }

    // C-001: Parse commit fields
    #[test]
    fn test_parse_commit() {
        let commit = Commit::parse(&make_commit_content(&[PARENT])).unwrap();

        assert_eq!(commit.tree().unwrap().to_hex(), TREE);
        assert_eq!(commit.parents().unwrap().len(), 1);
        assert_eq!(commit.parents().unwrap()[0].to_hex(), PARENT);
        assert_eq!(commit.summary().unwrap(), "Initial commit");
        assert_eq!(commit.message().unwrap(), "Initial commit\n\nBody text\n");
    }

    // C-002: Signatures
    #[test]
    fn test_signatures() {
        let commit = Commit::parse(&make_commit_content(&[])).unwrap();

        let author = commit.author().unwrap();
        assert_eq!(author.name(), "John Doe");
        assert_eq!(author.email(), "john@example.com");
        assert_eq!(author.timestamp(), 1700000000);
        assert_eq!(author.tz_offset(), 540);

        let committer = commit.committer().unwrap();
        assert_eq!(committer.tz_offset(), -300);
        assert_eq!(
            committer.to_string(),
            "Jane Doe <jane@example.com> 1700000001 -0500"
        );
    }

    // C-003: Merge commit keeps parent order
    #[test]
    fn test_merge_parents() {
        let commit = Commit::parse(&make_commit_content(&[PARENT, TREE])).unwrap();
        let parents = commit.parents().unwrap();
        assert_eq!(parents[0].to_hex(), PARENT);
        assert_eq!(parents[1].to_hex(), TREE);
    }

    // C-004: Root commit has no parents
    #[test]
    fn test_root_commit() {
        let commit = Commit::parse(&make_commit_content(&[])).unwrap();
        assert!(commit.parents().unwrap().is_empty());
    }

    // C-005: Commit::new serializes in Git's header order
    #[test]
    fn test_new_commit() {
        let sig = Signature::new("John Doe", "john@example.com", 1700000000, 540);
        let commit = Commit::new(
            &Oid::from_hex(TREE).unwrap(),
            &[Oid::from_hex(PARENT).unwrap()],
            &sig,
            &sig,
            "  Initial commit  \n\n",
        );

        let expected = format!(
            "tree {}\nparent {}\nauthor John Doe <john@example.com> 1700000000 +0900\n\
committer John Doe <john@example.com> 1700000000 +0900\n\nInitial commit\n",
            TREE, PARENT
        );
        assert_eq!(commit.serialize(), expected.as_bytes());
    }

    // C-006: roundtrip preserves unknown headers
    #[test]
    fn test_roundtrip_with_extra_headers() {
        let raw = format!(
            "tree {}\nauthor A <a@a> 1 +0000\ncommitter A <a@a> 1 +0000\nencoding ISO-8859-1\n\nmsg\n",
            TREE
        );
        let commit = Commit::parse(raw.as_bytes()).unwrap();
        assert_eq!(commit.serialize(), raw.as_bytes());
        assert_eq!(commit.kvlm().get(b"encoding").unwrap(), b"ISO-8859-1");
    }

    // C-007: missing or malformed fields surface on access
    #[test]
    fn test_missing_fields() {
        let commit = Commit::parse(b"author bad\n\nmsg").unwrap();
        assert!(matches!(commit.tree(), Err(Error::InvalidObject { .. })));
        assert!(matches!(commit.author(), Err(Error::InvalidObject { .. })));
        assert!(matches!(commit.committer(), Err(Error::InvalidObject { .. })));
    }

    // C-008: timezone parsing
    #[test]
    fn test_parse_timezone() {
        assert_eq!(parse_timezone("+0000"), Some(0));
        assert_eq!(parse_timezone("+0530"), Some(330));
        assert_eq!(parse_timezone("-0800"), Some(-480));
        assert_eq!(parse_timezone("0900"), None);
        assert_eq!(parse_timezone("+09:00"), None);
    }
}
