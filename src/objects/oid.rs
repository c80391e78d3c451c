//! Object ID (SHA-1 hash) representation.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// The length of a SHA-1 hash in bytes.
pub const OID_BYTES: usize = 20;

/// The length of a SHA-1 hash as a hexadecimal string.
pub const OID_HEX_LEN: usize = 40;

/// The shortest hex string accepted as an abbreviated object ID.
pub const MIN_PREFIX_LEN: usize = 4;

/// A Git object ID (SHA-1 hash).
///
/// This type represents a 20-byte SHA-1 hash that uniquely identifies
/// a Git object (blob, tree, commit, or tag).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Oid {
    bytes: [u8; OID_BYTES],
}

impl Oid {
    /// Creates an Oid from a 40-character hexadecimal string.
    ///
    /// # Examples
    ///
    /// ```
    /// use gitcore::objects::Oid;
    ///
    /// let oid = Oid::from_hex("da39a3ee5e6b4b0d3255bfef95601890afd80709").unwrap();
    /// assert_eq!(oid.to_hex(), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
    /// ```
    pub fn from_hex(hex: &str) -> Result<Self> {
        if hex.len() != OID_HEX_LEN {
            return Err(Error::InvalidOid(hex.to_string()));
        }

        let mut bytes = [0u8; OID_BYTES];
        hex::decode_to_slice(hex, &mut bytes).map_err(|_| Error::InvalidOid(hex.to_string()))?;

        Ok(Oid { bytes })
    }

    /// Creates an Oid from a 20-byte array.
    pub fn from_bytes(bytes: [u8; OID_BYTES]) -> Self {
        Oid { bytes }
    }

    /// Creates an Oid from a slice that must be exactly 20 bytes long.
    pub fn from_slice(slice: &[u8]) -> Result<Self> {
        let bytes: [u8; OID_BYTES] = slice
            .try_into()
            .map_err(|_| Error::InvalidOid(hex::encode(slice)))?;
        Ok(Oid { bytes })
    }

    /// Returns the lowercase 40-character hexadecimal representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Returns a short (7-character) hexadecimal representation of this Oid.
    pub fn short(&self) -> String {
        self.to_hex()[..7].to_string()
    }

    /// Returns a reference to the raw 20-byte array.
    pub fn as_bytes(&self) -> &[u8; OID_BYTES] {
        &self.bytes
    }

    /// Returns true if `s` looks like a full or abbreviated object ID:
    /// 4 to 40 hexadecimal digits, either case.
    pub fn is_hex_prefix(s: &str) -> bool {
        (MIN_PREFIX_LEN..=OID_HEX_LEN).contains(&s.len())
            && s.bytes().all(|b| b.is_ascii_hexdigit())
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", self.short())
    }
}

impl FromStr for Oid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Oid::from_hex(s)
    }
}
