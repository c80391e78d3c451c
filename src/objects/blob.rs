//! Git blob object implementation.

use crate::error::{Error, Result};

/// A Git blob object representing file content.
///
/// Blobs store the raw content of files. They carry no metadata like
/// filename or permissions; that lives in tree objects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blob {
    content: Vec<u8>,
}

impl Blob {
    /// Creates a blob from its content.
    pub fn new(content: impl Into<Vec<u8>>) -> Self {
        Blob {
            content: content.into(),
        }
    }

    /// Returns the raw content of the blob.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Consumes the blob and returns its content.
    pub fn into_content(self) -> Vec<u8> {
        self.content
    }

    /// Returns the content as a UTF-8 string, if valid.
    pub fn content_str(&self) -> Result<&str> {
        std::str::from_utf8(&self.content).map_err(|_| Error::InvalidUtf8)
    }

    /// Returns the size of the blob content in bytes.
    pub fn size(&self) -> usize {
        self.content.len()
    }

    /// Returns true if a NUL byte appears within the first 8000 bytes,
    /// the same heuristic Git uses.
    pub fn is_binary(&self) -> bool {
        let check_len = self.content.len().min(8000);
        self.content[..check_len].contains(&0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // B-001: content accessors
    #[test]
    fn test_blob_content() {
        let blob = Blob::new(b"Hello, World!".to_vec());
        assert_eq!(blob.content(), b"Hello, World!");
        assert_eq!(blob.content_str().unwrap(), "Hello, World!");
        assert_eq!(blob.size(), 13);
        assert!(!blob.is_binary());
    }

    // B-002: binary detection and invalid UTF-8
    #[test]
    fn test_blob_binary() {
        let blob = Blob::new(vec![0xff, 0x00, 0x01]);
        assert!(blob.is_binary());
        assert!(matches!(blob.content_str(), Err(Error::InvalidUtf8)));
        assert_eq!(blob.into_content(), vec![0xff, 0x00, 0x01]);
    }
}
