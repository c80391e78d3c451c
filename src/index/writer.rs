//! Git index file writer.
//!
//! This module implements writing of the Git index file format (version 2).

use crate::infra::hash::sha1;

use super::reader::{ENTRY_PREFIX_LEN, INDEX_SIGNATURE, NAME_LEN_OVERFLOW};
use super::{Index, IndexEntry};

/// Writes the index to bytes in Git index format.
///
/// The output ends with the SHA-1 of everything before it, as Git does.
pub fn write(index: &Index) -> Vec<u8> {
    let mut buffer = Vec::new();

    write_header(&mut buffer, index.version(), index.len() as u32);

    for entry in index.entries() {
        write_entry(&mut buffer, entry);
    }

    let checksum = sha1(&buffer);
    buffer.extend_from_slice(&checksum);

    buffer
}

/// Writes the index header.
///
/// The header consists of:
/// - 4 bytes: signature ("DIRC")
/// - 4 bytes: version number (big-endian)
/// - 4 bytes: number of entries (big-endian)
fn write_header(buffer: &mut Vec<u8>, version: u32, entry_count: u32) {
    buffer.extend_from_slice(INDEX_SIGNATURE);
    buffer.extend_from_slice(&version.to_be_bytes());
    buffer.extend_from_slice(&entry_count.to_be_bytes());
}

/// Writes a single index entry.
///
/// Each entry has:
/// - Fixed fields (62 bytes)
/// - Variable-length name (NUL-terminated)
/// - Padding to 8-byte boundary
fn write_entry(buffer: &mut Vec<u8>, entry: &IndexEntry) {
    let entry_start = buffer.len();

    buffer.extend_from_slice(&entry.ctime.seconds.to_be_bytes());
    buffer.extend_from_slice(&entry.ctime.nanoseconds.to_be_bytes());
    buffer.extend_from_slice(&entry.mtime.seconds.to_be_bytes());
    buffer.extend_from_slice(&entry.mtime.nanoseconds.to_be_bytes());
    buffer.extend_from_slice(&entry.dev.to_be_bytes());
    buffer.extend_from_slice(&entry.ino.to_be_bytes());

    // reserved, then type tag and permissions
    buffer.extend_from_slice(&0u16.to_be_bytes());
    let mode = (entry.mode_type.bits() << 12) | (entry.perms & 0o777);
    buffer.extend_from_slice(&mode.to_be_bytes());

    buffer.extend_from_slice(&entry.uid.to_be_bytes());
    buffer.extend_from_slice(&entry.gid.to_be_bytes());
    buffer.extend_from_slice(&entry.size.to_be_bytes());
    buffer.extend_from_slice(entry.oid.as_bytes());

    let name = entry.name.as_bytes();
    let mut flags = name.len().min(NAME_LEN_OVERFLOW) as u16;
    flags |= u16::from(entry.stage & 0b11) << 12;
    if entry.assume_valid {
        flags |= 0x8000;
    }
    buffer.extend_from_slice(&flags.to_be_bytes());
    debug_assert_eq!(buffer.len() - entry_start, ENTRY_PREFIX_LEN);

    buffer.extend_from_slice(name);

    // At least one NUL, then zeros up to the next multiple of 8.
    let entry_size = buffer.len() - entry_start;
    let padding = 8 - (entry_size % 8);
    buffer.extend(std::iter::repeat(0u8).take(padding));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::reader::parse;
    use crate::index::{ModeType, Timestamp};
    use crate::infra::hash::SHA1_SIZE;
    use crate::objects::Oid;

    fn make_entry(name: &str) -> IndexEntry {
        IndexEntry::new(name, Oid::from_bytes([0xda; 20]), ModeType::Regular, 0o644)
            .with_times(Timestamp::new(1700000000, 1), Timestamp::new(1700000001, 2))
            .with_device(100, 12345)
            .with_owner(1000, 1000)
            .with_size(42)
    }

    // IW-001: Write empty index
    #[test]
    fn test_write_empty_index() {
        let data = write(&Index::new());

        // Header (12 bytes) + checksum (20 bytes)
        assert_eq!(data.len(), 12 + 20);
        assert_eq!(&data[0..4], b"DIRC");
        assert_eq!(u32::from_be_bytes(data[4..8].try_into().unwrap()), 2);
        assert_eq!(u32::from_be_bytes(data[8..12].try_into().unwrap()), 0);
    }

    // IW-002: exact byte layout of one entry
    #[test]
    fn test_entry_layout() {
        let entry = make_entry("hello").with_assume_valid(true);
        let data = write(&Index::from_entries(vec![entry]));
        let raw = &data[12..data.len() - SHA1_SIZE];

        // 62 + 5 + 1 NUL rounds up to 72
        assert_eq!(raw.len(), 72);
        assert_eq!(&raw[24..26], &[0, 0]);
        assert_eq!(u16::from_be_bytes([raw[26], raw[27]]), 0o100644);
        assert_eq!(&raw[40..60], &[0xda; 20]);
        assert_eq!(
            u16::from_be_bytes([raw[60], raw[61]]),
            0b1000_0000_0000_0101
        );
        assert_eq!(&raw[62..67], b"hello");
        assert!(raw[67..].iter().all(|&b| b == 0));
    }

    // IW-003: a name filling the boundary still gets a full block of padding
    #[test]
    fn test_padding_boundary() {
        // 62 + 2 = 64, so eight NULs follow
        let data = write(&Index::from_entries(vec![make_entry("ab")]));
        assert_eq!(data.len() - 12 - SHA1_SIZE, 72);
    }

    // IW-004: decode(encode(index)) == index
    #[test]
    fn test_roundtrip() {
        let original = Index::from_entries(vec![
            make_entry("file.txt"),
            make_entry("nested/deep/file.rs").with_stage(2),
            IndexEntry::new("bin/run", Oid::from_bytes([1; 20]), ModeType::Regular, 0o755),
            IndexEntry::new("link", Oid::from_bytes([2; 20]), ModeType::Symlink, 0),
            IndexEntry::new("vendor/lib", Oid::from_bytes([3; 20]), ModeType::Gitlink, 0)
                .with_assume_valid(true),
        ]);

        let parsed = parse(&write(&original)).unwrap();
        assert_eq!(parsed, original);
    }

    // IW-005: Checksum is correct
    #[test]
    fn test_checksum() {
        let data = write(&Index::from_entries(vec![make_entry("test.txt")]));

        let stored_checksum = &data[data.len() - SHA1_SIZE..];
        let calculated_checksum = sha1(&data[..data.len() - SHA1_SIZE]);

        assert_eq!(stored_checksum, &calculated_checksum);
    }

    // IW-006: long names write the overflow sentinel and still read back
    #[test]
    fn test_long_name() {
        let name = "d/".repeat(2100) + "f";
        let data = write(&Index::from_entries(vec![make_entry(&name)]));

        assert_eq!(u16::from_be_bytes([data[12 + 60], data[12 + 61]]) & 0x0FFF, 0xFFF);
        assert_eq!(parse(&data).unwrap().entries()[0].name(), name);
    }
}
