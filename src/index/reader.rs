//! Git index file parser.
//!
//! This module implements parsing of the Git index file format (version 2).

use std::io::{Cursor, Read};

use crate::error::{Error, Result};
use crate::infra::hash::{sha1, SHA1_SIZE};
use crate::objects::oid::OID_BYTES;
use crate::objects::Oid;

use super::{Index, IndexEntry, ModeType, Timestamp, INDEX_VERSION};

/// The magic signature at the start of an index file: "DIRC"
pub(super) const INDEX_SIGNATURE: &[u8; 4] = b"DIRC";

/// Size of the fixed part of an entry, before the name.
pub(super) const ENTRY_PREFIX_LEN: usize = 62;

/// Name length value meaning "longer than the field can hold".
pub(super) const NAME_LEN_OVERFLOW: usize = 0xFFF;

const HEADER_LEN: usize = 12;
const MIN_ENTRY_LEN: usize = 64;

const FLAG_ASSUME_VALID: u16 = 0x8000;
const FLAG_EXTENDED: u16 = 0x4000;

/// Parses a Git index file from raw bytes.
///
/// # Errors
///
/// - `Error::BadIndexSignature` if the file does not start with `DIRC`
/// - `Error::UnsupportedIndexVersion` if the version is not 2
/// - `Error::UnknownMode` for a mode type outside regular/symlink/gitlink
/// - `Error::InvalidIndex` if the data is truncated, reserved bits are set,
///   or the trailing checksum does not match
pub fn parse(data: &[u8]) -> Result<Index> {
    let mut cursor = Cursor::new(data);

    let entry_count = parse_header(&mut cursor)?;

    // Every entry takes at least 64 bytes, so a count the data cannot
    // hold must not drive the allocation.
    let room = data.len().saturating_sub(HEADER_LEN) / MIN_ENTRY_LEN;
    let mut entries = Vec::with_capacity((entry_count as usize).min(room));
    for _ in 0..entry_count {
        entries.push(parse_entry(&mut cursor)?);
    }

    verify_checksum(data, cursor.position() as usize)?;

    Ok(Index::from_entries(entries))
}

/// Parses the index file header and returns the entry count.
///
/// The header consists of:
/// - 4 bytes: signature ("DIRC")
/// - 4 bytes: version number (big-endian)
/// - 4 bytes: number of entries (big-endian)
fn parse_header(cursor: &mut Cursor<&[u8]>) -> Result<u32> {
    let mut sig = [0u8; 4];
    cursor
        .read_exact(&mut sig)
        .map_err(|_| truncated("signature"))?;

    if &sig != INDEX_SIGNATURE {
        return Err(Error::BadIndexSignature(sig));
    }

    let version = read_u32_be(cursor).map_err(|_| truncated("version"))?;
    if version != INDEX_VERSION {
        return Err(Error::UnsupportedIndexVersion(version));
    }

    read_u32_be(cursor).map_err(|_| truncated("entry count"))
}

/// Parses a single index entry.
///
/// Each entry has a fixed 62-byte prefix, the name, a terminating NUL and
/// zero padding up to a multiple of 8 bytes from the start of the entry.
fn parse_entry(cursor: &mut Cursor<&[u8]>) -> Result<IndexEntry> {
    let entry_start = cursor.position() as usize;

    let ctime = read_timestamp(cursor, "ctime")?;
    let mtime = read_timestamp(cursor, "mtime")?;
    let dev = read_u32_be(cursor).map_err(|_| truncated("dev"))?;
    let ino = read_u32_be(cursor).map_err(|_| truncated("ino"))?;

    let reserved = read_u16_be(cursor).map_err(|_| truncated("mode"))?;
    if reserved != 0 {
        return Err(invalid(format!(
            "reserved mode bits set at offset {}",
            entry_start
        )));
    }
    let mode = read_u16_be(cursor).map_err(|_| truncated("mode"))?;
    let mode_type = ModeType::from_bits(mode >> 12)?;
    let perms = mode & 0o777;

    let uid = read_u32_be(cursor).map_err(|_| truncated("uid"))?;
    let gid = read_u32_be(cursor).map_err(|_| truncated("gid"))?;
    let size = read_u32_be(cursor).map_err(|_| truncated("size"))?;

    let mut oid_bytes = [0u8; OID_BYTES];
    cursor
        .read_exact(&mut oid_bytes)
        .map_err(|_| truncated("oid"))?;
    let oid = Oid::from_bytes(oid_bytes);

    let flags = read_u16_be(cursor).map_err(|_| truncated("flags"))?;
    if flags & FLAG_EXTENDED != 0 {
        return Err(invalid(format!(
            "extended flag set at offset {}",
            entry_start
        )));
    }
    let assume_valid = flags & FLAG_ASSUME_VALID != 0;
    let stage = ((flags >> 12) & 0b11) as u8;
    let name_len = (flags & 0x0FFF) as usize;

    let data = *cursor.get_ref();
    let name_start = cursor.position() as usize;
    let name_end = if name_len < NAME_LEN_OVERFLOW {
        let end = name_start + name_len;
        if data.get(end) != Some(&0) {
            return Err(invalid(format!(
                "entry name at offset {} is not NUL-terminated",
                name_start
            )));
        }
        end
    } else {
        data.get(name_start + NAME_LEN_OVERFLOW..)
            .and_then(|rest| rest.iter().position(|&b| b == 0))
            .map(|pos| name_start + NAME_LEN_OVERFLOW + pos)
            .ok_or_else(|| truncated("name"))?
    };

    let name = std::str::from_utf8(&data[name_start..name_end])
        .map_err(|_| invalid("invalid UTF-8 in entry name".to_string()))?
        .to_string();

    // Skip the NUL and pad up to the next multiple of 8 from entry start.
    let consumed = name_end + 1 - entry_start;
    let entry_end = entry_start + (consumed + 7) / 8 * 8;
    if entry_end > data.len() {
        return Err(truncated("padding"));
    }
    cursor.set_position(entry_end as u64);

    Ok(IndexEntry {
        ctime,
        mtime,
        dev,
        ino,
        mode_type,
        perms,
        uid,
        gid,
        size,
        oid,
        assume_valid,
        stage,
        name,
    })
}

/// Checks the SHA-1 trailer, if present.
///
/// A file that ends right after the last entry is accepted as-is.
fn verify_checksum(data: &[u8], entries_end: usize) -> Result<()> {
    let remaining = data.len() - entries_end;
    if remaining == 0 {
        return Ok(());
    }
    if remaining < SHA1_SIZE {
        return Err(truncated("checksum"));
    }

    let (content, trailer) = data.split_at(data.len() - SHA1_SIZE);
    if sha1(content).as_slice() != trailer {
        return Err(invalid("checksum mismatch".to_string()));
    }
    Ok(())
}

fn read_timestamp(cursor: &mut Cursor<&[u8]>, field: &str) -> Result<Timestamp> {
    let seconds = read_u32_be(cursor).map_err(|_| truncated(field))?;
    let nanoseconds = read_u32_be(cursor).map_err(|_| truncated(field))?;
    Ok(Timestamp::new(seconds, nanoseconds))
}

/// Reads a big-endian u32 from the cursor.
fn read_u32_be(cursor: &mut Cursor<&[u8]>) -> std::io::Result<u32> {
    let mut buf = [0u8; 4];
    cursor.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

/// Reads a big-endian u16 from the cursor.
fn read_u16_be(cursor: &mut Cursor<&[u8]>) -> std::io::Result<u16> {
    let mut buf = [0u8; 2];
    cursor.read_exact(&mut buf)?;
    Ok(u16::from_be_bytes(buf))
}

fn truncated(field: &str) -> Error {
    invalid(format!("truncated while reading {}", field))
}

fn invalid(reason: String) -> Error {
    Error::InvalidIndex { reason }
}
