//! Zlib compression and decompression utilities.

use crate::error::{Error, Result};

/// Default zlib level for loose objects.
pub const DEFAULT_LEVEL: u8 = 6;

/// Compresses data using zlib at the given level (0-10).
pub fn compress(data: &[u8], level: u8) -> Vec<u8> {
    miniz_oxide::deflate::compress_to_vec_zlib(data, level.min(10))
}

/// Decompresses zlib-compressed data.
///
/// # Errors
///
/// Returns `Error::DecompressionFailed` if:
/// - The input data is shorter than a zlib header
/// - The zlib header is invalid
/// - The compressed data is corrupted or truncated
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < 2 || !is_valid_zlib_header(data[0], data[1]) {
        return Err(Error::DecompressionFailed);
    }

    miniz_oxide::inflate::decompress_to_vec_zlib(data).map_err(|_| Error::DecompressionFailed)
}

/// Validates a zlib header.
///
/// - The compression method (low 4 bits of CMF) is 8 (DEFLATE)
/// - The window size (high 4 bits of CMF) is at most 7
/// - `(CMF * 256 + FLG) % 31 == 0`
fn is_valid_zlib_header(cmf: u8, flg: u8) -> bool {
    if cmf & 0x0F != 8 {
        return false;
    }
    if (cmf >> 4) > 7 {
        return false;
    }
    ((cmf as u16) * 256 + (flg as u16)) % 31 == 0
}
