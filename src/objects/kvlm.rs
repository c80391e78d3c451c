//! Key-value list with message, the payload format of commits and tags.
//!
//! ```text
//! tree 29ff16c9c14e2652b22f8b78bb08a5a07930c147
//! parent 206941306e8a8af65b66eaaaea388a7ae24d49a0
//! author Name <email> 1527025023 +0200
//! gpgsig -----BEGIN PGP SIGNATURE-----
//!  <continuation lines start with one space>
//!
//! Free-text message running to the end of the payload.
//! ```
//!
//! A repeated key accumulates its values under the position where the key
//! was first seen. Serializing therefore groups every value of a key
//! together, so a payload that interleaves a key with others does not
//! survive a round-trip byte-for-byte; value order within a key does.

use crate::error::{Error, Result};

/// A parsed key-value list with a trailing message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Kvlm {
    /// Keys in first-seen order, each with its values in encounter order.
    fields: Vec<(Vec<u8>, Vec<Vec<u8>>)>,
    /// The free-text message after the blank line.
    message: Vec<u8>,
}

impl Kvlm {
    /// Creates an empty list with an empty message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a key-value list from raw payload bytes.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let mut kvlm = Kvlm::new();
        let mut pos = 0;

        loop {
            let space = find_byte(raw, b' ', pos);
            let newline = find_byte(raw, b'\n', pos);

            // No space before the next newline: this must be the blank line
            // that separates headers from the message.
            let space = match (space, newline) {
                (Some(s), Some(n)) if s < n => s,
                (Some(s), None) => s,
                _ => {
                    if newline != Some(pos) {
                        return Err(Error::MalformedKvlm(format!(
                            "expected blank line before message at offset {}",
                            pos
                        )));
                    }
                    kvlm.message = raw[pos + 1..].to_vec();
                    return Ok(kvlm);
                }
            };

            if space == pos {
                return Err(Error::MalformedKvlm(format!(
                    "empty key at offset {}",
                    pos
                )));
            }

            // The value runs until a newline that is not followed by a space.
            let mut end = space;
            loop {
                end = find_byte(raw, b'\n', end + 1).ok_or_else(|| {
                    Error::MalformedKvlm(format!("unterminated value at offset {}", space + 1))
                })?;
                if raw.get(end + 1) != Some(&b' ') {
                    break;
                }
            }

            let key = raw[pos..space].to_vec();
            let value = unfold(&raw[space + 1..end]);
            kvlm.push(key, value);

            pos = end + 1;
        }
    }

    /// Serializes the list back into payload bytes.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();

        for (key, values) in &self.fields {
            for value in values {
                out.extend_from_slice(key);
                out.push(b' ');
                fold_into(&mut out, value);
                out.push(b'\n');
            }
        }

        out.push(b'\n');
        out.extend_from_slice(&self.message);
        out
    }

    /// Appends a value, creating the key at the end if it is new.
    pub fn push(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => self.fields.push((key, vec![value])),
        }
    }

    /// Replaces all values of a key with a single value, keeping its position.
    pub fn set(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => *values = vec![value],
            None => self.fields.push((key, vec![value])),
        }
    }

    /// Returns the first value of a key.
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.get_all(key).first().map(Vec::as_slice)
    }

    /// Returns every value of a key in encounter order.
    pub fn get_all(&self, key: &[u8]) -> &[Vec<u8>] {
        self.fields
            .iter()
            .find(|(k, _)| k.as_slice() == key)
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    /// Returns the keys in first-seen order.
    pub fn keys(&self) -> impl Iterator<Item = &[u8]> {
        self.fields.iter().map(|(k, _)| k.as_slice())
    }

    /// Returns the message bytes.
    pub fn message(&self) -> &[u8] {
        &self.message
    }

    /// Replaces the message.
    pub fn set_message(&mut self, message: impl Into<Vec<u8>>) {
        self.message = message.into();
    }
}

fn find_byte(haystack: &[u8], needle: u8, from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .iter()
        .position(|&b| b == needle)
        .map(|i| from + i)
}

/// Drops the continuation space after every embedded newline.
fn unfold(value: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len());
    let mut i = 0;
    while i < value.len() {
        out.push(value[i]);
        if value[i] == b'\n' && value.get(i + 1) == Some(&b' ') {
            i += 1;
        }
        i += 1;
    }
    out
}

/// Writes `value` with a continuation space after every newline.
fn fold_into(out: &mut Vec<u8>, value: &[u8]) {
    for &b in value {
        out.push(b);
        if b == b'\n' {
            out.push(b' ');
        }
    }
}
