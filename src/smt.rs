//! Sparse Merkle tree snapshot records.
//!
//! The tree logic itself lives elsewhere; this codec only carries a snapshot
//! of `(bit path, value)` pairs plus the root that summarizes them.

use crate::envelope::{write_envelope, Envelope, TAG_SMT};
use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::utils::{expect_consumed, take};
use crate::varint::{read_varint, write_varint};

/// One sparse-Merkle-tree entry: a bit-string path and its 32-byte value.
///
/// Paths are packed most-significant-bit first: logical bit 0 is bit 7 of
/// byte 0. Padding bits in the final byte are normalized to zero at
/// construction and on decode, so entry equality never depends on them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SmtEntry {
    bit_len: u64,
    path: Vec<u8>,
    /// The value stored at this path.
    pub value: Hash,
}

impl SmtEntry {
    /// Build an entry from a packed path. `path` must hold exactly
    /// `ceil(bit_len / 8)` bytes; padding bits are cleared.
    pub fn new(path: Vec<u8>, bit_len: u64, value: Hash) -> Result<Self> {
        let expected = bit_len.div_ceil(8) as usize;
        if path.len() != expected {
            return Err(Error::LengthMismatch {
                expected,
                actual: path.len(),
            });
        }
        let mut entry = Self {
            bit_len,
            path,
            value,
        };
        entry.clear_padding();
        Ok(entry)
    }

    /// Build an entry from individual bits, most significant first.
    pub fn from_bits(bits: &[bool], value: Hash) -> Self {
        let mut path = vec![0u8; bits.len().div_ceil(8)];
        for (i, &bit) in bits.iter().enumerate() {
            if bit {
                path[i / 8] |= 0x80 >> (i % 8);
            }
        }
        Self {
            bit_len: bits.len() as u64,
            path,
            value,
        }
    }

    /// Number of bits in the path.
    pub fn bit_len(&self) -> u64 {
        self.bit_len
    }

    /// The packed path bytes, padding bits zeroed.
    pub fn path(&self) -> &[u8] {
        &self.path
    }

    /// The logical bit at index `i`, or `None` past the end of the path.
    pub fn bit(&self, i: u64) -> Option<bool> {
        if i >= self.bit_len {
            return None;
        }
        let byte = self.path[(i / 8) as usize];
        Some(byte & (0x80 >> (i % 8)) != 0)
    }

    fn clear_padding(&mut self) {
        let used = (self.bit_len % 8) as u32;
        if used != 0 {
            if let Some(last) = self.path.last_mut() {
                *last &= 0xFFu8 << (8 - used);
            }
        }
    }

    fn encode(&self, buf: &mut Vec<u8>) {
        write_varint(buf, self.bit_len);
        buf.extend_from_slice(&self.path);
        self.value.encode(buf);
    }

    fn decode(buf: &mut &[u8]) -> Result<Self> {
        let bit_len = read_varint(buf)?;
        let byte_len = bit_len.div_ceil(8) as usize;
        let path = take(buf, byte_len, "read smt path")?.to_vec();
        let value = Hash::decode(buf)?;
        let mut entry = Self {
            bit_len,
            path,
            value,
        };
        entry.clear_padding();
        Ok(entry)
    }
}

/// A sparse-Merkle-tree snapshot: the root plus its entries, in order.
///
/// Payload layout:
///
/// ```text
/// root(32) ‖ entry_count(varint) ‖
///   [bit_len(varint) ‖ path(ceil(bit_len/8)) ‖ value(32)]×
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SmtData {
    /// Root hash summarizing the tree.
    pub root: Hash,
    /// Entries in insertion order; order survives a round-trip.
    pub entries: Vec<SmtEntry>,
}

impl SmtData {
    /// Encode into a complete envelope.
    pub fn encode(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(Hash::LEN + 1 + self.entries.len() * 40);
        self.root.encode(&mut payload);
        write_varint(&mut payload, self.entries.len() as u64);
        for entry in &self.entries {
            entry.encode(&mut payload);
        }
        write_envelope(TAG_SMT, &payload)
    }

    /// Decode from a complete envelope, insisting on the SMT tag.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let payload = Envelope::split_expecting(buf, TAG_SMT)?;
        let mut cursor = payload;
        let root = Hash::decode(&mut cursor)?;
        let count = read_varint(&mut cursor)?;
        let mut entries = Vec::with_capacity(count.min(1024) as usize);
        for _ in 0..count {
            entries.push(SmtEntry::decode(&mut cursor)?);
        }
        expect_consumed(cursor, payload.len())?;
        Ok(Self { root, entries })
    }
}
