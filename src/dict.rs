//! Trainable compression dictionaries.
//!
//! A [`Dictionary`] pairs a bounded substitution table with a [`SymbolTree`]
//! trained over the substituted byte stream. Substitution reserves `0x00` as
//! an escape: `0x00 0x00` is a literal zero, `0x00 k` expands substitution
//! string `k - 1`. The table holds at most 255 strings of 2 to 32 bytes, so
//! every escape operand fits one byte.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::huffman::{SymbolTree, SYMBOL_COUNT};
use crate::utils::{read_u8, take};
use crate::varint::{read_varint, write_varint};

/// The substitution escape byte.
const ESCAPE: u8 = 0x00;

/// Serialized dictionary version byte.
pub const DICT_VERSION: u8 = 0x01;

/// Most substitution strings a dictionary may hold.
pub const MAX_STRINGS: usize = 255;

/// Shortest permitted substitution string.
pub const MIN_STRING_LEN: usize = 2;

/// Longest permitted substitution string.
pub const MAX_STRING_LEN: usize = 32;

/// Window sizes scanned during training.
const TRAIN_WINDOWS: [usize; 4] = [4, 8, 16, 32];

/// A trained pair of substitution strings and prefix code.
///
/// Immutable after construction; sharing one instance across threads for
/// concurrent compression is sound because nothing inside ever mutates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dictionary {
    strings: Vec<Vec<u8>>,
    tree: SymbolTree,
}

impl Dictionary {
    /// Build a dictionary from pre-selected strings and a tree, enforcing
    /// the table bounds.
    pub fn from_parts(strings: Vec<Vec<u8>>, tree: SymbolTree) -> Result<Self> {
        if strings.len() > MAX_STRINGS {
            return Err(Error::Malformed {
                what: "substitution string count",
                value: strings.len().min(255) as u8,
            });
        }
        for string in &strings {
            if string.len() < MIN_STRING_LEN || string.len() > MAX_STRING_LEN {
                return Err(Error::Malformed {
                    what: "substitution string length",
                    value: string.len().min(255) as u8,
                });
            }
        }
        Ok(Self { strings, tree })
    }

    /// Train a dictionary on sample blobs.
    ///
    /// Every contiguous window of 4, 8, 16, and 32 bytes is counted across
    /// all samples; windows seen at least twice are scored by
    /// `count × length` and the best 255 become the substitution table, in
    /// score order. The prefix code is then trained over the samples as they
    /// look after substitution. No samples yields an empty dictionary.
    pub fn train(samples: &[Vec<u8>]) -> Self {
        let mut counts: HashMap<&[u8], u64> = HashMap::new();
        for sample in samples {
            for &window in &TRAIN_WINDOWS {
                if sample.len() < window {
                    continue;
                }
                for chunk in sample.windows(window) {
                    *counts.entry(chunk).or_insert(0) += 1;
                }
            }
        }

        let mut scored: Vec<(&[u8], u64)> = counts
            .into_iter()
            .filter(|&(_, count)| count >= 2)
            .map(|(chunk, count)| (chunk, count * chunk.len() as u64))
            .collect();
        scored.sort_by(|a, b| {
            b.1.cmp(&a.1)
                .then(b.0.len().cmp(&a.0.len()))
                .then(a.0.cmp(b.0))
        });
        scored.truncate(MAX_STRINGS);
        let strings: Vec<Vec<u8>> = scored.into_iter().map(|(chunk, _)| chunk.to_vec()).collect();

        let mut freq = [0u64; SYMBOL_COUNT];
        for sample in samples {
            for byte in substitute_with(&strings, sample) {
                freq[byte as usize] += 1;
            }
        }
        Self {
            strings,
            tree: SymbolTree::from_frequencies(&freq),
        }
    }

    /// The substitution strings, in priority order.
    pub fn strings(&self) -> &[Vec<u8>] {
        &self.strings
    }

    /// The prefix code over the substituted alphabet.
    pub fn tree(&self) -> &SymbolTree {
        &self.tree
    }

    /// Apply substitution: first matching string wins, scanned in priority
    /// order; matching is positional, never longest-match.
    fn substitute(&self, data: &[u8]) -> Vec<u8> {
        substitute_with(&self.strings, data)
    }

    /// Reverse substitution.
    fn unsubstitute(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(data.len());
        let mut cursor = data;
        while let Some((&byte, rest)) = cursor.split_first() {
            cursor = rest;
            if byte != ESCAPE {
                out.push(byte);
                continue;
            }
            match read_u8(&mut cursor, "read escape operand")? {
                0 => out.push(ESCAPE),
                index => {
                    let string = self.strings.get(index as usize - 1).ok_or(Error::Malformed {
                        what: "substitution index",
                        value: index,
                    })?;
                    out.extend_from_slice(string);
                }
            }
        }
        Ok(out)
    }

    /// Compress `data`: substitution, then the prefix code. The output is
    /// `substituted_len(varint) ‖ bit_count(varint) ‖ bits`.
    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let substituted = self.substitute(data);
        let (bits, bit_count) = self.tree.encode(&substituted)?;
        let mut out = Vec::with_capacity(bits.len() + 8);
        write_varint(&mut out, substituted.len() as u64);
        write_varint(&mut out, bit_count);
        out.extend_from_slice(&bits);
        Ok(out)
    }

    /// Decompress a buffer produced by [`Dictionary::compress`].
    ///
    /// The stored substituted length and bit count fully bound the decode;
    /// `_original_size` is accepted for interface symmetry only.
    pub fn decompress(&self, buf: &[u8], _original_size: usize) -> Result<Vec<u8>> {
        let mut cursor = buf;
        let substituted_len = read_varint(&mut cursor)? as usize;
        let bit_count = read_varint(&mut cursor)?;
        let byte_len = bit_count.div_ceil(8) as usize;
        let bits = take(&mut cursor, byte_len, "read compressed bits")?;
        let substituted = self.tree.decode(bits, bit_count, substituted_len)?;
        self.unsubstitute(&substituted)
    }

    /// Serialize: `version(1) ‖ tree(256) ‖ string_count(varint) ‖
    /// [len(varint) ‖ bytes]×`.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + SYMBOL_COUNT + 2 + self.strings.len() * 16);
        out.push(DICT_VERSION);
        self.tree.serialize(&mut out);
        write_varint(&mut out, self.strings.len() as u64);
        for string in &self.strings {
            write_varint(&mut out, string.len() as u64);
            out.extend_from_slice(string);
        }
        out
    }

    /// Deserialize a buffer produced by [`Dictionary::serialize`].
    pub fn deserialize(buf: &[u8]) -> Result<Self> {
        let mut cursor = buf;
        let version = read_u8(&mut cursor, "read dictionary version")?;
        if version != DICT_VERSION {
            return Err(Error::BadVersion { version });
        }
        let raw = take(&mut cursor, SYMBOL_COUNT, "read symbol tree")?;
        let mut lengths = [0u8; SYMBOL_COUNT];
        lengths.copy_from_slice(raw);
        let tree = SymbolTree::from_lengths(lengths)?;
        let count = read_varint(&mut cursor)? as usize;
        if count > MAX_STRINGS {
            return Err(Error::Malformed {
                what: "substitution string count",
                value: count.min(255) as u8,
            });
        }
        let mut strings = Vec::with_capacity(count);
        for _ in 0..count {
            let len = read_varint(&mut cursor)? as usize;
            if !(MIN_STRING_LEN..=MAX_STRING_LEN).contains(&len) {
                return Err(Error::Malformed {
                    what: "substitution string length",
                    value: len.min(255) as u8,
                });
            }
            strings.push(take(&mut cursor, len, "read substitution string")?.to_vec());
        }
        Ok(Self { strings, tree })
    }
}

/// Substitution against an explicit string table; the table order is the
/// scan priority.
fn substitute_with(strings: &[Vec<u8>], data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut pos = 0;
    'outer: while pos < data.len() {
        for (i, string) in strings.iter().enumerate() {
            if data[pos..].starts_with(string) {
                out.push(ESCAPE);
                out.push(i as u8 + 1);
                pos += string.len();
                continue 'outer;
            }
        }
        let byte = data[pos];
        if byte == ESCAPE {
            out.push(ESCAPE);
        }
        out.push(byte);
        pos += 1;
    }
    out
}
