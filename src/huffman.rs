//! Canonical length-limited prefix codes over the byte alphabet.
//!
//! A [`SymbolTree`] assigns each of the 256 byte values a code length between
//! 0 (symbol absent) and 15 bits. Codes are never stored: they are a pure
//! function of the length vector via the canonical assignment, so two
//! implementations holding the same lengths produce the same bit stream and
//! the serialized form is just the 256 length bytes.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::error::{Error, Result};

/// Number of symbols in the alphabet.
pub const SYMBOL_COUNT: usize = 256;

/// Longest permitted code, in bits.
pub const MAX_CODE_LEN: u8 = 15;

/// Kraft sum of a complete code, in units of `2^-15`.
const KRAFT_ONE: u64 = 1 << MAX_CODE_LEN;

/// A canonical length-limited prefix code.
#[derive(Clone, Debug)]
pub struct SymbolTree {
    lengths: [u8; SYMBOL_COUNT],
    codes: [u16; SYMBOL_COUNT],
    decode_map: HashMap<(u8, u16), u8>,
}

impl PartialEq for SymbolTree {
    fn eq(&self, other: &Self) -> bool {
        // Codes and the decode table are derived from the lengths.
        self.lengths == other.lengths
    }
}

impl Eq for SymbolTree {}

impl SymbolTree {
    /// Build a tree from a 256-entry frequency table.
    ///
    /// Symbols with zero frequency get length 0 and cannot be encoded. An
    /// all-zero table yields a tree that encodes nothing; a single active
    /// symbol gets a one-bit code.
    pub fn from_frequencies(freq: &[u64; SYMBOL_COUNT]) -> Self {
        let mut lengths = huffman_lengths(freq);
        limit_lengths(&mut lengths);
        Self::build(lengths)
    }

    /// Build a tree from a length vector, validating the limit and Kraft's
    /// inequality.
    pub fn from_lengths(lengths: [u8; SYMBOL_COUNT]) -> Result<Self> {
        let mut kraft = 0u64;
        for &len in lengths.iter() {
            if len > MAX_CODE_LEN {
                return Err(Error::Malformed {
                    what: "code length",
                    value: len,
                });
            }
            if len > 0 {
                kraft += KRAFT_ONE >> len;
            }
        }
        if kraft > KRAFT_ONE {
            return Err(Error::Malformed {
                what: "code length table",
                value: 0,
            });
        }
        Ok(Self::build(lengths))
    }

    fn build(lengths: [u8; SYMBOL_COUNT]) -> Self {
        let codes = assign_codes(&lengths);
        let mut decode_map = HashMap::new();
        for sym in 0..SYMBOL_COUNT {
            if lengths[sym] > 0 {
                decode_map.insert((lengths[sym], codes[sym]), sym as u8);
            }
        }
        Self {
            lengths,
            codes,
            decode_map,
        }
    }

    /// The code length of every symbol; 0 means absent.
    pub fn lengths(&self) -> &[u8; SYMBOL_COUNT] {
        &self.lengths
    }

    /// True when no symbol has a code.
    pub fn is_empty(&self) -> bool {
        self.lengths.iter().all(|&len| len == 0)
    }

    /// Encode `data` as an MSB-first bit stream. Returns the packed bytes and
    /// the number of valid bits; trailing bits of the final byte are zero.
    ///
    /// Fails with [`Error::UncodedSymbol`] on a byte with no code.
    pub fn encode(&self, data: &[u8]) -> Result<(Vec<u8>, u64)> {
        let mut out = Vec::with_capacity(data.len() / 2 + 1);
        let mut acc = 0u64;
        let mut acc_bits = 0u32;
        let mut total_bits = 0u64;
        for &symbol in data {
            let len = self.lengths[symbol as usize];
            if len == 0 {
                return Err(Error::UncodedSymbol { symbol });
            }
            acc = (acc << len) | u64::from(self.codes[symbol as usize]);
            acc_bits += u32::from(len);
            total_bits += u64::from(len);
            while acc_bits >= 8 {
                out.push((acc >> (acc_bits - 8)) as u8);
                acc_bits -= 8;
            }
        }
        if acc_bits > 0 {
            out.push((acc << (8 - acc_bits)) as u8);
        }
        Ok((out, total_bits))
    }

    /// Decode `bit_count` bits of an MSB-first stream into `expected_len`
    /// bytes.
    ///
    /// Fails with [`Error::BadCode`] on a pattern that matches no code
    /// (including a partial code at the end of the stream) and
    /// [`Error::LengthMismatch`] when the symbol count comes out wrong.
    pub fn decode(&self, bits: &[u8], bit_count: u64, expected_len: usize) -> Result<Vec<u8>> {
        if (bits.len() as u64) * 8 < bit_count {
            return Err(Error::Truncated {
                step: "read bit stream",
            });
        }
        // Every symbol takes at least one bit, so the bit count caps the
        // output and keeps hostile length fields from over-allocating.
        let mut out = Vec::with_capacity(expected_len.min(bit_count as usize));
        let mut code = 0u16;
        let mut len = 0u8;
        for i in 0..bit_count {
            let byte = bits[(i / 8) as usize];
            let bit = (byte >> (7 - (i % 8))) & 1;
            code = (code << 1) | u16::from(bit);
            len += 1;
            if let Some(&symbol) = self.decode_map.get(&(len, code)) {
                out.push(symbol);
                code = 0;
                len = 0;
            } else if len >= MAX_CODE_LEN {
                return Err(Error::BadCode);
            }
        }
        if len != 0 {
            return Err(Error::BadCode);
        }
        if out.len() != expected_len {
            return Err(Error::LengthMismatch {
                expected: expected_len,
                actual: out.len(),
            });
        }
        Ok(out)
    }

    /// Append the serialized form: exactly 256 length bytes.
    pub fn serialize(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.lengths);
    }
}

/// Plain Huffman code lengths from a frequency table, unlimited depth.
///
/// Ties between equal weights break toward the item inserted first, which
/// keeps the construction deterministic.
fn huffman_lengths(freq: &[u64; SYMBOL_COUNT]) -> [u8; SYMBOL_COUNT] {
    let mut lengths = [0u8; SYMBOL_COUNT];
    let active: Vec<usize> = (0..SYMBOL_COUNT).filter(|&s| freq[s] > 0).collect();
    match active.len() {
        0 => return lengths,
        1 => {
            lengths[active[0]] = 1;
            return lengths;
        }
        _ => {}
    }

    // Leaves first, merged nodes appended; each node remembers its parent.
    let mut parent: Vec<usize> = vec![usize::MAX; active.len()];
    let mut heap: BinaryHeap<Reverse<(u64, usize, usize)>> = BinaryHeap::new();
    let mut seq = 0usize;
    for (node, &sym) in active.iter().enumerate() {
        heap.push(Reverse((freq[sym], seq, node)));
        seq += 1;
    }
    while heap.len() > 1 {
        let Reverse((w_a, _, a)) = heap.pop().unwrap();
        let Reverse((w_b, _, b)) = heap.pop().unwrap();
        let merged = parent.len();
        parent.push(usize::MAX);
        parent[a] = merged;
        parent[b] = merged;
        heap.push(Reverse((w_a + w_b, seq, merged)));
        seq += 1;
    }

    for (node, &sym) in active.iter().enumerate() {
        let mut depth = 0u32;
        let mut at = node;
        while parent[at] != usize::MAX {
            at = parent[at];
            depth += 1;
        }
        lengths[sym] = depth.min(u32::from(u8::MAX)) as u8;
    }
    lengths
}

/// Clamp lengths to the 15-bit limit, then restore Kraft's inequality by
/// lengthening the shortest remaining codes one step at a time.
fn limit_lengths(lengths: &mut [u8; SYMBOL_COUNT]) {
    let mut kraft = 0u64;
    for len in lengths.iter_mut() {
        if *len > MAX_CODE_LEN {
            *len = MAX_CODE_LEN;
        }
        if *len > 0 {
            kraft += KRAFT_ONE >> *len;
        }
    }
    while kraft > KRAFT_ONE {
        // Smallest non-maximal length, ties toward the lower symbol value.
        let sym = (0..SYMBOL_COUNT)
            .filter(|&s| lengths[s] > 0 && lengths[s] < MAX_CODE_LEN)
            .min_by_key(|&s| lengths[s])
            .expect("clamped lengths keep the Kraft sum under the bound");
        kraft -= KRAFT_ONE >> (lengths[sym] + 1);
        lengths[sym] += 1;
    }
}

/// Canonical code assignment: symbols sorted by `(length, symbol)` receive
/// consecutive codes, shifting left at each length increase.
fn assign_codes(lengths: &[u8; SYMBOL_COUNT]) -> [u16; SYMBOL_COUNT] {
    let mut bl_count = [0u16; MAX_CODE_LEN as usize + 1];
    for &len in lengths.iter() {
        if len > 0 {
            bl_count[len as usize] += 1;
        }
    }
    let mut next_code = [0u16; MAX_CODE_LEN as usize + 1];
    let mut code = 0u16;
    for bits in 1..=MAX_CODE_LEN as usize {
        code = (code + bl_count[bits - 1]) << 1;
        next_code[bits] = code;
    }
    let mut codes = [0u16; SYMBOL_COUNT];
    for sym in 0..SYMBOL_COUNT {
        let len = lengths[sym] as usize;
        if len > 0 {
            codes[sym] = next_code[len];
            next_code[len] += 1;
        }
    }
    codes
}
