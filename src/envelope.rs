//! Envelope framing shared by all record kinds.
//!
//! Every top-level record is one contiguous buffer:
//!
//! ```text
//! offset 0 : 0x5A 0x4B    magic "ZK"
//! offset 2 : 0x01         format version
//! offset 3 : record tag
//! offset 4 : payload
//! trailer  : CRC-32 over [0 .. trailer), 4 bytes big-endian
//! ```
//!
//! The reader is strictly linear: magic, then version, then tag, then the
//! payload is bounded by the checksum trailer. Any failed step is terminal.

use crate::crc;
use crate::error::{Error, Result};

/// The two magic bytes opening every envelope.
pub const MAGIC: [u8; 2] = [0x5A, 0x4B];

/// The single supported format version.
pub const VERSION: u8 = 0x01;

/// Header length: magic + version + tag.
pub const HEADER_LEN: usize = 4;

/// Smallest possible envelope: header plus checksum trailer.
pub const MIN_ENVELOPE_LEN: usize = HEADER_LEN + crc::CRC_LEN;

/// Record tag for a file node.
pub const TAG_FILE_NODE: u8 = 0x01;
/// Record tag for a directory node.
pub const TAG_DIR_NODE: u8 = 0x02;
/// Record tag for an access-control group.
pub const TAG_GROUP: u8 = 0x03;
/// Record tag for a sparse Merkle tree snapshot.
pub const TAG_SMT: u8 = 0x04;
/// Record tag for a compressed blob.
pub const TAG_COMPRESSED: u8 = 0x10;

/// True iff `buf` starts with the envelope magic bytes. Anything else is
/// treated as the legacy textual form by the node dispatcher.
pub fn has_magic(buf: &[u8]) -> bool {
    buf.len() >= 2 && buf[0] == MAGIC[0] && buf[1] == MAGIC[1]
}

/// Wrap `payload` in an envelope with the given record tag.
pub(crate) fn write_envelope(tag: u8, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(MIN_ENVELOPE_LEN + payload.len());
    buf.extend_from_slice(&MAGIC);
    buf.push(VERSION);
    buf.push(tag);
    buf.extend_from_slice(payload);
    crc::append_checksum(&mut buf);
    buf
}

/// A verified envelope, borrowing its payload from the input buffer.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Envelope<'a> {
    /// The record tag byte.
    pub tag: u8,
    /// The payload, header and trailer excluded.
    pub payload: &'a [u8],
}

impl<'a> Envelope<'a> {
    /// Split a buffer into tag and payload, verifying magic, version, and
    /// checksum.
    pub(crate) fn split(buf: &'a [u8]) -> Result<Self> {
        if buf.len() < MIN_ENVELOPE_LEN {
            return Err(Error::TooShort { actual: buf.len() });
        }
        if !has_magic(buf) {
            return Err(Error::BadMagic);
        }
        if buf[2] != VERSION {
            return Err(Error::BadVersion { version: buf[2] });
        }
        let tag = buf[3];
        let body = crc::split_verified(buf)?;
        Ok(Self {
            tag,
            payload: &body[HEADER_LEN..],
        })
    }

    /// Split a buffer and insist on one specific record tag.
    pub(crate) fn split_expecting(buf: &'a [u8], tag: u8) -> Result<&'a [u8]> {
        let envelope = Self::split(buf)?;
        if envelope.tag != tag {
            return Err(Error::BadTag {
                expected: tag,
                actual: envelope.tag,
            });
        }
        Ok(envelope.payload)
    }
}
