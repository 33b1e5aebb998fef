//! CRC-32 framing checks.
//!
//! Every envelope ends in a 4-byte big-endian CRC-32 (IEEE 802.3, reflected,
//! polynomial `0xEDB88320`) over everything before the trailer. This is a
//! framing check against corruption and truncation, not a security mechanism.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Error, Result};

/// Size of the checksum trailer in bytes.
pub const CRC_LEN: usize = 4;

/// CRC-32 of `data`.
pub fn checksum(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// Append the big-endian CRC-32 of everything currently in `buf`.
pub fn append_checksum(buf: &mut Vec<u8>) {
    let crc = checksum(buf);
    buf.extend_from_slice(&crc.to_be_bytes());
}

/// Split `buf` into its body and trailer, verifying the trailer is the CRC-32
/// of the body. The caller must have already checked `buf` is long enough to
/// hold a trailer.
pub fn split_verified(buf: &[u8]) -> Result<&[u8]> {
    debug_assert!(buf.len() >= CRC_LEN);
    let (body, trailer) = buf.split_at(buf.len() - CRC_LEN);
    let stored = BigEndian::read_u32(trailer);
    let computed = checksum(body);
    if stored != computed {
        return Err(Error::BadCrc { stored, computed });
    }
    Ok(body)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn wire_bytes() {
        // The classic CRC-32 check vector.
        assert_eq!(checksum(b"123456789"), 0xCBF4_3926);
        let mut buf = b"123456789".to_vec();
        append_checksum(&mut buf);
        assert_eq!(&buf[9..], &[0xCB, 0xF4, 0x39, 0x26]);
    }

    #[test]
    fn verify_roundtrip() {
        let mut buf = b"zkfs framing".to_vec();
        append_checksum(&mut buf);
        assert_eq!(split_verified(&buf).unwrap(), b"zkfs framing");
    }

    #[test]
    fn any_flipped_bit_fails() {
        let mut buf = b"abcd".to_vec();
        append_checksum(&mut buf);
        for byte in 0..buf.len() {
            for bit in 0..8 {
                let mut bad = buf.clone();
                bad[byte] ^= 1 << bit;
                assert!(
                    split_verified(&bad).is_err(),
                    "flip of byte {} bit {} went unnoticed",
                    byte,
                    bit
                );
            }
        }
    }
}
