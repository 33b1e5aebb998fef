//! Node timestamps.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Error, Result};
use crate::utils::take;

/// Milliseconds since the Unix epoch, restricted to 48 bits.
///
/// Timestamps encode as exactly 6 big-endian bytes, which covers dates out to
/// the year 10889. Construction checks the range once so encoding never has
/// to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(u64);

/// Exclusive upper bound on the millisecond value.
pub const MAX_TIMESTAMP_MILLIS: u64 = 1 << 48;

impl Timestamp {
    /// Encoded size in bytes.
    pub const LEN: usize = 6;

    /// Construct from milliseconds since the epoch. Fails if the value does
    /// not fit in 48 bits.
    pub fn from_millis(millis: u64) -> Result<Self> {
        if millis >= MAX_TIMESTAMP_MILLIS {
            return Err(Error::TimestampRange { millis });
        }
        Ok(Self(millis))
    }

    /// The current system time, saturated to the representable range.
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self(millis.min(MAX_TIMESTAMP_MILLIS - 1))
    }

    /// Milliseconds since the epoch.
    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// Append the 6-byte big-endian form to `buf`.
    pub(crate) fn encode(&self, buf: &mut Vec<u8>) {
        let mut bytes = [0u8; Self::LEN];
        BigEndian::write_u48(&mut bytes, self.0);
        buf.extend_from_slice(&bytes);
    }

    /// Read the 6-byte big-endian form off the front of `buf`.
    pub(crate) fn decode(buf: &mut &[u8]) -> Result<Self> {
        let raw = take(buf, Self::LEN, "read timestamp")?;
        Ok(Self(BigEndian::read_u48(raw)))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}
