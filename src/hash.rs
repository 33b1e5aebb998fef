//! Fixed-width opaque byte values.
//!
//! The codec never interprets these: a [`Hash`] is whatever content address
//! the surrounding store produced, a [`Nonce`] belongs to the encryption
//! stage, and a [`PublicKey`] identifies a group member. All three are plain
//! value types that encode as their raw bytes.

use std::fmt;

use crate::error::{Error, Result};
use crate::utils::take;

macro_rules! fixed_bytes {
    ($(#[$doc:meta])* $name:ident, $len:expr, $step:expr) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name([u8; $len]);

        impl $name {
            /// Length of the encoded form in bytes.
            pub const LEN: usize = $len;

            /// Wrap raw bytes.
            pub fn from_bytes(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            /// The raw bytes.
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Append the raw bytes to `buf`.
            pub(crate) fn encode(&self, buf: &mut Vec<u8>) {
                buf.extend_from_slice(&self.0);
            }

            /// Read the raw bytes off the front of `buf`.
            pub(crate) fn decode(buf: &mut &[u8]) -> Result<Self> {
                let raw = take(buf, $len, $step)?;
                let mut bytes = [0u8; $len];
                bytes.copy_from_slice(raw);
                Ok(Self(bytes))
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl TryFrom<&[u8]> for $name {
            type Error = Error;
            fn try_from(bytes: &[u8]) -> Result<Self> {
                let bytes: [u8; $len] = bytes
                    .try_into()
                    .map_err(|_| Error::Truncated { step: $step })?;
                Ok(Self(bytes))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}(", stringify!($name))?;
                for b in &self.0 {
                    write!(f, "{:02x}", b)?;
                }
                write!(f, ")")
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                for b in &self.0 {
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
        }
    };
}

fixed_bytes!(
    /// A 32-byte content address or identifier. Opaque to the codec; the
    /// surrounding store decides what it hashes and how.
    Hash,
    32,
    "read hash"
);

fixed_bytes!(
    /// The 24-byte nonce associated with one encrypted chunk.
    Nonce,
    24,
    "read nonce"
);

fixed_bytes!(
    /// A group member's 32-byte public key.
    PublicKey,
    32,
    "read public key"
);
