//! Library error types.

use std::fmt;

/// A zkfs-wire Result, normally returning a zkfs-wire [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A zkfs-wire error. Encompasses any issue that can happen while encoding or
/// decoding records, training or applying a dictionary, or running the blob
/// compression pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// A buffer ended before a decoder finished reading a field.
    Truncated {
        /// What step of decoding we were on when the data ran out.
        step: &'static str,
    },
    /// A variable-length integer would not fit in the supported 49-bit range.
    TooLarge,
    /// An envelope was shorter than the minimum header + trailer size.
    TooShort {
        /// The actual length of the buffer.
        actual: usize,
    },
    /// The first two bytes of an envelope were not the expected magic.
    BadMagic,
    /// An envelope or serialized dictionary used an unsupported version byte.
    BadVersion {
        /// The version byte that was encountered.
        version: u8,
    },
    /// The envelope's stored checksum did not match the computed one.
    BadCrc {
        /// The checksum stored in the trailer.
        stored: u32,
        /// The checksum computed over header + payload.
        computed: u32,
    },
    /// An envelope carried a different record tag than the decoder expected.
    /// `expected` is zero for the node dispatcher, which accepts several tags.
    BadTag {
        /// The tag the decoder was prepared to handle.
        expected: u8,
        /// The tag actually present in the envelope.
        actual: u8,
    },
    /// A single-byte field held a value outside its closed set.
    Malformed {
        /// Which field was malformed.
        what: &'static str,
        /// The offending byte.
        value: u8,
    },
    /// Prefix-code encoding hit a byte with no assigned code.
    UncodedSymbol {
        /// The byte that has no code.
        symbol: u8,
    },
    /// Prefix-code decoding hit a bit pattern that matches no code.
    BadCode,
    /// A decoder produced a different number of bytes than the stream recorded.
    LengthMismatch {
        /// The recorded count.
        expected: usize,
        /// The count actually produced.
        actual: usize,
    },
    /// A compressed blob used a method byte this library does not know.
    BadMethod {
        /// The method byte that was encountered.
        method: u8,
    },
    /// A compressed blob requires a collaborator (dictionary or external
    /// decompressor) that the caller did not supply.
    MissingCollaborator {
        /// Which collaborator was required.
        what: &'static str,
    },
    /// An injected external collaborator reported a failure.
    Collaborator(String),
    /// The legacy textual form failed to parse.
    Legacy(String),
    /// A millisecond timestamp fell outside the representable 48-bit range.
    TimestampRange {
        /// The out-of-range value.
        millis: u64,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Truncated { step } => write!(f, "Data ended too early on step [{}]", step),
            Error::TooLarge => write!(f, "Varint exceeds the supported 49-bit range"),
            Error::TooShort { actual } => {
                write!(f, "Envelope too short: got {} bytes, minimum is 8", actual)
            }
            Error::BadMagic => write!(f, "Envelope does not start with the magic bytes"),
            Error::BadVersion { version } => {
                write!(f, "Unsupported format version {:#04x}", version)
            }
            Error::BadCrc { stored, computed } => write!(
                f,
                "Checksum mismatch: stored {:#010x}, computed {:#010x}",
                stored, computed
            ),
            Error::BadTag { expected, actual } => {
                if expected == 0 {
                    write!(f, "No decoder for record tag {:#04x}", actual)
                } else {
                    write!(
                        f,
                        "Expected record tag {:#04x}, but envelope holds {:#04x}",
                        expected, actual
                    )
                }
            }
            Error::Malformed { what, value } => {
                write!(f, "Malformed {} byte {:#04x}", what, value)
            }
            Error::UncodedSymbol { symbol } => {
                write!(f, "Byte {:#04x} has no code in the symbol tree", symbol)
            }
            Error::BadCode => write!(f, "Bit stream holds a pattern that decodes to no symbol"),
            Error::LengthMismatch { expected, actual } => write!(
                f,
                "Expected {} decoded bytes, but produced {}",
                expected, actual
            ),
            Error::BadMethod { method } => {
                write!(f, "Unknown compression method {:#04x}", method)
            }
            Error::MissingCollaborator { what } => {
                write!(f, "Decoding requires a {}, but none was supplied", what)
            }
            Error::Collaborator(ref err) => write!(f, "External collaborator failed: {}", err),
            Error::Legacy(ref err) => write!(f, "Legacy node parsing failed: {}", err),
            Error::TimestampRange { millis } => {
                write!(f, "Timestamp {} ms does not fit in 48 bits", millis)
            }
        }
    }
}

impl std::error::Error for Error {}
