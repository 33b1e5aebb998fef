//! The blob compression pipeline.
//!
//! Content blobs pass through here on their way to the encryption stage.
//! Compression is negotiated: each available method is tried and the smallest
//! result wins, with the guarantee that the stored payload never exceeds the
//! plaintext. The result rides in the shared envelope as record tag `0x10`
//! with the payload layout
//!
//! ```text
//! method(1) ‖ content_type(1) ‖ original_size(varint) ‖
//! compressed_len(varint) ‖ data(compressed_len)
//! ```

use crate::dict::Dictionary;
use crate::envelope::{write_envelope, Envelope, TAG_COMPRESSED};
use crate::error::{Error, Result};
use crate::utils::{expect_consumed, read_u8, take};
use crate::varint::{read_varint, write_varint};

/// How a blob's payload was encoded. One byte on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    /// Payload is the plaintext verbatim.
    None,
    /// Payload is the external compressor's output over the plaintext.
    External,
    /// Payload is the dictionary's output over the plaintext.
    Dict,
    /// Payload is the external compressor's output over the dictionary's
    /// output.
    DictExternal,
}

impl From<Method> for u8 {
    fn from(method: Method) -> u8 {
        match method {
            Method::None => 0x00,
            Method::External => 0x01,
            Method::Dict => 0x02,
            Method::DictExternal => 0x03,
        }
    }
}

impl TryFrom<u8> for Method {
    type Error = Error;
    fn try_from(value: u8) -> Result<Method> {
        match value {
            0x00 => Ok(Method::None),
            0x01 => Ok(Method::External),
            0x02 => Ok(Method::Dict),
            0x03 => Ok(Method::DictExternal),
            method => Err(Error::BadMethod { method }),
        }
    }
}

/// A sniffed classification of the plaintext. One byte on the wire,
/// persisted for the surrounding system's benefit; decompression never
/// consults it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentType {
    /// Anything that is not recognizably textual.
    Binary,
    /// Looks like a JSON document.
    Json,
    /// Looks like UTF-8 text.
    Text,
}

impl From<ContentType> for u8 {
    fn from(content_type: ContentType) -> u8 {
        match content_type {
            ContentType::Binary => 0x00,
            ContentType::Json => 0x01,
            ContentType::Text => 0x02,
        }
    }
}

/// Classify a plaintext blob.
///
/// JSON: opens with `{` or `[` and the first 64 bytes are free of NUL.
/// Text: up to 512 bytes are free of NUL and more than 90% are printable
/// ASCII, horizontal tab, line feed, carriage return, or high-bit bytes.
/// Everything else, including the empty blob, is binary.
pub fn sniff_content_type(data: &[u8]) -> ContentType {
    if data.is_empty() {
        return ContentType::Binary;
    }
    if data[0] == b'{' || data[0] == b'[' {
        let head = &data[..data.len().min(64)];
        if !head.contains(&0x00) {
            return ContentType::Json;
        }
    }
    let head = &data[..data.len().min(512)];
    if head.contains(&0x00) {
        return ContentType::Binary;
    }
    let texty = head
        .iter()
        .filter(|&&b| (0x20..=0x7E).contains(&b) || b == b'\t' || b == b'\n' || b == b'\r' || b >= 0x80)
        .count();
    if texty * 10 > head.len() * 9 {
        ContentType::Text
    } else {
        ContentType::Binary
    }
}

/// Optional collaborators for the compression pipeline.
///
/// The two fallback functions wrap an external compressor (typically a
/// deflate implementation) that this crate never links directly. The
/// decompressor receives the original size recorded in the envelope, except
/// under [`Method::DictExternal`]: the intermediate size is unknown there and
/// it is handed `0`, so external formats used here must frame their own
/// output length.
#[derive(Default)]
pub struct BlobOptions<'a> {
    /// Dictionary for substitution + prefix-code compression.
    pub dictionary: Option<&'a Dictionary>,
    /// External compressor over arbitrary bytes.
    pub fallback_compress: Option<&'a dyn Fn(&[u8]) -> Result<Vec<u8>>>,
    /// External decompressor; the second argument is the expected output
    /// size, or `0` when unknown.
    pub fallback_decompress: Option<&'a dyn Fn(&[u8], usize) -> Result<Vec<u8>>>,
}

/// Compress a blob, choosing the smallest of the available encodings.
///
/// The dictionary is only consulted for blobs sniffed as JSON or text.
/// Failed trials are discarded silently; if nothing beats the plaintext the
/// blob is stored verbatim under [`Method::None`], so the payload never grows
/// past the input.
pub fn compress_blob(data: &[u8], options: &BlobOptions) -> Vec<u8> {
    let content_type = sniff_content_type(data);

    let mut best: Vec<u8> = data.to_vec();
    let mut method = Method::None;

    let dict_output = match (options.dictionary, content_type) {
        (Some(dictionary), ContentType::Json | ContentType::Text) => {
            dictionary.compress(data).ok()
        }
        _ => None,
    };
    if let Some(ref compressed) = dict_output {
        if compressed.len() < best.len() {
            best = compressed.clone();
            method = Method::Dict;
        }
    }

    if let Some(external) = options.fallback_compress {
        if let Ok(compressed) = external(data) {
            if compressed.len() < best.len() {
                best = compressed;
                method = Method::External;
            }
        }
        if let Some(ref dict_compressed) = dict_output {
            if let Ok(compressed) = external(dict_compressed) {
                if compressed.len() < best.len() {
                    best = compressed;
                    method = Method::DictExternal;
                }
            }
        }
    }

    if best.len() >= data.len() && method != Method::None {
        best = data.to_vec();
        method = Method::None;
    }

    let mut payload = Vec::with_capacity(best.len() + 16);
    payload.push(method.into());
    payload.push(content_type.into());
    write_varint(&mut payload, data.len() as u64);
    write_varint(&mut payload, best.len() as u64);
    payload.extend_from_slice(&best);
    write_envelope(TAG_COMPRESSED, &payload)
}

/// Decompress a blob envelope back to its plaintext.
///
/// Methods that need a collaborator the caller did not supply fail with
/// [`Error::MissingCollaborator`]; the recovered plaintext must match the
/// recorded original size or the call fails with [`Error::LengthMismatch`].
pub fn decompress_blob(buf: &[u8], options: &BlobOptions) -> Result<Vec<u8>> {
    let payload = Envelope::split_expecting(buf, TAG_COMPRESSED)?;
    let mut cursor = payload;
    let method = Method::try_from(read_u8(&mut cursor, "read method")?)?;
    let _content_type = read_u8(&mut cursor, "read content type")?;
    let original_size = read_varint(&mut cursor)? as usize;
    let compressed_len = read_varint(&mut cursor)? as usize;
    let data = take(&mut cursor, compressed_len, "read compressed data")?;
    expect_consumed(cursor, payload.len())?;

    let plaintext = match method {
        Method::None => data.to_vec(),
        Method::External => {
            let decompress = options.fallback_decompress.ok_or(Error::MissingCollaborator {
                what: "external decompressor",
            })?;
            decompress(data, original_size)?
        }
        Method::Dict => {
            let dictionary = options.dictionary.ok_or(Error::MissingCollaborator {
                what: "dictionary",
            })?;
            dictionary.decompress(data, original_size)?
        }
        Method::DictExternal => {
            let decompress = options.fallback_decompress.ok_or(Error::MissingCollaborator {
                what: "external decompressor",
            })?;
            let dictionary = options.dictionary.ok_or(Error::MissingCollaborator {
                what: "dictionary",
            })?;
            // The intermediate length was never recorded; the external
            // format has to know its own size.
            let intermediate = decompress(data, 0)?;
            dictionary.decompress(&intermediate, original_size)?
        }
    };
    if plaintext.len() != original_size {
        return Err(Error::LengthMismatch {
            expected: original_size,
            actual: plaintext.len(),
        });
    }
    Ok(plaintext)
}

#[cfg(test)]
mod test {
    use super::*;

    /// Toy self-framing external codec standing in for deflate: a varint
    /// length prefix over run-length-encoded `(count, byte)` pairs.
    fn toy_compress(data: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        write_varint(&mut out, data.len() as u64);
        let mut pos = 0;
        while pos < data.len() {
            let byte = data[pos];
            let mut run = 1usize;
            while run < 255 && pos + run < data.len() && data[pos + run] == byte {
                run += 1;
            }
            out.push(run as u8);
            out.push(byte);
            pos += run;
        }
        Ok(out)
    }

    fn toy_decompress(data: &[u8], _original_size: usize) -> Result<Vec<u8>> {
        let mut cursor = data;
        let len = read_varint(&mut cursor)? as usize;
        let mut out = Vec::with_capacity(len);
        while !cursor.is_empty() {
            let run = read_u8(&mut cursor, "toy run")?;
            let byte = read_u8(&mut cursor, "toy byte")?;
            out.extend(std::iter::repeat(byte).take(run as usize));
        }
        if out.len() != len {
            return Err(Error::Collaborator("toy length mismatch".into()));
        }
        Ok(out)
    }

    fn split_payload(buf: &[u8]) -> (Method, usize, usize) {
        let payload = Envelope::split_expecting(buf, TAG_COMPRESSED).unwrap();
        let mut cursor = payload;
        let method = Method::try_from(read_u8(&mut cursor, "method").unwrap()).unwrap();
        let _content_type = read_u8(&mut cursor, "content type").unwrap();
        let original = read_varint(&mut cursor).unwrap() as usize;
        let compressed = read_varint(&mut cursor).unwrap() as usize;
        (method, original, compressed)
    }

    #[test]
    fn sniffing() {
        assert_eq!(sniff_content_type(b""), ContentType::Binary);
        assert_eq!(sniff_content_type(b"{\"k\":1}"), ContentType::Json);
        assert_eq!(sniff_content_type(b"[1,2,3]"), ContentType::Json);
        assert_eq!(sniff_content_type(b"plain words\n"), ContentType::Text);
        assert_eq!(sniff_content_type(&[0x00, 0x01, 0x02]), ContentType::Binary);
        assert_eq!(sniff_content_type(&[0x01; 100]), ContentType::Binary);
        // A `{` opener with an early NUL is not JSON, and the NUL also rules
        // out text.
        assert_eq!(sniff_content_type(b"{\x00}"), ContentType::Binary);
    }

    #[test]
    fn verbatim_without_collaborators() {
        let data = b"some plain text blob";
        let buf = compress_blob(data, &BlobOptions::default());
        let (method, original, compressed) = split_payload(&buf);
        assert_eq!(method, Method::None);
        assert_eq!(original, data.len());
        assert_eq!(compressed, data.len());
        assert_eq!(
            decompress_blob(&buf, &BlobOptions::default()).unwrap(),
            data
        );
    }

    #[test]
    fn incompressible_stays_verbatim() {
        // A spread of distinct bytes with a NUL inside: sniffed binary, so
        // the dictionary is skipped even though it was trained on this very
        // blob, and the payload stays verbatim.
        let data: Vec<u8> = (0..50u8).map(|i| i.wrapping_mul(37)).collect();
        assert!(data.contains(&0x00));
        let dictionary = Dictionary::train(&[data.clone()]);
        let options = BlobOptions {
            dictionary: Some(&dictionary),
            ..Default::default()
        };
        let buf = compress_blob(&data, &options);
        let (method, original, compressed) = split_payload(&buf);
        assert_eq!(method, Method::None);
        assert_eq!(original, 50);
        assert_eq!(compressed, 50);
        assert_eq!(decompress_blob(&buf, &options).unwrap(), data);
    }

    #[test]
    fn dictionary_method_wins_on_texty_repeats() {
        let data = b"{\"op\":\"put\",\"path\":\"/a\"}".repeat(8);
        let dictionary = Dictionary::train(&[data.clone()]);
        let options = BlobOptions {
            dictionary: Some(&dictionary),
            ..Default::default()
        };
        let buf = compress_blob(&data, &options);
        let (method, original, compressed) = split_payload(&buf);
        assert_eq!(method, Method::Dict);
        assert_eq!(original, data.len());
        assert!(compressed < data.len());
        assert_eq!(decompress_blob(&buf, &options).unwrap(), data);
    }

    #[test]
    fn external_method_roundtrip() {
        let data = vec![0xAB; 300];
        let options = BlobOptions {
            fallback_compress: Some(&toy_compress),
            fallback_decompress: Some(&toy_decompress),
            ..Default::default()
        };
        let buf = compress_blob(&data, &options);
        let (method, _, compressed) = split_payload(&buf);
        assert_eq!(method, Method::External);
        assert!(compressed < data.len());
        assert_eq!(decompress_blob(&buf, &options).unwrap(), data);
    }

    #[test]
    fn dict_external_roundtrip() {
        // Dictionary output of a repetitive text blob is itself runs of
        // escape pairs, which the toy RLE then shrinks further.
        let data = b"abab".repeat(128);
        let dictionary = Dictionary::train(&[data.clone()]);
        let options = BlobOptions {
            dictionary: Some(&dictionary),
            fallback_compress: Some(&toy_compress),
            fallback_decompress: Some(&toy_decompress),
        };
        let buf = compress_blob(&data, &options);
        let (method, original, _) = split_payload(&buf);
        assert!(method == Method::Dict || method == Method::DictExternal);
        assert_eq!(original, data.len());
        assert_eq!(decompress_blob(&buf, &options).unwrap(), data);
    }

    #[test]
    fn missing_collaborators_on_decode() {
        let data = vec![0xCD; 200];
        let options = BlobOptions {
            fallback_compress: Some(&toy_compress),
            fallback_decompress: Some(&toy_decompress),
            ..Default::default()
        };
        let buf = compress_blob(&data, &options);
        assert_eq!(split_payload(&buf).0, Method::External);
        assert_eq!(
            decompress_blob(&buf, &BlobOptions::default()),
            Err(Error::MissingCollaborator {
                what: "external decompressor"
            })
        );
    }

    #[test]
    fn unknown_method() {
        let mut payload = vec![0x7Fu8, 0x00];
        write_varint(&mut payload, 0);
        write_varint(&mut payload, 0);
        let buf = write_envelope(TAG_COMPRESSED, &payload);
        assert_eq!(
            decompress_blob(&buf, &BlobOptions::default()),
            Err(Error::BadMethod { method: 0x7F })
        );
    }

    #[test]
    fn wrong_tag() {
        let buf = write_envelope(crate::envelope::TAG_GROUP, &[0x00]);
        assert!(matches!(
            decompress_blob(&buf, &BlobOptions::default()),
            Err(Error::BadTag { .. })
        ));
    }

    #[test]
    fn failing_compressor_is_discarded() {
        let failing: &dyn Fn(&[u8]) -> Result<Vec<u8>> =
            &|_| Err(Error::Collaborator("deflate exploded".into()));
        let data = b"negotiation survives collaborator failures";
        let options = BlobOptions {
            fallback_compress: Some(failing),
            ..Default::default()
        };
        let buf = compress_blob(data, &options);
        let (method, _, compressed) = split_payload(&buf);
        assert_eq!(method, Method::None);
        assert_eq!(compressed, data.len());
    }

    #[test]
    fn random_blobs_roundtrip() {
        use rand::{rngs::StdRng, Rng, SeedableRng};
        let mut rng = StdRng::seed_from_u64(0x5A4B);
        let options = BlobOptions {
            fallback_compress: Some(&toy_compress),
            fallback_decompress: Some(&toy_decompress),
            ..Default::default()
        };
        for len in [1usize, 17, 256, 1000] {
            let data: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
            let buf = compress_blob(&data, &options);
            assert_eq!(decompress_blob(&buf, &options).unwrap(), data);
        }
    }

    #[test]
    fn empty_blob() {
        let buf = compress_blob(b"", &BlobOptions::default());
        let (method, original, compressed) = split_payload(&buf);
        assert_eq!(method, Method::None);
        assert_eq!(original, 0);
        assert_eq!(compressed, 0);
        assert_eq!(decompress_blob(&buf, &BlobOptions::default()).unwrap(), b"");
    }
}
