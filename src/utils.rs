use crate::error::{Error, Result};

/// Split `len` bytes off the front of `buf`, advancing the cursor.
pub(crate) fn take<'a>(buf: &mut &'a [u8], len: usize, step: &'static str) -> Result<&'a [u8]> {
    if buf.len() < len {
        return Err(Error::Truncated { step });
    }
    let (head, rest) = buf.split_at(len);
    *buf = rest;
    Ok(head)
}

/// Read a single byte off the front of `buf`.
pub(crate) fn read_u8(buf: &mut &[u8], step: &'static str) -> Result<u8> {
    let (&byte, rest) = buf.split_first().ok_or(Error::Truncated { step })?;
    *buf = rest;
    Ok(byte)
}

/// Reject payloads with bytes left over after a complete parse. `cursor` is
/// what remains of a payload that started `payload_len` bytes long.
pub(crate) fn expect_consumed(cursor: &[u8], payload_len: usize) -> Result<()> {
    if !cursor.is_empty() {
        return Err(Error::LengthMismatch {
            expected: payload_len - cursor.len(),
            actual: payload_len,
        });
    }
    Ok(())
}
