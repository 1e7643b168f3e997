//! Length-prefixed framing shared by the login and game ciphers.
//!
//! ```text
//! [Length(4, BE)] [Body(Length)]
//! ```

use crate::error::{constants, ProtocolError, Result};

/// Size of the big-endian length prefix
pub const LENGTH_PREFIX: usize = 4;

/// Prefix `buffer` in place with its own length
pub fn prepend_length(buffer: &mut Vec<u8>) -> Result<()> {
    let len = u32::try_from(buffer.len()).map_err(|_| ProtocolError::OversizedPacket(buffer.len()))?;
    buffer.extend_from_slice(&len.to_be_bytes());
    buffer.rotate_right(LENGTH_PREFIX);
    Ok(())
}

/// Append `body` to `out` as one frame
pub fn write_frame(out: &mut Vec<u8>, body: &[u8]) -> Result<()> {
    let len = u32::try_from(body.len()).map_err(|_| ProtocolError::OversizedPacket(body.len()))?;
    out.reserve(LENGTH_PREFIX + body.len());
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(body);
    Ok(())
}

/// Read the length prefix at the start of `buf` without consuming it
pub fn peek_length(buf: &[u8]) -> Result<usize> {
    let prefix: [u8; LENGTH_PREFIX] = buf
        .get(..LENGTH_PREFIX)
        .and_then(|p| p.try_into().ok())
        .ok_or_else(|| ProtocolError::MalformedFrame(constants::ERR_TRUNCATED_LENGTH.into()))?;
    Ok(u32::from_be_bytes(prefix) as usize)
}

/// Split the first frame off `buf`, returning `(body, rest)`.
///
/// The declared length is checked against `max_frame_size` before the body
/// is sliced.
pub fn split_frame(buf: &[u8], max_frame_size: usize) -> Result<(&[u8], &[u8])> {
    let len = peek_length(buf)?;
    if len > max_frame_size {
        return Err(ProtocolError::OversizedPacket(len));
    }

    let rest = &buf[LENGTH_PREFIX..];
    if rest.len() < len {
        return Err(ProtocolError::MalformedFrame(
            constants::ERR_TRUNCATED_FRAME.into(),
        ));
    }
    Ok(rest.split_at(len))
}
