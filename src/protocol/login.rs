//! Keyless login cipher.
//!
//! Login traffic happens before any key material exists, so it is only
//! framed and obfuscated. The obfuscation works byte by byte with no
//! positional state, which keeps concatenated packets decodable.
//!
//! ```text
//! commit: [Length(4, BE)] [Payload(N)]
//! finish: every byte b -> (b ^ 0xC3) + 0x0F   (client to server)
//!                         b + 0x0F            (server to client)
//! ```

use crate::core::session::Session;
use crate::error::{ProtocolError, Result};
use crate::protocol::crypto::{Decrypter, Direction, Encrypter};
use crate::protocol::frame;
use bytes::Bytes;
use tracing::trace;

const CLIENT_XOR: u8 = 0xC3;
const SHIFT: u8 = 0x0F;

/// Login framing and obfuscation for one direction
#[derive(Debug, Clone)]
pub struct LoginCipher {
    direction: Direction,
    max_frame_size: usize,
}

impl LoginCipher {
    pub fn new(direction: Direction, max_frame_size: usize) -> Self {
        Self {
            direction,
            max_frame_size,
        }
    }

    #[inline]
    fn obfuscate(&self, byte: u8) -> u8 {
        match self.direction {
            Direction::ClientToServer => (byte ^ CLIENT_XOR).wrapping_add(SHIFT),
            Direction::ServerToClient => byte.wrapping_add(SHIFT),
        }
    }

    #[inline]
    fn reveal(&self, byte: u8) -> u8 {
        match self.direction {
            Direction::ClientToServer => byte.wrapping_sub(SHIFT) ^ CLIENT_XOR,
            Direction::ServerToClient => byte.wrapping_sub(SHIFT),
        }
    }
}

impl Encrypter for LoginCipher {
    fn commit(&self, buffer: &mut Vec<u8>) -> Result<()> {
        if buffer.len() > self.max_frame_size {
            return Err(ProtocolError::OversizedPacket(buffer.len()));
        }
        frame::prepend_length(buffer)
    }

    fn finish(&self, buffer: &mut Vec<u8>, _session: Option<&Session>) -> Result<()> {
        for byte in buffer.iter_mut() {
            *byte = self.obfuscate(*byte);
        }
        Ok(())
    }
}

impl Decrypter for LoginCipher {
    fn parse(&self, buffer: &[u8], _session: Option<&Session>) -> Result<Vec<Bytes>> {
        let plain: Vec<u8> = buffer.iter().map(|&b| self.reveal(b)).collect();

        let mut messages = Vec::new();
        let mut rest = plain.as_slice();
        while !rest.is_empty() {
            let (body, tail) = frame::split_frame(rest, self.max_frame_size)?;
            messages.push(Bytes::copy_from_slice(body));
            rest = tail;
        }

        trace!(
            direction = ?self.direction,
            count = messages.len(),
            "Parsed login frames"
        );
        Ok(messages)
    }
}
