//! Keyed game cipher.
//!
//! Commit frames and pads the plaintext; finish seals it with
//! XChaCha20-Poly1305 under the session key and wraps the result in an
//! outer frame, so any number of finished packets can be concatenated and
//! still be split apart by the receiver.
//!
//! ```text
//! committed: [Length(4)] [Payload(N)] [Zero padding to block]
//! finished:  [Length(4)] [Nonce(24)] [Ciphertext(committed) + Tag(16)]
//! ```
//!
//! The direction tag is authenticated as associated data, so bytes sent by
//! one side never verify as bytes sent by the other.

use crate::config::CryptoConfig;
use crate::core::session::Session;
use crate::error::{constants, ProtocolError, Result};
use crate::protocol::crypto::{Decrypter, Direction, Encrypter};
use crate::protocol::frame::{self, LENGTH_PREFIX};
use crate::utils::crypto::{Crypto, NONCE_SIZE, TAG_SIZE};
use bytes::Bytes;
use tracing::trace;
use zeroize::Zeroize;

/// Game framing and AEAD sealing for one direction
#[derive(Debug, Clone)]
pub struct GameCipher {
    direction: Direction,
    max_frame_size: usize,
    padding_block: usize,
}

impl GameCipher {
    pub fn new(direction: Direction, config: &CryptoConfig) -> Self {
        Self {
            direction,
            max_frame_size: config.max_frame_size,
            padding_block: config.padding_block,
        }
    }

    fn crypto_for(session: Option<&Session>) -> Result<Crypto> {
        let key = session
            .and_then(Session::key)
            .ok_or(ProtocolError::MissingSessionKey)?;
        Ok(Crypto::new(key.as_bytes()))
    }

    fn padding_for(&self, len: usize) -> usize {
        if self.padding_block <= 1 {
            return 0;
        }
        (self.padding_block - len % self.padding_block) % self.padding_block
    }
}

impl Encrypter for GameCipher {
    fn commit(&self, buffer: &mut Vec<u8>) -> Result<()> {
        frame::prepend_length(buffer)?;
        let padding = self.padding_for(buffer.len());
        buffer.resize(buffer.len() + padding, 0);
        Ok(())
    }

    fn finish(&self, buffer: &mut Vec<u8>, session: Option<&Session>) -> Result<()> {
        let crypto = Self::crypto_for(session)?;
        let mut nonce = Crypto::generate_nonce()?;
        let ciphertext = crypto.encrypt(buffer, &nonce, &[self.direction.tag()])?;

        let body_len = NONCE_SIZE + ciphertext.len();
        if body_len > self.max_frame_size {
            return Err(ProtocolError::OversizedPacket(body_len));
        }

        // Plaintext must not linger in the reused pool buffer
        buffer.zeroize();
        buffer.reserve(LENGTH_PREFIX + body_len);
        buffer.extend_from_slice(&(body_len as u32).to_be_bytes());
        buffer.extend_from_slice(&nonce);
        buffer.extend_from_slice(&ciphertext);
        nonce.zeroize();

        trace!(direction = ?self.direction, frame_len = body_len, "Sealed game frame");
        Ok(())
    }
}

impl Decrypter for GameCipher {
    fn parse(&self, buffer: &[u8], session: Option<&Session>) -> Result<Vec<Bytes>> {
        let crypto = Self::crypto_for(session)?;
        let aad = [self.direction.tag()];

        let mut messages = Vec::new();
        let mut rest = buffer;
        while !rest.is_empty() {
            let (body, tail) = frame::split_frame(rest, self.max_frame_size)?;
            rest = tail;

            if body.len() < NONCE_SIZE + TAG_SIZE {
                return Err(ProtocolError::MalformedFrame(
                    constants::ERR_SHORT_CIPHERTEXT.into(),
                ));
            }
            let (nonce_bytes, ciphertext) = body.split_at(NONCE_SIZE);
            let mut nonce = [0u8; NONCE_SIZE];
            nonce.copy_from_slice(nonce_bytes);

            let mut plaintext = crypto.decrypt(ciphertext, &nonce, &aad)?;
            let len = frame::peek_length(&plaintext)?;
            if LENGTH_PREFIX + len > plaintext.len() {
                plaintext.zeroize();
                return Err(ProtocolError::MalformedFrame(
                    constants::ERR_BAD_INNER_LENGTH.into(),
                ));
            }
            messages.push(Bytes::copy_from_slice(
                &plaintext[LENGTH_PREFIX..LENGTH_PREFIX + len],
            ));
            plaintext.zeroize();
        }

        trace!(
            direction = ?self.direction,
            count = messages.len(),
            "Opened game frames"
        );
        Ok(messages)
    }
}
