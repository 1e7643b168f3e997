//! XChaCha20-Poly1305 AEAD wrapper used by the game cipher.
//!
//! The 24-byte extended nonce makes random nonces safe for the lifetime of
//! a session key, so no per-session nonce counter is kept.

use crate::error::{constants, ProtocolError, Result};
use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};

/// Extended nonce length
pub const NONCE_SIZE: usize = 24;

/// Poly1305 tag length
pub const TAG_SIZE: usize = 16;

pub struct Crypto {
    cipher: XChaCha20Poly1305,
}

impl Crypto {
    pub fn new(key: &[u8; 32]) -> Self {
        Self {
            cipher: XChaCha20Poly1305::new(Key::from_slice(key)),
        }
    }

    /// Random nonce from the operating system RNG
    pub fn generate_nonce() -> Result<[u8; NONCE_SIZE]> {
        let mut nonce = [0u8; NONCE_SIZE];
        getrandom::fill(&mut nonce)
            .map_err(|_| ProtocolError::Custom(constants::ERR_RNG_FAILED.into()))?;
        Ok(nonce)
    }

    /// Encrypt `data`, authenticating `aad` alongside it
    pub fn encrypt(&self, data: &[u8], nonce: &[u8; NONCE_SIZE], aad: &[u8]) -> Result<Vec<u8>> {
        self.cipher
            .encrypt(XNonce::from_slice(nonce), Payload { msg: data, aad })
            .map_err(|_| ProtocolError::EncryptionFailure)
    }

    /// Decrypt and verify `ciphertext` (tag included)
    pub fn decrypt(
        &self,
        ciphertext: &[u8],
        nonce: &[u8; NONCE_SIZE],
        aad: &[u8],
    ) -> Result<Vec<u8>> {
        self.cipher
            .decrypt(
                XNonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad,
                },
            )
            .map_err(|_| ProtocolError::DecryptionFailure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt() {
        let crypto = Crypto::new(&[7u8; 32]);
        let nonce = Crypto::generate_nonce().unwrap();
        let ct = crypto.encrypt(b"payload", &nonce, b"A").unwrap();
        assert_eq!(ct.len(), 7 + TAG_SIZE);
        assert_eq!(crypto.decrypt(&ct, &nonce, b"A").unwrap(), b"payload");
    }

    #[test]
    fn test_wrong_aad_rejected() {
        let crypto = Crypto::new(&[7u8; 32]);
        let nonce = Crypto::generate_nonce().unwrap();
        let ct = crypto.encrypt(b"payload", &nonce, b"A").unwrap();
        assert!(matches!(
            crypto.decrypt(&ct, &nonce, b"B"),
            Err(ProtocolError::DecryptionFailure)
        ));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let nonce = Crypto::generate_nonce().unwrap();
        let ct = Crypto::new(&[1u8; 32])
            .encrypt(b"payload", &nonce, &[])
            .unwrap();
        assert!(Crypto::new(&[2u8; 32]).decrypt(&ct, &nonce, &[]).is_err());
    }
}
