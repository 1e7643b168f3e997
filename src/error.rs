//! # Error Types
//!
//! Error handling for the packet envelope.
//!
//! This module defines every error variant that can surface from packet
//! operations, from transport failures to authentication failures while
//! parsing received bytes.
//!
//! ## Error Categories
//! - **I/O Errors**: Transport and file system failures
//! - **Lifecycle Errors**: Appending to a finished packet, unbound crypto
//! - **Cryptographic Errors**: Encryption/decryption failures, missing keys
//! - **Framing Errors**: Truncated or oversized frames during parse
//!
//! Misuse of the pool (retiring a packet twice, retiring a packet still in
//! use) has no variant here: `PacketFactory::retire` takes the packet by
//! value, so those programs do not compile.
//!
//! ## Example Usage
//! ```rust
//! use game_envelope::error::{ProtocolError, Result};
//!
//! fn checked_len(frame: &[u8], limit: usize) -> Result<usize> {
//!     if frame.len() > limit {
//!         return Err(ProtocolError::OversizedPacket(frame.len()));
//!     }
//!     Ok(frame.len())
//! }
//!
//! assert!(checked_len(&[0u8; 8], 4).is_err());
//! ```

use crate::core::packet::PacketType;
use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Framing errors
    pub const ERR_TRUNCATED_LENGTH: &str = "Frame length prefix truncated";
    pub const ERR_TRUNCATED_FRAME: &str = "Frame body shorter than its length prefix";
    pub const ERR_SHORT_CIPHERTEXT: &str = "Frame too short to hold nonce and tag";
    pub const ERR_BAD_INNER_LENGTH: &str = "Inner payload length exceeds decrypted frame";

    /// Transport errors
    pub const ERR_CHANNEL_CLOSED: &str = "Transport channel receiver dropped";

    /// Randomness errors
    pub const ERR_RNG_FAILED: &str = "Operating system RNG unavailable";
}

// ProtocolError is the primary error type for all envelope operations
#[derive(Error, Debug, Serialize, Deserialize)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    #[serde(skip_serializing, skip_deserializing)]
    Io(#[from] io::Error),

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("Packet too large: {0} bytes")]
    OversizedPacket(usize),

    #[error("Decryption failed")]
    DecryptionFailure,

    #[error("Encryption failed")]
    EncryptionFailure,

    #[error("No crypto bound for packet type {0:?}")]
    MissingCrypto(PacketType),

    #[error("Session has no key material")]
    MissingSessionKey,

    #[error("Packet is finished and can no longer be modified")]
    PacketFinished,

    #[error("Merged packets belong to different sessions")]
    SessionMismatch,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Custom error: {0}")]
    Custom(String),
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProtocolError::MissingCrypto(PacketType::ServerLogin);
        assert_eq!(err.to_string(), "No crypto bound for packet type ServerLogin");

        let err = ProtocolError::OversizedPacket(70_000);
        assert_eq!(err.to_string(), "Packet too large: 70000 bytes");
    }

    #[test]
    fn test_io_error_converts() {
        let io_err = io::Error::new(io::ErrorKind::BrokenPipe, "pipe");
        let err: ProtocolError = io_err.into();
        assert!(matches!(err, ProtocolError::Io(_)));
    }
}
