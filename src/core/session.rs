//! # Session
//!
//! Per-connection state the envelope reads but never owns: an identifier,
//! the liveness counter stamped into authenticated client packets, and the
//! key material consumed by the game cipher.
//!
//! Packets hold sessions through `Arc<Session>`; the counter is atomic so a
//! session can be shared between the reader and writer halves of a
//! connection.

use crate::error::{constants, ProtocolError, Result};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Separator written between the liveness counter and the packet content
pub const ALIVE_SEPARATOR: u8 = b' ';

/// Symmetric key shared by both ends of a game connection
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey([u8; 32]);

impl SessionKey {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Generate a fresh key from the operating system RNG
    pub fn generate() -> Result<Self> {
        let mut bytes = [0u8; 32];
        getrandom::fill(&mut bytes)
            .map_err(|_| ProtocolError::Custom(constants::ERR_RNG_FAILED.into()))?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionKey(..)")
    }
}

/// Connection identity, liveness counter and key material
#[derive(Debug)]
pub struct Session {
    id: u64,
    alive: AtomicU32,
    key: Option<SessionKey>,
}

impl Session {
    /// Create a session with no key material (login phase)
    pub fn new(id: u64) -> Self {
        Self {
            id,
            alive: AtomicU32::new(0),
            key: None,
        }
    }

    /// Attach key material
    pub fn with_key(mut self, key: SessionKey) -> Self {
        self.key = Some(key);
        self
    }

    /// Start the liveness counter at a specific value
    pub fn with_alive(self, alive: u32) -> Self {
        self.alive.store(alive, Ordering::Relaxed);
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn key(&self) -> Option<&SessionKey> {
        self.key.as_ref()
    }

    /// Current liveness counter
    pub fn alive(&self) -> u32 {
        self.alive.load(Ordering::Relaxed)
    }

    /// Advance the liveness counter, returning the new value
    pub fn advance_alive(&self) -> u32 {
        self.alive.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    /// Decimal counter followed by the separator, as prepended on commit
    pub fn alive_tag(&self) -> Vec<u8> {
        let mut tag = self.alive().to_string().into_bytes();
        tag.push(ALIVE_SEPARATOR);
        tag
    }
}

/// Split a decrypted client message into its liveness counter and content.
///
/// Returns `None` when the message does not start with `<digits><space>` or
/// the digits overflow a `u32`.
pub fn split_alive_tag(message: &[u8]) -> Option<(u32, &[u8])> {
    let end = message.iter().position(|&b| b == ALIVE_SEPARATOR)?;
    let digits = &message[..end];
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let alive = std::str::from_utf8(digits).ok()?.parse::<u32>().ok()?;
    Some((alive, &message[end + 1..]))
}
