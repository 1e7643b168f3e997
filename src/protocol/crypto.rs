//! # Crypto Capability
//!
//! The two roles a packet delegates its keyed transforms to, and the table
//! that binds one instance of each to every `PacketType`.
//!
//! Call order is the whole contract: `Encrypter::commit` runs once before
//! `Encrypter::finish`, and `finish`/`Decrypter::parse` are the only places
//! where session key material is used.

use crate::config::CryptoConfig;
use crate::core::packet::PacketType;
use crate::core::session::Session;
use crate::error::Result;
use crate::protocol::game::GameCipher;
use crate::protocol::login::LoginCipher;
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;

/// Which peer produced a byte stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    ClientToServer,
    ServerToClient,
}

impl Direction {
    /// One-byte tag used for domain separation inside ciphers
    pub fn tag(self) -> u8 {
        match self {
            Direction::ClientToServer => 0x43,
            Direction::ServerToClient => 0x53,
        }
    }

    pub fn reverse(self) -> Self {
        match self {
            Direction::ClientToServer => Direction::ServerToClient,
            Direction::ServerToClient => Direction::ClientToServer,
        }
    }
}

/// Outgoing half of a connection's crypto
pub trait Encrypter: Send + Sync {
    /// Content-phase preparation (framing, padding). No key material.
    fn commit(&self, buffer: &mut Vec<u8>) -> Result<()>;

    /// Crypto-phase transform applied in place using the session's keys
    fn finish(&self, buffer: &mut Vec<u8>, session: Option<&Session>) -> Result<()>;
}

/// Incoming half of a connection's crypto
pub trait Decrypter: Send + Sync {
    /// Authenticate, decrypt and split `buffer` into logical messages
    fn parse(&self, buffer: &[u8], session: Option<&Session>) -> Result<Vec<Bytes>>;
}

/// The encrypter/decrypter instances bound to one packet type
#[derive(Clone)]
pub struct CryptoPair {
    pub encrypter: Arc<dyn Encrypter>,
    pub decrypter: Arc<dyn Decrypter>,
}

impl CryptoPair {
    pub fn new(encrypter: Arc<dyn Encrypter>, decrypter: Arc<dyn Decrypter>) -> Self {
        Self {
            encrypter,
            decrypter,
        }
    }
}

impl fmt::Debug for CryptoPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptoPair").finish_non_exhaustive()
    }
}

/// Lookup table from packet type to its crypto pair, built once at startup
#[derive(Clone, Debug, Default)]
pub struct CryptoTable {
    pairs: [Option<CryptoPair>; PacketType::COUNT],
}

impl CryptoTable {
    /// A table with no bindings
    pub fn empty() -> Self {
        Self::default()
    }

    /// Login and game ciphers for both sides of a connection
    pub fn standard(config: &CryptoConfig) -> Self {
        let mut table = Self::empty();
        for kind in PacketType::ALL {
            let outgoing = kind.outgoing();
            let pair = if kind.is_login() {
                CryptoPair::new(
                    Arc::new(LoginCipher::new(outgoing, config.max_frame_size)),
                    Arc::new(LoginCipher::new(outgoing.reverse(), config.max_frame_size)),
                )
            } else {
                CryptoPair::new(
                    Arc::new(GameCipher::new(outgoing, config)),
                    Arc::new(GameCipher::new(outgoing.reverse(), config)),
                )
            };
            table.bind(kind, pair);
        }
        table
    }

    /// Bind (or replace) the pair for `kind`
    pub fn bind(&mut self, kind: PacketType, pair: CryptoPair) -> &mut Self {
        self.pairs[kind.index()] = Some(pair);
        self
    }

    /// Pair bound to `kind`, if any
    pub fn get(&self, kind: PacketType) -> Option<&CryptoPair> {
        self.pairs[kind.index()].as_ref()
    }
}
