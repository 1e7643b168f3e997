//! # game-envelope
//!
//! Poolable packet envelope for client-server game protocols.
//!
//! A [`Packet`] carries raw bytes through two idempotent phases before it is
//! written to a [`Transport`]:
//!
//! 1. **commit**: content finalization. Authenticated client game packets
//!    are stamped with the session's liveness counter, then the bound
//!    encrypter frames/pads the buffer.
//! 2. **finish**: cryptographic finalization with the session's keys.
//!
//! Received bytes go the other way through [`Packet::decrypt`].
//!
//! Packets come from a [`PacketFactory`], which recycles them and binds each
//! one to the encrypter/decrypter pair its [`PacketType`] selects in a
//! [`CryptoTable`]. Finished packets of one session can be batched with
//! [`PacketFactory::merge`] and copied to another session with
//! [`Packet::clone_for`].
//!
//! ## Example
//! ```rust
//! use game_envelope::prelude::*;
//! use std::sync::Arc;
//!
//! let mut factory = PacketFactory::from_config(&EnvelopeConfig::default());
//! let key = SessionKey::new([7u8; 32]);
//! let client = Arc::new(Session::new(1).with_key(key.clone()).with_alive(42));
//! let server = Arc::new(Session::new(1).with_key(key));
//!
//! let mut wire: Vec<bytes::Bytes> = Vec::new();
//! let packet = factory.acquire(PacketType::ClientGame, Some(client), b"walk 10 12");
//! factory.send_and_retire(packet, &mut wire).unwrap();
//!
//! let messages = factory.receive(PacketType::ServerGame, Some(server), &wire[0]).unwrap();
//! assert_eq!(&messages[0][..], b"42 walk 10 12");
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod transport;
pub mod utils;

pub use crate::core::factory::PacketFactory;
pub use crate::core::packet::{Packet, PacketType};
pub use crate::core::session::{Session, SessionKey};
pub use crate::error::{ProtocolError, Result};
pub use crate::protocol::crypto::{CryptoPair, CryptoTable, Decrypter, Encrypter};
pub use crate::transport::Transport;

/// Common imports for envelope users
pub mod prelude {
    pub use crate::config::EnvelopeConfig;
    pub use crate::core::factory::PacketFactory;
    pub use crate::core::packet::{Packet, PacketType};
    pub use crate::core::session::{split_alive_tag, Session, SessionKey};
    pub use crate::error::{ProtocolError, Result};
    pub use crate::protocol::crypto::{CryptoTable, Decrypter, Direction, Encrypter};
    pub use crate::transport::{ChannelTransport, IoTransport, Transport};
}
