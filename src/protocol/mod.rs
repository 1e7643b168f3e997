//! # Crypto Strategies
//!
//! The capability traits packets delegate to, the per-type binding table, and
//! the standard login and game ciphers.
//!
//! ## Directions
//! A `Client*` packet encrypts client-to-server bytes and decrypts
//! server-to-client bytes; `Server*` is the mirror. Bytes finished by a
//! `ClientGame` packet are therefore read back by a `ServerGame` packet.

pub mod crypto;
pub mod frame;
pub mod game;
pub mod login;
