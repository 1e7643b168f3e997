//! # Packet
//!
//! A reusable envelope for one outgoing or incoming protocol message.
//!
//! ## Lifecycle
//! ```text
//! acquire -> append* -> commit -> finish -> send -> retire
//!                         |         |
//!                 session tag +   cipher/MAC
//!                 encrypter framing
//! ```
//!
//! Both phases are idempotent and guarded by monotone flags that only a
//! fresh acquisition from the [`PacketFactory`](crate::core::factory::PacketFactory)
//! resets. `finish` always runs `commit` first, so `finished` implies
//! `committed`.
//!
//! `Packet` is move-only: it has no public constructor and no `Clone`, and
//! the factory takes it back by value. A retired packet therefore cannot be
//! touched or retired again:
//!
//! ```compile_fail
//! use game_envelope::core::factory::PacketFactory;
//! use game_envelope::core::packet::PacketType;
//! use game_envelope::protocol::crypto::CryptoTable;
//!
//! let mut factory = PacketFactory::new(CryptoTable::empty());
//! let packet = factory.acquire(PacketType::ServerLogin, None, b"fail");
//! factory.retire(packet);
//! factory.retire(packet); // use of moved value
//! ```

use crate::core::factory::PacketFactory;
use crate::core::session::Session;
use crate::error::{ProtocolError, Result};
use crate::protocol::crypto::{CryptoPair, Direction};
use crate::transport::Transport;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{instrument, trace, warn};

/// Connection type a packet belongs to; selects its crypto pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PacketType {
    ClientLogin,
    ClientGame,
    ServerLogin,
    ServerGame,
}

impl PacketType {
    /// Number of variants, used to size lookup tables
    pub const COUNT: usize = 4;

    pub const ALL: [PacketType; PacketType::COUNT] = [
        PacketType::ClientLogin,
        PacketType::ClientGame,
        PacketType::ServerLogin,
        PacketType::ServerGame,
    ];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            PacketType::ClientLogin => 0,
            PacketType::ClientGame => 1,
            PacketType::ServerLogin => 2,
            PacketType::ServerGame => 3,
        }
    }

    pub fn is_login(self) -> bool {
        matches!(self, PacketType::ClientLogin | PacketType::ServerLogin)
    }

    /// Direction of the bytes this side encrypts
    pub fn outgoing(self) -> Direction {
        match self {
            PacketType::ClientLogin | PacketType::ClientGame => Direction::ClientToServer,
            PacketType::ServerLogin | PacketType::ServerGame => Direction::ServerToClient,
        }
    }

    /// The type used by the other end of the same connection
    pub fn peer(self) -> Self {
        match self {
            PacketType::ClientLogin => PacketType::ServerLogin,
            PacketType::ClientGame => PacketType::ServerGame,
            PacketType::ServerLogin => PacketType::ClientLogin,
            PacketType::ServerGame => PacketType::ClientGame,
        }
    }
}

/// Buffer plus metadata for one protocol message
#[derive(Debug)]
pub struct Packet {
    kind: PacketType,
    buffer: Vec<u8>,
    session: Option<Arc<Session>>,
    crypto: Option<CryptoPair>,
    committed: bool,
    finished: bool,
}

impl Packet {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            kind: PacketType::ServerLogin,
            buffer: Vec::with_capacity(capacity),
            session: None,
            crypto: None,
            committed: false,
            finished: false,
        }
    }

    /// Re-initialize for a new acquisition. Keeps the buffer's capacity.
    pub(crate) fn reset(
        &mut self,
        kind: PacketType,
        session: Option<Arc<Session>>,
        data: &[u8],
        crypto: Option<CryptoPair>,
    ) {
        self.kind = kind;
        self.buffer.clear();
        self.buffer.extend_from_slice(data);
        self.session = session;
        self.crypto = crypto;
        self.committed = false;
        self.finished = false;
    }

    /// Drop references the pool must not keep alive. Content is left as is.
    pub(crate) fn release(&mut self) {
        self.session = None;
        self.crypto = None;
    }

    pub fn kind(&self) -> PacketType {
        self.kind
    }

    pub fn session(&self) -> Option<&Arc<Session>> {
        self.session.as_ref()
    }

    pub fn data(&self) -> &[u8] {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub(crate) fn buffer_capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Append raw content. Rejected once the packet is finished.
    pub fn append(&mut self, bytes: &[u8]) -> Result<&mut Self> {
        if self.finished {
            return Err(ProtocolError::PacketFinished);
        }
        self.buffer.extend_from_slice(bytes);
        Ok(self)
    }

    /// Append another packet's current bytes
    pub fn append_packet(&mut self, other: &Packet) -> Result<&mut Self> {
        self.append(&other.buffer)
    }

    fn bound_crypto(&self) -> Result<&CryptoPair> {
        self.crypto
            .as_ref()
            .ok_or(ProtocolError::MissingCrypto(self.kind))
    }

    /// Content phase: session tag for authenticated client packets, then the
    /// encrypter's framing. No-op once committed.
    pub fn commit(&mut self) -> Result<()> {
        if self.committed {
            return Ok(());
        }
        let encrypter = self.bound_crypto()?.encrypter.clone();

        let mut tag_len = 0;
        if self.kind == PacketType::ClientGame {
            if let Some(session) = &self.session {
                let tag = session.alive_tag();
                tag_len = tag.len();
                self.buffer.extend_from_slice(&tag);
                self.buffer.rotate_right(tag_len);
            }
        }

        // a failed commit must leave the content untagged for the retry
        if let Err(e) = encrypter.commit(&mut self.buffer) {
            self.buffer.drain(..tag_len);
            return Err(e);
        }
        self.committed = true;
        trace!(kind = ?self.kind, len = self.buffer.len(), "Packet committed");
        Ok(())
    }

    /// Crypto phase: commit if needed, then encrypt/authenticate with the
    /// session's keys. No-op once finished.
    pub fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.commit()?;

        let encrypter = self.bound_crypto()?.encrypter.clone();
        encrypter.finish(&mut self.buffer, self.session.as_deref())?;
        self.finished = true;
        trace!(kind = ?self.kind, len = self.buffer.len(), "Packet finished");
        Ok(())
    }

    /// Mark the packet finished without running the encrypter. For buffers
    /// that already hold finalized ciphertext.
    pub fn force_finish(&mut self) {
        self.committed = true;
        self.finished = true;
    }

    /// Finish, then hand the bytes to `transport`
    #[instrument(skip(self, transport), fields(kind = ?self.kind))]
    pub fn send<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<()> {
        self.finish()?;
        transport.send(&self.buffer)
    }

    /// Authenticate, decrypt and split the buffer into logical messages
    pub fn decrypt(&self) -> Result<Vec<Bytes>> {
        let decrypter = &self.bound_crypto()?.decrypter;
        decrypter
            .parse(&self.buffer, self.session.as_deref())
            .inspect_err(|e| {
                warn!(kind = ?self.kind, len = self.buffer.len(), error = %e, "Packet decrypt failed");
            })
    }

    /// Copy this packet's current content into a fresh packet bound to
    /// `session`. The copy starts uncommitted.
    pub fn clone_for(
        &self,
        factory: &mut PacketFactory,
        session: Option<Arc<Session>>,
    ) -> Packet {
        factory.clone_packet(self, session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CryptoConfig;
    use crate::core::session::SessionKey;
    use crate::protocol::crypto::CryptoTable;

    fn factory() -> PacketFactory {
        PacketFactory::new(CryptoTable::standard(&CryptoConfig::default()))
    }

    fn keyed_session(alive: u32) -> Arc<Session> {
        Arc::new(
            Session::new(1)
                .with_key(SessionKey::new([3u8; 32]))
                .with_alive(alive),
        )
    }

    #[test]
    fn test_packet_type_peer_is_involution() {
        for kind in PacketType::ALL {
            assert_eq!(kind.peer().peer(), kind);
            assert_ne!(kind.outgoing(), kind.peer().outgoing());
        }
    }

    #[test]
    fn test_packet_type_index_matches_all() {
        for (i, kind) in PacketType::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn test_commit_prepends_alive_tag() {
        let mut factory = factory();
        let mut packet = factory.acquire(
            PacketType::ClientGame,
            Some(keyed_session(42)),
            b"MOVE 1 2",
        );
        packet.commit().unwrap();

        // [len][42 MOVE 1 2][padding]
        assert_eq!(&packet.data()[..4], &11u32.to_be_bytes());
        assert_eq!(&packet.data()[4..15], b"42 MOVE 1 2");
    }

    #[test]
    fn test_server_game_has_no_alive_tag() {
        let mut factory = factory();
        let mut packet = factory.acquire(
            PacketType::ServerGame,
            Some(keyed_session(42)),
            b"MOVE 1 2",
        );
        packet.commit().unwrap();
        assert_eq!(&packet.data()[4..12], b"MOVE 1 2");
    }

    #[test]
    fn test_commit_is_idempotent() {
        let mut factory = factory();
        let mut packet = factory.acquire(PacketType::ClientGame, Some(keyed_session(5)), b"x");
        packet.commit().unwrap();
        let once = packet.data().to_vec();
        packet.commit().unwrap();
        assert_eq!(packet.data(), once.as_slice());
        assert!(packet.is_committed());
        assert!(!packet.is_finished());
    }

    #[test]
    fn test_finish_implies_commit_and_is_idempotent() {
        let mut factory = factory();
        let mut packet = factory.acquire(PacketType::ClientGame, Some(keyed_session(5)), b"x");
        packet.finish().unwrap();
        assert!(packet.is_committed());
        assert!(packet.is_finished());

        let once = packet.data().to_vec();
        packet.finish().unwrap();
        assert_eq!(packet.data(), once.as_slice());
    }

    #[test]
    fn test_append_after_finish_rejected() {
        let mut factory = factory();
        let mut packet = factory.acquire(PacketType::ServerLogin, None, b"fail");
        packet.append(b" more").unwrap();
        assert_eq!(packet.data(), b"fail more");

        packet.finish().unwrap();
        assert!(matches!(
            packet.append(b"late"),
            Err(ProtocolError::PacketFinished)
        ));
    }

    #[test]
    fn test_unbound_packet_cannot_commit() {
        let mut factory = PacketFactory::new(CryptoTable::empty());
        let mut packet = factory.acquire(PacketType::ClientLogin, None, b"x");
        assert!(matches!(
            packet.commit(),
            Err(ProtocolError::MissingCrypto(PacketType::ClientLogin))
        ));
        assert!(!packet.is_committed());
        assert!(matches!(
            packet.decrypt(),
            Err(ProtocolError::MissingCrypto(PacketType::ClientLogin))
        ));
    }

    #[test]
    fn test_failed_finish_leaves_packet_unfinished() {
        let mut factory = factory();
        let mut packet = factory.acquire(PacketType::ServerGame, None, b"x");
        assert!(matches!(
            packet.finish(),
            Err(ProtocolError::MissingSessionKey)
        ));
        assert!(packet.is_committed());
        assert!(!packet.is_finished());
    }

    /// Fails its first commit, then frames like a bare length prefix
    struct FailOnce {
        failed: std::sync::atomic::AtomicBool,
    }

    impl crate::protocol::crypto::Encrypter for FailOnce {
        fn commit(&self, buffer: &mut Vec<u8>) -> Result<()> {
            if !self.failed.swap(true, std::sync::atomic::Ordering::SeqCst) {
                return Err(ProtocolError::EncryptionFailure);
            }
            crate::protocol::frame::prepend_length(buffer)
        }

        fn finish(&self, _buffer: &mut Vec<u8>, _session: Option<&Session>) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_failed_commit_retries_without_double_tag() {
        let standard = CryptoTable::standard(&CryptoConfig::default());
        let decrypter = standard
            .get(PacketType::ClientGame)
            .expect("bound")
            .decrypter
            .clone();
        let encrypter = Arc::new(FailOnce {
            failed: std::sync::atomic::AtomicBool::new(false),
        });

        let mut table = CryptoTable::empty();
        table.bind(PacketType::ClientGame, CryptoPair::new(encrypter, decrypter));
        let mut factory = PacketFactory::new(table);

        let mut packet = factory.acquire(
            PacketType::ClientGame,
            Some(keyed_session(42)),
            b"MOVE 1 2",
        );
        assert!(matches!(
            packet.commit(),
            Err(ProtocolError::EncryptionFailure)
        ));
        assert!(!packet.is_committed());
        assert_eq!(packet.data(), b"MOVE 1 2");

        packet.commit().unwrap();
        assert_eq!(&packet.data()[4..], b"42 MOVE 1 2");
    }

    #[test]
    fn test_force_finish_skips_encrypter() {
        let mut factory = factory();
        let mut packet = factory.acquire(PacketType::ServerGame, None, b"ciphertext");
        packet.force_finish();
        assert!(packet.is_committed());
        assert!(packet.is_finished());
        packet.finish().unwrap();
        assert_eq!(packet.data(), b"ciphertext");
    }
}
