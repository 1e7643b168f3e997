//! # Packet Factory
//!
//! Object pool that hands out [`Packet`]s bound to their type's crypto pair
//! and takes them back for reuse.
//!
//! The factory is an explicit context value: it owns the free list and the
//! [`CryptoTable`], and is threaded through connection handling by `&mut`.
//! Nothing is global and nothing is locked; share a factory across threads by
//! wrapping it yourself.
//!
//! ## Ownership
//! `acquire` moves a packet out of the pool, `retire` moves it back in. A
//! packet is owned by exactly one of the caller or the pool at any time, so
//! retiring twice is a compile error rather than a runtime check.
//!
//! ## Usage
//! ```rust
//! use game_envelope::config::CryptoConfig;
//! use game_envelope::core::factory::PacketFactory;
//! use game_envelope::core::packet::PacketType;
//! use game_envelope::protocol::crypto::CryptoTable;
//!
//! let mut factory = PacketFactory::new(CryptoTable::standard(&CryptoConfig::default()));
//! let mut packet = factory.acquire(PacketType::ClientLogin, None, b"NoS0575");
//! packet.finish().unwrap();
//! factory.retire(packet);
//! assert_eq!(factory.available(), 1);
//! ```

use crate::config::{EnvelopeConfig, DEFAULT_BUFFER_CAPACITY};
use crate::core::packet::{Packet, PacketType};
use crate::core::session::Session;
use crate::error::{ProtocolError, Result};
use crate::protocol::crypto::CryptoTable;
use crate::transport::Transport;
use crate::utils::metrics::PoolMetrics;
use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, instrument, trace};

/// Pool of reusable packets plus the crypto binding table
#[derive(Debug)]
pub struct PacketFactory {
    pool: Vec<Packet>,
    crypto: CryptoTable,
    buffer_capacity: usize,
    metrics: Arc<PoolMetrics>,
}

impl PacketFactory {
    /// Create an empty pool over `crypto`
    pub fn new(crypto: CryptoTable) -> Self {
        Self {
            pool: Vec::new(),
            crypto,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            metrics: Arc::new(PoolMetrics::new()),
        }
    }

    /// Build a prewarmed pool with the standard crypto table
    pub fn from_config(config: &EnvelopeConfig) -> Self {
        let mut factory = Self::new(CryptoTable::standard(&config.crypto));
        factory.buffer_capacity = config.pool.buffer_capacity;
        factory.prewarm(config.pool.prewarm);
        factory
    }

    /// Allocate `count` packets into the pool ahead of demand
    pub fn prewarm(&mut self, count: usize) {
        self.pool.reserve(count);
        for _ in 0..count {
            self.pool.push(self.allocate());
        }
        debug!(count, available = self.pool.len(), "Packet pool prewarmed");
    }

    fn allocate(&self) -> Packet {
        self.metrics.packet_allocated();
        Packet::with_capacity(self.buffer_capacity)
    }

    pub fn crypto(&self) -> &CryptoTable {
        &self.crypto
    }

    /// Shared handle to this pool's counters
    pub fn metrics(&self) -> Arc<PoolMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Number of retired packets waiting for reuse
    pub fn available(&self) -> usize {
        self.pool.len()
    }

    /// Take a packet from the pool (allocating if empty), reset it and bind
    /// the crypto pair for `kind`. Never fails.
    pub fn acquire(
        &mut self,
        kind: PacketType,
        session: Option<Arc<Session>>,
        data: &[u8],
    ) -> Packet {
        let mut packet = match self.pool.pop() {
            Some(packet) => packet,
            None => self.allocate(),
        };
        packet.reset(kind, session, data, self.crypto.get(kind).cloned());
        self.metrics.packet_acquired();
        trace!(?kind, len = data.len(), available = self.pool.len(), "Packet acquired");
        packet
    }

    /// Acquire a packet with no initial content
    pub fn acquire_empty(&mut self, kind: PacketType, session: Option<Arc<Session>>) -> Packet {
        self.acquire(kind, session, &[])
    }

    /// Return a packet to the pool. Its bytes are not scrubbed; its session
    /// and crypto references are released.
    pub fn retire(&mut self, mut packet: Packet) {
        packet.release();
        self.pool.push(packet);
        self.metrics.packet_retired();
        trace!(available = self.pool.len(), "Packet retired");
    }

    /// Copy `packet`'s current content into a fresh packet bound to `session`
    pub fn clone_packet(&mut self, packet: &Packet, session: Option<Arc<Session>>) -> Packet {
        let copy = self.acquire(packet.kind(), session, packet.data());
        self.metrics.packet_cloned();
        copy
    }

    /// Batch two packets of the same session into one finished packet.
    ///
    /// Each non-empty input is committed and finished on its own, then the
    /// ciphertexts are concatenated (`one` first) into a new packet that is
    /// force-finished. Both inputs are retired, including on error.
    #[instrument(skip_all, fields(kind = ?one.kind(), one_len = one.len(), other_len = other.len()))]
    pub fn merge(&mut self, mut one: Packet, mut other: Packet) -> Result<Packet> {
        if session_id(&one) != session_id(&other) {
            self.retire(one);
            self.retire(other);
            return Err(ProtocolError::SessionMismatch);
        }

        let mut merged = self.acquire_empty(one.kind(), one.session().cloned());
        let result = Self::finish_into(&mut merged, &mut one)
            .and_then(|_| Self::finish_into(&mut merged, &mut other));

        self.retire(one);
        self.retire(other);

        match result {
            Ok(()) => {
                merged.force_finish();
                self.metrics.packet_merged();
                debug!(len = merged.len(), "Packets merged");
                Ok(merged)
            }
            Err(e) => {
                self.retire(merged);
                Err(e)
            }
        }
    }

    /// Fold any number of packets through [`merge`](Self::merge), in order.
    /// Returns `None` for an empty input. A lone empty packet comes back
    /// finished, as `merge` of two empty packets does.
    pub fn merge_all<I>(&mut self, packets: I) -> Result<Option<Packet>>
    where
        I: IntoIterator<Item = Packet>,
    {
        let mut iter = packets.into_iter();
        let Some(mut acc) = iter.next() else {
            return Ok(None);
        };

        if acc.is_empty() {
            acc.force_finish();
        } else if let Err(e) = acc.finish() {
            self.retire(acc);
            iter.for_each(|p| self.retire(p));
            return Err(e);
        }

        let result = iter
            .by_ref()
            .try_fold(acc, |acc, packet| self.merge(acc, packet));
        if result.is_err() {
            iter.for_each(|p| self.retire(p));
        }
        result.map(Some)
    }

    /// Send `packet` and retire it, whether or not the send succeeded
    pub fn send_and_retire<T: Transport + ?Sized>(
        &mut self,
        mut packet: Packet,
        transport: &mut T,
    ) -> Result<()> {
        let result = packet.send(transport);
        if result.is_ok() {
            self.metrics.packet_sent(packet.len() as u64);
        }
        self.retire(packet);
        result
    }

    /// Decrypt received bytes through a pooled packet of type `kind`
    pub fn receive(
        &mut self,
        kind: PacketType,
        session: Option<Arc<Session>>,
        bytes: &[u8],
    ) -> Result<Vec<Bytes>> {
        let packet = self.acquire(kind, session, bytes);
        let result = packet.decrypt();
        if result.is_err() {
            self.metrics.decrypt_failed();
        }
        self.retire(packet);
        result
    }

    fn finish_into(target: &mut Packet, source: &mut Packet) -> Result<()> {
        if source.is_empty() {
            return Ok(());
        }
        source.commit()?;
        source.finish()?;
        target.append_packet(source)?;
        Ok(())
    }
}

fn session_id(packet: &Packet) -> Option<u64> {
    packet.session().map(|s| s.id())
}
