//! Property-based tests using proptest
//!
//! These tests check the lifecycle invariants over randomly generated
//! content, packet types and liveness counters.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use game_envelope::config::CryptoConfig;
use game_envelope::core::session::split_alive_tag;
use game_envelope::prelude::*;
use proptest::prelude::*;
use std::sync::Arc;

fn factory() -> PacketFactory {
    PacketFactory::new(CryptoTable::standard(&CryptoConfig::default()))
}

fn keyed(alive: u32) -> Arc<Session> {
    Arc::new(
        Session::new(77)
            .with_key(SessionKey::new([0x42; 32]))
            .with_alive(alive),
    )
}

fn any_kind() -> impl Strategy<Value = PacketType> {
    prop::sample::select(PacketType::ALL.to_vec())
}

// Property: committing twice leaves the same bytes as committing once
proptest! {
    #[test]
    fn prop_commit_idempotent(
        kind in any_kind(),
        alive in any::<u32>(),
        data in prop::collection::vec(any::<u8>(), 0..2048),
    ) {
        let mut factory = factory();
        let mut packet = factory.acquire(kind, Some(keyed(alive)), &data);
        packet.commit().unwrap();
        let once = packet.data().to_vec();
        packet.commit().unwrap();

        prop_assert_eq!(packet.data(), once.as_slice());
        prop_assert!(packet.is_committed());
    }
}

// Property: finish implies committed, and finishing again changes nothing
proptest! {
    #[test]
    fn prop_finish_idempotent(
        kind in any_kind(),
        data in prop::collection::vec(any::<u8>(), 0..2048),
    ) {
        let mut factory = factory();
        let mut packet = factory.acquire(kind, Some(keyed(1)), &data);
        packet.finish().unwrap();
        let once = packet.data().to_vec();
        packet.finish().unwrap();

        prop_assert!(packet.is_committed());
        prop_assert!(packet.is_finished());
        prop_assert_eq!(packet.data(), once.as_slice());
    }
}

// Property: the peer type recovers the commit-phase payload byte for byte
proptest! {
    #[test]
    fn prop_roundtrip_through_peer(
        kind in any_kind(),
        alive in any::<u32>(),
        data in prop::collection::vec(any::<u8>(), 0..4096),
    ) {
        let mut factory = factory();
        let session = keyed(alive);
        let mut packet = factory.acquire(kind, Some(session.clone()), &data);
        packet.finish().unwrap();

        let messages = factory.receive(kind.peer(), Some(session), packet.data()).unwrap();
        prop_assert_eq!(messages.len(), 1);

        if kind == PacketType::ClientGame {
            let (tag, content) = split_alive_tag(&messages[0]).expect("tagged");
            prop_assert_eq!(tag, alive);
            prop_assert_eq!(content, data.as_slice());
        } else {
            prop_assert_eq!(&messages[0][..], data.as_slice());
        }
    }
}

// Property: merge(A, B) is the concatenation of finish(A) and finish(B)
proptest! {
    #[test]
    fn prop_merge_law(
        kind in any_kind(),
        a in prop::collection::vec(any::<u8>(), 1..512),
        b in prop::collection::vec(any::<u8>(), 1..512),
    ) {
        let mut factory = factory();
        let session = keyed(5);
        let mut pa = factory.acquire(kind, Some(session.clone()), &a);
        let mut pb = factory.acquire(kind, Some(session.clone()), &b);
        pa.finish().unwrap();
        pb.finish().unwrap();

        let mut expected = pa.data().to_vec();
        expected.extend_from_slice(pb.data());

        let merged = factory.merge(pa, pb).unwrap();
        prop_assert!(merged.is_finished());
        prop_assert_eq!(merged.data(), expected.as_slice());
    }
}

// Property: a recycled packet exposes only its new content and fresh flags
proptest! {
    #[test]
    fn prop_pool_reuse_is_clean(
        first in prop::collection::vec(any::<u8>(), 0..1024),
        second in prop::collection::vec(any::<u8>(), 0..1024),
    ) {
        let mut factory = factory();
        let mut p = factory.acquire(PacketType::ServerGame, Some(keyed(0)), &first);
        p.finish().unwrap();
        factory.retire(p);

        let q = factory.acquire(PacketType::ClientLogin, None, &second);
        prop_assert!(!q.is_committed());
        prop_assert!(!q.is_finished());
        prop_assert_eq!(q.len(), second.len());
        prop_assert_eq!(q.data(), second.as_slice());
    }
}

// Property: arbitrary received bytes never panic the decrypters
proptest! {
    #[test]
    fn prop_decrypt_garbage_never_panics(
        kind in any_kind(),
        data in prop::collection::vec(any::<u8>(), 0..1024),
    ) {
        let mut factory = factory();
        let _ = factory.receive(kind, Some(keyed(0)), &data);
    }
}
