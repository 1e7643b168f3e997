#![no_main]

use game_envelope::config::CryptoConfig;
use game_envelope::prelude::*;
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

fuzz_target!(|data: &[u8]| {
    // Parse arbitrary received bytes with every decrypter - test for panics and oversized allocations
    let mut factory = PacketFactory::new(CryptoTable::standard(&CryptoConfig::default()));
    let session = Arc::new(Session::new(0).with_key(SessionKey::new([0u8; 32])));
    for kind in PacketType::ALL {
        let _ = factory.receive(kind, Some(session.clone()), data);
    }
});
