//! Fuzz target for envelope parsing and decryption
//!
//! Feeds arbitrary bytes to `Envelope::parse` and `Keyring::decrypt` to find:
//! - Panics in length handling around the 64-byte minimum
//! - Cipher-layer errors escaping as panics instead of `None`
//! - Forged envelopes that open without the key
//!
//! The fuzzer should NEVER panic, and no input should ever decrypt.

#![no_main]

use std::sync::LazyLock;

use keywheel_crypto::{Envelope, KeyDerivation, Keyring, KeyringConfig, MIN_ENVELOPE_SIZE};
use libfuzzer_sys::fuzz_target;

static RING: LazyLock<Keyring> = LazyLock::new(|| {
    let config = KeyringConfig::default().with_derivation(KeyDerivation::Hkdf);
    match Keyring::with_config(["fuzz-current", "fuzz-previous"], config) {
        Ok(ring) => ring,
        Err(err) => unreachable!("static fuzz ring is valid: {err}"),
    }
});

fuzz_target!(|data: &[u8]| {
    // INVARIANT 1: parse accepts exactly the inputs at or above the minimum
    let parsed = Envelope::parse(data);
    assert_eq!(parsed.is_some(), data.len() >= MIN_ENVELOPE_SIZE);

    // INVARIANT 2: parse is lossless
    if let Some(envelope) = parsed {
        assert_eq!(envelope.to_bytes(), data);
    }

    // INVARIANT 3: unauthenticated bytes never decrypt under any key
    assert!(RING.decrypt(data).is_none());
    for index in 0..RING.len() {
        assert_eq!(RING.decrypt_with(data, index), Ok(None));
    }
});
