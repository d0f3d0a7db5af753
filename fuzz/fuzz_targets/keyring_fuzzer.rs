//! Fuzz target for keyring signing and envelope round-trips
//!
//! # Strategy
//!
//! - Arbitrary root keys (empty, small, large) and ring sizes
//! - Arbitrary hash and derivation choices
//! - Sign/encrypt under any index, then corrupt the output
//!
//! # Invariants
//!
//! - Construction fails exactly when the key list is empty
//! - A digest is found at the first index whose key produces it
//! - Envelopes round-trip and report the index that sealed them
//! - Any corrupted byte makes the envelope fail to open

#![no_main]

use arbitrary::Arbitrary;
use keywheel_crypto::{HashAlgorithm, KeyDerivation, Keyring, KeyringConfig, KeyringError};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
struct KeyringScenario {
    /// Root keys in ring order
    root_keys: Vec<Vec<u8>>,
    /// Signing hash choice
    hash: u8,
    /// Use HKDF instead of PBKDF2
    hkdf: bool,
    /// Operations to perform
    operations: Vec<KeyringOperation>,
}

#[derive(Debug, Clone, Arbitrary)]
enum KeyringOperation {
    /// Sign with a key and look the digest up again
    Sign { message: Vec<u8>, index: u8 },
    /// Encrypt with a key, decrypt, then corrupt one byte
    Seal { message: Vec<u8>, index: u8, corrupt_at: u16 },
}

fuzz_target!(|scenario: KeyringScenario| {
    if scenario.root_keys.len() > 8 {
        return;
    }

    let hash = match scenario.hash % 3 {
        0 => HashAlgorithm::Sha1,
        1 => HashAlgorithm::Sha256,
        _ => HashAlgorithm::Sha512,
    };
    let derivation = if scenario.hkdf {
        KeyDerivation::Hkdf
    } else {
        KeyDerivation::Pbkdf2 { iterations: 1 }
    };
    let config = KeyringConfig::default().with_hash(hash).with_derivation(derivation);

    // INVARIANT 1: empty key lists are rejected, everything else builds
    let ring = match Keyring::with_config(&scenario.root_keys, config) {
        Ok(ring) => ring,
        Err(KeyringError::InvalidInput { .. }) => {
            assert!(scenario.root_keys.is_empty());
            return;
        },
        Err(err) => unreachable!("unexpected construction error: {err}"),
    };

    for op in scenario.operations {
        match op {
            KeyringOperation::Sign { message, index } => {
                let index = usize::from(index);
                let Ok(digest) = ring.sign_with(&message, index) else {
                    // INVARIANT 2: out-of-range indices are errors, not panics
                    assert!(index >= ring.len());
                    continue;
                };
                assert_eq!(digest.len(), hash.digest_len());

                // INVARIANT 3: lookup reports the first key producing the digest.
                // Distinct roots can derive equal sub-keys (HMAC hashes long
                // keys), so compare derived sign keys rather than roots.
                let Ok(signer) = ring.get(index) else {
                    unreachable!("sign_with accepted index {index}");
                };
                let first = (0..ring.len()).position(|i| {
                    ring.get(i).is_ok_and(|keys| keys.sign_key() == signer.sign_key())
                });
                assert_eq!(ring.index_of(&message, &digest), first);
            },

            KeyringOperation::Seal { message, index, corrupt_at } => {
                let index = usize::from(index);
                let Ok(envelope) = ring.encrypt_with(&message, index) else {
                    assert!(index >= ring.len());
                    continue;
                };

                // INVARIANT 4: round-trip at the sealing key
                let opened = ring.decrypt_with(&envelope, index);
                assert_eq!(opened.ok().flatten().as_deref().map(Vec::as_slice), Some(&message[..]));

                // INVARIANT 5: corruption never opens
                let mut corrupted = envelope.clone();
                let position = usize::from(corrupt_at) % corrupted.len();
                corrupted[position] ^= 0xFF;
                assert!(ring.decrypt(&corrupted).is_none());
            },
        }
    }
});
