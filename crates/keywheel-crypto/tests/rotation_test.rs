//! Key rotation scenarios
//!
//! A service rotates by rebuilding its ring: new key in front, still-accepted
//! keys behind, retired keys dropped. These tests walk that lifecycle end to
//! end for both digests and envelopes, and share one ring across threads.

use std::{sync::Arc, thread};

use keywheel_crypto::{Keyring, KeyringError, Verification};

const MESSAGE: &[u8] = b"bieberschnitzel";

#[test]
fn digest_survives_one_rotation_and_expires_after_two() {
    let v1 = Keyring::new(["SEKRIT3", "SEKRIT2", "SEKRIT1"]).unwrap();
    let digest = v1.sign(MESSAGE);
    assert_eq!(v1.index_of(MESSAGE, &digest), Some(0));

    // Rotate a new key in and an old key out
    let v2 = Keyring::new(["SEKRIT4", "SEKRIT3", "SEKRIT2"]).unwrap();
    assert_eq!(v2.index_of(MESSAGE, &digest), Some(1), "index > 0 means re-sign");

    let resigned = v2.resign(MESSAGE, &digest).unwrap();
    assert_eq!(v2.check(MESSAGE, &resigned), Verification::Current);

    // SEKRIT3 retired: the original digest no longer verifies, the re-signed
    // one still does
    let v3 = Keyring::new(["SEKRIT5", "SEKRIT4"]).unwrap();
    assert_eq!(v3.check(MESSAGE, &digest), Verification::Invalid);
    assert_eq!(v3.check(MESSAGE, &resigned), Verification::Stale { index: 1 });
}

#[test]
fn retained_key_found_at_new_position() {
    let before = Keyring::new(["k0", "k1"]).unwrap();
    let digest = before.sign_with(MESSAGE, 1).unwrap();

    let after = Keyring::new(["k2", "k1"]).unwrap();

    assert_eq!(after.index_of(MESSAGE, &digest), Some(1));
}

#[test]
fn envelope_reencrypted_after_rotation() {
    let v1 = Keyring::new(["SEKRIT1"]).unwrap();
    let envelope = v1.encrypt(b"session state");

    let v2 = Keyring::new(["SEKRIT2", "SEKRIT1"]).unwrap();
    let opened = v2.decrypt(&envelope).unwrap();
    assert_eq!(opened.index(), 1);

    let refreshed = v2.encrypt(opened.plaintext());
    assert_eq!(v2.decrypt(&refreshed).unwrap().index(), 0);

    // Only the refreshed envelope outlives SEKRIT1
    let v3 = Keyring::new(["SEKRIT3", "SEKRIT2"]).unwrap();
    assert!(v3.decrypt(&envelope).is_none());
    assert_eq!(v3.decrypt(&refreshed).unwrap().plaintext(), b"session state");
}

#[test]
fn explicit_index_does_not_fall_back() {
    let keys = Keyring::new(["SEKRIT2", "SEKRIT1"]).unwrap();
    let envelope = keys.encrypt_with(b"payload", 1).unwrap();

    assert_eq!(keys.decrypt_with(&envelope, 0).unwrap(), None);
    assert!(matches!(
        keys.decrypt_with(&envelope, 2),
        Err(KeyringError::IndexOutOfRange { index: 2, len: 2 })
    ));
}

#[test]
fn shared_ring_across_threads() {
    let keys = Arc::new(Keyring::new(["SEKRIT2", "SEKRIT1"]).unwrap());

    let handles: Vec<_> = (0..8u8)
        .map(|worker| {
            let keys = Arc::clone(&keys);
            thread::spawn(move || {
                let message = [worker; 24];
                let digest = keys.sign_with(&message, usize::from(worker % 2)).unwrap();
                let envelope = keys.encrypt(&message);

                (
                    keys.index_of(&message, &digest),
                    keys.decrypt(&envelope).map(|opened| opened.plaintext().to_vec()),
                )
            })
        })
        .collect();

    for (worker, handle) in handles.into_iter().enumerate() {
        let (index, plaintext) = handle.join().unwrap();
        assert_eq!(index, Some(worker % 2));
        assert_eq!(plaintext, Some(vec![worker as u8; 24]));
    }
}
