//! Message signing and rotation-aware verification
//!
//! # Security
//!
//! - Candidate digests are compared in constant time against every key
//! - Ring order is significant: index 0 is tried first, so the first match
//!   reports the newest key that produced the digest
//! - Digests are raw bytes; text encodings are layered on by the caller

use hmac::{Hmac, Mac, digest::KeyInit};
use sha1::Sha1;
use sha2::{Sha256, Sha512};
use subtle::ConstantTimeEq;

use super::{KeySlot, Keyring};
use crate::{config::HashAlgorithm, error::KeyringError, random::RandomSource};

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;
type HmacSha512 = Hmac<Sha512>;

/// Outcome of checking a digest against the ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// Produced by the current key
    Current,
    /// Produced by an older key still in the ring; time to re-sign
    Stale {
        /// Ring position of the matching key
        index: usize,
    },
    /// Not produced by any key in the ring
    Invalid,
}

impl Verification {
    /// Whether any key in the ring produced the digest.
    pub fn is_valid(self) -> bool {
        !matches!(self, Self::Invalid)
    }
}

impl<R: RandomSource> Keyring<R> {
    /// Sign a message with the current key.
    ///
    /// Deterministic: the same message and ring always give the same digest.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.digest(self.current_slot(), message)
    }

    /// Sign a message with the key at `index`.
    ///
    /// # Errors
    ///
    /// - `IndexOutOfRange`: `index >= len()`
    pub fn sign_with(&self, message: &[u8], index: usize) -> Result<Vec<u8>, KeyringError> {
        Ok(self.digest(self.slot(index)?, message))
    }

    /// Ring position of the first key whose digest of `message` equals
    /// `candidate`, or `None` if no key matches.
    pub fn index_of(&self, message: &[u8], candidate: &[u8]) -> Option<usize> {
        let index = self.slots.iter().position(|slot| {
            let expected = self.digest(slot, message);
            bool::from(expected.as_slice().ct_eq(candidate))
        });

        match index {
            Some(index) => tracing::trace!(index, "digest matched"),
            None => tracing::trace!(keys = self.slots.len(), "digest matched no key"),
        }

        index
    }

    /// Whether any key in the ring produced `candidate` for `message`.
    pub fn verify(&self, message: &[u8], candidate: &[u8]) -> bool {
        self.index_of(message, candidate).is_some()
    }

    /// Classify `candidate` as current, stale or invalid.
    pub fn check(&self, message: &[u8], candidate: &[u8]) -> Verification {
        match self.index_of(message, candidate) {
            Some(0) => Verification::Current,
            Some(index) => Verification::Stale { index },
            None => Verification::Invalid,
        }
    }

    /// Re-sign a verified message with the current key.
    ///
    /// Returns `None` when `candidate` does not verify under any key.
    pub fn resign(&self, message: &[u8], candidate: &[u8]) -> Option<Vec<u8>> {
        self.verify(message, candidate).then(|| self.sign(message))
    }

    fn digest(&self, slot: &KeySlot, message: &[u8]) -> Vec<u8> {
        let key = slot.signing_key();
        match self.config.hash {
            HashAlgorithm::Sha1 => keyed_digest::<HmacSha1>(key, message),
            HashAlgorithm::Sha256 => keyed_digest::<HmacSha256>(key, message),
            HashAlgorithm::Sha512 => keyed_digest::<HmacSha512>(key, message),
        }
    }
}

fn keyed_digest<M: Mac + KeyInit>(key: &[u8], message: &[u8]) -> Vec<u8> {
    let Ok(mut mac) = <M as KeyInit>::new_from_slice(key) else {
        unreachable!("HMAC accepts any key size");
    };
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

/// HMAC-SHA256 over the concatenation of `parts`.
pub(crate) fn hmac_sha256(key: &[u8], parts: &[&[u8]]) -> [u8; 32] {
    let Ok(mut mac) = <HmacSha256 as KeyInit>::new_from_slice(key) else {
        unreachable!("HMAC-SHA256 accepts any key size");
    };
    for part in parts {
        mac.update(part);
    }
    let result = mac.finalize().into_bytes();

    let mut tag = [0u8; 32];
    tag.copy_from_slice(&result);
    tag
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{KeyDerivation, KeyringConfig};

    const MESSAGE: &[u8] = b"Keyboard Cat has a hat.";

    fn ring(keys: &[&str]) -> Keyring {
        Keyring::with_config(
            keys.iter().copied(),
            KeyringConfig::default().with_derivation(KeyDerivation::Hkdf),
        )
        .unwrap()
    }

    #[test]
    fn sign_produces_32_byte_digest() {
        let keys = ring(&["SEKRIT1"]);
        assert_eq!(keys.sign(MESSAGE).len(), 32);
    }

    #[test]
    fn sign_is_deterministic() {
        let keys = ring(&["SEKRIT1"]);
        assert_eq!(keys.sign(MESSAGE), keys.sign(MESSAGE));
    }

    #[test]
    fn sign_uses_current_key() {
        let keys = ring(&["SEKRIT2", "SEKRIT1"]);
        assert_eq!(keys.sign(MESSAGE), keys.sign_with(MESSAGE, 0).unwrap());
        assert_ne!(keys.sign(MESSAGE), keys.sign_with(MESSAGE, 1).unwrap());
    }

    #[test]
    fn sign_is_keyed_with_derived_sign_key() {
        let keys = ring(&["SEKRIT1"]);
        let expected = keyed_digest::<HmacSha256>(keys.current().sign_key(), MESSAGE);
        assert_eq!(keys.sign(MESSAGE), expected);
    }

    #[test]
    fn sign_with_out_of_range() {
        let keys = ring(&["SEKRIT1"]);
        assert!(matches!(
            keys.sign_with(MESSAGE, 2),
            Err(KeyringError::IndexOutOfRange { index: 2, len: 1 })
        ));
    }

    #[test]
    fn index_of_reports_signing_key() {
        let keys = ring(&["SEKRIT3", "SEKRIT2", "SEKRIT1"]);

        for index in 0..keys.len() {
            let digest = keys.sign_with(MESSAGE, index).unwrap();
            assert_eq!(keys.index_of(MESSAGE, &digest), Some(index));
        }
    }

    #[test]
    fn index_of_rejects_garbage() {
        let keys = ring(&["SEKRIT2", "SEKRIT1"]);

        assert_eq!(keys.index_of(MESSAGE, b"o_O"), None);
        assert_eq!(keys.index_of(MESSAGE, &[0u8; 32]), None);
        assert_eq!(keys.index_of(MESSAGE, &[]), None);
    }

    #[test]
    fn index_of_rejects_other_message() {
        let keys = ring(&["SEKRIT1"]);
        let digest = keys.sign(MESSAGE);

        assert_eq!(keys.index_of(b"Keyboard Cat has a bat.", &digest), None);
    }

    #[test]
    fn truncated_digest_does_not_verify() {
        let keys = ring(&["SEKRIT1"]);
        let digest = keys.sign(MESSAGE);

        assert!(!keys.verify(MESSAGE, &digest[..31]));
    }

    #[test]
    fn duplicate_keys_report_first_position() {
        let keys = ring(&["SEKRIT1", "SEKRIT1"]);
        let digest = keys.sign_with(MESSAGE, 1).unwrap();

        assert_eq!(keys.index_of(MESSAGE, &digest), Some(0));
    }

    #[test]
    fn check_classifies_digests() {
        let keys = ring(&["SEKRIT2", "SEKRIT1"]);

        let current = keys.sign_with(MESSAGE, 0).unwrap();
        let stale = keys.sign_with(MESSAGE, 1).unwrap();

        assert_eq!(keys.check(MESSAGE, &current), Verification::Current);
        assert_eq!(keys.check(MESSAGE, &stale), Verification::Stale { index: 1 });
        assert_eq!(keys.check(MESSAGE, b"bogus"), Verification::Invalid);
        assert!(keys.check(MESSAGE, &stale).is_valid());
        assert!(!Verification::Invalid.is_valid());
    }

    #[test]
    fn resign_upgrades_stale_digest() {
        let keys = ring(&["SEKRIT2", "SEKRIT1"]);
        let stale = keys.sign_with(MESSAGE, 1).unwrap();

        let fresh = keys.resign(MESSAGE, &stale).unwrap();
        assert_eq!(keys.index_of(MESSAGE, &fresh), Some(0));
        assert_eq!(keys.resign(MESSAGE, b"bogus"), None);
    }

    #[test]
    fn hash_selection_changes_digest_length() {
        for (hash, len) in
            [(HashAlgorithm::Sha1, 20), (HashAlgorithm::Sha256, 32), (HashAlgorithm::Sha512, 64)]
        {
            let keys =
                Keyring::with_config(["SEKRIT1"], KeyringConfig::default().with_hash(hash)).unwrap();
            let digest = keys.sign(MESSAGE);

            assert_eq!(digest.len(), len);
            assert_eq!(digest.len(), hash.digest_len());
            assert!(keys.verify(MESSAGE, &digest));
        }
    }

    #[test]
    fn hmac_sha256_parts_match_concatenation() {
        let whole = hmac_sha256(b"key", &[b"nonce-and-ciphertext".as_slice()]);
        let split = hmac_sha256(b"key", &[b"nonce-".as_slice(), b"and-", b"ciphertext"]);
        assert_eq!(whole, split);
    }
}
