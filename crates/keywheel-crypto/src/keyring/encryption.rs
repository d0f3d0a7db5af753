//! Envelope encryption using AES-256-CBC with HMAC-SHA256 (encrypt-then-MAC)
//!
//! # Security
//!
//! - Fresh random nonce per envelope from the ring's [`RandomSource`]
//! - The mac covers nonce and ciphertext and is checked in constant time
//!   BEFORE the cipher runs, so unauthenticated ciphertext never reaches the
//!   padding check
//! - Every failure (short input, bad mac, bad padding) collapses into the same
//!   `None`; nothing distinguishes them to the caller

use aes::Aes256;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::{
    Keyring,
    derivation::DerivedKeySet,
    envelope::{self, Envelope, NONCE_SIZE},
    signing::hmac_sha256,
};
use crate::{error::KeyringError, random::RandomSource};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Plaintext recovered from an envelope, with the ring position that opened
/// it.
///
/// The plaintext is zeroized on drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decrypted {
    plaintext: Zeroizing<Vec<u8>>,
    index: usize,
}

impl Decrypted {
    /// The recovered plaintext.
    pub fn plaintext(&self) -> &[u8] {
        &self.plaintext
    }

    /// Ring position of the key that opened the envelope.
    ///
    /// Non-zero means the envelope should be re-encrypted under the current
    /// key.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Take the plaintext.
    pub fn into_plaintext(self) -> Zeroizing<Vec<u8>> {
        self.plaintext
    }
}

impl<R: RandomSource> Keyring<R> {
    /// Encrypt under the current key.
    ///
    /// Returns `mac ‖ nonce ‖ ciphertext`. Two calls with the same plaintext
    /// produce different envelopes.
    pub fn encrypt(&self, plaintext: &[u8]) -> Vec<u8> {
        self.seal(&self.current_slot().keys, plaintext)
    }

    /// Encrypt under the key at `index`.
    ///
    /// # Errors
    ///
    /// - `IndexOutOfRange`: `index >= len()`
    pub fn encrypt_with(&self, plaintext: &[u8], index: usize) -> Result<Vec<u8>, KeyringError> {
        Ok(self.seal(&self.slot(index)?.keys, plaintext))
    }

    /// Decrypt with whichever key in the ring opens the envelope.
    ///
    /// Keys are tried in ring order and the first success wins. Returns
    /// `None` if the input is malformed or no key authenticates it.
    pub fn decrypt(&self, bytes: &[u8]) -> Option<Decrypted> {
        let Some(envelope) = Envelope::parse(bytes) else {
            tracing::trace!(len = bytes.len(), "envelope too short");
            return None;
        };

        for (index, slot) in self.slots.iter().enumerate() {
            if let Some(plaintext) = open(&slot.keys, envelope) {
                tracing::trace!(index, "envelope opened");
                return Some(Decrypted { plaintext, index });
            }
        }

        tracing::trace!(keys = self.slots.len(), "no key opened envelope");
        None
    }

    /// Decrypt with the key at `index` only.
    ///
    /// `Ok(None)` means the envelope did not open under that key.
    ///
    /// # Errors
    ///
    /// - `IndexOutOfRange`: `index >= len()`
    pub fn decrypt_with(
        &self,
        bytes: &[u8],
        index: usize,
    ) -> Result<Option<Zeroizing<Vec<u8>>>, KeyringError> {
        let slot = self.slot(index)?;
        Ok(Envelope::parse(bytes).and_then(|envelope| open(&slot.keys, envelope)))
    }

    fn seal(&self, keys: &DerivedKeySet, plaintext: &[u8]) -> Vec<u8> {
        let mut nonce = [0u8; NONCE_SIZE];
        self.random.fill(&mut nonce);

        let ciphertext = Aes256CbcEnc::new(keys.encrypt_key().into(), (&nonce).into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext);
        let mac = hmac_sha256(keys.hmac_key(), &[nonce.as_slice(), ciphertext.as_slice()]);

        envelope::seal(&mac, &nonce, &ciphertext)
    }
}

/// Authenticate, then decrypt.
fn open(keys: &DerivedKeySet, envelope: Envelope<'_>) -> Option<Zeroizing<Vec<u8>>> {
    let expected = hmac_sha256(keys.hmac_key(), &[envelope.authenticated()]);
    if !bool::from(expected.as_slice().ct_eq(envelope.mac().as_slice())) {
        return None;
    }

    Aes256CbcDec::new(keys.encrypt_key().into(), envelope.nonce().into())
        .decrypt_padded_vec_mut::<Pkcs7>(envelope.ciphertext())
        .ok()
        .map(Zeroizing::new)
}
