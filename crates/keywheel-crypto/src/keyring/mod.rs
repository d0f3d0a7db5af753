//! Keyring: ordered root keys with derived per-usage sub-keys
//!
//! # Architecture
//!
//! ```text
//! root keys [k0, k1, ..., kn]        (k0 = current, higher = older)
//!        │
//!        ▼ PBKDF2 / HKDF (fixed salt, 96 bytes)
//! DerivedKeySet[i] = sign ‖ encrypt ‖ hmac
//!        │
//!        ├──▶ HMAC(sign)                 → digest
//!        └──▶ AES-256-CBC(encrypt, nonce) → ciphertext
//!             HMAC-SHA256(hmac, nonce ‖ ciphertext) → mac
//! ```
//!
//! # Rotation
//!
//! A ring never changes after construction. To rotate, build a new ring with
//! the new key first and the keys still accepted behind it. Digests and
//! envelopes produced under a retained key keep verifying at that key's new
//! position; a non-zero index tells the caller to re-sign or re-encrypt.

pub mod derivation;
pub mod encryption;
pub mod envelope;
pub mod signing;

use std::fmt;

use zeroize::Zeroizing;

pub use self::{
    derivation::{DerivedKeySet, SUBKEY_SIZE, derive_key_set},
    encryption::Decrypted,
    envelope::{BLOCK_SIZE, Envelope, MAC_SIZE, MIN_ENVELOPE_SIZE, NONCE_SIZE},
    signing::Verification,
};
use crate::{
    config::{AlgorithmRegistry, BuiltinRegistry, KeyringConfig, SigningKeySource},
    error::KeyringError,
    random::{OsRandom, RandomSource},
};

/// Signing key material of one slot.
enum SigningMaterial {
    Derived,
    Root(Zeroizing<Vec<u8>>),
}

/// One ring position.
struct KeySlot {
    keys: DerivedKeySet,
    signing: SigningMaterial,
}

impl KeySlot {
    fn signing_key(&self) -> &[u8] {
        match &self.signing {
            SigningMaterial::Derived => self.keys.sign_key().as_slice(),
            SigningMaterial::Root(root) => root.as_slice(),
        }
    }
}

/// Ordered set of keys for signing and authenticated encryption.
///
/// Index 0 is the current key; every operation that produces output uses it
/// unless told otherwise. Immutable after construction and safe to share
/// across threads.
pub struct Keyring<R: RandomSource = OsRandom> {
    slots: Vec<KeySlot>,
    config: KeyringConfig,
    random: R,
}

impl Keyring {
    /// Build a ring with the default configuration.
    ///
    /// # Errors
    ///
    /// - `InvalidInput`: no root keys were provided
    pub fn new<I, K>(root_keys: I) -> Result<Self, KeyringError>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        Self::with_config(root_keys, KeyringConfig::default())
    }

    /// Build a ring with an explicit configuration.
    ///
    /// # Errors
    ///
    /// - `InvalidInput`: no root keys, or the configuration is invalid
    pub fn with_config<I, K>(root_keys: I, config: KeyringConfig) -> Result<Self, KeyringError>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        Keyring::with_random(root_keys, config, OsRandom)
    }
}

impl<R: RandomSource> Keyring<R> {
    /// Build a ring drawing nonces from the given random source.
    ///
    /// # Errors
    ///
    /// - `InvalidInput`: no root keys, or the configuration is invalid
    pub fn with_random<I, K>(
        root_keys: I,
        config: KeyringConfig,
        random: R,
    ) -> Result<Self, KeyringError>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        Self::with_registry(root_keys, config, random, &BuiltinRegistry)
    }

    /// Build a ring whose configuration must also pass the application's
    /// algorithm registry.
    ///
    /// # Errors
    ///
    /// - `InvalidInput`: no root keys, or `registry` withholds a configured
    ///   algorithm, or the configuration is otherwise invalid
    pub fn with_registry<I, K>(
        root_keys: I,
        config: KeyringConfig,
        random: R,
        registry: &impl AlgorithmRegistry,
    ) -> Result<Self, KeyringError>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        config.validate(registry)?;
        config.validate(&BuiltinRegistry)?;

        let slots: Vec<KeySlot> = root_keys
            .into_iter()
            .map(|root| {
                let root = root.as_ref();
                let signing = match config.signing_key {
                    SigningKeySource::Derived => SigningMaterial::Derived,
                    SigningKeySource::Root => SigningMaterial::Root(Zeroizing::new(root.to_vec())),
                };
                KeySlot { keys: derive_key_set(root, config.derivation), signing }
            })
            .collect();

        if slots.is_empty() {
            return Err(KeyringError::invalid("keys must be provided"));
        }

        tracing::debug!(
            keys = slots.len(),
            hash = %config.hash,
            cipher = %config.cipher,
            "keyring constructed"
        );

        Ok(Self { slots, config, random })
    }

    /// Number of keys in the ring (always at least one).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always false: construction rejects an empty key list.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Configuration the ring was built with.
    pub fn config(&self) -> &KeyringConfig {
        &self.config
    }

    /// Derived keys at `index`.
    ///
    /// # Errors
    ///
    /// - `IndexOutOfRange`: `index >= len()`
    pub fn get(&self, index: usize) -> Result<&DerivedKeySet, KeyringError> {
        self.slot(index).map(|slot| &slot.keys)
    }

    /// Derived keys of the current key (index 0).
    pub fn current(&self) -> &DerivedKeySet {
        &self.current_slot().keys
    }

    fn slot(&self, index: usize) -> Result<&KeySlot, KeyringError> {
        self.slots.get(index).ok_or(KeyringError::IndexOutOfRange { index, len: self.slots.len() })
    }

    fn current_slot(&self) -> &KeySlot {
        let Some(slot) = self.slots.first() else {
            unreachable!("construction rejects an empty key list");
        };
        slot
    }
}

impl<R: RandomSource> fmt::Debug for Keyring<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keyring")
            .field("len", &self.slots.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
