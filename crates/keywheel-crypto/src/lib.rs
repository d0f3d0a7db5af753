//! Keywheel Key-Rotation Signing and Encryption
//!
//! Signs, verifies, encrypts and decrypts with an ordered list of secret keys
//! so keys can be rotated without invalidating what older keys produced. The
//! first key is current; later keys are retained for verification and
//! decryption only.
//!
//! # Key Lifecycle
//!
//! ```text
//! Root Key (caller supplied, ring position i)
//!        │
//!        ▼
//! PBKDF2 / HKDF → sign key ‖ encrypt key ‖ hmac key
//!        │
//!        ├──▶ HMAC → digest           (verify: try every key, report index)
//!        │
//!        └──▶ AES-256-CBC + HMAC-SHA256 → mac ‖ nonce ‖ ciphertext
//! ```
//!
//! Rotating means building a new [`Keyring`] with the new key in front. A
//! digest or envelope that only an older key accepts reports that key's
//! index, telling the caller to re-sign or re-encrypt.
//!
//! # Security
//!
//! Key Separation:
//! - Each root key yields three disjoint sub-keys from one KDF output
//! - Encryption and authentication never share a key
//!
//! Timing:
//! - Digest and mac comparisons are constant-time
//! - Envelope macs are checked before the cipher sees the ciphertext
//!
//! Failure Reporting:
//! - Failed verification and failed decryption return `None`, never an error
//! - Padding and alignment failures are indistinguishable from bad macs
//!
//! # Example
//!
//! ```
//! use keywheel_crypto::{Keyring, Verification};
//!
//! # fn main() -> Result<(), keywheel_crypto::KeyringError> {
//! let old = Keyring::new(["SEKRIT1"])?;
//! let digest = old.sign(b"session=42");
//! let envelope = old.encrypt(b"cookie payload");
//!
//! let rotated = Keyring::new(["SEKRIT2", "SEKRIT1"])?;
//! assert_eq!(rotated.check(b"session=42", &digest), Verification::Stale { index: 1 });
//!
//! let opened = rotated.decrypt(&envelope).expect("retained key opens envelope");
//! assert_eq!(opened.plaintext(), b"cookie payload");
//! assert_eq!(opened.index(), 1);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod keyring;
pub mod random;

pub use config::{
    AlgorithmRegistry, BuiltinRegistry, CipherAlgorithm, DEFAULT_PBKDF2_ITERATIONS,
    HashAlgorithm, KeyDerivation, KeyringConfig, SigningKeySource,
};
pub use error::KeyringError;
pub use keyring::{
    BLOCK_SIZE, Decrypted, DerivedKeySet, Envelope, Keyring, MAC_SIZE, MIN_ENVELOPE_SIZE,
    NONCE_SIZE, SUBKEY_SIZE, Verification, derive_key_set,
};
pub use random::{OsRandom, RandomSource};
