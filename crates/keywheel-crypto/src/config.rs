//! Keyring configuration and algorithm selection
//!
//! Algorithm choice is fixed at construction. Textual names coming from an
//! application's own configuration are resolved through an
//! [`AlgorithmRegistry`] so that an unsupported name is rejected before a
//! ring exists, never at first use.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::KeyringError;

/// Iteration count used by the default PBKDF2 derivation.
///
/// Root keys are expected to carry full entropy already; derivation only
/// separates the three sub-key usages.
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 1000;

/// Hash function used for message signing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// HMAC-SHA1 (20-byte digests), for digests issued by older deployments
    Sha1,
    /// HMAC-SHA256 (32-byte digests)
    #[default]
    Sha256,
    /// HMAC-SHA512 (64-byte digests)
    Sha512,
}

impl HashAlgorithm {
    /// Registry name of this algorithm.
    pub fn name(self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }

    /// Length in bytes of a digest produced with this algorithm.
    pub fn digest_len(self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha256 => 32,
            Self::Sha512 => 64,
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = KeyringError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            "sha512" => Ok(Self::Sha512),
            other => Err(KeyringError::invalid(format!("unsupported hash algorithm: {other}"))),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Block cipher used for envelope encryption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CipherAlgorithm {
    /// AES-256 in CBC mode with PKCS#7 padding
    #[default]
    #[serde(rename = "aes-256-cbc")]
    Aes256Cbc,
}

impl CipherAlgorithm {
    /// Registry name of this cipher.
    pub fn name(self) -> &'static str {
        match self {
            Self::Aes256Cbc => "aes-256-cbc",
        }
    }
}

impl FromStr for CipherAlgorithm {
    type Err = KeyringError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "aes-256-cbc" => Ok(Self::Aes256Cbc),
            other => Err(KeyringError::invalid(format!("unsupported cipher: {other}"))),
        }
    }
}

impl fmt::Display for CipherAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How each root key is expanded into its three sub-keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum KeyDerivation {
    /// PBKDF2-HMAC-SHA256 with the fixed salt
    Pbkdf2 {
        /// Iteration count, must be non-zero
        iterations: u32,
    },
    /// HKDF-SHA256 with the fixed salt and info label
    Hkdf,
}

impl Default for KeyDerivation {
    fn default() -> Self {
        Self::Pbkdf2 { iterations: DEFAULT_PBKDF2_ITERATIONS }
    }
}

/// Which key material the signing HMAC is keyed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SigningKeySource {
    /// The derived 32-byte signing sub-key
    #[default]
    Derived,
    /// The raw root key, so digests issued before sub-key derivation was
    /// introduced keep verifying. Encryption still uses derived keys.
    Root,
}

/// Capability lookup for algorithm names.
///
/// Lets an embedding application restrict which algorithms may be
/// configured, for instance to a platform's approved list.
pub trait AlgorithmRegistry {
    /// Whether the named hash algorithm is available.
    fn supports_hash(&self, name: &str) -> bool;

    /// Whether the named cipher is available.
    fn supports_cipher(&self, name: &str) -> bool;
}

/// Registry of the algorithms this crate implements.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinRegistry;

impl AlgorithmRegistry for BuiltinRegistry {
    fn supports_hash(&self, name: &str) -> bool {
        HashAlgorithm::from_str(name).is_ok()
    }

    fn supports_cipher(&self, name: &str) -> bool {
        CipherAlgorithm::from_str(name).is_ok()
    }
}

/// Keyring configuration.
///
/// The default is HMAC-SHA256 signing with derived keys, AES-256-CBC
/// envelopes and PBKDF2 derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeyringConfig {
    /// Signing hash
    pub hash: HashAlgorithm,
    /// Envelope cipher
    pub cipher: CipherAlgorithm,
    /// Sub-key derivation
    pub derivation: KeyDerivation,
    /// Signing key material
    pub signing_key: SigningKeySource,
}

impl KeyringConfig {
    /// Resolve algorithm names through a registry.
    ///
    /// # Errors
    ///
    /// - `InvalidInput`: the registry does not list a name, or this crate
    ///   does not implement it
    pub fn from_names(
        hash: &str,
        cipher: &str,
        registry: &impl AlgorithmRegistry,
    ) -> Result<Self, KeyringError> {
        if !registry.supports_hash(hash) {
            return Err(KeyringError::invalid(format!("unsupported hash algorithm: {hash}")));
        }
        if !registry.supports_cipher(cipher) {
            return Err(KeyringError::invalid(format!("unsupported cipher: {cipher}")));
        }

        Ok(Self { hash: hash.parse()?, cipher: cipher.parse()?, ..Self::default() })
    }

    /// Use the given signing hash.
    #[must_use]
    pub fn with_hash(mut self, hash: HashAlgorithm) -> Self {
        self.hash = hash;
        self
    }

    /// Use the given sub-key derivation.
    #[must_use]
    pub fn with_derivation(mut self, derivation: KeyDerivation) -> Self {
        self.derivation = derivation;
        self
    }

    /// Use the given signing key material.
    #[must_use]
    pub fn with_signing_key(mut self, signing_key: SigningKeySource) -> Self {
        self.signing_key = signing_key;
        self
    }

    /// Check the configuration against a registry.
    ///
    /// Every keyring constructor checks against [`BuiltinRegistry`];
    /// `Keyring::with_registry` also checks an application registry, so a
    /// deserialized configuration naming an algorithm that registry
    /// withholds never produces a ring.
    pub fn validate(&self, registry: &impl AlgorithmRegistry) -> Result<(), KeyringError> {
        if !registry.supports_hash(self.hash.name()) {
            return Err(KeyringError::invalid(format!(
                "unsupported hash algorithm: {}",
                self.hash
            )));
        }
        if !registry.supports_cipher(self.cipher.name()) {
            return Err(KeyringError::invalid(format!("unsupported cipher: {}", self.cipher)));
        }
        if let KeyDerivation::Pbkdf2 { iterations: 0 } = self.derivation {
            return Err(KeyringError::invalid("pbkdf2 iteration count must be non-zero"));
        }

        Ok(())
    }
}
