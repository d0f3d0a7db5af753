//! Sub-key derivation for keyring slots
//!
//! Each root key is expanded into one 96-byte output that is sliced into three
//! disjoint 32-byte sub-keys. Slicing a single output keeps the sub-keys
//! independent: none can be computed from another without re-running the
//! derivation from the root key.

use std::fmt;

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::config::KeyDerivation;

/// Application salt for sub-key derivation
const KEYRING_SALT: &[u8] = b"keywheelKeyringV1";

/// HKDF info label naming the three usages in output order
const SUBKEY_INFO: &[u8] = b"keywheel sign|encrypt|hmac";

/// Size of each derived sub-key (32 bytes)
pub const SUBKEY_SIZE: usize = 32;

const DERIVED_LEN: usize = 3 * SUBKEY_SIZE;

/// The three sub-keys derived from one root key.
///
/// Key material is zeroized on drop and never appears in `Debug` output.
pub struct DerivedKeySet {
    sign_key: [u8; SUBKEY_SIZE],
    encrypt_key: [u8; SUBKEY_SIZE],
    hmac_key: [u8; SUBKEY_SIZE],
}

impl DerivedKeySet {
    /// Key for message signing HMACs.
    pub fn sign_key(&self) -> &[u8; SUBKEY_SIZE] {
        &self.sign_key
    }

    /// Key for envelope encryption.
    pub fn encrypt_key(&self) -> &[u8; SUBKEY_SIZE] {
        &self.encrypt_key
    }

    /// Key for envelope authentication.
    pub fn hmac_key(&self) -> &[u8; SUBKEY_SIZE] {
        &self.hmac_key
    }

    fn from_output(output: &[u8; DERIVED_LEN]) -> Self {
        let mut keys = Self {
            sign_key: [0u8; SUBKEY_SIZE],
            encrypt_key: [0u8; SUBKEY_SIZE],
            hmac_key: [0u8; SUBKEY_SIZE],
        };

        keys.sign_key.copy_from_slice(&output[..SUBKEY_SIZE]);
        keys.encrypt_key.copy_from_slice(&output[SUBKEY_SIZE..2 * SUBKEY_SIZE]);
        keys.hmac_key.copy_from_slice(&output[2 * SUBKEY_SIZE..]);
        keys
    }
}

impl fmt::Debug for DerivedKeySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKeySet").finish_non_exhaustive()
    }
}

impl Drop for DerivedKeySet {
    fn drop(&mut self) {
        self.sign_key.zeroize();
        self.encrypt_key.zeroize();
        self.hmac_key.zeroize();
    }
}

/// Derive the sub-key set for one root key.
///
/// Deterministic: the same root key and derivation always produce the same
/// set. Callers validate the derivation first (PBKDF2 needs a non-zero
/// iteration count).
pub fn derive_key_set(root_key: &[u8], derivation: KeyDerivation) -> DerivedKeySet {
    let mut output = [0u8; DERIVED_LEN];

    match derivation {
        KeyDerivation::Pbkdf2 { iterations } => {
            pbkdf2::pbkdf2_hmac::<Sha256>(root_key, KEYRING_SALT, iterations, &mut output);
        },
        KeyDerivation::Hkdf => {
            let hkdf = Hkdf::<Sha256>::new(Some(KEYRING_SALT), root_key);
            let Ok(()) = hkdf.expand(SUBKEY_INFO, &mut output) else {
                unreachable!("96 bytes is a valid HKDF-SHA256 output length");
            };
        },
    }

    let keys = DerivedKeySet::from_output(&output);
    output.zeroize();
    keys
}
