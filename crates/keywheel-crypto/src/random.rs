//! Randomness abstraction for nonce generation.
//!
//! Decouples envelope encryption from the system RNG so tests can run with
//! fixed nonces while production draws from the OS generator.

/// Source of random bytes for encryption nonces.
///
/// # Safety
///
/// Implementations MUST use cryptographically secure entropy in production.
/// Reusing a nonce under the same key breaks envelope confidentiality.
pub trait RandomSource: Send + Sync {
    /// Fills the provided buffer with random bytes.
    fn fill(&self, buffer: &mut [u8]);
}

/// OS cryptographic RNG (getrandom).
///
/// # Panics
///
/// Panics if the OS RNG fails. A keyring without functioning randomness
/// would produce predictable nonces, and RNG failure indicates an OS-level
/// fault that cannot be recovered from here.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    #[allow(clippy::expect_used)]
    fn fill(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer)
            .expect("invariant: OS RNG failure is unrecoverable - nonces would be predictable");
    }
}
