//! Error types for keyring operations

use thiserror::Error;

/// Errors from keyring construction and key selection.
///
/// Failed verification and failed decryption are not errors: they are
/// reported as `None` so callers probing several keys during rotation never
/// pay for (or leak through) distinguishable error paths.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyringError {
    /// Construction input or configuration was rejected
    #[error("invalid input: {reason}")]
    InvalidInput {
        /// Why the input was rejected
        reason: String,
    },

    /// Requested key index is beyond the end of the ring
    #[error("key index {index} out of range for ring of {len} keys")]
    IndexOutOfRange {
        /// The requested index
        index: usize,
        /// Number of keys in the ring
        len: usize,
    },
}

impl KeyringError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInput { reason: reason.into() }
    }

    /// Returns true if this error is fatal (unrecoverable)
    ///
    /// Construction errors abort the caller's startup path. An out-of-range
    /// index is a caller bug but leaves the ring usable.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::InvalidInput { .. } => true,
            Self::IndexOutOfRange { .. } => false,
        }
    }
}
