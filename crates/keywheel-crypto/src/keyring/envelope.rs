//! Envelope wire format
//!
//! ```text
//! +----------+-----------+---------------------------+
//! | mac (32) | nonce (16)| ciphertext (16 * n, n>=1) |
//! +----------+-----------+---------------------------+
//!            |<------- authenticated by mac -------->|
//! ```

/// HMAC-SHA256 tag size (32 bytes)
pub const MAC_SIZE: usize = 32;

/// CBC initialization vector size (16 bytes)
pub const NONCE_SIZE: usize = 16;

/// AES block size (16 bytes)
pub const BLOCK_SIZE: usize = 16;

/// Shortest well-formed envelope: mac, nonce and one cipher block.
pub const MIN_ENVELOPE_SIZE: usize = MAC_SIZE + NONCE_SIZE + BLOCK_SIZE;

/// Borrowed view of an encrypted envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope<'a> {
    mac: &'a [u8; MAC_SIZE],
    nonce: &'a [u8; NONCE_SIZE],
    authenticated: &'a [u8],
}

impl<'a> Envelope<'a> {
    /// Split raw bytes into mac, nonce and ciphertext.
    ///
    /// Returns `None` for anything shorter than [`MIN_ENVELOPE_SIZE`]. No
    /// cryptographic check happens here.
    pub fn parse(bytes: &'a [u8]) -> Option<Self> {
        if bytes.len() < MIN_ENVELOPE_SIZE {
            return None;
        }

        let (mac, authenticated) = bytes.split_at(MAC_SIZE);
        let mac = <&[u8; MAC_SIZE]>::try_from(mac).ok()?;
        let nonce = <&[u8; NONCE_SIZE]>::try_from(&authenticated[..NONCE_SIZE]).ok()?;

        Some(Self { mac, nonce, authenticated })
    }

    /// The 32-byte authentication tag.
    pub fn mac(&self) -> &'a [u8; MAC_SIZE] {
        self.mac
    }

    /// The 16-byte nonce.
    pub fn nonce(&self) -> &'a [u8; NONCE_SIZE] {
        self.nonce
    }

    /// The ciphertext following the nonce.
    pub fn ciphertext(&self) -> &'a [u8] {
        &self.authenticated[NONCE_SIZE..]
    }

    /// The bytes covered by the mac: nonce followed by ciphertext.
    pub fn authenticated(&self) -> &'a [u8] {
        self.authenticated
    }

    /// Rebuild the wire form.
    pub fn to_bytes(self) -> Vec<u8> {
        seal(self.mac, self.nonce, self.ciphertext())
    }
}

/// Concatenate the envelope parts in wire order.
pub(crate) fn seal(mac: &[u8; MAC_SIZE], nonce: &[u8; NONCE_SIZE], ciphertext: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(MAC_SIZE + NONCE_SIZE + ciphertext.len());
    bytes.extend_from_slice(mac);
    bytes.extend_from_slice(nonce);
    bytes.extend_from_slice(ciphertext);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ciphertext_len: usize) -> Vec<u8> {
        let mut bytes = vec![0xAA; MAC_SIZE];
        bytes.extend_from_slice(&[0xBB; NONCE_SIZE]);
        bytes.extend(std::iter::repeat_n(0xCC, ciphertext_len));
        bytes
    }

    #[test]
    fn min_size_is_64() {
        assert_eq!(MIN_ENVELOPE_SIZE, 64);
    }

    #[test]
    fn parse_splits_regions() {
        let bytes = sample(32);
        let envelope = Envelope::parse(&bytes).unwrap();

        assert_eq!(envelope.mac(), &[0xAA; MAC_SIZE]);
        assert_eq!(envelope.nonce(), &[0xBB; NONCE_SIZE]);
        assert_eq!(envelope.ciphertext(), &[0xCC; 32][..]);
        assert_eq!(envelope.authenticated().len(), NONCE_SIZE + 32);
    }

    #[test]
    fn parse_rejects_short_input() {
        for len in [0, 1, MAC_SIZE, MAC_SIZE + NONCE_SIZE, MIN_ENVELOPE_SIZE - 1] {
            let bytes = vec![0u8; len];
            assert!(Envelope::parse(&bytes).is_none(), "length {len} must be rejected");
        }
    }

    #[test]
    fn parse_accepts_minimum() {
        let bytes = sample(BLOCK_SIZE);
        assert_eq!(bytes.len(), MIN_ENVELOPE_SIZE);
        assert!(Envelope::parse(&bytes).is_some());
    }

    #[test]
    fn to_bytes_restores_input() {
        let bytes = sample(48);
        let envelope = Envelope::parse(&bytes).unwrap();
        assert_eq!(envelope.to_bytes(), bytes);
    }
}
