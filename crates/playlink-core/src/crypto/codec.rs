//! Key material handed to the stream cipher.

use std::fmt;

use crate::crypto::seed::KEY_SIZE;

/// Binding of an IV and a seed, consumed by the session's stream cipher.
#[derive(Clone, PartialEq, Eq)]
pub struct CryptoCodec {
    iv: Vec<u8>,
    seed: [u8; KEY_SIZE],
}

impl CryptoCodec {
    pub fn new(iv: Vec<u8>, seed: [u8; KEY_SIZE]) -> Self {
        Self { iv, seed }
    }

    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    pub fn seed(&self) -> &[u8; KEY_SIZE] {
        &self.seed
    }

    /// Consumes the binding, returning `(iv, seed)`.
    pub fn into_parts(self) -> (Vec<u8>, [u8; KEY_SIZE]) {
        (self.iv, self.seed)
    }
}

// Key material stays out of logs.
impl fmt::Debug for CryptoCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptoCodec")
            .field("iv_len", &self.iv.len())
            .field("seed", &"<redacted>")
            .finish()
    }
}
