//! IV derivation seam and the handshake counter.

use crate::crypto::CryptoError;
use crate::protocol::version::RemotePlayVersion;

/// Produces the stream-cipher IV for a handshake.
///
/// The derivation is version-dependent and lives outside this crate; callers
/// supply an implementation when building a strategy.
#[cfg_attr(test, mockall::automock)]
pub trait IvGenerator {
    /// Derives the IV from the raw nonce (not just its first 16 bytes) and
    /// the current handshake counter.
    fn generate_iv(
        &self,
        version: RemotePlayVersion,
        nonce: &[u8],
        counter: u64,
    ) -> Result<Vec<u8>, CryptoError>;
}

/// Counter fed to [`IvGenerator::generate_iv`].
///
/// Starts at 0.  Deriving a codec only reads it; a key-rotation scheme that
/// needs a fresh IV calls [`HandshakeCounter::advance`] (or `set`) between
/// derivations.  Wraps at `u64::MAX`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandshakeCounter(u64);

impl HandshakeCounter {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// Increments the counter and returns the new value.
    pub fn advance(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(1);
        self.0
    }

    pub fn set(&mut self, value: u64) {
        self.0 = value;
    }
}
