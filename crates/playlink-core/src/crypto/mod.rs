//! Remote-play handshake cryptography.
//!
//! Before the encrypted control session starts, the client sends the console
//! a 480-byte *preface*: random padding with an obfuscated copy of the
//! console's nonce embedded at offset 284.  Both sides then key a stream
//! cipher with a *seed* derived from the user's PIN and an IV derived from
//! the nonce.
//!
//! ```text
//! PIN ──parse──► u32 ──XOR into BASE_KEY[0..4]──────────────► seed (16 B)
//! nonce ──echo──► preface[284..300]   (rest of preface random)
//! nonce + counter ──IvGenerator──────────────────────────────► iv
//! (iv, seed) ─────────────────────────────────────────────────► CryptoCodec
//! ```
//!
//! The byte transforms are pure functions over fixed-size arrays
//! ([`seed`], [`preface`]); [`legacy::LegacyCryptoStrategy`] composes them.

pub mod codec;
pub mod iv;
pub mod legacy;
pub mod preface;
pub mod seed;

use thiserror::Error;

pub use codec::CryptoCodec;
pub use iv::{HandshakeCounter, IvGenerator};
pub use legacy::LegacyCryptoStrategy;
pub use preface::{Preface, NONCE_OFFSET, PREFACE_SIZE};
pub use seed::{BASE_KEY, BASE_KEY_HEX, KEY_SIZE};

/// Errors raised while deriving handshake key material.
///
/// All of these are caller contract violations; none are transient.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// The PIN is not a base-10 integer in the `u32` range.
    #[error("PIN is not a base-10 integer that fits in 32 bits")]
    InvalidPin,

    /// The nonce supplied by the console is shorter than [`KEY_SIZE`].
    #[error("nonce too short: need at least {needed} bytes, got {available}")]
    NonceTooShort { needed: usize, available: usize },

    /// The IV collaborator could not produce an IV.
    #[error("IV generation failed: {0}")]
    IvGeneration(String),
}

/// Output of a handshake derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeCodec {
    /// Key material for the stream cipher.
    pub codec: CryptoCodec,
    /// Bytes to transmit before the encrypted stream begins.
    pub preface: Preface,
}

/// Derives handshake key material from a console-issued nonce.
pub trait CryptoStrategy {
    /// Builds the codec binding and preface for one session.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError`] if the strategy's PIN is malformed, the nonce is
    /// shorter than 16 bytes, or IV derivation fails.  No preface is produced
    /// on error.
    fn create_codec(&self, nonce: &[u8]) -> Result<HandshakeCodec, CryptoError>;
}
