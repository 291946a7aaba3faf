//! Handshake strategy for PS4-generation (legacy) consoles.

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use tracing::debug;

use crate::crypto::codec::CryptoCodec;
use crate::crypto::iv::{HandshakeCounter, IvGenerator};
use crate::crypto::preface::{build_preface, nonce_block};
use crate::crypto::seed::{derive_seed, parse_pin};
use crate::crypto::{CryptoError, CryptoStrategy, HandshakeCodec};
use crate::protocol::version::RemotePlayVersion;

/// Derives the legacy seed, preface, and codec from a PIN and nonce.
///
/// The strategy is stateful only in its [`HandshakeCounter`]; deriving a
/// codec never changes it.
pub struct LegacyCryptoStrategy<G> {
    version: RemotePlayVersion,
    pin: String,
    iv_generator: G,
    counter: HandshakeCounter,
}

impl<G: IvGenerator> LegacyCryptoStrategy<G> {
    /// Creates a strategy for `version` keyed with the user-entered `pin`.
    ///
    /// The PIN is validated when a codec is derived, not here.
    pub fn new(version: RemotePlayVersion, pin: impl Into<String>, iv_generator: G) -> Self {
        Self {
            version,
            pin: pin.into(),
            iv_generator,
            counter: HandshakeCounter::new(),
        }
    }

    pub fn version(&self) -> RemotePlayVersion {
        self.version
    }

    /// Current value passed to the IV generator.
    pub fn counter(&self) -> u64 {
        self.counter.get()
    }

    /// Advances the counter for the next derivation and returns its new value.
    pub fn advance_counter(&mut self) -> u64 {
        self.counter.advance()
    }

    pub fn set_counter(&mut self, value: u64) {
        self.counter.set(value);
    }

    /// Same as [`CryptoStrategy::create_codec`] but fills the preface padding
    /// from `rng`.
    ///
    /// # Errors
    ///
    /// See [`CryptoStrategy::create_codec`].
    pub fn create_codec_with_rng<R>(
        &self,
        rng: &mut R,
        nonce: &[u8],
    ) -> Result<HandshakeCodec, CryptoError>
    where
        R: RngCore + CryptoRng + ?Sized,
    {
        let pin = parse_pin(&self.pin)?;
        let block = nonce_block(nonce)?;

        let preface = build_preface(rng, &block);
        let counter = self.counter.get();
        let iv = self
            .iv_generator
            .generate_iv(self.version, nonce, counter)?;
        let seed = derive_seed(pin);

        debug!(
            version = %self.version,
            counter,
            iv_len = iv.len(),
            "derived legacy handshake codec"
        );

        Ok(HandshakeCodec {
            codec: CryptoCodec::new(iv, seed),
            preface,
        })
    }
}

impl<G: IvGenerator> CryptoStrategy for LegacyCryptoStrategy<G> {
    fn create_codec(&self, nonce: &[u8]) -> Result<HandshakeCodec, CryptoError> {
        self.create_codec_with_rng(&mut OsRng, nonce)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
