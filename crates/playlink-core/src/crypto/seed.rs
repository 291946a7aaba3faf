//! PIN parsing and cipher seed derivation.

use crate::crypto::CryptoError;

/// Size in bytes of the seed, the nonce block, and the echo table.
pub const KEY_SIZE: usize = 16;

/// Hex form of [`BASE_KEY`] as published with the protocol.
pub const BASE_KEY_HEX: &str = "3f1cc4b6dcbb3ecc50baedef9734c7c9";

/// Protocol-defined key material the seed is derived from.
pub const BASE_KEY: [u8; KEY_SIZE] = [
    0x3f, 0x1c, 0xc4, 0xb6, 0xdc, 0xbb, 0x3e, 0xcc, //
    0x50, 0xba, 0xed, 0xef, 0x97, 0x34, 0xc7, 0xc9,
];

/// Parses a user-entered PIN as a base-10 `u32`.
///
/// Surrounding whitespace is ignored.  Leading zeros are allowed, so `"0000"`
/// parses to 0.  Signs, embedded spaces, and values above `u32::MAX` are
/// rejected.
///
/// This is stricter than a lenient integer parse that stops at the first
/// non-digit: `"12ab"` is an error rather than 12, and `"+1234"` is an error
/// rather than 1234.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidPin`] for anything that is not a plain
/// decimal number.
pub fn parse_pin(pin: &str) -> Result<u32, CryptoError> {
    let digits = pin.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CryptoError::InvalidPin);
    }
    digits.parse::<u32>().map_err(|_| CryptoError::InvalidPin)
}

/// Derives the 16-byte cipher seed for `pin`.
///
/// The first four bytes of [`BASE_KEY`] are XORed with `pin` in big-endian
/// order; bytes 4..16 are copied unchanged.
///
/// # Examples
///
/// ```rust
/// use playlink_core::crypto::seed::{derive_seed, BASE_KEY};
///
/// assert_eq!(derive_seed(0), BASE_KEY);
/// assert_eq!(derive_seed(0x0102_0304)[0], BASE_KEY[0] ^ 0x01);
/// ```
pub fn derive_seed(pin: u32) -> [u8; KEY_SIZE] {
    let mut seed = BASE_KEY;
    for (byte, pin_byte) in seed.iter_mut().zip(pin.to_be_bytes()) {
        *byte ^= pin_byte;
    }
    seed
}

// ── Tests ─────────────────────────────────────────────────────────────────────
