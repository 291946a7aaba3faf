//! Handshake preface construction and the nonce "echo" transform.
//!
//! Layout of the 480-byte preface:
//! ```text
//! [random:284][echo(nonce):16][random:180]
//! ```
//! `echo` shifts each nonce byte down by `i + 0x29` (mod 256) and XORs it
//! with [`ECHO_TABLE`].  The console undoes this to recover the nonce.

use rand::{CryptoRng, RngCore};

use crate::crypto::seed::KEY_SIZE;
use crate::crypto::CryptoError;

/// Total size of the preface in bytes.
pub const PREFACE_SIZE: usize = 480;

/// Offset of the obfuscated nonce within the preface.
pub const NONCE_OFFSET: usize = 0x11c;

/// Constant subtracted from every nonce byte before the XOR.
pub const ECHO_SHIFT: u8 = 0x29;

/// Per-position XOR mask of the echo transform.
pub const ECHO_TABLE: [u8; KEY_SIZE] = [
    0xe1, 0xec, 0x9c, 0x3a, 0xdd, 0xbd, 0x08, 0x85, //
    0xfc, 0x0e, 0x1d, 0x78, 0x90, 0x32, 0xc0, 0x04,
];

/// The bytes sent ahead of the encrypted stream.
pub type Preface = [u8; PREFACE_SIZE];

/// Returns the first [`KEY_SIZE`] bytes of `nonce`.
///
/// # Errors
///
/// Returns [`CryptoError::NonceTooShort`] when fewer than 16 bytes are given.
pub fn nonce_block(nonce: &[u8]) -> Result<[u8; KEY_SIZE], CryptoError> {
    nonce
        .get(..KEY_SIZE)
        .and_then(|head| <[u8; KEY_SIZE]>::try_from(head).ok())
        .ok_or(CryptoError::NonceTooShort {
            needed: KEY_SIZE,
            available: nonce.len(),
        })
}

/// Applies the echo transform to a nonce block.
pub fn echo_nonce(nonce: &[u8; KEY_SIZE]) -> [u8; KEY_SIZE] {
    let mut out = [0u8; KEY_SIZE];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = nonce[i].wrapping_sub(i as u8).wrapping_sub(ECHO_SHIFT) ^ ECHO_TABLE[i];
    }
    out
}

/// Inverse of [`echo_nonce`].
pub fn recover_nonce(echoed: &[u8; KEY_SIZE]) -> [u8; KEY_SIZE] {
    let mut out = [0u8; KEY_SIZE];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = (echoed[i] ^ ECHO_TABLE[i])
            .wrapping_add(i as u8)
            .wrapping_add(ECHO_SHIFT);
    }
    out
}

/// Builds a preface: random filler from `rng` with the echoed nonce written
/// at [`NONCE_OFFSET`].
pub fn build_preface<R>(rng: &mut R, nonce: &[u8; KEY_SIZE]) -> Preface
where
    R: RngCore + CryptoRng + ?Sized,
{
    let mut preface = [0u8; PREFACE_SIZE];
    rng.fill_bytes(&mut preface);
    preface[NONCE_OFFSET..NONCE_OFFSET + KEY_SIZE].copy_from_slice(&echo_nonce(nonce));
    preface
}

/// Recovers the nonce embedded in a preface (the console's view).
pub fn extract_nonce(preface: &Preface) -> [u8; KEY_SIZE] {
    let mut echoed = [0u8; KEY_SIZE];
    echoed.copy_from_slice(&preface[NONCE_OFFSET..NONCE_OFFSET + KEY_SIZE]);
    recover_nonce(&echoed)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
