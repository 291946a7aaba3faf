//! # playlink-core
//!
//! Shared library for Playlink containing the discovery protocol types,
//! device descriptors, and the legacy remote-play handshake cryptography.
//!
//! This crate has zero dependencies on OS APIs or network sockets.  Socket
//! handling lives in `playlink-client`.
//!
//! # Architecture overview
//!
//! Playlink finds PlayStation consoles on the local network and prepares the
//! key material needed to open an encrypted remote-control session with them.
//!
//! - **`protocol`** – The discovery probe (`SRCH`) and its text encoding, the
//!   discovery and remote-play protocol versions, and well-known ports.
//!
//! - **`domain`** – The [`DeviceDescriptor`] produced for every discovery
//!   response.
//!
//! - **`crypto`** – Derives the cipher seed from the user's PIN, obfuscates
//!   the console's nonce into the 480-byte handshake preface, and binds the
//!   result into a [`CryptoCodec`] for the stream cipher.

pub mod crypto;
pub mod domain;
pub mod protocol;

pub use crypto::{
    CryptoCodec, CryptoError, CryptoStrategy, HandshakeCodec, HandshakeCounter, IvGenerator,
    LegacyCryptoStrategy, Preface, BASE_KEY, BASE_KEY_HEX, KEY_SIZE, NONCE_OFFSET, PREFACE_SIZE,
};
pub use domain::device::{DeviceDescriptor, DeviceStatus};
pub use protocol::discovery::{format_discovery_message, DiscoveryMessage, MessageKind};
pub use protocol::version::{DiscoveryVersion, RemotePlayVersion, VersionParseError};
