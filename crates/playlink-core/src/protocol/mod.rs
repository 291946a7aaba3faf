//! Protocol module containing version identifiers and the discovery message
//! formatter.

pub mod discovery;
pub mod version;

pub use discovery::{format_discovery_message, DiscoveryMessage, MessageKind, BROADCAST_ADDRESS};
pub use version::{DiscoveryVersion, RemotePlayVersion, VersionParseError};
